/*!
 * Page document handling and manual region parsing.
 *
 * A page is opaque HTML carrying a handful of comment-marker conventions:
 * - `<!-- MANUAL:name -->...<!-- /MANUAL:name -->` protected regions that
 *   generation must never alter
 * - `<!-- LOCK -->` opts the whole page out of automation
 * - `<!-- DEPLOYED: YYYY-MM-DD -->` records the last deployment date
 *
 * Marker identifiers are opaque; only equality matters. Parsing is strict:
 * unmatched, stray, duplicate, or overlapping markers are structural
 * errors, never silently repaired.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

use crate::errors::DocumentError;

/// Regex for opening manual region markers
static MANUAL_OPEN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<!-- MANUAL:(\w+) -->").expect("Invalid manual open marker regex")
});

/// Regex for closing manual region markers
static MANUAL_CLOSE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<!-- /MANUAL:(\w+) -->").expect("Invalid manual close marker regex")
});

/// Regex for the deployment date stamp
static DEPLOY_MARKER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<!-- DEPLOYED: (\d{4}-\d{2}-\d{2}) -->").expect("Invalid deploy marker regex")
});

/// Regex for stripping HTML tags when extracting section text
static TAG_STRIP_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]+>").expect("Invalid tag strip regex"));

/// Lock marker constant
const LOCK_MARKER: &str = "<!-- LOCK -->";

/// A caller-protected span of a page, markers included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualRegion {
    /// Region identifier (the `name` in `<!-- MANUAL:name -->`)
    pub id: String,
    /// The full span including both markers, byte-for-byte
    pub span: String,
}

/// An immutable HTML page document.
///
/// Published pages are read-only inputs; candidates are new documents.
/// A page never transitions state in place - the caller replaces the
/// published page with an approved candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDocument {
    html: String,
}

/// A marker token found while scanning a document
#[derive(Debug)]
enum MarkerToken {
    Open { pos: usize, id: String },
    Close { pos: usize, end: usize, id: String },
}

impl MarkerToken {
    fn pos(&self) -> usize {
        match self {
            MarkerToken::Open { pos, .. } | MarkerToken::Close { pos, .. } => *pos,
        }
    }
}

impl PageDocument {
    /// Create a page document from raw HTML
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    /// Get the raw HTML content
    pub fn html(&self) -> &str {
        &self.html
    }

    /// Check whether the page carries the lock marker
    pub fn is_locked(&self) -> bool {
        self.html.contains(LOCK_MARKER)
    }

    /// Extract the last deployment date stamp, if present
    pub fn deploy_date(&self) -> Option<String> {
        DEPLOY_MARKER_REGEX
            .captures(&self.html)
            .and_then(|cap| cap.get(1).map(|m| m.as_str().to_string()))
    }

    /// Stamp (or re-stamp) the deployment date marker.
    ///
    /// The marker goes right after the `<html>` tag when one exists,
    /// otherwise it is prepended.
    pub fn with_deploy_marker(&self, date: &str) -> Self {
        let marker = format!("<!-- DEPLOYED: {} -->", date);

        // Replace an existing stamp in place rather than stacking markers
        if DEPLOY_MARKER_REGEX.is_match(&self.html) {
            return Self::new(DEPLOY_MARKER_REGEX.replace(&self.html, marker.as_str()).into_owned());
        }

        static HTML_TAG_REGEX: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"(<html[^>]*>)").expect("Invalid html tag regex"));

        if HTML_TAG_REGEX.is_match(&self.html) {
            let replaced = HTML_TAG_REGEX
                .replace(&self.html, format!("${{1}}\n{}", marker).as_str())
                .into_owned();
            Self::new(replaced)
        } else {
            Self::new(format!("{}\n{}", marker, self.html))
        }
    }

    /// Scan all manual markers in document order
    fn marker_tokens(&self) -> Vec<MarkerToken> {
        let mut tokens: Vec<MarkerToken> = Vec::new();

        for cap in MANUAL_CLOSE_REGEX.captures_iter(&self.html) {
            let m = cap.get(0).expect("capture 0 always present");
            tokens.push(MarkerToken::Close {
                pos: m.start(),
                end: m.end(),
                id: cap[1].to_string(),
            });
        }
        for cap in MANUAL_OPEN_REGEX.captures_iter(&self.html) {
            let m = cap.get(0).expect("capture 0 always present");
            tokens.push(MarkerToken::Open {
                pos: m.start(),
                id: cap[1].to_string(),
            });
        }

        tokens.sort_by_key(MarkerToken::pos);
        tokens
    }

    /// Parse all manual regions, enforcing marker pairing invariants.
    ///
    /// Every opening marker must have exactly one matching closing marker
    /// with the same identifier, in document order, non-overlapping, with
    /// no identifier declared twice.
    pub fn manual_regions(&self) -> Result<Vec<ManualRegion>, DocumentError> {
        let mut regions = Vec::new();
        let mut open: Option<(usize, String)> = None;
        let mut seen: Vec<String> = Vec::new();

        for token in self.marker_tokens() {
            match token {
                MarkerToken::Open { pos, id } => {
                    if let Some((_, outer)) = &open {
                        return Err(DocumentError::OverlappingRegions {
                            outer: outer.clone(),
                            inner: id,
                        });
                    }
                    if seen.contains(&id) {
                        return Err(DocumentError::DuplicateRegion { id });
                    }
                    open = Some((pos, id));
                }
                MarkerToken::Close { end, id, .. } => match &open {
                    Some((start, open_id)) if *open_id == id => {
                        let start = *start;
                        open = None;
                        seen.push(id.clone());
                        regions.push(ManualRegion {
                            id,
                            span: self.html[start..end].to_string(),
                        });
                    }
                    _ => {
                        return Err(DocumentError::StrayClosingMarker { id });
                    }
                },
            }
        }

        if let Some((_, id)) = open {
            return Err(DocumentError::UnmatchedMarker { id });
        }

        Ok(regions)
    }

    /// Replace this document's manual regions with the given spans.
    ///
    /// Used by the drafter to re-inject the published page's protected
    /// content verbatim after generation. Regions absent from this
    /// document are left for the validator to flag.
    pub fn inject_manual_regions(&self, regions: &[ManualRegion]) -> Self {
        let mut html = self.html.clone();

        for region in regions {
            let pattern = format!(
                r"(?s)<!-- MANUAL:{id} -->.*?<!-- /MANUAL:{id} -->",
                id = regex::escape(&region.id)
            );
            // Identifier comes from a \w+ capture, so the pattern is valid.
            // NoExpand: region content is literal, '$' must not expand.
            if let Ok(re) = Regex::new(&pattern) {
                html = re
                    .replace(&html, regex::NoExpand(region.span.as_str()))
                    .into_owned();
            }
        }

        Self::new(html)
    }

    /// Check whether the page declares a section with the given id
    pub fn has_section(&self, section_id: &str) -> bool {
        self.html.contains(&format!("id=\"{}\"", section_id))
            || self.html.contains(&format!("id='{}'", section_id))
    }

    /// Extract the visible text of an element with the given id.
    ///
    /// This is a lightweight extraction for policy checks (summary length),
    /// not a general HTML parser: it takes everything between the opening
    /// tag carrying the id and the next closing tag of the same name,
    /// strips tags, and collapses whitespace.
    pub fn section_text(&self, section_id: &str) -> Option<String> {
        let open_pattern = format!(
            r#"<(\w+)[^>]*id=["']{}["'][^>]*>"#,
            regex::escape(section_id)
        );
        let open_re = Regex::new(&open_pattern).ok()?;
        let cap = open_re.captures(&self.html)?;
        let tag_name = cap.get(1)?.as_str();
        let content_start = cap.get(0)?.end();

        let close_tag = format!("</{}>", tag_name);
        let content_end = self.html[content_start..]
            .find(&close_tag)
            .map(|p| p + content_start)?;

        let raw = &self.html[content_start..content_end];
        let stripped = TAG_STRIP_REGEX.replace_all(raw, " ");
        let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
        Some(collapsed)
    }

    /// Basic well-formedness check.
    ///
    /// Requires html and body elements and roughly balanced tag counts.
    /// Self-closing and void elements keep this from being exact, so a
    /// small imbalance is tolerated.
    pub fn is_well_formed(&self) -> bool {
        let lower = self.html.to_lowercase();
        let has_html = lower.contains("<html") && lower.contains("</html>");
        let has_body = lower.contains("<body") && lower.contains("</body>");

        static OPEN_TAG_REGEX: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"<[a-z]").expect("Invalid open tag regex"));
        static CLOSE_TAG_REGEX: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"</[a-z]").expect("Invalid close tag regex"));

        let open_tags = OPEN_TAG_REGEX.find_iter(&lower).count() as i64;
        let close_tags = CLOSE_TAG_REGEX.find_iter(&lower).count() as i64;

        has_html && has_body && (open_tags - close_tags).abs() < 10
    }

    /// SHA256 hash of the page content, used for freshness comparison
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.html.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}
