/*!
 * Traceability (hallucination) checks.
 *
 * Every factual claim in a candidate must be traceable to the collected
 * context or the published page's own non-manual content. Claims are
 * extracted lexically: known language names, version strings, and
 * calendar years. Untraceable claims are soft findings for the verdict -
 * ambiguity never hard-rejects on its own.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use crate::collector::models::ProjectContext;

/// Version string shapes: v1.2, 1.2.3, v0.4.0-rc1
static VERSION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bv?\d+\.\d+(?:\.\d+)?(?:-[0-9A-Za-z.]+)?\b").expect("Invalid version regex")
});

/// Calendar years 2000-2099
static YEAR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b20\d{2}\b").expect("Invalid year regex"));

/// HTML comments (manual markers, deploy stamps)
static COMMENT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("Invalid comment regex"));

/// HTML tags
static TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("Invalid tag regex"));

/// Language names recognized as claims when they appear in a page
static KNOWN_LANGUAGES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "Rust",
        "Python",
        "JavaScript",
        "TypeScript",
        "Go",
        "Java",
        "Kotlin",
        "Swift",
        "Ruby",
        "PHP",
        "Scala",
        "Haskell",
        "Elixir",
        "Erlang",
        "Clojure",
        "Lua",
        "Perl",
        "Julia",
        "Zig",
        "Nim",
        "OCaml",
        "Dart",
        "Shell",
        "HTML",
        "CSS",
        "SQL",
        "Assembly",
        "Objective-C",
        "C++",
        "C#",
    ]
});

/// An extracted claim awaiting verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim {
    /// A language/technology name
    Language(String),
    /// A version string
    Version(String),
    /// A calendar year
    Year(String),
}

impl Claim {
    /// The claimed token text
    pub fn token(&self) -> &str {
        match self {
            Claim::Language(t) | Claim::Version(t) | Claim::Year(t) => t,
        }
    }

    /// Human-readable description of an untraceable claim
    pub fn description(&self) -> String {
        match self {
            Claim::Language(t) => format!("Untraceable language claim: {}", t),
            Claim::Version(t) => format!("Untraceable version claim: {}", t),
            Claim::Year(t) => format!("Untraceable year claim: {}", t),
        }
    }
}

/// Reduce page HTML to visible text: drop comments, then tags
pub fn visible_text(html: &str) -> String {
    let without_comments = COMMENT_REGEX.replace_all(html, " ");
    let without_tags = TAG_REGEX.replace_all(&without_comments, " ");
    without_tags.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extract all verifiable claims from candidate page text
pub fn extract_claims(text: &str) -> Vec<Claim> {
    let mut claims = Vec::new();

    // Case-sensitive on purpose: language names are proper nouns, and a
    // case-insensitive match turns ordinary words ("go") into claims.
    for language in KNOWN_LANGUAGES.iter() {
        let pattern = format!(r"(^|[\s,;(>]){}($|[\s.,;:)<])", regex::escape(language));
        if let Ok(re) = Regex::new(&pattern) {
            if re.is_match(text) {
                claims.push(Claim::Language(language.to_string()));
            }
        }
    }

    for m in VERSION_REGEX.find_iter(text) {
        let claim = Claim::Version(m.as_str().to_string());
        if !claims.contains(&claim) {
            claims.push(claim);
        }
    }

    for m in YEAR_REGEX.find_iter(text) {
        let claim = Claim::Year(m.as_str().to_string());
        if !claims.contains(&claim) {
            claims.push(claim);
        }
    }

    claims
}

/// The body of evidence a claim may be traced to
pub struct Evidence {
    text: String,
}

impl Evidence {
    /// Assemble evidence from the context and the published page.
    ///
    /// The published page's own content is admissible: a claim already on
    /// the live page is not a new invention by the drafter.
    pub fn assemble(context: &ProjectContext, published_html: &str) -> Self {
        let mut text = String::new();

        text.push_str(&context.slug);
        text.push(' ');
        text.push_str(&context.repo);
        text.push(' ');
        text.push_str(&context.description);
        text.push(' ');
        text.push_str(&context.readme_excerpt);
        text.push(' ');

        for language in &context.languages {
            text.push_str(language);
            text.push(' ');
        }

        for release in &context.releases {
            text.push_str(&release.tag);
            text.push(' ');
            text.push_str(&release.name);
            text.push(' ');
            text.push_str(&release.notes);
            text.push(' ');
            if let Some(date) = &release.date {
                text.push_str(date);
                text.push(' ');
            }
        }

        for commit in &context.commits {
            text.push_str(&commit.message);
            text.push(' ');
            text.push_str(&commit.date);
            text.push(' ');
        }

        text.push_str(&visible_text(published_html));

        Self {
            text: text.to_lowercase(),
        }
    }

    /// Whether a claim can be traced to the evidence
    pub fn supports(&self, claim: &Claim) -> bool {
        let token = claim.token().to_lowercase();

        match claim {
            // Versions match with or without their leading 'v'
            Claim::Version(_) => {
                let bare = token.trim_start_matches('v');
                self.text.contains(&token) || self.text.contains(bare)
            }
            _ => self.text.contains(&token),
        }
    }
}

/// Find all candidate claims with no support in the evidence
pub fn untraceable_claims(candidate_text: &str, evidence: &Evidence) -> Vec<Claim> {
    extract_claims(candidate_text)
        .into_iter()
        .filter(|claim| !evidence.supports(claim))
        .collect()
}
