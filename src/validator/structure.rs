/*!
 * Structural checks on candidate pages.
 *
 * Covers the hard invariants: well-formed HTML, manual region
 * preservation, and the softer required-section presence. Manual region
 * tampering or removal is unconditionally fatal to a candidate.
 */

use crate::page::{ManualRegion, PageDocument};

/// A structural finding about a candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructureIssue {
    /// Candidate HTML failed the well-formedness check
    MalformedHtml,
    /// Candidate manual markers do not pair up
    BrokenManualMarkers { detail: String },
    /// A manual region from the published page is missing
    ManualRegionRemoved { id: String },
    /// A manual region's content differs from the published page
    ManualRegionAltered { id: String },
    /// A required section id is missing
    MissingRequiredSection { id: String },
}

impl StructureIssue {
    /// Whether this finding forces a rejection
    pub fn is_fatal(&self) -> bool {
        match self {
            StructureIssue::MalformedHtml
            | StructureIssue::BrokenManualMarkers { .. }
            | StructureIssue::ManualRegionRemoved { .. }
            | StructureIssue::ManualRegionAltered { .. } => true,
            StructureIssue::MissingRequiredSection { .. } => false,
        }
    }

    /// Human-readable description
    pub fn description(&self) -> String {
        match self {
            StructureIssue::MalformedHtml => "Candidate HTML structure appears invalid".to_string(),
            StructureIssue::BrokenManualMarkers { detail } => {
                format!("Candidate manual markers are broken: {}", detail)
            }
            StructureIssue::ManualRegionRemoved { id } => {
                format!("Manual region '{}' was removed from the candidate", id)
            }
            StructureIssue::ManualRegionAltered { id } => {
                format!("Manual region '{}' was altered in the candidate", id)
            }
            StructureIssue::MissingRequiredSection { id } => {
                format!("Missing required section: {}", id)
            }
        }
    }
}

/// Run all structural checks on a candidate
pub fn check_structure(
    candidate: &PageDocument,
    published_regions: &[ManualRegion],
    required_sections: &[String],
) -> Vec<StructureIssue> {
    let mut issues = Vec::new();

    if !candidate.is_well_formed() {
        issues.push(StructureIssue::MalformedHtml);
    }

    match candidate.manual_regions() {
        Ok(candidate_regions) => {
            for published in published_regions {
                match candidate_regions.iter().find(|r| r.id == published.id) {
                    None => issues.push(StructureIssue::ManualRegionRemoved {
                        id: published.id.clone(),
                    }),
                    Some(region) if region.span != published.span => {
                        issues.push(StructureIssue::ManualRegionAltered {
                            id: published.id.clone(),
                        });
                    }
                    Some(_) => {}
                }
            }
        }
        Err(e) => {
            issues.push(StructureIssue::BrokenManualMarkers {
                detail: e.to_string(),
            });
        }
    }

    for section in required_sections {
        if !candidate.has_section(section) {
            issues.push(StructureIssue::MissingRequiredSection {
                id: section.clone(),
            });
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    fn published() -> PageDocument {
        PageDocument::new(
            r#"<html><body>
<section id="summary">S</section>
<section id="changelog">C</section>
<section id="status-badge">B</section>
<!-- MANUAL:notes -->
<p>Protected.</p>
<!-- /MANUAL:notes -->
</body></html>"#,
        )
    }

    fn required() -> Vec<String> {
        vec![
            "summary".to_string(),
            "changelog".to_string(),
            "status-badge".to_string(),
        ]
    }

    #[test]
    fn test_checkStructure_withFaithfulCandidate_shouldReturnEmpty() {
        let page = published();
        let regions = page.manual_regions().unwrap();

        let issues = check_structure(&page, &regions, &required());
        assert!(issues.is_empty());
    }

    #[test]
    fn test_checkStructure_withRemovedRegion_shouldBeFatal() {
        let page = published();
        let regions = page.manual_regions().unwrap();

        let candidate = PageDocument::new(
            r#"<html><body>
<section id="summary">S</section>
<section id="changelog">C</section>
<section id="status-badge">B</section>
</body></html>"#,
        );

        let issues = check_structure(&candidate, &regions, &required());

        assert!(issues
            .iter()
            .any(|i| matches!(i, StructureIssue::ManualRegionRemoved { id } if id == "notes")));
        assert!(issues.iter().any(|i| i.is_fatal()));
    }

    #[test]
    fn test_checkStructure_withAlteredRegion_shouldBeFatal() {
        let page = published();
        let regions = page.manual_regions().unwrap();

        let candidate = PageDocument::new(page.html().replace("Protected.", "Rewritten."));

        let issues = check_structure(&candidate, &regions, &required());

        assert!(issues
            .iter()
            .any(|i| matches!(i, StructureIssue::ManualRegionAltered { id } if id == "notes")));
    }

    #[test]
    fn test_checkStructure_withBrokenMarkers_shouldBeFatal() {
        let page = published();
        let regions = page.manual_regions().unwrap();

        let candidate =
            PageDocument::new(page.html().replace("<!-- /MANUAL:notes -->", ""));

        let issues = check_structure(&candidate, &regions, &required());

        assert!(issues
            .iter()
            .any(|i| matches!(i, StructureIssue::BrokenManualMarkers { .. })));
    }

    #[test]
    fn test_checkStructure_withMissingSection_shouldBeSoft() {
        let page = published();
        let regions = page.manual_regions().unwrap();

        let candidate = PageDocument::new(
            page.html()
                .replace(r#"<section id="status-badge">B</section>"#, ""),
        );

        let issues = check_structure(&candidate, &regions, &required());

        let missing: Vec<_> = issues
            .iter()
            .filter(
                |i| matches!(i, StructureIssue::MissingRequiredSection { id } if id == "status-badge"),
            )
            .collect();
        assert_eq!(missing.len(), 1);
        assert!(!missing[0].is_fatal());
    }

    #[test]
    fn test_checkStructure_withMalformedHtml_shouldBeFatal() {
        let regions = Vec::new();
        let candidate = PageDocument::new("<div>not a page</div>");

        let issues = check_structure(&candidate, &regions, &[]);

        assert!(issues.contains(&StructureIssue::MalformedHtml));
        assert!(issues[0].is_fatal());
    }
}
