/*!
 * Page document tests: manual regions, markers, and section extraction.
 */

use pagesmith::errors::DocumentError;
use pagesmith::page::{ManualRegion, PageDocument};

use crate::common;

#[test]
fn test_manualRegions_onPublishedPage_shouldFindNotesRegion() {
    let regions = common::published_page().manual_regions().unwrap();

    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].id, "notes");
    assert!(regions[0].span.contains("written by hand"));
}

#[test]
fn test_manualRegions_withManyRegions_shouldPreserveDocumentOrder() {
    let html = r#"<html><body>
<!-- MANUAL:alpha -->a<!-- /MANUAL:alpha -->
<!-- MANUAL:beta -->b<!-- /MANUAL:beta -->
<!-- MANUAL:gamma -->c<!-- /MANUAL:gamma -->
</body></html>"#;

    let regions = PageDocument::new(html).manual_regions().unwrap();

    let ids: Vec<&str> = regions.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["alpha", "beta", "gamma"]);
}

#[test]
fn test_manualRegions_withInterleavedClose_shouldError() {
    let html = "<!-- MANUAL:a -->x<!-- /MANUAL:b -->y<!-- /MANUAL:a -->";

    let err = PageDocument::new(html).manual_regions().unwrap_err();
    assert!(matches!(err, DocumentError::StrayClosingMarker { .. }));
}

#[test]
fn test_injectManualRegions_withMissingRegionInDraft_shouldLeaveDraftUnchanged() {
    let draft = PageDocument::new("<html><body>no markers at all</body></html>");
    let regions = vec![ManualRegion {
        id: "notes".to_string(),
        span: "<!-- MANUAL:notes -->x<!-- /MANUAL:notes -->".to_string(),
    }];

    let injected = draft.inject_manual_regions(&regions);

    // Injection replaces existing spans; it does not add missing ones.
    // The validator rejects the draft for the missing region instead.
    assert_eq!(injected.html(), draft.html());
}

#[test]
fn test_sectionText_onPublishedPage_shouldExtractSummary() {
    let text = common::published_page().section_text("summary").unwrap();

    assert_eq!(text, "Deterministic filesystem state management in Rust.");
}

#[test]
fn test_deployMarkerLifecycle_shouldStampAndReplace() {
    let page = common::published_page();
    assert_eq!(page.deploy_date(), None);

    let stamped = page.with_deploy_marker("2025-06-01");
    assert_eq!(stamped.deploy_date(), Some("2025-06-01".to_string()));

    let restamped = stamped.with_deploy_marker("2025-07-01");
    assert_eq!(restamped.deploy_date(), Some("2025-07-01".to_string()));
    assert_eq!(restamped.html().matches("DEPLOYED").count(), 1);
}

#[test]
fn test_lockMarker_shouldBeIndependentOfManualRegions() {
    let html = common::PUBLISHED_PAGE.replace("<main>", "<main>\n<!-- LOCK -->");
    let page = PageDocument::new(html);

    assert!(page.is_locked());
    assert_eq!(page.manual_regions().unwrap().len(), 1);
}

#[test]
fn test_contentHash_shouldDifferAfterAnyEdit() {
    let page = common::published_page();
    let edited = PageDocument::new(common::PUBLISHED_PAGE.replace("v1.1.0", "v1.2.0"));

    assert_ne!(page.content_hash(), edited.content_hash());
}
