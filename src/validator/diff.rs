/*!
 * Line-level diff measurement between published and candidate pages.
 *
 * The change percentage is the share of the larger document that is not
 * part of the longest common subsequence of lines. Exact LCS is used up
 * to a size cap; beyond it a multiset approximation keeps the cost
 * linear.
 */

use std::collections::HashMap;

/// DP table size cap above which the approximate diff is used
const LCS_CELL_LIMIT: usize = 4_000_000;

/// Result of diffing two documents
#[derive(Debug, Clone)]
pub struct DiffResult {
    /// Share of the document that differs, 0-100
    pub change_percentage: u8,
    /// Lines present only in the candidate
    pub added: usize,
    /// Lines present only in the published version
    pub removed: usize,
    /// Lines common to both
    pub unchanged: usize,
}

impl DiffResult {
    /// One-line human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "{} lines added, {} removed, {} unchanged ({}% changed)",
            self.added, self.removed, self.unchanged, self.change_percentage
        )
    }
}

/// Diff two documents line by line
pub fn line_diff(published: &str, candidate: &str) -> DiffResult {
    let old: Vec<&str> = published.lines().collect();
    let new: Vec<&str> = candidate.lines().collect();

    if old.is_empty() && new.is_empty() {
        return DiffResult {
            change_percentage: 0,
            added: 0,
            removed: 0,
            unchanged: 0,
        };
    }

    let common = if old.len().saturating_mul(new.len()) <= LCS_CELL_LIMIT {
        lcs_length(&old, &new)
    } else {
        multiset_common(&old, &new)
    };

    let added = new.len() - common;
    let removed = old.len() - common;
    let longest = old.len().max(new.len());

    let change_percentage = if longest == 0 {
        0
    } else {
        (((longest - common) as f64 / longest as f64) * 100.0).round() as u8
    };

    DiffResult {
        change_percentage,
        added,
        removed,
        unchanged: common,
    }
}

/// Longest common subsequence length over lines
fn lcs_length(old: &[&str], new: &[&str]) -> usize {
    if old.is_empty() || new.is_empty() {
        return 0;
    }

    // Two-row DP keeps memory at O(min side)
    let (short, long) = if old.len() <= new.len() {
        (old, new)
    } else {
        (new, old)
    };

    let mut prev = vec![0usize; short.len() + 1];
    let mut curr = vec![0usize; short.len() + 1];

    for long_line in long {
        for (j, short_line) in short.iter().enumerate() {
            curr[j + 1] = if long_line == short_line {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[short.len()]
}

/// Approximate common-line count as multiset intersection size.
///
/// Ignores ordering, so it overestimates commonality for reordered
/// documents; acceptable as the large-document fallback.
fn multiset_common(old: &[&str], new: &[&str]) -> usize {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for line in old {
        *counts.entry(line).or_insert(0) += 1;
    }

    let mut common = 0;
    for line in new {
        if let Some(count) = counts.get_mut(line) {
            if *count > 0 {
                *count -= 1;
                common += 1;
            }
        }
    }

    common
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lineDiff_withIdenticalDocuments_shouldReportZeroChange() {
        let doc = "line one\nline two\nline three";

        let result = line_diff(doc, doc);

        assert_eq!(result.change_percentage, 0);
        assert_eq!(result.added, 0);
        assert_eq!(result.removed, 0);
        assert_eq!(result.unchanged, 3);
    }

    #[test]
    fn test_lineDiff_withBothEmpty_shouldReportZero() {
        let result = line_diff("", "");
        assert_eq!(result.change_percentage, 0);
    }

    #[test]
    fn test_lineDiff_withOneChangedLine_shouldReportSmallChange() {
        let old = "a\nb\nc\nd\ne\nf\ng\nh\ni\nj";
        let new = "a\nb\nc\nd\nCHANGED\nf\ng\nh\ni\nj";

        let result = line_diff(old, new);

        assert_eq!(result.added, 1);
        assert_eq!(result.removed, 1);
        assert_eq!(result.unchanged, 9);
        assert_eq!(result.change_percentage, 10);
    }

    #[test]
    fn test_lineDiff_withCompleteRewrite_shouldReportFullChange() {
        let old = "a\nb\nc";
        let new = "x\ny\nz";

        let result = line_diff(old, new);

        assert_eq!(result.change_percentage, 100);
        assert_eq!(result.unchanged, 0);
    }

    #[test]
    fn test_lineDiff_withAddedLines_shouldCountAdditions() {
        let old = "a\nb";
        let new = "a\nb\nc\nd";

        let result = line_diff(old, new);

        assert_eq!(result.added, 2);
        assert_eq!(result.removed, 0);
        assert_eq!(result.change_percentage, 50);
    }

    #[test]
    fn test_lineDiff_shouldRespectLineOrder() {
        // Reversed document shares lines but little subsequence
        let old = "a\nb\nc\nd";
        let new = "d\nc\nb\na";

        let result = line_diff(old, new);

        // LCS of a sequence and its reverse is 1 here
        assert_eq!(result.unchanged, 1);
        assert_eq!(result.change_percentage, 75);
    }

    #[test]
    fn test_multisetCommon_shouldCountDuplicatesCorrectly() {
        let old = vec!["a", "a", "b"];
        let new = vec!["a", "c", "a", "a"];

        // Only two "a"s exist on the old side
        assert_eq!(multiset_common(&old, &new), 2);
    }

    #[test]
    fn test_summary_shouldMentionCounts() {
        let result = line_diff("a\nb", "a\nc");
        let summary = result.summary();

        assert!(summary.contains("1 lines added"));
        assert!(summary.contains("1 removed"));
        assert!(summary.contains("50% changed"));
    }
}
