/*!
 * Change significance scoring.
 *
 * Decides whether a project's recent activity justifies regenerating its
 * page. Weighted heuristics over commits, releases, and README changes;
 * weights and the update threshold come from configuration.
 */

use log::debug;

use crate::app_config::ScoringConfig;
use crate::collector::models::{CommitInfo, CommitType, ProjectStatus};

/// Result of significance scoring for a single project
#[derive(Debug, Clone)]
pub struct Significance {
    /// Accumulated score
    pub change_score: i32,
    /// Resulting status
    pub status: ProjectStatus,
    /// Primary reason driving the score
    pub change_reason: String,
}

impl Significance {
    /// Score a project's recent activity.
    ///
    /// New projects always update. Projects with no commits and no
    /// releases always skip. Everything else accumulates weighted points
    /// and compares against the update threshold.
    pub fn calculate(
        scoring: &ScoringConfig,
        commits: &[CommitInfo],
        has_new_release: bool,
        readme_changed: bool,
        is_new: bool,
    ) -> Self {
        if is_new {
            return Self {
                change_score: 999,
                status: ProjectStatus::New,
                change_reason: "new_project".to_string(),
            };
        }

        if commits.is_empty() && !has_new_release {
            return Self {
                change_score: scoring.no_commits,
                status: ProjectStatus::Skip,
                change_reason: "no_activity".to_string(),
            };
        }

        let mut score = 0;
        let mut reasons: Vec<&str> = Vec::new();

        if has_new_release {
            score += scoring.new_release;
            reasons.push("release_tag");
        }

        if readme_changed {
            score += scoring.readme_changed;
            reasons.push("readme_changed");
        }

        for commit in commits {
            match commit.commit_type {
                CommitType::Feat => {
                    score += scoring.feat_commit;
                    if !reasons.contains(&"feature_commit") {
                        reasons.push("feature_commit");
                    }
                }
                CommitType::Refactor => {
                    score += scoring.refactor_commit;
                    if !reasons.contains(&"refactor_commit") {
                        reasons.push("refactor_commit");
                    }
                }
                CommitType::Fix => {
                    score += scoring.fix_commit;
                    if !reasons.contains(&"fix_commit") {
                        reasons.push("fix_commit");
                    }
                }
                // docs, style, chore, perf, test, other: no points
                _ => {}
            }
        }

        let status = if score >= scoring.update_threshold {
            ProjectStatus::Update
        } else {
            ProjectStatus::Skip
        };

        debug!(
            "Significance: score={}, threshold={}, status={:?}",
            score, scoring.update_threshold, status
        );

        Self {
            change_score: score,
            status,
            change_reason: reasons
                .first()
                .map(|r| r.to_string())
                .unwrap_or_else(|| "low_significance".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(commit_type: CommitType) -> CommitInfo {
        CommitInfo {
            sha: "abc1234".to_string(),
            date: "2025-06-01".to_string(),
            message: "message".to_string(),
            commit_type,
            author: "dev".to_string(),
        }
    }

    #[test]
    fn test_calculate_withNewProject_shouldAlwaysUpdate() {
        let result = Significance::calculate(&ScoringConfig::default(), &[], false, false, true);

        assert_eq!(result.status, ProjectStatus::New);
        assert_eq!(result.change_reason, "new_project");
        assert_eq!(result.change_score, 999);
    }

    #[test]
    fn test_calculate_withNoActivity_shouldSkip() {
        let result = Significance::calculate(&ScoringConfig::default(), &[], false, false, false);

        assert_eq!(result.status, ProjectStatus::Skip);
        assert_eq!(result.change_reason, "no_activity");
        assert!(result.change_score < 0);
    }

    #[test]
    fn test_calculate_withNewRelease_shouldUpdate() {
        let result = Significance::calculate(&ScoringConfig::default(), &[], true, false, false);

        assert_eq!(result.status, ProjectStatus::Update);
        assert_eq!(result.change_reason, "release_tag");
        assert_eq!(result.change_score, 100);
    }

    #[test]
    fn test_calculate_withOnlyFixCommits_shouldStayBelowThreshold() {
        let commits = vec![commit(CommitType::Fix), commit(CommitType::Fix)];

        let result =
            Significance::calculate(&ScoringConfig::default(), &commits, false, false, false);

        // 2 * 15 = 30 < 50
        assert_eq!(result.status, ProjectStatus::Skip);
        assert_eq!(result.change_score, 30);
        assert_eq!(result.change_reason, "fix_commit");
    }

    #[test]
    fn test_calculate_withFeatCommits_shouldCrossThreshold() {
        let commits = vec![commit(CommitType::Feat), commit(CommitType::Feat)];

        let result =
            Significance::calculate(&ScoringConfig::default(), &commits, false, false, false);

        // 2 * 30 = 60 >= 50
        assert_eq!(result.status, ProjectStatus::Update);
        assert_eq!(result.change_score, 60);
        assert_eq!(result.change_reason, "feature_commit");
    }

    #[test]
    fn test_calculate_withChoreCommits_shouldScoreZeroButNotSkipEarly() {
        let commits = vec![commit(CommitType::Chore), commit(CommitType::Docs)];

        let result =
            Significance::calculate(&ScoringConfig::default(), &commits, false, false, false);

        assert_eq!(result.status, ProjectStatus::Skip);
        assert_eq!(result.change_score, 0);
        assert_eq!(result.change_reason, "low_significance");
    }

    #[test]
    fn test_calculate_withReadmeChange_shouldAddWeight() {
        let commits = vec![commit(CommitType::Fix)];

        let result =
            Significance::calculate(&ScoringConfig::default(), &commits, false, true, false);

        // 40 + 15 = 55 >= 50
        assert_eq!(result.status, ProjectStatus::Update);
        assert_eq!(result.change_score, 55);
        assert_eq!(result.change_reason, "readme_changed");
    }

    #[test]
    fn test_calculate_withCustomThreshold_shouldRespectIt() {
        let scoring = ScoringConfig {
            update_threshold: 10,
            ..Default::default()
        };
        let commits = vec![commit(CommitType::Fix)];

        let result = Significance::calculate(&scoring, &commits, false, false, false);

        assert_eq!(result.status, ProjectStatus::Update);
    }
}
