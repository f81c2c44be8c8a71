/*!
 * Writer prompt template for page drafting.
 *
 * The prompt carries the whole contract: source-of-truth discipline,
 * manual region protection, policy limits, and the required output shape.
 * Whatever the model does anyway is caught downstream by re-injection and
 * the validator.
 */

use crate::app_config::PolicyConfig;
use crate::collector::models::ProjectContext;

/// System prompt for the page writer.
pub const PAGE_WRITER: &str = r#"You are a technical writer maintaining project pages for a portfolio site.

## Your Role
- Update the given HTML page using ONLY the project data provided
- Rewrite only these parts: the summary, the language/technology badges, the changelog list, and the status indicator
- Keep the overall document structure: navigation, external links, and section ordering stay exactly where they are

## Hard Rules
- Never invent features, dates, versions, or capabilities that are not in the project data
- Never modify anything between <!-- MANUAL:name --> and <!-- /MANUAL:name --> markers; copy those spans through unchanged
- The summary must not exceed {max_summary_length} characters
- Tone: {tone}. No superlatives, no marketing language
- Never use any of these words: {forbidden_words}
- If the project has no releases, say so explicitly ("No releases yet") instead of leaving the status out or inventing one
- Keep every section with these ids present: {required_sections}

## Output Requirements
- Return ONLY the complete HTML document
- No markdown code fences, no commentary before or after the HTML"#;

/// Render the writer system prompt from the policy
pub fn render_system_prompt(policy: &PolicyConfig) -> String {
    PAGE_WRITER
        .replace("{max_summary_length}", &policy.max_summary_length.to_string())
        .replace("{tone}", &policy.tone)
        .replace("{forbidden_words}", &policy.forbidden_words.join(", "))
        .replace("{required_sections}", &policy.required_sections.join(", "))
}

/// Builder for the user-turn drafting prompt.
///
/// Lays out the collected project data, then the current page HTML the
/// model is updating.
#[derive(Debug, Clone)]
pub struct DraftPromptBuilder<'a> {
    context: &'a ProjectContext,
    published_html: &'a str,
}

impl<'a> DraftPromptBuilder<'a> {
    /// Create a builder for one project
    pub fn new(context: &'a ProjectContext, published_html: &'a str) -> Self {
        Self {
            context,
            published_html,
        }
    }

    /// Render the full drafting prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();
        let ctx = self.context;

        prompt.push_str("# PROJECT DATA (source of truth)\n\n");
        prompt.push_str(&format!("Slug: {}\n", ctx.slug));
        prompt.push_str(&format!("Repository: {}\n", ctx.repo));
        if !ctx.description.is_empty() {
            prompt.push_str(&format!("Description: {}\n", ctx.description));
        }
        prompt.push_str(&format!("Stars: {} | Forks: {}\n", ctx.stars, ctx.forks));

        if ctx.languages.is_empty() {
            prompt.push_str("Languages: (none reported)\n");
        } else {
            prompt.push_str(&format!("Languages: {}\n", ctx.languages.join(", ")));
        }

        prompt.push_str("\n## Releases\n");
        if ctx.releases.is_empty() {
            prompt.push_str("None. The page must state that there are no releases yet.\n");
        } else {
            for release in &ctx.releases {
                prompt.push_str(&format!(
                    "- {} ({}){}\n",
                    release.tag,
                    release.date.as_deref().unwrap_or("unpublished"),
                    if release.prerelease { " [prerelease]" } else { "" }
                ));
            }
        }

        prompt.push_str("\n## Recent commits\n");
        if ctx.commits.is_empty() {
            prompt.push_str("None in the lookback window. The changelog must say there are no recent updates.\n");
        } else {
            for commit in &ctx.commits {
                prompt.push_str(&format!("- {} {}\n", commit.date, commit.message));
            }
        }

        if !ctx.readme_excerpt.is_empty() {
            prompt.push_str("\n## README excerpt\n");
            prompt.push_str(&ctx.readme_excerpt);
            prompt.push('\n');
        }

        prompt.push_str("\n# CURRENT PAGE HTML\n\n");
        prompt.push_str(self.published_html);
        prompt.push_str("\n\nReturn the updated page now.");

        prompt
    }
}
