/*!
 * Workspace file management.
 *
 * All run artifacts live under a workspace root:
 * - `_data/context.json` - collector output
 * - `drafts/<slug>.html` - candidate pages
 * - `reviews/<slug>_verdict.json` - verdicts
 * - `reports/summary-<run-id>.md` - run summaries
 *
 * Writes are atomic: content goes to a temp file in the target directory
 * first, then is persisted into place, so a crash never leaves a partial
 * artifact behind.
 */

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use walkdir::WalkDir;

/// Directory for machine-readable phase outputs
const DATA_DIR: &str = "_data";

/// Directory for candidate pages
const DRAFTS_DIR: &str = "drafts";

/// Directory for verdicts
const REVIEWS_DIR: &str = "reviews";

/// Directory for run summaries
const REPORTS_DIR: &str = "reports";

/// Workspace for run artifacts
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Create a workspace rooted at the given directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Workspace root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn dir(&self, name: &str) -> Result<PathBuf> {
        let dir = self.root.join(name);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create directory: {:?}", dir))?;
        Ok(dir)
    }

    /// Path of the collector context file
    pub fn context_path(&self) -> PathBuf {
        self.root.join(DATA_DIR).join("context.json")
    }

    /// Path of a draft page
    pub fn draft_path(&self, slug: &str) -> PathBuf {
        self.root.join(DRAFTS_DIR).join(format!("{}.html", slug))
    }

    /// Path of a verdict file
    pub fn verdict_path(&self, slug: &str) -> PathBuf {
        self.root
            .join(REVIEWS_DIR)
            .join(format!("{}_verdict.json", slug))
    }

    /// Path of a run summary report
    pub fn report_path(&self, run_id: &str) -> PathBuf {
        self.root
            .join(REPORTS_DIR)
            .join(format!("summary-{}.md", run_id))
    }

    /// Atomically write text into the workspace
    pub fn write_text(&self, path: &Path, content: &str) -> Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Path has no parent: {:?}", path))?;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;

        let mut temp = tempfile::NamedTempFile::new_in(parent)
            .with_context(|| format!("Failed to create temp file in {:?}", parent))?;

        use std::io::Write;
        temp.write_all(content.as_bytes())
            .context("Failed to write temp file")?;
        temp.persist(path)
            .with_context(|| format!("Failed to persist {:?}", path))?;

        debug!("Wrote {:?} ({} bytes)", path, content.len());
        Ok(())
    }

    /// Read text from a workspace file
    pub fn read_text(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))
    }

    /// Atomically write a value as pretty-printed JSON
    pub fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value).context("Failed to serialize JSON")?;
        self.write_text(path, &json)
    }

    /// Read and parse a JSON file, None when it does not exist
    pub fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = self.read_text(path)?;
        let value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON from {:?}", path))?;
        Ok(Some(value))
    }

    /// List slugs of all saved drafts
    pub fn list_draft_slugs(&self) -> Result<Vec<String>> {
        let drafts = self.root.join(DRAFTS_DIR);
        if !drafts.exists() {
            return Ok(Vec::new());
        }

        let mut slugs: Vec<String> = WalkDir::new(&drafts)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| {
                e.file_name()
                    .to_str()
                    .and_then(|name| name.strip_suffix(".html"))
                    .map(|s| s.to_string())
            })
            .collect();

        slugs.sort();
        Ok(slugs)
    }

    /// Ensure all workspace directories exist
    pub fn ensure_layout(&self) -> Result<()> {
        self.dir(DATA_DIR)?;
        self.dir(DRAFTS_DIR)?;
        self.dir(REVIEWS_DIR)?;
        self.dir(REPORTS_DIR)?;
        Ok(())
    }
}
