/*!
 * GitHub REST API client and site repository reader.
 *
 * One client serves both sides of the system: the collector reads project
 * metadata (repos, commits, releases, languages, README) and the deployer
 * writes to the site repository (branches, files, pull requests).
 */

use std::collections::HashMap;
use std::time::Duration;

use base64::Engine;
use chrono::Utc;
use log::{debug, error};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::collector::models::{CommitInfo, CommitType, PageState, ReleaseInfo};
use crate::errors::GitHubError;
use crate::page::PageDocument;

/// Default GitHub API base URL
const API_URL: &str = "https://api.github.com";

/// Raw content base URL
const RAW_URL: &str = "https://raw.githubusercontent.com";

/// GitHub REST API client
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: Client,
    api_url: String,
    token: Option<String>,
}

/// Repository metadata subset used by the collector
#[derive(Debug, Clone, Deserialize)]
pub struct RepoMetadata {
    /// Repository description
    pub description: Option<String>,
    /// Star count
    #[serde(default)]
    pub stargazers_count: u32,
    /// Fork count
    #[serde(default)]
    pub forks_count: u32,
    /// Default branch name
    #[serde(default = "default_branch_name")]
    pub default_branch: String,
}

fn default_branch_name() -> String {
    "main".to_string()
}

/// README content and metadata
#[derive(Debug, Clone, Default)]
pub struct ReadmeContent {
    /// Raw README text (empty when the repo has none)
    pub content: String,
    /// Git blob sha of the README
    pub sha: Option<String>,
}

/// An entry in a repository directory listing
#[derive(Debug, Clone, Deserialize)]
pub struct ContentEntry {
    /// File or directory name
    pub name: String,
    /// Path relative to the repository root
    pub path: String,
    /// Git blob sha
    pub sha: String,
    /// Entry type ("file" or "dir")
    #[serde(rename = "type")]
    pub entry_type: String,
}

#[derive(Debug, Deserialize)]
struct CommitItem {
    sha: String,
    commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    message: String,
    author: CommitAuthor,
}

#[derive(Debug, Deserialize)]
struct CommitAuthor {
    name: String,
    date: String,
}

#[derive(Debug, Deserialize)]
struct ReleaseItem {
    tag_name: String,
    name: Option<String>,
    published_at: Option<String>,
    body: Option<String>,
    prerelease: bool,
    draft: bool,
}

#[derive(Debug, Deserialize)]
struct ReadmeMetadata {
    sha: String,
    download_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    full_name: String,
}

#[derive(Debug, Deserialize)]
struct RefResponse {
    object: RefObject,
}

#[derive(Debug, Deserialize)]
struct RefObject {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct PullResponse {
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct ContentShaResponse {
    sha: String,
}

impl GitHubClient {
    /// Create a client using the given token, falling back to `GITHUB_TOKEN`
    pub fn new(token: Option<String>) -> Self {
        Self::new_with_api_url(token, API_URL)
    }

    /// Create a client against a custom API base URL (used in tests)
    pub fn new_with_api_url(token: Option<String>, api_url: impl Into<String>) -> Self {
        let token = token.or_else(|| std::env::var("GITHUB_TOKEN").ok());

        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .user_agent("pagesmith")
                .build()
                .unwrap_or_default(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token,
        }
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(method, url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");

        if let Some(token) = &self.token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }

        builder
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, GitHubError> {
        let response = self
            .request(reqwest::Method::GET, url)
            .send()
            .await
            .map_err(|e| GitHubError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(GitHubError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("GitHub API error ({}): {}", status, message);
            return Err(GitHubError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| GitHubError::RequestFailed(format!("parse error: {}", e)))
    }

    async fn send_json(
        &self,
        method: reqwest::Method,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response, GitHubError> {
        let response = self
            .request(method, url)
            .json(body)
            .send()
            .await
            .map_err(|e| GitHubError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("GitHub API error ({}): {}", status, message);
            return Err(GitHubError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    /// Fetch repository metadata
    pub async fn get_repo(&self, owner: &str, repo: &str) -> Result<RepoMetadata, GitHubError> {
        let url = format!("{}/repos/{}/{}", self.api_url, owner, repo);
        self.get_json(&url).await
    }

    /// Fetch recent commits within the trailing lookback window
    pub async fn get_commits(
        &self,
        owner: &str,
        repo: &str,
        since_days: i64,
    ) -> Result<Vec<CommitInfo>, GitHubError> {
        let since = (Utc::now() - chrono::Duration::days(since_days)).to_rfc3339();
        let url = format!(
            "{}/repos/{}/{}/commits?since={}&per_page=100",
            self.api_url, owner, repo, since
        );

        let items: Vec<CommitItem> = match self.get_json(&url).await {
            Ok(items) => items,
            // A repo with no commits in the window answers 404 on some
            // mirrors; treat it as empty rather than failing collection
            Err(GitHubError::NotFound(_)) => Vec::new(),
            Err(e) => return Err(e),
        };

        Ok(Self::commits_from_items(items))
    }

    fn commits_from_items(items: Vec<CommitItem>) -> Vec<CommitInfo> {
        items
            .into_iter()
            .map(|item| {
                let message = item
                    .commit
                    .message
                    .lines()
                    .next()
                    .unwrap_or_default()
                    .to_string();
                let commit_type = CommitType::parse_message(&message);

                CommitInfo {
                    sha: item.sha.chars().take(7).collect(),
                    date: item.commit.author.date.chars().take(10).collect(),
                    message,
                    commit_type,
                    author: item.commit.author.name,
                }
            })
            .collect()
    }

    /// Fetch recent published releases (drafts excluded)
    pub async fn get_releases(
        &self,
        owner: &str,
        repo: &str,
        limit: usize,
    ) -> Result<Vec<ReleaseInfo>, GitHubError> {
        let url = format!(
            "{}/repos/{}/{}/releases?per_page={}",
            self.api_url, owner, repo, limit
        );

        let items: Vec<ReleaseItem> = match self.get_json(&url).await {
            Ok(items) => items,
            Err(GitHubError::NotFound(_)) => Vec::new(),
            Err(e) => return Err(e),
        };

        Ok(Self::releases_from_items(items))
    }

    fn releases_from_items(items: Vec<ReleaseItem>) -> Vec<ReleaseInfo> {
        items
            .into_iter()
            .filter(|item| !item.draft)
            .map(|item| {
                let mut notes = item.body.unwrap_or_default();
                notes.truncate(
                    notes
                        .char_indices()
                        .nth(500)
                        .map(|(i, _)| i)
                        .unwrap_or(notes.len()),
                );

                ReleaseInfo {
                    name: item.name.clone().unwrap_or_else(|| item.tag_name.clone()),
                    tag: item.tag_name,
                    date: item.published_at.map(|d| d.chars().take(10).collect()),
                    notes,
                    prerelease: item.prerelease,
                }
            })
            .collect()
    }

    /// Fetch repository languages sorted by usage, descending
    pub async fn get_languages(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<String>, GitHubError> {
        let url = format!("{}/repos/{}/{}/languages", self.api_url, owner, repo);
        let languages: HashMap<String, u64> = self.get_json(&url).await?;
        Ok(Self::languages_from_map(languages))
    }

    fn languages_from_map(languages: HashMap<String, u64>) -> Vec<String> {
        let mut sorted: Vec<(String, u64)> = languages.into_iter().collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        sorted.into_iter().map(|(lang, _)| lang).collect()
    }

    /// Fetch README content and metadata; missing README yields empty content
    pub async fn get_readme(&self, owner: &str, repo: &str) -> Result<ReadmeContent, GitHubError> {
        let url = format!("{}/repos/{}/{}/readme", self.api_url, owner, repo);

        let meta: ReadmeMetadata = match self.get_json(&url).await {
            Ok(meta) => meta,
            Err(GitHubError::NotFound(_)) => return Ok(ReadmeContent::default()),
            Err(e) => return Err(e),
        };

        let Some(download_url) = meta.download_url else {
            return Ok(ReadmeContent {
                content: String::new(),
                sha: Some(meta.sha),
            });
        };

        let content = self
            .client
            .get(&download_url)
            .send()
            .await
            .map_err(|e| GitHubError::RequestFailed(e.to_string()))?
            .text()
            .await
            .map_err(|e| GitHubError::RequestFailed(e.to_string()))?;

        Ok(ReadmeContent {
            content,
            sha: Some(meta.sha),
        })
    }

    /// Fetch a file's raw content from a branch; None when it does not exist
    pub async fn get_file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        branch: &str,
    ) -> Result<Option<String>, GitHubError> {
        let url = format!("{}/{}/{}/{}/{}", RAW_URL, owner, repo, branch, path);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| GitHubError::RequestFailed(e.to_string()))?;

        if response.status().as_u16() == 404 {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(GitHubError::ApiError {
                status_code: response.status().as_u16(),
                message: format!("raw fetch failed for {}", path),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| GitHubError::RequestFailed(e.to_string()))?;
        Ok(Some(text))
    }

    /// List a repository directory; missing directories yield an empty list
    pub async fn list_dir(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        branch: &str,
    ) -> Result<Vec<ContentEntry>, GitHubError> {
        let url = format!(
            "{}/repos/{}/{}/contents/{}?ref={}",
            self.api_url,
            owner,
            repo,
            path.trim_end_matches('/'),
            branch
        );

        match self.get_json(&url).await {
            Ok(entries) => Ok(entries),
            Err(GitHubError::NotFound(_)) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    /// Search repositories owned by `owner` carrying `topic`
    pub async fn search_repos_by_topic(
        &self,
        owner: &str,
        topic: &str,
    ) -> Result<Vec<String>, GitHubError> {
        let url = Url::parse_with_params(
            &format!("{}/search/repositories", self.api_url),
            &[
                ("q", format!("topic:{} user:{}", topic, owner)),
                ("per_page", "100".to_string()),
            ],
        )
        .map_err(|e| GitHubError::RequestFailed(e.to_string()))?;

        let response: SearchResponse = self.get_json(url.as_str()).await?;
        Ok(response.items.into_iter().map(|i| i.full_name).collect())
    }

    /// Get the current blob sha of a file, if it exists
    pub async fn get_content_sha(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        branch: &str,
    ) -> Result<Option<String>, GitHubError> {
        let url = format!(
            "{}/repos/{}/{}/contents/{}?ref={}",
            self.api_url, owner, repo, path, branch
        );

        match self.get_json::<ContentShaResponse>(&url).await {
            Ok(response) => Ok(Some(response.sha)),
            Err(GitHubError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Get the head commit sha of a branch
    pub async fn get_branch_sha(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<String, GitHubError> {
        let url = format!(
            "{}/repos/{}/{}/git/ref/heads/{}",
            self.api_url, owner, repo, branch
        );
        let response: RefResponse = self.get_json(&url).await?;
        Ok(response.object.sha)
    }

    /// Create a branch at the given sha, replacing a stale one if present
    pub async fn create_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        sha: &str,
    ) -> Result<(), GitHubError> {
        let url = format!("{}/repos/{}/{}/git/refs", self.api_url, owner, repo);
        let body = json!({
            "ref": format!("refs/heads/{}", branch),
            "sha": sha,
        });

        match self.send_json(reqwest::Method::POST, &url, &body).await {
            Ok(_) => Ok(()),
            // 422: branch already exists from an earlier run; recreate it
            Err(GitHubError::ApiError { status_code: 422, .. }) => {
                debug!("Branch {} already exists, recreating", branch);
                self.delete_branch(owner, repo, branch).await?;
                self.send_json(reqwest::Method::POST, &url, &body)
                    .await
                    .map(|_| ())
            }
            Err(e) => Err(e),
        }
    }

    /// Delete a branch
    pub async fn delete_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<(), GitHubError> {
        let url = format!(
            "{}/repos/{}/{}/git/refs/heads/{}",
            self.api_url, owner, repo, branch
        );

        let response = self
            .request(reqwest::Method::DELETE, &url)
            .send()
            .await
            .map_err(|e| GitHubError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() && response.status().as_u16() != 404 {
            return Err(GitHubError::ApiError {
                status_code: response.status().as_u16(),
                message: format!("failed to delete branch {}", branch),
            });
        }

        Ok(())
    }

    /// Create or update a file on a branch.
    ///
    /// `existing_sha` must be the current blob sha when updating; None
    /// creates the file.
    pub async fn put_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        branch: &str,
        message: &str,
        content: &str,
        existing_sha: Option<&str>,
    ) -> Result<(), GitHubError> {
        let url = format!("{}/repos/{}/{}/contents/{}", self.api_url, owner, repo, path);

        let encoded = base64::engine::general_purpose::STANDARD.encode(content.as_bytes());
        let mut body = json!({
            "message": message,
            "content": encoded,
            "branch": branch,
        });
        if let Some(sha) = existing_sha {
            body["sha"] = json!(sha);
        }

        self.send_json(reqwest::Method::PUT, &url, &body)
            .await
            .map(|_| ())
    }

    /// Open a pull request and return its URL
    pub async fn create_pull(
        &self,
        owner: &str,
        repo: &str,
        title: &str,
        body_text: &str,
        head: &str,
        base: &str,
    ) -> Result<String, GitHubError> {
        let url = format!("{}/repos/{}/{}/pulls", self.api_url, owner, repo);
        let body = json!({
            "title": title,
            "body": body_text,
            "head": head,
            "base": base,
        });

        let response = self.send_json(reqwest::Method::POST, &url, &body).await?;
        let pull: PullResponse = response
            .json()
            .await
            .map_err(|e| GitHubError::RequestFailed(format!("parse error: {}", e)))?;

        Ok(pull.html_url)
    }
}

/// Reader for the published state of the site repository
#[derive(Debug, Clone)]
pub struct SiteClient {
    github: GitHubClient,
    owner: String,
    repo: String,
    branch: String,
}

impl SiteClient {
    /// Create a site client for `owner/name` on the given branch
    pub fn new(github: GitHubClient, repo_full_name: String, branch: String) -> Self {
        let (owner, repo) = repo_full_name
            .split_once('/')
            .map(|(o, r)| (o.to_string(), r.to_string()))
            .unwrap_or((String::new(), repo_full_name));

        Self {
            github,
            owner,
            repo,
            branch,
        }
    }

    /// Build an index of existing project pages under `output_dir`.
    ///
    /// Keys are page slugs (file names without the `.html` extension).
    pub async fn page_index(
        &self,
        output_dir: &str,
    ) -> Result<HashMap<String, PageState>, GitHubError> {
        let mut index = HashMap::new();

        let entries = self
            .github
            .list_dir(&self.owner, &self.repo, output_dir, &self.branch)
            .await?;

        for entry in entries {
            if entry.entry_type != "file" || !entry.name.ends_with(".html") {
                continue;
            }

            let slug = entry.name.trim_end_matches(".html").to_string();
            let content = self
                .github
                .get_file_content(&self.owner, &self.repo, &entry.path, &self.branch)
                .await?;

            let state = match content {
                Some(html) => {
                    let page = PageDocument::new(html.clone());
                    PageState {
                        exists: true,
                        locked: page.is_locked(),
                        path: Some(entry.path),
                        sha: Some(entry.sha),
                        last_deploy: page.deploy_date(),
                        content: Some(html),
                    }
                }
                None => PageState::default(),
            };

            index.insert(slug, state);
        }

        Ok(index)
    }
}
