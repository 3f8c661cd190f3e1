//! Remote mirror - pushes the CSV log to a GitHub repository after a save

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::MirrorSettings;

/// Best-effort copy of the log somewhere else
pub trait Mirror {
    fn push(&self, file: &Path) -> Result<()>;
}

const API_BASE: &str = "https://api.github.com";
const COMMIT_MESSAGE: &str = "Update exercise log";

/// GitHub contents API mirror
pub struct GitHubMirror {
    client: Client,
    api_base: String,
    repo: String,
    branch: String,
    path: Option<String>,
    token: String,
}

#[derive(Deserialize)]
struct ContentInfo {
    sha: String,
}

#[derive(Serialize)]
struct UpdateRequest<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<String>,
}

impl GitHubMirror {
    /// Mirror from settings; `None` when no repository is configured
    pub fn from_settings(settings: &MirrorSettings) -> Result<Option<Self>> {
        let Some(repo) = settings.repo.clone() else {
            return Ok(None);
        };
        let Some(token) = settings.token.clone().filter(|t| !t.is_empty()) else {
            bail!("mirror repository {} is set but GITHUB_TOKEN is not", repo);
        };
        Ok(Some(Self::new(repo, settings.branch.clone(), settings.path.clone(), token)?))
    }

    pub fn new(repo: String, branch: String, path: Option<String>, token: String) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            api_base: API_BASE.to_string(),
            repo,
            branch,
            path,
            token,
        })
    }

    /// Point at a different API host (GitHub Enterprise)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn remote_path(&self, file: &Path) -> Result<String> {
        if let Some(path) = &self.path {
            return Ok(path.trim_start_matches('/').to_string());
        }
        file.file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .context("log file has no usable name")
    }

    fn contents_url(&self, remote_path: &str) -> String {
        format!("{}/repos/{}/contents/{}", self.api_base, self.repo, remote_path)
    }

    fn request(&self, builder: reqwest::blocking::RequestBuilder) -> reqwest::blocking::RequestBuilder {
        builder
            .header(AUTHORIZATION, format!("token {}", self.token))
            .header(ACCEPT, "application/vnd.github+json")
            .header(USER_AGENT, concat!("liftlog/", env!("CARGO_PKG_VERSION")))
    }

    /// Blob sha of the current remote file, needed to overwrite it
    fn current_sha(&self, url: &str) -> Result<Option<String>> {
        let response = self
            .request(self.client.get(url))
            .query(&[("ref", self.branch.as_str())])
            .send()?;
        match response.status() {
            StatusCode::OK => Ok(Some(response.json::<ContentInfo>()?.sha)),
            StatusCode::NOT_FOUND => Ok(None),
            status => bail!("GitHub returned {} for {}", status, url),
        }
    }
}

impl Mirror for GitHubMirror {
    fn push(&self, file: &Path) -> Result<()> {
        let content = std::fs::read(file)
            .with_context(|| format!("cannot read {}", file.display()))?;
        let remote_path = self.remote_path(file)?;
        let url = self.contents_url(&remote_path);

        let body = UpdateRequest {
            message: COMMIT_MESSAGE,
            content: STANDARD.encode(content),
            branch: &self.branch,
            sha: self.current_sha(&url)?,
        };

        let response = self.request(self.client.put(&url)).json(&body).send()?;
        let status = response.status();
        if status == StatusCode::OK || status == StatusCode::CREATED {
            info!("Mirrored {} to {}:{}", file.display(), self.repo, remote_path);
            Ok(())
        } else {
            let detail = response.text().unwrap_or_default();
            bail!("failed to update {} on GitHub ({}): {}", remote_path, status, detail)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_mirror(path: Option<&str>) -> GitHubMirror {
        GitHubMirror::new(
            "someone/workouts".to_string(),
            "main".to_string(),
            path.map(str::to_string),
            "secret".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_not_configured() {
        let settings = MirrorSettings { repo: None, branch: "main".into(), path: None, token: None };
        assert!(GitHubMirror::from_settings(&settings).unwrap().is_none());
    }

    #[test]
    fn test_repo_without_token_rejected() {
        let settings = MirrorSettings {
            repo: Some("someone/workouts".into()),
            branch: "main".into(),
            path: None,
            token: None,
        };
        assert!(GitHubMirror::from_settings(&settings).is_err());
    }

    #[test]
    fn test_remote_path_defaults_to_file_name() {
        let mirror = create_mirror(None);
        let path = mirror.remote_path(Path::new("/var/lib/liftlog/exercise_log.csv")).unwrap();
        assert_eq!(path, "exercise_log.csv");
        assert_eq!(
            mirror.contents_url(&path),
            "https://api.github.com/repos/someone/workouts/contents/exercise_log.csv"
        );
    }

    #[test]
    fn test_remote_path_override() {
        let mirror = create_mirror(Some("/logs/gym.csv")).with_api_base("http://localhost:9/api/");
        let path = mirror.remote_path(Path::new("exercise_log.csv")).unwrap();
        assert_eq!(mirror.contents_url(&path), "http://localhost:9/api/repos/someone/workouts/contents/logs/gym.csv");
    }

    #[test]
    fn test_update_request_omits_missing_sha() {
        let body = UpdateRequest {
            message: COMMIT_MESSAGE,
            content: STANDARD.encode("a,b\n"),
            branch: "main",
            sha: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["content"], "YSxiCg==");
        assert!(json.get("sha").is_none());
    }

    #[test]
    fn test_push_missing_file_fails() {
        let mirror = create_mirror(None);
        assert!(mirror.push(Path::new("/nonexistent/exercise_log.csv")).is_err());
    }
}
