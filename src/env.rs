//! Build provenance read from the GitHub Actions environment.
//!
//! Lookups go through [`EnvSource`] so callers (and tests) can supply a
//! fixed environment instead of the real process one.

use std::collections::HashMap;

use clap::ValueEnum;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

pub const PROVIDER: &str = "github";

/// A source of environment variables.
pub trait EnvSource {
    fn var(&self, key: &str) -> Option<String>;

    /// Like [`EnvSource::var`], but absent variables read as `""`.
    fn var_or_empty(&self, key: &str) -> String {
        self.var(key).unwrap_or_default()
    }
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Which variable identifies the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum RepoIdScheme {
    /// `GITHUB_REPOSITORY` ("owner/repo"), split into `owner` and `repo`.
    #[default]
    Repository,
    /// `GITHUB_REPOSITORY_ID`, the numeric repository id.
    RepositoryId,
}

/// Snapshot of where and how this build ran.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Provenance {
    pub provider: String,
    #[serde(rename = "repoID")]
    pub repo_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    pub sha: String,
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub workflow: String,
    pub run_id: String,
    pub run_attempt: String,
}

impl Provenance {
    pub fn from_env(env: &dyn EnvSource, scheme: RepoIdScheme) -> Self {
        let (repo_id, owner, repo) = match scheme {
            RepoIdScheme::Repository => {
                let repository = env.var_or_empty("GITHUB_REPOSITORY");
                let (owner, repo) = match repository.split_once('/') {
                    Some((owner, repo)) => (owner.to_string(), Some(repo.to_string())),
                    None => (repository.clone(), None),
                };
                (repository, Some(owner), repo)
            }
            RepoIdScheme::RepositoryId => (env.var_or_empty("GITHUB_REPOSITORY_ID"), None, None),
        };

        Self {
            provider: PROVIDER.to_string(),
            repo_id,
            owner,
            repo,
            sha: env.var_or_empty("GITHUB_SHA"),
            git_ref: env.var_or_empty("GITHUB_REF"),
            workflow: env.var_or_empty("GITHUB_WORKFLOW"),
            run_id: env.var_or_empty("GITHUB_RUN_ID"),
            run_attempt: env.var_or_empty("GITHUB_RUN_ATTEMPT"),
        }
    }

    /// Branch name for `refs/heads/<name>` refs (e.g. "refs/heads/main" → "main").
    pub fn branch(&self) -> Option<&str> {
        self.git_ref
            .strip_prefix("refs/heads/")
            .filter(|name| !name.is_empty())
    }

    /// The provenance as a flat JSON object, in field order.
    pub fn to_fields(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// Raw text of the triggering event payload (`GITHUB_EVENT_PATH`), read only
/// when running under GitHub Actions. Read failures are warnings.
pub fn event_payload(env: &dyn EnvSource) -> Option<String> {
    if env.var("GITHUB_ACTIONS").as_deref() != Some("true") {
        return None;
    }
    let path = env.var("GITHUB_EVENT_PATH").filter(|p| !p.is_empty())?;
    match std::fs::read_to_string(&path) {
        Ok(text) => Some(text),
        Err(e) => {
            warn!("Failed to read event payload {path}: {e}");
            None
        }
    }
}
