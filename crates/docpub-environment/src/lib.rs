//! CI environment detection and build context resolution for docpub.
//!
//! Every environment variable read in docpub happens here: the publish
//! decision and the publish sequence both take an explicit [`CiContext`]
//! value instead of reaching into the ambient environment themselves.
//!
//! # Example
//!
//! ```no_run
//! use docpub_environment::{detect_provider, resolve_context};
//!
//! // Which CI system is this job running under?
//! let provider = detect_provider();
//! println!("Running in: {provider}");
//!
//! // Resolve the full build context (fails when required variables are absent).
//! let ctx = resolve_context()?;
//! println!("building {} on {}", ctx.repo_slug, ctx.branch);
//! # anyhow::Ok(())
//! ```

use std::env;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use docpub_redact::Secret;

/// Detected CI provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CiProvider {
    /// Travis CI
    TravisCi,
    /// AppVeyor
    AppVeyor,
    /// GitHub Actions
    GitHubActions,
    /// GitLab CI
    GitLabCi,
    /// No CI detected (local)
    #[default]
    Local,
}

impl std::fmt::Display for CiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CiProvider::TravisCi => write!(f, "Travis CI"),
            CiProvider::AppVeyor => write!(f, "AppVeyor"),
            CiProvider::GitHubActions => write!(f, "GitHub Actions"),
            CiProvider::GitLabCi => write!(f, "GitLab CI"),
            CiProvider::Local => write!(f, "Local"),
        }
    }
}

/// Detect the current CI provider
pub fn detect_provider() -> CiProvider {
    if env::var("TRAVIS").is_ok() {
        return CiProvider::TravisCi;
    }

    if env::var("APPVEYOR").is_ok() {
        return CiProvider::AppVeyor;
    }

    if env::var("GITHUB_ACTIONS").is_ok() {
        return CiProvider::GitHubActions;
    }

    if env::var("GITLAB_CI").is_ok() {
        return CiProvider::GitLabCi;
    }

    CiProvider::Local
}

/// Check if running in any CI environment
pub fn is_ci() -> bool {
    detect_provider() != CiProvider::Local
}

/// The build context a publish run is decided against.
///
/// Resolved once at startup from the environment and immutable afterwards.
/// The token is held as a [`Secret`] so a stray `{:?}` of the whole context
/// cannot leak it.
#[derive(Debug, Clone)]
pub struct CiContext {
    pub provider: CiProvider,
    /// Raw toolchain version string as the CI reports it, e.g. `1.42.0-nightly`.
    pub toolchain_version: String,
    /// `owner/name` of the repository being built.
    pub repo_slug: String,
    /// Branch the job runs against.
    pub branch: String,
    /// Whether the job builds a pull request.
    pub is_pull_request: bool,
    /// Write credential for the hosting push.
    pub auth_token: Secret,
}

/// Resolve the complete build context from the current environment.
///
/// Missing repository slug, branch, or token is fatal: an unconfigured CI
/// context is an error, not a benign skip. The pull-request flag defaults
/// to "not a pull request" when absent (see [`pull_request`]).
pub fn resolve_context() -> Result<CiContext> {
    let provider = detect_provider();

    Ok(CiContext {
        provider,
        toolchain_version: toolchain_version(provider)?,
        repo_slug: repo_slug(provider)?,
        branch: branch(provider)?,
        is_pull_request: pull_request(provider),
        auth_token: auth_token()?,
    })
}

/// Resolve the toolchain version string.
///
/// `DOCPUB_RUST_VERSION` wins, then the provider's own variable, then the
/// output of `rustc --version` for providers that do not export one.
pub fn toolchain_version(provider: CiProvider) -> Result<String> {
    if let Some(v) = non_empty("DOCPUB_RUST_VERSION") {
        return Ok(v);
    }

    if provider == CiProvider::TravisCi
        && let Some(v) = non_empty("TRAVIS_RUST_VERSION")
    {
        return Ok(v);
    }

    rustc_version().context("toolchain version not found in the environment and `rustc --version` failed (set DOCPUB_RUST_VERSION)")
}

/// Resolve the `owner/name` repository slug.
pub fn repo_slug(provider: CiProvider) -> Result<String> {
    if let Some(v) = non_empty("DOCPUB_REPO_SLUG") {
        return Ok(v);
    }

    let var = match provider {
        CiProvider::TravisCi => "TRAVIS_REPO_SLUG",
        CiProvider::AppVeyor => "APPVEYOR_REPO_NAME",
        CiProvider::GitHubActions => "GITHUB_REPOSITORY",
        CiProvider::GitLabCi => "CI_PROJECT_PATH",
        CiProvider::Local => {
            bail!("no CI provider detected and DOCPUB_REPO_SLUG is not set")
        }
    };

    non_empty(var).with_context(|| format!("repository slug not found: set {var} or DOCPUB_REPO_SLUG"))
}

/// Resolve the branch the job runs against.
pub fn branch(provider: CiProvider) -> Result<String> {
    if let Some(v) = non_empty("DOCPUB_BRANCH") {
        return Ok(v);
    }

    let var = match provider {
        CiProvider::TravisCi => "TRAVIS_BRANCH",
        CiProvider::AppVeyor => "APPVEYOR_REPO_BRANCH",
        CiProvider::GitHubActions => "GITHUB_REF_NAME",
        CiProvider::GitLabCi => "CI_COMMIT_REF_NAME",
        CiProvider::Local => {
            bail!("no CI provider detected and DOCPUB_BRANCH is not set")
        }
    };

    non_empty(var).with_context(|| format!("branch not found: set {var} or DOCPUB_BRANCH"))
}

/// Resolve whether the job builds a pull request.
///
/// Normalization rule: a value that is absent, empty, or the literal string
/// `"false"` means "not a pull request"; anything else (a PR number,
/// `"true"`) means the build runs against one. Providers that signal PRs
/// through an event name or a dedicated variable are mapped onto the same
/// rule.
pub fn pull_request(provider: CiProvider) -> bool {
    if let Ok(v) = env::var("DOCPUB_PULL_REQUEST") {
        return is_pr_value(Some(v));
    }

    match provider {
        CiProvider::TravisCi => is_pr_value(env::var("TRAVIS_PULL_REQUEST").ok()),
        CiProvider::AppVeyor => is_pr_value(env::var("APPVEYOR_PULL_REQUEST_NUMBER").ok()),
        CiProvider::GitHubActions => {
            env::var("GITHUB_EVENT_NAME").map(|v| v == "pull_request").unwrap_or(false)
        }
        CiProvider::GitLabCi => non_empty("CI_MERGE_REQUEST_ID").is_some(),
        CiProvider::Local => false,
    }
}

fn is_pr_value(value: Option<String>) -> bool {
    match value {
        None => false,
        Some(v) => {
            let v = v.trim();
            !v.is_empty() && v != "false"
        }
    }
}

/// Resolve the write credential for the hosting push.
///
/// Checked in order: `DOCPUB_TOKEN`, `GH_TOKEN`, `GITHUB_TOKEN`. Absence is
/// fatal; the error names the variables but never echoes a value.
pub fn auth_token() -> Result<Secret> {
    for var in ["DOCPUB_TOKEN", "GH_TOKEN", "GITHUB_TOKEN"] {
        if let Some(v) = non_empty(var) {
            return Ok(Secret::new(v));
        }
    }

    bail!("no auth token found: set GH_TOKEN (or GITHUB_TOKEN, DOCPUB_TOKEN)")
}

/// Whether an auth token is present, without resolving it.
pub fn token_detected() -> bool {
    auth_token().is_ok()
}

/// Get the toolchain version by asking the local `rustc`
pub fn rustc_version() -> Result<String> {
    let output = std::process::Command::new("rustc")
        .args(["--version"])
        .output()
        .context("failed to run rustc")?;

    if output.status.success() {
        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(version)
    } else {
        Err(anyhow::anyhow!("failed to get rustc version"))
    }
}

fn non_empty(var: &str) -> Option<String> {
    match env::var(var) {
        Ok(v) => {
            let v = v.trim().to_string();
            if v.is_empty() { None } else { Some(v) }
        }
        Err(_) => None,
    }
}
