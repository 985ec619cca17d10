use std::path::PathBuf;

use anyhow::{Result, bail};

use docpub_environment::CiContext;

use crate::runner::{CommandRunner, run_redacted};

pub trait Reporter {
    fn info(&mut self, msg: &str);
    fn warn(&mut self, msg: &str);
    fn error(&mut self, msg: &str);
}

/// Entrypoint script inside the mirroring tool's repository.
pub const MIRROR_SCRIPT: &str = "ghp_import.py";

/// Where the docs come from and where they go.
#[derive(Debug, Clone)]
pub struct PublishOptions {
    /// Directory of generated files to publish (an opaque blob of files).
    pub artifact_dir: PathBuf,
    /// Branch served as the documentation site.
    pub hosting_branch: String,
    /// Repository of the mirroring tool, cloned fresh every run.
    pub mirror_repo: String,
    /// Local clone destination for the mirroring tool.
    pub mirror_dir: PathBuf,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            artifact_dir: PathBuf::from("target/doc"),
            hosting_branch: "gh-pages".to_string(),
            mirror_repo: "https://github.com/davisp/ghp-import".to_string(),
            mirror_dir: PathBuf::from("deploy_docs"),
        }
    }
}

/// Commit message recorded on the hosting branch.
pub fn commit_message(repo_slug: &str, short_commit: &str) -> String {
    format!("Documentation for {repo_slug}@{short_commit}")
}

/// Short commit identifier of the current checkout.
pub fn short_head(runner: &mut dyn CommandRunner) -> Result<String> {
    let result = runner.run_capturing("git", &["rev-parse", "--short", "HEAD"])?;
    if !result.success {
        bail!("git rev-parse failed: {}", result.stderr.trim());
    }
    Ok(result.stdout.trim().to_string())
}

/// Push the artifact directory to the hosting branch.
///
/// Strictly ordered, each step a blocking external command; the first
/// failure aborts the rest. A partially created local commit with no push
/// is an acceptable terminal state — it only affects the disposable CI
/// workspace. The push goes through [`run_redacted`] because the remote URL
/// embeds the token and any failure diagnostic would otherwise leak it.
pub fn publish(
    ctx: &CiContext,
    opts: &PublishOptions,
    runner: &mut dyn CommandRunner,
    reporter: &mut dyn Reporter,
) -> Result<()> {
    let short = short_head(runner)?;
    let message = commit_message(&ctx.repo_slug, &short);

    reporter.info(&format!("fetching mirroring tool from {}...", opts.mirror_repo));
    let mirror_dir = opts.mirror_dir.display().to_string();
    let clone = runner.run("git", &["clone", &opts.mirror_repo, &mirror_dir])?;
    if !clone.success {
        bail!(
            "cloning the mirroring tool failed with exit code {:?}",
            clone.exit_code
        );
    }

    reporter.info(&format!(
        "importing {} onto {}...",
        opts.artifact_dir.display(),
        opts.hosting_branch
    ));
    let script = opts.mirror_dir.join(MIRROR_SCRIPT).display().to_string();
    let artifact_dir = opts.artifact_dir.display().to_string();
    let import = runner.run(&script, &["-n", "-m", &message, &artifact_dir])?;
    if !import.success {
        bail!(
            "documentation import failed with exit code {:?}",
            import.exit_code
        );
    }

    reporter.info(&format!("pushing documentation to {}...", opts.hosting_branch));
    let remote = format!(
        "https://{}@github.com/{}.git",
        ctx.auth_token.expose(),
        ctx.repo_slug
    );
    let push = run_redacted(
        runner,
        &ctx.auth_token,
        "git",
        &["push", "-fq", &remote, &opts.hosting_branch],
    )?;
    if !push.success {
        bail!(
            "push to {} failed with exit code {:?}: {}",
            opts.hosting_branch,
            push.exit_code,
            push.stderr.trim()
        );
    }

    reporter.info("documentation published");
    Ok(())
}
