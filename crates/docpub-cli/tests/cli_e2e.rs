#![cfg(unix)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::tempdir;

const TOKEN: &str = "sekrit123";

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("mkdir");
    }
    fs::write(path, content).expect("write");
}

/// A fake `git` that logs every invocation, answers `rev-parse` with a fixed
/// short commit, materializes the mirroring script on `clone`, and fails
/// `push` (echoing the token, as a real remote would) when
/// `DOCPUB_FAKE_PUSH_EXIT` is set.
fn create_fake_git(bin_dir: &Path) {
    use std::os::unix::fs::PermissionsExt;

    let path = bin_dir.join("git");
    fs::write(
        &path,
        r#"#!/usr/bin/env sh
log="${DOCPUB_FAKE_GIT_LOG:-/dev/null}"
echo "git $*" >> "$log"
case "$1" in
  rev-parse)
    echo "abc1234"
    ;;
  clone)
    dest="$3"
    mkdir -p "$dest"
    cat > "$dest/ghp_import.py" <<'EOF'
#!/usr/bin/env sh
echo "ghp-import $*" >> "${DOCPUB_FAKE_GIT_LOG:-/dev/null}"
EOF
    chmod +x "$dest/ghp_import.py"
    ;;
  push)
    if [ -n "$DOCPUB_FAKE_PUSH_EXIT" ]; then
      echo "fatal: unable to access 'https://${DOCPUB_FAKE_TOKEN}@github.com/acme/widget.git'" >&2
      exit "$DOCPUB_FAKE_PUSH_EXIT"
    fi
    ;;
esac
exit 0
"#,
    )
    .expect("write fake git");
    let mut perms = fs::metadata(&path).expect("meta").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).expect("chmod");
}

struct TestHarness {
    workspace: tempfile::TempDir,
    bin_dir: PathBuf,
    log: PathBuf,
}

impl TestHarness {
    fn new() -> Self {
        let workspace = tempdir().expect("tempdir");
        let bin_dir = workspace.path().join("fakebin");
        fs::create_dir_all(&bin_dir).expect("mkdir");
        create_fake_git(&bin_dir);
        let log = workspace.path().join("git.log");

        Self {
            workspace,
            bin_dir,
            log,
        }
    }

    /// Command with a clean environment: fake git first on PATH, Travis-style
    /// context variables, token set.
    fn cmd(&self) -> Command {
        let path = format!(
            "{}:{}",
            self.bin_dir.display(),
            std::env::var("PATH").unwrap_or_else(|_| "/usr/bin:/bin".to_string())
        );

        let mut cmd = Command::cargo_bin("docpub").expect("binary");
        cmd.current_dir(self.workspace.path())
            .env_clear()
            .env("PATH", path)
            .env("DOCPUB_FAKE_GIT_LOG", &self.log)
            .env("TRAVIS", "true")
            .env("TRAVIS_RUST_VERSION", "1.42.0")
            .env("TRAVIS_REPO_SLUG", "acme/widget")
            .env("TRAVIS_BRANCH", "master")
            .env("TRAVIS_PULL_REQUEST", "false")
            .env("GH_TOKEN", TOKEN);
        cmd
    }

    fn log_contents(&self) -> String {
        fs::read_to_string(&self.log).unwrap_or_default()
    }
}

#[test]
fn stable_build_publishes_the_full_sequence() {
    let h = TestHarness::new();

    h.cmd()
        .assert()
        .success()
        .stdout(contains(TOKEN).not())
        .stderr(contains(TOKEN).not())
        .stderr(contains("pushing documentation to gh-pages"));

    let log = h.log_contents();
    assert!(log.contains("git rev-parse --short HEAD"));
    assert!(log.contains("git clone https://github.com/davisp/ghp-import deploy_docs"));
    assert!(log.contains("ghp-import -n -m Documentation for acme/widget@abc1234 target/doc"));
    // The live argument vector carries the token; only diagnostics are scrubbed.
    assert!(log.contains(&format!(
        "git push -fq https://{TOKEN}@github.com/acme/widget.git gh-pages"
    )));
}

#[test]
fn beta_build_skips_with_a_clean_exit() {
    let h = TestHarness::new();

    h.cmd()
        .env("TRAVIS_RUST_VERSION", "1.42.0-beta.1")
        .assert()
        .success()
        .stdout(contains("not publishing docs"))
        .stdout(contains("stable"));

    assert_eq!(h.log_contents(), "");
}

#[test]
fn nightly_policy_comes_from_the_config_file() {
    let h = TestHarness::new();
    write_file(
        &h.workspace.path().join(".docpub.toml"),
        "[gate]\nchannel = \"nightly\"\nbranch = \"master\"\n",
    );

    h.cmd()
        .env("TRAVIS_RUST_VERSION", "1.42.0-nightly")
        .assert()
        .success();

    assert!(h.log_contents().contains("git push"));
}

#[test]
fn pull_request_build_skips() {
    let h = TestHarness::new();

    h.cmd()
        .env("TRAVIS_PULL_REQUEST", "123")
        .assert()
        .success()
        .stdout(contains("pull request"));

    assert_eq!(h.log_contents(), "");
}

#[test]
fn feature_branch_build_skips() {
    let h = TestHarness::new();

    h.cmd()
        .env("TRAVIS_BRANCH", "feature-x")
        .assert()
        .success()
        .stdout(contains("publish branch"));

    assert_eq!(h.log_contents(), "");
}

#[test]
fn missing_token_is_a_fatal_configuration_error() {
    let h = TestHarness::new();

    h.cmd()
        .env_remove("GH_TOKEN")
        .assert()
        .failure()
        .stderr(contains("GH_TOKEN"));

    assert_eq!(h.log_contents(), "");
}

#[test]
fn failed_push_exits_nonzero_with_the_token_scrubbed() {
    let h = TestHarness::new();

    h.cmd()
        .env("DOCPUB_FAKE_PUSH_EXIT", "128")
        .env("DOCPUB_FAKE_TOKEN", TOKEN)
        .assert()
        .failure()
        .stderr(contains("128"))
        .stderr(contains("[REDACTED]"))
        .stderr(contains(TOKEN).not())
        .stdout(contains(TOKEN).not());
}

#[test]
fn dry_run_prints_the_decision_and_runs_nothing() {
    let h = TestHarness::new();

    h.cmd()
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(contains("would publish target/doc to gh-pages"));

    assert_eq!(h.log_contents(), "");
}

#[test]
fn artifact_dir_flag_overrides_the_config() {
    let h = TestHarness::new();

    h.cmd()
        .args(["--artifact-dir", "build/docs"])
        .assert()
        .success();

    assert!(h.log_contents().contains("ghp-import -n -m Documentation for acme/widget@abc1234 build/docs"));
}

#[test]
fn doctor_reports_the_environment_without_the_token() {
    let h = TestHarness::new();

    h.cmd()
        .arg("doctor")
        .assert()
        .success()
        .stdout(contains("provider: Travis CI"))
        .stdout(contains("repo_slug: acme/widget"))
        .stdout(contains("token_detected: true"))
        .stdout(contains(TOKEN).not());
}

#[test]
fn explicit_config_path_is_honored() {
    let h = TestHarness::new();
    let config = h.workspace.path().join("alt.toml");
    write_file(&config, "[gate]\nbranch = \"main\"\n");

    h.cmd()
        .args(["--config", config.to_str().expect("utf8")])
        .assert()
        .success()
        .stdout(contains("not publishing docs"))
        .stdout(contains("publish branch `main`"));
}
