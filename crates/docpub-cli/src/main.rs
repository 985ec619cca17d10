use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use docpub::config::Config;
use docpub::environment;
use docpub::gate::{self, Decision};
use docpub::process;
use docpub::publish::{self, Reporter};
use docpub::redact;
use docpub::runner::SystemRunner;

#[derive(Parser, Debug)]
#[command(name = "docpub", version)]
#[command(about = "Conditionally publish generated documentation to a gh-pages branch from CI")]
struct Cli {
    /// Path to a config file (default: ./.docpub.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory of generated documentation to publish
    #[arg(long)]
    artifact_dir: Option<PathBuf>,

    /// Resolve the context and print the decision without running any command
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    cmd: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print environment and context diagnostics.
    Doctor,
}

struct CliReporter;

impl Reporter for CliReporter {
    fn info(&mut self, msg: &str) {
        eprintln!("[info] {msg}");
    }

    fn warn(&mut self, msg: &str) {
        eprintln!("[warn] {msg}");
    }

    fn error(&mut self, msg: &str) {
        eprintln!("[error] {msg}");
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let mut reporter = CliReporter;

    match run(&cli, &mut reporter) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Last line of defense before the CI log: anything that slipped
            // through the layered scrubbing gets the pattern pass.
            reporter.error(&redact::scrub_patterns(&format!("{err:#}")));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, reporter: &mut CliReporter) -> Result<()> {
    if let Some(Commands::Doctor) = &cli.cmd {
        return run_doctor();
    }

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_dir(Path::new("."))?,
    };

    let ctx = environment::resolve_context()?;
    reporter.info(&format!(
        "{} build of {} on branch {}",
        ctx.provider, ctx.repo_slug, ctx.branch
    ));

    let decision = gate::evaluate(&config.gate_policy(), &ctx);
    if let Decision::Skip { reason } = decision {
        println!("not publishing docs: {reason}");
        return Ok(());
    }

    let mut opts = config.publish_options();
    if let Some(dir) = &cli.artifact_dir {
        opts.artifact_dir = dir.clone();
    }

    if cli.dry_run {
        println!(
            "would publish {} to {}",
            opts.artifact_dir.display(),
            opts.hosting_branch
        );
        return Ok(());
    }

    let mut runner = SystemRunner;
    publish::publish(&ctx, &opts, &mut runner, reporter)
}

fn run_doctor() -> Result<()> {
    let provider = environment::detect_provider();
    println!("provider: {provider}");

    print_field("toolchain", environment::toolchain_version(provider));
    print_field("repo_slug", environment::repo_slug(provider));
    print_field("branch", environment::branch(provider));
    println!("pull_request: {}", environment::pull_request(provider));
    println!("token_detected: {}", environment::token_detected());

    if process::command_exists("git") {
        match process::run_command("git", &["--version"]) {
            Ok(out) if out.success => println!("git: {}", out.stdout.trim()),
            _ => println!("git: <unavailable>"),
        }
    } else {
        println!("git: <not found in PATH>");
    }

    Ok(())
}

fn print_field(name: &str, value: Result<String>) {
    match value {
        Ok(v) => println!("{name}: {v}"),
        Err(_) => println!("{name}: <unresolved>"),
    }
}
