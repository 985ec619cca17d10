use anyhow::{Result, bail};

use docpub_process::{self as process, CommandResult};
use docpub_redact::Secret;

/// The command-execution capability the publish sequence runs against.
///
/// Production code uses [`SystemRunner`]; tests substitute a fake that
/// records invocations instead of spawning processes.
pub trait CommandRunner {
    /// Run a command with the child inheriting stdout/stderr.
    fn run(&mut self, program: &str, args: &[&str]) -> Result<CommandResult>;

    /// Run a command, capturing stdout/stderr.
    fn run_capturing(&mut self, program: &str, args: &[&str]) -> Result<CommandResult>;
}

/// Runner backed by real child processes.
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&mut self, program: &str, args: &[&str]) -> Result<CommandResult> {
        process::run_command_streaming(program, args)
    }

    fn run_capturing(&mut self, program: &str, args: &[&str]) -> Result<CommandResult> {
        process::run_command(program, args)
    }
}

/// Run a command whose argument list carries a secret.
///
/// The command always runs in capturing mode, so no raw child output can
/// reach the console: captured stdout/stderr come back with the secret
/// scrubbed, and a launch failure is re-raised with the secret scrubbed out
/// of the error text (the launch error embeds the argument vector, which is
/// where the secret lives). The live argument list itself is passed through
/// verbatim.
pub fn run_redacted(
    runner: &mut dyn CommandRunner,
    secret: &Secret,
    program: &str,
    args: &[&str],
) -> Result<CommandResult> {
    match runner.run_capturing(program, args) {
        Ok(mut result) => {
            result.stdout = secret.scrub_from(&result.stdout);
            result.stderr = secret.scrub_from(&result.stderr);
            Ok(result)
        }
        Err(err) => bail!("{}", secret.scrub_from(&format!("{err:#}"))),
    }
}
