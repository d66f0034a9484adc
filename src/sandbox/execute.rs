use std::path::Path;
use std::time::Duration;

use crate::config::{InputMode, LanguageConfig};

use super::compile::apply_template;
use super::process::run_supervised;
use super::{RunResult, SandboxError, Termination};

/// Per-run settings shared by every input of a submission
#[derive(Debug, Clone, Copy)]
pub struct RunPolicy {
    pub timeout: Duration,
    /// Report a non-zero exit as a failure even when stderr is empty
    pub fail_on_nonzero_exit: bool,
}

/// Runs the compiled submission once against `input`
///
/// The artifact lives next to the source file, in the workspace, which is also
/// the working directory of the process. A run fails when its error text is
/// non-empty; the exit status only matters under `fail_on_nonzero_exit`.
pub async fn run(
    language: &LanguageConfig,
    source_path: &Path,
    input: &str,
    policy: RunPolicy,
) -> Result<RunResult, SandboxError> {
    let work_dir = source_path.parent().unwrap_or(Path::new("."));

    let (args, stdin): (Vec<&str>, Option<&str>) = match language.input_mode {
        InputMode::Args => (input.split_whitespace().collect(), None),
        InputMode::Stdin => (Vec::new(), Some(input)),
    };
    let command = apply_template(&language.run, source_path, work_dir, &args);

    let output = run_supervised(&command, work_dir, stdin, policy.timeout).await?;
    let elapsed_ms = output.elapsed.as_millis() as u64;

    let mut error = output.stderr;
    if error.trim().is_empty() {
        match output.termination {
            Termination::TimedOut => {
                error = format!("Time limit exceeded: killed after {elapsed_ms} ms");
            }
            Termination::NonZeroExit(code) if policy.fail_on_nonzero_exit => {
                error = match code {
                    Some(code) => format!("Process exited with code: {code}"),
                    None => "Process was killed by a signal".to_string(),
                };
            }
            _ => {}
        }
    }

    log::info!(
        "Run finished in {elapsed_ms} ms: {:?}{}",
        output.termination,
        if error.trim().is_empty() { "" } else { " with error text" }
    );

    Ok(RunResult {
        stdout: output.stdout,
        error,
        elapsed_ms,
        termination: output.termination,
    })
}
