use std::path::Path;
use std::time::Duration;

use crate::config::LanguageConfig;

use super::process::run_supervised;
use super::{CompileOutcome, SandboxError, Termination};

const INPUT_PLACEHOLDER: &str = "%INPUT%";
const DIR_PLACEHOLDER: &str = "%DIR%";
const ARGS_PLACEHOLDER: &str = "%ARGS%";

/// Compiles the source file in its workspace
///
/// Languages without a compile command always succeed. A compiler that exits
/// non-zero or runs out of time is a failure of the submission, carrying the
/// compiler output as diagnostic; a compiler that cannot be launched is an
/// infrastructure error.
pub async fn compile(
    language: &LanguageConfig,
    source_path: &Path,
    budget: Duration,
) -> Result<CompileOutcome, SandboxError> {
    let Some(template) = &language.compile else {
        log::debug!("Language {} has no compile step", language.name);
        return Ok(CompileOutcome::Success);
    };

    let work_dir = source_path.parent().unwrap_or(Path::new("."));
    let command = apply_template(template, source_path, work_dir, &[]);
    let output = run_supervised(&command, work_dir, None, budget).await?;

    log::info!(
        "Compilation finished in {} ms: {:?}",
        output.elapsed.as_millis(),
        output.termination
    );

    let mut diagnostic = output.stdout;
    diagnostic.push_str(&output.stderr);

    match output.termination {
        Termination::Completed => Ok(CompileOutcome::Success),
        Termination::NonZeroExit(code) => {
            if diagnostic.trim().is_empty() {
                diagnostic = match code {
                    Some(code) => format!("Compiler exited with code: {code}"),
                    None => "Compiler was killed by a signal".to_string(),
                };
            }
            Ok(CompileOutcome::Failure { diagnostic })
        }
        Termination::TimedOut => {
            diagnostic.insert_str(
                0,
                &format!("Compilation timeout after {} ms\n", budget.as_millis()),
            );
            Ok(CompileOutcome::Failure { diagnostic })
        }
    }
}

/// Applies placeholder substitutions to a command template
///
/// `%INPUT%` becomes the source path and `%DIR%` the workspace directory, anywhere
/// inside an element. An element that is exactly `%ARGS%` is replaced by `args`,
/// which may be zero or more elements.
pub(super) fn apply_template(
    template: &[String],
    source_path: &Path,
    work_dir: &Path,
    args: &[&str],
) -> Vec<String> {
    let source = source_path.to_string_lossy();
    let dir = work_dir.to_string_lossy();

    let mut command = Vec::with_capacity(template.len() + args.len());
    for part in template {
        if part == ARGS_PLACEHOLDER {
            command.extend(args.iter().map(|arg| arg.to_string()));
        } else {
            command.push(
                part.replace(INPUT_PLACEHOLDER, &source)
                    .replace(DIR_PLACEHOLDER, &dir),
            );
        }
    }
    command
}
