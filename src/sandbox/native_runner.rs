use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::{LanguageConfig, SandboxConfig};

use super::{
    CodeSandbox, CompileOutcome, ExecuteCodeRequest, ExecuteCodeResponse, RunPolicy, SandboxError,
    Workspace, aggregate, compile, run,
};

/// A sandbox that runs submissions as plain host processes
///
/// NativeSandbox confines each submission to its own workspace directory and
/// enforces a wall-clock timeout per run. It provides no memory, permission or
/// network restrictions, so it should only face trusted environments or sit
/// behind another isolation layer.
pub struct NativeSandbox {
    /// Root under which every submission gets its own workspace
    workspace_root: PathBuf,
    config: SandboxConfig,
    languages: Vec<LanguageConfig>,
}

impl NativeSandbox {
    pub fn new(workspace_root: PathBuf, config: SandboxConfig, languages: Vec<LanguageConfig>) -> Self {
        Self {
            workspace_root,
            config,
            languages,
        }
    }

    fn find_language(&self, name: &str) -> Result<&LanguageConfig, SandboxError> {
        self.languages
            .iter()
            .find(|l| l.name == name)
            .ok_or_else(|| SandboxError::UnsupportedLanguage(name.to_string()))
    }

    fn run_policy(&self) -> RunPolicy {
        RunPolicy {
            timeout: self.config.run_timeout_ms.into(),
            fail_on_nonzero_exit: self.config.fail_on_nonzero_exit,
        }
    }
}

#[async_trait]
impl CodeSandbox for NativeSandbox {
    async fn execute_code(
        &self,
        request: &ExecuteCodeRequest,
    ) -> Result<ExecuteCodeResponse, SandboxError> {
        let language = self.find_language(&request.language)?;

        // Dropping the workspace removes it, on every early return below
        let workspace = Workspace::create(&self.workspace_root)?;
        let source_path = workspace.write_source(&language.file_name, &request.code)?;

        // Step 1: Compile the source code
        let compile_timeout: Duration = self.config.compile_timeout_ms.into();
        if let CompileOutcome::Failure { diagnostic } =
            compile(language, &source_path, compile_timeout).await?
        {
            log::info!("Compilation failed in {}", workspace.path().display());
            workspace.destroy();
            return Ok(ExecuteCodeResponse::compile_error(diagnostic));
        }

        // Step 2: Run every input in order, stopping at the first failure
        let policy = self.run_policy();
        let mut runs = Vec::with_capacity(request.input_list.len());
        for (idx, input) in request.input_list.iter().enumerate() {
            let result = run(language, &source_path, input, policy).await?;
            let failed = result.diagnostic().is_some();
            runs.push(result);

            if failed {
                log::info!(
                    "Run {} of {} failed, skipping the rest",
                    idx + 1,
                    request.input_list.len()
                );
                break;
            }
        }

        // Step 3: Fold the runs into one verdict
        let response = aggregate(&runs);
        log::info!(
            "Submission finished with status {:?}, max time {} ms",
            response.status,
            response.judge_info.time
        );

        workspace.destroy();
        Ok(response)
    }
}
