use async_trait::async_trait;

use super::{ExecuteCodeRequest, ExecuteCodeResponse, SandboxError};

/// Trait for different sandbox execution implementations
///
/// Every backend honours the same request/response contract, so callers do not
/// care whether a submission runs as a plain host process or somewhere more
/// restricted.
#[async_trait]
pub trait CodeSandbox: Send + Sync {
    /// Main entry point for executing a submission
    ///
    /// Compile and runtime failures of the submitted code are reported through
    /// the response status. An `Err` always means the sandbox itself failed.
    async fn execute_code(
        &self,
        request: &ExecuteCodeRequest,
    ) -> Result<ExecuteCodeResponse, SandboxError>;
}
