use super::{ExecuteCodeResponse, ExecuteStatus, JudgeInfo, RunResult};

/// Folds per-run results into one verdict
///
/// Stops at the first run with a diagnostic: its text becomes the message and
/// the status is a runtime error, so partial output is never reported as
/// success. Judge time is the longest run among those processed, the failing
/// one included.
pub fn aggregate(runs: &[RunResult]) -> ExecuteCodeResponse {
    let mut output_list = Vec::with_capacity(runs.len());
    let mut message = None;
    let mut max_time = 0;

    for run in runs {
        max_time = max_time.max(run.elapsed_ms);

        if let Some(diagnostic) = run.diagnostic() {
            message = Some(diagnostic.to_string());
            break;
        }
        output_list.push(run.stdout.clone());
    }

    let status = if message.is_some() {
        ExecuteStatus::RuntimeError
    } else {
        ExecuteStatus::Success
    };

    ExecuteCodeResponse {
        output_list,
        message,
        status,
        judge_info: JudgeInfo { time: max_time },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::Termination;
    use pretty_assertions::assert_eq;

    fn ok(stdout: &str, elapsed_ms: u64) -> RunResult {
        RunResult {
            stdout: stdout.to_string(),
            error: String::new(),
            elapsed_ms,
            termination: Termination::Completed,
        }
    }

    fn failed(error: &str, elapsed_ms: u64) -> RunResult {
        RunResult {
            stdout: String::new(),
            error: error.to_string(),
            elapsed_ms,
            termination: Termination::NonZeroExit(Some(1)),
        }
    }

    #[test]
    fn test_no_runs_is_success() {
        let response = aggregate(&[]);
        assert_eq!(response.status, ExecuteStatus::Success);
        assert!(response.output_list.is_empty());
        assert_eq!(response.message, None);
        assert_eq!(response.judge_info.time, 0);
    }

    #[test]
    fn test_all_runs_succeed_in_order() {
        let response = aggregate(&[ok("5", 12), ok("7", 30), ok("9", 4)]);
        assert_eq!(response.status, ExecuteStatus::Success);
        assert_eq!(response.output_list, ["5", "7", "9"]);
        assert_eq!(response.judge_info.time, 30);
    }

    #[test]
    fn test_stops_at_first_failure() {
        let response = aggregate(&[ok("a", 5), failed("boom", 8), failed("later", 100), ok("b", 200)]);
        assert_eq!(response.status, ExecuteStatus::RuntimeError);
        assert_eq!(response.output_list, ["a"]);
        assert_eq!(response.message.as_deref(), Some("boom"));
        // Runs past the failure are not processed
        assert_eq!(response.judge_info.time, 8);
    }

    #[test]
    fn test_failing_run_counts_towards_time() {
        let response = aggregate(&[ok("a", 5), failed("Time limit exceeded", 5001)]);
        assert_eq!(response.judge_info.time, 5001);
    }

    #[test]
    fn test_blank_error_text_is_ignored() {
        let mut warned = ok("x", 1);
        warned.error = "\n".to_string();
        let response = aggregate(&[warned]);
        assert_eq!(response.status, ExecuteStatus::Success);
        assert_eq!(response.output_list, ["x"]);
    }
}
