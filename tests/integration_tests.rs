use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use oj_sandbox::config::{InputMode, LanguageConfig, MilliSecond, SandboxBackend, SandboxConfig};
use oj_sandbox::sandbox::{
    CodeSandbox, ExecuteCodeRequest, ExecuteStatus, NativeSandbox, SandboxError,
};

// Helper to turn string slices into a command template
fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

// Shell scripts stand in for a compiled language: `sh -n` is the syntax check
fn shell_language() -> LanguageConfig {
    LanguageConfig {
        name: "sh".to_string(),
        file_name: "main.sh".to_string(),
        compile: Some(argv(&["sh", "-n", "%INPUT%"])),
        run: argv(&["sh", "%INPUT%", "%ARGS%"]),
        input_mode: InputMode::Args,
    }
}

fn sandbox_config(run_timeout_ms: u64) -> SandboxConfig {
    SandboxConfig {
        backend: SandboxBackend::Native,
        workspace_root: None,
        run_timeout_ms: MilliSecond(run_timeout_ms),
        compile_timeout_ms: MilliSecond(5000),
        fail_on_nonzero_exit: false,
    }
}

// Test fixture owning a temporary workspace root
struct Fixture {
    temp: TempDir,
    root: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let temp = tempfile::tempdir().expect("Failed to create temp dir");
        let root = temp.path().join("workspaces");
        Self { temp, root }
    }

    fn sandbox(&self, languages: Vec<LanguageConfig>, run_timeout_ms: u64) -> NativeSandbox {
        NativeSandbox::new(self.root.clone(), sandbox_config(run_timeout_ms), languages)
    }

    // A file outside the workspace root that scripts can append to
    fn counter_path(&self) -> PathBuf {
        self.temp.path().join("runs.log")
    }

    fn run_count(&self) -> usize {
        fs::read_to_string(self.counter_path())
            .map(|s| s.lines().count())
            .unwrap_or(0)
    }

    fn assert_no_workspaces(&self) {
        assert_eq!(leftover_entries(&self.root), 0, "workspace left behind");
    }
}

fn leftover_entries(root: &Path) -> usize {
    match fs::read_dir(root) {
        Ok(entries) => entries.count(),
        Err(_) => 0,
    }
}

fn request(code: &str, inputs: &[&str]) -> ExecuteCodeRequest {
    ExecuteCodeRequest {
        code: code.to_string(),
        language: "sh".to_string(),
        input_list: inputs.iter().map(|s| s.to_string()).collect(),
    }
}

#[tokio::test]
async fn test_prints_each_argument() {
    let fixture = Fixture::new();
    let sandbox = fixture.sandbox(vec![shell_language()], 5000);

    let response = sandbox
        .execute_code(&request("printf %s \"$1\"\n", &["5", "7"]))
        .await
        .unwrap();

    assert_eq!(response.status, ExecuteStatus::Success);
    assert_eq!(response.output_list, ["5", "7"]);
    assert_eq!(response.message, None);
    assert!(response.judge_info.time < 5000);
    fixture.assert_no_workspaces();
}

#[tokio::test]
async fn test_empty_input_list() {
    let fixture = Fixture::new();
    let sandbox = fixture.sandbox(vec![shell_language()], 5000);

    let response = sandbox
        .execute_code(&request("echo never\n", &[]))
        .await
        .unwrap();

    assert_eq!(response.status, ExecuteStatus::Success);
    assert!(response.output_list.is_empty());
    assert_eq!(response.judge_info.time, 0);
    fixture.assert_no_workspaces();
}

#[tokio::test]
async fn test_judge_time_is_longest_run() {
    let fixture = Fixture::new();
    let sandbox = fixture.sandbox(vec![shell_language()], 5000);

    let response = sandbox
        .execute_code(&request("sleep \"$2\"; printf %s \"$1\"\n", &["a 0", "b 0.4", "c 0"]))
        .await
        .unwrap();

    assert_eq!(response.status, ExecuteStatus::Success);
    assert_eq!(response.output_list, ["a", "b", "c"]);
    assert!(response.judge_info.time >= 400);
    assert!(response.judge_info.time < 5000);
}

#[tokio::test]
async fn test_compile_error_skips_runs() {
    let fixture = Fixture::new();
    let run_script = format!("echo run >> '{}'", fixture.counter_path().display());
    let language = LanguageConfig {
        compile: Some(argv(&["sh", "-c", "echo 'Main.java:1: error' >&2; exit 1"])),
        run: argv(&["sh", "-c", run_script.as_str()]),
        ..shell_language()
    };
    let sandbox = fixture.sandbox(vec![language], 5000);

    let response = sandbox
        .execute_code(&request("class Main {", &["1", "2"]))
        .await
        .unwrap();

    assert_eq!(response.status, ExecuteStatus::CompileError);
    assert_eq!(response.message.as_deref(), Some("Main.java:1: error\n"));
    assert!(response.output_list.is_empty());
    assert_eq!(fixture.run_count(), 0);
    fixture.assert_no_workspaces();
}

#[tokio::test]
async fn test_syntax_error_is_compile_error() {
    let fixture = Fixture::new();
    let sandbox = fixture.sandbox(vec![shell_language()], 5000);

    let response = sandbox
        .execute_code(&request("if then (\n", &["1"]))
        .await
        .unwrap();

    assert_eq!(response.status, ExecuteStatus::CompileError);
    assert!(!response.message.unwrap_or_default().is_empty());
    fixture.assert_no_workspaces();
}

#[tokio::test]
async fn test_first_failing_run_stops_execution() {
    let fixture = Fixture::new();
    let sandbox = fixture.sandbox(vec![shell_language()], 5000);
    let code = format!(
        "echo \"$1\" >> '{}'\nif [ \"$1\" = bad ]; then echo \"bad input\" >&2; fi\nprintf %s \"$1\"\n",
        fixture.counter_path().display()
    );

    let response = sandbox
        .execute_code(&request(&code, &["a", "b", "bad", "c"]))
        .await
        .unwrap();

    assert_eq!(response.status, ExecuteStatus::RuntimeError);
    assert_eq!(response.output_list, ["a", "b"]);
    assert_eq!(response.message.as_deref(), Some("bad input\n"));
    assert_eq!(fixture.run_count(), 3);
    fixture.assert_no_workspaces();
}

#[tokio::test]
async fn test_stderr_output_fails_despite_zero_exit() {
    let fixture = Fixture::new();
    let sandbox = fixture.sandbox(vec![shell_language()], 5000);

    let response = sandbox
        .execute_code(&request("echo ok; echo 'warning: deprecated' >&2\n", &["1"]))
        .await
        .unwrap();

    assert_eq!(response.status, ExecuteStatus::RuntimeError);
    assert!(response.output_list.is_empty());
    assert_eq!(response.message.as_deref(), Some("warning: deprecated\n"));
}

#[tokio::test]
async fn test_endless_run_is_killed() {
    let fixture = Fixture::new();
    let sandbox = fixture.sandbox(vec![shell_language()], 300);
    let start = Instant::now();

    let response = sandbox
        .execute_code(&request("printf %s \"$1\"; [ \"$1\" = 2 ] && sleep 30\n", &["1", "2", "3"]))
        .await
        .unwrap();

    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(response.status, ExecuteStatus::RuntimeError);
    assert_eq!(response.output_list, ["1"]);
    assert!(response.message.unwrap().starts_with("Time limit exceeded"));
    assert!(response.judge_info.time >= 300);
    assert!(response.judge_info.time < 5000);
    fixture.assert_no_workspaces();
}

#[tokio::test]
async fn test_stdin_input_mode() {
    let fixture = Fixture::new();
    let language = LanguageConfig {
        name: "sh-stdin".to_string(),
        input_mode: InputMode::Stdin,
        ..shell_language()
    };
    let sandbox = fixture.sandbox(vec![language], 5000);

    let response = sandbox
        .execute_code(&ExecuteCodeRequest {
            code: "read a b\necho $((a * b))\n".to_string(),
            language: "sh-stdin".to_string(),
            input_list: vec!["6 7".to_string(), "2 3\n".to_string()],
        })
        .await
        .unwrap();

    assert_eq!(response.output_list, ["42\n", "6\n"]);
}

#[tokio::test]
async fn test_unsupported_language() {
    let fixture = Fixture::new();
    let sandbox = fixture.sandbox(vec![shell_language()], 5000);

    let err = sandbox
        .execute_code(&ExecuteCodeRequest {
            code: String::new(),
            language: "cobol".to_string(),
            input_list: vec![],
        })
        .await
        .unwrap_err();

    assert!(matches!(err, SandboxError::UnsupportedLanguage(ref l) if l == "cobol"));
    fixture.assert_no_workspaces();
}

#[tokio::test]
async fn test_launch_failure_is_infrastructure_error() {
    let fixture = Fixture::new();
    let language = LanguageConfig {
        run: argv(&["/nonexistent/runtime", "%INPUT%"]),
        ..shell_language()
    };
    let sandbox = fixture.sandbox(vec![language], 5000);

    let err = sandbox
        .execute_code(&request("echo hi\n", &["1"]))
        .await
        .unwrap_err();

    assert!(matches!(err, SandboxError::Launch { .. }));
    fixture.assert_no_workspaces();
}

#[tokio::test]
async fn test_concurrent_submissions_do_not_collide() {
    let fixture = Fixture::new();
    let sandbox = fixture.sandbox(vec![shell_language()], 5000);
    // Every submission writes the same file name into its own workspace
    let code = "printf %s \"$1\" > out.txt; sleep 0.1; cat out.txt\n";

    let requests = [
        request(code, &["a1", "a2"]),
        request(code, &["b1", "b2"]),
        request(code, &["c1", "c2"]),
    ];

    let (a, b, c) = tokio::join!(
        sandbox.execute_code(&requests[0]),
        sandbox.execute_code(&requests[1]),
        sandbox.execute_code(&requests[2]),
    );

    assert_eq!(a.unwrap().output_list, ["a1", "a2"]);
    assert_eq!(b.unwrap().output_list, ["b1", "b2"]);
    assert_eq!(c.unwrap().output_list, ["c1", "c2"]);
    fixture.assert_no_workspaces();
}
