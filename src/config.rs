use std::path::PathBuf;

use anyhow::{Context, anyhow};
use clap::Parser;
use serde::Deserialize;

#[derive(Parser)]
#[command(name = "oj-sandbox", version = "1.0", about, long_about = None)]
pub struct CliArgs {
    /// Path to the configuration file
    #[arg(long = "config", short = 'c')]
    pub config_path: Option<String>,

    /// Address to bind, overrides the configuration file
    #[arg(long = "bind-address")]
    pub bind_address: Option<String>,

    /// Port to bind, overrides the configuration file
    #[arg(long = "bind-port", short = 'p')]
    pub bind_port: Option<u16>,
}

impl CliArgs {
    /// Load the configuration from the specified file, or the defaults if none was given
    pub fn to_config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config_path {
            Some(path) => {
                let file = std::fs::File::open(path)
                    .with_context(|| format!("Failed to open config file {path}"))?;
                let reader = std::io::BufReader::new(file);
                serde_json::from_reader(reader)
                    .with_context(|| format!("Failed to parse config file {path}"))?
            }
            None => Config::default(),
        };

        if let Some(address) = &self.bind_address {
            config.server.bind_address = Some(address.clone());
        }
        if let Some(port) = self.bind_port {
            config.server.bind_port = Some(port);
        }

        if config.languages.is_empty() {
            return Err(anyhow!("At least one language must be configured"));
        }

        Ok(config)
    }
}

#[derive(Deserialize, Debug)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub sandbox: SandboxConfig,
    #[serde(default = "default_languages")]
    pub languages: Vec<LanguageConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            sandbox: SandboxConfig::default(),
            languages: default_languages(),
        }
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct ServerConfig {
    pub bind_address: Option<String>,
    pub bind_port: Option<u16>,
    /// Expected value of the `auth` request header; no check when absent
    pub auth_token: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct SandboxConfig {
    #[serde(default)]
    pub backend: SandboxBackend,
    /// Directory under which one workspace per submission is created
    pub workspace_root: Option<PathBuf>,
    #[serde(default = "default_run_timeout")]
    pub run_timeout_ms: MilliSecond,
    #[serde(default = "default_compile_timeout")]
    pub compile_timeout_ms: MilliSecond,
    /// Treat a non-zero exit status as a runtime error even if stderr is empty
    #[serde(default)]
    pub fail_on_nonzero_exit: bool,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            backend: SandboxBackend::default(),
            workspace_root: None,
            run_timeout_ms: default_run_timeout(),
            compile_timeout_ms: default_compile_timeout(),
            fail_on_nonzero_exit: false,
        }
    }
}

impl SandboxConfig {
    /// Resolves the workspace root, falling back to the user cache directory
    pub fn workspace_root(&self) -> anyhow::Result<PathBuf> {
        if let Some(root) = &self.workspace_root {
            return Ok(root.clone());
        }

        use directories::ProjectDirs;

        let proj_dirs = ProjectDirs::from("", "", "oj-sandbox")
            .ok_or_else(|| anyhow!("Unable to find user directory"))?;

        Ok(proj_dirs.cache_dir().join("workspaces"))
    }
}

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SandboxBackend {
    /// Runs submissions as plain host processes
    #[default]
    Native,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MilliSecond(pub u64);

impl From<MilliSecond> for std::time::Duration {
    fn from(value: MilliSecond) -> Self {
        std::time::Duration::from_millis(value.0)
    }
}

fn default_run_timeout() -> MilliSecond {
    MilliSecond(5000)
}

fn default_compile_timeout() -> MilliSecond {
    MilliSecond(30000)
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LanguageConfig {
    pub name: String,
    /// Fixed name of the source file inside the workspace
    pub file_name: String,
    /// Compile command template, `None` for languages run straight from source
    pub compile: Option<Vec<String>>,
    /// Run command template
    pub run: Vec<String>,
    #[serde(default)]
    pub input_mode: InputMode,
}

impl LanguageConfig {
    /// The reference language
    pub fn java() -> Self {
        let args = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            name: "java".to_string(),
            file_name: "Main.java".to_string(),
            compile: Some(args(&["javac", "-encoding", "utf-8", "%INPUT%"])),
            run: args(&[
                "java",
                "-Xmx256m",
                "-Dfile.encoding=UTF-8",
                "-cp",
                "%DIR%",
                "Main",
                "%ARGS%",
            ]),
            input_mode: InputMode::Args,
        }
    }
}

/// How a run receives its input
#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    /// Split on whitespace and passed as command-line arguments
    #[default]
    Args,
    /// Written to stdin, which is then closed
    Stdin,
}

fn default_languages() -> Vec<LanguageConfig> {
    vec![LanguageConfig::java()]
}
