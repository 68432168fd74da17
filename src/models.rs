use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// The uniform envelope every tool handler returns, independent of how many
/// processes it ran or files it read. Exactly one of `content`/`error` is
/// populated, matching `success`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionResult {
    pub fn ok(content: serde_json::Value) -> Self {
        ExecutionResult {
            success: true,
            content: Some(content),
            error: None,
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        ExecutionResult {
            success: false,
            content: None,
            error: Some(error.into()),
        }
    }
}

/// One external invocation, fully determined: built fresh per call, never
/// reused. `env` is an overlay on the server's own environment (overlay wins
/// on collision); the ambient environment is never mutated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandSpec {
    pub argv: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: HashMap<String, String>,
    pub stdin: Option<String>,
}

/// What came back from one external invocation. Invalid UTF-8 in either
/// stream is replaced, not rejected.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Format a microsecond duration for human-readable display.
pub fn fmt_duration(us: u64) -> String {
    match us {
        us if us < 1_000 => format!("{us}µs"),
        us if us < 1_000_000 => format!("{:.1}ms", us as f64 / 1_000.0),
        us => format!("{:.1}s", us as f64 / 1_000_000.0),
    }
}
