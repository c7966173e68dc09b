use std::collections::HashMap;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RunOutcome {
    pub exit_code: i32,
    pub duration_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Signal {
    Kill,
    Term,
}

#[derive(Debug, Clone)]
pub struct RunnerStartArgs {
    pub cmd: String,
    pub args: Vec<String>,
    pub envs: HashMap<String, String>,
    pub cwd: Option<String>,
}

/// How a supervised run ended, reported once per run.
#[derive(Debug, Clone)]
pub enum RunExit {
    Exited {
        outcome: RunOutcome,
        stderr_tail: String,
    },
    /// A stop was requested; `outcome` is `None` if the process outlived
    /// both signals.
    Stopped { outcome: Option<RunOutcome> },
    WaitFailed(String),
}
