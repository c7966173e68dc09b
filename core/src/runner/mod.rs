//! 评分子进程的启动、输出泵送、停止与退出处理

mod abort;
mod io_pump;
mod supervise;
mod traits;
pub mod types;

pub use abort::stop_sequence;
pub use io_pump::{pump_stderr, pump_stdout, LineStream, LineTap};
pub use supervise::{supervise, SuperviseInput};
pub use traits::{RunEventSink, RunnerPlugin, RunnerSession};
pub use types::{RunExit, RunOutcome, RunnerStartArgs, Signal};
