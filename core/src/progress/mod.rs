//! # 评分进程输出解析
//!
//! stdout 为逐行 JSON 记录，stderr 为自由文本（含终端进度条）。
//! 解析器本身无状态，只有 [`LineBuffer`] 负责跨 chunk 拼接半行。

mod event;
mod line_buffer;
mod overall;
mod stderr;
mod stdout;

pub use event::{FileCompleted, LogSeverity, ProgressEvent, ProgressUpdate, RunComplete};
pub use line_buffer::LineBuffer;
pub use overall::{overall_progress, OverallProgress};
pub use stderr::{classify_stderr_line, is_progress_bar, strip_ansi};
pub use stdout::{parse_stdout_line, StdoutLine};
