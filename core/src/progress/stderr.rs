use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::Regex;

use super::event::{LogSeverity, ProgressEvent};

lazy_static! {
    static ref ANSI: Regex =
        Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]|\x1b\][^\x07]*\x07|\x1b[@-Z\\-_]")
            .expect("ansi regex");
    static ref BAR_PREFIX: Regex = Regex::new(r"^\d+%\|.*\|").expect("bar regex");
}

pub fn strip_ansi(s: &str) -> Cow<'_, str> {
    ANSI.replace_all(s, "")
}

/// Heuristic match for tqdm-style progress bars.
pub fn is_progress_bar(line: &str) -> bool {
    line.contains("%|")
        || line.contains("it/s")
        || line.contains("s/it")
        || BAR_PREFIX.is_match(line.trim())
}

/// Classify one stderr line as a log event.
///
/// This is best-effort telemetry: a bar-like line becomes a `progress` log,
/// other text becomes an `error` log, terminal chatter is dropped. Nothing
/// in the task state machine depends on the classification.
pub fn classify_stderr_line(line: &str) -> Option<ProgressEvent> {
    let clean = strip_ansi(line);
    // Bars redraw with '\r'; only the last frame matters.
    let frame = clean
        .split('\r')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .last()?;

    if is_progress_bar(frame) {
        return Some(ProgressEvent::Log {
            message: frame.to_string(),
            severity: LogSeverity::Progress,
        });
    }
    if frame.contains("Terminal#") {
        return None;
    }
    Some(ProgressEvent::Log {
        message: frame.to_string(),
        severity: LogSeverity::Error,
    })
}
