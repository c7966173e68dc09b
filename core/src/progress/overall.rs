#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverallProgress {
    pub percent: f64,
    pub current: u64,
    pub total: u64,
}

/// Overall progress across the files being scored.
///
/// The percentage is the sum of the per-file percentages over the number of
/// files in the work-list. Question counters assume every file holds
/// `total` questions; both are 0 unless the record carried non-zero
/// `current` and `total`.
pub fn overall_progress(
    base: f64,
    compare: f64,
    files: usize,
    current: Option<u64>,
    total: Option<u64>,
) -> OverallProgress {
    let percent = if files > 0 {
        (base + compare) / files as f64
    } else {
        0.0
    };

    let (current, total) = match (current, total) {
        (Some(c), Some(t)) if c > 0 && t > 0 => {
            let per_file = t as f64;
            let done_base = (base / 100.0 * per_file).round() as u64;
            let done_compare = (compare / 100.0 * per_file).round() as u64;
            (done_base + done_compare, files as u64 * t)
        }
        _ => (0, 0),
    };

    OverallProgress {
        percent,
        current,
        total,
    }
}
