use super::ScoredRow;

pub const REQUIRED_FIELDS: [&str; 7] = [
    "id",
    "instruction",
    "reference",
    "parent_class",
    "subclass",
    "model_ans",
    "source",
];

/// Check an uploaded answer sheet. Only the first row's columns are inspected.
pub fn validate_rows(rows: &[ScoredRow]) -> Result<(), String> {
    let first = rows.first().ok_or_else(|| "file contains no rows".to_string())?;
    let missing: Vec<&str> = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|f| !first.has_field(f))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(format!("missing required columns: {}", missing.join(", ")))
    }
}

/// True iff the first row carries a `score` column.
pub fn has_score_column(rows: &[ScoredRow]) -> bool {
    rows.first().map(|r| r.has_field("score")).unwrap_or(false)
}
