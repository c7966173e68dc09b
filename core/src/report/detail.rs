use serde_json::Value;

use crate::sheet::{Cell, CellStyle, ScoredRow, Sheet};

use super::ReportSide;

pub const DETAIL_SHEET_NAME: &str = "详细对比数据";

const DETAIL_WIDTHS: [f64; 12] = [
    8.0, 50.0, 30.0, 15.0, 15.0, 30.0, 10.0, 40.0, 30.0, 10.0, 40.0, 15.0,
];

/// Merged detail rows.
///
/// Rows are paired by position, not by `id`: row i of the primary source
/// (base when it has rows, else compare) sits next to row i of the other
/// side. Unequal lengths or reordered files pair silently; extra secondary
/// rows are dropped.
pub fn write_detail_sheet(base: Option<&ReportSide>, compare: Option<&ReportSide>) -> Sheet {
    let mut sheet = Sheet::new(DETAIL_SHEET_NAME);

    let base_rows = base.map(|s| s.rows.as_slice()).unwrap_or_default();
    let compare_rows = compare.map(|s| s.rows.as_slice()).unwrap_or_default();
    if base_rows.is_empty() && compare_rows.is_empty() {
        return sheet;
    }

    let base_name = base
        .map(|s| s.name.clone())
        .unwrap_or_else(|| "Base模型(未参与评测)".to_string());
    let compare_name = compare
        .map(|s| s.name.clone())
        .unwrap_or_else(|| "对比模型(未参与评测)".to_string());

    sheet.append_row(
        [
            "id".to_string(),
            "instruction".to_string(),
            "reference".to_string(),
            "parent_class".to_string(),
            "subclass".to_string(),
            format!("model_ans({base_name})"),
            format!("score({base_name})"),
            format!("reason({base_name})"),
            format!("model_ans({compare_name})"),
            format!("score({compare_name})"),
            format!("reason({compare_name})"),
            "source".to_string(),
        ],
        CellStyle::PLAIN,
    );

    let empty = ScoredRow::new();
    if !base_rows.is_empty() {
        for (i, primary) in base_rows.iter().enumerate() {
            let secondary = compare_rows.get(i).unwrap_or(&empty);
            sheet.append_row(merged_row(primary, primary, secondary), CellStyle::PLAIN);
        }
    } else {
        for primary in compare_rows {
            sheet.append_row(merged_row(primary, &empty, primary), CellStyle::PLAIN);
        }
    }

    sheet.set_column_widths(&DETAIL_WIDTHS);
    sheet
}

fn merged_row(shared: &ScoredRow, base: &ScoredRow, compare: &ScoredRow) -> Vec<Cell> {
    vec![
        text(shared, "id"),
        text(shared, "instruction"),
        text(shared, "reference"),
        text(shared, "parent_class"),
        text(shared, "subclass"),
        text(base, "model_ans"),
        score_cell(base),
        text(base, "reason"),
        text(compare, "model_ans"),
        score_cell(compare),
        text(compare, "reason"),
        text(shared, "source"),
    ]
}

fn text(row: &ScoredRow, key: &str) -> Cell {
    Cell::Text(row.text(key))
}

/// The raw score; missing, null or empty renders as 0.
fn score_cell(row: &ScoredRow) -> Cell {
    match row.get("score") {
        Some(Value::Number(n)) => Cell::Number(n.as_f64().unwrap_or(0.0)),
        Some(Value::String(s)) if !s.is_empty() => Cell::Text(s.clone()),
        Some(Value::Bool(b)) => Cell::Text(b.to_string()),
        _ => Cell::Number(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::StatisticsSummary;

    fn side(name: &str, rows: Vec<ScoredRow>) -> ReportSide {
        ReportSide {
            name: name.to_string(),
            rows,
            stats: StatisticsSummary::default(),
        }
    }

    fn row(id: i64, ans: &str, score: Value) -> ScoredRow {
        ScoredRow::new()
            .with("id", id)
            .with("instruction", format!("q{id}"))
            .with("model_ans", ans)
            .with("score", score)
            .with("source", "s")
    }

    #[test]
    fn pairs_rows_by_position_not_id() {
        let b = side("B", vec![row(1, "b1", 80.into()), row(2, "b2", 60.into())]);
        // compare rows are in reverse id order and one longer
        let c = side(
            "C",
            vec![
                row(9, "c9", 10.into()),
                row(1, "c1", "".into()),
                row(5, "c5", 1.into()),
            ],
        );
        let sheet = write_detail_sheet(Some(&b), Some(&c));

        assert_eq!(sheet.row_count(), 3);
        assert_eq!(sheet.text_at(0, 5).as_deref(), Some("model_ans(B)"));
        assert_eq!(sheet.text_at(0, 9).as_deref(), Some("score(C)"));
        assert_eq!(sheet.text_at(1, 0).as_deref(), Some("1"));
        assert_eq!(sheet.text_at(1, 8).as_deref(), Some("c9"));
        assert_eq!(sheet.text_at(2, 9).as_deref(), Some("0"));
        assert_eq!(sheet.text_at(2, 11).as_deref(), Some("s"));
        assert_eq!(sheet.column_widths.len(), 12);
    }

    #[test]
    fn compare_only_leaves_base_columns_empty() {
        let c = side("C", vec![row(1, "c1", 70.into())]);
        let sheet = write_detail_sheet(None, Some(&c));

        assert_eq!(
            sheet.text_at(0, 5).as_deref(),
            Some("model_ans(Base模型(未参与评测))")
        );
        assert_eq!(sheet.text_at(1, 5).as_deref(), Some(""));
        assert_eq!(sheet.text_at(1, 6).as_deref(), Some("0"));
        assert_eq!(sheet.text_at(1, 8).as_deref(), Some("c1"));
        assert_eq!(sheet.text_at(1, 9).as_deref(), Some("70"));
    }

    #[test]
    fn empty_base_falls_back_to_compare_as_primary() {
        let b = side("B", vec![]);
        let c = side("C", vec![row(3, "c3", 50.into())]);
        let sheet = write_detail_sheet(Some(&b), Some(&c));
        assert_eq!(sheet.text_at(0, 5).as_deref(), Some("model_ans(B)"));
        assert_eq!(sheet.text_at(1, 0).as_deref(), Some("3"));
        assert_eq!(sheet.text_at(1, 8).as_deref(), Some("c3"));
    }

    #[test]
    fn no_rows_means_empty_sheet() {
        let sheet = write_detail_sheet(Some(&side("B", vec![])), None);
        assert_eq!(sheet.row_count(), 0);
        assert_eq!(sheet.name, DETAIL_SHEET_NAME);
    }
}
