use std::collections::{BTreeMap, BTreeSet};

use crate::sheet::{Cell, CellStyle, MergeRange, Sheet};
use crate::stats::{format_score, CategoryStats, StatisticsSummary};

use super::ReportSide;

pub const OVERVIEW_SHEET_NAME: &str = "概览对比";

const TITLE_STYLE: CellStyle = CellStyle {
    bold: true,
    font_size: Some(16),
    centered: true,
};

pub fn write_overview_sheet(base: Option<&ReportSide>, compare: Option<&ReportSide>) -> Sheet {
    let mut sheet = Sheet::new(OVERVIEW_SHEET_NAME);
    let both = base.is_some() && compare.is_some();

    sheet.merge(MergeRange {
        first_row: 0,
        first_col: 0,
        last_row: 0,
        last_col: 3,
    });
    let title = if both { "模型评测对比报告" } else { "模型评测报告" };
    sheet.set(0, 0, title, TITLE_STYLE);

    let mut row = 2;
    if let Some(b) = base {
        sheet.set(row, 0, "Base模型:", CellStyle::PLAIN);
        sheet.set(row, 1, b.name.as_str(), CellStyle::PLAIN);
        row += 1;
    }
    if let Some(c) = compare {
        let label = if base.is_some() { "对比模型:" } else { "评测模型:" };
        sheet.set(row, 0, label, CellStyle::PLAIN);
        sheet.set(row, 1, c.name.as_str(), CellStyle::PLAIN);
        row += 1;
    }

    row += 2;
    let overall_title = if both { "整体评测结果对比" } else { "整体评测结果" };
    sheet.set(row, 0, overall_title, CellStyle::BOLD);

    match (base, compare) {
        (Some(b), Some(c)) => write_overall_pair(&mut sheet, b, c),
        (Some(only), None) | (None, Some(only)) => write_overall_single(&mut sheet, only),
        (None, None) => {}
    }

    let parent_title = if both { "按父类对比" } else { "按父类统计" };
    write_category_table(&mut sheet, parent_title, "父类", base, compare, |s| {
        &s.by_parent_class
    });

    let sub_title = if both { "按子类对比" } else { "按子类统计" };
    write_category_table(&mut sheet, sub_title, "子类", base, compare, |s| {
        &s.by_sub_class
    });

    sheet.set_column_widths(&[20.0, 15.0, 15.0, 15.0]);
    sheet
}

fn write_overall_pair(sheet: &mut Sheet, base: &ReportSide, compare: &ReportSide) {
    let b = &base.stats.overall;
    let c = &compare.stats.overall;
    sheet.append_row(
        ["指标", base.name.as_str(), compare.name.as_str(), "差值"],
        CellStyle::PLAIN,
    );
    for (label, bv, cv) in [
        ("平均分", b.average_score, c.average_score),
        ("最高分", b.max_score, c.max_score),
        ("最低分", b.min_score, c.min_score),
    ] {
        sheet.append_row(
            [
                label.to_string(),
                format_score(bv),
                format_score(cv),
                format_score(cv - bv),
            ],
            CellStyle::PLAIN,
        );
    }
    sheet.append_row(
        [
            Cell::from("题目总数"),
            Cell::Number(b.total_questions as f64),
            Cell::Number(c.total_questions as f64),
            Cell::Number(c.total_questions as f64 - b.total_questions as f64),
        ],
        CellStyle::PLAIN,
    );
}

fn write_overall_single(sheet: &mut Sheet, side: &ReportSide) {
    let o = &side.stats.overall;
    sheet.append_row(["指标", side.name.as_str()], CellStyle::PLAIN);
    sheet.append_row(["平均分".to_string(), format_score(o.average_score)], CellStyle::PLAIN);
    sheet.append_row(["最高分".to_string(), format_score(o.max_score)], CellStyle::PLAIN);
    sheet.append_row(["最低分".to_string(), format_score(o.min_score)], CellStyle::PLAIN);
    sheet.append_row(
        [Cell::from("题目总数"), Cell::Number(o.total_questions as f64)],
        CellStyle::PLAIN,
    );
}

/// Title one blank row below the current content, header right under it,
/// then one row per category. In two-model form the categories are the
/// union of both sides, with 0 for a side that lacks the category.
fn write_category_table<F>(
    sheet: &mut Sheet,
    title: &str,
    key_label: &str,
    base: Option<&ReportSide>,
    compare: Option<&ReportSide>,
    pick: F,
) where
    F: Fn(&StatisticsSummary) -> &BTreeMap<String, CategoryStats>,
{
    let title_row = sheet.row_count() + 1;
    sheet.set(title_row, 0, title, CellStyle::BOLD);

    match (base, compare) {
        (Some(b), Some(c)) => {
            let bm = pick(&b.stats);
            let cm = pick(&c.stats);
            sheet.append_row(
                [
                    key_label.to_string(),
                    format!("{}平均分", b.name),
                    format!("{}平均分", c.name),
                    "差值".to_string(),
                ],
                CellStyle::PLAIN,
            );
            let keys: BTreeSet<&String> = bm.keys().chain(cm.keys()).collect();
            for key in keys {
                let bv = bm.get(key).map(|s| s.average_score).unwrap_or(0.0);
                let cv = cm.get(key).map(|s| s.average_score).unwrap_or(0.0);
                sheet.append_row(
                    [
                        key.clone(),
                        format_score(bv),
                        format_score(cv),
                        format_score(cv - bv),
                    ],
                    CellStyle::PLAIN,
                );
            }
        }
        (Some(only), None) | (None, Some(only)) => {
            sheet.append_row(
                [key_label.to_string(), format!("{}平均分", only.name)],
                CellStyle::PLAIN,
            );
            for (key, stats) in pick(&only.stats) {
                sheet.append_row(
                    [key.clone(), format_score(stats.average_score)],
                    CellStyle::PLAIN,
                );
            }
        }
        (None, None) => {}
    }
}
