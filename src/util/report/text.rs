//! 纯文本报告

use super::html::format_created_at;
use crate::model::report::ReportRecord;
use std::fmt::Write;

/// 已选评估项目与评语的纯文本形式
pub fn render_text(record: &ReportRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Photo critique report");
    let _ = writeln!(out, "Report ID: {}", record.report_id);
    let _ = writeln!(out, "Source file: {}", record.source_name);
    let _ = writeln!(out, "Created: {}", format_created_at(record));

    for (category, text) in record.assessments().entries() {
        let _ = write!(out, "\n[{}]\n{}\n", category.title(), text);
    }

    let _ = write!(out, "\n[Critique]\n{}\n", record.critique.trim());
    out
}
