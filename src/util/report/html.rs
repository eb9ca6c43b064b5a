//! HTML报告生成模块
//! 固定版式：标题、基础信息、照片、各项评估、评语

use crate::model::report::ReportRecord;
use build_html::{Html, HtmlContainer, HtmlPage, Table};

/// HTML报告生成器
pub struct HtmlReportGenerator;

impl HtmlReportGenerator {
    /// 生成内置版式的评语报告；只依赖记录内容，同一记录输出逐字节一致
    pub fn generate_report(record: &ReportRecord) -> String {
        let mut html = HtmlPage::new()
            .with_title(format!("Photo critique - {}", escape_html(&record.report_id)))
            .with_meta(vec![("charset", "utf-8")])
            .with_style(super::styles::get_report_css());

        html.add_raw("<h1 class=\"report-title\">Photo Critique Report</h1>");

        html.add_raw("<div class=\"section\">");
        html.add_raw("<h2>Overview</h2>");
        html.add_table(Table::from([
            ["Report ID".to_string(), escape_html(&record.report_id)],
            ["Source file".to_string(), escape_html(&record.source_name)],
            ["Created".to_string(), format_created_at(record)],
        ]));
        html.add_raw("</div>");

        if let Some(image) = record.image_base64.as_deref().filter(|s| !s.is_empty()) {
            html.add_raw("<div class=\"section photo\">");
            html.add_raw(&format!(
                "<img src=\"data:image/jpeg;base64,{}\" alt=\"{}\" />",
                escape_html(image),
                escape_html(&record.source_name)
            ));
            html.add_raw("</div>");
        }

        let rows: Vec<[String; 2]> = record
            .assessments()
            .entries()
            .map(|(category, text)| [category.title().to_string(), escape_html(text)])
            .collect();
        if !rows.is_empty() {
            html.add_raw("<div class=\"section\">");
            html.add_raw("<h2>Assessments</h2>");
            html.add_table(Table::from(rows).with_header_row(["Category", "Assessment"]));
            html.add_raw("</div>");
        }

        html.add_raw("<div class=\"section critique\">");
        html.add_raw("<h2>Critique</h2>");
        html.add_raw(&paragraphs(&record.critique));
        html.add_raw("</div>");

        html.add_raw("<div class=\"footer\">");
        html.add_raw(&format!(
            "<p>Generated by photo-critic {}</p>",
            env!("CARGO_PKG_VERSION")
        ));
        html.add_raw("</div>");

        html.to_html_string()
    }
}

pub fn format_created_at(record: &ReportRecord) -> String {
    record.created_at.format("%Y-%m-%d %H:%M:%S %:z").to_string()
}

/// 按空行或换行拆分为段落
fn paragraphs(text: &str) -> String {
    let parts: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| format!("<p>{}</p>", escape_html(line)))
        .collect();

    if parts.is_empty() {
        "<p>-</p>".to_string()
    } else {
        parts.join("")
    }
}

pub fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
