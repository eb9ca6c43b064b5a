//! 报告模板管理模块
//! 用户自定义 HTML 模板，使用 `{{name}}` 占位符绑定记录字段

use super::html::{escape_html, format_created_at};
use super::ExportError;
use crate::model::report::ReportRecord;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;
use tracing::warn;

/// 可用占位符
pub const PLACEHOLDERS: [&str; 8] = [
    "image_base64",
    "composition",
    "brightness",
    "sharpness",
    "comment",
    "report_id",
    "source_name",
    "created_at",
];

/// 报告模板引擎
#[derive(Debug, Default, Clone)]
pub struct TemplateEngine {
    templates: HashMap<String, String>,
}

impl TemplateEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册自定义模板
    pub fn register_template(&mut self, name: impl Into<String>, template: impl Into<String>) {
        self.templates.insert(name.into(), template.into());
    }

    /// 从文件加载模板
    pub fn load_template_file(&mut self, name: &str, path: &Path) -> Result<(), ExportError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ExportError::Template(format!("cannot read template {}: {}", path.display(), e))
        })?;
        self.register_template(name, content);
        Ok(())
    }

    pub fn list_templates(&self) -> Vec<&String> {
        let mut names: Vec<_> = self.templates.keys().collect();
        names.sort();
        names
    }

    /// 使用模板生成报告
    pub fn render_template(&self, name: &str, record: &ReportRecord) -> Result<String, ExportError> {
        let template = self
            .templates
            .get(name)
            .ok_or_else(|| ExportError::Template(format!("template not found: {name}")))?;
        Ok(render(template, record))
    }
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("placeholder regex is valid")
    })
}

/// 替换占位符；未知占位符替换为空并记录警告
fn render(template: &str, record: &ReportRecord) -> String {
    placeholder_regex()
        .replace_all(template, |caps: &Captures| {
            let key = &caps[1];
            match key {
                "image_base64" => escape_html(record.image_base64.as_deref().unwrap_or_default()),
                "composition" => escape_html(&record.composition),
                "brightness" => escape_html(&record.brightness),
                "sharpness" => escape_html(&record.sharpness),
                "comment" => escape_html(&record.critique),
                "report_id" => escape_html(&record.report_id),
                "source_name" => escape_html(&record.source_name),
                "created_at" => format_created_at(record),
                unknown => {
                    warn!("报告模板包含未知占位符: {}", unknown);
                    String::new()
                }
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::evaluation::Assessments;
    use chrono::{Local, TimeZone};

    fn record() -> ReportRecord {
        ReportRecord::assemble(
            "lake.png",
            Assessments {
                composition: "centered".to_string(),
                brightness: "balanced".to_string(),
                sharpness: "soft <blurry>".to_string(),
            },
            "Still water.".to_string(),
            Some("Zm9v".to_string()),
            Local.with_ymd_and_hms(2024, 3, 4, 5, 6, 7).single().unwrap(),
        )
    }

    #[test]
    fn placeholders_are_bound_and_escaped() {
        let mut engine = TemplateEngine::new();
        engine.register_template(
            "custom",
            "<img src=\"data:image/jpeg;base64,{{image_base64}}\">{{ composition }}|{{brightness}}|{{sharpness}}|{{comment}}|{{report_id}}",
        );

        let out = engine.render_template("custom", &record()).unwrap();
        assert_eq!(
            out,
            "<img src=\"data:image/jpeg;base64,Zm9v\">centered|balanced|soft &lt;blurry&gt;|Still water.|lake_20240304_050607"
        );
    }

    #[test]
    fn image_placeholder_cannot_break_out_of_attribute() {
        let mut engine = TemplateEngine::new();
        engine.register_template("img", "<img src=\"data:image/jpeg;base64,{{image_base64}}\">");

        let mut record = record();
        record.image_base64 = Some("\"><script>alert(1)</script>".to_string());
        let out = engine.render_template("img", &record).unwrap();
        assert!(!out.contains("<script>"));
        assert!(!out.contains("base64,\">"));
    }

    #[test]
    fn unknown_placeholders_render_empty() {
        let mut engine = TemplateEngine::new();
        engine.register_template("t", "[{{ nope }}]");
        assert_eq!(engine.render_template("t", &record()).unwrap(), "[]");
    }

    #[test]
    fn missing_template_is_an_error() {
        let engine = TemplateEngine::new();
        assert!(matches!(
            engine.render_template("absent", &record()),
            Err(ExportError::Template(_))
        ));
    }

    #[test]
    fn loads_template_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("report_template.html");
        std::fs::write(&path, "<p>{{comment}}</p>").unwrap();

        let mut engine = TemplateEngine::new();
        engine.load_template_file("file", &path).unwrap();
        assert_eq!(engine.list_templates(), vec!["file"]);
        assert_eq!(engine.render_template("file", &record()).unwrap(), "<p>Still water.</p>");
    }
}
