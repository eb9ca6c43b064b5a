use crate::model::evaluation::{Assessments, CategorySelection};
use serde::Serialize;
use std::fmt::Write;

/// 发送给文本生成服务的请求文本
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CritiquePrompt {
    text: String,
}

impl CritiquePrompt {
    /// 只嵌入已选项目的结论，原文照录
    pub fn build(assessments: &Assessments, selection: &CategorySelection, language: &str) -> Self {
        let language = match language.trim() {
            "" => "English",
            other => other,
        };

        let mut text = String::new();
        let _ = writeln!(
            text,
            "Based on the following photo assessments, write a natural overall critique of the photo in {language}."
        );
        text.push('\n');

        for category in selection.iter() {
            let _ = writeln!(
                text,
                "- {} assessment: {}",
                category.title(),
                assessments.get(category)
            );
        }

        text.push('\n');
        let _ = write!(
            text,
            "Do not simply restate the assessments. Summarize your impression of the whole photo, \
             its tone and its atmosphere in natural, cohesive prose."
        );

        Self { text }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::evaluation::EvaluationCategory;

    fn assessments() -> Assessments {
        Assessments {
            composition: "The subject sits in the center.".to_string(),
            brightness: "The photo is bright overall.".to_string(),
            sharpness: "The photo is sharp (variance: 250.00).".to_string(),
        }
    }

    #[test]
    fn prompt_embeds_selected_messages_verbatim() {
        let prompt = CritiquePrompt::build(&assessments(), &CategorySelection::all(), "English");
        let text = prompt.text();
        assert!(text.contains("- Composition assessment: The subject sits in the center."));
        assert!(text.contains("- Brightness assessment: The photo is bright overall."));
        assert!(text.contains("(variance: 250.00)"));
        assert!(text.contains("in English"));
    }

    #[test]
    fn prompt_skips_unselected_categories() {
        let selection = CategorySelection::new([EvaluationCategory::Sharpness]).unwrap();
        let prompt = CritiquePrompt::build(&assessments(), &selection, "Japanese");
        assert!(!prompt.text().contains("Composition assessment"));
        assert!(prompt.text().contains("Sharpness assessment"));
        assert!(prompt.text().contains("in Japanese"));
    }

    #[test]
    fn blank_language_falls_back_to_english() {
        let prompt = CritiquePrompt::build(&assessments(), &CategorySelection::all(), "  ");
        assert!(prompt.text().contains("in English"));
    }

    #[test]
    fn prompt_is_deterministic() {
        let a = CritiquePrompt::build(&assessments(), &CategorySelection::all(), "English");
        let b = CritiquePrompt::build(&assessments(), &CategorySelection::all(), "English");
        assert_eq!(a, b);
    }
}
