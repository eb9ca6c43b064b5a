//! 评估项目选择与文字结论

use crate::error::CriticError;
use photo_heuristics::HeuristicReport;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 评估项目
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationCategory {
    Composition,
    Brightness,
    Sharpness,
}

impl EvaluationCategory {
    pub const ALL: [EvaluationCategory; 3] = [
        EvaluationCategory::Composition,
        EvaluationCategory::Brightness,
        EvaluationCategory::Sharpness,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluationCategory::Composition => "composition",
            EvaluationCategory::Brightness => "brightness",
            EvaluationCategory::Sharpness => "sharpness",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            EvaluationCategory::Composition => "Composition",
            EvaluationCategory::Brightness => "Brightness",
            EvaluationCategory::Sharpness => "Sharpness",
        }
    }
}

impl fmt::Display for EvaluationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvaluationCategory {
    type Err = CriticError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "composition" => Ok(EvaluationCategory::Composition),
            "brightness" => Ok(EvaluationCategory::Brightness),
            "sharpness" => Ok(EvaluationCategory::Sharpness),
            other => Err(CriticError::InvalidInput(format!(
                "unknown evaluation category: {other}"
            ))),
        }
    }
}

/// 已选评估项目：非空、去重、按固定顺序排列
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<EvaluationCategory>", into = "Vec<EvaluationCategory>")]
pub struct CategorySelection(Vec<EvaluationCategory>);

impl CategorySelection {
    pub fn all() -> Self {
        Self(EvaluationCategory::ALL.to_vec())
    }

    pub fn new(categories: impl IntoIterator<Item = EvaluationCategory>) -> Result<Self, CriticError> {
        let mut categories: Vec<_> = categories.into_iter().collect();
        categories.sort();
        categories.dedup();
        if categories.is_empty() {
            return Err(CriticError::InvalidInput(
                "at least one evaluation category must be selected".to_string(),
            ));
        }
        Ok(Self(categories))
    }

    /// 解析逗号分隔的列表，例如 `composition,sharpness`
    pub fn parse_list(list: &str) -> Result<Self, CriticError> {
        let categories = list
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(EvaluationCategory::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(categories)
    }

    pub fn contains(&self, category: EvaluationCategory) -> bool {
        self.0.contains(&category)
    }

    pub fn iter(&self) -> impl Iterator<Item = EvaluationCategory> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[EvaluationCategory] {
        &self.0
    }
}

impl Default for CategorySelection {
    fn default() -> Self {
        Self::all()
    }
}

impl TryFrom<Vec<EvaluationCategory>> for CategorySelection {
    type Error = CriticError;

    fn try_from(value: Vec<EvaluationCategory>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CategorySelection> for Vec<EvaluationCategory> {
    fn from(value: CategorySelection) -> Self {
        value.0
    }
}

/// 各项目的文字结论；未选中的项目为空字符串
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessments {
    pub composition: String,
    pub brightness: String,
    pub sharpness: String,
}

impl Assessments {
    pub fn from_report(report: &HeuristicReport, selection: &CategorySelection) -> Self {
        let pick = |category, message: String| {
            if selection.contains(category) {
                message
            } else {
                String::new()
            }
        };

        Self {
            composition: pick(EvaluationCategory::Composition, report.composition.message()),
            brightness: pick(EvaluationCategory::Brightness, report.brightness.message()),
            sharpness: pick(EvaluationCategory::Sharpness, report.sharpness.message()),
        }
    }

    pub fn get(&self, category: EvaluationCategory) -> &str {
        match category {
            EvaluationCategory::Composition => &self.composition,
            EvaluationCategory::Brightness => &self.brightness,
            EvaluationCategory::Sharpness => &self.sharpness,
        }
    }

    /// 非空项目，按固定顺序
    pub fn entries(&self) -> impl Iterator<Item = (EvaluationCategory, &str)> + '_ {
        EvaluationCategory::ALL
            .into_iter()
            .map(|category| (category, self.get(category)))
            .filter(|(_, text)| !text.is_empty())
    }
}
