pub mod evaluation;
pub mod report;

pub use evaluation::{Assessments, CategorySelection, EvaluationCategory};
pub use report::{RecordError, ReportRecord};
