//! 评估流水线
//!
//! 解码 → 启发式评估 → 评语 → 记录库 / 文档导出 / 纯文本导出
//!
//! 只有输入无效会中止流水线；之后每个步骤独立失败，不丢弃之前的结果。

pub mod outcome;

pub use outcome::{ImageInfo, PipelineOutcome, StageOutcome};

use chrono::Local;
use photo_heuristics::{encode_embed, evaluate, HeuristicReport, Photo};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::db::{ReportStore, StoredReport};
use crate::error::{CriticError, CriticResult};
use crate::model::evaluation::{Assessments, CategorySelection};
use crate::model::report::ReportRecord;
use crate::util::config::Config;
use crate::util::critique::{CritiqueGenerator, CritiquePrompt};
use crate::util::logging::standards::events;
use crate::util::report::{ExportedReport, ReportExporter};

/// 流水线默认行为
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub categories: CategorySelection,
    pub auto_persist: bool,
    pub auto_export: bool,
    pub text_export: bool,
    pub embed_image: bool,
    pub embed_max_side: u32,
    pub embed_quality: u8,
    pub language: String,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> CriticResult<Self> {
        Ok(Self {
            categories: CategorySelection::new(config.pipeline.categories.iter().copied())?,
            auto_persist: config.pipeline.auto_persist,
            auto_export: config.pipeline.auto_export,
            text_export: config.pipeline.text_export,
            embed_image: config.pipeline.embed_image,
            embed_max_side: config.report.embed_max_side,
            embed_quality: config.report.embed_jpeg_quality,
            language: config.critique.language.clone(),
        })
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            categories: CategorySelection::all(),
            auto_persist: false,
            auto_export: false,
            text_export: false,
            embed_image: true,
            embed_max_side: photo_heuristics::DEFAULT_EMBED_MAX_SIDE,
            embed_quality: photo_heuristics::DEFAULT_EMBED_QUALITY,
            language: "English".to_string(),
        }
    }
}

/// 一次评估请求；未指定的选项使用流水线默认值
#[derive(Debug, Clone, Default)]
pub struct CritiqueRequest {
    pub source_name: String,
    pub bytes: Vec<u8>,
    pub categories: Option<CategorySelection>,
    pub persist: Option<bool>,
    pub export: Option<bool>,
    pub text_export: Option<bool>,
}

impl CritiqueRequest {
    pub fn new(source_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            source_name: source_name.into(),
            bytes,
            ..Self::default()
        }
    }
}

/// 解码与评估的产物
struct Evaluated {
    image: ImageInfo,
    heuristics: HeuristicReport,
    embed: Option<String>,
}

pub struct CritiquePipeline {
    generator: Arc<dyn CritiqueGenerator>,
    store: Arc<dyn ReportStore>,
    exporter: Arc<ReportExporter>,
    settings: PipelineSettings,
}

impl CritiquePipeline {
    pub fn new(
        generator: Arc<dyn CritiqueGenerator>,
        store: Arc<dyn ReportStore>,
        exporter: Arc<ReportExporter>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            generator,
            store,
            exporter,
            settings,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<dyn ReportStore> {
        &self.store
    }

    pub fn exporter(&self) -> &Arc<ReportExporter> {
        &self.exporter
    }

    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }

    /// 执行完整流水线；仅在输入无效时返回错误
    pub async fn run(&self, request: CritiqueRequest) -> CriticResult<PipelineOutcome> {
        let start = Instant::now();
        let selection = request
            .categories
            .clone()
            .unwrap_or_else(|| self.settings.categories.clone());

        info!(
            event = events::PIPELINE_START,
            source = %request.source_name,
            bytes = request.bytes.len(),
            categories = ?selection.as_slice()
        );

        let evaluated = self.decode_and_evaluate(request.bytes).await?;
        let assessments = Assessments::from_report(&evaluated.heuristics, &selection);

        let (critique, critique_error) = match self.critique(&assessments, &selection).await {
            Ok(text) => (text, None),
            Err(err) => {
                warn!(
                    event = events::PIPELINE_ERROR,
                    stage = "critique",
                    kind = err.kind(),
                    error = %err
                );
                (String::new(), Some(err.to_string()))
            }
        };

        let record = ReportRecord::assemble(
            &request.source_name,
            assessments.clone(),
            critique,
            evaluated.embed,
            Local::now(),
        );

        let persisted = if request.persist.unwrap_or(self.settings.auto_persist) {
            StageOutcome::from_result(self.persist(&record).await)
        } else {
            StageOutcome::Skipped
        };

        let exported = if request.export.unwrap_or(self.settings.auto_export) {
            StageOutcome::from_result(self.export(&record).await)
        } else {
            StageOutcome::Skipped
        };

        let text_exported = if request.text_export.unwrap_or(self.settings.text_export) {
            StageOutcome::from_result(self.export_text(&record).await)
        } else {
            StageOutcome::Skipped
        };

        info!(
            event = events::PIPELINE_COMPLETE,
            report_id = %record.report_id,
            critique_ok = critique_error.is_none(),
            persisted = !matches!(persisted, StageOutcome::Skipped),
            exported = !matches!(exported, StageOutcome::Skipped),
            elapsed_ms = start.elapsed().as_millis() as u64
        );

        Ok(PipelineOutcome {
            image: evaluated.image,
            categories: selection,
            heuristics: evaluated.heuristics,
            assessments,
            critique_error,
            record,
            persisted,
            exported,
            text_exported,
        })
    }

    /// 解码、评估与缩略图编码均为 CPU 密集，放在阻塞线程池执行
    async fn decode_and_evaluate(&self, bytes: Vec<u8>) -> CriticResult<Evaluated> {
        let embed_image = self.settings.embed_image;
        let max_side = self.settings.embed_max_side;
        let quality = self.settings.embed_quality;

        let evaluated = tokio::task::spawn_blocking(move || -> CriticResult<Evaluated> {
            let photo = Photo::decode(&bytes)?;
            let heuristics = evaluate(&photo);
            let embed = if embed_image {
                match encode_embed(&photo, max_side, quality) {
                    Ok(encoded) => Some(encoded),
                    Err(e) => {
                        warn!(event = events::PIPELINE_STAGE, stage = "embed", error = %e);
                        None
                    }
                }
            } else {
                None
            };
            Ok(Evaluated {
                image: ImageInfo {
                    width: photo.width(),
                    height: photo.height(),
                },
                heuristics,
                embed,
            })
        })
        .await
        .map_err(|e| CriticError::InvalidInput(format!("image evaluation aborted: {e}")))?;

        match &evaluated {
            Ok(done) => debug!(
                event = events::HEURISTICS_COMPLETE,
                width = done.image.width,
                height = done.image.height,
                brightness = done.heuristics.brightness.label(),
                sharpness = done.heuristics.sharpness.label(),
                composition = done.heuristics.composition.label()
            ),
            Err(err) => warn!(event = events::UPLOAD_REJECTED, error = %err),
        }
        evaluated
    }

    /// 生成评语；只调用一次外部服务
    pub async fn critique(
        &self,
        assessments: &Assessments,
        selection: &CategorySelection,
    ) -> CriticResult<String> {
        let prompt = CritiquePrompt::build(assessments, selection, &self.settings.language);
        Ok(self.generator.generate(&prompt).await?)
    }

    pub async fn persist(&self, record: &ReportRecord) -> CriticResult<i64> {
        record.validate()?;
        self.store.insert(record).await.map_err(|e| {
            warn!(event = events::RECORD_ERROR, report_id = %record.report_id, error = %e);
            CriticError::from(e)
        })
    }

    pub async fn history(&self) -> CriticResult<Vec<StoredReport>> {
        Ok(self.store.list().await?)
    }

    pub async fn export(&self, record: &ReportRecord) -> CriticResult<ExportedReport> {
        record.validate()?;
        Ok(self.exporter.export(record).await?)
    }

    pub async fn export_text(&self, record: &ReportRecord) -> CriticResult<PathBuf> {
        record.validate()?;
        Ok(self.exporter.export_text(record).await?)
    }

    pub fn render_text(&self, record: &ReportRecord) -> String {
        self.exporter.render_text(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteReportStore;
    use crate::model::evaluation::EvaluationCategory;
    use crate::util::critique::fakes::{FailingCritique, StaticCritique};
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use tempfile::TempDir;

    fn png(width: u32, height: u32, value: u8) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([value, value, value]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn pipeline(dir: &TempDir, generator: Arc<dyn CritiqueGenerator>) -> CritiquePipeline {
        CritiquePipeline::new(
            generator,
            Arc::new(SqliteReportStore::new(dir.path().join("photo_comments.db"))),
            Arc::new(ReportExporter::new(dir.path().join("reports"))),
            PipelineSettings::default(),
        )
    }

    #[tokio::test]
    async fn white_image_runs_end_to_end() {
        let dir = TempDir::new().unwrap();
        let generator = Arc::new(StaticCritique::new("A bright, airy frame."));
        let pipeline = pipeline(&dir, generator.clone());

        let mut request = CritiqueRequest::new("white.png", png(8, 8, 255));
        request.persist = Some(true);
        request.export = Some(true);
        request.text_export = Some(true);

        let outcome = pipeline.run(request).await.unwrap();
        assert_eq!(outcome.image, ImageInfo { width: 8, height: 8 });
        assert_eq!(outcome.heuristics.brightness.label(), "bright");
        assert_eq!(outcome.heuristics.sharpness.label(), "soft");
        assert_eq!(outcome.heuristics.sharpness.variance_display(), "0.00");
        assert_eq!(outcome.heuristics.composition.label(), "centered");
        assert_eq!(outcome.critique(), Some("A bright, airy frame."));
        assert!(outcome.record.image_base64.is_some());
        assert!(!outcome.has_failed_sink());

        let id = *outcome.persisted.completed().unwrap();
        let history = pipeline.history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, id);
        assert_eq!(history[0].critique, "A bright, airy frame.");

        let exported = outcome.exported.completed().unwrap();
        assert!(exported.html_path.exists());
        assert!(outcome.text_exported.completed().unwrap().exists());

        let prompts = generator.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains(&outcome.assessments.brightness));
    }

    #[tokio::test]
    async fn undecodable_bytes_are_invalid_input() {
        let dir = TempDir::new().unwrap();
        let generator = Arc::new(StaticCritique::new("unused"));
        let pipeline = pipeline(&dir, generator.clone());

        let err = pipeline
            .run(CritiqueRequest::new("notes.txt", b"plain text".to_vec()))
            .await
            .unwrap_err();
        assert!(err.is_invalid_input());
        assert!(generator.prompts().is_empty());

        let err = pipeline
            .run(CritiqueRequest::new("empty.png", Vec::new()))
            .await
            .unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[tokio::test]
    async fn critique_failure_keeps_heuristics_and_sinks() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir, Arc::new(FailingCritique));

        let mut request = CritiqueRequest::new("black.png", png(16, 16, 0));
        request.persist = Some(true);

        let outcome = pipeline.run(request).await.unwrap();
        assert!(outcome.critique().is_none());
        assert!(outcome.critique_error.as_deref().unwrap().contains("quota"));
        assert_eq!(outcome.heuristics.brightness.label(), "dark");
        assert_eq!(outcome.heuristics.composition.label(), "cannot analyze");
        assert!(outcome.persisted.completed().is_some());
        assert!(matches!(outcome.exported, StageOutcome::Skipped));
    }

    #[tokio::test]
    async fn category_selection_limits_record_fields() {
        let dir = TempDir::new().unwrap();
        let generator = Arc::new(StaticCritique::new("Nice."));
        let pipeline = pipeline(&dir, generator.clone());

        let mut request = CritiqueRequest::new("gray.png", png(8, 8, 128));
        request.categories = Some(CategorySelection::new([EvaluationCategory::Sharpness]).unwrap());

        let outcome = pipeline.run(request).await.unwrap();
        assert!(outcome.record.composition.is_empty());
        assert!(outcome.record.brightness.is_empty());
        assert!(!outcome.record.sharpness.is_empty());
        assert!(!generator.prompts()[0].contains("Brightness assessment"));
    }

    #[tokio::test]
    async fn failed_sink_does_not_discard_results() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();

        let pipeline = CritiquePipeline::new(
            Arc::new(StaticCritique::new("Fine.")),
            Arc::new(SqliteReportStore::new(dir.path().join("photo_comments.db"))),
            Arc::new(ReportExporter::new(blocker.join("reports"))),
            PipelineSettings {
                auto_persist: true,
                auto_export: true,
                ..PipelineSettings::default()
            },
        );

        let outcome = pipeline
            .run(CritiqueRequest::new("white.png", png(8, 8, 255)))
            .await
            .unwrap();
        assert!(outcome.persisted.completed().is_some());
        match &outcome.exported {
            StageOutcome::Failed { kind, .. } => assert_eq!(kind, "export"),
            other => panic!("unexpected export outcome: {other:?}"),
        }
        assert!(outcome.has_failed_sink());
        assert_eq!(outcome.critique(), Some("Fine."));
    }

    #[tokio::test]
    async fn submitted_records_with_bad_ids_are_invalid_input() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir, Arc::new(StaticCritique::new("Fine.")));

        let outcome = pipeline
            .run(CritiqueRequest::new("white.png", png(4, 4, 255)))
            .await
            .unwrap();
        let mut record = outcome.record;
        record.report_id = "../x".to_string();

        assert!(pipeline.persist(&record).await.unwrap_err().is_invalid_input());
        assert!(pipeline.export(&record).await.unwrap_err().is_invalid_input());
        assert!(pipeline.export_text(&record).await.unwrap_err().is_invalid_input());
        assert!(pipeline.history().await.unwrap().is_empty());
    }
}
