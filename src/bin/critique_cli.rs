use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use tracing::{error, info};

use photo_critic::model::CategorySelection;
use photo_critic::pipeline::{CritiqueRequest, PipelineOutcome, StageOutcome};
use photo_critic::server::ConfigManager;
use photo_critic::util::log::log_init_stderr;
use photo_critic::{build_pipeline, CriticError};

const USAGE: &str = "用法:
  critique-cli evaluate <image> [--categories composition,brightness,sharpness] [--save] [--export] [--text]
  critique-cli history";

enum Command {
    Evaluate {
        image: PathBuf,
        categories: Option<CategorySelection>,
        save: bool,
        export: bool,
        text: bool,
    },
    History,
}

fn parse_args(args: &[String]) -> Result<Command, CriticError> {
    let Some((command, rest)) = args.split_first() else {
        return Err(CriticError::InvalidInput("missing command".to_string()));
    };

    match command.as_str() {
        "history" => Ok(Command::History),
        "evaluate" => {
            let mut image = None;
            let mut categories = None;
            let (mut save, mut export, mut text) = (false, false, false);

            let mut iter = rest.iter();
            while let Some(arg) = iter.next() {
                match arg.as_str() {
                    "--save" => save = true,
                    "--export" => export = true,
                    "--text" => text = true,
                    "--categories" => {
                        let value = iter.next().ok_or_else(|| {
                            CriticError::InvalidInput("--categories needs a value".to_string())
                        })?;
                        categories = Some(CategorySelection::parse_list(value)?);
                    }
                    flag if flag.starts_with("--") => {
                        return Err(CriticError::InvalidInput(format!("unknown option: {flag}")));
                    }
                    path if image.is_none() => image = Some(PathBuf::from(path)),
                    extra => {
                        return Err(CriticError::InvalidInput(format!(
                            "unexpected argument: {extra}"
                        )));
                    }
                }
            }

            let image = image
                .ok_or_else(|| CriticError::InvalidInput("missing image path".to_string()))?;
            Ok(Command::Evaluate {
                image,
                categories,
                save,
                export,
                text,
            })
        }
        other => Err(CriticError::InvalidInput(format!("unknown command: {other}"))),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match parse_args(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{e}\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    match run(command).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("[fail] {:#}", e);
            match e.downcast_ref::<CriticError>() {
                Some(err) if err.is_invalid_input() => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

async fn run(command: Command) -> Result<ExitCode> {
    let (config, validation) = ConfigManager::load_and_validate().context("加载配置文件失败")?;
    log_init_stderr(&config.logging.level);

    if validation.has_errors() {
        for issue in &validation.errors {
            eprintln!("  - {}: {}", issue.field, issue.message);
        }
        return Err(anyhow!(
            "配置验证失败，共 {} 个错误，请先修复配置",
            validation.error_count()
        ));
    }

    let pipeline = build_pipeline(&config)?;

    match command {
        Command::History => {
            let records = pipeline.history().await?;
            if records.is_empty() {
                println!("(no saved critiques)");
            }
            for record in &records {
                println!("#{} {} {}", record.id, record.timestamp, record.filename);
                for (label, text) in [
                    ("Composition", &record.composition),
                    ("Brightness", &record.brightness),
                    ("Sharpness", &record.sharpness),
                    ("Critique", &record.critique),
                ] {
                    if !text.is_empty() {
                        println!("  {label}: {text}");
                    }
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Evaluate {
            image,
            categories,
            save,
            export,
            text,
        } => {
            let bytes = tokio::fs::read(&image)
                .await
                .map_err(|e| CriticError::InvalidInput(format!("{}: {e}", image.display())))?;

            let mut request = CritiqueRequest::new(source_name(&image), bytes);
            request.categories = categories;
            request.persist = Some(save);
            request.export = Some(export);
            request.text_export = Some(text);

            let outcome = pipeline.run(request).await?;
            print!("{}", pipeline.render_text(&outcome.record));
            print_sinks(&outcome);

            info!(report_id = %outcome.record.report_id, "评估完成");
            if outcome.critique_error.is_some() || outcome.has_failed_sink() {
                Ok(ExitCode::FAILURE)
            } else {
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_sinks(outcome: &PipelineOutcome) {
    if let Some(err) = &outcome.critique_error {
        eprintln!("[fail] critique: {err}");
    }

    match &outcome.persisted {
        StageOutcome::Skipped => {}
        StageOutcome::Completed { result } => println!("saved: record #{result}"),
        StageOutcome::Failed { error, .. } => eprintln!("[fail] save: {error}"),
    }

    match &outcome.exported {
        StageOutcome::Skipped => {}
        StageOutcome::Completed { result } => {
            println!("exported: {}", result.html_path.display());
            if let Some(pdf) = &result.pdf_path {
                println!("exported: {}", pdf.display());
            }
        }
        StageOutcome::Failed { error, .. } => eprintln!("[fail] export: {error}"),
    }

    match &outcome.text_exported {
        StageOutcome::Skipped => {}
        StageOutcome::Completed { result } => println!("exported: {}", result.display()),
        StageOutcome::Failed { error, .. } => eprintln!("[fail] text export: {error}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn evaluate_parses_flags_and_categories() {
        let command = parse_args(&args(&[
            "evaluate",
            "photo.jpg",
            "--categories",
            "sharpness,brightness",
            "--save",
            "--text",
        ]))
        .unwrap();

        match command {
            Command::Evaluate {
                image,
                categories,
                save,
                export,
                text,
            } => {
                assert_eq!(image, PathBuf::from("photo.jpg"));
                assert_eq!(categories.unwrap().as_slice().len(), 2);
                assert!(save && text && !export);
            }
            Command::History => panic!("expected evaluate"),
        }
    }

    #[test]
    fn bad_arguments_are_invalid_input() {
        for bad in [
            vec!["evaluate"],
            vec!["evaluate", "a.jpg", "--categories"],
            vec!["evaluate", "a.jpg", "--categories", "exposure"],
            vec!["evaluate", "a.jpg", "--zoom"],
            vec!["publish"],
            vec![],
        ] {
            let err = parse_args(&args(&bad)).err().unwrap();
            assert!(err.is_invalid_input(), "{bad:?}");
        }
    }

    #[test]
    fn history_takes_no_arguments() {
        assert!(matches!(parse_args(&args(&["history"])).unwrap(), Command::History));
    }
}
