//! PDF报告生成模块
//! 调用 wkhtmltopdf 将已写出的 HTML 文件转换为 PDF

use std::io::Read;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::task;
use tracing::{debug, error, info, warn};

use super::ExportError;
use crate::util::logging::standards::events;

const WKHTMLTOPDF: &str = "wkhtmltopdf";

/// PDF生成器
#[derive(Debug, Clone)]
pub struct PdfGenerator {
    timeout: Duration,
}

impl PdfGenerator {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// 将HTML文件转换为PDF；首次失败后重试一次
    pub async fn html_file_to_pdf(&self, html_path: &Path, output_path: &Path) -> Result<(), ExportError> {
        debug!(
            target: "report.pdf",
            event = events::EXPORT_START,
            stage = "html_to_pdf",
            path = %output_path.display()
        );

        let run_attempt = |attempt: usize| {
            let html = html_path.to_path_buf();
            let pdf = output_path.to_path_buf();
            let timeout = self.timeout;
            async move {
                task::spawn_blocking(move || run_wkhtmltopdf_blocking(&html, &pdf, timeout, attempt))
                    .await
                    .map_err(|e| ExportError::Pdf(format!("wkhtmltopdf join error: {e}")))?
            }
        };

        if let Err(err) = run_attempt(1).await {
            warn!("wkhtmltopdf首次转换失败，准备重试: {}", err);
            run_attempt(2).await?;
        }

        debug!(
            target: "report.pdf",
            event = events::EXPORT_COMPLETE,
            stage = "html_to_pdf",
            path = %output_path.display()
        );
        Ok(())
    }

    /// 检查PDF转换工具是否可用，返回版本信息
    pub fn check_pdf_tools() -> Result<String, ExportError> {
        match Command::new(WKHTMLTOPDF).arg("--version").output() {
            Ok(output) if output.status.success() => {
                let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
                info!("[ok] wkhtmltopdf工具可用: {}", version);
                Ok(version)
            }
            Ok(_) => {
                warn!("[warn] wkhtmltopdf工具执行失败");
                Err(ExportError::ToolUnavailable("wkhtmltopdf exited with an error".to_string()))
            }
            Err(e) => {
                warn!("[warn] wkhtmltopdf工具未安装: {}", e);
                Err(ExportError::ToolUnavailable(format!("wkhtmltopdf not found: {e}")))
            }
        }
    }
}

fn run_wkhtmltopdf_blocking(
    html_path: &Path,
    output_path: &Path,
    timeout: Duration,
    attempt: usize,
) -> Result<(), ExportError> {
    let mut command = Command::new(WKHTMLTOPDF);
    command.args([
        "--quiet",
        "--page-size",
        "A4",
        "--margin-top",
        "20mm",
        "--margin-bottom",
        "20mm",
        "--margin-left",
        "15mm",
        "--margin-right",
        "15mm",
        "--encoding",
        "UTF-8",
        "--print-media-type",
        "--enable-local-file-access",
        "--load-error-handling",
        "ignore",
    ]);
    command.arg(html_path);
    command.arg(output_path);

    let (status, stderr) = wait_with_timeout(command, timeout)?;
    if !status.success() {
        error!(
            "wkhtmltopdf转换失败，退出码: {:?}, attempt={}",
            status.code(),
            attempt
        );
        if !stderr.is_empty() {
            error!("wkhtmltopdf stderr: {}", stderr);
        }
        return Err(ExportError::Pdf(format!(
            "wkhtmltopdf exited with {:?}",
            status.code()
        )));
    }
    Ok(())
}

/// 运行子进程直到退出或超时，返回退出状态和 stderr 文本
fn wait_with_timeout(
    mut command: Command,
    timeout: Duration,
) -> Result<(ExitStatus, String), ExportError> {
    command.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::piped());

    let start = Instant::now();
    let mut child = command
        .spawn()
        .map_err(|e| ExportError::Pdf(format!("执行wkhtmltopdf失败: {e}")))?;

    // stderr 在独立线程读取，警告写满管道时子进程不会阻塞
    let stderr_reader = child.stderr.take().map(|mut pipe| {
        std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    });

    loop {
        if let Some(status) = child
            .try_wait()
            .map_err(|e| ExportError::Pdf(format!("等待wkhtmltopdf失败: {e}")))?
        {
            let stderr = stderr_reader
                .and_then(|handle| handle.join().ok())
                .map(|buf| String::from_utf8_lossy(&buf).trim().to_string())
                .unwrap_or_default();
            return Ok((status, stderr));
        }

        if start.elapsed() > timeout {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ExportError::Pdf(format!(
                "wkhtmltopdf 超时({:?})，已终止",
                timeout
            )));
        }

        std::thread::sleep(Duration::from_millis(200));
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn noisy_stderr_does_not_stall_the_child() {
        let mut command = Command::new("sh");
        command.args([
            "-c",
            "i=0; while [ $i -lt 4000 ]; do echo 'Warning: blocked access to file' >&2; i=$((i+1)); done; exit 3",
        ]);

        let (status, stderr) = wait_with_timeout(command, Duration::from_secs(20)).unwrap();
        assert_eq!(status.code(), Some(3));
        assert_eq!(stderr.lines().count(), 4000);
    }

    #[test]
    fn hung_child_is_killed_after_timeout() {
        let mut command = Command::new("sh");
        command.args(["-c", "sleep 30"]);

        let start = Instant::now();
        let err = wait_with_timeout(command, Duration::from_millis(300)).unwrap_err();
        assert!(matches!(err, ExportError::Pdf(_)));
        assert!(start.elapsed() < Duration::from_secs(10));
    }
}
