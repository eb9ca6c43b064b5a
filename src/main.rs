use std::io::Write;

use photo_critic::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    std::panic::set_hook(Box::new(|panic_info| {
        let payload = panic_info.payload();
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s
        } else {
            "Unknown panic payload"
        };

        let location = panic_info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "Unknown location".to_string());

        let now = chrono::Local::now();
        eprintln!("[PANIC] photo-critic 异常退出");
        eprintln!("位置: {}", location);
        eprintln!("原因: {}", message);
        eprintln!("时间: {}", now.format("%Y-%m-%d %H:%M:%S %:z"));

        tracing::error!(event = "panic.raised", location = %location, reason = %message);

        let panic_msg = format!(
            "PANIC\nLocation: {}\nReason: {}\nTime: {}\nVersion: {}\n\n",
            location,
            message,
            now.to_rfc3339(),
            photo_critic::build_info::summary()
        );
        let panic_file = format!("./logs/panic-{}.log", now.format("%Y%m%d-%H%M%S"));
        let written = std::fs::create_dir_all("./logs")
            .and_then(|_| std::fs::write(&panic_file, &panic_msg));
        match written {
            Ok(()) => eprintln!("[OK] Panic信息已保存到 {}", panic_file),
            Err(e) => eprintln!("[WARN] 无法写入panic日志: {}", e),
        }

        std::io::stderr().flush().ok();
    }));

    let mut args = std::env::args();
    let _ = args.next();

    match args.next().as_deref() {
        Some("health-check") | Some("--health-check") => {
            let report = server::check_system_health().await?;
            println!("健康检查:\n{}", report);
            if !report.overall_healthy {
                std::process::exit(1);
            }
            Ok(())
        }
        Some("serve") | None => server::start_server().await,
        Some(other) => {
            eprintln!("未知命令: {}", other);
            eprintln!("用法: photo-critic [serve|health-check]");
            std::process::exit(2);
        }
    }
}
