//! HTTP服务器设置模块
//! 负责创建和配置HTTP服务器

use crate::api::routes;
use crate::util::config::Config;
use crate::AppState;
use anyhow::Result;
use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
use tracing::{info, warn};

/// HTTP服务器管理器
pub struct ServerManager;

impl ServerManager {
    /// 创建HTTP服务器
    pub async fn create_server(config: &Config, app_state: AppState) -> Result<HttpServer> {
        info!(
            target: "server.http",
            event = "http.server.create",
            "创建HTTP服务器"
        );

        let listener = Self::bind_listener(&config.server.host, config.get_port()).await?;
        let local_addr = listener.local_addr()?;

        info!(
            target: "server.http",
            event = "http.router.build"
        );
        let app_routes = routes(app_state);

        info!(
            target: "server.http",
            event = "http.server.ready",
            address = %local_addr
        );

        Ok(HttpServer {
            listener,
            app_routes,
            local_addr,
        })
    }

    /// 绑定监听端口
    ///
    /// 通配地址优先尝试 IPv6 双栈，失败再降级 IPv4；其它地址按配置绑定
    pub async fn bind_listener(host: &str, port: u16) -> Result<TcpListener> {
        info!(
            target: "server.http",
            event = "http.server.bind_start",
            host,
            port
        );

        let host = host.trim();
        if !matches!(host, "" | "0.0.0.0" | "::" | "[::]") {
            let listener = TcpListener::bind((host, port))
                .await
                .map_err(|e| anyhow::anyhow!("端口 {} 绑定失败 ({}): {}", port, host, e))?;
            info!(
                target: "server.http",
                event = "http.server.bound",
                address = %listener.local_addr()?
            );
            return Ok(listener);
        }

        // 部分环境浏览器对 localhost 优先走 ::1，若仅监听 IPv4 会出现 Connection Refused
        let v6_addr = format!("[::]:{}", port);
        match TcpListener::bind(&v6_addr).await {
            Ok(listener) => {
                info!(
                    target: "server.http",
                    event = "http.server.bound",
                    protocol = "ipv6",
                    address = %v6_addr
                );
                Ok(listener)
            }
            Err(e6) => {
                warn!("IPv6绑定失败: {}，尝试IPv4", e6);
                let v4_addr = format!("0.0.0.0:{}", port);
                let listener = TcpListener::bind(&v4_addr).await.map_err(|e4| {
                    anyhow::anyhow!(
                        "端口 {} 绑定失败 (IPv4): {}；之前IPv6错误: {}",
                        port,
                        e4,
                        e6
                    )
                })?;
                info!(
                    target: "server.http",
                    event = "http.server.bound",
                    protocol = "ipv4",
                    address = %v4_addr
                );
                Ok(listener)
            }
        }
    }

    /// 启动服务器，阻塞直到收到关闭信号
    pub async fn start_server(server: HttpServer) -> Result<()> {
        info!(
            target: "server.http",
            event = "http.server.start",
            address = %server.local_addr
        );

        axum::serve(server.listener, server.app_routes)
            .with_graceful_shutdown(Self::shutdown_signal())
            .await?;

        info!("HTTP服务器已关闭");
        Ok(())
    }

    async fn shutdown_signal() {
        info!(
            target: "server.http",
            event = "http.server.shutdown_wait"
        );

        tokio::select! {
            _ = ctrl_c() => {
                info!(
                    target: "server.http",
                    event = "http.server.signal",
                    signal = "SIGINT"
                );
            }
            _ = Self::wait_for_sigterm() => {
                info!(
                    target: "server.http",
                    event = "http.server.signal",
                    signal = "SIGTERM"
                );
            }
            _ = Self::wait_for_sighup() => {
                warn!(
                    target: "server.http",
                    event = "http.server.signal",
                    signal = "SIGHUP",
                    "暂不支持配置重载，准备退出"
                );
            }
        }

        // 记录库每次操作独立连接，关闭时无需额外清理
        info!(
            target: "server.http",
            event = "http.server.shutdown_ready"
        );
    }

    async fn wait_for_sigterm() -> Result<(), Box<dyn std::error::Error>> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut term_signal = signal(SignalKind::terminate())?;
            term_signal.recv().await;
            Ok(())
        }
        #[cfg(not(unix))]
        {
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    async fn wait_for_sighup() -> Result<(), Box<dyn std::error::Error>> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut hup_signal = signal(SignalKind::hangup())?;
            hup_signal.recv().await;
            Ok(())
        }
        #[cfg(not(unix))]
        {
            std::future::pending::<()>().await;
            Ok(())
        }
    }
}

/// HTTP服务器实例
pub struct HttpServer {
    listener: TcpListener,
    app_routes: Router,
    local_addr: SocketAddr,
}

impl HttpServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn explicit_host_binds_that_address() {
        let listener = ServerManager::bind_listener("127.0.0.1", 0).await.unwrap();
        assert!(listener.local_addr().unwrap().ip().is_loopback());
    }

    #[tokio::test]
    async fn wildcard_host_binds_any_address() {
        let listener = ServerManager::bind_listener("0.0.0.0", 0).await.unwrap();
        assert!(listener.local_addr().unwrap().ip().is_unspecified());
    }
}
