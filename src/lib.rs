//! Meetolio 客户端核心
//!
//! 会话 / 认证状态机、路由守卫、个人资料编辑器和名片设计画布。
//! 网络和持久化存储都通过 trait 注入（`HttpClient`、`KeyValueStore`），
//! 生产环境使用 reqwest 与文件存储，测试使用内存实现。

pub mod api;
pub mod auth;
pub mod canvas;
pub mod config;
pub mod error;
pub mod profile;
pub mod request;
pub mod route;
pub mod router;
pub mod session;
pub mod storage;
pub mod token_store;

pub use api::MeetolioApi;
pub use auth::AuthService;
pub use canvas::DesignCanvas;
pub use config::ClientConfig;
pub use error::{ErrorKind, MeetolioError, Result};
pub use profile::{ProfileEditor, SaveOutcome};
pub use route::AppRoute;
pub use router::{GuardDecision, Router, guard};
pub use session::{AuthAction, Session};

pub use meetolio_shared as shared;

// =========================================================
// 日志 (Logging)
// =========================================================

const DEFAULT_LOG_FILTER: &str = "meetolio=info";

/// 安装全局 tracing 订阅者
///
/// 过滤规则取自 `RUST_LOG`（默认 `meetolio=info`），`LOG_FORMAT=json` 时输出 JSON。
/// 已经安装过订阅者时什么也不做。
pub fn init_logging() {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    let result = if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .try_init()
    };

    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_twice_is_noop() {
        init_logging();
        init_logging();
        tracing::info!("logging initialised");
    }
}
