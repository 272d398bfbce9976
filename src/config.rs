use std::path::PathBuf;
use std::time::Duration;

// =========================================================
// 动态运行时配置 (Runtime Configuration)
// =========================================================

/// 环境变量中没有定义时使用这些默认值
const DEFAULT_API_BASE: &str = "http://localhost:8080";
const DEFAULT_TIMEOUT_SECS: u64 = 15;
const DEFAULT_STORAGE_PATH: &str = "meetolio-storage.json";
const DEFAULT_USER_AGENT: &str = concat!("meetolio/", env!("CARGO_PKG_VERSION"));

/// 客户端运行时配置
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// 后端地址，不带结尾的 `/`
    pub api_base_url: String,
    pub request_timeout: Duration,
    /// `FileStorage` 使用的持久化文件
    pub storage_path: PathBuf,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ClientConfig {
    /// 读取 `.env`（如果存在）和环境变量，读不到或解析失败就用默认值
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 便于测试：通过任意查找函数构建配置
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            api_base_url: lookup("MEETOLIO_API_BASE")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.api_base_url),
            request_timeout: lookup("MEETOLIO_HTTP_TIMEOUT_SECS")
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            storage_path: lookup("MEETOLIO_STORAGE_PATH")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_path),
            user_agent: defaults.user_agent,
        }
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base_url = base.into().trim_end_matches('/').to_string();
        self
    }
}
