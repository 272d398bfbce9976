use std::fmt;

// =========================================================
// 错误类型枚举
// =========================================================

/// 错误类型
/// 对应客户端需要区分处理的几类失败
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 请求未能完成（网络、超时、连接失败）
    Transport,
    /// 401: 令牌无效或缺失，本地会话需要作废
    Unauthorized,
    /// 404: 资源不存在
    NotFound,
    /// 其他非 2xx 响应
    Rejected(u16),
    /// 响应体无法解析
    Decode,
    /// 本地存储读写失败
    Storage,
    /// 本地校验失败，请求未发出
    InvalidInput,
    /// 名片位图渲染失败
    Render,
}

impl ErrorKind {
    /// 对应的 HTTP 状态码（如果有）
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ErrorKind::Unauthorized => Some(401),
            ErrorKind::NotFound => Some(404),
            ErrorKind::Rejected(status) => Some(*status),
            _ => None,
        }
    }

    pub fn from_status(status: u16) -> Self {
        match status {
            401 => ErrorKind::Unauthorized,
            404 => ErrorKind::NotFound,
            s => ErrorKind::Rejected(s),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ErrorKind::Transport => "TRANSPORT",
            ErrorKind::Unauthorized => "UNAUTHORIZED",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Rejected(_) => "REJECTED",
            ErrorKind::Decode => "DECODE",
            ErrorKind::Storage => "STORAGE",
            ErrorKind::InvalidInput => "INVALID_INPUT",
            ErrorKind::Render => "RENDER",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code() {
            Some(status) => write!(f, "{}({})", self.error_code(), status),
            None => f.write_str(self.error_code()),
        }
    }
}

// =========================================================
// 核心错误类型
// =========================================================

/// 客户端错误
///
/// `message` 是可以直接展示给用户的文字：服务端返回了 `{message}` 时优先使用它。
#[derive(Debug, thiserror::Error)]
#[error("[{kind}] {message}")]
pub struct MeetolioError {
    pub kind: ErrorKind,
    pub message: String,
}

impl MeetolioError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    // --- Convenience constructors ---

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Decode, message)
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Storage, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    pub fn render(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Render, message)
    }

    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::from_status(status), message)
    }

    // --- Accessors ---

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind == ErrorKind::Unauthorized
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }
}

impl From<serde_json::Error> for MeetolioError {
    fn from(e: serde_json::Error) -> Self {
        MeetolioError::decode(e.to_string())
    }
}

impl From<reqwest::Error> for MeetolioError {
    fn from(e: reqwest::Error) -> Self {
        MeetolioError::transport(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MeetolioError>;
