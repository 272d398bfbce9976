//! 会话状态机
//!
//! `reduce` 是纯函数：(当前状态, 动作) -> 新状态，不做任何 I/O。
//! 持久化由 Auth Service 负责。

use meetolio_shared::User;

/// 客户端会话
///
/// 不变式：`is_authenticated == user.is_some()`；`is_auth_ready` 一旦为 true 不再回退。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub user: Option<User>,
    pub is_authenticated: bool,
    /// 仅在鉴权请求进行中为 true
    pub is_loading: bool,
    pub error: Option<String>,
    /// 登录 / 注册成功后为 true，用于触发引导界面，确认后清除
    pub just_logged_in: bool,
    /// 启动时的令牌校验完成前为 false，路由守卫在此之前不做跳转
    pub is_auth_ready: bool,
}

impl Session {
    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.id.as_str())
    }

    fn signed_out(is_auth_ready: bool) -> Self {
        Self {
            is_auth_ready,
            ..Self::default()
        }
    }
}

/// 会话动作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthAction {
    BootResolved(Option<User>),
    LoginStarted,
    LoginSucceeded(User),
    LoginFailed(String),
    RegisterStarted,
    RegisterSucceeded(User),
    RegisterFailed(String),
    LoggedOut,
    ErrorCleared,
    WelcomeAcknowledged,
    UserUpdated(User),
    AccountDeleted,
}

impl AuthAction {
    /// 日志用的动作名（不包含用户数据）
    pub fn name(&self) -> &'static str {
        match self {
            AuthAction::BootResolved(_) => "BootResolved",
            AuthAction::LoginStarted => "LoginStarted",
            AuthAction::LoginSucceeded(_) => "LoginSucceeded",
            AuthAction::LoginFailed(_) => "LoginFailed",
            AuthAction::RegisterStarted => "RegisterStarted",
            AuthAction::RegisterSucceeded(_) => "RegisterSucceeded",
            AuthAction::RegisterFailed(_) => "RegisterFailed",
            AuthAction::LoggedOut => "LoggedOut",
            AuthAction::ErrorCleared => "ErrorCleared",
            AuthAction::WelcomeAcknowledged => "WelcomeAcknowledged",
            AuthAction::UserUpdated(_) => "UserUpdated",
            AuthAction::AccountDeleted => "AccountDeleted",
        }
    }
}

/// 状态转移函数，对所有 (state, action) 组合都有定义
pub fn reduce(state: &Session, action: AuthAction) -> Session {
    match action {
        AuthAction::BootResolved(user) => Session {
            is_authenticated: user.is_some(),
            user,
            is_loading: false,
            just_logged_in: false,
            is_auth_ready: true,
            ..state.clone()
        },
        AuthAction::LoginStarted | AuthAction::RegisterStarted => Session {
            is_loading: true,
            error: None,
            ..state.clone()
        },
        AuthAction::LoginSucceeded(user) | AuthAction::RegisterSucceeded(user) => Session {
            user: Some(user),
            is_authenticated: true,
            is_loading: false,
            error: None,
            just_logged_in: true,
            is_auth_ready: true,
        },
        AuthAction::LoginFailed(message) | AuthAction::RegisterFailed(message) => Session {
            user: None,
            is_authenticated: false,
            is_loading: false,
            error: Some(message),
            just_logged_in: false,
            is_auth_ready: true,
        },
        AuthAction::LoggedOut | AuthAction::AccountDeleted => Session::signed_out(true),
        AuthAction::ErrorCleared => Session {
            error: None,
            ..state.clone()
        },
        AuthAction::WelcomeAcknowledged => Session {
            just_logged_in: false,
            ..state.clone()
        },
        // 未登录时没有可替换的用户
        AuthAction::UserUpdated(user) if state.is_authenticated => Session {
            user: Some(user),
            ..state.clone()
        },
        AuthAction::UserUpdated(_) => state.clone(),
    }
}
