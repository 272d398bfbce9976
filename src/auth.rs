//! 认证模块
//!
//! `AuthService` 是会话的唯一所有者：持有 Token Store 和内存中的 `Session`，
//! 所有状态变化都经过 `session::reduce`。其他组件只读会话、读取令牌，
//! 收到 401 时调用 `invalidate_session`。
//!
//! 并发请求按"最后发起者胜出"处理：每个会改变会话的操作领取一个代号，
//! 在每个挂起点之后检查代号是否仍是最新，过期的操作既不写存储也不派发动作。

use crate::api::{MSG_LOGIN_FAILED, MSG_REGISTER_FAILED, MeetolioApi};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::request::{HttpClient, ReqwestHttpClient};
use crate::session::{AuthAction, Session, reduce};
use crate::storage::{FileStorage, KeyValueStore};
use crate::token_store::TokenStore;
use meetolio_shared::User;
use std::cell::{Cell, RefCell};
use tracing::{debug, info, warn};

type Listener = Box<dyn Fn(&Session)>;

pub struct AuthService<C: HttpClient, S: KeyValueStore> {
    api: MeetolioApi<C>,
    store: TokenStore<S>,
    state: RefCell<Session>,
    /// 请求代号，见模块文档
    generation: Cell<u64>,
    booted: Cell<bool>,
    listeners: RefCell<Vec<Listener>>,
}

impl AuthService<ReqwestHttpClient, FileStorage> {
    /// 按运行时配置创建：reqwest 客户端 + 文件存储
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let client = ReqwestHttpClient::new(config)?;
        let api = MeetolioApi::new(client, config.api_base_url.as_str());
        Ok(Self::new(api, FileStorage::open(&config.storage_path)))
    }
}

impl<C: HttpClient, S: KeyValueStore> AuthService<C, S> {
    pub fn new(api: MeetolioApi<C>, storage: S) -> Self {
        Self {
            api,
            store: TokenStore::new(storage),
            state: RefCell::new(Session::default()),
            generation: Cell::new(0),
            booted: Cell::new(false),
            listeners: RefCell::new(Vec::new()),
        }
    }

    // =========================================================
    // 读取
    // =========================================================

    /// 当前会话的快照
    pub fn session(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn get_token(&self) -> Option<String> {
        self.store.token()
    }

    /// 上次持久化的用户快照，启动校验完成前可用于显示
    pub fn cached_user(&self) -> Option<User> {
        self.store.user()
    }

    pub fn api(&self) -> &MeetolioApi<C> {
        &self.api
    }

    /// 注册会话变化监听器
    ///
    /// 监听器在每次派发后同步调用，调用期间不能再注册新的监听器。
    pub fn subscribe(&self, listener: impl Fn(&Session) + 'static) {
        self.listeners.borrow_mut().push(Box::new(listener));
    }

    // =========================================================
    // 内部工具
    // =========================================================

    fn dispatch(&self, action: AuthAction) {
        debug!(action = action.name(), "auth transition");
        let next = {
            let current = self.state.borrow();
            reduce(&current, action)
        };
        *self.state.borrow_mut() = next.clone();
        for listener in self.listeners.borrow().iter() {
            listener(&next);
        }
    }

    /// 领取新代号，之前发起的操作全部过期
    fn begin(&self) -> u64 {
        let ticket = self.generation.get() + 1;
        self.generation.set(ticket);
        ticket
    }

    /// 不改变会话的操作只观察当前代号，不使别人过期
    fn observe(&self) -> u64 {
        self.generation.get()
    }

    fn is_current(&self, ticket: u64, op: &'static str) -> bool {
        let current = self.generation.get() == ticket;
        if !current {
            debug!(op, ticket, "discarding stale response");
        }
        current
    }

    // =========================================================
    // 会话生命周期
    // =========================================================

    /// 启动校验：用持久化的令牌换取当前用户
    ///
    /// 每个实例只执行一次，重复调用直接返回。
    pub async fn boot(&self) {
        if self.booted.replace(true) {
            debug!("boot already ran");
            return;
        }
        let ticket = self.begin();

        let Some(token) = self.store.token() else {
            debug!("no persisted token");
            self.dispatch(AuthAction::BootResolved(None));
            return;
        };

        let result = self.api.current_user(&token).await;
        if !self.is_current(ticket, "boot") {
            return;
        }
        match result {
            Ok(user) => {
                info!(user_id = %user.id, "session restored");
                self.store.set_user(&user);
                self.dispatch(AuthAction::BootResolved(Some(user)));
            }
            Err(e) => {
                warn!(error = %e, "persisted token rejected, clearing");
                self.store.clear();
                self.dispatch(AuthAction::BootResolved(None));
            }
        }
    }

    /// 登录：换取令牌 -> 持久化 -> 拉取用户 -> 派发成功
    ///
    /// 任何一步失败都会清除令牌并派发 `LoginFailed`。
    pub async fn login(&self, email: &str, password: &str) {
        let ticket = self.begin();
        self.dispatch(AuthAction::LoginStarted);

        match self.login_flow(ticket, email, password).await {
            Ok(Some(user)) => {
                info!(user_id = %user.id, "logged in");
                self.dispatch(AuthAction::LoginSucceeded(user));
            }
            Ok(None) => {}
            Err(e) => {
                if !self.is_current(ticket, "login") {
                    return;
                }
                warn!(error = %e, "login failed");
                self.store.clear();
                self.dispatch(AuthAction::LoginFailed(e.user_message(MSG_LOGIN_FAILED)));
            }
        }
    }

    /// 返回 `Ok(None)` 表示已过期
    async fn login_flow(&self, ticket: u64, email: &str, password: &str) -> Result<Option<User>> {
        let token = self.api.login(email, password).await?;
        if !self.is_current(ticket, "login") {
            return Ok(None);
        }
        self.store.set_token(&token);

        let user = self.api.current_user(&token).await?;
        if !self.is_current(ticket, "login") {
            return Ok(None);
        }
        self.store.set_user(&user);
        Ok(Some(user))
    }

    /// 注册不会自动登录：成功后清除令牌并回到未登录状态，由用户显式登录
    pub async fn register(&self, email: &str, password: &str) -> bool {
        let ticket = self.begin();
        self.dispatch(AuthAction::RegisterStarted);

        let result = self.api.signup(email, password).await;
        if !self.is_current(ticket, "register") {
            return result.is_ok();
        }
        match result {
            Ok(()) => {
                info!("account registered");
                self.store.clear();
                self.dispatch(AuthAction::BootResolved(None));
                true
            }
            Err(e) => {
                warn!(error = %e, "registration failed");
                self.store.clear();
                self.dispatch(AuthAction::RegisterFailed(
                    e.user_message(MSG_REGISTER_FAILED),
                ));
                false
            }
        }
    }

    pub fn logout(&self) {
        info!("logged out");
        self.sign_out(AuthAction::LoggedOut);
    }

    /// 收到 401 时调用：令牌已失效，回到未登录状态
    pub fn invalidate_session(&self) {
        warn!("session invalidated by server");
        self.sign_out(AuthAction::LoggedOut);
    }

    fn sign_out(&self, action: AuthAction) {
        self.begin();
        self.store.clear();
        self.dispatch(action);
    }

    // =========================================================
    // 账户变更
    // =========================================================

    /// 替换缓存的用户（例如修改邮箱之后）；未登录时忽略
    pub fn update_user(&self, user: User) {
        if !self.state.borrow().is_authenticated {
            debug!("ignoring user update while signed out");
            return;
        }
        self.store.set_user(&user);
        self.dispatch(AuthAction::UserUpdated(user));
    }

    pub async fn change_email(&self, new_email: &str, password: &str) -> bool {
        let Some(token) = self.get_token() else {
            return false;
        };
        let ticket = self.observe();

        let result = self.api.update_email(&token, new_email, password).await;
        if !self.is_current(ticket, "change_email") {
            return false;
        }
        match result {
            Ok(Some(user)) => {
                self.update_user(user);
                true
            }
            Ok(None) => {
                if let Some(mut user) = self.session().user {
                    user.email = new_email.to_string();
                    self.update_user(user);
                }
                true
            }
            Err(e) if e.is_unauthorized() => {
                self.invalidate_session();
                false
            }
            Err(e) => {
                warn!(error = %e, "email change failed");
                false
            }
        }
    }

    /// 修改密码不影响当前会话
    pub async fn change_password(&self, current_password: &str, new_password: &str) -> bool {
        let Some(token) = self.get_token() else {
            return false;
        };
        let ticket = self.observe();

        let result = self
            .api
            .update_password(&token, current_password, new_password)
            .await;
        if !self.is_current(ticket, "change_password") {
            return false;
        }
        match result {
            Ok(()) => {
                info!("password changed");
                true
            }
            Err(e) if e.is_unauthorized() => {
                self.invalidate_session();
                false
            }
            Err(e) => {
                warn!(error = %e, "password change failed");
                false
            }
        }
    }

    /// 删除账户
    ///
    /// 401 时同样清除本地状态（但返回 false）；其他失败不改变状态。
    pub async fn delete_account(&self, password: Option<&str>) -> bool {
        let Some(token) = self.get_token() else {
            return false;
        };
        let ticket = self.observe();

        let result = self.api.delete_account(&token, password).await;
        if !self.is_current(ticket, "delete_account") {
            return false;
        }
        match result {
            Ok(()) => {
                info!("account deleted");
                self.sign_out(AuthAction::AccountDeleted);
                true
            }
            Err(e) if e.is_unauthorized() => {
                self.invalidate_session();
                false
            }
            Err(e) => {
                warn!(error = %e, "account deletion failed");
                false
            }
        }
    }

    // =========================================================
    // UI 确认
    // =========================================================

    pub fn clear_error(&self) {
        self.dispatch(AuthAction::ErrorCleared);
    }

    pub fn acknowledge_welcome(&self) {
        self.dispatch(AuthAction::WelcomeAcknowledged);
    }
}

#[cfg(test)]
mod tests;
