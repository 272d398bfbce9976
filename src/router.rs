//! 路由服务模块
//!
//! `guard` 是每个页面都要遵守的守卫规则；`Router` 在其上实现
//! "请求 -> 验证 -> 处理 -> 加载" 的导航流程，并在会话变化时重新验证当前页面。

use crate::auth::AuthService;
use crate::request::HttpClient;
use crate::route::AppRoute;
use crate::session::Session;
use crate::storage::KeyValueStore;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, info};

/// 守卫的判定结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// 启动校验尚未完成：显示加载状态，不做跳转
    Pending,
    Allow,
    Redirect(AppRoute),
}

/// **核心守卫逻辑**
pub fn guard(session: &Session, route: &AppRoute) -> GuardDecision {
    if !session.is_auth_ready {
        return GuardDecision::Pending;
    }

    if route.requires_auth() && !session.is_authenticated {
        return GuardDecision::Redirect(AppRoute::auth_failure_redirect());
    }

    if route.should_redirect_when_authenticated() && session.is_authenticated {
        return GuardDecision::Redirect(AppRoute::auth_success_redirect());
    }

    // 访问别人的编辑页时转到自己的
    if let (Some(owner), Some(me)) = (route.owner_id(), session.user_id()) {
        if owner != me {
            return GuardDecision::Redirect(route.with_owner(me));
        }
    }

    GuardDecision::Allow
}

/// 导航方式，对应 History API 的 push / replace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NavMode {
    Push,
    Replace,
}

/// 路由器服务
///
/// 持有当前路由和后退栈。会话未就绪时收到的导航请求被挂起，
/// 会话就绪后再按守卫规则处理。
#[derive(Debug)]
pub struct Router {
    current: AppRoute,
    history: Vec<AppRoute>,
    pending: Option<AppRoute>,
    session: Session,
}

impl Router {
    /// 以初始地址创建；会话未就绪时初始页面挂起
    pub fn new(initial_path: &str, session: &Session) -> Self {
        let mut router = Self {
            current: AppRoute::default(),
            history: Vec::new(),
            pending: None,
            session: session.clone(),
        };
        router.navigate_to_route(AppRoute::from_path(initial_path), NavMode::Replace);
        router
    }

    /// 创建并订阅会话变化
    pub fn bind<C: HttpClient, S: KeyValueStore>(
        initial_path: &str,
        auth: &AuthService<C, S>,
    ) -> Rc<RefCell<Router>> {
        let router = Rc::new(RefCell::new(Self::new(initial_path, &auth.session())));
        let handle = router.clone();
        auth.subscribe(move |session| handle.borrow_mut().on_session_change(session));
        router
    }

    pub fn current(&self) -> &AppRoute {
        &self.current
    }

    /// 等待会话就绪的导航目标
    pub fn pending(&self) -> Option<&AppRoute> {
        self.pending.as_ref()
    }

    /// 页面应显示加载状态
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn history(&self) -> &[AppRoute] {
        &self.history
    }

    pub fn navigate(&mut self, path: &str) {
        self.navigate_to_route(AppRoute::from_path(path), NavMode::Push);
    }

    pub fn navigate_to(&mut self, route: AppRoute) {
        self.navigate_to_route(route, NavMode::Push);
    }

    /// 后退一步；后退的目标同样经过守卫
    pub fn back(&mut self) -> bool {
        let Some(previous) = self.history.pop() else {
            return false;
        };
        self.navigate_to_route(previous, NavMode::Replace);
        true
    }

    fn navigate_to_route(&mut self, target: AppRoute, mode: NavMode) {
        match guard(&self.session, &target) {
            GuardDecision::Pending => {
                debug!(route = %target, "session not ready, holding navigation");
                self.pending = Some(target);
            }
            GuardDecision::Allow => {
                self.pending = None;
                self.load(target, mode);
            }
            GuardDecision::Redirect(redirect) => {
                info!(from = %target, to = %redirect, "route guard redirect");
                self.pending = None;
                self.load(redirect, mode);
            }
        }
    }

    fn load(&mut self, route: AppRoute, mode: NavMode) {
        if route == self.current {
            return;
        }
        let previous = std::mem::replace(&mut self.current, route);
        if mode == NavMode::Push {
            self.history.push(previous);
        }
    }

    /// 会话变化时的自动处理
    ///
    /// 挂起的导航在会话就绪后继续；否则重新验证当前页面
    /// （登出后离开受保护页面，登录后离开登录页）。
    pub fn on_session_change(&mut self, session: &Session) {
        self.session = session.clone();

        if let Some(target) = self.pending.take() {
            self.navigate_to_route(target, NavMode::Replace);
            return;
        }

        if let GuardDecision::Redirect(redirect) = guard(&self.session, &self.current) {
            info!(from = %self.current, to = %redirect, "session changed, redirecting");
            self.load(redirect, NavMode::Push);
        }
    }
}
