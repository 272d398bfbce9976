use crate::error::{ErrorKind, MeetolioError, Result};
use crate::request::{HttpClient, HttpRequest, HttpResponse};
use meetolio_shared::protocol::{
    ApiRequest, CreatePortfolioRequest, DeleteAccountRequest, GetPortfolioRequest, LoginRequest,
    MeRequest, SignupRequest, UpdateEmailRequest, UpdatePasswordRequest, UpdatePortfolioRequest,
};
use meetolio_shared::{ErrorBody, Profile, RawId, User};
use tracing::{debug, warn};

// =========================================================
// 用户可见的默认错误信息
// =========================================================

pub const MSG_NETWORK_FAILED: &str = "Could not reach the server. Please try again.";
pub const MSG_LOGIN_FAILED: &str = "Login failed";
pub const MSG_REGISTER_FAILED: &str = "Registration failed";
pub const MSG_FETCH_USER_FAILED: &str = "Could not load account information";
pub const MSG_EMAIL_CHANGE_FAILED: &str = "Could not change the email address";
pub const MSG_PASSWORD_CHANGE_FAILED: &str = "Could not change the password";
pub const MSG_DELETE_FAILED: &str = "Could not delete the account";
pub const MSG_PROFILE_LOAD_FAILED: &str = "Could not load the profile";
pub const MSG_PROFILE_SAVE_FAILED: &str = "Could not save the profile";
pub const MSG_NOT_LOGGED_IN: &str = "Not logged in";

/// 从错误响应体中取出服务端提供的 `message`
///
/// 响应体不是 JSON 或没有 message 时返回 `None`，由调用方使用默认信息。
pub fn extract_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
}

fn rejection(resp: &HttpResponse, fallback: &str) -> MeetolioError {
    let message = extract_message(&resp.body).unwrap_or_else(|| fallback.to_string());
    MeetolioError::from_status(resp.status, message)
}

impl MeetolioError {
    /// 面向用户的文字：网络失败统一为通用提示，解析失败使用默认信息
    pub fn user_message(&self, fallback: &str) -> String {
        match self.kind {
            ErrorKind::Transport => MSG_NETWORK_FAILED.to_string(),
            ErrorKind::Decode => fallback.to_string(),
            _ if self.message.is_empty() => fallback.to_string(),
            _ => self.message.clone(),
        }
    }
}

// =========================================================
// REST 客户端
// =========================================================

/// Meetolio 后端的类型化客户端
///
/// 不持有令牌：需要鉴权的调用由调用方传入，令牌的归属仍在 Auth Service。
pub struct MeetolioApi<C: HttpClient> {
    client: C,
    base_url: String,
}

impl<C: HttpClient> MeetolioApi<C> {
    pub fn new(client: C, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// 发送任意 `ApiRequest`
    ///
    /// 非 2xx 响应转换为对应的错误，错误信息优先取服务端的 `message`。
    pub async fn call<R: ApiRequest>(
        &self,
        req: &R,
        token: Option<&str>,
        fallback: &str,
    ) -> Result<R::Response> {
        if R::AUTH && token.is_none() {
            return Err(MeetolioError::unauthorized(MSG_NOT_LOGGED_IN));
        }

        let path = req.path();
        let mut http = HttpRequest::new(&self.url(&path), R::METHOD);
        if let Some(token) = token {
            http = http.with_bearer(token);
        }
        if req.has_body() {
            http = http.with_body(serde_json::to_value(req)?);
        }

        debug!(method = R::METHOD.as_str(), path = %path, "sending request");
        let resp = self.client.send(http).await.inspect_err(|e| {
            warn!(method = R::METHOD.as_str(), path = %path, error = %e, "request failed");
        })?;

        if !resp.ok() {
            warn!(
                method = R::METHOD.as_str(),
                path = %path,
                status = resp.status,
                "request rejected"
            );
            return Err(rejection(&resp, fallback));
        }

        resp.json::<R::Response>()
    }

    // --- Auth ---

    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let req = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let resp = self.call(&req, None, MSG_LOGIN_FAILED).await?;
        Ok(resp.access_token)
    }

    pub async fn signup(&self, email: &str, password: &str) -> Result<()> {
        let req = SignupRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.call(&req, None, MSG_REGISTER_FAILED).await?;
        Ok(())
    }

    // --- Account ---

    pub async fn current_user(&self, token: &str) -> Result<User> {
        let dto = self
            .call(&MeRequest, Some(token), MSG_FETCH_USER_FAILED)
            .await?;
        Ok(User::from(dto))
    }

    /// 返回服务端给出的新账户信息；后端不返回时为 `None`
    pub async fn update_email(
        &self,
        token: &str,
        email: &str,
        password: &str,
    ) -> Result<Option<User>> {
        let req = UpdateEmailRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let dto = self
            .call(&req, Some(token), MSG_EMAIL_CHANGE_FAILED)
            .await?;
        Ok(dto.map(User::from))
    }

    pub async fn update_password(
        &self,
        token: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<()> {
        let req = UpdatePasswordRequest {
            current_password: current_password.to_string(),
            new_password: new_password.to_string(),
        };
        self.call(&req, Some(token), MSG_PASSWORD_CHANGE_FAILED)
            .await?;
        Ok(())
    }

    pub async fn delete_account(&self, token: &str, password: Option<&str>) -> Result<()> {
        let req = DeleteAccountRequest {
            password: password.map(str::to_string),
        };
        self.call(&req, Some(token), MSG_DELETE_FAILED).await?;
        Ok(())
    }

    // --- Portfolio ---

    /// 读取个人资料；404 表示还没有创建，返回 `None`
    pub async fn get_portfolio(
        &self,
        user_id: &str,
        token: Option<&str>,
    ) -> Result<Option<Profile>> {
        let req = GetPortfolioRequest {
            user_id: user_id.to_string(),
        };
        match self.call(&req, token, MSG_PROFILE_LOAD_FAILED).await {
            Ok(dto) => Ok(Some(Profile::from_dto(dto, user_id))),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn create_portfolio(&self, token: &str, profile: &Profile) -> Result<()> {
        let req = CreatePortfolioRequest {
            user_id: RawId::from_user_id(&profile.user_id),
            fields: profile.to_fields(),
        };
        self.call(&req, Some(token), MSG_PROFILE_SAVE_FAILED)
            .await?;
        Ok(())
    }

    pub async fn update_portfolio(&self, token: &str, profile: &Profile) -> Result<()> {
        let req = UpdatePortfolioRequest {
            user_id: profile.user_id.clone(),
            fields: profile.to_fields(),
        };
        self.call(&req, Some(token), MSG_PROFILE_SAVE_FAILED)
            .await?;
        Ok(())
    }
}
