use crate::{AccountDto, PortfolioDto, PortfolioFields, RawId};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};

/// HTTP Methods for API Requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// A trait that defines the request-response relationship and metadata for an API endpoint.
pub trait ApiRequest: Serialize {
    /// The response type returned by this request.
    /// Endpoints whose body is irrelevant use `IgnoredAny`.
    type Response: DeserializeOwned;
    /// The URL path template.
    const PATH: &'static str;
    /// The HTTP method.
    const METHOD: HttpMethod;
    /// Whether the endpoint requires a bearer token.
    const AUTH: bool;

    /// Concrete path; parameterized endpoints override this.
    fn path(&self) -> String {
        Self::PATH.to_string()
    }

    /// GET requests never carry a body.
    fn has_body(&self) -> bool {
        Self::METHOD != HttpMethod::Get
    }
}

// =========================================================
// Auth
// =========================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
}

impl ApiRequest for LoginRequest {
    type Response = LoginResponse;
    const PATH: &'static str = "/api/auth/login";
    const METHOD: HttpMethod = HttpMethod::Post;
    const AUTH: bool = false;
}

/// Registration only reports success or failure; the body is not used.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
}

impl ApiRequest for SignupRequest {
    type Response = IgnoredAny;
    const PATH: &'static str = "/api/auth/signup";
    const METHOD: HttpMethod = HttpMethod::Post;
    const AUTH: bool = false;
}

// =========================================================
// Account
// =========================================================

/// Fetch the account behind the bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeRequest;

impl ApiRequest for MeRequest {
    type Response = AccountDto;
    const PATH: &'static str = "/api/account/me";
    const METHOD: HttpMethod = HttpMethod::Get;
    const AUTH: bool = true;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateEmailRequest {
    pub email: String,
    pub password: String,
}

impl ApiRequest for UpdateEmailRequest {
    // 部分后端版本不返回更新后的账户
    type Response = Option<AccountDto>;
    const PATH: &'static str = "/api/account/me/email";
    const METHOD: HttpMethod = HttpMethod::Put;
    const AUTH: bool = true;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

impl ApiRequest for UpdatePasswordRequest {
    type Response = IgnoredAny;
    const PATH: &'static str = "/api/account/me/password";
    const METHOD: HttpMethod = HttpMethod::Put;
    const AUTH: bool = true;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeleteAccountRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl ApiRequest for DeleteAccountRequest {
    type Response = IgnoredAny;
    const PATH: &'static str = "/api/account/me";
    const METHOD: HttpMethod = HttpMethod::Delete;
    const AUTH: bool = true;
}

// =========================================================
// Portfolio
// =========================================================

/// Read a profile. Public pages call this without a token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetPortfolioRequest {
    #[serde(skip)]
    pub user_id: String,
}

impl ApiRequest for GetPortfolioRequest {
    type Response = PortfolioDto;
    const PATH: &'static str = "/api/portfolio/{userId}";
    const METHOD: HttpMethod = HttpMethod::Get;
    const AUTH: bool = false;

    fn path(&self) -> String {
        Self::PATH.replace("{userId}", &self.user_id)
    }
}

/// Create the caller's profile. The server takes the owner from the token,
/// `userId` is sent along for older backends that still read it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePortfolioRequest {
    pub user_id: RawId,
    #[serde(flatten)]
    pub fields: PortfolioFields,
}

impl ApiRequest for CreatePortfolioRequest {
    type Response = IgnoredAny;
    const PATH: &'static str = "/api/portfolio";
    const METHOD: HttpMethod = HttpMethod::Post;
    const AUTH: bool = true;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePortfolioRequest {
    #[serde(skip)]
    pub user_id: String,
    #[serde(flatten)]
    pub fields: PortfolioFields,
}

impl ApiRequest for UpdatePortfolioRequest {
    type Response = IgnoredAny;
    const PATH: &'static str = "/api/portfolio/{userId}";
    const METHOD: HttpMethod = HttpMethod::Put;
    const AUTH: bool = true;

    fn path(&self) -> String {
        Self::PATH.replace("{userId}", &self.user_id)
    }
}
