use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub mod date;
pub mod protocol;

// =========================================================
// 常量定义 (Constants)
// =========================================================

pub const STORAGE_KEY_TOKEN: &str = "access_token";
pub const STORAGE_KEY_USER: &str = "user_info";
pub const HEADER_AUTHORIZATION: &str = "Authorization";

// =========================================================
// 标识符 (Identifiers)
// =========================================================

/// 后端的用户 ID 是 Integer，但客户端统一按字符串处理。
/// 反序列化时数字和字符串都接受，序列化时能转成数字就输出数字。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Num(i64),
    Str(String),
}

impl RawId {
    pub fn from_user_id(id: &str) -> Self {
        match id.trim().parse::<i64>() {
            Ok(n) => RawId::Num(n),
            Err(_) => RawId::Str(id.to_string()),
        }
    }

    pub fn into_string(self) -> String {
        match self {
            RawId::Num(n) => n.to_string(),
            RawId::Str(s) => s,
        }
    }
}

// =========================================================
// 账户 (Account)
// =========================================================

/// 客户端缓存的用户身份
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default, with = "date::lenient")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, with = "date::lenient")]
    pub updated_at: Option<NaiveDateTime>,
}

/// `/api/account/me` 返回的原始结构
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDto {
    pub id: RawId,
    pub email: String,
    #[serde(default, with = "date::lenient")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, with = "date::lenient")]
    pub updated_at: Option<NaiveDateTime>,
}

impl From<AccountDto> for User {
    fn from(dto: AccountDto) -> Self {
        Self {
            id: dto.id.into_string(),
            email: dto.email,
            created_at: dto.created_at,
            updated_at: dto.updated_at,
        }
    }
}

// =========================================================
// 个人资料 (Profile)
// =========================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactLinks {
    pub email: String,
    pub twitter: String,
    pub linkedin: String,
    pub github: String,
    pub website: String,
}

/// 名片 / 个人主页记录，与 User 一对一
///
/// `id` 为 `None` 表示尚未持久化，保存时走 POST。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Option<String>,
    pub user_id: String,
    pub name: String,
    pub name_kana: String,
    pub company: String,
    pub occupation: String,
    pub description: String,
    pub name_card_img_url: Option<String>,
    pub contact: ContactLinks,
    pub is_public: bool,
}

impl Profile {
    /// 新建用的空资料（无 id）
    pub fn empty(user_id: impl Into<String>) -> Self {
        Self {
            id: None,
            user_id: user_id.into(),
            name: String::new(),
            name_kana: String::new(),
            company: String::new(),
            occupation: String::new(),
            description: String::new(),
            name_card_img_url: None,
            contact: ContactLinks::default(),
            is_public: true,
        }
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// 从后端 DTO 构造；DTO 中缺失的 userId 用请求时的 userId 补上
    pub fn from_dto(dto: PortfolioDto, requested_user_id: &str) -> Self {
        let user_id = dto
            .user_id
            .map(RawId::into_string)
            .unwrap_or_else(|| requested_user_id.to_string());
        Self {
            id: Some(user_id.clone()),
            user_id,
            name: dto.name.unwrap_or_default(),
            name_kana: dto.name_kana.unwrap_or_default(),
            company: dto.company.unwrap_or_default(),
            occupation: dto.occupation.unwrap_or_default(),
            description: dto.description.unwrap_or_default(),
            name_card_img_url: dto.name_card_img_url.filter(|u| !u.is_empty()),
            contact: ContactLinks {
                email: dto.email.unwrap_or_default(),
                twitter: dto.twitter.unwrap_or_default(),
                linkedin: dto.linkedin.unwrap_or_default(),
                github: dto.github.unwrap_or_default(),
                website: dto.website.unwrap_or_default(),
            },
            is_public: dto.is_public.unwrap_or(true),
        }
    }

    pub fn to_fields(&self) -> PortfolioFields {
        fn opt(s: &str) -> Option<String> {
            if s.trim().is_empty() {
                None
            } else {
                Some(s.to_string())
            }
        }
        PortfolioFields {
            name: self.name.clone(),
            name_kana: self.name_kana.clone(),
            company: self.company.clone(),
            occupation: self.occupation.clone(),
            description: self.description.clone(),
            name_card_img_url: self.name_card_img_url.clone(),
            email: opt(&self.contact.email),
            twitter: opt(&self.contact.twitter),
            linkedin: opt(&self.contact.linkedin),
            github: opt(&self.contact.github),
            website: opt(&self.contact.website),
            is_public: self.is_public,
        }
    }
}

/// `/api/portfolio/{userId}` 的响应体，所有字段都可能为 null
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PortfolioDto {
    pub user_id: Option<RawId>,
    pub name: Option<String>,
    pub name_kana: Option<String>,
    pub company: Option<String>,
    pub occupation: Option<String>,
    pub description: Option<String>,
    pub name_card_img_url: Option<String>,
    pub email: Option<String>,
    pub twitter: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub website: Option<String>,
    pub is_public: Option<bool>,
}

/// 创建与更新共用的可编辑字段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioFields {
    pub name: String,
    pub name_kana: String,
    pub company: String,
    pub occupation: String,
    pub description: String,
    pub name_card_img_url: Option<String>,
    pub email: Option<String>,
    pub twitter: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub website: Option<String>,
    pub is_public: bool,
}

/// 后端统一错误响应 (ErrorResponseDto)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorBody {
    pub status: Option<u16>,
    pub message: Option<String>,
}
