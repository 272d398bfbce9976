//! 个人资料编辑器
//!
//! 保存表单状态，负责加载、修改和持久化 `Profile`。
//! 还没有资料（404）是正常状态：编辑器以空资料开始，第一次保存走 POST。

use crate::api::{MSG_NOT_LOGGED_IN, MSG_PROFILE_LOAD_FAILED, MeetolioApi};
use crate::auth::AuthService;
use crate::error::{MeetolioError, Result};
use crate::request::HttpClient;
use crate::storage::KeyValueStore;
use base64ct::{Base64, Encoding};
use meetolio_shared::Profile;
use std::fmt::Display;
use tracing::{debug, info, warn};

/// 表单中的可编辑文本字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    Name,
    NameKana,
    Company,
    Occupation,
    Description,
    Email,
    Twitter,
    Linkedin,
    Github,
    Website,
}

impl ProfileField {
    /// 保存前必须填写的字段
    pub const REQUIRED: [ProfileField; 5] = [
        ProfileField::Name,
        ProfileField::NameKana,
        ProfileField::Company,
        ProfileField::Occupation,
        ProfileField::Description,
    ];

    /// 与后端 JSON 一致的字段名
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileField::Name => "name",
            ProfileField::NameKana => "nameKana",
            ProfileField::Company => "company",
            ProfileField::Occupation => "occupation",
            ProfileField::Description => "description",
            ProfileField::Email => "email",
            ProfileField::Twitter => "twitter",
            ProfileField::Linkedin => "linkedin",
            ProfileField::Github => "github",
            ProfileField::Website => "website",
        }
    }

    fn slot(self, profile: &mut Profile) -> &mut String {
        match self {
            ProfileField::Name => &mut profile.name,
            ProfileField::NameKana => &mut profile.name_kana,
            ProfileField::Company => &mut profile.company,
            ProfileField::Occupation => &mut profile.occupation,
            ProfileField::Description => &mut profile.description,
            ProfileField::Email => &mut profile.contact.email,
            ProfileField::Twitter => &mut profile.contact.twitter,
            ProfileField::Linkedin => &mut profile.contact.linkedin,
            ProfileField::Github => &mut profile.contact.github,
            ProfileField::Website => &mut profile.contact.website,
        }
    }

    fn read(self, profile: &Profile) -> &str {
        match self {
            ProfileField::Name => &profile.name,
            ProfileField::NameKana => &profile.name_kana,
            ProfileField::Company => &profile.company,
            ProfileField::Occupation => &profile.occupation,
            ProfileField::Description => &profile.description,
            ProfileField::Email => &profile.contact.email,
            ProfileField::Twitter => &profile.contact.twitter,
            ProfileField::Linkedin => &profile.contact.linkedin,
            ProfileField::Github => &profile.contact.github,
            ProfileField::Website => &profile.contact.website,
        }
    }
}

impl Display for ProfileField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Created,
    Updated,
}

#[derive(Debug, Default)]
pub struct ProfileEditor {
    profile: Option<Profile>,
    load_error: Option<String>,
}

impl ProfileEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.profile.is_some()
    }

    /// 加载失败（非 404、非 401）时的提示，编辑器仍给出空资料
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    /// 加载 `owner_id` 的资料
    ///
    /// 只有 401 返回错误：会话已被作废，编辑器保持未加载。
    pub async fn load<C: HttpClient, S: KeyValueStore>(
        &mut self,
        auth: &AuthService<C, S>,
        owner_id: &str,
    ) -> Result<()> {
        self.profile = None;
        self.load_error = None;

        let token = auth.get_token();
        match auth.api().get_portfolio(owner_id, token.as_deref()).await {
            Ok(Some(profile)) => {
                debug!(user_id = owner_id, "profile loaded");
                self.profile = Some(profile);
            }
            Ok(None) => {
                debug!(user_id = owner_id, "no profile yet, starting empty");
                self.profile = Some(Profile::empty(owner_id));
            }
            Err(e) if e.is_unauthorized() => {
                auth.invalidate_session();
                return Err(e);
            }
            Err(e) => {
                warn!(user_id = owner_id, error = %e, "profile load failed");
                self.load_error = Some(e.user_message(MSG_PROFILE_LOAD_FAILED));
                self.profile = Some(Profile::empty(owner_id));
            }
        }
        Ok(())
    }

    // =========================================================
    // 修改
    // =========================================================

    fn profile_mut(&mut self) -> Result<&mut Profile> {
        self.profile
            .as_mut()
            .ok_or_else(|| MeetolioError::invalid_input("profile is not loaded"))
    }

    pub fn get(&self, field: ProfileField) -> Option<&str> {
        self.profile.as_ref().map(|p| field.read(p))
    }

    pub fn set(&mut self, field: ProfileField, value: impl Into<String>) -> Result<()> {
        *field.slot(self.profile_mut()?) = value.into();
        Ok(())
    }

    pub fn set_public(&mut self, is_public: bool) -> Result<()> {
        self.profile_mut()?.is_public = is_public;
        Ok(())
    }

    /// 把上传的名片图片编码为 `data:` URL 存入资料
    pub fn attach_card_image(&mut self, bytes: &[u8], mime: &str) -> Result<()> {
        if !mime.starts_with("image/") {
            return Err(MeetolioError::invalid_input(format!(
                "unsupported card image type: {mime}"
            )));
        }
        if bytes.is_empty() {
            return Err(MeetolioError::invalid_input("card image is empty"));
        }
        let url = format!("data:{mime};base64,{}", Base64::encode_string(bytes));
        self.profile_mut()?.name_card_img_url = Some(url);
        Ok(())
    }

    pub fn clear_card_image(&mut self) -> Result<()> {
        self.profile_mut()?.name_card_img_url = None;
        Ok(())
    }

    /// 返回缺失的必填字段；未加载时视为全部缺失
    pub fn validate(&self) -> Vec<ProfileField> {
        ProfileField::REQUIRED
            .into_iter()
            .filter(|f| self.get(*f).is_none_or(|v| v.trim().is_empty()))
            .collect()
    }

    // =========================================================
    // 保存
    // =========================================================

    /// 新资料 POST，已有资料 PUT；POST 成功后资料获得 id
    pub async fn save<C: HttpClient, S: KeyValueStore>(
        &mut self,
        auth: &AuthService<C, S>,
    ) -> Result<SaveOutcome> {
        let missing = self.validate();
        if !missing.is_empty() {
            let names: Vec<&str> = missing.iter().map(ProfileField::as_str).collect();
            return Err(MeetolioError::invalid_input(format!(
                "missing required fields: {}",
                names.join(", ")
            )));
        }
        let Some(token) = auth.get_token() else {
            return Err(MeetolioError::unauthorized(MSG_NOT_LOGGED_IN));
        };
        let profile = self.profile_mut()?;

        let result = if profile.is_new() {
            auth.api()
                .create_portfolio(&token, profile)
                .await
                .map(|_| SaveOutcome::Created)
        } else {
            auth.api()
                .update_portfolio(&token, profile)
                .await
                .map(|_| SaveOutcome::Updated)
        };

        match result {
            Ok(outcome) => {
                if outcome == SaveOutcome::Created {
                    profile.id = Some(profile.user_id.clone());
                }
                info!(user_id = %profile.user_id, ?outcome, "profile saved");
                Ok(outcome)
            }
            Err(e) => {
                if e.is_unauthorized() {
                    auth.invalidate_session();
                }
                Err(e)
            }
        }
    }
}

/// 公开主页用的匿名读取；404 返回 `None`
pub async fn fetch_public<C: HttpClient>(
    api: &MeetolioApi<C>,
    user_id: &str,
) -> Result<Option<Profile>> {
    api.get_portfolio(user_id, None).await
}
