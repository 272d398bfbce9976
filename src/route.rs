//! 路由定义模块 - 领域模型
//!
//! 纯粹的业务逻辑层，不依赖任何界面或浏览器 API。
//! 定义了应用的所有路由及其属性。

use std::fmt::Display;

/// 应用路由枚举
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AppRoute {
    /// 登录页面 (默认路由)
    #[default]
    Login,
    Register,
    /// 登录后的首页
    MyPage,
    /// 自己的个人主页
    Portfolio,
    /// 公开的个人主页，任何人都可访问
    PublicPortfolio { user_id: String },
    /// 编辑个人主页，只能编辑自己的
    PortfolioEdit { user_id: String },
    BusinessCardEdit,
    BusinessCardDesign,
    Settings,
    SettingsQrCode,
    SettingsEmail,
    SettingsPassword,
    SettingsDelete,
    /// 页面未找到
    NotFound,
}

impl AppRoute {
    /// 将 URL path 解析为路由枚举
    ///
    /// 忽略查询串、片段和结尾的 `/`。
    pub fn from_path(path: &str) -> Self {
        let path = path
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim_end_matches('/');
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] | ["login"] => Self::Login,
            ["register"] => Self::Register,
            ["mypage"] => Self::MyPage,
            ["portfolio"] => Self::Portfolio,
            ["portfolio", id] => Self::PublicPortfolio {
                user_id: id.to_string(),
            },
            ["portfolio", id, "edit"] => Self::PortfolioEdit {
                user_id: id.to_string(),
            },
            ["business-card", "edit"] => Self::BusinessCardEdit,
            ["business-card", "design"] => Self::BusinessCardDesign,
            ["settings"] => Self::Settings,
            ["settings", "qrcode"] => Self::SettingsQrCode,
            ["settings", "email"] => Self::SettingsEmail,
            ["settings", "password"] => Self::SettingsPassword,
            ["settings", "delete"] => Self::SettingsDelete,
            _ => Self::NotFound,
        }
    }

    /// 获取路由对应的 URL path
    pub fn to_path(&self) -> String {
        match self {
            Self::Login => "/".to_string(),
            Self::Register => "/register".to_string(),
            Self::MyPage => "/mypage".to_string(),
            Self::Portfolio => "/portfolio".to_string(),
            Self::PublicPortfolio { user_id } => format!("/portfolio/{user_id}"),
            Self::PortfolioEdit { user_id } => format!("/portfolio/{user_id}/edit"),
            Self::BusinessCardEdit => "/business-card/edit".to_string(),
            Self::BusinessCardDesign => "/business-card/design".to_string(),
            Self::Settings => "/settings".to_string(),
            Self::SettingsQrCode => "/settings/qrcode".to_string(),
            Self::SettingsEmail => "/settings/email".to_string(),
            Self::SettingsPassword => "/settings/password".to_string(),
            Self::SettingsDelete => "/settings/delete".to_string(),
            Self::NotFound => "/404".to_string(),
        }
    }

    /// **核心守卫逻辑：定义该路由是否需要认证**
    pub fn requires_auth(&self) -> bool {
        !matches!(
            self,
            Self::Login | Self::Register | Self::PublicPortfolio { .. } | Self::NotFound
        )
    }

    /// 定义已认证用户是否应该离开此路由（如登录页）
    pub fn should_redirect_when_authenticated(&self) -> bool {
        matches!(self, Self::Login | Self::Register)
    }

    /// 以所有者为参数的受保护路由返回其所有者 id
    pub fn owner_id(&self) -> Option<&str> {
        match self {
            Self::PortfolioEdit { user_id } => Some(user_id),
            _ => None,
        }
    }

    /// 换成指定所有者的同类路由；不带所有者参数的路由原样返回
    pub fn with_owner(&self, owner: &str) -> Self {
        match self {
            Self::PortfolioEdit { .. } => Self::PortfolioEdit {
                user_id: owner.to_string(),
            },
            other => other.clone(),
        }
    }

    /// 获取认证失败时的重定向目标
    pub fn auth_failure_redirect() -> Self {
        Self::Login
    }

    /// 获取认证成功时的重定向目标（从登录页）
    pub fn auth_success_redirect() -> Self {
        Self::MyPage
    }
}

impl Display for AppRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path() {
        assert_eq!(AppRoute::from_path("/"), AppRoute::Login);
        assert_eq!(AppRoute::from_path("/login"), AppRoute::Login);
        assert_eq!(AppRoute::from_path("/mypage/"), AppRoute::MyPage);
        assert_eq!(
            AppRoute::from_path("/portfolio/12?tab=card"),
            AppRoute::PublicPortfolio {
                user_id: "12".into()
            }
        );
        assert_eq!(
            AppRoute::from_path("/portfolio/12/edit"),
            AppRoute::PortfolioEdit {
                user_id: "12".into()
            }
        );
        assert_eq!(
            AppRoute::from_path("/business-card/design"),
            AppRoute::BusinessCardDesign
        );
        assert_eq!(AppRoute::from_path("/settings/qrcode"), AppRoute::SettingsQrCode);
        assert_eq!(AppRoute::from_path("/settings/unknown"), AppRoute::NotFound);
        assert_eq!(AppRoute::from_path("/portfolio/1/2/3"), AppRoute::NotFound);
    }

    #[test]
    fn test_to_path_parses_back() {
        let routes = [
            AppRoute::Register,
            AppRoute::Portfolio,
            AppRoute::PortfolioEdit {
                user_id: "7".into(),
            },
            AppRoute::SettingsDelete,
        ];
        for route in routes {
            assert_eq!(AppRoute::from_path(&route.to_path()), route);
        }
    }

    #[test]
    fn test_auth_requirements() {
        assert!(!AppRoute::Login.requires_auth());
        assert!(!AppRoute::Register.requires_auth());
        assert!(!AppRoute::NotFound.requires_auth());
        assert!(
            !AppRoute::PublicPortfolio {
                user_id: "1".into()
            }
            .requires_auth()
        );
        assert!(AppRoute::MyPage.requires_auth());
        assert!(AppRoute::SettingsPassword.requires_auth());
        assert!(
            AppRoute::PortfolioEdit {
                user_id: "1".into()
            }
            .requires_auth()
        );

        assert!(AppRoute::Login.should_redirect_when_authenticated());
        assert!(!AppRoute::MyPage.should_redirect_when_authenticated());
    }

    #[test]
    fn test_owner() {
        let edit = AppRoute::PortfolioEdit {
            user_id: "1".into(),
        };
        assert_eq!(edit.owner_id(), Some("1"));
        assert_eq!(edit.with_owner("2").to_path(), "/portfolio/2/edit");
        assert_eq!(AppRoute::Settings.owner_id(), None);
        assert_eq!(AppRoute::Settings.with_owner("2"), AppRoute::Settings);
    }
}
