// ==========================================
// 工程 ERP 批量导入 - 登录会话
// ==========================================
// 用途: 持有访问令牌与租户,注入到 HTTP 客户端
// ==========================================

use reqwest::RequestBuilder;
use std::fmt;

pub const TENANT_HEADER: &str = "X-Tenant-Id";

#[derive(Clone, Default, PartialEq, Eq)]
pub struct AuthSession {
    token: Option<String>,
    tenant_id: Option<String>,
}

impl AuthSession {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()).filter(|t: &String| !t.trim().is_empty()),
            tenant_id: None,
        }
    }

    /// 未登录会话（后端允许匿名时使用）
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into()).filter(|t: &String| !t.trim().is_empty());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// 为请求附加 Authorization / 租户头
    pub fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        match &self.tenant_id {
            Some(tenant) => request.header(TENANT_HEADER, tenant),
            None => request,
        }
    }
}

// 令牌不进日志
impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("token", &self.token.as_ref().map(|_| "****"))
            .field("tenant_id", &self.tenant_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_token_is_anonymous() {
        assert!(!AuthSession::new("  ").is_authenticated());
        assert!(AuthSession::new("abc").is_authenticated());
    }

    #[test]
    fn test_debug_masks_token() {
        let session = AuthSession::new("secret-token").with_tenant("t1");
        let debug = format!("{:?}", session);
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("t1"));
    }
}
