// ==========================================
// 工程 ERP 批量导入 - 批量创建接口客户端
// ==========================================
// 接口: POST {api_base_url}/{entity}/bulk,请求体为 JSON 数组
// 约束: 一次导入只发一次请求,不做自动重试
// ==========================================

use crate::client::error::ClientError;
use crate::client::session::AuthSession;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info};

// ==========================================
// BulkCreateApi Trait
// ==========================================
// 实现者: HttpBulkCreateClient；测试中可替换为内存实现
#[async_trait]
pub trait BulkCreateApi: Send + Sync {
    /// 批量创建
    ///
    /// # 参数
    /// - endpoint: 相对路径（如 "budgets/bulk"）
    /// - payload: 记录数组
    async fn bulk_create(&self, endpoint: &str, payload: Value) -> Result<(), ClientError>;
}

pub struct HttpBulkCreateClient {
    client: reqwest::Client,
    base_url: String,
    session: AuthSession,
}

impl HttpBulkCreateClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        session: AuthSession,
    ) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            session,
        })
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl BulkCreateApi for HttpBulkCreateClient {
    async fn bulk_create(&self, endpoint: &str, payload: Value) -> Result<(), ClientError> {
        let url = self.endpoint_url(endpoint);
        let records = payload.as_array().map_or(1, Vec::len);
        info!(url = %url, records, "发送批量创建请求");

        let request = self
            .session
            .apply(self.client.post(&url))
            .header("Accept", "application/json")
            .json(&payload);

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(url = %url, status = status.as_u16(), body = %body, "批量创建请求失败");
            if status == reqwest::StatusCode::UNAUTHORIZED {
                return Err(ClientError::Unauthenticated(body));
            }
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        debug!(url = %url, status = status.as_u16(), "批量创建请求成功");
        Ok(())
    }
}
