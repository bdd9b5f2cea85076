// ==========================================
// 工程 ERP 批量导入 - 客户端层
// ==========================================
// 职责: 调用后端批量创建接口（JSON REST）
// 说明: 访问令牌由 AuthSession 显式注入,不在调用点临时读取
// ==========================================

pub mod bulk_create;
pub mod error;
pub mod session;

pub use bulk_create::{BulkCreateApi, HttpBulkCreateClient};
pub use error::ClientError;
pub use session::AuthSession;
