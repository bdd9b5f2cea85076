// ==========================================
// 工程 ERP 批量导入 - 领域类型定义
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ==========================================
// 业务实体类型 (Entity Kind)
// ==========================================
// 每种实体对应一个导入界面和一个批量创建接口
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    Budgets,
    Expenses,
    GeneralExpenses,
    Invoices,
    Payments,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Budgets,
        EntityKind::Expenses,
        EntityKind::GeneralExpenses,
        EntityKind::Invoices,
        EntityKind::Payments,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            EntityKind::Budgets => "budgets",
            EntityKind::Expenses => "expenses",
            EntityKind::GeneralExpenses => "general-expenses",
            EntityKind::Invoices => "invoices",
            EntityKind::Payments => "payments",
        }
    }

    /// 批量创建接口路径（相对 api_base_url）
    pub fn bulk_endpoint(&self) -> String {
        format!("{}/bulk", self.slug())
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("未知的导入实体: {0}（可选: budgets/expenses/general-expenses/invoices/payments）")]
pub struct ParseEntityKindError(pub String);

impl FromStr for EntityKind {
    type Err = ParseEntityKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.slug() == normalized)
            .ok_or_else(|| ParseEntityKindError(s.to_string()))
    }
}
