// src/logging/portal_log.rs

use serde::{Serialize, Deserialize};
use chrono::Utc;

/// **门户一次仪表盘加载的结构化日志**
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PortalLog {
    pub timestamp: String,         // 记录时间
    pub log_type: String,          // 日志类型，如 "portal_dashboard_load"
    pub username: Option<String>,  // 当前登录账号
    pub client_id: Option<String>, // 生效的 clientId 过滤条件
    pub steps: Vec<PortalStepLog>, // 各加载步骤明细
    pub status: String,            // 整体结果 "success" or "failure"
    pub ad_count: usize,           // 最终缓存的广告条数
}

/// **单个加载步骤日志**
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PortalStepLog {
    pub step: String,   // 步骤名，如 "role_resolution" / "health_probe" / "list_load"
    pub status: String, // "success", "failed", "skipped"
    pub detail: String, // 附加信息（错误文案、状态行等）
}

impl PortalLog {
    /// **创建仪表盘加载日志**
    pub fn new() -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            log_type: "portal_dashboard_load".to_string(),
            username: None,
            client_id: None,
            steps: Vec::new(),
            status: "failure".to_string(), // 默认失败，后续可更新
            ad_count: 0,
        }
    }

    /// **追加一个步骤**
    pub fn add_step(&mut self, step: &str, status: &str, detail: &str) {
        self.steps.push(PortalStepLog {
            step: step.to_string(),
            status: status.to_string(),
            detail: detail.to_string(),
        });
    }

    /// **记录最终结果**
    pub fn set_outcome(&mut self, status: &str, ad_count: usize) {
        self.status = status.to_string();
        self.ad_count = ad_count;
    }
}

impl Default for PortalLog {
    fn default() -> Self {
        Self::new()
    }
}
