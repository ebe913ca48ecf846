// src/model/client_config.rs

use serde::{Serialize, Deserialize};
use crate::model::ad::AdType;

fn default_allowed_types() -> Vec<AdType> {
    vec![AdType::Image, AdType::Video]
}

/// 客户端投放策略：允许的素材类型与分类
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    pub client_id: String,               // 客户端 ID（主键）
    #[serde(default = "default_allowed_types")]
    pub allowed_types: Vec<AdType>,      // 允许的素材类型
    #[serde(default)]
    pub allowed_categories: Vec<String>, // 允许的分类（有序）
}
