// src/model/user.rs

use serde::{Serialize, Deserialize};

/// 门户账号角色
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Developer,
}

/// `/me` 返回的当前登录账号信息
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Me {
    pub username: String,
    pub role: Role,
    #[serde(default)]
    pub allowed_client_ids: Vec<String>, // developer 仅能操作这些客户端
}
