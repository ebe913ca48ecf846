// src/api/client.rs

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::api::error::ApiError;
use crate::model::ad::{Ad, AdType};
use crate::model::client_config::ClientConfig;
use crate::model::user::Me;

/// `/health` 返回的后端状态
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone)]
pub struct Health {
    pub status: String,
    #[serde(default = "unknown_db")]
    pub db: String,
}

fn unknown_db() -> String {
    "unknown".to_string()
}

/// 门户 API 客户端。
/// 所有请求均为 JSON，带 token 时附加 `Authorization: Bearer <token>`；
/// 单次请求、快速失败：不重试、不设超时、不退避。
#[derive(Debug)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::Validation(format!("Invalid base url: {}", e)))?;
        // mailto: 之类的 URL 拼不出路径，直接拒绝
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Validation(format!(
                "Invalid base url: {} cannot carry a path",
                base_url
            )));
        }
        Ok(Self {
            http: Client::new(),
            base_url,
            token,
        })
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    /// 由路径片段拼出完整 URL，片段会被正确转义（id 可以包含任意字符）
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .expect("cannot-be-a-base urls are rejected in new()")
            .pop_if_empty()
            .extend(segments);
        url
    }

    /// 发送一次认证请求并解析 JSON 响应。
    /// 非 2xx 时把响应体按 JSON 解析（失败按空对象处理），
    /// 取其中的 error 字段作为错误信息，否则用 "Request failed (<status>)"。
    async fn request_json(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let mut req = self
            .http
            .request(method, url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let res = req.send().await?;
        let status = res.status();
        let data: Value = res.json().await.unwrap_or_else(|_| json!({}));

        if !status.is_success() {
            let msg = data
                .get("error")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("Request failed ({})", status.as_u16()));
            return Err(ApiError::Server(msg));
        }
        Ok(data)
    }

    fn decode<T: DeserializeOwned>(value: Value, what: &str) -> Result<T, ApiError> {
        serde_json::from_value(value)
            .map_err(|e| ApiError::Server(format!("Malformed {} response: {}", what, e)))
    }

    /// 登录是唯一的未认证调用，成功响应缺少 token 字段也算失败
    pub async fn login(&self, username: &str, password: &str) -> Result<String, ApiError> {
        let url = self.endpoint(&["auth", "login"]);
        let res = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;

        let status = res.status();
        let data: Value = res.json().await.unwrap_or_else(|_| json!({}));

        if !status.is_success() {
            let msg = data
                .get("error")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("Login failed ({})", status.as_u16()));
            return Err(ApiError::Server(msg));
        }

        data.get("token")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(ApiError::MissingToken("Login"))
    }

    /// 注册一个 developer 账号，返回其 token
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        client_id: &str,
    ) -> Result<String, ApiError> {
        let body = json!({ "username": username, "password": password, "clientId": client_id });
        let data = self
            .request_json(Method::POST, self.endpoint(&["auth", "register"]), Some(&body))
            .await?;
        data.get("token")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(ApiError::MissingToken("Register"))
    }

    /// 给当前账号追加一个可操作的客户端
    pub async fn add_app(&self, client_id: &str) -> Result<Value, ApiError> {
        let body = json!({ "clientId": client_id });
        self.request_json(Method::POST, self.endpoint(&["auth", "add-app"]), Some(&body))
            .await
    }

    pub async fn me(&self) -> Result<Me, ApiError> {
        let data = self
            .request_json(Method::GET, self.endpoint(&["me"]), None)
            .await?;
        Self::decode(data, "/me")
    }

    pub async fn health(&self) -> Result<Health, ApiError> {
        let data = self
            .request_json(Method::GET, self.endpoint(&["health"]), None)
            .await?;
        Self::decode(data, "/health")
    }

    /// 拉取广告列表，可按 clientId 过滤
    pub async fn list_ads(&self, client_id: Option<&str>) -> Result<Vec<Ad>, ApiError> {
        let mut url = self.endpoint(&["ads"]);
        if let Some(client_id) = client_id {
            url.query_pairs_mut().append_pair("clientId", client_id);
        }
        let data = self.request_json(Method::GET, url, None).await?;
        Self::decode(data, "/ads")
    }

    pub async fn create_ad(&self, ad: &Ad) -> Result<Ad, ApiError> {
        let body = serde_json::to_value(ad).expect("ad payload is serializable");
        let data = self
            .request_json(Method::POST, self.endpoint(&["ads"]), Some(&body))
            .await?;
        Self::decode(data, "POST /ads")
    }

    /// 部分更新：body 里出现哪些字段就改哪些字段，id 不可修改
    pub async fn update_ad(&self, id: &str, patch: &Value) -> Result<Ad, ApiError> {
        let data = self
            .request_json(Method::PUT, self.endpoint(&["ads", id]), Some(patch))
            .await?;
        Self::decode(data, "PUT /ads")
    }

    pub async fn set_enabled(&self, id: &str, enabled: bool) -> Result<Ad, ApiError> {
        self.update_ad(id, &json!({ "enabled": enabled })).await
    }

    pub async fn delete_ad(&self, id: &str) -> Result<(), ApiError> {
        self.request_json(Method::DELETE, self.endpoint(&["ads", id]), None)
            .await?;
        Ok(())
    }

    pub async fn get_config(&self, client_id: &str) -> Result<ClientConfig, ApiError> {
        let data = self
            .request_json(Method::GET, self.endpoint(&["config", client_id]), None)
            .await?;
        Self::decode(data, "/config")
    }

    pub async fn put_config(
        &self,
        client_id: &str,
        allowed_types: &[AdType],
        allowed_categories: &[String],
    ) -> Result<ClientConfig, ApiError> {
        let body = json!({
            "allowedTypes": allowed_types,
            "allowedCategories": allowed_categories,
        });
        let data = self
            .request_json(Method::PUT, self.endpoint(&["config", client_id]), Some(&body))
            .await?;
        Self::decode(data, "PUT /config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_base_url_that_cannot_carry_a_path() {
        let err = ApiClient::new("mailto:ops@example.com", None).unwrap_err();
        assert!(
            err.to_string().starts_with("Invalid base url"),
            "unexpected message: {}",
            err
        );
        assert!(ApiClient::new("http://127.0.0.1:8080", None).is_ok());
    }

    #[test]
    fn endpoint_escapes_path_segments() {
        let api = ApiClient::new("http://127.0.0.1:8080/api/", None).unwrap();
        let url = api.endpoint(&["ads", "a/b c"]);
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/api/ads/a%2Fb%20c");
    }

    #[test]
    fn missing_token_message_names_the_call() {
        assert_eq!(
            ApiError::MissingToken("Login").to_string(),
            "Login response missing token"
        );
        assert_eq!(
            ApiError::MissingToken("Register").to_string(),
            "Register response missing token"
        );
    }
}
