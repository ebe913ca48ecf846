// src/portal/login.rs

use crate::api::client::ApiClient;
use crate::portal::flow::Flow;
use crate::storage::session::Session;

/// 登录页：提交账号密码，成功后写入 token 并跳转仪表盘；
/// 失败时原样展示服务端错误文案，停留在登录页。
pub struct LoginPage {
    pub error: String,
}

impl LoginPage {
    pub fn new() -> Self {
        Self {
            error: String::new(),
        }
    }

    pub async fn submit(
        &mut self,
        api: &ApiClient,
        session: &Session,
        username: &str,
        password: &str,
    ) -> Flow {
        self.error.clear();

        let username = username.trim();
        if username.is_empty() {
            self.error = "Username is required".to_string();
            return Flow::Stay;
        }

        match api.login(username, password).await {
            Ok(token) => {
                session.set_token(&token);
                Flow::ToDashboard
            }
            Err(e) => {
                self.error = e.to_string();
                Flow::Stay
            }
        }
    }
}

impl Default for LoginPage {
    fn default() -> Self {
        Self::new()
    }
}
