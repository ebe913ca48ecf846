// src/portal/dashboard.rs

use std::sync::Arc;
use serde_json::json;

use crate::api::client::ApiClient;
use crate::logging::action_logger::ActionLogger;
use crate::logging::portal_log::PortalLog;
use crate::model::ad::{Ad, AdType};
use crate::model::client_config::ClientConfig;
use crate::model::user::{Me, Role};
use crate::portal::flow::Flow;
use crate::portal::modal::{ModalMode, ModalState};
use crate::storage::session::Session;
use crate::view::renderer::{render_ads, EnabledControl};

/// 仪表盘可见状态。渲染是它的纯函数，事件处理是唯一的变更入口。
#[derive(Debug, Default)]
pub struct DashboardState {
    pub user: Option<Me>,
    /// developer 角色被锁定到的客户端
    pub locked_client_id: Option<String>,
    /// 状态行文案，如 "API: ok | DB: connected"
    pub health_line: String,
    /// 广告列表缓存：服务端的完整快照，只有启用开关会原地改写
    pub ads: Vec<Ad>,
    /// 列表区错误文案，存在时替代表格展示
    pub list_error: Option<String>,
    pub modal: Option<ModalState>,
    /// 阻断式提示（相当于 alert），下一个事件到来时清空
    pub alert: Option<String>,
    /// 客户端配置表单与其消息区
    pub config_form: Option<ClientConfig>,
    pub config_msg: String,
    /// 配置表单当前选中的 clientId，作为列表过滤条件
    pub selected_client_id: Option<String>,
}

/// 仪表盘事件。确认框、弹窗输入都已经折算成数据。
#[derive(Debug, Clone)]
pub enum DashboardEvent {
    OpenCreateModal,
    OpenEditModal { ad_id: String },
    CloseModal,
    ChangeModalType(AdType),
    SubmitModal,
    DeleteAd { ad_id: String, confirmed: bool },
    ToggleEnabled { ad_id: String, enabled: bool },
    LoadClientConfig { client_id: String },
    SaveClientConfig {
        client_id: String,
        allowed_types: Vec<AdType>,
        allowed_categories: Vec<String>,
    },
    RefreshAds,
    Logout,
}

/// `Dashboard::open` 的结果：要么就绪，要么需要跳转（未登录）
pub enum OpenOutcome {
    Ready(Dashboard),
    Redirect(Flow),
}

pub struct Dashboard {
    api: ApiClient,
    session: Session,
    logger: Arc<ActionLogger>,
    pub state: DashboardState,
}

impl Dashboard {
    /// 按页面就绪顺序初始化：
    /// 1. 无 token 直接跳登录页；
    /// 2. 解析角色，非 admin 锁定 clientId；
    /// 3. 健康探测（失败不阻断后续）；
    /// 4. 拉取广告列表。
    pub async fn open(
        mut api: ApiClient,
        session: Session,
        logger: Arc<ActionLogger>,
    ) -> OpenOutcome {
        let mut plog = PortalLog::new();

        let Some(token) = session.token() else {
            plog.add_step("token_guard", "failed", "no token, redirecting to login");
            logger
                .log("WARN", &serde_json::to_string(&plog).unwrap_or_default())
                .await;
            return OpenOutcome::Redirect(Flow::ToLogin);
        };
        api.set_token(Some(token));
        plog.add_step("token_guard", "success", "");

        let mut dashboard = Dashboard {
            api,
            session,
            logger: logger.clone(),
            state: DashboardState::default(),
        };

        // 角色解析：developer 只能操作自己名下的第一个客户端
        match dashboard.api.me().await {
            Ok(me) => {
                plog.username = Some(me.username.clone());
                if me.role != Role::Admin {
                    let first = me
                        .allowed_client_ids
                        .first()
                        .cloned()
                        .unwrap_or_default();
                    dashboard.state.locked_client_id = Some(first.clone());
                    dashboard.state.selected_client_id = Some(first.clone());
                    dashboard.session.remember_client_id(&first);
                    plog.add_step("role_resolution", "success", &format!("locked to {}", first));
                } else {
                    plog.add_step("role_resolution", "success", "admin");
                }
                dashboard.state.user = Some(me);
            }
            Err(e) => {
                // 身份解析失败不终止加载，但必须让用户看到
                dashboard.state.alert = Some(e.to_string());
                plog.add_step("role_resolution", "failed", &e.to_string());
            }
        }

        // 健康探测：失败只影响状态行
        match dashboard.api.health().await {
            Ok(health) => {
                dashboard.state.health_line = format!("API: {} | DB: {}", health.status, health.db);
                plog.add_step("health_probe", "success", &dashboard.state.health_line);
            }
            Err(e) => {
                dashboard.state.health_line = format!("Status error: {}", e);
                plog.add_step("health_probe", "failed", &e.to_string());
            }
        }

        plog.client_id = dashboard.selected_client_id();
        match dashboard.refresh_ads().await {
            Ok(()) => {
                plog.add_step("list_load", "success", "");
                plog.set_outcome("success", dashboard.state.ads.len());
            }
            Err(e) => {
                dashboard.state.list_error = Some(format!("Failed to load ads: {}", e));
                plog.add_step("list_load", "failed", &e.to_string());
            }
        }

        logger
            .log("INFO", &serde_json::to_string(&plog).unwrap_or_default())
            .await;

        OpenOutcome::Ready(dashboard)
    }

    /// 列表区渲染：有错误文案时直接展示它，否则输出表格
    pub fn render(&self) -> String {
        match &self.state.list_error {
            Some(err) => err.clone(),
            None => render_ads(&self.state.ads, EnabledControl::Checkbox),
        }
    }

    /// 当前生效的 clientId 过滤条件：配置表单选中的优先，其次是记住的
    fn selected_client_id(&self) -> Option<String> {
        self.state
            .selected_client_id
            .clone()
            .or_else(|| self.session.last_client_id())
            .filter(|s| !s.is_empty())
    }

    async fn refresh_ads(&mut self) -> Result<(), crate::api::error::ApiError> {
        let client_id = self.selected_client_id();
        let ads = self.api.list_ads(client_id.as_deref()).await?;
        self.state.ads = ads;
        self.state.list_error = None;
        Ok(())
    }

    async fn reload_list(&mut self) {
        if let Err(e) = self.refresh_ads().await {
            self.state.list_error = Some(format!("Failed to load ads: {}", e));
        }
    }

    /// 处理一个用户事件，返回外层 shell 需要执行的跳转
    pub async fn handle(&mut self, event: DashboardEvent) -> Flow {
        self.state.alert = None;

        match event {
            DashboardEvent::OpenCreateModal => {
                let last = self.session.last_client_id();
                self.state.modal = Some(ModalState::create(
                    last.as_deref(),
                    self.state.locked_client_id.as_deref(),
                ));
            }
            DashboardEvent::OpenEditModal { ad_id } => {
                match self.state.ads.iter().find(|a| a.id == ad_id) {
                    Some(ad) => {
                        self.state.modal = Some(ModalState::edit(
                            ad,
                            self.state.locked_client_id.as_deref(),
                        ));
                    }
                    None => {
                        self.state.alert = Some(format!("Unknown ad \"{}\"", ad_id));
                    }
                }
            }
            DashboardEvent::CloseModal => {
                self.state.modal = None;
            }
            DashboardEvent::ChangeModalType(ad_type) => {
                if let Some(modal) = &mut self.state.modal {
                    modal.set_type(ad_type);
                }
            }
            DashboardEvent::SubmitModal => {
                self.submit_modal().await;
            }
            DashboardEvent::DeleteAd { ad_id, confirmed } => {
                // 确认框被取消，什么都不做
                if confirmed {
                    self.delete_ad(&ad_id).await;
                }
            }
            DashboardEvent::ToggleEnabled { ad_id, enabled } => {
                self.toggle_enabled(&ad_id, enabled).await;
            }
            DashboardEvent::LoadClientConfig { client_id } => {
                self.load_config(&client_id).await;
            }
            DashboardEvent::SaveClientConfig {
                client_id,
                allowed_types,
                allowed_categories,
            } => {
                self.save_config(&client_id, &allowed_types, &allowed_categories)
                    .await;
            }
            DashboardEvent::RefreshAds => {
                self.reload_list().await;
            }
            DashboardEvent::Logout => {
                self.session.clear_token();
                return Flow::ToLogin;
            }
        }

        Flow::Stay
    }

    async fn submit_modal(&mut self) {
        let Some(modal) = &self.state.modal else {
            return;
        };
        let mode = modal.mode;
        let payload = match modal.build_payload() {
            Ok(payload) => payload,
            Err(e) => {
                self.state.alert = Some(e.to_string());
                return;
            }
        };

        // 记住最近一次使用的 clientId
        self.session.remember_client_id(&payload.client_id);

        let result = match mode {
            ModalMode::Edit => {
                let patch = serde_json::to_value(&payload).expect("ad payload is serializable");
                self.api.update_ad(&payload.id, &patch).await.map(|_| ())
            }
            ModalMode::Create => self.api.create_ad(&payload).await.map(|_| ()),
        };

        match result {
            Ok(()) => {
                let entry = json!({
                    "portal_log": if mode == ModalMode::Edit { "ad_updated" } else { "ad_created" },
                    "ad_id": payload.id,
                    "client_id": payload.client_id,
                });
                self.logger.log("INFO", &entry.to_string()).await;
                self.state.modal = None;
                self.reload_list().await;
            }
            Err(e) => {
                // 弹窗保持打开，等待用户修正
                let entry = json!({
                    "portal_log": "ad_save_failed",
                    "ad_id": payload.id,
                    "reason": e.to_string(),
                });
                self.logger.log("ERROR", &entry.to_string()).await;
                self.state.alert = Some(e.to_string());
            }
        }
    }

    async fn delete_ad(&mut self, ad_id: &str) {
        match self.api.delete_ad(ad_id).await {
            Ok(()) => {
                let entry = json!({ "portal_log": "ad_deleted", "ad_id": ad_id });
                self.logger.log("INFO", &entry.to_string()).await;
                self.reload_list().await;
            }
            Err(e) => {
                // 删除失败不刷新列表，缓存保持原样
                let entry = json!({
                    "portal_log": "ad_delete_failed",
                    "ad_id": ad_id,
                    "reason": e.to_string(),
                });
                self.logger.log("ERROR", &entry.to_string()).await;
                self.state.alert = Some(e.to_string());
            }
        }
    }

    /// 乐观开关：成功才改缓存；失败时缓存不动，重渲染后复选框自然回弹
    async fn toggle_enabled(&mut self, ad_id: &str, enabled: bool) {
        match self.api.set_enabled(ad_id, enabled).await {
            Ok(_) => {
                if let Some(ad) = self.state.ads.iter_mut().find(|a| a.id == ad_id) {
                    ad.enabled = enabled;
                }
                let entry = json!({
                    "portal_log": "ad_toggled",
                    "ad_id": ad_id,
                    "enabled": enabled,
                });
                self.logger.log("INFO", &entry.to_string()).await;
            }
            Err(e) => {
                let entry = json!({
                    "portal_log": "ad_toggle_failed",
                    "ad_id": ad_id,
                    "reason": e.to_string(),
                });
                self.logger.log("ERROR", &entry.to_string()).await;
                self.state.alert = Some(e.to_string());
            }
        }
    }

    async fn load_config(&mut self, client_id: &str) {
        let client_id = client_id.trim();
        if client_id.is_empty() {
            self.state.config_msg = "Enter a clientId.".to_string();
            return;
        }
        self.state.config_msg = "Loading...".to_string();

        match self.api.get_config(client_id).await {
            Ok(config) => {
                self.state.config_form = Some(config);
                self.state.selected_client_id = Some(client_id.to_string());
                self.session.remember_client_id(client_id);
                self.state.config_msg = "Loaded.".to_string();
                self.reload_list().await;
            }
            Err(e) => {
                self.state.config_msg = e.to_string();
            }
        }
    }

    async fn save_config(
        &mut self,
        client_id: &str,
        allowed_types: &[AdType],
        allowed_categories: &[String],
    ) {
        let client_id = client_id.trim();
        if client_id.is_empty() {
            self.state.config_msg = "Client ID is required.".to_string();
            return;
        }
        self.state.config_msg = "Saving...".to_string();

        match self
            .api
            .put_config(client_id, allowed_types, allowed_categories)
            .await
        {
            Ok(config) => {
                let entry = json!({
                    "portal_log": "config_saved",
                    "client_id": client_id,
                    "allowed_types": allowed_types,
                });
                self.logger.log("INFO", &entry.to_string()).await;

                self.state.config_form = Some(config);
                self.state.selected_client_id = Some(client_id.to_string());
                self.session.remember_client_id(client_id);
                self.state.config_msg = "Saved.".to_string();
                self.reload_list().await;
            }
            Err(e) => {
                self.state.config_msg = e.to_string();
            }
        }
    }
}
