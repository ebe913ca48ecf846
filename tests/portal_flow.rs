// tests/portal_flow.rs
//
// 集成测试：在进程内启动 mock 后端，用真实的 ApiClient / Dashboard 驱动完整流程。

use std::sync::Arc;

use rust_adportal::api::client::ApiClient;
use rust_adportal::logging::action_logger::ActionLogger;
use rust_adportal::mock_api::{self, MockState};
use rust_adportal::model::ad::AdType;
use rust_adportal::portal::dashboard::{Dashboard, DashboardEvent, OpenOutcome};
use rust_adportal::portal::flow::Flow;
use rust_adportal::portal::login::LoginPage;
use rust_adportal::storage::session::Session;
use rust_adportal::storage::store::MemoryStore;
use rust_adportal::view::renderer::{render_ads, EnabledControl};

/// 启动 mock 后端并等待它就绪
async fn start_backend(port: u16, state: MockState) -> String {
    tokio::spawn(mock_api::start_mock_api_server(port, state));
    let base = format!("http://127.0.0.1:{}", port);
    let probe = reqwest::Client::new();
    for _ in 0..100 {
        if probe.get(format!("{}/health", base)).send().await.is_ok() {
            return base;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    panic!("mock backend did not start on port {}", port);
}

fn test_logger() -> Arc<ActionLogger> {
    let dir = std::env::temp_dir().join("adportal_test_logs");
    ActionLogger::new(dir.to_str().unwrap(), "test", 100, 50, 200)
}

fn empty_session() -> Session {
    Session::new(Box::new(MemoryStore::new()))
}

async fn login_admin(base: &str) -> Session {
    let session = empty_session();
    let api = ApiClient::new(base, None).unwrap();
    let mut page = LoginPage::new();
    let flow = page.submit(&api, &session, "admin", "admin").await;
    assert_eq!(flow, Flow::ToDashboard, "admin login failed: {}", page.error);
    session
}

async fn open_dashboard(base: &str, session: Session) -> Dashboard {
    let api = ApiClient::new(base, None).unwrap();
    match Dashboard::open(api, session, test_logger()).await {
        OpenOutcome::Ready(dashboard) => dashboard,
        OpenOutcome::Redirect(_) => panic!("dashboard redirected unexpectedly"),
    }
}

/// 通过弹窗事件创建一条广告，类型走类型选择器事件
async fn create_ad(dashboard: &mut Dashboard, id: &str, title: &str, client_id: &str, ad_type: AdType) {
    dashboard.handle(DashboardEvent::OpenCreateModal).await;
    {
        let modal = dashboard.state.modal.as_mut().unwrap();
        modal.client_id = client_id.to_string();
        modal.id = id.to_string();
        modal.title = title.to_string();
        modal.categories = "promo".to_string();
        modal.click_url = "https://example.com".to_string();
        modal.video_url = "https://example.com/v.mp4".to_string();
        modal.image_url = "https://example.com/i.png".to_string();
    }
    dashboard.handle(DashboardEvent::ChangeModalType(ad_type)).await;
    assert_eq!(
        dashboard.state.modal.as_ref().unwrap().visible_url_field(),
        ad_type
    );
    dashboard.handle(DashboardEvent::SubmitModal).await;
    assert!(
        dashboard.state.modal.is_none(),
        "modal should close after a successful submit, alert: {:?}",
        dashboard.state.alert
    );
}

#[tokio::test]
async fn login_stores_token_and_reports_server_error_verbatim() {
    let base = start_backend(39211, MockState::new()).await;
    let api = ApiClient::new(&base, None).unwrap();

    // 登录失败：token 不落库，错误文案原样展示
    let session = empty_session();
    let mut page = LoginPage::new();
    let flow = page.submit(&api, &session, "admin", "wrong").await;
    assert_eq!(flow, Flow::Stay);
    assert_eq!(page.error, "Invalid username or password");
    assert!(session.token().is_none());

    // 登录成功：token 落库并跳转
    let flow = page.submit(&api, &session, "admin", "admin").await;
    assert_eq!(flow, Flow::ToDashboard);
    assert!(page.error.is_empty());
    assert!(session.token().is_some());
}

#[tokio::test]
async fn dashboard_redirects_to_login_without_token() {
    let base = start_backend(39212, MockState::new()).await;
    let api = ApiClient::new(&base, None).unwrap();
    match Dashboard::open(api, empty_session(), test_logger()).await {
        OpenOutcome::Redirect(flow) => assert_eq!(flow, Flow::ToLogin),
        OpenOutcome::Ready(_) => panic!("dashboard must not open without a token"),
    }
}

#[tokio::test]
async fn create_edit_and_render_flow() {
    let base = start_backend(39213, MockState::new()).await;
    let session = login_admin(&base).await;
    let mut dashboard = open_dashboard(&base, session).await;

    assert_eq!(dashboard.state.health_line, "API: ok | DB: connected");
    assert_eq!(dashboard.render(), "No ads found.");

    create_ad(&mut dashboard, "a1", "<b>Sale</b>", "game_a", AdType::Image).await;
    assert_eq!(dashboard.state.ads.len(), 1);
    assert_eq!(dashboard.state.ads[0].image_url.as_deref(), Some("https://example.com/i.png"));
    // type=image 时 videoUrl 不应出现在提交里
    assert!(dashboard.state.ads[0].video_url.is_none());

    let html = dashboard.render();
    assert!(html.contains("&lt;b&gt;Sale&lt;/b&gt;"));
    assert!(!html.contains("<b>Sale</b>"));
    assert!(html.contains("data-id=\"a1\" checked"));
    assert!(html.contains("<td>promo</td>"));

    // 编辑：id 锁定，改标题后列表随之更新
    dashboard
        .handle(DashboardEvent::OpenEditModal { ad_id: "a1".to_string() })
        .await;
    {
        let modal = dashboard.state.modal.as_mut().unwrap();
        assert!(!modal.id_editable);
        assert_eq!(modal.title, "<b>Sale</b>");
        modal.title = "Updated".to_string();
    }
    dashboard.handle(DashboardEvent::SubmitModal).await;
    assert_eq!(dashboard.state.ads[0].title, "Updated");
}

#[tokio::test]
async fn toggle_enabled_commits_on_success_and_rolls_back_on_failure() {
    let base = start_backend(39214, MockState::new()).await;
    let session = login_admin(&base).await;
    let mut dashboard = open_dashboard(&base, session).await;
    create_ad(&mut dashboard, "a1", "Sale", "game_a", AdType::Video).await;
    assert!(dashboard.state.ads[0].enabled);

    // 成功：缓存原地更新，渲染出的复选框不再勾选
    dashboard
        .handle(DashboardEvent::ToggleEnabled { ad_id: "a1".to_string(), enabled: false })
        .await;
    assert!(!dashboard.state.ads[0].enabled);
    assert!(!dashboard.render().contains("data-id=\"a1\" checked"));

    // 失败（后端 404）：缓存保持原值，提示服务端文案
    dashboard
        .handle(DashboardEvent::ToggleEnabled { ad_id: "ghost".to_string(), enabled: true })
        .await;
    assert_eq!(dashboard.state.alert.as_deref(), Some("Ad not found"));
    assert!(!dashboard.state.ads[0].enabled);
}

#[tokio::test]
async fn delete_requires_confirmation_and_keeps_list_on_failure() {
    let base = start_backend(39215, MockState::new()).await;
    let session = login_admin(&base).await;
    let mut dashboard = open_dashboard(&base, session).await;
    create_ad(&mut dashboard, "a1", "One", "game_a", AdType::Video).await;
    create_ad(&mut dashboard, "a2", "Two", "game_a", AdType::Image).await;
    assert_eq!(dashboard.state.ads.len(), 2);

    // 确认框被取消：无任何变化
    dashboard
        .handle(DashboardEvent::DeleteAd { ad_id: "a1".to_string(), confirmed: false })
        .await;
    assert_eq!(dashboard.state.ads.len(), 2);

    dashboard
        .handle(DashboardEvent::DeleteAd { ad_id: "a1".to_string(), confirmed: true })
        .await;
    assert_eq!(dashboard.state.ads.len(), 1);
    assert_eq!(dashboard.state.ads[0].id, "a2");

    // 删除失败：提示文案，列表不刷新也不清空
    dashboard
        .handle(DashboardEvent::DeleteAd { ad_id: "a1".to_string(), confirmed: true })
        .await;
    assert_eq!(dashboard.state.alert.as_deref(), Some("Ad not found"));
    assert_eq!(dashboard.state.ads.len(), 1);
}

#[tokio::test]
async fn client_config_round_trip_filters_the_list() {
    let base = start_backend(39216, MockState::new()).await;
    let session = login_admin(&base).await;
    let mut dashboard = open_dashboard(&base, session).await;
    create_ad(&mut dashboard, "a1", "ForA", "game_a", AdType::Video).await;
    create_ad(&mut dashboard, "b1", "ForB", "game_b", AdType::Image).await;

    dashboard
        .handle(DashboardEvent::SaveClientConfig {
            client_id: "game_a".to_string(),
            allowed_types: vec![AdType::Image],
            allowed_categories: vec!["promo".to_string()],
        })
        .await;
    assert_eq!(dashboard.state.config_msg, "Saved.");
    let form = dashboard.state.config_form.as_ref().unwrap();
    assert_eq!(form.allowed_types, vec![AdType::Image]);
    // 保存后列表只剩该客户端的广告
    assert_eq!(dashboard.state.ads.len(), 1);
    assert_eq!(dashboard.state.ads[0].id, "a1");

    dashboard
        .handle(DashboardEvent::LoadClientConfig { client_id: "game_a".to_string() })
        .await;
    assert_eq!(dashboard.state.config_msg, "Loaded.");

    // 不存在的配置：消息区展示服务端文案，表单不变
    dashboard
        .handle(DashboardEvent::LoadClientConfig { client_id: "nope".to_string() })
        .await;
    assert_eq!(dashboard.state.config_msg, "Config not found");

    // 空 clientId 的本地校验
    dashboard
        .handle(DashboardEvent::SaveClientConfig {
            client_id: "  ".to_string(),
            allowed_types: vec![],
            allowed_categories: vec![],
        })
        .await;
    assert_eq!(dashboard.state.config_msg, "Client ID is required.");
}

#[tokio::test]
async fn developer_role_is_locked_to_its_first_client() {
    let base = start_backend(39217, MockState::new()).await;

    // 注册一个 developer 账号并直接使用返回的 token
    let api = ApiClient::new(&base, None).unwrap();
    let token = api.register("dev1", "pw", "game_x").await.unwrap();

    let session = empty_session();
    session.set_token(&token);
    let mut dashboard = open_dashboard(&base, session).await;

    assert_eq!(dashboard.state.locked_client_id.as_deref(), Some("game_x"));
    let me = dashboard.state.user.as_ref().unwrap();
    assert_eq!(me.username, "dev1");

    // 创建弹窗里 clientId 被锁定为该客户端
    dashboard.handle(DashboardEvent::OpenCreateModal).await;
    let modal = dashboard.state.modal.as_ref().unwrap();
    assert_eq!(modal.client_id, "game_x");
    assert!(modal.client_id_locked);
}

#[tokio::test]
async fn add_app_extends_the_allowed_client_list() {
    let base = start_backend(39218, MockState::new()).await;
    let api = ApiClient::new(&base, None).unwrap();
    let token = api.register("dev2", "pw", "game_x").await.unwrap();

    let dev_api = ApiClient::new(&base, Some(token)).unwrap();
    dev_api.add_app("game_y").await.unwrap();
    let me = dev_api.me().await.unwrap();
    assert_eq!(me.allowed_client_ids, vec!["game_x".to_string(), "game_y".to_string()]);
}

#[tokio::test]
async fn rendered_row_count_matches_seeded_snapshot() {
    let base = start_backend(39219, mock_api::seed_state()).await;
    let mut api = ApiClient::new(&base, None).unwrap();
    let token = api.login("admin", "admin").await.unwrap();
    api.set_token(Some(token));

    let ads = api.list_ads(None).await.unwrap();
    assert!(!ads.is_empty());
    let html = render_ads(&ads, EnabledControl::Glyph);
    assert_eq!(html.matches("edit-btn").count(), ads.len());

    // 逐客户端过滤的快照之和等于全量
    let a = api.list_ads(Some("game_a")).await.unwrap();
    let b = api.list_ads(Some("game_b")).await.unwrap();
    assert_eq!(a.len() + b.len(), ads.len());
}
