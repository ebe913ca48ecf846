// src/mock_api.rs

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post, put};
use axum::{serve, Json, Router};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::time::{sleep, Duration};
use tracing::info;
use rand::Rng;
use uuid::Uuid;

use crate::model::ad::{seed_ads, Ad, AdType};
use crate::model::client_config::ClientConfig;
use crate::model::user::{Me, Role};

/// Mock 后端里的账号
#[derive(Debug, Clone)]
struct MockUser {
    username: String,
    password: String,
    role: Role,
    allowed_client_ids: Vec<String>,
}

#[derive(Default)]
struct MockInner {
    users: HashMap<String, MockUser>,      // username -> 账号
    tokens: HashMap<String, String>,       // token -> username
    ads: Vec<Ad>,                          // 全量广告快照
    configs: HashMap<String, ClientConfig>, // clientId -> 投放策略
}

/// 内存版广告管理后端，实现门户消费的全部 REST 契约。
/// 仅用于本地联调与集成测试。
#[derive(Clone, Default)]
pub struct MockState(Arc<Mutex<MockInner>>);

impl MockState {
    /// 空数据 + 一个内置 admin/admin 账号
    pub fn new() -> Self {
        let state = Self::default();
        state.0.lock().unwrap().users.insert(
            "admin".to_string(),
            MockUser {
                username: "admin".to_string(),
                password: "admin".to_string(),
                role: Role::Admin,
                allowed_client_ids: Vec::new(),
            },
        );
        state
    }
}

/// 初始化带随机种子数据的后端状态，并打印生成的信息
pub fn seed_state() -> MockState {
    let state = MockState::new();
    {
        let mut inner = state.0.lock().unwrap();
        inner.ads = seed_ads(&["game_a", "game_b"]);
        inner.configs.insert(
            "game_a".to_string(),
            ClientConfig {
                client_id: "game_a".to_string(),
                allowed_types: vec![AdType::Image, AdType::Video],
                allowed_categories: vec![],
            },
        );
    }
    state
}

type Reply = (StatusCode, Json<Value>);

fn error_reply(status: StatusCode, msg: &str) -> Reply {
    (status, Json(json!({ "error": msg })))
}

/// 校验 `Authorization: Bearer <token>`，返回对应账号
fn authed_user(inner: &MockInner, headers: &HeaderMap) -> Result<MockUser, Reply> {
    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    let Some(token) = token else {
        return Err(error_reply(StatusCode::UNAUTHORIZED, "Unauthorized"));
    };
    let Some(username) = inner.tokens.get(token) else {
        return Err(error_reply(StatusCode::UNAUTHORIZED, "Unauthorized"));
    };
    inner
        .users
        .get(username)
        .cloned()
        .ok_or_else(|| error_reply(StatusCode::UNAUTHORIZED, "Unauthorized"))
}

async fn handle_login(State(state): State<MockState>, Json(body): Json<Value>) -> Reply {
    let username = body.get("username").and_then(Value::as_str).unwrap_or("");
    let password = body.get("password").and_then(Value::as_str).unwrap_or("");

    let mut inner = state.0.lock().unwrap();
    let valid = inner
        .users
        .get(username)
        .map(|u| u.password == password)
        .unwrap_or(false);
    if !valid {
        return error_reply(StatusCode::UNAUTHORIZED, "Invalid username or password");
    }

    let token = Uuid::new_v4().to_string();
    inner.tokens.insert(token.clone(), username.to_string());
    info!("Mock API issued token for {}", username);
    (StatusCode::OK, Json(json!({ "token": token })))
}

async fn handle_register(State(state): State<MockState>, Json(body): Json<Value>) -> Reply {
    let username = body.get("username").and_then(Value::as_str).unwrap_or("");
    let password = body.get("password").and_then(Value::as_str).unwrap_or("");
    let client_id = body.get("clientId").and_then(Value::as_str).unwrap_or("");
    if username.is_empty() || password.is_empty() || client_id.is_empty() {
        return error_reply(StatusCode::BAD_REQUEST, "username, password and clientId are required");
    }

    let mut inner = state.0.lock().unwrap();
    if inner.users.contains_key(username) {
        return error_reply(StatusCode::CONFLICT, "Username already exists");
    }
    inner.users.insert(
        username.to_string(),
        MockUser {
            username: username.to_string(),
            password: password.to_string(),
            role: Role::Developer,
            allowed_client_ids: vec![client_id.to_string()],
        },
    );
    let token = Uuid::new_v4().to_string();
    inner.tokens.insert(token.clone(), username.to_string());
    (StatusCode::CREATED, Json(json!({ "token": token })))
}

async fn handle_add_app(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let client_id = body.get("clientId").and_then(Value::as_str).unwrap_or("");
    if client_id.is_empty() {
        return error_reply(StatusCode::BAD_REQUEST, "clientId is required");
    }

    let mut inner = state.0.lock().unwrap();
    let user = match authed_user(&inner, &headers) {
        Ok(user) => user,
        Err(reply) => return reply,
    };
    let entry = inner.users.get_mut(&user.username).unwrap();
    if !entry.allowed_client_ids.iter().any(|c| c == client_id) {
        entry.allowed_client_ids.push(client_id.to_string());
    }
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "allowedClientIds": entry.allowed_client_ids })),
    )
}

async fn handle_me(State(state): State<MockState>, headers: HeaderMap) -> Reply {
    let inner = state.0.lock().unwrap();
    let user = match authed_user(&inner, &headers) {
        Ok(user) => user,
        Err(reply) => return reply,
    };
    let me = Me {
        username: user.username,
        role: user.role,
        allowed_client_ids: user.allowed_client_ids,
    };
    (StatusCode::OK, Json(serde_json::to_value(me).unwrap()))
}

async fn handle_health() -> Reply {
    (StatusCode::OK, Json(json!({ "status": "ok", "db": "connected" })))
}

async fn handle_list_ads(
    State(state): State<MockState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Reply {
    // 模拟一点点后端延迟
    let delay_ms = rand::thread_rng().gen_range(2..15);
    sleep(Duration::from_millis(delay_ms)).await;

    let inner = state.0.lock().unwrap();
    if let Err(reply) = authed_user(&inner, &headers) {
        return reply;
    }

    let ads: Vec<&Ad> = match params.get("clientId") {
        Some(client_id) => inner.ads.iter().filter(|a| &a.client_id == client_id).collect(),
        None => inner.ads.iter().collect(),
    };
    (StatusCode::OK, Json(serde_json::to_value(ads).unwrap()))
}

async fn handle_create_ad(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Reply {
    let mut inner = state.0.lock().unwrap();
    if let Err(reply) = authed_user(&inner, &headers) {
        return reply;
    }

    let Some(obj) = body.as_object_mut() else {
        return error_reply(StatusCode::BAD_REQUEST, "Invalid ad payload");
    };
    obj.entry("categories").or_insert_with(|| json!([]));
    obj.entry("enabled").or_insert_with(|| json!(true));

    let required = ["id", "title", "type", "clickUrl"];
    let missing: Vec<&str> = required
        .iter()
        .filter(|k| !obj.contains_key(**k))
        .copied()
        .collect();
    if !missing.is_empty() {
        return error_reply(
            StatusCode::BAD_REQUEST,
            &format!("Missing fields: {}", missing.join(", ")),
        );
    }

    let ad_type = obj.get("type").and_then(Value::as_str).unwrap_or("");
    if ad_type != "image" && ad_type != "video" {
        return error_reply(StatusCode::BAD_REQUEST, "type must be 'image' or 'video'");
    }
    if ad_type == "image" && !obj.contains_key("imageUrl") {
        return error_reply(StatusCode::BAD_REQUEST, "imageUrl is required for image ads");
    }
    if ad_type == "video" && !obj.contains_key("videoUrl") {
        return error_reply(StatusCode::BAD_REQUEST, "videoUrl is required for video ads");
    }

    let ad: Ad = match serde_json::from_value(body.clone()) {
        Ok(ad) => ad,
        Err(_) => return error_reply(StatusCode::BAD_REQUEST, "Invalid ad payload"),
    };

    // 按 id upsert，避免重复提交产生重复记录
    if let Some(pos) = inner.ads.iter().position(|a| a.id == ad.id) {
        inner.ads[pos] = ad.clone();
    } else {
        inner.ads.push(ad.clone());
    }
    (StatusCode::CREATED, Json(serde_json::to_value(ad).unwrap()))
}

async fn handle_update_ad(
    State(state): State<MockState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(patch): Json<Value>,
) -> Reply {
    let mut inner = state.0.lock().unwrap();
    if let Err(reply) = authed_user(&inner, &headers) {
        return reply;
    }

    let Some(pos) = inner.ads.iter().position(|a| a.id == id) else {
        return error_reply(StatusCode::NOT_FOUND, "Ad not found");
    };

    let mut merged = serde_json::to_value(&inner.ads[pos]).unwrap();
    if let (Some(target), Some(changes)) = (merged.as_object_mut(), patch.as_object()) {
        for (key, value) in changes {
            // id 不允许通过更新修改
            if key == "id" {
                continue;
            }
            target.insert(key.clone(), value.clone());
        }
    }

    let updated: Ad = match serde_json::from_value(merged) {
        Ok(ad) => ad,
        Err(_) => return error_reply(StatusCode::BAD_REQUEST, "Invalid ad payload"),
    };
    inner.ads[pos] = updated.clone();
    (StatusCode::OK, Json(serde_json::to_value(updated).unwrap()))
}

async fn handle_delete_ad(
    State(state): State<MockState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Reply {
    let mut inner = state.0.lock().unwrap();
    if let Err(reply) = authed_user(&inner, &headers) {
        return reply;
    }

    let before = inner.ads.len();
    inner.ads.retain(|a| a.id != id);
    if inner.ads.len() == before {
        return error_reply(StatusCode::NOT_FOUND, "Ad not found");
    }
    (StatusCode::OK, Json(json!({ "status": "deleted", "id": id })))
}

async fn handle_get_config(
    State(state): State<MockState>,
    Path(client_id): Path<String>,
    headers: HeaderMap,
) -> Reply {
    let inner = state.0.lock().unwrap();
    if let Err(reply) = authed_user(&inner, &headers) {
        return reply;
    }

    match inner.configs.get(&client_id) {
        Some(config) => (StatusCode::OK, Json(serde_json::to_value(config).unwrap())),
        None => error_reply(StatusCode::NOT_FOUND, "Config not found"),
    }
}

async fn handle_put_config(
    State(state): State<MockState>,
    Path(client_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let mut inner = state.0.lock().unwrap();
    if let Err(reply) = authed_user(&inner, &headers) {
        return reply;
    }

    // 缺省字段按全类型放开处理
    let merged = json!({
        "clientId": client_id,
        "allowedTypes": body.get("allowedTypes").cloned().unwrap_or_else(|| json!(["image", "video"])),
        "allowedCategories": body.get("allowedCategories").cloned().unwrap_or_else(|| json!([])),
    });
    let config: ClientConfig = match serde_json::from_value(merged) {
        Ok(config) => config,
        Err(_) => return error_reply(StatusCode::BAD_REQUEST, "Invalid config payload"),
    };

    inner.configs.insert(client_id, config.clone());
    (StatusCode::OK, Json(serde_json::to_value(config).unwrap()))
}

/// 组装 mock 后端路由
pub fn router(state: MockState) -> Router {
    Router::new()
        .route("/auth/login", post(handle_login))
        .route("/auth/register", post(handle_register))
        .route("/auth/add-app", post(handle_add_app))
        .route("/me", get(handle_me))
        .route("/health", get(handle_health))
        .route("/ads", get(handle_list_ads).post(handle_create_ad))
        .route("/ads/{id}", put(handle_update_ad).delete(handle_delete_ad))
        .route("/config/{client_id}", get(handle_get_config).put(handle_put_config))
        .with_state(state)
}

/// 启动 Mock 广告管理后端
/// 服务监听指定端口，门户的 base url 需要与此一致
pub async fn start_mock_api_server(port: u16, state: MockState) {
    let app = router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!("Mock ads API running at http://{}", addr);

    let listener = TcpListener::bind(&addr).await.unwrap();
    serve(listener, app).await.unwrap();
}
