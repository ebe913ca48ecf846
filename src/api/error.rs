// src/api/error.rs

use thiserror::Error;

/// 门户内统一的错误类型，所有失败最终都归结为一条可读信息。
/// 网络失败、非 2xx 响应、响应缺字段、本地校验失败都走这里。
#[derive(Debug, Error)]
pub enum ApiError {
    /// 服务端返回的错误信息，或者 "Request failed (<status>)" 这类兜底信息
    #[error("{0}")]
    Server(String),

    /// 传输层失败（连接失败、响应体不可读等）
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// 成功响应里缺少 token 字段，参数标明是哪个调用（"Login" / "Register"）
    #[error("{0} response missing token")]
    MissingToken(&'static str),

    /// 本地表单校验失败
    #[error("{0}")]
    Validation(String),
}
