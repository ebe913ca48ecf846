// src/portal/flow.rs

/// 页面跳转指令，由外层 shell 负责执行
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Stay,
    ToLogin,
    ToDashboard,
}
