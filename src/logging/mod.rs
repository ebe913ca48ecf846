// src/logging/mod.rs

pub mod action_logger;
pub mod portal_log;
