// src/model/mod.rs

pub mod ad;
pub mod client_config;
pub mod user;
