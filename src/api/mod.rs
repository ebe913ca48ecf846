// src/api/mod.rs

pub mod client;
pub mod error;
