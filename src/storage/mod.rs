// src/storage/mod.rs

pub mod session;
pub mod store;
