// src/portal/mod.rs

pub mod dashboard;
pub mod flow;
pub mod login;
pub mod modal;
