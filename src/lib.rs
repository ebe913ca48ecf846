// src/lib.rs

pub mod api;
pub mod logging;
pub mod mock_api;
pub mod model;
pub mod portal;
pub mod storage;
pub mod view;
