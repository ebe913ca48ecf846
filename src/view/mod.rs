// src/view/mod.rs

pub mod renderer;
