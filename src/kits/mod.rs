// src/kits/mod.rs

pub mod clipboard;
pub mod json;
pub mod shell;
