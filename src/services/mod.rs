// src/services/mod.rs
pub mod device_service;
pub mod dictionary;
pub mod messaging_service;
pub mod session_service;
pub mod translation_service;
