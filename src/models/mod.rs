// src/models/mod.rs
pub mod device;
pub mod language;
pub mod notification;
pub mod translation;

pub use device::*;
pub use language::*;
pub use notification::*;
pub use translation::*;
