//! API request/response models

mod chat;
mod config;
mod persona;

pub use chat::*;
pub use config::*;
pub use persona::*;
