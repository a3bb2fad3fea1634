//! Data models for LangSync

pub mod content;
pub mod entry;
pub mod pull_request;
pub mod route;

pub use content::*;
pub use entry::*;
pub use pull_request::*;
pub use route::*;
