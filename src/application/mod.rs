//! 应用层：命令、查询及其处理器

pub mod commands;
pub mod handlers;
pub mod queries;

pub use commands::*;
pub use handlers::{EventCallbackCommandHandler, EventCallbackQueryHandler};
pub use queries::*;
