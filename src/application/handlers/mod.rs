mod command_handler;
mod query_handler;

pub use command_handler::EventCallbackCommandHandler;
pub use query_handler::EventCallbackQueryHandler;
