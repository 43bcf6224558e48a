//! 外部系统适配器

pub mod webhook;

pub use webhook::WebhookDispatcher;
