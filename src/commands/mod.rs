mod auth;
mod command_dispatcher;
mod command_error;
mod command_processor;
mod get;
mod hget;
mod hgetall;
mod hset;
mod ping;
mod set;
pub mod transactions;

pub use command_dispatcher::{AuthState, Session};
pub use command_error::CommandError;
pub use command_processor::Processor;
