pub mod command_handler;

pub use command_handler::{CommandHandler, COMMAND_QUEUE_CAPACITY};
