mod callbacks;
mod commands;
mod inputs;

pub use callbacks::callback_handler;
pub use commands::{command_handler, Command};
pub use inputs::message_handler;
