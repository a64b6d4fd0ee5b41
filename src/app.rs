pub mod cli;
pub mod command_handlers;

pub use cli::{help_text, parse_cli_verb, CliVerb};
pub use command_handlers::run_cli;
