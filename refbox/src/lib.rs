pub mod command;
pub mod config;
pub mod console;
pub mod tournament_manager;
