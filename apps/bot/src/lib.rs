pub mod command;
pub mod config;
pub mod line;
pub mod reply;
pub mod server;

pub type Error = anyhow::Error;
