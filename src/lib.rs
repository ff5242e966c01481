pub mod cli;
pub mod clock;
pub mod config;
pub mod consent;
pub mod intake;
pub mod logging;
pub mod server;
