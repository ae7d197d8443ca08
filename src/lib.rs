pub mod config;
pub mod notify;
pub mod parser;
pub mod version;
pub mod watch;
