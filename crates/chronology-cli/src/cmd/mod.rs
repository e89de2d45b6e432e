pub mod actions;
pub mod config;
pub mod cron;
pub mod events;
pub mod init;
pub mod types;
