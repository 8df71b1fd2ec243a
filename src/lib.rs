pub mod cli;
pub mod client;
pub mod clients;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod projects;
pub mod schema;
pub mod server;
pub mod tasks;
