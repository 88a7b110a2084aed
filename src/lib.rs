pub mod catalog;
pub mod client;
pub mod config;
pub mod datum;
pub mod db;
pub mod error_code;
pub mod executor;
pub mod heap;
pub mod protocol;
pub mod server;
pub mod sql;
pub mod tx;
