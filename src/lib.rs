pub mod config;
pub mod forwarding;
pub mod models;
pub mod protocol;
pub mod sensing;
pub mod utils;
