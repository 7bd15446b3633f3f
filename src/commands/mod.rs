pub mod auth;
pub mod config;
pub mod count;
pub mod emit;
pub mod event_args;
pub mod interactive;
