pub mod config;
pub mod intake;
pub mod messages;
pub mod motor;
pub mod runtime;
