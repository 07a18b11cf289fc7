//! Application services - Built-in commands and registry assembly

pub mod command_service;

pub use command_service::CommandService;
