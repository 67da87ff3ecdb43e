pub mod config;
pub mod engine;
pub mod formatters;
pub mod runner;
