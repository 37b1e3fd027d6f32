//! Usage and account analytics over a document store

pub mod cli;
pub mod config;
pub mod services;
pub mod store;
pub mod types;
