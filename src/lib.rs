pub mod auth;
pub mod client;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod paths;
pub mod response;
pub mod services;
pub mod srs;
pub mod state;
pub mod validation;

#[cfg(test)]
pub mod testing;
