pub mod algebra;
pub mod config;
pub mod domain;
pub mod logic;
pub mod router;
pub mod server;
pub mod service;
pub mod templates;
