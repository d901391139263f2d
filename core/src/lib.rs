pub mod catalog;
pub mod error;
pub mod models;
pub mod nutrition;
pub mod service;
pub mod store;
