pub mod auth;
pub mod config;
pub mod db;
pub mod display_id;
pub mod error;
pub mod graphql;
pub mod media;
pub mod models;
pub mod routes;
pub mod schema;
pub mod state;
