//! image-explainer: upload an image, have a vision model explain it, then ask
//! follow-up questions that replay the conversation so far.

pub mod config;
pub mod conversation;
pub mod error;
pub mod inference;
pub mod message;
pub mod routes;
pub mod state;
pub mod storage;

pub use config::Config;
pub use error::ServerError;
pub use routes::build as build_router;
pub use state::AppState;
