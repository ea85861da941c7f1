//! docschat-interaction: the HTTP implementation of the backend gateway
//! and its configuration.

pub mod config;
pub mod http_gateway;

pub use config::BackendConfig;
pub use http_gateway::HttpDocumentGateway;
