//! Countries SOAP web service.
//!
//! Answers `getCountryRequest` messages with country metadata from a static
//! in-memory data set.
//!
//! # Features
//!
//! - SOAP 1.1 and 1.2 envelopes over HTTP, response in the request's version
//! - Explicit route table from payload root element to operation
//! - SOAP Fault responses for malformed or unroutable requests
//! - XXE prevention (DOCTYPE and entity declarations are rejected)
//! - JSON rendition of the same lookup
//!
//! # Example
//!
//! ```ignore
//! use countries_ws::{build_app, ServiceConfig};
//!
//! let config = ServiceConfig::default();
//! let app = build_app(&config)?;
//! let listener = tokio::net::TcpListener::bind(&config.server.bind_address).await?;
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod country;
pub mod dispatcher;
pub mod endpoint;
pub mod error;
pub mod parser;
pub mod repository;
pub mod router;
pub mod server;
pub mod writer;

pub use config::ServiceConfig;
pub use country::{Country, Currency};
pub use dispatcher::MessageDispatcher;
pub use endpoint::{CountryEndpoint, GetCountryRequest, GetCountryResponse};
pub use error::{Fault, FaultCode, ServiceError};
pub use repository::CountryRepository;
pub use router::RouteTable;

use server::AppState;
use std::sync::Arc;

/// Wire the service together from configuration.
pub fn build_app(config: &ServiceConfig) -> Result<axum::Router, ServiceError> {
    config.validate()?;

    let repository = Arc::new(config.repository()?);
    let endpoint = Arc::new(CountryEndpoint::new(repository));

    let mut routes = RouteTable::new();
    Arc::clone(&endpoint).register(&mut routes, &config.service.namespace);

    let dispatcher = Arc::new(MessageDispatcher::new(config.settings.clone(), routes));
    let state = AppState::new(dispatcher, endpoint);

    Ok(server::create_router(state, &config.server.path))
}
