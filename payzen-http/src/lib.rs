//! Reqwest transport for the [PayZen](https://payzen.eu) payment web services.
//!
//! [`HttpClientFactory`] implements [`payzen::ClientFactory`]: for every call
//! it wraps a shared connection pool in a fresh
//! [`reqwest_middleware::ClientWithMiddleware`] whose [`SigningMiddleware`]
//! signs each outbound request with that call's credentials.
//!
//! ```rust,no_run
//! use payzen::{CallOptions, Payment, SdkConfig};
//! use payzen_http::HttpClientFactory;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let payment = Payment::new(SdkConfig::load()?, HttpClientFactory::new()?);
//! let result = payment.details("b5e4c2a1", CallOptions::new()).await?;
//! println!("{:?}", result.transaction_uuid());
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`constants`] - the default user agent and the request content type
//! - [`error`] - failures raised inside the middleware chain

pub mod constants;
pub mod error;
mod factory;
mod middleware;
mod port;

pub use factory::HttpClientFactory;
pub use middleware::SigningMiddleware;
pub use port::HttpPort;
