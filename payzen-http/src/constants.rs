//! HTTP-specific constants.

/// User agent sent when the factory builds its own client.
pub const USER_AGENT: &str = concat!("payzen-rs/", env!("CARGO_PKG_VERSION"));

/// Content type of every request body.
pub const JSON_CONTENT_TYPE: &str = "application/json";

