#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for the PayZen payment web services.
//!
//! This crate holds everything about talking to the remote payment service
//! that does not depend on a particular transport: how calls are signed, how a
//! payment context survives the 3-D Secure browser redirect, and how the
//! operation-specific replies are folded into one [`NormalizedResult`].
//!
//! # Overview
//!
//! A [`Payment`] service is built once from an [`SdkConfig`] and a
//! [`ClientFactory`]. Each operation resolves its [`CallSettings`] from the
//! defaults plus an optional per-call [`ConfigOverride`], asks the factory for
//! a fresh [`PaymentPort`], performs one remote call, aggregates the reply and
//! optionally notifies a [`ResponseCallback`].
//!
//! # Modules
//!
//! - [`builder`] - Builders for create requests and queries
//! - [`client`] - The per-call transport seams ([`ClientFactory`], [`PaymentPort`])
//! - [`config`] - Process-wide defaults loaded from TOML and the environment
//! - [`credentials`] - Shop credentials, modes and per-call overrides
//! - [`dispatch`] - Optional response callbacks with failure isolation
//! - [`error`] - Error types
//! - [`payment`] - The [`Payment`] service exposing every operation
//! - [`proto`] - Wire format types for requests and response fragments
//! - [`result`] - The operation-to-fragment table and [`NormalizedResult`]
//! - [`session`] - The MD redirect token and the session cookie
//! - [`signer`] - Per-request authentication headers

pub mod builder;
pub mod client;
pub mod config;
pub mod credentials;
pub mod dispatch;
pub mod error;
pub mod payment;
pub mod proto;
pub mod result;
pub mod session;
pub mod signer;

pub use builder::{PaymentBuilder, QueryRequestBuilder, SimplePayment};
pub use client::{BoxFuture, ClientFactory, PaymentPort, RemoteReply};
pub use config::SdkConfig;
pub use credentials::{CallSettings, ConfigOverride, Credentials, Mode};
pub use dispatch::ResponseCallback;
pub use error::{CallbackError, ConfigurationError, PayzenError, SessionError, TransportError};
pub use payment::{CallOptions, ChallengeResponse, Payment, PaymentChange, PaymentUpdate, Refund};
pub use result::{AcsRedirect, Fragment, NormalizedResult, OperationKind};
pub use session::{RedirectToken, SessionCookie};
pub use signer::CredentialSigner;
