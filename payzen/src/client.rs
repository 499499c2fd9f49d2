//! Transport seams.
//!
//! A [`ClientFactory`] turns the resolved [`CallSettings`] of one call into a
//! [`PaymentPort`] that performs exactly that call. Ports are never cached:
//! each logical operation asks for a fresh one, so per-call credentials stay
//! confined to the call that resolved them.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::credentials::CallSettings;
use crate::error::{PayzenError, TransportError};
use crate::proto::{RemoteCall, ResponseFragments};
use crate::session::SessionCookie;

/// A boxed future that is `Send`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Decoded reply of one remote call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteReply {
    /// Fragments carried by the reply.
    pub fragments: ResponseFragments,
    /// Session cookie set by the service, if any.
    pub session_cookie: Option<SessionCookie>,
}

impl RemoteReply {
    /// A reply without a session cookie.
    #[must_use]
    pub const fn new(fragments: ResponseFragments) -> Self {
        Self {
            fragments,
            session_cookie: None,
        }
    }

    /// Attaches the session cookie set by the service.
    #[must_use]
    pub fn with_session_cookie(mut self, cookie: SessionCookie) -> Self {
        self.session_cookie = Some(cookie);
        self
    }
}

/// A client bound to one set of credentials and one endpoint.
///
/// Every request it sends is signed with those credentials.
pub trait PaymentPort: Send + Sync {
    /// Sends one call.
    ///
    /// When `session` is given it is replayed verbatim so the service can
    /// find a suspended payment.
    fn call<'a>(
        &'a self,
        call: &'a RemoteCall,
        session: Option<&'a SessionCookie>,
    ) -> BoxFuture<'a, Result<RemoteReply, TransportError>>;
}

/// Builds a [`PaymentPort`] for one call.
///
/// Building performs no network I/O.
pub trait ClientFactory: Send + Sync {
    /// Builds a port bound to `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`PayzenError::Configuration`] if the settings cannot be
    /// turned into a client, or [`PayzenError::Transport`] if the underlying
    /// client cannot be constructed.
    fn build(&self, settings: CallSettings) -> Result<Box<dyn PaymentPort>, PayzenError>;
}

impl<T: ClientFactory + ?Sized> ClientFactory for Arc<T> {
    fn build(&self, settings: CallSettings) -> Result<Box<dyn PaymentPort>, PayzenError> {
        (**self).build(settings)
    }
}

impl<T: ClientFactory + ?Sized> ClientFactory for &T {
    fn build(&self, settings: CallSettings) -> Result<Box<dyn PaymentPort>, PayzenError> {
        (**self).build(settings)
    }
}
