//! Continuity of a payment across the 3-D Secure browser redirect.
//!
//! When a create call needs cardholder verification, the remote service parks
//! the payment in a server-side session. The merchant must later prove which
//! session and which verification request the returned proof belongs to. Both
//! travel through the browser as the opaque MD value:
//!
//! ```text
//! MD = <session cookie> + "+" + <threeDSRequestId>
//! ```
//!
//! [`begin_challenge`] builds it, [`resume_challenge`] takes it apart. Neither
//! part may contain the delimiter, so decoding is unambiguous.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// Separator between the two halves of a [`RedirectToken`].
pub const DELIMITER: char = '+';

/// Cookie name used by the remote service for its session.
pub const SESSION_COOKIE_NAME: &str = "JSESSIONID";

/// Transport-level session state that lets the remote service relocate a
/// suspended payment.
///
/// Holds the `name=value` pair exactly as it must be replayed in a `Cookie`
/// header.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionCookie(String);

impl SessionCookie {
    /// Wraps a `name=value` cookie pair.
    pub fn new(cookie: impl Into<String>) -> Self {
        Self(cookie.into())
    }

    /// Extracts the session cookie from `Set-Cookie` header values.
    ///
    /// Prefers the `JSESSIONID` cookie and falls back to the first cookie
    /// seen. Attributes such as `Path` or `HttpOnly` are dropped.
    pub fn from_set_cookie<'a, I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut first = None;
        for value in values {
            let Some(pair) = value.split(';').next().map(str::trim) else {
                continue;
            };
            let Some((name, _)) = pair.split_once('=') else {
                continue;
            };
            if name.trim().is_empty() {
                continue;
            }
            if name.trim().eq_ignore_ascii_case(SESSION_COOKIE_NAME) {
                return Some(Self(pair.to_owned()));
            }
            if first.is_none() {
                first = Some(Self(pair.to_owned()));
            }
        }
        first
    }

    /// Returns the cookie exactly as it should be sent back.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the cookie name, if the value has the `name=value` shape.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.0.split_once('=').map(|(name, _)| name)
    }

    /// Returns the cookie value, if the value has the `name=value` shape.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.0.split_once('=').map(|(_, value)| value)
    }
}

impl fmt::Display for SessionCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SessionCookie {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The opaque MD value handed to the browser during verification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RedirectToken(String);

impl RedirectToken {
    /// Wraps a token received back from the browser.
    ///
    /// The value is only checked by [`resume_challenge`].
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RedirectToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RedirectToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for RedirectToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for RedirectToken {
    fn from(token: &str) -> Self {
        Self(token.to_owned())
    }
}

/// Builds the MD from the session cookie and the verification request id.
///
/// # Errors
///
/// Returns [`SessionError::Encoding`] if either part is empty or contains
/// [`DELIMITER`].
pub fn begin_challenge(
    session: &SessionCookie,
    request_id: &str,
) -> Result<RedirectToken, SessionError> {
    check_part("session cookie", session.as_str())?;
    check_part("request id", request_id)?;
    Ok(RedirectToken(format!(
        "{}{DELIMITER}{request_id}",
        session.as_str()
    )))
}

/// Splits an MD back into the session cookie and the verification request id.
///
/// # Errors
///
/// Returns [`SessionError::MalformedToken`] unless the token holds exactly one
/// [`DELIMITER`] with a non-empty part on each side.
pub fn resume_challenge(token: impl AsRef<str>) -> Result<(SessionCookie, String), SessionError> {
    let token = token.as_ref();
    let Some((session, request_id)) = token.split_once(DELIMITER) else {
        return Err(SessionError::MalformedToken {
            reason: "missing delimiter",
        });
    };
    if request_id.contains(DELIMITER) {
        return Err(SessionError::MalformedToken {
            reason: "more than one delimiter",
        });
    }
    if session.is_empty() {
        return Err(SessionError::MalformedToken {
            reason: "empty session cookie",
        });
    }
    if request_id.is_empty() {
        return Err(SessionError::MalformedToken {
            reason: "empty request id",
        });
    }
    Ok((SessionCookie::new(session), request_id.to_owned()))
}

fn check_part(part: &'static str, value: &str) -> Result<(), SessionError> {
    if value.is_empty() {
        return Err(SessionError::Encoding {
            part,
            reason: "must not be empty",
        });
    }
    if value.contains(DELIMITER) {
        return Err(SessionError::Encoding {
            part,
            reason: "must not contain '+'",
        });
    }
    Ok(())
}
