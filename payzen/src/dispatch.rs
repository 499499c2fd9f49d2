//! Optional notification of the caller after a successful operation.
//!
//! A [`ResponseCallback`] sees the [`NormalizedResult`] once, before the
//! operation returns it. Whatever the callback does, error or panic, the
//! operation's own result is unchanged: failures are logged and dropped.

use std::panic::{self, AssertUnwindSafe};

use crate::error::CallbackError;
use crate::result::NormalizedResult;

/// Receives the result of an operation.
///
/// Implemented for every `Fn(&NormalizedResult) -> Result<(), CallbackError>`
/// closure that is `Send + Sync`.
///
/// ```rust
/// use payzen::{CallbackError, NormalizedResult, ResponseCallback};
///
/// let callback = |result: &NormalizedResult| -> Result<(), CallbackError> {
///     if result.is_accepted() { Ok(()) } else { Err("refused".into()) }
/// };
/// let _: &dyn ResponseCallback = &callback;
/// ```
pub trait ResponseCallback: Send + Sync {
    /// Handles one result.
    ///
    /// # Errors
    ///
    /// Any error is logged by the dispatcher and otherwise ignored.
    fn handle(&self, result: &NormalizedResult) -> Result<(), CallbackError>;
}

impl<F> ResponseCallback for F
where
    F: Fn(&NormalizedResult) -> Result<(), CallbackError> + Send + Sync,
{
    fn handle(&self, result: &NormalizedResult) -> Result<(), CallbackError> {
        self(result)
    }
}

/// Notifies `callback`, if any, with `result`.
///
/// Never fails. Errors and panics raised by the callback are logged at
/// `error` level. Catching a panic needs the unwinding panic strategy, which
/// every workspace profile uses; a binary built with `panic = "abort"` still
/// aborts on a panicking callback.
pub fn dispatch(callback: Option<&dyn ResponseCallback>, result: &NormalizedResult) {
    let Some(callback) = callback else {
        return;
    };
    let operation = result.operation();
    match panic::catch_unwind(AssertUnwindSafe(|| callback.handle(result))) {
        Ok(Ok(())) => {
            tracing::trace!(%operation, "Response callback completed");
        }
        Ok(Err(err)) => {
            tracing::error!(%operation, error = %err, "Cannot handle response");
        }
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_owned())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_owned());
            tracing::error!(%operation, panic = %message, "Cannot handle response");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::ResponseFragments;
    use crate::result::OperationKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn result() -> NormalizedResult {
        NormalizedResult::aggregate(
            OperationKind::ValidatePayment,
            ResponseFragments::default(),
            None,
        )
    }

    #[test]
    fn test_dispatch_without_callback_is_noop() {
        dispatch(None, &result());
    }

    #[test]
    fn test_dispatch_invokes_callback_once() {
        let calls = AtomicUsize::new(0);
        let callback = |r: &NormalizedResult| -> Result<(), CallbackError> {
            assert_eq!(r.operation(), OperationKind::ValidatePayment);
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        };
        dispatch(Some(&callback), &result());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dispatch_swallows_errors() {
        let callback = |_: &NormalizedResult| -> Result<(), CallbackError> { Err("boom".into()) };
        let result = result();
        let before = result.clone();
        dispatch(Some(&callback), &result);
        assert_eq!(result, before);
    }

    #[test]
    #[allow(clippy::panic)]
    fn test_dispatch_catches_panics() {
        let callback =
            |_: &NormalizedResult| -> Result<(), CallbackError> { panic!("callback blew up") };
        dispatch(Some(&callback), &result());
    }

    #[test]
    fn test_workspace_profiles_unwind() {
        let manifest: toml::Value = toml::from_str(include_str!("../../Cargo.toml")).unwrap();
        let profiles = manifest["profile"].as_table().unwrap();
        for (name, profile) in profiles {
            let strategy = profile.get("panic").and_then(toml::Value::as_str);
            assert_ne!(strategy, Some("abort"), "profile `{name}` must unwind");
        }
    }
}
