//! Authentication hook for validating connection identity.
//!
//! Roomcast doesn't implement authentication itself — that's the
//! application's job (or its auth provider's: JWT validation, API keys,
//! a cookie check, etc.). The framework defines the [`Authenticator`]
//! trait: one async method over the upgrade request's headers, returning
//! an optional identity or an error. The server calls it once per
//! connection, before any room logic runs.
//!
//! An `Ok(None)` result admits the connection with no identity; handlers
//! see `user_id: None`. An `Err` terminates the connection.

use roomcast_protocol::UserId;
use roomcast_transport::HandshakeRequest;

use crate::SessionError;

/// Validates an incoming connection and resolves its identity.
///
/// # Trait bounds
///
/// `Send + Sync + 'static` because the authenticator is shared across all
/// connection tasks and lives as long as the server.
///
/// # Example
///
/// ```rust
/// use roomcast_session::{Authenticator, SessionError};
/// use roomcast_protocol::UserId;
/// use roomcast_transport::HandshakeRequest;
///
/// /// Requires an `x-token` header and uses it as the identity.
/// struct HeaderAuth;
///
/// impl Authenticator for HeaderAuth {
///     async fn authenticate(
///         &self,
///         request: &HandshakeRequest,
///     ) -> Result<Option<UserId>, SessionError> {
///         match request.header("x-token") {
///             Some(token) => Ok(Some(UserId(token.to_string()))),
///             None => Err(SessionError::AuthFailed("missing x-token".into())),
///         }
///     }
/// }
/// ```
pub trait Authenticator: Send + Sync + 'static {
    /// Inspects the upgrade request and returns the connection's identity.
    ///
    /// # Returns
    /// - `Ok(Some(user_id))` — admitted with an identity
    /// - `Ok(None)` — admitted anonymously
    /// - `Err(SessionError::AuthFailed)` — rejected; the caller terminates
    ///   the connection
    fn authenticate(
        &self,
        request: &HandshakeRequest,
    ) -> impl std::future::Future<Output = Result<Option<UserId>, SessionError>> + Send;
}

/// The default authenticator: admits every connection with no identity.
///
/// This matches a server configured without an authentication callback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

impl Authenticator for NoAuth {
    async fn authenticate(
        &self,
        _request: &HandshakeRequest,
    ) -> Result<Option<UserId>, SessionError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with(headers: Vec<(String, String)>) -> HandshakeRequest {
        HandshakeRequest {
            path: "/chat/my-chat".into(),
            headers,
        }
    }

    #[tokio::test]
    async fn test_no_auth_admits_without_identity() {
        let result = NoAuth.authenticate(&request_with(vec![])).await.unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_custom_authenticator_sees_headers() {
        struct HeaderAuth;
        impl Authenticator for HeaderAuth {
            async fn authenticate(
                &self,
                request: &HandshakeRequest,
            ) -> Result<Option<UserId>, SessionError> {
                match request.header("x-user") {
                    Some(user) => Ok(Some(UserId(user.to_string()))),
                    None => Err(SessionError::AuthFailed("missing x-user".into())),
                }
            }
        }

        let ok = HeaderAuth
            .authenticate(&request_with(vec![("x-user".into(), "alice".into())]))
            .await
            .unwrap();
        assert_eq!(ok, Some(UserId("alice".into())));

        let err = HeaderAuth.authenticate(&request_with(vec![])).await;
        assert!(matches!(err, Err(SessionError::AuthFailed(_))));
    }
}
