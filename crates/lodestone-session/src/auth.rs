//! Local login hook for connections that arrive without forwarding.
//!
//! With [`ForwardingMode::None`](crate::ForwardingMode::None) nobody has
//! vouched for the player, so the server has to decide who they are. That
//! decision is delegated to a [`LoginAuthenticator`]: online-mode session
//! verification, a whitelist service, or simply trusting the name.
//!
//! [`OfflineAuthenticator`] is the last of those and what the demo server
//! uses.

use uuid::Uuid;

use crate::identity::offline_uuid;
use crate::{AuthError, LocalIdentity};

/// What the client told us in `LoginStart`, plus where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginAttempt {
    pub username: String,
    /// The UUID the client claims. Untrusted.
    pub uuid: Option<Uuid>,
    pub remote_address: String,
}

/// Resolves a local identity for a login attempt.
///
/// # Trait bounds
///
/// - `Send + Sync` → one authenticator is shared by every connection task.
/// - `'static` → it lives as long as the server.
///
/// # Example
///
/// ```rust
/// use lodestone_session::{AuthError, LocalIdentity, LoginAttempt, LoginAuthenticator};
///
/// /// Admits a fixed set of names.
/// struct Allowlist(Vec<String>);
///
/// impl LoginAuthenticator for Allowlist {
///     async fn authenticate(
///         &self,
///         attempt: &LoginAttempt,
///     ) -> Result<LocalIdentity, AuthError> {
///         if !self.0.contains(&attempt.username) {
///             return Err(AuthError::Rejected("You are not white-listed on this server!".into()));
///         }
///         Ok(LocalIdentity {
///             uuid: lodestone_session::offline_uuid(&attempt.username),
///             username: attempt.username.clone(),
///             remote_address: attempt.remote_address.clone(),
///             skin: None,
///         })
///     }
/// }
/// ```
pub trait LoginAuthenticator: Send + Sync + 'static {
    /// Returns the identity to log in as, or
    /// [`AuthError::Rejected`] with a message for the client.
    fn authenticate(
        &self,
        attempt: &LoginAttempt,
    ) -> impl std::future::Future<Output = Result<LocalIdentity, AuthError>> + Send;
}

/// Trusts the username and derives the UUID from it.
///
/// The client-supplied UUID is ignored so one player cannot pick another's.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineAuthenticator;

impl LoginAuthenticator for OfflineAuthenticator {
    async fn authenticate(&self, attempt: &LoginAttempt) -> Result<LocalIdentity, AuthError> {
        Ok(LocalIdentity {
            uuid: offline_uuid(&attempt.username),
            username: attempt.username.clone(),
            remote_address: attempt.remote_address.clone(),
            skin: None,
        })
    }
}
