//! User roles and the credential check performed on activation.

use std::fmt;

use ua_proto::services::UserIdentityToken;

use crate::error::ServiceError;

/// Role a session acts with when dispatching to collaborators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum UserRole {
    /// Full access, including node management
    Admin,
    /// Authenticated non-admin user
    User,
    /// No identity
    #[default]
    Anonymous,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => write!(f, "Admin"),
            Self::User => write!(f, "User"),
            Self::Anonymous => write!(f, "Anonymous"),
        }
    }
}

/// Decides the role a session gets from the identity token it activates
/// with.
///
/// Returning an error rejects the activation; the session stays in
/// `Created`.
pub trait CredentialVerifier: Send + Sync {
    /// Role for `token`, given the role the session was created with.
    fn verify(&self, token: &UserIdentityToken, current: UserRole)
    -> Result<UserRole, ServiceError>;
}

/// Grants `Admin` to any user-name token whose name is "admin", ignoring
/// ASCII case. Every other token keeps the session's current role.
///
/// # Security
///
/// INSECURE. The password is never looked at: anyone who can reach the
/// endpoint and type "admin" becomes admin while `allow_remote_admin` is
/// set. Suitable for tests and local development only. Deployments must
/// plug in a verifier that checks credentials.
#[derive(Debug, Clone, Copy)]
pub struct AdminNameVerifier {
    allow_remote_admin: bool,
}

impl AdminNameVerifier {
    /// Verifier honouring the server's remote-admin policy.
    pub fn new(allow_remote_admin: bool) -> Self {
        Self { allow_remote_admin }
    }
}

impl CredentialVerifier for AdminNameVerifier {
    fn verify(
        &self,
        token: &UserIdentityToken,
        current: UserRole,
    ) -> Result<UserRole, ServiceError> {
        match token {
            UserIdentityToken::UserName { user_name, .. }
                if self.allow_remote_admin && user_name.eq_ignore_ascii_case("admin") =>
            {
                Ok(UserRole::Admin)
            },
            _ => Ok(current),
        }
    }
}
