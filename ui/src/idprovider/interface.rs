use async_trait::async_trait;
use outreach_proto::{AuthErrorCode, SessionUser, SignInMethod};
use tokio::sync::watch;

/// Errors an identity provider may return outside of a sign in attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdpError {
    /// The provider could not be reached, or answered with something that
    /// could not be understood.
    Transport,
    /// The provider refused the request.
    Denied(AuthErrorCode),
    /// The request itself was malformed, for example an empty email.
    BadRequest,
    /// The operation needs a signed in session and there is none.
    NotSignedIn,
}

/// What the provider currently believes about the session. `Unknown` is
/// the state before the provider has resolved any persisted session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    Unknown,
    SignedOut,
    SignedIn(SessionUser),
}

impl AuthState {
    pub fn user(&self) -> Option<&SessionUser> {
        match self {
            AuthState::SignedIn(u) => Some(u),
            _ => None,
        }
    }
}

/// A credential submitted through the sign in widget.
#[derive(Debug, Clone)]
pub enum SignInRequest {
    Password {
        email: String,
        password: String,
    },
    /// Email/password account creation. Creating an account signs it in.
    SignUp {
        email: String,
        password: String,
        display_name: Option<String>,
    },
    /// An id token already obtained from a federated provider.
    Federated {
        provider_id: String,
        id_token: String,
    },
}

impl SignInRequest {
    pub fn method(&self) -> SignInMethod {
        match self {
            SignInRequest::Password { .. } | SignInRequest::SignUp { .. } => {
                SignInMethod::Password
            }
            SignInRequest::Federated { provider_id, .. } => {
                SignInMethod::Federated(provider_id.clone())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInFailure {
    pub code: AuthErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInOutcome {
    Success {
        user: SessionUser,
        /// The method this sign in used. For a fresh sign up this is
        /// `Password`.
        method: SignInMethod,
    },
    Failure(SignInFailure),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Subscribe to auth state. The receiver always holds the latest state
    /// and is never pushed the same state twice in a row.
    fn observe(&self) -> watch::Receiver<AuthState>;

    /// Attempt a sign in. A successful attempt is published to observers
    /// before this returns.
    async fn sign_in(&self, request: SignInRequest) -> SignInOutcome;

    /// The sign in methods registered for an email address.
    async fn fetch_sign_in_methods(&self, email: &str) -> Result<Vec<SignInMethod>, IdpError>;

    async fn sign_out(&self) -> Result<(), IdpError>;
}
