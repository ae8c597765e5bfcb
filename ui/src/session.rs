//! Session context and the sign in result handlers.
//!
//! The context is the single writer of "who is signed in". It is fed auth
//! states observed from the identity provider and hands the current user out
//! by value; components never hold a reference back into it.

use outreach_proto::constants::{ALERT_ACCOUNT_EXISTS, ALERT_EMAIL_IN_USE};
use outreach_proto::{AuthErrorCode, SessionUser, SignInMethod};

use crate::idprovider::interface::{AuthState, IdentityProvider, SignInFailure, SignInOutcome};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Uninitialized,
    /// Subscribed, waiting for the provider to resolve the initial state.
    Observing,
    SignedIn(SessionUser),
    SignedOut,
}

#[derive(Debug, Default)]
pub struct SessionContext {
    state: SessionState,
}

impl SessionContext {
    pub fn new() -> Self {
        SessionContext::default()
    }

    pub fn begin_observing(&mut self) {
        if self.state == SessionState::Uninitialized {
            self.state = SessionState::Observing;
        }
    }

    /// Fold an observed auth state into the context. Returns true when the
    /// session changed.
    pub fn apply(&mut self, observed: &AuthState) -> bool {
        let next = match observed {
            AuthState::Unknown => return false,
            AuthState::SignedOut => SessionState::SignedOut,
            AuthState::SignedIn(user) => SessionState::SignedIn(user.clone()),
        };

        if self.state == next {
            return false;
        }
        debug!(from = ?self.state, to = ?next, "session transition");
        self.state = next;
        true
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn user(&self) -> Option<SessionUser> {
        match &self.state {
            SessionState::SignedIn(u) => Some(u.clone()),
            _ => None,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        matches!(self.state, SessionState::SignedIn(_))
    }
}

/// How the sign in widget is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SignInFlow {
    Popup,
    Redirect,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInWidgetConfig {
    pub sign_in_flow: SignInFlow,
    pub sign_in_methods: Vec<SignInMethod>,
}

impl Default for SignInWidgetConfig {
    fn default() -> Self {
        SignInWidgetConfig {
            sign_in_flow: SignInFlow::Popup,
            sign_in_methods: vec![SignInMethod::google(), SignInMethod::Password],
        }
    }
}

/// What the handlers decided about a sign in attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInDecision {
    Accepted(SessionUser),
    /// The email is already registered under another method. The session
    /// has been signed out again.
    Blocked { alert: String },
    /// The method lookup failed. The session is left as the provider has it.
    Indeterminate,
    Failed { alert: Option<String> },
}

impl SignInDecision {
    pub fn alert(&self) -> Option<&str> {
        match self {
            SignInDecision::Blocked { alert } => Some(alert),
            SignInDecision::Failed { alert } => alert.as_deref(),
            _ => None,
        }
    }
}

pub struct SignInHandlers<'a, I: ?Sized> {
    idp: &'a I,
}

impl<'a, I> SignInHandlers<'a, I>
where
    I: IdentityProvider + ?Sized,
{
    pub fn new(idp: &'a I) -> Self {
        SignInHandlers { idp }
    }

    async fn force_sign_out(&self) {
        if let Err(err) = self.idp.sign_out().await {
            error!(?err, "unable to sign out blocked session");
        }
    }

    /// Guard against a password credential shadowing an account that was
    /// registered with a federated provider.
    pub async fn on_success(&self, user: SessionUser, method: &SignInMethod) -> SignInDecision {
        if *method != SignInMethod::Password {
            info!(%user, %method, "signed in");
            return SignInDecision::Accepted(user);
        }

        let Some(email) = user.email.as_deref() else {
            info!(%user, "signed in without an email, nothing to check");
            return SignInDecision::Accepted(user);
        };

        match self.idp.fetch_sign_in_methods(email).await {
            Ok(methods) => {
                if !methods.is_empty() && !methods.contains(&SignInMethod::Password) {
                    warn!(%email, ?methods, "email registered under another method, blocking");
                    self.force_sign_out().await;
                    SignInDecision::Blocked {
                        alert: ALERT_ACCOUNT_EXISTS.to_string(),
                    }
                } else {
                    info!(%user, "signed in");
                    SignInDecision::Accepted(user)
                }
            }
            Err(err) => {
                error!(?err, %email, "error fetching sign in methods");
                SignInDecision::Indeterminate
            }
        }
    }

    pub async fn on_failure(&self, failure: &SignInFailure) -> SignInDecision {
        match failure.code {
            AuthErrorCode::EmailAlreadyInUse => {
                self.force_sign_out().await;
                SignInDecision::Failed {
                    alert: Some(ALERT_EMAIL_IN_USE.to_string()),
                }
            }
            _ => {
                warn!(code = %failure.code, message = %failure.message, "sign in failed");
                SignInDecision::Failed { alert: None }
            }
        }
    }

    pub async fn handle(&self, outcome: SignInOutcome) -> SignInDecision {
        match outcome {
            SignInOutcome::Success { user, method } => self.on_success(user, &method).await,
            SignInOutcome::Failure(failure) => self.on_failure(&failure).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::MockIdentity;

    fn ann() -> SessionUser {
        SessionUser {
            uid: "u1".to_string(),
            display_name: Some("Ann".to_string()),
            email: Some("ann@x.com".to_string()),
        }
    }

    #[test]
    fn test_context_lifecycle() {
        let mut ctx = SessionContext::new();
        assert_eq!(ctx.state(), &SessionState::Uninitialized);
        ctx.begin_observing();
        assert_eq!(ctx.state(), &SessionState::Observing);

        assert!(!ctx.apply(&AuthState::Unknown));
        assert_eq!(ctx.state(), &SessionState::Observing);

        assert!(ctx.apply(&AuthState::SignedIn(ann())));
        assert!(ctx.is_signed_in());
        assert_eq!(ctx.user(), Some(ann()));
        assert!(!ctx.apply(&AuthState::SignedIn(ann())));

        assert!(ctx.apply(&AuthState::SignedOut));
        assert_eq!(ctx.user(), None);

        // observing only starts once
        ctx.begin_observing();
        assert_eq!(ctx.state(), &SessionState::SignedOut);
    }

    #[test]
    fn test_widget_config() {
        let cfg = SignInWidgetConfig::default();
        let v = serde_json::to_value(&cfg).expect("encode");
        assert_eq!(
            v,
            serde_json::json!({
                "signInFlow": "popup",
                "signInMethods": ["google.com", "password"]
            })
        );
    }

    #[tokio::test]
    async fn test_guard_blocks_federated_email() {
        sketching::test_init();
        let idp = MockIdentity::new();
        idp.register("ann@x.com", "", vec![SignInMethod::google()]);

        let handlers = SignInHandlers::new(&idp);
        let d = handlers.on_success(ann(), &SignInMethod::Password).await;
        assert_eq!(
            d,
            SignInDecision::Blocked {
                alert: ALERT_ACCOUNT_EXISTS.to_string()
            }
        );
        assert_eq!(idp.sign_out_count(), 1);
    }

    #[tokio::test]
    async fn test_guard_accepts() {
        let idp = MockIdentity::new();
        idp.register("ann@x.com", "pw", vec![SignInMethod::google(), SignInMethod::Password]);
        let handlers = SignInHandlers::new(&idp);

        // password already registered
        let d = handlers.on_success(ann(), &SignInMethod::Password).await;
        assert_eq!(d, SignInDecision::Accepted(ann()));

        // federated sign ins are not checked
        let d = handlers.on_success(ann(), &SignInMethod::google()).await;
        assert_eq!(d, SignInDecision::Accepted(ann()));

        // a brand new email has no methods yet
        let mut bob = ann();
        bob.email = Some("bob@x.com".to_string());
        let d = handlers.on_success(bob.clone(), &SignInMethod::Password).await;
        assert_eq!(d, SignInDecision::Accepted(bob));
        assert_eq!(idp.sign_out_count(), 0);
    }

    #[tokio::test]
    async fn test_guard_lookup_failure_is_indeterminate() {
        let idp = MockIdentity::new();
        idp.set_lookup_failing(true);
        let handlers = SignInHandlers::new(&idp);
        let d = handlers.on_success(ann(), &SignInMethod::Password).await;
        assert_eq!(d, SignInDecision::Indeterminate);
        assert_eq!(d.alert(), None);
        assert_eq!(idp.sign_out_count(), 0);
    }

    #[tokio::test]
    async fn test_failure_handler() {
        let idp = MockIdentity::new();
        let handlers = SignInHandlers::new(&idp);

        let d = handlers
            .on_failure(&SignInFailure {
                code: AuthErrorCode::EmailAlreadyInUse,
                message: "EMAIL_EXISTS".to_string(),
            })
            .await;
        assert_eq!(d.alert(), Some(ALERT_EMAIL_IN_USE));
        assert_eq!(idp.sign_out_count(), 1);

        let d = handlers
            .on_failure(&SignInFailure {
                code: AuthErrorCode::InvalidCredentials,
                message: "INVALID_PASSWORD".to_string(),
            })
            .await;
        assert_eq!(d, SignInDecision::Failed { alert: None });
        assert_eq!(idp.sign_out_count(), 1);
    }
}
