use async_trait::async_trait;
use outreach_client::{ClientError, IdentitySession, OutreachClient};
use outreach_proto::{AuthErrorCode, SignInMethod};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::{watch, RwLock};

use super::interface::{
    AuthState, IdentityProvider, IdpError, SignInFailure, SignInOutcome, SignInRequest,
};

/// Identity Toolkit backed provider. The id token of the current session is
/// installed into the shared client, so the document store calls made
/// through the same client act as the signed in user.
pub struct FirebaseProvider {
    client: Arc<OutreachClient>,
    state: watch::Sender<AuthState>,
    session: RwLock<Option<IdentitySession>>,
}

impl FirebaseProvider {
    pub fn new(client: Arc<OutreachClient>) -> Self {
        let (state, _) = watch::channel(AuthState::Unknown);
        FirebaseProvider {
            client,
            state,
            session: RwLock::new(None),
        }
    }

    pub fn client(&self) -> &Arc<OutreachClient> {
        &self.client
    }

    fn publish(&self, next: AuthState) {
        self.state.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                debug!(?next, "auth state changed");
                *current = next;
                true
            }
        });
    }

    /// Resolve the initial auth state from a persisted session, refreshing
    /// it if it has expired. Returns the session now in effect so the
    /// caller can persist it again.
    pub async fn restore(&self, cached: Option<IdentitySession>) -> Option<IdentitySession> {
        let Some(cached) = cached else {
            self.publish(AuthState::SignedOut);
            return None;
        };

        #[allow(clippy::disallowed_methods)]
        let now = OffsetDateTime::now_utc();

        let session = if cached.is_expired(now) {
            match self.client.auth_refresh(&cached).await {
                Ok(s) => s,
                Err(err) => {
                    warn!(?err, uid = %cached.user.uid, "unable to refresh cached session");
                    self.client.logout().await;
                    self.publish(AuthState::SignedOut);
                    return None;
                }
            }
        } else {
            self.client.auth_resume(&cached).await;
            cached
        };

        self.publish(AuthState::SignedIn(session.user.clone()));
        *self.session.write().await = Some(session.clone());
        Some(session)
    }

    pub async fn current_session(&self) -> Option<IdentitySession> {
        self.session.read().await.clone()
    }
}

fn sign_in_failure(err: &ClientError) -> SignInFailure {
    let code = err
        .auth_error_code()
        .unwrap_or_else(|| AuthErrorCode::Other("NETWORK_REQUEST_FAILED".to_string()));
    SignInFailure {
        code,
        message: err.to_string(),
    }
}

#[async_trait]
impl IdentityProvider for FirebaseProvider {
    fn observe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    async fn sign_in(&self, request: SignInRequest) -> SignInOutcome {
        let result = match &request {
            SignInRequest::Password { email, password } => {
                self.client.auth_password(email, password).await
            }
            SignInRequest::SignUp {
                email,
                password,
                display_name,
            } => {
                self.client
                    .auth_password_sign_up(email, password, display_name.as_deref())
                    .await
            }
            SignInRequest::Federated {
                provider_id,
                id_token,
            } => self.client.auth_idp(provider_id, id_token).await,
        };

        match result {
            Ok(session) => {
                let user = session.user.clone();
                let method = session.method.clone();
                *self.session.write().await = Some(session);
                self.publish(AuthState::SignedIn(user.clone()));
                SignInOutcome::Success { user, method }
            }
            Err(err) => {
                debug!(?err, method = %request.method(), "sign in refused");
                SignInOutcome::Failure(sign_in_failure(&err))
            }
        }
    }

    async fn fetch_sign_in_methods(&self, email: &str) -> Result<Vec<SignInMethod>, IdpError> {
        if email.trim().is_empty() {
            return Err(IdpError::BadRequest);
        }
        self.client
            .auth_sign_in_methods(email)
            .await
            .map_err(|err| match err.auth_error_code() {
                Some(code) => IdpError::Denied(code),
                None => {
                    error!(?err, "sign in method lookup failed");
                    IdpError::Transport
                }
            })
    }

    async fn sign_out(&self) -> Result<(), IdpError> {
        self.client.logout().await;
        *self.session.write().await = None;
        self.publish(AuthState::SignedOut);
        Ok(())
    }
}
