//! Identity Toolkit calls: password and federated sign in, account creation,
//! sign-in method lookup and token refresh.

use outreach_proto::{AuthErrorCode, SessionUser, SignInMethod};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{ClientError, OutreachClient};

/// Where federated providers are told the sign in started. The provider
/// only checks that it is a valid uri.
const REQUEST_URI: &str = "http://localhost";

/// A signed in account and the tokens needed to act as it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentitySession {
    pub user: SessionUser,
    /// How this session was established.
    pub method: SignInMethod,
    pub id_token: String,
    pub refresh_token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl IdentitySession {
    /// Tokens are treated as expired a minute early so a request never
    /// races the deadline.
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        now + Duration::minutes(1) >= self.expires_at
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IdpRequest {
    post_body: String,
    request_uri: &'static str,
    return_idp_credential: bool,
    return_secure_token: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileUpdateRequest<'a> {
    id_token: &'a str,
    display_name: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateAuthUriRequest<'a> {
    identifier: &'a str,
    continue_uri: &'static str,
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    grant_type: &'static str,
    refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateAuthUriResponse {
    #[serde(default)]
    signin_methods: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
    user_id: String,
}

const DEFAULT_TOKEN_LIFETIME: Duration = Duration::hours(1);

fn expires_at(expires_in: &str, now: OffsetDateTime) -> OffsetDateTime {
    let lifetime = expires_in
        .parse::<i64>()
        .map(Duration::seconds)
        .unwrap_or_else(|_| {
            warn!(%expires_in, "unparseable token lifetime, assuming one hour");
            DEFAULT_TOKEN_LIFETIME
        });
    now.checked_add(lifetime).unwrap_or_else(|| {
        warn!(%expires_in, "token lifetime out of range, assuming one hour");
        now + DEFAULT_TOKEN_LIFETIME
    })
}

impl TokenResponse {
    fn into_session(self, method: SignInMethod, now: OffsetDateTime) -> IdentitySession {
        let expires_at = expires_at(&self.expires_in, now);
        IdentitySession {
            user: SessionUser {
                uid: self.local_id,
                display_name: self.display_name.filter(|s| !s.is_empty()),
                email: self.email,
            },
            method,
            id_token: self.id_token,
            refresh_token: self.refresh_token,
            expires_at,
        }
    }
}

impl ClientError {
    /// The identity provider's reason for refusing a request, if that is
    /// what this error is.
    pub fn auth_error_code(&self) -> Option<AuthErrorCode> {
        match self {
            ClientError::Http(_, Some(api), _) => Some(AuthErrorCode::from_api_message(&api.message)),
            _ => None,
        }
    }
}

impl OutreachClient {
    async fn establish(&self, session: &IdentitySession) {
        self.set_token(session.id_token.clone()).await;
    }

    pub async fn auth_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<IdentitySession, ClientError> {
        let r: TokenResponse = self
            .perform_identity_post_request(
                "accounts:signInWithPassword",
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;

        #[allow(clippy::disallowed_methods)]
        let session = r.into_session(SignInMethod::Password, OffsetDateTime::now_utc());
        self.establish(&session).await;
        Ok(session)
    }

    /// Create an email/password account, setting its display name when one
    /// is given.
    pub async fn auth_password_sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<IdentitySession, ClientError> {
        let r: TokenResponse = self
            .perform_identity_post_request(
                "accounts:signUp",
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;

        #[allow(clippy::disallowed_methods)]
        let mut session = r.into_session(SignInMethod::Password, OffsetDateTime::now_utc());

        if let Some(display_name) = display_name {
            let _: serde_json::Value = self
                .perform_identity_post_request(
                    "accounts:update",
                    &ProfileUpdateRequest {
                        id_token: &session.id_token,
                        display_name,
                        return_secure_token: false,
                    },
                )
                .await?;
            session.user.display_name = Some(display_name.to_string());
        }

        self.establish(&session).await;
        Ok(session)
    }

    /// Exchange a federated provider's id token for a session.
    pub async fn auth_idp(
        &self,
        provider_id: &str,
        provider_id_token: &str,
    ) -> Result<IdentitySession, ClientError> {
        let r: TokenResponse = self
            .perform_identity_post_request(
                "accounts:signInWithIdp",
                &IdpRequest {
                    post_body: format!("id_token={}&providerId={}", provider_id_token, provider_id),
                    request_uri: REQUEST_URI,
                    return_idp_credential: true,
                    return_secure_token: true,
                },
            )
            .await?;

        #[allow(clippy::disallowed_methods)]
        let session = r.into_session(
            SignInMethod::Federated(provider_id.to_string()),
            OffsetDateTime::now_utc(),
        );
        self.establish(&session).await;
        Ok(session)
    }

    /// Which methods can sign in as this email. Empty when the account does
    /// not exist, or when the provider hides that information.
    pub async fn auth_sign_in_methods(&self, email: &str) -> Result<Vec<SignInMethod>, ClientError> {
        let r: CreateAuthUriResponse = self
            .perform_identity_post_request(
                "accounts:createAuthUri",
                &CreateAuthUriRequest {
                    identifier: email,
                    continue_uri: REQUEST_URI,
                },
            )
            .await?;

        debug!(methods = ?r.signin_methods, "sign in methods");
        Ok(r
            .signin_methods
            .into_iter()
            .map(SignInMethod::from)
            .collect())
    }

    /// Swap the refresh token for a fresh id token. The user record is
    /// carried over as the token endpoint does not return it.
    pub async fn auth_refresh(
        &self,
        session: &IdentitySession,
    ) -> Result<IdentitySession, ClientError> {
        let r: RefreshResponse = self
            .perform_token_form_request(&RefreshRequest {
                grant_type: "refresh_token",
                refresh_token: &session.refresh_token,
            })
            .await?;

        if r.user_id != session.user.uid {
            error!(expected = %session.user.uid, got = %r.user_id, "refreshed token belongs to another account");
            return Err(ClientError::InvalidResponse(
                "refreshed token belongs to another account".to_string(),
            ));
        }

        #[allow(clippy::disallowed_methods)]
        let now = OffsetDateTime::now_utc();
        let refreshed = IdentitySession {
            user: session.user.clone(),
            method: session.method.clone(),
            id_token: r.id_token,
            refresh_token: r.refresh_token,
            expires_at: expires_at(&r.expires_in, now),
        };
        self.establish(&refreshed).await;
        Ok(refreshed)
    }

    /// Resume a cached session without contacting the provider.
    pub async fn auth_resume(&self, session: &IdentitySession) {
        self.establish(session).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    #[test]
    fn test_token_response_into_session() {
        let r: TokenResponse = serde_json::from_value(json!({
            "kind": "identitytoolkit#VerifyPasswordResponse",
            "localId": "uid-1",
            "email": "jane@x.com",
            "displayName": "",
            "idToken": "id.tok.en",
            "registered": true,
            "refreshToken": "refresh",
            "expiresIn": "3600"
        }))
        .expect("decode");

        let now = datetime!(2024-03-01 10:00 UTC);
        let s = r.into_session(SignInMethod::Password, now);
        assert_eq!(s.user.uid, "uid-1");
        // an empty display name is the provider saying "none"
        assert_eq!(s.user.display_name, None);
        assert_eq!(s.expires_at, datetime!(2024-03-01 11:00 UTC));
        assert!(!s.is_expired(now));
        assert!(s.is_expired(datetime!(2024-03-01 10:59:30 UTC)));
    }

    #[test]
    fn test_token_lifetime_fallbacks() {
        let now = datetime!(2024-03-01 10:00 UTC);
        assert_eq!(expires_at("120", now), datetime!(2024-03-01 10:02 UTC));
        assert_eq!(expires_at("soon", now), datetime!(2024-03-01 11:00 UTC));
        assert_eq!(
            expires_at(&i64::MAX.to_string(), now),
            datetime!(2024-03-01 11:00 UTC)
        );
    }

    #[test]
    fn test_session_roundtrips_through_cache_format() {
        let s = IdentitySession {
            user: SessionUser {
                uid: "u".to_string(),
                display_name: Some("Ann".to_string()),
                email: None,
            },
            method: SignInMethod::google(),
            id_token: "a".to_string(),
            refresh_token: "b".to_string(),
            expires_at: datetime!(2024-03-01 11:00 UTC),
        };
        let text = serde_json::to_string(&s).expect("encode");
        assert!(text.contains("\"method\":\"google.com\""));
        let back: IdentitySession = serde_json::from_str(&text).expect("decode");
        assert_eq!(back, s);
    }

    #[test]
    fn test_auth_error_code_from_client_error() {
        let e = ClientError::Http(
            reqwest::StatusCode::BAD_REQUEST,
            Some(crate::ApiError {
                code: 400,
                message: "EMAIL_EXISTS".to_string(),
                status: None,
            }),
            "accounts:signUp".to_string(),
        );
        assert_eq!(e.auth_error_code(), Some(AuthErrorCode::EmailAlreadyInUse));
        assert_eq!(ClientError::SystemError.auth_error_code(), None);
    }
}
