//! Value types exchanged with the identity provider.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::{SIGN_IN_METHOD_GOOGLE, SIGN_IN_METHOD_PASSWORD};

/// The signed-in account, as observed from the identity provider. Passed
/// by value into anything that needs attribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub uid: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl fmt::Display for SessionUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.display_name, &self.email) {
            (Some(n), Some(e)) => write!(f, "{} <{}> ({})", n, e, self.uid),
            (Some(n), None) => write!(f, "{} ({})", n, self.uid),
            (None, Some(e)) => write!(f, "{} ({})", e, self.uid),
            (None, None) => f.write_str(&self.uid),
        }
    }
}

/// How an account can sign in. The provider reports these as strings such
/// as `password` or `google.com`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum SignInMethod {
    Password,
    Federated(String),
}

impl SignInMethod {
    pub fn google() -> Self {
        SignInMethod::Federated(SIGN_IN_METHOD_GOOGLE.to_string())
    }

    pub fn as_str(&self) -> &str {
        match self {
            SignInMethod::Password => SIGN_IN_METHOD_PASSWORD,
            SignInMethod::Federated(p) => p.as_str(),
        }
    }
}

impl fmt::Display for SignInMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for SignInMethod {
    fn from(s: String) -> Self {
        if s == SIGN_IN_METHOD_PASSWORD {
            SignInMethod::Password
        } else {
            SignInMethod::Federated(s)
        }
    }
}

impl From<SignInMethod> for String {
    fn from(m: SignInMethod) -> Self {
        m.as_str().to_string()
    }
}

impl FromStr for SignInMethod {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(SignInMethod::from(s.to_string()))
    }
}

/// Error codes reported by the identity provider. The REST API sends them
/// as upper snake case messages, optionally followed by ` : detail`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthErrorCode {
    EmailAlreadyInUse,
    InvalidCredentials,
    UserNotFound,
    UserDisabled,
    TooManyAttempts,
    WeakPassword,
    InvalidIdpResponse,
    TokenExpired,
    Other(String),
}

impl AuthErrorCode {
    pub fn from_api_message(message: &str) -> Self {
        let code = message.split(':').next().unwrap_or_default().trim();
        match code {
            "EMAIL_EXISTS" => AuthErrorCode::EmailAlreadyInUse,
            "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "INVALID_EMAIL" => {
                AuthErrorCode::InvalidCredentials
            }
            "EMAIL_NOT_FOUND" => AuthErrorCode::UserNotFound,
            "USER_DISABLED" => AuthErrorCode::UserDisabled,
            "TOO_MANY_ATTEMPTS_TRY_LATER" => AuthErrorCode::TooManyAttempts,
            "WEAK_PASSWORD" => AuthErrorCode::WeakPassword,
            "INVALID_IDP_RESPONSE" => AuthErrorCode::InvalidIdpResponse,
            "TOKEN_EXPIRED" | "INVALID_REFRESH_TOKEN" | "INVALID_ID_TOKEN" => {
                AuthErrorCode::TokenExpired
            }
            other => AuthErrorCode::Other(other.to_string()),
        }
    }
}

impl fmt::Display for AuthErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthErrorCode::EmailAlreadyInUse => f.write_str("email already in use"),
            AuthErrorCode::InvalidCredentials => f.write_str("invalid credentials"),
            AuthErrorCode::UserNotFound => f.write_str("user not found"),
            AuthErrorCode::UserDisabled => f.write_str("user disabled"),
            AuthErrorCode::TooManyAttempts => f.write_str("too many attempts, try later"),
            AuthErrorCode::WeakPassword => f.write_str("weak password"),
            AuthErrorCode::InvalidIdpResponse => f.write_str("invalid identity provider response"),
            AuthErrorCode::TokenExpired => f.write_str("token expired"),
            AuthErrorCode::Other(s) => write!(f, "{}", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_in_method_strings() {
        assert_eq!(SignInMethod::from("password".to_string()), SignInMethod::Password);
        assert_eq!(SignInMethod::google().as_str(), "google.com");

        let methods: Vec<SignInMethod> =
            serde_json::from_str(r#"["google.com","password"]"#).expect("decode");
        assert_eq!(methods, vec![SignInMethod::google(), SignInMethod::Password]);
    }

    #[test]
    fn test_auth_error_code_mapping() {
        assert_eq!(
            AuthErrorCode::from_api_message("EMAIL_EXISTS"),
            AuthErrorCode::EmailAlreadyInUse
        );
        assert_eq!(
            AuthErrorCode::from_api_message("WEAK_PASSWORD : Password should be at least 6 characters"),
            AuthErrorCode::WeakPassword
        );
        assert_eq!(
            AuthErrorCode::from_api_message("SOMETHING_NEW"),
            AuthErrorCode::Other("SOMETHING_NEW".to_string())
        );
    }
}
