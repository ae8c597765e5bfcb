use std::collections::BTreeMap;
use std::fmt;
use std::fs::{create_dir, File};
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::PathBuf;
use std::sync::Arc;

use dialoguer::Input;
#[cfg(target_family = "unix")]
use libc::umask;
use outreach_client::IdentitySession;
use outreach_proto::constants::SIGN_IN_METHOD_GOOGLE;
use outreach_ui::idprovider::firebase::FirebaseProvider;
use outreach_ui::{App, SignInDecision, SignInRequest};
use serde::Serialize;
use time::format_description::well_known::Rfc3339;

use crate::{CommonOpt, LoginMethod, LoginOpt, LogoutOpt};

/// Cached sessions, keyed by project id.
pub type SessionStore = BTreeMap<String, IdentitySession>;

pub fn read_sessions(token_path: &str) -> Result<SessionStore, ()> {
    let token_path = PathBuf::from(shellexpand::tilde(token_path).into_owned());
    if !token_path.exists() {
        debug!(
            "Session cache file path {:?} does not exist, returning an empty session store.",
            token_path
        );
        return Ok(Default::default());
    }

    debug!("Attempting to read sessions from {:?}", &token_path);
    let file = match File::open(&token_path) {
        Ok(f) => f,
        Err(e) => match e.kind() {
            ErrorKind::PermissionDenied => {
                // Nothing could be written back either.
                error!(
                    "Permission denied reading session store file {:?}",
                    &token_path
                );
                return Err(());
            }
            _ => {
                warn!(
                    "Cannot read sessions from {} due to error: {:?} ... continuing.",
                    token_path.display(),
                    e
                );
                return Ok(Default::default());
            }
        },
    };
    let reader = BufReader::new(file);

    serde_json::from_reader(reader).map_err(|e| {
        warn!(
            "JSON/IO error reading sessions from {:?} -> {:?}",
            &token_path, e
        );
    })
}

pub fn write_sessions(sessions: &SessionStore, token_path: &str) -> Result<(), ()> {
    let token_path = PathBuf::from(shellexpand::tilde(token_path).into_owned());

    let token_dir = token_path.parent().ok_or_else(|| {
        error!(
            "Parent directory to {} is invalid (root directory?).",
            token_path.display()
        );
    })?;

    if !token_dir.exists() {
        create_dir(token_dir).map_err(|e| {
            error!(
                "Unable to create directory - {} {:?}",
                token_dir.display(),
                e
            );
        })?;
    }

    // Take away group/everyone read/write
    #[cfg(target_family = "unix")]
    let before = unsafe { umask(0o177) };

    let file = File::create(&token_path).map_err(|e| {
        #[cfg(target_family = "unix")]
        let _ = unsafe { umask(before) };
        error!("Can not write to {} -> {:?}", token_path.display(), e);
    })?;

    #[cfg(target_family = "unix")]
    let _ = unsafe { umask(before) };

    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, sessions).map_err(|e| {
        error!(
            "JSON/IO error writing sessions to file {:?} -> {:?}",
            &token_path, e
        );
    })
}

fn prompt_for_email() -> String {
    Input::<String>::new()
        .with_prompt("Email")
        .interact_text()
        .unwrap_or_else(|e| {
            error!("Failed to interact with interactive session -- {:?}", e);
            std::process::exit(1);
        })
}

fn prompt_for_password(password: &Option<String>) -> String {
    match password {
        Some(password) => {
            trace!("User provided password directly, don't need to prompt.");
            password.to_owned()
        }
        None => rpassword::prompt_password("Enter password: ").unwrap_or_else(|e| {
            error!("Failed to create password prompt -- {:?}", e);
            std::process::exit(1);
        }),
    }
}

impl LoginOpt {
    pub fn debug(&self) -> bool {
        self.copt.debug
    }

    fn to_request(&self) -> SignInRequest {
        match self.method {
            LoginMethod::Password => SignInRequest::Password {
                email: self
                    .email
                    .clone()
                    .unwrap_or_else(prompt_for_email),
                password: prompt_for_password(&self.password),
            },
            LoginMethod::SignUp => SignInRequest::SignUp {
                email: self
                    .email
                    .clone()
                    .unwrap_or_else(prompt_for_email),
                password: prompt_for_password(&self.password),
                display_name: self.display_name.clone(),
            },
            LoginMethod::Google => {
                let Some(id_token) = self.idp_token.clone() else {
                    error!("A google id token is required, set --idp-token or OUTREACH_IDP_TOKEN");
                    std::process::exit(1);
                };
                SignInRequest::Federated {
                    provider_id: SIGN_IN_METHOD_GOOGLE.to_string(),
                    id_token,
                }
            }
        }
    }

    pub async fn exec(&self) {
        let client = self.copt.to_unauth_client();
        let provider = Arc::new(FirebaseProvider::new(client.clone()));
        let mut app = App::new(provider.clone(), client.clone());

        let request = self.to_request();
        match app.sign_in(request).await {
            SignInDecision::Accepted(user) => {
                debug!(%user, "sign in accepted");
            }
            SignInDecision::Indeterminate => {
                warn!("Unable to confirm how this email may sign in, continuing");
            }
            SignInDecision::Blocked { alert } => {
                error!("{}", alert);
                std::process::exit(1);
            }
            SignInDecision::Failed { alert } => {
                error!("{}", alert.as_deref().unwrap_or("Sign in failed"));
                std::process::exit(1);
            }
        }

        let Some(session) = provider.current_session().await else {
            error!("Sign in completed without a session");
            std::process::exit(1);
        };

        let token_path = self.copt.get_token_cache_path();
        let mut sessions = read_sessions(&token_path).unwrap_or_else(|_| {
            error!("Error retrieving session cache");
            std::process::exit(1);
        });
        let user = session.user.clone();
        sessions.insert(client.project_id().to_string(), session);
        if write_sessions(&sessions, &token_path).is_err() {
            error!("Error persisting session cache {}", &token_path);
            std::process::exit(1);
        };

        println!("Login Success for {}", user);
    }
}

impl LogoutOpt {
    pub fn debug(&self) -> bool {
        self.copt.debug
    }

    pub async fn exec(&self) {
        let token_path = self.copt.get_token_cache_path();
        let mut sessions = read_sessions(&token_path).unwrap_or_else(|_| {
            error!("Error retrieving session cache");
            std::process::exit(1);
        });

        let client = self.copt.to_unauth_client();
        let Some(session) = sessions.remove(client.project_id()) else {
            println!("No session for project {}", client.project_id());
            return;
        };

        if write_sessions(&sessions, &token_path).is_err() {
            error!("Error persisting session cache {}", &token_path);
            std::process::exit(1);
        };
        println!("Removed session for {}", session.user);
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WhoamiView {
    uid: String,
    display_name: Option<String>,
    email: Option<String>,
    method: String,
    expires_at: String,
}

impl fmt::Display for WhoamiView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "uid: {}", self.uid)?;
        if let Some(name) = &self.display_name {
            writeln!(f, "name: {}", name)?;
        }
        if let Some(email) = &self.email {
            writeln!(f, "email: {}", email)?;
        }
        writeln!(f, "method: {}", self.method)?;
        write!(f, "expires: {}", self.expires_at)
    }
}

pub async fn whoami(copt: &CommonOpt) {
    let (app, provider) = copt.to_app().await;
    let (Some(user), Some(session)) = (
        app.shell().session().user(),
        provider.current_session().await,
    ) else {
        error!("Not signed in");
        std::process::exit(1);
    };

    let expires_at = session
        .expires_at
        .format(&Rfc3339)
        .unwrap_or_else(|_| session.expires_at.to_string());
    copt.output_mode.print_message(WhoamiView {
        uid: user.uid,
        display_name: user.display_name,
        email: user.email,
        method: session.method.to_string(),
        expires_at,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use outreach_proto::identity::{SessionUser, SignInMethod};
    use time::OffsetDateTime;

    fn scratch_path() -> (PathBuf, String) {
        let dir = std::env::temp_dir().join(format!("outreach-cli-{}", uuid::Uuid::new_v4()));
        let path = dir.join("tokens").to_string_lossy().into_owned();
        (dir, path)
    }

    fn session(uid: &str) -> IdentitySession {
        IdentitySession {
            user: SessionUser {
                uid: uid.to_string(),
                display_name: None,
                email: Some(format!("{uid}@example.com")),
            },
            method: SignInMethod::Password,
            id_token: "id".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn test_read_missing_store_is_empty() {
        let (_dir, path) = scratch_path();
        let sessions = read_sessions(&path).expect("read");
        assert!(sessions.is_empty());
    }

    #[test]
    fn test_write_then_read_store() {
        let (dir, path) = scratch_path();
        let mut sessions = SessionStore::new();
        sessions.insert("demo".to_string(), session("u1"));
        write_sessions(&sessions, &path).expect("write");

        let read = read_sessions(&path).expect("read");
        assert_eq!(read.get("demo"), Some(&session("u1")));

        #[cfg(target_family = "unix")]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).expect("metadata").permissions().mode();
            assert_eq!(mode & 0o077, 0);
        }

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_corrupt_store_is_an_error() {
        let (dir, path) = scratch_path();
        std::fs::create_dir_all(&dir).expect("mkdir");
        std::fs::write(&path, "not json").expect("write");
        assert!(read_sessions(&path).is_err());
        let _ = std::fs::remove_dir_all(dir);
    }
}
