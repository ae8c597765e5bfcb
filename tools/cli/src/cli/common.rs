use std::sync::Arc;

use dialoguer::Confirm;
use outreach_client::{OutreachClient, OutreachClientBuilder};
use outreach_proto::constants::{
    CLIENT_TOKEN_CACHE, DEFAULT_CLIENT_CONFIG_PATH, DEFAULT_CLIENT_CONFIG_PATH_HOME,
};
use outreach_ui::idprovider::firebase::FirebaseProvider;
use outreach_ui::App;

use crate::session::{read_sessions, write_sessions};
use crate::{CommonOpt, LoginMethod, LoginOpt};

pub type CliApp = App<FirebaseProvider, Arc<OutreachClient>>;

#[derive(Debug)]
pub enum ToClientError {
    /// There is no usable session. Carries the email of the expired one, if
    /// there was one.
    NeedLogin(Option<String>),
    Other,
}

impl CommonOpt {
    pub fn get_token_cache_path(&self) -> String {
        match self.token_cache_path.clone() {
            None => CLIENT_TOKEN_CACHE.to_string(),
            Some(val) => val,
        }
    }

    pub fn to_unauth_client(&self) -> Arc<OutreachClient> {
        let config_path: String = shellexpand::tilde(DEFAULT_CLIENT_CONFIG_PATH_HOME).into_owned();

        let client_builder = OutreachClientBuilder::new()
            .read_options_from_optional_config(DEFAULT_CLIENT_CONFIG_PATH)
            .map_err(|e| {
                error!(
                    "Failed to parse config ({:?}) -- {:?}",
                    DEFAULT_CLIENT_CONFIG_PATH, e
                );
                e
            })
            .and_then(|cb| {
                cb.read_options_from_optional_config(&config_path)
                    .map_err(|e| {
                        error!("Failed to parse config ({:?}) -- {:?}", config_path, e);
                        e
                    })
            })
            .unwrap_or_else(|_e| {
                std::process::exit(1);
            });
        debug!(
            "Successfully loaded configuration, looked in {} and {} - client builder state: {}",
            DEFAULT_CLIENT_CONFIG_PATH, DEFAULT_CLIENT_CONFIG_PATH_HOME, &client_builder
        );

        let client_builder = match &self.project_id {
            Some(p) => client_builder.project_id(p.to_string()),
            None => client_builder,
        };

        let client_builder = match &self.api_key {
            Some(k) => client_builder.api_key(k.to_string()),
            None => client_builder,
        };

        let client = client_builder.build().unwrap_or_else(|e| {
            error!("Failed to build client instance -- {:?}", e);
            std::process::exit(1);
        });
        Arc::new(client)
    }

    async fn try_to_app(&self) -> Result<(CliApp, Arc<FirebaseProvider>), ToClientError> {
        let client = self.to_unauth_client();
        let token_path = self.get_token_cache_path();

        let mut sessions = read_sessions(&token_path).map_err(|_| {
            error!("Error retrieving session cache");
            ToClientError::Other
        })?;

        let Some(cached) = sessions.get(client.project_id()).cloned() else {
            error!(
                "No session found for project {}. Please login with the 'login' subcommand.",
                client.project_id()
            );
            return Err(ToClientError::NeedLogin(None));
        };

        let provider = Arc::new(FirebaseProvider::new(client.clone()));
        match provider.restore(Some(cached.clone())).await {
            Some(session) => {
                if session != cached {
                    debug!("Session was refreshed, updating cache");
                    sessions.insert(client.project_id().to_string(), session);
                    if write_sessions(&sessions, &token_path).is_err() {
                        warn!("Unable to persist the refreshed session");
                    }
                }
            }
            None => {
                error!(
                    "Session has expired for {} - you may need to login again.",
                    cached.user
                );
                return Err(ToClientError::NeedLogin(cached.user.email));
            }
        }

        let mut app = App::new(provider.clone(), client);
        app.sync_session().await;
        Ok((app, provider))
    }

    /// A signed in app, offering to log in again when the cached session is
    /// missing or has lapsed.
    pub async fn to_app(&self) -> (CliApp, Arc<FirebaseProvider>) {
        match self.try_to_app().await {
            Ok(r) => r,
            Err(ToClientError::NeedLogin(email)) => {
                if !Confirm::new()
                    .with_prompt("Would you like to login again?")
                    .default(true)
                    .interact()
                    .expect("Failed to interact with interactive session")
                {
                    std::process::exit(1);
                }
                let login_opt = LoginOpt {
                    copt: self.clone(),
                    email,
                    method: LoginMethod::Password,
                    password: std::env::var("OUTREACH_PASSWORD").ok(),
                    display_name: None,
                    idp_token: None,
                };
                login_opt.exec().await;
                self.try_to_app().await.unwrap_or_else(|_| std::process::exit(1))
            }
            Err(ToClientError::Other) => std::process::exit(1),
        }
    }
}
