//! Async client for the two services the outreach directory sits on: a
//! document store speaking the Firestore REST v1 API, and an identity
//! provider speaking the Identity Toolkit REST v1 API.

#![deny(warnings)]
#![warn(unused_extern_crates)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::unreachable)]
#![deny(clippy::await_holding_lock)]
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::trivially_copy_pass_by_ref)]

#[macro_use]
extern crate tracing;

use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::time::Duration;

use outreach_proto::constants::{
    APPLICATION_JSON, DEFAULT_COLLECTION, DEFAULT_DATABASE, DEFAULT_FIRESTORE_URI,
    DEFAULT_IDENTITY_URI, DEFAULT_TOKEN_URI,
};
use reqwest::header::CONTENT_TYPE;
pub use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::error::Error as SerdeJsonError;
use tokio::sync::RwLock;

mod firestore;
mod identity;

pub use firestore::Document;
pub use identity::IdentitySession;

#[derive(Debug)]
pub enum ClientError {
    Unauthorized,
    Http(reqwest::StatusCode, Option<ApiError>, String),
    Transport(reqwest::Error),
    JsonDecode(reqwest::Error, String),
    JsonEncode(SerdeJsonError),
    InvalidResponse(String),
    ConfigParseIssue(String),
    SystemError,
}

impl Display for ClientError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Unauthorized => f.write_str("not signed in, or the session has expired"),
            ClientError::Http(status, Some(api), dest) => {
                write!(f, "{} from {}: {}", status, dest, api.message)
            }
            ClientError::Http(status, None, dest) => write!(f, "{} from {}", status, dest),
            ClientError::Transport(e) => write!(f, "transport error: {}", e),
            ClientError::JsonDecode(e, dest) => write!(f, "invalid json from {}: {}", dest, e),
            ClientError::JsonEncode(e) => write!(f, "unable to encode request: {}", e),
            ClientError::InvalidResponse(s) => write!(f, "invalid response: {}", s),
            ClientError::ConfigParseIssue(s) => write!(f, "configuration problem: {}", s),
            ClientError::SystemError => f.write_str("system error"),
        }
    }
}

/// The error body both services return: `{"error": {"code": .., "message": ..}}`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ApiError {
    pub code: u16,
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct OutreachClientConfig {
    pub api_key: Option<String>,
    pub project_id: Option<String>,
    pub database: Option<String>,
    pub collection: Option<String>,
    pub firestore_uri: Option<String>,
    pub identity_uri: Option<String>,
    pub token_uri: Option<String>,
    pub connect_timeout: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct OutreachClientBuilder {
    api_key: Option<String>,
    project_id: Option<String>,
    database: String,
    collection: String,
    firestore_uri: String,
    identity_uri: String,
    token_uri: String,
    connect_timeout: Option<u64>,
    use_system_proxies: bool,
}

impl Default for OutreachClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for OutreachClientBuilder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.project_id {
            Some(value) => writeln!(f, "project_id: {}", value)?,
            None => writeln!(f, "project_id: unset")?,
        }
        // never print the key itself
        writeln!(
            f,
            "api_key: {}",
            if self.api_key.is_some() { "set" } else { "unset" }
        )?;
        writeln!(f, "database: {}", self.database)?;
        writeln!(f, "collection: {}", self.collection)?;
        writeln!(f, "firestore_uri: {}", self.firestore_uri)?;
        writeln!(f, "identity_uri: {}", self.identity_uri)?;
        writeln!(f, "token_uri: {}", self.token_uri)?;
        match self.connect_timeout {
            Some(value) => writeln!(f, "connect_timeout: {}", value)?,
            None => writeln!(f, "connect_timeout: unset")?,
        }
        writeln!(f, "use_system_proxies: {}", self.use_system_proxies)
    }
}

#[derive(Debug)]
pub struct OutreachClient {
    pub(crate) client: reqwest::Client,
    pub(crate) api_key: String,
    pub(crate) project_id: String,
    pub(crate) documents_url: String,
    pub(crate) builder: OutreachClientBuilder,
    pub(crate) bearer_token: RwLock<Option<String>>,
}

impl OutreachClientBuilder {
    pub fn new() -> Self {
        OutreachClientBuilder {
            api_key: None,
            project_id: None,
            database: DEFAULT_DATABASE.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            firestore_uri: DEFAULT_FIRESTORE_URI.to_string(),
            identity_uri: DEFAULT_IDENTITY_URI.to_string(),
            token_uri: DEFAULT_TOKEN_URI.to_string(),
            connect_timeout: None,
            use_system_proxies: true,
        }
    }

    fn apply_config_options(self, occ: OutreachClientConfig) -> Self {
        let OutreachClientConfig {
            api_key,
            project_id,
            database,
            collection,
            firestore_uri,
            identity_uri,
            token_uri,
            connect_timeout,
        } = occ;

        OutreachClientBuilder {
            api_key: api_key.or(self.api_key),
            project_id: project_id.or(self.project_id),
            database: database.unwrap_or(self.database),
            collection: collection.unwrap_or(self.collection),
            firestore_uri: firestore_uri.unwrap_or(self.firestore_uri),
            identity_uri: identity_uri.unwrap_or(self.identity_uri),
            token_uri: token_uri.unwrap_or(self.token_uri),
            connect_timeout: connect_timeout.or(self.connect_timeout),
            use_system_proxies: self.use_system_proxies,
        }
    }

    pub fn read_options_from_optional_config<P: AsRef<Path> + std::fmt::Debug>(
        self,
        config_path: P,
    ) -> Result<Self, ClientError> {
        debug!("Attempting to load configuration from {:#?}", &config_path);

        // Check exists by hand, some overlay filesystems report a missing file as a
        // directory when opened, which hides the real reason.
        if !config_path.as_ref().exists() {
            debug!("{:?} does not exist", config_path);
            return Ok(self);
        };

        let mut f = match File::open(&config_path) {
            Ok(f) => {
                debug!("Successfully opened configuration file {:#?}", &config_path);
                f
            }
            Err(e) => {
                match e.kind() {
                    ErrorKind::NotFound => {
                        debug!(
                            "Configuration file {:#?} not found, skipping.",
                            &config_path
                        );
                    }
                    ErrorKind::PermissionDenied => {
                        warn!(
                            "Permission denied loading configuration file {:#?}, skipping.",
                            &config_path
                        );
                    }
                    _ => {
                        debug!(
                            "Unable to open config file {:#?} [{:?}], skipping ...",
                            &config_path, e
                        );
                    }
                };
                return Ok(self);
            }
        };

        let mut contents = String::new();
        f.read_to_string(&mut contents).map_err(|e| {
            error!("{:?}", e);
            ClientError::ConfigParseIssue(format!("{:?}", e))
        })?;

        self.read_options_from_str(&contents)
    }

    pub fn read_options_from_str(self, contents: &str) -> Result<Self, ClientError> {
        let config: OutreachClientConfig = toml::from_str(contents).map_err(|e| {
            error!("{:?}", e);
            ClientError::ConfigParseIssue(format!("{:?}", e))
        })?;

        Ok(self.apply_config_options(config))
    }

    pub fn api_key(self, api_key: String) -> Self {
        OutreachClientBuilder {
            api_key: Some(api_key),
            ..self
        }
    }

    pub fn project_id(self, project_id: String) -> Self {
        OutreachClientBuilder {
            project_id: Some(project_id),
            ..self
        }
    }

    pub fn collection(self, collection: String) -> Self {
        OutreachClientBuilder { collection, ..self }
    }

    /// Point both services somewhere else, such as a local emulator.
    pub fn service_uris(self, firestore_uri: String, identity_uri: String) -> Self {
        OutreachClientBuilder {
            firestore_uri,
            identity_uri,
            ..self
        }
    }

    pub fn connect_timeout(self, secs: u64) -> Self {
        OutreachClientBuilder {
            connect_timeout: Some(secs),
            ..self
        }
    }

    pub fn no_proxy(self) -> Self {
        OutreachClientBuilder {
            use_system_proxies: false,
            ..self
        }
    }

    /// Generates a useragent header based on the package name and version
    pub fn user_agent() -> &'static str {
        static APP_USER_AGENT: &str =
            concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
        APP_USER_AGENT
    }

    fn documents_url(&self, project_id: &str) -> String {
        format!(
            "{}/v1/projects/{}/databases/{}/documents/{}",
            self.firestore_uri.trim_end_matches('/'),
            project_id,
            self.database,
            self.collection
        )
    }

    /// Build the client ready for usage.
    pub fn build(self) -> Result<OutreachClient, ClientError> {
        let project_id = self.project_id.clone().ok_or_else(|| {
            error!("Configuration option 'project_id' missing from client configuration, cannot continue client startup without a project to connect to.");
            ClientError::ConfigParseIssue("project_id missing".to_string())
        })?;

        let api_key = self.api_key.clone().ok_or_else(|| {
            error!("Configuration option 'api_key' missing from client configuration.");
            ClientError::ConfigParseIssue("api_key missing".to_string())
        })?;

        for uri in [&self.firestore_uri, &self.identity_uri, &self.token_uri] {
            url::Url::parse(uri).map_err(|e| {
                error!(?e, %uri, "Invalid service uri");
                ClientError::ConfigParseIssue(format!("invalid uri {}: {:?}", uri, e))
            })?;
            if !uri.starts_with("https://") {
                warn!(%uri, "Service uri does not start with 'https://' - this may allow network interception of tokens!");
            }
        }

        let client_builder = reqwest::Client::builder().user_agent(Self::user_agent());

        let client_builder = match self.use_system_proxies {
            true => client_builder,
            false => client_builder.no_proxy(),
        };

        let client_builder = match &self.connect_timeout {
            Some(secs) => client_builder
                .connect_timeout(Duration::from_secs(*secs))
                .timeout(Duration::from_secs(*secs)),
            None => client_builder,
        };

        let client = client_builder.build().map_err(ClientError::Transport)?;

        Ok(OutreachClient {
            client,
            api_key,
            documents_url: self.documents_url(&project_id),
            project_id,
            builder: self,
            bearer_token: RwLock::new(None),
        })
    }
}

impl OutreachClient {
    pub fn project_id(&self) -> &str {
        self.project_id.as_str()
    }

    pub fn collection(&self) -> &str {
        self.builder.collection.as_str()
    }

    pub async fn set_token(&self, new_token: String) {
        let mut tguard = self.bearer_token.write().await;
        *tguard = Some(new_token);
    }

    pub async fn get_token(&self) -> Option<String> {
        let tguard = self.bearer_token.read().await;
        (*tguard).as_ref().cloned()
    }

    /// Drop the identity token. Signing out is local; the provider keeps no
    /// server side session for us to end.
    pub async fn logout(&self) {
        let mut tguard = self.bearer_token.write().await;
        *tguard = None;
    }

    pub(crate) fn make_identity_url(&self, method: &str) -> String {
        format!(
            "{}/v1/{}",
            self.builder.identity_uri.trim_end_matches('/'),
            method
        )
    }

    pub(crate) fn make_token_url(&self) -> String {
        format!("{}/v1/token", self.builder.token_uri.trim_end_matches('/'))
    }

    pub(crate) fn make_document_url(&self, id: Option<&str>) -> String {
        match id {
            Some(id) => format!("{}/{}", self.documents_url, id),
            None => self.documents_url.clone(),
        }
    }

    async fn with_bearer(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let tguard = self.bearer_token.read().await;
        if let Some(token) = &(*tguard) {
            request.bearer_auth(token)
        } else {
            request
        }
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
        dest: &str,
    ) -> Result<T, ClientError> {
        let status = response.status();
        debug!(%status, %dest, "response");

        match status {
            reqwest::StatusCode::OK => {}
            reqwest::StatusCode::UNAUTHORIZED => {
                let body: Option<ApiErrorBody> = response.json().await.ok();
                warn!(?body, %dest, "request was not authorised");
                return Err(ClientError::Unauthorized);
            }
            unexpect => {
                let body: Option<ApiErrorBody> = response.json().await.ok();
                return Err(ClientError::Http(
                    unexpect,
                    body.map(|b| b.error),
                    dest.to_string(),
                ));
            }
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::JsonDecode(e, dest.to_string()))
    }

    /// POST to the identity provider. These carry the api key and never a
    /// bearer token.
    pub(crate) async fn perform_identity_post_request<R: Serialize, T: DeserializeOwned>(
        &self,
        method: &str,
        request: &R,
    ) -> Result<T, ClientError> {
        let dest = self.make_identity_url(method);
        let req_string = serde_json::to_string(request).map_err(ClientError::JsonEncode)?;

        let response = self
            .client
            .post(dest.as_str())
            .query(&[("key", self.api_key.as_str())])
            .body(req_string)
            .header(CONTENT_TYPE, APPLICATION_JSON)
            .send()
            .await
            .map_err(ClientError::Transport)?;

        self.handle_response(response, method).await
    }

    pub(crate) async fn perform_token_form_request<R: Serialize, T: DeserializeOwned>(
        &self,
        form: &R,
    ) -> Result<T, ClientError> {
        let dest = self.make_token_url();

        let response = self
            .client
            .post(dest.as_str())
            .query(&[("key", self.api_key.as_str())])
            .form(form)
            .send()
            .await
            .map_err(ClientError::Transport)?;

        self.handle_response(response, "token").await
    }

    pub(crate) async fn perform_get_request<T: DeserializeOwned>(
        &self,
        dest: &str,
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let request = self.client.get(dest).query(query);
        let response = self
            .with_bearer(request)
            .await
            .send()
            .await
            .map_err(ClientError::Transport)?;

        self.handle_response(response, dest).await
    }

    pub(crate) async fn perform_post_request<R: Serialize, T: DeserializeOwned>(
        &self,
        dest: &str,
        request: &R,
    ) -> Result<T, ClientError> {
        let req_string = serde_json::to_string(request).map_err(ClientError::JsonEncode)?;

        let request = self
            .client
            .post(dest)
            .body(req_string)
            .header(CONTENT_TYPE, APPLICATION_JSON);
        let response = self
            .with_bearer(request)
            .await
            .send()
            .await
            .map_err(ClientError::Transport)?;

        self.handle_response(response, dest).await
    }

    pub(crate) async fn perform_patch_request<R: Serialize, T: DeserializeOwned>(
        &self,
        dest: &str,
        query: &[(&str, String)],
        request: &R,
    ) -> Result<T, ClientError> {
        let req_string = serde_json::to_string(request).map_err(ClientError::JsonEncode)?;

        let request = self
            .client
            .patch(dest)
            .query(query)
            .body(req_string)
            .header(CONTENT_TYPE, APPLICATION_JSON);
        let response = self
            .with_bearer(request)
            .await
            .send()
            .await
            .map_err(ClientError::Transport)?;

        self.handle_response(response, dest).await
    }

    pub(crate) async fn perform_delete_request(
        &self,
        dest: &str,
        query: &[(&str, String)],
    ) -> Result<(), ClientError> {
        let request = self.client.delete(dest).query(query);
        let response = self
            .with_bearer(request)
            .await
            .send()
            .await
            .map_err(ClientError::Transport)?;

        // The store answers a delete with an empty object.
        let _: serde_json::Value = self.handle_response(response, dest).await?;
        Ok(())
    }
}
