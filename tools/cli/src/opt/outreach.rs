use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fmt;

#[derive(Debug, Clone, Copy, Default)]
/// The CLI output mode, either text or json, falls back to text if you ask for something other than text/json
pub enum OutputMode {
    #[default]
    Text,
    Json,
}

impl From<OutputMode> for clap::builder::OsStr {
    fn from(output_mode: OutputMode) -> Self {
        match output_mode {
            OutputMode::Text => "text".into(),
            OutputMode::Json => "json".into(),
        }
    }
}

impl std::str::FromStr for OutputMode {
    type Err = String;
    fn from_str(s: &str) -> Result<OutputMode, std::string::String> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputMode::Text),
            "json" => Ok(OutputMode::Json),
            _ => Ok(OutputMode::Text),
        }
    }
}

impl OutputMode {
    pub fn print_message<T>(self, input: T)
    where
        T: serde::Serialize + fmt::Debug + fmt::Display,
    {
        match self {
            OutputMode::Json => {
                println!(
                    "{}",
                    serde_json::to_string(&input).unwrap_or(format!("{input:?}"))
                );
            }
            OutputMode::Text => {
                println!("{input}");
            }
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct CommonOpt {
    /// Enable debugging of the outreach tool
    #[clap(short, long, env = "OUTREACH_DEBUG")]
    pub debug: bool,
    /// The project holding the outreach directory
    #[clap(short = 'P', long = "project", env = "OUTREACH_PROJECT_ID")]
    pub project_id: Option<String>,
    /// The web api key of the project
    #[clap(short = 'K', long = "api-key", env = "OUTREACH_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
    /// Path to a file to cache sessions in, defaults to ~/.cache/outreach_tokens
    #[clap(long = "token-cache-path", env = "OUTREACH_TOKEN_CACHE_PATH")]
    pub token_cache_path: Option<String>,
    /// Output format, text or json
    #[clap(short, long = "output", env = "OUTREACH_OUTPUT", default_value = OutputMode::default())]
    pub output_mode: OutputMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LoginMethod {
    /// Sign in to an existing email/password account
    Password,
    /// Create an email/password account and sign in to it
    SignUp,
    /// Sign in with an id token issued by google
    Google,
}

#[derive(Debug, Args, Clone)]
pub struct LoginOpt {
    #[clap(flatten)]
    pub copt: CommonOpt,
    /// The email address to sign in as
    #[clap(short = 'D', long = "email")]
    pub email: Option<String>,
    #[clap(short, long, value_enum, default_value_t = LoginMethod::Password)]
    pub method: LoginMethod,
    #[clap(long = "password", env = "OUTREACH_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
    /// Display name recorded on entries you create, for --method sign-up
    #[clap(long = "display-name")]
    pub display_name: Option<String>,
    /// The google id token, for --method google
    #[clap(long = "idp-token", env = "OUTREACH_IDP_TOKEN", hide_env_values = true)]
    pub idp_token: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct LogoutOpt {
    #[clap(flatten)]
    pub copt: CommonOpt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Args, Clone)]
pub struct ListOpt {
    #[clap(flatten)]
    pub copt: CommonOpt,
    /// Sort the listing by category
    #[clap(short, long, value_enum)]
    pub sort: Option<SortDirection>,
}

#[derive(Debug, Args, Clone)]
pub struct EntryFieldsOpt {
    #[clap(long)]
    pub name: Option<String>,
    #[clap(long)]
    pub email: Option<String>,
    #[clap(long)]
    pub description: Option<String>,
    /// A predefined category name or id, or any other text for a custom category
    #[clap(long)]
    pub category: Option<String>,
}

impl EntryFieldsOpt {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.description.is_none()
            && self.category.is_none()
    }
}

#[derive(Debug, Args, Clone)]
pub struct AddOpt {
    #[clap(flatten)]
    pub copt: CommonOpt,
    #[clap(flatten)]
    pub fields: EntryFieldsOpt,
}

#[derive(Debug, Args, Clone)]
pub struct EditOpt {
    #[clap(flatten)]
    pub copt: CommonOpt,
    /// The id of the entry to change
    pub id: String,
    #[clap(flatten)]
    pub fields: EntryFieldsOpt,
}

#[derive(Debug, Args, Clone)]
pub struct DeleteOpt {
    #[clap(flatten)]
    pub copt: CommonOpt,
    /// The id of the entry to delete
    pub id: String,
    /// Do not ask for confirmation
    #[clap(short, long)]
    pub yes: bool,
}

#[derive(Debug, Subcommand, Clone)]
pub enum OutreachClientOpt {
    /// Sign in, caching the session for future cli operations
    Login(LoginOpt),
    /// Remove the cached session
    Logout(LogoutOpt),
    /// Show the signed in account
    Whoami(CommonOpt),
    /// List the outreach entries
    List(ListOpt),
    /// Add an entry, prompting for anything not given
    Add(AddOpt),
    /// Change fields of an entry
    Edit(EditOpt),
    /// Delete an entry
    Delete(DeleteOpt),
    /// Show the predefined categories
    Categories(CommonOpt),
}

#[derive(Debug, Parser)]
#[clap(about = "Speaker Outreach Client Utility")]
pub struct OutreachClientParser {
    #[clap(subcommand)]
    pub commands: OutreachClientOpt,
}
