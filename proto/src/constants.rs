//! Because consistency is great!

/// The "system" path for the outreach client config
pub const DEFAULT_CLIENT_CONFIG_PATH: &str = "/etc/outreach/config";
/// The user-owned path for the outreach client config
pub const DEFAULT_CLIENT_CONFIG_PATH_HOME: &str = "~/.config/outreach";

/// The default location for the `outreach` CLI tool's token cache.
pub const CLIENT_TOKEN_CACHE: &str = "~/.cache/outreach_tokens";

pub const APPLICATION_JSON: &str = "application/json";

pub const DEFAULT_FIRESTORE_URI: &str = "https://firestore.googleapis.com";
pub const DEFAULT_IDENTITY_URI: &str = "https://identitytoolkit.googleapis.com";
pub const DEFAULT_TOKEN_URI: &str = "https://securetoken.googleapis.com";
pub const DEFAULT_DATABASE: &str = "(default)";
/// The collection every outreach entry lives in.
pub const DEFAULT_COLLECTION: &str = "entries";

/// Page size used when walking the collection.
pub const DEFAULT_LIST_PAGE_SIZE: u32 = 300;

// Store field names. IF YOU CHANGE THESE VALUES YOU BREAK EVERY STORED ENTRY
pub const FIELD_NAME: &str = "name";
pub const FIELD_EMAIL: &str = "email";
pub const FIELD_DESCRIPTION: &str = "description";
pub const FIELD_CATEGORY: &str = "category";
pub const FIELD_USER: &str = "user";
pub const FIELD_USERID: &str = "userid";
pub const FIELD_DATE_CREATED: &str = "dateCreated";

/// Select value that switches the entry form into free-text category mode.
pub const CUSTOM_CATEGORY_SENTINEL: &str = "custom";

/// Sign-in method identifier for email/password accounts.
pub const SIGN_IN_METHOD_PASSWORD: &str = "password";
/// Sign-in method identifier for the federated single-sign-on provider.
pub const SIGN_IN_METHOD_GOOGLE: &str = "google.com";

pub const ALERT_ACCOUNT_EXISTS: &str = "This email already has an account. Please log in.";
pub const ALERT_EMAIL_IN_USE: &str = "This email is already in use. Please log in.";

pub const DATE_NOT_AVAILABLE: &str = "N/A";
