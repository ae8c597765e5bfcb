use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::constants::{FIELD_CATEGORY, FIELD_DESCRIPTION, FIELD_EMAIL, FIELD_NAME};

/// Opaque identifier assigned by the document store when an entry is created.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        EntryId(id.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntryId {
    fn from(s: &str) -> Self {
        EntryId(s.to_string())
    }
}

/// A single outreach record as loaded from the store. Loaded entries are
/// value snapshots: edits are expressed as an [`EntryPatch`] and submitted,
/// never applied to a rendered row in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: EntryId,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    /// Display name of the creating account, captured at creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "userid")]
    pub userid: Option<String>,
    /// Raw creation timestamp as stored. Only parsed when rendered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_created: Option<String>,
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "---")?;
        writeln!(f, "id: {}", self.id)?;
        writeln!(f, "name: {}", self.name)?;
        writeln!(f, "email: {}", self.email)?;
        writeln!(f, "category: {}", self.category)?;
        if let Some(user) = &self.user {
            writeln!(f, "user: {}", user)?;
        }
        if let Some(dc) = &self.date_created {
            writeln!(f, "dateCreated: {}", dc)?;
        }
        write!(f, "description: {}", self.description)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("entry name must not be empty")]
    EmptyName,
    #[error("no fields changed")]
    EmptyPatch,
}

/// A new entry before the store has assigned it an id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDraft {
    pub name: String,
    pub email: String,
    pub description: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userid: Option<String>,
}

impl EntryDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(())
    }

    /// Attach the id and creation stamp the store handed back.
    pub fn into_entry(self, id: EntryId, date_created: Option<String>) -> Entry {
        let EntryDraft {
            name,
            email,
            description,
            category,
            user,
            userid,
        } = self;

        Entry {
            id,
            name,
            email,
            description,
            category,
            user,
            userid,
            date_created,
        }
    }
}

/// Field changes for an existing entry. Attribution fields (`user`,
/// `userid`, `dateCreated`) are not editable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl EntryPatch {
    /// Build the patch that turns `current` into the given field values,
    /// carrying only what actually differs.
    pub fn diff(
        current: &Entry,
        name: &str,
        email: &str,
        description: &str,
        category: &str,
    ) -> Self {
        fn changed(old: &str, new: &str) -> Option<String> {
            (old != new).then(|| new.to_string())
        }

        EntryPatch {
            name: changed(&current.name, name),
            email: changed(&current.email, email),
            description: changed(&current.description, description),
            category: changed(&current.category, category),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.description.is_none()
            && self.category.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::EmptyPatch);
        }
        match &self.name {
            Some(n) if n.trim().is_empty() => Err(ValidationError::EmptyName),
            _ => Ok(()),
        }
    }

    /// Store field names touched by this patch, in a stable order.
    pub fn field_paths(&self) -> Vec<&'static str> {
        let mut paths = Vec::with_capacity(4);
        if self.name.is_some() {
            paths.push(FIELD_NAME);
        }
        if self.email.is_some() {
            paths.push(FIELD_EMAIL);
        }
        if self.description.is_some() {
            paths.push(FIELD_DESCRIPTION);
        }
        if self.category.is_some() {
            paths.push(FIELD_CATEGORY);
        }
        paths
    }

    /// Produce the next snapshot of `entry` with this patch applied.
    pub fn apply(&self, entry: &Entry) -> Entry {
        let mut next = entry.clone();
        if let Some(v) = &self.name {
            next.name = v.clone();
        }
        if let Some(v) = &self.email {
            next.email = v.clone();
        }
        if let Some(v) = &self.description {
            next.description = v.clone();
        }
        if let Some(v) = &self.category {
            next.category = v.clone();
        }
        next
    }
}
