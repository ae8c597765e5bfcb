use outreach_proto::category::{categories, lookup};
use outreach_proto::constants::CUSTOM_CATEGORY_SENTINEL;
use outreach_proto::{Entry, EntryDraft, EntryPatch, SessionUser};
use serde::Serialize;

use crate::gateway::Mutation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalKind {
    Add,
    /// Editing the snapshot the modal was built from.
    Edit(Entry),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalMsg {
    Open,
    Close,
    SetName(String),
    SetEmail(String),
    SetDescription(String),
    /// A value from the category select: a category name, or the custom
    /// sentinel.
    SelectCategory(String),
    SetCustomCategory(String),
    Submit,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryOption {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModalView {
    pub open: bool,
    /// Label of the button that opens the modal.
    pub trigger_label: String,
    pub title: String,
    pub name: String,
    pub email: String,
    pub description: String,
    pub category_select: String,
    pub category_options: Vec<CategoryOption>,
    /// Present only while in custom category mode.
    pub custom_category: Option<String>,
    pub submit_label: String,
    pub can_delete: bool,
}

/// The add/edit entry form.
///
/// Fields are seeded once, when the modal is built. Opening and closing do
/// not reset them, so an edit modal reopened after a cancelled edit shows
/// what was typed last.
#[derive(Debug, Clone)]
pub struct EntryModal {
    kind: ModalKind,
    user: Option<SessionUser>,
    open: bool,
    name: String,
    email: String,
    description: String,
    category: String,
    custom_mode: bool,
    custom_category: String,
}

impl EntryModal {
    pub fn add(user: Option<SessionUser>) -> Self {
        EntryModal {
            kind: ModalKind::Add,
            user,
            open: false,
            name: String::new(),
            email: String::new(),
            description: String::new(),
            category: String::new(),
            custom_mode: false,
            custom_category: String::new(),
        }
    }

    /// An edit modal seeded from `entry`. A stored category that is not one
    /// of the predefined ones starts the form in custom mode.
    pub fn edit(entry: Entry, user: Option<SessionUser>) -> Self {
        let stored = entry.category.clone();
        let custom_mode = !stored.trim().is_empty() && lookup(&stored).is_none();

        EntryModal {
            user,
            open: false,
            name: entry.name.clone(),
            email: entry.email.clone(),
            description: entry.description.clone(),
            category: stored.clone(),
            custom_mode,
            custom_category: if custom_mode { stored } else { String::new() },
            kind: ModalKind::Edit(entry),
        }
    }

    pub fn kind(&self) -> &ModalKind {
        &self.kind
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_custom(&self) -> bool {
        self.custom_mode
    }

    /// The category a submit would store.
    pub fn effective_category(&self) -> &str {
        &self.category
    }

    fn draft(&self) -> EntryDraft {
        EntryDraft {
            name: self.name.clone(),
            email: self.email.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
            user: self.user.as_ref().and_then(|u| u.display_name.clone()),
            userid: self.user.as_ref().map(|u| u.uid.clone()),
        }
    }

    pub fn update(&mut self, msg: ModalMsg) -> Option<Mutation> {
        match msg {
            ModalMsg::Open => {
                self.open = true;
                None
            }
            ModalMsg::Close => {
                self.open = false;
                None
            }
            ModalMsg::SetName(v) => {
                self.name = v;
                None
            }
            ModalMsg::SetEmail(v) => {
                self.email = v;
                None
            }
            ModalMsg::SetDescription(v) => {
                self.description = v;
                None
            }
            ModalMsg::SelectCategory(v) => {
                if v == CUSTOM_CATEGORY_SENTINEL {
                    // the custom field takes over, with whatever it last held
                    self.custom_mode = true;
                    self.category = self.custom_category.clone();
                } else {
                    self.custom_mode = false;
                    self.category = v;
                }
                None
            }
            ModalMsg::SetCustomCategory(v) => {
                self.category = v.clone();
                self.custom_category = v;
                None
            }
            ModalMsg::Submit => {
                // close first, the outcome of the mutation never reopens us
                self.open = false;
                match &self.kind {
                    ModalKind::Add => Some(Mutation::Create(self.draft())),
                    ModalKind::Edit(entry) => {
                        let patch = EntryPatch::diff(
                            entry,
                            &self.name,
                            &self.email,
                            &self.description,
                            &self.category,
                        );
                        if patch.is_empty() {
                            debug!(entry_id = %entry.id, "no changes to save");
                            None
                        } else {
                            Some(Mutation::Update(entry.id.clone(), patch))
                        }
                    }
                }
            }
            ModalMsg::Delete => match &self.kind {
                ModalKind::Edit(entry) => {
                    self.open = false;
                    Some(Mutation::Delete(entry.id.clone()))
                }
                ModalKind::Add => None,
            },
        }
    }

    pub fn view(&self) -> ModalView {
        let (trigger_label, title, submit_label) = match &self.kind {
            ModalKind::Add => ("Add Entry", "Add Entry".to_string(), "Add Entry"),
            ModalKind::Edit(entry) => ("Open", entry.name.clone(), "Save Entry"),
        };

        let mut category_options: Vec<CategoryOption> = categories()
            .iter()
            .map(|c| CategoryOption {
                value: c.name.to_string(),
                label: c.name.to_string(),
            })
            .collect();
        category_options.push(CategoryOption {
            value: CUSTOM_CATEGORY_SENTINEL.to_string(),
            label: "Custom Category".to_string(),
        });

        ModalView {
            open: self.open,
            trigger_label: trigger_label.to_string(),
            title,
            name: self.name.clone(),
            email: self.email.clone(),
            description: self.description.clone(),
            category_select: if self.custom_mode {
                CUSTOM_CATEGORY_SENTINEL.to_string()
            } else {
                // stored ids and odd casing still select the right option
                lookup(&self.category)
                    .map(|c| c.name.to_string())
                    .unwrap_or_else(|| self.category.clone())
            },
            category_options,
            custom_category: self.custom_mode.then(|| self.custom_category.clone()),
            submit_label: submit_label.to_string(),
            can_delete: matches!(self.kind, ModalKind::Edit(_)),
        }
    }
}
