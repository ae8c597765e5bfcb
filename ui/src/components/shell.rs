use serde::Serialize;
use std::sync::Arc;

use outreach_proto::Entry;

use super::entry_modal::{EntryModal, ModalMsg, ModalView};
use super::entry_table::{EntryTable, TableMsg, TableView};
use crate::gateway::Mutation;
use crate::idprovider::interface::AuthState;
use crate::session::{SessionContext, SignInWidgetConfig};

const APP_TITLE: &str = "Speaker Outreach";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellMsg {
    ToggleDrawer,
    DismissAlert,
    SignOut,
    AddModal(ModalMsg),
    Table(TableMsg),
}

/// Work the shell needs done outside of itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    None,
    Mutate(Mutation),
    SignOut,
}

impl From<Option<Mutation>> for ShellCommand {
    fn from(m: Option<Mutation>) -> Self {
        m.map(ShellCommand::Mutate).unwrap_or(ShellCommand::None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "camelCase")]
pub enum ShellView {
    #[serde(rename_all = "camelCase")]
    SignIn {
        title: String,
        heading: String,
        widget: SignInWidgetConfig,
        alert: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Main {
        title: String,
        banner: String,
        sign_out_label: String,
        drawer_open: bool,
        add_modal: ModalView,
        table: TableView,
        alert: Option<String>,
    },
}

/// The top level view: the sign in surface while signed out, the add
/// control and entry table while signed in.
#[derive(Debug)]
pub struct Shell {
    session: SessionContext,
    widget: SignInWidgetConfig,
    drawer_open: bool,
    alert: Option<String>,
    add_modal: EntryModal,
    table: EntryTable,
}

impl Default for Shell {
    fn default() -> Self {
        Self::new()
    }
}

impl Shell {
    pub fn new() -> Self {
        Shell {
            session: SessionContext::new(),
            widget: SignInWidgetConfig::default(),
            drawer_open: true,
            alert: None,
            add_modal: EntryModal::add(None),
            table: EntryTable::new(),
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn begin_observing(&mut self) {
        self.session.begin_observing();
    }

    /// Apply an observed auth state. On a change the add modal is rebuilt
    /// with a copy of the new user. Entering a session clears any sign-in
    /// alert, leaving one drops the table.
    pub fn apply_session(&mut self, observed: &AuthState) -> bool {
        if !self.session.apply(observed) {
            return false;
        }
        self.add_modal = EntryModal::add(self.session.user());
        if self.session.is_signed_in() {
            self.alert = None;
        } else {
            self.table = EntryTable::new();
        }
        true
    }

    pub fn set_alert(&mut self, alert: Option<String>) {
        if let Some(a) = &alert {
            warn!(alert = %a, "alert raised");
        }
        self.alert = alert;
    }

    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub fn set_entries(&mut self, entries: Arc<Vec<Entry>>) -> bool {
        self.table.set_entries(entries)
    }

    pub fn table(&self) -> &EntryTable {
        &self.table
    }

    pub fn add_modal(&self) -> &EntryModal {
        &self.add_modal
    }

    pub fn update(&mut self, msg: ShellMsg) -> ShellCommand {
        match msg {
            ShellMsg::ToggleDrawer => {
                self.drawer_open = !self.drawer_open;
                ShellCommand::None
            }
            ShellMsg::DismissAlert => {
                self.alert = None;
                ShellCommand::None
            }
            ShellMsg::SignOut => ShellCommand::SignOut,
            ShellMsg::AddModal(_) | ShellMsg::Table(_) if !self.session.is_signed_in() => {
                debug!(?msg, "ignoring message while signed out");
                ShellCommand::None
            }
            ShellMsg::AddModal(m) => self.add_modal.update(m).into(),
            ShellMsg::Table(m) => self.table.update(m).into(),
        }
    }

    pub fn view(&self) -> ShellView {
        match self.session.user() {
            Some(user) => {
                let who = user
                    .display_name
                    .or(user.email)
                    .unwrap_or(user.uid);
                ShellView::Main {
                    title: APP_TITLE.to_string(),
                    banner: format!("Signed in as {}", who),
                    sign_out_label: "Log out".to_string(),
                    drawer_open: self.drawer_open,
                    add_modal: self.add_modal.view(),
                    table: self.table.view(),
                    alert: self.alert.clone(),
                }
            }
            None => ShellView::SignIn {
                title: APP_TITLE.to_string(),
                heading: "Sign in".to_string(),
                widget: self.widget.clone(),
                alert: self.alert.clone(),
            },
        }
    }
}
