use outreach_proto::category::resolve;
use outreach_proto::{Entry, EntryId};
use serde::Serialize;
use std::cmp::Reverse;
use std::sync::Arc;

use super::entry_modal::{EntryModal, ModalMsg, ModalView};
use crate::gateway::Mutation;
use crate::utils::format_date_created;

/// The direction the next category sort will use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    fn flip(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }

    fn indicator(self) -> &'static str {
        match self {
            SortOrder::Asc => "▲",
            SortOrder::Desc => "▼",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableMsg {
    ToggleCategorySort,
    Row(EntryId, ModalMsg),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowView {
    pub id: EntryId,
    pub name: String,
    pub email: String,
    pub mailto: String,
    pub user: String,
    pub category: String,
    pub date_created: String,
    pub modal: ModalView,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableView {
    pub headers: Vec<String>,
    pub sort_order: SortOrder,
    pub rows: Vec<RowView>,
}

#[derive(Debug, Clone)]
struct Row {
    entry: Entry,
    modal: EntryModal,
}

impl Row {
    fn new(entry: Entry) -> Self {
        // rows are edited without an acting user
        let modal = EntryModal::edit(entry.clone(), None);
        Row { entry, modal }
    }
}

#[derive(Debug, Default)]
pub struct EntryTable {
    source: Option<Arc<Vec<Entry>>>,
    rows: Vec<Row>,
    sort: SortOrder,
}

impl EntryTable {
    pub fn new() -> Self {
        EntryTable::default()
    }

    /// Mirror a new entry collection. Handing back the same collection is a
    /// no-op; a different one replaces the local rows in the given order.
    /// Returns true when the rows were replaced.
    pub fn set_entries(&mut self, entries: Arc<Vec<Entry>>) -> bool {
        if let Some(current) = &self.source {
            if Arc::ptr_eq(current, &entries) {
                return false;
            }
        }

        let mut previous = std::mem::take(&mut self.rows);
        self.rows = entries
            .iter()
            .map(|entry| {
                // an unchanged snapshot keeps its modal, and whatever was typed into it
                match previous.iter().position(|r| r.entry == *entry) {
                    Some(idx) => previous.swap_remove(idx),
                    None => Row::new(entry.clone()),
                }
            })
            .collect();
        self.source = Some(entries);
        trace!(rows = self.rows.len(), "table resynchronised");
        true
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort
    }

    /// Re-sort the local rows by resolved category name, case-insensitively,
    /// in the current direction, then flip the direction. Equal names keep
    /// their relative order.
    pub fn toggle_category_sort(&mut self) {
        let key = |r: &Row| resolve(&r.entry.category).name.to_lowercase();
        match self.sort {
            SortOrder::Asc => self.rows.sort_by_cached_key(key),
            SortOrder::Desc => self.rows.sort_by_cached_key(|r| Reverse(key(r))),
        }
        self.sort = self.sort.flip();
    }

    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.rows.iter().map(|r| &r.entry)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn update(&mut self, msg: TableMsg) -> Option<Mutation> {
        match msg {
            TableMsg::ToggleCategorySort => {
                self.toggle_category_sort();
                None
            }
            TableMsg::Row(id, msg) => match self.rows.iter_mut().find(|r| r.entry.id == id) {
                Some(row) => row.modal.update(msg),
                None => {
                    warn!(entry_id = %id, "message for a row that is no longer shown");
                    None
                }
            },
        }
    }

    pub fn view(&self) -> TableView {
        let headers = vec![
            "Name".to_string(),
            "Email".to_string(),
            "User".to_string(),
            format!("Category {}", self.sort.indicator()),
            "Date Created".to_string(),
            "Open".to_string(),
        ];

        let rows = self
            .rows
            .iter()
            .map(|Row { entry, modal }| RowView {
                id: entry.id.clone(),
                name: entry.name.clone(),
                email: entry.email.clone(),
                mailto: format!("mailto:{}", entry.email),
                user: entry.user.clone().unwrap_or_default(),
                category: resolve(&entry.category).name.to_string(),
                date_created: format_date_created(entry.date_created.as_deref()),
                modal: modal.view(),
            })
            .collect();

        TableView {
            headers,
            sort_order: self.sort,
            rows,
        }
    }
}
