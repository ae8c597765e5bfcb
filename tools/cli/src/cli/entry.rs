use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};
use outreach_proto::category::{categories as predefined_categories, lookup};
use outreach_proto::constants::CUSTOM_CATEGORY_SENTINEL;
use outreach_proto::EntryId;
use outreach_ui::components::{ModalMsg, RowView, ShellMsg, TableMsg, TableView};
use outreach_ui::MutationOutcome;

use crate::common::CliApp;
use crate::{AddOpt, CommonOpt, DeleteOpt, EditOpt, EntryFieldsOpt, ListOpt, OutputMode, SortDirection};

const CUSTOM_CATEGORY_LABEL: &str = "Custom Category";

/// The form messages that pick `category`: a predefined one by its name,
/// anything else as custom text.
fn category_msgs(category: &str) -> Vec<ModalMsg> {
    match lookup(category) {
        Some(c) => vec![ModalMsg::SelectCategory(c.name.to_string())],
        None => vec![
            ModalMsg::SelectCategory(CUSTOM_CATEGORY_SENTINEL.to_string()),
            ModalMsg::SetCustomCategory(category.to_string()),
        ],
    }
}

fn field_msgs(fields: &EntryFieldsOpt) -> Vec<ModalMsg> {
    let mut msgs = Vec::new();
    if let Some(v) = &fields.name {
        msgs.push(ModalMsg::SetName(v.clone()));
    }
    if let Some(v) = &fields.email {
        msgs.push(ModalMsg::SetEmail(v.clone()));
    }
    if let Some(v) = &fields.description {
        msgs.push(ModalMsg::SetDescription(v.clone()));
    }
    if let Some(v) = &fields.category {
        msgs.extend(category_msgs(v));
    }
    msgs
}

fn prompt_text(prompt: &str, allow_empty: bool) -> String {
    Input::<String>::new()
        .with_prompt(prompt)
        .allow_empty(allow_empty)
        .interact_text()
        .unwrap_or_else(|e| {
            error!("Failed to interact with interactive session -- {:?}", e);
            std::process::exit(1);
        })
}

fn prompt_category() -> String {
    let mut items: Vec<&str> = predefined_categories().iter().map(|c| c.name).collect();
    items.push(CUSTOM_CATEGORY_LABEL);

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Category")
        .default(0)
        .items(&items)
        .interact()
        .unwrap_or_else(|e| {
            error!("Failed to handle user input: {:?}", e);
            std::process::exit(1);
        });
    debug!("Index of the chosen menu item: {:?}", selection);

    match predefined_categories().get(selection) {
        Some(c) => c.name.to_string(),
        None => prompt_text("Custom category", false),
    }
}

/// Fill in whatever was not given on the command line.
fn complete_fields(fields: &EntryFieldsOpt) -> EntryFieldsOpt {
    EntryFieldsOpt {
        name: Some(fields.name.clone().unwrap_or_else(|| prompt_text("Name", false))),
        email: Some(
            fields
                .email
                .clone()
                .unwrap_or_else(|| prompt_text("Email", false)),
        ),
        description: Some(
            fields
                .description
                .clone()
                .unwrap_or_else(|| prompt_text("Description", true)),
        ),
        category: Some(fields.category.clone().unwrap_or_else(prompt_category)),
    }
}

fn row_text(row: &RowView) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}\t{}",
        row.id, row.name, row.email, row.user, row.category, row.date_created
    )
}

fn print_table(output_mode: OutputMode, table: &TableView) {
    match output_mode {
        OutputMode::Json => match serde_json::to_string(table) {
            Ok(s) => println!("{}", s),
            Err(e) => {
                error!("Failed to serialise table -- {:?}", e);
                std::process::exit(1);
            }
        },
        OutputMode::Text => {
            println!("Id\t{}", table.headers.join("\t"));
            for row in table.rows.iter() {
                println!("{}", row_text(row));
            }
        }
    }
}

fn report(outcome: Option<MutationOutcome>) {
    match outcome {
        Some(MutationOutcome::Created(id)) => println!("Created entry {}", id),
        Some(MutationOutcome::Updated(id)) => println!("Updated entry {}", id),
        Some(MutationOutcome::Deleted(id)) => println!("Deleted entry {}", id),
        Some(MutationOutcome::Failed) => {
            error!("The change was not saved");
            std::process::exit(1);
        }
        None => println!("No changes to save"),
    }
}

fn require_row(app: &CliApp, id: &EntryId) {
    if !app.shell().table().entries().any(|e| &e.id == id) {
        error!("No entry with id {}", id);
        std::process::exit(1);
    }
}

impl ListOpt {
    pub async fn exec(&self) {
        let (mut app, _) = self.copt.to_app().await;

        // the first toggle sorts ascending, the second descending
        let toggles = match self.sort {
            None => 0,
            Some(SortDirection::Asc) => 1,
            Some(SortDirection::Desc) => 2,
        };
        for _ in 0..toggles {
            app.send(ShellMsg::Table(TableMsg::ToggleCategorySort)).await;
        }

        print_table(self.copt.output_mode, &app.shell().table().view());
    }
}

impl AddOpt {
    pub async fn exec(&self) {
        let (mut app, _) = self.copt.to_app().await;
        let fields = complete_fields(&self.fields);

        app.send(ShellMsg::AddModal(ModalMsg::Open)).await;
        for msg in field_msgs(&fields) {
            app.send(ShellMsg::AddModal(msg)).await;
        }
        report(app.send(ShellMsg::AddModal(ModalMsg::Submit)).await);
    }
}

impl EditOpt {
    pub async fn exec(&self) {
        if self.fields.is_empty() {
            error!("Nothing to change, give at least one of --name, --email, --description or --category");
            std::process::exit(1);
        }

        let (mut app, _) = self.copt.to_app().await;
        let id = EntryId::new(self.id.as_str());
        require_row(&app, &id);

        app.send(ShellMsg::Table(TableMsg::Row(id.clone(), ModalMsg::Open)))
            .await;
        for msg in field_msgs(&self.fields) {
            app.send(ShellMsg::Table(TableMsg::Row(id.clone(), msg))).await;
        }
        report(
            app.send(ShellMsg::Table(TableMsg::Row(id, ModalMsg::Submit)))
                .await,
        );
    }
}

impl DeleteOpt {
    pub async fn exec(&self) {
        let (mut app, _) = self.copt.to_app().await;
        let id = EntryId::new(self.id.as_str());
        require_row(&app, &id);

        if !self.yes
            && !Confirm::new()
                .with_prompt(format!("Delete entry {}?", id))
                .default(false)
                .interact()
                .unwrap_or_else(|e| {
                    error!("Failed to interact with interactive session -- {:?}", e);
                    std::process::exit(1);
                })
        {
            println!("Not deleting {}", id);
            return;
        }

        report(
            app.send(ShellMsg::Table(TableMsg::Row(id, ModalMsg::Delete)))
                .await,
        );
    }
}

pub fn categories(copt: &CommonOpt) {
    match copt.output_mode {
        OutputMode::Json => match serde_json::to_string(predefined_categories()) {
            Ok(s) => println!("{}", s),
            Err(e) => error!("Failed to serialise categories -- {:?}", e),
        },
        OutputMode::Text => {
            for c in predefined_categories() {
                println!("{}: {}", c.id, c.name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_category_selects_by_name() {
        assert_eq!(
            category_msgs("technology"),
            vec![ModalMsg::SelectCategory("Technology".to_string())]
        );
        assert_eq!(
            category_msgs("1"),
            vec![ModalMsg::SelectCategory(predefined_categories()[0].name.to_string())]
        );
    }

    #[test]
    fn test_other_category_is_custom() {
        assert_eq!(
            category_msgs("Keynote"),
            vec![
                ModalMsg::SelectCategory(CUSTOM_CATEGORY_SENTINEL.to_string()),
                ModalMsg::SetCustomCategory("Keynote".to_string()),
            ]
        );
    }

    #[test]
    fn test_field_msgs_only_for_given_fields() {
        let fields = EntryFieldsOpt {
            name: None,
            email: Some("a@example.com".to_string()),
            description: None,
            category: None,
        };
        assert_eq!(
            field_msgs(&fields),
            vec![ModalMsg::SetEmail("a@example.com".to_string())]
        );
    }
}
