use std::sync::Arc;

use outreach_proto::constants::{ALERT_ACCOUNT_EXISTS, ALERT_EMAIL_IN_USE, CUSTOM_CATEGORY_SENTINEL};
use outreach_proto::{Entry, EntryDraft, EntryId, SignInMethod};
use outreach_ui::components::{ModalMsg, ShellMsg, ShellView, TableMsg, TableView};
use outreach_ui::session::SessionState;
use outreach_ui::testkit::{MemoryStore, MockIdentity, StoreCall};
use outreach_ui::{App, AuthState, MutationOutcome, SignInDecision, SignInRequest};

type TestApp = App<MockIdentity, MemoryStore>;

fn entry(id: &str, category: &str, date_created: Option<&str>) -> Entry {
    Entry {
        id: EntryId::new(id),
        name: format!("Speaker {}", id),
        email: format!("{}@x.com", id),
        description: String::new(),
        category: category.to_string(),
        user: Some("Ann".to_string()),
        userid: Some("uid-1".to_string()),
        date_created: date_created.map(str::to_string),
    }
}

async fn setup(entries: Vec<Entry>) -> (TestApp, Arc<MockIdentity>) {
    sketching::test_init();
    let idp = Arc::new(MockIdentity::new());
    let store = MemoryStore::new();
    for e in entries {
        store.insert(e);
    }
    let mut app = App::new(idp.clone(), store);
    idp.resolve(AuthState::SignedOut);
    app.sync_session().await;
    (app, idp)
}

async fn signed_in(entries: Vec<Entry>) -> (TestApp, Arc<MockIdentity>) {
    let (mut app, idp) = setup(entries).await;
    let decision = app
        .sign_in(SignInRequest::SignUp {
            email: "ann@x.com".to_string(),
            password: "correct horse".to_string(),
            display_name: Some("Ann".to_string()),
        })
        .await;
    assert!(matches!(decision, SignInDecision::Accepted(_)));
    (app, idp)
}

fn table(app: &TestApp) -> TableView {
    match app.view() {
        ShellView::Main { table, .. } => table,
        ShellView::SignIn { .. } => TableView {
            headers: Vec::new(),
            sort_order: Default::default(),
            rows: Vec::new(),
        },
    }
}

fn row_categories(app: &TestApp) -> Vec<String> {
    table(app).rows.into_iter().map(|r| r.category).collect()
}

#[tokio::test]
async fn test_signed_out_until_resolved() {
    sketching::test_init();
    let idp = Arc::new(MockIdentity::new());
    let mut app = App::new(idp.clone(), MemoryStore::new());
    assert_eq!(app.shell().session().state(), &SessionState::Observing);
    assert!(!app.sync_session().await);
    assert!(matches!(app.view(), ShellView::SignIn { .. }));

    idp.resolve(AuthState::SignedOut);
    assert!(app.changed().await);
    assert!(app.sync_session().await);
    assert_eq!(app.shell().session().state(), &SessionState::SignedOut);
}

#[tokio::test]
async fn test_sign_in_loads_the_table() {
    let (app, _idp) = signed_in(vec![
        entry("a", "Technology", Some("2024-03-01T10:00:00Z")),
        entry("b", "Arts", None),
    ])
    .await;

    match app.view() {
        ShellView::Main { banner, .. } => assert_eq!(banner, "Signed in as Ann"),
        ShellView::SignIn { .. } => unreachable!(),
    }
    let t = table(&app);
    assert_eq!(t.rows.len(), 2);
    assert_eq!(t.rows[0].date_created, "3/1/2024");
    assert_eq!(t.rows[1].date_created, "N/A");
}

#[tokio::test]
async fn test_unresolvable_category_renders_fallback() {
    let (app, _idp) = signed_in(vec![
        entry("a", "Keynote", None),
        entry("b", "", None),
        entry("c", "42", None),
        entry("d", "health", None),
    ])
    .await;
    assert_eq!(
        row_categories(&app),
        vec!["Unknown", "Unknown", "Unknown", "Health"]
    );
}

#[tokio::test]
async fn test_category_sort_toggles() {
    let (mut app, _idp) = signed_in(vec![
        entry("a", "Science", None),
        entry("b", "arts", None),
        entry("c", "Keynote", None),
        entry("d", "Business", None),
        entry("e", "Arts", None),
    ])
    .await;

    app.send(ShellMsg::Table(TableMsg::ToggleCategorySort)).await;
    let asc = row_categories(&app);
    assert!(asc.windows(2).all(|w| w[0].to_lowercase() <= w[1].to_lowercase()));

    app.send(ShellMsg::Table(TableMsg::ToggleCategorySort)).await;
    let desc = row_categories(&app);
    assert!(desc.windows(2).all(|w| w[0].to_lowercase() >= w[1].to_lowercase()));

    app.send(ShellMsg::Table(TableMsg::ToggleCategorySort)).await;
    assert_eq!(row_categories(&app), asc);
}

#[tokio::test]
async fn test_custom_category_then_predefined() {
    let (mut app, _idp) = signed_in(Vec::new()).await;

    app.send(ShellMsg::AddModal(ModalMsg::SelectCategory(
        CUSTOM_CATEGORY_SENTINEL.to_string(),
    )))
    .await;
    app.send(ShellMsg::AddModal(ModalMsg::SetCustomCategory(
        "Keynote".to_string(),
    )))
    .await;
    assert!(app.shell().add_modal().is_custom());
    assert_eq!(app.shell().add_modal().effective_category(), "Keynote");

    app.send(ShellMsg::AddModal(ModalMsg::SelectCategory(
        "Technology".to_string(),
    )))
    .await;
    assert!(!app.shell().add_modal().is_custom());
    assert_eq!(app.shell().add_modal().effective_category(), "Technology");
}

async fn fill_and_submit(app: &mut TestApp) -> Option<MutationOutcome> {
    app.send(ShellMsg::AddModal(ModalMsg::Open)).await;
    assert!(app.shell().add_modal().is_open());
    for msg in [
        ModalMsg::SetName("Jane Doe".to_string()),
        ModalMsg::SetEmail("jane@x.com".to_string()),
        ModalMsg::SetDescription(String::new()),
        ModalMsg::SelectCategory("Technology".to_string()),
    ] {
        app.send(ShellMsg::AddModal(msg)).await;
    }
    app.send(ShellMsg::AddModal(ModalMsg::Submit)).await
}

fn creates(app: &TestApp) -> Vec<EntryDraft> {
    app.gateway()
        .store()
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            StoreCall::Create(d) => Some(d),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_add_submit_creates_once_and_closes() {
    let (mut app, _idp) = signed_in(Vec::new()).await;

    let outcome = fill_and_submit(&mut app).await;
    assert!(matches!(outcome, Some(MutationOutcome::Created(_))));
    assert!(!app.shell().add_modal().is_open());

    let drafts = creates(&app);
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0].name, "Jane Doe");
    assert_eq!(drafts[0].email, "jane@x.com");
    assert_eq!(drafts[0].description, "");
    assert_eq!(drafts[0].category, "Technology");
    assert_eq!(drafts[0].user.as_deref(), Some("Ann"));
    assert!(drafts[0].userid.is_some());

    // the table was refreshed with the new entry
    let t = table(&app);
    assert_eq!(t.rows.len(), 1);
    assert_eq!(t.rows[0].name, "Jane Doe");
    assert_ne!(t.rows[0].date_created, "N/A");
}

#[tokio::test]
async fn test_add_submit_closes_on_failure() {
    let (mut app, _idp) = signed_in(Vec::new()).await;
    app.gateway().store().set_failing(true);

    let outcome = fill_and_submit(&mut app).await;
    assert_eq!(outcome, Some(MutationOutcome::Failed));
    assert!(!app.shell().add_modal().is_open());
    assert_eq!(creates(&app).len(), 1);
    assert!(app.gateway().store().is_empty());
    // failures are not surfaced to the user
    assert_eq!(app.shell().alert(), None);
}

#[tokio::test]
async fn test_edit_and_delete_from_a_row() {
    let (mut app, _idp) = signed_in(vec![entry("a", "Arts", None)]).await;
    let id = EntryId::new("a");

    app.send(ShellMsg::Table(TableMsg::Row(id.clone(), ModalMsg::Open)))
        .await;
    app.send(ShellMsg::Table(TableMsg::Row(
        id.clone(),
        ModalMsg::SetName("Dr Speaker".to_string()),
    )))
    .await;
    let outcome = app
        .send(ShellMsg::Table(TableMsg::Row(id.clone(), ModalMsg::Submit)))
        .await;
    assert_eq!(outcome, Some(MutationOutcome::Updated(id.clone())));

    let stored = app.gateway().store().get(&id).expect("still stored");
    assert_eq!(stored.name, "Dr Speaker");
    // attribution is not touched by an edit
    assert_eq!(stored.user.as_deref(), Some("Ann"));
    assert_eq!(table(&app).rows[0].name, "Dr Speaker");

    let outcome = app
        .send(ShellMsg::Table(TableMsg::Row(id.clone(), ModalMsg::Delete)))
        .await;
    assert_eq!(outcome, Some(MutationOutcome::Deleted(id)));
    assert!(table(&app).rows.is_empty());
}

#[tokio::test]
async fn test_password_sign_up_over_federated_email_is_blocked() {
    let (mut app, idp) = setup(Vec::new()).await;
    idp.register("sso@x.com", "", vec![SignInMethod::google()]);
    idp.set_allow_shadow_accounts(true);

    let decision = app
        .sign_in(SignInRequest::SignUp {
            email: "sso@x.com".to_string(),
            password: "hunter2hunter2".to_string(),
            display_name: None,
        })
        .await;

    assert_eq!(
        decision,
        SignInDecision::Blocked {
            alert: ALERT_ACCOUNT_EXISTS.to_string()
        }
    );
    assert_eq!(idp.sign_out_count(), 1);
    assert_eq!(app.shell().session().state(), &SessionState::SignedOut);
    match app.view() {
        ShellView::SignIn { alert, .. } => assert_eq!(alert.as_deref(), Some(ALERT_ACCOUNT_EXISTS)),
        ShellView::Main { .. } => unreachable!(),
    }
    // the table was never loaded
    assert!(!app
        .gateway()
        .store()
        .calls()
        .contains(&StoreCall::List));
}

#[tokio::test]
async fn test_alert_cleared_once_signed_in() {
    let (mut app, idp) = setup(Vec::new()).await;
    idp.register("sso@x.com", "", vec![SignInMethod::google()]);
    idp.set_allow_shadow_accounts(true);

    app.sign_in(SignInRequest::SignUp {
        email: "sso@x.com".to_string(),
        password: "hunter2hunter2".to_string(),
        display_name: None,
    })
    .await;
    assert_eq!(app.shell().alert(), Some(ALERT_ACCOUNT_EXISTS));

    let decision = app
        .sign_in(SignInRequest::Federated {
            provider_id: "google.com".to_string(),
            id_token: "sso@x.com".to_string(),
        })
        .await;
    assert!(matches!(decision, SignInDecision::Accepted(_)));
    match app.view() {
        ShellView::Main { alert, .. } => assert_eq!(alert, None),
        ShellView::SignIn { .. } => unreachable!(),
    }
}

#[tokio::test]
async fn test_federated_sign_in_is_not_blocked() {
    let (mut app, idp) = setup(Vec::new()).await;
    idp.register("sso@x.com", "", vec![SignInMethod::google()]);

    let decision = app
        .sign_in(SignInRequest::Federated {
            provider_id: "google.com".to_string(),
            id_token: "sso@x.com".to_string(),
        })
        .await;
    assert!(matches!(decision, SignInDecision::Accepted(_)));
    assert!(app.shell().session().is_signed_in());
}

#[tokio::test]
async fn test_email_in_use_failure_alerts_and_signs_out() {
    let (mut app, idp) = setup(Vec::new()).await;
    idp.register("taken@x.com", "pw", vec![SignInMethod::Password]);

    let decision = app
        .sign_in(SignInRequest::SignUp {
            email: "taken@x.com".to_string(),
            password: "whatever".to_string(),
            display_name: None,
        })
        .await;
    assert_eq!(decision.alert(), Some(ALERT_EMAIL_IN_USE));
    assert_eq!(idp.sign_out_count(), 1);
    assert!(!app.shell().session().is_signed_in());
    assert_eq!(app.shell().alert(), Some(ALERT_EMAIL_IN_USE));

    app.send(ShellMsg::DismissAlert).await;
    assert_eq!(app.shell().alert(), None);
}

#[tokio::test]
async fn test_wrong_password_is_logged_only() {
    let (mut app, idp) = setup(Vec::new()).await;
    idp.register("ann@x.com", "pw", vec![SignInMethod::Password]);

    let decision = app
        .sign_in(SignInRequest::Password {
            email: "ann@x.com".to_string(),
            password: "nope".to_string(),
        })
        .await;
    assert_eq!(decision, SignInDecision::Failed { alert: None });
    assert_eq!(idp.sign_out_count(), 0);
    assert_eq!(app.shell().alert(), None);
}

#[tokio::test]
async fn test_lookup_failure_leaves_session_as_observed() {
    let (mut app, idp) = setup(Vec::new()).await;
    idp.register("sso@x.com", "", vec![SignInMethod::google()]);
    idp.set_allow_shadow_accounts(true);
    idp.set_lookup_failing(true);

    let decision = app
        .sign_in(SignInRequest::SignUp {
            email: "sso@x.com".to_string(),
            password: "hunter2hunter2".to_string(),
            display_name: None,
        })
        .await;
    assert_eq!(decision, SignInDecision::Indeterminate);
    assert_eq!(idp.sign_out_count(), 0);
    assert!(app.shell().session().is_signed_in());
}

#[tokio::test]
async fn test_sign_out_returns_to_sign_in() {
    let (mut app, idp) = signed_in(vec![entry("a", "Arts", None)]).await;
    assert_eq!(table(&app).rows.len(), 1);

    app.send(ShellMsg::SignOut).await;
    assert_eq!(idp.sign_out_count(), 1);
    assert!(matches!(app.view(), ShellView::SignIn { .. }));
    assert!(app.shell().table().is_empty());
}
