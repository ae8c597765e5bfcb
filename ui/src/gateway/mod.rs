//! The mutation gateway: the only path from the interaction layer to the
//! document store.
//!
//! Every call may suspend on the network. Callers that cannot do anything
//! useful with a failure go through [`MutationGateway::dispatch`], which logs
//! and swallows it. There is no retry and no idempotency key, so submitting
//! the same draft twice creates two entries.

use async_trait::async_trait;
use outreach_proto::entry::ValidationError;
use outreach_proto::{Entry, EntryDraft, EntryId, EntryPatch};
use thiserror::Error;

use crate::utils::{now_rfc3339, parse_date_created};

pub mod firestore;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid entry: {0}")]
    Invalid(#[from] ValidationError),
    #[error("entry {0} does not exist")]
    NotFound(EntryId),
    #[error("not signed in")]
    Unauthorized,
    #[error("store error: {0}")]
    Store(String),
}

/// A change the interaction layer asks the store to make.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Create(EntryDraft),
    Update(EntryId, EntryPatch),
    Delete(EntryId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    Created(EntryId),
    Updated(EntryId),
    Deleted(EntryId),
    Failed,
}

impl MutationOutcome {
    pub fn succeeded(&self) -> bool {
        !matches!(self, MutationOutcome::Failed)
    }
}

/// The document store operations the gateway needs. `list` is the read side
/// the table refreshes from.
#[async_trait]
pub trait EntryStore: Send + Sync {
    async fn create(&self, draft: &EntryDraft, date_created: &str) -> Result<EntryId, GatewayError>;

    async fn update(&self, id: &EntryId, patch: &EntryPatch) -> Result<(), GatewayError>;

    async fn delete(&self, id: &EntryId) -> Result<(), GatewayError>;

    async fn list(&self) -> Result<Vec<Entry>, GatewayError>;
}

pub struct MutationGateway<S> {
    store: S,
}

impl<S> MutationGateway<S>
where
    S: EntryStore,
{
    pub fn new(store: S) -> Self {
        MutationGateway { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn create(&self, draft: &EntryDraft) -> Result<EntryId, GatewayError> {
        draft.validate()?;
        let stamp = now_rfc3339();
        let id = self.store.create(draft, &stamp).await?;
        info!(entry_id = %id, "entry created");
        Ok(id)
    }

    pub async fn update(&self, id: &EntryId, patch: &EntryPatch) -> Result<(), GatewayError> {
        patch.validate()?;
        self.store.update(id, patch).await?;
        info!(entry_id = %id, fields = ?patch.field_paths(), "entry updated");
        Ok(())
    }

    pub async fn delete(&self, id: &EntryId) -> Result<(), GatewayError> {
        self.store.delete(id).await?;
        info!(entry_id = %id, "entry deleted");
        Ok(())
    }

    /// All entries, oldest first. Entries without a readable creation stamp
    /// sort after the dated ones and keep the store's order among themselves.
    pub async fn list(&self) -> Result<Vec<Entry>, GatewayError> {
        let mut entries = self.store.list().await?;
        entries.sort_by_cached_key(|e| {
            let date = e.date_created.as_deref().and_then(parse_date_created);
            (date.is_none(), date, e.date_created.clone())
        });
        Ok(entries)
    }

    /// Run a mutation and report what happened. Failures are logged and
    /// swallowed; nothing here propagates into rendering.
    pub async fn dispatch(&self, mutation: Mutation) -> MutationOutcome {
        let result = match &mutation {
            Mutation::Create(draft) => self.create(draft).await.map(MutationOutcome::Created),
            Mutation::Update(id, patch) => self
                .update(id, patch)
                .await
                .map(|_| MutationOutcome::Updated(id.clone())),
            Mutation::Delete(id) => self
                .delete(id)
                .await
                .map(|_| MutationOutcome::Deleted(id.clone())),
        };

        match result {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(?err, ?mutation, "mutation failed");
                MutationOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{MemoryStore, StoreCall};

    fn draft(name: &str) -> EntryDraft {
        EntryDraft {
            name: name.to_string(),
            email: "a@b.c".to_string(),
            category: "Technology".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_validates_before_the_store() {
        sketching::test_init();
        let gw = MutationGateway::new(MemoryStore::new());

        let r = gw.create(&draft("   ")).await;
        assert!(matches!(r, Err(GatewayError::Invalid(ValidationError::EmptyName))));
        assert!(gw.store().calls().is_empty());

        let id = gw.create(&draft("Jane")).await.expect("created");
        let stored = gw.store().get(&id).expect("stored");
        assert!(stored.date_created.is_some());
    }

    #[tokio::test]
    async fn test_dispatch_swallows_failures() {
        sketching::test_init();
        let gw = MutationGateway::new(MemoryStore::new());
        gw.store().set_failing(true);

        let outcome = gw.dispatch(Mutation::Create(draft("Jane"))).await;
        assert_eq!(outcome, MutationOutcome::Failed);
        assert!(!outcome.succeeded());
        // the store was still asked exactly once, no retry
        assert_eq!(gw.store().calls().len(), 1);
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_entry() {
        sketching::test_init();
        let gw = MutationGateway::new(MemoryStore::new());
        let ghost = EntryId::new("ghost");

        let patch = EntryPatch {
            name: Some("New".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            gw.update(&ghost, &patch).await,
            Err(GatewayError::NotFound(_))
        ));
        assert!(matches!(gw.delete(&ghost).await, Err(GatewayError::NotFound(_))));

        // an empty patch never reaches the store
        let before = gw.store().calls().len();
        assert!(matches!(
            gw.update(&ghost, &EntryPatch::default()).await,
            Err(GatewayError::Invalid(ValidationError::EmptyPatch))
        ));
        assert_eq!(gw.store().calls().len(), before);
    }

    #[tokio::test]
    async fn test_duplicate_submission_creates_duplicates() {
        let gw = MutationGateway::new(MemoryStore::new());
        let a = gw.dispatch(Mutation::Create(draft("Jane"))).await;
        let b = gw.dispatch(Mutation::Create(draft("Jane"))).await;
        assert_ne!(a, b);
        assert_eq!(gw.list().await.expect("list").len(), 2);
        assert_eq!(
            gw.store()
                .calls()
                .iter()
                .filter(|c| matches!(c, StoreCall::Create(_)))
                .count(),
            2
        );
    }

    #[tokio::test]
    async fn test_list_orders_by_creation() {
        let store = MemoryStore::new();
        for (id, dc) in [
            ("c", Some("2024-03-02T00:00:00Z")),
            ("x", None),
            ("a", Some("2024-01-01T00:00:00Z")),
            ("y", Some("garbage")),
        ] {
            store.insert(Entry {
                id: EntryId::new(id),
                name: id.to_string(),
                email: String::new(),
                description: String::new(),
                category: String::new(),
                user: None,
                userid: None,
                date_created: dc.map(str::to_string),
            });
        }
        let gw = MutationGateway::new(store);
        let ids: Vec<String> = gw
            .list()
            .await
            .expect("list")
            .into_iter()
            .map(|e| e.id.to_string())
            .collect();
        assert_eq!(&ids[..2], &["a".to_string(), "c".to_string()]);
        assert_eq!(ids.len(), 4);
    }
}
