use async_trait::async_trait;
use outreach_client::{ClientError, OutreachClient, StatusCode};
use outreach_proto::{Entry, EntryDraft, EntryId, EntryPatch};
use std::sync::Arc;

use super::{EntryStore, GatewayError};

fn map_client_error(id: Option<&EntryId>, err: ClientError) -> GatewayError {
    match (err, id) {
        (ClientError::Http(StatusCode::NOT_FOUND, _, _), Some(id)) => {
            GatewayError::NotFound(id.clone())
        }
        (ClientError::Unauthorized, _) => GatewayError::Unauthorized,
        (err, _) => {
            debug!(?err, "store request failed");
            GatewayError::Store(err.to_string())
        }
    }
}

#[async_trait]
impl EntryStore for OutreachClient {
    async fn create(&self, draft: &EntryDraft, date_created: &str) -> Result<EntryId, GatewayError> {
        self.entry_create(draft, date_created)
            .await
            .map(|entry| entry.id)
            .map_err(|e| map_client_error(None, e))
    }

    async fn update(&self, id: &EntryId, patch: &EntryPatch) -> Result<(), GatewayError> {
        self.entry_update(id, patch)
            .await
            .map_err(|e| map_client_error(Some(id), e))
    }

    async fn delete(&self, id: &EntryId) -> Result<(), GatewayError> {
        self.entry_delete(id)
            .await
            .map_err(|e| map_client_error(Some(id), e))
    }

    async fn list(&self) -> Result<Vec<Entry>, GatewayError> {
        self.entry_list()
            .await
            .map_err(|e| map_client_error(None, e))
    }
}

// The app and the identity provider share one client, so the shared handle
// has to be a store too.
#[async_trait]
impl<T> EntryStore for Arc<T>
where
    T: EntryStore + ?Sized,
{
    async fn create(&self, draft: &EntryDraft, date_created: &str) -> Result<EntryId, GatewayError> {
        (**self).create(draft, date_created).await
    }

    async fn update(&self, id: &EntryId, patch: &EntryPatch) -> Result<(), GatewayError> {
        (**self).update(id, patch).await
    }

    async fn delete(&self, id: &EntryId) -> Result<(), GatewayError> {
        (**self).delete(id).await
    }

    async fn list(&self) -> Result<Vec<Entry>, GatewayError> {
        (**self).list().await
    }
}
