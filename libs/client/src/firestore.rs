//! Entry CRUD against the Firestore REST document API.
//!
//! Documents carry their fields as typed value maps
//! (`{"name": {"stringValue": "Jane"}}`). Decoding is lenient: a field that
//! is missing, null, or of an unexpected type is read as absent rather than
//! failing the whole document, so one odd record can never break a listing.

use std::collections::BTreeMap;

use outreach_proto::constants::{
    DEFAULT_LIST_PAGE_SIZE, FIELD_CATEGORY, FIELD_DATE_CREATED, FIELD_DESCRIPTION, FIELD_EMAIL,
    FIELD_NAME, FIELD_USER, FIELD_USERID,
};
use outreach_proto::{Entry, EntryDraft, EntryId, EntryPatch};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{ClientError, OutreachClient};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<Document>,
    #[serde(default)]
    next_page_token: Option<String>,
}

fn string_value(s: &str) -> Value {
    json!({ "stringValue": s })
}

fn optional_string_value(s: Option<&str>) -> Value {
    match s {
        Some(s) => string_value(s),
        None => json!({ "nullValue": null }),
    }
}

impl Document {
    pub(crate) fn from_draft(draft: &EntryDraft, date_created: &str) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(FIELD_NAME.to_string(), string_value(&draft.name));
        fields.insert(FIELD_EMAIL.to_string(), string_value(&draft.email));
        fields.insert(
            FIELD_DESCRIPTION.to_string(),
            string_value(&draft.description),
        );
        fields.insert(FIELD_CATEGORY.to_string(), string_value(&draft.category));
        fields.insert(
            FIELD_USER.to_string(),
            optional_string_value(draft.user.as_deref()),
        );
        fields.insert(
            FIELD_USERID.to_string(),
            optional_string_value(draft.userid.as_deref()),
        );
        fields.insert(
            FIELD_DATE_CREATED.to_string(),
            json!({ "timestampValue": date_created }),
        );

        Document {
            fields,
            ..Default::default()
        }
    }

    pub(crate) fn from_patch(patch: &EntryPatch) -> Self {
        let mut fields = BTreeMap::new();
        let pairs = [
            (FIELD_NAME, &patch.name),
            (FIELD_EMAIL, &patch.email),
            (FIELD_DESCRIPTION, &patch.description),
            (FIELD_CATEGORY, &patch.category),
        ];
        for (field, value) in pairs {
            if let Some(v) = value {
                fields.insert(field.to_string(), string_value(v));
            }
        }

        Document {
            fields,
            ..Default::default()
        }
    }

    /// The document id is the final segment of its resource name.
    pub fn id(&self) -> Option<&str> {
        self.name.rsplit('/').next().filter(|s| !s.is_empty())
    }

    fn text(&self, field: &str) -> Option<String> {
        let value = self.fields.get(field)?.as_object()?;
        ["stringValue", "timestampValue", "integerValue"]
            .iter()
            .find_map(|k| value.get(*k).and_then(Value::as_str))
            .map(str::to_string)
    }

    pub fn into_entry(self) -> Result<Entry, ClientError> {
        let id = self.id().map(EntryId::new).ok_or_else(|| {
            ClientError::InvalidResponse(format!("document without a name: {:?}", self.fields))
        })?;

        Ok(Entry {
            id,
            name: self.text(FIELD_NAME).unwrap_or_default(),
            email: self.text(FIELD_EMAIL).unwrap_or_default(),
            description: self.text(FIELD_DESCRIPTION).unwrap_or_default(),
            category: self.text(FIELD_CATEGORY).unwrap_or_default(),
            user: self.text(FIELD_USER),
            userid: self.text(FIELD_USERID),
            date_created: self.text(FIELD_DATE_CREATED),
        })
    }
}

impl OutreachClient {
    /// Create a document for `draft`. The store assigns the id.
    pub async fn entry_create(
        &self,
        draft: &EntryDraft,
        date_created: &str,
    ) -> Result<Entry, ClientError> {
        let doc = Document::from_draft(draft, date_created);
        let dest = self.make_document_url(None);
        let created: Document = self.perform_post_request(&dest, &doc).await?;
        created.into_entry()
    }

    /// Apply `patch` to an existing document. Fails with 404 if the entry is
    /// gone rather than silently recreating it.
    pub async fn entry_update(&self, id: &EntryId, patch: &EntryPatch) -> Result<(), ClientError> {
        let doc = Document::from_patch(patch);
        let dest = self.make_document_url(Some(id.as_str()));

        let mut query: Vec<(&str, String)> = patch
            .field_paths()
            .into_iter()
            .map(|f| ("updateMask.fieldPaths", f.to_string()))
            .collect();
        query.push(("currentDocument.exists", "true".to_string()));

        let _: Document = self.perform_patch_request(&dest, &query, &doc).await?;
        Ok(())
    }

    pub async fn entry_delete(&self, id: &EntryId) -> Result<(), ClientError> {
        let dest = self.make_document_url(Some(id.as_str()));
        self.perform_delete_request(&dest, &[("currentDocument.exists", "true".to_string())])
            .await
    }

    pub async fn entry_get(&self, id: &EntryId) -> Result<Option<Entry>, ClientError> {
        let dest = self.make_document_url(Some(id.as_str()));
        match self.perform_get_request::<Document>(&dest, &[]).await {
            Ok(doc) => doc.into_entry().map(Some),
            Err(ClientError::Http(reqwest::StatusCode::NOT_FOUND, _, _)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Walk every page of the collection.
    pub async fn entry_list(&self) -> Result<Vec<Entry>, ClientError> {
        let dest = self.make_document_url(None);
        let mut entries = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("pageSize", DEFAULT_LIST_PAGE_SIZE.to_string())];
            if let Some(t) = page_token.take() {
                query.push(("pageToken", t));
            }

            let page: ListDocumentsResponse = self.perform_get_request(&dest, &query).await?;
            trace!(count = page.documents.len(), "entry page");

            for doc in page.documents {
                match doc.into_entry() {
                    Ok(e) => entries.push(e),
                    Err(err) => warn!(?err, "skipping undecodable document"),
                }
            }

            match page.next_page_token {
                Some(t) if !t.is_empty() => page_token = Some(t),
                _ => break,
            }
        }

        debug!(count = entries.len(), "listed entries");
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_encoding() {
        let draft = EntryDraft {
            name: "Jane Doe".to_string(),
            email: "jane@x.com".to_string(),
            description: String::new(),
            category: "Technology".to_string(),
            user: Some("Ann Admin".to_string()),
            userid: None,
        };
        let doc = Document::from_draft(&draft, "2024-03-01T10:00:00Z");
        let v = serde_json::to_value(&doc).expect("encode");

        assert_eq!(
            v,
            json!({
                "fields": {
                    "name": { "stringValue": "Jane Doe" },
                    "email": { "stringValue": "jane@x.com" },
                    "description": { "stringValue": "" },
                    "category": { "stringValue": "Technology" },
                    "user": { "stringValue": "Ann Admin" },
                    "userid": { "nullValue": null },
                    "dateCreated": { "timestampValue": "2024-03-01T10:00:00Z" }
                }
            })
        );
    }

    #[test]
    fn test_patch_encoding_only_changed_fields() {
        let patch = EntryPatch {
            email: Some("new@x.com".to_string()),
            ..Default::default()
        };
        let v = serde_json::to_value(Document::from_patch(&patch)).expect("encode");
        assert_eq!(
            v,
            json!({ "fields": { "email": { "stringValue": "new@x.com" } } })
        );
    }

    #[test]
    fn test_document_decoding_is_lenient() {
        let doc: Document = serde_json::from_value(json!({
            "name": "projects/p/databases/(default)/documents/entries/AbC123",
            "fields": {
                "name": { "stringValue": "Jane Doe" },
                "category": { "stringValue": "Keynote" },
                "user": { "nullValue": null },
                "email": { "mapValue": { "fields": {} } },
                "dateCreated": { "timestampValue": "2024-03-01T10:00:00.123Z" }
            },
            "createTime": "2024-03-01T10:00:00.123Z",
            "updateTime": "2024-03-01T10:00:00.123Z"
        }))
        .expect("decode");

        let e = doc.into_entry().expect("entry");
        assert_eq!(e.id.as_str(), "AbC123");
        assert_eq!(e.name, "Jane Doe");
        assert_eq!(e.email, "");
        assert_eq!(e.category, "Keynote");
        assert_eq!(e.user, None);
        assert_eq!(e.date_created.as_deref(), Some("2024-03-01T10:00:00.123Z"));
    }

    #[test]
    fn test_document_without_name_is_rejected() {
        let doc = Document::default();
        assert!(matches!(doc.into_entry(), Err(ClientError::InvalidResponse(_))));
    }

    #[test]
    fn test_list_response_decoding() {
        let empty: ListDocumentsResponse = serde_json::from_value(json!({})).expect("decode");
        assert!(empty.documents.is_empty());
        assert!(empty.next_page_token.is_none());
    }
}
