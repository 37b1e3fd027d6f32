//! Read-only lookups: user directory, worksheets, feedback

use serde_json::Value;

use crate::store::{DocumentStore, FEEDBACK, USERS, WORKSHEETS};
use crate::types::{
    decode, DashError, FeedbackFields, FeedbackRecord, Result, UserRecord, UserSummary, Worksheet,
    WorksheetFields, NO_NAME,
};

/// Every user as an `(id, display name)` pair, sorted by name then id
pub fn list_users(store: &dyn DocumentStore) -> Result<Vec<UserSummary>> {
    let mut users: Vec<UserSummary> = store
        .stream_collection(USERS)?
        .into_iter()
        .map(|(id, doc)| UserSummary {
            display_name: doc
                .get("displayName")
                .and_then(Value::as_str)
                .unwrap_or(NO_NAME)
                .to_string(),
            id,
        })
        .collect();
    users.sort_by(|a, b| {
        a.display_name
            .cmp(&b.display_name)
            .then_with(|| a.id.cmp(&b.id))
    });
    Ok(users)
}

/// A single user's account fields, `None` when the user does not exist
pub fn user_record(store: &dyn DocumentStore, user_id: &str) -> Result<Option<UserRecord>> {
    store
        .get_document(USERS, user_id)?
        .map(|doc| decode(doc, &format!("{}/{}", USERS, user_id)))
        .transpose()
}

/// Worksheets owned by a user, ordered by id; empty when they have none
pub fn worksheets(store: &dyn DocumentStore, user_id: &str) -> Result<Vec<Worksheet>> {
    let Some(doc) = store.get_document(WORKSHEETS, user_id)? else {
        return Ok(Vec::new());
    };

    let mut sheets = doc
        .into_iter()
        .map(|(id, value)| -> Result<Worksheet> {
            let fields: WorksheetFields = serde_json::from_value(value).map_err(|e| {
                DashError::Parse(format!("{}/{}/{}: {}", WORKSHEETS, user_id, id, e))
            })?;
            Ok(Worksheet::from_fields(id, fields))
        })
        .collect::<Result<Vec<_>>>()?;
    sheets.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(sheets)
}

/// All feedback records in id order
pub fn feedback(store: &dyn DocumentStore) -> Result<Vec<FeedbackRecord>> {
    store
        .stream_collection(FEEDBACK)?
        .into_iter()
        .map(|(id, doc)| -> Result<FeedbackRecord> {
            let fields: FeedbackFields = decode(doc, &format!("{}/{}", FEEDBACK, id))?;
            Ok(FeedbackRecord {
                id,
                dialog: fields.dialog,
                feedback_type: fields.feedback_type,
            })
        })
        .collect()
}
