//! Presence channel member records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One presence channel member: created on join, forwarded, never retained.
/// Roster ownership stays with the underlying client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub user_id: String,
    pub user_info: Option<Value>,
}

impl Member {
    pub fn new(user_id: impl Into<String>, user_info: Option<Value>) -> Self {
        Self {
            user_id: user_id.into(),
            user_info,
        }
    }
}
