use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// Display information used to decorate activity and feed rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserDisplay {
    pub user_id: UserId,
    pub name: String,
    pub handle: String,
    pub avatar_url: Option<String>,
}
