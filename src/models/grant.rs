use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::timestamps;

/// Authorization code handed out when an app is installed.
///
/// Only the SHA-256 of the code is stored.
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Identifiable, Insertable)]
#[diesel(table_name = crate::schema::grants)]
pub struct Grant {
    pub id: String,
    pub code_hash: String,
    pub application_id: String,
    pub installation_id: String,
    pub expires_at: String,
    pub created_at: String,
    pub consumed_at: Option<String>,
}

impl Grant {
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        timestamps::is_expired(&self.expires_at, now)
    }
}
