use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::timestamps;

/// Issued bearer credential. The access and refresh values are kept as hashes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Queryable, Identifiable, Insertable)]
#[diesel(table_name = crate::schema::tokens)]
pub struct Token {
    pub id: String,
    pub token_hash: String,
    pub refresh_token_hash: String,
    pub user_id: String,
    pub application_id: String,
    pub scopes: String,
    pub expires_at: String,
    pub created_at: String,
}

impl Token {
    pub fn scope_list(&self) -> Vec<String> {
        super::split_scopes(&self.scopes)
    }

    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        timestamps::is_expired(&self.expires_at, now)
    }
}
