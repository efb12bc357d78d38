use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// A third-party app that organizations can install.
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Identifiable, Insertable, AsChangeset)]
#[diesel(table_name = crate::schema::apps)]
pub struct App {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub application_id: String,
    pub proxy_user_id: String,
    pub scopes: String,
    pub created_at: String,
    pub updated_at: String,
}

impl App {
    pub fn scope_list(&self) -> Vec<String> {
        super::split_scopes(&self.scopes)
    }
}
