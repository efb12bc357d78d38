use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// OAuth client identity backing an app.
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Identifiable, Insertable, AsChangeset)]
#[diesel(table_name = crate::schema::applications)]
pub struct Application {
    pub id: String,
    pub client_id: String,
    #[serde(skip_serializing)]
    pub client_secret_hash: Option<String>,
    pub owner_user_id: String,
    pub name: String,
    pub created_at: String,
}
