use diesel::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Queryable, Identifiable, Insertable, AsChangeset)]
#[diesel(table_name = crate::schema::installations)]
pub struct Installation {
    pub id: String,
    pub app_id: String,
    pub organization_id: String,
    pub created_at: String,
}
