use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::OptionalExtension;
use time::OffsetDateTime;

use crate::models::{
    app::App,
    application::Application,
    grant::Grant,
    installation::Installation,
    token::Token,
    user::User,
};
use crate::repos::{AuthRepo, Redemption};
use crate::schema::{applications, apps, grants, installations, tokens, users};
use crate::timestamps::{format_rfc3339, parse_rfc3339};

pub struct SqliteAuthRepo {
    pool: crate::db::sqlite::SqlitePool,
}

impl SqliteAuthRepo {
    pub fn new(pool: crate::db::sqlite::SqlitePool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

#[async_trait]
impl AuthRepo for SqliteAuthRepo {
    async fn create_user(&self, user: User) -> anyhow::Result<()> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
            let mut conn = pool.get()?;
            diesel::insert_into(users::table)
                .values(&user)
                .execute(&mut conn)?;
            Ok(())
        })
        .await??;
        Ok(())
    }

    async fn get_user(&self, id: &str) -> anyhow::Result<Option<User>> {
        let id = id.to_string();
        let pool = self.pool.clone();
        let user = tokio::task::spawn_blocking(move || -> anyhow::Result<Option<User>> {
            let mut conn = pool.get()?;
            let row = users::table
                .find(&id)
                .first::<User>(&mut conn)
                .optional()?;
            Ok(row)
        })
        .await??;
        Ok(user)
    }

    async fn save_application(&self, application: Application) -> anyhow::Result<()> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
            let mut conn = pool.get()?;
            diesel::insert_into(applications::table)
                .values(&application)
                .on_conflict(applications::id)
                .do_update()
                .set(&application)
                .execute(&mut conn)?;
            Ok(())
        })
        .await??;
        Ok(())
    }

    async fn get_application(&self, id: &str) -> anyhow::Result<Option<Application>> {
        let id = id.to_string();
        let pool = self.pool.clone();
        let application = tokio::task::spawn_blocking(move || -> anyhow::Result<Option<Application>> {
            let mut conn = pool.get()?;
            let row = applications::table
                .find(&id)
                .first::<Application>(&mut conn)
                .optional()?;
            Ok(row)
        })
        .await??;
        Ok(application)
    }

    async fn get_application_by_client_id(&self, client_id: &str) -> anyhow::Result<Option<Application>> {
        let client_id = client_id.to_string();
        let pool = self.pool.clone();
        let application = tokio::task::spawn_blocking(move || -> anyhow::Result<Option<Application>> {
            let mut conn = pool.get()?;
            let row = applications::table
                .filter(applications::client_id.eq(&client_id))
                .first::<Application>(&mut conn)
                .optional()?;
            Ok(row)
        })
        .await??;
        Ok(application)
    }

    async fn save_app(&self, app: App) -> anyhow::Result<()> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
            let mut conn = pool.get()?;
            diesel::insert_into(apps::table)
                .values(&app)
                .on_conflict(apps::id)
                .do_update()
                .set(&app)
                .execute(&mut conn)?;
            Ok(())
        })
        .await??;
        Ok(())
    }

    async fn get_app(&self, id: &str) -> anyhow::Result<Option<App>> {
        let id = id.to_string();
        let pool = self.pool.clone();
        let app = tokio::task::spawn_blocking(move || -> anyhow::Result<Option<App>> {
            let mut conn = pool.get()?;
            let row = apps::table
                .find(&id)
                .first::<App>(&mut conn)
                .optional()?;
            Ok(row)
        })
        .await??;
        Ok(app)
    }

    async fn save_installation(&self, installation: Installation) -> anyhow::Result<()> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
            let mut conn = pool.get()?;
            diesel::insert_into(installations::table)
                .values(&installation)
                .on_conflict(installations::id)
                .do_update()
                .set(&installation)
                .execute(&mut conn)?;
            Ok(())
        })
        .await??;
        Ok(())
    }

    async fn get_installation(&self, id: &str) -> anyhow::Result<Option<Installation>> {
        let id = id.to_string();
        let pool = self.pool.clone();
        let installation = tokio::task::spawn_blocking(move || -> anyhow::Result<Option<Installation>> {
            let mut conn = pool.get()?;
            let row = installations::table
                .find(&id)
                .first::<Installation>(&mut conn)
                .optional()?;
            Ok(row)
        })
        .await??;
        Ok(installation)
    }

    async fn create_grant(&self, grant: Grant) -> anyhow::Result<()> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
            let mut conn = pool.get()?;
            diesel::insert_into(grants::table)
                .values(&grant)
                .execute(&mut conn)?;
            Ok(())
        })
        .await??;
        Ok(())
    }

    async fn find_grant(&self, code_hash: &str) -> anyhow::Result<Option<Grant>> {
        let code_hash = code_hash.to_string();
        let pool = self.pool.clone();
        let grant = tokio::task::spawn_blocking(move || -> anyhow::Result<Option<Grant>> {
            let mut conn = pool.get()?;
            let row = grants::table
                .filter(grants::code_hash.eq(&code_hash))
                .filter(grants::consumed_at.is_null())
                .first::<Grant>(&mut conn)
                .optional()?;
            Ok(row)
        })
        .await??;
        Ok(grant)
    }

    async fn create_token(&self, token: Token) -> anyhow::Result<()> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
            let mut conn = pool.get()?;
            diesel::insert_into(tokens::table)
                .values(&token)
                .execute(&mut conn)?;
            Ok(())
        })
        .await??;
        Ok(())
    }

    async fn get_token(&self, id: &str) -> anyhow::Result<Option<Token>> {
        let id = id.to_string();
        let pool = self.pool.clone();
        let token = tokio::task::spawn_blocking(move || -> anyhow::Result<Option<Token>> {
            let mut conn = pool.get()?;
            let row = tokens::table
                .find(&id)
                .first::<Token>(&mut conn)
                .optional()?;
            Ok(row)
        })
        .await??;
        Ok(token)
    }

    async fn find_token_by_refresh_hash(&self, refresh_token_hash: &str) -> anyhow::Result<Option<Token>> {
        let refresh_token_hash = refresh_token_hash.to_string();
        let pool = self.pool.clone();
        let token = tokio::task::spawn_blocking(move || -> anyhow::Result<Option<Token>> {
            let mut conn = pool.get()?;
            let row = tokens::table
                .filter(tokens::refresh_token_hash.eq(&refresh_token_hash))
                .first::<Token>(&mut conn)
                .optional()?;
            Ok(row)
        })
        .await??;
        Ok(token)
    }

    async fn list_tokens_for_user(&self, user_id: &str) -> anyhow::Result<Vec<Token>> {
        let user_id = user_id.to_string();
        let pool = self.pool.clone();
        let rows = tokio::task::spawn_blocking(move || -> anyhow::Result<Vec<Token>> {
            let mut conn = pool.get()?;
            let rows = tokens::table
                .filter(tokens::user_id.eq(&user_id))
                .order(tokens::created_at.asc())
                .load::<Token>(&mut conn)?;
            Ok(rows)
        })
        .await??;
        Ok(rows)
    }

    async fn update_token_expiry(&self, id: &str, expires_at: &str) -> anyhow::Result<()> {
        let id = id.to_string();
        let expires_at = expires_at.to_string();
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
            let mut conn = pool.get()?;
            diesel::update(tokens::table.find(&id))
                .set(tokens::expires_at.eq(&expires_at))
                .execute(&mut conn)?;
            Ok(())
        })
        .await??;
        Ok(())
    }

    async fn redeem(&self, redemption: Redemption, token: Token) -> anyhow::Result<bool> {
        let pool = self.pool.clone();
        let redeemed = tokio::task::spawn_blocking(move || -> anyhow::Result<bool> {
            let mut conn = pool.get()?;
            conn.immediate_transaction::<bool, anyhow::Error, _>(|conn| {
                // Taken under the write lock so competing redemptions see
                // each other's stamps in order.
                let now = OffsetDateTime::now_utc();
                let stamp = format_rfc3339(now);
                match &redemption {
                    Redemption::Grant { grant_id } => {
                        let claimed = diesel::update(
                            grants::table
                                .filter(grants::id.eq(grant_id))
                                .filter(grants::consumed_at.is_null())
                        )
                        .set(grants::consumed_at.eq(&stamp))
                        .execute(conn)?;
                        if claimed == 0 {
                            return Ok(false);
                        }
                    }
                    Redemption::Refresh { token_id, observed_expires_at } => {
                        let current = tokens::table
                            .find(token_id)
                            .select(tokens::expires_at)
                            .first::<String>(conn)
                            .optional()?;
                        if current.as_ref() != Some(observed_expires_at) {
                            return Ok(false);
                        }
                        // Only a token still live at commit time can be spent.
                        // An expired one keeps its expiry and issues nothing.
                        let live = parse_rfc3339(observed_expires_at).is_some_and(|e| e > now);
                        if !live {
                            return Ok(false);
                        }
                        diesel::update(tokens::table.find(token_id))
                            .set(tokens::expires_at.eq(&stamp))
                            .execute(conn)?;
                    }
                }
                diesel::insert_into(tokens::table)
                    .values(&token)
                    .execute(conn)?;
                Ok(true)
            })
        })
        .await??;
        Ok(redeemed)
    }
}
