use async_trait::async_trait;
use crate::models::{
    app::App,
    application::Application,
    grant::Grant,
    installation::Installation,
    token::Token,
    user::User,
};

/// How a new token is paid for when it is written to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redemption {
    /// Consume the authorization code. Fails if it was already consumed.
    Grant { grant_id: String },
    /// Expire the refreshed token. Fails if its expiry changed since it was
    /// read or has already passed.
    Refresh {
        token_id: String,
        observed_expires_at: String,
    },
}

#[async_trait]
pub trait AuthRepo: Send + Sync {
    // Users
    async fn create_user(&self, user: User) -> anyhow::Result<()>;
    async fn get_user(&self, id: &str) -> anyhow::Result<Option<User>>;

    // Applications, apps and installations
    async fn save_application(&self, application: Application) -> anyhow::Result<()>;
    async fn get_application(&self, id: &str) -> anyhow::Result<Option<Application>>;
    async fn get_application_by_client_id(&self, client_id: &str) -> anyhow::Result<Option<Application>>;
    async fn save_app(&self, app: App) -> anyhow::Result<()>;
    async fn get_app(&self, id: &str) -> anyhow::Result<Option<App>>;
    async fn save_installation(&self, installation: Installation) -> anyhow::Result<()>;
    async fn get_installation(&self, id: &str) -> anyhow::Result<Option<Installation>>;

    // Grants
    async fn create_grant(&self, grant: Grant) -> anyhow::Result<()>;
    /// Look up an unconsumed grant by the hash of its code.
    async fn find_grant(&self, code_hash: &str) -> anyhow::Result<Option<Grant>>;

    // Tokens
    async fn create_token(&self, token: Token) -> anyhow::Result<()>;
    async fn get_token(&self, id: &str) -> anyhow::Result<Option<Token>>;
    async fn find_token_by_refresh_hash(&self, refresh_token_hash: &str) -> anyhow::Result<Option<Token>>;
    async fn list_tokens_for_user(&self, user_id: &str) -> anyhow::Result<Vec<Token>>;
    async fn update_token_expiry(&self, id: &str, expires_at: &str) -> anyhow::Result<()>;

    /// Apply `redemption` and insert `token` in one transaction.
    ///
    /// Returns `false` without writing anything when the redemption no longer
    /// holds, i.e. another request got there first.
    async fn redeem(&self, redemption: Redemption, token: Token) -> anyhow::Result<bool>;
}

pub mod sqlite;
