#![allow(dead_code)]

use std::sync::Arc;

use installation_tokens::{
    authorizer::{AuthorizeRequest, GrantType},
    db,
    models::{
        app::App,
        application::Application,
        grant::Grant,
        installation::Installation,
        token::Token,
        user::User,
    },
    repos::{sqlite::SqliteAuthRepo, AuthRepo},
    security::hash_token,
    timestamps::format_rfc3339,
};
use tempfile::TempDir;
use time::{Duration, OffsetDateTime};

pub const CODE: &str = "abc123";
pub const CLIENT_ID: &str = "cid1";
pub const CLIENT_SECRET: &str = "s3cret";
pub const SCOPES: &str = "project:read event:write";

/// One installed app: proxy user, application, app, installation and an
/// unexpired grant for that installation.
pub struct Fixture {
    pub _dir: TempDir,
    pub db_path: String,
    pub repo: Arc<dyn AuthRepo>,
    pub proxy_user: User,
    pub application: Application,
    pub app: App,
    pub install: Installation,
    pub grant: Grant,
}

pub struct InstalledApp {
    pub proxy_user: User,
    pub application: Application,
    pub app: App,
    pub install: Installation,
}

pub fn now() -> String {
    format_rfc3339(OffsetDateTime::now_utc())
}

pub fn in_minutes(minutes: i64) -> String {
    format_rfc3339(OffsetDateTime::now_utc() + Duration::minutes(minutes))
}

pub async fn create_user(repo: &Arc<dyn AuthRepo>, username: &str, is_app_proxy: bool) -> User {
    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        username: username.to_string(),
        is_app_proxy,
        created_at: now(),
    };
    repo.create_user(user.clone()).await.expect("create user");
    user
}

/// Seed an app installed into `org`, acting through `proxy_user`.
pub async fn install_app(
    repo: &Arc<dyn AuthRepo>,
    slug: &str,
    client_id: &str,
    proxy_user: User,
    org: &str,
) -> InstalledApp {
    let application = Application {
        id: uuid::Uuid::new_v4().to_string(),
        client_id: client_id.to_string(),
        client_secret_hash: Some(hash_token(CLIENT_SECRET)),
        owner_user_id: proxy_user.id.clone(),
        name: slug.to_string(),
        created_at: now(),
    };
    repo.save_application(application.clone()).await.expect("save application");

    let app = App {
        id: uuid::Uuid::new_v4().to_string(),
        slug: slug.to_string(),
        name: slug.to_string(),
        application_id: application.id.clone(),
        proxy_user_id: proxy_user.id.clone(),
        scopes: SCOPES.to_string(),
        created_at: now(),
        updated_at: now(),
    };
    repo.save_app(app.clone()).await.expect("save app");

    let install = Installation {
        id: uuid::Uuid::new_v4().to_string(),
        app_id: app.id.clone(),
        organization_id: org.to_string(),
        created_at: now(),
    };
    repo.save_installation(install.clone()).await.expect("save installation");

    InstalledApp { proxy_user, application, app, install }
}

pub async fn create_grant(
    repo: &Arc<dyn AuthRepo>,
    code: &str,
    application: &Application,
    install: &Installation,
    expires_at: String,
) -> Grant {
    let grant = Grant {
        id: uuid::Uuid::new_v4().to_string(),
        code_hash: hash_token(code),
        application_id: application.id.clone(),
        installation_id: install.id.clone(),
        expires_at,
        created_at: now(),
        consumed_at: None,
    };
    repo.create_grant(grant.clone()).await.expect("create grant");
    grant
}

/// Seed a token whose refresh value is `refresh_token`.
pub async fn create_token(
    repo: &Arc<dyn AuthRepo>,
    refresh_token: &str,
    user: &User,
    application: &Application,
    expires_at: String,
) -> Token {
    let token = Token {
        id: uuid::Uuid::new_v4().to_string(),
        token_hash: hash_token(&format!("access-for-{refresh_token}")),
        refresh_token_hash: hash_token(refresh_token),
        user_id: user.id.clone(),
        application_id: application.id.clone(),
        scopes: SCOPES.to_string(),
        expires_at,
        created_at: now(),
    };
    repo.create_token(token.clone()).await.expect("create token");
    token
}

pub async fn setup() -> Fixture {
    let dir = TempDir::new().expect("tempdir");
    let db_path = dir.path().join("test.sqlite").display().to_string();

    // Small pool to reduce SQLite locking contention
    let pool = db::sqlite::make_pool_with_size(&db_path, 2).expect("sqlite pool");
    {
        let mut conn = pool.get().expect("db conn");
        db::migrations::run_sqlite_migrations(&mut conn).expect("migrations");
    }
    let repo: Arc<dyn AuthRepo> = SqliteAuthRepo::new(pool);

    let proxy_user = create_user(&repo, "nulldb-proxy", true).await;
    let InstalledApp { proxy_user, application, app, install } =
        install_app(&repo, "nulldb", CLIENT_ID, proxy_user, "org-1").await;
    let grant = create_grant(&repo, CODE, &application, &install, in_minutes(10)).await;

    Fixture { _dir: dir, db_path, repo, proxy_user, application, app, install, grant }
}

impl Fixture {
    pub fn code_request(&self) -> AuthorizeRequest {
        AuthorizeRequest {
            install: self.install.clone(),
            grant_type: GrantType::AuthorizationCode.as_str().to_string(),
            code: Some(CODE.to_string()),
            refresh_token: None,
            client_id: CLIENT_ID.to_string(),
            user: self.proxy_user.clone(),
        }
    }

    pub fn refresh_request(&self, refresh_token: &str) -> AuthorizeRequest {
        AuthorizeRequest {
            install: self.install.clone(),
            grant_type: GrantType::RefreshToken.as_str().to_string(),
            code: None,
            refresh_token: Some(refresh_token.to_string()),
            client_id: CLIENT_ID.to_string(),
            user: self.proxy_user.clone(),
        }
    }
}
