//! Exchange of authorization codes and refresh tokens for installation tokens.
//!
//! An installed app authenticates as its proxy user and trades either the
//! code it received at install time or the refresh token from an earlier
//! exchange for a fresh token. Every check that fails yields the same
//! [`AuthorizeError::Unauthorized`].

use std::sync::Arc;

use time::{Duration, OffsetDateTime};

use crate::{
    error::AuthorizeError,
    models::{application::Application, installation::Installation, token::Token, user::User},
    repos::{AuthRepo, Redemption},
    security::{constant_time_eq, generate_token, hash_token},
    timestamps::format_rfc3339,
};

pub const TOKEN_LIFE_IN_HOURS: i64 = 8;

const ACCESS_TOKEN_BYTES: usize = 32;
const REFRESH_TOKEN_BYTES: usize = 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantType {
    AuthorizationCode,
    RefreshToken,
}

impl GrantType {
    pub const ALL: [GrantType; 2] = [GrantType::AuthorizationCode, GrantType::RefreshToken];

    pub fn as_str(self) -> &'static str {
        match self {
            GrantType::AuthorizationCode => "authorization_code",
            GrantType::RefreshToken => "refresh_token",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.as_str() == value)
    }
}

#[derive(Debug, Clone)]
pub struct AuthorizeRequest {
    pub install: Installation,
    pub grant_type: String,
    pub code: Option<String>,
    pub refresh_token: Option<String>,
    pub client_id: String,
    pub user: User,
}

/// A freshly minted token. The plaintext values exist only here; the stored
/// record keeps their hashes.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub record: Token,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct TokenAuthorizer {
    repo: Arc<dyn AuthRepo>,
}

impl TokenAuthorizer {
    pub fn new(repo: Arc<dyn AuthRepo>) -> Self {
        Self { repo }
    }

    pub async fn authorize(&self, req: &AuthorizeRequest) -> Result<IssuedToken, AuthorizeError> {
        let now = OffsetDateTime::now_utc();
        let code = present(&req.code);
        let refresh_token = present(&req.refresh_token);

        if code.is_none() && refresh_token.is_none() {
            return Err(reject("neither code nor refresh_token supplied"));
        }

        let grant_type = GrantType::parse(&req.grant_type)
            .ok_or_else(|| reject("unsupported grant_type"))?;

        let app = self
            .repo
            .get_app(&req.install.app_id)
            .await?
            .ok_or_else(|| reject("installation has no app"))?;

        if app.proxy_user_id != req.user.id {
            return Err(reject("installation belongs to another app"));
        }

        if !req.user.is_app_proxy {
            return Err(reject("requesting user is not an app proxy"));
        }

        let application = self
            .repo
            .get_application(&app.application_id)
            .await?
            .ok_or_else(|| reject("app has no application"))?;

        let redemption = match grant_type {
            GrantType::AuthorizationCode => {
                self.validate_grant(req, code, now).await?
            }
            GrantType::RefreshToken => {
                self.validate_refresh_token(&application, refresh_token, now).await?
            }
        };

        let issued = mint_token(&req.user, &application, app.scope_list(), now);
        let redeemed = self.repo.redeem(redemption, issued.record.clone()).await?;
        if !redeemed {
            return Err(reject("grant or refresh token redeemed concurrently"));
        }

        tracing::info!(
            token_id = %issued.record.id,
            installation_id = %req.install.id,
            application_id = %application.id,
            grant_type = grant_type.as_str(),
            "issued installation token"
        );
        Ok(issued)
    }

    async fn validate_grant(
        &self,
        req: &AuthorizeRequest,
        code: Option<&str>,
        now: OffsetDateTime,
    ) -> Result<Redemption, AuthorizeError> {
        let code = code.ok_or_else(|| reject("authorization_code grant without code"))?;
        let grant = self
            .repo
            .find_grant(&hash_token(code))
            .await?
            .ok_or_else(|| reject("unknown or consumed code"))?;
        let grant_application = self
            .repo
            .get_application(&grant.application_id)
            .await?
            .ok_or_else(|| reject("grant has no application"))?;

        // Evaluate all three before deciding so the timing does not reveal which failed.
        let belongs_to_install = grant.installation_id == req.install.id;
        let owned_by_user = grant_application.owner_user_id == req.user.id;
        let client_id_matches = constant_time_eq(&grant_application.client_id, &req.client_id);
        if !(belongs_to_install & owned_by_user & client_id_matches) {
            return Err(reject("grant does not match installation, owner or client"));
        }

        if grant.is_expired_at(now) {
            return Err(reject("grant expired"));
        }

        Ok(Redemption::Grant { grant_id: grant.id })
    }

    async fn validate_refresh_token(
        &self,
        application: &Application,
        refresh_token: Option<&str>,
        now: OffsetDateTime,
    ) -> Result<Redemption, AuthorizeError> {
        let refresh_token =
            refresh_token.ok_or_else(|| reject("refresh_token grant without refresh_token"))?;
        let token = self
            .repo
            .find_token_by_refresh_hash(&hash_token(refresh_token))
            .await?
            .ok_or_else(|| reject("unknown refresh token"))?;

        if token.application_id != application.id || token.is_expired_at(now) {
            return Err(reject("refresh token expired or issued to another application"));
        }

        Ok(Redemption::Refresh {
            token_id: token.id,
            observed_expires_at: token.expires_at,
        })
    }
}

fn mint_token(user: &User, application: &Application, scopes: Vec<String>, now: OffsetDateTime) -> IssuedToken {
    let access_token = generate_token(ACCESS_TOKEN_BYTES);
    let refresh_token = generate_token(REFRESH_TOKEN_BYTES);
    let record = Token {
        id: uuid::Uuid::new_v4().to_string(),
        token_hash: hash_token(&access_token),
        refresh_token_hash: hash_token(&refresh_token),
        user_id: user.id.clone(),
        application_id: application.id.clone(),
        scopes: scopes.join(" "),
        expires_at: format_rfc3339(now + Duration::hours(TOKEN_LIFE_IN_HOURS)),
        created_at: format_rfc3339(now),
    };
    IssuedToken { record, access_token, refresh_token }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn reject(reason: &'static str) -> AuthorizeError {
    tracing::debug!(reason, "token authorization rejected");
    AuthorizeError::Unauthorized
}
