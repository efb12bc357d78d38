use axum::{
    extract::{rejection::FormRejection, Form, Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    app::AppState,
    authorizer::{AuthorizeRequest, IssuedToken, TOKEN_LIFE_IN_HOURS},
    web::{client_auth::authenticate_client, error::TokenError},
};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TokenRequest {
    pub grant_type: String,
    pub code: Option<String>,
    pub refresh_token: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub id: String,
    pub token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_at: String,
    pub expires_in: i64,
    pub scopes: Vec<String>,
}

impl From<IssuedToken> for TokenResponse {
    fn from(issued: IssuedToken) -> Self {
        let scopes = issued.record.scope_list();
        TokenResponse {
            id: issued.record.id,
            token: issued.access_token,
            refresh_token: issued.refresh_token,
            token_type: "bearer",
            expires_at: issued.record.expires_at,
            expires_in: TOKEN_LIFE_IN_HOURS * 3600,
            scopes,
        }
    }
}

/// Route: POST /api/0/installations/{installation_id}/authorizations
///
/// The calling app authenticates with its client credentials and acts as
/// the application owner, which for installed apps is the app's proxy user.
pub async fn authorize(
    State(state): State<AppState>,
    Path(installation_id): Path<String>,
    headers: HeaderMap,
    form: Result<Form<TokenRequest>, FormRejection>,
) -> Result<(StatusCode, Json<TokenResponse>), TokenError> {
    let Form(req) = form.map_err(|rejection| {
        tracing::debug!(error = %rejection, "unreadable token request body");
        TokenError::Unauthorized
    })?;

    let (application, creds) = authenticate_client(
        &state,
        &headers,
        req.client_id.as_deref(),
        req.client_secret.as_deref(),
    )
    .await?;

    let user = state
        .repo
        .get_user(&application.owner_user_id)
        .await
        .map_err(TokenError::Internal)?
        .ok_or(TokenError::Unauthorized)?;

    let install = state
        .repo
        .get_installation(&installation_id)
        .await
        .map_err(TokenError::Internal)?
        .ok_or(TokenError::Unauthorized)?;

    let request = AuthorizeRequest {
        install,
        grant_type: req.grant_type,
        code: req.code,
        refresh_token: req.refresh_token,
        client_id: creds.client_id,
        user,
    };

    let issued = state.authorizer.authorize(&request).await?;
    Ok((StatusCode::CREATED, Json(TokenResponse::from(issued))))
}
