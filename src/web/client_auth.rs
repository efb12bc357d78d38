use axum::http::{header::AUTHORIZATION, HeaderMap};
use base64::Engine as _;

use crate::{
    app::AppState,
    models::application::Application,
    security::{constant_time_eq, hash_token},
    web::error::TokenError,
};

/// Client credentials presented with a token request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: Option<String>,
}

/// Resolve the calling application from its client id and secret.
///
/// HTTP Basic credentials take precedence over form fields.
pub async fn authenticate_client(
    state: &AppState,
    headers: &HeaderMap,
    form_client_id: Option<&str>,
    form_client_secret: Option<&str>,
) -> Result<(Application, ClientCredentials), TokenError> {
    let creds = extract_client_credentials(headers, form_client_id, form_client_secret)
        .ok_or(TokenError::Unauthorized)?;

    let application = state
        .repo
        .get_application_by_client_id(&creds.client_id)
        .await
        .map_err(TokenError::Internal)?
        .ok_or(TokenError::Unauthorized)?;

    let (Some(secret), Some(expected)) = (creds.client_secret.as_deref(), application.client_secret_hash.as_deref()) else {
        return Err(TokenError::Unauthorized);
    };
    if !constant_time_eq(&hash_token(secret), expected) {
        tracing::debug!(client_id = %creds.client_id, "client secret mismatch");
        return Err(TokenError::Unauthorized);
    }

    Ok((application, creds))
}

pub fn extract_client_credentials(
    headers: &HeaderMap,
    form_client_id: Option<&str>,
    form_client_secret: Option<&str>,
) -> Option<ClientCredentials> {
    if let Some(value) = headers.get(AUTHORIZATION) {
        if let Ok(header_str) = value.to_str() {
            if let Some(b64) = header_str.strip_prefix("Basic ") {
                if let Ok(decoded) = base64::engine::general_purpose::STANDARD.decode(b64.trim().as_bytes()) {
                    if let Ok(pair) = String::from_utf8(decoded) {
                        let mut parts = pair.splitn(2, ':');
                        let id = parts.next().unwrap_or("").to_string();
                        let secret = parts.next().unwrap_or("").to_string();
                        if !id.is_empty() {
                            return Some(ClientCredentials { client_id: id, client_secret: Some(secret) });
                        }
                    }
                }
            }
        }
    }

    form_client_id
        .filter(|id| !id.is_empty())
        .map(|id| ClientCredentials {
            client_id: id.to_string(),
            client_secret: form_client_secret.map(|s| s.to_string()),
        })
}
