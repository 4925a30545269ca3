//! Session accessor - Verifies the identity provider's bearer tokens
//!
//! Sign-in itself happens at the external provider; this module only checks
//! the HS256 token it issued and exposes the principal's email.

use crate::core::{AppError, AppState};
use crate::entities::Principal;
use axum::extract::{Query, State};
use axum::{body::Body, extract::Request, http, http::Response, middleware::Next};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

// contents of the jwt token
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,  // principal email
    pub exp: usize,   // Expiry time of the token
    pub iat: usize,   // Issued at time of the token
}

/// Issues a token valid for 24 hours. Used by tooling and tests standing in
/// for the identity provider.
#[instrument(skip(secret))]
pub fn encode_jwt(email: &str, secret: &str) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        sub: email.to_string(),
        exp: (now + Duration::hours(24)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| {
        error!("Failed to encode JWT token: {:?}", e);
        AppError::internal_server_error("Error in encoding jwt token")
    })
}

#[instrument(skip(jwt_token, secret))]
pub fn decode_jwt(jwt_token: &str, secret: &str) -> Result<TokenData<Claims>, AppError> {
    decode(
        jwt_token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data: TokenData<Claims>| {
        debug!("JWT token decoded for {}", data.claims.sub);
        data
    })
    .map_err(|e| {
        warn!("Failed to decode JWT token: {:?}", e);
        AppError::unauthorized("Unable to decode token")
    })
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Extracts the raw token from `Authorization: Bearer <token>` or, for
/// browser WebSocket upgrades that cannot set headers, from `?token=`.
fn extract_token(req: &Request) -> Result<String, AppError> {
    if let Some(header) = req.headers().get(http::header::AUTHORIZATION) {
        let header = header.to_str().map_err(|_| {
            warn!("Invalid authorization header format");
            AppError::forbidden("Empty header is not allowed")
        })?;
        let mut parts = header.split_whitespace();
        return match (parts.next(), parts.next()) {
            (Some(scheme), Some(token)) if scheme.eq_ignore_ascii_case("bearer") => {
                Ok(token.to_string())
            }
            _ => {
                warn!("Malformed authorization header");
                Err(AppError::unauthorized("Malformed authorization header"))
            }
        };
    }

    Query::<TokenQuery>::try_from_uri(req.uri())
        .ok()
        .and_then(|Query(params)| params.token)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            warn!("Missing authorization header");
            AppError::forbidden("Please add the JWT token to the header")
        })
}

#[instrument(skip(state, req, next))]
pub async fn authentication_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response<Body>, AppError> {
    debug!("Running authentication middleware");
    let token = extract_token(&req)?;
    let token_data = decode_jwt(&token, &state.jwt_secret)?;

    let email = token_data.claims.sub.trim().to_string();
    if email.is_empty() {
        warn!("Token without subject");
        return Err(AppError::unauthorized("You are not an authorized user"));
    }

    info!("Principal authenticated: {}", email);
    req.extensions_mut().insert(Principal::new(email));
    Ok(next.run(req).await)
}
