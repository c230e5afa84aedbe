//! Request extractors.

use super::AppState;
use crate::{
    errors::{Error, Result},
    receipt::image::check_image_bytes,
};
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Multipart},
    http::{header::AUTHORIZATION, request::Parts},
};
use sea_orm::prelude::Uuid;

/// Header accepted in place of a token when `auth.allow_user_id_header` is set.
pub const USER_ID_HEADER: &str = "user-id";

/// JSON body whose rejection is an [`Error`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct JsonBody<T>(pub T);

/// Query string whose rejection is an [`Error`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(Error))]
pub struct QueryParams<T>(pub T);

/// Path parameters whose rejection is an [`Error`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(Error))]
pub struct PathParam<T>(pub T);

/// The authenticated user's id.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        if let Some(header) = parts.headers.get(AUTHORIZATION) {
            let token = header
                .to_str()
                .ok()
                .and_then(|value| value.strip_prefix("Bearer "))
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .ok_or_else(|| Error::unauthorized("Malformed Authorization header"))?;
            return state.tokens.verify(token).map(Self);
        }

        if state.settings.auth.allow_user_id_header {
            if let Some(header) = parts.headers.get(USER_ID_HEADER) {
                return header
                    .to_str()
                    .ok()
                    .and_then(|value| Uuid::parse_str(value.trim()).ok())
                    .map(Self)
                    .ok_or_else(|| Error::unauthorized("Invalid user-id header"));
            }
        }

        Err(Error::unauthorized("Missing bearer token"))
    }
}

/// Reads the image in the multipart field named `file`.
pub async fn read_image_upload(mut multipart: Multipart) -> Result<Vec<u8>> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        if let Some(content_type) = field.content_type() {
            if !content_type.starts_with("image/") {
                return Err(Error::validation("File must be an image"));
            }
        }
        let bytes = field.bytes().await?.to_vec();
        check_image_bytes(&bytes)?;
        return Ok(bytes);
    }
    Err(Error::validation("Missing file field"))
}
