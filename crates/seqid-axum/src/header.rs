//! Caller-supplied numeric IDs carried in a request header.
//!
//! A gateway in front of the service authenticates the caller and forwards
//! its numeric ID in a header (by default `x-user-id`). [`HeaderId`] reads it
//! back; it does not generate anything.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// Header consulted when none is configured.
pub const DEFAULT_ID_HEADER: &str = "x-user-id";

/// Name of the header that [`HeaderId`] reads, provided through router
/// state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdHeaderName(Arc<str>);

impl IdHeaderName {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for IdHeaderName {
    fn default() -> Self {
        Self::new(DEFAULT_ID_HEADER)
    }
}

/// Why a numeric header ID could not be extracted.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum HeaderIdRejection {
    #[error("header name is empty")]
    EmptyHeaderName,

    #[error("missing header `{0}`")]
    Missing(String),

    #[error("header `{0}` is empty")]
    Empty(String),

    #[error("header `{name}` is not a number: {value:?}")]
    NotNumeric { name: String, value: String },
}

impl IntoResponse for HeaderIdRejection {
    fn into_response(self) -> Response {
        let status = match self {
            // Misconfigured server, not a bad request
            Self::EmptyHeaderName => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        };
        (status, self.to_string()).into_response()
    }
}

/// Reads a signed 64-bit decimal ID from header `name`.
///
/// # Errors
///
/// Returns a [`HeaderIdRejection`] if `name` is empty, the header is absent
/// or empty, or its value is not a decimal integer.
pub fn parse_header_id(headers: &HeaderMap, name: &str) -> Result<i64, HeaderIdRejection> {
    if name.is_empty() {
        return Err(HeaderIdRejection::EmptyHeaderName);
    }
    let value = headers
        .get(name)
        .ok_or_else(|| HeaderIdRejection::Missing(name.to_owned()))?;
    if value.is_empty() {
        return Err(HeaderIdRejection::Empty(name.to_owned()));
    }

    let not_numeric = || HeaderIdRejection::NotNumeric {
        name: name.to_owned(),
        value: String::from_utf8_lossy(value.as_bytes()).into_owned(),
    };
    value
        .to_str()
        .map_err(|_| not_numeric())?
        .parse::<i64>()
        .map_err(|_| not_numeric())
}

/// Extractor for the caller's numeric ID.
///
/// The header name comes from an [`IdHeaderName`] reachable from the router
/// state via [`FromRef`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeaderId(pub i64);

impl<S> FromRequestParts<S> for HeaderId
where
    IdHeaderName: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = HeaderIdRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let name = IdHeaderName::from_ref(state);
        parse_header_id(&parts.headers, name.as_str()).map(Self)
    }
}
