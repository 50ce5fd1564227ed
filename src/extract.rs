//! Request extractors that reject with [`ApiError`], so a malformed body or
//! path segment gets the same response shape as every other failure.

use axum::extract::{FromRequest, FromRequestParts};

use crate::errors::ApiError;

/// JSON request body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Typed path parameters. An unparseable segment is a lookup miss.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);
