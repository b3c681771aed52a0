//! Authorization middleware
//!
//! Adapts an inbound HTTP request to the engine: the principal becomes the
//! subject, the percent-decoded path the object and the method the action.
//! Allowed requests pass through untouched; anything else is answered with an
//! empty 403.
//!
//! Credentials are never verified here. The principal is whatever identity
//! the upstream authentication layer already attached to the request.

use axum::{
    extract::{OriginalUri, Request, State},
    http::{header, HeaderMap, HeaderName, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::sync::Arc;
use tracing::{debug, warn};
use warden_authz::{Enforcer, Request as AuthzRequest};

/// Identity attached to a request by upstream authentication middleware
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedPrincipal(pub String);

/// Where the principal is read from
#[derive(Debug, Clone)]
pub enum PrincipalSource {
    /// Username of an `Authorization: Basic` header; the password is ignored
    BasicAuth,
    /// Value of a header set by a trusted proxy
    Header(HeaderName),
    /// An [`AuthenticatedPrincipal`] request extension
    Extension,
}

/// Shared state of the [`authorize`] middleware
#[derive(Clone)]
pub struct Authorizer {
    enforcer: Arc<Enforcer>,
    source: PrincipalSource,
}

impl Authorizer {
    /// Authorizer reading the principal from HTTP basic auth
    pub fn new(enforcer: Arc<Enforcer>) -> Self {
        Self {
            enforcer,
            source: PrincipalSource::BasicAuth,
        }
    }

    pub fn with_source(mut self, source: PrincipalSource) -> Self {
        self.source = source;
        self
    }

    /// Principal of the request, if the configured source carries one
    pub fn principal<B>(&self, request: &axum::http::Request<B>) -> Option<String> {
        match &self.source {
            PrincipalSource::BasicAuth => basic_auth_username(request.headers()),
            PrincipalSource::Header(name) => request
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string),
            PrincipalSource::Extension => request
                .extensions()
                .get::<AuthenticatedPrincipal>()
                .map(|p| p.0.clone())
                .filter(|p| !p.is_empty()),
        }
    }
}

/// Decode the username from an `Authorization: Basic` header
pub fn basic_auth_username(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let credentials = String::from_utf8(decoded).ok()?;
    let (user, _password) = credentials.split_once(':')?;

    if user.is_empty() {
        None
    } else {
        Some(user.to_string())
    }
}

/// Decode `%XX` escapes so an encoded `/` splits segments like a literal one
///
/// Returns `None` when the decoded bytes are not UTF-8.
pub fn normalized_path(raw: &str) -> Option<String> {
    urlencoding::decode(raw).ok().map(|path| path.into_owned())
}

/// Enforce the policy for every request reaching the wrapped routes
///
/// Install with `axum::middleware::from_fn_with_state(authorizer, authorize)`.
pub async fn authorize(
    State(authorizer): State<Authorizer>,
    request: Request,
    next: Next,
) -> Response {
    // Nested routers see a stripped URI; policy is written against the full path
    let raw_path = request
        .extensions()
        .get::<OriginalUri>()
        .map(|uri| uri.0.path().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let method = request.method().as_str().to_string();

    let Some(path) = normalized_path(&raw_path) else {
        warn!(path = %raw_path, method = %method, "Request rejected: path is not valid UTF-8");
        return StatusCode::FORBIDDEN.into_response();
    };

    let Some(subject) = authorizer.principal(&request) else {
        warn!(path = %path, method = %method, "Request rejected: no principal");
        return StatusCode::FORBIDDEN.into_response();
    };

    let decision = AuthzRequest::new(subject, path, method);
    if !authorizer.enforcer.enforce(&decision) {
        warn!(
            subject = %decision.subject,
            path = %decision.object,
            method = %decision.action,
            "Request forbidden"
        );
        return StatusCode::FORBIDDEN.into_response();
    }

    debug!(subject = %decision.subject, path = %decision.object, "Request authorized");
    next.run(request).await
}
