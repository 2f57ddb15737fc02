//! CORS middleware with an allow-list and a fallback origin.
//!
//! Every response carries the CORS headers. Allowed origins are echoed
//! back; anything else (including no Origin header at all) receives the
//! configured default origin rather than having the header omitted.
//! OPTIONS preflights are answered directly without touching the router.

use axum::extract::{Request, State};
use axum::http::header::{ORIGIN, VARY};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

#[derive(Clone, Debug)]
pub struct CorsSettings {
    pub allowed_origins: Vec<String>,
    pub default_origin: String,
}

impl CorsSettings {
    fn resolve(&self, origin: Option<&str>) -> String {
        match origin {
            Some(o) if self.allowed_origins.iter().any(|a| a == o) => o.to_string(),
            _ => self.default_origin.clone(),
        }
    }
}

pub async fn apply_cors(
    State(settings): State<CorsSettings>,
    req: Request,
    next: Next,
) -> Response {
    let origin = req
        .headers()
        .get(ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let allow = settings.resolve(origin.as_deref());

    let mut response = if req.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(req).await
    };

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&allow) {
        headers.insert("access-control-allow-origin", value);
    }
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("Authorization, Content-Type"),
    );
    headers.insert(VARY, HeaderValue::from_static("Origin"));
    response
}
