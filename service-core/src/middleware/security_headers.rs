use axum::{extract::Request, http::header, middleware::Next, response::IntoResponse};

/// Content security policy for server-rendered pages. No scripts; listing
/// images may come from any https host.
pub const PAGE_CSP: &str = "default-src 'self'; \
     script-src 'none'; \
     style-src 'self'; \
     img-src 'self' https: data:; \
     form-action 'self'; \
     frame-ancestors 'none'";

pub async fn security_headers_middleware(req: Request, next: Next) -> impl IntoResponse {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        header::HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::X_FRAME_OPTIONS,
        header::HeaderValue::from_static("DENY"),
    );
    headers.insert(
        header::REFERRER_POLICY,
        header::HeaderValue::from_static("same-origin"),
    );
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        header::HeaderValue::from_static(PAGE_CSP),
    );

    response
}
