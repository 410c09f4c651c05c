use crate::models::UserSession;
use askama::Template;
use axum::response::IntoResponse;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub signed_in: bool,
}

pub async fn index(session: Option<UserSession>) -> impl IntoResponse {
    IndexTemplate {
        signed_in: session.is_some(),
    }
}

pub async fn health_check() -> &'static str {
    "OK"
}
