use crate::error::FrontendError;
use crate::handlers::listings::ListingsTemplate;
use crate::models::{session, Credentials};
use crate::AppState;
use axum::{
    extract::{rejection::FormRejection, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::CookieJar;

/// `POST /listings`: log in, then show the listings.
///
/// The listings call takes the token out of the finished login, so it can
/// only ever run after authentication succeeded.
pub async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    form: Result<Form<Credentials>, FormRejection>,
) -> Response {
    let credentials = match form {
        Ok(Form(credentials)) => credentials,
        Err(rejection) => {
            return FrontendError::InvalidForm {
                redirect_to: "/",
                reason: rejection.body_text(),
            }
            .into_response();
        }
    };

    let auth = match state.upstream.authenticate(&credentials).await {
        Ok(auth) => auth,
        Err(e) => return FrontendError::Auth(e).into_response(),
    };

    tracing::info!(user_id = %auth.user_id, "User logged in");

    let jar = session::establish(jar, &auth, &state.session);

    match state.upstream.list_properties(&auth.access_token).await {
        Ok(listings) => (jar, ListingsTemplate::new(listings, &auth.user_id)).into_response(),
        Err(e) => (jar, FrontendError::Fetch(e)).into_response(),
    }
}

/// `GET /logout`: drop the session cookies.
pub async fn logout_handler(jar: CookieJar) -> impl IntoResponse {
    tracing::info!("User logged out");
    (session::clear(jar), Redirect::to("/"))
}
