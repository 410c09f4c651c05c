use crate::error::FrontendError;
use crate::models::{Listing, ListingForm, UserSession};
use crate::AppState;
use askama::Template;
use axum::{
    extract::{rejection::FormRejection, State},
    response::{IntoResponse, Redirect},
    Form,
};
use validator::Validate;

#[derive(Template)]
#[template(path = "listings.html")]
pub struct ListingsTemplate {
    pub listings: Vec<Listing>,
    pub user_id: String,
}

impl ListingsTemplate {
    pub fn new(listings: Vec<Listing>, user_id: &str) -> Self {
        Self {
            listings,
            user_id: user_id.to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "add.html")]
pub struct AddListingTemplate {
    pub signed_in: bool,
}

/// `GET /listings`
pub async fn list_listings_handler(
    State(state): State<AppState>,
    session: UserSession,
) -> Result<ListingsTemplate, FrontendError> {
    let listings = state
        .upstream
        .list_properties(&session.access_token)
        .await
        .map_err(FrontendError::Fetch)?;

    Ok(ListingsTemplate::new(listings, &session.uid))
}

/// `GET /add`
pub async fn add_listing_page(session: Option<UserSession>) -> impl IntoResponse {
    AddListingTemplate {
        signed_in: session.is_some(),
    }
}

/// `POST /add`
///
/// The new listing is always owned by the session's user; the form has no
/// owner field and any submitted one is discarded during deserialization.
pub async fn create_listing_handler(
    State(state): State<AppState>,
    session: UserSession,
    form: Result<Form<ListingForm>, FormRejection>,
) -> Result<Redirect, FrontendError> {
    let Form(form) = form.map_err(|rejection| FrontendError::InvalidForm {
        redirect_to: "/add",
        reason: rejection.body_text(),
    })?;

    form.validate().map_err(|e| FrontendError::InvalidForm {
        redirect_to: "/add",
        reason: e.to_string(),
    })?;

    let listing = form.into_new_listing(&session.uid);

    let created = state
        .upstream
        .create_property(&session.access_token, &listing)
        .await
        .map_err(FrontendError::Create)?;

    tracing::info!(
        owner = %session.uid,
        name = %created.name,
        "Listing created"
    );

    Ok(Redirect::to("/listings"))
}
