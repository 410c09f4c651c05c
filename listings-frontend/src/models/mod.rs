pub mod auth;
pub mod listing;
pub mod session;

pub use auth::{AccessToken, AuthResult, Credentials};
pub use listing::{Listing, ListingForm, NewListing, Scalar};
pub use session::UserSession;
