use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use validator::{Validate, ValidationError};

/// A listing field the upstream may send as an integer, a decimal, a string
/// or `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Integer(i64),
    Decimal(f64),
    Text(String),
    Null,
}

impl Default for Scalar {
    fn default() -> Self {
        Scalar::Text(String::new())
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Integer(value) => write!(f, "{}", value),
            Scalar::Decimal(value) => write!(f, "{}", value),
            Scalar::Text(value) => f.write_str(value),
            Scalar::Null => Ok(()),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A property listing as returned by the upstream API.
///
/// Fields the front end does not know about (`id`, timestamps, ...) are kept
/// in `extra` so nothing is lost between the upstream and the view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub address: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_empty")]
    pub kind: String,
    #[serde(default)]
    pub capacity: Scalar,
    #[serde(default)]
    pub beds: Scalar,
    #[serde(default)]
    pub price: Scalar,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Scalar>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Listing {
    pub fn image(&self) -> Option<&str> {
        self.image_url.as_deref().filter(|url| !url.is_empty())
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner
            .as_ref()
            .is_some_and(|owner| owner.to_string() == user_id)
    }
}

/// `GET /properties` answers with a bare array, or a page envelope when the
/// upstream has pagination switched on.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PropertiesResponse {
    List(Vec<Listing>),
    Page { data: Vec<Listing> },
}

impl PropertiesResponse {
    pub fn into_listings(self) -> Vec<Listing> {
        match self {
            PropertiesResponse::List(listings) | PropertiesResponse::Page { data: listings } => {
                listings
            }
        }
    }
}

/// The add-listing form. Has no `owner` field; ownership comes from the session.
#[derive(Debug, Deserialize, Validate)]
pub struct ListingForm {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 500))]
    pub address: String,
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 100))]
    pub kind: String,
    #[validate(range(min = 1, max = 1000))]
    pub capacity: u32,
    #[validate(range(max = 1000))]
    pub beds: u32,
    #[validate(custom(function = "finite_price"))]
    pub price: f64,
    #[serde(rename = "imageUrl")]
    #[validate(url)]
    pub image_url: String,
}

fn finite_price(price: f64) -> Result<(), ValidationError> {
    if price.is_finite() && price >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::new("price"))
    }
}

/// Body of `POST /properties`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewListing {
    pub name: String,
    pub address: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub capacity: u32,
    pub beds: u32,
    pub price: f64,
    pub image_url: String,
    pub owner: String,
}

impl ListingForm {
    pub fn into_new_listing(self, owner: &str) -> NewListing {
        NewListing {
            name: self.name.trim().to_string(),
            address: self.address.trim().to_string(),
            kind: self.kind.trim().to_string(),
            capacity: self.capacity,
            beds: self.beds,
            price: self.price,
            image_url: self.image_url.trim().to_string(),
            owner: owner.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keeps_every_upstream_field() {
        let upstream = json!({
            "id": 3,
            "name": "Cabin",
            "address": "1 Lake Rd",
            "type": "cabin",
            "capacity": 4,
            "beds": 2,
            "price": "100.00",
            "image_url": "https://img.example/cabin.jpg",
            "owner": 42,
            "createdAt": "2018-01-01T00:00:00.000Z"
        });

        let listing: Listing = serde_json::from_value(upstream.clone()).unwrap();
        assert_eq!(listing.kind, "cabin");
        assert_eq!(listing.capacity, Scalar::Integer(4));
        assert_eq!(listing.price.to_string(), "100.00");
        assert_eq!(listing.extra.get("id"), Some(&json!(3)));

        assert_eq!(serde_json::to_value(&listing).unwrap(), upstream);
        assert!(listing.is_owned_by("42"));
        assert!(!listing.is_owned_by("7"));
    }

    #[test]
    fn missing_fields_default() {
        let listing: Listing = serde_json::from_value(json!({ "name": "Loft" })).unwrap();
        assert_eq!(listing.name, "Loft");
        assert_eq!(listing.price.to_string(), "");
        assert!(listing.image_url.is_none());
        assert!(listing.owner.is_none());
    }

    #[test]
    fn null_fields_render_empty() {
        let listing: Listing = serde_json::from_value(json!({
            "name": "Loft",
            "address": null,
            "type": null,
            "capacity": null,
            "price": 80,
            "owner": null
        }))
        .unwrap();

        assert_eq!(listing.address, "");
        assert_eq!(listing.kind, "");
        assert_eq!(listing.capacity, Scalar::Null);
        assert_eq!(listing.capacity.to_string(), "");
        assert_eq!(listing.price.to_string(), "80");
        assert!(listing.owner.is_none());
    }

    #[test]
    fn accepts_array_and_page_envelopes() {
        let list: PropertiesResponse = serde_json::from_value(json!([{ "name": "A" }])).unwrap();
        assert_eq!(list.into_listings().len(), 1);

        let page: PropertiesResponse = serde_json::from_value(json!({
            "total": 2, "limit": 10, "skip": 0,
            "data": [{ "name": "A" }, { "name": "B" }]
        }))
        .unwrap();
        let names: Vec<_> = page.into_listings().into_iter().map(|l| l.name).collect();
        assert_eq!(names, ["A", "B"]);
    }

    fn form() -> ListingForm {
        ListingForm {
            name: " Cabin ".to_string(),
            address: "1 Lake Rd".to_string(),
            kind: "cabin".to_string(),
            capacity: 4,
            beds: 2,
            price: 99.5,
            image_url: "https://img.example/cabin.jpg".to_string(),
        }
    }

    #[test]
    fn new_listing_is_owned_by_given_user() {
        let listing = form().into_new_listing("42");
        assert_eq!(listing.owner, "42");
        assert_eq!(listing.name, "Cabin");

        let body = serde_json::to_value(&listing).unwrap();
        assert_eq!(body["type"], "cabin");
        assert_eq!(body["image_url"], "https://img.example/cabin.jpg");
    }

    #[test]
    fn form_validation() {
        assert!(form().validate().is_ok());

        let mut invalid = form();
        invalid.name = String::new();
        invalid.image_url = "not a url".to_string();
        let errors = invalid.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("image_url"));

        for price in [f64::NAN, f64::INFINITY, -1.0] {
            let mut invalid = form();
            invalid.price = price;
            assert!(invalid.validate().is_err(), "price {} accepted", price);
        }
    }
}
