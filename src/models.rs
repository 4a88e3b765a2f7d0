// Data structures for listings and the read-models built from them

use serde::{Deserialize, Serialize};

// Represents a single car listing as served by the listings endpoint
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")] // Match endpoint JSON keys
pub struct Listing {
    pub id: u64,
    pub make: String,
    pub model: String,
    pub price: i64,
    pub mileage: i64,
    pub fuel: String,
    pub description: String,
    pub colour: Option<String>,
    pub first_registration: Option<String>, // Raw "MM-YYYY"-style string, parsed lazily by the evaluator
    pub modelline: Option<String>,
    #[serde(default)] // Endpoint omits the key for listings without photos
    pub images: Vec<ListingImage>,
    pub seller: Option<Seller>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ListingImage {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Seller {
    #[serde(rename = "type")] // `type` is a keyword
    pub kind: String,
    pub phone: String,
    pub city: String,
}

impl Listing {
    pub fn title(&self) -> String {
        format!("{} {}", self.make, self.model)
    }

    pub fn price_label(&self) -> String {
        format!("€ {}.-", self.price)
    }

    pub fn mileage_label(&self) -> String {
        format!("{} km", self.mileage)
    }

    pub fn seller_phone(&self) -> Option<&str> {
        self.seller.as_ref().map(|s| s.phone.as_str())
    }

    pub fn seller_city(&self) -> Option<&str> {
        self.seller.as_ref().map(|s| s.city.as_str())
    }
}

// One tile in the grid
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListingCard {
    pub id: u64,
    pub title: String,
    pub price_label: String,
    pub mileage_label: String,
    pub fuel: String,
    pub thumbnail: Option<String>,
    pub details: Vec<String>, // Mileage, fuel, modelline, colour, registration, description
}

impl From<&Listing> for ListingCard {
    fn from(listing: &Listing) -> Self {
        let details = vec![
            listing.mileage_label(),
            listing.fuel.clone(),
            format!("Modelline: {}", or_dash(listing.modelline.as_deref())),
            format!("Colour: {}", or_dash(listing.colour.as_deref())),
            format!("Registration: {}", or_dash(listing.first_registration.as_deref())),
            listing.description.clone(),
        ];

        ListingCard {
            id: listing.id,
            title: listing.title(),
            price_label: listing.price_label(),
            mileage_label: listing.mileage_label(),
            fuel: listing.fuel.clone(),
            thumbnail: listing.images.first().map(|img| img.url.clone()),
            details,
        }
    }
}

fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

// Read-model for the detail page of one listing
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListingDetail {
    pub id: u64,
    pub title: String,
    pub price_label: String,
    pub description: String,
    pub images: Vec<String>,
    pub properties: Vec<String>,
    pub city: Option<String>,
    pub contact: Option<String>, // "tel://" link, only when the seller left a phone number
}

impl From<&Listing> for ListingDetail {
    fn from(listing: &Listing) -> Self {
        let properties = vec![
            listing.mileage_label(),
            listing.fuel.clone(),
            format!("Modelline: {}", or_dash(listing.modelline.as_deref())),
            format!("Colour: {}", or_dash(listing.colour.as_deref())),
            format!("Registration: {}", or_dash(listing.first_registration.as_deref())),
            format!("City: {}", or_dash(listing.seller_city())),
        ];

        ListingDetail {
            id: listing.id,
            title: listing.title(),
            price_label: listing.price_label(),
            description: listing.description.clone(),
            images: listing.images.iter().map(|img| img.url.clone()).collect(),
            properties,
            city: listing.seller_city().map(str::to_string),
            contact: listing.seller_phone().map(|phone| format!("tel://{}", phone)),
        }
    }
}
