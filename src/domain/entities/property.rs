use std::{collections::HashSet, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{constants::{AMENITIES, MAX_UNIT_VARIANTS}, errors::AppError};

// ───── Constants ──────────────────────────────────────────────────────
const MAX_NAME_LENGTH: u64 = 100;
const MAX_DESCRIPTION_LENGTH: u64 = 2000;

// ───── Enumerations ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PropertyStatus {
    #[default]
    Available,
    Ongoing,
    PreLaunch,
    ReadyToMove,
    Sold,
    Rent,
}

impl PropertyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyStatus::Available => "available",
            PropertyStatus::Ongoing => "ongoing",
            PropertyStatus::PreLaunch => "pre-launch",
            PropertyStatus::ReadyToMove => "ready-to-move",
            PropertyStatus::Sold => "sold",
            PropertyStatus::Rent => "rent",
        }
    }
}

impl fmt::Display for PropertyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropertyStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "available" => Ok(PropertyStatus::Available),
            "ongoing" => Ok(PropertyStatus::Ongoing),
            "pre-launch" => Ok(PropertyStatus::PreLaunch),
            "ready-to-move" => Ok(PropertyStatus::ReadyToMove),
            "sold" => Ok(PropertyStatus::Sold),
            "rent" => Ok(PropertyStatus::Rent),
            other => Err(AppError::InvalidInput(format!("Unknown property status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Apartment,
    Villa,
    Plot,
    Commercial,
    Penthouse,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Apartment => "apartment",
            PropertyType::Villa => "villa",
            PropertyType::Plot => "plot",
            PropertyType::Commercial => "commercial",
            PropertyType::Penthouse => "penthouse",
        }
    }
}

impl FromStr for PropertyType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "apartment" => Ok(PropertyType::Apartment),
            "villa" => Ok(PropertyType::Villa),
            "plot" => Ok(PropertyType::Plot),
            "commercial" => Ok(PropertyType::Commercial),
            "penthouse" => Ok(PropertyType::Penthouse),
            other => Err(AppError::InvalidInput(format!("Unknown property type: {}", other))),
        }
    }
}

// ───── Value Objects ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

/// A listing is located either by a free-text line or a structured postal address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Location {
    Address(Address),
    Text(String),
}

impl Location {
    pub fn display_text(&self) -> String {
        match self {
            Location::Text(text) => text.trim().to_string(),
            Location::Address(a) => format!("{}, {}, {} {}", a.address, a.city, a.state, a.pincode),
        }
    }

    pub fn city(&self) -> Option<&str> {
        match self {
            Location::Address(a) => Some(a.city.as_str()),
            Location::Text(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct UnitVariant {
    #[validate(custom(function = "not_blank", message = "Unit type is required"))]
    pub variant: String,

    #[validate(custom(function = "not_blank", message = "Sqft is required"))]
    pub sqft: String,

    #[validate(custom(function = "not_blank", message = "Pricing is required"))]
    pub pricing: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Developer {
    #[validate(custom(function = "not_blank", message = "Developer name is required"))]
    pub name: String,

    #[serde(default)]
    pub contact: Option<String>,

    #[serde(default)]
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

// ───── Input & Validation ───────────────────────────────────────────

/// Typed form input for creating or editing a listing.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PropertyForm {
    #[validate(
        length(min = 1, max = MAX_NAME_LENGTH, message = "Name must be 1 to 100 characters"),
        custom(function = "not_blank", message = "Project name is required")
    )]
    pub name: String,

    #[serde(default)]
    #[validate(length(max = MAX_DESCRIPTION_LENGTH, message = "Description cannot be more than 2000 characters"))]
    pub description: Option<String>,

    #[validate(custom(function = "validate_location"))]
    pub location: Location,

    #[serde(default)]
    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: Option<f64>,

    #[serde(default)]
    pub price_range: Option<String>,

    #[serde(default)]
    pub property_type: Option<PropertyType>,

    #[serde(default)]
    pub land_area: Option<String>,

    #[serde(default)]
    #[validate(range(min = 0.0, message = "Area cannot be negative"))]
    pub area_sqft: Option<f64>,

    #[serde(default)]
    pub total_units: Option<String>,

    #[serde(default)]
    pub towers: Option<String>,

    #[serde(default)]
    pub possession: Option<String>,

    #[serde(default)]
    pub bedrooms: Option<u16>,

    #[serde(default)]
    pub bathrooms: Option<u16>,

    #[serde(default)]
    #[validate(length(max = MAX_UNIT_VARIANTS, message = "At most 3 unit variants are allowed"), nested)]
    pub unit_variants: Vec<UnitVariant>,

    #[serde(default)]
    #[validate(custom(function = "validate_amenities"))]
    pub amenities: Vec<String>,

    #[serde(default)]
    pub status: PropertyStatus,

    #[serde(default)]
    pub is_featured: bool,

    #[serde(default = "default_true")]
    pub is_active: bool,

    #[serde(default)]
    #[validate(nested)]
    pub developer: Option<Developer>,
}

fn default_true() -> bool {
    true
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

fn validate_location(location: &Location) -> Result<(), ValidationError> {
    let complete = match location {
        Location::Text(text) => !text.trim().is_empty(),
        Location::Address(a) => [&a.address, &a.city, &a.state, &a.pincode]
            .iter()
            .all(|part| !part.trim().is_empty()),
    };

    if !complete {
        let mut err = ValidationError::new("invalid_location");
        err.message = Some("Location is required".into());
        return Err(err);
    }
    Ok(())
}

fn validate_amenities(amenities: &Vec<String>) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();

    for amenity in amenities {
        if !AMENITIES.contains(amenity.as_str()) {
            let mut err = ValidationError::new("unknown_amenity");
            err.message = Some(format!("Unknown amenity: {}", amenity).into());
            return Err(err);
        }
        if !seen.insert(amenity.as_str()) {
            let mut err = ValidationError::new("duplicate_amenity");
            err.message = Some(format!("Duplicate amenity: {}", amenity).into());
            return Err(err);
        }
    }
    Ok(())
}

// ───── Document Models ───────────────────────────────────────────────

/// The persisted body of a listing. `images[0]` is the display image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDetails {
    pub name: String,
    pub description: Option<String>,
    pub location: Location,
    pub price: Option<f64>,
    pub price_range: Option<String>,
    pub property_type: Option<PropertyType>,
    pub land_area: Option<String>,
    pub area_sqft: Option<f64>,
    pub total_units: Option<String>,
    pub towers: Option<String>,
    pub possession: Option<String>,
    pub bedrooms: Option<u16>,
    pub bathrooms: Option<u16>,
    pub unit_variants: Vec<UnitVariant>,
    pub amenities: Vec<String>,
    pub images: Vec<String>,
    pub status: PropertyStatus,
    pub is_featured: bool,
    pub is_active: bool,
    pub developer: Option<Developer>,
}

impl PropertyDetails {
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: Uuid,
    #[serde(flatten)]
    pub details: PropertyDetails,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Property {
    /// Case-insensitive match on the name or the location text.
    pub fn matches_search(&self, term: &str) -> bool {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }

        self.details.name.to_lowercase().contains(&needle)
            || self.details.location.display_text().to_lowercase().contains(&needle)
    }

    pub fn matches(&self, query: &PropertyQuery) -> bool {
        (!query.active_only || self.details.is_active)
            && (!query.featured_only || self.details.is_featured)
            && query.status.is_none_or(|s| self.details.status == s)
            && query.property_type.is_none_or(|t| self.details.property_type == Some(t))
            && query.search.as_deref().is_none_or(|term| self.matches_search(term))
    }
}

#[derive(Debug, Clone)]
pub struct PropertyInsert {
    pub details: PropertyDetails,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PropertyInsert {
    pub fn prepare(details: PropertyDetails, created_by: Uuid) -> Self {
        let now = Utc::now();
        PropertyInsert {
            details,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn into_property(self, id: Uuid) -> Property {
        Property {
            id,
            details: self.details,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PropertyUpdate {
    pub details: PropertyDetails,
    pub updated_at: DateTime<Utc>,
}

impl PropertyUpdate {
    pub fn prepare(details: PropertyDetails) -> Self {
        PropertyUpdate {
            details,
            updated_at: Utc::now(),
        }
    }
}

// ───── Queries & Read Models ────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PropertyQuery {
    pub active_only: bool,
    pub featured_only: bool,
    pub status: Option<PropertyStatus>,
    pub property_type: Option<PropertyType>,
    pub search: Option<String>,
    pub limit: Option<usize>,
}

impl PropertyQuery {
    pub fn public() -> Self {
        PropertyQuery {
            active_only: true,
            ..Default::default()
        }
    }

    pub fn featured(limit: usize) -> Self {
        PropertyQuery {
            active_only: true,
            featured_only: true,
            limit: Some(limit),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PropertyStats {
    pub total: usize,
    pub active: usize,
    pub featured: usize,
    pub sold: usize,
}

impl PropertyStats {
    pub fn from_properties(properties: &[Property]) -> Self {
        PropertyStats {
            total: properties.len(),
            active: properties.iter().filter(|p| p.details.is_active).count(),
            featured: properties.iter().filter(|p| p.details.is_featured).count(),
            sold: properties.iter().filter(|p| p.details.status == PropertyStatus::Sold).count(),
        }
    }
}

/// Keeps the first listing for every (name, location) pair.
pub fn remove_duplicates(properties: Vec<Property>) -> Vec<Property> {
    let mut seen = HashSet::new();
    properties
        .into_iter()
        .filter(|p| seen.insert((p.details.name.clone(), p.details.location.display_text())))
        .collect()
}
