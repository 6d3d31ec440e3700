use std::collections::HashSet;

use once_cell::sync::Lazy;

pub const DEFAULT_COLLECTION: &str = "properties";
pub const MAX_UNIT_VARIANTS: u64 = 3;
pub const FEATURED_LIMIT: usize = 6;

pub const AMENITY_VOCABULARY: [&str; 15] = [
    "Swimming Pool",
    "Gym",
    "Parking",
    "Security",
    "Garden",
    "Club House",
    "Power Backup",
    "Lift",
    "Playground",
    "Shopping Center",
    "School Nearby",
    "Hospital Nearby",
    "Metro Station",
    "Bus Stop",
    "Restaurant",
];

pub static AMENITIES: Lazy<HashSet<&'static str>> = Lazy::new(|| AMENITY_VOCABULARY.into_iter().collect());
