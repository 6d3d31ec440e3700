use crate::entities::property::{
    Address, Developer, Location, PropertyDetails, PropertyForm, UnitVariant,
};

const CONTACT_FOR_PRICING: &str = "Contact for pricing";

/// Builds the persisted body from validated form input.
///
/// Images are the existing list in order followed by the successful uploads in input order.
/// Failed slots are skipped, so zero successes still yields a saveable record.
pub fn compose_record(
    form: &PropertyForm,
    existing_images: &[String],
    uploaded: &[Option<String>],
) -> PropertyDetails {
    let images = existing_images
        .iter()
        .cloned()
        .chain(uploaded.iter().flatten().cloned())
        .collect();

    let unit_variants: Vec<UnitVariant> = form
        .unit_variants
        .iter()
        .map(|v| UnitVariant {
            variant: v.variant.trim().to_string(),
            sqft: v.sqft.trim().to_string(),
            pricing: v.pricing.trim().to_string(),
        })
        .collect();

    PropertyDetails {
        name: form.name.trim().to_string(),
        description: non_blank(&form.description),
        location: normalize_location(&form.location),
        price: form.price,
        price_range: derive_price_range(form, &unit_variants),
        property_type: form.property_type,
        land_area: non_blank(&form.land_area),
        area_sqft: form.area_sqft,
        total_units: non_blank(&form.total_units),
        towers: non_blank(&form.towers),
        possession: non_blank(&form.possession),
        bedrooms: form.bedrooms,
        bathrooms: form.bathrooms,
        unit_variants,
        amenities: form.amenities.clone(),
        images,
        status: form.status,
        is_featured: form.is_featured,
        is_active: form.is_active,
        developer: form.developer.as_ref().map(|d| Developer {
            name: d.name.trim().to_string(),
            contact: non_blank(&d.contact),
            email: non_blank(&d.email),
        }),
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn normalize_location(location: &Location) -> Location {
    match location {
        Location::Text(text) => Location::Text(text.trim().to_string()),
        Location::Address(a) => Location::Address(Address {
            address: a.address.trim().to_string(),
            city: a.city.trim().to_string(),
            state: a.state.trim().to_string(),
            pincode: a.pincode.trim().to_string(),
            coordinates: a.coordinates.clone(),
        }),
    }
}

/// Explicit range first, then the first unit variant's pricing.
fn derive_price_range(form: &PropertyForm, unit_variants: &[UnitVariant]) -> Option<String> {
    if let Some(range) = non_blank(&form.price_range) {
        return Some(range);
    }

    match unit_variants.first() {
        Some(first) => Some(format!("{} onwards", first.pricing)),
        None if form.price.is_none() => Some(CONTACT_FOR_PRICING.to_string()),
        None => None,
    }
}
