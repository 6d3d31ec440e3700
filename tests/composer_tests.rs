mod test_utils;

use property_portal::{
    entities::property::{Developer, Location},
    use_cases::compose::compose_record,
};
use test_utils::*;

fn urls(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("memory://existing/{i}.jpg")).collect()
}

#[test]
fn image_count_is_existing_plus_successes() {
    let form = sample_form();

    for existing in 0..3 {
        for k in 0..=3 {
            let uploaded: Vec<Option<String>> = (0..3)
                .map(|i| (i < k).then(|| format!("memory://new/{i}.jpg")))
                .collect();

            let record = compose_record(&form, &urls(existing), &uploaded);

            assert_eq!(record.images.len(), existing + k);
        }
    }
}

#[test]
fn existing_images_come_first_and_failed_slots_are_skipped() {
    let existing = urls(2);
    let uploaded = vec![
        Some("memory://new/0.jpg".to_string()),
        None,
        Some("memory://new/2.jpg".to_string()),
    ];

    let record = compose_record(&sample_form(), &existing, &uploaded);

    assert_eq!(
        record.images,
        vec![
            "memory://existing/0.jpg",
            "memory://existing/1.jpg",
            "memory://new/0.jpg",
            "memory://new/2.jpg",
        ]
    );
    assert_eq!(record.primary_image(), Some("memory://existing/0.jpg"));
}

#[test]
fn zero_successes_still_produce_a_record() {
    let record = compose_record(&sample_form(), &[], &[None, None]);

    assert!(record.images.is_empty());
    assert_eq!(record.name, "Skyline Residency");
}

#[test]
fn price_range_is_derived_from_first_unit_variant() {
    let record = compose_record(&sample_form(), &[], &[]);
    assert_eq!(record.price_range.as_deref(), Some("₹1.2 Cr onwards"));

    let mut explicit = sample_form();
    explicit.price_range = Some("  ₹90 L - ₹1.5 Cr ".to_string());
    let record = compose_record(&explicit, &[], &[]);
    assert_eq!(record.price_range.as_deref(), Some("₹90 L - ₹1.5 Cr"));
}

#[test]
fn price_range_without_variants_depends_on_price() {
    let mut form = sample_form();
    form.unit_variants.clear();
    assert_eq!(
        compose_record(&form, &[], &[]).price_range.as_deref(),
        Some("Contact for pricing")
    );

    form.price = Some(7_500_000.0);
    assert_eq!(compose_record(&form, &[], &[]).price_range, None);
}

#[test]
fn text_fields_are_trimmed_and_blanks_dropped() {
    let mut form = sample_form();
    form.name = "  Palm Meadows  ".to_string();
    form.location = Location::Text("  Sarjapur Road ".to_string());
    form.towers = Some("   ".to_string());
    form.developer = Some(Developer {
        name: " Prestige ".to_string(),
        contact: Some(String::new()),
        email: Some("sales@prestige.example".to_string()),
    });

    let record = compose_record(&form, &[], &[]);

    assert_eq!(record.name, "Palm Meadows");
    assert_eq!(record.location, Location::Text("Sarjapur Road".to_string()));
    assert_eq!(record.towers, None);
    let developer = record.developer.unwrap();
    assert_eq!(developer.name, "Prestige");
    assert_eq!(developer.contact, None);
}
