//! Exhaustive consistency checks over the issue tables, through the
//! public API only.

use autodvic_core::IssueId;
use autodvic_issues::{lookup, validate_catalog, Category, CATEGORY_BY_ID, EXPECTED_ISSUE_IDS, TEXT_BY_ID};

#[test]
fn catalog_validates_clean() {
    if let Err(errors) = validate_catalog() {
        panic!("catalog validation failed:\n{}", errors.join("\n"));
    }
}

#[test]
fn every_text_entry_has_a_category_and_vice_versa() {
    for id in TEXT_BY_ID.keys() {
        assert!(CATEGORY_BY_ID.contains_key(id), "no category mapping for {id}");
    }
    for id in CATEGORY_BY_ID.keys() {
        assert!(TEXT_BY_ID.contains_key(id), "no portal text for {id}");
    }
}

#[test]
fn every_form_id_is_a_valid_resolvable_issue() {
    for raw in EXPECTED_ISSUE_IDS {
        let id = IssueId::new(*raw).unwrap_or_else(|_| panic!("malformed form ID {raw}"));
        let mapping = lookup(&id).unwrap_or_else(|| panic!("form ID {raw} has no mapping"));
        assert!(!mapping.portal_text.is_empty());
        assert!(!mapping.subcategory.is_empty());
    }
}

#[test]
fn categories_cover_the_portal_set() {
    let names: Vec<&str> = Category::all().iter().map(Category::display_name).collect();
    assert_eq!(
        names,
        [
            "Front Side",
            "Passenger Side",
            "Back Side",
            "Driver Side",
            "In Cab",
            "General"
        ]
    );

    // Every mapped issue files under one of the six
    for (category, _) in CATEGORY_BY_ID.values() {
        assert!(Category::all().contains(category));
    }
}

#[test]
fn known_issue_resolves_to_exact_portal_location() {
    let id = IssueId::new("2_ftire_1").expect("valid id");
    let mapping = lookup(&id).expect("mapping");
    assert_eq!(mapping.category, Category::PassengerSide);
    assert_eq!(mapping.subcategory, "Front tire, wheel and rim");
    assert_eq!(
        mapping.portal_text,
        "Tire has insufficient tread (Less than 2/32 or 1.6mm) on inner most, middle, or outer most tread"
    );
}
