//! Static issue tables and their consistency validation.
//!
//! Two parallel tables keyed by issue ID: one holding the exact defect text
//! as rendered by the portal, one holding the category/subcategory pair the
//! defect is filed under. Both are immutable, loaded once, and validated
//! exhaustively against each other.

use autodvic_core::IssueId;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The portal's fixed top-level defect categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// Front side of the vehicle
    FrontSide,
    /// Passenger side of the vehicle
    PassengerSide,
    /// Back side of the vehicle
    BackSide,
    /// Driver side of the vehicle
    DriverSide,
    /// Interior cab checks
    InCab,
    /// General items (documentation, cleanliness)
    General,
}

impl Category {
    /// The category header text exactly as the portal renders it.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::FrontSide => "Front Side",
            Self::PassengerSide => "Passenger Side",
            Self::BackSide => "Back Side",
            Self::DriverSide => "Driver Side",
            Self::InCab => "In Cab",
            Self::General => "General",
        }
    }

    /// All categories in portal display order.
    #[must_use]
    pub fn all() -> &'static [Category] {
        &[
            Self::FrontSide,
            Self::PassengerSide,
            Self::BackSide,
            Self::DriverSide,
            Self::InCab,
            Self::General,
        ]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// The complete portal location of one issue: exact text plus the
/// category/subcategory pair it is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssueMapping {
    /// Exact defect text as the portal renders it
    pub portal_text: &'static str,
    /// Top-level category
    pub category: Category,
    /// Subcategory header within the category
    pub subcategory: &'static str,
}

use Category::{BackSide, DriverSide, FrontSide, General, InCab, PassengerSide};

/// Issue ID → exact portal defect text.
///
/// These strings must match the portal verbatim; checkbox resolution does
/// exact comparison on trimmed label text.
static PORTAL_TEXT: &[(&str, &str)] = &[
    // Front Side
    ("1_lights_1", "Hazard light is not working"),
    ("1_lights_2", "Headlight is not working"),
    ("1_lights_3", "Any lights or light covers are cracked (leaving hole or void), missing, or not working properly"),
    ("1_susp_1", "Loose or hanging objects underneath"),
    ("1_susp_2", "Noticeable leaning of vehicle (when parked)"),
    ("1_body_1", "Items attached to the body of the vehicle (for example: bumpers and hood latches) are missing, damaged, loose, unsecure, hanging, or held with a zip-tie, tape, or similar"),
    ("1_ev_1", "Orange wires are present: High Voltage! Do not touch!"),
    // Passenger Side
    ("2_mirror_1", "Side mirror glass is cracked, damaged, or missing"),
    ("2_mirror_2", "Side mirrors are loose, hanging, unsecured, or held up with a zip-tie, tape, or similar"),
    ("2_mirror_3", "Side mirrors cannot be adjusted"),
    ("2_ftire_3", "Tire has objects, cuts, dents, swells, leaks, appears flat, or exposed wire on surface"),
    ("2_ftire_4", "Wheel, wheel nuts, rim, or mounting equipment is damaged, cracked, loose, missing, or broken"),
    ("2_ftire_1", "Tire has insufficient tread (Less than 2/32 or 1.6mm) on inner most, middle, or outer most tread"),
    ("2_ftire_2", "Tire has insufficient tread (Less than 4/32 or 3.2mm) on inner most, middle, or outer most tread"),
    ("2_btire_1", "Tire has insufficient tread (Less than 2/32 or 1.6mm) on inner most, middle, or outer most tread"),
    ("2_btire_2", "Tire has objects, cuts, dents, swells, leaks, appears flat, or exposed wire on surface"),
    ("2_btire_3", "Wheel, wheel nuts, rim, or mounting equipment is damaged, cracked, loose, missing, or broken"),
    ("2_btire_4", "Mud Flap is damaged, missing, unsecured or held up with a zip-tie, tape or similar"),
    ("2_body_1", "Items attached to the body of the vehicle (for example: side view camera or cargo steps) are missing, damaged, loose, unsecure, hanging, or held with a zip-tie, tape, or similar"),
    ("2_body_3", "Prime decal is damaged, missing, excessively dirty, or not visible"),
    ("2_body_2", "Amazon DOT decal (USDOT2881058) is damaged, missing, excessively dirty, or not visible, or any existing DOT decals on rental vehicles are not covered and visible"),
    ("2_susp_1", "Loose or hanging objects underneath"),
    ("2_ev_1", "Orange wires are present: High Voltage! Do not touch!"),
    ("2_lights_1", "Any lights or light covers are cracked (leaving hole or void), missing, or not working properly"),
    // Back Side
    ("3_lic_1", "License plates/temp tags are damaged, missing, illegible, or expired"),
    ("3_lights_1", "Hazard light is not working"),
    ("3_lights_2", "License plate light is not working"),
    ("3_lights_4", "Tail light is not working"),
    ("3_lights_3", "Any lights or light covers are cracked (leaving hole or void), missing, or not working properly"),
    ("3_susp_1", "Loose or hanging objects underneath"),
    ("3_ev_1", "Orange wires are present: High Voltage! Do not touch!"),
    ("3_body_1", "Items attached to the body of the vehicle (for example: bumper, back-up camera, or rear step) are missing, damaged, loose, unsecure, hanging, or held with a zip-tie, tape, or similar"),
    // Driver Side
    ("4_btire_1", "Tire has insufficient tread (Less than 2/32 or 1.6mm) on inner most, middle, or outer most tread"),
    ("4_btire_2", "Tire has objects, cuts, dents, swells, leaks, appears flat, or exposed wire on surface"),
    ("4_btire_3", "Wheel, wheel nuts, rim, or mounting equipment is damaged, cracked, loose, missing, or broken"),
    ("4_btire_4", "Mud Flap is damaged, missing, unsecured or held up with a zip-tie, tape or similar"),
    ("4_susp_1", "Active non-clear fluid leaking on the ground"),
    ("4_susp_2", "Loose or hanging objects underneath"),
    ("4_tire_3", "Tire has objects, cuts, dents, swells, leaks, appears flat, or exposed wire on surface"),
    ("4_tire_4", "Wheel, wheel nuts, rim, or mounting equipment is damaged, cracked, loose, missing, or broken"),
    ("4_tire_1", "Tire has insufficient tread (Less than 2/32 or 1.6mm) on inner most, middle, or outer most tread"),
    ("4_tire_2", "Tire has insufficient tread (Less than 4/32 or 3.2mm) on inner most, middle, or outer most tread"),
    ("4_mirror_1", "Side mirror or window glass is cracked, damaged, or missing"),
    ("4_mirror_2", "Side mirrors are loose, hanging, unsecured, or held up with a zip-tie, tape, or similar"),
    ("4_mirror_3", "Side mirrors cannot be adjusted"),
    ("4_ev_1", "Orange wires are present: High Voltage! Do not touch!"),
    ("4_ev_2", "Charging port cap is missing or broken"),
    ("4_body_1", "Items attached to the body of the vehicle (for example: side view camera or cargo steps) are missing, damaged, loose, unsecure, hanging, or held with a zip-tie, tape, or similar"),
    ("4_body_3", "Prime decal is damaged, missing, excessively dirty, or not visible"),
    ("4_body_2", "Amazon DOT decal (USDOT2881058) is damaged, missing, excessively dirty, or not visible, or any existing DOT decals on rental vehicles are not covered and visible"),
    ("4_susp_3", "Fuel cap is missing or broken"),
    ("4_lights_1", "Any lights or light covers are cracked (leaving hole or void), missing, or not working properly"),
    // In Cab
    ("5_body_2", "Interior sliding door (bulkhead doors) cannot open or close"),
    ("5_body_3", "Items attached to the body of the vehicle (for example: shelves, floor panels) are missing, damaged, loose, unsecure, hanging, or held with a zip-tie, tape, or similar"),
    ("5_body_1", "One or more exterior doors (driver, passenger, cargo, or back door) cannot open, close, lock, or unlock properly from the inside of the vehicle"),
    ("5_cam_1", "Netradyne camera is hanging/disconnected from bracket"),
    ("5_cam_2", "Rear or side camera monitor is missing, broken, unsecure, obstructed, or not working"),
    ("5_cam_3", "Sensors or cameras are dirty, or a warning light/message is present signaling an issue on the dashboard"),
    ("5_lights_4", "Hazard light is not working"),
    ("5_lights_5", "Turn signal is not working"),
    ("5_lights_1", "Any red warning lights/lamps are on or flashing"),
    ("5_lights_3", "Dashboard light is not working"),
    ("5_lights_2", "Any yellow warning lights/lamps are on or flashing"),
    ("5_safety_1", "Delivery device cradle is damaged, missing, or is mounted with a tape, zip-tie or similar"),
    ("5_safety_4", "Device is not able to be stowed behind dashboard without becoming loose and no device mount is present"),
    ("5_safety_5", "Driver display/center display is blank or not functioning"),
    ("5_safety_3", "Fire extinguisher is missing, not mounted, mounted with a tape, zip-tie or similar, or the dial/needle is not in the green zone"),
    ("5_windsh_1", "Any crack, chip, stars on the windshield >1/2 inch (excluding 1 inch boarder of windshield)"),
    ("5_windsh_2", "Device/Accessory is mounted on the windshield"),
    ("5_wipers_2", "Wiper blades are missing, damaged, or not working"),
    ("5_wipers_1", "Windshield washer system/wiper fluid reservoir is not working"),
    ("5_brakes_1", "Foot brake is grinding, vibrates, leaking air, or not working"),
    ("5_brakes_2", "Foot brake is squeaking, loose, weak, or stiff"),
    ("5_brakes_4", "Parking brake is loose, weak, or stiff"),
    ("5_brakes_3", "Parking brake is not working"),
    ("5_brakes_5", "Air pressure gauge read less than 79 lb./in2 (5.5 kg/cm2)"),
    ("5_hvac_2", "Defroster/heater is not working"),
    ("5_hvac_1", "AC is not blowing cold air"),
    ("5_sha_1", "Horn, backup alarm, or seatbelt alarm is not working"),
    ("5_sha_2", "Seatbelt is missing, torn, frayed, or not working"),
    ("5_sha_3", "Steering wheel has excessive vibration"),
    ("5_sha_4", "Steering wheel is stiff, loose, or needs alignment"),
    ("5_sha_5", "AVAS noise does not sound when vehicle travels under 12 mph"),
    // General
    ("5_docu_1", "DOT/CA BIT/State Inspection sticker is missing, damaged, illegible, or expired"),
    ("5_docu_2", "Insurance information, registration, short haul exemption, or certification of lease is missing, damaged, illegible, or expired"),
    ("5_safety_2", "Spare fuses or reflective triangles are missing"),
    ("5_clean_1", "Interior of vehicle has excessive grime, odor, dust, or trash present"),
];

/// Issue ID → portal category and subcategory.
static CATEGORY: &[(&str, Category, &str)] = &[
    // Front Side
    ("1_lights_1", FrontSide, "Lights and light covers"),
    ("1_lights_2", FrontSide, "Lights and light covers"),
    ("1_lights_3", FrontSide, "Lights and light covers"),
    ("1_susp_1", FrontSide, "Suspension & underbody shield"),
    ("1_susp_2", FrontSide, "Suspension & underbody shield"),
    ("1_body_1", FrontSide, "Body and doors"),
    ("1_ev_1", FrontSide, "EV system"),
    // Passenger Side
    ("2_mirror_1", PassengerSide, "Side mirrors"),
    ("2_mirror_2", PassengerSide, "Side mirrors"),
    ("2_mirror_3", PassengerSide, "Side mirrors"),
    ("2_ftire_1", PassengerSide, "Front tire, wheel and rim"),
    ("2_ftire_2", PassengerSide, "Front tire, wheel and rim"),
    ("2_ftire_3", PassengerSide, "Front tire, wheel and rim"),
    ("2_ftire_4", PassengerSide, "Front tire, wheel and rim"),
    ("2_btire_1", PassengerSide, "Back tire, wheel and rim"),
    ("2_btire_2", PassengerSide, "Back tire, wheel and rim"),
    ("2_btire_3", PassengerSide, "Back tire, wheel and rim"),
    ("2_btire_4", PassengerSide, "Back tire, wheel and rim"),
    ("2_body_1", PassengerSide, "Body and doors"),
    ("2_body_2", PassengerSide, "Body and doors"),
    ("2_body_3", PassengerSide, "Body and doors"),
    ("2_susp_1", PassengerSide, "Suspension & underbody shield"),
    ("2_ev_1", PassengerSide, "EV system"),
    ("2_lights_1", PassengerSide, "Lights and light covers"),
    // Back Side
    ("3_lic_1", BackSide, "License plates/tags"),
    ("3_lights_1", BackSide, "Lights and light covers"),
    ("3_lights_2", BackSide, "Lights and light covers"),
    ("3_lights_3", BackSide, "Lights and light covers"),
    ("3_lights_4", BackSide, "Lights and light covers"),
    ("3_susp_1", BackSide, "Suspension & underbody shield"),
    ("3_ev_1", BackSide, "EV system"),
    ("3_body_1", BackSide, "Body and doors"),
    // Driver Side
    ("4_btire_1", DriverSide, "Back tire, wheel and rim"),
    ("4_btire_2", DriverSide, "Back tire, wheel and rim"),
    ("4_btire_3", DriverSide, "Back tire, wheel and rim"),
    ("4_btire_4", DriverSide, "Back tire, wheel and rim"),
    ("4_susp_1", DriverSide, "Suspension & underbody shield"),
    ("4_susp_2", DriverSide, "Suspension & underbody shield"),
    ("4_tire_1", DriverSide, "Front tire, wheel and rim"),
    ("4_tire_2", DriverSide, "Front tire, wheel and rim"),
    ("4_tire_3", DriverSide, "Front tire, wheel and rim"),
    ("4_tire_4", DriverSide, "Front tire, wheel and rim"),
    ("4_mirror_1", DriverSide, "Side mirrors"),
    ("4_mirror_2", DriverSide, "Side mirrors"),
    ("4_mirror_3", DriverSide, "Side mirrors"),
    ("4_ev_1", DriverSide, "EV system"),
    ("4_ev_2", DriverSide, "Charging port and fluids"),
    ("4_body_1", DriverSide, "Body and doors"),
    ("4_body_2", DriverSide, "Body and doors"),
    ("4_body_3", DriverSide, "Body and doors"),
    ("4_susp_3", DriverSide, "Charging port and fluids"),
    ("4_lights_1", DriverSide, "Lights and light covers"),
    // In Cab
    ("5_body_1", InCab, "Body and doors"),
    ("5_body_2", InCab, "Body and doors"),
    ("5_body_3", InCab, "Body and doors"),
    ("5_cam_1", InCab, "Camera/monitor"),
    ("5_cam_2", InCab, "Camera/monitor"),
    ("5_cam_3", InCab, "Camera/monitor"),
    ("5_lights_1", InCab, "Lights and light covers"),
    ("5_lights_2", InCab, "Lights and light covers"),
    ("5_lights_3", InCab, "Lights and light covers"),
    ("5_lights_4", InCab, "Lights and light covers"),
    ("5_lights_5", InCab, "Lights and light covers"),
    ("5_safety_1", InCab, "Safety accessories"),
    ("5_safety_2", General, "Safety accessories"),
    ("5_safety_3", InCab, "Safety accessories"),
    ("5_safety_4", InCab, "Safety accessories"),
    ("5_safety_5", InCab, "Safety accessories"),
    ("5_windsh_1", InCab, "Windshield"),
    ("5_windsh_2", InCab, "Windshield"),
    ("5_wipers_1", InCab, "Wipers"),
    ("5_wipers_2", InCab, "Wipers"),
    ("5_brakes_1", InCab, "Brakes"),
    ("5_brakes_2", InCab, "Brakes"),
    ("5_brakes_3", InCab, "Brakes"),
    ("5_brakes_4", InCab, "Brakes"),
    ("5_brakes_5", InCab, "Brakes"),
    ("5_hvac_1", InCab, "HVAC systems"),
    ("5_hvac_2", InCab, "HVAC systems"),
    ("5_sha_1", InCab, "Steering, seatbelt, horn and alarm"),
    ("5_sha_2", InCab, "Steering, seatbelt, horn and alarm"),
    ("5_sha_3", InCab, "Steering, seatbelt, horn and alarm"),
    ("5_sha_4", InCab, "Steering, seatbelt, horn and alarm"),
    ("5_sha_5", InCab, "Steering, seatbelt, horn and alarm"),
    // General
    ("5_docu_1", General, "Vehicle Documentation"),
    ("5_docu_2", General, "Vehicle Documentation"),
    ("5_clean_1", General, "Vehicle Cleanliness"),
];

/// Issue IDs offered by the operator form. Kept in sync with the two
/// tables; `validate_catalog` cross-checks all three.
pub static EXPECTED_ISSUE_IDS: &[&str] = &[
    // Front Side
    "1_lights_1", "1_lights_2", "1_lights_3",
    "1_susp_1", "1_susp_2",
    "1_ev_1",
    "1_body_1",
    // Passenger Side
    "2_mirror_1", "2_mirror_2", "2_mirror_3",
    "2_ftire_1", "2_ftire_2", "2_ftire_3", "2_ftire_4",
    "2_lights_1",
    "2_body_1", "2_body_2", "2_body_3",
    "2_susp_1",
    "2_ev_1",
    "2_btire_1", "2_btire_2", "2_btire_3", "2_btire_4",
    // Back Side
    "3_lights_1", "3_lights_2", "3_lights_3", "3_lights_4",
    "3_body_1",
    "3_lic_1",
    "3_susp_1",
    "3_ev_1",
    // Driver Side
    "4_btire_1", "4_btire_2", "4_btire_3", "4_btire_4",
    "4_lights_1",
    "4_body_1", "4_body_2", "4_body_3",
    "4_susp_1", "4_susp_2", "4_susp_3",
    "4_ev_1", "4_ev_2",
    "4_mirror_1", "4_mirror_2", "4_mirror_3",
    "4_tire_1", "4_tire_2", "4_tire_3", "4_tire_4",
    // In Cab
    "5_body_1", "5_body_2", "5_body_3",
    "5_brakes_1", "5_brakes_2", "5_brakes_3", "5_brakes_4", "5_brakes_5",
    "5_wipers_1", "5_wipers_2",
    "5_windsh_1", "5_windsh_2",
    "5_lights_1", "5_lights_2", "5_lights_3", "5_lights_4", "5_lights_5",
    "5_safety_1", "5_safety_2", "5_safety_3", "5_safety_4", "5_safety_5",
    "5_cam_1", "5_cam_2", "5_cam_3",
    "5_docu_1", "5_docu_2",
    "5_hvac_1", "5_hvac_2",
    "5_sha_1", "5_sha_2", "5_sha_3", "5_sha_4", "5_sha_5",
    "5_clean_1",
];

/// Portal text indexed by issue ID.
pub static TEXT_BY_ID: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| PORTAL_TEXT.iter().copied().collect());

/// Category/subcategory indexed by issue ID.
pub static CATEGORY_BY_ID: Lazy<HashMap<&'static str, (Category, &'static str)>> = Lazy::new(|| {
    CATEGORY
        .iter()
        .map(|&(id, category, subcategory)| (id, (category, subcategory)))
        .collect()
});

/// Resolve the full portal location of an issue, or `None` when the ID is
/// absent from either table.
#[must_use]
pub fn lookup(id: &IssueId) -> Option<IssueMapping> {
    let portal_text = TEXT_BY_ID.get(id.as_str())?;
    let (category, subcategory) = CATEGORY_BY_ID.get(id.as_str())?;
    Some(IssueMapping {
        portal_text,
        category: *category,
        subcategory,
    })
}

/// Exhaustively validate the issue tables.
///
/// Checks bidirectional completeness between the text and category tables,
/// coverage of every expected form ID, ID format, and non-empty strings.
/// Run at startup; a failure here is a fatal configuration error and no
/// partial operation is attempted.
///
/// # Errors
/// Returns the full list of inconsistencies found.
pub fn validate_catalog() -> Result<(), Vec<String>> {
    static ID_REGEX: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^\d+_[a-z]+_\d+$").expect("valid regex"));

    let mut errors = Vec::new();

    for (id, text) in PORTAL_TEXT {
        if !ID_REGEX.is_match(id) {
            errors.push(format!("issue '{id}' has malformed ID"));
        }
        if text.trim().is_empty() {
            errors.push(format!("issue '{id}' has empty portal text"));
        }
        if !CATEGORY_BY_ID.contains_key(id) {
            errors.push(format!("issue '{id}' has no category mapping"));
        }
    }

    for (id, _, subcategory) in CATEGORY {
        if subcategory.trim().is_empty() {
            errors.push(format!("issue '{id}' has empty subcategory"));
        }
        if !TEXT_BY_ID.contains_key(id) {
            errors.push(format!("category mapping exists for '{id}' but no portal text found"));
        }
    }

    for id in EXPECTED_ISSUE_IDS {
        if !TEXT_BY_ID.contains_key(id) {
            errors.push(format!("form offers '{id}' but no portal text is defined"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        tracing::error!(count = errors.len(), "issue catalog validation failed");
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_is_consistent() {
        if let Err(errors) = validate_catalog() {
            panic!("catalog validation failed:\n{}", errors.join("\n"));
        }
    }

    #[test]
    fn test_tables_cover_each_other() {
        for (id, _) in PORTAL_TEXT {
            assert!(CATEGORY_BY_ID.contains_key(id), "no category for {id}");
        }
        for (id, _, _) in CATEGORY {
            assert!(TEXT_BY_ID.contains_key(id), "no portal text for {id}");
        }
        assert_eq!(PORTAL_TEXT.len(), CATEGORY.len());
    }

    #[test]
    fn test_id_format() {
        let regex = Regex::new(r"^\d+_[a-z]+_\d+$").expect("valid regex");
        for (id, _) in PORTAL_TEXT {
            assert!(regex.is_match(id), "malformed ID: {id}");
        }
    }

    #[test]
    fn test_subcategories_non_empty() {
        for (id, _, subcategory) in CATEGORY {
            assert!(!subcategory.trim().is_empty(), "empty subcategory for {id}");
        }
    }

    #[test]
    fn test_lookup_known_issue() {
        let id = IssueId::new("2_ftire_1").expect("valid id");
        let mapping = lookup(&id).expect("mapping exists");
        assert_eq!(mapping.category, Category::PassengerSide);
        assert_eq!(mapping.subcategory, "Front tire, wheel and rim");
        assert_eq!(
            mapping.portal_text,
            "Tire has insufficient tread (Less than 2/32 or 1.6mm) on inner most, middle, or outer most tread"
        );
    }

    #[test]
    fn test_lookup_unknown_issue() {
        let id = IssueId::new("9_nothing_9").expect("valid id");
        assert!(lookup(&id).is_none());
    }

    #[test]
    fn test_category_display_names() {
        assert_eq!(Category::FrontSide.display_name(), "Front Side");
        assert_eq!(Category::InCab.display_name(), "In Cab");
        assert_eq!(Category::all().len(), 6);
    }
}
