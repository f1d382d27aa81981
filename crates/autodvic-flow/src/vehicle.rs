//! Vehicle info extraction from the portal's vehicle detail view.
//!
//! The portal renders vehicle facts as "pill" chips at fixed positions, so
//! lookups are index-based, not semantic. The mileage pill drives a
//! three-way split: parseable mileage, the literal "Mileage unknown", or
//! anything else - and the asset-type pill is only read in the first two
//! cases.

use crate::error::{FlowError, Result};
use autodvic_core::VehicleInfo;
use autodvic_portal::page::PortalPage;
use autodvic_portal::selectors::VehicleSelectors;
use once_cell::sync::Lazy;
use regex::Regex;

static MILEAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*miles").expect("valid regex"));

/// Text a mileage pill shows when the portal has no odometer reading.
const MILEAGE_UNKNOWN: &str = "Mileage unknown";

/// Extract a [`VehicleInfo`] record from the current page.
///
/// # Errors
/// Returns [`FlowError::ElementMissing`] when the main info container is
/// absent (the page structure changed); pills that fail to parse yield
/// empty fields instead of errors.
pub async fn extract_vehicle_info(
    page: &dyn PortalPage,
    selectors: &VehicleSelectors,
) -> Result<VehicleInfo> {
    let container = page
        .query(&selectors.main_container)
        .await?
        .ok_or_else(|| FlowError::missing("vehicle info container"))?;

    let pills = page.query_within(container, &selectors.pill_items).await?;
    tracing::debug!(count = pills.len(), "found pill items");

    let pill_text = |index: usize| {
        let pills = pills.clone();
        async move {
            match pills.get(index) {
                Some(&el) => page.text(el).await.map(|t| t.trim().to_string()),
                None => Ok(String::new()),
            }
        }
    };

    let license_text = pill_text(selectors.license_pill_index).await?;
    let (lic, lic_state) = match license_text.split_once('(') {
        Some((plate, state)) => (
            plate.trim().to_string(),
            state.replace(')', "").trim().to_string(),
        ),
        None => (license_text.trim().to_string(), String::new()),
    };

    let vin = pill_text(selectors.vin_pill_index).await?;

    let mileage_text = pill_text(selectors.mileage_pill_index).await?;
    let mut odo = String::new();
    let mut asset_type = String::new();

    if mileage_text.starts_with(|c: char| c.is_ascii_digit()) {
        odo = MILEAGE_RE
            .captures(&mileage_text)
            .map(|caps| caps[1].to_string())
            .unwrap_or_default();
        // Asset type only counts when the mileage actually parsed
        if !odo.is_empty() {
            asset_type = pill_text(selectors.asset_type_pill_index).await?;
        }
    } else if mileage_text == MILEAGE_UNKNOWN {
        asset_type = pill_text(selectors.asset_type_pill_index).await?;
    } else {
        tracing::info!(text = %mileage_text, "unrecognized mileage format, skipping mileage and asset type");
    }

    let info = VehicleInfo {
        lic,
        lic_state,
        vin,
        odo,
        asset_type,
    };
    tracing::debug!(?info, "extracted vehicle info");
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakePage;

    fn vehicle_page(mileage: &str) -> FakePage {
        let page = FakePage::new("https://portal.example/fleet-management/vehicles/v1");
        let container = page.add_node(0, "div", &["css-qodthi"], "");
        for text in [
            "Vehicle name",
            "ABC1234 (WA)",
            "1FTBW3XM0PKA00001",
            "Active",
            mileage,
            "Large Van",
        ] {
            page.add_node(container, "span", &["pill-item"], text);
        }
        page
    }

    #[tokio::test]
    async fn test_extracts_all_fields() {
        let page = vehicle_page("48213 miles");
        let info = extract_vehicle_info(&page, &VehicleSelectors::default())
            .await
            .expect("extract");

        assert_eq!(info.lic, "ABC1234");
        assert_eq!(info.lic_state, "WA");
        assert_eq!(info.vin, "1FTBW3XM0PKA00001");
        assert_eq!(info.odo, "48213");
        assert_eq!(info.asset_type, "Large Van");
    }

    #[tokio::test]
    async fn test_mileage_unknown_still_reads_asset_type() {
        let page = vehicle_page("Mileage unknown");
        let info = extract_vehicle_info(&page, &VehicleSelectors::default())
            .await
            .expect("extract");

        assert_eq!(info.odo, "");
        assert_eq!(info.asset_type, "Large Van");
    }

    #[tokio::test]
    async fn test_unparseable_mileage_skips_both() {
        let page = vehicle_page("Pending service");
        let info = extract_vehicle_info(&page, &VehicleSelectors::default())
            .await
            .expect("extract");

        assert_eq!(info.odo, "");
        assert_eq!(info.asset_type, "");
    }

    #[tokio::test]
    async fn test_missing_container_fails_fast() {
        let page = FakePage::new("https://portal.example/fleet-management/vehicles/v1");
        let result = extract_vehicle_info(&page, &VehicleSelectors::default()).await;
        assert!(matches!(result, Err(FlowError::ElementMissing { .. })));
    }

    #[tokio::test]
    async fn test_extraction_is_idempotent() {
        let page = vehicle_page("48213 miles");
        let selectors = VehicleSelectors::default();
        let first = extract_vehicle_info(&page, &selectors).await.expect("first");
        let second = extract_vehicle_info(&page, &selectors).await.expect("second");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_license_without_state() {
        let page = FakePage::new("https://portal.example/fleet-management/vehicles/v1");
        let container = page.add_node(0, "div", &["css-qodthi"], "");
        for text in ["Vehicle name", "ABC1234", "VIN1", "Active", "10 miles", "Van"] {
            page.add_node(container, "span", &["pill-item"], text);
        }

        let info = extract_vehicle_info(&page, &VehicleSelectors::default())
            .await
            .expect("extract");
        assert_eq!(info.lic, "ABC1234");
        assert_eq!(info.lic_state, "");
    }
}
