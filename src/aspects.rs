//! Auto-fills the structured attributes ("aspects") a category requires
//! before a listing can publish. Values come from matching the category's
//! allowed values against the item's title and description; a handful of
//! well-known names get special handling.

use crate::ebay::offers::ItemSpecific;
use crate::ebay::taxonomy::AspectMetadata;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

/// Aspect names the pipeline treats specially. Anything else is matched
/// generically and flows through as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WellKnownAspect {
    Condition,
    Brand,
    Model,
    Type,
    Color,
    StorageCapacity,
    Other,
}

impl WellKnownAspect {
    pub fn classify(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "condition" => WellKnownAspect::Condition,
            "brand" => WellKnownAspect::Brand,
            "model" => WellKnownAspect::Model,
            "type" => WellKnownAspect::Type,
            "color" | "colour" => WellKnownAspect::Color,
            "storage capacity" => WellKnownAspect::StorageCapacity,
            _ => WellKnownAspect::Other,
        }
    }

    pub fn canonical_name(self) -> Option<&'static str> {
        match self {
            WellKnownAspect::Condition => Some("Condition"),
            WellKnownAspect::Brand => Some("Brand"),
            WellKnownAspect::Model => Some("Model"),
            WellKnownAspect::Type => Some("Type"),
            WellKnownAspect::Color => Some("Color"),
            WellKnownAspect::StorageCapacity => Some("Storage Capacity"),
            WellKnownAspect::Other => None,
        }
    }
}

static CAPACITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,4})\s*(GB|TB)\b").expect("capacity regex"));

/// Brands recognized when backfilling the `Brand` aspect. Unmatched items
/// are listed as "Unbranded".
pub const KNOWN_BRANDS: &[&str] = &[
    "Apple", "Samsung", "Sony", "LG", "Dell", "HP", "Lenovo", "Microsoft", "Nintendo", "Bose",
    "Dyson", "KitchenAid", "Canon", "Nikon", "GoPro", "JBL", "Panasonic", "Whirlpool",
    "Cuisinart", "DeWalt", "Makita", "Bosch", "IKEA", "Sharp", "Toshiba", "Asus", "Acer",
    "Vizio", "Roku", "Fitbit", "Garmin", "Dewalt", "Black+Decker", "Hamilton Beach", "Ninja",
    "Instant Pot", "Keurig", "Weber", "Coleman",
];

/// Extracts a `<number> <UNIT>` storage token (uppercase unit) from free
/// text, e.g. `"iPhone 128GB"` -> `"128 GB"`.
pub fn extract_storage_capacity(text: &str) -> Option<String> {
    CAPACITY_RE
        .captures(text)
        .map(|caps| format!("{} {}", &caps[1], caps[2].to_uppercase()))
}

fn normalize_compact(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

fn word_boundary_match(haystack: &str, needle: &str) -> bool {
    let pattern = format!(r"(?i)\b{}\b", regex::escape(needle));
    Regex::new(&pattern)
        .map(|re| re.is_match(haystack))
        .unwrap_or(false)
}

fn substring_match(haystack_lower: &str, needle: &str) -> bool {
    !needle.trim().is_empty() && haystack_lower.contains(&needle.to_lowercase())
}

/// First pass: derive values for each required aspect from title +
/// description. Unmatched aspects are omitted entirely, never placeholdered.
pub fn auto_fill(
    required: &[AspectMetadata],
    title: &str,
    description: &str,
) -> BTreeMap<String, Vec<String>> {
    let haystack = format!("{title} {description}");
    let haystack_lower = haystack.to_lowercase();
    let mut filled = BTreeMap::new();

    for aspect in required {
        let name = aspect.localized_aspect_name.trim();
        if name.is_empty() {
            continue;
        }
        let allowed = aspect.allowed_values();
        let matched = match WellKnownAspect::classify(name) {
            WellKnownAspect::Color => allowed
                .iter()
                .find(|value| word_boundary_match(&haystack, value))
                .cloned(),
            WellKnownAspect::StorageCapacity => {
                extract_storage_capacity(&haystack).and_then(|token| {
                    let compact = normalize_compact(&token);
                    allowed
                        .iter()
                        .find(|value| normalize_compact(value) == compact)
                        .cloned()
                })
            }
            _ => allowed
                .iter()
                .find(|value| substring_match(&haystack_lower, value))
                .cloned(),
        };
        if let Some(value) = matched {
            filled.insert(name.to_string(), vec![value]);
        }
    }
    filled
}

/// Scans free text for a known brand, returning its canonical casing.
pub fn detect_brand(text: &str) -> Option<String> {
    KNOWN_BRANDS
        .iter()
        .find(|brand| word_boundary_match(text, brand))
        .map(|brand| brand.to_string())
}

/// Second pass: `Condition` always overwrites whatever auto-fill produced;
/// `Brand`, `Model`, and `Type` are backfilled only when unset or empty.
pub fn apply_overrides(
    aspects: &mut BTreeMap<String, Vec<String>>,
    condition_id: &str,
    title: &str,
    description: &str,
) {
    aspects.insert("Condition".to_string(), vec![condition_id.to_string()]);

    let brand = detect_brand(&format!("{title} {description}"))
        .unwrap_or_else(|| "Unbranded".to_string());
    backfill(aspects, "Brand", brand);
    backfill(aspects, "Model", title.trim().to_string());
    backfill(aspects, "Type", title.trim().to_string());
}

fn backfill(aspects: &mut BTreeMap<String, Vec<String>>, name: &str, value: String) {
    let unset = aspects
        .get(name)
        .map(|values| values.iter().all(|v| v.trim().is_empty()))
        .unwrap_or(true);
    if unset && !value.is_empty() {
        aspects.insert(name.to_string(), vec![value]);
    }
}

/// Final cleanup: drop aspects whose list is empty or contains any blank
/// entry.
pub fn cleanup(aspects: BTreeMap<String, Vec<String>>) -> BTreeMap<String, Vec<String>> {
    aspects
        .into_iter()
        .filter(|(_, values)| {
            !values.is_empty() && values.iter().all(|v| !v.trim().is_empty())
        })
        .collect()
}

/// Converts the cleaned map into offer item specifics, dropping entries
/// whose first value is a placeholder.
pub fn to_item_specifics(aspects: &BTreeMap<String, Vec<String>>) -> Vec<ItemSpecific> {
    aspects
        .iter()
        .filter(|(_, values)| {
            values
                .first()
                .map(|v| !v.trim().is_empty() && v != "Not Specified")
                .unwrap_or(false)
        })
        .map(|(name, values)| ItemSpecific {
            name: name.clone(),
            value: values.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ebay::taxonomy::{AspectConstraint, AspectValue};

    fn aspect(name: &str, values: &[&str], required: bool) -> AspectMetadata {
        AspectMetadata {
            localized_aspect_name: name.to_string(),
            aspect_values: values
                .iter()
                .map(|v| AspectValue {
                    localized_value: v.to_string(),
                })
                .collect(),
            aspect_constraint: Some(AspectConstraint {
                aspect_required: Some(required),
                aspect_mode: Some("SELECTION_ONLY".to_string()),
            }),
        }
    }

    #[test]
    fn storage_capacity_extraction_normalizes_token() {
        assert_eq!(
            extract_storage_capacity("iPhone 128GB Space Gray"),
            Some("128 GB".to_string())
        );
        assert_eq!(
            extract_storage_capacity("drive with 2 tb of space"),
            Some("2 TB".to_string())
        );
        assert_eq!(extract_storage_capacity("no capacity here"), None);
    }

    #[test]
    fn storage_capacity_matches_allowed_values_with_marketplace_casing() {
        let required = vec![aspect("Storage Capacity", &["128GB", "256GB"], true)];
        let filled = auto_fill(&required, "iPhone 128GB Space Gray", "");
        assert_eq!(
            filled.get("Storage Capacity"),
            Some(&vec!["128GB".to_string()])
        );
    }

    #[test]
    fn storage_capacity_omitted_without_allowed_match() {
        let required = vec![aspect("Storage Capacity", &["512GB"], true)];
        let filled = auto_fill(&required, "iPhone 128GB", "");
        assert!(!filled.contains_key("Storage Capacity"));
    }

    #[test]
    fn color_uses_word_boundaries() {
        let required = vec![aspect("Color", &["Red", "Gray"], true)];
        // "hundred" contains "red" but not on a word boundary.
        let filled = auto_fill(&required, "One hundred piece set", "");
        assert!(!filled.contains_key("Color"));

        let filled = auto_fill(&required, "Space Gray phone", "");
        assert_eq!(filled.get("Color"), Some(&vec!["Gray".to_string()]));
    }

    #[test]
    fn generic_aspects_match_substring_case_insensitively() {
        let required = vec![aspect("Connectivity", &["Bluetooth", "Wired"], true)];
        let filled = auto_fill(&required, "Speaker", "great bluetooth sound");
        assert_eq!(
            filled.get("Connectivity"),
            Some(&vec!["Bluetooth".to_string()])
        );
    }

    #[test]
    fn unmatched_aspects_are_omitted() {
        let required = vec![aspect("Band Material", &["Leather", "Silicone"], true)];
        let filled = auto_fill(&required, "Smart watch", "black sport model");
        assert!(filled.is_empty());
    }

    #[test]
    fn condition_always_overwrites() {
        let mut aspects = BTreeMap::new();
        aspects.insert("Condition".to_string(), vec!["New".to_string()]);
        apply_overrides(&mut aspects, "USED_GOOD", "Toaster", "");
        assert_eq!(aspects.get("Condition"), Some(&vec!["USED_GOOD".to_string()]));
    }

    #[test]
    fn brand_backfills_from_known_list_or_unbranded() {
        let mut aspects = BTreeMap::new();
        apply_overrides(&mut aspects, "USED_GOOD", "Dyson V8 vacuum", "");
        assert_eq!(aspects.get("Brand"), Some(&vec!["Dyson".to_string()]));

        let mut aspects = BTreeMap::new();
        apply_overrides(&mut aspects, "USED_GOOD", "Floor lamp", "");
        assert_eq!(aspects.get("Brand"), Some(&vec!["Unbranded".to_string()]));
    }

    #[test]
    fn backfill_preserves_existing_values() {
        let mut aspects = BTreeMap::new();
        aspects.insert("Brand".to_string(), vec!["Sony".to_string()]);
        aspects.insert("Model".to_string(), vec!["WH-1000XM4".to_string()]);
        apply_overrides(&mut aspects, "USED_GOOD", "Headphones", "");
        assert_eq!(aspects.get("Brand"), Some(&vec!["Sony".to_string()]));
        assert_eq!(aspects.get("Model"), Some(&vec!["WH-1000XM4".to_string()]));
        assert_eq!(aspects.get("Type"), Some(&vec!["Headphones".to_string()]));
    }

    #[test]
    fn cleanup_drops_empty_and_blank_lists() {
        let mut aspects = BTreeMap::new();
        aspects.insert("Color".to_string(), vec![]);
        aspects.insert("Brand".to_string(), vec!["Apple".to_string()]);
        aspects.insert("Material".to_string(), vec!["  ".to_string()]);
        let cleaned = cleanup(aspects);
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned.get("Brand"), Some(&vec!["Apple".to_string()]));
    }

    #[test]
    fn item_specifics_drop_not_specified() {
        let mut aspects = BTreeMap::new();
        aspects.insert("Brand".to_string(), vec!["Apple".to_string()]);
        aspects.insert("Style".to_string(), vec!["Not Specified".to_string()]);
        let specifics = to_item_specifics(&aspects);
        assert_eq!(
            specifics,
            vec![ItemSpecific {
                name: "Brand".to_string(),
                value: vec!["Apple".to_string()],
            }]
        );
    }
}
