//! Normalizes user free text and wraps it in the marketplace-facing HTML
//! template. Special characters are logged, never stripped; length bounds
//! are the marketplace's, applied at publish time.

use tracing::debug;

pub const FALLBACK_DESCRIPTION: &str =
    "Quality pre-owned item. See photos for details and overall condition.";

const MAX_DESCRIPTION_CHARS: usize = 4000;
const MAX_CONDITION_NOTE_CHARS: usize = 1000;

/// Trims and substitutes the fixed fallback when empty. HTML and control
/// characters pass through untouched.
pub fn sanitize(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return FALLBACK_DESCRIPTION.to_string();
    }
    if trimmed.contains('<') || trimmed.contains('>') {
        debug!(
            target = "bluberry.pipeline",
            "description contains markup; passing through unmodified"
        );
    }
    bound(trimmed, MAX_DESCRIPTION_CHARS)
}

/// Seller-facing condition note: the user's condition text plus any known
/// issues, bounded to the offer field limit.
pub fn condition_note(condition: &str, issues: &str) -> String {
    let condition = condition.trim();
    let issues = issues.trim();
    let note = match (condition.is_empty(), issues.is_empty() || issues == "None") {
        (false, false) => format!("{condition}. Known issues: {issues}"),
        (false, true) => condition.to_string(),
        (true, false) => format!("Known issues: {issues}"),
        (true, true) => "Pre-owned, see photos".to_string(),
    };
    bound(&note, MAX_CONDITION_NOTE_CHARS)
}

/// Fixed listing template embedding name, sanitized description, condition
/// and brand.
pub fn build_listing_html(name: &str, description: &str, condition: &str, brand: &str) -> String {
    format!(
        "<div>\
<h2>{name}</h2>\
<p>{description}</p>\
<ul>\
<li><strong>Condition:</strong> {condition}</li>\
<li><strong>Brand:</strong> {brand}</li>\
</ul>\
<p>Sold by BluBerry — we pick up, list, and ship household items so you don't have to.</p>\
</div>"
    )
}

fn bound(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        return value.to_string();
    }
    let truncated: String = value.chars().take(limit.saturating_sub(3)).collect();
    format!("{}...", truncated.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_gets_fallback() {
        assert_eq!(sanitize(""), FALLBACK_DESCRIPTION);
        assert_eq!(sanitize("   \n "), FALLBACK_DESCRIPTION);
    }

    #[test]
    fn text_is_trimmed_not_stripped() {
        assert_eq!(sanitize("  great <b>lamp</b>  "), "great <b>lamp</b>");
    }

    #[test]
    fn long_text_is_bounded() {
        let long = "x".repeat(5000);
        let out = sanitize(&long);
        assert!(out.chars().count() <= 4000);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn condition_note_combines_condition_and_issues() {
        assert_eq!(
            condition_note("like-new", "small dent"),
            "like-new. Known issues: small dent"
        );
        assert_eq!(condition_note("like-new", "None"), "like-new");
        assert_eq!(condition_note("", ""), "Pre-owned, see photos");
    }

    #[test]
    fn html_template_includes_fields() {
        let html = build_listing_html("Lamp", "A nice lamp", "USED_GOOD", "Unbranded");
        assert!(html.contains("<h2>Lamp</h2>"));
        assert!(html.contains("A nice lamp"));
        assert!(html.contains("USED_GOOD"));
        assert!(html.contains("Unbranded"));
    }
}
