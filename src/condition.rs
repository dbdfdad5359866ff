//! Maps a user's free-text condition ("like-new", "works but scratched")
//! onto one of the enum ids a category allows.

/// Coarse tiers the free text is bucketed into before picking an enum id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConditionTier {
    New,
    LikeNew,
    Good,
    Fair,
    Parts,
}

impl ConditionTier {
    fn classify(text: &str) -> Self {
        let lowered = text.to_lowercase();
        let has = |needle: &str| lowered.contains(needle);
        if has("part") || has("broken") || has("not working") || has("doesn't work") {
            return ConditionTier::Parts;
        }
        if has("like new") || has("like-new") || has("excellent") || has("mint") || has("barely") {
            return ConditionTier::LikeNew;
        }
        if has("new") && !has("nearly new") {
            return ConditionTier::New;
        }
        if has("fair") || has("worn") || has("heavily used") || has("acceptable") || has("poor") {
            return ConditionTier::Fair;
        }
        ConditionTier::Good
    }

    /// Preference order over marketplace condition enum ids, best first.
    fn preferences(self) -> &'static [&'static str] {
        match self {
            ConditionTier::New => &[
                "NEW",
                "NEW_WITH_TAGS",
                "NEW_IN_BOX",
                "NEW_OTHER",
                "LIKE_NEW",
                "USED_EXCELLENT",
            ],
            ConditionTier::LikeNew => &[
                "LIKE_NEW",
                "USED_EXCELLENT",
                "NEW_OTHER",
                "USED_VERY_GOOD",
                "USED_GOOD",
            ],
            ConditionTier::Good => &["USED_GOOD", "USED_VERY_GOOD", "USED_EXCELLENT", "GOOD"],
            ConditionTier::Fair => &["USED_ACCEPTABLE", "USED_FAIR", "ACCEPTABLE", "USED_GOOD"],
            ConditionTier::Parts => &["FOR_PARTS_OR_NOT_WORKING", "USED_ACCEPTABLE"],
        }
    }
}

/// Deterministically picks one condition enum id. Whenever `allowed` is
/// non-empty the result is a member of it; an empty list (lookup failed)
/// still yields a best-effort id so downstream payloads stay complete.
pub fn map_condition(user_condition: &str, allowed: &[String]) -> String {
    let tier = ConditionTier::classify(user_condition);
    let preferences = tier.preferences();

    if allowed.is_empty() {
        return preferences[0].to_string();
    }

    for preferred in preferences {
        if let Some(hit) = allowed.iter().find(|id| id.eq_ignore_ascii_case(preferred)) {
            return hit.clone();
        }
    }
    // No tier preference exists in this category; prefer any used-family id
    // before falling back to the first allowed entry.
    if let Some(used) = allowed.iter().find(|id| id.to_uppercase().contains("USED")) {
        return used.clone();
    }
    allowed[0].clone()
}
