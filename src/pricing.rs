//! Price estimation for freshly submitted items: ask the text-completion
//! gateway for a resale figure, and fall back to a keyword heuristic when
//! the gateway is down or replies with something unusable.

use crate::llm::{LlmClient, LlmError, LlmMessage};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Deserialize)]
pub struct EstimateRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub condition: String,
}

#[derive(Debug, Serialize)]
pub struct EstimateResponse {
    pub estimated_price: String,
    /// "ai" when the gateway produced the figure, "heuristic" otherwise.
    pub source: &'static str,
}

static MONEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$?\s*(\d{1,6}(?:\.\d{1,2})?)").expect("money regex"));

const CATEGORY_BASES: &[(&str, f64)] = &[
    ("tv", 120.0),
    ("laptop", 180.0),
    ("phone", 150.0),
    ("tablet", 90.0),
    ("camera", 110.0),
    ("console", 130.0),
    ("speaker", 50.0),
    ("headphone", 45.0),
    ("monitor", 80.0),
    ("vacuum", 70.0),
    ("mixer", 60.0),
    ("blender", 35.0),
    ("microwave", 40.0),
    ("refrigerator", 250.0),
    ("washer", 220.0),
    ("dryer", 200.0),
    ("couch", 150.0),
    ("sofa", 150.0),
    ("table", 80.0),
    ("chair", 45.0),
    ("dresser", 90.0),
    ("desk", 75.0),
    ("bike", 95.0),
    ("bicycle", 95.0),
    ("grill", 85.0),
    ("tool", 40.0),
];

const DEFAULT_BASE: f64 = 35.0;

pub async fn estimate(llm: &LlmClient, request: &EstimateRequest) -> EstimateResponse {
    match ask_gateway(llm, request).await {
        Ok(price) => EstimateResponse {
            estimated_price: format!("{price:.2}"),
            source: "ai",
        },
        Err(err) => {
            warn!(
                target = "bluberry.llm",
                item = %request.name,
                error = %err,
                "price estimation fell back to heuristic"
            );
            EstimateResponse {
                estimated_price: format!("{:.2}", heuristic_estimate(request)),
                source: "heuristic",
            }
        }
    }
}

async fn ask_gateway(llm: &LlmClient, request: &EstimateRequest) -> Result<f64, LlmError> {
    let prompt = format!(
        "Estimate a fair resale price in USD for this secondhand item. \
Reply with a single dollar amount only.\n\
Item: {name}\nCondition: {condition}\nDetails: {description}",
        name = request.name,
        condition = request.condition,
        description = request.description,
    );
    let reply = llm
        .chat(&[LlmMessage {
            role: "user".into(),
            content: prompt,
        }])
        .await?;
    extract_amount(&reply)
        .ok_or_else(|| LlmError::InvalidResponse(format!("no amount in reply: {reply}")))
}

/// First plausible dollar amount in the reply.
pub fn extract_amount(text: &str) -> Option<f64> {
    MONEY_RE
        .captures(text)
        .and_then(|caps| caps[1].parse::<f64>().ok())
        .filter(|amount| *amount > 0.0)
}

/// Deterministic fallback: keyword base price times a condition multiplier.
pub fn heuristic_estimate(request: &EstimateRequest) -> f64 {
    let haystack = format!("{} {}", request.name, request.description).to_lowercase();
    let base = CATEGORY_BASES
        .iter()
        .find(|(keyword, _)| haystack.contains(keyword))
        .map(|(_, base)| *base)
        .unwrap_or(DEFAULT_BASE);

    let condition = request.condition.to_lowercase();
    let multiplier = if condition.contains("new") {
        1.3
    } else if condition.contains("like") || condition.contains("excellent") {
        1.1
    } else if condition.contains("fair") || condition.contains("worn") {
        0.6
    } else if condition.contains("part") || condition.contains("broken") {
        0.3
    } else {
        0.85
    };

    (base * multiplier * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, condition: &str) -> EstimateRequest {
        EstimateRequest {
            name: name.to_string(),
            description: String::new(),
            condition: condition.to_string(),
        }
    }

    #[test]
    fn extracts_first_dollar_amount() {
        assert_eq!(extract_amount("I'd price this at $45.00 or so"), Some(45.0));
        assert_eq!(extract_amount("around 120"), Some(120.0));
        assert_eq!(extract_amount("no idea"), None);
    }

    #[test]
    fn heuristic_scales_with_condition() {
        let good = heuristic_estimate(&request("Sony TV", "good"));
        let broken = heuristic_estimate(&request("Sony TV", "broken screen"));
        assert!(good > broken);
        assert!((broken - 120.0 * 0.3).abs() < 0.01);
    }

    #[test]
    fn heuristic_defaults_for_unknown_items() {
        let estimate = heuristic_estimate(&request("Mystery box", ""));
        assert!((estimate - DEFAULT_BASE * 0.85).abs() < 0.01);
    }
}
