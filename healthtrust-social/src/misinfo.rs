//! Keyword screen for common health-misinformation phrases.
//!
//! Runs locally and synchronously before a post is accepted, so it must stay
//! cheap and deterministic. Remote analysis lives in `healthtrust-ai`.

use serde::{Deserialize, Serialize};

pub const MISINFORMATION_KEYWORDS: [&str; 10] = [
    "vaccine causes autism",
    "vaccines are dangerous",
    "covid is fake",
    "masks don't work",
    "natural immunity is better",
    "big pharma conspiracy",
    "microchip",
    "population control",
    "DNA altering",
    "experimental vaccine",
];

/// Matches at or above this count are high risk.
pub const HIGH_RISK_MATCHES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// 0 matches is low, 1-2 medium, 3 or more high.
    pub fn from_matches(count: usize) -> Self {
        match count {
            0 => Self::Low,
            n if n < HIGH_RISK_MATCHES => Self::Medium,
            _ => Self::High,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MisinfoAssessment {
    pub is_flagged: bool,
    /// Matched phrases in list order, each at most once.
    pub flagged_keywords: Vec<String>,
    pub risk_level: RiskLevel,
}

/// Case-insensitive substring screen against [`MISINFORMATION_KEYWORDS`].
///
/// ```
/// use healthtrust_social::misinfo::{assess_misinformation, RiskLevel};
///
/// let a = assess_misinformation("Vaccines are dangerous and there's a big pharma conspiracy");
/// assert_eq!(a.flagged_keywords, vec!["vaccines are dangerous", "big pharma conspiracy"]);
/// assert_eq!(a.risk_level, RiskLevel::Medium);
/// assert!(!assess_misinformation("Drink water").is_flagged);
/// ```
pub fn assess_misinformation(content: &str) -> MisinfoAssessment {
    let lower = content.to_lowercase();
    let flagged_keywords: Vec<String> = MISINFORMATION_KEYWORDS
        .iter()
        .filter(|kw| lower.contains(&kw.to_lowercase()))
        .map(|kw| kw.to_string())
        .collect();

    MisinfoAssessment {
        is_flagged: !flagged_keywords.is_empty(),
        risk_level: RiskLevel::from_matches(flagged_keywords.len()),
        flagged_keywords,
    }
}
