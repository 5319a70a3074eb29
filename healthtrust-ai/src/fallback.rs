//! Canned answers used when the AI service cannot be reached or is not
//! configured.

use crate::types::{ChatData, FactCheckVerdict, HealthInfo, MisinfoReport, RemoteRisk, Verdict};
use chrono::{DateTime, Utc};

pub const KNOWLEDGE_BASE_SOURCE: &str = "HealthTrust Knowledge Base";
pub const FALLBACK_CONFIDENCE: f64 = 0.6;
const OFFLINE_CONFIDENCE: f64 = 0.3;
const OFFICIAL_SOURCES: [&str; 3] = ["CDC", "WHO", "NIH"];

/// Health topics recognised by the canned responder, in match order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthTopic {
    Vaccines,
    Covid,
    Flu,
    SideEffects,
    General,
}

const TOPIC_KEYWORDS: [(HealthTopic, &[&str]); 4] = [
    (HealthTopic::Vaccines, &["vaccine", "vaccination"]),
    (HealthTopic::Covid, &["covid", "coronavirus"]),
    (HealthTopic::Flu, &["flu", "influenza"]),
    (HealthTopic::SideEffects, &["side effect", "adverse"]),
];

impl HealthTopic {
    /// First topic whose keywords appear in `message`, case-insensitively.
    pub fn detect(message: &str) -> Self {
        let lower = message.to_lowercase();
        TOPIC_KEYWORDS
            .iter()
            .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
            .map(|(topic, _)| *topic)
            .unwrap_or(Self::General)
    }

    pub fn canned_response(self) -> &'static str {
        match self {
            Self::Vaccines => "Vaccines are safe and effective tools for preventing infectious diseases. They undergo rigorous testing and continuous monitoring. For specific vaccine information, please consult with healthcare professionals or visit the CDC website.",
            Self::Covid => "COVID-19 vaccines have been proven safe and effective in preventing severe illness, hospitalization, and death. For the latest COVID-19 information, please refer to the CDC or WHO guidelines.",
            Self::Flu => "Annual flu vaccination is recommended for everyone 6 months and older. The flu vaccine is safe and the best way to protect against influenza and its complications.",
            Self::SideEffects => "All medical interventions can have side effects, but serious adverse reactions to vaccines are rare. Common side effects are usually mild and resolve quickly. Always discuss concerns with healthcare professionals.",
            Self::General => "I'm here to help with evidence-based health information. For specific medical advice, please consult with qualified healthcare professionals. You can also find reliable information from official sources like the CDC, WHO, and NIH.",
        }
    }
}

/// Topic-relevant canned answer for a user message.
///
/// ```
/// use healthtrust_ai::fallback::fallback_response;
///
/// assert!(fallback_response("Should I get a FLU shot?").contains("Annual flu vaccination"));
/// // "vaccine" is checked before "covid"
/// assert!(fallback_response("covid vaccine").starts_with("Vaccines are safe"));
/// ```
pub fn fallback_response(message: &str) -> &'static str {
    HealthTopic::detect(message).canned_response()
}

pub fn fallback_chat_data(message: &str, timestamp: DateTime<Utc>) -> ChatData {
    ChatData::new(
        fallback_response(message),
        FALLBACK_CONFIDENCE,
        vec![KNOWLEDGE_BASE_SOURCE.to_string()],
    )
    .verified(false)
    .at(timestamp)
}

fn official_sources() -> Vec<String> {
    OFFICIAL_SOURCES.iter().map(|s| s.to_string()).collect()
}

pub fn fallback_fact_check(claim: &str, timestamp: DateTime<Utc>) -> FactCheckVerdict {
    FactCheckVerdict {
        claim: claim.to_string(),
        verdict: Verdict::Uncertain,
        confidence: OFFLINE_CONFIDENCE,
        explanation: "Unable to fact-check this claim at this time. Please consult reliable medical sources.".to_string(),
        sources: official_sources(),
        evidence: Vec::new(),
        timestamp,
    }
}

pub fn fallback_misinfo_report(content: &str, timestamp: DateTime<Utc>) -> MisinfoReport {
    MisinfoReport {
        content: content.to_string(),
        risk_level: RemoteRisk::Unknown,
        confidence: OFFLINE_CONFIDENCE,
        flagged_sections: Vec::new(),
        warnings: vec!["Unable to analyze content at this time".to_string()],
        suggestions: vec!["Please verify information with reliable medical sources".to_string()],
        timestamp,
    }
}

pub fn fallback_health_info(topic: &str, timestamp: DateTime<Utc>) -> HealthInfo {
    HealthInfo {
        topic: topic.to_string(),
        summary: format!("Information about {topic} is not available at this time."),
        detailed_info: "Please consult with healthcare professionals or visit official health organization websites.".to_string(),
        key_points: vec![
            "Consult healthcare professionals".to_string(),
            "Verify information with official sources".to_string(),
        ],
        sources: official_sources(),
        last_updated: timestamp.to_rfc3339(),
        confidence: OFFLINE_CONFIDENCE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topics_match_in_fixed_order() {
        assert_eq!(HealthTopic::detect("Vaccination schedule"), HealthTopic::Vaccines);
        assert_eq!(HealthTopic::detect("Is CORONAVIRUS seasonal?"), HealthTopic::Covid);
        assert_eq!(HealthTopic::detect("influenza season"), HealthTopic::Flu);
        assert_eq!(HealthTopic::detect("any adverse events?"), HealthTopic::SideEffects);
        assert_eq!(HealthTopic::detect("how much water"), HealthTopic::General);
        // covid is checked before flu
        assert_eq!(HealthTopic::detect("covid or flu?"), HealthTopic::Covid);
    }

    #[test]
    fn fallback_chat_is_unverified_knowledge_base_answer() {
        let data = fallback_chat_data("hello", Utc::now());
        assert!(!data.verified);
        assert_eq!(data.confidence, FALLBACK_CONFIDENCE);
        assert_eq!(data.sources, vec![KNOWLEDGE_BASE_SOURCE.to_string()]);
        assert!(data.message.contains("evidence-based"));
    }

    #[test]
    fn offline_payloads_are_low_confidence() {
        let now = Utc::now();
        let fc = fallback_fact_check("garlic cures flu", now);
        assert_eq!(fc.verdict, Verdict::Uncertain);
        assert_eq!(fc.sources, vec!["CDC", "WHO", "NIH"]);
        assert_eq!(fallback_misinfo_report("x", now).risk_level, RemoteRisk::Unknown);
        assert!(fallback_health_info("measles", now).summary.contains("measles"));
    }
}
