use crate::misinfo::{assess_misinformation, RiskLevel};
use healthtrust_ai::traits::HealthAssistant;
use healthtrust_ai::types::Verdict;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FactCheckOutcome {
    pub is_verified: bool,
    pub confidence: f64,
    pub sources: Vec<String>,
    pub explanation: String,
    pub flagged_keywords: Vec<String>,
    /// Whether the remote fact-checker produced the verdict.
    pub ai_analysis: bool,
}

/// Screen `content` locally and escalate only high-risk text to the
/// assistant's fact-checker.
pub async fn fact_check_content(assistant: &dyn HealthAssistant, content: &str) -> FactCheckOutcome {
    let local = assess_misinformation(content);

    match local.risk_level {
        RiskLevel::High => {
            tracing::info!(keywords = ?local.flagged_keywords, "fact_check.escalated");
            let result = assistant.fact_check_claim(content).await;
            let ai_analysis = result.success;
            match result.into_payload() {
                Some(verdict) => FactCheckOutcome {
                    is_verified: verdict.verdict == Verdict::True,
                    confidence: verdict.confidence,
                    sources: verdict.sources,
                    explanation: verdict.explanation,
                    flagged_keywords: local.flagged_keywords,
                    ai_analysis,
                },
                None => FactCheckOutcome {
                    is_verified: false,
                    confidence: 0.0,
                    sources: Vec::new(),
                    explanation: "Fact-check failed".to_string(),
                    flagged_keywords: local.flagged_keywords,
                    ai_analysis: false,
                },
            }
        }
        level => {
            let low = level == RiskLevel::Low;
            FactCheckOutcome {
                is_verified: low,
                confidence: if low { 0.8 } else { 0.5 },
                sources: Vec::new(),
                explanation: if low {
                    "Content appears to be safe"
                } else {
                    "Content may require fact-checking"
                }
                .to_string(),
                flagged_keywords: local.flagged_keywords,
                ai_analysis: false,
            }
        }
    }
}
