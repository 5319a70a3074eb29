use crate::misinfo::MisinfoAssessment;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub title: String,
    pub verified: bool,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl Author {
    pub fn new(name: impl Into<String>, title: impl Into<String>, verified: bool) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            verified,
            avatar: None,
        }
    }

    /// Author used for posts written from this client.
    pub fn local_member() -> Self {
        Self::new("You", "Community Member", false)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: u64,
    pub author: Author,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub likes: u32,
    pub comments: u32,
    pub fact_checked: bool,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessment: Option<MisinfoAssessment>,
    #[serde(default)]
    pub liked: bool,
    #[serde(default)]
    pub fact_check_requested: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_insight: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reports: Vec<String>,
}

impl Post {
    pub fn new(id: u64, author: Author, content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            author,
            content: content.into(),
            timestamp,
            likes: 0,
            comments: 0,
            fact_checked: false,
            sources: Vec::new(),
            tags: Vec::new(),
            assessment: None,
            liked: false,
            fact_check_requested: false,
            ai_insight: None,
            reports: Vec::new(),
        }
    }

    pub fn is_flagged(&self) -> bool {
        self.assessment.as_ref().is_some_and(|a| a.is_flagged)
    }

    pub fn mentions(&self, needle_lower: &str) -> bool {
        self.content.to_lowercase().contains(needle_lower)
            || self.author.name.to_lowercase().contains(needle_lower)
            || self.tags.iter().any(|t| t.to_lowercase().contains(needle_lower))
    }
}

/// Body sent to the backend when publishing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub content: String,
    pub sources: Vec<String>,
    pub flagged: bool,
    pub risk_level: crate::misinfo::RiskLevel,
}

impl NewPost {
    pub fn from_assessed(content: &str, sources: Vec<String>, assessment: &MisinfoAssessment) -> Self {
        Self {
            content: content.to_string(),
            sources,
            flagged: assessment.is_flagged,
            risk_level: assessment.risk_level,
        }
    }
}

/// One page of `posts/feed`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    #[serde(default)]
    pub posts: Vec<Post>,
    #[serde(default)]
    pub has_more: bool,
}
