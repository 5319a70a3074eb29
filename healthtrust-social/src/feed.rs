//! In-memory community feed.
//!
//! The feed is owned by its caller and mutated through `&mut self`; nothing
//! here is persisted.

use crate::factcheck::FactCheckOutcome;
use crate::misinfo::{assess_misinformation, RiskLevel};
use crate::post::{Author, Post};
use chrono::{DateTime, Duration, Utc};
use healthtrust_common::{HealthTrustError, Result};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FeedFilter {
    #[default]
    All,
    /// Fact-checked posts.
    Verified,
    /// Posts with at least one comment.
    Discussions,
    /// Posts the keyword screen flagged.
    Alerts,
}

impl FromStr for FeedFilter {
    type Err = HealthTrustError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "verified" => Ok(Self::Verified),
            "discussions" => Ok(Self::Discussions),
            "alerts" => Ok(Self::Alerts),
            other => Err(HealthTrustError::InvalidInput(format!(
                "unknown feed filter '{other}'"
            ))),
        }
    }
}

impl FeedFilter {
    fn accepts(self, post: &Post) -> bool {
        match self {
            Self::All => true,
            Self::Verified => post.fact_checked,
            Self::Discussions => post.comments > 0,
            Self::Alerts => post.is_flagged(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Feed {
    posts: Vec<Post>,
    last_id: u64,
}

impl Feed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed over posts fetched elsewhere, kept in the given order.
    pub fn from_posts(posts: Vec<Post>) -> Self {
        let last_id = posts.iter().map(|p| p.id).max().unwrap_or_default();
        Self { posts, last_id }
    }

    /// Feed pre-populated with the three community posts shown to new users.
    pub fn with_sample_posts(now: DateTime<Utc>) -> Self {
        let mut johnson = Post::new(
            1,
            Author::new("Dr. Sarah Johnson", "Infectious Disease Specialist", true),
            "New study shows COVID-19 vaccines continue to be highly effective against severe illness. The latest research from Johns Hopkins confirms 94% efficacy in preventing hospitalization.",
            now - Duration::hours(2),
        );
        johnson.likes = 124;
        johnson.comments = 18;
        johnson.fact_checked = true;
        johnson.sources = strings(&["Johns Hopkins Medicine", "CDC"]);
        johnson.tags = strings(&["vaccines", "covid19", "research"]);
        johnson.ai_insight = Some(
            "This information aligns with current medical consensus and is supported by peer-reviewed research.".to_string(),
        );

        let mut rodriguez = Post::new(
            2,
            Author::new("Maria Rodriguez", "Public Health Educator", false),
            "Reminder: Getting your flu shot this season is especially important. It helps protect not just you, but also vulnerable community members who cannot be vaccinated.",
            now - Duration::hours(4),
        );
        rodriguez.likes = 89;
        rodriguez.comments = 12;
        rodriguez.fact_checked = true;
        rodriguez.sources = strings(&["WHO", "CDC"]);
        rodriguez.tags = strings(&["flu", "vaccines", "public-health"]);

        let mut chen = Post::new(
            3,
            Author::new("Dr. Michael Chen", "Epidemiologist", true),
            "Addressing concerns about vaccine ingredients: All approved vaccines undergo rigorous safety testing. Each ingredient serves a specific purpose and is present in tiny, safe amounts.",
            now - Duration::hours(6),
        );
        chen.likes = 156;
        chen.comments = 24;
        chen.fact_checked = true;
        chen.sources = strings(&["FDA", "NIH"]);
        chen.tags = strings(&["vaccines", "safety", "ingredients"]);

        Self {
            posts: vec![johnson, rodriguez, chen],
            last_id: 3,
        }
    }

    /// Newest first.
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&Post> {
        self.posts.iter().find(|p| p.id == id)
    }

    fn get_mut(&mut self, id: u64) -> Result<&mut Post> {
        self.posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(HealthTrustError::PostNotFound(id))
    }

    fn next_id(&mut self, now: DateTime<Utc>) -> u64 {
        let millis = u64::try_from(now.timestamp_millis()).unwrap_or_default();
        self.last_id = millis.max(self.last_id + 1);
        self.last_id
    }

    /// Screen and publish a post at the top of the feed.
    ///
    /// High-risk content is refused with [`HealthTrustError::ContentFlagged`];
    /// anything else is stored with its assessment attached.
    pub fn create_post(
        &mut self,
        content: &str,
        sources: Vec<String>,
        now: DateTime<Utc>,
    ) -> Result<&Post> {
        if content.trim().is_empty() {
            return Err(HealthTrustError::InvalidInput(
                "post content cannot be empty".to_string(),
            ));
        }

        let assessment = assess_misinformation(content);
        if assessment.risk_level == RiskLevel::High {
            tracing::warn!(keywords = ?assessment.flagged_keywords, "feed.post.rejected");
            return Err(HealthTrustError::ContentFlagged {
                keywords: assessment.flagged_keywords,
            });
        }

        let id = self.next_id(now);
        tracing::info!(id, risk = %assessment.risk_level, "feed.post.created");

        let mut post = Post::new(id, Author::local_member(), content, now);
        post.sources = sources;
        post.assessment = Some(assessment);
        self.posts.insert(0, post);
        Ok(&self.posts[0])
    }

    /// Like a post once; repeated likes keep the count.
    pub fn like(&mut self, id: u64) -> Result<u32> {
        let post = self.get_mut(id)?;
        if !post.liked {
            post.liked = true;
            post.likes += 1;
        }
        Ok(post.likes)
    }

    pub fn request_fact_check(&mut self, id: u64) -> Result<()> {
        self.get_mut(id)?.fact_check_requested = true;
        Ok(())
    }

    pub fn report(&mut self, id: u64, reason: &str) -> Result<()> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(HealthTrustError::InvalidInput(
                "report reason cannot be empty".to_string(),
            ));
        }
        self.get_mut(id)?.reports.push(reason.to_string());
        Ok(())
    }

    /// Record the outcome of a content fact-check on a post.
    pub fn apply_fact_check(&mut self, id: u64, outcome: &FactCheckOutcome) -> Result<()> {
        let post = self.get_mut(id)?;
        post.fact_checked = outcome.is_verified;
        post.fact_check_requested = false;
        post.ai_insight = Some(outcome.explanation.clone());
        for source in &outcome.sources {
            if !post.sources.contains(source) {
                post.sources.push(source.clone());
            }
        }
        Ok(())
    }

    /// Posts passing `filter` whose content, author, or tags mention `query`.
    pub fn view<'a>(&'a self, filter: FeedFilter, query: Option<&str>) -> Vec<&'a Post> {
        let needle = query
            .map(|q| q.trim().to_lowercase())
            .filter(|q| !q.is_empty());
        self.posts
            .iter()
            .filter(|p| filter.accepts(p))
            .filter(|p| needle.as_deref().is_none_or(|n| p.mentions(n)))
            .collect()
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
