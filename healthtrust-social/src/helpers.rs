//! Display and validation helpers shared by the feed and the CLI.

use crate::session::User;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static regex"))
}

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"https?://[^\s]+").expect("static regex"))
}

/// Relative age of `timestamp`, falling back to a calendar date after four
/// weeks.
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use healthtrust_social::helpers::format_timestamp;
///
/// let now = Utc.with_ymd_and_hms(2024, 3, 30, 12, 0, 0).unwrap();
/// assert_eq!(format_timestamp(now - Duration::seconds(30), now), "Just now");
/// assert_eq!(format_timestamp(now - Duration::minutes(5), now), "5m ago");
/// assert_eq!(format_timestamp(now - Duration::hours(3), now), "3h ago");
/// assert_eq!(format_timestamp(now - Duration::days(2), now), "2d ago");
/// assert_eq!(format_timestamp(now - Duration::days(15), now), "2w ago");
/// assert_eq!(format_timestamp(now - Duration::days(40), now), "2/19/2024");
/// ```
pub fn format_timestamp(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - timestamp).num_minutes();
    if minutes < 1 {
        return "Just now".to_string();
    }
    if minutes < 60 {
        return format!("{minutes}m ago");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{hours}h ago");
    }
    let days = hours / 24;
    if days < 7 {
        return format!("{days}d ago");
    }
    let weeks = days / 7;
    if weeks < 4 {
        return format!("{weeks}w ago");
    }
    timestamp.format("%-m/%-d/%Y").to_string()
}

pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordCheck {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

pub fn validate_password(password: &str) -> PasswordCheck {
    let rules: [(bool, &str); 4] = [
        (
            password.chars().count() >= 6,
            "Password must be at least 6 characters long",
        ),
        (
            password.chars().any(|c| c.is_ascii_uppercase()),
            "Password must contain at least one uppercase letter",
        ),
        (
            password.chars().any(|c| c.is_ascii_lowercase()),
            "Password must contain at least one lowercase letter",
        ),
        (
            password.chars().any(|c| c.is_ascii_digit()),
            "Password must contain at least one number",
        ),
    ];
    let errors: Vec<String> = rules
        .iter()
        .filter(|(ok, _)| !ok)
        .map(|(_, msg)| msg.to_string())
        .collect();
    PasswordCheck {
        is_valid: errors.is_empty(),
        errors,
    }
}

/// Escape characters that could open markup when echoed into HTML.
pub fn sanitize_input(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            other => out.push(other),
        }
    }
    out
}

pub fn extract_urls(text: &str) -> Vec<String> {
    url_regex()
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Initials for an avatar placeholder: first letters of the first two words.
pub fn generate_avatar(name: &str) -> String {
    let mut words = name.split_whitespace();
    let initials: String = match (words.next(), words.next()) {
        (Some(first), Some(second)) => first.chars().take(1).chain(second.chars().take(1)).collect(),
        (Some(first), None) => first.chars().take(1).collect(),
        _ => return "U".to_string(),
    };
    initials.to_uppercase()
}

/// `999`, `1.2K`, `3.4M`.
pub fn format_number(n: u64) -> String {
    match n {
        0..=999 => n.to_string(),
        1_000..=999_949 => format!("{:.1}K", n as f64 / 1_000.0),
        _ => format!("{:.1}M", n as f64 / 1_000_000.0),
    }
}

pub fn calculate_reading_time(text: &str) -> String {
    const WORDS_PER_MINUTE: usize = 200;
    let words = text.split_whitespace().count().max(1);
    format!("{} min read", words.div_ceil(WORDS_PER_MINUTE))
}

const PROFESSIONAL_TITLES: [&str; 6] = ["dr", "md", "phd", "rn", "np", "pa"];

/// Verified accounts, or a professional title in the name or bio
/// (`Dr.`, `M.D.`, `PhD`, `RN`, ...).
pub fn is_healthcare_professional(user: &User) -> bool {
    if user.verified {
        return true;
    }
    let has_title = |text: &str| {
        text.split(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '(' | ')'))
            .map(|token| token.replace('.', "").to_lowercase())
            .any(|token| PROFESSIONAL_TITLES.contains(&token.as_str()))
    };
    has_title(&user.name) || user.bio.as_deref().is_some_and(has_title)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str, bio: Option<&str>, verified: bool) -> User {
        User {
            id: 7,
            email: "u@example.org".into(),
            name: name.into(),
            avatar: None,
            verified,
            bio: bio.map(str::to_string),
        }
    }

    #[test]
    fn emails() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.de"));
        assert!(!is_valid_email("@c.de"));
    }

    #[test]
    fn password_rules_report_every_failure() {
        assert!(validate_password("Secret1").is_valid);
        let check = validate_password("abc");
        assert!(!check.is_valid);
        assert_eq!(
            check.errors,
            vec![
                "Password must be at least 6 characters long".to_string(),
                "Password must contain at least one uppercase letter".to_string(),
                "Password must contain at least one number".to_string(),
            ]
        );
    }

    #[test]
    fn sanitize_escapes_markup() {
        assert_eq!(
            sanitize_input(r#"<a href="/x">it's</a>"#),
            "&lt;a href=&quot;&#x2F;x&quot;&gt;it&#x27;s&lt;&#x2F;a&gt;"
        );
    }

    #[test]
    fn urls_are_extracted_in_order() {
        assert_eq!(
            extract_urls("see https://cdc.gov/flu and http://who.int ok"),
            vec!["https://cdc.gov/flu".to_string(), "http://who.int".to_string()]
        );
        assert!(extract_urls("no links").is_empty());
    }

    #[test]
    fn avatars() {
        assert_eq!(generate_avatar("sarah johnson"), "SJ");
        assert_eq!(generate_avatar("Dr. Michael Chen"), "DM");
        assert_eq!(generate_avatar("maria"), "M");
        assert_eq!(generate_avatar(""), "U");
    }

    #[test]
    fn numbers_and_reading_time() {
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1_240), "1.2K");
        assert_eq!(format_number(1_500_000), "1.5M");
        assert_eq!(format_number(999_949), "999.9K");
        assert_eq!(format_number(999_950), "1.0M");
        assert_eq!(calculate_reading_time(""), "1 min read");
        assert_eq!(calculate_reading_time(&"word ".repeat(201)), "2 min read");
    }

    #[test]
    fn professionals() {
        assert!(is_healthcare_professional(&user("Dr. Sarah Johnson", None, false)));
        assert!(is_healthcare_professional(&user("Ann Lee", Some("Pediatric RN, mom"), false)));
        assert!(is_healthcare_professional(&user("Ann Lee", Some("M.D. since 2001"), false)));
        assert!(is_healthcare_professional(&user("anyone", None, true)));
        assert!(!is_healthcare_professional(&user("Andrew Papa", Some("runner"), false)));
    }
}
