use crate::cli::{Cli, Command};
use anyhow::{Context, Result, bail};
use chrono::Utc;
use healthtrust_ai::alle::AlleAiService;
use healthtrust_ai::probe::probe_endpoints;
use healthtrust_ai::traits::HealthAssistant;
use healthtrust_ai::types::ChatOptions;
use healthtrust_common::observability::default_data_dir;
use healthtrust_config::HealthTrustConfig;
use healthtrust_social::api::{BackendApi, DEFAULT_PAGE_SIZE};
use healthtrust_social::factcheck::fact_check_content;
use healthtrust_social::feed::{Feed, FeedFilter};
use healthtrust_social::helpers::{format_number, format_timestamp, generate_avatar, is_valid_email};
use healthtrust_social::misinfo::assess_misinformation;
use healthtrust_social::post::{NewPost, Post};
use healthtrust_social::session::{FileSessionStore, SessionManager};
use serde::Serialize;
use std::sync::Arc;

struct App {
    json: bool,
    assistant: AlleAiService,
    session: SessionManager,
    backend: BackendApi,
}

fn print<T: Serialize>(json: bool, value: &T, human: impl FnOnce()) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        human();
    }
    Ok(())
}

fn print_post(post: &Post) {
    let now = Utc::now();
    let badge = if post.author.verified { " ✓" } else { "" };
    println!(
        "[{}] {}{} ({}) · {} · #{}",
        generate_avatar(&post.author.name),
        post.author.name,
        badge,
        post.author.title,
        format_timestamp(post.timestamp, now),
        post.id
    );
    println!("  {}", post.content);
    println!(
        "  ♥ {}  💬 {}{}",
        format_number(u64::from(post.likes)),
        format_number(u64::from(post.comments)),
        if post.fact_checked { "  [fact-checked]" } else { "" }
    );
    if !post.sources.is_empty() {
        println!("  sources: {}", post.sources.join(", "));
    }
    if let Some(insight) = &post.ai_insight {
        println!("  AI insight: {insight}");
    }
    if let Some(a) = post.assessment.as_ref().filter(|a| a.is_flagged) {
        println!("  ⚠ {} risk: {}", a.risk_level, a.flagged_keywords.join(", "));
    }
}

fn build(cli_json: bool, cfg: &HealthTrustConfig) -> Result<App> {
    let assistant = AlleAiService::from_settings(&cfg.ai)?;

    let session_path = cfg
        .session
        .path
        .clone()
        .unwrap_or_else(|| default_data_dir("healthtrust").join("session.json"));
    let session = SessionManager::new(Arc::new(FileSessionStore::new(session_path)));
    session.restore()?;

    let backend = BackendApi::new(&cfg.backend, session.clone())?;
    Ok(App {
        json: cli_json,
        assistant,
        session,
        backend,
    })
}

pub async fn run(cli: Cli, cfg: HealthTrustConfig) -> Result<()> {
    let ctx = build(cli.json, &cfg)?;
    let json = ctx.json;

    match cli.command {
        Command::Chat {
            message,
            model,
            max_tokens,
        } => {
            let opts = ChatOptions {
                model,
                max_tokens,
                ..Default::default()
            };
            let reply = ctx.assistant.chat_or_fallback(&message, &opts).await;
            print(json, &reply, || {
                println!("{}", reply.data.message);
                println!(
                    "\nconfidence {:.0}% · sources: {}",
                    reply.data.confidence * 100.0,
                    reply.data.sources.join(", ")
                );
                if let Some(url) = &reply.data.credits_url {
                    println!("add credits: {url}");
                }
                if let Some(notice) = &reply.notice {
                    println!("note: {notice}");
                }
            })
        }

        Command::Check { text } => {
            let assessment = assess_misinformation(&text);
            print(json, &assessment, || {
                println!("risk: {}", assessment.risk_level);
                for kw in &assessment.flagged_keywords {
                    println!("  flagged: {kw}");
                }
            })
        }

        Command::FactCheck { text } => {
            let outcome = fact_check_content(&ctx.assistant, &text).await;
            print(json, &outcome, || {
                let label = if outcome.is_verified { "verified" } else { "unverified" };
                println!("{label} ({:.0}%): {}", outcome.confidence * 100.0, outcome.explanation);
                if !outcome.flagged_keywords.is_empty() {
                    println!("flagged: {}", outcome.flagged_keywords.join(", "));
                }
                if !outcome.sources.is_empty() {
                    println!("sources: {}", outcome.sources.join(", "));
                }
            })
        }

        Command::Info { topic, audience } => {
            let result = ctx.assistant.get_health_info(&topic, &audience).await;
            let info = result.payload().context("no health information returned")?;
            print(json, &result, || {
                println!("{}\n", info.summary);
                if !info.detailed_info.is_empty() {
                    println!("{}\n", info.detailed_info);
                }
                for point in &info.key_points {
                    println!("  • {point}");
                }
                println!("sources: {}", info.sources.join(", "));
            })
        }

        Command::Post {
            content,
            sources,
            publish,
        } => {
            if !ctx.session.is_authenticated() {
                bail!("Please log in to post to the feed");
            }
            let mut feed = Feed::with_sample_posts(Utc::now());
            let post = feed.create_post(&content, sources.clone(), Utc::now())?.clone();
            if publish {
                let assessment = post.assessment.clone().unwrap_or_else(|| assess_misinformation(&content));
                ctx.backend
                    .create_post(&NewPost::from_assessed(&content, sources, &assessment))
                    .await?;
            }
            print(json, &post, || print_post(&post))
        }

        Command::Feed {
            filter,
            search,
            remote,
            page,
        } => {
            if !ctx.session.is_authenticated() {
                bail!("Please log in to view the feed");
            }
            let filter: FeedFilter = filter.parse()?;
            let feed = if remote {
                Feed::from_posts(ctx.backend.get_feed(page, DEFAULT_PAGE_SIZE).await?.posts)
            } else {
                Feed::with_sample_posts(Utc::now())
            };
            let posts: Vec<Post> = feed
                .view(filter, search.as_deref())
                .into_iter()
                .cloned()
                .collect();
            print(json, &posts, || {
                if posts.is_empty() {
                    println!("No posts found.");
                }
                for post in &posts {
                    print_post(post);
                    println!();
                }
            })
        }

        Command::Probe { message } => {
            let report = probe_endpoints(&ctx.assistant, &message).await;
            print(json, &report, || {
                if report.attempts.is_empty() {
                    println!("AI service not configured");
                }
                for a in &report.attempts {
                    let status = a.status.map(|s| s.to_string()).unwrap_or_else(|| "-".into());
                    println!("{:?} {} -> {}", a.shape, a.path, status);
                }
                match report.found_attempt() {
                    Some(hit) if report.credits_required => {
                        println!("endpoint found at {} but the account needs credits", hit.path)
                    }
                    Some(hit) => println!("working combination: {:?} at {}", hit.shape, hit.path),
                    None if !report.attempts.is_empty() => println!("no working endpoint found"),
                    None => {}
                }
            })
        }

        Command::TestConnection => {
            let configured = ctx.assistant.is_configured();
            let reachable = ctx.assistant.test_connection().await;
            let summary = serde_json::json!({ "configured": configured, "reachable": reachable });
            print(json, &summary, || {
                if !configured {
                    println!("AI service not configured");
                } else if reachable {
                    println!("AI service reachable");
                } else {
                    println!("AI service unreachable");
                }
            })?;
            if configured && !reachable {
                bail!("connection test failed");
            }
            Ok(())
        }

        Command::Login { email, password } => {
            if !is_valid_email(&email) {
                bail!("invalid email address: {email}");
            }
            match password {
                Some(password) => {
                    ctx.backend.login(&email, &password).await?;
                }
                None => {
                    ctx.session.login(&email)?;
                }
            }
            let session = ctx.session.current().context("sign-in did not produce a session")?;
            print(json, &session.user, || {
                println!("signed in as {} <{}>", session.user.name, session.user.email)
            })
        }

        Command::Register { name, email } => {
            if !is_valid_email(&email) {
                bail!("invalid email address: {email}");
            }
            let session = ctx.session.register(&name, &email)?;
            print(json, &session.user, || {
                println!("registered {} <{}>", session.user.name, session.user.email)
            })
        }

        Command::Logout => {
            if let Err(e) = ctx.backend.logout().await {
                tracing::warn!(error = %e, "logout.backend_failed");
            }
            print(json, &serde_json::json!({ "signedIn": false }), || {
                println!("signed out")
            })
        }

        Command::Whoami => match ctx.session.current() {
            Some(session) => print(json, &session.user, || {
                let verified = if session.user.verified { " (verified)" } else { "" };
                println!("{} <{}>{}", session.user.name, session.user.email, verified)
            }),
            None => print(json, &serde_json::Value::Null, || println!("not signed in")),
        },
    }
}
