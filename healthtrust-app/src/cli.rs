use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// healthtrust - evidence-based health chat and community feed
#[derive(Parser, Debug)]
#[command(name = "healthtrust", version, about = "Health assistant and community feed")]
pub struct Cli {
    /// Configuration file (YAML)
    #[arg(short, long, global = true, default_value = "healthtrust.yaml", env = "HEALTHTRUST_CONFIG")]
    pub config: PathBuf,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Mirror logs to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Ask the health assistant a question
    Chat {
        message: String,

        /// Override the configured model
        #[arg(long)]
        model: Option<String>,

        #[arg(long)]
        max_tokens: Option<u32>,
    },

    /// Run the local misinformation screen on some text
    Check { text: String },

    /// Fact-check text, escalating high-risk content to the assistant
    FactCheck { text: String },

    /// Ask the assistant for a topic overview
    Info {
        topic: String,

        #[arg(long, default_value = "general")]
        audience: String,
    },

    /// Submit a post to the feed
    Post {
        content: String,

        /// Supporting source; repeatable
        #[arg(short, long = "source")]
        sources: Vec<String>,

        /// Also send the post to the backend
        #[arg(long)]
        publish: bool,
    },

    /// Show the community feed
    Feed {
        /// all, verified, discussions, alerts
        #[arg(short, long, default_value = "all")]
        filter: String,

        #[arg(short, long)]
        search: Option<String>,

        /// Fetch a page from the backend instead of the local feed
        #[arg(long)]
        remote: bool,

        #[arg(long, default_value_t = 1)]
        page: u32,
    },

    /// Enumerate candidate AI endpoints and payload shapes (diagnostic)
    Probe {
        #[arg(default_value = "Hello, what are the benefits of vaccination?")]
        message: String,
    },

    /// Check that the AI service is reachable
    TestConnection,

    /// Sign in; without a password the sign-in is simulated locally
    Login {
        email: String,

        #[arg(long)]
        password: Option<String>,
    },

    /// Create a local account
    Register { name: String, email: String },

    /// Sign out and forget the stored session
    Logout,

    /// Show the signed-in user
    Whoami,
}
