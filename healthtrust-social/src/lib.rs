//! Community side of HealthTrust: posts, the feed, sessions, and the
//! backend REST client.
//!
//! - [`misinfo`]: local keyword screen applied before a post is accepted
//! - [`feed`] / [`post`]: in-memory feed owned by the caller
//! - [`factcheck`]: local-first fact-check that escalates to the assistant
//! - [`session`]: explicit session object with pluggable persistence
//! - [`api`]: bearer-authenticated backend client
//! - [`helpers`]: formatting and validation
pub mod api;
pub mod factcheck;
pub mod feed;
pub mod helpers;
pub mod misinfo;
pub mod post;
pub mod session;
