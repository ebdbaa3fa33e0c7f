//! Twitter/X API v2 integration: OAuth 1.0a request signing, the create-tweet
//! client and its wire types.
pub mod client;
pub mod oauth;
pub mod types;

pub use client::{TWITTER_API_BASE, TwitterApi};
pub use oauth::{OAuthCredentials, OAuthSigner};
