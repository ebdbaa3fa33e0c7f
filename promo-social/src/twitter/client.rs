//! Minimal wrapper around the Twitter/X create-tweet endpoint.
//!
//! Signs each request with OAuth 1.0a user context and delegates transport to
//! the shared HTTP client. One publish attempt is one request; retry policy
//! lives with the scheduler. Success is decided by the status alone.
use async_trait::async_trait;
use promo_http::{Auth, HttpClient, HttpError, RequestOpts, StatusCode};
use reqwest::header::{AUTHORIZATION, HeaderValue};
use serde_json::Value;

use crate::publisher::{PublishError, Published, Publisher};
use crate::twitter::oauth::{OAuthCredentials, OAuthSigner};
use crate::twitter::types::{CreateTweetRequest, CreatedTweet};

pub const TWITTER_API_BASE: &str = "https://api.twitter.com";
const CREATE_TWEET_PATH: &str = "2/tweets";

#[derive(Clone)]
pub struct TwitterApi {
    http: HttpClient,
    signer: OAuthSigner,
}

impl TwitterApi {
    pub fn new(creds: OAuthCredentials) -> Result<Self, PublishError> {
        Self::with_base_url(creds, TWITTER_API_BASE)
    }

    /// Point the client at another host (tests, proxies).
    pub fn with_base_url(creds: OAuthCredentials, base: &str) -> Result<Self, PublishError> {
        let http = HttpClient::new(base).map_err(|e| PublishError::Client(e.to_string()))?;
        Ok(Self {
            http,
            signer: OAuthSigner::new(creds),
        })
    }

    /// Post `text` as a new tweet. Only `201 Created` counts as success.
    pub async fn create_tweet(&self, text: &str) -> Result<Published, PublishError> {
        let url = self
            .http
            .url_for(CREATE_TWEET_PATH)
            .map_err(|e| PublishError::Client(e.to_string()))?;
        let authorization = self.signer.sign("POST", url.as_str(), &[])?;
        let value = HeaderValue::from_str(&authorization)
            .map_err(|e| PublishError::Signing(format!("invalid Authorization header: {e}")))?;

        let resp = self
            .http
            .post_json(
                CREATE_TWEET_PATH,
                &CreateTweetRequest { text },
                RequestOpts {
                    auth: Some(Auth::Header {
                        name: AUTHORIZATION,
                        value,
                    }),
                    ..Default::default()
                },
            )
            .await
            .map_err(map_http_error)?;

        if resp.status != StatusCode::CREATED {
            return Err(PublishError::UnexpectedStatus(resp.status.as_u16()));
        }

        // The tweet is live from here on; the reply only adds detail.
        let created = match resp.json::<Value>() {
            Ok(reply) => CreatedTweet::from_reply(&reply),
            Err(e) => {
                tracing::warn!(request_id = %resp.request_id, error = %e, "twitter.reply.undecodable");
                None
            }
        };
        match &created {
            Some(tweet) => tracing::debug!(
                tweet_id = %tweet.id,
                request_id = %resp.request_id,
                "twitter.tweet.created"
            ),
            None => tracing::warn!(
                request_id = %resp.request_id,
                "Tweet accepted but the reply carried no tweet id"
            ),
        }
        Ok(Published {
            id: created.as_ref().map(|t| t.id.clone()),
            text: created.and_then(|t| t.text),
        })
    }
}

fn map_http_error(err: HttpError) -> PublishError {
    match err {
        HttpError::Api {
            status, message, ..
        } => PublishError::Rejected {
            status: status.as_u16(),
            message,
        },
        HttpError::Network(m) => PublishError::Transport(m),
        HttpError::Decode(e, _) => PublishError::Transport(format!("unreadable reply: {e}")),
        HttpError::Url(m) | HttpError::Build(m) => PublishError::Client(m),
    }
}

#[async_trait]
impl Publisher for TwitterApi {
    async fn publish(&self, text: &str) -> Result<Published, PublishError> {
        self.create_tweet(text).await
    }
}
