use anyhow::{Result, anyhow};
use promo_content::{ContentCatalog, select_content};
use promo_social::Publisher;

/// One catalog, one publisher; each call to [`PromoBot::run_once`] is a cycle.
pub struct PromoBot<P> {
    catalog: ContentCatalog,
    publisher: P,
}

impl<P: Publisher> PromoBot<P> {
    pub fn new(catalog: ContentCatalog, publisher: P) -> Self {
        Self { catalog, publisher }
    }

    pub fn catalog(&self) -> &ContentCatalog {
        &self.catalog
    }

    /// Select, compose and publish one post.
    ///
    /// `Ok(true)` only when the platform accepted the post. Ordinary
    /// failures (nothing to post, rejected or lost request) are `Ok(false)`.
    /// A publisher that cannot even sign or build the request is `Err`.
    pub async fn run_once(&self) -> Result<bool> {
        tracing::info!("Running bot iteration...");

        let text = {
            let mut rng = rand::thread_rng();
            select_content(&self.catalog, &mut rng)
        };
        let Some(text) = text else {
            tracing::warn!("No content to tweet");
            return Ok(false);
        };

        let preview: String = text.chars().take(100).collect();
        tracing::info!("Generated tweet ({} chars): {preview}...", text.chars().count());

        match self.publisher.publish(&text).await {
            Ok(published) => {
                let head: String = text.chars().take(50).collect();
                tracing::info!(
                    tweet_id = published.id.as_deref().unwrap_or("-"),
                    "Tweet posted successfully: {head}..."
                );
                tracing::info!("Bot iteration completed successfully");
                Ok(true)
            }
            Err(e) if e.is_cycle_failure() => {
                tracing::error!("Failed to post tweet: {e}");
                tracing::error!("Bot iteration failed - tweet not posted");
                Ok(false)
            }
            Err(e) => Err(anyhow!(e).context("publisher could not send the tweet")),
        }
    }
}
