//! Selection policy: pick a collection kind uniformly among the non-empty
//! ones, then an item uniformly within it.
//!
//! Kinds are weighted equally regardless of size, so one pack competes on
//! equal terms with a hundred feeds.
use rand::Rng;
use rand::seq::SliceRandom;

use crate::catalog::{ContentCatalog, ContentPack};
use crate::compose::{self, ComposeError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    StarterPack,
    Feed,
    Reason,
}

impl ContentKind {
    pub const ALL: [ContentKind; 3] = [
        ContentKind::StarterPack,
        ContentKind::Feed,
        ContentKind::Reason,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ContentKind::StarterPack => "starter pack",
            ContentKind::Feed => "feed",
            ContentKind::Reason => "reason",
        }
    }
}

/// One drawn item, borrowed from the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentItem<'a> {
    StarterPack(&'a ContentPack),
    Feed(&'a ContentPack),
    Reason(&'a str),
}

impl ContentItem<'_> {
    pub fn kind(&self) -> ContentKind {
        match self {
            ContentItem::StarterPack(_) => ContentKind::StarterPack,
            ContentItem::Feed(_) => ContentKind::Feed,
            ContentItem::Reason(_) => ContentKind::Reason,
        }
    }

    pub fn compose(&self) -> Result<String, ComposeError> {
        match self {
            ContentItem::StarterPack(pack) => compose::compose_pack(pack),
            ContentItem::Feed(feed) => compose::compose_feed(feed),
            ContentItem::Reason(reason) => Ok(compose::compose_reason(reason)),
        }
    }

    /// Short label for logs: the name, or the first 50 characters of a reason.
    pub fn summary(&self) -> String {
        match self {
            ContentItem::StarterPack(p) | ContentItem::Feed(p) => p.name.clone(),
            ContentItem::Reason(r) => r.chars().take(50).collect(),
        }
    }
}

/// Kinds that currently have at least one item, in declaration order.
pub fn available_kinds(catalog: &ContentCatalog) -> Vec<ContentKind> {
    ContentKind::ALL
        .into_iter()
        .filter(|kind| catalog.len_of(*kind) > 0)
        .collect()
}

/// Two-level uniform draw. `None` only when every collection is empty.
pub fn pick<'a, R: Rng + ?Sized>(catalog: &'a ContentCatalog, rng: &mut R) -> Option<ContentItem<'a>> {
    let kind = *available_kinds(catalog).choose(rng)?;
    match kind {
        ContentKind::StarterPack => catalog.packs().choose(rng).map(ContentItem::StarterPack),
        ContentKind::Feed => catalog.feeds().choose(rng).map(ContentItem::Feed),
        ContentKind::Reason => catalog
            .reasons()
            .choose(rng)
            .map(|r| ContentItem::Reason(r.as_str())),
    }
}

/// Draw one item and compose it into tweet text.
///
/// Returns `None` when there is nothing to post, or when the drawn item
/// cannot be composed within the length limit.
pub fn select_content<R: Rng + ?Sized>(catalog: &ContentCatalog, rng: &mut R) -> Option<String> {
    let Some(item) = pick(catalog, rng) else {
        tracing::warn!("No content available to tweet");
        return None;
    };

    tracing::info!(
        kind = item.kind().label(),
        "Selected {}: {}",
        item.kind().label(),
        item.summary()
    );

    match item.compose() {
        Ok(text) => Some(text),
        Err(e) => {
            tracing::warn!(kind = item.kind().label(), item = %item.summary(), error = %e, "content.compose.failed");
            None
        }
    }
}
