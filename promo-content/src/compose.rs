//! Tweet Composer.
//!
//! Lengths are counted in `char`s (Unicode scalar values); embedded newlines
//! count as one each. Every successful composition is at most
//! [`MAX_TWEET_CHARS`] long.
use std::borrow::Cow;
use thiserror::Error;

use crate::catalog::ContentPack;

pub const MAX_TWEET_CHARS: usize = 280;
pub const ELLIPSIS: &str = "...";
const ELLIPSIS_CHARS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComposeError {
    /// The template plus name and link leave no room for a truncated description.
    #[error("fixed text is {fixed} characters, leaving no room for the description within {limit}")]
    FixedTextTooLong { fixed: usize, limit: usize },
}

pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn take_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Fit `description` after `fixed` characters of surrounding text.
///
/// Returns the description untouched when it fits. Otherwise it is cut so
/// that the kept prefix plus [`ELLIPSIS`] exactly fills the remaining budget.
/// Fails instead of cutting when the budget cannot even hold the ellipsis.
pub fn fit_description(description: &str, fixed: usize) -> Result<Cow<'_, str>, ComposeError> {
    let len = char_len(description);
    if fixed + len <= MAX_TWEET_CHARS {
        return Ok(Cow::Borrowed(description));
    }

    let budget = MAX_TWEET_CHARS.saturating_sub(fixed);
    if budget < ELLIPSIS_CHARS {
        return Err(ComposeError::FixedTextTooLong {
            fixed,
            limit: MAX_TWEET_CHARS,
        });
    }

    let kept = take_chars(description, budget - ELLIPSIS_CHARS);
    Ok(Cow::Owned(format!("{kept}{ELLIPSIS}")))
}

/// `Check out my "{name}" starter pack: {description} {link}`
pub fn compose_pack(pack: &ContentPack) -> Result<String, ComposeError> {
    let head = format!("Check out my \"{}\" starter pack: ", pack.name);
    let tail = format!(" {}", pack.link);
    let description = fit_description(&pack.description, char_len(&head) + char_len(&tail))?;
    Ok(format!("{head}{description}{tail}"))
}

/// `Feed to pin!: {name}\n{description}\nPin here:{link}`
pub fn compose_feed(feed: &ContentPack) -> Result<String, ComposeError> {
    let head = format!("Feed to pin!: {}\n", feed.name);
    let tail = format!("\nPin here:{}", feed.link);
    let description = fit_description(&feed.description, char_len(&head) + char_len(&tail))?;
    Ok(format!("{head}{description}{tail}"))
}

/// Reasons are posted verbatim, or cut to 277 characters plus the ellipsis.
pub fn compose_reason(reason: &str) -> String {
    if char_len(reason) <= MAX_TWEET_CHARS {
        return reason.to_string();
    }
    format!(
        "{}{ELLIPSIS}",
        take_chars(reason, MAX_TWEET_CHARS - ELLIPSIS_CHARS)
    )
}
