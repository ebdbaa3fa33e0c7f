//! Promotional content for the tweeter: loading, selection and composition.
//!
//! - [`catalog`]: the three content collections, loaded once from CSV and text
//!   files and read-only afterwards. Load problems degrade to empty collections.
//! - [`compose`]: turns one item into tweet text of at most
//!   [`compose::MAX_TWEET_CHARS`] characters.
//! - [`select`]: the two-level random draw (collection kind, then item).
//!
//! ```
//! use promo_content::{ContentCatalog, ContentPack, select_content};
//! use rand::{SeedableRng, rngs::StdRng};
//!
//! let pack = ContentPack::new("Tech Folks", "People who build things", "https://bsky.app/x")
//!     .expect("all fields present");
//! let catalog = ContentCatalog::new(vec![pack], vec![], vec![]);
//!
//! let tweet = select_content(&catalog, &mut StdRng::seed_from_u64(7)).unwrap();
//! assert_eq!(
//!     tweet,
//!     "Check out my \"Tech Folks\" starter pack: People who build things https://bsky.app/x"
//! );
//! ```
pub mod catalog;
pub mod compose;
pub mod select;

pub use catalog::{ContentCatalog, ContentPack, ContentSources, load_feeds, load_packs, load_reasons};
pub use compose::{ComposeError, ELLIPSIS, MAX_TWEET_CHARS};
pub use select::{ContentItem, ContentKind, pick, select_content};
