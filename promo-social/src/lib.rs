//! Social network publishing used by the promo tweeter.
//!
//! Only the Twitter/X create-tweet endpoint is implemented. Callers depend on
//! the [`Publisher`] trait so the bot can be exercised without the network.
pub mod publisher;
pub mod twitter;

pub use publisher::{PublishError, Published, Publisher};
