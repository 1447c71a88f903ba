//! Stream Module
//!
//! Ephemeral tokens that stand in for direct media URLs, so a leaked link
//! stops working once its short window has passed.

mod store;
mod token;

pub use store::{StreamTokenStore, TokenError};
pub use token::{IssuedToken, StreamToken};
