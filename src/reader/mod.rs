//! Strict Markup Reader
//!
//! - SliceReader: zero-copy pull parser over well-formed markup
//! - Events: event types for pull parsing

pub mod events;
pub mod slice;

pub use events::XmlEvent;
pub use slice::{ParseError, SliceReader};
