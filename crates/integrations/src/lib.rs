//! Outbound HTTP collaborators: the click/pageview event API queried around
//! the estimated click instant, and the conversion-tracking API that receives
//! the attributed sale.

#![warn(clippy::unwrap_used)]

pub mod event_source;
pub mod registration;

pub use event_source::HttpEventWindowSource;
pub use registration::ConversionRegistrar;
