//! # Domain Models
//!
//! Validated value types shared by the collaborators and the analysis engine.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`AssetAddress`] | Base58 token mint address |
//! | [`AssetSeries`] | Strictly time-ordered price history |
//! | [`PricePoint`] | Single `(unix_time, value)` observation |
//! | [`Granularity`] | Price-history bucket size |
//! | [`UnixTime`] | Second-resolution timestamp rendered as RFC3339 UTC |

mod address;
mod granularity;
mod series;
mod timestamp;

pub use address::AssetAddress;
pub use granularity::Granularity;
pub use series::{AssetSeries, PricePoint};
pub use timestamp::UnixTime;
