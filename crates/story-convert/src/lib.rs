//! Classic Story Conversion
//!
//! Turns classic story documents (Map Journal, Map Series, Cascade,
//! Map Tour, Shortlist) into the story graph of [`story_graph`]:
//! - **Classification**: [`classify`] detects the [`LegacyFormat`]
//! - **Strategies**: one graph-building strategy per supported format
//! - **Transfers**: [`TransferOrchestrator`] moves external media through an
//!   injected [`Uploader`], deduplicated and cancellable
//! - **Validation**: the finished graph is checked and the findings returned
//!   as data
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use story_convert::{ConvertOptions, Converter, LegacyFormat};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let document = json!({
//!     "item": {"id": "0a1b", "title": "Rivers"},
//!     "values": {
//!         "template": {"name": "Map Series"},
//!         "story": {"entries": [{"title": "Source", "description": "<p>Springs</p>"}]}
//!     }
//! });
//!
//! let conversion = Converter::new()
//!     .convert(&document, &ConvertOptions::default())
//!     .await
//!     .unwrap();
//! assert_eq!(conversion.format, LegacyFormat::MapSeries);
//! assert!(conversion.is_publishable());
//! # }
//! ```

pub mod classify;
pub mod config;
pub mod converter;
pub mod error;
pub mod progress;
pub mod transfer;

mod content;
mod formats;
mod media;

// Re-exports
pub use classify::{classify, LegacyFormat};
pub use config::ConvertConfig;
pub use converter::{Conversion, ConvertOptions, Converter};
pub use error::{ConfigError, ConvertError, TransferError};
pub use progress::{
    CancelFlag, CancelProbe, NeverCancel, NoProgress, NoTrace, ProgressEvent, ProgressSink, ProgressStage,
    TraceSink,
};
pub use transfer::{KeepRemote, TransferOrchestrator, TransferReceipt, TransferReport, Uploader};

/// Version recorded in converted stories
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
