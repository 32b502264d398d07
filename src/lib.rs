//! Cardforge Engine
//!
//! A headless greeting-card rendering and export engine for Rust that provides
//! a high-level interface for composing cards from structured records,
//! exporting raster images, deriving share links, and browsing a remote
//! gallery.
//!
//! # Features
//!
//! - **Canonical template**: one deterministic layout rendered identically at
//!   thumbnail scale, full scale, or inside a view modal
//! - **Fixed-fidelity export**: PNG capture at a fixed pixel density,
//!   independent of on-screen scale and viewport scroll
//! - **HTTP Store Backend** (default): PostgREST-style paginated retrieval
//!
//! # Example
//!
//! ```no_run
//! use cardforge::{compose_card, CardConfig, Exporter, GreetingRecord};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CardConfig::default();
//! let record = GreetingRecord::new(
//!     "Asha Rao", "CSE", "2",
//!     "Happy New Year",
//!     "Wishing you a year of growth.\nKeep building.",
//!     "Dream big",
//! );
//!
//! let scene = compose_card(&record, &config, 1.0)?;
//! let exporter = Exporter::new(config);
//! if let Some(output) = exporter.export(&scene).await? {
//!     output.save_to(".")?;
//!     println!("saved {}", output.filename);
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub mod error;
pub use error::{Error, Result};

// Rendering pipeline: template -> layout -> paint -> raster
pub mod rendering;
pub use rendering::template::{compose_card, CardScene};
pub use rendering::CardImage;

// Export engine (raster capture + filename derivation)
pub mod export;
pub use export::{CaptureBackend, CaptureState, ExportOutput, Exporter, RasterBackend};

// Share link + QR payload derivation
pub mod share;
pub use share::{
    decode_share_identity, derive_share_link, identity_for, ErrorCorrection, QrDescriptor,
    ShareLink,
};

// Remote ordered store interface and backends
pub mod store;
#[cfg(feature = "http-store")]
pub use store::HttpGreetingStore;
pub use store::{GreetingStore, MemoryStore, PageRequest, PageResponse};

// Paginated gallery controller
pub mod gallery;
pub use gallery::{GalleryPaginator, LoadOutcome, LoadState};

// View modal state machine
pub mod modal;
pub use modal::ViewModal;

/// Configuration for the card engine
///
/// This struct contains the branding and policy knobs shared by the template,
/// the exporter, the share-link deriver, and the gallery paginator. The
/// defaults reproduce the original campus deployment and are safe to use
/// as-is in tests.
///
/// # Examples
///
/// ```
/// let cfg = cardforge::CardConfig::default();
/// assert_eq!(cfg.page_size, 8);
/// assert!(cfg.filename_prefix.contains("Greeting"));
/// ```
#[derive(Debug, Clone)]
pub struct CardConfig {
    /// Institution name shown in the card badge and footer
    pub institution: String,
    /// Footer message printed under the quote block
    pub footer_text: String,
    /// Decorative closing line under the footer
    pub footer_note: String,
    /// Fixed prefix for derived filenames
    pub filename_prefix: String,
    /// Version/year tag embedded in filenames and the footer note
    pub year_tag: String,
    /// Absolute origin used for share links, e.g. `https://cards.example.edu`
    pub share_origin: String,
    /// Opaque background color exports are composited onto
    pub background: (u8, u8, u8),
    /// Fixed capture multiplier above the logical layout size
    pub pixel_density: u32,
    /// Records fetched per gallery page
    pub page_size: usize,
    /// Character budget for the cosmetic gallery preview truncation
    pub preview_budget: usize,
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            institution: "Ramachandra College of Engineering".to_string(),
            footer_text: "With warm wishes from the RCE community".to_string(),
            footer_note: "Happy New Year 2026".to_string(),
            filename_prefix: "RCEE_Greeting".to_string(),
            year_tag: "2026".to_string(),
            share_origin: "https://greetings.rcee.ac.in".to_string(),
            background: (0x0a, 0x0a, 0x1a),
            pixel_density: 2,
            page_size: 8,
            preview_budget: 120,
        }
    }
}

/// One structured greeting entity, as retrieved from the store
///
/// Immutable once retrieved: this crate never mutates or deletes records, it
/// only renders, exports, and pages over them. The serde renames match the
/// remote store's column names so rows deserialize directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GreetingRecord {
    /// Store-assigned opaque identifier; empty for not-yet-stored records
    #[serde(default)]
    pub id: String,
    /// Full display name
    pub name: String,
    /// Short classification strings
    pub branch: String,
    pub year: String,
    /// Pre-generated display text
    #[serde(rename = "greeting_title")]
    pub title: String,
    /// Body text; embedded line breaks render as paragraph breaks
    #[serde(rename = "greeting_body")]
    pub body: String,
    #[serde(rename = "motivational_quote")]
    pub quote: String,
    /// Opaque timestamp, used only for store-side ordering
    #[serde(default)]
    pub created_at: String,
}

impl GreetingRecord {
    /// Build a record that has not been persisted yet (`id`/`created_at`
    /// empty). Useful for CLI rendering and tests.
    pub fn new(
        name: &str,
        branch: &str,
        year: &str,
        title: &str,
        body: &str,
        quote: &str,
    ) -> Self {
        Self {
            id: String::new(),
            name: name.to_string(),
            branch: branch.to_string(),
            year: year.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            quote: quote.to_string(),
            created_at: String::new(),
        }
    }

    /// Enforce the non-empty-field invariant.
    ///
    /// Every field except `id` and `created_at` must be non-empty after
    /// whitespace trimming. A record failing this check must not enter the
    /// render pipeline.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("name", &self.name),
            ("branch", &self.branch),
            ("year", &self.year),
            ("title", &self.title),
            ("body", &self.body),
            ("quote", &self.quote),
        ];
        for (label, value) in fields {
            if value.trim().is_empty() {
                return Err(Error::Validation(format!("empty field: {}", label)));
            }
        }
        Ok(())
    }
}

/// Severity of a notification surfaced to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

/// A fire-and-forget notification emitted by engine components
///
/// Presentation is a consumed interface: components call the registered
/// handler and never block on it.
#[derive(Debug, Clone)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

impl Notification {
    pub fn success(title: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            severity: Severity::Success,
        }
    }

    pub fn error(title: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            severity: Severity::Error,
        }
    }
}

/// Handler invoked with notifications; registered via `on_notify` on the
/// components that emit them.
pub type NotifyHandler = Arc<dyn Fn(&Notification) + Send + Sync>;
