//! Certificate Verification Library
//!
//! Fetches an official certificate from the verification backend by its
//! code and renders it with tamper-evident watermarks and copy protection.
//! This library provides functionality to:
//! - Run verification sessions with progress, cancellation and a watchdog
//! - Classify network and server failures into user-facing messages
//! - Decode the fetched PDF into independently rasterisable pages
//! - Stamp every rendered page with seven security overlay layers
//! - Block copy, print and save attempts while a document is displayed
//!
//! # Example
//!
//! ```no_run
//! use cert_verify::config::ViewerConfig;
//! use cert_verify::session::SessionController;
//!
//! # async fn run() -> cert_verify::Result<()> {
//! let controller = SessionController::new(ViewerConfig::default())?;
//! controller.start(Some("ABC123")).finished().await;
//!
//! let snapshot = controller.snapshot();
//! if snapshot.is_valid() {
//!     println!("{} pages verified", snapshot.pages().len());
//! } else if let Some(message) = snapshot.error_message() {
//!     println!("{}", message);
//! }
//! # Ok(())
//! # }
//! ```

pub mod alert;
pub mod config;
pub mod document;
pub mod error;
pub mod messages;
pub mod protection;
pub mod render;
pub mod session;
pub mod viewer;
pub mod watermark;

// Re-export commonly used items
pub use config::ViewerConfig;
pub use error::{Error, Result};
pub use session::{SessionController, SessionState, ViewerSnapshot};
pub use viewer::CertificateViewer;
pub use watermark::{apply_watermark, WatermarkContext};
