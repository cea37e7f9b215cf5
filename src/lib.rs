//! Ghost-Gate redaction gateway.
//!
//! Replaces sensitive values in free text with placeholders before the text
//! crosses a trust boundary, and puts the original values back into the
//! answer that comes back. The placeholder mapping never leaves the process
//! (or the attached [`vault::Vault`]).
//!
//! ```no_run
//! use std::sync::Arc;
//! use ghost_gate::detection::PatternDetector;
//! use ghost_gate::redaction::{Redactor, RedactorConfig, Restorer};
//!
//! let redactor = Redactor::new(Arc::new(PatternDetector::new()), RedactorConfig::default());
//! let protected = redactor.protect("Mail jane@example.com", &["Project Chimera"])?;
//! let restored = Restorer::default().restore(&protected.text, &protected.mapping);
//! assert_eq!(restored, "Mail jane@example.com");
//! # Ok::<(), ghost_gate::detection::DetectionError>(())
//! ```

pub mod audit;
pub mod config;
pub mod detection;
pub mod document;
pub mod gateway;
pub mod redaction;
pub mod telemetry;
pub mod vault;

pub use config::{ConfigError, GatewayConfig};
pub use detection::{DetectionError, EntityDetector, PatternDetector, Span};
pub use gateway::{ExchangeOutcome, Gateway, GatewayError, Upstream, UpstreamError};
pub use redaction::{Mapping, Marker, Protected, Redactor, RedactorConfig, Restorer, TokenScheme};
pub use vault::{MemoryVault, Vault, VaultError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
