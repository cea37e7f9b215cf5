//! Redaction and restoration pipeline.

pub mod mapping;
pub mod redactor;
pub mod restorer;
pub mod token_minter;

pub use mapping::{Mapping, MappingEntry, MappingError};
pub use redactor::{find_urls, Protected, RedactionStats, Redactor, RedactorConfig};
pub use restorer::{unknown_placeholders, Marker, RestoreReport, Restorer};
pub use token_minter::{placeholder_pattern, TokenMinter, TokenScheme};
