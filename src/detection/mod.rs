//! Entity detection.
//!
//! The named-entity engine is an external collaborator reached through the
//! [`EntityDetector`] trait. A regex-backed [`PatternDetector`] covers the
//! structured categories (phones, emails, SSNs, cards, IP addresses) so the
//! pipeline works without an NER engine, and [`CompositeDetector`] merges
//! several detectors into one.

pub mod composite;
pub mod entity_detector;
pub mod pattern_detector;
pub mod pattern_rules;

pub use composite::CompositeDetector;
pub use entity_detector::{categories, validate_spans, DetectionError, EntityDetector, Span};
pub use pattern_detector::PatternDetector;
