//! Fan a text out to several detectors and merge their spans.

use std::collections::BTreeSet;
use std::sync::Arc;

use super::entity_detector::{DetectionError, EntityDetector, Span};

/// Runs detectors in registration order. When spans from different
/// detectors overlap, the one from the earlier detector is kept. Overlaps
/// within one detector's output are passed through for span validation to
/// reject.
#[derive(Default)]
pub struct CompositeDetector {
    detectors: Vec<Arc<dyn EntityDetector>>,
}

impl CompositeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, detector: Arc<dyn EntityDetector>) -> Self {
        self.detectors.push(detector);
        self
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }
}

impl EntityDetector for CompositeDetector {
    fn analyze(
        &self,
        text: &str,
        categories: &BTreeSet<String>,
        locale: &str,
    ) -> Result<Vec<Span>, DetectionError> {
        let mut accepted: Vec<Span> = Vec::new();
        for detector in &self.detectors {
            let fresh: Vec<Span> = detector
                .analyze(text, categories, locale)?
                .into_iter()
                .filter(|span| {
                    !accepted
                        .iter()
                        .any(|kept| span.start < kept.end && kept.start < span.end)
                })
                .collect();
            accepted.extend(fresh);
        }
        accepted.sort_by_key(|s| (s.start, s.end));
        Ok(accepted)
    }
}
