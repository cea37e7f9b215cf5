//! Property tests for the redaction round trip.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use ghost_gate::detection::{categories, DetectionError, EntityDetector, PatternDetector, Span};
use ghost_gate::redaction::{Redactor, RedactorConfig, Restorer, TokenScheme};
use proptest::prelude::*;

fn redactor(scheme: TokenScheme) -> Redactor {
    let config = RedactorConfig { token_scheme: scheme, ..Default::default() };
    Redactor::new(Arc::new(PatternDetector::new()), config)
}

fn scheme() -> impl Strategy<Value = TokenScheme> {
    prop_oneof![Just(TokenScheme::Counter), Just(TokenScheme::Random)]
}

/// Tags every word of the given list, in the order the list is stored.
struct WordDetector(Vec<Span>);

impl EntityDetector for WordDetector {
    fn analyze(&self, _: &str, _: &BTreeSet<String>, _: &str) -> Result<Vec<Span>, DetectionError> {
        Ok(self.0.clone())
    }
}

fn word_spans(words: &[String]) -> (String, Vec<Span>) {
    let mut text = String::new();
    let mut spans = Vec::new();
    for (i, word) in words.iter().enumerate() {
        if i > 0 {
            text.push(' ');
        }
        let start = text.len();
        text.push_str(word);
        let category = if i % 2 == 0 { categories::PERSON } else { categories::GPE };
        spans.push(Span::new(category, start, text.len()));
    }
    (text, spans)
}

proptest! {
    #[test]
    fn restore_recovers_original_text(
        text in "[a-zA-Z0-9 .,@:/-]{0,160}",
        secret in "x[a-z]{2,6}",
        scheme in scheme(),
    ) {
        let input = format!("{text} {secret} {text}");
        let protected = redactor(scheme).protect(&input, &[secret.as_str()]).unwrap();
        let restored = Restorer::default().restore(&protected.text, &protected.mapping);
        prop_assert_eq!(restored, input);
    }

    #[test]
    fn restoration_is_idempotent(
        user in "[a-z]{3,8}",
        domain in "[a-z]{3,8}",
        filler in "[a-z ]{0,40}",
    ) {
        let input = format!("{filler} mail {user}@{domain}.com or https://{domain}.org/{user}");
        let protected = redactor(TokenScheme::Counter).protect(&input, &Vec::<String>::new()).unwrap();
        let restorer = Restorer::default();
        let once = restorer.restore(&protected.text, &protected.mapping);
        let twice = restorer.restore(&once, &protected.mapping);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn custom_secret_never_survives_redaction(
        prefix in "[a-z ]{0,20}",
        secret in "x[a-z]{2,6}",
        suffix in "[a-z ]{0,20}",
        scheme in scheme(),
    ) {
        let shouted = secret.to_uppercase();
        let input = format!("{prefix}{secret}{suffix} {shouted}");
        let protected = redactor(scheme).protect(&input, &[secret.as_str()]).unwrap();
        prop_assert!(
            !protected.text.to_lowercase().contains(&secret),
            "secret found in redacted text: {}",
            protected.text
        );
    }

    #[test]
    fn placeholders_are_unique_and_present(
        users in proptest::collection::vec("[a-z]{3,8}", 1..6),
        scheme in scheme(),
    ) {
        let input = users
            .iter()
            .enumerate()
            .map(|(i, u)| format!("{u}{i}@example.com"))
            .collect::<Vec<_>>()
            .join(", ");
        let protected = redactor(scheme).protect(&input, &Vec::<String>::new()).unwrap();

        let placeholders: Vec<&str> = protected.mapping.placeholders().collect();
        let distinct: HashSet<&str> = placeholders.iter().copied().collect();
        prop_assert_eq!(placeholders.len(), users.len());
        prop_assert_eq!(distinct.len(), placeholders.len());
        for placeholder in placeholders {
            prop_assert!(protected.text.contains(placeholder));
        }
    }

    #[test]
    fn detector_span_order_does_not_matter(
        (words, order) in proptest::collection::vec("[a-z]{3,8}", 1..8)
            .prop_flat_map(|words| {
                let n = words.len();
                (Just(words), Just((0..n).collect::<Vec<_>>()).prop_shuffle())
            }),
    ) {
        let (text, spans) = word_spans(&words);
        let shuffled: Vec<Span> = order.iter().map(|&i| spans[i].clone()).collect();

        let sorted = Redactor::new(Arc::new(WordDetector(spans)), RedactorConfig::default());
        let scrambled = Redactor::new(Arc::new(WordDetector(shuffled)), RedactorConfig::default());

        let a = sorted.protect(&text, &Vec::<String>::new()).unwrap();
        let b = scrambled.protect(&text, &Vec::<String>::new()).unwrap();
        prop_assert_eq!(a, b);
    }
}
