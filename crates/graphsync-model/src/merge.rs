//! Term merge reducer
//!
//! Conflict policy when an incoming term record meets a cached one:
//! - restriction lists are unioned (no duplicates, nothing removed)
//! - labels are merged per language, incoming text wins for a shared language
//! - owning vocabulary: incoming wins when it carries one, otherwise kept

use crate::entities::Term;
use crate::ids::Iri;
use indexmap::IndexMap;

/// Merge `incoming` into `existing` in place
pub fn merge_term(existing: &mut Term, incoming: Term) {
    debug_assert_eq!(existing.iri, incoming.iri);

    for (lang, label) in incoming.labels {
        existing.labels.insert(lang, label);
    }
    if incoming.vocabulary.is_some() {
        existing.vocabulary = incoming.vocabulary;
    }
    existing.restrictions.extend(incoming.restrictions);
}

/// Merge every incoming record into `cache`, inserting unknown terms
///
/// Returns the number of terms that were not cached before.
pub fn merge_terms<I>(cache: &mut IndexMap<Iri, Term>, incoming: I) -> usize
where
    I: IntoIterator<Item = Term>,
{
    let mut inserted = 0;
    for term in incoming {
        match cache.get_mut(&term.iri) {
            Some(existing) => merge_term(existing, term),
            None => {
                inserted += 1;
                cache.insert(term.iri.clone(), term);
            }
        }
    }
    inserted
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const P: &str = "http://example.org/p";

    #[test]
    fn restrictions_are_unioned() {
        let mut cached = Term::new("http://t").with_restriction(P, "http://a");
        merge_term(
            &mut cached,
            Term::new("http://t")
                .with_restriction(P, "http://a")
                .with_restriction(P, "http://b"),
        );
        assert_eq!(cached.restrictions.len(), 2);
    }

    #[test]
    fn scalars_last_write_wins() {
        let mut cached = Term::new("http://t")
            .in_vocabulary("http://v1")
            .with_label("en", "old")
            .with_label("cs", "starý");
        merge_term(
            &mut cached,
            Term::new("http://t").in_vocabulary("http://v2").with_label("en", "new"),
        );
        assert_eq!(cached.vocabulary, Some(Iri::from("http://v2")));
        assert_eq!(cached.labels["en"], "new");
        assert_eq!(cached.labels["cs"], "starý");
    }

    #[test]
    fn missing_vocabulary_does_not_erase() {
        let mut cached = Term::new("http://t").in_vocabulary("http://v1");
        merge_term(&mut cached, Term::new("http://t"));
        assert_eq!(cached.vocabulary, Some(Iri::from("http://v1")));
    }

    #[test]
    fn merge_terms_counts_insertions() {
        let mut cache = IndexMap::new();
        assert_eq!(merge_terms(&mut cache, vec![Term::new("http://a"), Term::new("http://b")]), 2);
        assert_eq!(merge_terms(&mut cache, vec![Term::new("http://a")]), 0);
        assert_eq!(cache.len(), 2);
    }

    fn arb_term() -> impl Strategy<Value = Term> {
        (
            0..4usize,
            proptest::collection::vec((0..3usize, 0..5usize), 0..6),
            proptest::option::of(0..2usize),
        )
            .prop_map(|(id, restrictions, vocab)| {
                let mut term = Term::new(format!("http://example.org/t{id}"));
                for (p, t) in restrictions {
                    term = term.with_restriction(
                        &format!("http://example.org/p{p}"),
                        &format!("http://example.org/x{t}"),
                    );
                }
                term.vocabulary = vocab.map(|v| Iri::from(format!("http://example.org/v{v}")));
                term
            })
    }

    proptest! {
        #[test]
        fn merging_twice_is_idempotent(batch in proptest::collection::vec(arb_term(), 0..12)) {
            let mut once = IndexMap::new();
            merge_terms(&mut once, batch.clone());
            let mut twice = once.clone();
            merge_terms(&mut twice, batch);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn restriction_union_is_order_independent(batch in proptest::collection::vec(arb_term(), 0..12)) {
            let mut forward = IndexMap::new();
            merge_terms(&mut forward, batch.clone());
            let mut backward = IndexMap::new();
            merge_terms(&mut backward, batch.into_iter().rev());

            prop_assert_eq!(forward.len(), backward.len());
            for (iri, term) in &forward {
                prop_assert_eq!(&term.restrictions, &backward[iri].restrictions);
            }
        }
    }
}
