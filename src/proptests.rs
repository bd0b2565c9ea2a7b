use super::*;

use proptest::prelude::*;
use proptest::test_runner::{TestCaseError, TestCaseResult};
use std::collections::{BTreeMap, BTreeSet};

const VOCAB: u32 = 12;

/// Every distinct n-gram of length `1..=max_order` in `sentences`, by order.
fn corpus_ngrams(sentences: &[Vec<WordId>], max_order: usize) -> Vec<BTreeSet<Vec<WordId>>> {
    let mut by_order = vec![BTreeSet::new(); max_order];
    for sentence in sentences {
        for n in 1..=max_order {
            for window in sentence.windows(n) {
                by_order[n - 1].insert(window.to_vec());
            }
        }
    }
    by_order
}

/// Deepest suffix of `query[start..end]` whose every shorter suffix is stored.
fn model_longest(
    stored: &[BTreeSet<Vec<WordId>>],
    query: &[WordId],
    start: usize,
    end: usize,
) -> Option<usize> {
    let mut best = None;
    for s in (start..end).rev() {
        let order = end - s - 1;
        if order >= stored.len() || !stored[order].contains(&query[s..end]) {
            break;
        }
        best = Some(order);
    }
    best
}

fn check_against_model<D: Direction>(
    sentences: &[Vec<WordId>],
    max_order: usize,
    queries: &[Vec<WordId>],
) -> TestCaseResult {
    let stored = corpus_ngrams(sentences, max_order);
    let all: Vec<&[WordId]> = stored.iter().flatten().map(Vec::as_slice).collect();
    let counts = NgramCounts::from_ngrams(VOCAB, all.iter().copied());
    if counts.num_orders() == 0 {
        return Ok(());
    }

    let mut builder: NgramIndexBuilder<ArrayValues<u64>, D> =
        NgramIndexBuilder::new(&Config::default(), &counts, ArrayValues::new())
            .map_err(|e| TestCaseError::fail(e.to_string()))?;

    let mut offsets: BTreeMap<Vec<WordId>, Offset> = BTreeMap::new();
    for (i, ngram) in stored.iter().flatten().enumerate() {
        let offset = builder.insert(ngram, i as u64).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert!(offset.is_some(), "context of {:?} should resolve", ngram);
        offsets.insert(ngram.clone(), offset.unwrap_or_default());
    }
    let index = builder.finish();

    for (order, set) in stored.iter().enumerate() {
        prop_assert_eq!(index.len(order), set.len() as u64);
    }
    for (ngram, &offset) in &offsets {
        let order = ngram.len() - 1;
        let head = ngram[if D::REVERSED { 0 } else { order }];
        let words = index.reconstruct(offset, order, head).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(words.as_slice(), ngram.as_slice());
        prop_assert_eq!(index.lookup_ngram(ngram), Some(offset));
    }

    for query in queries {
        let truncated = &query[..query.len().min(max_order)];
        let expected = stored
            .get(truncated.len() - 1)
            .is_some_and(|s| s.contains(truncated));
        prop_assert_eq!(index.lookup_ngram(truncated).is_some(), expected);

        for end in 0..=query.len() {
            for start in 0..=end {
                let got = index.longest_context_match(query, start, end);
                let want = model_longest(&stored, query, start, end);
                prop_assert_eq!(got.map(|c| c.order), want);
                if let Some(ctx) = got {
                    let slice = &query[end - ctx.order - 1..end];
                    prop_assert_eq!(Some(ctx.offset), offsets.get(slice).copied());
                }
            }
        }
    }
    Ok(())
}

fn sentences_strategy() -> impl Strategy<Value = Vec<Vec<WordId>>> {
    prop::collection::vec(prop::collection::vec(0..VOCAB, 1..=10), 0..=20)
}

fn queries_strategy() -> impl Strategy<Value = Vec<Vec<WordId>>> {
    // Words up to VOCAB + 2 so out-of-vocabulary ids show up too.
    prop::collection::vec(prop::collection::vec(0..VOCAB + 2, 1..=6), 0..=10)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_codec_roundtrip(word_bits in 1u32..=32, w in any::<u32>(), o in any::<u64>()) {
        let layout = KeyLayout::new(word_bits).unwrap();
        let word = (u64::from(w) % layout.max_vocab_size()) as WordId;
        let offset = o % layout.max_capacity();
        let key = layout.encode(word, offset);
        prop_assert_eq!(layout.decode(key), (word, offset));
        prop_assert_ne!(key.raw(), u64::MAX);
    }

    #[test]
    fn prop_forward_matches_model(
        sentences in sentences_strategy(),
        max_order in 1usize..=4,
        queries in queries_strategy(),
    ) {
        check_against_model::<Forward>(&sentences, max_order, &queries)?;
    }

    #[test]
    fn prop_reversed_matches_model(
        sentences in sentences_strategy(),
        max_order in 1usize..=4,
        queries in queries_strategy(),
    ) {
        check_against_model::<Reversed>(&sentences, max_order, &queries)?;
    }

    #[test]
    fn prop_reinsert_is_idempotent(sentences in sentences_strategy()) {
        let stored = corpus_ngrams(&sentences, 3);
        let counts = NgramCounts::from_ngrams(VOCAB, stored.iter().flatten().map(Vec::as_slice));
        prop_assume!(counts.num_orders() > 0);
        let mut builder: NgramIndexBuilder<ArrayValues<()>> =
            NgramIndexBuilder::new(&Config::default(), &counts, ArrayValues::new()).unwrap();
        for set in &stored {
            for ngram in set {
                let first = builder.insert(ngram, ()).unwrap();
                let second = builder.insert(ngram, ()).unwrap();
                prop_assert_eq!(first, second);
            }
        }
        for (order, set) in stored.iter().enumerate() {
            prop_assert_eq!(builder.len(order), set.len() as u64);
        }
    }

    #[test]
    fn prop_missing_context_writes_nothing(
        known in prop::collection::btree_set(0..VOCAB, 0..VOCAB as usize),
        bigrams in prop::collection::vec((0..VOCAB, 0..VOCAB), 1..20),
    ) {
        let counts = NgramCounts::new(VOCAB, vec![VOCAB as u64, bigrams.len() as u64]);
        let mut builder: NgramIndexBuilder<ArrayValues<u8>> =
            NgramIndexBuilder::new(&Config::default(), &counts, ArrayValues::new()).unwrap();
        for &w in &known {
            builder.insert(&[w], 0).unwrap();
        }
        for (a, b) in bigrams {
            let before = builder.len(1);
            let got = builder.insert(&[a, b], 0).unwrap();
            if known.contains(&a) {
                prop_assert!(got.is_some());
            } else {
                prop_assert_eq!(got, None);
                prop_assert_eq!(builder.len(1), before);
            }
        }
    }
}
