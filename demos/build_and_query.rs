//! Build a tiny reversed trigram index with ARPA-style payloads and query it.
//!
//! Run with `RUST_LOG=debug cargo run --example build_and_query` to see
//! table allocation and finalization events.

use ctxlm::{
    ArrayValues, Config, NgramCounts, NgramIndexBuilder, ProbBackoff, ProbBackoffValues,
    Reversed, WordId,
};
use tracing_subscriber::EnvFilter;

const WORDS: [&str; 5] = ["<s>", "the", "dog", "runs", "</s>"];

fn show(words: &[WordId]) -> String {
    words
        .iter()
        .map(|&w| WORDS[w as usize])
        .collect::<Vec<_>>()
        .join(" ")
}

fn main() -> ctxlm::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let sentence: Vec<WordId> = vec![0, 1, 2, 3, 4];
    let ngrams: Vec<&[WordId]> = (1..=3)
        .flat_map(|n| sentence.windows(n))
        .collect();
    let counts = NgramCounts::from_ngrams(WORDS.len() as u32, ngrams.iter().copied());

    let mut builder: NgramIndexBuilder<ProbBackoffValues, Reversed> =
        NgramIndexBuilder::new(&Config::default(), &counts, ArrayValues::new())?;
    for ngram in &ngrams {
        let value = ProbBackoff {
            log_prob: -(ngram.len() as f32) * 0.5,
            backoff: -0.1,
        };
        builder.insert(ngram, value)?;
    }
    let index = builder.finish();

    println!("=== Stored n-grams ===");
    for order in 0..index.num_orders() {
        for (offset, words) in index.ngrams(order) {
            let value = index.value(order, offset).unwrap_or_default();
            println!("  [{order}:{offset:>2}] {:<20} logp={:.2}", show(&words), value.log_prob);
        }
    }

    println!("\n=== Longest context ===");
    let query: Vec<WordId> = vec![1, 2, 3, 0];
    for end in 1..=query.len() {
        match index.longest_context_match(&query, 0, end) {
            Some(ctx) => {
                let words = &query[end - ctx.order - 1..end];
                println!("  {:<20} -> order {} ({})", show(&query[..end]), ctx.order, show(words));
            }
            None => println!("  {:<20} -> unknown", show(&query[..end])),
        }
    }

    let stats = index.stats();
    println!("\n=== Stats ===");
    for o in &stats.orders {
        println!(
            "  order {}: {} / {} slots (load {:.2})",
            o.order, o.len, o.capacity, o.load_factor
        );
    }
    println!("  {:.1} table bytes per n-gram", stats.bytes_per_ngram);
    Ok(())
}
