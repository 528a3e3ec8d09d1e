//! Property tests for in-memory vector store search ordering and accumulation.

use docchat_rag::document::{Chunk, IndexedChunk};
use docchat_rag::inmemory::InMemoryVectorStore;
use docchat_rag::vectorstore::VectorStore;
use proptest::prelude::*;

const MODEL: &str = "prop-model";

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map("non-zero embedding", |mut v| {
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm < 1e-8 {
            return None;
        }
        for val in &mut v {
            *val /= norm;
        }
        Some(v)
    })
}

/// Generate an indexed chunk with a normalized embedding.
fn arb_chunk(dim: usize) -> impl Strategy<Value = IndexedChunk> {
    ("[a-z]{3,8}", "[a-z ]{5,30}", arb_normalized_embedding(dim)).prop_map(|(id, text, embedding)| IndexedChunk {
        id,
        chunk: Chunk { text, ..Default::default() },
        embedding,
    })
}

/// For any set of stored chunks, searching returns results ordered by
/// descending cosine similarity, and never more than `top_k` of them.
mod prop_inmemory_search_ordering {
    use super::*;

    const DIM: usize = 16;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn results_ordered_descending_and_bounded_by_top_k(
            chunks in proptest::collection::vec(arb_chunk(DIM), 1..20),
            query in arb_normalized_embedding(DIM),
            top_k in 1usize..25,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let results = rt.block_on(async {
                let store = InMemoryVectorStore::new();
                store.upsert("test", MODEL, &chunks).await.unwrap();
                store.search("test", MODEL, &query, top_k).await.unwrap()
            });

            prop_assert!(results.len() <= top_k);
            prop_assert_eq!(results.len(), top_k.min(chunks.len()));

            for window in results.windows(2) {
                prop_assert!(
                    window[0].score >= window[1].score,
                    "results not in descending order: {} < {}",
                    window[0].score,
                    window[1].score,
                );
            }
        }
    }
}

/// Upserting the same batch repeatedly accumulates; nothing is deduplicated.
mod prop_inmemory_upsert_accumulates {
    use super::*;

    const DIM: usize = 8;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn count_grows_by_batch_size_on_every_upsert(
            chunks in proptest::collection::vec(arb_chunk(DIM), 1..10),
            rounds in 1usize..4,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let (counts, created) = rt.block_on(async {
                let store = InMemoryVectorStore::new();
                let mut counts = Vec::new();
                let mut created = Vec::new();
                for _ in 0..rounds {
                    let outcome = store.upsert("acc", MODEL, &chunks).await.unwrap();
                    created.push(outcome.created);
                    counts.push(store.count("acc").await.unwrap());
                }
                (counts, created)
            });

            for (round, count) in counts.iter().enumerate() {
                prop_assert_eq!(*count, chunks.len() * (round + 1));
            }
            prop_assert!(created[0]);
            prop_assert!(created[1..].iter().all(|c| !c));
        }
    }
}
