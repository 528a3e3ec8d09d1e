//! Property tests for chunking and collection naming.

use docchat_rag::chunking::{Chunker, FixedSizeChunker, RecursiveChunker};
use docchat_rag::collection::{CollectionName, sanitize_thread_id};
use docchat_rag::document::Document;
use proptest::prelude::*;

fn arb_text() -> impl Strategy<Value = String> {
    proptest::collection::vec(
        prop_oneof![
            "[a-zA-Z]{1,12}",
            Just(" ".to_string()),
            Just("\n".to_string()),
            Just("\n\n".to_string()),
            Just(". ".to_string()),
            "[äöüéß]{1,3}",
        ],
        0..200,
    )
    .prop_map(|parts| parts.concat())
}

fn arb_sizes() -> impl Strategy<Value = (usize, usize)> {
    (1usize..80).prop_flat_map(|size| (Just(size), 0..size))
}

/// Every chunk fits the configured size, carries the document's metadata,
/// and chunking the same input twice gives the same sequence.
mod prop_chunking {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn recursive_chunks_are_bounded_deterministic_and_tagged(
            text in arb_text(),
            (size, overlap) in arb_sizes(),
        ) {
            let document = Document::new(text.clone(), "doc.pdf", 2);
            let chunker = RecursiveChunker::new(size, overlap);

            let first = chunker.chunk(&document);
            let second = chunker.chunk(&document);
            prop_assert_eq!(&first, &second);

            for chunk in &first {
                prop_assert!(chunk.text.chars().count() <= size);
                prop_assert!(!chunk.text.trim().is_empty());
                prop_assert_eq!(&chunk.metadata, &document.metadata);
            }
            prop_assert_eq!(first.is_empty(), text.trim().is_empty());
        }

        #[test]
        fn fixed_size_chunks_are_bounded_and_cover_the_text(
            text in arb_text(),
            (size, overlap) in arb_sizes(),
        ) {
            let document = Document::new(text.clone(), "doc.txt", 0);
            let chunks = FixedSizeChunker::new(size, overlap).chunk(&document);

            for chunk in &chunks {
                prop_assert!(chunk.text.chars().count() <= size);
            }
            // A word no longer than the overlap plus one always fits inside some window.
            for word in text.split_whitespace().filter(|w| w.chars().count() <= overlap + 1) {
                prop_assert!(
                    chunks.iter().any(|c| c.text.contains(word)),
                    "word {:?} lost", word
                );
            }
        }
    }
}

/// Sanitization maps each whitespace character to one underscore and is idempotent.
mod prop_collection_naming {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn sanitizing_is_idempotent_and_whitespace_free(raw in "[ \\ta-z0-9\\-]{0,30}") {
            let once = sanitize_thread_id(&raw);
            prop_assert_eq!(sanitize_thread_id(&once), once.clone());
            prop_assert!(!once.chars().any(char::is_whitespace));
            prop_assert_eq!(once.chars().count(), raw.trim().chars().count());
        }

        #[test]
        fn distinct_names_come_from_distinct_sanitized_ids(a in "[a-z ]{1,10}", b in "[a-z ]{1,10}") {
            if let (Ok(x), Ok(y)) = (CollectionName::from_thread_id(&a), CollectionName::from_thread_id(&b)) {
                prop_assert_eq!(x == y, sanitize_thread_id(&a) == sanitize_thread_id(&b));
            }
        }
    }

    #[test]
    fn runs_of_whitespace_are_not_collapsed() {
        assert_eq!(sanitize_thread_id("my thread"), "my_thread");
        assert_eq!(sanitize_thread_id("my  thread"), "my__thread");
        assert_eq!(sanitize_thread_id("  abc 123 \n"), "abc_123");
    }
}
