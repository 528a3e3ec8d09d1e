mod common;

use common::{FRUIT, Providers, env_credentials, pipeline_with, write_source};
use docchat_rag::{IngestRequest, RagError, SearchRequest, VectorStore};
use docchat_server::commands;

#[tokio::test]
async fn search_without_files_queries_the_existing_collection() {
    let pipeline = pipeline_with(Providers::answering("unused"), env_credentials());
    let dir = tempfile::tempdir().expect("tempdir");
    let source = write_source(&dir, "fruit.txt", FRUIT);
    pipeline.ingest(IngestRequest::new(vec![source], "shelf")).await.expect("ingest");

    let request = SearchRequest::new("Bananas are yellow.", "shelf").with_top_k(1);
    let report = commands::search(&pipeline, Vec::new(), request).await.expect("search");

    assert_eq!(report.results[0].chunk.text, "Bananas are yellow.");
    assert_eq!(pipeline.vector_store().count("shelf").await.expect("count"), 3);
}

#[tokio::test]
async fn search_with_files_ingests_before_querying() {
    let pipeline = pipeline_with(Providers::answering("unused"), env_credentials());
    let dir = tempfile::tempdir().expect("tempdir");
    let source = write_source(&dir, "fruit.txt", FRUIT);

    let request = SearchRequest::new("Grapes are purple.", "fresh").with_top_k(1);
    let report = commands::search(&pipeline, vec![source], request).await.expect("search");

    assert_eq!(report.collection.as_str(), "fresh");
    assert_eq!(report.results[0].chunk.text, "Grapes are purple.");
}

#[tokio::test]
async fn ask_without_files_on_an_unknown_thread_is_not_found() {
    let pipeline = pipeline_with(Providers::answering("unused"), env_credentials());

    let err = commands::ask(&pipeline, Vec::new(), SearchRequest::new("Anything?", "empty")).await.unwrap_err();
    assert!(matches!(err, RagError::CollectionNotFound { collection } if collection == "empty"));
}

#[tokio::test]
async fn ask_answers_from_the_thread() {
    let pipeline = pipeline_with(Providers::answering("Yellow."), env_credentials());
    let dir = tempfile::tempdir().expect("tempdir");
    let source = write_source(&dir, "fruit.txt", FRUIT);
    pipeline.ingest(IngestRequest::new(vec![source], "shelf")).await.expect("ingest");

    let answer = commands::ask(&pipeline, Vec::new(), SearchRequest::new("What colour are bananas?", "shelf"))
        .await
        .expect("answer");

    assert_eq!(answer, "Yellow.");
    assert_eq!(pipeline.vector_store().count("shelf").await.expect("count"), 3);
}
