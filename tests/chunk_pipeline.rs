mod common;

use common::{test_config, MemoryStore};
use embedsmith::config::ChunkStrategy;
use embedsmith::hub::DatasetRecord;
use embedsmith::pipeline::chunk_dataset;
use embedsmith::PipelineError;

#[tokio::test]
async fn empty_records_yield_no_chunks() {
    let store = MemoryStore::default();
    store.seed_texts("org/source", "train", "text", &["ab", "", "cd"]);
    let config = test_config(ChunkStrategy::Constant, 1, 2);

    let published = chunk_dataset(&store, &config, "org/source").await.unwrap();
    assert_eq!(published, "org/chunked");

    let rows = store.latest("org/chunked").unwrap();
    let texts: Vec<&str> = rows.iter().filter_map(|row| row.text("text")).collect();
    assert_eq!(texts, vec!["a", "b", "c", "d"]);
}

#[tokio::test]
async fn chunk_count_and_order_are_preserved() {
    let store = MemoryStore::default();
    store.seed_texts(
        "org/source",
        "train",
        "text",
        &["first. second", "third", ". leading"],
    );
    let mut config = test_config(ChunkStrategy::Sequence, 512, 2);
    config.chunk.separator = ". ".to_string();

    chunk_dataset(&store, &config, "org/source").await.unwrap();

    let rows = store.latest("org/chunked").unwrap();
    let texts: Vec<&str> = rows.iter().filter_map(|row| row.text("text")).collect();
    // "first. second" -> ["first", "second"], "third" -> ["third"],
    // ". leading" -> ["", "leading"] with the empty chunk dropped
    assert_eq!(texts, vec!["first", "second", "third", "leading"]);
}

#[tokio::test]
async fn all_configured_splits_are_concatenated_in_order() {
    let store = MemoryStore::default();
    store.seed_texts("org/source", "train", "text", &["from train"]);
    store.seed_texts("org/source", "validation", "text", &["from validation"]);
    let mut config = test_config(ChunkStrategy::Sequence, 512, 2);
    config.source_splits = vec!["train".to_string(), "validation".to_string()];

    chunk_dataset(&store, &config, "org/source").await.unwrap();

    let rows = store.latest("org/chunked").unwrap();
    let texts: Vec<&str> = rows.iter().filter_map(|row| row.text("text")).collect();
    assert_eq!(texts, vec!["from train", "from validation"]);
}

#[tokio::test]
async fn publish_carries_configured_visibility() {
    let store = MemoryStore::default();
    store.seed_texts("org/source", "train", "text", &["row"]);
    let mut config = test_config(ChunkStrategy::Sequence, 512, 2);
    config.chunk.private = false;

    chunk_dataset(&store, &config, "org/source").await.unwrap();

    let versions = store.versions("org/chunked");
    assert_eq!(versions.len(), 1);
    assert!(!versions[0].1, "publish should be public");
}

#[tokio::test]
async fn missing_text_field_aborts_before_publish() {
    let store = MemoryStore::default();
    store.seed_split(
        "org/source",
        "train",
        vec![
            DatasetRecord::from_text("text", "good row"),
            DatasetRecord::from_text("body", "wrong field"),
        ],
    );
    let config = test_config(ChunkStrategy::Sequence, 512, 2);

    let err = chunk_dataset(&store, &config, "org/source")
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::MissingField { .. }));
    assert!(
        store.versions("org/chunked").is_empty(),
        "no partial dataset may be published"
    );
}
