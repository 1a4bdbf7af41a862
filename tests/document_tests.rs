//! Document loader and metadata filter tests.

use std::collections::HashMap;

use fixrag::{MetadataFilter, load_text_documents};

#[tokio::test]
async fn loads_text_and_markdown_files_sorted_by_id() {
    let dir = tempfile::tempdir().unwrap();
    tokio::fs::write(dir.path().join("zebra.txt"), "zebra guide").await.unwrap();
    tokio::fs::write(dir.path().join("alpha.md"), "alpha guide").await.unwrap();
    tokio::fs::write(dir.path().join("ignored.pdf"), "binary").await.unwrap();

    let documents = load_text_documents(dir.path()).await.unwrap();
    assert_eq!(documents.len(), 2);
    assert_eq!(documents[0].id, "alpha");
    assert_eq!(documents[0].text, "alpha guide");
    assert_eq!(documents[1].id, "zebra");
    assert!(documents[1].source_uri.as_deref().unwrap().ends_with("zebra.txt"));
}

#[tokio::test]
async fn missing_directory_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope");
    assert!(load_text_documents(&missing).await.is_err());
}

#[test]
fn empty_filter_matches_everything() {
    let filter = MetadataFilter::default();
    assert!(filter.matches(&HashMap::new()));
    assert!(filter.matches(&HashMap::from([("a".to_string(), "b".to_string())])));
}

#[test]
fn filter_requires_every_listed_pair() {
    let filter = MetadataFilter::field_equals("device", "phone").and("guide_type", "replacement");
    let mut metadata = HashMap::from([("device".to_string(), "phone".to_string())]);
    assert!(!filter.matches(&metadata));
    metadata.insert("guide_type".to_string(), "replacement".to_string());
    assert!(filter.matches(&metadata));
    metadata.insert("device".to_string(), "laptop".to_string());
    assert!(!filter.matches(&metadata));
}
