//! Tests for the partial-file store.

use stamina::PartialStore;

use tokio::io::AsyncWriteExt;

mod common;
use common::helpers::*;

#[tokio::test]
async fn resume_offset_is_zero_without_a_cache_file() {
    let dir = create_temp_dir();
    let store = PartialStore::new(dir.path().join("app.bin"));

    assert_eq!(store.resume_offset().await.unwrap(), 0);
}

#[tokio::test]
async fn resume_offset_reports_the_cache_length_on_disk() {
    let dir = create_temp_dir();
    let store = PartialStore::new(dir.path().join("app.bin"));
    std::fs::write(store.cache_path(), test_content(1234)).unwrap();

    assert_eq!(store.resume_offset().await.unwrap(), 1234);
}

#[tokio::test]
async fn writer_at_offset_preserves_earlier_bytes() {
    let dir = create_temp_dir();
    let store = PartialStore::new(dir.path().join("app.bin"));
    std::fs::write(store.cache_path(), b"hello").unwrap();

    let mut file = store.writer_at(5).await.unwrap();
    file.write_all(b" world").await.unwrap();
    file.sync_all().await.unwrap();
    drop(file);

    assert_eq!(std::fs::read(store.cache_path()).unwrap(), b"hello world");
    assert_eq!(store.resume_offset().await.unwrap(), 11);
}

#[tokio::test]
async fn writer_creates_missing_parent_directories() {
    let dir = create_temp_dir();
    let store = PartialStore::new(dir.path().join("nested/deeper/app.bin"));

    let mut file = store.writer_at(0).await.unwrap();
    file.write_all(b"data").await.unwrap();
    drop(file);

    assert_eq!(store.resume_offset().await.unwrap(), 4);
}

#[tokio::test]
async fn promote_renames_the_cache_to_the_final_path() {
    let dir = create_temp_dir();
    let store = PartialStore::new(dir.path().join("app.bin"));
    let content = test_content(4096);
    std::fs::write(store.cache_path(), &content).unwrap();

    store.promote().await.unwrap();

    assert!(!store.cache_path().exists());
    assert!(store.is_promoted().await);
    assert_eq!(std::fs::read(store.final_path()).unwrap(), content);
}

#[tokio::test]
async fn removing_missing_files_is_not_an_error() {
    let dir = create_temp_dir();
    let store = PartialStore::new(dir.path().join("app.bin"));

    store.remove_cache().await.unwrap();
    store.remove_final().await.unwrap();
}

#[tokio::test]
async fn touch_cache_creates_an_empty_cache_file() {
    let dir = create_temp_dir();
    let store = PartialStore::new(dir.path().join("app.bin"));

    store.touch_cache().await.unwrap();

    assert_eq!(store.resume_offset().await.unwrap(), 0);
    assert!(store.cache_path().exists());
}
