/*!
 * Controller lifecycle tests: build, start, translate, shutdown
 */

use tempfile::TempDir;

use chapterflow::app_config::{CacheBackendKind, EngineKind};
use chapterflow::providers::mock::{MockBehavior, MockEngine};
use chapterflow::scheduler::JobOptions;
use chapterflow::Controller;

use crate::common::{init_logging, mock_adapter, sample_chapters, test_config};

#[tokio::test]
async fn test_translateChapters_withMemoryStores_shouldReturnChaptersInOrder() {
    init_logging();
    let engine = MockEngine::working();
    let controller = Controller::build(test_config(), mock_adapter(engine.clone()), None).unwrap();
    assert_eq!(controller.start().await.unwrap(), 0);

    let result = controller
        .translate_chapters("alice", sample_chapters(3), JobOptions::default())
        .await
        .unwrap();

    let names: Vec<&str> = result.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["Chapter 1", "Chapter 2", "Chapter 3"]);
    assert!(result.iter().all(|(_, text)| text.starts_with("[fr] ")));
    assert!(controller.database_stats().is_none());

    controller.shutdown().await;
}

#[tokio::test]
async fn test_translateChapters_withFailedJob_shouldReturnError() {
    let engine = MockEngine::new(EngineKind::Google, MockBehavior::Panicking);
    let controller = Controller::build(test_config(), mock_adapter(engine), None).unwrap();
    controller.start().await.unwrap();

    let err = controller
        .translate_chapters("alice", sample_chapters(1), JobOptions::default())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("failed"));
    controller.shutdown().await;
}

#[tokio::test]
async fn test_translateChapters_withRateLimit_shouldRejectSecondRun() {
    let mut config = test_config();
    config.scheduler.rate_limit_secs = 60;
    let controller = Controller::build(config, mock_adapter(MockEngine::working()), None).unwrap();
    controller.start().await.unwrap();

    controller
        .translate_chapters("alice", sample_chapters(1), JobOptions::default())
        .await
        .unwrap();
    let second = controller
        .translate_chapters("alice", sample_chapters(1), JobOptions::default())
        .await;

    assert!(second.is_err());
    controller.shutdown().await;
}

#[tokio::test]
async fn test_sqliteStores_shouldServeCacheAcrossRestarts() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config();
    config.database_path = Some(dir.path().join("chapterflow.db").to_string_lossy().into_owned());
    config.cache.backend = CacheBackendKind::Sqlite;
    config.scheduler.persist_jobs = true;

    let first_engine = MockEngine::working();
    {
        let controller = Controller::build(config.clone(), mock_adapter(first_engine.clone()), None).unwrap();
        controller.start().await.unwrap();
        controller
            .translate_chapters("alice", sample_chapters(2), JobOptions::default())
            .await
            .unwrap();
        controller.shutdown().await;
    }
    assert_eq!(first_engine.request_count(), 2);

    let second_engine = MockEngine::working();
    let controller = Controller::build(config, mock_adapter(second_engine.clone()), None).unwrap();
    controller.start().await.unwrap();
    let result = controller
        .translate_chapters("bob", sample_chapters(2), JobOptions::default())
        .await
        .unwrap();

    assert_eq!(second_engine.request_count(), 0);
    assert_eq!(result[1].1, "[fr] This is chapter 2. It has two sentences.");

    let stats = controller.database_stats().unwrap().unwrap();
    assert_eq!(stats.job_count, 2);
    assert_eq!(stats.cache_count, 2);
    assert_eq!(controller.scheduler().list_jobs(None).len(), 2);

    controller.shutdown().await;
}

#[test]
fn test_shutdown_withoutStart_shouldReturn() {
    let controller = Controller::build(test_config(), mock_adapter(MockEngine::working()), None).unwrap();

    tokio_test::block_on(controller.shutdown());

    assert_eq!(controller.scheduler().queue_stats(None).total(), 0);
}

#[test]
fn test_build_withInvalidLanguage_shouldFail() {
    let mut config = test_config();
    config.target_language = "not-a-language".to_string();
    assert!(Controller::build(config, mock_adapter(MockEngine::working()), None).is_err());
}
