//! Media transfer behavior observed through full conversions.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::sync::Arc;
use story_convert::{CancelFlag, ConvertConfig, ConvertError, ConvertOptions, Converter, ProgressStage};
use story_graph::{node_type, resource_type, Graph, Resource, Subject};
use story_test_utils::{fixtures, ProgressRecorder, RecordingUploader};

fn image_resource<'a>(graph: &'a Graph, key: &str) -> (&'a story_graph::ResourceId, &'a Resource) {
    graph
        .resources_of(resource_type::IMAGE)
        .find(|(_, r)| r.data_str("src").is_some_and(|s| s.contains(key)) || r.data_str("resourceId") == Some(key))
        .unwrap_or_else(|| panic!("no image resource matching {key}"))
}

#[tokio::test]
async fn test_repeated_url_is_transferred_once_and_shared() {
    let uploader = Arc::new(RecordingUploader::new());
    let document = fixtures::series_with_images(&["https://media.test/a.jpg"], 2);
    let conversion = Converter::new()
        .convert(&document, &ConvertOptions::default().with_uploader(uploader.clone()))
        .await
        .unwrap();

    assert_eq!(uploader.calls(), 1);
    assert_eq!(conversion.transfers.attempted, 1);
    assert_eq!(conversion.transfers.reused, 1);

    let graph = &conversion.graph;
    let (id, resource) = image_resource(graph, "media-1");
    assert_eq!(graph.resources_of(resource_type::IMAGE).count(), 1);
    assert_eq!(resource.data_str("provider"), Some("item-resource"));
    assert_eq!(resource.data_str("src"), None);

    let referencing: Vec<_> = graph
        .nodes_of(node_type::IMAGE)
        .filter(|(_, n)| n.data_str("image") == Some(id.as_str()))
        .collect();
    assert_eq!(referencing.len(), 2);
}

#[tokio::test]
async fn test_url_variants_share_one_transfer() {
    let uploader = Arc::new(RecordingUploader::new());
    let document = fixtures::series_with_images(
        &[
            "http://MEDIA.test/a.jpg",
            "https://media.test/a.jpg",
            " //media.test/a.jpg#top",
        ],
        3,
    );
    let conversion = Converter::new()
        .convert(&document, &ConvertOptions::default().with_uploader(uploader.clone()))
        .await
        .unwrap();

    assert_eq!(uploader.urls(), vec!["http://MEDIA.test/a.jpg".to_string()]);
    assert_eq!(conversion.graph.resources_of(resource_type::IMAGE).count(), 1);
}

#[tokio::test]
async fn test_uploader_receives_source_url_as_written() {
    let uploader = Arc::new(RecordingUploader::new());
    let document = fixtures::series_with_images(
        &["http://Legacy.Example.org/Photo.JPG", "https://legacy.example.org/Photo.JPG"],
        2,
    );
    let conversion = Converter::new()
        .convert(&document, &ConvertOptions::default().with_uploader(uploader.clone()))
        .await
        .unwrap();

    assert_eq!(uploader.urls(), vec!["http://Legacy.Example.org/Photo.JPG".to_string()]);
    assert_eq!(conversion.transfers.reused, 1);
    assert!(conversion
        .transfers
        .outcomes
        .contains_key("https://legacy.example.org/Photo.JPG"));
}

#[tokio::test]
async fn test_cancel_before_start_transfers_nothing() {
    let uploader = Arc::new(RecordingUploader::new());
    let flag = CancelFlag::new();
    flag.cancel();
    let urls: Vec<String> = (0..10).map(|i| format!("https://media.test/{i}.jpg")).collect();
    let urls: Vec<&str> = urls.iter().map(String::as_str).collect();
    let options = ConvertOptions::default()
        .with_uploader(uploader.clone())
        .with_cancel(Arc::new(flag));

    let err = Converter::new()
        .convert(&fixtures::series_with_images(&urls, 10), &options)
        .await
        .unwrap_err();

    assert!(err.is_cancellation());
    assert!(matches!(err, ConvertError::Cancelled { completed: 0 }));
    assert_eq!(uploader.calls(), 0);
}

#[tokio::test]
async fn test_cancel_mid_phase_stops_further_starts() {
    let flag = CancelFlag::new();
    let uploader = Arc::new(RecordingUploader::new().cancel_after(3, flag.clone()));
    let urls: Vec<String> = (0..10).map(|i| format!("https://media.test/{i}.jpg")).collect();
    let urls: Vec<&str> = urls.iter().map(String::as_str).collect();
    let options = ConvertOptions::new(ConvertConfig::default().with_transfer_concurrency(1))
        .with_uploader(uploader.clone())
        .with_cancel(Arc::new(flag));

    let err = Converter::new()
        .convert(&fixtures::series_with_images(&urls, 10), &options)
        .await
        .unwrap_err();

    assert!(matches!(err, ConvertError::Cancelled { completed: 3 }));
    assert_eq!(uploader.calls(), 3);
}

#[tokio::test]
async fn test_failed_transfer_keeps_remote_source_without_warning() {
    let uploader = Arc::new(RecordingUploader::new().failing_on("missing"));
    let document = fixtures::series_with_images(
        &["https://media.test/present.jpg", "https://media.test/missing.jpg"],
        2,
    );
    let conversion = Converter::new()
        .convert(&document, &ConvertOptions::default().with_uploader(uploader.clone()))
        .await
        .unwrap();

    assert_eq!(uploader.calls(), 2);
    assert_eq!(conversion.transfers.failed, 1);
    assert_eq!(conversion.transfers.transferred, 1);

    let (failed_id, failed) = image_resource(&conversion.graph, "missing.jpg");
    assert_eq!(failed.data_str("src"), Some("https://media.test/missing.jpg"));
    assert_eq!(failed.data_str("provider"), Some("uri"));
    assert!(conversion.is_publishable());
    assert!(conversion
        .diagnostics
        .warnings
        .iter()
        .all(|w| w.subject != Subject::Resource(failed_id.clone())));
}

#[tokio::test]
async fn test_transfer_progress_starts_before_it_finishes() {
    let progress = Arc::new(ProgressRecorder::new());
    let urls = ["https://media.test/a.jpg", "https://media.test/b.jpg", "https://media.test/c.jpg"];
    let options = ConvertOptions::default()
        .with_uploader(Arc::new(RecordingUploader::new().failing_on("b.jpg")))
        .with_progress(progress.clone());
    Converter::new()
        .convert(&fixtures::series_with_images(&urls, 6), &options)
        .await
        .unwrap();

    let events = progress.transfer_events();
    assert_eq!(events.len(), 2 * urls.len());
    for url in urls {
        let position = |stage: ProgressStage| {
            events
                .iter()
                .position(|e| e.stage == stage && e.message.contains(url))
        };
        let start = position(ProgressStage::TransferStart).unwrap();
        let finish = position(ProgressStage::TransferDone)
            .or_else(|| position(ProgressStage::TransferFailed))
            .unwrap();
        assert!(start < finish, "{url}: finished before it started");
    }
    assert!(events.iter().all(|e| e.total == Some(urls.len())));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_one_transfer_per_unique_url(picks in proptest::collection::vec(0..5usize, 1..12)) {
        let pool: Vec<String> = (0..5).map(|i| format!("https://media.test/p{i}.jpg")).collect();
        let media: Vec<_> = picks.iter().map(|&i| fixtures::image(&pool[i])).collect();
        let mut unique = picks.clone();
        unique.sort_unstable();
        unique.dedup();

        let uploader = Arc::new(RecordingUploader::new());
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let conversion = runtime
            .block_on(Converter::new().convert(
                &fixtures::series_with_media(&media),
                &ConvertOptions::default().with_uploader(uploader.clone()),
            ))
            .unwrap();

        prop_assert_eq!(uploader.calls(), unique.len());
        prop_assert_eq!(conversion.transfers.attempted + conversion.transfers.reused, picks.len());
        prop_assert_eq!(conversion.graph.resources_of(resource_type::IMAGE).count(), unique.len());
    }
}
