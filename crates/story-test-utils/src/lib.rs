//! Testing utilities for the story converter workspace
//!
//! Shared uploaders, recorders and classic document fixtures.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use story_convert::{CancelFlag, ProgressEvent, ProgressSink, ProgressStage, TraceSink, TransferError, TransferReceipt, Uploader};
use story_graph::MediaContext;

/// Uploader that records every call and stores media as `media-<n>`
#[derive(Debug, Default)]
pub struct RecordingUploader {
    calls: AtomicUsize,
    urls: Mutex<Vec<String>>,
    failing: Vec<String>,
    cancel_after: Option<(usize, CancelFlag)>,
}

impl RecordingUploader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every URL containing `pattern`
    pub fn failing_on(mut self, pattern: impl Into<String>) -> Self {
        self.failing.push(pattern.into());
        self
    }

    /// Flip `flag` once `calls` transfers have finished
    pub fn cancel_after(mut self, calls: usize, flag: CancelFlag) -> Self {
        self.cancel_after = Some((calls, flag));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().clone()
    }
}

#[async_trait]
impl Uploader for RecordingUploader {
    async fn transfer(&self, url: &str, _context: &MediaContext) -> Result<TransferReceipt, TransferError> {
        self.urls.lock().push(url.to_string());
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        // let concurrently started transfers interleave
        tokio::task::yield_now().await;

        if let Some((after, flag)) = &self.cancel_after {
            if n >= *after {
                flag.cancel();
            }
        }
        if self.failing.iter().any(|pattern| url.contains(pattern.as_str())) {
            return Err(TransferError::Rejected {
                status: 404,
                message: format!("{url} not found"),
            });
        }
        Ok(TransferReceipt::stored(format!("media-{n}")))
    }
}

/// Progress sink that keeps every event
#[derive(Debug, Default)]
pub struct ProgressRecorder {
    events: Mutex<Vec<ProgressEvent>>,
}

impl ProgressRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().clone()
    }

    pub fn stages(&self) -> Vec<ProgressStage> {
        self.events.lock().iter().map(|e| e.stage).collect()
    }

    /// Events of the transfer stages only
    pub fn transfer_events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| {
                matches!(
                    e.stage,
                    ProgressStage::TransferStart | ProgressStage::TransferDone | ProgressStage::TransferFailed
                )
            })
            .cloned()
            .collect()
    }
}

impl ProgressSink for ProgressRecorder {
    fn emit(&self, event: &ProgressEvent) {
        self.events.lock().push(event.clone());
    }
}

/// Trace sink that keeps `+step` / `-step` markers with their payloads
#[derive(Debug, Default)]
pub struct TraceRecorder {
    steps: Mutex<Vec<(String, Value)>>,
}

impl TraceRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn markers(&self) -> Vec<String> {
        self.steps.lock().iter().map(|(m, _)| m.clone()).collect()
    }

    /// Payload passed to `on_exit` of `step`
    pub fn exit_payload(&self, step: &str) -> Option<Value> {
        let marker = format!("-{step}");
        self.steps
            .lock()
            .iter()
            .find(|(m, _)| *m == marker)
            .map(|(_, payload)| payload.clone())
    }
}

impl TraceSink for TraceRecorder {
    fn on_enter(&self, step: &str, payload: &Value) {
        self.steps.lock().push((format!("+{step}"), payload.clone()));
    }

    fn on_exit(&self, step: &str, payload: &Value) {
        self.steps.lock().push((format!("-{step}"), payload.clone()));
    }
}

/// Classic document fixtures
pub mod fixtures {
    use super::*;

    pub fn image(url: &str) -> Value {
        json!({"type": "image", "image": {"url": url}})
    }

    pub fn webmap(id: &str) -> Value {
        json!({"type": "webmap", "webmap": {"id": id, "extent": {"xmin": -1, "ymin": -1, "xmax": 1, "ymax": 1}}})
    }

    fn document(template: &str, values: Value) -> Value {
        let mut values = values;
        if let Some(object) = values.as_object_mut() {
            object.insert("template".into(), json!({ "name": template }));
        }
        json!({
            "item": {"id": "9f8e7d6c", "title": "Classic story"},
            "values": values
        })
    }

    /// Map Series with one entry per media descriptor
    pub fn series_with_media(media: &[Value]) -> Value {
        let entries: Vec<Value> = media
            .iter()
            .enumerate()
            .map(|(i, m)| json!({"title": format!("Entry {}", i + 1), "description": "<p>Text</p>", "media": m}))
            .collect();
        document("Map Series", json!({"title": "Series", "story": {"entries": entries}}))
    }

    /// Map Series whose entries carry `count` images, `urls` cycled
    pub fn series_with_images(urls: &[&str], count: usize) -> Value {
        let media: Vec<Value> = urls.iter().cycle().take(count).map(|u| image(u)).collect();
        series_with_media(&media)
    }

    pub fn map_journal() -> Value {
        document(
            "Map Journal",
            json!({
                "settings": {"layout": {"id": "side"}},
                "story": {"sections": [
                    {"title": "<p>Harbours</p>", "content": "<p>Ports of the north</p>", "media": image("https://media.test/home.jpg")},
                    {"title": "Old port", "content": "<p>Since <b>1200</b></p><p><img src=\"https://media.test/inline.jpg\"></p>",
                     "media": webmap("wm-harbour"),
                     "contentActions": [{"type": "media", "text": "Aerial", "media": image("https://media.test/aerial.jpg")}]},
                    {"title": "New port", "content": "<p>Containers</p>", "media": image("https://media.test/home.jpg")}
                ]}
            }),
        )
    }

    pub fn cascade() -> Value {
        document(
            "Cascade",
            json!({"sections": [
                {"type": "cover", "title": "Glaciers", "subtitle": "Retreat", "background": image("https://media.test/ice.jpg")},
                {"type": "sequence", "foreground": {"blocks": [
                    {"type": "text", "text": {"value": "<p>Ice moves.</p>"}},
                    webmap("wm-ice")
                ]}},
                {"type": "title", "foreground": {"title": {"value": "Causes"}}},
                {"type": "immersive", "views": [
                    {"background": image("https://media.test/melt.jpg"),
                     "foreground": {"panels": [{"blocks": [{"type": "text", "text": {"value": "<p>Melt</p>"}}]}]}}
                ]},
                {"type": "credits", "foreground": {"credits": [{"content": "Photos", "attribution": "Survey"}]}}
            ]}),
        )
    }

    pub fn map_tour() -> Value {
        document(
            "Map Tour",
            json!({
                "title": "Bridges",
                "webmap": "wm-bridges",
                "places": [
                    {"id": 1, "name": "Stone", "description": "<p>Oldest</p>", "pic_url": "https://media.test/stone.jpg",
                     "geometry": {"x": 10, "y": 20}},
                    {"id": 2, "name": "Iron", "pic_url": "https://media.test/iron.jpg"}
                ]
            }),
        )
    }

    pub fn shortlist() -> Value {
        document(
            "Shortlist",
            json!({
                "title": "Parks",
                "webmap": "wm-parks",
                "tabs": [
                    {"title": "Large", "places": [{"name": "Central", "pic_url": "https://media.test/central.jpg"}]},
                    {"title": "Small", "places": [{"name": "Pocket", "pic_url": "https://media.test/pocket.jpg"}]}
                ]
            }),
        )
    }

    /// Every convertible fixture with its expected format tag
    pub fn all_supported() -> Vec<(&'static str, Value)> {
        vec![
            ("map-journal", map_journal()),
            ("map-series", series_with_images(&["https://media.test/a.jpg"], 2)),
            ("cascade", cascade()),
            ("map-tour", map_tour()),
            ("shortlist", shortlist()),
        ]
    }
}
