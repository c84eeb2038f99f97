//! Conversion orchestrator
//!
//! Drives one conversion: classify, build with the format strategy,
//! resolve media transfers, finalize and validate.
//!
//! Each call gets its own collaborators through [`ConvertOptions`]; nothing
//! is shared between conversions.

use crate::classify::{self, LegacyFormat};
use crate::config::ConvertConfig;
use crate::error::ConvertError;
use crate::formats::{strategy_for, BuildContext};
use crate::progress::{CancelProbe, NeverCancel, NoProgress, NoTrace, ProgressEvent, ProgressSink, ProgressStage, TraceSink};
use crate::transfer::{KeepRemote, TransferOrchestrator, TransferReport, Uploader};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use story_graph::{resource_type, Diagnostics, Graph, Resource, StructuralValidator};

/// Per-call configuration and injected collaborators
#[derive(Clone)]
pub struct ConvertOptions {
    /// Plain settings
    pub config: ConvertConfig,
    /// Media transfer boundary
    pub uploader: Arc<dyn Uploader>,
    /// Progress receiver
    pub progress: Arc<dyn ProgressSink>,
    /// Cancellation predicate
    pub cancel: Arc<dyn CancelProbe>,
    /// Step observer
    pub trace: Arc<dyn TraceSink>,
}

impl ConvertOptions {
    /// Options with the given configuration and no-op collaborators
    #[must_use]
    pub fn new(config: ConvertConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// With uploader
    #[must_use]
    pub fn with_uploader(mut self, uploader: Arc<dyn Uploader>) -> Self {
        self.uploader = uploader;
        self
    }

    /// With progress sink
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    /// With cancellation probe
    #[must_use]
    pub fn with_cancel(mut self, cancel: Arc<dyn CancelProbe>) -> Self {
        self.cancel = cancel;
        self
    }

    /// With trace sink
    #[must_use]
    pub fn with_trace(mut self, trace: Arc<dyn TraceSink>) -> Self {
        self.trace = trace;
        self
    }
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            config: ConvertConfig::default(),
            uploader: Arc::new(KeepRemote),
            progress: Arc::new(NoProgress),
            cancel: Arc::new(NeverCancel),
            trace: Arc::new(NoTrace),
        }
    }
}

impl std::fmt::Debug for ConvertOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConvertOptions")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Successful conversion
#[derive(Debug, Clone, Serialize)]
pub struct Conversion {
    /// Finished story graph
    pub graph: Graph,
    /// Structural findings; errors here do not fail the conversion
    pub diagnostics: Diagnostics,
    /// Detected legacy format
    pub format: LegacyFormat,
    /// Media transfer summary
    pub transfers: TransferReport,
    /// Classic items that had no story counterpart
    pub dropped: usize,
}

impl Conversion {
    /// Whether the graph can be published as-is
    #[inline]
    #[must_use]
    pub fn is_publishable(&self) -> bool {
        self.diagnostics.is_clean()
    }
}

/// Classic story converter
#[derive(Debug, Clone, Default)]
pub struct Converter {
    validator: StructuralValidator,
}

impl Converter {
    /// Converter with the default validation rules
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Converter with custom validation rules
    #[must_use]
    pub fn with_validator(validator: StructuralValidator) -> Self {
        Self { validator }
    }

    /// Convert a classic document given as JSON text
    pub async fn convert_str(&self, json: &str, options: &ConvertOptions) -> Result<Conversion, ConvertError> {
        let document: Value =
            serde_json::from_str(json).map_err(|err| ConvertError::InvalidDocument(err.to_string()))?;
        self.convert(&document, options).await
    }

    /// Convert a classic document
    ///
    /// Media transfers are the only suspension point. Cancellation is only
    /// consulted before a transfer starts, so documents without external
    /// media always complete.
    #[tracing::instrument(skip_all, fields(format = tracing::field::Empty))]
    pub async fn convert(&self, document: &Value, options: &ConvertOptions) -> Result<Conversion, ConvertError> {
        options.config.validate()?;
        let trace = options.trace.as_ref();
        let progress = options.progress.as_ref();

        progress.emit(&ProgressEvent::new(ProgressStage::Classify, "detecting classic format"));
        let format = step(trace, "classify", || classify::classify(document), |f| json!({ "format": f.tag() }))?;
        tracing::Span::current().record("format", format.tag());
        let strategy = strategy_for(format).ok_or(ConvertError::UnsupportedFormat { format })?;
        tracing::info!(%format, strategy = strategy.name(), "converting classic story");

        progress.emit(&ProgressEvent::new(ProgressStage::Build, format!("building {format} story")));
        let item = document.get("item").unwrap_or(&Value::Null);
        let (mut builder, dropped) = step(
            trace,
            "build",
            || {
                let values = classify::values(document)?;
                let mut ctx = BuildContext::new(&options.config, item)?;
                strategy.build(values, &mut ctx)?;
                Ok(ctx.finish())
            },
            |(builder, dropped)| {
                json!({
                    "nodes": builder.node_count(),
                    "resources": builder.resource_count(),
                    "media": builder.media_requests().len(),
                    "dropped": dropped,
                })
            },
        )?;

        let transfers = if builder.media_requests().is_empty() {
            TransferReport::default()
        } else {
            let orchestrator = TransferOrchestrator::new(Arc::clone(&options.uploader))
                .with_progress(Arc::clone(&options.progress))
                .with_cancel(Arc::clone(&options.cancel))
                .with_concurrency(options.config.transfer_concurrency);
            trace.on_enter("transfer", &json!({ "requests": builder.media_requests().len() }));
            let result = orchestrator.resolve_all(builder.media_requests()).await;
            trace.on_exit("transfer", &step_payload(&result, |r| {
                json!({ "attempted": r.attempted, "transferred": r.transferred, "failed": r.failed })
            }));
            let report = result?;
            builder.apply_transfers(&report.outcomes);
            report
        };

        let graph = step(
            trace,
            "finalize",
            || {
                builder.add_resource(
                    Resource::new(resource_type::CONVERTER_METADATA)
                        .with_data("classicType", format.tag())
                        .with_data("classicItemId", item.get("id").cloned().unwrap_or(Value::Null))
                        .with_data("converterVersion", crate::VERSION)
                        .with_data("mediaTransferred", transfers.transferred)
                        .with_data("mediaFailed", transfers.failed)
                        .with_data("droppedItems", dropped),
                );
                Ok(builder.build()?)
            },
            |graph| json!({ "nodes": graph.node_count(), "resources": graph.resource_count() }),
        )?;

        progress.emit(&ProgressEvent::new(ProgressStage::Validate, "checking story structure"));
        let diagnostics = step(
            trace,
            "validate",
            || Ok(self.validator.validate(&graph)),
            |d: &Diagnostics| json!({ "errors": d.errors.len(), "warnings": d.warnings.len() }),
        )?;

        tracing::info!(
            %format,
            nodes = graph.node_count(),
            resources = graph.resource_count(),
            errors = diagnostics.errors.len(),
            warnings = diagnostics.warnings.len(),
            dropped,
            "conversion finished"
        );
        progress.emit(&ProgressEvent::new(ProgressStage::Done, "conversion finished"));

        Ok(Conversion {
            graph,
            diagnostics,
            format,
            transfers,
            dropped,
        })
    }
}

/// Run one traced step, pairing `on_enter` with `on_exit`
fn step<T>(
    trace: &dyn TraceSink,
    name: &str,
    run: impl FnOnce() -> Result<T, ConvertError>,
    summary: impl FnOnce(&T) -> Value,
) -> Result<T, ConvertError> {
    trace.on_enter(name, &Value::Null);
    let result = run();
    trace.on_exit(name, &step_payload(&result, summary));
    result
}

fn step_payload<T>(result: &Result<T, ConvertError>, summary: impl FnOnce(&T) -> Value) -> Value {
    match result {
        Ok(value) => summary(value),
        Err(err) => json!({ "error": err.to_string() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::CancelFlag;
    use parking_lot::Mutex;
    use story_graph::{node_type, IssueCode};

    #[derive(Default)]
    struct Steps(Mutex<Vec<String>>);

    impl TraceSink for Steps {
        fn on_enter(&self, step: &str, _payload: &Value) {
            self.0.lock().push(format!("+{step}"));
        }

        fn on_exit(&self, step: &str, _payload: &Value) {
            self.0.lock().push(format!("-{step}"));
        }
    }

    fn series(entries: Value) -> Value {
        json!({
            "item": {"id": "abc", "title": "Item title"},
            "values": {"template": {"name": "Map Series"}, "story": {"entries": entries}}
        })
    }

    #[tokio::test]
    async fn test_text_only_story_converts_clean() {
        let document = series(json!([{"title": "One", "description": "<p>Hello</p>"}]));
        let conversion = Converter::new()
            .convert(&document, &ConvertOptions::default())
            .await
            .unwrap();

        assert_eq!(conversion.format, LegacyFormat::MapSeries);
        assert!(conversion.is_publishable());
        assert!(conversion.diagnostics.is_empty(), "{:?}", conversion.diagnostics);
        assert_eq!(conversion.transfers, TransferReport::default());

        let (_, meta) = conversion
            .graph
            .resources_of(resource_type::CONVERTER_METADATA)
            .next()
            .unwrap();
        assert_eq!(meta.data_str("classicType"), Some("map-series"));
        assert_eq!(meta.data_str("classicItemId"), Some("abc"));
        let cover = conversion.graph.nodes_of(node_type::STORY_COVER).next().unwrap().1;
        assert_eq!(cover.data_str("title"), Some("Item title"));
    }

    #[tokio::test]
    async fn test_trace_steps_pair_up() {
        let steps = Arc::new(Steps::default());
        let document = series(json!([
            {"title": "One", "media": {"type": "image", "image": {"url": "https://a.test/1.jpg"}}}
        ]));
        Converter::new()
            .convert(&document, &ConvertOptions::default().with_trace(steps.clone()))
            .await
            .unwrap();

        assert_eq!(
            *steps.0.lock(),
            ["+classify", "-classify", "+build", "-build", "+transfer", "-transfer", "+finalize", "-finalize", "+validate", "-validate"]
        );
    }

    #[tokio::test]
    async fn test_cancel_flag_without_media_still_completes() {
        let flag = CancelFlag::new();
        flag.cancel();
        let options = ConvertOptions::default().with_cancel(Arc::new(flag));
        let conversion = Converter::new()
            .convert(&series(json!([{"title": "Plain"}])), &options)
            .await;
        assert!(conversion.is_ok());
    }

    #[tokio::test]
    async fn test_unsupported_and_invalid_input() {
        let converter = Converter::new();
        let options = ConvertOptions::default();

        let err = converter
            .convert(&json!({"values": {"template": {"name": "Basic"}}}), &options)
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::UnsupportedFormat { format: LegacyFormat::Basic }));

        let err = converter.convert_str("not json", &options).await.unwrap_err();
        assert!(matches!(err, ConvertError::InvalidDocument(_)));
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let options = ConvertOptions::new(ConvertConfig::default().with_transfer_concurrency(0));
        let err = Converter::new()
            .convert(&series(json!([])), &options)
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::Config(_)));
    }

    #[tokio::test]
    async fn test_diagnostics_are_data() {
        let mut rules = story_graph::ValidationContext::default();
        rules.map_sizes = vec!["tiny".into()];
        let converter = Converter::with_validator(StructuralValidator::with_context(rules));
        let document = series(json!([{"title": "M", "media": {"type": "webmap", "webmap": {"id": "m"}}}]));

        let conversion = converter.convert(&document, &ConvertOptions::default()).await.unwrap();
        assert!(conversion.is_publishable());
        assert_eq!(conversion.diagnostics.warnings_with(IssueCode::UnknownSize).count(), 1);
    }
}
