//! Metrics collection and Prometheus export.

use std::net::SocketAddr;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use tts_core::{Stage, TtsError, TtsResult};

/// Metrics recorder for synthesis runs.
///
/// Without an installed recorder every call is a no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct TtsMetrics;

impl TtsMetrics {
    /// Install the Prometheus exporter on `port` and register descriptions.
    pub fn init(port: u16) -> TtsResult<Self> {
        let addr: SocketAddr = ([0, 0, 0, 0], port).into();

        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .map_err(|e| TtsError::internal(format!("metrics init failed: {e}")))?;

        Self::register_metrics();

        Ok(Self)
    }

    /// Metrics handle without an exporter.
    pub fn init_noop() -> Self {
        Self
    }

    fn register_metrics() {
        describe_counter!("tts_utterances_total", "Utterances taken from the manifest");
        describe_counter!(
            "tts_utterances_completed",
            "Utterances synthesized and written"
        );
        describe_counter!("tts_utterances_failed", "Utterances that failed");

        describe_histogram!(
            "tts_stage_latency_ms",
            "Per-stage latency in milliseconds, labelled by stage"
        );
        describe_histogram!(
            "tts_rtf",
            "Real-time factor (processing time / audio duration)"
        );
        describe_histogram!("tts_audio_seconds", "Audio duration per utterance");
    }

    /// Record an utterance taken from the manifest.
    pub fn utterance_started(&self) {
        counter!("tts_utterances_total").increment(1);
    }

    /// Record an utterance written successfully.
    pub fn utterance_completed(&self) {
        counter!("tts_utterances_completed").increment(1);
    }

    /// Record an utterance failure at `stage`.
    pub fn utterance_failed(&self, stage: Stage) {
        counter!("tts_utterances_failed", "stage" => stage.as_str()).increment(1);
    }

    /// Record latency of one stage.
    pub fn record_stage_latency(&self, stage: Stage, ms: f64) {
        histogram!("tts_stage_latency_ms", "stage" => stage.as_str()).record(ms);
    }

    /// Record real-time factor.
    pub fn record_rtf(&self, rtf: f64) {
        histogram!("tts_rtf").record(rtf);
    }

    /// Record produced audio duration.
    pub fn record_audio_seconds(&self, seconds: f64) {
        histogram!("tts_audio_seconds").record(seconds);
    }
}
