//! Per-model performance metrics over forwarded results.
//!
//! Rolling windows of the last 100 data points per model, with a summary
//! report the UI renders as a comparison table. Synthetic results feed the
//! tracker automatically; the transport collaborator records real results
//! as they come back from the backend.

use crate::config::ModelKind;
use crate::log_debug;
use crate::protocol::TranscriptionResult;
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};

const MAX_DATA_POINTS: usize = 100;
const BEST_MODEL_MIN_SAMPLES: u64 = 5;
const PROCESSING_TIME_CEILING_MS: f64 = 5_000.0;

#[derive(Debug, Default)]
struct ModelStats {
    processing_times: VecDeque<f64>,
    confidences: VecDeque<f64>,
    text_lengths: VecDeque<f64>,
    count: u64,
}

impl ModelStats {
    fn record(&mut self, processing_time_ms: f64, confidence: f64, text_length: usize) {
        push_capped(&mut self.processing_times, processing_time_ms);
        push_capped(&mut self.confidences, confidence);
        push_capped(&mut self.text_lengths, text_length as f64);
        self.count += 1;
    }

    fn avg_processing_time(&self) -> f64 {
        average(&self.processing_times)
    }

    fn avg_confidence(&self) -> f64 {
        average(&self.confidences)
    }

    fn words_per_minute(&self) -> f64 {
        let avg_time = self.avg_processing_time();
        if avg_time <= 0.0 {
            return 0.0;
        }
        // Five characters per word is the usual estimate.
        let words = average(&self.text_lengths) / 5.0;
        words / (avg_time / 1_000.0) * 60.0
    }

    fn score(&self) -> f64 {
        let speed = 1.0 - (self.avg_processing_time() / PROCESSING_TIME_CEILING_MS).min(1.0);
        speed * 0.6 + self.avg_confidence() * 0.4
    }
}

fn push_capped(window: &mut VecDeque<f64>, value: f64) {
    window.push_back(value);
    while window.len() > MAX_DATA_POINTS {
        window.pop_front();
    }
}

fn average(values: &VecDeque<f64>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

#[derive(Debug, Default)]
pub struct PerformanceTracker {
    stats: BTreeMap<&'static str, ModelStats>,
}

impl PerformanceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        model: ModelKind,
        processing_time_ms: f64,
        confidence: f64,
        text_length: usize,
    ) {
        self.stats
            .entry(model.id())
            .or_default()
            .record(processing_time_ms, confidence, text_length);
    }

    /// Record a forwarded result. Unknown model tags are logged and skipped.
    pub fn record_result(&mut self, result: &TranscriptionResult) {
        let Some(model) = ModelKind::from_id(&result.model) else {
            log_debug(&format!("metrics: unknown model '{}'", result.model));
            return;
        };
        self.record(
            model,
            result.processing_time as f64,
            f64::from(result.confidence),
            result.text.len(),
        );
    }

    pub fn report(&self) -> MetricsReport {
        let models = self
            .stats
            .iter()
            .filter(|(_, stats)| stats.count > 0)
            .map(|(id, stats)| {
                (
                    *id,
                    ModelSummary {
                        avg_processing_time: stats.avg_processing_time(),
                        avg_confidence: stats.avg_confidence(),
                        words_per_minute: stats.words_per_minute(),
                        count: stats.count,
                    },
                )
            })
            .collect();
        MetricsReport {
            models,
            best_model: self.best_model(),
        }
    }

    pub fn reset(&mut self) {
        self.stats.clear();
    }

    /// Best-performing model: 60% weight on speed, 40% on confidence, with
    /// at least five samples required for a reliable comparison.
    fn best_model(&self) -> Option<&'static str> {
        self.stats
            .iter()
            .filter(|(_, stats)| stats.count >= BEST_MODEL_MIN_SAMPLES)
            .max_by(|a, b| {
                a.1.score()
                    .partial_cmp(&b.1.score())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(id, _)| *id)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub models: BTreeMap<&'static str, ModelSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_model: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelSummary {
    pub avg_processing_time: f64,
    pub avg_confidence: f64,
    pub words_per_minute: f64,
    pub count: u64,
}
