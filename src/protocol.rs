//! Wire shapes consumed by the transport collaborator.
//!
//! Events are serialized untagged so the JSON matches the transport contract
//! exactly: a chunk is `{"audio": ..., "synthetic": ..., "model": ...}`, a
//! client-only result is `{"result": {...}}`, an advisory is
//! `{"advisory": ...}`. Level updates do not travel through this channel.

use serde::{Deserialize, Serialize};

/// One outbound event handed to the sink. Exactly one producer (real capture
/// or fallback) emits these at any instant; ordering is FIFO per session.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum OutboundEvent {
    /// Encoded audio bound for the transcription backend.
    Chunk {
        /// `data:` URI framing the encoded container.
        audio: String,
        synthetic: bool,
        model: String,
    },
    /// Synthetic transcription produced client-side, bypassing the backend.
    Result { result: TranscriptionResult },
    /// User-visible notice about pipeline health (e.g. demo mode engaged).
    Advisory { advisory: String },
}

/// A transcription-shaped payload. Real results arrive from the backend over
/// the transport; synthetic ones are produced by the fallback generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionResult {
    pub text: String,
    pub confidence: f32,
    pub model: String,
    /// Milliseconds the (real or pretended) inference took.
    pub processing_time: u64,
    /// Unix epoch milliseconds at emission.
    pub timestamp: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
}

/// Sentiment block attached to results when sentiment analysis is enabled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sentiment {
    /// Polarity in [-1, 1].
    pub polarity: f32,
    pub label: String,
    pub emoji: String,
    pub confidence: f32,
    pub specific_emotion: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_event_serializes_flat() {
        let event = OutboundEvent::Chunk {
            audio: "data:audio/wav;base64,AAAA".to_string(),
            synthetic: true,
            model: "google".to_string(),
        };
        let json = serde_json::to_value(&event).expect("serialize chunk");
        assert_eq!(json["synthetic"], true);
        assert_eq!(json["model"], "google");
        assert!(json.get("event").is_none(), "untagged envelope expected");
    }

    #[test]
    fn result_event_nests_under_result_key() {
        let event = OutboundEvent::Result {
            result: TranscriptionResult {
                text: "hello".to_string(),
                confidence: 0.9,
                model: "whisper".to_string(),
                processing_time: 210,
                timestamp: 1_700_000_000_000,
                sentiment: None,
            },
        };
        let json = serde_json::to_value(&event).expect("serialize result");
        assert_eq!(json["result"]["text"], "hello");
        assert!(
            json["result"].get("sentiment").is_none(),
            "absent sentiment should be omitted"
        );
    }

    #[test]
    fn sentiment_round_trips() {
        let sentiment = Sentiment {
            polarity: -0.4,
            label: "Negative".to_string(),
            emoji: "\u{1F615}".to_string(),
            confidence: 0.8,
            specific_emotion: "concern".to_string(),
        };
        let json = serde_json::to_string(&sentiment).expect("serialize sentiment");
        let back: Sentiment = serde_json::from_str(&json).expect("deserialize sentiment");
        assert_eq!(back.label, "Negative");
        assert!((back.polarity + 0.4).abs() < 1e-6);
    }
}
