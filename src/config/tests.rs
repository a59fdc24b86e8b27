use super::{AppConfig, FallbackPolicy, ModelKind, SessionConfig};
use clap::Parser;

fn parsed(args: &[&str]) -> AppConfig {
    let mut full = vec!["livemic"];
    full.extend_from_slice(args);
    AppConfig::parse_from(full)
}

#[test]
fn defaults_are_valid() {
    let config = parsed(&[]);
    config.validate().expect("defaults should validate");
    assert_eq!(config.model, ModelKind::Google);
    assert_eq!(config.sample_rate, 16_000);
    assert_eq!(config.channels, 1);
    assert!(!config.no_noise_suppression);
}

#[test]
fn session_config_inverts_negative_flags() {
    let config = parsed(&["--no-noise-suppression", "--no-sentiment"]);
    let session = config.session_config();
    assert!(!session.noise_suppression);
    assert!(!session.sentiment);
    assert!(session.echo_cancellation);
}

#[test]
fn rejects_out_of_range_sample_rate() {
    let config = parsed(&["--sample-rate", "4000"]);
    let err = config.validate().expect_err("4 kHz should be rejected");
    assert_eq!(err.field, "sample_rate");
}

#[test]
fn rejects_zero_silence_ticks() {
    let config = parsed(&["--silence-ticks", "0"]);
    let err = config.validate().expect_err("zero ticks should be rejected");
    assert_eq!(err.field, "silence_ticks");
}

#[test]
fn rejects_initial_delay_beyond_cadence() {
    let mut policy = FallbackPolicy::default();
    policy.fallback_initial_delay_ms = policy.fallback_interval_ms + 1;
    let err = policy.validate().expect_err("delay past cadence");
    assert_eq!(err.field, "fallback_initial_delay_ms");
}

#[test]
fn rejects_stereo_plus_channel_counts() {
    let session = SessionConfig {
        channels: 3,
        ..SessionConfig::default()
    };
    let err = session.validate().expect_err("3 channels should be rejected");
    assert_eq!(err.field, "channels");
}

#[test]
fn model_ids_round_trip_through_catalogue() {
    let catalogue = ModelKind::catalogue();
    assert_eq!(catalogue.len(), 3);
    assert!(catalogue.iter().any(|m| m.id == "google"));
    assert!(catalogue.iter().any(|m| m.id == "vosk"));
    assert!(catalogue.iter().any(|m| m.id == "whisper"));
    assert!(catalogue.iter().all(|m| m.available));
}

#[test]
fn model_serializes_lowercase() {
    let json = serde_json::to_string(&ModelKind::Whisper).expect("serialize model");
    assert_eq!(json, "\"whisper\"");
}
