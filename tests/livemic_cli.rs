use std::process::Command;

fn combined_output(output: &std::process::Output) -> String {
    let mut combined = String::new();
    combined.push_str(&String::from_utf8_lossy(&output.stdout));
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    combined
}

fn livemic_bin() -> &'static str {
    option_env!("CARGO_BIN_EXE_livemic").expect("livemic test binary not built")
}

#[test]
fn help_mentions_the_pipeline() {
    let output = Command::new(livemic_bin())
        .arg("--help")
        .output()
        .expect("run livemic --help");
    assert!(output.status.success());
    let combined = combined_output(&output);
    assert!(combined.contains("livemic capture pipeline"));
}

#[test]
fn list_input_devices_prints_message() {
    let output = Command::new(livemic_bin())
        .arg("--list-input-devices")
        .output()
        .expect("run livemic --list-input-devices");
    assert!(output.status.success());
    let combined = combined_output(&output);
    assert!(
        combined.contains("audio input devices")
            || combined.contains("Failed to list audio input devices")
    );
}

#[test]
fn list_models_prints_the_catalogue() {
    let output = Command::new(livemic_bin())
        .arg("--list-models")
        .output()
        .expect("run livemic --list-models");
    assert!(output.status.success());
    let combined = combined_output(&output);
    assert!(combined.contains("google"));
    assert!(combined.contains("whisper"));
}

#[test]
fn invalid_sample_rate_is_rejected_up_front() {
    let output = Command::new(livemic_bin())
        .args(["--sample-rate", "100", "--seconds", "1"])
        .output()
        .expect("run livemic with bad sample rate");
    assert!(!output.status.success());
    let combined = combined_output(&output);
    assert!(combined.contains("sample_rate"));
}
