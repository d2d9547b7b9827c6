use std::path::PathBuf;
use std::sync::Mutex;

use tempfile::NamedTempFile;

use streamsafe::config::PipelineConfig;
use streamsafe::{FailurePolicy, Pipeline};

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "STREAMSAFE_CONFIG",
        "STREAMSAFE_PLATE_MODEL",
        "STREAMSAFE_PLATE_REFRESH",
        "STREAMSAFE_TESSDATA",
        "STREAMSAFE_IDENTIFIER_REFRESH",
        "STREAMSAFE_SIGN_REFRESH",
        "STREAMSAFE_FAILURE_POLICY",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "plates": {
            "model_path": "/models/plates.onnx",
            "input_size": 640,
            "confidence": 0.7,
            "max_detections": 5,
            "refresh_period": 2
        },
        "identifiers": {
            "language": "eng+chi_sim",
            "confidence": 0.5,
            "max_regions": 6,
            "padding": 12,
            "refresh_period": 20
        },
        "signs": {
            "max_regions": 2,
            "refresh_period": 10
        },
        "failure_policy": "keep_stale"
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("STREAMSAFE_CONFIG", file.path());
    std::env::set_var("STREAMSAFE_TESSDATA", "/usr/share/tessdata");
    std::env::set_var("STREAMSAFE_SIGN_REFRESH", "5");
    std::env::set_var("STREAMSAFE_FAILURE_POLICY", "clear");

    let cfg = PipelineConfig::load().expect("load config");

    assert_eq!(
        cfg.plates.model_path,
        Some(PathBuf::from("/models/plates.onnx"))
    );
    assert_eq!(cfg.plates.input_size, 640);
    assert_eq!(cfg.plates.confidence, 0.7);
    assert_eq!(cfg.plates.max_detections, 5);
    assert_eq!(cfg.plates.refresh_period, 2);
    assert_eq!(
        cfg.identifiers.tessdata_path,
        Some(PathBuf::from("/usr/share/tessdata"))
    );
    assert_eq!(cfg.identifiers.language, "eng+chi_sim");
    assert_eq!(cfg.identifiers.confidence, 0.5);
    assert_eq!(cfg.identifiers.max_regions, 6);
    assert_eq!(cfg.identifiers.padding, 12);
    assert_eq!(cfg.identifiers.refresh_period, 20);
    assert_eq!(cfg.signs.max_regions, 2);
    assert_eq!(cfg.signs.refresh_period, 5);
    assert_eq!(cfg.failure_policy, FailurePolicy::Clear);

    clear_env();
}

#[test]
fn defaults_apply_without_a_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = PipelineConfig::load().expect("load defaults");
    assert_eq!(cfg, PipelineConfig::default());
    assert_eq!(cfg.identifiers.language, "eng");
}

#[test]
fn rejects_invalid_env_values() {
    let _guard = ENV_LOCK.lock().unwrap();

    for (key, value) in [
        ("STREAMSAFE_PLATE_REFRESH", "often"),
        ("STREAMSAFE_IDENTIFIER_REFRESH", "0"),
        ("STREAMSAFE_FAILURE_POLICY", "retry"),
    ] {
        clear_env();
        std::env::set_var(key, value);
        assert!(PipelineConfig::load().is_err(), "{key}={value}");
    }

    clear_env();
}

#[test]
fn rejects_unreadable_or_malformed_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("STREAMSAFE_CONFIG", "/nonexistent/streamsafe.json");
    assert!(PipelineConfig::load().is_err());

    let mut file = NamedTempFile::new().expect("temp config");
    std::io::Write::write_all(&mut file, b"{\"plates\": {\"refresh_period\": -1}}")
        .expect("write config");
    std::env::set_var("STREAMSAFE_CONFIG", file.path());
    assert!(PipelineConfig::load().is_err());

    clear_env();
}

#[test]
fn unloadable_model_degrades_instead_of_failing() {
    let mut cfg = PipelineConfig::default();
    cfg.plates.model_path = Some(PathBuf::from("/nonexistent/plates.onnx"));
    let pipeline = Pipeline::construct(&cfg).expect("construction succeeds");
    assert!(!pipeline.plate_model_loaded());
}
