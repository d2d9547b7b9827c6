use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::cache::FailurePolicy;
use crate::detect::{
    DEFAULT_IDENTIFIER_CONFIDENCE, DEFAULT_MAX_IDENTIFIERS, DEFAULT_MAX_PLATES,
    DEFAULT_PLATE_CONFIDENCE,
};
use crate::region::DEFAULT_PADDING;

const DEFAULT_PLATE_INPUT_SIZE: u32 = 416;
const DEFAULT_PLATE_REFRESH: u32 = 1;
const DEFAULT_OCR_LANGUAGE: &str = "eng";
const DEFAULT_IDENTIFIER_REFRESH: u32 = 30;
const DEFAULT_MAX_SIGNS: usize = 3;
const DEFAULT_SIGN_REFRESH: u32 = 15;

#[derive(Debug, Deserialize, Default)]
struct PipelineConfigFile {
    plates: Option<PlatesConfigFile>,
    identifiers: Option<IdentifiersConfigFile>,
    signs: Option<SignsConfigFile>,
    failure_policy: Option<FailurePolicy>,
}

#[derive(Debug, Deserialize, Default)]
struct PlatesConfigFile {
    model_path: Option<PathBuf>,
    input_size: Option<u32>,
    confidence: Option<f32>,
    max_detections: Option<usize>,
    refresh_period: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct IdentifiersConfigFile {
    tessdata_path: Option<PathBuf>,
    language: Option<String>,
    confidence: Option<f32>,
    max_regions: Option<usize>,
    padding: Option<u32>,
    refresh_period: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct SignsConfigFile {
    max_regions: Option<usize>,
    refresh_period: Option<u32>,
}

/// Everything needed to construct a `Pipeline`.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub plates: PlateSettings,
    pub identifiers: IdentifierSettings,
    pub signs: SignSettings,
    pub failure_policy: FailurePolicy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlateSettings {
    /// ONNX model. `None` runs the plate detector in fallback mode.
    pub model_path: Option<PathBuf>,
    pub input_size: u32,
    pub confidence: f32,
    pub max_detections: usize,
    pub refresh_period: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IdentifierSettings {
    /// Tesseract data directory. `None` uses the system default.
    pub tessdata_path: Option<PathBuf>,
    pub language: String,
    pub confidence: f32,
    pub max_regions: usize,
    pub padding: u32,
    pub refresh_period: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignSettings {
    pub max_regions: usize,
    pub refresh_period: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from_file(PipelineConfigFile::default())
    }
}

impl PipelineConfig {
    /// Load from `STREAMSAFE_CONFIG` (if set), then apply env overrides and validate.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("STREAMSAFE_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a JSON document without consulting the environment.
    pub fn from_json(raw: &str) -> Result<Self> {
        let file: PipelineConfigFile =
            serde_json::from_str(raw).map_err(|e| anyhow!("invalid config: {}", e))?;
        let cfg = Self::from_file(file);
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: PipelineConfigFile) -> Self {
        let plates = file.plates.unwrap_or_default();
        let identifiers = file.identifiers.unwrap_or_default();
        let signs = file.signs.unwrap_or_default();
        Self {
            plates: PlateSettings {
                model_path: plates.model_path,
                input_size: plates.input_size.unwrap_or(DEFAULT_PLATE_INPUT_SIZE),
                confidence: plates.confidence.unwrap_or(DEFAULT_PLATE_CONFIDENCE),
                max_detections: plates.max_detections.unwrap_or(DEFAULT_MAX_PLATES),
                refresh_period: plates.refresh_period.unwrap_or(DEFAULT_PLATE_REFRESH),
            },
            identifiers: IdentifierSettings {
                tessdata_path: identifiers.tessdata_path,
                language: identifiers
                    .language
                    .unwrap_or_else(|| DEFAULT_OCR_LANGUAGE.to_string()),
                confidence: identifiers
                    .confidence
                    .unwrap_or(DEFAULT_IDENTIFIER_CONFIDENCE),
                max_regions: identifiers.max_regions.unwrap_or(DEFAULT_MAX_IDENTIFIERS),
                padding: identifiers.padding.unwrap_or(DEFAULT_PADDING),
                refresh_period: identifiers
                    .refresh_period
                    .unwrap_or(DEFAULT_IDENTIFIER_REFRESH),
            },
            signs: SignSettings {
                max_regions: signs.max_regions.unwrap_or(DEFAULT_MAX_SIGNS),
                refresh_period: signs.refresh_period.unwrap_or(DEFAULT_SIGN_REFRESH),
            },
            failure_policy: file.failure_policy.unwrap_or_default(),
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(path) = std::env::var("STREAMSAFE_PLATE_MODEL") {
            if !path.trim().is_empty() {
                self.plates.model_path = Some(PathBuf::from(path));
            }
        }
        if let Ok(path) = std::env::var("STREAMSAFE_TESSDATA") {
            if !path.trim().is_empty() {
                self.identifiers.tessdata_path = Some(PathBuf::from(path));
            }
        }
        if let Some(period) = env_period("STREAMSAFE_PLATE_REFRESH")? {
            self.plates.refresh_period = period;
        }
        if let Some(period) = env_period("STREAMSAFE_IDENTIFIER_REFRESH")? {
            self.identifiers.refresh_period = period;
        }
        if let Some(period) = env_period("STREAMSAFE_SIGN_REFRESH")? {
            self.signs.refresh_period = period;
        }
        if let Ok(policy) = std::env::var("STREAMSAFE_FAILURE_POLICY") {
            self.failure_policy = FailurePolicy::parse(&policy).ok_or_else(|| {
                anyhow!("STREAMSAFE_FAILURE_POLICY must be \"clear\" or \"keep_stale\"")
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        for (name, period) in [
            ("plates.refresh_period", self.plates.refresh_period),
            ("identifiers.refresh_period", self.identifiers.refresh_period),
            ("signs.refresh_period", self.signs.refresh_period),
        ] {
            if period == 0 {
                return Err(anyhow!("{} must be greater than zero", name));
            }
        }
        for (name, confidence) in [
            ("plates.confidence", self.plates.confidence),
            ("identifiers.confidence", self.identifiers.confidence),
        ] {
            if !(0.0..=1.0).contains(&confidence) {
                return Err(anyhow!("{} must be within [0, 1]", name));
            }
        }
        if self.plates.max_detections == 0
            || self.identifiers.max_regions == 0
            || self.signs.max_regions == 0
        {
            return Err(anyhow!("region caps must be greater than zero"));
        }
        if self.plates.input_size == 0 {
            return Err(anyhow!("plates.input_size must be greater than zero"));
        }
        if self.identifiers.language.trim().is_empty() {
            return Err(anyhow!("identifiers.language must not be empty"));
        }
        Ok(())
    }
}

fn env_period(key: &str) -> Result<Option<u32>> {
    match std::env::var(key) {
        Ok(value) => {
            let period: u32 = value
                .trim()
                .parse()
                .map_err(|_| anyhow!("{} must be a positive integer frame count", key))?;
            Ok(Some(period))
        }
        Err(_) => Ok(None),
    }
}

fn read_config_file(path: &Path) -> Result<PipelineConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_detector_constants() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.plates.refresh_period, 1);
        assert_eq!(cfg.identifiers.refresh_period, 30);
        assert_eq!(cfg.signs.refresh_period, 15);
        assert_eq!(cfg.plates.input_size, 416);
        assert_eq!(cfg.identifiers.padding, 10);
        assert_eq!(cfg.failure_policy, FailurePolicy::Clear);
        assert!(cfg.plates.model_path.is_none());
        cfg.validate().unwrap();
    }

    #[test]
    fn json_overrides_individual_keys() {
        let cfg = PipelineConfig::from_json(
            r#"{"signs": {"refresh_period": 5}, "failure_policy": "keep_stale"}"#,
        )
        .unwrap();
        assert_eq!(cfg.signs.refresh_period, 5);
        assert_eq!(cfg.signs.max_regions, 3);
        assert_eq!(cfg.failure_policy, FailurePolicy::KeepStale);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(PipelineConfig::from_json(r#"{"plates": {"refresh_period": 0}}"#).is_err());
        assert!(PipelineConfig::from_json(r#"{"identifiers": {"confidence": 1.5}}"#).is_err());
        assert!(PipelineConfig::from_json(r#"{"signs": {"max_regions": 0}}"#).is_err());
        assert!(PipelineConfig::from_json(r#"{"failure_policy": "sometimes"}"#).is_err());
    }
}
