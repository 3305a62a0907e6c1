use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::action::types::{Dialect, FactorInput, Factors, ModelVersion};
use crate::action::ParseRequest;
use crate::errors::{ParserError, ParserResult};
use crate::geometry::SmartResizeParams;

pub const CONFIG_FILE_NAME: &str = "parser.toml";
pub const CONFIG_ENV_VAR: &str = "SEECLAW_PARSER_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ParserConfig {
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub smart_resize: SmartResizeParams,
}

/// Values applied to a request when the caller leaves them out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default)]
    pub factor: FactorInput,
    #[serde(default)]
    pub mode: Dialect,
    #[serde(default)]
    pub model_ver: ModelVersion,
    /// HiDPI scale applied to absolute coordinates. Unset means 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_factor: Option<f64>,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            factor: FactorInput::default(),
            mode: Dialect::Bc,
            model_ver: ModelVersion::V1_0,
            scale_factor: None,
        }
    }
}

impl ParserConfig {
    pub fn validate(&self) -> ParserResult<()> {
        let factors = Factors::from(self.defaults.factor);
        if !factors.is_valid() {
            return Err(ParserError::InvalidConfig(format!(
                "defaults.factor must be positive, got ({}, {})",
                factors.width, factors.height
            )));
        }
        if let Some(scale) = self.defaults.scale_factor {
            if !(scale.is_finite() && scale > 0.0) {
                return Err(ParserError::InvalidConfig(format!(
                    "defaults.scale_factor must be positive, got {scale}"
                )));
            }
        }
        self.smart_resize.validate()
    }

    /// A request for `prediction` pre-filled with the configured defaults.
    pub fn request(&self, prediction: impl Into<String>) -> ParseRequest {
        let mut request = ParseRequest::new(prediction)
            .factor(self.defaults.factor)
            .mode(self.defaults.mode)
            .model_ver(self.defaults.model_ver);
        request.scale_factor = self.defaults.scale_factor;
        request
    }
}

/// Resolution order: `$SEECLAW_PARSER_CONFIG`, next to the executable, then
/// the working directory.
fn resolve_config_path() -> ParserResult<PathBuf> {
    if let Ok(explicit) = std::env::var(CONFIG_ENV_VAR) {
        let candidate = PathBuf::from(explicit);
        if candidate.exists() {
            tracing::debug!(path = %candidate.display(), "config found via environment");
            return Ok(candidate);
        }
        return Err(ParserError::Config(format!(
            "{CONFIG_ENV_VAR} points to missing file {}",
            candidate.display()
        )));
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(parent) = exe.parent() {
            let candidate = parent.join(CONFIG_FILE_NAME);
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "config found next to executable");
                return Ok(candidate);
            }
        }
    }

    let cwd = std::env::current_dir()?;
    let candidate = cwd.join(CONFIG_FILE_NAME);
    if candidate.exists() {
        tracing::debug!(path = %candidate.display(), "config found in working directory");
        return Ok(candidate);
    }

    Err(ParserError::Config(format!(
        "{CONFIG_FILE_NAME} not found next to executable or in working directory"
    )))
}

pub fn load_config() -> ParserResult<ParserConfig> {
    let path = resolve_config_path()?;
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> ParserResult<ParserConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: ParserConfig = toml::from_str(&content)?;
    config.validate()?;
    tracing::info!(
        path = %path.display(),
        mode = ?config.defaults.mode,
        model_ver = ?config.defaults.model_ver,
        "config loaded"
    );
    Ok(config)
}

pub fn save_config(config: &ParserConfig, path: &Path) -> ParserResult<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    tracing::info!(path = %path.display(), "config saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config: ParserConfig = toml::from_str("").unwrap();
        assert_eq!(config, ParserConfig::default());
        assert_eq!(config.smart_resize.factor, 28);
    }

    #[test]
    fn parses_partial_sections() {
        let text = r#"
            [defaults]
            factor = [1280, 720]
            mode = "o1"
            model_ver = "V1_5"
            scale_factor = 2.0

            [smart_resize]
            max_pixels = 1000000
        "#;
        let config: ParserConfig = toml::from_str(text).unwrap();
        assert_eq!(Factors::from(config.defaults.factor), Factors::new(1280.0, 720.0));
        assert_eq!(config.defaults.mode, Dialect::O1);
        assert_eq!(config.defaults.model_ver, ModelVersion::V1_5);
        assert_eq!(config.smart_resize.max_pixels, 1_000_000);
        assert_eq!(config.smart_resize.min_pixels, 100 * 28 * 28);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn request_inherits_defaults() {
        let mut config = ParserConfig::default();
        config.defaults.mode = Dialect::O1;
        config.defaults.scale_factor = Some(1.5);
        let req = config.request("Action: wait()");
        assert_eq!(req.mode, Dialect::O1);
        assert_eq!(req.scale_factor, Some(1.5));
        assert_eq!(req.prediction, "Action: wait()");
    }

    #[test]
    fn rejects_zero_factor() {
        let config: ParserConfig = toml::from_str("[defaults]\nfactor = 0").unwrap();
        assert!(matches!(config.validate(), Err(ParserError::InvalidConfig(_))));
    }

    #[test]
    fn save_then_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let mut config = ParserConfig::default();
        config.defaults.model_ver = ModelVersion::V1_5;
        save_config(&config, &path).unwrap();
        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn invalid_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[smart_resize]\nfactor = \"big\"").unwrap();
        assert!(matches!(load_config_from(&path), Err(ParserError::TomlDe(_))));
    }

    // The only test in this crate that touches the config environment variable.
    #[test]
    fn environment_variable_is_tried_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[defaults]\nmode = \"o1\"\n").unwrap();

        std::env::set_var(CONFIG_ENV_VAR, &path);
        let resolved = resolve_config_path();
        let loaded = load_config();

        let missing = dir.path().join("missing.toml");
        std::env::set_var(CONFIG_ENV_VAR, &missing);
        let unresolved = resolve_config_path();
        std::env::remove_var(CONFIG_ENV_VAR);

        assert_eq!(resolved.unwrap(), path);
        assert_eq!(loaded.unwrap().defaults.mode, Dialect::O1);
        assert!(matches!(unresolved, Err(ParserError::Config(_))));
    }
}
