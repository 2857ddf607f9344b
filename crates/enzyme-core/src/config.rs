//! Engine Configuration: where builds happen and how they are compiled
use crate::error::{EngineError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings shared by every `execute` call of one engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Parent directory of the per-call build directories.
    pub build_root: PathBuf,
    /// Native C compiler executable.
    pub compiler: String,
    pub opt_level: String,
    pub std: String,
    pub extra_flags: Vec<String>,
    /// Driver executable name, without the platform suffix.
    pub executable_name: String,
    /// Wall-clock budget for one call, build and run included.
    pub timeout_ms: Option<u64>,
    /// YAML templates file replacing the built-in C99 skeletons.
    pub templates_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            build_root: std::env::temp_dir(),
            compiler: "cc".to_string(),
            opt_level: "-O3".to_string(),
            std: "-std=c99".to_string(),
            extra_flags: Vec::new(),
            executable_name: "main".to_string(),
            timeout_ms: None,
            templates_path: None,
        }
    }
}

impl EngineConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| EngineError::Config(format!("invalid engine config: {}", e)))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    /// Defaults overridden by `ENZYME_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(cc) = lookup("ENZYME_CC") {
            self.compiler = cc;
        }
        if let Some(root) = lookup("ENZYME_BUILD_ROOT") {
            self.build_root = PathBuf::from(root);
        }
        if let Some(opt) = lookup("ENZYME_OPT_LEVEL") {
            self.opt_level = opt;
        }
        if let Some(ms) = lookup("ENZYME_TIMEOUT_MS") {
            let ms = ms.trim().parse::<u64>().map_err(|e| {
                EngineError::Config(format!("ENZYME_TIMEOUT_MS={:?}: {}", ms, e))
            })?;
            self.timeout_ms = Some(ms);
        }
        Ok(self)
    }

    pub fn with_build_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.build_root = root.into();
        self
    }

    pub fn with_compiler(mut self, compiler: impl Into<String>) -> Self {
        self.compiler = compiler.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// File name of the compiled driver, platform suffix included.
    pub fn executable_file_name(&self) -> String {
        format!("{}{}", self.executable_name, std::env::consts::EXE_SUFFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.compiler, "cc");
        assert_eq!(config.opt_level, "-O3");
        assert_eq!(config.std, "-std=c99");
        assert_eq!(config.build_root, std::env::temp_dir());
        assert!(config.timeout().is_none());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = EngineConfig::from_yaml(
            r#"
compiler: clang
timeout_ms: 2500
extra_flags: ["-march=native"]
"#,
        )
        .unwrap();
        assert_eq!(config.compiler, "clang");
        assert_eq!(config.timeout(), Some(Duration::from_millis(2500)));
        assert_eq!(config.extra_flags, vec!["-march=native".to_string()]);
        assert_eq!(config.std, "-std=c99");
    }

    #[test]
    fn test_timeout_saturates() {
        let config = EngineConfig::default().with_timeout(Duration::MAX);
        assert_eq!(config.timeout_ms, Some(u64::MAX));
        assert_eq!(config.timeout(), Some(Duration::from_millis(u64::MAX)));

        let config = EngineConfig::default().with_timeout(Duration::from_millis(250));
        assert_eq!(config.timeout_ms, Some(250));
    }

    #[test]
    fn test_invalid_yaml() {
        let err = EngineConfig::from_yaml("timeout_ms: soon").unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("ENZYME_CC", "gcc"),
            ("ENZYME_BUILD_ROOT", "/var/tmp/enzyme"),
            ("ENZYME_TIMEOUT_MS", "1000"),
        ]
        .into_iter()
        .collect();

        let config = EngineConfig::default()
            .with_overrides(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.compiler, "gcc");
        assert_eq!(config.build_root, PathBuf::from("/var/tmp/enzyme"));
        assert_eq!(config.timeout_ms, Some(1000));
        assert_eq!(config.opt_level, "-O3");
    }

    #[test]
    fn test_bad_timeout_env() {
        let err = EngineConfig::default()
            .with_overrides(|k| (k == "ENZYME_TIMEOUT_MS").then(|| "fast".to_string()))
            .unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }
}
