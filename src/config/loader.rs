//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::{EdgeConfig, SiteCatalog};
use crate::config::validation::{validate_catalog, validate_config, ValidationError};
use crate::site::descriptor::{SiteDescriptor, SystemSite};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "IO error reading {}: {}", path.display(), e),
            ConfigError::Parse(path, e) => write!(f, "Parse error in {}: {}", path.display(), e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Everything one compilation run needs, validated.
#[derive(Debug, Clone)]
pub struct CompilerInputs {
    pub config: EdgeConfig,
    pub sites: Vec<SiteDescriptor>,
    pub system_sites: Vec<SystemSite>,
    /// Template source for system sites, read at load time.
    pub system_template: Option<String>,
}

fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))
}

/// Load and validate the compiler configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<EdgeConfig, ConfigError> {
    let content = read(path)?;
    let config: EdgeConfig =
        toml::from_str(&content).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load the site catalog without validating it.
pub fn load_catalog(path: &Path) -> Result<SiteCatalog, ConfigError> {
    let content = read(path)?;
    toml::from_str(&content).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
}

/// Load both files, validate the catalog against the configuration and read
/// the system site template if one is configured.
pub fn load_inputs(config_path: &Path, sites_path: &Path) -> Result<CompilerInputs, ConfigError> {
    let config = load_config(config_path)?;
    let catalog = load_catalog(sites_path)?;
    let validated = validate_catalog(&catalog, &config).map_err(ConfigError::Validation)?;

    let system_template = match &config.output.system_site_template {
        Some(path) => Some(read(path)?),
        None => None,
    };

    tracing::debug!(
        client_sites = validated.client.len(),
        system_sites = validated.system.len(),
        dnets = config.deployment.dnets.len(),
        "Inputs loaded"
    );

    Ok(CompilerInputs {
        config,
        sites: validated.client,
        system_sites: validated.system,
        system_template,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_reports_path() {
        let err = load_config(Path::new("/nonexistent/edge.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(..)));
        assert!(err.to_string().contains("/nonexistent/edge.toml"));
    }

    #[test]
    fn test_validation_errors_are_joined() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edge.toml");
        fs::write(
            &path,
            r#"
            [deployment]
            dnets = []
            ssl_ciphers = ""
            "#,
        )
        .unwrap();

        let err = load_config(&path).unwrap_err();
        match &err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().starts_with("Validation failed: "));
    }
}
