//! Configuration loading from disk and the command line.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::cli::CliArgs;
use crate::config::schema::{SiteConfig, TlsConfig, DEFAULT_BIND_ADDRESS, DEFAULT_TLS_BIND_ADDRESS};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a TOML file without validating it.
pub fn read_config_file(path: &Path) -> Result<SiteConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    let config = read_config_file(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Merge defaults, the optional config file and CLI/env overrides, then validate.
pub fn load_with_cli(args: &CliArgs) -> Result<SiteConfig, ConfigError> {
    let mut config = match &args.config_file {
        Some(path) => read_config_file(path)?,
        None => SiteConfig::default(),
    };
    apply_overrides(&mut config, args);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

fn apply_overrides(config: &mut SiteConfig, args: &CliArgs) {
    let set = |target: &mut String, value: &Option<String>| {
        if let Some(value) = value.as_ref().filter(|v| !v.is_empty()) {
            *target = value.clone();
        }
    };

    set(&mut config.site.host, &args.host);
    set(&mut config.site.pages_dir, &args.pages);
    set(&mut config.site.static_dir, &args.static_dir);
    set(&mut config.site.alias_file, &args.alias);
    set(&mut config.metrics.token, &args.metrics_token);
    set(&mut config.listener.bind_address, &args.bind);

    if args.cert.is_some() || args.key.is_some() {
        let tls = config.listener.tls.get_or_insert_with(TlsConfig::default);
        set(&mut tls.cert_path, &args.cert);
        set(&mut tls.key_path, &args.key);
    }

    if config.listener.tls.is_some() && config.listener.bind_address == DEFAULT_BIND_ADDRESS {
        config.listener.bind_address = DEFAULT_TLS_BIND_ADDRESS.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn overrides_win_over_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[site]\nhost = \"file.example\"\npages_dir = \"posts\"\n[metrics]\ntoken = \"from-file\""
        )
        .unwrap();

        let args = CliArgs {
            config_file: Some(file.path().to_path_buf()),
            host: Some("cli.example".into()),
            metrics_token: Some("from-cli".into()),
            ..Default::default()
        };
        let config = load_with_cli(&args).unwrap();

        assert_eq!(config.site.host, "cli.example");
        assert_eq!(config.site.pages_dir, "posts");
        assert_eq!(config.metrics.token, "from-cli");
        assert!(config.listener.tls.is_none());
    }

    #[test]
    fn tls_flags_switch_default_port() {
        let args = CliArgs {
            cert: Some("cert.pem".into()),
            key: Some("key.pem".into()),
            metrics_token: Some("t".into()),
            ..Default::default()
        };
        let config = load_with_cli(&args).unwrap();

        let tls = config.listener.tls.as_ref().unwrap();
        assert_eq!(tls.cert_path, "cert.pem");
        assert_eq!(tls.key_path, "key.pem");
        assert_eq!(config.listener.bind_address, DEFAULT_TLS_BIND_ADDRESS);
    }

    #[test]
    fn missing_token_fails() {
        let err = load_with_cli(&CliArgs::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("metrics token"));
    }

    #[test]
    fn unreadable_file_is_io_error() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
