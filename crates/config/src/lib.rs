//! Layered configuration for pistore.
//!
//! Sources are merged in order, later ones winning:
//!
//! 1. built-in defaults ([`Config::default`]),
//! 2. a config file: the path given explicitly, otherwise `pistore.toml` in
//!    the platform config directory if it exists (TOML, YAML or JSON, chosen
//!    by extension),
//! 3. environment variables prefixed with `PISTORE_` (`PISTORE_CHUNK_DIR`,
//!    `PISTORE_HOST_ID`, ...).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use pistore_compress::Compression;
use pistore_identity::HostId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "PISTORE_";
/// Host ID override, taken as a literal string.
pub const HOST_ID_ENV: &str = "PISTORE_HOST_ID";
/// File name looked up in the platform config directory.
pub const CONFIG_FILE_NAME: &str = "pistore.toml";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory that packed chunks are written into.
    pub chunk_dir: PathBuf,
    /// Scheme used when packing new chunks.
    pub compression: Compression,
    /// Previously assigned host identifier. When unset, the identifier is
    /// derived by probing the host on every run.
    pub host_id: Option<HostId>,
    /// Default log filter, used when `RUST_LOG` isn't set.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunk_dir: PathBuf::from("./chunks"),
            compression: Compression::Gzip,
            host_id: None,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from all layers.
    ///
    /// An explicit `path` must exist. Without one, a missing default config
    /// file (or config directory) is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::figment(path)?.extract().map_err(|e| ErrorKind::Invalid(e.to_string()).into())
    }

    /// The merged provider stack, before extraction.
    pub fn figment(path: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        match path {
            Some(path) => {
                if !path.is_file() {
                    exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
                }
                figment = merge_file(figment, path)?;
            },
            None => match Self::default_path() {
                Ok(path) if path.is_file() => figment = merge_file(figment, &path)?,
                Ok(path) => tracing::debug!(path = %path.display(), "no config file, using defaults"),
                Err(err) => {
                    let kind = &*err;
                    tracing::debug!(error = %kind, "skipping config file lookup");
                },
            },
        }
        // Env values are parsed as TOML-ish scalars, which would turn an
        // all-digit host ID into an integer and drop leading zeros. Read that
        // one verbatim instead.
        figment = figment.merge(Env::prefixed(ENV_PREFIX).ignore(&["host_id"]));
        if let Ok(token) = std::env::var(HOST_ID_ENV) {
            figment = figment.merge(Serialized::default("host_id", token));
        }
        Ok(figment)
    }

    /// Location of the per-user config file.
    pub fn default_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "pistore").ok_or(ErrorKind::NoConfigDirectory)?;
        Ok(dirs.config_dir().join(CONFIG_FILE_NAME))
    }
}

fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
    tracing::debug!(path = %path.display(), "loading config file");
    let extension = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
    Ok(match extension.as_deref() {
        Some("toml") => figment.merge(Toml::file_exact(path)),
        Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path)),
        Some("json") => figment.merge(Json::file_exact(path)),
        _ => exn::bail!(ErrorKind::Invalid(format!(
            "unsupported config file type: {} (expected .toml, .yaml or .json)",
            path.display()
        ))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use rstest::rstest;

    fn load_in(jail: &Jail, name: &str) -> Result<Config> {
        Config::load(Some(&jail.directory().join(name)))
    }

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.chunk_dir, PathBuf::from("./chunks"));
        assert_eq!(config.compression, Compression::Gzip);
        assert_eq!(config.host_id, None);
        assert_eq!(config.log_level, "info");
    }

    #[rstest]
    #[case("pistore.toml", "chunk_dir = \"/srv/chunks\"\ncompression = \"bzip2\"\nhost_id = \"abc123\"\n")]
    #[case("pistore.yaml", "chunk_dir: /srv/chunks\ncompression: bzip2\nhost_id: abc123\n")]
    #[case("pistore.json", r#"{"chunk_dir": "/srv/chunks", "compression": "bzip2", "host_id": "abc123"}"#)]
    fn file_formats(#[case] name: &str, #[case] contents: &str) {
        Jail::expect_with(|jail| {
            jail.create_file(name, contents)?;
            let config = load_in(jail, name).unwrap();
            assert_eq!(config.chunk_dir, PathBuf::from("/srv/chunks"));
            assert_eq!(config.compression, Compression::Bzip2);
            assert_eq!(config.host_id, Some(HostId::new("abc123").unwrap()));
            assert_eq!(config.log_level, "info");
            Ok(())
        });
    }

    #[test]
    fn env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("pistore.toml", "chunk_dir = \"from-file\"\nlog_level = \"warn\"\n")?;
            jail.set_env("PISTORE_CHUNK_DIR", "from-env");
            let config = load_in(jail, "pistore.toml").unwrap();
            assert_eq!(config.chunk_dir, PathBuf::from("from-env"));
            assert_eq!(config.log_level, "warn");
            Ok(())
        });
    }

    #[rstest]
    #[case("12345")]
    #[case("0042")]
    #[case("1e5")]
    #[case("9f86d081884c7d659a2feaa0c55ad015")]
    fn host_id_from_env_is_verbatim(#[case] token: &str) {
        Jail::expect_with(|jail| {
            jail.create_file("pistore.toml", "host_id = \"from-file\"\n")?;
            jail.set_env(HOST_ID_ENV, token);
            let config = load_in(jail, "pistore.toml").unwrap();
            assert_eq!(config.host_id, Some(HostId::new(token).unwrap()));
            Ok(())
        });
    }

    #[test]
    fn numeric_host_id_in_file() {
        Jail::expect_with(|jail| {
            jail.create_file("pistore.yaml", "host_id: 12345\n")?;
            let config = load_in(jail, "pistore.yaml").unwrap();
            assert_eq!(config.host_id, Some(HostId::new("12345").unwrap()));
            Ok(())
        });
    }

    #[test]
    fn missing_explicit_file() {
        Jail::expect_with(|jail| {
            let err = load_in(jail, "absent.toml").unwrap_err();
            assert!(matches!(&*err, ErrorKind::NotFound(_)));
            Ok(())
        });
    }

    #[rstest]
    #[case("compression = \"lz4\"\n")]
    #[case("host_id = \"   \"\n")]
    #[case("chunk_dir = [1, 2]\n")]
    fn invalid_values(#[case] contents: &str) {
        Jail::expect_with(|jail| {
            jail.create_file("pistore.toml", contents)?;
            let err = load_in(jail, "pistore.toml").unwrap_err();
            assert!(matches!(&*err, ErrorKind::Invalid(_)));
            Ok(())
        });
    }

    #[test]
    fn unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pistore.ini");
        std::fs::write(&path, "chunk_dir=x").unwrap();
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid(_)));
    }
}
