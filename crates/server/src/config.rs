use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

const ENV_PREFIX: &str = "NUTRISCAN_SERVER";

/// Server configuration. Every field is optional in the sources.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: u16,
    /// Whole-request timeout. Pipeline calls have their own, shorter bounds.
    pub timeout_secs: u64,
    /// Upload limit for scans and dish requests.
    pub max_body_size_mb: usize,
    pub enable_cors: bool,
    /// Level or full `EnvFilter` directive, e.g. `info,matcher=debug`.
    pub log_level: String,
    /// Install the Prometheus recorder and serve `/metrics`.
    pub metrics_enabled: bool,
    /// Pipeline YAML; relative data paths inside it resolve against its directory.
    pub pipeline_config: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: 8080,
            timeout_secs: 60,
            max_body_size_mb: 10,
            enable_cors: true,
            log_level: "info".to_string(),
            metrics_enabled: true,
            pipeline_config: PathBuf::from("nutriscan.yaml"),
        }
    }
}

impl ServerConfig {
    /// Reads `.env`, then an optional `server.{toml,yaml,json}` in the working
    /// directory, then `NUTRISCAN_SERVER__*` variables. Later sources win.
    pub fn load() -> anyhow::Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }

        let builder = config::Config::builder()
            .add_source(config::File::with_name("server").required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"));
        Self::from_builder(builder)
    }

    /// Parses a TOML document on top of the defaults.
    pub fn from_toml(toml: &str) -> anyhow::Result<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml));
        Self::from_builder(builder)
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> anyhow::Result<Self> {
        let config: ServerConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.timeout_secs > 0, "timeout_secs must be > 0");
        anyhow::ensure!(self.max_body_size_mb > 0, "max_body_size_mb must be > 0");
        anyhow::ensure!(
            !self.pipeline_config.as_os_str().is_empty(),
            "pipeline_config must name a file"
        );
        Ok(())
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.bind_addr, self.port).parse()?)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Body limit in bytes.
    pub fn max_body_size(&self) -> usize {
        self.max_body_size_mb * 1024 * 1024
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.timeout(), Duration::from_secs(60));
        assert_eq!(cfg.max_body_size(), 10 * 1024 * 1024);
        assert!(cfg.enable_cors);
        assert!(cfg.metrics_enabled);
        assert_eq!(cfg.pipeline_config, PathBuf::from("nutriscan.yaml"));
        assert_eq!(cfg.socket_addr().unwrap().port(), 8080);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let cfg = ServerConfig::from_toml(
            "port = 9000\nlog_level = \"debug\"\npipeline_config = \"/etc/nutriscan/pipeline.yaml\"\n",
        )
        .unwrap();
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.pipeline_config, PathBuf::from("/etc/nutriscan/pipeline.yaml"));
        assert_eq!(cfg.timeout_secs, 60);
    }

    #[test]
    fn zero_limits_are_rejected() {
        assert!(ServerConfig::from_toml("timeout_secs = 0\n").is_err());
        assert!(ServerConfig::from_toml("max_body_size_mb = 0\n").is_err());
    }

    #[test]
    fn bad_bind_addr() {
        let cfg = ServerConfig {
            bind_addr: "not an address".into(),
            ..Default::default()
        };
        assert!(cfg.socket_addr().is_err());
    }
}
