use anyhow::{Context, Result};
use clap::ArgMatches;
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Complete configuration that merges CLI args, env vars, config files, and defaults
#[derive(Debug, Clone, Default)]
pub struct LapozConfig {
    /// Where things live on disk and how the server binds
    pub build: BuildConfig,
    /// Site configuration (from lapoz-core)
    pub site: lapoz_core::Config,
}

/// The `[build]` table of `lapoz.toml`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BuildConfig {
    /// Content directory holding the documentation tree
    pub content: String,
    /// Output directory for the static export
    pub output: String,
    /// Theme directory overriding the built-in templates
    pub theme: String,
    /// Static assets copied or served as-is
    pub public: String,
    /// Configuration file path
    pub config: String,
    /// Host for the server
    pub host: String,
    /// Port for the server
    pub port: u16,
    /// Open browser automatically
    pub open: bool,
    /// Watch for changes and reload connected browsers
    pub live_reload: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            content: "./docs".to_string(),
            output: "./out".to_string(),
            theme: "./theme".to_string(),
            public: "./public".to_string(),
            config: "./lapoz.toml".to_string(),
            host: "127.0.0.1".to_string(),
            port: 3000,
            open: false,
            live_reload: true,
        }
    }
}

impl BuildConfig {
    /// The theme directory, when one exists on disk.
    pub fn theme_dir(&self) -> Option<PathBuf> {
        let theme = PathBuf::from(&self.theme);
        theme.is_dir().then_some(theme)
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct BuildSection {
    #[serde(default)]
    build: BuildConfig,
}

impl LapozConfig {
    /// Load configuration with cascading precedence:
    /// 1. CLI arguments (highest priority)
    /// 2. Environment variables (LAPOZ_*)
    /// 3. Configuration file
    /// 4. Defaults (lowest priority)
    ///
    /// The site tables (`[site]`, `[docs]`, `[home]`, `[not_found]`) are read
    /// from the same file as-is, so gate component names keep their case.
    pub fn load(args: &ArgMatches) -> Result<Self> {
        let config_file = arg(args, "config").unwrap_or_else(|| BuildConfig::default().config);

        let mut builder = ConfigBuilder::builder();

        // 1. Start with defaults
        builder = builder.add_source(ConfigBuilder::try_from(&BuildSection::default())?);

        // 2. Add configuration file if it exists
        let file_exists = Path::new(&config_file).is_file();
        if file_exists {
            builder = builder.add_source(File::new(&config_file, FileFormat::Toml));
        }

        // 3. Add environment variables with LAPOZ_ prefix
        builder = builder.add_source(
            Environment::with_prefix("LAPOZ")
                .prefix_separator("_")
                .separator("__") // Use double underscore for nested keys
                .try_parsing(true),
        );

        // 4. Override with CLI arguments that are defined for this command
        for key in ["content", "output", "theme", "public", "host"] {
            if let Some(value) = arg(args, key) {
                builder = builder.set_override(format!("build.{key}"), value)?;
            }
        }
        if let Some(port) = args.try_get_one::<u16>("port").ok().flatten() {
            builder = builder.set_override("build.port", i64::from(*port))?;
        }
        if flag(args, "open") {
            builder = builder.set_override("build.open", true)?;
        }
        if flag(args, "no-reload") {
            builder = builder.set_override("build.live_reload", false)?;
        }
        builder = builder.set_override("build.config", config_file.clone())?;

        let section: BuildSection = builder.build()?.try_deserialize()?;

        let site = if file_exists {
            lapoz_core::Config::read(&config_file)
                .with_context(|| format!("Failed to read {config_file}"))?
        } else {
            tracing::debug!(file = %config_file, "no configuration file, using defaults");
            lapoz_core::Config::default()
        };

        Ok(Self {
            build: section.build,
            site,
        })
    }
}

fn arg(args: &ArgMatches, id: &str) -> Option<String> {
    args.try_get_one::<String>(id).ok().flatten().cloned()
}

fn flag(args: &ArgMatches, id: &str) -> bool {
    args.try_get_one::<bool>(id).ok().flatten().copied().unwrap_or(false)
}
