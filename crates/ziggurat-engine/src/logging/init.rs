use std::sync::Once;

/// Settings for the process-wide logger.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// `env_logger` filter string, e.g. `"ziggurat_engine=debug,wgpu=warn"`.
    /// When absent, `RUST_LOG` applies, then the built-in default.
    pub env_filter: Option<String>,

    /// ANSI color behavior.
    pub write_style: env_logger::WriteStyle,

    /// Modules capped at warn under the built-in default. The GPU stack
    /// logs heavily at info.
    pub quiet_modules: Vec<&'static str>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
            quiet_modules: vec!["wgpu_core", "wgpu_hal", "naga"],
        }
    }
}

static INIT: Once = Once::new();

/// Installs the global logger. Only the first call takes effect, so
/// libraries and tests may call it freely.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        match (&config.env_filter, std::env::var("RUST_LOG").ok()) {
            (Some(filter), _) => {
                builder.parse_filters(filter);
            }
            (None, Some(filter)) => {
                builder.parse_filters(&filter);
            }
            (None, None) => {
                builder.filter_level(log::LevelFilter::Info);
                for module in &config.quiet_modules {
                    builder.filter_module(module, log::LevelFilter::Warn);
                }
            }
        }

        builder.write_style(config.write_style).init();
        log::debug!("logging ready");
    });
}
