//! CLI configuration: engine settings plus CLI-only preferences.
//!
//! The engine keys (`strategy`, `output-root`, `[markers]`, ...) sit at the top
//! level of the file, next to the CLI-only keys below.

pub(crate) mod loader;

pub(crate) use loader::load_cli_config;

use serde::Deserialize;
use tracegen_engine::EngineConfig;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct CliConfig {
    #[serde(flatten)]
    pub engine: EngineConfig,

    /// Where `generate` writes the traceability model when `--trace-out` is absent.
    pub trace_out: Option<String>,

    /// Print the content of preview resources after generation. Default: true.
    #[serde(default = "default_show_preview")]
    pub show_preview: bool,
}

fn default_show_preview() -> bool {
    true
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            trace_out: None,
            show_preview: default_show_preview(),
        }
    }
}
