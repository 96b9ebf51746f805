use crate::assistants::ApiCredentials;
use crate::executor::SandboxSettings;
use crate::run::RunSettings;
use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

/// Config file looked up in the working directory when none is given.
const DEFAULT_CONFIG_NAME: &str = "graph-maker";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// API base URL, including the version segment
    #[arg(long, env = "OPENAI_BASE_URL")]
    pub base_url: Option<String>,

    /// Model used by the assistant
    #[arg(long, env = "GRAPH_MAKER_MODEL")]
    pub model: Option<String>,

    /// Folder whose files are uploaded as the dataset
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Interpreter that runs generated scripts
    #[arg(long)]
    pub interpreter: Option<String>,

    /// Milliseconds between two polls of a pending run
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// Wall-clock limit for one script, in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub api: ApiConfig,
    #[serde(default)]
    pub run: RunSettings,
    #[serde(default)]
    pub sandbox: SandboxSettings,
    pub dataset: DatasetConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub model: String,
    pub assistant_name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatasetConfig {
    /// Local folder uploaded at startup; also the path prefix named to the agent.
    pub folder: PathBuf,
    /// Where generated code is asked to save the graph.
    pub output_path: String,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    /// Priority: CLI flag > `GRAPH_MAKER_` env var > config file > defaults.
    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        let mut builder = Config::builder()
            .set_default("api.base_url", "https://api.openai.com/v1")?
            .set_default("api.model", "gpt-4-1106-preview")?
            .set_default("api.assistant_name", "Graph Generator")?
            .set_default("dataset.folder", "DATA")?
            .set_default("dataset.output_path", "graph.png")?;

        builder = match &cli.config {
            Some(path) => builder.add_source(File::with_name(path).required(true)),
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_NAME).required(false)),
        };

        // E.g. GRAPH_MAKER_RUN__POLL_INTERVAL_MS=500
        builder = builder.add_source(
            Environment::with_prefix("GRAPH_MAKER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        if let Some(url) = cli.base_url {
            builder = builder.set_override("api.base_url", url)?;
        }
        if let Some(model) = cli.model {
            builder = builder.set_override("api.model", model)?;
        }
        if let Some(dir) = cli.data_dir {
            builder = builder.set_override("dataset.folder", dir.to_string_lossy().into_owned())?;
        }
        if let Some(interpreter) = cli.interpreter {
            builder = builder.set_override("sandbox.interpreter", interpreter)?;
        }
        if let Some(ms) = cli.poll_interval_ms {
            builder = builder.set_override("run.poll_interval_ms", ms)?;
        }
        if let Some(secs) = cli.timeout_secs {
            builder = builder.set_override("sandbox.timeout_secs", secs)?;
        }

        let cfg = builder.build()?;
        cfg.try_deserialize()
    }
}

/// Read the API key from the environment; it is never taken from config files.
pub fn load_api_credentials(base_url: &str) -> Result<ApiCredentials, String> {
    if base_url.trim().is_empty() {
        return Err("api.base_url cannot be empty".to_string());
    }

    let api_key = std::env::var("OPENAI_API_KEY")
        .map_err(|_| "Missing required env var: OPENAI_API_KEY".to_string())?;
    if api_key.trim().is_empty() {
        return Err("OPENAI_API_KEY cannot be empty".to_string());
    }

    Ok(ApiCredentials {
        base_url: base_url.to_string(),
        api_key,
    })
}
