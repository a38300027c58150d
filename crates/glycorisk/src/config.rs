//! Server configuration.
//!
//! Every option can be given as a flag or through the environment; flags win.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::loader::{ArtifactLocation, DEFAULT_MODEL_DIR};

/// Default listening port.
pub const DEFAULT_PORT: u16 = 5001;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

#[derive(Debug, Clone, Parser)]
#[command(
    name = "glycorisk-server",
    version,
    about = "Serve diabetes-risk predictions over HTTP",
    long_about = "Loads a gradient boosted tree classifier and its preprocessing pipeline\n\
        from the model directory and answers POST /predict and GET /health.\n\n\
        The server keeps running when the model cannot be loaded; /predict then\n\
        returns 500 and /health reports the cause."
)]
pub struct Config {
    /// Address to bind
    #[arg(long, env = "GLYCORISK_HOST", default_value = "127.0.0.1")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Directory holding model.json / model.txt and preprocessing_pipeline.json
    #[arg(long, value_name = "DIR", env = "GLYCORISK_MODEL_DIR", default_value = DEFAULT_MODEL_DIR)]
    pub model_dir: PathBuf,

    /// Log output format
    #[arg(long, value_enum, env = "GLYCORISK_LOG_FORMAT", default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Config {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn location(&self) -> ArtifactLocation {
        ArtifactLocation::new(&self.model_dir)
    }
}
