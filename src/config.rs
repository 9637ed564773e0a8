use crate::database::{Backend, MemoryBackend};
use crate::error::Result;
use clap::Parser;
use log::info;
use std::path::PathBuf;

/// Film and friendship catalog served over HTTP.
#[derive(Parser, Debug, Clone)]
#[command(name = "cinegraph", long_about = None)]
pub struct Settings {
    /// Address to listen on
    #[arg(long, env = "CINEGRAPH_BIND", default_value = "127.0.0.1:8080")]
    pub bind: String,

    /// Directory of the sled database; everything is kept in memory when unset
    #[arg(long, env = "CINEGRAPH_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, env = "CINEGRAPH_LOG", default_value = "cinegraph=debug,actix_web=info")]
    pub log: String,

    /// Add a few demo people and films at start
    #[arg(long)]
    pub seed: bool,
}

impl Settings {
    /// Reads `.env` if there is one, then the command line and environment.
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Self::parse()
    }

    pub fn open_backend(&self) -> Result<Box<dyn Backend>> {
        match &self.data_dir {
            Some(dir) => {
                info!("opening sled database at {}", dir.display());
                Ok(Box::new(sled::open(dir)?))
            }
            None => {
                info!("using in-memory storage");
                Ok(Box::new(MemoryBackend::new()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = Settings::try_parse_from(["cinegraph"]).unwrap();
        assert_eq!(settings.bind, "127.0.0.1:8080");
        assert!(!settings.seed);
        assert!(settings.open_backend().is_ok());
    }

    #[test]
    fn flags() {
        let settings =
            Settings::try_parse_from(["cinegraph", "--bind", "0.0.0.0:9000", "--seed"]).unwrap();
        assert_eq!(settings.bind, "0.0.0.0:9000");
        assert!(settings.seed);
    }
}
