use anyhow::{anyhow, bail, Result};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("spacex_launch_dash.csv"),
            host: "127.0.0.1".to_string(),
            port: 8080,
            debug: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            data_path: std::env::var("DATA_PATH").map(PathBuf::from).unwrap_or(d.data_path),
            host: std::env::var("HOST").unwrap_or(d.host),
            port: std::env::var("PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(d.port),
            debug: std::env::var("DEBUG").ok().map(|v| parse_flag(&v)).unwrap_or(d.debug),
        }
    }

    /// Command-line overrides: `[DATA_PATH] [--host H] [--port P] [--debug]`.
    pub fn apply_args<I>(&mut self, args: I) -> Result<()>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let mut positional = false;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--host" => {
                    self.host = args.next().ok_or_else(|| anyhow!("--host needs a value"))?;
                }
                "--port" => {
                    let raw = args.next().ok_or_else(|| anyhow!("--port needs a value"))?;
                    self.port = raw.parse().map_err(|e| anyhow!("bad --port {:?}: {}", raw, e))?;
                }
                "--debug" => self.debug = true,
                flag if flag.starts_with("--") => bail!("unknown flag: {}", flag),
                path => {
                    if positional {
                        bail!("unexpected argument: {}", path);
                    }
                    self.data_path = PathBuf::from(path);
                    positional = true;
                }
            }
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_flag(v: &str) -> bool {
    matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
