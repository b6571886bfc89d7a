use serde_derive::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_PATH: &str = "/api/stpp";

/// Endpoint settings. Hosts read these when wiring the websocket route.
#[derive(Serialize, Deserialize)]
pub struct Config {
    /// Websocket path the endpoint is served under.
    pub path: String,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            path: DEFAULT_PATH.to_string(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Config {
        serdeconv::from_toml_file(path).expect("Error loading endpoint configuration file")
    }
}
