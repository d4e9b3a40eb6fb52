//! Service configuration. Model constants are fixed at compile time; the
//! network and artifact settings are read once at startup from an optional
//! `wan.toml` file and `WAN_SERVER_*` environment variables.

use ::config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Log filter used when `RUST_LOG` is not set
pub const RUST_LOG: &str = "info,actix_web=info";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 4004;
pub const DEFAULT_MODEL_PATH: &str = "models/model.pt";

/// Largest accepted `/classify` request body
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Model input shape: (batch, channels, height, width)
pub const INPUT_SHAPE: [i64; 4] = [1, 3, INPUT_HEIGHT as i64, INPUT_WIDTH as i64];
pub const INPUT_HEIGHT: u32 = 32;
pub const INPUT_WIDTH: u32 = 32;

/// Per-channel (R, G, B) normalization constants
pub const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Number of ranked classes written to the debug log per request
pub const TOP_N: usize = 5;

/// Class id -> label table of the bundled CIFAR-10 model
pub const LABELS: [&str; 10] = [
    "airplane",
    "automobile",
    "bird",
    "cat",
    "deer",
    "dog",
    "frog",
    "horse",
    "ship",
    "truck",
];

const ENV_PREFIX: &str = "WAN_SERVER";
const CONFIG_FILE: &str = "wan";

/// Runtime settings of the server process
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub model_path: String,
    pub max_payload_bytes: usize,
}

impl Settings {
    /// Read settings from `wan.toml` (if present) and the process environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_env(Environment::with_prefix(ENV_PREFIX))
    }

    fn from_env(env: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("host", DEFAULT_HOST)?
            .set_default("port", i64::from(DEFAULT_PORT))?
            .set_default("model_path", DEFAULT_MODEL_PATH)?
            .set_default("max_payload_bytes", DEFAULT_MAX_PAYLOAD_BYTES as i64)?
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(env.prefix_separator("_").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
