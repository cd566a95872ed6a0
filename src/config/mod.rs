//! Configuration management
//!
//! Everything is read from the environment once at startup. CLI flags can
//! override the root directory and the bind target afterwards.

use anyhow::{anyhow, Result};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::imagegen::{ImageApiConfig, ImageSize, DEFAULT_API_URL, DEFAULT_MODEL, DEFAULT_SIZE};

/// Secret used for the session cookie when `SMILE_SECRET` is not set.
pub const DEFAULT_SECRET: &str = "smile-secret-key";

/// Default TCP bind target, matching the reverse proxy default.
pub const DEFAULT_BIND: &str = "127.0.0.1:8000";

/// Where the server listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bind {
    /// `host:port`
    Tcp(String),
    /// Path to a Unix domain socket
    Unix(PathBuf),
}

impl fmt::Display for Bind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bind::Tcp(addr) => write!(f, "{addr}"),
            Bind::Unix(path) => write!(f, "unix:{}", path.display()),
        }
    }
}

impl FromStr for Bind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(path) = s.strip_prefix("unix:") {
            if path.is_empty() {
                return Err("Unix socket bind needs a path, e.g. unix:/run/smile.sock".to_string());
            }
            return Ok(Bind::Unix(PathBuf::from(path)));
        }

        match s.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {
                Ok(Bind::Tcp(s.to_string()))
            }
            _ => Err(format!(
                "Invalid bind '{s}'. Expected host:port or unix:/path/to.sock"
            )),
        }
    }
}

/// On-disk layout under the application root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Served at `/static`.
    pub fn static_dir(&self) -> PathBuf {
        self.root.join("static")
    }

    pub fn generated_dir(&self) -> PathBuf {
        self.static_dir().join("generated")
    }

    pub fn album_dir(&self) -> PathBuf {
        self.static_dir().join("album_images")
    }

    pub fn db_path(&self) -> PathBuf {
        self.root.join("smiles.db")
    }

    pub fn prompt_log_path(&self) -> PathBuf {
        self.root.join("prompt_log.txt")
    }
}

/// Resolved application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub layout: Layout,
    pub bind: Bind,
    pub secret: String,
    pub image_api: ImageApiConfig,
}

impl Config {
    /// Loads configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through `lookup`, which maps a variable name to its value.
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = var("SMILE_IMAGE_API_KEY").or_else(|| var("OPENAI_API_KEY"));
        if api_key.is_none() {
            tracing::warn!("No SMILE_IMAGE_API_KEY or OPENAI_API_KEY set, image generation will fail");
        }

        let secret = var("SMILE_SECRET").unwrap_or_else(|| {
            tracing::warn!("SMILE_SECRET not set, using the built-in default");
            DEFAULT_SECRET.to_string()
        });

        let size_str = var("SMILE_IMAGE_SIZE").unwrap_or_else(|| DEFAULT_SIZE.to_string());
        let size: ImageSize = size_str
            .parse()
            .map_err(|e| anyhow!("SMILE_IMAGE_SIZE: {e}"))?;

        let bind = match var("SMILE_BIND") {
            Some(value) => value.parse().map_err(|e| anyhow!("SMILE_BIND: {e}"))?,
            None => Bind::Tcp(DEFAULT_BIND.to_string()),
        };

        let root = match var("SMILE_ROOT") {
            Some(root) => PathBuf::from(root),
            None => env::current_dir()?,
        };

        Ok(Self {
            layout: Layout::new(root),
            bind,
            secret,
            image_api: ImageApiConfig {
                api_key,
                api_url: var("SMILE_IMAGE_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
                model: var("SMILE_IMAGE_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                size,
            },
        })
    }

    /// Replaces the application root.
    pub fn with_root(mut self, root: &Path) -> Self {
        self.layout = Layout::new(root);
        self
    }

    pub fn with_bind(mut self, bind: Bind) -> Self {
        self.bind = bind;
        self
    }

    /// True when the session secret is the shipped default.
    pub fn uses_default_secret(&self) -> bool {
        self.secret == DEFAULT_SECRET
    }
}

/// Masks a secret for display, keeping only the last four characters.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{tail}", "*".repeat(chars.len() - 4))
}
