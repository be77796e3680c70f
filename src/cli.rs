use std::net::SocketAddr;
use std::time::Duration;

use axum::http::HeaderValue;
use clap::{Args, Parser, Subcommand};

use crate::metadata::{PKG_DESCRIPTION, PKG_NAME, PKG_VERSION};
use crate::storage::MongoSettings;
use crate::storage::mongo::{DEFAULT_COLLECTION, DEFAULT_DATABASE};

pub const DEFAULT_ALLOWED_ORIGINS: [&str; 4] = [
    "http://localhost:3000",
    "http://localhost:5173",
    "https://health-nex-ai-1ca4.vercel.app",
    "https://health-nex-8o690wdao-sajeel0944s-projects.vercel.app",
];

#[derive(Parser, Debug, Clone)]
#[command(name = PKG_NAME)]
#[command(version = PKG_VERSION)]
#[command(about = PKG_DESCRIPTION, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Start the HTTP server
    Start(CommandArguments),
    /// Show the resolved configuration
    Status(CommandArguments),
    /// Print the JSON Schemas of the request payloads
    Schema,
    /// Print version information
    Version,
}

#[derive(Args, Debug, Clone)]
pub struct CommandArguments {
    /// MongoDB connection string
    #[arg(long, env = "MONGODB_URI", hide_env_values = true)]
    pub mongodb_uri: Option<String>,

    /// Database holding the todo lists
    #[arg(long, env = "TODO_DATABASE", default_value = DEFAULT_DATABASE)]
    pub database: String,

    /// Collection holding one document per user
    #[arg(long, env = "TODO_COLLECTION", default_value = DEFAULT_COLLECTION)]
    pub collection: String,

    /// HTTP bind address
    #[arg(long, env = "TODO_HTTP_ADDR", default_value = "0.0.0.0:8000")]
    pub http_addr: String,

    /// Origins allowed by CORS (comma separated)
    #[arg(
        long,
        env = "TODO_ALLOWED_ORIGINS",
        value_delimiter = ',',
        default_values_t = DEFAULT_ALLOWED_ORIGINS.map(String::from)
    )]
    pub allowed_origins: Vec<String>,

    /// Upper bound of the driver's connection pool
    #[arg(long, env = "TODO_MAX_POOL_SIZE", default_value_t = 10)]
    pub max_pool_size: u32,

    /// Connections the driver keeps open while idle
    #[arg(long, env = "TODO_MIN_POOL_SIZE", default_value_t = 0)]
    pub min_pool_size: u32,

    /// Connect and server selection timeout, in seconds
    #[arg(long, env = "TODO_CONNECT_TIMEOUT_SECS", default_value_t = 10)]
    pub connect_timeout_secs: u64,

    /// Keep todo lists in process memory instead of MongoDB
    #[arg(long, env = "TODO_IN_MEMORY", default_value_t = false)]
    pub in_memory: bool,
}

impl CommandArguments {
    pub fn default_settings() -> Self {
        Self {
            mongodb_uri: None,
            database: DEFAULT_DATABASE.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            http_addr: "0.0.0.0:8000".to_string(),
            allowed_origins: DEFAULT_ALLOWED_ORIGINS.map(String::from).to_vec(),
            max_pool_size: 10,
            min_pool_size: 0,
            connect_timeout_secs: 10,
            in_memory: false,
        }
    }

    /// Validate CLI/environment-derived arguments.
    pub fn validate(&self) -> Result<(), String> {
        self.http_addr
            .parse::<SocketAddr>()
            .map_err(|e| format!("Invalid TODO_HTTP_ADDR '{}': {e}", self.http_addr))?;

        if !self.in_memory {
            let uri = self
                .mongodb_uri
                .as_deref()
                .map(str::trim)
                .filter(|uri| !uri.is_empty())
                .ok_or_else(|| "MONGODB_URI is required unless --in-memory is set".to_string())?;
            if !uri.starts_with("mongodb://") && !uri.starts_with("mongodb+srv://") {
                return Err(
                    "MONGODB_URI must start with mongodb:// or mongodb+srv://".to_string(),
                );
            }
        }

        if self.max_pool_size == 0 {
            return Err("TODO_MAX_POOL_SIZE must be greater than zero".to_string());
        }
        if self.min_pool_size > self.max_pool_size {
            return Err(format!(
                "TODO_MIN_POOL_SIZE ({}) exceeds TODO_MAX_POOL_SIZE ({})",
                self.min_pool_size, self.max_pool_size
            ));
        }

        if self.allowed_origins.is_empty() {
            return Err("TODO_ALLOWED_ORIGINS cannot be empty".to_string());
        }
        for origin in &self.allowed_origins {
            if origin == "*" {
                return Err("TODO_ALLOWED_ORIGINS cannot contain '*'".to_string());
            }
            HeaderValue::from_str(origin)
                .map_err(|e| format!("Invalid origin '{origin}': {e}"))?;
        }
        Ok(())
    }

    pub fn mongo_settings(&self) -> Option<MongoSettings> {
        let uri = self.mongodb_uri.as_deref()?.trim();
        Some(MongoSettings {
            uri: uri.to_string(),
            database: self.database.clone(),
            collection: self.collection.clone(),
            max_pool_size: self.max_pool_size,
            min_pool_size: self.min_pool_size,
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
        })
    }

    /// The connection string with any password replaced, for display.
    pub fn masked_uri(&self) -> String {
        match self.mongodb_uri.as_deref() {
            None => "<unset>".to_string(),
            Some(uri) => mask_credentials(uri),
        }
    }
}

fn mask_credentials(uri: &str) -> String {
    let Some((scheme, rest)) = uri.split_once("://") else {
        return uri.to_string();
    };
    let Some((userinfo, host)) = rest.rsplit_once('@') else {
        return uri.to_string();
    };
    match userinfo.split_once(':') {
        Some((user, _)) => format!("{scheme}://{user}:****@{host}"),
        None => uri.to_string(),
    }
}
