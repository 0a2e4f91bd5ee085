//! Gateway configuration.
//!
//! Everything that used to be a per-process constant (channel, contract, CA name, MSP id, the
//! bootstrap admin's credentials) lives in [`GatewayConfig`] and is handed to the components
//! when they are constructed.
use crate::config::directories::get_user_data_dir;
use crate::error::config::LoadGatewayConfigError;
use crate::error::config::LoadGatewayConfigError::{
    DetermineWalletDirectoryFailed, LoadConfigFileFailed,
};
use crate::json::load_json_file;
use crate::ledger::DiscoveryOptions;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub mod directories;
pub mod profile;

pub const CONFIG_FILE_NAME: &str = "fabgate.json";
pub const ADMIN_SECRET_ENV: &str = "FABGATE_ADMIN_SECRET";
pub const WALLET_PASSWORD_ENV: &str = "FABGATE_WALLET_PASSWORD";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewayConfig {
    /// The channel the contract is deployed to.
    pub channel: String,

    /// The contract (chaincode) queries are evaluated against.
    pub contract: String,

    /// The name of the certificate authority, as listed in the connection profile.
    pub ca_name: String,

    /// The membership service provider id stamped on every enrolled identity.
    pub msp_id: String,

    /// The affiliation new users are registered under.
    pub affiliation: String,

    pub admin: AdminConfig,

    /// Where identities are stored. Defaults to `wallet` under the user data directory.
    pub wallet_dir: Option<PathBuf>,

    /// If set, private keys are encrypted at rest with the password taken from
    /// `FABGATE_WALLET_PASSWORD`.
    pub wallet_encryption: bool,

    /// Path to the network's connection profile.
    pub connection_profile: PathBuf,

    pub discovery: DiscoveryOptions,

    pub server: ServerConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            channel: "mychannel".to_string(),
            contract: "basic".to_string(),
            ca_name: "ca.org1.example.com".to_string(),
            msp_id: "Org1MSP".to_string(),
            affiliation: "org1.department1".to_string(),
            admin: AdminConfig::default(),
            wallet_dir: None,
            wallet_encryption: false,
            connection_profile: PathBuf::from("connection-org1.json"),
            discovery: DiscoveryOptions::default(),
            server: ServerConfig::default(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdminConfig {
    /// The enrollment id of the bootstrap admin.
    pub id: String,

    /// The well-known enrollment secret of the bootstrap admin.
    pub secret: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            id: "admin".to_string(),
            secret: "adminpw".to_string(),
        }
    }
}

impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("id", &self.id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
        }
    }
}

impl GatewayConfig {
    /// Loads the configuration from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, LoadGatewayConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let config: GatewayConfig = load_json_file(path)
            .map_err(|err| LoadConfigFileFailed(Box::new(path.to_path_buf()), err))?;
        Ok(config.resolve_relative_to(path))
    }

    /// Applies overrides taken from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(secret) = lookup(ADMIN_SECRET_ENV) {
            self.admin.secret = secret;
        }
        self
    }

    /// The wallet directory, falling back to the per-user data directory.
    pub fn wallet_dir(&self) -> Result<PathBuf, LoadGatewayConfigError> {
        match &self.wallet_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(get_user_data_dir()
                .map_err(DetermineWalletDirectoryFailed)?
                .join("wallet")),
        }
    }

    // Relative paths in a config file are relative to the file, not the working directory.
    fn resolve_relative_to(mut self, config_path: &Path) -> Self {
        let Some(base) = config_path.parent() else {
            return self;
        };
        if self.connection_profile.is_relative() {
            self.connection_profile = base.join(&self.connection_profile);
        }
        if let Some(dir) = self.wallet_dir.as_mut() {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
        self
    }
}
