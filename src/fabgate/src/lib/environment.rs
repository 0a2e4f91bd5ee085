use crate::lib::error::FabgateResult;
use anyhow::{bail, Context};
use fabgate_core::config::directories::get_user_config_dir;
use fabgate_core::config::profile::ConnectionProfile;
use fabgate_core::config::{CONFIG_FILE_NAME, WALLET_PASSWORD_ENV};
use fabgate_core::{
    CredentialStore, FabricCaClient, FabricGateway, FileSystemWallet, GatewayConfig,
    IdentityLifecycleManager, LedgerSession,
};
use slog::{debug, Logger};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Overrides taken from the command line.
#[derive(Default)]
pub struct EnvironmentOverrides {
    pub config: Option<PathBuf>,
    pub wallet: Option<PathBuf>,
    pub profile: Option<PathBuf>,
}

/// The resolved configuration plus factories for the components commands need.
pub struct Environment {
    config: GatewayConfig,
    logger: Logger,
}

impl Environment {
    pub fn new(logger: Logger, overrides: EnvironmentOverrides) -> FabgateResult<Self> {
        let config_path = match overrides.config {
            Some(path) => path,
            None => default_config_path()?,
        };
        debug!(logger, "Configuration file: {}", config_path.display());
        let mut config = GatewayConfig::load(&config_path)?.with_env_overrides();
        if let Some(wallet) = overrides.wallet {
            config.wallet_dir = Some(wallet);
        }
        if let Some(profile) = overrides.profile {
            config.connection_profile = profile;
        }
        let logger = logger.new(slog::o!(
            "config" => config_path.display().to_string(),
            "msp_id" => config.msp_id.clone(),
        ));
        Ok(Self { config, logger })
    }

    pub fn get_logger(&self) -> &Logger {
        &self.logger
    }

    pub fn get_config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn get_wallet(&self) -> FabgateResult<Arc<dyn CredentialStore>> {
        let wallet = FileSystemWallet::new(&self.logger, self.config.wallet_dir()?)?;
        if !self.config.wallet_encryption {
            return Ok(Arc::new(wallet));
        }
        let Ok(password) = std::env::var(WALLET_PASSWORD_ENV) else {
            bail!(
                "Wallet encryption is enabled but {} is not set.",
                WALLET_PASSWORD_ENV
            );
        };
        Ok(Arc::new(wallet.with_password(password)))
    }

    fn get_connection_profile(&self) -> FabgateResult<ConnectionProfile> {
        let path = &self.config.connection_profile;
        ConnectionProfile::load(path)
            .with_context(|| format!("Failed to load connection profile {}.", path.display()))
    }

    pub fn new_lifecycle_manager(
        &self,
        wallet: Arc<dyn CredentialStore>,
    ) -> FabgateResult<IdentityLifecycleManager> {
        let profile = self.get_connection_profile()?;
        let endpoint = profile.ca_endpoint(&self.config.ca_name)?;
        let ca = FabricCaClient::new(&self.logger, &endpoint)?;
        Ok(IdentityLifecycleManager::new(
            &self.logger,
            &self.config,
            wallet,
            Arc::new(ca),
        ))
    }

    pub fn new_ledger_session(
        &self,
        wallet: Arc<dyn CredentialStore>,
    ) -> FabgateResult<LedgerSession> {
        let profile = self.get_connection_profile()?;
        let gateway = FabricGateway::new(&self.logger, &profile)?;
        Ok(LedgerSession::new(
            &self.logger,
            &self.config,
            wallet,
            Arc::new(gateway),
        ))
    }
}

/// `fabgate.json` in the working directory if there is one, else the per-user config file.
fn default_config_path() -> FabgateResult<PathBuf> {
    let local = Path::new(CONFIG_FILE_NAME);
    if local.exists() {
        return Ok(local.to_path_buf());
    }
    Ok(get_user_config_dir()?.join(CONFIG_FILE_NAME))
}
