//! Evaluating contract functions on the ledger network under a stored identity.
//!
//! Every evaluation opens its own connection and tears it down before returning. Connections
//! are never shared or pooled.
use crate::config::GatewayConfig;
use crate::error::ledger::QueryError::{
    ChannelNotFound, ConnectFailed, ContractNotFound, EvaluationFailed, IdentityMissing,
    LoadIdentityFailed,
};
use crate::error::ledger::{ConnectError, EvaluateError, QueryError};
use crate::error::wallet::GetIdentityError;
use crate::identity::Identity;
use crate::wallet::{get_blocking, CredentialStore};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use slog::{debug, Logger};
use std::sync::Arc;

pub mod gateway;
mod proposal;
mod proto;

pub use gateway::FabricGateway;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiscoveryOptions {
    pub enabled: bool,

    /// Peers advertise docker-internal host names; rewrite them to `localhost`.
    pub as_localhost: bool,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            as_localhost: false,
        }
    }
}

/// One read-only contract call, built per incoming query and consumed by it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDescriptor {
    pub identity: String,
    pub function: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// A channel resolved on a connection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Network {
    channel: String,
}

impl Network {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.channel
    }

    pub fn get_contract(&self, name: &str) -> Contract {
        Contract {
            channel: self.channel.clone(),
            name: name.to_string(),
        }
    }
}

/// A contract (chaincode) on a channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Contract {
    channel: String,
    name: String,
}

impl Contract {
    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
pub trait LedgerNetwork: Send + Sync {
    /// Opens a connection authenticated as `identity`.
    async fn connect(
        &self,
        identity: &Identity,
        discovery: &DiscoveryOptions,
    ) -> Result<Box<dyn Connection>, ConnectError>;
}

#[async_trait]
pub trait Connection: Send + Sync {
    /// `None` if the channel is unknown to this connection.
    fn get_network(&self, channel: &str) -> Option<Network>;

    /// Evaluates `function` without submitting it for ordering and returns the peer's payload.
    async fn evaluate(
        &self,
        contract: &Contract,
        function: &str,
        args: &[String],
    ) -> Result<Vec<u8>, EvaluateError>;

    fn disconnect(&mut self);
}

/// Owns a connection and disconnects it exactly once: explicitly, or when dropped mid-call.
pub struct ConnectionGuard {
    connection: Option<Box<dyn Connection>>,
}

impl ConnectionGuard {
    pub fn new(connection: Box<dyn Connection>) -> Self {
        Self {
            connection: Some(connection),
        }
    }

    pub fn get_network(&self, channel: &str) -> Option<Network> {
        self.connection.as_ref()?.get_network(channel)
    }

    pub async fn evaluate(
        &self,
        contract: &Contract,
        function: &str,
        args: &[String],
    ) -> Result<Vec<u8>, EvaluateError> {
        match &self.connection {
            Some(connection) => connection.evaluate(contract, function, args).await,
            None => Err(EvaluateError::Disconnected()),
        }
    }

    pub fn disconnect(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            connection.disconnect();
        }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.disconnect();
    }
}

pub struct LedgerSession {
    log: Logger,
    wallet: Arc<dyn CredentialStore>,
    network: Arc<dyn LedgerNetwork>,
    channel: String,
    contract: String,
    discovery: DiscoveryOptions,
}

impl LedgerSession {
    pub fn new(
        log: &Logger,
        config: &GatewayConfig,
        wallet: Arc<dyn CredentialStore>,
        network: Arc<dyn LedgerNetwork>,
    ) -> Self {
        Self {
            log: log.clone(),
            wallet,
            network,
            channel: config.channel.clone(),
            contract: config.contract.clone(),
            discovery: config.discovery.clone(),
        }
    }

    /// Evaluates a transaction against the configured channel and contract.
    pub async fn query(&self, transaction: &TransactionDescriptor) -> Result<Vec<u8>, QueryError> {
        self.evaluate(
            &transaction.identity,
            &self.channel,
            &self.contract,
            &transaction.function,
            &transaction.args,
        )
        .await
    }

    /// Evaluates `function(args)` on `contract` in `channel` as the identity stored under
    /// `label`. The payload is returned as the peer produced it.
    pub async fn evaluate(
        &self,
        label: &str,
        channel: &str,
        contract: &str,
        function: &str,
        args: &[String],
    ) -> Result<Vec<u8>, QueryError> {
        if !self.wallet.exists(label) {
            return Err(IdentityMissing(Box::new(label.to_string())));
        }
        let identity = get_blocking(&self.wallet, label)
            .await
            .map_err(|err| match err {
                GetIdentityError::NotFound(label) => IdentityMissing(label),
                err => LoadIdentityFailed(Box::new(label.to_string()), err),
            })?;

        debug!(self.log, "Connecting to the ledger network as '{}'", label;
            "discovery" => self.discovery.enabled, "as_localhost" => self.discovery.as_localhost);
        let connection = self
            .network
            .connect(&identity, &self.discovery)
            .await
            .map_err(|err| ConnectFailed(Box::new(label.to_string()), err))?;
        let mut connection = ConnectionGuard::new(connection);

        let result = self
            .evaluate_on(&connection, channel, contract, function, args)
            .await;
        connection.disconnect();
        debug!(self.log, "Disconnected '{}'", label);

        let payload = result?;
        debug!(self.log, "Evaluated '{}'", function; "result_bytes" => payload.len());
        Ok(payload)
    }

    async fn evaluate_on(
        &self,
        connection: &ConnectionGuard,
        channel: &str,
        contract: &str,
        function: &str,
        args: &[String],
    ) -> Result<Vec<u8>, QueryError> {
        let network = connection
            .get_network(channel)
            .ok_or_else(|| ChannelNotFound(Box::new(channel.to_string())))?;
        let contract = network.get_contract(contract);
        connection
            .evaluate(&contract, function, args)
            .await
            .map_err(|err| classify(err, &contract, function))
    }
}

// Peers report unknown channels and chaincodes only in the gateway's status text. A contract's
// own failures arrive wrapped as "chaincode response <status>, <message>" and are never
// resolution failures, whatever they say.
fn classify(err: EvaluateError, contract: &Contract, function: &str) -> QueryError {
    if let EvaluateError::Status(status) = &err {
        let message = status.message().to_lowercase();
        if status.code() == tonic::Code::NotFound || !is_contract_response(&message) {
            if names_missing(&message, "chaincode", contract.name(), &["not found"]) {
                return ContractNotFound {
                    channel: Box::new(contract.channel().to_string()),
                    contract: Box::new(contract.name().to_string()),
                };
            }
            if names_missing(
                &message,
                "channel",
                contract.channel(),
                &["not found", "does not exist"],
            ) {
                return ChannelNotFound(Box::new(contract.channel().to_string()));
            }
        }
    }
    EvaluationFailed(Box::new(function.to_string()), err)
}

fn is_contract_response(message: &str) -> bool {
    const WRAPPER: &str = "chaincode response ";
    message.match_indices(WRAPPER).any(|(at, _)| {
        let rest = &message[at + WRAPPER.len()..];
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        digits > 0 && rest[digits..].starts_with(',')
    })
}

/// Whether `message` says `<subject> <name> <outcome>`, with `name` bare or quoted.
fn names_missing(message: &str, subject: &str, name: &str, outcomes: &[&str]) -> bool {
    let name = name.to_lowercase();
    [name.clone(), format!("'{name}'"), format!("\"{name}\"")]
        .iter()
        .any(|quoted| {
            outcomes
                .iter()
                .any(|outcome| message.contains(&format!("{subject} {quoted} {outcome}")))
        })
}
