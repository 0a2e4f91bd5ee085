pub mod ca;
pub mod config;
pub mod error;
pub mod fs;
pub mod identity;
pub mod json;
pub mod ledger;
pub mod lifecycle;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod wallet;

pub use ca::{CertificateAuthority, FabricCaClient};
pub use config::GatewayConfig;
pub use identity::Identity;
pub use ledger::{FabricGateway, LedgerNetwork, LedgerSession, TransactionDescriptor};
pub use lifecycle::IdentityLifecycleManager;
pub use wallet::{CredentialStore, FileSystemWallet, InMemoryWallet};
