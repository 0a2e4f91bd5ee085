//! Credential stores ("wallets").
//!
//! A wallet maps a label to exactly one [`Identity`]. It is append-only: there is no update or
//! delete, and writing a label that is already present fails with
//! [`PutIdentityError::AlreadyExists`] instead of overwriting.
use crate::error::wallet::{
    GetIdentityError, InvalidLabelError, ListIdentitiesError, PutIdentityError,
};
use crate::identity::Identity;
use std::sync::Arc;

pub mod encryption;
mod entry;
pub mod file_system;
pub mod in_memory;

pub use file_system::FileSystemWallet;
pub use in_memory::InMemoryWallet;

pub trait CredentialStore: Send + Sync {
    /// Whether an identity is stored under `label`. Invalid labels are never present.
    fn exists(&self, label: &str) -> bool;

    /// Stores `identity` under `label`.
    ///
    /// Of two concurrent puts for the same label exactly one succeeds. The record is durable
    /// once this returns `Ok`.
    fn put(&self, label: &str, identity: &Identity) -> Result<(), PutIdentityError>;

    fn get(&self, label: &str) -> Result<Identity, GetIdentityError>;

    /// All stored labels, sorted.
    fn list(&self) -> Result<Vec<String>, ListIdentitiesError>;
}

/// [`CredentialStore::get`] on the blocking thread pool. Encrypted wallets derive a key with
/// Argon2 on every read.
pub async fn get_blocking(
    wallet: &Arc<dyn CredentialStore>,
    label: &str,
) -> Result<Identity, GetIdentityError> {
    let wallet = wallet.clone();
    let label = label.to_string();
    tokio::task::spawn_blocking(move || wallet.get(&label)).await?
}

/// [`CredentialStore::put`] on the blocking thread pool.
pub async fn put_blocking(
    wallet: &Arc<dyn CredentialStore>,
    label: &str,
    identity: Identity,
) -> Result<(), PutIdentityError> {
    let wallet = wallet.clone();
    let label = label.to_string();
    tokio::task::spawn_blocking(move || wallet.put(&label, &identity)).await?
}

/// Labels double as file names, so they may not traverse or hide.
pub fn validate_label(label: &str) -> Result<(), InvalidLabelError> {
    let reason = if label.is_empty() {
        Some("label is empty")
    } else if label.starts_with('.') {
        Some("label may not start with '.'")
    } else if label.contains(['/', '\\']) {
        Some("label may not contain path separators")
    } else if label.chars().any(char::is_control) {
        Some("label may not contain control characters")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(InvalidLabelError {
            label: label.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn accepts_ordinary_labels() {
        for label in ["admin", "alice", "0x71C7656EC7ab88b098defB751B7401B5f6d8976F", "user@org1"] {
            assert!(validate_label(label).is_ok(), "{label}");
        }
    }

    #[test]
    fn rejects_path_like_labels() {
        for label in ["", ".", "..", "../admin", "a/b", "a\\b", ".hidden", "a\nb"] {
            assert!(validate_label(label).is_err(), "{label:?}");
        }
    }

    proptest! {
        #[test]
        fn valid_labels_stay_inside_the_wallet(label in "\\PC*") {
            if validate_label(&label).is_ok() {
                let root = std::path::Path::new("/wallet");
                let path = root.join(format!("{label}.id"));
                prop_assert_eq!(path.parent(), Some(root));
            }
        }
    }
}
