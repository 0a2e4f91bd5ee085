use crate::error::wallet::GetIdentityError::NotFound;
use crate::error::wallet::PutIdentityError::AlreadyExists;
use crate::error::wallet::{GetIdentityError, ListIdentitiesError, PutIdentityError};
use crate::identity::Identity;
use crate::wallet::{validate_label, CredentialStore};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A wallet that lives only as long as the process.
#[derive(Default)]
pub struct InMemoryWallet {
    identities: Mutex<BTreeMap<String, Identity>>,
}

impl InMemoryWallet {
    pub fn new() -> Self {
        Self::default()
    }

    fn identities(&self) -> MutexGuard<'_, BTreeMap<String, Identity>> {
        // Every write is a single insert, so a poisoned map is still consistent.
        self.identities
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl CredentialStore for InMemoryWallet {
    fn exists(&self, label: &str) -> bool {
        self.identities().contains_key(label)
    }

    fn put(&self, label: &str, identity: &Identity) -> Result<(), PutIdentityError> {
        validate_label(label).map_err(PutIdentityError::InvalidLabel)?;
        match self.identities().entry(label.to_string()) {
            Entry::Occupied(_) => Err(AlreadyExists(Box::new(label.to_string()))),
            Entry::Vacant(slot) => {
                slot.insert(identity.clone());
                Ok(())
            }
        }
    }

    fn get(&self, label: &str) -> Result<Identity, GetIdentityError> {
        self.identities()
            .get(label)
            .cloned()
            .ok_or_else(|| NotFound(Box::new(label.to_string())))
    }

    fn list(&self) -> Result<Vec<String>, ListIdentitiesError> {
        Ok(self.identities().keys().cloned().collect())
    }
}
