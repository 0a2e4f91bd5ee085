use crate::error::io::IoError;
use crate::error::io::IoErrorKind::{CreateTempFileFailed, SyncFailed, WriteFileFailed};
use crate::error::wallet::GetIdentityError::{
    DecryptIdentityFailed, NotFound, ReadIdentityFailed, UnsupportedIdentityType,
};
use crate::error::wallet::ListIdentitiesError::ReadWalletDirFailed;
use crate::error::wallet::OpenWalletError::CreateWalletDirFailed;
use crate::error::wallet::PutIdentityError::{
    AlreadyExists, EncryptIdentityFailed, SerializeIdentityFailed, WriteIdentityFailed,
};
use crate::error::wallet::{
    GetIdentityError, ListIdentitiesError, OpenWalletError, PutIdentityError,
};
use crate::identity::{Identity, X509_IDENTITY_TYPE};
use crate::json::load_json_file;
use crate::wallet::entry::WalletEntry;
use crate::wallet::{validate_label, CredentialStore};
use slog::{debug, warn, Logger};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const IDENTITY_FILE_EXTENSION: &str = "id";

/// A wallet keeping one `<label>.id` JSON file per identity in a directory.
///
/// Writes go to a temporary file in the same directory which is flushed to disk and then
/// linked into place without clobbering, so a record is either fully present or absent and
/// concurrent writers of the same label cannot both win.
pub struct FileSystemWallet {
    log: Logger,
    root: PathBuf,
    password: Option<String>,
}

impl FileSystemWallet {
    pub fn new(log: &Logger, root: PathBuf) -> Result<Self, OpenWalletError> {
        crate::fs::create_dir_all(&root).map_err(CreateWalletDirFailed)?;
        debug!(log, "Wallet path: {}", root.display());
        Ok(Self {
            log: log.clone(),
            root,
            password: None,
        })
    }

    /// Private keys written from now on are encrypted with `password`; encrypted keys are
    /// decrypted with it on read.
    pub fn with_password(mut self, password: String) -> Self {
        self.password = Some(password);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn identity_path(&self, label: &str) -> PathBuf {
        self.root
            .join(format!("{label}.{IDENTITY_FILE_EXTENSION}"))
    }

    fn write_new(&self, path: &Path, content: &[u8]) -> Result<bool, IoError> {
        let mut temp = tempfile::Builder::new()
            .prefix(".")
            .suffix(".tmp")
            .tempfile_in(&self.root)
            .map_err(|err| IoError::new(CreateTempFileFailed(self.root.clone(), err)))?;
        temp.write_all(content)
            .map_err(|err| IoError::new(WriteFileFailed(temp.path().to_path_buf(), err)))?;
        temp.as_file()
            .sync_all()
            .map_err(|err| IoError::new(SyncFailed(temp.path().to_path_buf(), err)))?;
        crate::fs::set_owner_read_only(temp.path())?;

        match temp.persist_noclobber(path) {
            Ok(_) => {
                crate::fs::sync_dir(&self.root)?;
                Ok(true)
            }
            // The temporary file is removed when `err.file` is dropped.
            Err(err) if err.error.kind() == std::io::ErrorKind::AlreadyExists => Ok(false),
            Err(err) => Err(IoError::new(WriteFileFailed(path.to_path_buf(), err.error))),
        }
    }
}

impl CredentialStore for FileSystemWallet {
    fn exists(&self, label: &str) -> bool {
        validate_label(label).is_ok() && self.identity_path(label).is_file()
    }

    fn put(&self, label: &str, identity: &Identity) -> Result<(), PutIdentityError> {
        validate_label(label).map_err(PutIdentityError::InvalidLabel)?;
        let entry = WalletEntry::seal(identity, self.password.as_deref())
            .map_err(|err| EncryptIdentityFailed(Box::new(label.to_string()), err))?;
        let content = serde_json::to_vec_pretty(&entry)
            .map_err(|err| SerializeIdentityFailed(Box::new(label.to_string()), err))?;

        let path = self.identity_path(label);
        let created = self
            .write_new(&path, &content)
            .map_err(|err| WriteIdentityFailed(Box::new(label.to_string()), err))?;
        if !created {
            warn!(self.log, "Refusing to overwrite identity '{}'", label);
            return Err(AlreadyExists(Box::new(label.to_string())));
        }
        debug!(self.log, "Imported identity '{}' into the wallet", label);
        Ok(())
    }

    fn get(&self, label: &str) -> Result<Identity, GetIdentityError> {
        validate_label(label).map_err(GetIdentityError::InvalidLabel)?;
        let path = self.identity_path(label);
        if !path.is_file() {
            return Err(NotFound(Box::new(label.to_string())));
        }
        let entry: WalletEntry = load_json_file(&path)
            .map_err(|err| ReadIdentityFailed(Box::new(label.to_string()), err))?;
        if entry.identity_type() != X509_IDENTITY_TYPE {
            return Err(UnsupportedIdentityType(
                Box::new(label.to_string()),
                entry.identity_type().to_string(),
            ));
        }
        entry
            .open(self.password.as_deref())
            .map_err(|err| DecryptIdentityFailed(Box::new(label.to_string()), err))
    }

    fn list(&self) -> Result<Vec<String>, ListIdentitiesError> {
        let suffix = format!(".{IDENTITY_FILE_EXTENSION}");
        let mut labels: Vec<String> = crate::fs::read_dir_names(&self.root)
            .map_err(ReadWalletDirFailed)?
            .into_iter()
            .filter_map(|name| name.strip_suffix(&suffix).map(str::to_string))
            .filter(|label| validate_label(label).is_ok())
            .collect();
        labels.sort();
        Ok(labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{discard_logger, generate_identity};
    use std::sync::{Arc, Barrier};

    fn wallet() -> (tempfile::TempDir, FileSystemWallet) {
        let dir = tempfile::tempdir().unwrap();
        let wallet = FileSystemWallet::new(&discard_logger(), dir.path().join("wallet")).unwrap();
        (dir, wallet)
    }

    #[test]
    fn put_then_get_returns_the_record() {
        let (_dir, wallet) = wallet();
        let identity = generate_identity("Org1MSP", "alice");

        assert!(!wallet.exists("alice"));
        wallet.put("alice", &identity).unwrap();
        assert!(wallet.exists("alice"));
        assert_eq!(wallet.get("alice").unwrap(), identity);
        assert!(wallet.root().join("alice.id").is_file());
    }

    #[test]
    fn first_write_wins() {
        let (_dir, wallet) = wallet();
        let first = generate_identity("Org1MSP", "alice");
        let second = generate_identity("Org1MSP", "alice-again");

        wallet.put("alice", &first).unwrap();
        assert!(matches!(
            wallet.put("alice", &second),
            Err(AlreadyExists(label)) if *label == "alice"
        ));
        assert_eq!(wallet.get("alice").unwrap(), first);
        assert_eq!(wallet.list().unwrap(), vec!["alice".to_string()]);
    }

    #[test]
    fn missing_identity_is_not_found() {
        let (_dir, wallet) = wallet();
        assert!(matches!(wallet.get("bob"), Err(NotFound(_))));
    }

    #[test]
    fn invalid_labels_are_never_written() {
        let (dir, wallet) = wallet();
        let identity = generate_identity("Org1MSP", "mallory");

        assert!(matches!(
            wallet.put("../escape", &identity),
            Err(PutIdentityError::InvalidLabel(_))
        ));
        assert!(!wallet.exists("../escape"));
        assert!(!dir.path().join("escape.id").exists());
    }

    #[test]
    fn list_ignores_foreign_and_temporary_files() {
        let (_dir, wallet) = wallet();
        wallet
            .put("bob", &generate_identity("Org1MSP", "bob"))
            .unwrap();
        wallet
            .put("admin", &generate_identity("Org1MSP", "admin"))
            .unwrap();
        std::fs::write(wallet.root().join("notes.txt"), "x").unwrap();
        std::fs::write(wallet.root().join(".abc.tmp"), "x").unwrap();

        assert_eq!(
            wallet.list().unwrap(),
            vec!["admin".to_string(), "bob".to_string()]
        );
    }

    #[cfg(unix)]
    #[test]
    fn identity_files_are_owner_read_only() {
        use std::os::unix::fs::PermissionsExt;
        let (_dir, wallet) = wallet();
        wallet
            .put("alice", &generate_identity("Org1MSP", "alice"))
            .unwrap();
        let mode = std::fs::metadata(wallet.root().join("alice.id"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o400);
    }

    #[test]
    fn encrypted_wallet_requires_the_password() {
        let dir = tempfile::tempdir().unwrap();
        let log = discard_logger();
        let identity = generate_identity("Org1MSP", "alice");

        let sealed = FileSystemWallet::new(&log, dir.path().to_path_buf())
            .unwrap()
            .with_password("hunter2".to_string());
        sealed.put("alice", &identity).unwrap();
        assert_eq!(sealed.get("alice").unwrap(), identity);

        let on_disk = std::fs::read_to_string(dir.path().join("alice.id")).unwrap();
        assert!(!on_disk.contains(identity.private_key()));

        let unsealed = FileSystemWallet::new(&log, dir.path().to_path_buf()).unwrap();
        assert!(matches!(
            unsealed.get("alice"),
            Err(DecryptIdentityFailed(..))
        ));
    }

    #[test]
    fn concurrent_puts_of_one_label_yield_exactly_one_success() {
        let (_dir, wallet) = wallet();
        let wallet = Arc::new(wallet);
        let writers = 8;
        let barrier = Arc::new(Barrier::new(writers));

        let handles: Vec<_> = (0..writers)
            .map(|i| {
                let wallet = wallet.clone();
                let barrier = barrier.clone();
                let identity = generate_identity("Org1MSP", &format!("carol-{i}"));
                std::thread::spawn(move || {
                    barrier.wait();
                    wallet.put("carol", &identity).map(|_| identity)
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(winners.len(), 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|err| matches!(err, AlreadyExists(_))));
        assert_eq!(&wallet.get("carol").unwrap(), winners[0]);
        assert_eq!(wallet.list().unwrap(), vec!["carol".to_string()]);
    }
}
