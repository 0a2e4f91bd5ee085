use crate::error::encryption::EncryptionError;
use crate::error::encryption::EncryptionError::{
    DecodeContentFailed, DecryptedContentNotUtf8, PasswordMissing,
};
use crate::identity::{Identity, X509_IDENTITY_TYPE};
use crate::wallet::encryption::{decrypt, encrypt, EncryptionConfiguration};
use serde::{Deserialize, Serialize};

const ENTRY_VERSION: u32 = 1;

/// How an identity is laid out on disk. Compatible with the Fabric 2.x wallet format; the
/// `encryption` field is only present for keys sealed with a wallet password.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct WalletEntry {
    credentials: Credentials,

    #[serde(rename = "mspId")]
    msp_id: String,

    #[serde(rename = "type")]
    identity_type: String,

    version: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    encryption: Option<EncryptionConfiguration>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Credentials {
    certificate: String,

    #[serde(rename = "privateKey")]
    private_key: String,
}

impl WalletEntry {
    pub fn seal(identity: &Identity, password: Option<&str>) -> Result<Self, EncryptionError> {
        let (private_key, encryption) = match password {
            Some(password) => {
                let config = EncryptionConfiguration::new()?;
                let sealed = encrypt(identity.private_key().as_bytes(), &config, password)?;
                (base64::encode(sealed), Some(config))
            }
            None => (identity.private_key().to_string(), None),
        };
        Ok(Self {
            credentials: Credentials {
                certificate: identity.certificate().to_string(),
                private_key,
            },
            msp_id: identity.msp_id().to_string(),
            identity_type: X509_IDENTITY_TYPE.to_string(),
            version: ENTRY_VERSION,
            encryption,
        })
    }

    pub fn identity_type(&self) -> &str {
        &self.identity_type
    }

    pub fn open(self, password: Option<&str>) -> Result<Identity, EncryptionError> {
        let private_key = match &self.encryption {
            Some(config) => {
                let password = password.ok_or(PasswordMissing)?;
                let sealed =
                    base64::decode(&self.credentials.private_key).map_err(DecodeContentFailed)?;
                let plain = decrypt(&sealed, config, password)?;
                String::from_utf8(plain).map_err(DecryptedContentNotUtf8)?
            }
            None => self.credentials.private_key,
        };
        Ok(Identity::new(
            self.msp_id,
            self.credentials.certificate,
            private_key,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_entries_use_the_fabric_wallet_layout() {
        let identity = Identity::new("Org1MSP", "CERT", "KEY");
        let entry = WalletEntry::seal(&identity, None).unwrap();
        let json: serde_json::Value = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "credentials": { "certificate": "CERT", "privateKey": "KEY" },
                "mspId": "Org1MSP",
                "type": "X.509",
                "version": 1
            })
        );
    }

    #[test]
    fn sealed_entries_hide_the_private_key() {
        let identity = Identity::new("Org1MSP", "CERT", "KEY MATERIAL");
        let entry = WalletEntry::seal(&identity, Some("pw")).unwrap();
        let json = serde_json::to_string(&entry).unwrap();
        assert!(!json.contains("KEY MATERIAL"));

        let entry: WalletEntry = serde_json::from_str(&json).unwrap();
        assert!(matches!(
            WalletEntry::open(
                serde_json::from_str(&json).unwrap(),
                None
            ),
            Err(PasswordMissing)
        ));
        assert_eq!(entry.open(Some("pw")).unwrap(), identity);
    }
}
