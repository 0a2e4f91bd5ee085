//! The parts of a Fabric common connection profile the gateway needs: where the certificate
//! authority and the client organization's peers are, and which TLS roots they use.
use crate::error::config::LoadConnectionProfileError;
use crate::error::config::LoadConnectionProfileError::{
    LoadProfileFailed, NoClientOrganization, NoPeers, ReadTlsCertificateFailed,
    UnknownCertificateAuthority, UnknownOrganization, UnknownPeer,
};
use crate::json::load_json_file;
use crate::json::structure::SerdeVec;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ConnectionProfile {
    pub name: Option<String>,

    pub client: Option<ClientSection>,

    #[serde(default)]
    pub organizations: BTreeMap<String, OrganizationSection>,

    #[serde(default)]
    pub peers: BTreeMap<String, PeerSection>,

    #[serde(default, rename = "certificateAuthorities")]
    pub certificate_authorities: BTreeMap<String, CertificateAuthoritySection>,

    #[serde(default)]
    pub channels: BTreeMap<String, serde_json::Value>,

    /// Directory that relative `tlsCACerts.path` entries are resolved against.
    #[serde(skip)]
    base_dir: PathBuf,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ClientSection {
    pub organization: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct OrganizationSection {
    pub mspid: String,

    #[serde(default)]
    pub peers: Vec<String>,

    #[serde(default, rename = "certificateAuthorities")]
    pub certificate_authorities: Vec<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PeerSection {
    pub url: String,

    #[serde(rename = "tlsCACerts")]
    pub tls_ca_certs: Option<TlsCertificates>,

    #[serde(default, rename = "grpcOptions")]
    pub grpc_options: GrpcOptions,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct GrpcOptions {
    #[serde(rename = "ssl-target-name-override")]
    pub ssl_target_name_override: Option<String>,

    #[serde(rename = "hostnameOverride")]
    pub hostname_override: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CertificateAuthoritySection {
    pub url: String,

    #[serde(rename = "caName")]
    pub ca_name: Option<String>,

    #[serde(rename = "tlsCACerts")]
    pub tls_ca_certs: Option<TlsCertificates>,

    #[serde(default, rename = "httpOptions")]
    pub http_options: HttpOptions,
}

#[derive(Clone, Debug, Deserialize)]
pub struct HttpOptions {
    #[serde(default = "default_verify")]
    pub verify: bool,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self { verify: true }
    }
}

fn default_verify() -> bool {
    true
}

/// TLS roots given inline (`pem`, a string or a list of strings) or by file (`path`).
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TlsCertificates {
    pub pem: Option<SerdeVec<String>>,
    pub path: Option<PathBuf>,
}

/// Everything needed to talk to a certificate authority.
#[derive(Clone, Debug)]
pub struct CaEndpoint {
    pub url: String,
    pub ca_name: String,
    pub tls_ca_pem: Option<String>,
    pub verify: bool,
}

/// Everything needed to open a gateway connection to a peer.
#[derive(Clone, Debug)]
pub struct PeerEndpoint {
    pub name: String,
    pub url: String,
    pub tls_ca_pem: Option<String>,
    pub server_name_override: Option<String>,
}

impl ConnectionProfile {
    pub fn load(path: &Path) -> Result<Self, LoadConnectionProfileError> {
        let mut profile: ConnectionProfile = load_json_file(path).map_err(LoadProfileFailed)?;
        profile.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(profile)
    }

    pub fn client_organization(&self) -> Result<&OrganizationSection, LoadConnectionProfileError> {
        let name = &self
            .client
            .as_ref()
            .ok_or(NoClientOrganization())?
            .organization;
        self.organizations
            .get(name)
            .ok_or_else(|| UnknownOrganization(name.clone()))
    }

    /// Resolves the certificate authority registered under `name`.
    pub fn ca_endpoint(&self, name: &str) -> Result<CaEndpoint, LoadConnectionProfileError> {
        let section = self
            .certificate_authorities
            .get(name)
            .ok_or_else(|| UnknownCertificateAuthority(name.to_string()))?;
        Ok(CaEndpoint {
            url: section.url.clone(),
            ca_name: section.ca_name.clone().unwrap_or_else(|| name.to_string()),
            tls_ca_pem: self.resolve_pem(section.tls_ca_certs.as_ref())?,
            verify: section.http_options.verify,
        })
    }

    /// The peer gateway connections go through: the client organization's first peer.
    pub fn gateway_peer(&self) -> Result<PeerEndpoint, LoadConnectionProfileError> {
        let organization = self.client_organization()?;
        let name = organization
            .peers
            .first()
            .ok_or_else(|| NoPeers(organization.mspid.clone()))?;
        let section = self
            .peers
            .get(name)
            .ok_or_else(|| UnknownPeer(name.clone()))?;
        Ok(PeerEndpoint {
            name: name.clone(),
            url: section.url.clone(),
            tls_ca_pem: self.resolve_pem(section.tls_ca_certs.as_ref())?,
            server_name_override: section
                .grpc_options
                .ssl_target_name_override
                .clone()
                .or_else(|| section.grpc_options.hostname_override.clone()),
        })
    }

    /// Channels the profile declares. Empty when the profile leaves channels to discovery.
    pub fn declared_channels(&self) -> Vec<String> {
        self.channels.keys().cloned().collect()
    }

    fn resolve_pem(
        &self,
        certificates: Option<&TlsCertificates>,
    ) -> Result<Option<String>, LoadConnectionProfileError> {
        let Some(certificates) = certificates else {
            return Ok(None);
        };
        if let Some(pem) = &certificates.pem {
            return Ok(Some(pem.clone().into_vec().join("\n")));
        }
        if let Some(path) = &certificates.path {
            let path = self.base_dir.join(path);
            let content = crate::fs::read(&path)
                .map_err(|err| ReadTlsCertificateFailed(Box::new(path.clone()), err))?;
            return Ok(Some(String::from_utf8_lossy(&content).into_owned()));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE: &str = r#"{
        "name": "test-network-org1",
        "version": "1.0.0",
        "client": { "organization": "Org1" },
        "organizations": {
            "Org1": {
                "mspid": "Org1MSP",
                "peers": ["peer0.org1.example.com"],
                "certificateAuthorities": ["ca.org1.example.com"]
            }
        },
        "peers": {
            "peer0.org1.example.com": {
                "url": "grpcs://localhost:7051",
                "tlsCACerts": { "path": "tls/peer-ca.pem" },
                "grpcOptions": {
                    "ssl-target-name-override": "peer0.org1.example.com",
                    "hostnameOverride": "peer0.org1.example.com"
                }
            }
        },
        "certificateAuthorities": {
            "ca.org1.example.com": {
                "url": "https://localhost:7054",
                "caName": "ca-org1",
                "tlsCACerts": { "pem": ["-----BEGIN CERTIFICATE-----\nA\n-----END CERTIFICATE-----"] },
                "httpOptions": { "verify": false }
            }
        }
    }"#;

    fn load_profile() -> (tempfile::TempDir, ConnectionProfile) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("tls")).unwrap();
        std::fs::write(dir.path().join("tls/peer-ca.pem"), "PEER CA").unwrap();
        let path = dir.path().join("connection-org1.json");
        std::fs::write(&path, PROFILE).unwrap();
        let profile = ConnectionProfile::load(&path).unwrap();
        (dir, profile)
    }

    #[test]
    fn resolves_certificate_authority() {
        let (_dir, profile) = load_profile();
        let ca = profile.ca_endpoint("ca.org1.example.com").unwrap();
        assert_eq!(ca.url, "https://localhost:7054");
        assert_eq!(ca.ca_name, "ca-org1");
        assert!(!ca.verify);
        assert!(ca.tls_ca_pem.unwrap().starts_with("-----BEGIN CERTIFICATE-----"));
    }

    #[test]
    fn resolves_gateway_peer_with_tls_from_file() {
        let (_dir, profile) = load_profile();
        let peer = profile.gateway_peer().unwrap();
        assert_eq!(peer.name, "peer0.org1.example.com");
        assert_eq!(peer.url, "grpcs://localhost:7051");
        assert_eq!(peer.tls_ca_pem.as_deref(), Some("PEER CA"));
        assert_eq!(
            peer.server_name_override.as_deref(),
            Some("peer0.org1.example.com")
        );
        assert!(profile.declared_channels().is_empty());
    }

    #[test]
    fn unknown_certificate_authority_is_an_error() {
        let (_dir, profile) = load_profile();
        assert!(matches!(
            profile.ca_endpoint("ca.org2.example.com"),
            Err(UnknownCertificateAuthority(name)) if name == "ca.org2.example.com"
        ));
    }

    #[test]
    fn missing_client_section_is_an_error() {
        let profile = ConnectionProfile::default();
        assert!(matches!(
            profile.gateway_peer(),
            Err(NoClientOrganization())
        ));
    }
}
