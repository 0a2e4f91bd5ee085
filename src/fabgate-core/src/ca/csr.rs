use crate::error::enrollment::EnrollError;
use crate::error::enrollment::EnrollError::CsrGenerationFailed;
use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair, PKCS_ECDSA_P256_SHA256};

/// A PKCS#10 request for a fresh P-256 key, and that key.
pub struct GeneratedCsr {
    pub csr_pem: String,
    pub private_key_pem: String,
}

/// Generates a new key pair and a certificate signing request with `common_name` as subject.
pub fn generate_csr(common_name: &str) -> Result<GeneratedCsr, EnrollError> {
    let key_pair = KeyPair::generate_for(&PKCS_ECDSA_P256_SHA256).map_err(CsrGenerationFailed)?;
    let mut params = CertificateParams::new(Vec::<String>::new()).map_err(CsrGenerationFailed)?;
    let mut subject = DistinguishedName::new();
    subject.push(DnType::CommonName, common_name);
    params.distinguished_name = subject;

    let csr_pem = params
        .serialize_request(&key_pair)
        .and_then(|csr| csr.pem())
        .map_err(CsrGenerationFailed)?;
    Ok(GeneratedCsr {
        csr_pem,
        private_key_pem: key_pair.serialize_pem(),
    })
}
