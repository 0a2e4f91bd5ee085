//! Test doubles for the certificate authority, the ledger network and the wallet, plus
//! helpers for generating throwaway identities.
use crate::ca::{
    CaSession, CertificateAuthority, Enrollment, EnrollmentRequest, RegistrationRequest,
};
use crate::error::enrollment::{EnrollError, RegisterError};
use crate::error::ledger::{ConnectError, EvaluateError};
use crate::error::wallet::{GetIdentityError, ListIdentitiesError, PutIdentityError};
use crate::identity::Identity;
use crate::ledger::{Connection, Contract, DiscoveryOptions, LedgerNetwork, Network};
use crate::wallet::{CredentialStore, InMemoryWallet};
use async_trait::async_trait;
use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair, PKCS_ECDSA_P256_SHA256};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::ThreadId;

pub fn discard_logger() -> slog::Logger {
    slog::Logger::root(slog::Discard, slog::o!())
}

/// A fresh P-256 key and a self-signed certificate for `common_name`.
pub fn generate_identity(msp_id: &str, common_name: &str) -> Identity {
    let key_pair = KeyPair::generate_for(&PKCS_ECDSA_P256_SHA256).expect("generate key pair");
    let mut params = CertificateParams::new(Vec::<String>::new()).expect("certificate params");
    let mut subject = DistinguishedName::new();
    subject.push(DnType::CommonName, common_name);
    params.distinguished_name = subject;
    let certificate = params.self_signed(&key_pair).expect("self-sign certificate");
    Identity::new(msp_id, certificate.pem(), key_pair.serialize_pem())
}

#[derive(Default)]
struct CaLedger {
    /// Enrollment secrets not yet consumed, by principal.
    secrets: BTreeMap<String, String>,
    registered: BTreeSet<String>,
    issued: usize,
}

#[derive(Default)]
struct CaState {
    ledger: Mutex<CaLedger>,
    enroll_calls: AtomicUsize,
    register_calls: AtomicUsize,
    sessions_opened: AtomicUsize,
    sessions_closed: AtomicUsize,
    reject_registrations: AtomicBool,
}

/// An in-process certificate authority. It knows the bootstrap admin (`admin` / `adminpw`),
/// issues registration secrets `S1`, `S2`, ... and accepts each secret exactly once.
#[derive(Clone)]
pub struct MockCertificateAuthority {
    state: Arc<CaState>,
}

impl Default for MockCertificateAuthority {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCertificateAuthority {
    pub fn new() -> Self {
        let state = CaState::default();
        {
            let mut ledger = state.ledger.lock().expect("fresh lock");
            ledger
                .secrets
                .insert("admin".to_string(), "adminpw".to_string());
            ledger.registered.insert("admin".to_string());
        }
        Self {
            state: Arc::new(state),
        }
    }

    /// Every registration from now on is refused as if the registrar lacked the rights.
    pub fn rejecting_registrations(self) -> Self {
        self.state.reject_registrations.store(true, Ordering::SeqCst);
        self
    }

    pub fn enroll_calls(&self) -> usize {
        self.state.enroll_calls.load(Ordering::SeqCst)
    }

    pub fn register_calls(&self) -> usize {
        self.state.register_calls.load(Ordering::SeqCst)
    }

    /// All calls that reached the CA.
    pub fn calls(&self) -> usize {
        self.enroll_calls() + self.register_calls() + self.sessions_opened()
    }

    pub fn sessions_opened(&self) -> usize {
        self.state.sessions_opened.load(Ordering::SeqCst)
    }

    pub fn sessions_closed(&self) -> usize {
        self.state.sessions_closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CertificateAuthority for MockCertificateAuthority {
    async fn enroll(&self, request: &EnrollmentRequest) -> Result<Enrollment, EnrollError> {
        self.state.enroll_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        {
            let mut ledger = self.state.ledger.lock().expect("ca ledger");
            match ledger.secrets.get(&request.principal_id) {
                Some(secret) if *secret == request.secret => {
                    ledger.secrets.remove(&request.principal_id);
                }
                _ => {
                    return Err(EnrollError::Rejected {
                        principal: Box::new(request.principal_id.clone()),
                        status: 401,
                        message: "Authentication failure (code 20)".to_string(),
                    })
                }
            }
        }
        let issued = generate_identity("", &request.principal_id);
        Ok(Enrollment {
            certificate: issued.certificate().to_string(),
            private_key: issued.private_key().to_string(),
        })
    }

    async fn open_session(
        &self,
        registrar: &Identity,
    ) -> Result<Box<dyn CaSession>, RegisterError> {
        registrar.signer().map_err(RegisterError::InvalidRegistrar)?;
        self.state.sessions_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockCaSession {
            state: self.state.clone(),
            closed: false,
        }))
    }
}

struct MockCaSession {
    state: Arc<CaState>,
    closed: bool,
}

#[async_trait]
impl CaSession for MockCaSession {
    async fn register(&mut self, request: &RegistrationRequest) -> Result<String, RegisterError> {
        if self.closed {
            return Err(RegisterError::SessionClosed());
        }
        self.state.register_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        let rejected = |status: u16, message: String| RegisterError::Rejected {
            principal: Box::new(request.principal_id.clone()),
            status,
            message,
        };
        if self.state.reject_registrations.load(Ordering::SeqCst) {
            return Err(rejected(
                403,
                "Authorization failure (code 71)".to_string(),
            ));
        }

        let mut ledger = self.state.ledger.lock().expect("ca ledger");
        if !ledger.registered.insert(request.principal_id.clone()) {
            return Err(rejected(
                400,
                format!(
                    "Identity '{}' is already registered (code 74)",
                    request.principal_id
                ),
            ));
        }
        ledger.issued += 1;
        let secret = format!("S{}", ledger.issued);
        ledger
            .secrets
            .insert(request.principal_id.clone(), secret.clone());
        Ok(secret)
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.state.sessions_closed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// One evaluation as seen by [`MockLedgerNetwork`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedEvaluation {
    pub msp_id: String,
    pub channel: String,
    pub contract: String,
    pub function: String,
    pub args: Vec<String>,
}

struct LedgerState {
    deployments: BTreeMap<String, BTreeSet<String>>,
    payload: Vec<u8>,
    failure: Option<(i32, String)>,
    stalled: bool,
    connections: AtomicUsize,
    disconnections: AtomicUsize,
    evaluations: Mutex<Vec<RecordedEvaluation>>,
}

/// An in-process ledger network with the `basic` contract deployed on `mychannel`.
#[derive(Clone)]
pub struct MockLedgerNetwork {
    state: Arc<LedgerState>,
}

impl Default for MockLedgerNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLedgerNetwork {
    pub fn new() -> Self {
        let mut deployments = BTreeMap::new();
        deployments.insert(
            "mychannel".to_string(),
            BTreeSet::from(["basic".to_string()]),
        );
        Self {
            state: Arc::new(LedgerState {
                deployments,
                payload: vec![],
                failure: None,
                stalled: false,
                connections: AtomicUsize::new(0),
                disconnections: AtomicUsize::new(0),
                evaluations: Mutex::new(vec![]),
            }),
        }
    }

    fn configure(self, update: impl FnOnce(&mut LedgerState)) -> Self {
        let mut state =
            Arc::try_unwrap(self.state).unwrap_or_else(|_| panic!("configure before sharing"));
        update(&mut state);
        Self {
            state: Arc::new(state),
        }
    }

    /// The bytes every successful evaluation returns.
    pub fn with_payload(self, payload: Vec<u8>) -> Self {
        self.configure(|state| state.payload = payload)
    }

    /// Deploys `contract` on `channel` as well.
    pub fn with_deployment(self, channel: &str, contract: &str) -> Self {
        self.configure(|state| {
            state
                .deployments
                .entry(channel.to_string())
                .or_default()
                .insert(contract.to_string());
        })
    }

    /// Every evaluation fails with a peer response carrying `status` and `message`.
    pub fn failing_with(self, status: i32, message: &str) -> Self {
        let message = message.to_string();
        self.configure(|state| state.failure = Some((status, message)))
    }

    /// Evaluations never complete.
    pub fn stalled(self) -> Self {
        self.configure(|state| state.stalled = true)
    }

    pub fn connections(&self) -> usize {
        self.state.connections.load(Ordering::SeqCst)
    }

    pub fn disconnections(&self) -> usize {
        self.state.disconnections.load(Ordering::SeqCst)
    }

    pub fn evaluations(&self) -> Vec<RecordedEvaluation> {
        self.state.evaluations.lock().expect("evaluations").clone()
    }
}

#[async_trait]
impl LedgerNetwork for MockLedgerNetwork {
    async fn connect(
        &self,
        identity: &Identity,
        _discovery: &DiscoveryOptions,
    ) -> Result<Box<dyn Connection>, ConnectError> {
        identity
            .signer()
            .map_err(ConnectError::InvalidSigningIdentity)?;
        self.state.connections.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockConnection {
            state: self.state.clone(),
            msp_id: identity.msp_id().to_string(),
            connected: true,
        }))
    }
}

struct MockConnection {
    state: Arc<LedgerState>,
    msp_id: String,
    connected: bool,
}

#[async_trait]
impl Connection for MockConnection {
    fn get_network(&self, channel: &str) -> Option<Network> {
        self.state
            .deployments
            .contains_key(channel)
            .then(|| Network::new(channel))
    }

    async fn evaluate(
        &self,
        contract: &Contract,
        function: &str,
        args: &[String],
    ) -> Result<Vec<u8>, EvaluateError> {
        if !self.connected {
            return Err(EvaluateError::Disconnected());
        }
        self.state
            .evaluations
            .lock()
            .expect("evaluations")
            .push(RecordedEvaluation {
                msp_id: self.msp_id.clone(),
                channel: contract.channel().to_string(),
                contract: contract.name().to_string(),
                function: function.to_string(),
                args: args.to_vec(),
            });
        if self.state.stalled {
            std::future::pending::<()>().await;
        }

        let deployed = self
            .state
            .deployments
            .get(contract.channel())
            .is_some_and(|contracts| contracts.contains(contract.name()));
        if !deployed {
            return Err(EvaluateError::Status(tonic::Status::aborted(format!(
                "evaluate call to endorser returned error: make sure the chaincode {0} has been successfully defined on channel {1} and try again: chaincode {0} not found",
                contract.name(),
                contract.channel()
            ))));
        }
        if let Some((status, message)) = &self.state.failure {
            return Err(EvaluateError::Rejected {
                status: *status,
                message: message.clone(),
            });
        }
        Ok(self.state.payload.clone())
    }

    fn disconnect(&mut self) {
        if self.connected {
            self.connected = false;
            self.state.disconnections.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// An in-memory wallet that notes which thread each `get` and `put` ran on.
#[derive(Default)]
pub struct ThreadRecordingWallet {
    inner: InMemoryWallet,
    gets: Mutex<Vec<ThreadId>>,
    puts: Mutex<Vec<ThreadId>>,
}

impl ThreadRecordingWallet {
    pub fn get_threads(&self) -> Vec<ThreadId> {
        self.gets.lock().expect("get threads").clone()
    }

    pub fn put_threads(&self) -> Vec<ThreadId> {
        self.puts.lock().expect("put threads").clone()
    }
}

impl CredentialStore for ThreadRecordingWallet {
    fn exists(&self, label: &str) -> bool {
        self.inner.exists(label)
    }

    fn put(&self, label: &str, identity: &Identity) -> Result<(), PutIdentityError> {
        self.puts
            .lock()
            .expect("put threads")
            .push(std::thread::current().id());
        self.inner.put(label, identity)
    }

    fn get(&self, label: &str) -> Result<Identity, GetIdentityError> {
        self.gets
            .lock()
            .expect("get threads")
            .push(std::thread::current().id());
        self.inner.get(label)
    }

    fn list(&self) -> Result<Vec<String>, ListIdentitiesError> {
        self.inner.list()
    }
}
