//! Evaluation through a peer's Fabric Gateway gRPC service.
use crate::config::profile::{ConnectionProfile, PeerEndpoint};
use crate::error::config::LoadConnectionProfileError;
use crate::error::ledger::ConnectError::{
    InvalidEndpoint, InvalidEndpointUrl, InvalidSigningIdentity, TlsConfigFailed, TransportFailed,
};
use crate::error::ledger::EvaluateError::{Disconnected, MissingResult, Rejected};
use crate::error::ledger::{ConnectError, EvaluateError};
use crate::identity::{Identity, IdentitySigner};
use crate::ledger::proposal::{propose, serialize_identity};
use crate::ledger::proto::{EvaluateRequest, EvaluateResponse, Response, EVALUATE_PATH};
use crate::ledger::{Connection, Contract, DiscoveryOptions, LedgerNetwork, Network};
use async_trait::async_trait;
use slog::{debug, Logger};
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Certificate, Channel, ClientTlsConfig, Endpoint};
use url::Url;

/// Connects to the client organization's gateway peer from a connection profile.
pub struct FabricGateway {
    log: Logger,
    peer: PeerEndpoint,
    channels: Vec<String>,
}

impl FabricGateway {
    pub fn new(log: &Logger, profile: &ConnectionProfile) -> Result<Self, LoadConnectionProfileError> {
        let peer = profile.gateway_peer()?;
        debug!(log, "Gateway peer: {} ({})", peer.name, peer.url);
        Ok(Self {
            log: log.clone(),
            peer,
            channels: profile.declared_channels(),
        })
    }
}

/// Where to dial: the peer url as an `http(s)` uri, whether it uses TLS, and the host name
/// its certificate was issued for.
struct Dial {
    uri: String,
    tls: bool,
    host: String,
}

fn dial(url: &str, as_localhost: bool) -> Result<Dial, url::ParseError> {
    let parsed = Url::parse(url)?;
    let tls = matches!(parsed.scheme(), "grpcs" | "https");
    let host = parsed
        .host_str()
        .ok_or(url::ParseError::EmptyHost)?
        .to_string();
    let port = parsed.port().unwrap_or(7051);
    let dialed_host = if as_localhost { "localhost" } else { host.as_str() };
    let scheme = if tls { "https" } else { "http" };
    Ok(Dial {
        uri: format!("{scheme}://{dialed_host}:{port}"),
        tls,
        host,
    })
}

#[async_trait]
impl LedgerNetwork for FabricGateway {
    async fn connect(
        &self,
        identity: &Identity,
        discovery: &DiscoveryOptions,
    ) -> Result<Box<dyn Connection>, ConnectError> {
        let signer = identity.signer().map_err(InvalidSigningIdentity)?;
        let target = dial(&self.peer.url, discovery.as_localhost)
            .map_err(|err| InvalidEndpointUrl(Box::new(self.peer.url.clone()), err))?;

        let mut endpoint = Endpoint::from_shared(target.uri.clone())
            .map_err(|err| InvalidEndpoint(Box::new(target.uri.clone()), err))?;
        if target.tls {
            let mut tls = ClientTlsConfig::new().domain_name(
                self.peer
                    .server_name_override
                    .clone()
                    .unwrap_or(target.host),
            );
            if let Some(pem) = &self.peer.tls_ca_pem {
                tls = tls.ca_certificate(Certificate::from_pem(pem));
            }
            endpoint = endpoint
                .tls_config(tls)
                .map_err(|err| TlsConfigFailed(Box::new(self.peer.name.clone()), err))?;
        }

        debug!(self.log, "Connecting to {}", target.uri; "peer" => &self.peer.name);
        let channel = endpoint
            .connect()
            .await
            .map_err(|err| TransportFailed(Box::new(self.peer.name.clone()), err))?;

        // Without discovery the gateway only endorses with our own organization.
        let target_organizations = if discovery.enabled {
            vec![]
        } else {
            vec![identity.msp_id().to_string()]
        };
        Ok(Box::new(FabricConnection {
            log: self.log.clone(),
            channel: Some(channel),
            signer,
            creator: serialize_identity(identity.msp_id(), identity.certificate()),
            channels: self.channels.clone(),
            target_organizations,
        }))
    }
}

struct FabricConnection {
    log: Logger,
    channel: Option<Channel>,
    signer: IdentitySigner,
    creator: Vec<u8>,
    channels: Vec<String>,
    target_organizations: Vec<String>,
}

fn into_payload(response: Response) -> Result<Vec<u8>, EvaluateError> {
    if response.status >= 400 {
        return Err(Rejected {
            status: response.status,
            message: response.message,
        });
    }
    Ok(response.payload)
}

#[async_trait]
impl Connection for FabricConnection {
    fn get_network(&self, channel: &str) -> Option<Network> {
        if self.channels.is_empty() || self.channels.iter().any(|name| name == channel) {
            Some(Network::new(channel))
        } else {
            None
        }
    }

    async fn evaluate(
        &self,
        contract: &Contract,
        function: &str,
        args: &[String],
    ) -> Result<Vec<u8>, EvaluateError> {
        let channel = self.channel.clone().ok_or(Disconnected())?;
        let proposed = propose(
            &self.signer,
            &self.creator,
            contract.channel(),
            contract.name(),
            function,
            args,
        )?;
        debug!(self.log, "Evaluating '{}' on {}/{}", function, contract.channel(), contract.name();
            "tx_id" => &proposed.transaction_id);

        let request = EvaluateRequest {
            transaction_id: proposed.transaction_id,
            channel_id: contract.channel().to_string(),
            proposed_transaction: Some(proposed.signed_proposal),
            target_organizations: self.target_organizations.clone(),
        };
        let mut grpc = tonic::client::Grpc::new(channel);
        grpc.ready().await.map_err(EvaluateError::Unavailable)?;
        let codec: ProstCodec<EvaluateRequest, EvaluateResponse> = ProstCodec::default();
        let response = grpc
            .unary(
                tonic::Request::new(request),
                PathAndQuery::from_static(EVALUATE_PATH),
                codec,
            )
            .await
            .map_err(EvaluateError::Status)?
            .into_inner();

        into_payload(response.result.ok_or(MissingResult())?)
    }

    fn disconnect(&mut self) {
        if self.channel.take().is_some() {
            debug!(self.log, "Closed gateway connection");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;
    use crate::error::ErrorKind;
    use crate::ledger::proto::{ChannelHeader, Header, Proposal};
    use crate::ledger::LedgerSession;
    use crate::testing::{discard_logger, generate_identity};
    use crate::wallet::{CredentialStore, InMemoryWallet};
    use prost::Message;
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};
    use tonic::codegen::{http, BoxFuture, Context, Poll, Service};

    /// What the in-process gateway answers every Evaluate call with.
    #[derive(Clone)]
    enum Answer {
        Result(Response),
        Empty,
        Fail(tonic::Code, &'static str),
    }

    /// A peer gateway serving `/gateway.Gateway/Evaluate` only, recording each request.
    #[derive(Clone)]
    struct StubGateway {
        answer: Answer,
        requests: Arc<Mutex<Vec<EvaluateRequest>>>,
    }

    impl StubGateway {
        fn new(answer: Answer) -> Self {
            Self {
                answer,
                requests: Arc::new(Mutex::new(vec![])),
            }
        }

        fn requests(&self) -> Vec<EvaluateRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl tonic::server::UnaryService<EvaluateRequest> for StubGateway {
        type Response = EvaluateResponse;
        type Future = BoxFuture<tonic::Response<EvaluateResponse>, tonic::Status>;

        fn call(&mut self, request: tonic::Request<EvaluateRequest>) -> Self::Future {
            self.requests.lock().unwrap().push(request.into_inner());
            let answer = self.answer.clone();
            Box::pin(async move {
                match answer {
                    Answer::Result(result) => Ok(tonic::Response::new(EvaluateResponse {
                        result: Some(result),
                    })),
                    Answer::Empty => Ok(tonic::Response::new(EvaluateResponse { result: None })),
                    Answer::Fail(code, message) => Err(tonic::Status::new(code, message)),
                }
            })
        }
    }

    impl Service<http::Request<tonic::body::BoxBody>> for StubGateway {
        type Response = http::Response<tonic::body::BoxBody>;
        type Error = std::convert::Infallible;
        type Future = BoxFuture<Self::Response, Self::Error>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: http::Request<tonic::body::BoxBody>) -> Self::Future {
            let method = self.clone();
            Box::pin(async move {
                let codec: ProstCodec<EvaluateResponse, EvaluateRequest> = ProstCodec::default();
                let mut grpc = tonic::server::Grpc::new(codec);
                Ok(grpc.unary(method, req).await)
            })
        }
    }

    impl tonic::server::NamedService for StubGateway {
        const NAME: &'static str = "gateway.Gateway";
    }

    async fn serve(gateway: StubGateway) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let incoming =
            tonic::transport::server::TcpIncoming::from_listener(listener, true, None).unwrap();
        tokio::spawn(
            tonic::transport::Server::builder()
                .add_service(gateway)
                .serve_with_incoming(incoming),
        );
        addr
    }

    fn local_gateway(addr: SocketAddr) -> FabricGateway {
        FabricGateway {
            log: discard_logger(),
            peer: PeerEndpoint {
                name: "peer0".to_string(),
                url: format!("grpc://{addr}"),
                tls_ca_pem: None,
                server_name_override: None,
            },
            channels: vec![],
        }
    }

    fn session_with_alice(addr: SocketAddr) -> LedgerSession {
        let wallet = Arc::new(InMemoryWallet::new());
        wallet
            .put("alice", &generate_identity("Org1MSP", "alice"))
            .unwrap();
        LedgerSession::new(
            &discard_logger(),
            &GatewayConfig::default(),
            wallet,
            Arc::new(local_gateway(addr)),
        )
    }

    #[tokio::test]
    async fn evaluate_returns_the_peer_payload_unmodified() {
        let payload = br#"[{"ID":"asset1","Owner":"Tomoko","AppraisedValue":300}]"#.to_vec();
        let gateway = StubGateway::new(Answer::Result(Response {
            status: 200,
            message: String::new(),
            payload: payload.clone(),
        }));
        let addr = serve(gateway.clone()).await;
        let alice = generate_identity("Org1MSP", "alice");
        let discovery = DiscoveryOptions {
            enabled: false,
            as_localhost: false,
        };

        let mut connection = local_gateway(addr).connect(&alice, &discovery).await.unwrap();
        let contract = Network::new("mychannel").get_contract("basic");
        let result = connection
            .evaluate(&contract, "ReadAsset", &["asset1".to_string()])
            .await
            .unwrap();
        connection.disconnect();

        assert_eq!(result, payload);
        let requests = gateway.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.channel_id, "mychannel");
        assert_eq!(request.transaction_id.len(), 64);
        assert_eq!(request.target_organizations, vec!["Org1MSP".to_string()]);

        let signed = request.proposed_transaction.as_ref().unwrap();
        let proposal = Proposal::decode(signed.proposal_bytes.as_slice()).unwrap();
        let header = Header::decode(proposal.header.as_slice()).unwrap();
        let channel_header = ChannelHeader::decode(header.channel_header.as_slice()).unwrap();
        assert_eq!(channel_header.tx_id, request.transaction_id);
        assert_eq!(channel_header.channel_id, "mychannel");
    }

    #[tokio::test]
    async fn gateway_status_reaches_the_caller_as_an_evaluation_failure() {
        let gateway = StubGateway::new(Answer::Fail(
            tonic::Code::Aborted,
            "evaluate call to endorser returned error: chaincode response 500, asset asset9 not found",
        ));
        let addr = serve(gateway.clone()).await;

        let err = session_with_alice(addr)
            .evaluate("alice", "mychannel", "basic", "ReadAsset", &["asset9".to_string()])
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::EvaluationFailed);
        assert!(format!("{:?}", err).contains("asset asset9 not found"));
        assert_eq!(gateway.requests().len(), 1);
    }

    #[tokio::test]
    async fn undefined_chaincode_status_is_contract_not_found() {
        let gateway = StubGateway::new(Answer::Fail(
            tonic::Code::Aborted,
            "evaluate call to endorser returned error: make sure the chaincode basic has been successfully defined on channel mychannel and try again: chaincode basic not found",
        ));
        let addr = serve(gateway).await;

        let err = session_with_alice(addr)
            .evaluate("alice", "mychannel", "basic", "GetAllAssets", &[])
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ContractNotFound);
    }

    #[tokio::test]
    async fn response_without_result_is_an_error() {
        let addr = serve(StubGateway::new(Answer::Empty)).await;
        let alice = generate_identity("Org1MSP", "alice");

        let connection = local_gateway(addr)
            .connect(&alice, &DiscoveryOptions::default())
            .await
            .unwrap();
        let contract = Network::new("mychannel").get_contract("basic");

        assert!(matches!(
            connection.evaluate(&contract, "GetAllAssets", &[]).await,
            Err(MissingResult())
        ));
    }

    #[tokio::test]
    async fn rejected_result_carries_the_peer_status() {
        let addr = serve(StubGateway::new(Answer::Result(Response {
            status: 500,
            message: "the asset channel-7 does not exist".to_string(),
            payload: vec![],
        })))
        .await;

        let err = session_with_alice(addr)
            .evaluate("alice", "mychannel", "basic", "ReadAsset", &["channel-7".to_string()])
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::EvaluationFailed);
    }

    fn connection(channels: &[&str]) -> FabricConnection {
        let alice = generate_identity("Org1MSP", "alice");
        FabricConnection {
            log: discard_logger(),
            channel: None,
            signer: alice.signer().unwrap(),
            creator: serialize_identity(alice.msp_id(), alice.certificate()),
            channels: channels.iter().map(|name| name.to_string()).collect(),
            target_organizations: vec![],
        }
    }

    #[test]
    fn dial_translates_grpc_schemes() {
        let target = dial("grpcs://peer0.org1.example.com:7051", false).unwrap();
        assert_eq!(target.uri, "https://peer0.org1.example.com:7051");
        assert!(target.tls);
        assert_eq!(target.host, "peer0.org1.example.com");

        let target = dial("grpc://peer0.org1.example.com:9051", false).unwrap();
        assert_eq!(target.uri, "http://peer0.org1.example.com:9051");
        assert!(!target.tls);
    }

    #[test]
    fn dial_as_localhost_keeps_the_certificate_host() {
        let target = dial("grpcs://peer0.org1.example.com:7051", true).unwrap();
        assert_eq!(target.uri, "https://localhost:7051");
        assert_eq!(target.host, "peer0.org1.example.com");
    }

    #[test]
    fn error_statuses_are_rejections() {
        let ok = Response {
            status: 200,
            message: String::new(),
            payload: b"[]".to_vec(),
        };
        assert_eq!(into_payload(ok).unwrap(), b"[]".to_vec());

        let failed = Response {
            status: 500,
            message: "asset1 does not exist".to_string(),
            payload: vec![],
        };
        assert!(matches!(
            into_payload(failed),
            Err(Rejected { status: 500, message }) if message == "asset1 does not exist"
        ));
    }

    #[test]
    fn declared_channels_restrict_networks() {
        assert!(connection(&[]).get_network("anything").is_some());
        let restricted = connection(&["mychannel"]);
        assert_eq!(
            restricted.get_network("mychannel").map(|n| n.name().to_string()),
            Some("mychannel".to_string())
        );
        assert!(restricted.get_network("otherchannel").is_none());
    }

    #[tokio::test]
    async fn evaluate_after_disconnect_fails() {
        let mut connection = connection(&[]);
        connection.disconnect();
        let contract = Network::new("mychannel").get_contract("basic");
        assert!(matches!(
            connection.evaluate(&contract, "GetAllAssets", &[]).await,
            Err(Disconnected())
        ));
    }

    #[tokio::test]
    async fn connect_to_a_closed_port_fails() {
        let gateway = FabricGateway {
            log: discard_logger(),
            peer: PeerEndpoint {
                name: "peer0".to_string(),
                url: "grpc://127.0.0.1:1".to_string(),
                tls_ca_pem: None,
                server_name_override: None,
            },
            channels: vec![],
        };
        let alice = generate_identity("Org1MSP", "alice");
        let result = gateway.connect(&alice, &DiscoveryOptions::default()).await;
        assert!(matches!(result, Err(TransportFailed(..))));
    }
}
