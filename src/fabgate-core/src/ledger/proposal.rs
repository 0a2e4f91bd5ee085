use crate::error::ledger::EvaluateError;
use crate::identity::IdentitySigner;
use crate::ledger::proto::{
    ChaincodeHeaderExtension, ChaincodeId, ChaincodeInput, ChaincodeInvocationSpec,
    ChaincodeProposalPayload, ChaincodeSpec, ChannelHeader, Header, Proposal, SerializedIdentity,
    SignatureHeader, SignedProposal, ENDORSER_TRANSACTION,
};
use prost::Message;
use ring::rand::{SecureRandom, SystemRandom};
use sha2::{Digest, Sha256};
use std::time::SystemTime;

const NONCE_LENGTH: usize = 24;

/// A signed chaincode invocation proposal and the transaction id it was built for.
pub struct ProposedTransaction {
    pub transaction_id: String,
    pub signed_proposal: SignedProposal,
}

/// The `creator` bytes identifying a client: its MSP id and PEM certificate.
pub fn serialize_identity(msp_id: &str, certificate: &str) -> Vec<u8> {
    SerializedIdentity {
        mspid: msp_id.to_string(),
        id_bytes: certificate.as_bytes().to_vec(),
    }
    .encode_to_vec()
}

/// Transaction ids are the hex SHA-256 of the nonce followed by the creator.
pub fn transaction_id(nonce: &[u8], creator: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(nonce);
    hasher.update(creator);
    hex::encode(hasher.finalize())
}

pub fn propose(
    signer: &IdentitySigner,
    creator: &[u8],
    channel: &str,
    contract: &str,
    function: &str,
    args: &[String],
) -> Result<ProposedTransaction, EvaluateError> {
    let mut nonce = [0u8; NONCE_LENGTH];
    SystemRandom::new()
        .fill(&mut nonce)
        .map_err(EvaluateError::NonceGenerationFailed)?;
    Ok(propose_with_nonce(
        signer, creator, &nonce, channel, contract, function, args,
    ))
}

fn propose_with_nonce(
    signer: &IdentitySigner,
    creator: &[u8],
    nonce: &[u8],
    channel: &str,
    contract: &str,
    function: &str,
    args: &[String],
) -> ProposedTransaction {
    let tx_id = transaction_id(nonce, creator);
    let chaincode_id = ChaincodeId {
        name: contract.to_string(),
        ..Default::default()
    };

    let channel_header = ChannelHeader {
        r#type: ENDORSER_TRANSACTION,
        timestamp: Some(prost_types::Timestamp::from(SystemTime::now())),
        channel_id: channel.to_string(),
        tx_id: tx_id.clone(),
        extension: ChaincodeHeaderExtension {
            chaincode_id: Some(chaincode_id.clone()),
        }
        .encode_to_vec(),
        ..Default::default()
    };
    let signature_header = SignatureHeader {
        creator: creator.to_vec(),
        nonce: nonce.to_vec(),
    };
    let header = Header {
        channel_header: channel_header.encode_to_vec(),
        signature_header: signature_header.encode_to_vec(),
    };

    let input = ChaincodeInput {
        args: std::iter::once(function)
            .chain(args.iter().map(String::as_str))
            .map(|arg| arg.as_bytes().to_vec())
            .collect(),
        ..Default::default()
    };
    let invocation = ChaincodeInvocationSpec {
        chaincode_spec: Some(ChaincodeSpec {
            chaincode_id: Some(chaincode_id),
            input: Some(input),
            ..Default::default()
        }),
    };
    let payload = ChaincodeProposalPayload {
        input: invocation.encode_to_vec(),
        ..Default::default()
    };

    let proposal_bytes = Proposal {
        header: header.encode_to_vec(),
        payload: payload.encode_to_vec(),
        extension: vec![],
    }
    .encode_to_vec();
    let signature = signer.sign(&proposal_bytes);

    ProposedTransaction {
        transaction_id: tx_id,
        signed_proposal: SignedProposal {
            proposal_bytes,
            signature,
        },
    }
}
