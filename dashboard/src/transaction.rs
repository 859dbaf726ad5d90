//! Legacy transaction assembly, partial signing and submission.
//!
//! Wire format: compact-u16 signature count, one 64-byte signature per
//! required signer (zeroed until signed), then the serialized message.

use std::fmt;

use anchor_lang::prelude::Pubkey;
use anchor_lang::solana_program::instruction::Instruction;
use ed25519_dalek::{Signer as _, SigningKey};
use opclw_codec::ByteWriter;
use solana_message::Message;

use crate::capabilities::{Commitment, FreshnessToken, Network, SubmissionId, WalletProvider};
use crate::error::SubmissionError;

pub const SIGNATURE_LEN: usize = 64;

pub type SignatureBytes = [u8; SIGNATURE_LEN];

/// A key held by the dashboard itself rather than the wallet.
pub trait TransactionSigner: Send + Sync {
    fn pubkey(&self) -> Pubkey;

    fn sign_message(&self, message: &[u8]) -> SignatureBytes;
}

/// Freshly generated keypair for a new task account.
pub struct EphemeralSigner {
    key: SigningKey,
    pubkey: Pubkey,
}

impl EphemeralSigner {
    pub fn generate() -> Result<Self, SubmissionError> {
        let mut seed = [0_u8; 32];
        getrandom::getrandom(&mut seed)
            .map_err(|err| SubmissionError::KeyGeneration(err.to_string()))?;
        Ok(Self::from_seed(seed))
    }

    pub fn from_seed(seed: [u8; 32]) -> Self {
        let key = SigningKey::from_bytes(&seed);
        let pubkey = Pubkey::new_from_array(key.verifying_key().to_bytes());
        Self { key, pubkey }
    }
}

impl TransactionSigner for EphemeralSigner {
    fn pubkey(&self) -> Pubkey {
        self.pubkey
    }

    fn sign_message(&self, message: &[u8]) -> SignatureBytes {
        self.key.sign(message).to_bytes()
    }
}

impl fmt::Debug for EphemeralSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EphemeralSigner")
            .field("pubkey", &self.pubkey)
            .finish_non_exhaustive()
    }
}

/// Unsigned or partially signed transaction handed to the wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionEnvelope {
    message: Message,
    signatures: Vec<SignatureBytes>,
    freshness: FreshnessToken,
}

impl TransactionEnvelope {
    /// Instructions keep their order; `fee_payer` becomes the first account.
    pub fn new(instructions: &[Instruction], fee_payer: &Pubkey, freshness: FreshnessToken) -> Self {
        let message =
            Message::new_with_blockhash(instructions, Some(fee_payer), &freshness.blockhash);
        let required = usize::from(message.header.num_required_signatures);
        Self {
            message,
            signatures: vec![[0_u8; SIGNATURE_LEN]; required],
            freshness,
        }
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn message_bytes(&self) -> Vec<u8> {
        self.message.serialize()
    }

    pub fn freshness(&self) -> FreshnessToken {
        self.freshness
    }

    pub fn fee_payer(&self) -> Option<&Pubkey> {
        self.message.account_keys.first()
    }

    /// Signer keys in signature-slot order.
    pub fn required_signers(&self) -> &[Pubkey] {
        &self.message.account_keys[..self.signatures.len()]
    }

    pub fn partial_sign(&mut self, signer: &dyn TransactionSigner) -> Result<(), SubmissionError> {
        let key = signer.pubkey();
        let slot = self
            .required_signers()
            .iter()
            .position(|candidate| *candidate == key)
            .ok_or(SubmissionError::SignerNotRequired { signer: key })?;
        self.signatures[slot] = signer.sign_message(&self.message_bytes());
        Ok(())
    }

    pub fn signature_for(&self, key: &Pubkey) -> Option<&SignatureBytes> {
        let slot = self.required_signers().iter().position(|c| c == key)?;
        self.signatures.get(slot)
    }

    pub fn is_signed_by(&self, key: &Pubkey) -> bool {
        self.signature_for(key)
            .is_some_and(|signature| signature.iter().any(|byte| *byte != 0))
    }

    /// Signer keys whose slot is still zeroed.
    pub fn missing_signers(&self) -> Vec<Pubkey> {
        self.required_signers()
            .iter()
            .filter(|key| !self.is_signed_by(key))
            .copied()
            .collect()
    }

    pub fn serialize(&self) -> Vec<u8> {
        let message = self.message_bytes();
        let mut writer =
            ByteWriter::with_capacity(3 + self.signatures.len() * SIGNATURE_LEN + message.len());
        writer.put_compact_u16(u16::from(self.message.header.num_required_signatures));
        for signature in &self.signatures {
            writer.put_bytes(signature);
        }
        writer.put_bytes(&message);
        writer.into_bytes()
    }
}

/// Builds and submits transactions against one RPC connection.
pub struct TransactionAssembler<'a> {
    network: &'a dyn Network,
}

impl<'a> TransactionAssembler<'a> {
    pub fn new(network: &'a dyn Network) -> Self {
        Self { network }
    }

    /// Fetches a fresh blockhash, then builds and partially signs.
    pub async fn assemble(
        &self,
        fee_payer: &Pubkey,
        instructions: &[Instruction],
        extra_signers: &[&dyn TransactionSigner],
    ) -> Result<TransactionEnvelope, SubmissionError> {
        let freshness = self.network.get_latest_blockhash().await?;
        let mut envelope = TransactionEnvelope::new(instructions, fee_payer, freshness);
        for signer in extra_signers {
            envelope.partial_sign(*signer)?;
        }
        tracing::debug!(
            instructions = instructions.len(),
            signers = envelope.required_signers().len(),
            message_len = envelope.message_bytes().len(),
            blockhash = %freshness.blockhash,
            "assembled transaction"
        );
        Ok(envelope)
    }

    /// Prefers the wallet's combined sign-and-send; otherwise signs, sends
    /// raw and waits for `confirmed`.
    pub async fn submit(
        &self,
        wallet: &dyn WalletProvider,
        envelope: &TransactionEnvelope,
    ) -> Result<SubmissionId, SubmissionError> {
        if wallet.supports_sign_and_send() {
            let id = wallet.sign_and_send_transaction(envelope).await.map_err(|err| {
                tracing::error!(error = %err, "wallet sign-and-send failed");
                SubmissionError::from(err)
            })?;
            tracing::info!(signature = %id, "transaction sent by wallet");
            return Ok(id);
        }

        let signed = wallet.sign_transaction(envelope).await.map_err(|err| {
            tracing::error!(error = %err, "wallet signing failed");
            SubmissionError::from(err)
        })?;
        let id = self.network.send_raw_transaction(&signed).await.map_err(|err| {
            tracing::error!(error = %err, "raw transaction rejected");
            SubmissionError::from(err)
        })?;
        tracing::info!(signature = %id, "transaction sent");

        let commitment = Commitment::Confirmed;
        if !self.network.confirm_transaction(&id, commitment).await? {
            tracing::error!(signature = %id, commitment = commitment.as_str(), "transaction not confirmed");
            return Err(SubmissionError::NotConfirmed {
                submission_id: id.to_string(),
            });
        }
        tracing::info!(signature = %id, commitment = commitment.as_str(), "transaction confirmed");
        Ok(id)
    }
}
