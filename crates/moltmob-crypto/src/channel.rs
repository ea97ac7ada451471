//! Authenticated encryption for channel payloads
//!
//! XChaCha20-Poly1305 with a fresh random 24-byte nonce per message. The
//! extended nonce makes random generation safe at any message volume; nonce
//! reuse under one key would be a confidentiality break, so nonces are never
//! caller-supplied on the seal path.

use chacha20poly1305::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Key, XChaCha20Poly1305, XNonce,
};
use ed25519_dalek::VerifyingKey;
use moltmob_core::{MobError, PodId};
use serde::{Deserialize, Serialize};

use crate::keys::{derive_channel_key, ChannelKey, ChannelKeyPair};

/// Channel failure modes
///
/// `AuthFailure` is a first-class expected outcome: a message sealed for a
/// different recipient, or corrupted in transit, opens to this and the tick
/// loop logs and skips it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    /// The ciphertext failed authentication under this key
    #[error("authentication failure")]
    AuthFailure,
    /// The envelope token or key material could not be parsed
    #[error("malformed envelope: {0}")]
    Malformed(String),
    /// An unexpected cryptographic failure
    #[error("crypto failure: {0}")]
    Crypto(String),
}

impl From<ChannelError> for MobError {
    fn from(err: ChannelError) -> Self {
        match err {
            ChannelError::AuthFailure => MobError::crypto("authentication failure"),
            ChannelError::Malformed(msg) => MobError::protocol(msg),
            ChannelError::Crypto(msg) => MobError::crypto(msg),
        }
    }
}

/// A sealed channel payload: nonce plus ciphertext (tag appended)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedEnvelope {
    /// 24-byte XChaCha20-Poly1305 nonce, fresh per message
    pub nonce: [u8; 24],
    /// Ciphertext with the 16-byte Poly1305 tag appended
    pub ciphertext: Vec<u8>,
}

/// One end of a pairwise encrypted channel
///
/// Holds this party's wallet keypair. The GM constructs one with its own
/// keypair and seals/opens against agent public keys; agent clients do the
/// mirror image. The keypair is an explicit dependency, never a global.
#[derive(Debug, Clone)]
pub struct SecureChannel {
    keypair: ChannelKeyPair,
}

impl SecureChannel {
    /// Create a channel endpoint from this party's keypair
    pub fn new(keypair: ChannelKeyPair) -> Self {
        Self { keypair }
    }

    /// This endpoint's keypair
    pub fn keypair(&self) -> &ChannelKeyPair {
        &self.keypair
    }

    /// Derive the symmetric key shared with `peer` for one pod round
    pub fn key_for(&self, peer: &VerifyingKey, pod_id: PodId, round: u32) -> ChannelKey {
        let shared = self.keypair.diffie_hellman(peer);
        derive_channel_key(&shared, pod_id, round)
    }

    /// Seal a plaintext for `peer` in the given pod round
    pub fn seal(
        &self,
        peer: &VerifyingKey,
        pod_id: PodId,
        round: u32,
        plaintext: &[u8],
    ) -> Result<SealedEnvelope, ChannelError> {
        let key = self.key_for(peer, pod_id, round);
        seal_with_key(&key, plaintext)
    }

    /// Open a sealed envelope from `peer` in the given pod round
    pub fn open(
        &self,
        peer: &VerifyingKey,
        pod_id: PodId,
        round: u32,
        envelope: &SealedEnvelope,
    ) -> Result<Vec<u8>, ChannelError> {
        let key = self.key_for(peer, pod_id, round);
        open_with_key(&key, envelope)
    }
}

/// Seal a plaintext under an already-derived channel key
pub fn seal_with_key(key: &ChannelKey, plaintext: &[u8]) -> Result<SealedEnvelope, ChannelError> {
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
    let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|_| ChannelError::Crypto("encryption failed".into()))?;
    Ok(SealedEnvelope {
        nonce: nonce.into(),
        ciphertext,
    })
}

/// Open a sealed envelope under an already-derived channel key
pub fn open_with_key(key: &ChannelKey, envelope: &SealedEnvelope) -> Result<Vec<u8>, ChannelError> {
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
    let nonce = XNonce::from_slice(&envelope.nonce);
    cipher
        .decrypt(nonce, envelope.ciphertext.as_ref())
        .map_err(|_| ChannelError::AuthFailure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use proptest::prelude::*;
    use rand_core::OsRng as KeyRng;

    fn endpoints() -> (SecureChannel, SecureChannel) {
        let gm = SecureChannel::new(ChannelKeyPair::generate(&mut KeyRng));
        let agent = SecureChannel::new(ChannelKeyPair::generate(&mut KeyRng));
        (gm, agent)
    }

    #[test]
    fn seal_open_roundtrip() {
        let (gm, agent) = endpoints();
        let pod = PodId::new();

        let sealed = agent
            .seal(&gm.keypair().verifying_key(), pod, 1, b"vote: player-3")
            .unwrap();
        let opened = gm
            .open(&agent.keypair().verifying_key(), pod, 1, &sealed)
            .unwrap();
        assert_eq!(opened, b"vote: player-3");
    }

    #[test]
    fn wrong_recipient_fails_authentication() {
        let (gm, agent) = endpoints();
        let eavesdropper = SecureChannel::new(ChannelKeyPair::generate(&mut KeyRng));
        let pod = PodId::new();

        let sealed = agent
            .seal(&gm.keypair().verifying_key(), pod, 1, b"secret")
            .unwrap();
        let result = eavesdropper.open(&agent.keypair().verifying_key(), pod, 1, &sealed);
        assert_matches!(result, Err(ChannelError::AuthFailure));
    }

    #[test]
    fn wrong_round_fails_authentication() {
        let (gm, agent) = endpoints();
        let pod = PodId::new();

        let sealed = agent
            .seal(&gm.keypair().verifying_key(), pod, 1, b"secret")
            .unwrap();
        let result = gm.open(&agent.keypair().verifying_key(), pod, 2, &sealed);
        assert_matches!(result, Err(ChannelError::AuthFailure));
    }

    #[test]
    fn nonces_are_fresh_per_message() {
        let (gm, agent) = endpoints();
        let pod = PodId::new();
        let key = agent.key_for(&gm.keypair().verifying_key(), pod, 1);

        let a = seal_with_key(&key, b"same plaintext").unwrap();
        let b = seal_with_key(&key, b"same plaintext").unwrap();
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    proptest! {
        #[test]
        fn roundtrip_any_payload(payload in proptest::collection::vec(any::<u8>(), 0..512)) {
            let (gm, agent) = endpoints();
            let pod = PodId::new();
            let sealed = agent
                .seal(&gm.keypair().verifying_key(), pod, 3, &payload)
                .unwrap();
            let opened = gm
                .open(&agent.keypair().verifying_key(), pod, 3, &sealed)
                .unwrap();
            prop_assert_eq!(opened, payload);
        }

        #[test]
        fn single_bit_flip_fails_authentication(
            payload in proptest::collection::vec(any::<u8>(), 1..128),
            bit in 0usize..8,
        ) {
            let (gm, agent) = endpoints();
            let pod = PodId::new();
            let mut sealed = agent
                .seal(&gm.keypair().verifying_key(), pod, 1, &payload)
                .unwrap();
            let byte = bit % sealed.ciphertext.len();
            sealed.ciphertext[byte] ^= 1 << bit;
            let result = gm.open(&agent.keypair().verifying_key(), pod, 1, &sealed);
            prop_assert_eq!(result, Err(ChannelError::AuthFailure));
        }
    }
}
