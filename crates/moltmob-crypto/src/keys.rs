//! Key agreement and channel-key derivation
//!
//! Participants hold only an ed25519 signing keypair (their wallet key). The
//! X25519 exchange form is derived on demand: the public key through the
//! birational Edwards-to-Montgomery map, the private side through the
//! clamped secret scalar. No secret ever leaves the machine; both ends of a
//! channel derive the identical shared secret independently.

use curve25519_dalek::montgomery::MontgomeryPoint;
use ed25519_dalek::{SigningKey, VerifyingKey};
use hkdf::Hkdf;
use moltmob_core::PodId;
use rand_core::CryptoRngCore;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::channel::ChannelError;

/// A 32-byte symmetric channel key
///
/// Zeroized on drop; compromise of one round's key does not expose other
/// rounds because derivation is domain-separated by pod and round.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ChannelKey(pub(crate) [u8; 32]);

impl ChannelKey {
    /// Get the raw key bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Debug for ChannelKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material.
        write!(f, "ChannelKey(..)")
    }
}

/// An ed25519 wallet keypair usable for channel key agreement
#[derive(Clone)]
pub struct ChannelKeyPair {
    signing: SigningKey,
}

impl ChannelKeyPair {
    /// Generate a fresh keypair
    pub fn generate<R: CryptoRngCore>(rng: &mut R) -> Self {
        Self {
            signing: SigningKey::generate(rng),
        }
    }

    /// Wrap an existing wallet signing key
    pub fn from_signing_key(signing: SigningKey) -> Self {
        Self { signing }
    }

    /// The ed25519 verifying key
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing.verifying_key()
    }

    /// Hex encoding of the verifying key, as carried in envelope tokens
    pub fn public_hex(&self) -> String {
        hex::encode(self.signing.verifying_key().as_bytes())
    }

    /// The X25519 form of the public key (Edwards -> Montgomery)
    pub fn exchange_public(&self) -> MontgomeryPoint {
        self.signing.verifying_key().to_montgomery()
    }

    /// Compute the raw X25519 shared secret with a peer's ed25519 key
    pub fn diffie_hellman(&self, peer: &VerifyingKey) -> [u8; 32] {
        let scalar = self.signing.to_scalar();
        (peer.to_montgomery() * scalar).to_bytes()
    }
}

impl std::fmt::Debug for ChannelKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ChannelKeyPair({})", self.public_hex())
    }
}

/// Parse a hex-encoded ed25519 verifying key
pub fn verifying_key_from_hex(s: &str) -> Result<VerifyingKey, ChannelError> {
    let bytes = hex::decode(s).map_err(|_| ChannelError::Malformed("sender key is not hex".into()))?;
    let arr: [u8; 32] = bytes
        .try_into()
        .map_err(|_| ChannelError::Malformed("sender key must be 32 bytes".into()))?;
    VerifyingKey::from_bytes(&arr)
        .map_err(|_| ChannelError::Malformed("sender key is not a valid curve point".into()))
}

/// Compute the raw shared secret between a keypair and a peer public key
pub fn shared_secret(mine: &ChannelKeyPair, peer: &VerifyingKey) -> [u8; 32] {
    mine.diffie_hellman(peer)
}

/// Derive the symmetric channel key for one pod round
///
/// HKDF-SHA256 over the raw DH output hardens weak-DH bias and gives
/// per-round domain separation: `info = "moltmob:chan:v1:<pod>:<round>"`.
pub fn derive_channel_key(shared: &[u8; 32], pod_id: PodId, round: u32) -> ChannelKey {
    let info = format!("moltmob:chan:v1:{}:{round}", pod_id.uuid());
    let hk = Hkdf::<Sha256>::new(None, shared);
    let mut okm = [0u8; 32];
    // 32 bytes is always a valid HKDF-SHA256 output length.
    hk.expand(info.as_bytes(), &mut okm)
        .unwrap_or_else(|_| unreachable!("32-byte HKDF output is always valid"));
    ChannelKey(okm)
}
