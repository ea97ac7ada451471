//! End-to-end encrypted GM/agent channel for Moltmob
//!
//! Every pair (agent, GM) gets a private symmetric channel built from public
//! wallet keys, with no prior handshake:
//!
//! - **Key agreement**: ed25519 wallet keys are mapped to X25519 via the
//!   birational Edwards-to-Montgomery conversion; both sides compute the
//!   same Diffie-Hellman secret independently.
//! - **Key derivation**: the raw DH output goes through HKDF-SHA256 with a
//!   pod- and round-scoped info string, so one round's key material never
//!   exposes another round.
//! - **Sealing**: XChaCha20-Poly1305 with a fresh random 24-byte nonce per
//!   message. Authentication failure on open is an expected outcome, not a
//!   panic.
//!
//! The GM's keypair is an explicit constructor argument everywhere; there is
//! no ambient process-global secret.

pub mod channel;
pub mod envelope;
pub mod keys;
pub mod payload;

pub use channel::{ChannelError, SealedEnvelope, SecureChannel};
pub use envelope::EnvelopeToken;
pub use keys::{derive_channel_key, shared_secret, ChannelKey, ChannelKeyPair};
pub use payload::EventPayload;
