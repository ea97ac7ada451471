//! Feed envelope tokens
//!
//! Encrypted events travel inside ordinary public feed posts as a single
//! structured token. The field order is fixed for parity with agent client
//! implementations:
//!
//! ```text
//! mm1:<sender_key_hex>:<nonce_b64>:<ciphertext_b64>:<round>:<phase>
//! ```
//!
//! Malformed tokens parse to `ChannelError::Malformed`; the tick loop logs
//! and skips them without aborting.

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine as _;
use ed25519_dalek::VerifyingKey;
use moltmob_core::Phase;

use crate::channel::{ChannelError, SealedEnvelope};
use crate::keys::verifying_key_from_hex;

/// Token prefix identifying a Moltmob envelope, version 1
const TOKEN_PREFIX: &str = "mm1";

/// A parsed feed envelope token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeToken {
    /// Sender's ed25519 verifying key
    pub sender: VerifyingKey,
    /// The sealed payload
    pub sealed: SealedEnvelope,
    /// Round the sender tagged the event with
    pub round: u32,
    /// Phase the sender tagged the event with
    pub phase: Phase,
}

impl EnvelopeToken {
    /// Build a token from a sealed envelope
    pub fn new(sender: VerifyingKey, sealed: SealedEnvelope, round: u32, phase: Phase) -> Self {
        Self {
            sender,
            sealed,
            round,
            phase,
        }
    }

    /// Encode as the wire token string
    pub fn encode(&self) -> String {
        format!(
            "{TOKEN_PREFIX}:{}:{}:{}:{}:{}",
            hex::encode(self.sender.as_bytes()),
            B64.encode(self.sealed.nonce),
            B64.encode(&self.sealed.ciphertext),
            self.round,
            self.phase,
        )
    }

    /// Parse a wire token string
    pub fn parse(token: &str) -> Result<Self, ChannelError> {
        let parts: Vec<&str> = token.split(':').collect();
        if parts.len() != 6 {
            return Err(ChannelError::Malformed(format!(
                "expected 6 token fields, got {}",
                parts.len()
            )));
        }
        if parts[0] != TOKEN_PREFIX {
            return Err(ChannelError::Malformed(format!(
                "unknown token prefix: {}",
                parts[0]
            )));
        }

        let sender = verifying_key_from_hex(parts[1])?;
        let nonce_bytes = B64
            .decode(parts[2])
            .map_err(|_| ChannelError::Malformed("nonce is not base64".into()))?;
        let nonce: [u8; 24] = nonce_bytes
            .try_into()
            .map_err(|_| ChannelError::Malformed("nonce must be 24 bytes".into()))?;
        let ciphertext = B64
            .decode(parts[3])
            .map_err(|_| ChannelError::Malformed("ciphertext is not base64".into()))?;
        let round: u32 = parts[4]
            .parse()
            .map_err(|_| ChannelError::Malformed("round is not an integer".into()))?;
        let phase: Phase = parts[5]
            .parse()
            .map_err(|_| ChannelError::Malformed(format!("unknown phase: {}", parts[5])))?;

        Ok(Self {
            sender,
            sealed: SealedEnvelope { nonce, ciphertext },
            round,
            phase,
        })
    }

    /// Find and parse the first envelope token embedded in feed text
    ///
    /// Returns `None` when the post carries no token at all (ordinary
    /// discussion), and an error when a token is present but malformed.
    pub fn extract(text: &str) -> Option<Result<Self, ChannelError>> {
        text.split_whitespace()
            .find(|word| {
                word.strip_prefix(TOKEN_PREFIX)
                    .is_some_and(|rest| rest.starts_with(':'))
            })
            .map(Self::parse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::ChannelKeyPair;
    use assert_matches::assert_matches;
    use rand_core::OsRng;

    fn sample_token() -> EnvelopeToken {
        let sender = ChannelKeyPair::generate(&mut OsRng);
        EnvelopeToken::new(
            sender.verifying_key(),
            SealedEnvelope {
                nonce: [7u8; 24],
                ciphertext: vec![1, 2, 3, 4],
            },
            2,
            Phase::Vote,
        )
    }

    #[test]
    fn encode_parse_roundtrip() {
        let token = sample_token();
        let parsed = EnvelopeToken::parse(&token.encode()).unwrap();
        assert_eq!(parsed, token);
    }

    #[test]
    fn extract_from_surrounding_text() {
        let token = sample_token();
        let text = format!("I hereby submit my vote. {} good luck all", token.encode());
        let extracted = EnvelopeToken::extract(&text).unwrap().unwrap();
        assert_eq!(extracted, token);
    }

    #[test]
    fn plain_discussion_has_no_token() {
        assert!(EnvelopeToken::extract("just chatting about the molt").is_none());
    }

    #[test]
    fn truncated_token_is_malformed() {
        let token = sample_token().encode();
        let truncated = token.rsplit_once(':').map(|(head, _)| head).unwrap();
        assert_matches!(
            EnvelopeToken::parse(truncated),
            Err(ChannelError::Malformed(_))
        );
    }

    #[test]
    fn bad_nonce_length_is_malformed() {
        let token = sample_token();
        let mut fields: Vec<String> = token.encode().split(':').map(String::from).collect();
        fields[2] = B64.encode([0u8; 12]);
        assert_matches!(
            EnvelopeToken::parse(&fields.join(":")),
            Err(ChannelError::Malformed(_))
        );
    }
}
