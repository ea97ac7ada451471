//! Decrypted event payloads
//!
//! Payloads are JSON with a `kind` tag. Unknown kinds are a first-class
//! `Unrecognized` variant carrying the raw value, so a newer agent client
//! never has its events silently dropped; the orchestrator logs them.

use moltmob_core::{PlayerId, Role};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::channel::ChannelError;

/// The event kinds the orchestrator understands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum KnownPayload {
    Join {
        wallet: String,
        payment_authorization: String,
    },
    NightAction {
        target: PlayerId,
    },
    Vote {
        target: PlayerId,
    },
    RoleAssignment {
        role: Role,
    },
}

/// A decrypted channel payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventPayload {
    /// An agent joining the lobby with a payment authorization to verify
    Join {
        /// The agent's wallet address for fee collection and payouts
        wallet: String,
        /// Opaque authorization the payment backend verifies
        payment_authorization: String,
    },
    /// The minority team's nightly elimination target
    NightAction {
        /// The player to eliminate
        target: PlayerId,
    },
    /// A living player's vote
    Vote {
        /// The player voted against
        target: PlayerId,
    },
    /// GM-to-player secret role deal at game start
    RoleAssignment {
        /// The dealt role
        role: Role,
    },
    /// A payload with an unknown kind tag
    ///
    /// Logged, never dropped silently; carries the raw JSON for forensics.
    Unrecognized {
        /// The raw payload value
        raw: Value,
    },
}

impl EventPayload {
    /// Parse a decrypted payload
    ///
    /// Non-JSON bytes are malformed; JSON with an unknown `kind` becomes
    /// `Unrecognized`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ChannelError> {
        let raw: Value = serde_json::from_slice(bytes)
            .map_err(|e| ChannelError::Malformed(format!("payload is not JSON: {e}")))?;
        match serde_json::from_value::<KnownPayload>(raw.clone()) {
            Ok(known) => Ok(known.into()),
            Err(_) => Ok(Self::Unrecognized { raw }),
        }
    }

    /// Serialize for sealing
    pub fn to_bytes(&self) -> Result<Vec<u8>, ChannelError> {
        let value = match self {
            Self::Join {
                wallet,
                payment_authorization,
            } => serde_json::to_value(KnownPayload::Join {
                wallet: wallet.clone(),
                payment_authorization: payment_authorization.clone(),
            }),
            Self::NightAction { target } => {
                serde_json::to_value(KnownPayload::NightAction { target: *target })
            }
            Self::Vote { target } => serde_json::to_value(KnownPayload::Vote { target: *target }),
            Self::RoleAssignment { role } => {
                serde_json::to_value(KnownPayload::RoleAssignment { role: *role })
            }
            Self::Unrecognized { raw } => Ok(raw.clone()),
        }
        .map_err(|e| ChannelError::Malformed(format!("payload serialization failed: {e}")))?;
        serde_json::to_vec(&value)
            .map_err(|e| ChannelError::Malformed(format!("payload serialization failed: {e}")))
    }
}

impl From<KnownPayload> for EventPayload {
    fn from(known: KnownPayload) -> Self {
        match known {
            KnownPayload::Join {
                wallet,
                payment_authorization,
            } => Self::Join {
                wallet,
                payment_authorization,
            },
            KnownPayload::NightAction { target } => Self::NightAction { target },
            KnownPayload::Vote { target } => Self::Vote { target },
            KnownPayload::RoleAssignment { role } => Self::RoleAssignment { role },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn known_payload_roundtrip() {
        let target = PlayerId::new();
        let payload = EventPayload::Vote { target };
        let bytes = payload.to_bytes().unwrap();
        assert_eq!(EventPayload::from_bytes(&bytes).unwrap(), payload);
    }

    #[test]
    fn unknown_kind_is_preserved() {
        let bytes = br#"{"kind":"taunt","text":"the molt comes for you"}"#;
        let parsed = EventPayload::from_bytes(bytes).unwrap();
        assert_matches!(parsed, EventPayload::Unrecognized { ref raw } if raw["kind"] == "taunt");
        // Round-trips verbatim.
        let rewritten = parsed.to_bytes().unwrap();
        let reparsed = EventPayload::from_bytes(&rewritten).unwrap();
        assert_eq!(parsed, reparsed);
    }

    #[test]
    fn non_json_is_malformed() {
        assert_matches!(
            EventPayload::from_bytes(b"\xffnot json"),
            Err(ChannelError::Malformed(_))
        );
    }

    #[test]
    fn join_wire_shape_is_stable() {
        let payload = EventPayload::Join {
            wallet: "wallet-9".into(),
            payment_authorization: "auth-sig".into(),
        };
        let value: Value = serde_json::from_slice(&payload.to_bytes().unwrap()).unwrap();
        assert_eq!(value["kind"], "join");
        assert_eq!(value["wallet"], "wallet-9");
        assert_eq!(value["payment_authorization"], "auth-sig");
    }
}
