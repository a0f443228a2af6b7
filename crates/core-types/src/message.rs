//! Consensus messages and their signing bytes.

use alloc::vec::Vec;
use core::fmt;

use derive_where::derive_where;

use crate::{
    Address, Context, Height, PrepareJustification, Round, RoundChangeJustification, Signature,
    Value, ValueDigest,
};

/// Separator bytes for consensus message signatures.
/// The 4-byte ASCII string "IBFT" (0x49 0x42 0x46 0x54).
const MESSAGE_SEPARATOR: &[u8] = b"IBFT";

/// The four kinds of consensus messages.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MessageKind {
    PrePrepare,
    Prepare,
    Commit,
    ChangeRound,
}

impl MessageKind {
    const fn tag(&self) -> u8 {
        match self {
            MessageKind::PrePrepare => 0,
            MessageKind::Prepare => 1,
            MessageKind::Commit => 2,
            MessageKind::ChangeRound => 3,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            MessageKind::PrePrepare => "pre_prepare",
            MessageKind::Prepare => "prepare",
            MessageKind::Commit => "commit",
            MessageKind::ChangeRound => "change_round",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value that the sender observed a Prepare quorum for, with the round it was prepared in.
#[derive_where(Clone, Debug, PartialEq, Eq)]
pub struct PreparedValue<Ctx: Context> {
    pub round: Round,
    pub value: Ctx::Value,
}

impl<Ctx: Context> PreparedValue<Ctx> {
    pub fn new(round: Round, value: Ctx::Value) -> Self {
        Self { round, value }
    }

    pub fn value_id(&self) -> ValueDigest {
        self.value.digest()
    }
}

/// The kind-specific content of a message.
#[derive_where(Clone, Debug, PartialEq, Eq)]
pub enum Payload<Ctx: Context> {
    /// The leader's proposal for the round.
    PrePrepare {
        value: Ctx::Value,
        /// The change-round quorum that moved the committee into this round.
        /// Empty in the first round.
        justification: RoundChangeJustification<Ctx>,
    },

    Prepare {
        value_id: ValueDigest,
    },

    Commit {
        value_id: ValueDigest,
    },

    /// A request to move to `round`, carrying what the sender last prepared, if anything.
    ChangeRound {
        prepared: Option<PreparedValue<Ctx>>,
        justification: PrepareJustification<Ctx>,
    },
}

impl<Ctx: Context> Payload<Ctx> {
    pub fn kind(&self) -> MessageKind {
        match self {
            Payload::PrePrepare { .. } => MessageKind::PrePrepare,
            Payload::Prepare { .. } => MessageKind::Prepare,
            Payload::Commit { .. } => MessageKind::Commit,
            Payload::ChangeRound { .. } => MessageKind::ChangeRound,
        }
    }
}

/// A consensus message, before signing.
#[derive_where(Clone, Debug, PartialEq, Eq)]
pub struct Message<Ctx: Context> {
    pub height: Height,
    pub round: Round,
    pub sender: Ctx::Address,
    pub payload: Payload<Ctx>,
}

impl<Ctx: Context> Message<Ctx> {
    pub fn new(height: Height, round: Round, sender: Ctx::Address, payload: Payload<Ctx>) -> Self {
        Self {
            height,
            round,
            sender,
            payload,
        }
    }

    pub fn pre_prepare(
        height: Height,
        round: Round,
        sender: Ctx::Address,
        value: Ctx::Value,
        justification: RoundChangeJustification<Ctx>,
    ) -> Self {
        Self::new(
            height,
            round,
            sender,
            Payload::PrePrepare {
                value,
                justification,
            },
        )
    }

    pub fn prepare(height: Height, round: Round, sender: Ctx::Address, value_id: ValueDigest) -> Self {
        Self::new(height, round, sender, Payload::Prepare { value_id })
    }

    pub fn commit(height: Height, round: Round, sender: Ctx::Address, value_id: ValueDigest) -> Self {
        Self::new(height, round, sender, Payload::Commit { value_id })
    }

    pub fn change_round(
        height: Height,
        round: Round,
        sender: Ctx::Address,
        prepared: Option<PreparedValue<Ctx>>,
        justification: PrepareJustification<Ctx>,
    ) -> Self {
        Self::new(
            height,
            round,
            sender,
            Payload::ChangeRound {
                prepared,
                justification,
            },
        )
    }

    pub fn kind(&self) -> MessageKind {
        self.payload.kind()
    }

    /// The digest this message refers to.
    ///
    /// For a ChangeRound this is the digest of the prepared value, if the sender carries one.
    pub fn value_id(&self) -> Option<ValueDigest> {
        match &self.payload {
            Payload::PrePrepare { value, .. } => Some(value.digest()),
            Payload::Prepare { value_id } | Payload::Commit { value_id } => Some(*value_id),
            Payload::ChangeRound { prepared, .. } => prepared.as_ref().map(|p| p.value_id()),
        }
    }

    /// The round of the prepared value carried by a ChangeRound, if any.
    pub fn prepared_round(&self) -> Option<Round> {
        match &self.payload {
            Payload::ChangeRound {
                prepared: Some(prepared),
                ..
            } => Some(prepared.round),
            _ => None,
        }
    }

    /// Returns the bytes to be signed for this message.
    ///
    /// Format: SEPARATOR || kind || height || round || len(sender) || sender || digest || prepared_round
    ///
    /// Where:
    /// - SEPARATOR is "IBFT" (0x49 0x42 0x46 0x54)
    /// - kind is a single byte
    /// - height, round and prepared_round are 8 bytes (u64 big-endian)
    /// - len() is encoded as 4 bytes (u32 big-endian)
    /// - digest is the 32-byte value digest, all zeroes when the message refers to no value
    /// - prepared_round is zero unless a ChangeRound carries a prepared value
    ///
    /// Justifications are not covered: every message inside them carries its own signature.
    pub fn to_sign_bytes(&self) -> Vec<u8> {
        let sender = self.sender.as_bytes();
        let digest = self.value_id().unwrap_or(ValueDigest::ZERO);
        let prepared_round = self.prepared_round().map_or(0, |r| r.as_u64());

        let mut bytes =
            Vec::with_capacity(MESSAGE_SEPARATOR.len() + 1 + 8 + 8 + 4 + sender.len() + 32 + 8);
        bytes.extend_from_slice(MESSAGE_SEPARATOR);
        bytes.push(self.kind().tag());
        bytes.extend_from_slice(&self.height.as_u64().to_be_bytes());
        bytes.extend_from_slice(&self.round.as_u64().to_be_bytes());
        // Addresses are short; a length that does not fit saturates instead of wrapping.
        let sender_len = u32::try_from(sender.len()).unwrap_or(u32::MAX);
        bytes.extend_from_slice(&sender_len.to_be_bytes());
        bytes.extend_from_slice(sender);
        bytes.extend_from_slice(digest.as_bytes());
        bytes.extend_from_slice(&prepared_round.to_be_bytes());
        bytes
    }
}

/// A message together with the sender's signature over [`Message::to_sign_bytes`].
#[derive_where(Clone, Debug, PartialEq, Eq)]
pub struct SignedMessage<Ctx: Context> {
    pub message: Message<Ctx>,
    pub signature: Signature<Ctx>,
}

impl<Ctx: Context> SignedMessage<Ctx> {
    pub fn new(message: Message<Ctx>, signature: Signature<Ctx>) -> Self {
        Self { message, signature }
    }

    pub fn height(&self) -> Height {
        self.message.height
    }

    pub fn round(&self) -> Round {
        self.message.round
    }

    pub fn sender(&self) -> &Ctx::Address {
        &self.message.sender
    }

    pub fn kind(&self) -> MessageKind {
        self.message.kind()
    }

    pub fn value_id(&self) -> Option<ValueDigest> {
        self.message.value_id()
    }

    /// Whether both messages carry the same signed content.
    ///
    /// Justifications are left out of the signed bytes, so two copies of one message may
    /// differ in their justification and still be the same message from the sender.
    pub fn same_signed_content(&self, other: &Self) -> bool {
        self.message.to_sign_bytes() == other.message.to_sign_bytes()
    }
}
