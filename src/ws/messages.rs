//! WebSocket message types and the JSON codec.
//!
//! Requests and replies are JSON objects discriminated by a `kind` field.
//! The WebSocket transport frames each message, so no length prefix is
//! added. Requests are accepted in text and binary frames; replies always
//! go out as text.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ChannelName, Pokemon};
use crate::error::GatewayError;
use crate::hub::Payload;

/// Client → server request envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WsRequest {
    /// Client-provided correlation ID, echoed in the reply.
    #[serde(default)]
    pub request_id: String,
    /// The request itself.
    #[serde(flatten)]
    pub command: WsCommand,
}

/// Requests a client can send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WsCommand {
    /// Look up Pokedex records. All fields empty lists everything.
    Query {
        /// Match on Pokedex number.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        /// Match on species name.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        /// Match on region.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        region: Option<String>,
    },
    /// Start receiving events published on a channel.
    Subscribe {
        /// Channel name; any string is accepted.
        channel: ChannelName,
    },
    /// Stop receiving events published on a channel.
    Unsubscribe {
        /// Channel name.
        channel: ChannelName,
    },
}

/// Server → client reply envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsReply {
    /// Correlation ID of the request this answers; empty for unsolicited
    /// messages such as the welcome and channel events.
    pub request_id: String,
    /// Time the reply was built.
    pub timestamp: DateTime<Utc>,
    /// The reply itself.
    #[serde(flatten)]
    pub body: ReplyBody,
}

/// Reply variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReplyBody {
    /// Greeting sent once right after the connection is registered.
    Welcome {
        /// Human-readable usage text.
        message: String,
        /// Channels the publisher feeds.
        channels: Vec<ChannelName>,
    },
    /// Result of a query. Empty when nothing matched.
    PokemonList {
        /// Matching records in catalog order.
        pokemon: Vec<Pokemon>,
    },
    /// A request could not be served.
    Error {
        /// Human-readable error message.
        message: String,
        /// Numeric error code, never zero.
        code: u32,
    },
    /// Acknowledges a subscribe or unsubscribe.
    Subscription {
        /// Channel the request named.
        channel: ChannelName,
        /// Human-readable acknowledgment.
        message: String,
    },
    /// A value published on a channel.
    ChannelEvent {
        /// Channel the value was published on.
        channel: ChannelName,
        /// The published value.
        message: String,
    },
}

impl ReplyBody {
    /// Builds an error reply carrying the error's code and message.
    #[must_use]
    pub fn from_error(err: &GatewayError) -> Self {
        Self::Error {
            message: err.to_string(),
            code: err.error_code(),
        }
    }

    /// Builds the greeting listing the available commands and channels.
    #[must_use]
    pub fn welcome(channels: Vec<ChannelName>) -> Self {
        let names: Vec<&str> = channels.iter().map(ChannelName::as_str).collect();
        let message = format!(
            "--[ Welcome to the Pokedex gateway ]--\n\
             Send {{\"kind\":\"query\"}} to list all pokemon.\n\
             Add \"id\", \"name\" or \"region\" to filter.\n\
             Send {{\"kind\":\"subscribe\",\"channel\":\"<channel>\"}} or \"unsubscribe\" to manage channels.\n\
             Channels: {}",
            names.join(", ")
        );
        Self::Welcome { message, channels }
    }
}

impl WsReply {
    /// Wraps a body in an envelope stamped with the current time.
    #[must_use]
    pub fn new(request_id: impl Into<String>, body: ReplyBody) -> Self {
        Self {
            request_id: request_id.into(),
            timestamp: Utc::now(),
            body,
        }
    }
}

/// Decodes one client frame.
///
/// # Errors
///
/// Returns [`GatewayError::MalformedMessage`] if the frame is not a valid
/// request envelope.
pub fn decode_request(frame: &[u8]) -> Result<WsRequest, GatewayError> {
    serde_json::from_slice(frame).map_err(|e| GatewayError::MalformedMessage(e.to_string()))
}

/// Encodes a reply into a ready-to-send payload.
///
/// # Errors
///
/// Returns [`GatewayError::EncodeFailed`] if serialization fails.
pub fn encode_reply(reply: &WsReply) -> Result<Payload, GatewayError> {
    Ok(Payload::from(serde_json::to_string(reply)?))
}
