use crate::codec;
use channel_registry::ChannelAddress;
use serde_json::json;

/// What an inbound publish asks for.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InboundKind {
    Set,
    Request,
}

/// Which outbound topic an event addresses.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OutboundKind {
    Response,
    Error,
}

/// A decoded inbound publish. Constructed per message, discarded after
/// dispatch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InboundMessage {
    pub address: ChannelAddress,
    pub kind: InboundKind,
    /// Requested output voltage; present only for [`InboundKind::Set`].
    pub value: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum OutboundBody {
    Response { voltage: f64 },
    Error { message: String },
}

/// One completed dispatch, ready for the bus adapter to publish.
///
/// Retention is explicit rather than left to transport defaults: responses
/// are retained so late subscribers see the last known state, errors are
/// not (they go out on a separate topic and must never shadow a retained
/// response).
#[derive(Clone, Debug, PartialEq)]
pub struct OutboundEvent {
    pub address: ChannelAddress,
    pub body: OutboundBody,
    pub retain: bool,
}

impl OutboundEvent {
    pub fn response(address: ChannelAddress, voltage: f64) -> Self {
        Self {
            address,
            body: OutboundBody::Response { voltage },
            retain: true,
        }
    }

    pub fn error(address: ChannelAddress, message: impl Into<String>) -> Self {
        Self {
            address,
            body: OutboundBody::Error {
                message: message.into(),
            },
            retain: false,
        }
    }

    pub fn kind(&self) -> OutboundKind {
        match self.body {
            OutboundBody::Response { .. } => OutboundKind::Response,
            OutboundBody::Error { .. } => OutboundKind::Error,
        }
    }

    pub fn topic(&self) -> String {
        codec::encode(self.address, self.kind())
    }

    pub fn payload(&self) -> String {
        match &self.body {
            OutboundBody::Response { voltage } => json!({ "voltage": voltage }).to_string(),
            OutboundBody::Error { message } => json!({ "error": message }).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use channel_registry::Domain;

    fn dac01() -> ChannelAddress {
        ChannelAddress {
            domain: Domain::Output,
            board: 0,
            channel: 1,
        }
    }

    #[test]
    fn response_is_retained_on_response_topic() {
        let event = OutboundEvent::response(dac01(), 2.5);
        assert!(event.retain);
        assert_eq!(event.topic(), "daq/dac/0/1/response");
        assert_eq!(event.payload(), r#"{"voltage":2.5}"#);
    }

    #[test]
    fn error_is_unretained_on_error_topic() {
        let event = OutboundEvent::error(dac01(), "channel busy");
        assert!(!event.retain);
        assert_eq!(event.topic(), "daq/dac/0/1/error");
        assert_eq!(event.payload(), r#"{"error":"channel busy"}"#);
    }
}
