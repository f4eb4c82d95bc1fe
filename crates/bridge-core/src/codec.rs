use crate::messages::{InboundKind, OutboundKind};
use channel_registry::{ChannelAddress, Domain};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("malformed topic: {0}")]
    MalformedTopic(String),
    #[error("domain/action mismatch in topic: {0}")]
    InvalidDomainAction(String),
    #[error("invalid board or channel id in topic: {0}")]
    InvalidId(String),
}

/// Parse an inbound topic of the form `daq/{dac|adc}/{board}/{channel}/{set|request}`.
///
/// `set` is only valid on `dac` topics, `request` only on `adc`. Board and
/// channel segments must be non-negative integers.
pub fn decode(topic: &str) -> Result<(ChannelAddress, InboundKind), DecodeError> {
    let segments: Vec<&str> = topic.split('/').collect();
    let &[root, domain, board, channel, action] = segments.as_slice() else {
        return Err(DecodeError::MalformedTopic(topic.to_string()));
    };
    if root != "daq" {
        return Err(DecodeError::MalformedTopic(topic.to_string()));
    }
    let domain = match domain {
        "dac" => Domain::Output,
        "adc" => Domain::Input,
        _ => return Err(DecodeError::MalformedTopic(topic.to_string())),
    };
    let kind = match action {
        "set" => InboundKind::Set,
        "request" => InboundKind::Request,
        _ => return Err(DecodeError::MalformedTopic(topic.to_string())),
    };
    match (domain, kind) {
        (Domain::Output, InboundKind::Request) | (Domain::Input, InboundKind::Set) => {
            return Err(DecodeError::InvalidDomainAction(topic.to_string()));
        }
        _ => {}
    }
    let board = parse_id(board, topic)?;
    let channel = parse_id(channel, topic)?;
    Ok((
        ChannelAddress {
            domain,
            board,
            channel,
        },
        kind,
    ))
}

/// Build the outbound topic for a response or error event. Total for any
/// valid address.
pub fn encode(address: ChannelAddress, kind: OutboundKind) -> String {
    let suffix = match kind {
        OutboundKind::Response => "response",
        OutboundKind::Error => "error",
    };
    format!("daq/{address}/{suffix}")
}

fn parse_id(segment: &str, topic: &str) -> Result<u32, DecodeError> {
    segment
        .parse::<u32>()
        .map_err(|_| DecodeError::InvalidId(topic.to_string()))
}

#[derive(Debug, Deserialize)]
struct SetPayload {
    voltage: f64,
}

/// Extract the requested voltage from a `set` payload (`{"voltage": <f64>}`).
pub fn parse_set_payload(payload: &[u8]) -> Result<f64, serde_json::Error> {
    let parsed: SetPayload = serde_json::from_slice(payload)?;
    Ok(parsed.voltage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::OutboundKind;

    #[test]
    fn decodes_dac_set() {
        let (address, kind) = decode("daq/dac/0/1/set").unwrap();
        assert_eq!(address.domain, Domain::Output);
        assert_eq!(address.board, 0);
        assert_eq!(address.channel, 1);
        assert_eq!(kind, InboundKind::Set);
    }

    #[test]
    fn decodes_adc_request() {
        let (address, kind) = decode("daq/adc/3/12/request").unwrap();
        assert_eq!(address.domain, Domain::Input);
        assert_eq!(address.board, 3);
        assert_eq!(address.channel, 12);
        assert_eq!(kind, InboundKind::Request);
    }

    #[test]
    fn wrong_segment_count_is_malformed() {
        assert!(matches!(
            decode("daq/dac/0/1"),
            Err(DecodeError::MalformedTopic(_))
        ));
        assert!(matches!(
            decode("daq/dac/0/1/set/extra"),
            Err(DecodeError::MalformedTopic(_))
        ));
        assert!(matches!(decode(""), Err(DecodeError::MalformedTopic(_))));
    }

    #[test]
    fn unknown_tokens_are_malformed() {
        assert!(matches!(
            decode("dax/dac/0/1/set"),
            Err(DecodeError::MalformedTopic(_))
        ));
        assert!(matches!(
            decode("daq/dio/0/1/set"),
            Err(DecodeError::MalformedTopic(_))
        ));
        assert!(matches!(
            decode("daq/dac/0/1/write"),
            Err(DecodeError::MalformedTopic(_))
        ));
    }

    #[test]
    fn domain_action_mismatch_rejected() {
        assert!(matches!(
            decode("daq/dac/0/1/request"),
            Err(DecodeError::InvalidDomainAction(_))
        ));
        assert!(matches!(
            decode("daq/adc/0/1/set"),
            Err(DecodeError::InvalidDomainAction(_))
        ));
    }

    #[test]
    fn non_integer_ids_rejected() {
        assert!(matches!(
            decode("daq/dac/zero/1/set"),
            Err(DecodeError::InvalidId(_))
        ));
        assert!(matches!(
            decode("daq/adc/0/-1/request"),
            Err(DecodeError::InvalidId(_))
        ));
        assert!(matches!(
            decode("daq/adc/0/1.5/request"),
            Err(DecodeError::InvalidId(_))
        ));
    }

    #[test]
    fn encode_builds_outbound_topics() {
        let (address, _) = decode("daq/dac/0/1/set").unwrap();
        assert_eq!(encode(address, OutboundKind::Response), "daq/dac/0/1/response");
        assert_eq!(encode(address, OutboundKind::Error), "daq/dac/0/1/error");

        let (address, _) = decode("daq/adc/2/7/request").unwrap();
        assert_eq!(encode(address, OutboundKind::Response), "daq/adc/2/7/response");
    }

    #[test]
    fn set_payload_roundtrip() {
        assert_eq!(parse_set_payload(br#"{"voltage": 2.5}"#).unwrap(), 2.5);
        assert_eq!(
            parse_set_payload(br#"{"voltage": -1, "note": "ignored"}"#).unwrap(),
            -1.0
        );
    }

    #[test]
    fn bad_set_payload_rejected() {
        assert!(parse_set_payload(b"").is_err());
        assert!(parse_set_payload(b"2.5").is_err());
        assert!(parse_set_payload(br#"{"volts": 2.5}"#).is_err());
        assert!(parse_set_payload(br#"{"voltage": "high"}"#).is_err());
        assert!(parse_set_payload(br#"{"voltage": null}"#).is_err());
    }
}
