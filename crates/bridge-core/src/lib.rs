//! bridge-core: command dispatch between a pub/sub bus and analog I/O
//!
//! Inbound publishes are decoded into [`InboundMessage`]s, routed through the
//! [`Dispatcher`] (per-channel lookup, in-flight serialization, safety
//! validation, hardware call, state update), and answered with exactly one
//! [`OutboundEvent`] each. The periodic sampler synthesizes read requests and
//! feeds them through the same dispatch path as bus-originated traffic.

mod codec;
pub use codec::{decode, encode, parse_set_payload, DecodeError};

mod messages;
pub use messages::{InboundKind, InboundMessage, OutboundBody, OutboundEvent, OutboundKind};

mod dispatch;
pub use dispatch::{DispatchError, Dispatcher};

mod sampler;
pub use sampler::spawn_samplers;
