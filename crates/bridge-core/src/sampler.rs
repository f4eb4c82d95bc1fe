use crate::dispatch::{DispatchError, Dispatcher};
use crate::messages::{InboundKind, InboundMessage, OutboundEvent};
use daq_hal::AnalogIo;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Start one periodic read task per input channel configured with a poll
/// interval.
///
/// Every tick synthesizes a read request and runs it through the same
/// dispatch path as bus-originated requests, so validation, serialization,
/// and retained-state behavior are identical. A tick that finds its channel
/// in flight is skipped silently; a missed periodic sample under load is
/// expected, not a fault. All other outcomes, including hardware errors, are
/// forwarded as events.
///
/// Tasks run until aborted or until the event receiver is dropped.
pub fn spawn_samplers<H: AnalogIo + 'static>(
    dispatcher: Dispatcher<H>,
    events: mpsc::Sender<OutboundEvent>,
) -> Vec<JoinHandle<()>> {
    let mut handles = Vec::new();
    for config in dispatcher.registry().polled_inputs() {
        let address = config.address;
        let Some(interval_ms) = config.poll_interval_ms else {
            continue;
        };
        info!(%address, interval_ms, "starting periodic sampler");
        let dispatcher = dispatcher.clone();
        let events = events.clone();
        handles.push(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let msg = InboundMessage {
                    address,
                    kind: InboundKind::Request,
                    value: None,
                };
                let event = match dispatcher.dispatch(msg).await {
                    Ok(event) => event,
                    Err(DispatchError::Busy(_)) => {
                        debug!(%address, "sample skipped, channel in flight");
                        continue;
                    }
                    Err(err) => err.into_event(address),
                };
                if events.send(event).await.is_err() {
                    return;
                }
            }
        }));
    }
    handles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::OutboundBody;
    use channel_registry::{build_registry, ChannelRegistry, ChannelSpec, Domain};
    use daq_hal::MockDaq;
    use std::sync::Arc;

    fn polled_registry(interval_ms: u64) -> Arc<ChannelRegistry> {
        let specs = vec![ChannelSpec {
            domain: Domain::Input,
            board: 0,
            channel: 2,
            min: None,
            max: None,
            poll_interval_ms: Some(interval_ms),
        }];
        Arc::new(build_registry(specs).unwrap())
    }

    #[tokio::test]
    async fn ticks_publish_retained_responses() {
        let hardware = Arc::new(MockDaq::open("mock0").unwrap());
        hardware.set_input(0, 2, 3.3);
        let dispatcher = Dispatcher::new(polled_registry(10), hardware);
        let (tx, mut rx) = mpsc::channel(16);

        let handles = spawn_samplers(dispatcher.clone(), tx);
        assert_eq!(handles.len(), 1);

        for _ in 0..2 {
            let event = tokio::time::timeout(Duration::from_secs(1), rx.recv())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(event.body, OutboundBody::Response { voltage: 3.3 });
            assert_eq!(event.topic(), "daq/adc/0/2/response");
            assert!(event.retain);
        }

        let address = dispatcher.registry().polled_inputs()[0].address;
        assert_eq!(
            dispatcher.registry().state(&address).unwrap().last_value,
            Some(3.3)
        );

        for handle in handles {
            handle.abort();
        }
    }

    #[tokio::test]
    async fn busy_ticks_are_skipped_silently() {
        let hardware = Arc::new(MockDaq::open("mock0").unwrap());
        let dispatcher = Dispatcher::new(polled_registry(10), hardware);
        let address = dispatcher.registry().polled_inputs()[0].address;
        let (tx, mut rx) = mpsc::channel(16);

        let guard = dispatcher.registry().try_acquire(&address).unwrap();
        let handles = spawn_samplers(dispatcher.clone(), tx);

        // Several ticks elapse against a held guard: no events, no errors.
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(rx.try_recv().is_err());

        // Releasing the channel lets the next tick through.
        drop(guard);
        let event = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(event.body, OutboundBody::Response { .. }));

        for handle in handles {
            handle.abort();
        }
    }

    #[tokio::test]
    async fn no_polled_channels_spawns_nothing() {
        let specs = vec![ChannelSpec {
            domain: Domain::Input,
            board: 0,
            channel: 2,
            min: None,
            max: None,
            poll_interval_ms: None,
        }];
        let registry = Arc::new(build_registry(specs).unwrap());
        let dispatcher = Dispatcher::new(registry, Arc::new(MockDaq::open("mock0").unwrap()));
        let (tx, _rx) = mpsc::channel(16);

        assert!(spawn_samplers(dispatcher, tx).is_empty());
    }
}
