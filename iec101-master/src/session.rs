//! Master session
//!
//! The master resets the remote link, starts a general interrogation and then
//! issues a setpoint on every timer tick while dispatching whatever the
//! outstation sends. Frames are read by a dedicated receive task and handed
//! over a queue; the dispatch loop is the only place that writes.

use crate::config::MasterConfig;
use crate::events::MasterEvent;
use crate::setpoint::{RandomSetpoint, SetpointSource};
use crate::state::MasterState;
use iec101_application::{
    Asdu, Cause, InterrogationPayload, ScaledValuePayload, TypeId, QOI_STATION,
};
use iec101_core::{Iec101Error, Iec101Result};
use iec101_link::{
    function_code, AddressWidth, Frame, FrameDecoder, FrameEncoder, LinkStatistics,
    PrimaryFunction, SecondaryFunction,
};
use iec101_transport::{ByteReader, ByteWriter, RetryPolicy, Shutdown};
use tokio::sync::mpsc;

/// Depth of the queue between the receive task and the dispatch loop
const RECEIVE_QUEUE_DEPTH: usize = 32;

/// What the receive task hands to the dispatch loop
#[derive(Debug)]
enum Received {
    Frame(Frame),
    Rejected(Iec101Error),
    Retrying(Iec101Error),
    Failed(Iec101Error),
}

/// Master session
pub struct MasterSession {
    config: MasterConfig,
    state: MasterState,
    statistics: LinkStatistics,
    setpoints: Box<dyn SetpointSource>,
    events: Option<mpsc::UnboundedSender<MasterEvent>>,
}

impl MasterSession {
    /// Create a session drawing setpoints from the default random range
    pub fn new(config: MasterConfig) -> Self {
        Self {
            config,
            state: MasterState::Init,
            statistics: LinkStatistics::new(),
            setpoints: Box::new(RandomSetpoint::default()),
            events: None,
        }
    }

    /// Replace the setpoint value source
    pub fn with_setpoint_source(mut self, source: impl SetpointSource + 'static) -> Self {
        self.setpoints = Box::new(source);
        self
    }

    /// Publish dispatch outcomes on `sender`
    pub fn with_event_sender(mut self, sender: mpsc::UnboundedSender<MasterEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    /// Create an event channel and return its receiving end
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<MasterEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(tx);
        rx
    }

    pub fn config(&self) -> &MasterConfig {
        &self.config
    }

    pub fn state(&self) -> MasterState {
        self.state
    }

    pub fn statistics(&self) -> &LinkStatistics {
        &self.statistics
    }

    /// Run the session until shutdown or a fatal error
    ///
    /// The read half moves into the receive task. A fatal error leaves the
    /// session in `Failed` and is returned.
    pub async fn run<R, W>(
        &mut self,
        reader: R,
        writer: &mut W,
        mut shutdown: Shutdown,
    ) -> Iec101Result<()>
    where
        R: ByteReader + 'static,
        W: ByteWriter + ?Sized,
    {
        let result = self.drive(reader, writer, &mut shutdown).await;
        if let Err(e) = &result {
            log::error!("Master session failed: {}", e);
            self.state = MasterState::Failed;
        }
        result
    }

    async fn drive<R, W>(
        &mut self,
        mut reader: R,
        writer: &mut W,
        shutdown: &mut Shutdown,
    ) -> Iec101Result<()>
    where
        R: ByteReader + 'static,
        W: ByteWriter + ?Sized,
    {
        let width = self.config.address_width;
        let link_address = self.config.link_address;

        log::info!("Sending reset remote link (address {})", link_address);
        let reset = Frame::fixed(PrimaryFunction::ResetRemoteLink.control(), link_address);
        self.send(writer, &reset).await?;
        self.transition(MasterState::AwaitResetAck)?;

        tokio::select! {
            _ = shutdown.requested() => {
                log::info!("Master stopped during link reset");
                return Ok(());
            }
            ack = Self::read_reset_ack(&mut reader, width, self.config.reset_ack_timeout) => {
                self.handle_reset_ack(ack)?;
            }
        }
        self.transition(MasterState::Operational)?;

        log::info!("Sending general interrogation");
        let interrogation = Asdu::interrogation(
            Cause::Activation,
            self.config.common_address,
            InterrogationPayload::new(0, QOI_STATION),
        );
        self.send_asdu(writer, &interrogation).await?;

        let (tx, mut rx) = mpsc::channel(RECEIVE_QUEUE_DEPTH);
        let receiver = tokio::spawn(receive_loop(reader, width, self.config.retry_policy, tx));

        let period = self.config.setpoint_interval;
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);

        let result = loop {
            tokio::select! {
                _ = shutdown.requested() => {
                    log::info!("Master stopped");
                    break Ok(());
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.send_setpoint(writer).await {
                        break Err(e);
                    }
                }
                received = rx.recv() => match received {
                    Some(Received::Frame(frame)) => {
                        self.statistics.increment_frames_received();
                        self.dispatch(frame);
                    }
                    Some(Received::Rejected(e)) => {
                        log::warn!("Discarding frame: {}", e);
                        self.statistics.record_rejection(&e);
                    }
                    Some(Received::Retrying(e)) => {
                        log::debug!("Read interrupted: {}, retrying", e);
                        self.statistics.increment_transport_retries();
                    }
                    Some(Received::Failed(e)) => break Err(e),
                    None => {
                        break Err(Iec101Error::InvalidState(
                            "Receive task ended unexpectedly".to_string(),
                        ))
                    }
                },
            }
        };

        receiver.abort();
        result
    }

    async fn read_reset_ack<R: ByteReader + ?Sized>(
        reader: &mut R,
        width: AddressWidth,
        timeout: Option<std::time::Duration>,
    ) -> Option<Iec101Result<Frame>> {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, FrameDecoder::decode(reader, width))
                .await
                .ok(),
            None => Some(FrameDecoder::decode(reader, width).await),
        }
    }

    /// Evaluate the single frame read after the reset
    ///
    /// Only a transport error is fatal; the session proceeds in every other
    /// case, including a reply that is not an acknowledgement.
    fn handle_reset_ack(&mut self, ack: Option<Iec101Result<Frame>>) -> Iec101Result<()> {
        match ack {
            None | Some(Err(Iec101Error::Idle)) => {
                log::warn!("No reply to link reset in time, continuing");
            }
            Some(Ok(frame)) => {
                self.statistics.increment_frames_received();
                match frame {
                    Frame::Fixed { control, .. }
                        if SecondaryFunction::from_code(control) == Some(SecondaryFunction::Ack) =>
                    {
                        log::info!("Link reset confirmed");
                    }
                    Frame::SingleChar => {
                        log::warn!("Single character reply to link reset, continuing");
                    }
                    other => log::warn!("Unexpected reply to link reset: {}", other),
                }
            }
            Some(Err(e)) if e.is_decode() => {
                log::warn!("Discarding reply to link reset: {}", e);
                self.statistics.record_rejection(&e);
            }
            Some(Err(e)) => return Err(e),
        }
        Ok(())
    }

    async fn send_setpoint<W: ByteWriter + ?Sized>(&mut self, writer: &mut W) -> Iec101Result<()> {
        let value = self.setpoints.next_value();
        log::info!("Sending setpoint (ioa {}): {}", self.config.setpoint_ioa, value);
        let asdu = Asdu::scaled_value(
            TypeId::ScaledSetpointCommand,
            Cause::Activation,
            self.config.common_address,
            ScaledValuePayload::new(self.config.setpoint_ioa, value, 0),
        );
        self.send_asdu(writer, &asdu).await
    }

    /// Dispatch one received frame
    fn dispatch(&mut self, frame: Frame) {
        let bytes = match frame {
            Frame::Fixed { control, .. } => {
                log::info!("Received fixed frame fc {}", function_code(control));
                return;
            }
            Frame::SingleChar => {
                log::info!("Received single character ack");
                return;
            }
            Frame::Variable { asdu, .. } => asdu,
        };

        let asdu = match Asdu::decode(&bytes) {
            Ok(asdu) => asdu,
            Err(e) => {
                log::warn!("Discarding ASDU: {}", e);
                self.statistics.record_rejection(&e);
                return;
            }
        };
        log::info!("Received ASDU type {} cot {}", asdu.type_id, asdu.cause);

        let event = match self.classify(&asdu) {
            Ok(event) => event,
            Err(e) => {
                log::warn!("Discarding ASDU payload: {}", e);
                self.statistics.record_rejection(&e);
                return;
            }
        };

        match &event {
            MasterEvent::Measurement { value, .. } => log::info!(
                "Measurement ioa {} = {} (quality {})",
                value.ioa,
                value.value,
                value.quality
            ),
            MasterEvent::InterrogationConfirmed { .. } => log::info!("Interrogation confirmed"),
            MasterEvent::InterrogationCompleted { .. } => log::info!("Interrogation completed"),
            MasterEvent::SetpointConfirmed { value, .. } => {
                log::info!("Setpoint confirmed (ioa {}): {}", value.ioa, value.value)
            }
            MasterEvent::Unhandled { type_id, cause } => {
                log::warn!("Unhandled ASDU type {} cot {}", type_id, cause)
            }
        }
        self.publish(event);
    }

    fn classify(&self, asdu: &Asdu) -> Iec101Result<MasterEvent> {
        let common_address = asdu.common_address;
        let event = match (asdu.type_id(), asdu.cause()) {
            (Some(TypeId::ScaledMeasuredValue), _) => MasterEvent::Measurement {
                common_address,
                cause: asdu.cause,
                value: ScaledValuePayload::decode(&asdu.information_objects)?,
            },
            (Some(TypeId::InterrogationCommand), Some(Cause::ActivationConfirm)) => {
                MasterEvent::InterrogationConfirmed { common_address }
            }
            (Some(TypeId::InterrogationCommand), Some(Cause::ActivationTermination)) => {
                MasterEvent::InterrogationCompleted { common_address }
            }
            (Some(TypeId::ScaledSetpointCommand), Some(Cause::ActivationConfirm)) => {
                MasterEvent::SetpointConfirmed {
                    common_address,
                    value: ScaledValuePayload::decode(&asdu.information_objects)?,
                }
            }
            _ => MasterEvent::Unhandled {
                type_id: asdu.type_id,
                cause: asdu.cause,
            },
        };
        Ok(event)
    }

    fn publish(&self, event: MasterEvent) {
        if let Some(events) = &self.events {
            if events.send(event).is_err() {
                log::debug!("Event receiver dropped");
            }
        }
    }

    async fn send_asdu<W: ByteWriter + ?Sized>(
        &mut self,
        writer: &mut W,
        asdu: &Asdu,
    ) -> Iec101Result<()> {
        let frame = Frame::variable(
            PrimaryFunction::UserDataConfirmed.control(),
            self.config.link_address,
            asdu.encode(),
        );
        self.send(writer, &frame).await
    }

    async fn send<W: ByteWriter + ?Sized>(
        &mut self,
        writer: &mut W,
        frame: &Frame,
    ) -> Iec101Result<()> {
        FrameEncoder::write(writer, frame, self.config.address_width).await?;
        self.statistics.increment_frames_sent();
        log::debug!("Sent {}", frame);
        Ok(())
    }

    fn transition(&mut self, next: MasterState) -> Iec101Result<()> {
        self.state.validate_transition(next)?;
        log::debug!("Master state {} -> {}", self.state.as_str(), next.as_str());
        self.state = next;
        Ok(())
    }
}

/// Read frames until the queue closes or a fatal error occurs
///
/// Transient transport errors (end of input, timeouts) are waited out per
/// `policy`; decode errors are forwarded and reading continues. An idle line
/// is simply read again.
async fn receive_loop<R: ByteReader>(
    mut reader: R,
    width: AddressWidth,
    policy: RetryPolicy,
    queue: mpsc::Sender<Received>,
) {
    let mut retry = policy.tracker();
    loop {
        let received = match FrameDecoder::decode(&mut reader, width).await {
            Ok(frame) => {
                retry.on_success();
                Received::Frame(frame)
            }
            Err(e) if e.is_decode() => Received::Rejected(e),
            Err(e) if e.is_idle() => continue,
            Err(e) if e.is_transient() => match retry.on_failure() {
                Some(pause) => {
                    if queue.send(Received::Retrying(e)).await.is_err() {
                        return;
                    }
                    tokio::time::sleep(pause).await;
                    continue;
                }
                None => Received::Failed(e),
            },
            Err(e) => Received::Failed(e),
        };

        let fatal = matches!(received, Received::Failed(_));
        if queue.send(received).await.is_err() || fatal {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MasterConfigBuilder;
    use iec101_transport::{shutdown_channel, split_stream, BoxedReader, BoxedWriter};
    use std::time::Duration;

    const WIDTH: AddressWidth = AddressWidth::Two;

    struct Peer {
        reader: BoxedReader,
        writer: BoxedWriter,
    }

    impl Peer {
        async fn expect(&mut self) -> Frame {
            tokio::time::timeout(Duration::from_secs(2), FrameDecoder::decode(&mut self.reader, WIDTH))
                .await
                .expect("frame in time")
                .unwrap()
        }

        async fn expect_asdu(&mut self) -> Asdu {
            match self.expect().await {
                Frame::Variable {
                    control,
                    link_address,
                    asdu,
                } => {
                    assert_eq!(control, 0x43);
                    assert_eq!(link_address, 1);
                    Asdu::decode(&asdu).unwrap()
                }
                other => panic!("expected variable frame, got {}", other),
            }
        }

        async fn send(&mut self, frame: Frame) {
            FrameEncoder::write(&mut self.writer, &frame, WIDTH).await.unwrap();
        }

        async fn send_asdu(&mut self, asdu: Asdu) {
            self.send(Frame::variable(8, 1, asdu.encode())).await;
        }
    }

    type Started = (
        Peer,
        mpsc::UnboundedReceiver<MasterEvent>,
        iec101_transport::ShutdownTrigger,
        tokio::task::JoinHandle<(Iec101Result<()>, MasterSession)>,
    );

    fn start(config: MasterConfig, source: impl SetpointSource + 'static) -> Started {
        start_with_read_timeout(config, source, None)
    }

    fn start_with_read_timeout(
        config: MasterConfig,
        source: impl SetpointSource + 'static,
        read_timeout: Option<Duration>,
    ) -> Started {
        let (a, b) = tokio::io::duplex(1024);
        let (reader, mut writer) = split_stream(a, read_timeout);
        let (peer_reader, peer_writer) = split_stream(b, None);
        let (trigger, shutdown) = shutdown_channel();

        let mut session = MasterSession::new(config).with_setpoint_source(source);
        let events = session.subscribe();
        let task = tokio::spawn(async move {
            let result = session.run(reader, &mut writer, shutdown).await;
            (result, session)
        });

        let peer = Peer {
            reader: peer_reader,
            writer: peer_writer,
        };
        (peer, events, trigger, task)
    }

    async fn next_event(events: &mut mpsc::UnboundedReceiver<MasterEvent>) -> MasterEvent {
        tokio::time::timeout(Duration::from_secs(2), events.recv())
            .await
            .expect("event in time")
            .expect("channel open")
    }

    fn quiet_config() -> MasterConfig {
        MasterConfigBuilder::new()
            .setpoint_interval(Duration::from_secs(3600))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_handshake_and_interrogation() {
        let (mut peer, mut events, trigger, task) = start(quiet_config(), || 0i16);

        assert_eq!(peer.expect().await, Frame::fixed(0x40, 1));
        peer.send(Frame::fixed(0, 1)).await;

        let request = peer.expect_asdu().await;
        assert_eq!(request.encode(), vec![100, 1, 6, 1, 0, 0, 0, 20]);

        let payload = InterrogationPayload::new(0, 20);
        peer.send_asdu(Asdu::interrogation(Cause::ActivationConfirm, 1, payload)).await;
        peer.send_asdu(Asdu::scaled_value(
            TypeId::ScaledMeasuredValue,
            Cause::InterrogatedByGeneralInterrogation,
            1,
            ScaledValuePayload::new(1, 1234, 0),
        ))
        .await;
        peer.send_asdu(Asdu::scaled_value(
            TypeId::ScaledMeasuredValue,
            Cause::InterrogatedByGeneralInterrogation,
            1,
            ScaledValuePayload::new(2, 22000, 0),
        ))
        .await;
        peer.send_asdu(Asdu::interrogation(Cause::ActivationTermination, 1, payload)).await;

        assert_eq!(
            next_event(&mut events).await,
            MasterEvent::InterrogationConfirmed { common_address: 1 }
        );
        assert_eq!(
            next_event(&mut events).await,
            MasterEvent::Measurement {
                common_address: 1,
                cause: 20,
                value: ScaledValuePayload::new(1, 1234, 0),
            }
        );
        assert_eq!(
            next_event(&mut events).await,
            MasterEvent::Measurement {
                common_address: 1,
                cause: 20,
                value: ScaledValuePayload::new(2, 22000, 0),
            }
        );
        assert_eq!(
            next_event(&mut events).await,
            MasterEvent::InterrogationCompleted { common_address: 1 }
        );

        trigger.trigger();
        let (result, session) = task.await.unwrap();
        result.unwrap();
        assert_eq!(session.state(), MasterState::Operational);
        assert_eq!(session.statistics().frames_sent, 2);
        assert_eq!(session.statistics().frames_received, 5);
    }

    #[tokio::test]
    async fn test_periodic_setpoint() {
        let config = MasterConfigBuilder::new()
            .setpoint_interval(Duration::from_millis(20))
            .build()
            .unwrap();
        let (mut peer, mut events, trigger, task) = start(config, || 20500i16);

        peer.expect().await;
        peer.send(Frame::fixed(0, 1)).await;
        peer.expect_asdu().await;

        let setpoint = peer.expect_asdu().await;
        assert_eq!(setpoint.encode(), vec![48, 1, 6, 1, 0, 2, 0, 0x14, 0x50, 0]);

        peer.send_asdu(Asdu::scaled_value(
            TypeId::ScaledSetpointCommand,
            Cause::ActivationConfirm,
            1,
            ScaledValuePayload::new(2, 20500, 0),
        ))
        .await;
        assert_eq!(
            next_event(&mut events).await,
            MasterEvent::SetpointConfirmed {
                common_address: 1,
                value: ScaledValuePayload::new(2, 20500, 0),
            }
        );

        trigger.trigger();
        task.await.unwrap().0.unwrap();
    }

    // The master proceeds after one frame even when it is not an acknowledgement.
    #[tokio::test]
    async fn test_unexpected_reset_reply_still_proceeds() {
        let (mut peer, _events, trigger, task) = start(quiet_config(), || 0i16);

        peer.expect().await;
        peer.send(Frame::SingleChar).await;
        let request = peer.expect_asdu().await;
        assert_eq!(request.type_id(), Some(TypeId::InterrogationCommand));

        trigger.trigger();
        task.await.unwrap().0.unwrap();
    }

    #[tokio::test]
    async fn test_reset_ack_timeout() {
        let config = MasterConfigBuilder::new()
            .setpoint_interval(Duration::from_secs(3600))
            .reset_ack_timeout(Some(Duration::from_millis(20)))
            .build()
            .unwrap();
        let (mut peer, _events, trigger, task) = start(config, || 0i16);

        peer.expect().await;
        let request = peer.expect_asdu().await;
        assert_eq!(request.type_id(), Some(TypeId::InterrogationCommand));

        trigger.trigger();
        task.await.unwrap().0.unwrap();
    }

    #[tokio::test]
    async fn test_idle_line_during_reset_wait_proceeds() {
        let (mut peer, _events, trigger, task) =
            start_with_read_timeout(quiet_config(), || 0i16, Some(Duration::from_millis(20)));

        peer.expect().await;
        let request = peer.expect_asdu().await;
        assert_eq!(request.type_id(), Some(TypeId::InterrogationCommand));

        trigger.trigger();
        let (result, session) = task.await.unwrap();
        result.unwrap();
        assert_eq!(session.state(), MasterState::Operational);
    }

    #[tokio::test]
    async fn test_idle_line_does_not_use_up_retries() {
        let config = MasterConfigBuilder::new()
            .setpoint_interval(Duration::from_secs(3600))
            .retry_policy(RetryPolicy::bounded(3, Duration::from_millis(1)))
            .build()
            .unwrap();
        let (mut peer, mut events, trigger, task) =
            start_with_read_timeout(config, || 0i16, Some(Duration::from_millis(20)));

        peer.expect().await;
        peer.send(Frame::fixed(0, 1)).await;
        peer.expect_asdu().await;

        // Many read timeouts pass with the peer connected but silent.
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!task.is_finished());

        peer.send_asdu(Asdu::interrogation(
            Cause::ActivationTermination,
            1,
            InterrogationPayload::new(0, 20),
        ))
        .await;
        assert_eq!(
            next_event(&mut events).await,
            MasterEvent::InterrogationCompleted { common_address: 1 }
        );

        trigger.trigger();
        let (result, session) = task.await.unwrap();
        result.unwrap();
        assert_eq!(session.state(), MasterState::Operational);
        assert_eq!(session.statistics().transport_retries, 0);
    }

    #[tokio::test]
    async fn test_unhandled_and_malformed_are_not_fatal() {
        let (mut peer, mut events, trigger, task) = start(quiet_config(), || 0i16);

        peer.expect().await;
        peer.send(Frame::fixed(0, 1)).await;
        peer.expect_asdu().await;

        peer.send(Frame::fixed(0x0B, 1)).await;
        peer.send(Frame::SingleChar).await;
        peer.send_asdu(Asdu::new(45, 1, 7, 1, vec![1, 0, 0])).await;
        peer.send(Frame::variable(8, 1, vec![11, 1])).await;
        peer.send_asdu(Asdu::new(11, 1, 3, 1, vec![1, 0])).await;
        peer.writer.write_all(&[0x10, 0x00, 0x01, 0x00, 0x02, 0x16]).await.unwrap();
        peer.send_asdu(Asdu::interrogation(
            Cause::ActivationTermination,
            1,
            InterrogationPayload::new(0, 20),
        ))
        .await;

        assert_eq!(
            next_event(&mut events).await,
            MasterEvent::Unhandled { type_id: 45, cause: 7 }
        );
        assert_eq!(
            next_event(&mut events).await,
            MasterEvent::InterrogationCompleted { common_address: 1 }
        );

        trigger.trigger();
        let (result, session) = task.await.unwrap();
        result.unwrap();
        let stats = session.statistics();
        assert_eq!(stats.asdu_errors, 1);
        assert_eq!(stats.payload_errors, 1);
        assert_eq!(stats.checksum_errors, 1);
    }

    #[tokio::test]
    async fn test_exhausted_retry_is_fatal() {
        let config = MasterConfigBuilder::new()
            .setpoint_interval(Duration::from_secs(3600))
            .retry_policy(RetryPolicy::bounded(2, Duration::from_millis(1)))
            .build()
            .unwrap();
        let (mut peer, _events, _trigger, task) = start(config, || 0i16);

        peer.expect().await;
        peer.send(Frame::fixed(0, 1)).await;
        peer.expect_asdu().await;
        drop(peer);

        let (result, session) = task.await.unwrap();
        assert!(result.unwrap_err().is_transport());
        assert_eq!(session.state(), MasterState::Failed);
        assert_eq!(session.statistics().transport_retries, 2);
    }

    #[tokio::test]
    async fn test_closed_channel_during_reset_is_fatal() {
        let (peer, _events, _trigger, task) = start(quiet_config(), || 0i16);
        drop(peer);

        let (result, session) = task.await.unwrap();
        assert!(result.is_err());
        assert_eq!(session.state(), MasterState::Failed);
    }
}
