//! Outstation request loop
//!
//! The outstation reads one frame, handles it completely (an interrogation
//! reply spans four frames) and only then reads the next one. Frames arriving
//! while a reply is on the wire wait in the channel.

use crate::config::OutstationConfig;
use crate::state::{
    OutstationPhase, PointStore, SetpointOutcome, IOA_POWER_DRAWN, IOA_POWER_LIMITATION,
};
use iec101_application::{Asdu, Cause, InterrogationPayload, ScaledValuePayload, TypeId};
use iec101_core::Iec101Result;
use iec101_link::{
    function_code, Frame, FrameDecoder, FrameEncoder, LinkStatistics, PrimaryFunction,
    SecondaryFunction,
};
use iec101_transport::{ByteReader, ByteWriter, Shutdown};

/// Quality descriptor sent with every reported value
const QUALITY_GOOD: u8 = 0;

/// Outstation session
///
/// Serves one master over one channel. Link and common addresses of replies
/// are taken from the request being answered.
#[derive(Debug)]
pub struct OutstationSession {
    config: OutstationConfig,
    store: PointStore,
    phase: OutstationPhase,
    statistics: LinkStatistics,
}

impl OutstationSession {
    pub fn new(config: OutstationConfig, store: PointStore) -> Self {
        Self {
            config,
            store,
            phase: OutstationPhase::Idle,
            statistics: LinkStatistics::new(),
        }
    }

    pub fn config(&self) -> &OutstationConfig {
        &self.config
    }

    pub fn store(&self) -> &PointStore {
        &self.store
    }

    pub fn phase(&self) -> OutstationPhase {
        self.phase
    }

    pub fn statistics(&self) -> &LinkStatistics {
        &self.statistics
    }

    /// Serve requests until shutdown
    ///
    /// Decode errors drop the offending frame. Transport errors on read are
    /// waited out according to the retry policy; the loop ends with the last
    /// error once the policy is exhausted. A read timeout with no frame begun
    /// is an idle line and is simply read again.
    pub async fn run<R, W>(
        &mut self,
        reader: &mut R,
        writer: &mut W,
        mut shutdown: Shutdown,
    ) -> Iec101Result<()>
    where
        R: ByteReader + ?Sized,
        W: ByteWriter + ?Sized,
    {
        let width = self.config.address_width;
        let mut retry = self.config.retry_policy.tracker();
        log::info!("Outstation started (address width {})", width);

        loop {
            let result = tokio::select! {
                _ = shutdown.requested() => {
                    log::info!("Outstation stopped");
                    return Ok(());
                }
                result = FrameDecoder::decode(reader, width) => result,
            };

            match result {
                Ok(frame) => {
                    retry.on_success();
                    self.statistics.increment_frames_received();
                    self.handle_frame(frame, writer).await?;
                }
                Err(e) if e.is_decode() => {
                    log::warn!("Discarding frame: {}", e);
                    self.statistics.record_rejection(&e);
                }
                Err(e) if e.is_idle() => {}
                Err(e) => {
                    let Some(pause) = retry.on_failure() else {
                        log::error!("Read failed, giving up: {}", e);
                        return Err(e);
                    };
                    log::warn!("Read error: {}, retrying in {:?}", e, pause);
                    self.statistics.increment_transport_retries();
                    tokio::select! {
                        _ = shutdown.requested() => {
                            log::info!("Outstation stopped");
                            return Ok(());
                        }
                        _ = tokio::time::sleep(pause) => {}
                    }
                }
            }
        }
    }

    /// Handle one received frame, sending whatever replies it calls for
    ///
    /// Write failures are logged and end the handling of this frame; only an
    /// invalid phase transition is returned as an error.
    pub async fn handle_frame<W: ByteWriter + ?Sized>(
        &mut self,
        frame: Frame,
        writer: &mut W,
    ) -> Iec101Result<()> {
        self.transition(OutstationPhase::Processing)?;

        match frame {
            Frame::Fixed {
                control,
                link_address,
            } => self.handle_fixed(control, link_address, writer).await,
            Frame::Variable {
                link_address, asdu, ..
            } => self.handle_variable(link_address, &asdu, writer).await?,
            Frame::SingleChar => log::debug!("Ignoring single character frame"),
        }

        self.transition(OutstationPhase::Idle)
    }

    async fn handle_fixed<W: ByteWriter + ?Sized>(
        &mut self,
        control: u8,
        link_address: u16,
        writer: &mut W,
    ) {
        let fc = function_code(control);
        let reply = match PrimaryFunction::from_code(fc) {
            Some(PrimaryFunction::ResetRemoteLink) => {
                log::info!("Link reset received (address {})", link_address);
                Frame::fixed(SecondaryFunction::Ack.control(), link_address)
            }
            Some(PrimaryFunction::RequestLinkStatus) => {
                log::info!("Link status requested (address {})", link_address);
                Frame::fixed(SecondaryFunction::Ack.control(), link_address)
            }
            Some(PrimaryFunction::RequestClass1) | Some(PrimaryFunction::RequestClass2) => {
                log::debug!("Class data requested (fc {}), no data queued", fc);
                Frame::SingleChar
            }
            _ => {
                log::warn!("Unsupported link function code {}", fc);
                return;
            }
        };

        if let Err(e) = self.send(writer, &reply).await {
            log::error!("Failed to send link reply: {}", e);
        }
    }

    async fn handle_variable<W: ByteWriter + ?Sized>(
        &mut self,
        link_address: u16,
        bytes: &[u8],
        writer: &mut W,
    ) -> Iec101Result<()> {
        let asdu = match Asdu::decode(bytes) {
            Ok(asdu) => asdu,
            Err(e) => {
                log::warn!("Discarding ASDU: {}", e);
                self.statistics.record_rejection(&e);
                return Ok(());
            }
        };
        log::info!(
            "Received ASDU type {} cot {} ca {}",
            asdu.type_id,
            asdu.cause,
            asdu.common_address
        );

        match asdu.type_id() {
            Some(TypeId::InterrogationCommand) => {
                self.handle_interrogation(link_address, &asdu, writer).await
            }
            Some(TypeId::ScaledSetpointCommand) => {
                self.handle_setpoint(link_address, &asdu, writer).await;
                Ok(())
            }
            _ => {
                log::warn!("Unsupported ASDU type {}", asdu.type_id);
                Ok(())
            }
        }
    }

    async fn handle_interrogation<W: ByteWriter + ?Sized>(
        &mut self,
        link_address: u16,
        request: &Asdu,
        writer: &mut W,
    ) -> Iec101Result<()> {
        let payload = match InterrogationPayload::decode(&request.information_objects) {
            Ok(payload) => payload,
            Err(e) => {
                log::warn!("Discarding interrogation: {}", e);
                self.statistics.record_rejection(&e);
                return Ok(());
            }
        };
        log::info!(
            "Interrogation request (ioa {}, qoi {})",
            payload.ioa,
            payload.qualifier
        );

        self.transition(OutstationPhase::Replying)?;
        if let Err(e) = self
            .send_interrogation_reply(link_address, request.common_address, payload, writer)
            .await
        {
            log::error!("Interrogation reply aborted: {}", e);
        }
        Ok(())
    }

    async fn send_interrogation_reply<W: ByteWriter + ?Sized>(
        &mut self,
        link_address: u16,
        common_address: u16,
        payload: InterrogationPayload,
        writer: &mut W,
    ) -> Iec101Result<()> {
        let delay = self.config.scan_delay;

        let confirm = Asdu::interrogation(Cause::ActivationConfirm, common_address, payload);
        self.send_asdu(writer, link_address, &confirm).await?;

        tokio::time::sleep(delay).await;
        let drawn = self.store.power_drawn();
        log::info!("Sending power drawn: {}", drawn);
        let report = Self::measurement(common_address, IOA_POWER_DRAWN, drawn);
        self.send_asdu(writer, link_address, &report).await?;

        tokio::time::sleep(delay).await;
        let limitation = self.store.power_limitation();
        log::info!("Sending power limitation: {}", limitation);
        let report = Self::measurement(common_address, IOA_POWER_LIMITATION, limitation);
        self.send_asdu(writer, link_address, &report).await?;

        tokio::time::sleep(delay).await;
        let terminate = Asdu::interrogation(Cause::ActivationTermination, common_address, payload);
        self.send_asdu(writer, link_address, &terminate).await
    }

    async fn handle_setpoint<W: ByteWriter + ?Sized>(
        &mut self,
        link_address: u16,
        request: &Asdu,
        writer: &mut W,
    ) {
        let payload = match ScaledValuePayload::decode(&request.information_objects) {
            Ok(payload) => payload,
            Err(e) => {
                log::warn!("Discarding setpoint: {}", e);
                self.statistics.record_rejection(&e);
                return;
            }
        };
        log::info!(
            "Setpoint command (ioa {}): {} (qos {})",
            payload.ioa,
            payload.value,
            payload.quality
        );

        if self.store.apply_setpoint(payload.ioa, payload.value) == SetpointOutcome::UnknownAddress {
            log::warn!("No writable point at ioa {}, confirming anyway", payload.ioa);
        }

        let confirm = Asdu::scaled_value(
            TypeId::ScaledSetpointCommand,
            Cause::ActivationConfirm,
            request.common_address,
            payload,
        );
        if let Err(e) = self.send_asdu(writer, link_address, &confirm).await {
            log::error!("Failed to confirm setpoint: {}", e);
        }
    }

    fn measurement(common_address: u16, ioa: u16, value: i16) -> Asdu {
        Asdu::scaled_value(
            TypeId::ScaledMeasuredValue,
            Cause::InterrogatedByGeneralInterrogation,
            common_address,
            ScaledValuePayload::new(ioa, value, QUALITY_GOOD),
        )
    }

    async fn send_asdu<W: ByteWriter + ?Sized>(
        &mut self,
        writer: &mut W,
        link_address: u16,
        asdu: &Asdu,
    ) -> Iec101Result<()> {
        let frame = Frame::variable(SecondaryFunction::UserData.control(), link_address, asdu.encode());
        self.send(writer, &frame).await
    }

    async fn send<W: ByteWriter + ?Sized>(&mut self, writer: &mut W, frame: &Frame) -> Iec101Result<()> {
        FrameEncoder::write(writer, frame, self.config.address_width).await?;
        self.statistics.increment_frames_sent();
        log::debug!("Sent {}", frame);
        Ok(())
    }

    fn transition(&mut self, next: OutstationPhase) -> Iec101Result<()> {
        self.phase.validate_transition(next)?;
        log::trace!("Outstation phase {} -> {}", self.phase.as_str(), next.as_str());
        self.phase = next;
        Ok(())
    }
}
