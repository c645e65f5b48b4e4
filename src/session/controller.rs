//! Rate-limited control-command write path.
//!
//! Sits between UI-shaped callers and the stateless encoder: validates
//! resistance levels against the negotiated range, gates bursts of writes
//! to the interval the consoles tolerate, and surfaces write failures
//! unchanged. A failed write is never retried here.

use crate::protocol::types::{CapabilityDescriptor, ControlCommand, Dialect};
use crate::protocol::{self, iconsole, StartStopOpcodes};
use crate::session::transport::{RemoteCharacteristic, SessionError};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Minimum spacing between outbound commands the consoles tolerate.
pub const DEFAULT_COMMAND_INTERVAL: Duration = Duration::from_millis(500);

/// Interval gate for outbound writes. Resistance sliders produce bursts;
/// the peripheral's command buffer does not keep up, so superseded writes
/// are dropped rather than queued.
#[derive(Debug)]
pub struct WriteGate {
    min_interval: Duration,
    last_write: Option<Instant>,
}

impl WriteGate {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_write: None,
        }
    }

    /// Returns true when a write may proceed now, reserving the slot.
    pub fn try_acquire(&mut self) -> bool {
        match self.last_write {
            Some(last) if last.elapsed() < self.min_interval => false,
            _ => {
                self.last_write = Some(Instant::now());
                true
            }
        }
    }
}

/// Write path for one negotiated session.
pub struct BikeController {
    descriptor: CapabilityDescriptor,
    control: Arc<dyn RemoteCharacteristic>,
    opcodes: StartStopOpcodes,
    gate: WriteGate,
}

impl BikeController {
    pub fn new(
        descriptor: CapabilityDescriptor,
        control: Arc<dyn RemoteCharacteristic>,
        opcodes: StartStopOpcodes,
        min_interval: Duration,
    ) -> Self {
        Self {
            descriptor,
            control,
            opcodes,
            gate: WriteGate::new(min_interval),
        }
    }

    /// Validate a resistance level against the negotiated range, then
    /// encode and write it. Returns `Ok(false)` when the interval gate
    /// dropped the write (a newer level will come along); out-of-range
    /// levels fail loudly instead of being clamped.
    pub async fn try_set_resistance(&mut self, level: u16) -> Result<bool, SessionError> {
        if !self.descriptor.resistance_control {
            return Err(SessionError::Write(
                "resistance control not available on this bike".to_string(),
            ));
        }
        if !self.descriptor.resistance_in_range(level) {
            return Err(SessionError::Write(format!(
                "resistance level {} outside {}..={}",
                level, self.descriptor.min_resistance, self.descriptor.max_resistance
            )));
        }
        if !self.gate.try_acquire() {
            tracing::debug!("resistance write gated, level {} dropped", level);
            return Ok(false);
        }

        let payload = protocol::encode_command(
            self.descriptor.dialect,
            &ControlCommand::SetResistance(level),
            self.opcodes,
        )
        .map_err(|error| SessionError::Write(error.to_string()))?;

        self.control.write_value(&payload).await?;
        tracing::debug!("resistance set to {}", level);
        Ok(true)
    }

    /// Start the session. Console bikes want their handshake first.
    pub async fn start(&mut self) -> Result<(), SessionError> {
        if self.descriptor.dialect == Dialect::IConsole {
            for packet in iconsole::handshake_packets() {
                self.control.write_value(&packet).await?;
            }
        }
        self.write_command(&ControlCommand::Start).await
    }

    /// Stop the session.
    pub async fn stop(&mut self) -> Result<(), SessionError> {
        self.write_command(&ControlCommand::Stop).await
    }

    async fn write_command(&mut self, command: &ControlCommand) -> Result<(), SessionError> {
        let payload = protocol::encode_command(self.descriptor.dialect, command, self.opcodes)
            .map_err(|error| SessionError::Write(error.to_string()))?;
        self.control.write_value(&payload).await
    }
}
