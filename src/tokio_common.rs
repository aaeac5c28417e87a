//! Common data structures and error types for the `tokio-modbus` based
//! client.
//!
//! Defines the `Error` enum covering all communication failures, the
//! [`RetryPolicy`] applied to transient transport faults, and the
//! [`RegisterIo`] seam the client talks through.

use crate::protocol as proto;
use std::num::NonZeroU32;

/// Represents all possible errors that can occur during Modbus communication.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Wraps `proto::Error`.
    #[error(transparent)]
    Protocol(#[from] proto::Error),

    /// Wraps `tokio_modbus::ExceptionCode`.
    #[error(transparent)]
    Exception(#[from] tokio_modbus::ExceptionCode),

    /// Wraps `tokio_modbus::Error`.
    #[error(transparent)]
    Modbus(#[from] tokio_modbus::Error),

    /// A bounded [`RetryPolicy`] ran out of attempts on a transient fault.
    #[error("giving up after {attempts} failed attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// The device did not answer before the transport timeout.
    pub fn is_no_response(&self) -> bool {
        matches!(
            self,
            Error::Modbus(tokio_modbus::Error::Transport(io))
                if io.kind() == std::io::ErrorKind::TimedOut
        )
    }

    /// The device answered with a frame the transport could not make
    /// sense of (bad CRC, truncated frame, mismatched contents).
    pub fn is_invalid_response(&self) -> bool {
        matches!(
            self,
            Error::Modbus(tokio_modbus::Error::Transport(io))
                if io.kind() == std::io::ErrorKind::InvalidData
        )
    }
}

/// The result type for tokio operations.
pub type Result<T> = std::result::Result<T, Error>;

/// How transient transport faults are retried.
///
/// The default reproduces the behavior of the vendor tooling: retry the
/// same request until it succeeds. That makes every call potentially
/// block forever against an unresponsive device — callers needing
/// bounded latency should pick [`RetryPolicy::Limit`] or enforce a
/// deadline a layer up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Retry until the request succeeds.
    #[default]
    Forever,
    /// Give up after this many failed attempts, surfacing
    /// [`Error::RetriesExhausted`].
    Limit(NonZeroU32),
}

impl RetryPolicy {
    /// Whether another attempt is allowed after `attempts` failures.
    pub fn allows(&self, attempts: u32) -> bool {
        match self {
            RetryPolicy::Forever => true,
            RetryPolicy::Limit(max) => attempts < max.get(),
        }
    }
}

/// Raw holding-register access, as the client consumes it.
///
/// Implemented for the synchronous `tokio-modbus` context; tests
/// substitute an in-memory double.
pub trait RegisterIo {
    /// Reads `count` registers starting at `start`. One underlying
    /// Modbus transaction; chunking happens above this seam.
    fn read_registers(&mut self, start: u16, count: u16) -> Result<Vec<u16>>;

    /// Writes a single register.
    fn write_register(&mut self, address: u16, value: u16) -> Result<()>;
}

/// Helper function to map the nested tokio result to our result.
fn map_tokio_result<T>(result: tokio_modbus::Result<T>) -> Result<T> {
    match result {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(err)) => Err(err.into()), // Modbus exception
        Err(err) => Err(err.into()),     // IO error
    }
}

impl RegisterIo for tokio_modbus::client::sync::Context {
    fn read_registers(&mut self, start: u16, count: u16) -> Result<Vec<u16>> {
        use tokio_modbus::prelude::SyncReader;
        map_tokio_result(self.read_holding_registers(start, count))
    }

    fn write_register(&mut self, address: u16, value: u16) -> Result<()> {
        use tokio_modbus::prelude::SyncWriter;
        map_tokio_result(self.write_single_register(address, value))
    }
}

/// The parity used for serial communication.
pub const PARITY: &tokio_serial::Parity = &tokio_serial::Parity::None;
/// The number of stop bits used for serial communication.
pub const STOP_BITS: &tokio_serial::StopBits = &tokio_serial::StopBits::One;
/// The number of data bits used for serial communication.
pub const DATA_BITS: &tokio_serial::DataBits = &tokio_serial::DataBits::Eight;

/// Factory default baud rate of the RK6006 serial console.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Creates a `tokio_serial::SerialPortBuilder` with the device's
/// serial settings.
///
/// # Arguments
///
/// * `device` - The path to the serial port device (e.g., `/dev/ttyUSB0`).
/// * `baud_rate` - The baud rate for the serial communication.
pub fn serial_port_builder(device: &str, baud_rate: u32) -> tokio_serial::SerialPortBuilder {
    tokio_serial::new(device, baud_rate)
        .parity(*PARITY)
        .stop_bits(*STOP_BITS)
        .data_bits(*DATA_BITS)
        .flow_control(tokio_serial::FlowControl::None)
}
