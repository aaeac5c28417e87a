//! A library for controlling the Riden RK6006 bench power supply via
//! Modbus RTU.
//!
//! The crate is split into:
//!
//! 1.  [`protocol`] — the register map and pure value codecs, usable
//!     without any transport.
//! 2.  [`tokio_sync_client::RK6006`] — a blocking client owning one
//!     `tokio-modbus` serial session: identity handshake, typed
//!     getters/setters, chunked full-status dump.
//! 3.  [`tokio_sync_safe_client::SafeClient`] — the same client behind
//!     an `Arc<Mutex<_>>` for use from several owners.
//!
//! ## Blocking semantics
//!
//! The device occasionally drops or garbles requests on its serial
//! console. The client's default
//! [`RetryPolicy::Forever`](tokio_common::RetryPolicy) repeats a faulted
//! request until it succeeds, so any call can block indefinitely while
//! the device is unreachable. Pick
//! [`RetryPolicy::Limit`](tokio_common::RetryPolicy) for bounded
//! behavior.
//!
//! ## Quick Start
//!
//! ```no_run
//! use rk6006_lib::tokio_sync_client::RK6006;
//! use rk6006_lib::protocol::Volts;
//! use std::time::Duration;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut psu = RK6006::open("/dev/ttyUSB0", 115_200, 1, Duration::from_millis(500))?;
//!     println!("{}", psu.info());
//!
//!     psu.set_voltage(Volts(5.0))?;
//!     psu.set_output_enabled(true)?;
//!     println!("live output: {}", psu.read_output_voltage()?);
//!
//!     Ok(())
//! }
//! ```

pub mod protocol;

#[cfg_attr(docsrs, doc(cfg(feature = "tokio-rtu-sync")))]
#[cfg(feature = "tokio-rtu-sync")]
pub mod tokio_common;

#[cfg_attr(docsrs, doc(cfg(feature = "tokio-rtu-sync")))]
#[cfg(feature = "tokio-rtu-sync")]
pub mod tokio_sync_client;

#[cfg_attr(
    docsrs,
    doc(cfg(all(feature = "tokio-rtu-sync", feature = "safe-client-sync")))
)]
#[cfg(all(feature = "tokio-rtu-sync", feature = "safe-client-sync"))]
pub mod tokio_sync_safe_client;

#[cfg(all(test, feature = "tokio-rtu-sync"))]
mod mock_device;
