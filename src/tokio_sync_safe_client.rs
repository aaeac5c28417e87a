//! Thread-safe wrapper around the synchronous RK6006 client.
//!
//! The plain [`RK6006`](crate::tokio_sync_client::RK6006) client owns
//! the Modbus session exclusively and must not be shared across threads.
//! `SafeClient` puts that client behind an `Arc<Mutex<_>>` so several
//! owners can take turns on the bus. Every method locks for the duration
//! of one device operation; with the default retry-forever policy a
//! wedged device therefore blocks all owners.
//!
//! ## Example
//!
//! ```no_run
//! use rk6006_lib::tokio_sync_safe_client::SafeClient;
//! use std::time::Duration;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = SafeClient::open("/dev/ttyUSB0", 115_200, 1, Duration::from_millis(500))?;
//!     let status = client.read_status()?;
//!     println!("{status}");
//!     Ok(())
//! }
//! ```

use crate::{
    protocol::{
        AmpHours, Amps, DeviceInfo, DeviceStatus, MemoryPreset, MemorySlot, OutputMode,
        ProtectionStatus, Temperature, Volts, WattHours, Watts,
    },
    tokio_common::{RegisterIo, Result, RetryPolicy},
    tokio_sync_client::RK6006,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A cloneable, thread-safe handle to one RK6006.
pub struct SafeClient<C: RegisterIo = tokio_modbus::client::sync::Context> {
    inner: Arc<Mutex<RK6006<C>>>,
}

impl<C: RegisterIo> Clone for SafeClient<C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<C: RegisterIo> SafeClient<C> {
    /// Performs the identity handshake and wraps the resulting client.
    pub fn new(io: C) -> Result<Self> {
        Ok(Self::from_client(RK6006::new(io)?))
    }

    /// Wraps an already-connected client.
    pub fn from_client(client: RK6006<C>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(client)),
        }
    }

    /// Creates another handle from a shared client.
    pub fn from_shared(inner: Arc<Mutex<RK6006<C>>>) -> Self {
        Self { inner }
    }

    /// Clones the shared client.
    pub fn clone_shared(&self) -> Arc<Mutex<RK6006<C>>> {
        self.inner.clone()
    }

    /// Identity read during the handshake.
    pub fn info(&self) -> DeviceInfo {
        *self.inner.lock().unwrap().info()
    }

    /// The cached output-voltage bound.
    pub fn max_set_voltage(&self) -> Volts {
        self.inner.lock().unwrap().max_set_voltage()
    }

    /// Re-reads the input voltage and returns the refreshed bound.
    pub fn recompute_max_set_voltage(&mut self) -> Result<Volts> {
        self.inner.lock().unwrap().recompute_max_set_voltage()
    }

    /// Reads the supply input voltage, refreshing the cached bound.
    pub fn read_input_voltage(&mut self) -> Result<Volts> {
        self.inner.lock().unwrap().read_input_voltage()
    }

    /// Reads the programmed output voltage.
    pub fn read_set_voltage(&mut self) -> Result<Volts> {
        self.inner.lock().unwrap().read_set_voltage()
    }

    /// Programs the output voltage (clamped).
    pub fn set_voltage(&mut self, voltage: Volts) -> Result<()> {
        self.inner.lock().unwrap().set_voltage(voltage)
    }

    /// Reads the live output voltage.
    pub fn read_output_voltage(&mut self) -> Result<Volts> {
        self.inner.lock().unwrap().read_output_voltage()
    }

    /// Reads the programmed current limit.
    pub fn read_set_current(&mut self) -> Result<Amps> {
        self.inner.lock().unwrap().read_set_current()
    }

    /// Programs the output current limit (clamped).
    pub fn set_current(&mut self, current: Amps) -> Result<()> {
        self.inner.lock().unwrap().set_current(current)
    }

    /// Reads the live output current.
    pub fn read_output_current(&mut self) -> Result<Amps> {
        self.inner.lock().unwrap().read_output_current()
    }

    /// Reads the live output power.
    pub fn read_output_power(&mut self) -> Result<Watts> {
        self.inner.lock().unwrap().read_output_power()
    }

    /// Reads the charge delivered since power-on.
    pub fn read_charge(&mut self) -> Result<AmpHours> {
        self.inner.lock().unwrap().read_charge()
    }

    /// Reads the energy delivered since power-on.
    pub fn read_energy(&mut self) -> Result<WattHours> {
        self.inner.lock().unwrap().read_energy()
    }

    /// Reads the over-voltage protection setpoint.
    pub fn read_ovp(&mut self) -> Result<Volts> {
        self.inner.lock().unwrap().read_ovp()
    }

    /// Programs the over-voltage protection setpoint (clamped).
    pub fn set_ovp(&mut self, voltage: Volts) -> Result<()> {
        self.inner.lock().unwrap().set_ovp(voltage)
    }

    /// Reads the over-current protection setpoint.
    pub fn read_ocp(&mut self) -> Result<Amps> {
        self.inner.lock().unwrap().read_ocp()
    }

    /// Programs the over-current protection setpoint (clamped).
    pub fn set_ocp(&mut self, current: Amps) -> Result<()> {
        self.inner.lock().unwrap().set_ocp(current)
    }

    /// Reads the board temperature in degrees Celsius.
    pub fn read_internal_temperature(&mut self) -> Result<Temperature> {
        self.inner.lock().unwrap().read_internal_temperature()
    }

    /// Reads the board temperature in degrees Fahrenheit.
    pub fn read_internal_temperature_fahrenheit(&mut self) -> Result<Temperature> {
        self.inner
            .lock()
            .unwrap()
            .read_internal_temperature_fahrenheit()
    }

    /// Reads the external probe temperature in degrees Celsius.
    pub fn read_external_temperature(&mut self) -> Result<Temperature> {
        self.inner.lock().unwrap().read_external_temperature()
    }

    /// Reads the external probe temperature in degrees Fahrenheit.
    pub fn read_external_temperature_fahrenheit(&mut self) -> Result<Temperature> {
        self.inner
            .lock()
            .unwrap()
            .read_external_temperature_fahrenheit()
    }

    /// Reads which protection, if any, tripped the output.
    pub fn read_protection_status(&mut self) -> Result<ProtectionStatus> {
        self.inner.lock().unwrap().read_protection_status()
    }

    /// Reads the regulator mode (CV or CC).
    pub fn read_output_mode(&mut self) -> Result<OutputMode> {
        self.inner.lock().unwrap().read_output_mode()
    }

    /// Reads whether the output is enabled.
    pub fn read_output_enabled(&mut self) -> Result<bool> {
        self.inner.lock().unwrap().read_output_enabled()
    }

    /// Enables or disables the output.
    pub fn set_output_enabled(&mut self, on: bool) -> Result<()> {
        self.inner.lock().unwrap().set_output_enabled(on)
    }

    /// Reads the take-out state.
    pub fn read_take_out(&mut self) -> Result<bool> {
        self.inner.lock().unwrap().read_take_out()
    }

    /// Sets the take-out state.
    pub fn set_take_out(&mut self, on: bool) -> Result<()> {
        self.inner.lock().unwrap().set_take_out(on)
    }

    /// Reads whether the output powers up enabled after boot.
    pub fn read_boot_power(&mut self) -> Result<bool> {
        self.inner.lock().unwrap().read_boot_power()
    }

    /// Sets whether the output powers up enabled after boot.
    pub fn set_boot_power(&mut self, on: bool) -> Result<()> {
        self.inner.lock().unwrap().set_boot_power(on)
    }

    /// Reads the buzzer state.
    pub fn read_buzzer(&mut self) -> Result<bool> {
        self.inner.lock().unwrap().read_buzzer()
    }

    /// Enables or disables the buzzer.
    pub fn set_buzzer(&mut self, on: bool) -> Result<()> {
        self.inner.lock().unwrap().set_buzzer(on)
    }

    /// Reads the backlight level (0-5).
    pub fn read_backlight(&mut self) -> Result<u8> {
        self.inner.lock().unwrap().read_backlight()
    }

    /// Sets the backlight level, clamped to 0-5.
    pub fn set_backlight(&mut self, level: u8) -> Result<()> {
        self.inner.lock().unwrap().set_backlight(level)
    }

    /// Reads one preset memory.
    pub fn read_memory_preset(&mut self, slot: MemorySlot) -> Result<MemoryPreset> {
        self.inner.lock().unwrap().read_memory_preset(slot)
    }

    /// Reads and decodes the full status window.
    pub fn read_status(&mut self) -> Result<DeviceStatus> {
        self.inner.lock().unwrap().read_status()
    }
}

impl SafeClient {
    /// Opens the serial port, connects and wraps the client in one step.
    pub fn open(device: &str, baud_rate: u32, address: u8, timeout: Duration) -> Result<Self> {
        Ok(Self::from_client(RK6006::open(
            device, baud_rate, address, timeout,
        )?))
    }

    /// [`SafeClient::open`] with an explicit retry policy.
    pub fn open_with_retry_policy(
        device: &str,
        baud_rate: u32,
        address: u8,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self> {
        Ok(Self::from_client(RK6006::open_with_retry_policy(
            device, baud_rate, address, timeout, retry,
        )?))
    }
}
