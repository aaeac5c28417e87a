//! Synchronous client for the RK6006 power supply.
//!
//! The [`RK6006`] struct owns the Modbus session for the lifetime of the
//! connection. Construction performs an identity handshake; every
//! accessor afterwards converts between physical units and the raw
//! register encoding defined in [`crate::protocol`].
//!
//! All methods block the calling thread. With the default
//! [`RetryPolicy::Forever`] a call does not return until the device
//! answers — an unplugged device blocks the caller indefinitely.

use crate::{
    protocol::{
        self as proto, reg, AmpHours, Amps, DeviceInfo, DeviceStatus, MemoryPreset, MemorySlot,
        OutputMode, ProtectionStatus, Temperature, Volts, WattHours, Watts,
    },
    tokio_common::{Error, RegisterIo, Result, RetryPolicy},
};
use std::time::Duration;

/// Runs one Modbus request, retrying faults accepted by `retryable`
/// under the given policy. Non-transient errors surface immediately.
fn run_with_retry<T>(
    retry: RetryPolicy,
    retryable: impl Fn(&Error) -> bool,
    mut op: impl FnMut() -> Result<T>,
) -> Result<T> {
    let mut attempts = 0u32;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) if retryable(&err) => {
                attempts += 1;
                if !retry.allows(attempts) {
                    return Err(Error::RetriesExhausted {
                        attempts,
                        source: Box::new(err),
                    });
                }
            }
            Err(err) => return Err(err),
        }
    }
}

/// Reads retry on both fault kinds; a garbled frame is as recoverable
/// as a missed one.
fn read_retryable(err: &Error) -> bool {
    err.is_no_response() || err.is_invalid_response()
}

/// Writes only retry when the device stayed silent. A write answered
/// with a garbled frame may still have taken effect, so it is surfaced
/// instead of blindly repeated.
fn write_retryable(err: &Error) -> bool {
    err.is_no_response()
}

/// Reads `count` contiguous registers starting at `start`, splitting
/// into chunks of [`proto::READ_CHUNK_LEN`] and concatenating the
/// results in address order. The device cannot answer arbitrarily large
/// windows in one frame.
fn read_chunked<C: RegisterIo>(
    io: &mut C,
    retry: RetryPolicy,
    start: u16,
    count: u16,
) -> Result<Vec<u16>> {
    let mut regs = Vec::with_capacity(count as usize);
    let mut address = start;
    let mut remaining = count;
    while remaining > 0 {
        let chunk = remaining.min(proto::READ_CHUNK_LEN);
        let words = run_with_retry(retry, read_retryable, || io.read_registers(address, chunk))?;
        regs.extend_from_slice(&words);
        address += chunk;
        remaining -= chunk;
    }
    Ok(regs)
}

fn read_register<C: RegisterIo>(io: &mut C, retry: RetryPolicy, address: u16) -> Result<u16> {
    let words = run_with_retry(retry, read_retryable, || io.read_registers(address, 1))?;
    words
        .first()
        .copied()
        .ok_or(Error::Protocol(proto::Error::WindowTooShort {
            expected: 1,
            got: 0,
        }))
}

fn write_register<C: RegisterIo>(
    io: &mut C,
    retry: RetryPolicy,
    address: u16,
    value: u16,
) -> Result<()> {
    run_with_retry(retry, write_retryable, || io.write_register(address, value))
}

/// Synchronous client for one RK6006 power supply over Modbus RTU.
///
/// Created with [`RK6006::new`] (or [`RK6006::open`] to also set up the
/// serial port), which verifies that the connected device actually is an
/// RK6006 before anything else is allowed to happen.
///
/// The session must not be shared across threads without external
/// synchronization; see
/// [`SafeClient`](crate::tokio_sync_safe_client::SafeClient) for a
/// wrapped variant.
pub struct RK6006<C: RegisterIo = tokio_modbus::client::sync::Context> {
    io: C,
    retry: RetryPolicy,
    info: DeviceInfo,
    max_set_voltage: Volts,
}

impl<C: RegisterIo> RK6006<C> {
    /// Connects with the default policy of retrying transient faults
    /// forever.
    ///
    /// Reads the identity block (registers 0..15), decodes serial
    /// number, firmware and input voltage, and derives the
    /// output-voltage bound. Fails with
    /// [`proto::Error::UnsupportedDeviceType`] if register 0 is not
    /// 60066 — no operation on a foreign device can be trusted.
    pub fn new(io: C) -> Result<Self> {
        Self::with_retry_policy(io, RetryPolicy::default())
    }

    /// Connects with an explicit retry policy.
    pub fn with_retry_policy(mut io: C, retry: RetryPolicy) -> Result<Self> {
        let regs = read_chunked(&mut io, retry, DeviceInfo::ADDRESS, DeviceInfo::QUANTITY)?;
        let info = DeviceInfo::decode_from_holding_registers(&regs)?;
        let max_set_voltage = proto::max_set_voltage(info.input_voltage);
        Ok(Self {
            io,
            retry,
            info,
            max_set_voltage,
        })
    }

    /// The retry policy this client applies to transient faults.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Identity read during the handshake (model, serial number,
    /// firmware, input voltage at connect time).
    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }

    /// The current output-voltage bound, derived from the input voltage
    /// observed most recently.
    ///
    /// This is never a fixed constant: it is refreshed as a side effect
    /// of [`read_input_voltage`](Self::read_input_voltage) and may be
    /// stale if the supply rail moved since. Call
    /// [`recompute_max_set_voltage`](Self::recompute_max_set_voltage)
    /// before a voltage write that must be tight against the bound.
    pub fn max_set_voltage(&self) -> Volts {
        self.max_set_voltage
    }

    /// Re-reads the input voltage and returns the refreshed bound.
    pub fn recompute_max_set_voltage(&mut self) -> Result<Volts> {
        self.read_input_voltage()?;
        Ok(self.max_set_voltage)
    }

    /// Reads the supply input voltage and refreshes the cached
    /// output-voltage bound from it.
    pub fn read_input_voltage(&mut self) -> Result<Volts> {
        let input = Volts::decode(read_register(&mut self.io, self.retry, reg::VOLTAGE_IN)?);
        self.max_set_voltage = proto::max_set_voltage(input);
        Ok(input)
    }

    /// Reads the programmed output voltage (not the live output).
    pub fn read_set_voltage(&mut self) -> Result<Volts> {
        Ok(Volts::decode(read_register(
            &mut self.io,
            self.retry,
            reg::VOLTAGE_SET,
        )?))
    }

    /// Programs the output voltage.
    ///
    /// The request is clamped into `[0, max_set_voltage]`; out-of-range
    /// values are adjusted, never rejected.
    pub fn set_voltage(&mut self, voltage: Volts) -> Result<()> {
        let raw = voltage.encode_clamped(self.max_set_voltage);
        write_register(&mut self.io, self.retry, reg::VOLTAGE_SET, raw)
    }

    /// Reads the live output voltage (not the setpoint).
    pub fn read_output_voltage(&mut self) -> Result<Volts> {
        Ok(Volts::decode(read_register(
            &mut self.io,
            self.retry,
            reg::VOLTAGE_OUT,
        )?))
    }

    /// Reads the programmed current limit (not the live output).
    pub fn read_set_current(&mut self) -> Result<Amps> {
        Ok(Amps::decode(read_register(
            &mut self.io,
            self.retry,
            reg::CURRENT_SET,
        )?))
    }

    /// Programs the output current limit, clamped into
    /// `[0, 6.0 A]`.
    pub fn set_current(&mut self, current: Amps) -> Result<()> {
        let raw = current.encode_clamped(proto::MAX_SET_CURRENT);
        write_register(&mut self.io, self.retry, reg::CURRENT_SET, raw)
    }

    /// Reads the live output current.
    pub fn read_output_current(&mut self) -> Result<Amps> {
        Ok(Amps::decode(read_register(
            &mut self.io,
            self.retry,
            reg::CURRENT_OUT,
        )?))
    }

    /// Reads the live output power.
    pub fn read_output_power(&mut self) -> Result<Watts> {
        let hi = read_register(&mut self.io, self.retry, reg::POWER_HI)?;
        let lo = read_register(&mut self.io, self.retry, reg::POWER_LO)?;
        Ok(Watts::decode(hi, lo))
    }

    /// Reads the charge delivered since power-on.
    pub fn read_charge(&mut self) -> Result<AmpHours> {
        let hi = read_register(&mut self.io, self.retry, reg::CHARGE_HI)?;
        let lo = read_register(&mut self.io, self.retry, reg::CHARGE_LO)?;
        Ok(AmpHours::decode(hi, lo))
    }

    /// Reads the energy delivered since power-on.
    pub fn read_energy(&mut self) -> Result<WattHours> {
        let hi = read_register(&mut self.io, self.retry, reg::ENERGY_HI)?;
        let lo = read_register(&mut self.io, self.retry, reg::ENERGY_LO)?;
        Ok(WattHours::decode(hi, lo))
    }

    /// Reads the over-voltage protection setpoint.
    pub fn read_ovp(&mut self) -> Result<Volts> {
        Ok(Volts::decode(read_register(
            &mut self.io,
            self.retry,
            reg::OVP_SET,
        )?))
    }

    /// Programs the over-voltage protection setpoint, clamped into
    /// `[0, max_set_voltage + 2 V]`.
    pub fn set_ovp(&mut self, voltage: Volts) -> Result<()> {
        let bound = Volts(self.max_set_voltage.0 + proto::OVP_HEADROOM);
        let raw = voltage.encode_clamped(bound);
        write_register(&mut self.io, self.retry, reg::OVP_SET, raw)
    }

    /// Reads the over-current protection setpoint.
    pub fn read_ocp(&mut self) -> Result<Amps> {
        Ok(Amps::decode(read_register(
            &mut self.io,
            self.retry,
            reg::OCP_SET,
        )?))
    }

    /// Programs the over-current protection setpoint, clamped into
    /// `[0, 6.2 A]`.
    pub fn set_ocp(&mut self, current: Amps) -> Result<()> {
        let raw = current.encode_clamped(proto::MAX_OCP_CURRENT);
        write_register(&mut self.io, self.retry, reg::OCP_SET, raw)
    }

    fn read_temperature(&mut self, sign_reg: u16, magnitude_reg: u16) -> Result<Temperature> {
        let sign = read_register(&mut self.io, self.retry, sign_reg)?;
        let magnitude = read_register(&mut self.io, self.retry, magnitude_reg)?;
        Ok(Temperature::decode(sign, magnitude))
    }

    /// Reads the board temperature in degrees Celsius.
    pub fn read_internal_temperature(&mut self) -> Result<Temperature> {
        self.read_temperature(reg::INT_TEMP_C_SIGN, reg::INT_TEMP_C_MAG)
    }

    /// Reads the board temperature in degrees Fahrenheit.
    pub fn read_internal_temperature_fahrenheit(&mut self) -> Result<Temperature> {
        self.read_temperature(reg::INT_TEMP_F_SIGN, reg::INT_TEMP_F_MAG)
    }

    /// Reads the external probe temperature in degrees Celsius.
    ///
    /// With no probe connected the hardware reports -71; the value is
    /// returned as-is here. Only the [`read_status`](Self::read_status)
    /// report substitutes a placeholder for it.
    pub fn read_external_temperature(&mut self) -> Result<Temperature> {
        self.read_temperature(reg::EXT_TEMP_C_SIGN, reg::EXT_TEMP_C_MAG)
    }

    /// Reads the external probe temperature in degrees Fahrenheit.
    pub fn read_external_temperature_fahrenheit(&mut self) -> Result<Temperature> {
        self.read_temperature(reg::EXT_TEMP_F_SIGN, reg::EXT_TEMP_F_MAG)
    }

    /// Reads which protection, if any, tripped the output.
    pub fn read_protection_status(&mut self) -> Result<ProtectionStatus> {
        let raw = read_register(&mut self.io, self.retry, reg::PROTECTION)?;
        Ok(ProtectionStatus::try_from(raw)?)
    }

    /// Reads whether the regulator is in constant-voltage or
    /// constant-current mode.
    pub fn read_output_mode(&mut self) -> Result<OutputMode> {
        let raw = read_register(&mut self.io, self.retry, reg::CV_CC)?;
        Ok(OutputMode::try_from(raw)?)
    }

    fn read_switch(&mut self, address: u16) -> Result<bool> {
        Ok(read_register(&mut self.io, self.retry, address)? != 0)
    }

    fn write_switch(&mut self, address: u16, on: bool) -> Result<()> {
        write_register(&mut self.io, self.retry, address, u16::from(on))
    }

    /// Reads whether the output is enabled.
    pub fn read_output_enabled(&mut self) -> Result<bool> {
        self.read_switch(reg::OUTPUT_ENABLE)
    }

    /// Enables or disables the output.
    pub fn set_output_enabled(&mut self, on: bool) -> Result<()> {
        self.write_switch(reg::OUTPUT_ENABLE, on)
    }

    /// Reads the take-out state.
    pub fn read_take_out(&mut self) -> Result<bool> {
        self.read_switch(reg::TAKE_OUT)
    }

    /// Sets the take-out state.
    pub fn set_take_out(&mut self, on: bool) -> Result<()> {
        self.write_switch(reg::TAKE_OUT, on)
    }

    /// Reads whether the output powers up enabled after boot.
    pub fn read_boot_power(&mut self) -> Result<bool> {
        self.read_switch(reg::BOOT_POWER)
    }

    /// Sets whether the output powers up enabled after boot.
    pub fn set_boot_power(&mut self, on: bool) -> Result<()> {
        self.write_switch(reg::BOOT_POWER, on)
    }

    /// Reads the buzzer state.
    pub fn read_buzzer(&mut self) -> Result<bool> {
        self.read_switch(reg::BUZZER)
    }

    /// Enables or disables the buzzer.
    pub fn set_buzzer(&mut self, on: bool) -> Result<()> {
        self.write_switch(reg::BUZZER, on)
    }

    /// Reads the backlight level (0-5).
    pub fn read_backlight(&mut self) -> Result<u8> {
        Ok(read_register(&mut self.io, self.retry, reg::BACKLIGHT)? as u8)
    }

    /// Sets the backlight level, clamped to 0-5.
    pub fn set_backlight(&mut self, level: u8) -> Result<()> {
        let level = level.min(proto::BACKLIGHT_MAX);
        write_register(&mut self.io, self.retry, reg::BACKLIGHT, u16::from(level))
    }

    /// Reads one preset memory (voltage, current, OVP, OCP).
    pub fn read_memory_preset(&mut self, slot: MemorySlot) -> Result<MemoryPreset> {
        let regs = read_chunked(
            &mut self.io,
            self.retry,
            slot.base_address(),
            MemorySlot::QUANTITY,
        )?;
        Ok(MemoryPreset::decode_from_holding_registers(&regs)?)
    }

    /// Reads the full 120-register window and decodes it into a
    /// [`DeviceStatus`] snapshot.
    ///
    /// The device type is re-validated; a mismatch aborts with
    /// [`proto::Error::UnsupportedDeviceType`]. Apart from the bus
    /// traffic this is side-effect free.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use rk6006_lib::tokio_sync_client::RK6006;
    /// # use std::time::Duration;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut psu = RK6006::open("/dev/ttyUSB0", 115_200, 1, Duration::from_millis(500))?;
    /// println!("{}", psu.read_status()?);
    /// # Ok(())
    /// # }
    /// ```
    pub fn read_status(&mut self) -> Result<DeviceStatus> {
        let regs = read_chunked(
            &mut self.io,
            self.retry,
            DeviceStatus::ADDRESS,
            DeviceStatus::QUANTITY,
        )?;
        Ok(DeviceStatus::decode_from_holding_registers(&regs)?)
    }
}

impl RK6006 {
    /// Opens the serial port, connects the Modbus slave and performs the
    /// identity handshake in one step.
    ///
    /// # Arguments
    ///
    /// * `device` - Serial port path, e.g. `/dev/ttyUSB0`.
    /// * `baud_rate` - Typically [`crate::tokio_common::DEFAULT_BAUD_RATE`].
    /// * `address` - Modbus slave address, factory default 1.
    /// * `timeout` - Response timeout handed to the transport. This is
    ///   the timeout a single request waits before the retry loop kicks
    ///   in; it does not bound the retry loop itself.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use rk6006_lib::tokio_sync_client::RK6006;
    /// use std::time::Duration;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut psu = RK6006::open("/dev/ttyUSB0", 115_200, 1, Duration::from_millis(500))?;
    /// println!("{}", psu.info());
    /// # Ok(())
    /// # }
    /// ```
    pub fn open(device: &str, baud_rate: u32, address: u8, timeout: Duration) -> Result<Self> {
        Self::open_with_retry_policy(device, baud_rate, address, timeout, RetryPolicy::default())
    }

    /// [`RK6006::open`] with an explicit retry policy.
    pub fn open_with_retry_policy(
        device: &str,
        baud_rate: u32,
        address: u8,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let builder = crate::tokio_common::serial_port_builder(device, baud_rate);
        let mut ctx = tokio_modbus::client::sync::rtu::connect_slave(
            &builder,
            tokio_modbus::Slave(address),
        )
        .map_err(tokio_modbus::Error::from)?;
        ctx.set_timeout(timeout);
        Self::with_retry_policy(ctx, retry)
    }

    /// Sets the timeout for Modbus communication.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.io.set_timeout(timeout);
    }

    /// Retrieves the current Modbus communication timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.io.timeout()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_device::MockDevice;
    use assert_matches::assert_matches;
    use std::num::NonZeroU32;

    #[test]
    fn handshake_reads_identity_block() {
        let mock = MockDevice::new();
        let psu = RK6006::new(mock).unwrap();
        assert_eq!(psu.info().serial_number.0, 100_000);
        assert_eq!(psu.info().firmware.0, 1.26);
        assert_eq!(psu.info().input_voltage, Volts(12.0));
        // 12.0 V in -> round(12.0 / 1.1 - 1.5, 2)
        assert_eq!(psu.max_set_voltage(), Volts(9.41));
    }

    #[test]
    fn handshake_rejects_foreign_device() {
        let mock = MockDevice::new().with_device_type(12345);
        let err = RK6006::new(mock).unwrap_err();
        assert_matches!(
            err,
            Error::Protocol(proto::Error::UnsupportedDeviceType {
                expected: 60066,
                found: 12345
            })
        );
    }

    #[test]
    fn chunked_read_splits_at_fifty() {
        let mut mock = MockDevice::new();
        mock.fill_with_addresses();
        let regs = read_chunked(&mut mock, RetryPolicy::Forever, 0, 70).unwrap();
        assert_eq!(mock.reads, vec![(0, 50), (50, 20)]);
        assert_eq!(regs.len(), 70);
        // Concatenated in address order.
        let expected: Vec<u16> = (0..70).collect();
        assert_eq!(regs, expected);
    }

    #[test]
    fn short_read_stays_a_single_request() {
        let mut mock = MockDevice::new();
        read_chunked(&mut mock, RetryPolicy::Forever, 0, 15).unwrap();
        assert_eq!(mock.reads, vec![(0, 15)]);
    }

    #[test]
    fn full_status_uses_three_chunks() {
        let mock = MockDevice::new();
        let mut psu = RK6006::new(mock).unwrap();
        let status = psu.read_status().unwrap();
        assert_eq!(status.set_voltage, Volts(5.0));
        assert_eq!(
            psu.io.reads,
            vec![(0, 15), (0, 50), (50, 50), (100, 20)]
        );
    }

    #[test]
    fn transient_read_fault_is_retried_until_success() {
        let mut mock = MockDevice::new();
        mock.push_no_response();
        mock.push_invalid_response();
        let mut psu = RK6006::new(mock).unwrap();
        // The two faults were consumed by the handshake retries.
        assert_eq!(psu.io.reads.len(), 3);

        mock_set_voltage_register(&mut psu, 750);
        psu.io.push_no_response();
        assert_eq!(psu.read_set_voltage().unwrap(), Volts(7.5));
    }

    #[test]
    fn bounded_retry_surfaces_exhaustion() {
        let mut mock = MockDevice::new();
        mock.push_no_response();
        mock.push_no_response();
        mock.push_no_response();
        let err = RK6006::with_retry_policy(mock, RetryPolicy::Limit(NonZeroU32::new(2).unwrap()))
            .unwrap_err();
        assert_matches!(err, Error::RetriesExhausted { attempts: 2, .. });
    }

    #[test]
    fn write_retries_on_no_response_only() {
        let mock = MockDevice::new();
        let mut psu = RK6006::new(mock).unwrap();

        psu.io.push_no_response();
        psu.set_buzzer(true).unwrap();
        // First attempt timed out, second landed.
        assert_eq!(psu.io.writes, vec![(reg::BUZZER, 1), (reg::BUZZER, 1)]);

        psu.io.writes.clear();
        psu.io.push_invalid_response();
        let err = psu.set_buzzer(false).unwrap_err();
        assert!(err.is_invalid_response());
        assert_eq!(psu.io.writes, vec![(reg::BUZZER, 0)]);
    }

    #[test]
    fn voltage_writes_are_clamped_to_derived_bound() {
        let mock = MockDevice::new();
        let mut psu = RK6006::new(mock).unwrap();

        psu.set_voltage(Volts(12.0)).unwrap();
        psu.set_voltage(Volts(-1.0)).unwrap();
        psu.set_voltage(Volts(5.0)).unwrap();
        assert_eq!(
            psu.io.writes,
            vec![
                (reg::VOLTAGE_SET, 941), // clamped to the 9.41 V bound
                (reg::VOLTAGE_SET, 0),
                (reg::VOLTAGE_SET, 500),
            ]
        );
    }

    #[test]
    fn current_and_protection_writes_are_clamped() {
        let mock = MockDevice::new();
        let mut psu = RK6006::new(mock).unwrap();

        psu.set_current(Amps(10.0)).unwrap();
        psu.set_ocp(Amps(10.0)).unwrap();
        psu.set_ovp(Volts(50.0)).unwrap();
        assert_eq!(
            psu.io.writes,
            vec![
                (reg::CURRENT_SET, 6000), // 6.0 A ceiling
                (reg::OCP_SET, 6200),     // 6.2 A ceiling
                (reg::OVP_SET, 1141),     // 9.41 V + 2 V headroom
            ]
        );
    }

    #[test]
    fn backlight_clamps_to_panel_range() {
        let mock = MockDevice::new();
        let mut psu = RK6006::new(mock).unwrap();
        psu.set_backlight(7).unwrap();
        psu.set_backlight(3).unwrap();
        assert_eq!(
            psu.io.writes,
            vec![(reg::BACKLIGHT, 5), (reg::BACKLIGHT, 3)]
        );
    }

    #[test]
    fn input_voltage_read_refreshes_bound() {
        let mock = MockDevice::new();
        let mut psu = RK6006::new(mock).unwrap();
        assert_eq!(psu.max_set_voltage(), Volts(9.41));

        psu.io.set(reg::VOLTAGE_IN, 2500); // 25.00 V
        assert_eq!(psu.read_input_voltage().unwrap(), Volts(25.0));
        assert_eq!(psu.max_set_voltage(), Volts(21.23));

        psu.io.set(reg::VOLTAGE_IN, 1200);
        assert_eq!(psu.recompute_max_set_voltage().unwrap(), Volts(9.41));
    }

    #[test]
    fn preset_slot_addressing_hits_the_wire() {
        let mock = MockDevice::new();
        let mut psu = RK6006::new(mock).unwrap();
        let slot = MemorySlot::try_from(3).unwrap();
        let preset = psu.read_memory_preset(slot).unwrap();
        assert_eq!(psu.io.reads.last(), Some(&(92, 4)));
        assert_eq!(preset.voltage, Volts(5.0));
        assert_eq!(preset.current, Amps(1.0));
        assert_eq!(preset.ovp, Volts(6.1));
        assert_eq!(preset.ocp, Amps(1.1));
    }

    #[test]
    fn switch_and_mode_reads() {
        let mock = MockDevice::new();
        let mut psu = RK6006::new(mock).unwrap();
        assert!(psu.read_output_enabled().unwrap());
        assert!(!psu.read_take_out().unwrap());
        assert_eq!(
            psu.read_protection_status().unwrap(),
            ProtectionStatus::Normal
        );
        assert_eq!(psu.read_output_mode().unwrap(), OutputMode::ConstantVoltage);
        assert_eq!(psu.read_backlight().unwrap(), 4);
    }

    #[test]
    fn temperatures_use_sign_registers() {
        let mock = MockDevice::new();
        let mut psu = RK6006::new(mock).unwrap();
        assert_eq!(psu.read_internal_temperature().unwrap(), Temperature(26));
        // External probe missing: raw getter reports the sentinel as-is.
        assert_eq!(psu.read_external_temperature().unwrap(), Temperature(-71));
    }

    #[test]
    fn power_and_energy_counters_combine_register_pairs() {
        let mock = MockDevice::new();
        let mut psu = RK6006::new(mock).unwrap();
        assert_eq!(psu.read_output_power().unwrap(), Watts(7.48));
        assert_eq!(psu.read_charge().unwrap(), AmpHours(0.05));
        assert_eq!(psu.read_energy().unwrap(), WattHours(0.6));

        // A value spilling into the high word.
        psu.io.set(reg::POWER_HI, 1);
        psu.io.set(reg::POWER_LO, 0);
        assert_eq!(psu.read_output_power().unwrap(), Watts(655.36));
    }

    fn mock_set_voltage_register(psu: &mut RK6006<MockDevice>, raw: u16) {
        psu.io.set(reg::VOLTAGE_SET, raw);
    }
}
