//! Register map and value codecs for the RK6006 power supply.
//!
//! Everything in here is pure data conversion: register offsets, the
//! fixed-point scaling between register words and physical units, and
//! the decoded views (`DeviceInfo`, `DeviceStatus`, `MemoryPreset`).
//! No I/O happens in this module.

use std::fmt;

/// Identity code reported in register 0. Anything else is a different
/// device family and none of the offsets below can be trusted.
pub const DEVICE_TYPE: u16 = 60066;

/// Marketing name of the supported device family.
pub const MODEL: &str = "RK6006";

/// Scale factor between volts and the raw register encoding.
pub const VOLTS_RESOLUTION: f64 = 100.0;
/// Scale factor between amps and the raw register encoding.
pub const AMPS_RESOLUTION: f64 = 1000.0;
/// Scale factor between watts and the raw 32-bit power encoding.
pub const POWER_RESOLUTION: f64 = 100.0;
/// Scale factor for the accumulated charge (Ah) and energy (Wh) counters.
pub const ENERGY_RESOLUTION: f64 = 1000.0;

/// Number of holding registers covered by a full status dump.
pub const STATUS_REGISTER_COUNT: u16 = 120;
/// Largest register count the device answers reliably in one request.
pub const READ_CHUNK_LEN: u16 = 50;

/// Hard output-current ceiling for this device family.
pub const MAX_SET_CURRENT: Amps = Amps(6.0);
/// Hard over-current-protection ceiling.
pub const MAX_OCP_CURRENT: Amps = Amps(6.2);
/// The OVP setpoint may exceed the output-voltage bound by this much.
pub const OVP_HEADROOM: f64 = 2.0;
/// Highest backlight level the front panel supports.
pub const BACKLIGHT_MAX: u8 = 5;

/// Readings below this are the firmware's way of reporting a missing
/// external probe (the hardware emits -71 °C in that case).
pub const EXTERNAL_PROBE_ABSENT_BELOW: i32 = -40;

/// Holding-register offsets.
pub mod reg {
    pub const DEVICE_TYPE: u16 = 0;
    pub const SERIAL_HI: u16 = 1;
    pub const SERIAL_LO: u16 = 2;
    pub const FIRMWARE: u16 = 3;
    pub const INT_TEMP_C_SIGN: u16 = 4;
    pub const INT_TEMP_C_MAG: u16 = 5;
    pub const INT_TEMP_F_SIGN: u16 = 6;
    pub const INT_TEMP_F_MAG: u16 = 7;
    pub const VOLTAGE_SET: u16 = 8;
    pub const CURRENT_SET: u16 = 9;
    pub const VOLTAGE_OUT: u16 = 10;
    pub const CURRENT_OUT: u16 = 11;
    pub const POWER_HI: u16 = 12;
    pub const POWER_LO: u16 = 13;
    pub const VOLTAGE_IN: u16 = 14;
    pub const PROTECTION: u16 = 16;
    pub const CV_CC: u16 = 17;
    pub const OUTPUT_ENABLE: u16 = 18;
    pub const EXT_TEMP_C_SIGN: u16 = 34;
    pub const EXT_TEMP_C_MAG: u16 = 35;
    pub const EXT_TEMP_F_SIGN: u16 = 36;
    pub const EXT_TEMP_F_MAG: u16 = 37;
    pub const CHARGE_HI: u16 = 38;
    pub const CHARGE_LO: u16 = 39;
    pub const ENERGY_HI: u16 = 40;
    pub const ENERGY_LO: u16 = 41;
    pub const TAKE_OUT: u16 = 67;
    pub const BOOT_POWER: u16 = 68;
    pub const BUZZER: u16 = 69;
    pub const BACKLIGHT: u16 = 72;
    pub const MEMORY_BASE: u16 = 80;
    pub const OVP_SET: u16 = 82;
    pub const OCP_SET: u16 = 83;
}

/// Errors from decoding or validating device register data.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Register 0 did not contain [`DEVICE_TYPE`]. Nothing read from such
    /// a device can be interpreted with this register map.
    #[error("unsupported device type {found} (expected {expected})")]
    UnsupportedDeviceType { expected: u16, found: u16 },

    /// A memory slot index outside 0-9.
    #[error("memory slot {0} is out of range (0-9)")]
    MemorySlotOutOfRange(u8),

    /// The device answered with fewer registers than the decoder needs.
    #[error("register window too short: got {got} registers, expected {expected}")]
    WindowTooShort { expected: usize, got: usize },

    /// A register held a value outside its documented set.
    #[error("unexpected value {value} in register {register}")]
    UnexpectedRegisterValue { register: u16, value: u16 },
}

/// Joins a register pair holding a 32-bit quantity (`hi << 16 | lo`).
///
/// Serial number, output power and the charge/energy counters are all
/// stored this way.
pub fn combine32(hi: u16, lo: u16) -> u32 {
    (u32::from(hi) << 16) | u32::from(lo)
}

/// Output-voltage bound derived from the supply input voltage, rounded
/// to two decimals. The firmware cannot regulate closer than this to its
/// input rail.
pub fn max_set_voltage(input_voltage: Volts) -> Volts {
    Volts(((input_voltage.0 / 1.1 - 1.5) * 100.0).round() / 100.0)
}

/// A voltage in volts.
#[derive(Debug, Default, Clone, Copy, PartialEq, PartialOrd)]
pub struct Volts(pub f64);

impl Volts {
    pub fn decode(raw: u16) -> Self {
        Volts(f64::from(raw) / VOLTS_RESOLUTION)
    }

    /// Encodes for a write register, clamping into `[0, max]` first.
    /// Out-of-range requests are never an error on this device; the
    /// value is silently pinned to the nearest bound. The scaled value
    /// is truncated, not rounded, matching the firmware tooling.
    pub fn encode_clamped(self, max: Volts) -> u16 {
        let mut value = self.0;
        if value < 0.0 {
            value = 0.0;
        }
        if value > max.0 {
            value = max.0;
        }
        (value * VOLTS_RESOLUTION) as u16
    }
}

impl fmt::Display for Volts {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:.2}V", self.0)
    }
}

/// A current in amps.
#[derive(Debug, Default, Clone, Copy, PartialEq, PartialOrd)]
pub struct Amps(pub f64);

impl Amps {
    pub fn decode(raw: u16) -> Self {
        Amps(f64::from(raw) / AMPS_RESOLUTION)
    }

    /// Encodes for a write register, clamping into `[0, max]` first.
    pub fn encode_clamped(self, max: Amps) -> u16 {
        let mut value = self.0;
        if value < 0.0 {
            value = 0.0;
        }
        if value > max.0 {
            value = max.0;
        }
        (value * AMPS_RESOLUTION) as u16
    }
}

impl fmt::Display for Amps {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:.3}A", self.0)
    }
}

/// A power in watts, stored by the device as a 32-bit register pair.
#[derive(Debug, Default, Clone, Copy, PartialEq, PartialOrd)]
pub struct Watts(pub f64);

impl Watts {
    pub fn decode(hi: u16, lo: u16) -> Self {
        Watts(f64::from(combine32(hi, lo)) / POWER_RESOLUTION)
    }
}

impl fmt::Display for Watts {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:.2}W", self.0)
    }
}

/// Accumulated charge in amp-hours since power-on.
#[derive(Debug, Default, Clone, Copy, PartialEq, PartialOrd)]
pub struct AmpHours(pub f64);

impl AmpHours {
    pub fn decode(hi: u16, lo: u16) -> Self {
        AmpHours(f64::from(combine32(hi, lo)) / ENERGY_RESOLUTION)
    }
}

impl fmt::Display for AmpHours {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:.3}Ah", self.0)
    }
}

/// Accumulated energy in watt-hours since power-on.
#[derive(Debug, Default, Clone, Copy, PartialEq, PartialOrd)]
pub struct WattHours(pub f64);

impl WattHours {
    pub fn decode(hi: u16, lo: u16) -> Self {
        WattHours(f64::from(combine32(hi, lo)) / ENERGY_RESOLUTION)
    }
}

impl fmt::Display for WattHours {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:.3}Wh", self.0)
    }
}

/// A temperature reading in whole degrees.
///
/// The device stores temperatures as a sign register (nonzero means
/// negative) followed by a magnitude register; no scaling is applied.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Temperature(pub i32);

impl Temperature {
    pub fn decode(sign: u16, magnitude: u16) -> Self {
        if sign != 0 {
            Temperature(-i32::from(magnitude))
        } else {
            Temperature(i32::from(magnitude))
        }
    }

    /// Whether an external reading means "no probe connected" rather
    /// than an actual temperature. Raw getters still hand out the value
    /// as read; only the full status report substitutes a placeholder.
    pub fn probe_absent(&self) -> bool {
        self.0 < EXTERNAL_PROBE_ABSENT_BELOW
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Device serial number, assembled from two registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialNumber(pub u32);

impl SerialNumber {
    pub fn decode(hi: u16, lo: u16) -> Self {
        SerialNumber(combine32(hi, lo))
    }
}

impl fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:08}", self.0)
    }
}

/// Firmware version, stored as hundredths (126 -> V1.26).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct FirmwareVersion(pub f64);

impl FirmwareVersion {
    pub fn decode(raw: u16) -> Self {
        FirmwareVersion(f64::from(raw) / 100.0)
    }
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "V{}", self.0)
    }
}

/// Which protection, if any, tripped and shut the output down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtectionStatus {
    /// Output operating normally.
    Normal,
    /// Over-voltage protection tripped.
    OverVoltage,
    /// Over-current protection tripped.
    OverCurrent,
}

impl TryFrom<u16> for ProtectionStatus {
    type Error = Error;

    fn try_from(value: u16) -> Result<Self, Error> {
        match value {
            0 => Ok(ProtectionStatus::Normal),
            1 => Ok(ProtectionStatus::OverVoltage),
            2 => Ok(ProtectionStatus::OverCurrent),
            _ => Err(Error::UnexpectedRegisterValue {
                register: reg::PROTECTION,
                value,
            }),
        }
    }
}

impl fmt::Display for ProtectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProtectionStatus::Normal => write!(f, "OK"),
            ProtectionStatus::OverVoltage => write!(f, "OVP"),
            ProtectionStatus::OverCurrent => write!(f, "OCP"),
        }
    }
}

/// Whether the regulator is currently limiting on voltage or current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    ConstantVoltage,
    ConstantCurrent,
}

impl TryFrom<u16> for OutputMode {
    type Error = Error;

    fn try_from(value: u16) -> Result<Self, Error> {
        match value {
            0 => Ok(OutputMode::ConstantVoltage),
            1 => Ok(OutputMode::ConstantCurrent),
            _ => Err(Error::UnexpectedRegisterValue {
                register: reg::CV_CC,
                value,
            }),
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OutputMode::ConstantVoltage => write!(f, "CV"),
            OutputMode::ConstantCurrent => write!(f, "CC"),
        }
    }
}

/// One of the ten preset memories, M0 to M9.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemorySlot(u8);

impl MemorySlot {
    /// Number of preset memories the device stores.
    pub const COUNT: u8 = 10;
    /// Registers per preset: voltage, current, OVP, OCP.
    pub const QUANTITY: u16 = 4;

    /// First register of this slot's four-register block.
    pub fn base_address(&self) -> u16 {
        reg::MEMORY_BASE + u16::from(self.0) * Self::QUANTITY
    }
}

impl TryFrom<u8> for MemorySlot {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Error> {
        if value < Self::COUNT {
            Ok(MemorySlot(value))
        } else {
            Err(Error::MemorySlotOutOfRange(value))
        }
    }
}

impl std::ops::Deref for MemorySlot {
    type Target = u8;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for MemorySlot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "M{}", self.0)
    }
}

/// The stored contents of one preset memory.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct MemoryPreset {
    pub voltage: Volts,
    pub current: Amps,
    pub ovp: Volts,
    pub ocp: Amps,
}

impl MemoryPreset {
    /// Decodes the four-register block of one slot.
    pub fn decode_from_holding_registers(regs: &[u16]) -> Result<Self, Error> {
        if regs.len() < MemorySlot::QUANTITY as usize {
            return Err(Error::WindowTooShort {
                expected: MemorySlot::QUANTITY as usize,
                got: regs.len(),
            });
        }
        Ok(MemoryPreset {
            voltage: Volts::decode(regs[0]),
            current: Amps::decode(regs[1]),
            ovp: Volts::decode(regs[2]),
            ocp: Amps::decode(regs[3]),
        })
    }
}

impl fmt::Display for MemoryPreset {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}, {}, OVP: {}, OCP: {}",
            self.voltage, self.current, self.ovp, self.ocp
        )
    }
}

/// Device identity, decoded from the first register block during the
/// connection handshake.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceInfo {
    pub serial_number: SerialNumber,
    pub firmware: FirmwareVersion,
    /// Supply input voltage at the time of the read.
    pub input_voltage: Volts,
}

impl DeviceInfo {
    pub const ADDRESS: u16 = 0;
    pub const QUANTITY: u16 = 15;

    /// Decodes the handshake block, rejecting any device that does not
    /// identify as an RK6006.
    pub fn decode_from_holding_registers(regs: &[u16]) -> Result<Self, Error> {
        if regs.len() < Self::QUANTITY as usize {
            return Err(Error::WindowTooShort {
                expected: Self::QUANTITY as usize,
                got: regs.len(),
            });
        }
        if regs[reg::DEVICE_TYPE as usize] != DEVICE_TYPE {
            return Err(Error::UnsupportedDeviceType {
                expected: DEVICE_TYPE,
                found: regs[reg::DEVICE_TYPE as usize],
            });
        }
        Ok(DeviceInfo {
            serial_number: SerialNumber::decode(
                regs[reg::SERIAL_HI as usize],
                regs[reg::SERIAL_LO as usize],
            ),
            firmware: FirmwareVersion::decode(regs[reg::FIRMWARE as usize]),
            input_voltage: Volts::decode(regs[reg::VOLTAGE_IN as usize]),
        })
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Model: {}, SN:{}, FW:{}",
            MODEL, self.serial_number, self.firmware
        )
    }
}

/// A decoded full-status snapshot of the device.
///
/// The `Display` implementation renders the sectioned diagnostic report.
/// That report is the one place the external-probe sentinel is applied:
/// readings below [`EXTERNAL_PROBE_ABSENT_BELOW`] print as `--` instead
/// of the raw value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceStatus {
    pub info: DeviceInfo,
    pub internal_temp: Temperature,
    pub external_temp: Temperature,
    pub output_voltage: Volts,
    pub output_current: Amps,
    pub output_power: Watts,
    pub set_voltage: Volts,
    pub set_current: Amps,
    pub ovp: Volts,
    pub ocp: Amps,
    pub charge: AmpHours,
    pub energy: WattHours,
    pub presets: [MemoryPreset; MemorySlot::COUNT as usize],
}

impl DeviceStatus {
    pub const ADDRESS: u16 = 0;
    pub const QUANTITY: u16 = STATUS_REGISTER_COUNT;

    /// Decodes a full 120-register window. The device type is checked
    /// again here: a dump from a foreign device must never be reported.
    pub fn decode_from_holding_registers(regs: &[u16]) -> Result<Self, Error> {
        if regs.len() < Self::QUANTITY as usize {
            return Err(Error::WindowTooShort {
                expected: Self::QUANTITY as usize,
                got: regs.len(),
            });
        }
        let info = DeviceInfo::decode_from_holding_registers(regs)?;

        let mut presets = [MemoryPreset::default(); MemorySlot::COUNT as usize];
        for (slot, preset) in presets.iter_mut().enumerate() {
            let base = reg::MEMORY_BASE as usize + slot * MemorySlot::QUANTITY as usize;
            *preset = MemoryPreset::decode_from_holding_registers(
                &regs[base..base + MemorySlot::QUANTITY as usize],
            )?;
        }

        Ok(DeviceStatus {
            info,
            internal_temp: Temperature::decode(
                regs[reg::INT_TEMP_C_SIGN as usize],
                regs[reg::INT_TEMP_C_MAG as usize],
            ),
            external_temp: Temperature::decode(
                regs[reg::EXT_TEMP_C_SIGN as usize],
                regs[reg::EXT_TEMP_C_MAG as usize],
            ),
            output_voltage: Volts::decode(regs[reg::VOLTAGE_OUT as usize]),
            output_current: Amps::decode(regs[reg::CURRENT_OUT as usize]),
            output_power: Watts::decode(
                regs[reg::POWER_HI as usize],
                regs[reg::POWER_LO as usize],
            ),
            set_voltage: Volts::decode(regs[reg::VOLTAGE_SET as usize]),
            set_current: Amps::decode(regs[reg::CURRENT_SET as usize]),
            ovp: Volts::decode(regs[reg::OVP_SET as usize]),
            ocp: Amps::decode(regs[reg::OCP_SET as usize]),
            charge: AmpHours::decode(
                regs[reg::CHARGE_HI as usize],
                regs[reg::CHARGE_LO as usize],
            ),
            energy: WattHours::decode(
                regs[reg::ENERGY_HI as usize],
                regs[reg::ENERGY_LO as usize],
            ),
            presets,
        })
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "=== Device ===")?;
        writeln!(f, "Model   : {}", MODEL)?;
        writeln!(f, "SN      : {}", self.info.serial_number)?;
        writeln!(f, "FW      : {}", self.info.firmware)?;
        writeln!(f, "Input   : {}", self.info.input_voltage)?;
        writeln!(f, "Int.Temp: {}°C", self.internal_temp)?;
        if self.external_temp.probe_absent() {
            writeln!(f, "Ext.Temp: --°C")?;
        } else {
            writeln!(f, "Ext.Temp: {}°C", self.external_temp)?;
        }
        writeln!(f, "=== Output ===")?;
        writeln!(f, "Voltage : {}", self.output_voltage)?;
        writeln!(f, "Current : {}", self.output_current)?;
        writeln!(f, "Power   : {}", self.output_power)?;
        writeln!(f, "=== V&A SET ===")?;
        writeln!(f, "Voltage : {}", self.set_voltage)?;
        writeln!(f, "Current : {}", self.set_current)?;
        writeln!(f, "=== OXP SET ===")?;
        writeln!(f, "Voltage : {}", self.ovp)?;
        writeln!(f, "Current : {}", self.ocp)?;
        writeln!(f, "=== Energy ===")?;
        writeln!(f, "Charge  : {}", self.charge)?;
        writeln!(f, "Energy  : {}", self.energy)?;
        writeln!(f, "=== Memories ===")?;
        for (slot, preset) in self.presets.iter().enumerate() {
            write!(f, "M{slot}: {preset}")?;
            if slot + 1 < self.presets.len() {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn healthy_window() -> Vec<u16> {
        let mut regs = vec![0u16; STATUS_REGISTER_COUNT as usize];
        regs[reg::DEVICE_TYPE as usize] = DEVICE_TYPE;
        regs[reg::SERIAL_HI as usize] = 0x0001;
        regs[reg::SERIAL_LO as usize] = 0x86A0; // SN 100000
        regs[reg::FIRMWARE as usize] = 126;
        regs[reg::INT_TEMP_C_SIGN as usize] = 0;
        regs[reg::INT_TEMP_C_MAG as usize] = 26;
        regs[reg::VOLTAGE_SET as usize] = 500; // 5.00 V
        regs[reg::CURRENT_SET as usize] = 1500; // 1.500 A
        regs[reg::VOLTAGE_OUT as usize] = 499;
        regs[reg::CURRENT_OUT as usize] = 1498;
        regs[reg::POWER_HI as usize] = 0;
        regs[reg::POWER_LO as usize] = 748; // 7.48 W
        regs[reg::VOLTAGE_IN as usize] = 1200; // 12.00 V
        regs[reg::EXT_TEMP_C_SIGN as usize] = 1;
        regs[reg::EXT_TEMP_C_MAG as usize] = 71; // probe absent
        regs[reg::CHARGE_HI as usize] = 0;
        regs[reg::CHARGE_LO as usize] = 50; // 0.050 Ah
        regs[reg::ENERGY_HI as usize] = 0;
        regs[reg::ENERGY_LO as usize] = 600; // 0.600 Wh
        regs[reg::OVP_SET as usize] = 620; // 6.20 V
        regs[reg::OCP_SET as usize] = 1600; // 1.600 A
        // Preset 3 at 92..95.
        regs[92] = 500;
        regs[93] = 1000;
        regs[94] = 610;
        regs[95] = 1100;
        regs
    }

    #[test]
    fn combine32_order() {
        assert_eq!(combine32(0x0001, 0x86A0), 100_000);
        assert_eq!(combine32(0, 0), 0);
        assert_eq!(combine32(0xFFFF, 0xFFFF), u32::MAX);
    }

    #[test]
    fn volts_scaling() {
        assert_eq!(Volts::decode(500), Volts(5.0));
        assert_eq!(Volts::decode(941), Volts(9.41));
        // Exactly representable values survive an encode/decode trip.
        assert_eq!(
            Volts::decode(Volts(5.0).encode_clamped(Volts(30.0))),
            Volts(5.0)
        );
        assert_eq!(
            Volts::decode(Volts(2.25).encode_clamped(Volts(30.0))),
            Volts(2.25)
        );
    }

    #[test]
    fn amps_scaling() {
        assert_eq!(Amps::decode(1500), Amps(1.5));
        assert_eq!(
            Amps::decode(Amps(1.5).encode_clamped(MAX_SET_CURRENT)),
            Amps(1.5)
        );
    }

    #[test]
    fn voltage_clamps_to_bound_not_error() {
        let max = Volts(9.41);
        assert_eq!(Volts(12.0).encode_clamped(max), 941);
        assert_eq!(Volts(-3.0).encode_clamped(max), 0);
        assert_eq!(Volts(5.0).encode_clamped(max), 500);
    }

    #[test]
    fn current_clamps_to_device_ceiling() {
        assert_eq!(Amps(10.0).encode_clamped(MAX_SET_CURRENT), 6000);
        assert_eq!(Amps(-0.5).encode_clamped(MAX_SET_CURRENT), 0);
        assert_eq!(Amps(7.0).encode_clamped(MAX_OCP_CURRENT), 6200);
    }

    #[test]
    fn max_set_voltage_follows_input() {
        assert_eq!(max_set_voltage(Volts(12.0)), Volts(9.41));
        assert_eq!(max_set_voltage(Volts(60.0)), Volts(53.05));
    }

    #[test]
    fn temperature_sign_register() {
        assert_eq!(Temperature::decode(0, 26), Temperature(26));
        assert_eq!(Temperature::decode(1, 26), Temperature(-26));
        assert_eq!(Temperature::decode(5, 3), Temperature(-3));
    }

    #[test]
    fn external_probe_sentinel() {
        assert!(Temperature(-71).probe_absent());
        assert!(!Temperature(-40).probe_absent());
        assert!(!Temperature(25).probe_absent());
    }

    #[test]
    fn serial_number_display_is_zero_padded() {
        assert_eq!(SerialNumber::decode(0x0001, 0x86A0).to_string(), "00100000");
    }

    #[test]
    fn firmware_version() {
        assert_eq!(FirmwareVersion::decode(126).to_string(), "V1.26");
        assert_eq!(FirmwareVersion::decode(130).to_string(), "V1.3");
    }

    #[test]
    fn protection_status_codes() {
        assert_matches!(ProtectionStatus::try_from(0), Ok(ProtectionStatus::Normal));
        assert_matches!(
            ProtectionStatus::try_from(1),
            Ok(ProtectionStatus::OverVoltage)
        );
        assert_matches!(
            ProtectionStatus::try_from(2),
            Ok(ProtectionStatus::OverCurrent)
        );
        assert_matches!(
            ProtectionStatus::try_from(3),
            Err(Error::UnexpectedRegisterValue {
                register: reg::PROTECTION,
                value: 3
            })
        );
    }

    #[test]
    fn output_mode_codes() {
        assert_matches!(OutputMode::try_from(0), Ok(OutputMode::ConstantVoltage));
        assert_matches!(OutputMode::try_from(1), Ok(OutputMode::ConstantCurrent));
        assert_matches!(
            OutputMode::try_from(9),
            Err(Error::UnexpectedRegisterValue { .. })
        );
    }

    #[test]
    fn memory_slot_range() {
        assert_matches!(MemorySlot::try_from(0), Ok(_));
        assert_matches!(MemorySlot::try_from(9), Ok(_));
        assert_matches!(
            MemorySlot::try_from(10),
            Err(Error::MemorySlotOutOfRange(10))
        );
    }

    #[test]
    fn memory_slot_addressing() {
        assert_eq!(MemorySlot::try_from(0).unwrap().base_address(), 80);
        assert_eq!(MemorySlot::try_from(3).unwrap().base_address(), 92);
        assert_eq!(MemorySlot::try_from(9).unwrap().base_address(), 116);
    }

    #[test]
    fn memory_preset_decode() {
        let preset = MemoryPreset::decode_from_holding_registers(&[500, 1000, 610, 1100]).unwrap();
        assert_eq!(preset.voltage, Volts(5.0));
        assert_eq!(preset.current, Amps(1.0));
        assert_eq!(preset.ovp, Volts(6.1));
        assert_eq!(preset.ocp, Amps(1.1));

        assert_matches!(
            MemoryPreset::decode_from_holding_registers(&[500, 1000]),
            Err(Error::WindowTooShort {
                expected: 4,
                got: 2
            })
        );
    }

    #[test]
    fn device_info_decode() {
        let regs = healthy_window();
        let info = DeviceInfo::decode_from_holding_registers(&regs[..15]).unwrap();
        assert_eq!(info.serial_number, SerialNumber(100_000));
        assert_eq!(info.firmware, FirmwareVersion(1.26));
        assert_eq!(info.input_voltage, Volts(12.0));
        assert_eq!(info.to_string(), "Model: RK6006, SN:00100000, FW:V1.26");
    }

    #[test]
    fn device_info_rejects_foreign_device() {
        let mut regs = healthy_window();
        regs[reg::DEVICE_TYPE as usize] = 12345;
        assert_matches!(
            DeviceInfo::decode_from_holding_registers(&regs[..15]),
            Err(Error::UnsupportedDeviceType {
                expected: 60066,
                found: 12345
            })
        );
    }

    #[test]
    fn status_decode() {
        let status = DeviceStatus::decode_from_holding_registers(&healthy_window()).unwrap();
        assert_eq!(status.set_voltage, Volts(5.0));
        assert_eq!(status.set_current, Amps(1.5));
        assert_eq!(status.output_power, Watts(7.48));
        assert_eq!(status.internal_temp, Temperature(26));
        assert_eq!(status.external_temp, Temperature(-71));
        assert_eq!(status.charge, AmpHours(0.05));
        assert_eq!(status.energy, WattHours(0.6));
        assert_eq!(status.ovp, Volts(6.2));
        assert_eq!(status.ocp, Amps(1.6));
        assert_eq!(status.presets[3].voltage, Volts(5.0));
        assert_eq!(status.presets[3].ocp, Amps(1.1));
    }

    #[test]
    fn status_decode_revalidates_identity() {
        let mut regs = healthy_window();
        regs[reg::DEVICE_TYPE as usize] = 12345;
        assert_matches!(
            DeviceStatus::decode_from_holding_registers(&regs),
            Err(Error::UnsupportedDeviceType { .. })
        );
    }

    #[test]
    fn status_report_masks_absent_probe() {
        let report = DeviceStatus::decode_from_holding_registers(&healthy_window())
            .unwrap()
            .to_string();
        assert!(report.contains("Ext.Temp: --°C"));
        assert!(report.contains("Int.Temp: 26°C"));
        assert!(report.contains("M3: 5.00V, 1.000A, OVP: 6.10V, OCP: 1.100A"));

        let mut regs = healthy_window();
        regs[reg::EXT_TEMP_C_SIGN as usize] = 0;
        regs[reg::EXT_TEMP_C_MAG as usize] = 31;
        let report = DeviceStatus::decode_from_holding_registers(&regs)
            .unwrap()
            .to_string();
        assert!(report.contains("Ext.Temp: 31°C"));
    }
}
