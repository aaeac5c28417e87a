use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use rk6006_lib::protocol as proto;
use rk6006_lib::tokio_common::{self, RetryPolicy};
use std::num::NonZeroU32;
use std::time::Duration;

fn default_device_name() -> String {
    if cfg!(target_os = "windows") {
        String::from("COM1") // Common default for Windows, though may vary.
    } else {
        String::from("/dev/ttyUSB0") // Common default for USB-to-serial adapters on Linux.
    }
}

fn parse_address(s: &str) -> Result<u8, String> {
    clap_num::maybe_hex::<u8>(s).map_err(|e| format!("Invalid address format: {e}"))
}

fn parse_memory_slot(s: &str) -> Result<proto::MemorySlot, String> {
    let slot = s
        .parse::<u8>()
        .map_err(|e| format!("Invalid memory slot format: {e}"))?;
    proto::MemorySlot::try_from(slot).map_err(|e| e.to_string())
}

fn parse_volts(s: &str) -> Result<proto::Volts, String> {
    s.parse::<f64>()
        .map(proto::Volts)
        .map_err(|e| format!("Invalid voltage value format: {e}"))
}

fn parse_amps(s: &str) -> Result<proto::Amps, String> {
    s.parse::<f64>()
        .map(proto::Amps)
        .map_err(|e| format!("Invalid current value format: {e}"))
}

/// On/off argument for the switch-like registers.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq)]
pub enum SwitchState {
    On,
    Off,
}

impl From<SwitchState> for bool {
    fn from(state: SwitchState) -> bool {
        state == SwitchState::On
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum CliConnection {
    /// Connect to a power supply on a known serial port.
    Rtu {
        /// Serial port device name.
        /// Examples: "/dev/ttyUSB0" (Linux), "COM3" (Windows).
        #[arg(short, long, default_value_t = default_device_name())]
        device: String,

        /// Baud rate for serial communication.
        /// Must match the baud rate configured on the device.
        #[arg(long, default_value_t = tokio_common::DEFAULT_BAUD_RATE)]
        baud_rate: u32,

        /// The Modbus RTU device address (1 to 247, factory default 1).
        /// Can be specified in decimal or hexadecimal (e.g., "0x01").
        #[arg(short, long, default_value_t = 1, value_parser = parse_address)]
        address: u8,

        /// Commands for the connected device.
        #[command(subcommand)]
        command: CliCommands,
    },
    /// Locate the power supply automatically and connect to it.
    /// Scans the serial ports for the USB adapter the device ships with
    /// (VID:PID 1A86:7523) and uses the factory communication settings.
    #[clap(verbatim_doc_comment)]
    Detect {
        /// Commands for the detected device.
        #[command(subcommand)]
        command: CliCommands,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum CliCommands {
    /// Run in daemon mode: continuously poll the live output readings
    /// and print them to the standard output.
    #[clap(verbatim_doc_comment)]
    Daemon {
        /// Interval for polling the output (e.g., "500ms", "2s").
        #[arg(value_parser = humantime::parse_duration, short, long, default_value = "2sec")]
        poll_interval: Duration,
    },

    /// Read all registers and print the full diagnostic status report.
    Status,

    /// Print the device identity: model, serial number and firmware.
    Info,

    /// Print the stored contents of one preset memory.
    Memory {
        /// Preset memory slot, 0 to 9.
        #[arg(value_parser = parse_memory_slot)]
        slot: proto::MemorySlot,
    },

    /// Read and display the live output voltage, current and power.
    ReadOutput,

    /// Read and display the programmed setpoints: voltage, current,
    /// OVP and OCP.
    ReadSetpoints,

    /// Read and display the supply input voltage and the output-voltage
    /// bound derived from it.
    ReadInput,

    /// Read and display the internal and external temperatures.
    ReadTemperatures,

    /// Read and display the charge (Ah) and energy (Wh) counters
    /// accumulated since power-on.
    ReadEnergy,

    /// Program the output voltage.
    /// Values above the derived output-voltage bound (or below zero)
    /// are clamped, never rejected.
    #[clap(verbatim_doc_comment)]
    SetVoltage {
        /// Output voltage in volts, e.g. "5.0".
        #[arg(value_parser = parse_volts)]
        voltage: proto::Volts,
    },

    /// Program the output current limit (clamped into 0 to 6.0 A).
    SetCurrent {
        /// Current limit in amps, e.g. "1.5".
        #[arg(value_parser = parse_amps)]
        current: proto::Amps,
    },

    /// Program the over-voltage protection setpoint
    /// (clamped into 0 to the output-voltage bound + 2 V).
    #[clap(verbatim_doc_comment)]
    SetOvp {
        /// OVP setpoint in volts.
        #[arg(value_parser = parse_volts)]
        voltage: proto::Volts,
    },

    /// Program the over-current protection setpoint
    /// (clamped into 0 to 6.2 A).
    #[clap(verbatim_doc_comment)]
    SetOcp {
        /// OCP setpoint in amps.
        #[arg(value_parser = parse_amps)]
        current: proto::Amps,
    },

    /// Switch the output on or off.
    Output {
        #[arg(value_enum)]
        state: SwitchState,
    },

    /// Set the front-panel backlight level (clamped into 0 to 5).
    SetBacklight {
        /// Backlight level, 0 (off) to 5 (brightest).
        level: u8,
    },

    /// Switch the buzzer on or off.
    SetBuzzer {
        #[arg(value_enum)]
        state: SwitchState,
    },

    /// Choose whether the output comes up enabled after power-on.
    SetBootPower {
        #[arg(value_enum)]
        state: SwitchState,
    },

    /// Switch the take-out mode on or off.
    SetTakeOut {
        #[arg(value_enum)]
        state: SwitchState,
    },
}

const fn about_text() -> &'static str {
    "RK6006 power supply CLI - control a Riden RK6006 over its Modbus RTU serial console."
}

#[derive(Parser, Debug)]
#[command(name="rkpsu", author, version, about=about_text(), long_about = None, propagate_version = true)]
pub struct CliArgs {
    /// Configure verbosity of logging output.
    /// -v for info, -vv for debug, -vvv for trace. Default is off.
    #[command(flatten)]
    pub verbose: Verbosity<WarnLevel>,

    /// Specifies the connection method and device-specific commands.
    #[command(subcommand)]
    pub connection: CliConnection,

    /// Modbus response timeout for a single request.
    /// Examples: "500ms", "1s". This bounds one attempt, not the retry
    /// loop: a transiently failing request is re-issued per --max-retries.
    #[arg(global = true, long, default_value = "500ms", value_parser = humantime::parse_duration, verbatim_doc_comment)]
    pub timeout: Duration,

    /// Maximum attempts for a request that keeps timing out or coming
    /// back garbled. 0 retries forever, which matches the device's own
    /// tooling but can hang until the device answers.
    #[arg(global = true, long, default_value_t = 0, verbatim_doc_comment)]
    pub max_retries: u32,
}

impl CliArgs {
    pub fn retry_policy(&self) -> RetryPolicy {
        match NonZeroU32::new(self.max_retries) {
            Some(limit) => RetryPolicy::Limit(limit),
            None => RetryPolicy::Forever,
        }
    }
}
