//! RK6006 Power Supply CLI
//!
//! A command-line interface (CLI) application for controlling Riden
//! RK6006 bench power supplies over their Modbus RTU serial console.
//!
//! This tool allows users to:
//! - Print the full diagnostic status report (identity, temperatures,
//!   live output, setpoints, protection limits, energy counters and the
//!   ten preset memories).
//! - Read live output values, setpoints, input voltage, temperatures
//!   and energy counters individually.
//! - Program the voltage/current setpoints and the OVP/OCP limits
//!   (out-of-range values are clamped by the device contract).
//! - Switch the output, buzzer, boot-power and take-out states and set
//!   the backlight level.
//! - Run in a continuous daemon mode polling the live output.
//! - Auto-detect the supply's USB serial adapter by its VID:PID.
//!
//! The CLI leverages the `rk6006_lib` crate for protocol definitions and
//! client operations.

use anyhow::{bail, Context, Result};
use clap::Parser;
use flexi_logger::{Logger, LoggerHandle};
use log::*;
use rk6006_lib::tokio_sync_client::RK6006;
use std::{panic, time::Duration};

mod commandline;

fn logging_init(loglevel: LevelFilter) -> LoggerHandle {
    let log_handle = Logger::try_with_env_or_str(loglevel.as_str())
        .expect("Cannot init logging")
        .start()
        .expect("Cannot start logging");

    panic::set_hook(Box::new(|panic_info| {
        let (filename, line, column) = panic_info
            .location()
            .map(|loc| (loc.file(), loc.line(), loc.column()))
            .unwrap_or(("<unknown_file>", 0, 0)); // Provide defaults

        let cause_str = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            *s
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.as_str()
        } else {
            "<unknown_panic_cause>"
        };

        error!(
            target: "panic", // Optional target for filtering
            "Thread '{}' panicked at '{}': {}:{} - Cause: {}",
            std::thread::current().name().unwrap_or("<unnamed>"),
            filename,
            line,
            column,
            cause_str
        );
    }));
    log_handle
}

macro_rules! print_live_output {
    ($device:expr) => {
        let voltage = $device
            .read_output_voltage()
            .with_context(|| "Cannot read output voltage")?;
        let current = $device
            .read_output_current()
            .with_context(|| "Cannot read output current")?;
        let power = $device
            .read_output_power()
            .with_context(|| "Cannot read output power")?;
        let mode = $device
            .read_output_mode()
            .with_context(|| "Cannot read output mode")?;
        let protection = $device
            .read_protection_status()
            .with_context(|| "Cannot read protection status")?;
        println!("{voltage} {current} {power} [{mode}, protection: {protection}]");
    };
}

/// USB vendor id of the CH340 serial adapter the RK6006 ships with.
const USB_VID: u16 = 0x1A86;
/// USB product id of the CH340 serial adapter.
const USB_PID: u16 = 0x7523;

/// Scans the serial ports for the device's USB adapter and returns the
/// first matching port name.
fn detect_serial_port() -> Result<String> {
    let ports = tokio_serial::available_ports().with_context(|| "Cannot enumerate serial ports")?;
    for port in ports {
        if let tokio_serial::SerialPortType::UsbPort(usb) = &port.port_type {
            trace!(
                "Serial port {} is USB {:04X}:{:04X}",
                port.port_name,
                usb.vid,
                usb.pid
            );
            if usb.vid == USB_VID && usb.pid == USB_PID {
                info!("Detected power supply adapter at {}", port.port_name);
                return Ok(port.port_name);
            }
        }
    }
    bail!("No USB serial adapter with VID:PID {USB_VID:04X}:{USB_PID:04X} found");
}

/// Connects to the power supply selected by the command-line arguments
/// and runs the identity handshake.
fn create_client<'a>(
    connection: &'a commandline::CliConnection,
    timeout: Duration,
    retry: rk6006_lib::tokio_common::RetryPolicy,
) -> Result<(RK6006, &'a commandline::CliCommands)> {
    let (device, baud_rate, address, command) = match connection {
        commandline::CliConnection::Rtu {
            device,
            baud_rate,
            address,
            command,
        } => (device.clone(), *baud_rate, *address, command),
        commandline::CliConnection::Detect { command } => (
            detect_serial_port()?,
            rk6006_lib::tokio_common::DEFAULT_BAUD_RATE,
            1,
            command,
        ),
    };

    info!("Attempting to connect via RTU to device {device} (Address: {address}, Baud: {baud_rate})...");
    let client = RK6006::open_with_retry_policy(&device, baud_rate, address, timeout, retry)
        .with_context(|| format!("Cannot connect to power supply on {device}"))?;
    info!("Connected: {}", client.info());
    Ok((client, command))
}

fn main() -> Result<()> {
    let args = commandline::CliArgs::parse();

    // 1. Initialize logging as early as possible
    let _log_handle = logging_init(args.verbose.log_level_filter());
    info!(
        "RK6006 CLI started. Log level: {}",
        args.verbose.log_level_filter()
    );

    // 2. Connect and run the identity handshake
    let (mut client, command) = create_client(&args.connection, args.timeout, args.retry_policy())?;

    // 3. Execute the command
    match command {
        commandline::CliCommands::Daemon { poll_interval } => {
            info!("Starting daemon mode: interval={poll_interval:?}");
            loop {
                debug!("Daemon: Reading live output for stdout...");
                print_live_output!(&mut client);
                std::thread::sleep(*poll_interval);
            }
        }
        commandline::CliCommands::Status => {
            info!("Executing: Full Status");
            let status = client
                .read_status()
                .with_context(|| "Cannot read full status")?;
            println!("{status}");
        }
        commandline::CliCommands::Info => {
            info!("Executing: Device Info");
            println!("{}", client.info());
        }
        commandline::CliCommands::Memory { slot } => {
            info!("Executing: Read Preset Memory {slot}");
            let preset = client
                .read_memory_preset(*slot)
                .with_context(|| format!("Cannot read preset memory {slot}"))?;
            println!("{slot}: {preset}");
        }
        commandline::CliCommands::ReadOutput => {
            info!("Executing: Read Live Output");
            print_live_output!(&mut client);
        }
        commandline::CliCommands::ReadSetpoints => {
            info!("Executing: Read Setpoints");
            let voltage = client
                .read_set_voltage()
                .with_context(|| "Cannot read voltage setpoint")?;
            let current = client
                .read_set_current()
                .with_context(|| "Cannot read current setpoint")?;
            let ovp = client.read_ovp().with_context(|| "Cannot read OVP")?;
            let ocp = client.read_ocp().with_context(|| "Cannot read OCP")?;
            println!("Voltage : {voltage}");
            println!("Current : {current}");
            println!("OVP     : {ovp}");
            println!("OCP     : {ocp}");
        }
        commandline::CliCommands::ReadInput => {
            info!("Executing: Read Input Voltage");
            let input = client
                .read_input_voltage()
                .with_context(|| "Cannot read input voltage")?;
            println!("Input voltage   : {input}");
            println!("Max set voltage : {}", client.max_set_voltage());
        }
        commandline::CliCommands::ReadTemperatures => {
            info!("Executing: Read Temperatures");
            let internal = client
                .read_internal_temperature()
                .with_context(|| "Cannot read internal temperature")?;
            let external = client
                .read_external_temperature()
                .with_context(|| "Cannot read external temperature")?;
            println!("Internal: {internal}°C");
            println!("External: {external}°C");
        }
        commandline::CliCommands::ReadEnergy => {
            info!("Executing: Read Energy Counters");
            let charge = client
                .read_charge()
                .with_context(|| "Cannot read charge counter")?;
            let energy = client
                .read_energy()
                .with_context(|| "Cannot read energy counter")?;
            println!("Charge : {charge}");
            println!("Energy : {energy}");
        }
        commandline::CliCommands::SetVoltage { voltage } => {
            info!("Executing: Set Voltage to {voltage}");
            client
                .set_voltage(*voltage)
                .with_context(|| format!("Failed to set voltage to {voltage}"))?;
            let programmed = client
                .read_set_voltage()
                .with_context(|| "Cannot read back voltage setpoint")?;
            println!("Voltage setpoint is now {programmed} (bound {}).", client.max_set_voltage());
        }
        commandline::CliCommands::SetCurrent { current } => {
            info!("Executing: Set Current to {current}");
            client
                .set_current(*current)
                .with_context(|| format!("Failed to set current to {current}"))?;
            let programmed = client
                .read_set_current()
                .with_context(|| "Cannot read back current setpoint")?;
            println!("Current setpoint is now {programmed}.");
        }
        commandline::CliCommands::SetOvp { voltage } => {
            info!("Executing: Set OVP to {voltage}");
            client
                .set_ovp(*voltage)
                .with_context(|| format!("Failed to set OVP to {voltage}"))?;
            let programmed = client.read_ovp().with_context(|| "Cannot read back OVP")?;
            println!("OVP setpoint is now {programmed}.");
        }
        commandline::CliCommands::SetOcp { current } => {
            info!("Executing: Set OCP to {current}");
            client
                .set_ocp(*current)
                .with_context(|| format!("Failed to set OCP to {current}"))?;
            let programmed = client.read_ocp().with_context(|| "Cannot read back OCP")?;
            println!("OCP setpoint is now {programmed}.");
        }
        commandline::CliCommands::Output { state } => {
            info!("Executing: Switch Output {state:?}");
            let on = bool::from(*state);
            client
                .set_output_enabled(on)
                .with_context(|| "Failed to switch output")?;
            println!("Output {}.", if on { "enabled" } else { "disabled" });
        }
        commandline::CliCommands::SetBacklight { level } => {
            info!("Executing: Set Backlight to {level}");
            client
                .set_backlight(*level)
                .with_context(|| format!("Failed to set backlight to {level}"))?;
            let actual = client
                .read_backlight()
                .with_context(|| "Cannot read back backlight level")?;
            println!("Backlight level is now {actual}.");
        }
        commandline::CliCommands::SetBuzzer { state } => {
            info!("Executing: Switch Buzzer {state:?}");
            let on = bool::from(*state);
            client
                .set_buzzer(on)
                .with_context(|| "Failed to switch buzzer")?;
            println!("Buzzer {}.", if on { "enabled" } else { "disabled" });
        }
        commandline::CliCommands::SetBootPower { state } => {
            info!("Executing: Switch Boot Power {state:?}");
            let on = bool::from(*state);
            client
                .set_boot_power(on)
                .with_context(|| "Failed to switch boot power")?;
            println!("Boot power {}.", if on { "enabled" } else { "disabled" });
        }
        commandline::CliCommands::SetTakeOut { state } => {
            info!("Executing: Switch Take-Out {state:?}");
            let on = bool::from(*state);
            client
                .set_take_out(on)
                .with_context(|| "Failed to switch take-out")?;
            println!("Take-out {}.", if on { "enabled" } else { "disabled" });
        }
    }

    Ok(())
}
