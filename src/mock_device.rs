//! An in-memory stand-in for a healthy RK6006 used by the client tests.
//!
//! Serves reads from a 120-word register image, applies writes to it,
//! records every request, and can be primed with transport faults that
//! are consumed one per call before the image is touched.

use crate::protocol::{self as proto, reg};
use crate::tokio_common::{Error, RegisterIo, Result};
use std::collections::VecDeque;

pub(crate) struct MockDevice {
    regs: Vec<u16>,
    faults: VecDeque<Error>,
    /// Every read request issued, as (start, count).
    pub reads: Vec<(u16, u16)>,
    /// Every write request issued, as (address, value).
    pub writes: Vec<(u16, u16)>,
}

impl MockDevice {
    /// A plausible powered-on device: 12 V input, 5 V / 1.5 A
    /// programmed, output on, external probe missing.
    pub fn new() -> Self {
        let mut regs = vec![0u16; proto::STATUS_REGISTER_COUNT as usize];
        regs[reg::DEVICE_TYPE as usize] = proto::DEVICE_TYPE;
        regs[reg::SERIAL_HI as usize] = 0x0001;
        regs[reg::SERIAL_LO as usize] = 0x86A0; // SN 100000
        regs[reg::FIRMWARE as usize] = 126;
        regs[reg::INT_TEMP_C_SIGN as usize] = 0;
        regs[reg::INT_TEMP_C_MAG as usize] = 26;
        regs[reg::INT_TEMP_F_SIGN as usize] = 0;
        regs[reg::INT_TEMP_F_MAG as usize] = 78;
        regs[reg::VOLTAGE_SET as usize] = 500;
        regs[reg::CURRENT_SET as usize] = 1500;
        regs[reg::VOLTAGE_OUT as usize] = 499;
        regs[reg::CURRENT_OUT as usize] = 1498;
        regs[reg::POWER_HI as usize] = 0;
        regs[reg::POWER_LO as usize] = 748;
        regs[reg::VOLTAGE_IN as usize] = 1200;
        regs[reg::PROTECTION as usize] = 0;
        regs[reg::CV_CC as usize] = 0;
        regs[reg::OUTPUT_ENABLE as usize] = 1;
        regs[reg::EXT_TEMP_C_SIGN as usize] = 1;
        regs[reg::EXT_TEMP_C_MAG as usize] = 71;
        regs[reg::EXT_TEMP_F_SIGN as usize] = 1;
        regs[reg::EXT_TEMP_F_MAG as usize] = 96;
        regs[reg::CHARGE_HI as usize] = 0;
        regs[reg::CHARGE_LO as usize] = 50;
        regs[reg::ENERGY_HI as usize] = 0;
        regs[reg::ENERGY_LO as usize] = 600;
        regs[reg::BUZZER as usize] = 1;
        regs[reg::BACKLIGHT as usize] = 4;
        regs[reg::OVP_SET as usize] = 620;
        regs[reg::OCP_SET as usize] = 1600;
        // Preset M3.
        regs[92] = 500;
        regs[93] = 1000;
        regs[94] = 610;
        regs[95] = 1100;
        Self {
            regs,
            faults: VecDeque::new(),
            reads: Vec::new(),
            writes: Vec::new(),
        }
    }

    /// Same image, but identifying as a different device family.
    pub fn with_device_type(mut self, device_type: u16) -> Self {
        self.regs[reg::DEVICE_TYPE as usize] = device_type;
        self
    }

    /// Overwrites every register with its own address, which makes
    /// chunk-concatenation order visible in the returned data.
    pub fn fill_with_addresses(&mut self) {
        for (address, value) in self.regs.iter_mut().enumerate() {
            *value = address as u16;
        }
    }

    pub fn set(&mut self, address: u16, value: u16) {
        self.regs[address as usize] = value;
    }

    /// Primes the next request to time out.
    pub fn push_no_response(&mut self) {
        self.faults.push_back(Error::Modbus(tokio_modbus::Error::from(
            std::io::Error::new(std::io::ErrorKind::TimedOut, "no response"),
        )));
    }

    /// Primes the next request to come back garbled.
    pub fn push_invalid_response(&mut self) {
        self.faults.push_back(Error::Modbus(tokio_modbus::Error::from(
            std::io::Error::new(std::io::ErrorKind::InvalidData, "invalid response"),
        )));
    }
}

impl RegisterIo for MockDevice {
    fn read_registers(&mut self, start: u16, count: u16) -> Result<Vec<u16>> {
        self.reads.push((start, count));
        if let Some(fault) = self.faults.pop_front() {
            return Err(fault);
        }
        let start = start as usize;
        let end = start + count as usize;
        Ok(self.regs[start..end].to_vec())
    }

    fn write_register(&mut self, address: u16, value: u16) -> Result<()> {
        self.writes.push((address, value));
        if let Some(fault) = self.faults.pop_front() {
            return Err(fault);
        }
        self.regs[address as usize] = value;
        Ok(())
    }
}
