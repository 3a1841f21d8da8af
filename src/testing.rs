//! Register file simulation of the sensor for pipeline tests
extern crate std;

use std::collections::VecDeque;
use std::vec::Vec;

use crate::fifo::Record;
use crate::interface::{BusSpeed, BusType, CheckedRegisters, Device};
use crate::registers::{
    FIFO_COUNTH, FIFO_R_W, PWR_MGMT_1, TEMP_OUT_H, USER_CTRL, WHOAMI, WHOAMI_MPU9250,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SimError;

/// Bus traffic as seen by the chip, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Op {
    Read(u8),
    Write(u8, u8),
    FifoRead(usize),
}

pub(crate) struct SimDevice {
    regs: [u8; 256],
    fifo: VecDeque<u8>,
    checked: CheckedRegisters,
    pub bus: BusType,
    pub ops: Vec<Op>,
    pub writes: Vec<(u8, u8)>,
    pub speeds: Vec<BusSpeed>,
    pub busy: bool,
    pub locks: usize,
    pub unlocks: usize,
    pub fail_reads: bool,
    pub fail_writes: bool,
    pub fail_fifo_reads: bool,
    /// PWR_MGMT_1 keeps the sleep bit set after every write
    pub stuck_asleep: bool,
    pub device_resets: usize,
    pub fifo_flushes: usize,
}

impl SimDevice {
    pub fn new() -> Self {
        let mut regs = [0u8; 256];
        regs[WHOAMI as usize] = WHOAMI_MPU9250;
        regs[PWR_MGMT_1 as usize] = 0x40;
        SimDevice {
            regs,
            fifo: VecDeque::new(),
            checked: CheckedRegisters::new(),
            bus: BusType::Spi,
            ops: Vec::new(),
            writes: Vec::new(),
            speeds: Vec::new(),
            busy: false,
            locks: 0,
            unlocks: 0,
            fail_reads: false,
            fail_writes: false,
            fail_fifo_reads: false,
            stuck_asleep: false,
            device_resets: 0,
            fifo_flushes: 0,
        }
    }

    pub fn i2c() -> Self {
        SimDevice {
            bus: BusType::I2c,
            ..Self::new()
        }
    }

    pub fn reg(&self, reg: u8) -> u8 {
        self.regs[reg as usize]
    }

    pub fn set_reg(&mut self, reg: u8, value: u8) {
        self.regs[reg as usize] = value;
    }

    pub fn set_temperature(&mut self, raw: i16) {
        let [h, l] = raw.to_be_bytes();
        self.regs[TEMP_OUT_H as usize] = h;
        self.regs[TEMP_OUT_H as usize + 1] = l;
    }

    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.fifo.extend(bytes.iter().copied());
    }

    pub fn push_records(&mut self, records: &[Record]) {
        self.push_bytes(bytemuck::cast_slice(records));
    }

    pub fn fifo_len(&self) -> usize {
        self.fifo.len()
    }

    pub fn clear_log(&mut self) {
        self.ops.clear();
        self.writes.clear();
        self.speeds.clear();
    }

    pub fn reads_of(&self, reg: u8) -> usize {
        self.ops.iter().filter(|op| **op == Op::Read(reg)).count()
    }

    pub fn fifo_reads(&self) -> Vec<usize> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::FifoRead(len) => Some(*len),
                _ => None,
            })
            .collect()
    }
}

impl Device for SimDevice {
    type Error = SimError;

    fn bus_type(&self) -> BusType {
        self.bus
    }

    fn read_registers(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), SimError> {
        if self.fail_reads {
            return Err(SimError);
        }
        if reg == FIFO_R_W {
            return self.read_fifo(reg, buf);
        }
        self.ops.push(Op::Read(reg));
        if reg == FIFO_COUNTH {
            let count = (self.fifo.len() as u16).to_be_bytes();
            for (slot, byte) in buf.iter_mut().zip(count) {
                *slot = byte;
            }
            return Ok(());
        }
        for (offset, slot) in buf.iter_mut().enumerate() {
            *slot = self.regs[reg.wrapping_add(offset as u8) as usize];
        }
        Ok(())
    }

    fn read_fifo(&mut self, _reg: u8, buf: &mut [u8]) -> Result<(), SimError> {
        if self.fail_reads || self.fail_fifo_reads {
            return Err(SimError);
        }
        self.ops.push(Op::FifoRead(buf.len()));
        for slot in buf.iter_mut() {
            *slot = self.fifo.pop_front().unwrap_or(0);
        }
        Ok(())
    }

    fn write_raw(&mut self, reg: u8, value: u8) -> Result<(), SimError> {
        if self.fail_writes {
            return Err(SimError);
        }
        self.ops.push(Op::Write(reg, value));
        self.writes.push((reg, value));
        match reg {
            USER_CTRL => {
                if value & 0x04 != 0 {
                    self.fifo.clear();
                    self.fifo_flushes += 1;
                }
                self.regs[reg as usize] = value & !0x04;
            }
            PWR_MGMT_1 if value & 0x80 != 0 => {
                self.device_resets += 1;
                self.fifo.clear();
                self.regs[USER_CTRL as usize] = 0;
                self.regs[reg as usize] = 0x40;
            }
            PWR_MGMT_1 if self.stuck_asleep => {
                self.regs[reg as usize] = value | 0x40;
            }
            _ => self.regs[reg as usize] = value,
        }
        Ok(())
    }

    fn set_speed(&mut self, speed: BusSpeed) {
        self.speeds.push(speed);
    }

    fn checked_registers(&mut self) -> &mut CheckedRegisters {
        &mut self.checked
    }

    fn try_lock(&mut self) -> bool {
        if self.busy {
            return false;
        }
        self.locks += 1;
        true
    }

    fn unlock(&mut self) {
        self.unlocks += 1;
    }
}
