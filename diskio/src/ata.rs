// SPDX-License-Identifier: MIT

//! Polled PIO driver for the primary ATA channel.
//!
//! 28-bit LBA addressing, one command per run of at most 255 sectors, data
//! moved as 256 16-bit words per sector through the data register.

use bitflags::bitflags;

use crate::poll::{ATA_DEFAULT_BUDGET, PollBudget};
use crate::port::PortIO;
use crate::{BlockIO, BlockIOError, BlockIOResult, SECTOR_SIZE, sectors_in};

/// Register offsets relative to the channel IO base, and command opcodes.
pub mod regs {
    pub const PRIMARY_IO_BASE: u16 = 0x1F0;

    pub const DATA: u16 = 0;
    pub const ERROR: u16 = 1;
    pub const SECTOR_COUNT: u16 = 2;
    pub const LBA_LOW: u16 = 3;
    pub const LBA_MID: u16 = 4;
    pub const LBA_HIGH: u16 = 5;
    pub const DRIVE: u16 = 6;
    pub const STATUS: u16 = 7;
    pub const COMMAND: u16 = 7;

    pub const CMD_READ_SECTORS: u8 = 0x20;
    pub const CMD_WRITE_SECTORS: u8 = 0x30;

    /// Master drive, CHS mode (used for the initial select).
    pub const DRIVE_MASTER: u8 = 0xA0;
    /// Master drive, LBA mode; low nibble carries LBA bits 24..27.
    pub const DRIVE_MASTER_LBA: u8 = 0xE0;

    pub const MAX_SECTORS_PER_COMMAND: usize = 255;
    pub const WORDS_PER_SECTOR: usize = 256;
}

bitflags! {
    /// ATA status register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AtaStatus: u8 {
        const ERR  = 0x01;
        const DRQ  = 0x08;
        const DF   = 0x20;
        const RDY  = 0x40;
        const BSY  = 0x80;
    }
}

/// ATA channel configuration.
#[derive(Debug, Clone, Copy)]
pub struct AtaConfig {
    pub io_base: u16,
    pub budget: PollBudget,
}

impl Default for AtaConfig {
    fn default() -> Self {
        Self {
            io_base: regs::PRIMARY_IO_BASE,
            budget: ATA_DEFAULT_BUDGET,
        }
    }
}

/// Master drive on an ATA channel, driven by polled PIO.
#[derive(Debug)]
pub struct AtaPio<P: PortIO> {
    ports: P,
    config: AtaConfig,
}

impl<P: PortIO> AtaPio<P> {
    /// Selects the master drive and waits for it to settle.
    pub fn init(ports: P, config: AtaConfig) -> BlockIOResult<Self> {
        let mut ata = Self { ports, config };
        ata.outb(regs::DRIVE, regs::DRIVE_MASTER);
        ata.wait_not_busy()?;
        log::info!("ata: master drive ready on io base {:#x}", config.io_base);
        Ok(ata)
    }

    #[inline]
    pub fn config(&self) -> &AtaConfig {
        &self.config
    }

    pub fn into_ports(self) -> P {
        self.ports
    }

    #[inline]
    fn inb(&mut self, reg: u16) -> u8 {
        self.ports.inb(self.config.io_base + reg)
    }

    #[inline]
    fn outb(&mut self, reg: u16, value: u8) {
        self.ports.outb(self.config.io_base + reg, value)
    }

    #[inline]
    fn status(&mut self) -> AtaStatus {
        AtaStatus::from_bits_retain(self.inb(regs::STATUS))
    }

    fn wait_not_busy(&mut self) -> BlockIOResult {
        let budget = self.config.budget;
        budget
            .spin_until(|| !self.status().contains(AtaStatus::BSY))
            .inspect_err(|_| log::warn!("ata: drive stayed busy"))
    }

    /// Waits for the drive to either offer data or report an error.
    fn wait_data_request(&mut self) -> BlockIOResult {
        let budget = self.config.budget;
        let status = budget
            .spin_map(|| {
                let s = self.status();
                let settled = !s.contains(AtaStatus::BSY)
                    && s.intersects(AtaStatus::DRQ | AtaStatus::ERR);
                settled.then_some(s)
            })
            .inspect_err(|_| log::warn!("ata: no data request"))?;

        if status.intersects(AtaStatus::ERR | AtaStatus::DF) {
            let err = self.inb(regs::ERROR);
            log::error!("ata: device error, status={:#04x} error={:#04x}", status.bits(), err);
            return Err(BlockIOError::Device("ATA error bit set"));
        }
        Ok(())
    }

    fn issue(&mut self, lba: u32, count: u8, command: u8) -> BlockIOResult {
        self.wait_not_busy()?;
        self.outb(regs::DRIVE, regs::DRIVE_MASTER_LBA | ((lba >> 24) & 0x0F) as u8);
        self.outb(regs::SECTOR_COUNT, count);
        self.outb(regs::LBA_LOW, lba as u8);
        self.outb(regs::LBA_MID, (lba >> 8) as u8);
        self.outb(regs::LBA_HIGH, (lba >> 16) as u8);
        self.outb(regs::COMMAND, command);
        Ok(())
    }

    fn read_run(&mut self, lba: u32, buf: &mut [u8]) -> BlockIOResult {
        let count = buf.len() / SECTOR_SIZE;
        log::debug!("ata: read lba={lba} count={count}");
        self.issue(lba, count as u8, regs::CMD_READ_SECTORS)?;

        let data = self.config.io_base + regs::DATA;
        for sector in buf.chunks_exact_mut(SECTOR_SIZE) {
            self.wait_data_request()?;
            for word in sector.chunks_exact_mut(2) {
                word.copy_from_slice(&self.ports.inw(data).to_le_bytes());
            }
        }
        Ok(())
    }

    fn write_run(&mut self, lba: u32, data: &[u8]) -> BlockIOResult {
        let count = data.len() / SECTOR_SIZE;
        log::debug!("ata: write lba={lba} count={count}");
        self.issue(lba, count as u8, regs::CMD_WRITE_SECTORS)?;

        let port = self.config.io_base + regs::DATA;
        for sector in data.chunks_exact(SECTOR_SIZE) {
            self.wait_data_request()?;
            for word in sector.chunks_exact(2) {
                self.ports.outw(port, u16::from_le_bytes([word[0], word[1]]));
            }
        }
        Ok(())
    }
}

/// Rejects requests that do not fit 28-bit LBA addressing.
fn check_lba28(lba: u32, sectors: usize) -> BlockIOResult {
    let end = lba as u64 + sectors as u64;
    if end > (1u64 << 28) {
        return Err(BlockIOError::InvalidRequest("LBA beyond 28-bit range"));
    }
    Ok(())
}

impl<P: PortIO> BlockIO for AtaPio<P> {
    fn read_sectors(&mut self, lba: u32, buf: &mut [u8]) -> BlockIOResult {
        let sectors = sectors_in(buf.len())?;
        check_lba28(lba, sectors)?;

        let mut lba = lba;
        for run in buf.chunks_mut(regs::MAX_SECTORS_PER_COMMAND * SECTOR_SIZE) {
            self.read_run(lba, run)?;
            lba += (run.len() / SECTOR_SIZE) as u32;
        }
        Ok(())
    }

    fn write_sectors(&mut self, lba: u32, data: &[u8]) -> BlockIOResult {
        let sectors = sectors_in(data.len())?;
        check_lba28(lba, sectors)?;

        let mut lba = lba;
        for run in data.chunks(regs::MAX_SECTORS_PER_COMMAND * SECTOR_SIZE) {
            self.write_run(lba, run)?;
            lba += (run.len() / SECTOR_SIZE) as u32;
        }
        Ok(())
    }
}
