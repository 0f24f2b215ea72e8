// SPDX-License-Identifier: MIT

//! Floppy disk controller driver (82077AA compatible), drive 0, reads only.
//!
//! Transfers go through ISA DMA channel 2 into a fixed 512-byte buffer in
//! low memory, one sector per command. Completion is polled; IRQ 6 is never
//! waited for.

use bitflags::bitflags;

use crate::poll::{FDC_BYTE_BUDGET, FDC_COMPLETION_BUDGET, PollBudget};
use crate::port::PortIO;
use crate::{BlockIO, BlockIOError, BlockIOResult, SECTOR_SIZE, sectors_in};

pub mod regs {
    pub const DOR: u16 = 0x3F2;
    pub const MSR: u16 = 0x3F4;
    pub const FIFO: u16 = 0x3F5;
    pub const CCR: u16 = 0x3F7;

    // ISA DMA, channel 2
    pub const DMA_ADDR_2: u16 = 0x04;
    pub const DMA_COUNT_2: u16 = 0x05;
    pub const DMA_PAGE_2: u16 = 0x81;
    pub const DMA_SINGLE_MASK: u16 = 0x0A;
    pub const DMA_MODE: u16 = 0x0B;
    pub const DMA_FLIPFLOP: u16 = 0x0C;

    pub const DMA_MASK_CH2: u8 = 0x06;
    pub const DMA_UNMASK_CH2: u8 = 0x02;
    /// Single transfer, increment, no auto-init, device to memory, channel 2.
    pub const DMA_MODE_READ_CH2: u8 = 0x46;

    pub const CMD_SPECIFY: u8 = 0x03;
    pub const CMD_WRITE_DATA: u8 = 0x05;
    pub const CMD_READ_DATA: u8 = 0x06;
    pub const CMD_RECALIBRATE: u8 = 0x07;
    pub const CMD_SENSE_INTERRUPT: u8 = 0x08;
    pub const CMD_SEEK: u8 = 0x0F;
    pub const OPT_MFM: u8 = 0x40;

    /// SRT=3ms, HUT=240ms.
    pub const SPECIFY_SRT_HUT: u8 = 0xDF;
    /// HLT=16ms, DMA mode.
    pub const SPECIFY_HLT_ND: u8 = 0x02;
    /// 500 kbps, the 1.44M data rate.
    pub const CCR_500KBPS: u8 = 0x00;

    /// Sector size code: 128 << 2 = 512 bytes.
    pub const SECTOR_SIZE_CODE: u8 = 2;
    pub const GAP3_LENGTH: u8 = 0x1B;
    pub const DATA_LENGTH: u8 = 0xFF;

    /// Interrupt code bits of ST0; non-zero means abnormal termination.
    pub const ST0_IC_MASK: u8 = 0xC0;
    pub const RESULT_BYTES: usize = 7;
    pub const RESET_SENSE_COUNT: usize = 4;

    pub const DMA_BUFFER_PHYS: u32 = 0x8000;
}

bitflags! {
    /// Main status register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Msr: u8 {
        const BUSY = 0x10;
        const DIO  = 0x40;
        const RQM  = 0x80;
    }

    /// Digital output register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Dor: u8 {
        const RESET   = 0x04;
        const IRQ     = 0x08;
        const MOTOR_A = 0x10;
    }
}

/// Cylinder/head/sector triple; `sector` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chs {
    pub cylinder: u8,
    pub head: u8,
    pub sector: u8,
}

/// Fixed media geometry used for LBA to CHS translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloppyGeometry {
    pub sectors_per_track: u8,
    pub heads: u8,
    pub tracks: u8,
}

impl FloppyGeometry {
    /// 3.5" high density, 1.44 MB.
    pub const HD_1440K: Self = Self {
        sectors_per_track: 18,
        heads: 2,
        tracks: 80,
    };

    #[inline]
    pub const fn total_sectors(&self) -> u32 {
        self.sectors_per_track as u32 * self.heads as u32 * self.tracks as u32
    }

    pub fn chs(&self, lba: u32) -> BlockIOResult<Chs> {
        if lba >= self.total_sectors() {
            return Err(BlockIOError::InvalidRequest("LBA beyond floppy geometry"));
        }
        let spt = self.sectors_per_track as u32;
        let heads = self.heads as u32;
        Ok(Chs {
            cylinder: (lba / (heads * spt)) as u8,
            head: ((lba / spt) % heads) as u8,
            sector: (lba % spt + 1) as u8,
        })
    }
}

impl Default for FloppyGeometry {
    fn default() -> Self {
        Self::HD_1440K
    }
}

/// Memory the DMA controller transfers a sector into.
pub trait DmaBuffer {
    /// Physical address the controller is programmed with.
    fn phys_addr(&self) -> u32;

    /// Copies the last transferred sector out of the buffer.
    fn copy_to(&self, dst: &mut [u8]);
}

/// The fixed low-memory DMA buffer (one sector at physical 0x8000).
#[derive(Debug)]
pub struct LowMemDma {
    virt: *const u8,
    phys: u32,
}

impl LowMemDma {
    /// # Safety
    ///
    /// `virt` must map `phys` for at least [`SECTOR_SIZE`] bytes, the region
    /// must be reserved for DMA, and `phys` must be below 16 MiB.
    pub unsafe fn new(virt: *const u8, phys: u32) -> Self {
        Self { virt, phys }
    }

    /// # Safety
    ///
    /// Low memory must be identity mapped and 0x8000..0x8200 unused.
    pub unsafe fn identity_mapped() -> Self {
        Self {
            virt: regs::DMA_BUFFER_PHYS as usize as *const u8,
            phys: regs::DMA_BUFFER_PHYS,
        }
    }
}

impl DmaBuffer for LowMemDma {
    #[inline]
    fn phys_addr(&self) -> u32 {
        self.phys
    }

    fn copy_to(&self, dst: &mut [u8]) {
        for (i, b) in dst.iter_mut().take(SECTOR_SIZE).enumerate() {
            // SAFETY: the constructor guarantees SECTOR_SIZE mapped bytes; the
            // device writes behind the compiler's back, hence volatile.
            *b = unsafe { core::ptr::read_volatile(self.virt.add(i)) };
        }
    }
}

/// Controller configuration.
#[derive(Debug, Clone, Copy)]
pub struct FloppyConfig {
    pub geometry: FloppyGeometry,
    pub byte_budget: PollBudget,
    pub completion_budget: PollBudget,
}

impl Default for FloppyConfig {
    fn default() -> Self {
        Self {
            geometry: FloppyGeometry::HD_1440K,
            byte_budget: FDC_BYTE_BUDGET,
            completion_budget: FDC_COMPLETION_BUDGET,
        }
    }
}

/// Drive 0 on the primary floppy controller.
#[derive(Debug)]
pub struct Floppy<P: PortIO, D: DmaBuffer> {
    ports: P,
    dma: D,
    config: FloppyConfig,
}

impl<P: PortIO, D: DmaBuffer> Floppy<P, D> {
    /// Resets the controller and recalibrates drive 0 to cylinder 0.
    pub fn init(ports: P, dma: D, config: FloppyConfig) -> BlockIOResult<Self> {
        check_dma_window(dma.phys_addr())?;

        let mut fdc = Self { ports, dma, config };
        log::info!("fdc: initializing");

        if let Err(e) = fdc.reset() {
            log::error!("fdc: reset failed: {e}");
            return Err(e);
        }
        if let Err(e) = fdc.recalibrate() {
            log::error!("fdc: recalibrate failed: {e}");
            fdc.motor_off();
            return Err(e);
        }

        log::info!("fdc: initialized");
        Ok(fdc)
    }

    #[inline]
    pub fn geometry(&self) -> &FloppyGeometry {
        &self.config.geometry
    }

    pub fn into_parts(self) -> (P, D) {
        (self.ports, self.dma)
    }

    fn motor_on(&mut self) {
        self.ports
            .outb(regs::DOR, (Dor::MOTOR_A | Dor::IRQ | Dor::RESET).bits());
    }

    fn motor_off(&mut self) {
        self.ports.outb(regs::DOR, (Dor::IRQ | Dor::RESET).bits());
    }

    #[inline]
    fn msr(&mut self) -> Msr {
        Msr::from_bits_retain(self.ports.inb(regs::MSR))
    }

    fn wait_rqm(&mut self) -> BlockIOResult {
        let budget = self.config.byte_budget;
        budget.spin_until(|| self.msr().contains(Msr::RQM))
    }

    fn send(&mut self, byte: u8) -> BlockIOResult {
        self.wait_rqm()?;
        self.ports.outb(regs::FIFO, byte);
        Ok(())
    }

    fn send_all(&mut self, bytes: &[u8]) -> BlockIOResult {
        bytes.iter().try_for_each(|b| self.send(*b))
    }

    fn recv(&mut self) -> BlockIOResult<u8> {
        self.wait_rqm()?;
        Ok(self.ports.inb(regs::FIFO))
    }

    /// SENSE INTERRUPT, returning (st0, present cylinder).
    fn sense_interrupt(&mut self) -> BlockIOResult<(u8, u8)> {
        self.send(regs::CMD_SENSE_INTERRUPT)?;
        let st0 = self.recv()?;
        let cyl = self.recv()?;
        Ok((st0, cyl))
    }

    fn reset(&mut self) -> BlockIOResult {
        self.ports.outb(regs::DOR, 0);
        self.ports.outb(regs::DOR, (Dor::IRQ | Dor::RESET).bits());

        // One acknowledgement per drive after a reset.
        for _ in 0..regs::RESET_SENSE_COUNT {
            self.sense_interrupt()?;
        }

        self.ports.outb(regs::CCR, regs::CCR_500KBPS);
        self.send_all(&[regs::CMD_SPECIFY, regs::SPECIFY_SRT_HUT, regs::SPECIFY_HLT_ND])
    }

    fn recalibrate(&mut self) -> BlockIOResult {
        self.motor_on();
        self.send_all(&[regs::CMD_RECALIBRATE, 0])?;
        let (_, cyl) = self.sense_interrupt()?;
        if cyl != 0 {
            return Err(BlockIOError::Device("recalibrate did not reach cylinder 0"));
        }
        Ok(())
    }

    fn seek(&mut self, chs: Chs) -> BlockIOResult {
        self.send_all(&[regs::CMD_SEEK, chs.head << 2, chs.cylinder])?;
        self.sense_interrupt()?;
        Ok(())
    }

    fn setup_dma_read(&mut self) {
        let addr = self.dma.phys_addr();
        let count = (SECTOR_SIZE - 1) as u16;

        self.ports.outb(regs::DMA_SINGLE_MASK, regs::DMA_MASK_CH2);
        self.ports.outb(regs::DMA_FLIPFLOP, 0xFF);
        self.ports.outb(regs::DMA_MODE, regs::DMA_MODE_READ_CH2);
        self.ports.outb(regs::DMA_ADDR_2, addr as u8);
        self.ports.outb(regs::DMA_ADDR_2, (addr >> 8) as u8);
        self.ports.outb(regs::DMA_PAGE_2, (addr >> 16) as u8);
        self.ports.outb(regs::DMA_COUNT_2, count as u8);
        self.ports.outb(regs::DMA_COUNT_2, (count >> 8) as u8);
        self.ports.outb(regs::DMA_SINGLE_MASK, regs::DMA_UNMASK_CH2);
    }

    fn read_one(&mut self, lba: u32, dst: &mut [u8]) -> BlockIOResult {
        let chs = self.config.geometry.chs(lba)?;
        log::debug!(
            "fdc: read lba={lba} c={} h={} s={}",
            chs.cylinder,
            chs.head,
            chs.sector
        );

        self.motor_on();
        self.seek(chs)?;
        self.setup_dma_read();

        let spt = self.config.geometry.sectors_per_track;
        self.send_all(&[
            regs::CMD_READ_DATA | regs::OPT_MFM,
            chs.head << 2,
            chs.cylinder,
            chs.head,
            chs.sector,
            regs::SECTOR_SIZE_CODE,
            spt,
            regs::GAP3_LENGTH,
            regs::DATA_LENGTH,
        ])?;

        let budget = self.config.completion_budget;
        budget.spin_until(|| !self.msr().contains(Msr::BUSY))?;

        let mut result = [0u8; regs::RESULT_BYTES];
        for b in result.iter_mut() {
            *b = self.recv()?;
        }
        let st0 = result[0];
        if st0 & regs::ST0_IC_MASK != 0 {
            log::error!("fdc: read failed, st0={st0:#04x} st1={:#04x} st2={:#04x}", result[1], result[2]);
            return Err(BlockIOError::Device("FDC reported abnormal termination"));
        }

        self.dma.copy_to(dst);
        Ok(())
    }
}

/// ISA DMA can only reach the first 16 MiB and cannot cross a 64 KiB page.
fn check_dma_window(phys: u32) -> BlockIOResult {
    let last = phys as u64 + SECTOR_SIZE as u64 - 1;
    if last >= 1 << 24 || (phys >> 16) as u64 != last >> 16 {
        return Err(BlockIOError::InvalidRequest("DMA buffer outside ISA window"));
    }
    Ok(())
}

impl<P: PortIO, D: DmaBuffer> BlockIO for Floppy<P, D> {
    fn read_sectors(&mut self, lba: u32, buf: &mut [u8]) -> BlockIOResult {
        sectors_in(buf.len())?;

        for (i, sector) in buf.chunks_exact_mut(SECTOR_SIZE).enumerate() {
            let target = lba
                .checked_add(i as u32)
                .ok_or(BlockIOError::InvalidRequest("LBA overflow"))?;
            if let Err(e) = self.read_one(target, sector) {
                self.motor_off();
                return Err(e);
            }
        }

        self.motor_off();
        Ok(())
    }

    fn write_sectors(&mut self, lba: u32, _data: &[u8]) -> BlockIOResult {
        log::warn!("fdc: write not implemented (lba={lba})");
        Err(BlockIOError::Unsupported)
    }

    fn sector_count(&self) -> Option<u64> {
        Some(self.config.geometry.total_sectors() as u64)
    }
}
