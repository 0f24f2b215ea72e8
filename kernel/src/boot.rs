// SPDX-License-Identifier: MIT

use core::fmt::{self, Write};

use diskio::prelude::*;
use fatvol::fat::{FatFilesystem, FatFormat, FsError};

/// Largest slice of the demo file printed at boot.
pub const BOOT_READ_SIZE: usize = 512;

/// How the boot volume is mounted.
#[derive(Debug, Clone, Copy)]
pub enum VolumeFormat {
    Fixed(FatFormat),
    /// Pick the FAT variant from the boot sector.
    Auto,
}

#[derive(Debug, Clone, Copy)]
pub struct BootConfig<'a> {
    pub format: VolumeFormat,
    pub file: &'a str,
    pub list_root: bool,
    /// Bytes of `file` to print, capped at [`BOOT_READ_SIZE`].
    pub read_limit: usize,
}

impl Default for BootConfig<'_> {
    fn default() -> Self {
        Self {
            format: VolumeFormat::Fixed(FatFormat::FAT16),
            file: "TEST.TXT",
            list_root: false,
            read_limit: BOOT_READ_SIZE,
        }
    }
}

/// Where the boot sequence stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootReport {
    DeviceFailed(BlockIOError),
    MountFailed(FsError),
    OpenFailed(FsError),
    ReadFailed(FsError),
    Mounted { file_size: u32, bytes_read: usize },
}

/// Machine services the boot sequence brings up around the storage stack.
///
/// Interrupt, timer and keyboard setup are owned by the surrounding kernel;
/// the hooks default to doing nothing.
pub trait Platform {
    type Device: BlockIO;

    /// Shown in the progress messages, e.g. `ATA`.
    const DEVICE_NAME: &'static str;

    fn init_interrupts(&mut self) {}

    fn init_input(&mut self) {}

    fn init_block_device(&mut self) -> BlockIOResult<Self::Device>;

    fn halt(&mut self) -> ! {
        loop {
            core::hint::spin_loop();
        }
    }
}

/// Brings up the platform, mounts the boot volume and prints the start of
/// `cfg.file`.
///
/// Storage failures are reported on `out` and in the returned
/// [`BootReport`]; only a failing `out` is an `Err`.
pub fn kernel_main<W, P>(out: &mut W, platform: &mut P, cfg: &BootConfig) -> Result<BootReport, fmt::Error>
where
    W: Write + ?Sized,
    P: Platform,
{
    writeln!(out, "Welcome to the storage kernel!\n")?;

    platform.init_interrupts();
    platform.init_input();
    writeln!(out, "Keyboard ready!\n")?;

    writeln!(out, "Initializing {} driver...", P::DEVICE_NAME)?;
    let mut device = match platform.init_block_device() {
        Ok(device) => device,
        Err(e) => {
            log::error!("{} init: {e}", P::DEVICE_NAME);
            writeln!(out, "{} driver initialization failed!\n", P::DEVICE_NAME)?;
            return Ok(BootReport::DeviceFailed(e));
        }
    };
    writeln!(out, "{} driver ready!\n", P::DEVICE_NAME)?;

    let label = match cfg.format {
        VolumeFormat::Fixed(format) => format.kind.as_str(),
        VolumeFormat::Auto => "FAT",
    };
    writeln!(out, "Initializing {label} filesystem...")?;
    let mounted = match cfg.format {
        VolumeFormat::Fixed(format) => FatFilesystem::mount(&mut device, format),
        VolumeFormat::Auto => FatFilesystem::mount_auto(&mut device),
    };
    let mut fs = match mounted {
        Ok(fs) => fs,
        Err(e) => {
            writeln!(out, "{label} initialization failed!\n")?;
            return Ok(BootReport::MountFailed(e));
        }
    };
    writeln!(out, "{} initialized successfully!\n", fs.format().kind)?;

    if cfg.list_root {
        match fs.list_root(&mut *out) {
            Ok(()) => writeln!(out)?,
            Err(e) => writeln!(out, "Listing failed: {e}\n")?,
        }
    }

    writeln!(out, "Attempting to read {}...", cfg.file)?;
    let file = match fs.open(cfg.file) {
        Ok(file) => file,
        Err(e) => {
            writeln!(out, "Failed to open {}\n", cfg.file)?;
            return Ok(BootReport::OpenFailed(e));
        }
    };
    writeln!(out, "Successfully opened {} ({} bytes)", cfg.file, file.size)?;
    writeln!(out, "File contents:")?;
    writeln!(out, "---")?;

    let mut buf = [0u8; BOOT_READ_SIZE];
    let limit = cfg.read_limit.min(BOOT_READ_SIZE);
    let report = match fs.read(&file, &mut buf[..limit]) {
        Ok(n) => {
            for &b in &buf[..n] {
                out.write_char(char::from(b))?;
            }
            BootReport::Mounted {
                file_size: file.size,
                bytes_read: n,
            }
        }
        Err(e) => {
            log::error!("reading {}: {e}", cfg.file);
            BootReport::ReadFailed(e)
        }
    };
    writeln!(out, "\n---\n")?;

    Ok(report)
}

#[cfg(all(feature = "x86", target_arch = "x86_64"))]
pub use self::x86::{PcPlatform, boot_x86};

#[cfg(all(feature = "x86", target_arch = "x86_64"))]
mod x86 {
    use super::*;

    use crate::console::{self, Console};
    use crate::logging;

    /// Primary ATA channel on a PC.
    #[derive(Debug, Default)]
    pub struct PcPlatform {
        pub ata: AtaConfig,
    }

    impl Platform for PcPlatform {
        type Device = AtaPio<X86PortIO>;

        const DEVICE_NAME: &'static str = "ATA";

        fn init_block_device(&mut self) -> BlockIOResult<Self::Device> {
            // SAFETY: boot runs on one core and nothing else drives the
            // primary ATA channel.
            let ports = unsafe { X86PortIO::new() };
            AtaPio::init(ports, self.ata)
        }

        fn halt(&mut self) -> ! {
            loop {
                x86_64::instructions::hlt();
            }
        }
    }

    /// Boots from the primary ATA disk with console output on `sink`.
    pub fn boot_x86(sink: &'static mut (dyn Write + Send)) -> ! {
        console::install(sink);
        logging::init(log::LevelFilter::Info);

        let mut platform = PcPlatform::default();
        match kernel_main(&mut Console, &mut platform, &BootConfig::default()) {
            Ok(report) => log::info!("boot finished: {report:?}"),
            Err(_) => log::error!("console rejected boot output"),
        }
        platform.halt()
    }
}
