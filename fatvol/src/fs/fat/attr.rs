// SPDX-License-Identifier: MIT

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FatAttributes: u8 {
        const READ_ONLY = 0x01;
        const HIDDEN    = 0x02;
        const SYSTEM    = 0x04;
        const VOLUME_ID = 0x08;
        const DIRECTORY = 0x10;
        const ARCHIVE   = 0x20;
        const LFN       = 0x0F;
    }
}

impl FatAttributes {
    /// Long-name fragments carry exactly the LFN bit pattern.
    #[inline]
    pub fn is_long_name(&self) -> bool {
        *self == FatAttributes::LFN
    }

    #[inline]
    pub fn is_volume_label(&self) -> bool {
        self.contains(FatAttributes::VOLUME_ID)
    }

    #[inline]
    pub fn is_dir(&self) -> bool {
        self.contains(FatAttributes::DIRECTORY)
    }
}
