// SPDX-License-Identifier: MIT

/// Raw access to the x86 IO port space.
///
/// The ATA and floppy drivers are written against this trait instead of
/// issuing `in`/`out` instructions directly, so the same code runs on real
/// hardware and against a scripted bus in tests.
pub trait PortIO {
    fn inb(&mut self, port: u16) -> u8;
    fn outb(&mut self, port: u16, value: u8);
    fn inw(&mut self, port: u16) -> u16;
    fn outw(&mut self, port: u16, value: u16);
}

impl<P: PortIO + ?Sized> PortIO for &mut P {
    #[inline]
    fn inb(&mut self, port: u16) -> u8 {
        (**self).inb(port)
    }
    #[inline]
    fn outb(&mut self, port: u16, value: u8) {
        (**self).outb(port, value)
    }
    #[inline]
    fn inw(&mut self, port: u16) -> u16 {
        (**self).inw(port)
    }
    #[inline]
    fn outw(&mut self, port: u16, value: u16) {
        (**self).outw(port, value)
    }
}

#[cfg(all(feature = "x86", target_arch = "x86_64"))]
pub use self::x86::X86PortIO;

#[cfg(all(feature = "x86", target_arch = "x86_64"))]
mod x86 {
    use super::PortIO;
    use x86_64::instructions::port::Port;

    /// `PortIO` backed by real `in`/`out` instructions.
    #[derive(Debug)]
    pub struct X86PortIO {
        _private: (),
    }

    impl X86PortIO {
        /// # Safety
        ///
        /// The caller must own the legacy IO ranges driven through this handle
        /// (0x1F0-0x1F7, 0x3F2-0x3F7, ISA DMA channel 2) and nothing else may
        /// touch them concurrently.
        pub unsafe fn new() -> Self {
            Self { _private: () }
        }
    }

    impl PortIO for X86PortIO {
        #[inline]
        fn inb(&mut self, port: u16) -> u8 {
            // SAFETY: port ownership is asserted by `X86PortIO::new`.
            unsafe { Port::<u8>::new(port).read() }
        }

        #[inline]
        fn outb(&mut self, port: u16, value: u8) {
            // SAFETY: see `inb`.
            unsafe { Port::<u8>::new(port).write(value) }
        }

        #[inline]
        fn inw(&mut self, port: u16) -> u16 {
            // SAFETY: see `inb`.
            unsafe { Port::<u16>::new(port).read() }
        }

        #[inline]
        fn outw(&mut self, port: u16, value: u16) {
            // SAFETY: see `inb`.
            unsafe { Port::<u16>::new(port).write(value) }
        }
    }
}
