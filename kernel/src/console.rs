// SPDX-License-Identifier: MIT

//! Global text console.
//!
//! The sink itself (VGA text buffer, serial port) lives outside this crate;
//! whoever brings it up hands it over once with [`install`].

use core::fmt::{self, Write};

use spin::Mutex;

type Sink = &'static mut (dyn Write + Send);

static CONSOLE: Mutex<Option<Sink>> = Mutex::new(None);

/// Routes console output to `sink`, returning the previous one.
pub fn install(sink: Sink) -> Option<Sink> {
    CONSOLE.lock().replace(sink)
}

pub fn is_installed() -> bool {
    CONSOLE.lock().is_some()
}

/// Handle writing through the global console.
///
/// Writes are dropped while no sink is installed.
#[derive(Debug, Default, Clone, Copy)]
pub struct Console;

impl Write for Console {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        match CONSOLE.lock().as_mut() {
            Some(sink) => sink.write_str(s),
            None => Ok(()),
        }
    }

    fn write_fmt(&mut self, args: fmt::Arguments<'_>) -> fmt::Result {
        // One lock for the whole line keeps concurrent lines from interleaving.
        match CONSOLE.lock().as_mut() {
            Some(sink) => sink.write_fmt(args),
            None => Ok(()),
        }
    }
}

#[doc(hidden)]
pub fn _print(args: fmt::Arguments) {
    // A console that rejects a write has nowhere to report it.
    let _ = Console.write_fmt(args);
}

/// Prints to the console.
#[macro_export]
macro_rules! kprint {
    ($($arg:tt)*) => {
        $crate::console::_print(format_args!($($arg)*))
    };
}

/// Prints to the console, appending a newline.
#[macro_export]
macro_rules! kprintln {
    () => ($crate::kprint!("\n"));
    ($fmt:expr) => ($crate::kprint!(concat!($fmt, "\n")));
    ($fmt:expr, $($arg:tt)*) => ($crate::kprint!(
        concat!($fmt, "\n"), $($arg)*));
}
