// src/arch/x86/serial.rs

//! COM1 serial output
//!
//! The kernel log goes to the first UART; under QEMU that is the
//! `-serial stdio` channel. Output only - the kernel never reads from the
//! port.

use crate::constants::COM1_PORT;
use core::fmt;
use lazy_static::lazy_static;
use spin::Mutex;

/// Line status register bit: transmit holding register empty.
const LSR_THR_EMPTY: u8 = 0x20;

/// A write-only 16550-style UART.
pub struct SerialPort {
    base: u16,
}

impl SerialPort {
    /// Create a handle for the UART at `base` without touching hardware.
    #[must_use]
    pub const fn new(base: u16) -> Self {
        Self { base }
    }

    /// Program 38400 baud, 8N1, FIFOs enabled.
    fn init(&mut self) {
        // SAFETY: standard 16550 init sequence on this port's registers
        unsafe {
            x86::io::outb(self.base + 1, 0x00); // disable UART interrupts
            x86::io::outb(self.base + 3, 0x80); // DLAB on
            x86::io::outb(self.base, 0x03); // divisor low: 38400 baud
            x86::io::outb(self.base + 1, 0x00); // divisor high
            x86::io::outb(self.base + 3, 0x03); // 8 bits, no parity, 1 stop
            x86::io::outb(self.base + 2, 0xC7); // FIFO on, clear, 14-byte
            x86::io::outb(self.base + 4, 0x0B); // DTR + RTS + OUT2
        }
    }

    /// Write one byte, spinning until the transmit FIFO drains.
    pub fn write_byte(&mut self, byte: u8) {
        // SAFETY: reads status / writes data on this port only
        unsafe {
            while x86::io::inb(self.base + 5) & LSR_THR_EMPTY == 0 {
                core::hint::spin_loop();
            }
            x86::io::outb(self.base, byte);
        }
    }
}

impl fmt::Write for SerialPort {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for byte in s.bytes() {
            self.write_byte(byte);
        }
        Ok(())
    }
}

lazy_static! {
    /// The kernel log port.
    pub static ref COM1: Mutex<SerialPort> = {
        let mut port = SerialPort::new(COM1_PORT);
        port.init();
        Mutex::new(port)
    };
}
