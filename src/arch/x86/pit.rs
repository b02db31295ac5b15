// src/arch/x86/pit.rs

//! Programmable Interval Timer (8253/8254)
//!
//! Channel 0 drives IRQ 0 (vector 32 after remapping) and is the scheduler
//! tick. The achieved rate is `PIT_INPUT_HZ / divisor`, so the requested
//! frequency is only approximate after integer-divisor truncation.

use crate::arch::x86::port::PortBus;
use crate::constants::{PIT_CHANNEL0, PIT_COMMAND, PIT_INPUT_HZ};
use crate::errors::TimerError;

/// Command word: channel 0, lobyte/hibyte access, mode 3 (square wave),
/// binary counting.
const CMD_CH0_SQUARE: u8 = 0x36;

/// Compute the 16-bit reload divisor for `frequency` Hz.
///
/// # Errors
///
/// `DivisorOutOfRange` if the frequency is 0, too high (divisor 0) or too
/// low for the 16-bit reload register. The hardware behavior for such
/// divisors is unspecified, so this is rejected instead of clamped.
pub fn divisor_for(frequency: u32) -> Result<u16, TimerError> {
    if frequency == 0 {
        return Err(TimerError::DivisorOutOfRange);
    }
    let divisor = PIT_INPUT_HZ / frequency;
    if divisor == 0 || divisor > u16::MAX as u32 {
        return Err(TimerError::DivisorOutOfRange);
    }
    Ok(divisor as u16)
}

/// Program channel 0 to fire periodically at ~`frequency` Hz.
///
/// Writes the mode/command word, then the divisor low byte and high byte.
/// Call after the PIC remap and before enabling interrupts.
///
/// # Errors
///
/// See [`divisor_for`].
pub fn configure(frequency: u32, bus: &mut impl PortBus) -> Result<(), TimerError> {
    let divisor = divisor_for(frequency)?;

    bus.write_u8(PIT_COMMAND, CMD_CH0_SQUARE);
    bus.write_u8(PIT_CHANNEL0, (divisor & 0xFF) as u8);
    bus.write_u8(PIT_CHANNEL0, (divisor >> 8) as u8);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::x86::port::mock::RecordingBus;

    #[test]
    fn test_divisor_for_1000hz() {
        // 1193180 / 1000, integer division
        assert_eq!(divisor_for(1000), Ok(1193));
    }

    #[test]
    fn test_configure_1000hz_byte_sequence() {
        let mut bus = RecordingBus::new();
        configure(1000, &mut bus).unwrap();
        assert_eq!(
            bus.writes,
            [(0x43, 0x36), (0x40, 0x6D), (0x40, 0x04)]
        );
    }

    #[test]
    fn test_zero_frequency_rejected() {
        assert_eq!(divisor_for(0), Err(TimerError::DivisorOutOfRange));
    }

    #[test]
    fn test_too_high_frequency_rejected() {
        // divisor would truncate to 0
        assert_eq!(
            divisor_for(PIT_INPUT_HZ + 1),
            Err(TimerError::DivisorOutOfRange)
        );
    }

    #[test]
    fn test_too_low_frequency_rejected() {
        // 1193180 / 1 does not fit the 16-bit reload register
        assert_eq!(divisor_for(1), Err(TimerError::DivisorOutOfRange));
        let mut bus = RecordingBus::new();
        assert!(configure(1, &mut bus).is_err());
        assert!(bus.writes.is_empty(), "no bytes on the wire after an error");
    }

    #[test]
    fn test_lowest_programmable_frequency() {
        // 1193180 / 19 = 62799 still fits in 16 bits
        assert_eq!(divisor_for(19), Ok(62799));
    }
}
