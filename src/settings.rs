use crate::Milliseconds;

/// I²C address of the sensor, selected by the level on the SDO pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Address {
    /// SDO tied to GND.
    #[default]
    Primary = 0x76,
    /// SDO tied to VDDIO.
    Secondary = 0x77,
}

impl From<Address> for u8 {
    fn from(address: Address) -> Self {
        address as u8
    }
}

/// Oversampling field encoding shared by `ctrl_hum` and `ctrl_meas`.
///
/// The driver always measures with a single sample per channel.
pub(crate) const OSRS_X1: u8 = 0b001;

/// Forced mode: one conversion, then back to sleep.
pub(crate) const MODE_FORCED: u8 = 0b01;

/// `ctrl_hum` value: humidity oversampling x1.
pub(crate) const CTRL_HUM: u8 = OSRS_X1;

/// `ctrl_meas` value: osrs_t[7:5] x1, osrs_p[4:2] x1, mode[1:0] forced (0x25).
pub(crate) const CTRL_MEAS_FORCED: u8 = (OSRS_X1 << 5) | (OSRS_X1 << 2) | MODE_FORCED;

/// Soft-reset magic for the reset register.
pub(crate) const RESET_VALUE: u8 = 0xB6;

/// Value of the chip id register on a BME280.
pub const CHIP_ID: u8 = 0x60;

/// Power-on time before the first command is accepted.
pub(crate) const STARTUP_DELAY: Milliseconds = Milliseconds(3);

/// Wait after the soft reset. The datasheet asks for 2 ms; NVM copy can take longer.
pub(crate) const RESET_SETTLE_DELAY: Milliseconds = Milliseconds(20);

/// Pause between status reads in the bounded busy poll.
pub(crate) const POLL_INTERVAL_US: u32 = 500;
