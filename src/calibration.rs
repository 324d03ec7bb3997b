//! Factory calibration coefficients.
//!
//! The BME280 keeps its trimming parameters in two non-contiguous NVM blocks.
//! Both are read once, right after the soft reset, and never change afterwards.

/// Length of the first calibration block (0x88..=0xA1).
pub const BLOCK1_LEN: usize = 26;
/// Length of the second calibration block (0xE1..=0xE7).
pub const BLOCK2_LEN: usize = 7;

/// Temperature compensation coefficients (`dig_T1`..`dig_T3`).
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TemperatureCalibration {
    pub dig_t1: u16,
    pub dig_t2: i16,
    pub dig_t3: i16,
}

/// Pressure compensation coefficients (`dig_P1`..`dig_P9`).
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PressureCalibration {
    pub dig_p1: u16,
    pub dig_p2: i16,
    pub dig_p3: i16,
    pub dig_p4: i16,
    pub dig_p5: i16,
    pub dig_p6: i16,
    pub dig_p7: i16,
    pub dig_p8: i16,
    pub dig_p9: i16,
}

/// Humidity compensation coefficients (`dig_H1`..`dig_H6`).
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HumidityCalibration {
    pub dig_h1: u8,
    pub dig_h2: i16,
    pub dig_h3: u8,
    pub dig_h4: i16,
    pub dig_h5: i16,
    pub dig_h6: i8,
}

/// All coefficients of one chip.
///
/// Obtained from [`Bme280::init`](crate::Bme280::init) and passed by reference
/// into the [`calc`](crate::calc) functions.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
    pub temperature: TemperatureCalibration,
    pub pressure: PressureCalibration,
    pub humidity: HumidityCalibration,
}

fn le_u16(lsb: u8, msb: u8) -> u16 {
    u16::from_le_bytes([lsb, msb])
}

fn le_i16(lsb: u8, msb: u8) -> i16 {
    i16::from_le_bytes([lsb, msb])
}

impl Calibration {
    /// Unpacks the two raw register bursts.
    ///
    /// `block1` starts at 0x88: T1..T3, P1..P9 as little-endian pairs, one
    /// reserved byte, then H1. `block2` starts at 0xE1 and holds H2..H6, with
    /// H4 and H5 sharing the nibbles of byte 4.
    pub fn from_registers(block1: &[u8; BLOCK1_LEN], block2: &[u8; BLOCK2_LEN]) -> Self {
        let b = block1;

        let temperature = TemperatureCalibration {
            dig_t1: le_u16(b[0], b[1]),
            dig_t2: le_i16(b[2], b[3]),
            dig_t3: le_i16(b[4], b[5]),
        };

        let pressure = PressureCalibration {
            dig_p1: le_u16(b[6], b[7]),
            dig_p2: le_i16(b[8], b[9]),
            dig_p3: le_i16(b[10], b[11]),
            dig_p4: le_i16(b[12], b[13]),
            dig_p5: le_i16(b[14], b[15]),
            dig_p6: le_i16(b[16], b[17]),
            dig_p7: le_i16(b[18], b[19]),
            dig_p8: le_i16(b[20], b[21]),
            dig_p9: le_i16(b[22], b[23]),
        };

        // b[24] is reserved.
        let h = block2;
        let humidity = HumidityCalibration {
            dig_h1: b[25],
            dig_h2: le_i16(h[0], h[1]),
            dig_h3: h[2],
            dig_h4: ((h[3] as i16) << 4) | (h[4] & 0x0F) as i16,
            dig_h5: ((h[5] as i16) << 4) | (h[4] >> 4) as i16,
            dig_h6: h[6] as i8,
        };

        Calibration {
            temperature,
            pressure,
            humidity,
        }
    }
}
