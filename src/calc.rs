//! Fixed-point compensation formulas.
//!
//! Integer versions of the Bosch reference code (BME280 datasheet, section 4.2.3).
//! Results must match the reference bit for bit, so every intermediate keeps the
//! reference width (32 or 64 bit) and wraps the way two's-complement C does.

use crate::calibration::{HumidityCalibration, PressureCalibration, TemperatureCalibration};
use crate::{Humidity, Pressure, Temperature};

/// Upper clamp of the humidity accumulator: 100 %RH with 22 fractional bits.
const HUMIDITY_MAX: i32 = 419_430_400;

/// Intermediate temperature (`t_fine`) required by pressure and humidity compensation.
///
/// Only [`compensate_temperature`] creates one, so a pressure or humidity reading
/// cannot be computed before the temperature of its cycle:
///
/// ```compile_fail
/// use bme280_driver::calc::FineTemperature;
/// let fine = FineTemperature(128_422);
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FineTemperature(pub(crate) i32);

impl FineTemperature {
    /// Raw `t_fine` value.
    pub fn value(&self) -> i32 {
        self.0
    }
}

/// Converts a raw 20-bit temperature ADC value into hundredths of a degree Celsius.
///
/// Also returns the [`FineTemperature`] needed for the pressure and humidity
/// readings of the same measurement cycle.
pub fn compensate_temperature(
    raw: u32,
    calib: &TemperatureCalibration,
) -> (Temperature, FineTemperature) {
    let adc = raw as i32;
    let t1 = calib.dig_t1 as i32;
    let t2 = calib.dig_t2 as i32;
    let t3 = calib.dig_t3 as i32;

    let var1 = ((adc >> 3) - (t1 << 1)).wrapping_mul(t2) >> 11;
    let delta = (adc >> 4) - t1;
    let var2 = (delta.wrapping_mul(delta) >> 12).wrapping_mul(t3) >> 14;
    let t_fine = var1.wrapping_add(var2);

    let temp = t_fine.wrapping_mul(5).wrapping_add(128) >> 8;

    (Temperature(temp), FineTemperature(t_fine))
}

/// Converts a raw 20-bit pressure ADC value into pascal.
///
/// Returns `Pressure(0)` when the coefficients make the first-stage divisor
/// zero. That value means "unavailable", see [`Pressure::is_available`].
pub fn compensate_pressure(
    raw: u32,
    calib: &PressureCalibration,
    t_fine: &FineTemperature,
) -> Pressure {
    let p1 = calib.dig_p1 as i64;
    let p2 = calib.dig_p2 as i64;
    let p3 = calib.dig_p3 as i64;
    let p4 = calib.dig_p4 as i64;
    let p5 = calib.dig_p5 as i64;
    let p6 = calib.dig_p6 as i64;
    let p7 = calib.dig_p7 as i64;
    let p8 = calib.dig_p8 as i64;
    let p9 = calib.dig_p9 as i64;

    let mut var1 = (t_fine.0 as i64) - 128_000;
    let mut var2 = var1.wrapping_mul(var1).wrapping_mul(p6);
    var2 = var2.wrapping_add(var1.wrapping_mul(p5) << 17);
    var2 = var2.wrapping_add(p4 << 35);
    var1 = (var1.wrapping_mul(var1).wrapping_mul(p3) >> 8)
        .wrapping_add(var1.wrapping_mul(p2) << 12);
    var1 = (1i64 << 47).wrapping_add(var1).wrapping_mul(p1) >> 33;

    if var1 == 0 {
        return Pressure(0);
    }

    let mut p = 1_048_576u32.wrapping_sub(raw) as i64;
    p = (p << 31).wrapping_sub(var2).wrapping_mul(3125).wrapping_div(var1);

    let var1 = p9.wrapping_mul(p >> 13).wrapping_mul(p >> 13) >> 25;
    let var2 = p8.wrapping_mul(p) >> 19;
    p = (p.wrapping_add(var1).wrapping_add(var2) >> 8).wrapping_add(p7 << 4);

    // p is Q24.8 pascal
    Pressure((p as u32) >> 8)
}

/// Converts a raw 16-bit humidity ADC value into whole percent relative humidity.
///
/// The accumulator is clamped to the 0..=100 %RH range before the final shift.
pub fn compensate_humidity(
    raw: u16,
    calib: &HumidityCalibration,
    t_fine: &FineTemperature,
) -> Humidity {
    let adc = raw as i32;
    let h1 = calib.dig_h1 as i32;
    let h2 = calib.dig_h2 as i32;
    let h3 = calib.dig_h3 as i32;
    let h4 = calib.dig_h4 as i32;
    let h5 = calib.dig_h5 as i32;
    let h6 = calib.dig_h6 as i32;

    let v = t_fine.0.wrapping_sub(76_800);

    let offset = ((adc << 14)
        .wrapping_sub(h4 << 20)
        .wrapping_sub(h5.wrapping_mul(v))
        .wrapping_add(16_384))
        >> 15;

    let quadratic = (v.wrapping_mul(h6) >> 10)
        .wrapping_mul((v.wrapping_mul(h3) >> 11).wrapping_add(32_768))
        >> 10;
    let gain = (quadratic.wrapping_add(2_097_152))
        .wrapping_mul(h2)
        .wrapping_add(8_192)
        >> 14;

    let mut acc = offset.wrapping_mul(gain);
    let correction = ((acc >> 15).wrapping_mul(acc >> 15) >> 7).wrapping_mul(h1) >> 4;
    acc = acc.wrapping_sub(correction);

    let acc = acc.clamp(0, HUMIDITY_MAX);

    Humidity(((acc >> 12) as u32) >> 10)
}
