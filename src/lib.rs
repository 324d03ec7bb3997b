#![cfg_attr(not(test), no_std)]

//! # BME280 Environmental Sensor Driver
//!
//! A type-safe, `no_std` driver for the Bosch BME280 running in forced mode.
//! The typestate pattern guarantees the factory calibration is loaded before
//! the first measurement is taken.
//!
//! ## Features
//! - **Forced Mode**: one conversion per request, the sensor sleeps in between.
//! - **Fixed-Point Arithmetic**: bit-exact port of the Bosch integer formulas, no FPU required.
//! - **Typestate Pattern**: prevents measuring before initialization.
//! - **Ordered Compensation**: pressure and humidity need a [`FineTemperature`],
//!   which only the temperature step can produce.
//!
//! ## Units
//! - **Temperature**: Centigrade (C * 100) -> 2508 = 25.08 °C
//! - **Pressure**: Pascal (Pa) -> 100653 = 1006.53 hPa
//! - **Humidity**: Whole percent relative humidity -> 54 = 54 %RH
//!
//! ## Example
//!
//! ```rust
//! # use embedded_hal_mock::eh1::delay::NoopDelay;
//! # use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction};
//! # let block1 = vec![
//! #     0x70, 0x6B, 0x43, 0x67, 0x18, 0xFC, 0x7D, 0x8E, 0x43, 0xD6, 0xD0, 0x0B, 0x27,
//! #     0x0B, 0x8C, 0x00, 0xF9, 0xFF, 0x8C, 0x3C, 0xF8, 0xC6, 0x70, 0x17, 0x00, 0x4B,
//! # ];
//! # let expectations = [
//! #     Transaction::write(0x76, vec![0xE0, 0xB6]),
//! #     Transaction::write_read(0x76, vec![0x88], block1),
//! #     Transaction::write_read(0x76, vec![0xE1], vec![0x6A, 0x01, 0x00, 0x13, 0x29, 0x03, 0x1E]),
//! #     Transaction::write(0x76, vec![0xF2, 0x01]),
//! #     Transaction::write(0x76, vec![0xF4, 0x25]),
//! #     Transaction::write_read(0x76, vec![0xF3], vec![0x08]),
//! #     Transaction::write_read(0x76, vec![0xF3], vec![0x00]),
//! #     Transaction::write_read(0x76, vec![0xFA], vec![0x7E, 0xED, 0x00]),
//! #     Transaction::write_read(0x76, vec![0xF7], vec![0x65, 0x5A, 0xC0]),
//! #     Transaction::write_read(0x76, vec![0xFD], vec![0x75, 0x30]),
//! # ];
//! # let i2c = I2cMock::new(&expectations);
//! # let mut delay = NoopDelay::new();
//! use bme280_driver::{Address, Bme280};
//!
//! let bme280 = Bme280::new(i2c, Address::Primary);
//!
//! // Soft-reset and read the factory calibration.
//! let mut bme280 = bme280.init(&mut delay).unwrap();
//!
//! // Trigger, wait for the busy bit to clear, then read T, P and H in order.
//! let data = bme280.measure().unwrap();
//!
//! assert_eq!(data.temp.split(), (25, 8));
//! assert_eq!(data.pres.as_hpa(), (1006, 53));
//! assert_eq!(data.hum.0, 54);
//! # bme280.release().done();
//! ```

pub mod calc;
pub mod calibration;
pub mod settings;

use core::marker::PhantomData;
use embedded_hal::{delay::DelayNs, i2c};

pub use calc::{compensate_humidity, compensate_pressure, compensate_temperature, FineTemperature};
pub use calibration::{
    Calibration, HumidityCalibration, PressureCalibration, TemperatureCalibration,
};
pub use settings::{Address, CHIP_ID};

/// Register map.
mod regs {
    pub const CHIP_ID: u8 = 0xD0;
    pub const RESET: u8 = 0xE0;
    pub const CTRL_HUM: u8 = 0xF2;
    pub const STATUS: u8 = 0xF3;
    pub const CTRL_MEAS: u8 = 0xF4;
    pub const PRESS_MSB: u8 = 0xF7;
    pub const TEMP_MSB: u8 = 0xFA;
    pub const HUM_MSB: u8 = 0xFD;
}

/// Memory addresses of the two calibration data blocks.
mod calib_mem {
    pub const ADDR: [u8; 2] = [0x88, 0xE1];
}

// --- Typestates ---

/// Sensor has been created but not yet reset or calibrated.
pub struct Uninitialized;
/// Sensor is reset, calibrated, and ready for measurements.
pub struct Ready;

/// Error types for the BME280 driver.
pub mod error {
    /// Errors that can occur while talking to the sensor.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub enum Bme280Error<E> {
        /// I2C bus error. Not retried by the driver.
        I2c(E),
        /// The busy bit did not clear within the budget given to
        /// [`trigger_and_wait_timeout`](crate::Bme280::trigger_and_wait_timeout).
        Timeout,
    }

    /// Result type alias for BME280 operations.
    pub type Result<T, E> = core::result::Result<T, Bme280Error<E>>;
}

/// Duration wrapper for type-safety. Stored in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Milliseconds(pub u32);

/// Represents temperature in Centigrade (degrees Celsius * 100).
///
/// # Example
/// A value of `2508` represents **25.08 °C**.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Temperature(pub i32);

impl Temperature {
    /// Splits the fixed-point value into integral (degrees) and fractional (decimals) parts.
    ///
    /// # Example
    /// ```rust
    /// use bme280_driver::Temperature;
    /// let temp = Temperature(2508);
    /// assert_eq!(temp.split(), (25, 8)); // Represents 25.08 °C
    /// ```
    pub fn split(&self) -> (i32, i32) {
        (self.0 / 100, self.0 % 100)
    }
}

/// Represents atmospheric pressure in Pascal (Pa).
///
/// `Pressure(0)` is the sentinel for a degenerate calibration and is not a reading.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pressure(pub u32);

impl Pressure {
    /// Converts the Pascal value to Hectopascal (hPa) and splits it into parts.
    ///
    /// # Example
    /// ```rust
    /// use bme280_driver::Pressure;
    /// let press = Pressure(100653);
    /// assert_eq!(press.as_hpa(), (1006, 53)); // Represents 1006.53 hPa
    /// ```
    pub fn as_hpa(&self) -> (u32, u32) {
        (self.0 / 100, self.0 % 100)
    }

    /// `false` for the zero sentinel returned when compensation could not run.
    pub fn is_available(&self) -> bool {
        self.0 != 0
    }
}

/// Represents relative humidity in whole percent, always within `0..=100`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Humidity(pub u32);

/// Compensated result of one forced-mode measurement cycle.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurement {
    /// Temperature data.
    pub temp: Temperature,
    /// Atmospheric pressure data.
    pub pres: Pressure,
    /// Humidity data.
    pub hum: Humidity,
}

/// Content of the `status` register (0xF3).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Status(u8);

impl Status {
    const MEASURING: u8 = 1 << 3;
    const IM_UPDATE: u8 = 1 << 0;

    /// Wraps a raw `status` register value.
    pub fn new(bits: u8) -> Self {
        Status(bits)
    }

    /// A conversion is running; results are not ready yet.
    pub fn is_measuring(&self) -> bool {
        self.0 & Self::MEASURING != 0
    }

    /// NVM data is being copied to the image registers.
    pub fn is_updating(&self) -> bool {
        self.0 & Self::IM_UPDATE != 0
    }
}

/// The main BME280 driver structure.
///
/// Use `Bme280::new(...)` to start. The `STATE` generic tracks initialization
/// status at compile time.
///
/// Every bus operation takes `&mut self`; the driver owns the bus handle, so
/// calls on one device are serialized.
#[derive(Debug)]
pub struct Bme280<I2C, STATE> {
    i2c: I2C,
    address: u8,
    calibration: Calibration,
    _state: PhantomData<STATE>,
}

impl<I2C, E> Bme280<I2C, Uninitialized>
where
    I2C: i2c::I2c<Error = E>,
{
    /// Creates a new driver instance in the `Uninitialized` state.
    ///
    /// This does not communicate with the sensor yet.
    pub fn new(i2c: I2C, address: Address) -> Self {
        Bme280 {
            i2c,
            address: address.into(),
            calibration: Calibration::default(),
            _state: PhantomData,
        }
    }

    /// Initializes the sensor: soft-reset, factory calibration readout and
    /// humidity oversampling setup.
    ///
    /// This transitions the driver state from `Uninitialized` to `Ready`.
    ///
    /// # Errors
    /// Returns an error if the I2C communication fails. Nothing is retried.
    pub fn init(mut self, delay: &mut impl DelayNs) -> error::Result<Bme280<I2C, Ready>, E> {
        // Sensor requires time to start up before reset
        delay.delay_ms(settings::STARTUP_DELAY.0);

        self.reset(delay)?;

        let calibration = self.read_calibration()?;

        // ctrl_hum only takes effect after the next ctrl_meas write
        self.write_reg(regs::CTRL_HUM, settings::CTRL_HUM)?;

        Ok(Bme280 {
            i2c: self.i2c,
            address: self.address,
            calibration,
            _state: PhantomData,
        })
    }

    /// Reads both calibration blocks and unpacks them.
    fn read_calibration(&mut self) -> error::Result<Calibration, E> {
        let mut block1 = [0u8; calibration::BLOCK1_LEN];
        let mut block2 = [0u8; calibration::BLOCK2_LEN];

        self.read_into(calib_mem::ADDR[0], &mut block1)?;
        self.read_into(calib_mem::ADDR[1], &mut block2)?;

        let calibration = Calibration::from_registers(&block1, &block2);

        #[cfg(feature = "defmt")]
        defmt::debug!("bme280: calibration loaded {}", calibration);

        Ok(calibration)
    }
}

impl<I2C, STATE, E> Bme280<I2C, STATE>
where
    I2C: i2c::I2c<Error = E>,
{
    /// Performs a soft-reset of the sensor.
    ///
    /// All registers return to their power-on values and the NVM is copied
    /// again, so the calibration must be read after this.
    fn reset(&mut self, delay: &mut impl DelayNs) -> error::Result<(), E> {
        self.write_reg(regs::RESET, settings::RESET_VALUE)?;

        #[cfg(feature = "defmt")]
        defmt::debug!("bme280: soft reset at {=u8:#x}", self.address);

        delay.delay_ms(settings::RESET_SETTLE_DELAY.0);

        Ok(())
    }

    /// Reads data from a starting register address into a provided buffer.
    fn read_into(&mut self, reg_address: u8, buffer: &mut [u8]) -> error::Result<(), E> {
        self.i2c
            .write_read(self.address, &[reg_address], buffer)
            .map_err(error::Bme280Error::I2c)
    }

    /// Reads a single byte from a specific register address.
    fn read_reg_byte(&mut self, reg_address: u8) -> error::Result<u8, E> {
        let mut buffer = [0];
        self.read_into(reg_address, &mut buffer)?;
        Ok(buffer[0])
    }

    /// Writes one value to one register.
    fn write_reg(&mut self, reg_address: u8, value: u8) -> error::Result<(), E> {
        self.i2c
            .write(self.address, &[reg_address, value])
            .map_err(error::Bme280Error::I2c)
    }

    /// Reads the chip id (expected value: [`CHIP_ID`], 0x60).
    pub fn read_chip_id(&mut self) -> error::Result<u8, E> {
        self.read_reg_byte(regs::CHIP_ID)
    }

    /// The 7-bit bus address in use.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Releases the bus handle.
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C, E> Bme280<I2C, Ready>
where
    I2C: i2c::I2c<Error = E>,
{
    /// Calibration coefficients read during [`init`](Bme280::init).
    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// Runs a full cycle: trigger, wait, then temperature, pressure and humidity.
    ///
    /// Blocks without a timeout, like [`trigger_and_wait`](Self::trigger_and_wait).
    pub fn measure(&mut self) -> error::Result<Measurement, E> {
        self.trigger_and_wait()?;

        let (temp, t_fine) = self.read_temperature()?;
        let pres = self.read_pressure(&t_fine)?;
        let hum = self.read_humidity(&t_fine)?;

        Ok(Measurement { temp, pres, hum })
    }

    /// Starts a forced-mode conversion and busy-polls `status` until it finishes.
    ///
    /// There is no timeout and no pause between polls: a sensor that never
    /// clears its busy bit (e.g. one that was disconnected mid-cycle) keeps
    /// this call spinning forever. Use
    /// [`trigger_and_wait_timeout`](Self::trigger_and_wait_timeout) for a bounded wait.
    pub fn trigger_and_wait(&mut self) -> error::Result<(), E> {
        self.trigger()?;

        while self.status()?.is_measuring() {}

        Ok(())
    }

    /// Like [`trigger_and_wait`](Self::trigger_and_wait), but gives up after `timeout`.
    ///
    /// Polls every 500 µs.
    ///
    /// # Errors
    /// [`Bme280Error::Timeout`](error::Bme280Error::Timeout) if the sensor is
    /// still busy once the budget is spent.
    pub fn trigger_and_wait_timeout(
        &mut self,
        delay: &mut impl DelayNs,
        timeout: Milliseconds,
    ) -> error::Result<(), E> {
        self.trigger()?;

        let mut remaining_us = timeout.0.saturating_mul(1000);
        loop {
            if !self.status()?.is_measuring() {
                return Ok(());
            }
            if remaining_us == 0 {
                #[cfg(feature = "defmt")]
                defmt::warn!("bme280: still busy after {} ms", timeout.0);

                return Err(error::Bme280Error::Timeout);
            }

            let step = remaining_us.min(settings::POLL_INTERVAL_US);
            delay.delay_us(step);
            remaining_us -= step;
        }
    }

    /// Reads the `status` register once.
    pub fn status(&mut self) -> error::Result<Status, E> {
        Ok(Status::new(self.read_reg_byte(regs::STATUS)?))
    }

    /// Writes `ctrl_meas`: oversampling x1 for T and P, forced mode.
    fn trigger(&mut self) -> error::Result<(), E> {
        self.write_reg(regs::CTRL_MEAS, settings::CTRL_MEAS_FORCED)
    }

    /// Reads a 20-bit ADC value from a 3-byte burst (msb, lsb, xlsb[7:4]).
    fn read_raw_20bit(&mut self, reg_address: u8) -> error::Result<u32, E> {
        let mut buffer = [0u8; 3];
        self.read_into(reg_address, &mut buffer)?;

        Ok(((buffer[0] as u32) << 12) | ((buffer[1] as u32) << 4) | ((buffer[2] as u32) >> 4))
    }

    /// Uncompensated temperature of the last conversion.
    pub fn read_raw_temperature(&mut self) -> error::Result<u32, E> {
        self.read_raw_20bit(regs::TEMP_MSB)
    }

    /// Uncompensated pressure of the last conversion.
    pub fn read_raw_pressure(&mut self) -> error::Result<u32, E> {
        self.read_raw_20bit(regs::PRESS_MSB)
    }

    /// Uncompensated humidity of the last conversion.
    pub fn read_raw_humidity(&mut self) -> error::Result<u16, E> {
        let mut buffer = [0u8; 2];
        self.read_into(regs::HUM_MSB, &mut buffer)?;

        Ok(u16::from_be_bytes(buffer))
    }

    /// Reads and compensates the temperature.
    ///
    /// Must come first in a cycle: the returned [`FineTemperature`] feeds
    /// [`read_pressure`](Self::read_pressure) and [`read_humidity`](Self::read_humidity).
    pub fn read_temperature(&mut self) -> error::Result<(Temperature, FineTemperature), E> {
        let raw = self.read_raw_temperature()?;
        Ok(compensate_temperature(raw, &self.calibration.temperature))
    }

    /// Reads and compensates the pressure. `t_fine` must be from this cycle.
    pub fn read_pressure(&mut self, t_fine: &FineTemperature) -> error::Result<Pressure, E> {
        let raw = self.read_raw_pressure()?;
        Ok(compensate_pressure(raw, &self.calibration.pressure, t_fine))
    }

    /// Reads and compensates the humidity. `t_fine` must be from this cycle.
    pub fn read_humidity(&mut self, t_fine: &FineTemperature) -> error::Result<Humidity, E> {
        let raw = self.read_raw_humidity()?;
        Ok(compensate_humidity(raw, &self.calibration.humidity, t_fine))
    }
}
