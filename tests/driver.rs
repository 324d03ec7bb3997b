use bme280_driver::error::Bme280Error;
use bme280_driver::{
    Address, Bme280, Calibration, Humidity, HumidityCalibration, Measurement, Milliseconds,
    Pressure, PressureCalibration, Ready, Temperature, TemperatureCalibration,
};
use embedded_hal::i2c::ErrorKind;
use embedded_hal_mock::eh1::delay::{CheckedDelay, NoopDelay, Transaction as DelayTransaction};
use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction};

const ADDR: u8 = 0x76;

/// Calibration image built from the datasheet example coefficients.
fn calibration_block1() -> Vec<u8> {
    vec![
        0x70, 0x6B, // T1 = 27504
        0x43, 0x67, // T2 = 26435
        0x18, 0xFC, // T3 = -1000
        0x7D, 0x8E, // P1 = 36477
        0x43, 0xD6, // P2 = -10685
        0xD0, 0x0B, // P3 = 3024
        0x27, 0x0B, // P4 = 2855
        0x8C, 0x00, // P5 = 140
        0xF9, 0xFF, // P6 = -7
        0x8C, 0x3C, // P7 = 15500
        0xF8, 0xC6, // P8 = -14600
        0x70, 0x17, // P9 = 6000
        0x00, // reserved
        0x4B, // H1 = 75
    ]
}

fn calibration_block2() -> Vec<u8> {
    vec![0x6A, 0x01, 0x00, 0x13, 0x29, 0x03, 0x1E]
}

fn init_transactions() -> Vec<Transaction> {
    vec![
        Transaction::write(ADDR, vec![0xE0, 0xB6]),
        Transaction::write_read(ADDR, vec![0x88], calibration_block1()),
        Transaction::write_read(ADDR, vec![0xE1], calibration_block2()),
        Transaction::write(ADDR, vec![0xF2, 0x01]),
    ]
}

fn ready_sensor(cycle: Vec<Transaction>) -> Bme280<I2cMock, Ready> {
    let mut expectations = init_transactions();
    expectations.extend(cycle);

    let i2c = I2cMock::new(&expectations);
    Bme280::new(i2c, Address::Primary)
        .init(&mut NoopDelay::new())
        .unwrap()
}

#[test]
fn init_loads_calibration() {
    let bme = ready_sensor(vec![]);

    assert_eq!(
        *bme.calibration(),
        Calibration {
            temperature: TemperatureCalibration {
                dig_t1: 27504,
                dig_t2: 26435,
                dig_t3: -1000,
            },
            pressure: PressureCalibration {
                dig_p1: 36477,
                dig_p2: -10685,
                dig_p3: 3024,
                dig_p4: 2855,
                dig_p5: 140,
                dig_p6: -7,
                dig_p7: 15500,
                dig_p8: -14600,
                dig_p9: 6000,
            },
            humidity: HumidityCalibration {
                dig_h1: 75,
                dig_h2: 362,
                dig_h3: 0,
                dig_h4: 313,
                dig_h5: 50,
                dig_h6: 30,
            },
        }
    );

    bme.release().done();
}

#[test]
fn init_waits_for_startup_and_reset_settle() {
    let i2c = I2cMock::new(&init_transactions());
    // 3 ms power-on time, then 20 ms after the soft reset
    let mut delay = CheckedDelay::new(&[
        DelayTransaction::delay_ms(3),
        DelayTransaction::delay_ms(20),
    ]);

    let bme = Bme280::new(i2c, Address::Primary).init(&mut delay).unwrap();

    bme.release().done();
    delay.done();
}

#[test]
fn init_uses_secondary_address() {
    let expectations = [
        Transaction::write(0x77, vec![0xE0, 0xB6]),
        Transaction::write_read(0x77, vec![0x88], calibration_block1()),
        Transaction::write_read(0x77, vec![0xE1], calibration_block2()),
        Transaction::write(0x77, vec![0xF2, 0x01]),
    ];
    let i2c = I2cMock::new(&expectations);

    let bme = Bme280::new(i2c, Address::Secondary)
        .init(&mut NoopDelay::new())
        .unwrap();
    assert_eq!(bme.address(), 0x77);

    bme.release().done();
}

#[test]
fn init_propagates_bus_error() {
    let expectations =
        [Transaction::write(ADDR, vec![0xE0, 0xB6]).with_error(ErrorKind::Other)];
    let i2c = I2cMock::new(&expectations);
    // init consumes the driver, keep a handle to check the expectations
    let mut handle = i2c.clone();

    let result = Bme280::new(i2c, Address::Primary).init(&mut NoopDelay::new());
    match result {
        Err(err) => assert_eq!(err, Bme280Error::I2c(ErrorKind::Other)),
        Ok(_) => panic!("init must fail when the reset write is not acknowledged"),
    }

    handle.done();
}

#[test]
fn measure_runs_cycle_in_order() {
    let mut bme = ready_sensor(vec![
        Transaction::write(ADDR, vec![0xF4, 0x25]),
        Transaction::write_read(ADDR, vec![0xF3], vec![0x08]),
        Transaction::write_read(ADDR, vec![0xF3], vec![0x09]),
        Transaction::write_read(ADDR, vec![0xF3], vec![0x00]),
        Transaction::write_read(ADDR, vec![0xFA], vec![0x7E, 0xED, 0x00]),
        Transaction::write_read(ADDR, vec![0xF7], vec![0x65, 0x5A, 0xC0]),
        Transaction::write_read(ADDR, vec![0xFD], vec![0x75, 0x30]),
    ]);

    let data = bme.measure().unwrap();
    assert_eq!(
        data,
        Measurement {
            temp: Temperature(2508),
            pres: Pressure(100_653),
            hum: Humidity(54),
        }
    );

    bme.release().done();
}

#[test]
fn raw_reads_drop_unused_low_bits() {
    let mut bme = ready_sensor(vec![
        // xlsb low nibble is not part of the sample
        Transaction::write_read(ADDR, vec![0xFA], vec![0x7E, 0xED, 0x0F]),
        Transaction::write_read(ADDR, vec![0xF7], vec![0x65, 0x5A, 0xCF]),
        Transaction::write_read(ADDR, vec![0xFD], vec![0x75, 0x30]),
    ]);

    assert_eq!(bme.read_raw_temperature().unwrap(), 519_888);
    assert_eq!(bme.read_raw_pressure().unwrap(), 415_148);
    assert_eq!(bme.read_raw_humidity().unwrap(), 30_000);

    bme.release().done();
}

#[test]
fn pressure_and_humidity_use_fine_temperature_from_cycle() {
    let mut bme = ready_sensor(vec![
        Transaction::write(ADDR, vec![0xF4, 0x25]),
        Transaction::write_read(ADDR, vec![0xF3], vec![0x00]),
        Transaction::write_read(ADDR, vec![0xFA], vec![0x7E, 0xED, 0x00]),
        Transaction::write_read(ADDR, vec![0xFD], vec![0x75, 0x30]),
        Transaction::write_read(ADDR, vec![0xF7], vec![0x65, 0x5A, 0xC0]),
    ]);

    bme.trigger_and_wait().unwrap();
    let (temp, t_fine) = bme.read_temperature().unwrap();
    assert_eq!(temp, Temperature(2508));
    assert_eq!(t_fine.value(), 128_422);

    // Humidity before pressure is fine, both only need the fine temperature.
    assert_eq!(bme.read_humidity(&t_fine).unwrap(), Humidity(54));
    assert_eq!(bme.read_pressure(&t_fine).unwrap(), Pressure(100_653));

    bme.release().done();
}

#[test]
fn bounded_wait_returns_once_idle() {
    let mut bme = ready_sensor(vec![
        Transaction::write(ADDR, vec![0xF4, 0x25]),
        Transaction::write_read(ADDR, vec![0xF3], vec![0x08]),
        Transaction::write_read(ADDR, vec![0xF3], vec![0x00]),
    ]);

    bme.trigger_and_wait_timeout(&mut NoopDelay::new(), Milliseconds(5))
        .unwrap();

    bme.release().done();
}

#[test]
fn bounded_wait_times_out() {
    // 1 ms budget at 500 us per poll: initial read plus two retries.
    let mut bme = ready_sensor(vec![
        Transaction::write(ADDR, vec![0xF4, 0x25]),
        Transaction::write_read(ADDR, vec![0xF3], vec![0x08]),
        Transaction::write_read(ADDR, vec![0xF3], vec![0x08]),
        Transaction::write_read(ADDR, vec![0xF3], vec![0x08]),
    ]);
    let mut delay = CheckedDelay::new(&[
        DelayTransaction::delay_us(500),
        DelayTransaction::delay_us(500),
    ]);

    let err = bme
        .trigger_and_wait_timeout(&mut delay, Milliseconds(1))
        .unwrap_err();
    assert_eq!(err, Bme280Error::Timeout);

    bme.release().done();
    delay.done();
}

#[test]
fn status_read_error_is_propagated() {
    let mut bme = ready_sensor(vec![
        Transaction::write(ADDR, vec![0xF4, 0x25]),
        Transaction::write_read(ADDR, vec![0xF3], vec![0x00]).with_error(ErrorKind::Other),
    ]);

    let err = bme.trigger_and_wait().unwrap_err();
    assert_eq!(err, Bme280Error::I2c(ErrorKind::Other));

    bme.release().done();
}

#[test]
fn chip_id_before_init() {
    let expectations = [Transaction::write_read(ADDR, vec![0xD0], vec![0x60])];
    let i2c = I2cMock::new(&expectations);

    let mut bme = Bme280::new(i2c, Address::Primary);
    assert_eq!(bme.read_chip_id().unwrap(), bme280_driver::CHIP_ID);

    bme.release().done();
}
