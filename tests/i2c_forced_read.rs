use bme280_sensor::sensor::bme280::{BME280, I2cTransport, Precision, Settings, transport};
use embedded_hal_mock::eh1::delay::NoopDelay;
use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

const ADDR: u8 = transport::I2C_ADDR_PRIMARY;

/// 参考器件的校准数据和一次测量数据
const CALIB_A: [u8; 26] = [
    0x04, 0x71, 0x9f, 0x67, 0x32, 0x00, 0x19, 0x8a, 0x4d, 0xd6, 0xd0, 0x0b, 0xc4, 0x19, 0xfa, 0xff,
    0xf9, 0xff, 0x0c, 0x30, 0x20, 0xd1, 0x88, 0x13, 0x00, 0x4b,
];
const CALIB_B: [u8; 7] = [0x5a, 0x01, 0x00, 0x16, 0x26, 0x03, 0x1e];
const DATA: [u8; 8] = [0x5e, 0x96, 0x20, 0x85, 0xef, 0xc0, 0x7b, 0xd2];

/// 复位、配置、等待、读取的完整总线事务
fn forced_read_transactions() -> Vec<I2cTransaction> {
    vec![
        // 软复位
        I2cTransaction::write(ADDR, vec![0xE0, 0xB6]),
        // 芯片ID
        I2cTransaction::write_read(ADDR, vec![0xD0], vec![0x60]),
        // 状态
        I2cTransaction::write_read(ADDR, vec![0xF3], vec![0x00]),
        // 校准数据
        I2cTransaction::write_read(ADDR, vec![0x88], CALIB_A.to_vec()),
        I2cTransaction::write_read(ADDR, vec![0xE1], CALIB_B.to_vec()),
        // config, ctrl_hum, ctrl_meas
        I2cTransaction::write(ADDR, vec![0xF5, 0x40]),
        I2cTransaction::write(ADDR, vec![0xF2, 0x01]),
        I2cTransaction::write(ADDR, vec![0xF4, 0x25]),
        // 测量中一次，然后完成
        I2cTransaction::write_read(ADDR, vec![0xF3], vec![0x08]),
        I2cTransaction::write_read(ADDR, vec![0xF3], vec![0x00]),
        // 测量数据
        I2cTransaction::write_read(ADDR, vec![0xF7], DATA.to_vec()),
    ]
}

#[test]
fn forced_read_over_i2c() {
    let mut expectations = forced_read_transactions();
    // 关闭时只写 ctrl_meas 进入休眠，另外两个寄存器命中缓存
    expectations.push(I2cTransaction::write(ADDR, vec![0xF4, 0x24]));

    let i2c = I2cMock::new(&expectations);
    let mut bme280 = BME280::new(I2cTransport::new(i2c, ADDR), NoopDelay::new(), Precision::Int32);

    let m = bme280.read_forced(&Settings::default()).unwrap();
    assert!((m.temperature - 27.099998).abs() < 5e-5);
    assert!((m.humidity - 0.451729).abs() < 5e-5);
    assert!((m.pressure - 98484.00116).abs() < 0.05);

    let mut i2c = bme280.close().unwrap().release();
    i2c.done();
}

#[test]
fn second_forced_read_skips_reset_and_cached_writes() {
    let mut expectations = forced_read_transactions();
    expectations.extend([
        I2cTransaction::write(ADDR, vec![0xF4, 0x25]),
        I2cTransaction::write_read(ADDR, vec![0xF3], vec![0x00]),
        I2cTransaction::write_read(ADDR, vec![0xF7], DATA.to_vec()),
    ]);

    let i2c = I2cMock::new(&expectations);
    let mut bme280 = BME280::new(I2cTransport::new(i2c, ADDR), NoopDelay::new(), Precision::Int64);

    let first = bme280.read_forced(&Settings::default()).unwrap();
    let second = bme280.read_forced(&Settings::default()).unwrap();
    assert_eq!(first, second);
    assert!((second.pressure / 100.0 - 984.8400116).abs() < 0.05);

    // 直接取回总线，不产生休眠写入
    let mut i2c = bme280.release().unwrap().release();
    i2c.done();
}
