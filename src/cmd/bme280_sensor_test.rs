use std::{env, thread, time::Duration};

use bme280_sensor::sensor::bme280::{
    BME280, Filter, I2cTransport, Oversampling, Precision, Settings, transport,
};
use bme280_sensor::std_clock::StdClock;
use rppal::i2c::I2c;

/// BME280 I2C从设备地址
const BME280_ADDR: u8 = transport::I2C_ADDR_PRIMARY;
/// 两次读取之间的间隔
const READ_INTERVAL_MS: u64 = 500;

/// BME280传感器测试程序 (I2C)
///
/// 用法: bme280-sensor-test [I2C总线编号] [从设备地址]
fn main() -> anyhow::Result<()> {
    env_logger::init();

    // 解析命令行参数
    let mut args = env::args().skip(1);
    let bus = args.next().map(|s| s.parse::<u8>()).transpose()?;
    let addr = match args.next() {
        Some(s) => u8::from_str_radix(s.trim_start_matches("0x"), 16)?,
        None => BME280_ADDR,
    };

    // 初始化I2C通信总线
    let i2c_bus = match bus {
        Some(bus) => I2c::with_bus(bus)?,
        None => I2c::new()?,
    };

    // 创建BME280传感器实例
    let mut bme280 = BME280::new(
        I2cTransport::new(i2c_bus, addr),
        StdClock::new(),
        Precision::Float,
    );

    let settings = Settings {
        filter: Filter::X4,
        osrs_t: Oversampling::X4,
        osrs_h: Oversampling::X16,
        osrs_p: Oversampling::X4,
        ..Settings::default()
    };

    // 死循环读取传感器数据
    loop {
        match bme280.read_forced(&settings) {
            // 读取成功
            Ok(m) => {
                println!(
                    "BME280读取到的温度: {:.2}℃, 湿度: {:.2}%, 气压: {:.1}hPa",
                    m.temperature,
                    m.humidity * 1e2,
                    m.pressure * 1e-2
                );
            }
            // 读取失败
            Err(err) => {
                eprintln!("读取BME280传感器数据失败: {}", err);
            }
        }

        thread::sleep(Duration::from_millis(READ_INTERVAL_MS));
    }
}
