use std::{env, thread, time::Duration};

use bme280_sensor::chip_select_pin::ChipSelectPin;
use bme280_sensor::sensor::bme280::{
    BME280, Filter, Oversampling, Precision, Settings, SpiBusTransport,
};
use bme280_sensor::std_clock::StdClock;
use rppal::spi::{Bus, Mode, SlaveSelect, Spi};

/// SPI时钟频率
const SPI_CLOCK_HZ: u32 = 100_000;
/// 默认片选GPIO针脚，不能用SPI0自带的CE0/CE1 (GPIO8/GPIO7)
const CS_PIN: u8 = 25;
/// 两次读取之间的间隔
const READ_INTERVAL_MS: u64 = 500;

/// BME280传感器测试程序 (SPI)
///
/// 用法: bme280-spi-sensor-test [片选GPIO针脚]
fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cs_pin = match env::args().nth(1) {
        Some(s) => s.parse::<u8>()?,
        None => CS_PIN,
    };

    // 初始化SPI总线，片选由GPIO单独控制
    let spi = Spi::new(Bus::Spi0, SlaveSelect::Ss0, SPI_CLOCK_HZ, Mode::Mode0)?;
    let cs = ChipSelectPin::new(cs_pin)?;
    let transport = SpiBusTransport::new(spi, cs)?;

    // 创建BME280传感器实例
    let mut bme280 = BME280::new(transport, StdClock::new(), Precision::Int32);

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
            Ok(m) => {
                println!(
                    "BME280读取到的温度: {:.2}℃, 湿度: {:.2}%, 气压: {:.1}hPa",
                    m.temperature,
                    m.humidity * 1e2,
                    m.pressure * 1e-2
                );
            }
            Err(err) => {
                eprintln!("读取BME280传感器数据失败: {}", err);
            }
        }

        thread::sleep(Duration::from_millis(READ_INTERVAL_MS));
    }
}
