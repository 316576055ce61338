//! BME280 温度、湿度、气压传感器驱动
//!
//! 驱动只依赖 [`Transport`] 提供的寄存器读写能力，I2C 和 SPI 通道见 [`transport`]。
//! 生命周期: 复位并读取校准数据 → 写入配置 → 触发/等待测量 → 读取并补偿。

pub mod calibration;
pub mod compensation;
pub mod error;
pub mod register;
pub mod transport;

use embedded_hal::delay::DelayNs;
use log::{debug, trace, warn};

pub use compensation::{Compensator, Measurement, Precision};
pub use error::{Error, Result};
pub use register::{Filter, Mode, Oversampling, RawSample, Settings, Standby, Status};
pub use transport::{I2cTransport, SpiBusError, SpiBusTransport, SpiTransport, Transport};

use register::{
    CALIB_A_LEN, CALIB_B_LEN, CHIP_ID, DATA_LEN, REG_CALIB_A, REG_CALIB_B, REG_CONFIG,
    REG_CTRL_HUM, REG_CTRL_MEAS, REG_DATA, REG_ID, REG_RESET, REG_STATUS, RESET_COMMAND,
};

/// 软复位后等待NVM复制的时间
const RESET_DELAY_MS: u32 = 50;
/// 复位后轮询芯片ID和状态寄存器的次数
const RESET_POLL_ATTEMPTS: usize = 5;
/// 复位后轮询间隔
const RESET_POLL_INTERVAL_MS: u32 = 10;
/// 强制模式下等待测量完成的默认轮询间隔
pub const DEFAULT_POLL_INTERVAL_MS: u32 = 50;

/// BME280 大气压力、温度、湿度传感器封装对象
///
/// 同一个实例不支持并发访问，多线程使用时需要在外部对整个实例加锁。
pub struct BME280<T, D> {
    /// 寄存器通道，关闭后为 `None`
    bus: Option<T>,
    /// 延时
    delay: D,
    /// 补偿计算精度
    precision: Precision,
    /// 补偿引擎，复位成功后才有值
    compensator: Option<Compensator>,
    /// 最后一次写入 `config` 的值
    cache_config: Option<u8>,
    /// 最后一次写入 `ctrl_hum` 的值
    cache_ctrl_hum: Option<u8>,
}

impl<T: Transport, D: DelayNs> BME280<T, D> {
    /// 创建BME280传感器实例
    ///
    /// 不访问总线，第一次配置或读取时自动复位。
    pub fn new(bus: T, delay: D, precision: Precision) -> Self {
        Self {
            bus: Some(bus),
            delay,
            precision,
            compensator: None,
            cache_config: None,
            cache_ctrl_hum: None,
        }
    }

    /// 补偿计算精度
    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// 是否还没有关闭
    pub fn is_open(&self) -> bool {
        self.bus.is_some()
    }

    fn bus(&mut self) -> Result<&mut T, T::Error> {
        self.bus.as_mut().ok_or(Error::NotOpen)
    }

    fn read_u8(&mut self, reg: u8) -> Result<u8, T::Error> {
        let mut data = [0u8];
        self.bus()?.read(reg, &mut data).map_err(Error::Transport)?;
        Ok(data[0])
    }

    fn write_u8(&mut self, reg: u8, value: u8) -> Result<(), T::Error> {
        self.bus()?.write(reg, &[value]).map_err(Error::Transport)
    }

    fn read_burst<const N: usize>(&mut self, reg: u8) -> Result<[u8; N], T::Error> {
        let mut data = [0u8; N];
        self.bus()?.read(reg, &mut data).map_err(Error::Transport)?;
        Ok(data)
    }

    fn read_status(&mut self) -> Result<Status, T::Error> {
        Ok(Status::from(self.read_u8(REG_STATUS)?))
    }

    /// 软复位传感器
    ///
    /// 写入复位命令，等待芯片ID和状态寄存器就绪，然后重新读取校准数据。
    /// 写入缓存和之前的校准数据在开始时就失效。
    pub fn reset(&mut self) -> Result<(), T::Error> {
        self.reset_and_calibrate().map(|_| ())
    }

    fn reset_and_calibrate(&mut self) -> Result<Compensator, T::Error> {
        self.bus()?;
        self.cache_config = None;
        self.cache_ctrl_hum = None;
        self.compensator = None;

        // 软重置
        self.write_u8(REG_RESET, RESET_COMMAND)?;
        // 等待NVM数据复制到镜像寄存器
        self.delay.delay_ms(RESET_DELAY_MS);

        // 检查芯片ID
        let mut id = 0;
        for _ in 0..RESET_POLL_ATTEMPTS {
            id = self.read_u8(REG_ID)?;
            if id == CHIP_ID {
                break;
            }
            self.delay.delay_ms(RESET_POLL_INTERVAL_MS);
        }
        if id != CHIP_ID {
            return Err(Error::Identity(id));
        }

        // 等待 im_update 和 measuring 都清零
        let mut ready = false;
        for _ in 0..RESET_POLL_ATTEMPTS {
            if self.read_status()?.is_idle() {
                ready = true;
                break;
            }
            self.delay.delay_ms(RESET_POLL_INTERVAL_MS);
        }
        if !ready {
            return Err(Error::StatusTimeout);
        }

        // 读取校准数据
        let block_a = self.read_burst::<CALIB_A_LEN>(REG_CALIB_A)?;
        let block_b = self.read_burst::<CALIB_B_LEN>(REG_CALIB_B)?;
        let calib = calibration::decode(&block_a, &block_b);
        debug!("BME280复位完成，校准参数: {:?}", calib);

        let compensator = Compensator::new(self.precision, calib);
        self.compensator = Some(compensator);

        // OK
        Ok(compensator)
    }

    /// 取得补偿引擎，从未复位过时先复位
    fn compensator(&mut self) -> Result<Compensator, T::Error> {
        match self.compensator {
            Some(compensator) => Ok(compensator),
            None => self.reset_and_calibrate(),
        }
    }

    /// 写入 `config`，与上次写入的值相同时跳过
    fn write_config(&mut self, settings: &Settings) -> Result<(), T::Error> {
        let value = settings.config_byte();
        if self.cache_config == Some(value) {
            trace!("config 未变化，跳过写入");
            return Ok(());
        }
        self.write_u8(REG_CONFIG, value)?;
        // 写入成功后才更新缓存
        self.cache_config = Some(value);
        Ok(())
    }

    /// 写入 `ctrl_hum`，与上次写入的值相同时跳过
    fn write_ctrl_hum(&mut self, settings: &Settings) -> Result<(), T::Error> {
        let value = settings.ctrl_hum_byte();
        if self.cache_ctrl_hum == Some(value) {
            trace!("ctrl_hum 未变化，跳过写入");
            return Ok(());
        }
        self.write_u8(REG_CTRL_HUM, value)?;
        self.cache_ctrl_hum = Some(value);
        Ok(())
    }

    /// 配置传感器
    ///
    /// 依次写入 `config`、`ctrl_hum`、`ctrl_meas`。前两个寄存器带写入缓存；
    /// `ctrl_meas` 每次都写，因为强制模式下写它就是触发一次测量，
    /// 而且 `ctrl_hum` 的修改要在写 `ctrl_meas` 之后才生效。
    pub fn configure(&mut self, mode: Mode, settings: &Settings) -> Result<(), T::Error> {
        self.bus()?;
        if self.compensator.is_none() {
            self.reset()?;
        }

        self.write_config(settings)?;
        self.write_ctrl_hum(settings)?;
        self.write_u8(REG_CTRL_MEAS, settings.ctrl_meas_byte(mode))?;
        debug!("BME280配置为 {:?}: {:?}", mode, settings);

        // OK
        Ok(())
    }

    /// 传感器是否正在测量
    ///
    /// 强制模式下返回 `false` 即可读取新数据。
    pub fn is_measuring(&mut self) -> Result<bool, T::Error> {
        Ok(self.read_status()?.measuring)
    }

    /// 读取数据寄存器中最新的测量结果并补偿
    ///
    /// 不会触发测量，正常模式下直接使用；强制模式请用 [`Self::read_forced`]。
    pub fn read(&mut self) -> Result<Measurement, T::Error> {
        let compensator = self.compensator()?;

        // 读取原始数据
        let data = self.read_burst::<DATA_LEN>(REG_DATA)?;
        let raw = RawSample::from_burst(&data);
        trace!("BME280原始数据: {:?}", raw);

        // 使用补偿公式补偿数据
        Ok(compensator.compensate(raw.temperature, raw.humidity, raw.pressure))
    }

    /// 触发一次强制模式测量，等待完成后读取结果
    ///
    /// 以默认的50ms间隔轮询测量状态。
    pub fn read_forced(&mut self, settings: &Settings) -> Result<Measurement, T::Error> {
        self.read_forced_polling(settings, DEFAULT_POLL_INTERVAL_MS)
    }

    /// 触发一次强制模式测量，按 `poll_interval_ms` 轮询直到完成后读取结果
    ///
    /// 等待没有次数上限，测量时间由传感器硬件保证。
    pub fn read_forced_polling(
        &mut self,
        settings: &Settings,
        poll_interval_ms: u32,
    ) -> Result<Measurement, T::Error> {
        self.configure(Mode::Forced, settings)?;
        while self.is_measuring()? {
            self.delay.delay_ms(poll_interval_ms);
        }
        self.read()
    }

    /// 关闭传感器并取回寄存器通道
    ///
    /// 尽量让传感器进入休眠模式，失败时只记录日志。已经关闭时返回 `None`。
    pub fn close(&mut self) -> Option<T> {
        if self.bus.is_none() {
            return None;
        }

        if let Err(err) = self.configure(Mode::Sleep, &Settings::default()) {
            warn!("BME280进入休眠模式失败: {}", err);
        }

        self.compensator = None;
        self.cache_config = None;
        self.cache_ctrl_hum = None;
        self.bus.take()
    }

    /// 不访问总线，直接销毁实例并取回寄存器通道
    pub fn release(self) -> Option<T> {
        self.bus
    }
}
