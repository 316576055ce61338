use std::fmt::{self, Debug};

use embedded_hal::digital::OutputPin;
use embedded_hal::i2c::I2c;
use embedded_hal::spi::{SpiBus, SpiDevice};
use log::warn;

/// I2C默认从设备地址 (SDO接地)
pub const I2C_ADDR_PRIMARY: u8 = 0x76;
/// I2C备用从设备地址 (SDO接VDDIO)
pub const I2C_ADDR_SECONDARY: u8 = 0x77;

/// SPI寄存器地址的读写位
const SPI_RW_BIT: u8 = 0x80;

/// 寄存器读写通道
///
/// 驱动只通过这两个操作访问传感器，总线错误原样返回，不在这一层重试。
pub trait Transport {
    type Error: Debug;

    /// 从 `reg` 开始连续写入 `data`
    fn write(&mut self, reg: u8, data: &[u8]) -> Result<(), Self::Error>;

    /// 从 `reg` 开始连续读取 `buf.len()` 个字节
    fn read(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), Self::Error>;
}

/// I2C寄存器通道
pub struct I2cTransport<I2C> {
    i2c: I2C,
    addr: u8,
}

impl<I2C: I2c> I2cTransport<I2C> {
    /// 创建I2C通道
    /// - `addr`: 从设备地址，0x76 或 0x77
    pub fn new(i2c: I2C, addr: u8) -> Self {
        Self { i2c, addr }
    }

    /// 取回底层I2C总线
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c> Transport for I2cTransport<I2C> {
    type Error = I2C::Error;

    fn write(&mut self, reg: u8, data: &[u8]) -> Result<(), Self::Error> {
        // 寄存器地址在前，数据紧随其后，一帧发完
        let mut frame = Vec::with_capacity(data.len() + 1);
        frame.push(reg);
        frame.extend_from_slice(data);
        self.i2c.write(self.addr, &frame)
    }

    fn read(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.i2c.write_read(self.addr, &[reg], buf)
    }
}

/// 组装SPI读帧: 首字节是置位读写位的地址，其余字节占位
fn spi_read_frame(reg: u8, len: usize) -> Vec<u8> {
    vec![reg | SPI_RW_BIT; len + 1]
}

/// 组装SPI写帧: 首字节是清零读写位的地址
fn spi_write_frame(reg: u8, data: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(data.len() + 1);
    frame.push(reg & !SPI_RW_BIT);
    frame.extend_from_slice(data);
    frame
}

/// 片选由HAL管理的SPI寄存器通道
pub struct SpiTransport<SPI> {
    spi: SPI,
}

impl<SPI: SpiDevice> SpiTransport<SPI> {
    pub fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// 取回底层SPI设备
    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI: SpiDevice> Transport for SpiTransport<SPI> {
    type Error = SPI::Error;

    fn write(&mut self, reg: u8, data: &[u8]) -> Result<(), Self::Error> {
        self.spi.write(&spi_write_frame(reg, data))
    }

    fn read(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        // 全双工传输，丢弃地址阶段收到的第一个字节
        let mut frame = spi_read_frame(reg, buf.len());
        self.spi.transfer_in_place(&mut frame)?;
        buf.copy_from_slice(&frame[1..]);
        Ok(())
    }
}

/// 手动片选SPI通道的错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpiBusError<S, P> {
    /// SPI总线错误
    Spi(S),
    /// 片选引脚错误
    ChipSelect(P),
}

impl<S: Debug, P: Debug> fmt::Display for SpiBusError<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spi(err) => write!(f, "SPI总线错误: {:?}", err),
            Self::ChipSelect(err) => write!(f, "片选引脚错误: {:?}", err),
        }
    }
}

impl<S: Debug, P: Debug> std::error::Error for SpiBusError<S, P> {}

/// 片选守卫，创建时拉低片选，离开作用域时无论成败都拉高
struct ChipSelectGuard<'a, CS: OutputPin> {
    cs: &'a mut CS,
}

impl<'a, CS: OutputPin> ChipSelectGuard<'a, CS> {
    fn select(cs: &'a mut CS) -> Result<Self, CS::Error> {
        cs.set_low()?;
        Ok(Self { cs })
    }
}

impl<CS: OutputPin> Drop for ChipSelectGuard<'_, CS> {
    fn drop(&mut self) {
        if let Err(err) = self.cs.set_high() {
            warn!("释放SPI片选失败: {:?}", err);
        }
    }
}

/// 片选由调用方GPIO控制的SPI寄存器通道
///
/// 每次读写都在片选有效期内完成一次传输，适用于软件片选或模拟SPI。
pub struct SpiBusTransport<SPI, CS> {
    spi: SPI,
    cs: CS,
}

impl<SPI: SpiBus, CS: OutputPin> SpiBusTransport<SPI, CS> {
    /// 创建通道并先把片选置为无效
    pub fn new(spi: SPI, mut cs: CS) -> Result<Self, SpiBusError<SPI::Error, CS::Error>> {
        cs.set_high().map_err(SpiBusError::ChipSelect)?;
        Ok(Self { spi, cs })
    }

    /// 取回SPI总线和片选引脚
    pub fn release(self) -> (SPI, CS) {
        (self.spi, self.cs)
    }
}

impl<SPI: SpiBus, CS: OutputPin> Transport for SpiBusTransport<SPI, CS> {
    type Error = SpiBusError<SPI::Error, CS::Error>;

    fn write(&mut self, reg: u8, data: &[u8]) -> Result<(), Self::Error> {
        let frame = spi_write_frame(reg, data);

        let _cs = ChipSelectGuard::select(&mut self.cs).map_err(SpiBusError::ChipSelect)?;
        self.spi.write(&frame).map_err(SpiBusError::Spi)?;
        self.spi.flush().map_err(SpiBusError::Spi)
    }

    fn read(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        let mut frame = spi_read_frame(reg, buf.len());

        {
            let _cs = ChipSelectGuard::select(&mut self.cs).map_err(SpiBusError::ChipSelect)?;
            self.spi
                .transfer_in_place(&mut frame)
                .map_err(SpiBusError::Spi)?;
            self.spi.flush().map_err(SpiBusError::Spi)?;
        }

        buf.copy_from_slice(&frame[1..]);
        Ok(())
    }
}
