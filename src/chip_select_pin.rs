use std::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin, PinState};
use rppal::gpio::{self, Gpio};

/// SPI片选引脚封装
///
/// 用普通GPIO作为片选线，低电平有效，创建后默认处于无效(高电平)状态。
pub struct ChipSelectPin {
    pin: gpio::OutputPin,
}

impl ErrorType for ChipSelectPin {
    type Error = Infallible;
}

impl ChipSelectPin {
    /// 占用 `pin` 号GPIO作为片选线
    pub fn new(pin: u8) -> anyhow::Result<Self> {
        // 构建针脚GPIO对象，先输出高电平避免误选中
        let gpio = Gpio::new()?;
        let pin = gpio.get(pin)?.into_output_high();
        // OK
        Ok(Self { pin })
    }
}

impl OutputPin for ChipSelectPin {
    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.pin.set_high();
        Ok(())
    }

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.pin.set_low();
        Ok(())
    }

    fn set_state(&mut self, state: PinState) -> Result<(), Self::Error> {
        match state {
            PinState::High => self.pin.set_high(),
            PinState::Low => self.pin.set_low(),
        }
        Ok(())
    }
}
