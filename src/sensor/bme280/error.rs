use std::fmt::{self, Debug};

/// BME280驱动错误
///
/// `E` 是底层寄存器通道的错误类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E> {
    /// 总线通信失败
    Transport(E),
    /// 复位后芯片ID始终不正确，携带最后一次读到的值
    Identity(u8),
    /// 复位后状态寄存器的忙碌位始终没有清零
    StatusTimeout,
    /// 设备已经关闭
    NotOpen,
}

impl<E: Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(err) => write!(f, "BME280总线通信失败: {:?}", err),
            Self::Identity(id) => write!(f, "BME280芯片ID不正确: 0x{:02X}", id),
            Self::StatusTimeout => write!(f, "BME280状态寄存器一直处于忙碌状态"),
            Self::NotOpen => write!(f, "BME280设备未打开"),
        }
    }
}

impl<E: Debug> std::error::Error for Error<E> {}

/// 驱动操作结果
pub type Result<T, E> = core::result::Result<T, Error<E>>;
