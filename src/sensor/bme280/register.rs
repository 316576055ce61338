//! BME280 寄存器地址、配置枚举以及状态寄存器解析

/// 校准数据块A起始地址 (dig_T1 .. dig_H1, 0x88-0xA1)
pub const REG_CALIB_A: u8 = 0x88;
/// 校准数据块A长度
pub const CALIB_A_LEN: usize = 26;
/// 校准数据块B起始地址 (dig_H2 .. dig_H6, 0xE1-0xE7)
pub const REG_CALIB_B: u8 = 0xE1;
/// 校准数据块B长度
pub const CALIB_B_LEN: usize = 7;

/// 芯片ID寄存器
pub const REG_ID: u8 = 0xD0;
/// BME280的固定芯片ID
pub const CHIP_ID: u8 = 0x60;
/// 软复位寄存器
pub const REG_RESET: u8 = 0xE0;
/// 写入复位寄存器触发软复位的命令字
pub const RESET_COMMAND: u8 = 0xB6;

pub const REG_CTRL_HUM: u8 = 0xF2;
pub const REG_STATUS: u8 = 0xF3;
pub const REG_CTRL_MEAS: u8 = 0xF4;
pub const REG_CONFIG: u8 = 0xF5;

/// 测量数据突发读取起始地址 (press_msb)
pub const REG_DATA: u8 = 0xF7;
/// 测量数据长度: 压力3字节 + 温度3字节 + 湿度2字节
pub const DATA_LEN: usize = 8;

/// 工作模式 (ctrl_meas[1:0])
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Mode {
    /// 休眠模式，不进行测量
    Sleep = 0b00,
    /// 强制模式，测量一次后自动回到休眠
    Forced = 0b01,
    /// 正常模式，按待机时间循环测量
    Normal = 0b11,
}

/// 过采样设置 (osrs_h / osrs_p / osrs_t)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Oversampling {
    /// 跳过该项测量
    Skip = 0b000,
    X1 = 0b001,
    X2 = 0b010,
    X4 = 0b011,
    X8 = 0b100,
    X16 = 0b101,
}

/// 正常模式下两次测量之间的待机时间 (config[7:5])
///
/// 注意编码不是单调的，10ms 和 20ms 排在最后
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Standby {
    Ms0_5 = 0b000,
    Ms62_5 = 0b001,
    Ms125 = 0b010,
    Ms250 = 0b011,
    Ms500 = 0b100,
    Ms1000 = 0b101,
    Ms10 = 0b110,
    Ms20 = 0b111,
}

/// IIR滤波器系数 (config[4:2])
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Filter {
    Off = 0b000,
    X2 = 0b001,
    X4 = 0b010,
    X8 = 0b011,
    X16 = 0b100,
}

/// 传感器测量配置
///
/// 对应 `config`、`ctrl_hum`、`ctrl_meas` 三个寄存器中除工作模式以外的全部字段，
/// 工作模式在每次配置时单独给出。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// 待机时间
    pub standby: Standby,
    /// IIR滤波器
    pub filter: Filter,
    /// 是否启用3线SPI
    pub spi3w: bool,
    /// 温度过采样
    pub osrs_t: Oversampling,
    /// 湿度过采样
    pub osrs_h: Oversampling,
    /// 压力过采样
    pub osrs_p: Oversampling,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            standby: Standby::Ms125,
            filter: Filter::Off,
            spi3w: false,
            osrs_t: Oversampling::X1,
            osrs_h: Oversampling::X1,
            osrs_p: Oversampling::X1,
        }
    }
}

impl Settings {
    /// 编码 `config` 寄存器: t_sb[7:5] | filter[4:2] | spi3w_en[0]
    pub fn config_byte(&self) -> u8 {
        ((self.standby as u8 & 0b111) << 5)
            | ((self.filter as u8 & 0b111) << 2)
            | (self.spi3w as u8)
    }

    /// 编码 `ctrl_hum` 寄存器: osrs_h[2:0]
    pub fn ctrl_hum_byte(&self) -> u8 {
        self.osrs_h as u8 & 0b111
    }

    /// 编码 `ctrl_meas` 寄存器: osrs_t[7:5] | osrs_p[4:2] | mode[1:0]
    pub fn ctrl_meas_byte(&self, mode: Mode) -> u8 {
        ((self.osrs_t as u8 & 0b111) << 5) | ((self.osrs_p as u8 & 0b111) << 2) | (mode as u8 & 0b11)
    }
}

/// BME280 状态寄存器 (0xF3)
///
/// 二进制位从右往左数，例如：0b00000001, 第0位是1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    /// NVM数据正在复制到镜像寄存器
    ///
    /// 二进制位第0位:
    /// - 0--复制完成
    /// - 1--正在复制（上电或复位后）
    pub im_update: bool,
    /// 是否正在转换
    ///
    /// 二进制位第3位:
    /// - 0--测量结果已经写入数据寄存器
    /// - 1--正在测量
    pub measuring: bool,
}

impl Status {
    /// 解析状态
    pub fn from(data: u8) -> Self {
        Self {
            im_update: (data & 0b0000_0001) != 0,
            measuring: (data & 0b0000_1000) != 0,
        }
    }

    /// 两个忙碌位都已清零
    pub fn is_idle(&self) -> bool {
        !self.im_update && !self.measuring
    }
}

/// 一次突发读取得到的原始ADC值
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSample {
    /// 20位压力原始值
    pub pressure: u32,
    /// 20位温度原始值
    pub temperature: u32,
    /// 16位湿度原始值
    pub humidity: u32,
}

impl RawSample {
    /// 解析 0xF7-0xFE 的8字节突发数据
    pub fn from_burst(data: &[u8; DATA_LEN]) -> Self {
        // 解析20位压力数据 (0xF7-0xF9)
        let pressure = ((data[0] as u32) << 12) | ((data[1] as u32) << 4) | ((data[2] as u32) >> 4);
        // 解析20位温度数据 (0xFA-0xFC)
        let temperature =
            ((data[3] as u32) << 12) | ((data[4] as u32) << 4) | ((data[5] as u32) >> 4);
        // 解析16位湿度数据 (0xFD-0xFE)
        let humidity = ((data[6] as u32) << 8) | (data[7] as u32);

        Self {
            pressure,
            temperature,
            humidity,
        }
    }
}
