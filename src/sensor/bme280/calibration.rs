use super::register::{CALIB_A_LEN, CALIB_B_LEN, REG_CALIB_A, REG_CALIB_B};

// 校准参数寄存器地址
const REG_DIG_T1: u8 = 0x88;
const REG_DIG_T2: u8 = 0x8A;
const REG_DIG_T3: u8 = 0x8C;
const REG_DIG_P1: u8 = 0x8E;
const REG_DIG_P2: u8 = 0x90;
const REG_DIG_P3: u8 = 0x92;
const REG_DIG_P4: u8 = 0x94;
const REG_DIG_P5: u8 = 0x96;
const REG_DIG_P6: u8 = 0x98;
const REG_DIG_P7: u8 = 0x9A;
const REG_DIG_P8: u8 = 0x9C;
const REG_DIG_P9: u8 = 0x9E;
const REG_DIG_H1: u8 = 0xA1;
const REG_DIG_H2: u8 = 0xE1;
const REG_DIG_H3: u8 = 0xE3;
// 12位大端，与下一个参数共用 0xE5 字节
const REG_DIG_H4: u8 = 0xE4;
// 12位小端，与上一个参数共用 0xE5 字节
const REG_DIG_H5: u8 = 0xE5;
const REG_DIG_H6: u8 = 0xE7;

/// 按补码解释 `value` 的低 `bits` 位
///
/// 符号位 (第 `bits - 1` 位) 为1时返回 `-(((!v) + 1) & mask)`。
/// 所有 8/12/16 位的有符号校准参数都经过这里转换。
pub fn twos_complement(value: u32, bits: u32) -> i32 {
    debug_assert!((1..=16).contains(&bits));
    let mask = (1u32 << bits) - 1;
    let value = value & mask;
    if value & (1 << (bits - 1)) != 0 {
        -(((!value).wrapping_add(1) & mask) as i32)
    } else {
        value as i32
    }
}

/// BME280传感器校准参数
///
/// 从传感器 NVM 中读取，每次复位后重新读取。温度3个、压力9个、湿度6个。
/// `T` 是参数的存储类型：浮点补偿用 `f64`，整数补偿用 `i64`，
/// 解码阶段先得到 `i32` 再通过 [`Calibration::map`] 转换一次。
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Calibration<T> {
    /// 无符号16位，0x88-0x89
    pub dig_t1: T,
    /// 有符号16位，0x8A-0x8B
    pub dig_t2: T,
    /// 有符号16位，0x8C-0x8D
    pub dig_t3: T,

    /// 无符号16位，0x8E-0x8F
    pub dig_p1: T,
    pub dig_p2: T,
    pub dig_p3: T,
    pub dig_p4: T,
    pub dig_p5: T,
    pub dig_p6: T,
    pub dig_p7: T,
    pub dig_p8: T,
    /// 有符号16位，0x9E-0x9F
    pub dig_p9: T,

    /// 无符号8位，0xA1
    pub dig_h1: T,
    /// 有符号16位，0xE1-0xE2
    pub dig_h2: T,
    /// 无符号8位，0xE3
    pub dig_h3: T,
    /// 有符号12位: 0xE4[7:0] << 4 | 0xE5[3:0]
    pub dig_h4: T,
    /// 有符号12位: 0xE6[7:0] << 4 | 0xE5[7:4]
    pub dig_h5: T,
    /// 有符号8位，0xE7
    pub dig_h6: T,
}

impl<T> Calibration<T> {
    /// 把所有参数转换成另一种存储类型
    pub fn map<U>(self, f: impl Fn(T) -> U) -> Calibration<U> {
        Calibration {
            dig_t1: f(self.dig_t1),
            dig_t2: f(self.dig_t2),
            dig_t3: f(self.dig_t3),
            dig_p1: f(self.dig_p1),
            dig_p2: f(self.dig_p2),
            dig_p3: f(self.dig_p3),
            dig_p4: f(self.dig_p4),
            dig_p5: f(self.dig_p5),
            dig_p6: f(self.dig_p6),
            dig_p7: f(self.dig_p7),
            dig_p8: f(self.dig_p8),
            dig_p9: f(self.dig_p9),
            dig_h1: f(self.dig_h1),
            dig_h2: f(self.dig_h2),
            dig_h3: f(self.dig_h3),
            dig_h4: f(self.dig_h4),
            dig_h5: f(self.dig_h5),
            dig_h6: f(self.dig_h6),
        }
    }
}

/// 两次突发读取得到的校准数据，按寄存器地址访问
struct Nvm<'a> {
    block_a: &'a [u8; CALIB_A_LEN],
    block_b: &'a [u8; CALIB_B_LEN],
}

impl Nvm<'_> {
    fn u8(&self, reg: u8) -> u32 {
        if reg >= REG_CALIB_B {
            self.block_b[(reg - REG_CALIB_B) as usize] as u32
        } else {
            self.block_a[(reg - REG_CALIB_A) as usize] as u32
        }
    }

    fn s8(&self, reg: u8) -> i32 {
        twos_complement(self.u8(reg), 8)
    }

    fn u16_le(&self, reg: u8) -> u32 {
        (self.u8(reg + 1) << 8) | self.u8(reg)
    }

    fn s16_le(&self, reg: u8) -> i32 {
        twos_complement(self.u16_le(reg), 16)
    }

    fn s12_be(&self, reg: u8) -> i32 {
        twos_complement((self.u8(reg) << 4) | (self.u8(reg + 1) & 0x0F), 12)
    }

    fn s12_le(&self, reg: u8) -> i32 {
        twos_complement((self.u8(reg + 1) << 4) | (self.u8(reg) >> 4), 12)
    }
}

/// 解码校准数据
///
/// - `block_a`: 0x88-0xA1 共26字节（温度、压力参数以及 dig_H1）
/// - `block_b`: 0xE1-0xE7 共7字节（其余湿度参数）
pub fn decode(block_a: &[u8; CALIB_A_LEN], block_b: &[u8; CALIB_B_LEN]) -> Calibration<i32> {
    let nvm = Nvm { block_a, block_b };

    Calibration {
        dig_t1: nvm.u16_le(REG_DIG_T1) as i32,
        dig_t2: nvm.s16_le(REG_DIG_T2),
        dig_t3: nvm.s16_le(REG_DIG_T3),
        dig_p1: nvm.u16_le(REG_DIG_P1) as i32,
        dig_p2: nvm.s16_le(REG_DIG_P2),
        dig_p3: nvm.s16_le(REG_DIG_P3),
        dig_p4: nvm.s16_le(REG_DIG_P4),
        dig_p5: nvm.s16_le(REG_DIG_P5),
        dig_p6: nvm.s16_le(REG_DIG_P6),
        dig_p7: nvm.s16_le(REG_DIG_P7),
        dig_p8: nvm.s16_le(REG_DIG_P8),
        dig_p9: nvm.s16_le(REG_DIG_P9),
        dig_h1: nvm.u8(REG_DIG_H1) as i32,
        dig_h2: nvm.s16_le(REG_DIG_H2),
        dig_h3: nvm.u8(REG_DIG_H3) as i32,
        dig_h4: nvm.s12_be(REG_DIG_H4),
        dig_h5: nvm.s12_le(REG_DIG_H5),
        dig_h6: nvm.s8(REG_DIG_H6),
    }
}
