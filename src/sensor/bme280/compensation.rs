use super::calibration::Calibration;

/// 温度输出范围 (°C)
pub const TEMPERATURE_MIN: f64 = -40.0;
pub const TEMPERATURE_MAX: f64 = 85.0;
/// 相对湿度输出范围 (0.0 = 0%, 1.0 = 100%)
pub const HUMIDITY_MIN: f64 = 0.0;
pub const HUMIDITY_MAX: f64 = 1.0;
/// 压力输出范围 (Pa)
pub const PRESSURE_MIN: f64 = 30000.0;
pub const PRESSURE_MAX: f64 = 110000.0;

/// 补偿计算精度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precision {
    /// 双精度浮点公式
    #[default]
    Float,
    /// 32位定点公式
    Int32,
    /// 64位定点压力公式，温度和湿度沿用32位公式
    Int64,
}

/// 补偿后的测量结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    /// 温度 (°C)
    pub temperature: f64,
    /// 相对湿度，0.0 - 1.0
    pub humidity: f64,
    /// 气压 (Pa)
    pub pressure: f64,
}

/// 向负无穷取整的整数除法
///
/// 定点公式里的除法必须按这个方向截断，换成四舍五入或向零截断都会改变结果。
fn floor_div(numerator: i128, denominator: i128) -> i128 {
    let quotient = numerator / denominator;
    if numerator % denominator != 0 && ((numerator < 0) != (denominator < 0)) {
        quotient - 1
    } else {
        quotient
    }
}

/// 补偿计算引擎
///
/// 构造时确定精度，校准参数在此时一次性转换成对应的存储类型。
/// 所有方法都是纯计算，不访问总线。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Compensator {
    Float(Calibration<f64>),
    Int32(Calibration<i64>),
    Int64(Calibration<i64>),
}

impl Compensator {
    /// 根据精度转换校准参数
    pub fn new(precision: Precision, calib: Calibration<i32>) -> Self {
        match precision {
            Precision::Float => Self::Float(calib.map(f64::from)),
            Precision::Int32 => Self::Int32(calib.map(i64::from)),
            Precision::Int64 => Self::Int64(calib.map(i64::from)),
        }
    }

    /// 当前使用的精度
    pub fn precision(&self) -> Precision {
        match self {
            Self::Float(_) => Precision::Float,
            Self::Int32(_) => Precision::Int32,
            Self::Int64(_) => Precision::Int64,
        }
    }

    /// 依次补偿温度、湿度、压力
    ///
    /// 温度必须最先计算，它产生的 t_fine 是后两者的输入。
    pub fn compensate(&self, adc_t: u32, adc_h: u32, adc_p: u32) -> Measurement {
        let (t_fine, temperature) = self.temperature(adc_t);
        let humidity = self.humidity(t_fine, adc_h);
        let pressure = self.pressure(t_fine, adc_p);

        Measurement {
            temperature,
            humidity,
            pressure,
        }
    }

    /// 温度补偿
    ///
    /// 返回 `(t_fine, 摄氏度)`，t_fine 不做限幅，摄氏度限制在 [-40, 85]。
    pub fn temperature(&self, adc_t: u32) -> (i64, f64) {
        let (t_fine, celsius) = match self {
            Self::Float(calib) => temperature_float(calib, adc_t),
            Self::Int32(calib) | Self::Int64(calib) => {
                let (t_fine, centi) = temperature_int32(calib, adc_t);
                (t_fine, centi as f64 * 1e-2)
            }
        };
        (t_fine, celsius.clamp(TEMPERATURE_MIN, TEMPERATURE_MAX))
    }

    /// 湿度补偿，返回 [0, 1] 之间的相对湿度
    pub fn humidity(&self, t_fine: i64, adc_h: u32) -> f64 {
        let humidity = match self {
            Self::Float(calib) => humidity_float(calib, t_fine, adc_h) * 1e-2,
            // 64位模式没有单独的湿度公式
            Self::Int32(calib) | Self::Int64(calib) => {
                humidity_int32(calib, t_fine, adc_h) as f64 / 102400.0
            }
        };
        humidity.clamp(HUMIDITY_MIN, HUMIDITY_MAX)
    }

    /// 压力补偿，返回帕斯卡
    ///
    /// 正常结果限制在 [30000, 110000]。分母为零时返回 0.0，不做限幅。
    pub fn pressure(&self, t_fine: i64, adc_p: u32) -> f64 {
        let pressure = match self {
            Self::Float(calib) => pressure_float(calib, t_fine, adc_p),
            Self::Int32(calib) => pressure_int32(calib, t_fine, adc_p).map(|p| p as f64),
            Self::Int64(calib) => pressure_int64(calib, t_fine, adc_p).map(|p| p as f64 / 256.0),
        };

        match pressure {
            Some(pressure) => pressure.clamp(PRESSURE_MIN, PRESSURE_MAX),
            None => 0.0,
        }
    }
}

/// 浮点温度公式
///
/// t_fine 向零取整后作为后续计算的输入，摄氏度用未取整的值计算。
fn temperature_float(calib: &Calibration<f64>, adc_t: u32) -> (i64, f64) {
    let ut = adc_t as f64;
    let t1 = calib.dig_t1;
    let t2 = calib.dig_t2;
    let t3 = calib.dig_t3;

    let var1 = (ut / 16384.0 - t1 / 1024.0) * t2;
    let var2 = ut / 131072.0 - t1 / 8192.0;
    let var2 = var2 * var2 * t3;

    let t_fine = var1 + var2;
    (t_fine as i64, t_fine / 5120.0)
}

/// 32位定点温度公式，返回 `(t_fine, 0.01°C)`
fn temperature_int32(calib: &Calibration<i64>, adc_t: u32) -> (i64, i64) {
    let ut = adc_t as i64;
    let t1 = calib.dig_t1;
    let t2 = calib.dig_t2;
    let t3 = calib.dig_t3;

    let var1 = (((ut >> 3) - (t1 << 1)) * t2) >> 11;
    let var2 = (ut >> 4) - t1;
    let var2 = (((var2 * var2) >> 12) * t3) >> 14;

    let t_fine = var1 + var2;
    (t_fine, (t_fine * 5 + 128) >> 8)
}

/// 浮点压力公式，分母为零时返回 `None`
fn pressure_float(calib: &Calibration<f64>, t_fine: i64, adc_p: u32) -> Option<f64> {
    let up = adc_p as f64;
    let t_fine = t_fine as f64;

    // 步骤1: 温度相关项
    let mut var1 = (t_fine / 2.0) - 64000.0;
    let mut var2 = var1 * var1 * calib.dig_p6 / 32768.0;
    var2 += var1 * calib.dig_p5 * 2.0;
    var2 = (var2 / 4.0) + (calib.dig_p4 * 65536.0);
    var1 = (calib.dig_p3 * var1 * var1 / 524288.0 + calib.dig_p2 * var1) / 524288.0;
    var1 = (1.0 + var1 / 32768.0) * calib.dig_p1;

    // 步骤2: 检查除零
    if var1 == 0.0 {
        return None;
    }

    // 步骤3: 压力值及非线性修正
    let mut p = ((1048576.0 - up) - (var2 / 4096.0)) * 6250.0 / var1;
    var1 = calib.dig_p9 * p * p / 2147483648.0;
    var2 = p * calib.dig_p8 / 32768.0;
    p += (var1 + var2 + calib.dig_p7) / 16.0;

    Some(p)
}

/// 32位定点压力公式，返回帕斯卡；分母为零时返回 `None`
///
/// 分母很小时商会超出64位，中间结果统一用 `i128`。
fn pressure_int32(calib: &Calibration<i64>, t_fine: i64, adc_p: u32) -> Option<i128> {
    let calib = calib.map(i128::from);
    let up = i128::from(adc_p);

    let mut var1 = (i128::from(t_fine) >> 1) - 64000;
    let quarter = var1 >> 2;
    let mut var2 = ((quarter * quarter) >> 11) * calib.dig_p6;
    var2 += (var1 * calib.dig_p5) << 1;
    var2 = (var2 >> 2) + (calib.dig_p4 << 16);
    var1 = (((calib.dig_p3 * ((quarter * quarter) >> 13)) >> 3) + ((calib.dig_p2 * var1) >> 1)) >> 18;
    var1 = ((32768 + var1) * calib.dig_p1) >> 15;

    if var1 == 0 {
        return None;
    }

    let mut p = floor_div(((1048576 - up) - (var2 >> 12)) * 3125, var1) << 1;
    let eighth = p >> 3;
    var1 = (calib.dig_p9 * ((eighth * eighth) >> 13)) >> 12;
    var2 = (calib.dig_p8 * (p >> 2)) >> 13;
    p += (var1 + var2 + calib.dig_p7) >> 4;

    Some(p)
}

/// 64位定点压力公式，返回 Q24.8 格式（除以256得到帕斯卡）；分母为零时返回 `None`
///
/// 极端校准参数下乘积超出 `i64`，中间结果用 `i128`。
fn pressure_int64(calib: &Calibration<i64>, t_fine: i64, adc_p: u32) -> Option<i128> {
    let calib = calib.map(i128::from);
    let up = i128::from(adc_p);

    let mut var1 = i128::from(t_fine) - 128000;
    let mut var2 = var1 * var1 * calib.dig_p6;
    var2 += (var1 * calib.dig_p5) << 17;
    var2 += calib.dig_p4 << 35;
    var1 = ((var1 * var1 * calib.dig_p3) >> 8) + ((var1 * calib.dig_p2) << 12);
    var1 = (((1i128 << 47) + var1) * calib.dig_p1) >> 33;

    if var1 == 0 {
        return None;
    }

    let mut p = floor_div((((1048576 - up) << 31) - var2) * 3125, var1);
    let scaled = p >> 13;
    // 超出 i128 时结果远在限幅范围之外，饱和后符号不变
    var1 = calib.dig_p9.saturating_mul(scaled).saturating_mul(scaled) >> 25;
    var2 = (calib.dig_p8 * p) >> 19;
    p = ((p + var1 + var2) >> 8) + (calib.dig_p7 << 4);

    Some(p)
}

/// 浮点湿度公式，返回 %RH（未限幅）
fn humidity_float(calib: &Calibration<f64>, t_fine: i64, adc_h: u32) -> f64 {
    let uh = adc_h as f64;
    let t_fine = t_fine as f64;

    let mut h = uh - (calib.dig_h4 * 64.0 + calib.dig_h5 / 16384.0 * (t_fine - 76800.0));
    h *= calib.dig_h2 / 65536.0
        * (1.0 + calib.dig_h6 / 67108864.0 * h * (1.0 + calib.dig_h3 / 67108864.0 * h));
    h *= 1.0 - calib.dig_h1 * h / 524288.0;
    h
}

/// 32位定点湿度公式，返回 Q22.10 格式的 %RH（除以1024得到百分比）
///
/// dig_H6/dig_H3 两项乘的是第一步的中间结果。
fn humidity_int32(calib: &Calibration<i64>, t_fine: i64, adc_h: u32) -> i64 {
    let uh = adc_h as i64;

    let mut h =
        (((uh << 14) - (calib.dig_h4 << 20) - (calib.dig_h5 * (t_fine - 76800))) + 0x4000) >> 15;
    let scale = ((((h * calib.dig_h6) >> 10) * (((h * calib.dig_h3) >> 11) + 0x8000)) >> 10)
        + 0x200000;
    h *= (scale * calib.dig_h2 + 0x2000) >> 14;
    h -= ((((h >> 15) * (h >> 15)) >> 7) * calib.dig_h1) >> 4;
    h >> 12
}
