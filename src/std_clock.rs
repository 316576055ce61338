use std::thread;
use std::time::Duration;

use embedded_hal::delay::DelayNs;

/// 基于 `thread::sleep` 的标准延时
///
/// 传感器驱动的所有等待都通过它完成，精度取决于操作系统调度。
#[derive(Debug, Default, Clone, Copy)]
pub struct StdClock {}

impl StdClock {
    pub fn new() -> Self {
        Self {}
    }
}

impl DelayNs for StdClock {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(ns as u64));
    }

    fn delay_us(&mut self, us: u32) {
        thread::sleep(Duration::from_micros(us as u64));
    }

    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(ms as u64));
    }
}
