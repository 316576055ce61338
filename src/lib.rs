pub mod chip_select_pin;
pub mod sensor;
pub mod std_clock;
