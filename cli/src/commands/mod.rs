pub mod calibration;
pub mod config;
pub mod logs;
pub mod replay;
