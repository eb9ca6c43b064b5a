//! 日志元数据（事件名等）

pub mod standards;
