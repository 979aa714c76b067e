//! 外部格式适配层。

pub mod xlsx;
