//! 纯算法层：网格归一化、结构识别、字段解析与任务参数编码。
//! 不做任何 IO，保证可确定性测试。

pub mod data_items;
pub mod fields;
pub mod grid;
pub mod model;
pub mod param;
pub mod structure;
