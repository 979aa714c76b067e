//! 用例层：提取流程编排、搜索、选择与导出。

pub mod export;
pub mod extract;
pub mod search;
pub mod selection;
