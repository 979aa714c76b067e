//! 提取流程的结构化错误。
//!
//! 分层约定：字段级解析永不失败；单表失败记日志后跳过；
//! 只有“整个工作簿无法读取”或“所有表都没有任务”才作为错误上抛。

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to read workbook: {0}")]
    ReadWorkbook(String),

    #[error("no tasks could be extracted from any worksheet (sheets: {})", detected_sheets.join(", "))]
    NoTasks { detected_sheets: Vec<String> },
}
