//! Excel 采集任务定义提取核心库。
//! 职责：合并单元格展开、表结构识别、字段解析、任务枚举、任务参数编码、
//! 搜索/选择/导出。
//! 非目标：UI、文件对话框、上传流程（由上层应用处理）。

pub mod adapters;
pub mod core;
pub mod error;
pub mod usecase;

pub use crate::core::model::{DataItems, Stats, Task, TaskInfo, DEFAULT_TASK_NUMBER};
pub use crate::error::ExtractError;
pub use crate::usecase::extract::{extract_workbook, Extraction, SheetData, SheetTasks};
pub use crate::usecase::search::{filter_tasks, parse_search_query, SearchQuery};
pub use crate::usecase::selection::TaskSelection;
