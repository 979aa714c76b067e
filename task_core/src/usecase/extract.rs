//! 任务枚举引擎：按“表 × 列”驱动提取，产出最终任务记录列表。
//!
//! 每一列独立判定单任务/多行映射模式（同一张表允许混用）。
//! 结构歧义一律降级为空字段而不是报错；单表零任务只是从结果中省略，
//! 整个工作簿所有表都为零才算失败。

use log::{debug, warn};

use crate::core::fields::{parse_full_number, parse_leading_int};
use crate::core::grid::{cell_text, fill_merged_cells, max_columns, MergeRegion, SheetGrid};
use crate::core::model::{SheetTaskCount, Stats, Task, TaskInfo, DEFAULT_TASK_NUMBER};
use crate::core::param::{build_task_param, format_task_param};
use crate::core::structure::{analyze_sheet_structure, is_column_multi_row, SheetStructure};
use crate::core::{data_items, fields};
use crate::error::ExtractError;

/// 行数低于此值的表不含可用任务模板，直接跳过。
const MIN_SHEET_ROWS: usize = 10;
/// 测量点号行兜底查找的扫描行数。
const POINT_ID_SCAN_ROWS: usize = 20;
/// 起始列探测的扫描列数。
const START_COL_SCAN_COLS: usize = 25;

/// 适配层产物：一张工作表的原始网格与合并区域。
#[derive(Clone, Debug)]
pub struct SheetData {
    pub name: String,
    pub grid: SheetGrid,
    pub merges: Vec<MergeRegion>,
}

/// 一张工作表的提取结果。
#[derive(Clone, Debug)]
pub struct SheetTasks {
    pub name: String,
    pub tasks: Vec<Task>,
}

/// 整个工作簿的提取结果（保持工作簿内的表顺序）。
#[derive(Clone, Debug)]
pub struct Extraction {
    pub sheets: Vec<SheetTasks>,
    pub stats: Stats,
}

impl Extraction {
    /// 所有表的任务平铺视图（只读遍历用）。
    pub fn all_tasks(&self) -> impl Iterator<Item = &Task> {
        self.sheets.iter().flat_map(|sheet| sheet.tasks.iter())
    }
}

/// 一列的提取模式（引擎按此分派，互不影响其他列）。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnMode {
    /// 整列描述一个任务，测量点取自测量点号行。
    SingleTask,
    /// 任务号来自映射表多行分配，一列可产出多个任务。
    MultiRowMapping,
}

/// 枚举整个工作簿。所有表都没有任务时报 `NoTasks`。
pub fn extract_workbook(sheets: &[SheetData]) -> Result<Extraction, ExtractError> {
    let mut result: Vec<SheetTasks> = Vec::new();
    let mut stats = Stats {
        total_sheets: sheets.len(),
        sheet_names: sheets.iter().map(|s| s.name.clone()).collect(),
        ..Stats::default()
    };

    for sheet in sheets {
        let tasks = extract_sheet_tasks(&sheet.name, &sheet.grid, &sheet.merges);
        debug!("sheet '{}': {} task(s)", sheet.name, tasks.len());
        if tasks.is_empty() {
            continue;
        }
        stats.total_tasks += tasks.len();
        stats.tasks_by_sheet.push(SheetTaskCount {
            sheet: sheet.name.clone(),
            tasks: tasks.len(),
        });
        result.push(SheetTasks {
            name: sheet.name.clone(),
            tasks,
        });
    }

    if result.is_empty() {
        warn!("no worksheet yielded any task");
        return Err(ExtractError::NoTasks {
            detected_sheets: stats.sheet_names,
        });
    }

    Ok(Extraction {
        sheets: result,
        stats,
    })
}

/// 枚举一张工作表：归一化 → 结构识别 → 逐列分派。
pub fn extract_sheet_tasks(sheet_name: &str, raw: &SheetGrid, merges: &[MergeRegion]) -> Vec<Task> {
    if raw.len() < MIN_SHEET_ROWS {
        debug!("sheet '{sheet_name}': skipped, only {} row(s)", raw.len());
        return Vec::new();
    }

    let grid = fill_merged_cells(raw, merges);
    let structure = analyze_sheet_structure(&grid);

    let start_col = detect_start_column(&grid, &structure);
    let mut tasks: Vec<Task> = Vec::new();

    for col in start_col..max_columns(&grid) {
        let info = extract_task_from_column(&grid, col, &structure);
        if !is_usable_task_name(&info.task_name) {
            continue;
        }

        match classify_column(&grid, &structure, col) {
            ColumnMode::MultiRowMapping => {
                // 任务号 -> 该号累计到的范围标签（首次发现顺序）
                let mut assignments: Vec<(i64, Vec<String>)> = Vec::new();
                if let Some(start) = structure.task_mapping.start_row() {
                    for (row, label) in mapping_rows(&grid, start) {
                        let Some(number) = mapping_cell_number(&grid, row, col) else {
                            continue;
                        };
                        match assignments.iter_mut().find(|(n, _)| *n == number) {
                            Some((_, labels)) => labels.push(label),
                            None => assignments.push((number, vec![label])),
                        }
                    }
                }

                // assignments 为空时该列自然零产出（整列跳过）
                for (task_number, labels) in assignments {
                    let display = labels.join(", ");
                    tasks.push(finish_task(sheet_name, col, task_number, display, &info));
                }
            }
            ColumnMode::SingleTask => {
                let task_number = structure
                    .task_number_row
                    .and_then(|row| parse_leading_int(cell_text(&grid, row, col)))
                    .unwrap_or(DEFAULT_TASK_NUMBER);
                let display = info.measurement_point_id.clone();
                tasks.push(finish_task(sheet_name, col, task_number, display, &info));
            }
        }
    }

    tasks
}

/// 从指定列装配一个任务的原始字段集。
pub fn extract_task_from_column(grid: &SheetGrid, col: usize, structure: &SheetStructure) -> TaskInfo {
    let value_at = |row: Option<usize>| -> String {
        row.map(|r| cell_text(grid, r, col).to_string())
            .unwrap_or_default()
    };

    let raw_data_structure = value_at(structure.data_structure_row);
    let raw_sampling_period = value_at(structure.sampling_period_row);
    let raw_sampling_unit = value_at(structure.sampling_period_unit_row);
    let raw_report_period = value_at(structure.report_period_row);
    let raw_report_unit = value_at(structure.report_period_unit_row);
    let raw_extraction_ratio = value_at(structure.extraction_ratio_row);
    let raw_data_items = value_at(structure.data_items_row);
    let raw_sampling_base_time = value_at(structure.sampling_base_time_row);
    let raw_report_base_time = value_at(structure.report_base_time_row);

    TaskInfo {
        task_name: resolve_task_name(grid, col, structure),
        task_type: value_at(structure.task_type_row),
        data_structure_type: fields::parse_data_structure_type(&raw_data_structure),
        data_structure_type_original: raw_data_structure,
        sampling_base_time: fields::parse_time_format(&raw_sampling_base_time),
        sampling_base_time_original: raw_sampling_base_time,
        sampling_period: fields::parse_period_value(&raw_sampling_period),
        sampling_period_original: raw_sampling_period,
        sampling_period_unit: fields::parse_period_unit(&raw_sampling_unit),
        sampling_period_unit_original: raw_sampling_unit,
        report_base_time: fields::parse_time_format(&raw_report_base_time),
        report_base_time_original: raw_report_base_time,
        report_period: fields::parse_period_value(&raw_report_period),
        report_period_original: raw_report_period,
        report_period_unit: fields::parse_period_unit(&raw_report_unit),
        report_period_unit_original: raw_report_unit,
        extraction_ratio: fields::parse_extraction_ratio(&raw_extraction_ratio),
        extraction_ratio_original: raw_extraction_ratio,
        measurement_point_id: resolve_measurement_point_id(grid, col, structure),
        execution_count: value_at(structure.execution_count_row),
        data_items: data_items::parse_data_items(&raw_data_items),
        data_items_original: raw_data_items,
        task_param: String::new(),
    }
}

/// 任务名称解析的回退链：名称行 → 类型行上方首个非标签值 → 前两行。
fn resolve_task_name(grid: &SheetGrid, col: usize, structure: &SheetStructure) -> String {
    if let Some(row) = structure.task_name_row {
        let name = cell_text(grid, row, col);
        // 合并单元格会把标签横向铺开，标签回声不算名称
        if !name.is_empty() && !name.contains("任务名称") && !name.contains("测量点号") {
            return name.to_string();
        }
    }

    if let Some(type_row) = structure.task_type_row {
        for row in (0..type_row).rev() {
            let value = cell_text(grid, row, col);
            if !value.is_empty()
                && value != "任务名称"
                && !value.contains("集中器")
                && !value.contains("模板")
                && !value.contains("测量点号")
            {
                return value.to_string();
            }
        }
    }

    for row in 0..2 {
        let value = cell_text(grid, row, col);
        if !value.is_empty()
            && !value.contains("集中器")
            && !value.contains("模板")
            && !value.contains("任务名称")
            && !value.contains("测量点号")
        {
            return value.to_string();
        }
    }

    String::new()
}

/// 测量点号取自整串为“测量点号”且不是任务名称行的那一行
/// （处理名称行与测量点表头措辞重合的模板）。
fn resolve_measurement_point_id(grid: &SheetGrid, col: usize, structure: &SheetStructure) -> String {
    for row in 0..grid.len().min(POINT_ID_SCAN_ROWS) {
        if cell_text(grid, row, 0) != "测量点号" || Some(row) == structure.task_name_row {
            continue;
        }
        let value = cell_text(grid, row, col);
        if !value.is_empty() && value != "测量点号" {
            return value.to_string();
        }
    }
    String::new()
}

/// 逐列模式判定：映射表里有任务号分配即多行模式，
/// 否则退回“测量点号单元格为中文描述”的通用启发式。
fn classify_column(grid: &SheetGrid, structure: &SheetStructure, col: usize) -> ColumnMode {
    if let Some(start) = structure.task_mapping.start_row() {
        let has_assignment = mapping_rows(grid, start)
            .into_iter()
            .any(|(row, _)| mapping_cell_number(grid, row, col).is_some());
        if has_assignment {
            return ColumnMode::MultiRowMapping;
        }
    }

    if is_column_multi_row(grid, structure.measurement_point_row, col) {
        ColumnMode::MultiRowMapping
    } else {
        ColumnMode::SingleTask
    }
}

/// 映射表数据行：从起始行向下，遇到空标签或 说明/注/备注 行终止。
fn mapping_rows(grid: &SheetGrid, start: usize) -> Vec<(usize, String)> {
    let mut rows = Vec::new();
    for row in start..grid.len() {
        let label = cell_text(grid, row, 0);
        if label.is_empty() {
            break;
        }
        if label.contains("说明") || label.contains('注') || label.contains("备注") {
            break;
        }
        rows.push((row, label.to_string()));
    }
    rows
}

/// 映射表单元格的任务号：整串数值且不为“0”时取整。
fn mapping_cell_number(grid: &SheetGrid, row: usize, col: usize) -> Option<i64> {
    let value = cell_text(grid, row, col);
    if value.is_empty() || value == "0" {
        return None;
    }
    parse_full_number(value).map(|n| n.trunc() as i64)
}

/// 起始列探测：任务名称行里第一个非标签的非空单元格；默认第 1 列。
fn detect_start_column(grid: &SheetGrid, structure: &SheetStructure) -> usize {
    let Some(name_row) = structure.task_name_row else {
        return 1;
    };
    let width = grid.get(name_row).map(Vec::len).unwrap_or(0);
    for col in 1..width.min(START_COL_SCAN_COLS) {
        let value = cell_text(grid, name_row, col);
        if !value.is_empty() && !value.contains("测量点号") && !value.contains("任务名称") {
            return col;
        }
    }
    1
}

fn is_usable_task_name(name: &str) -> bool {
    !name.is_empty() && !name.contains("任务名称") && !name.contains("任务系统") && name != "A"
}

/// 组装最终任务：展开测量点、编码任务参数。
fn finish_task(
    sheet_name: &str,
    col: usize,
    task_number: i64,
    measurement_points: String,
    info: &TaskInfo,
) -> Task {
    let parsed = fields::parse_measurement_points(&measurement_points);
    let mut info = info.clone();
    info.task_param = format_task_param(&build_task_param(&info, &parsed));

    Task {
        worksheet: sheet_name.to_string(),
        column_index: col,
        task_number,
        measurement_points,
        measurement_points_count: parsed.len(),
        parsed_measurement_points: parsed,
        info,
    }
}
