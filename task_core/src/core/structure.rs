//! 工作表结构识别：在无模式的网格里定位各语义字段所在行，并判定布局模式。
//!
//! 识别是启发式的：模板之间字段措辞不一致，允许字段缺失（None），
//! 下游必须把缺失当“字段不存在”而不是错误。同一字段在扫描中后出现的行
//! 会覆盖先前命中（与既有模板行为一致），测量点号行例外（保留首次出现）。

use std::sync::OnceLock;

use log::debug;
use regex::Regex;

use super::fields::parse_full_number;
use super::grid::{cell_text, SheetGrid};

/// 结构扫描的行数上限。
const FIELD_SCAN_ROWS: usize = 40;
/// 映射表定位的行数上限。
const MAPPING_SCAN_ROWS: usize = 50;

/// 任务号 ↔ 测量点映射表的位置。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MappingTable {
    /// 未能定位到映射表。
    NotFound,
    /// 单任务模式：明确不存在映射表（区别于“没找到”）。
    Absent,
    /// 映射表数据区从该行开始。
    StartsAt(usize),
}

impl MappingTable {
    pub fn start_row(self) -> Option<usize> {
        match self {
            MappingTable::StartsAt(row) => Some(row),
            _ => None,
        }
    }
}

/// 按语义字段定位的行号集合（每表识别一次，之后只读）。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SheetStructure {
    pub task_name_row: Option<usize>,
    pub task_number_row: Option<usize>,
    pub task_type_row: Option<usize>,
    pub data_structure_row: Option<usize>,
    pub sampling_base_time_row: Option<usize>,
    pub sampling_period_row: Option<usize>,
    pub sampling_period_unit_row: Option<usize>,
    pub report_base_time_row: Option<usize>,
    pub report_period_row: Option<usize>,
    pub report_period_unit_row: Option<usize>,
    pub extraction_ratio_row: Option<usize>,
    pub measurement_point_row: Option<usize>,
    pub execution_count_row: Option<usize>,
    pub data_items_row: Option<usize>,
    pub task_mapping: MappingTable,
    pub is_single_task_mode: bool,
    pub is_multi_row_mode: bool,
}

impl Default for MappingTable {
    fn default() -> Self {
        MappingTable::NotFound
    }
}

/// 字段行匹配规则：`any_of` 任一命中且 `none_of` 全不命中；
/// `exact` 存在时要求整串相等。表驱动，新模板变体只需加条目。
struct LabelRule {
    field: FieldRow,
    exact: Option<&'static str>,
    any_of: &'static [&'static str],
    none_of: &'static [&'static str],
    first_wins: bool,
}

#[derive(Clone, Copy)]
enum FieldRow {
    TaskName,
    TaskNumber,
    TaskType,
    DataStructure,
    SamplingBaseTime,
    SamplingPeriod,
    SamplingPeriodUnit,
    ReportBaseTime,
    ReportPeriod,
    ReportPeriodUnit,
    ExtractionRatio,
    MeasurementPoint,
    ExecutionCount,
    DataItems,
}

const LABEL_RULES: &[LabelRule] = &[
    LabelRule {
        field: FieldRow::TaskName,
        exact: None,
        any_of: &["任务名称"],
        none_of: &[],
        first_wins: false,
    },
    LabelRule {
        field: FieldRow::TaskNumber,
        exact: Some("任务号"),
        any_of: &[],
        none_of: &[],
        first_wins: false,
    },
    LabelRule {
        field: FieldRow::TaskType,
        exact: None,
        any_of: &["任务类型"],
        none_of: &[],
        first_wins: false,
    },
    LabelRule {
        field: FieldRow::DataStructure,
        exact: None,
        any_of: &["数据结构方式", "数据格式", "是否有效"],
        none_of: &[],
        first_wins: false,
    },
    LabelRule {
        field: FieldRow::SamplingBaseTime,
        exact: None,
        any_of: &["采样基准时间"],
        none_of: &[],
        first_wins: false,
    },
    LabelRule {
        field: FieldRow::SamplingPeriod,
        exact: None,
        any_of: &["定时采样周期"],
        none_of: &["单位"],
        first_wins: false,
    },
    LabelRule {
        field: FieldRow::SamplingPeriodUnit,
        exact: None,
        any_of: &["定时采样周期单位", "采样周期单位"],
        none_of: &[],
        first_wins: false,
    },
    LabelRule {
        field: FieldRow::ReportBaseTime,
        exact: None,
        any_of: &["上报基准时间"],
        none_of: &[],
        first_wins: false,
    },
    LabelRule {
        field: FieldRow::ReportPeriod,
        exact: None,
        any_of: &["定时上报周期"],
        none_of: &["单位"],
        first_wins: false,
    },
    LabelRule {
        field: FieldRow::ReportPeriodUnit,
        exact: None,
        any_of: &["定时上报周期单位", "上报周期单位"],
        none_of: &[],
        first_wins: false,
    },
    LabelRule {
        field: FieldRow::ExtractionRatio,
        exact: None,
        any_of: &["数据抽取倍率"],
        none_of: &[],
        first_wins: false,
    },
    LabelRule {
        field: FieldRow::MeasurementPoint,
        exact: None,
        any_of: &["测量点号"],
        none_of: &[],
        first_wins: true,
    },
    LabelRule {
        field: FieldRow::ExecutionCount,
        exact: None,
        any_of: &["执行次数"],
        none_of: &[],
        first_wins: false,
    },
    LabelRule {
        field: FieldRow::DataItems,
        exact: None,
        any_of: &["数据项", "数据源"],
        none_of: &[],
        first_wins: false,
    },
];

impl LabelRule {
    fn matches(&self, label: &str) -> bool {
        if let Some(exact) = self.exact {
            return label == exact;
        }
        self.any_of.iter().any(|kw| label.contains(kw))
            && !self.none_of.iter().any(|kw| label.contains(kw))
    }
}

fn point_range_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+-\d+$").expect("static regex"))
}

fn plain_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+$").expect("static regex"))
}

fn simple_range_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\d\-,，\s]+$").expect("static regex"))
}

fn contains_cjk(text: &str) -> bool {
    text.chars()
        .any(|c| ('\u{4e00}'..='\u{9fff}').contains(&c))
}

/// 某一列在测量点号行的单元格是否为中文描述（而非数字/范围），
/// 即该列按“多行模式”处理的通用启发式。
pub fn is_column_multi_row(grid: &SheetGrid, measurement_point_row: Option<usize>, col: usize) -> bool {
    let Some(row) = measurement_point_row else {
        return false;
    };
    if col == 0 {
        return false;
    }
    let value = cell_text(grid, row, col);
    if value.is_empty() {
        return false;
    }
    contains_cjk(value) && !simple_range_re().is_match(value)
}

/// 测量点号行在标签列之外是否存在中文描述（整表多行模式提示）。
fn has_cjk_point_description(grid: &SheetGrid, measurement_point_row: usize) -> bool {
    let width = grid.get(measurement_point_row).map(Vec::len).unwrap_or(0);
    (1..width).any(|col| is_column_multi_row(grid, Some(measurement_point_row), col))
}

/// 识别工作表结构。字段缺失不报错，保持 None。
pub fn analyze_sheet_structure(grid: &SheetGrid) -> SheetStructure {
    let mut structure = SheetStructure::default();

    for row_index in 0..grid.len().min(FIELD_SCAN_ROWS) {
        let label = cell_text(grid, row_index, 0);
        if label.is_empty() {
            continue;
        }

        for rule in LABEL_RULES {
            if !rule.matches(label) {
                continue;
            }
            let slot = field_slot(&mut structure, rule.field);
            if rule.first_wins && slot.is_some() {
                continue;
            }
            *slot = Some(row_index);

            // 集中器模板的特殊布局：任务名称行同时也是测量点号行
            if matches!(rule.field, FieldRow::TaskName) && label.contains("测量点号") {
                structure.measurement_point_row = Some(row_index);
            }
        }
    }

    structure.task_mapping = locate_mapping_table(grid);

    let has_basic_task_info =
        structure.task_name_row.is_some() || structure.task_type_row.is_some();
    let has_mapping_table = matches!(structure.task_mapping, MappingTable::StartsAt(_));
    let has_task_number_row = structure.task_number_row.is_some();

    // 映射表存在且没有专门任务号行 => 明确多任务；其余有基础字段的情况为单任务
    if has_basic_task_info && has_mapping_table && !has_task_number_row {
        structure.is_single_task_mode = false;
    } else if has_basic_task_info && (!has_mapping_table || has_task_number_row) {
        structure.is_single_task_mode = true;
        if !has_mapping_table {
            structure.task_mapping = MappingTable::Absent;
        }
    }

    if let Some(row) = structure.measurement_point_row {
        structure.is_multi_row_mode = has_cjk_point_description(grid, row);
    }

    debug!(
        "sheet structure: name={:?} number={:?} mapping={:?} single={} multi_row={}",
        structure.task_name_row,
        structure.task_number_row,
        structure.task_mapping,
        structure.is_single_task_mode,
        structure.is_multi_row_mode,
    );

    structure
}

fn field_slot(structure: &mut SheetStructure, field: FieldRow) -> &mut Option<usize> {
    match field {
        FieldRow::TaskName => &mut structure.task_name_row,
        FieldRow::TaskNumber => &mut structure.task_number_row,
        FieldRow::TaskType => &mut structure.task_type_row,
        FieldRow::DataStructure => &mut structure.data_structure_row,
        FieldRow::SamplingBaseTime => &mut structure.sampling_base_time_row,
        FieldRow::SamplingPeriod => &mut structure.sampling_period_row,
        FieldRow::SamplingPeriodUnit => &mut structure.sampling_period_unit_row,
        FieldRow::ReportBaseTime => &mut structure.report_base_time_row,
        FieldRow::ReportPeriod => &mut structure.report_period_row,
        FieldRow::ReportPeriodUnit => &mut structure.report_period_unit_row,
        FieldRow::ExtractionRatio => &mut structure.extraction_ratio_row,
        FieldRow::MeasurementPoint => &mut structure.measurement_point_row,
        FieldRow::ExecutionCount => &mut structure.execution_count_row,
        FieldRow::DataItems => &mut structure.data_items_row,
    }
}

/// 定位任务号映射表的数据起始行。
///
/// 优先找第二个整串为“测量点号”的行（底部任务分配区表头），其次处理
/// “测量点号 | 任务号”双列表头的变体；都失败时退回旧版启发式。
fn locate_mapping_table(grid: &SheetGrid) -> MappingTable {
    let scan_rows = grid.len().min(MAPPING_SCAN_ROWS);
    let mut point_header_count = 0usize;

    for row_index in 0..scan_rows {
        if cell_text(grid, row_index, 0) != "测量点号" {
            continue;
        }
        point_header_count += 1;

        if point_header_count == 2 {
            // 表头下方第一个“测量点N”/范围/数字行即数据起点
            for data_row in row_index + 1..grid.len() {
                let label = cell_text(grid, data_row, 0);
                if label.is_empty() {
                    continue;
                }
                if label.contains("测量点")
                    || point_range_re().is_match(label)
                    || plain_number_re().is_match(label)
                {
                    return MappingTable::StartsAt(data_row);
                }
            }
            break;
        }

        if point_header_count == 1 && cell_text(grid, row_index, 1) == "任务号" {
            for data_row in row_index + 1..grid.len() {
                let label = cell_text(grid, data_row, 0);
                if label.is_empty() {
                    continue;
                }
                if point_range_re().is_match(label) || plain_number_re().is_match(label) {
                    return MappingTable::StartsAt(data_row);
                }
            }
            break;
        }
    }

    // 旧版启发式：标签像范围/类别且前 5 列内出现非零数值
    for row_index in 0..grid.len().min(FIELD_SCAN_ROWS) {
        let label = cell_text(grid, row_index, 0);
        if label.is_empty() {
            continue;
        }
        let label_like = label.contains("测量点")
            || label.contains("类别")
            || label.starts_with(|c: char| c.is_ascii_digit());
        if !label_like {
            continue;
        }

        let width = grid.get(row_index).map(Vec::len).unwrap_or(0);
        let has_numbers = (1..width.min(5)).any(|col| {
            let value = cell_text(grid, row_index, col);
            !value.is_empty() && value != "0" && parse_full_number(value).is_some()
        });
        if has_numbers {
            return MappingTable::StartsAt(row_index);
        }
    }

    MappingTable::NotFound
}
