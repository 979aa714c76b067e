//! 采集任务提取模块：稳定数据模型与 DTO。
//!
//! 约束：
//! - 导出 JSON 字段名保持 camelCase（与历史导出格式一致，下游工具按字段名消费）
//! - `Task` 一经产出不可变；运行期主键为 `worksheet-taskNumber-columnIndex`
//! - 数据项映射保持发现顺序（任务参数编码按此顺序写入数据标识）

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// 单任务模式下任务号行缺失时的默认任务号。
///
/// 模板约定值，来源于现场模板的既有习惯；不要试图重新推导其含义。
pub const DEFAULT_TASK_NUMBER: i64 = 45;

/// 数据标识编码 → 描述文本的有序映射。
///
/// 重复插入同一编码会覆盖描述但保留首次出现的位置；序列化为 JSON object，
/// 键顺序即发现顺序。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DataItems(Vec<(String, String)>);

impl DataItems {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn insert(&mut self, id: String, description: String) {
        match self.0.iter_mut().find(|(k, _)| *k == id) {
            Some((_, v)) => *v = description,
            None => self.0.push((id, description)),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 发现顺序迭代 `(编码, 描述)`。
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Serialize for DataItems {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for DataItems {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DataItemsVisitor;

        impl<'de> Visitor<'de> for DataItemsVisitor {
            type Value = DataItems;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of data item id to description")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut items = DataItems::new();
                while let Some((k, v)) = access.next_entry::<String, String>()? {
                    items.insert(k, v);
                }
                Ok(items)
            }
        }

        deserializer.deserialize_map(DataItemsVisitor)
    }
}

/// 一列任务定义的类型化字段集（与具体任务号/测量点集合无关）。
///
/// 每个可解析字段都同时保留原始单元格文本，便于追溯与通用搜索。
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskInfo {
    pub task_name: String,
    pub task_type: String,
    pub data_structure_type: Option<u32>,
    pub data_structure_type_original: String,
    /// 归一化后的 10 位 `YYMMDDhhmm`；无法归一化时为原样数字串或空串。
    pub sampling_base_time: String,
    pub sampling_base_time_original: String,
    pub sampling_period: Option<u32>,
    pub sampling_period_original: String,
    pub sampling_period_unit: Option<u32>,
    pub sampling_period_unit_original: String,
    pub report_base_time: String,
    pub report_base_time_original: String,
    pub report_period: Option<u32>,
    pub report_period_original: String,
    pub report_period_unit: Option<u32>,
    pub report_period_unit_original: String,
    pub extraction_ratio: Option<u32>,
    pub extraction_ratio_original: String,
    /// 测量点号行原始文本（单任务模式直接作为测量点范围使用）。
    pub measurement_point_id: String,
    pub execution_count: String,
    pub data_items: DataItems,
    pub data_items_original: String,
    /// 编码后的任务参数（空格分隔的大写十六进制字节串）；提取阶段为空串。
    pub task_param: String,
}

/// 最终产出的任务记录：字段集 + 枚举身份 + 已解析测量点集合。
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub worksheet: String,
    pub column_index: usize,
    pub task_number: i64,
    /// 展示用的测量点范围串（多行模式下为 ", " 连接的范围标签）。
    pub measurement_points: String,
    /// 展开去重后的测量点号，升序。
    pub parsed_measurement_points: Vec<u32>,
    pub measurement_points_count: usize,
    #[serde(flatten)]
    pub info: TaskInfo,
}

impl Task {
    /// 运行期唯一键；同一工作表允许同一任务号出现在不同列。
    pub fn key(&self) -> String {
        format!("{}-{}-{}", self.worksheet, self.task_number, self.column_index)
    }
}

/// 聚合统计（派生数据，不作为权威来源）。
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_sheets: usize,
    pub sheet_names: Vec<String>,
    pub total_tasks: usize,
    pub tasks_by_sheet: Vec<SheetTaskCount>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SheetTaskCount {
    pub sheet: String,
    pub tasks: usize,
}
