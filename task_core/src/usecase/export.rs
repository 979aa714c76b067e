//! 提取结果的三种导出格式：JSON、INI 风格文本报告、任务模板 JSON。
//!
//! 导出器只产出 `String`，文件写入由调用方负责。JSON 字段名与历史导出
//! 格式保持一致，下游按字段名消费。

use std::fmt::Write as _;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::core::model::Task;
use crate::usecase::extract::Extraction;

/// 按工作簿内的表顺序导出 sheet → 任务列表 的 JSON 映射（pretty 格式）。
pub fn export_json(extraction: &Extraction) -> Result<String, serde_json::Error> {
    let mut root = Map::new();
    for sheet in &extraction.sheets {
        root.insert(sheet.name.clone(), serde_json::to_value(&sheet.tasks)?);
    }
    serde_json::to_string_pretty(&Value::Object(root))
}

fn display_opt(v: Option<u32>) -> String {
    match v {
        Some(n) => n.to_string(),
        None => String::new(),
    }
}

/// INI 风格文本报告：每表一段 `=`×60 横幅，每任务一个带中文标签的
/// 伪 JSON 块。数据项一行输出原始单元格文本。
pub fn export_ini_report(extraction: &Extraction) -> String {
    let banner = "=".repeat(60);
    let mut out = String::new();

    for sheet in &extraction.sheets {
        let _ = writeln!(out, "{banner}");
        let _ = writeln!(out, "工作表: {}", sheet.name);
        let _ = writeln!(out, "{banner}");
        out.push('\n');

        for (index, task) in sheet.tasks.iter().enumerate() {
            let _ = writeln!(out, "---------- 任务 {} ----------", index + 1);
            out.push_str("{\n");
            // 标签顺序沿用历史报告版式：工作表、任务名称、任务号在前
            let _ = writeln!(out, "    {}: {},", json_str("工作表"), json_str(&task.worksheet));
            let _ = writeln!(
                out,
                "    {}: {},",
                json_str("任务名称"),
                json_str(&task.info.task_name)
            );
            let _ = writeln!(out, "    \"任务号\": {},", task.task_number);
            let fields: &[(&str, String)] = &[
                ("测量点号", task.measurement_points.clone()),
                ("任务类型", task.info.task_type.clone()),
                ("数据结构方式", display_opt(task.info.data_structure_type)),
                ("采样基准时间", task.info.sampling_base_time.clone()),
                ("定时采样周期", display_opt(task.info.sampling_period)),
                ("定时采样周期单位", display_opt(task.info.sampling_period_unit)),
                ("上报基准时间", task.info.report_base_time.clone()),
                ("定时上报周期", display_opt(task.info.report_period)),
                ("定时上报周期单位", display_opt(task.info.report_period_unit)),
                ("数据抽取倍率", display_opt(task.info.extraction_ratio)),
                ("执行次数", task.info.execution_count.clone()),
                ("数据项", task.info.data_items_original.clone()),
                ("任务参数", task.info.task_param.clone()),
            ];
            for (i, (label, value)) in fields.iter().enumerate() {
                let comma = if i + 1 == fields.len() { "" } else { "," };
                let _ = writeln!(
                    out,
                    "    {}: {}{comma}",
                    json_str(label),
                    json_str(value)
                );
            }
            out.push_str("}\n\n");
        }

        out.push_str("\n\n");
    }

    out
}

// 字段值可能带引号或换行，统一走 JSON 字符串转义保证块可解析。
fn json_str(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{s}\""))
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct TemplateEntry {
    #[serde(rename = "TaskId")]
    task_id: i64,
    #[serde(rename = "TaskParam")]
    task_param: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct TaskTemplate {
    #[serde(rename = "BaseTask")]
    base_task: Vec<TemplateEntry>,
    #[serde(rename = "MeterTask")]
    meter_task: Vec<TemplateEntry>,
}

/// 任务模板 JSON：按任务类型把任务分进 `BaseTask` / `MeterTask` 两组。
///
/// 类型包含「表端」或 "meter"（大小写不敏感）归入 MeterTask，其余默认
/// BaseTask；`TaskParam` 去掉所有空白，输出连续十六进制串。
pub fn export_task_template<'a, I>(tasks: I) -> Result<String, serde_json::Error>
where
    I: IntoIterator<Item = &'a Task>,
{
    let mut template = TaskTemplate {
        base_task: Vec::new(),
        meter_task: Vec::new(),
    };

    for task in tasks {
        let entry = TemplateEntry {
            task_id: task.task_number,
            task_param: task
                .info
                .task_param
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect(),
        };
        let task_type = task.info.task_type.to_lowercase();
        if task_type.contains("表端") || task_type.contains("meter") {
            template.meter_task.push(entry);
        } else {
            template.base_task.push(entry);
        }
    }

    serde_json::to_string_pretty(&template)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{Stats, TaskInfo};
    use crate::usecase::extract::SheetTasks;

    fn sample_task(sheet: &str, number: i64, task_type: &str, param: &str) -> Task {
        Task {
            worksheet: sheet.to_string(),
            column_index: 1,
            task_number: number,
            measurement_points: "1-3".to_string(),
            parsed_measurement_points: vec![1, 2, 3],
            measurement_points_count: 3,
            info: TaskInfo {
                task_name: "日冻结".to_string(),
                task_type: task_type.to_string(),
                sampling_period: Some(15),
                data_items_original: "02010100（瞬时量）A相电压".to_string(),
                task_param: param.to_string(),
                ..TaskInfo::default()
            },
        }
    }

    fn sample_extraction() -> Extraction {
        Extraction {
            sheets: vec![
                SheetTasks {
                    name: "Sheet2".to_string(),
                    tasks: vec![sample_task("Sheet2", 7, "普通任务", "01 02")],
                },
                SheetTasks {
                    name: "Sheet1".to_string(),
                    tasks: vec![sample_task("Sheet1", 3, "表端冻结", "AA BB")],
                },
            ],
            stats: Stats::default(),
        }
    }

    #[test]
    fn json_export_keeps_workbook_sheet_order() {
        let json = export_json(&sample_extraction()).unwrap();
        let sheet2_pos = json.find("\"Sheet2\"").unwrap();
        let sheet1_pos = json.find("\"Sheet1\"").unwrap();
        assert!(sheet2_pos < sheet1_pos);
        assert!(json.contains("\"taskNumber\": 7"));
    }

    #[test]
    fn ini_report_has_banners_and_parseable_blocks() {
        let report = export_ini_report(&sample_extraction());
        assert!(report.contains(&"=".repeat(60)));
        assert!(report.contains("工作表: Sheet2"));
        assert!(report.contains("---------- 任务 1 ----------"));
        assert!(report.contains("\"任务号\": 7,"));
        assert!(report.contains("\"数据项\": \"02010100（瞬时量）A相电压\","));
        assert!(report.contains("\"任务参数\": \"01 02\"\n}"));

        // 历史版式：工作表、任务名称、任务号依序排在块首
        let block_start = report.find('{').unwrap();
        let sheet_pos = report[block_start..].find("\"工作表\"").unwrap();
        let name_pos = report[block_start..].find("\"任务名称\"").unwrap();
        let number_pos = report[block_start..].find("\"任务号\"").unwrap();
        let points_pos = report[block_start..].find("\"测量点号\"").unwrap();
        assert!(sheet_pos < name_pos);
        assert!(name_pos < number_pos);
        assert!(number_pos < points_pos);

        // 每个伪 JSON 块必须本身可解析
        for block in report.split("----------\n").skip(1) {
            let body = &block[..block.find("}\n").unwrap() + 1];
            let parsed: serde_json::Value = serde_json::from_str(body).unwrap();
            assert!(parsed.get("任务名称").is_some());
        }
    }

    #[test]
    fn template_classifies_meter_by_type_and_strips_whitespace() {
        let extraction = sample_extraction();
        let tasks: Vec<&Task> = extraction.all_tasks().collect();
        let json = export_task_template(tasks).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        let base = parsed["BaseTask"].as_array().unwrap();
        let meter = parsed["MeterTask"].as_array().unwrap();
        assert_eq!(base.len(), 1);
        assert_eq!(meter.len(), 1);
        assert_eq!(base[0]["TaskId"], 7);
        assert_eq!(base[0]["TaskParam"], "0102");
        assert_eq!(meter[0]["TaskParam"], "AABB");
    }

    #[test]
    fn template_meter_match_is_case_insensitive() {
        let task = sample_task("S", 1, "Meter Freeze", "00");
        let json = export_task_template([&task]).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(parsed["BaseTask"].as_array().unwrap().is_empty());
        assert_eq!(parsed["MeterTask"].as_array().unwrap().len(), 1);
    }
}
