//! 任务搜索迷你语言：空格分隔词 + `key:value` 字段过滤（GitHub 式语法）。
//!
//! 字段过滤与通用词全部按 AND 组合；通用词在任务可搜索文本的拼接串里
//! 做大小写不敏感子串匹配。

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::core::model::Task;

/// 解析后的查询：字段过滤器（键已小写）+ 通用搜索词。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub filters: HashMap<String, Vec<String>>,
    pub general_terms: Vec<String>,
}

fn key_value_re() -> &'static Regex {
    // 键限定为 ASCII 词字符，中文词后跟冒号仍按通用搜索词处理
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([A-Za-z0-9_]+):(\S+)").expect("static regex"))
}

/// 解析查询串。`key:value` 之外的词作为通用搜索词。
pub fn parse_search_query(query: &str) -> SearchQuery {
    let mut parsed = SearchQuery::default();
    if query.trim().is_empty() {
        return parsed;
    }

    let mut remainder = query.to_string();
    for captures in key_value_re().captures_iter(query) {
        let key = captures[1].to_lowercase();
        let value = captures[2].to_lowercase();
        parsed.filters.entry(key).or_default().push(value);
        remainder = remainder.replacen(&captures[0], "", 1);
    }

    parsed.general_terms = remainder
        .split_whitespace()
        .map(|term| term.to_string())
        .collect();

    parsed
}

/// 过滤任务列表（只读，调用方持有数据）。
pub fn filter_tasks<'a>(tasks: &'a [Task], query: &SearchQuery) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|task| matches_search(task, query))
        .collect()
}

/// 单个任务是否命中查询。
pub fn matches_search(task: &Task, query: &SearchQuery) -> bool {
    for (key, values) in &query.filters {
        let field_matched = values
            .iter()
            .any(|value| matches_filter(task, key, value));
        if !field_matched {
            return false;
        }
    }

    if query.general_terms.is_empty() {
        return true;
    }

    let haystack = searchable_text(task);
    query
        .general_terms
        .iter()
        .all(|term| haystack.contains(&term.to_lowercase()))
}

fn matches_filter(task: &Task, key: &str, value: &str) -> bool {
    match key {
        "taskid" | "id" | "task" => task.task_number.to_string() == value,
        "name" | "taskname" => task.info.task_name.to_lowercase().contains(value),
        "sheet" | "worksheet" => task.worksheet.to_lowercase().contains(value),
        "type" | "tasktype" => task.info.task_type.to_lowercase().contains(value),
        "points" | "measurement" => task.measurement_points.to_lowercase().contains(value),
        "count" | "pointcount" => task.measurement_points_count.to_string() == value,
        "data" | "dataitems" => task.info.data_items.len().to_string() == value,
        "period" | "sampling" => {
            matches!(task.info.sampling_period, Some(p) if p.to_string() == value)
        }
        "report" => matches!(task.info.report_period, Some(p) if p.to_string() == value),
        "col" | "column" => task.column_index.to_string() == value,
        // 未识别的键不命中（过滤器按 AND，整体落空）
        _ => false,
    }
}

/// 通用词匹配的拼接文本：任务号、名称、类型、表名、测量点、数据项原文与键值。
fn searchable_text(task: &Task) -> String {
    let mut parts: Vec<String> = vec![
        task.task_number.to_string(),
        task.info.task_name.clone(),
        task.info.task_type.clone(),
        task.worksheet.clone(),
        task.measurement_points.clone(),
        task.info.data_items_original.clone(),
    ];
    parts.push(
        task.info
            .data_items
            .iter()
            .map(|(k, _)| k)
            .collect::<Vec<_>>()
            .join(" "),
    );
    parts.push(
        task.info
            .data_items
            .iter()
            .map(|(_, v)| v)
            .collect::<Vec<_>>()
            .join(" "),
    );
    parts.join(" ").to_lowercase()
}
