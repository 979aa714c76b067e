//! 端到端流程：合并单元格网格 → 提取 → 搜索/选择/导出。

use task_core::core::grid::MergeRegion;
use task_core::usecase::export::{export_ini_report, export_json, export_task_template};
use task_core::{
    extract_workbook, filter_tasks, parse_search_query, ExtractError, SheetData, Task,
    TaskSelection, DEFAULT_TASK_NUMBER,
};

fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|r| r.iter().map(|s| s.to_string()).collect())
        .collect()
}

/// 单任务模板表：标签列 + 两个任务列，标题行横向合并。
fn template_sheet() -> SheetData {
    SheetData {
        name: "集中器模板".to_string(),
        grid: grid(&[
            &["集中器采集任务模板", "", ""],
            &["任务名称", "日冻结电能量", "电压曲线"],
            &["任务号", "7", ""],
            &["任务类型", "普通任务", "表端冻结任务"],
            &["数据结构方式", "1：任务定义格式", "自描述格式"],
            &["采样基准时间", "000000", "000000"],
            &["定时采样周期", "15分钟", "60"],
            &["定时采样周期单位", "0：分", "0：分"],
            &["上报基准时间", "000000", "000000"],
            &["定时上报周期", "1", "1"],
            &["定时上报周期单位", "2：日", "2：日"],
            &["数据抽取倍率", "1", "1"],
            &["测量点号", "1-3", "5,7"],
            &["执行次数", "0", "300次"],
            &[
                "数据项",
                "02010100（瞬时量）A相电压、02010200（瞬时量）B相电压",
                "E1008030（事件）停电总次数",
            ],
        ]),
        // 标题行 (0,0)-(0,2) 合并
        merges: vec![MergeRegion {
            start_row: 0,
            start_col: 0,
            end_row: 0,
            end_col: 2,
        }],
    }
}

fn extract_template() -> Vec<Task> {
    let extraction = extract_workbook(&[template_sheet()]).unwrap();
    extraction.all_tasks().cloned().collect()
}

#[test]
fn template_sheet_yields_one_task_per_column() {
    let tasks = extract_template();
    assert_eq!(tasks.len(), 2);

    let first = &tasks[0];
    assert_eq!(first.task_number, 7);
    assert_eq!(first.info.task_name, "日冻结电能量");
    assert_eq!(first.parsed_measurement_points, vec![1, 2, 3]);
    assert_eq!(first.info.data_items.len(), 2);
    let ids: Vec<&str> = first.info.data_items.iter().map(|(k, _)| k).collect();
    assert_eq!(ids, vec!["02010100", "02010200"]);

    let second = &tasks[1];
    // 任务号单元格为空的列回退到默认任务号
    assert_eq!(second.task_number, DEFAULT_TASK_NUMBER);
    assert_eq!(second.parsed_measurement_points, vec![5, 7]);
    assert_eq!(second.info.data_structure_type, Some(0));
    assert_eq!(second.info.execution_count, "300次");
}

#[test]
fn task_param_is_encoded_for_every_task() {
    for task in extract_template() {
        let bytes: Vec<&str> = task.info.task_param.split(' ').collect();
        // 固定 19 字节 + 两个组数字节 + 每点 2 字节 + 每项 4 字节
        let expected =
            21 + task.measurement_points_count * 2 + task.info.data_items.len() * 4;
        assert_eq!(bytes.len(), expected, "task {}", task.key());
        assert!(bytes
            .iter()
            .all(|b| b.len() == 2 && b.chars().all(|c| c.is_ascii_hexdigit())));
    }
}

#[test]
fn search_narrows_extracted_tasks() {
    let tasks = extract_template();

    let by_id = parse_search_query("taskid:7");
    assert_eq!(filter_tasks(&tasks, &by_id).len(), 1);

    let by_general = parse_search_query("电压");
    let hits = filter_tasks(&tasks, &by_general);
    // “电压”出现在一个任务名和另一个任务的数据项里
    assert_eq!(hits.len(), 2);

    let none = parse_search_query("sheet:不存在");
    assert!(filter_tasks(&tasks, &none).is_empty());
}

#[test]
fn selection_tracks_tasks_across_filtering() {
    let tasks = extract_template();
    let selection = TaskSelection::select_all(&tasks);
    assert_eq!(selection.len(), 2);

    let narrowed = selection.without(&tasks[0]);
    let picked = narrowed.selected(&tasks);
    assert_eq!(picked.len(), 1);
    assert_eq!(picked[0].key(), tasks[1].key());
}

#[test]
fn exports_cover_all_extracted_tasks() {
    let extraction = extract_workbook(&[template_sheet()]).unwrap();

    let json = export_json(&extraction).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["集中器模板"].as_array().unwrap().len(), 2);

    let report = export_ini_report(&extraction);
    assert!(report.contains("工作表: 集中器模板"));
    assert!(report.contains("---------- 任务 2 ----------"));

    let tasks: Vec<&Task> = extraction.all_tasks().collect();
    let template = export_task_template(tasks).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&template).unwrap();
    // 表端冻结任务归入 MeterTask，其余归入 BaseTask
    assert_eq!(parsed["BaseTask"].as_array().unwrap().len(), 1);
    assert_eq!(parsed["MeterTask"].as_array().unwrap().len(), 1);
    let param = parsed["BaseTask"][0]["TaskParam"].as_str().unwrap();
    assert!(!param.contains(' '));
}

/// 混合模式表：底部有任务号映射表，列 1 在映射表里有分配（多行模式），
/// 列 2 没有分配且测量点单元格是数字范围（退回单任务模式）。
fn mixed_mode_sheet() -> SheetData {
    let mut rows = vec![
        vec!["任务名称".to_string(), "组合采集".to_string(), "单独采集".to_string()],
        vec!["任务类型".to_string(), "普通任务".to_string(), "普通任务".to_string()],
        vec!["测量点号".to_string(), "全部重点用户".to_string(), "1-20".to_string()],
    ];
    for _ in 0..8 {
        rows.push(vec!["填充行".to_string()]);
    }
    rows.push(vec!["测量点号".to_string(), "任务定义".to_string()]);
    rows.push(vec!["1-50".to_string(), "3".to_string(), "".to_string()]);
    rows.push(vec!["51-100".to_string(), "3".to_string(), "".to_string()]);
    rows.push(vec!["说明：0 表示不参与".to_string()]);

    SheetData {
        name: "混合模式".to_string(),
        grid: rows,
        merges: Vec::new(),
    }
}

#[test]
fn mapping_sheet_mixes_multi_row_and_single_task_columns() {
    let extraction = extract_workbook(&[mixed_mode_sheet()]).unwrap();
    let tasks: Vec<&Task> = extraction.all_tasks().collect();
    assert_eq!(tasks.len(), 2);

    let mapped = tasks[0];
    assert_eq!(mapped.column_index, 1);
    assert_eq!(mapped.task_number, 3);
    assert_eq!(mapped.info.task_name, "组合采集");
    assert_eq!(mapped.measurement_points, "1-50, 51-100");
    assert_eq!(mapped.measurement_points_count, 100);

    // 同一张表里没有映射分配的列按单任务列处理
    let single = tasks[1];
    assert_eq!(single.column_index, 2);
    assert_eq!(single.task_number, DEFAULT_TASK_NUMBER);
    assert_eq!(single.info.task_name, "单独采集");
    assert_eq!(single.measurement_points, "1-20");
    assert_eq!(single.parsed_measurement_points.len(), 20);
    assert_eq!(single.parsed_measurement_points.first(), Some(&1));
    assert_eq!(single.parsed_measurement_points.last(), Some(&20));
}

#[test]
fn workbook_with_no_usable_sheet_reports_detected_sheets() {
    let junk = SheetData {
        name: "说明页".to_string(),
        grid: grid(&[&["随便写点什么"]]),
        merges: Vec::new(),
    };
    let err = extract_workbook(&[junk]).unwrap_err();
    let ExtractError::NoTasks { detected_sheets } = err else {
        panic!("expected NoTasks");
    };
    assert_eq!(detected_sheets, vec!["说明页".to_string()]);
}
