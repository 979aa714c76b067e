use std::env;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use task_core::adapters::xlsx::read_workbook_path;
use task_core::usecase::export::{export_ini_report, export_json, export_task_template};
use task_core::{extract_workbook, Extraction};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let Some(input) = args.get(1) else {
        anyhow::bail!("usage: task_core_tester <tasks.xlsx>");
    };
    let input = Path::new(input);

    if !input.exists() {
        anyhow::bail!("input file not found: {}", input.display());
    }

    let sheets = read_workbook_path(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let extraction = extract_workbook(&sheets)
        .with_context(|| format!("no tasks extracted from {}", input.display()))?;

    print_summary(&extraction);
    write_outputs(input, &extraction)?;

    Ok(())
}

fn print_summary(extraction: &Extraction) {
    println!(
        "sheets: {}, tasks: {}",
        extraction.stats.total_sheets, extraction.stats.total_tasks
    );
    for entry in &extraction.stats.tasks_by_sheet {
        println!("  [{}] {} task(s)", entry.sheet, entry.tasks);
    }
}

fn write_outputs(input: &Path, extraction: &Extraction) -> Result<()> {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "tasks".to_string());
    let dir = input.parent().unwrap_or_else(|| Path::new("."));

    let json_path = dir.join(format!("{stem}_tasks.json"));
    fs::write(&json_path, export_json(extraction)?)
        .with_context(|| format!("failed to write {}", json_path.display()))?;
    println!("[ok] {}", json_path.display());

    let report_path = dir.join(format!("{stem}_tasks.txt"));
    fs::write(&report_path, export_ini_report(extraction))
        .with_context(|| format!("failed to write {}", report_path.display()))?;
    println!("[ok] {}", report_path.display());

    let template_path = dir.join(format!("{stem}_task_template.json"));
    let tasks: Vec<_> = extraction.all_tasks().collect();
    fs::write(&template_path, export_task_template(tasks)?)
        .with_context(|| format!("failed to write {}", template_path.display()))?;
    println!("[ok] {}", template_path.display());

    Ok(())
}
