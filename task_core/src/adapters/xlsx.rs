//! xlsx 工作簿读取适配层：calamine → `SheetData`（绝对坐标网格 + 合并区域）。
//!
//! 合并区域坐标来自工作表全局坐标系，而 calamine 的 range 以首个非空单元格
//! 为原点，这里在行首/列首补空串把网格对齐到绝对坐标，后续合并填充才能
//! 按同一坐标系定位。
//!
//! 单个工作表读取失败只记 warn 并跳过，整个工作簿打不开才向上报错。

use std::io::{Cursor, Read, Seek};
use std::path::Path;

use calamine::{open_workbook, Data, Reader, Xlsx};

use crate::core::grid::MergeRegion;
use crate::error::ExtractError;
use crate::usecase::extract::SheetData;

/// 打开磁盘上的 xlsx 文件并读出全部工作表（保持工作簿内顺序）。
pub fn read_workbook_path(path: &Path) -> Result<Vec<SheetData>, ExtractError> {
    let workbook: Xlsx<_> = open_workbook(path)
        .map_err(|e: calamine::XlsxError| ExtractError::ReadWorkbook(e.to_string()))?;
    collect_sheets(workbook)
}

/// 从内存字节读取 xlsx（浏览器上传/测试场景）。
pub fn read_workbook_bytes(bytes: &[u8]) -> Result<Vec<SheetData>, ExtractError> {
    let workbook = Xlsx::new(Cursor::new(bytes))
        .map_err(|e| ExtractError::ReadWorkbook(e.to_string()))?;
    collect_sheets(workbook)
}

fn collect_sheets<R: Read + Seek>(mut workbook: Xlsx<R>) -> Result<Vec<SheetData>, ExtractError> {
    workbook
        .load_merged_regions()
        .map_err(|e| ExtractError::ReadWorkbook(e.to_string()))?;

    let sheet_names = workbook.sheet_names().to_owned();
    let mut sheets = Vec::with_capacity(sheet_names.len());

    for name in sheet_names {
        let range = match workbook.worksheet_range(&name) {
            Ok(range) => range,
            Err(e) => {
                log::warn!("skip sheet '{name}': {e}");
                continue;
            }
        };

        let merges = workbook
            .merged_regions_by_sheet(&name)
            .iter()
            .map(|(_, _, dims)| MergeRegion {
                start_row: dims.start.0 as usize,
                start_col: dims.start.1 as usize,
                end_row: dims.end.0 as usize,
                end_col: dims.end.1 as usize,
            })
            .collect();

        sheets.push(SheetData {
            name,
            grid: absolute_grid(&range),
            merges,
        });
    }

    Ok(sheets)
}

/// 把 calamine range 展开为绝对坐标网格：range 原点前的行/列补空串。
fn absolute_grid(range: &calamine::Range<Data>) -> Vec<Vec<String>> {
    let Some((start_row, start_col)) = range.start() else {
        return Vec::new();
    };

    let mut grid: Vec<Vec<String>> = vec![Vec::new(); start_row as usize];
    for row in range.rows() {
        let mut cells: Vec<String> = vec![String::new(); start_col as usize];
        cells.extend(row.iter().map(cell_string));
        grid.push(cells);
    }
    grid
}

fn cell_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(v) => format!("{v}"),
        Data::Int(v) => format!("{v}"),
        Data::Bool(v) => {
            if *v {
                "1".to_string()
            } else {
                "0".to_string()
            }
        }
        other => format!("{other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_string_normalizes_numeric_and_bool_cells() {
        assert_eq!(cell_string(&Data::Empty), "");
        assert_eq!(cell_string(&Data::String("  任务号  ".to_string())), "任务号");
        assert_eq!(cell_string(&Data::Float(45.0)), "45");
        assert_eq!(cell_string(&Data::Float(1.5)), "1.5");
        assert_eq!(cell_string(&Data::Int(7)), "7");
        assert_eq!(cell_string(&Data::Bool(true)), "1");
        assert_eq!(cell_string(&Data::Bool(false)), "0");
    }

    #[test]
    fn absolute_grid_pads_out_to_worksheet_origin() {
        // range 原点在 (2,1)，网格必须补齐前两行和行首一列
        let mut range = calamine::Range::new((2, 1), (3, 2));
        range.set_value((2, 1), Data::String("任务名称".to_string()));
        range.set_value((3, 2), Data::Float(45.0));

        let grid = absolute_grid(&range);
        assert_eq!(grid.len(), 4);
        assert!(grid[0].is_empty());
        assert_eq!(grid[2][1], "任务名称");
        assert_eq!(grid[3][2], "45");
    }

    #[test]
    fn empty_range_yields_empty_grid() {
        let range: calamine::Range<Data> = calamine::Range::empty();
        assert!(absolute_grid(&range).is_empty());
    }

    #[test]
    fn unreadable_bytes_surface_as_read_error() {
        let err = read_workbook_bytes(b"not an xlsx file").unwrap_err();
        assert!(matches!(err, ExtractError::ReadWorkbook(_)));
    }
}
