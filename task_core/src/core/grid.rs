//! 单元格网格归一化：把合并单元格区域展开为稠密二维网格。

use serde::{Deserialize, Serialize};

/// 合并单元格区域，行列均为 0-based 且含端点。
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MergeRegion {
    pub start_row: usize,
    pub start_col: usize,
    pub end_row: usize,
    pub end_col: usize,
}

/// 工作表网格：行数组，允许行长不一致。
pub type SheetGrid = Vec<Vec<String>>;

/// 把每个合并区域左上角单元格的值复制到区域内所有单元格。
///
/// 不修改输入；缺失的行按空行处理，必要时扩展网格。
pub fn fill_merged_cells(grid: &SheetGrid, merges: &[MergeRegion]) -> SheetGrid {
    let mut filled = grid.clone();

    for merge in merges {
        let value = filled
            .get(merge.start_row)
            .and_then(|row| row.get(merge.start_col))
            .cloned()
            .unwrap_or_default();

        for row_index in merge.start_row..=merge.end_row {
            if filled.len() <= row_index {
                filled.resize(row_index + 1, Vec::new());
            }
            let row = &mut filled[row_index];
            if row.len() <= merge.end_col {
                row.resize(merge.end_col + 1, String::new());
            }
            for cell in &mut row[merge.start_col..=merge.end_col] {
                *cell = value.clone();
            }
        }
    }

    filled
}

/// 网格中某个单元格的裁剪文本；越界返回空串。
pub fn cell_text(grid: &SheetGrid, row: usize, col: usize) -> &str {
    grid.get(row)
        .and_then(|r| r.get(col))
        .map(|s| s.trim())
        .unwrap_or("")
}

/// 网格最大列数（行长不一致时取最长行）。
pub fn max_columns(grid: &SheetGrid) -> usize {
    grid.iter().map(Vec::len).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> SheetGrid {
        rows.iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn merge_region_replicates_top_left_value_everywhere() {
        let source = grid(&[&["任务名称", "", ""], &["", "", ""], &["x", "y", "z"]]);
        let merges = vec![MergeRegion {
            start_row: 0,
            start_col: 0,
            end_row: 1,
            end_col: 2,
        }];

        let filled = fill_merged_cells(&source, &merges);
        for row in 0..=1 {
            for col in 0..=2 {
                assert_eq!(filled[row][col], "任务名称", "cell ({row},{col})");
            }
        }
        assert_eq!(filled[2], vec!["x", "y", "z"]);
        // 原网格未被修改
        assert_eq!(source[1][0], "");
    }

    #[test]
    fn merge_region_beyond_grid_extends_with_empty_value() {
        let source = grid(&[&["a"]]);
        let merges = vec![MergeRegion {
            start_row: 2,
            start_col: 1,
            end_row: 3,
            end_col: 2,
        }];

        let filled = fill_merged_cells(&source, &merges);
        assert_eq!(filled.len(), 4);
        assert_eq!(filled[3][2], "");
        assert_eq!(cell_text(&filled, 0, 0), "a");
        assert_eq!(cell_text(&filled, 9, 9), "");
    }

    #[test]
    fn max_columns_handles_jagged_rows() {
        let g = grid(&[&["a"], &["a", "b", "c"], &[]]);
        assert_eq!(max_columns(&g), 3);
        assert_eq!(max_columns(&SheetGrid::new()), 0);
    }
}
