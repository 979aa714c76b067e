//! 任务参数二进制编码：把任务字段 + 测量点集合序列化为固件下发的字节序列。
//!
//! 字节语义为下游固件协议的线上格式，逐字节固定：
//! - 多字节整数小端（低字节在前）
//! - BCD 时间 5 字节按“年月日时分”编码后整组逆序写出（分在前）
//! - 数据标识 4 字节逆序写出（编码末字节在前）
//! 逆序是协议约定而不是实现痕迹，重实现必须逐字节保持。

use super::model::TaskInfo;
use crate::core::fields::parse_leading_int;

/// 测量点号 → 2 字节 DA 编码（分组位标寻址：每 8 个点一组）。
///
/// 返回 `(低字节, 高字节)`，即写出顺序。`0xFFFF` 表示全体（`FF FF`），
/// 0 编码为 `00 00`。其余值：组号=(v-1)/8+1 放高字节，组内位 (v-1)%8 置位放低字节。
pub fn to_da(point: u32) -> (u8, u8) {
    if point == 0xFFFF {
        return (0xFF, 0xFF);
    }
    if point == 0 {
        return (0x00, 0x00);
    }
    let low_bit = (point - 1) % 8;
    let group = (point - 1) / 8 + 1;
    ((1u8 << low_bit), (group & 0xFF) as u8)
}

/// 两位十进制数 → BCD 字节（十位在高 4 位）；超过 99 先取模 100。
pub fn dec_to_bcd(value: u32) -> u8 {
    let value = value % 100;
    (((value / 10) << 4) | (value % 10)) as u8
}

/// 10 位 `YYMMDDhhmm` 字符串 → 5 字节 BCD（年在前）。
///
/// 长度不足 10 或含非数字组时返回全零（缺失时间按有效格式的零值下发）。
pub fn time_to_bcd_bytes(time: &str) -> [u8; 5] {
    let mut bytes = [0u8; 5];
    if time.len() < 10 || !time.is_ascii() {
        return bytes;
    }
    for (index, byte) in bytes.iter_mut().enumerate() {
        let group = &time[index * 2..index * 2 + 2];
        match group.parse::<u32>() {
            Ok(value) => *byte = dec_to_bcd(value),
            Err(_) => return [0u8; 5],
        }
    }
    bytes
}

/// 生成任务参数字节序列。纯函数：同一输入必然得到同一输出，绝不失败；
/// 缺失的数值字段使用协议默认值（抽取倍率默认 1，其余默认 0）。
///
/// `points` 为已展开、升序去重的测量点集合（枚举引擎负责解析）。
pub fn build_task_param(info: &TaskInfo, points: &[u32]) -> Vec<u8> {
    let mut param = Vec::with_capacity(21 + points.len() * 2 + info.data_items.len() * 4);

    // 1. 有效性标志
    param.push(1);

    // 2. 上报基准时间（5 字节 BCD，逆序）
    let report_time = time_to_bcd_bytes(&info.report_base_time);
    param.extend(report_time.iter().rev());

    // 3/4. 定时上报周期单位、周期
    param.push(info.report_period_unit.unwrap_or(0) as u8);
    param.push(info.report_period.unwrap_or(0) as u8);

    // 5. 数据结构方式（0=自描述，1=按任务定义）
    param.push(info.data_structure_type.unwrap_or(0) as u8);

    // 6. 采样基准时间（5 字节 BCD，逆序）
    let sampling_time = time_to_bcd_bytes(&info.sampling_base_time);
    param.extend(sampling_time.iter().rev());

    // 7/8. 定时采样周期单位、周期
    param.push(info.sampling_period_unit.unwrap_or(0) as u8);
    param.push(info.sampling_period.unwrap_or(0) as u8);

    // 9. 数据抽取倍率
    param.push(info.extraction_ratio.unwrap_or(1) as u8);

    // 10. 执行次数（2 字节小端，0 表示永远执行）
    let execution_count = parse_leading_int(&info.execution_count).unwrap_or(0) as u16;
    param.extend(execution_count.to_le_bytes());

    // 11/12. 信息点标识组数 + 每点 2 字节 DA 编码
    param.push((points.len() & 0xFF) as u8);
    for &point in points {
        let (da1, da2) = to_da(point);
        param.push(da1);
        param.push(da2);
    }

    // 13/14. 数据标识编码组数 + 每项 4 字节（不足 8 位编码前补 0，逆字节序）
    param.push((info.data_items.len() & 0xFF) as u8);
    for (id, _) in info.data_items.iter() {
        param.extend(data_item_bytes(id));
    }

    param
}

/// 数据标识（最多 8 位十六进制）→ 线上 4 字节（逆序）。
/// 无法按十六进制解析时退化为 4 个零字节。
fn data_item_bytes(id: &str) -> [u8; 4] {
    let padded = format!("{id:0>8}");
    if padded.len() != 8 {
        return [0; 4];
    }
    match u32::from_str_radix(&padded, 16) {
        Ok(value) => value.to_le_bytes(),
        Err(_) => [0; 4],
    }
}

/// 字节序列 → 展示/导出用十六进制串（两位大写，空格分隔）。
pub fn format_task_param(param: &[u8]) -> String {
    param
        .iter()
        .map(|byte| format!("{byte:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::DataItems;

    #[test]
    fn da_transform_boundary_values() {
        struct Case {
            point: u32,
            expected: (u8, u8),
        }
        let cases = [
            Case { point: 0, expected: (0x00, 0x00) },
            Case { point: 1, expected: (0x01, 0x01) },
            Case { point: 8, expected: (0x80, 0x01) },
            Case { point: 9, expected: (0x01, 0x02) },
            Case { point: 16, expected: (0x80, 0x02) },
            Case { point: 0xFFFF, expected: (0xFF, 0xFF) },
        ];
        for case in cases {
            assert_eq!(to_da(case.point), case.expected, "point {}", case.point);
        }
    }

    #[test]
    fn bcd_time_encodes_per_group_and_handles_bad_input() {
        assert_eq!(time_to_bcd_bytes("2401081230"), [0x24, 0x01, 0x08, 0x12, 0x30]);
        assert_eq!(time_to_bcd_bytes(""), [0; 5]);
        assert_eq!(time_to_bcd_bytes("12345"), [0; 5]);
        assert_eq!(time_to_bcd_bytes("24010812ab"), [0; 5]);
        assert_eq!(dec_to_bcd(59), 0x59);
        assert_eq!(dec_to_bcd(123), 0x23);
    }

    fn sample_info() -> TaskInfo {
        let mut data_items = DataItems::new();
        data_items.insert("E1008030".to_string(), "停电总次数".to_string());
        data_items.insert("1FF".to_string(), "测试项".to_string());
        TaskInfo {
            report_base_time: "2401081230".to_string(),
            report_period_unit: Some(2),
            report_period: Some(1),
            data_structure_type: Some(1),
            sampling_base_time: "2401080000".to_string(),
            sampling_period_unit: Some(0),
            sampling_period: Some(15),
            extraction_ratio: Some(1),
            execution_count: "300".to_string(),
            data_items,
            ..TaskInfo::default()
        }
    }

    #[test]
    fn task_param_layout_is_byte_exact() {
        let info = sample_info();
        let param = build_task_param(&info, &[1, 8]);

        let expected: Vec<u8> = vec![
            0x01, // 有效性标志
            0x30, 0x12, 0x08, 0x01, 0x24, // 上报基准时间 BCD 逆序
            0x02, 0x01, // 上报周期单位/周期
            0x01, // 数据结构方式
            0x00, 0x00, 0x08, 0x01, 0x24, // 采样基准时间 BCD 逆序
            0x00, 0x0F, // 采样周期单位/周期
            0x01, // 抽取倍率
            0x2C, 0x01, // 执行次数 300 小端
            0x02, // 测量点组数
            0x01, 0x01, // 点 1
            0x80, 0x01, // 点 8
            0x02, // 数据项组数
            0x30, 0x80, 0x00, 0xE1, // E1008030 逆序
            0xFF, 0x01, 0x00, 0x00, // 000001FF 逆序
        ];
        assert_eq!(param, expected);
        assert_eq!(
            format_task_param(&param[..6]),
            "01 30 12 08 01 24"
        );
    }

    #[test]
    fn encoding_is_deterministic() {
        let info = sample_info();
        assert_eq!(build_task_param(&info, &[3, 7]), build_task_param(&info, &[3, 7]));
    }

    #[test]
    fn all_default_info_still_encodes_fixed_layout() {
        let info = TaskInfo::default();
        let param = build_task_param(&info, &[1]);
        // 19 字节固定字段 + 两个组数字节 + 1 个测量点 2 字节
        assert_eq!(param.len(), 23);
        assert_eq!(param[0], 1);
        assert_eq!(param[16], 1, "抽取倍率缺省为 1");
        assert_eq!(&param[17..19], &[0, 0], "执行次数缺省为 0");
        assert_eq!(param[19], 1, "单个测量点");
        assert_eq!(*param.last().unwrap(), 0, "数据项组数为 0");
    }
}
