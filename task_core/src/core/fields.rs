//! 字段值解析器：把自由文本单元格解析为类型化字段。
//!
//! 全部为全函数：任何输入都不会 panic，无法解析时返回 None/空值/保守默认值，
//! 单个畸形单元格不应中断整列或整表的提取。

/// 文本中第一段连续数字。
fn first_digit_run(value: &str) -> Option<&str> {
    let start = value.find(|c: char| c.is_ascii_digit())?;
    let rest = &value[start..];
    let len = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    Some(&rest[..len])
}

/// 开头的 `数字：` / `数字:` 前缀（半角或全角冒号）。
fn leading_number_with_colon(value: &str) -> Option<u32> {
    let digits_len = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    if digits_len == 0 {
        return None;
    }
    let rest = &value[digits_len..];
    if rest.starts_with(':') || rest.starts_with('：') {
        value[..digits_len].parse().ok()
    } else {
        None
    }
}

/// JS `Number()` 式整串数值判断（结构识别与映射表单元格使用）。
pub fn parse_full_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// JS `parseInt()` 式前缀整数解析（任务号、执行次数使用）。
pub fn parse_leading_int(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    let (sign, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1i64, rest),
        None => (1i64, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let digits_len = body
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(body.len());
    if digits_len == 0 {
        return None;
    }
    body[..digits_len].parse::<i64>().ok().map(|v| v * sign)
}

/// 数据结构方式：`数字：描述` 取数字；含“自描述”视为 0。
pub fn parse_data_structure_type(value: &str) -> Option<u32> {
    if value.is_empty() {
        return None;
    }
    if let Some(code) = leading_number_with_colon(value) {
        return Some(code);
    }
    if value.contains("自描述") {
        return Some(0);
    }
    None
}

/// 周期数值（采样周期、上报周期）：取文本中第一段数字。
pub fn parse_period_value(value: &str) -> Option<u32> {
    first_digit_run(value)?.parse().ok()
}

/// 周期单位：`数字：类型` 取数字；否则按关键词 [0:分, 1:小时/时, 2:日, 3:月]。
pub fn parse_period_unit(value: &str) -> Option<u32> {
    if value.is_empty() {
        return None;
    }
    if let Some(code) = leading_number_with_colon(value) {
        return Some(code);
    }
    if value.contains('分') {
        return Some(0);
    }
    if value.contains("小时") || value.contains('时') {
        return Some(1);
    }
    if value.contains('日') {
        return Some(2);
    }
    if value.contains('月') {
        return Some(3);
    }
    None
}

/// 数据抽取倍率：取文本中第一段数字。
pub fn parse_extraction_ratio(value: &str) -> Option<u32> {
    first_digit_run(value)?.parse().ok()
}

/// 时间格式归一化：去掉所有非数字后按长度映射为 10 位 `YYMMDDhhmm`。
///
/// 长度 <6 的数字串视为格式不明，原样返回而不是补零。
pub fn parse_time_format(value: &str) -> String {
    let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return String::new();
    }

    match digits.len() {
        10 => digits,
        // YYYYMMDDhhmm：去掉世纪
        12 => digits[2..].to_string(),
        // YYYYMMDDhhmmss：去掉世纪与秒
        14 => digits[2..12].to_string(),
        // YYMMDDhh：补分钟
        8 => format!("{digits}00"),
        // YYMMDD：补时分
        6 => format!("{digits}0000"),
        // YYMM：补日时分
        4 => format!("{digits}010000"),
        len if len >= 12 => digits[2..].chars().take(10).collect(),
        len if len >= 6 => {
            let mut padded = digits;
            while padded.len() < 10 {
                padded.push('0');
            }
            padded[..10].to_string()
        }
        _ => digits,
    }
}

/// 测量点标识解析：支持 `251-253, 300`、`测量点2`、全角逗号等格式。
///
/// 展开范围、去重、升序；空输入按约定返回默认测量点 `[1]`。
pub fn parse_measurement_points(value: &str) -> Vec<u32> {
    if value.is_empty() {
        return vec![1];
    }

    let mut points: Vec<u32> = Vec::new();
    for part in value.split([',', '，']) {
        let cleaned: String = part
            .trim()
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '-')
            .collect();
        if cleaned.is_empty() {
            continue;
        }

        if cleaned.contains('-') {
            let mut bounds = cleaned.split('-');
            let start = bounds.next().and_then(|s| s.parse::<u32>().ok());
            let end = bounds.next().and_then(|s| s.parse::<u32>().ok());
            if let (Some(start), Some(end)) = (start, end) {
                if start <= end {
                    points.extend(start..=end);
                }
            }
        } else if let Ok(point) = cleaned.parse::<u32>() {
            points.push(point);
        }
    }

    points.sort_unstable();
    points.dedup();
    points
}
