//! 数据项解析：从非结构化中文文本中提取“8 位十六进制数据标识 → 描述”映射。
//!
//! 模板作者的书写习惯差异很大，这里按从严到宽的 5 级策略依次尝试，
//! 任一策略产出 ≥1 条即停止。解析是尽力而为的：级联并不穷尽所有现实格式，
//! 个别输入可能切错标识边界，用真实样本回归（见测试）而不是假设规则完备。

use std::sync::OnceLock;

use regex::Regex;

use super::model::DataItems;

fn standard_re() -> &'static Regex {
    // E1008030（上日）停电总次数 这类“标识（注记）描述”重复段
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"([A-Fa-f0-9]{8})[（(][^)）]*[)）]([^、,，；;]+)").expect("static regex")
    })
}

fn hex_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Fa-f0-9]+").expect("static regex"))
}

fn item_spaced_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([0-9A-Fa-f]{8})\s+(.+)$").expect("static regex"))
}

fn item_joined_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([0-9]{8})([A-Za-z\u{4e00}-\u{9fff}].*)$").expect("static regex")
    })
}

fn item_seven_digit_re() -> &'static Regex {
    // 7 位数字 + 1 个十六进制字母开头的描述；字母被消费掉、标识前补 0（历史行为）
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([0-9]{7})[A-Fa-f]([A-Za-z\u{4e00}-\u{9fff}].*)$").expect("static regex")
    })
}

fn item_loose_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([0-9A-Fa-f]{6,8})([^0-9A-Fa-f].*)$").expect("static regex"))
}

/// 文本内的一处标识命中：`span` 为被匹配尾段在原文中的字节区间。
struct HexHit {
    id: String,
    start: usize,
    end: usize,
}

/// 模拟 `[A-Fa-f0-9]{6,8}(?![A-Fa-f0-9])` 的全局匹配：每个最大十六进制
/// 连续段只产生一次命中，取段尾 6–8 个字符（超长段取最后 8 个）。
fn hex_hits(text: &str, min_len: usize) -> Vec<HexHit> {
    hex_run_re()
        .find_iter(text)
        .filter(|m| m.len() >= min_len)
        .map(|m| {
            let tail = m.len().min(8);
            let start = m.end() - tail;
            HexHit {
                id: format!("{:0>8}", text[start..m.end()].to_uppercase()),
                start,
                end: m.end(),
            }
        })
        .collect()
}

/// 去掉命中的尾段后的剩余文本（超长段的前缀保留，与历史实现一致）。
fn remove_hit_spans(text: &str, hits: &[HexHit]) -> String {
    let mut kept = String::with_capacity(text.len());
    let mut cursor = 0usize;
    for hit in hits {
        kept.push_str(&text[cursor..hit.start]);
        cursor = hit.end;
    }
    kept.push_str(&text[cursor..]);
    kept
}

const EDGE_SEPARATORS: &[char] = &['、', ',', '，', '；', ';', '：', ':', '-', '—', '–'];

fn strip_edges(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_whitespace() || EDGE_SEPARATORS.contains(&c))
}

/// 解析数据项文本。永不失败；无法识别任何标识时返回空映射。
pub fn parse_data_items(value: &str) -> DataItems {
    let mut items = DataItems::new();
    if value.is_empty() {
        return items;
    }

    // 策略 1：标准“标识（注记）描述”格式
    for captures in standard_re().captures_iter(value) {
        let id = captures[1].to_uppercase();
        let description = captures[2].trim().to_string();
        items.insert(id, description);
    }

    // 策略 2/3：分号分段格式，或连续罗列格式（含位置法兜底）
    if items.is_empty() {
        if value.contains(['；', ';']) {
            parse_segmented(value, &mut items);
        } else {
            parse_itemized(value, &mut items);
        }
    }

    // 策略 4：按句读切段，段内所有 8 位标识共享段描述
    if items.is_empty() {
        for segment in value.split(['；', ';', '。', '\n', '\r']) {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            let hits = hex_hits(segment, 8);
            if hits.is_empty() {
                continue;
            }
            let description = strip_edges(&remove_hit_spans(segment, &hits)).to_string();
            if description.is_empty() {
                continue;
            }
            for hit in hits {
                items.insert(hit.id, description.clone());
            }
        }
    }

    // 策略 5：只有标识、没有描述
    if items.is_empty() {
        for hit in hex_hits(value, 8) {
            items.insert(hit.id, String::new());
        }
    }

    items
}

/// 分号分段：段内所有 6–8 位标识共享“去掉标识后的剩余文本”作为描述。
fn parse_segmented(value: &str, items: &mut DataItems) {
    for segment in value.split(['；', ';']) {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        let hits = hex_hits(segment, 6);
        if hits.is_empty() {
            continue;
        }
        let description = remove_hit_spans(segment, &hits);
        let description = description
            .trim_matches(|c: char| c.is_whitespace() || matches!(c, '、' | ',' | '，'))
            .to_string();
        if description.is_empty() {
            continue;
        }
        for hit in hits {
            items.insert(hit.id, description.clone());
        }
    }
}

/// 连续罗列：逐项用四个逐渐放宽的正则切分“标识 + 描述”；
/// 全部落空时退回位置法（相邻标识之间的文本作为前一个标识的描述）。
fn parse_itemized(value: &str, items: &mut DataItems) {
    for item in value.split(['、', ',', '，', '；', ';']) {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }

        let parsed = item_spaced_re()
            .captures(item)
            .map(|c| (c[1].to_uppercase(), c[2].to_string()))
            .or_else(|| {
                item_joined_re()
                    .captures(item)
                    .map(|c| (c[1].to_uppercase(), c[2].to_string()))
            })
            .or_else(|| {
                item_seven_digit_re()
                    .captures(item)
                    .map(|c| (format!("0{}", &c[1]), c[2].to_string()))
            })
            .or_else(|| {
                item_loose_re()
                    .captures(item)
                    .map(|c| (format!("{:0>8}", c[1].to_uppercase()), c[2].to_string()))
            });

        if let Some((id, description)) = parsed {
            let description = strip_edges(&description);
            if !description.is_empty() {
                items.insert(id, description.to_string());
            }
        }
    }

    if !items.is_empty() {
        return;
    }

    let hits = hex_hits(value, 6);
    for index in 0..hits.len() {
        let start = hits[index].end;
        let end = hits.get(index + 1).map(|next| next.start).unwrap_or(value.len());
        let description = strip_edges(value[start..end].trim());
        if !description.is_empty() {
            items.insert(hits[index].id.clone(), description.to_string());
        }
    }
}
