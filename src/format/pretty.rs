//! 任意の JSON 値のインデント付き整形

use std::num::FpCategory;

use serde::{
    Deserialize,
    Serialize,
};
use serde_json::{
    Map,
    Value,
};

/// インデント 1 段分
pub const INDENT: &str = "    ";

/// トップレベル項目の子要素の深さ
///
/// トップレベル項目は [`INDENT`] 1 段の位置にあるため、子要素はさらに 1 段深くなる。
pub const ROOT_DEPTH: usize = 2;

/// 文書の種類ごとの表示オプション
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormatOptions {
    /// 本文の前にキー数／要素数を表示する
    pub show_count: bool,
    /// オブジェクトのキーを挿入順ではなく辞書順で表示する
    pub sort_keys: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self { show_count: true, sort_keys: false }
    }
}

/// `map` の項目を表示順に並べる
#[must_use]
pub fn ordered_entries(map: &Map<String, Value>, sort_keys: bool) -> Vec<(&String, &Value)> {
    let mut entries: Vec<_> = map.iter().collect();
    if sort_keys {
        entries.sort_by(|(a, _), (b, _)| a.cmp(b));
    }
    entries
}

/// `key` の JSON 文字列リテラル
pub(super) fn quote(key: &str) -> String {
    Value::String(key.to_string()).to_string()
}

/// `JSON.stringify` と同じ表記のスカラー
///
/// 浮動小数点数は整数値なら小数部を付けず、`[1e-6, 1e21)` の外では
/// 符号付きの指数表記（`1e+21`）になる。
#[must_use]
pub fn scalar_literal(value: &Value) -> String {
    match value {
        Value::Number(number) if number.is_f64() => {
            number.as_f64().map_or_else(|| number.to_string(), float_literal)
        }
        other => other.to_string(),
    }
}

/// 浮動小数点数の表記
fn float_literal(float: f64) -> String {
    if float.classify() == FpCategory::Zero {
        return "0".to_string();
    }
    if (1e-6..1e21).contains(&float.abs()) {
        return format!("{float}");
    }
    let exponential = format!("{float:e}");
    match exponential.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{mantissa}e+{exponent}")
        }
        _ => exponential,
    }
}

/// 改行なしの JSON 表記（数値は [`scalar_literal`] と同じ）
#[must_use]
pub fn compact_literal(value: &Value) -> String {
    match value {
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(compact_literal).collect();
            format!("[{}]", items.join(","))
        }
        Value::Object(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(key, item)| format!("{}:{}", quote(key), compact_literal(item)))
                .collect();
            format!("{{{}}}", entries.join(","))
        }
        scalar => scalar_literal(scalar),
    }
}

/// `value` をネストの深さ `depth` で整形する
///
/// コンテナの要素は `depth` 段、閉じ括弧は `depth - 1` 段インデントする。
/// スカラーは [`scalar_literal`] の表記になる。
#[must_use]
pub fn format_value(value: &Value, depth: usize, options: FormatOptions) -> String {
    let mut out = String::new();
    write_value(&mut out, value, depth, options);
    out
}

/// 整形した `value` を `out` に追加する
fn write_value(out: &mut String, value: &Value, depth: usize, options: FormatOptions) {
    let closing = INDENT.repeat(depth.saturating_sub(1));
    match value {
        Value::Array(items) => {
            out.push_str("[\n");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(",\n");
                }
                out.push_str(&closing);
                out.push_str(INDENT);
                write_value(out, item, depth + 1, options);
            }
            out.push('\n');
            out.push_str(&closing);
            out.push(']');
        }
        Value::Object(map) => {
            out.push_str("{\n");
            for (i, (key, item)) in ordered_entries(map, options.sort_keys).into_iter().enumerate() {
                if i > 0 {
                    out.push_str(",\n");
                }
                out.push_str(&closing);
                out.push_str(INDENT);
                out.push_str(&quote(key));
                out.push_str(": ");
                write_value(out, item, depth + 1, options);
            }
            out.push('\n');
            out.push_str(&closing);
            out.push('}');
        }
        scalar => out.push_str(&scalar_literal(scalar)),
    }
}

/// トップレベル項目の本文を整形する
///
/// 括弧は 0 桁目、各項目は [`INDENT`] 1 段の位置に置き、項目の値は `root_depth` で
/// 整形する。空のコンテナは `[]` / `{}` になる。
#[must_use]
pub fn format_body(value: &Value, root_depth: usize, options: FormatOptions) -> String {
    let (open, close, lines): (&str, &str, Vec<String>) = match value {
        Value::Array(items) => (
            "[",
            "]",
            items.iter().map(|item| format_value(item, root_depth, options)).collect(),
        ),
        Value::Object(map) => (
            "{",
            "}",
            ordered_entries(map, options.sort_keys)
                .into_iter()
                .map(|(key, item)| {
                    format!("{}: {}", quote(key), format_value(item, root_depth, options))
                })
                .collect(),
        ),
        scalar => return scalar_literal(scalar),
    };

    if lines.is_empty() {
        return format!("{open}{close}");
    }
    let entries: Vec<String> = lines.into_iter().map(|line| format!("{INDENT}{line}")).collect();
    format!("{open}\n{}\n{close}", entries.join(",\n"))
}
