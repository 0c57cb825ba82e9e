//! 2 列の SpreadsheetML 出力

use html_escape::encode_text;
use serde_json::Value;

use super::pretty::compact_literal;

/// テーブル開始タグまでのブック冒頭
const HEADER: &str = concat!(
    "<?xml version=\"1.0\"?>\n",
    "<ss:Workbook xmlns:ss=\"urn:schemas-microsoft-com:office:spreadsheet\">\n",
    "<ss:Worksheet ss:Name=\"Sheet1\">\n",
    "<ss:Table>\n\n",
);

/// 最終行の後の閉じタグ
const FOOTER: &str = "\n</ss:Table>\n</ss:Worksheet>\n</ss:Workbook>\n";

/// ヘッダー行のラベル
const HEADER_CELLS: [&str; 2] = ["KEY", "VALUE"];

/// 値セルのテキスト。文字列はそのまま、それ以外は改行なしの JSON。
fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => compact_literal(other),
    }
}

/// 文字列セルの行を 1 行追加する
fn push_row(xml: &mut String, cells: [&str; 2]) {
    xml.push_str("<ss:Row>\n");
    for cell in cells {
        xml.push_str("  <ss:Cell>\n");
        xml.push_str("    <ss:Data ss:Type=\"String\">");
        xml.push_str(&encode_text(cell));
        xml.push_str("</ss:Data>\n");
        xml.push_str("  </ss:Cell>\n");
    }
    xml.push_str("</ss:Row>\n");
}

/// `document` のトップレベル項目をシート 1 枚のブックに変換する
///
/// 各行はキーと文字列化した値の 2 セル。配列はインデックスをキーにし、
/// スカラーは行を作らない。
#[must_use]
pub fn to_row_markup(document: &Value, print_headers: bool) -> String {
    let mut xml = String::from(HEADER);
    if print_headers {
        push_row(&mut xml, HEADER_CELLS);
    }

    match document {
        Value::Object(map) => {
            for (key, value) in map {
                push_row(&mut xml, [key.as_str(), cell_text(value).as_str()]);
            }
        }
        Value::Array(items) => {
            for (index, value) in items.iter().enumerate() {
                push_row(&mut xml, [index.to_string().as_str(), cell_text(value).as_str()]);
            }
        }
        _ => {}
    }

    xml.push_str(FOOTER);
    xml
}
