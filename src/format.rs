//! 文書のテキスト整形（整形表示、スプレッドシート出力、HTML）

/// インデント付き整形
mod pretty;
/// HTML とダウンロード
mod render;
/// SpreadsheetML 出力
mod row_markup;

pub use pretty::{
    FormatOptions,
    INDENT,
    ROOT_DEPTH,
    compact_literal,
    format_body,
    format_value,
    ordered_entries,
    scalar_literal,
};
pub use render::{
    Download,
    RenderedDocument,
    render_document,
    translate_key,
};
pub use row_markup::to_row_markup;
