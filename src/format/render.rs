//! ポップアップ用の文書 HTML とダウンロード

use html_escape::{
    encode_double_quoted_attribute,
    encode_text,
};
use serde_json::{
    Map,
    Value,
};

use super::pretty::{
    FormatOptions,
    ROOT_DEPTH,
    format_body,
    ordered_entries,
    scalar_literal,
};
use super::row_markup::to_row_markup;
use crate::config::{
    ExtensionSettings,
    FileFormat,
};
use crate::document::{
    AVAILABLE_LANGUAGE_KEYS,
    TRANSLATION_TABLE,
};
use crate::i18n::MessageCatalog;

/// ダウンロードとして提供するファイル
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub filename: String,
    pub mimetype: String,
    pub contents: String,
}

/// 描画した HTML とそこからリンクするダウンロード
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedDocument {
    pub html: String,
    pub downloads: Vec<Download>,
}

/// トップレベルのキーの表示名
#[must_use]
pub fn translate_key(key: &str, messages: &MessageCatalog) -> String {
    match key {
        AVAILABLE_LANGUAGE_KEYS => messages.get("keyAvailableLanguageKeys"),
        TRANSLATION_TABLE => messages.get("keyTranslationTable"),
        other => other.to_string(),
    }
}

/// 文書のトップレベル項目。配列はインデックスがキーになり、スカラーには項目がない。
fn top_level_entries(document: &Value) -> Vec<(String, &Value)> {
    match document {
        Value::Object(map) => map.iter().map(|(key, value)| (key.clone(), value)).collect(),
        Value::Array(items) => {
            items.iter().enumerate().map(|(index, value)| (index.to_string(), value)).collect()
        }
        _ => Vec::new(),
    }
}

/// `document` のトップレベル項目をすべて描画する
///
/// 各項目は翻訳したキーの見出し、件数（任意）、整形した本文からなる。
/// 空でない翻訳テーブルには JSON とスプレッドシートのダウンロードが付く。
#[must_use]
pub fn render_document(
    document: &Value,
    options: FormatOptions,
    messages: &MessageCatalog,
    settings: &ExtensionSettings,
) -> RenderedDocument {
    let mut rendered = RenderedDocument::default();

    for (key, value) in top_level_entries(document) {
        if value.is_null() {
            continue;
        }
        let label = translate_key(&key, messages);
        rendered.html.push_str(&format!("<h3>{}</h3>", encode_text(&label)));

        let (count_key, count) = match value {
            Value::Array(items) => ("numberElements", items.len()),
            Value::Object(map) => ("numberKeys", map.len()),
            scalar => {
                rendered.html.push_str(&encode_text(&scalar_literal(scalar)));
                continue;
            }
        };
        let body = format_body(value, ROOT_DEPTH, options);

        if key == TRANSLATION_TABLE
            && let Value::Object(table) = value
            && !table.is_empty()
        {
            let exports =
                export_translation_table(&label, &body, table, options, messages, settings);
            rendered.html.push_str(&exports.html);
            rendered.downloads.extend(exports.downloads);
        }

        if options.show_count {
            rendered.html.push_str(&format!("{} {count}", encode_text(&messages.get(count_key))));
        }
        rendered.html.push_str(&format!("<pre>{}</pre>", encode_text(&body)));
    }

    rendered
}

/// 翻訳テーブルの JSON とスプレッドシートのダウンロードを作る
fn export_translation_table(
    label: &str,
    body: &str,
    table: &Map<String, Value>,
    options: FormatOptions,
    messages: &MessageCatalog,
    settings: &ExtensionSettings,
) -> RenderedDocument {
    // 行は表示と同じキー順
    let ordered: Map<String, Value> = ordered_entries(table, options.sort_keys)
        .into_iter()
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    let downloads = vec![
        download(label, &settings.json, body.to_string(), settings),
        download(
            label,
            &settings.xls.file,
            to_row_markup(&Value::Object(ordered), settings.xls.print_headers),
            settings,
        ),
    ];

    let mut html = String::from("<ul>");
    for (item, format) in downloads.iter().zip([&settings.json, &settings.xls.file]) {
        html.push_str(&format!(
            "<li><a href=\"{href}\" download=\"{href}\">{text}</a></li>",
            href = encode_double_quoted_attribute(&item.filename),
            text = encode_text(&messages.get_with("downloadAs", &[format.type_label.as_str()])),
        ));
    }
    html.push_str("</ul>");

    RenderedDocument { html, downloads }
}

/// `"<prefix> <label><suffix>"` という名前のダウンロード
fn download(
    label: &str,
    format: &FileFormat,
    contents: String,
    settings: &ExtensionSettings,
) -> Download {
    Download {
        filename: format!("{} {label}{}", settings.filename_prefix, format.suffix),
        mimetype: format.mimetype.clone(),
        contents,
    }
}
