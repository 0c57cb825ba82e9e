//! 設定の型とバリデーション

use std::path::PathBuf;

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

use crate::document::DocumentKind;
use crate::format::FormatOptions;

/// 設定項目 1 つのバリデーションエラー
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error in '{field_path}': {message}")]
pub struct ValidationError {
    /// フィールドへの JSON パス（例: "json.suffix"）
    pub field_path: String,
    /// エラーメッセージ
    pub message: String,
}

impl ValidationError {
    /// 新しいバリデーションエラーを作成
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

/// 設定・ロケールファイルのエラー
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    #[error("Failed to load configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// バリデーションエラーを番号付きの行にする
fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// 拡張機能の設定
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtensionSettings {
    /// 設定文書の表示オプション
    pub config: FormatOptions,
    /// ユーザー文書の表示オプション
    pub user: FormatOptions,
    /// ローカライズ文書の表示オプション
    pub l10n: FormatOptions,

    /// JSON ダウンロードの形式
    pub json: FileFormat,
    /// スプレッドシートダウンロードの形式
    pub xls: XlsConfig,

    /// ダウンロードのファイル名は `"<prefix> <翻訳したキー><suffix>"`
    pub filename_prefix: String,

    /// UI 文字列のロケール。`None` なら組み込みの英語。
    pub locale: Option<String>,
    /// `<locale>/messages.json` を含むディレクトリ
    pub locales_dir: PathBuf,

    /// リレーが注入する抽出スクリプトのパス
    pub extractor_script: String,
}

/// ダウンロードのファイル形式
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileFormat {
    /// MIME タイプ
    pub mimetype: String,
    /// 「…としてダウンロード」リンクに表示する名前
    #[serde(rename = "type")]
    pub type_label: String,
    /// ファイル名の拡張子（`.` 始まり）
    pub suffix: String,
}

impl FileFormat {
    /// 新しい形式を作成
    fn new(mimetype: &str, type_label: &str, suffix: &str) -> Self {
        Self {
            mimetype: mimetype.to_string(),
            type_label: type_label.to_string(),
            suffix: suffix.to_string(),
        }
    }
}

impl Default for FileFormat {
    fn default() -> Self {
        Self::new("application/json", "json", ".json")
    }
}

/// スプレッドシート出力の設定
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct XlsConfig {
    /// ファイル形式
    pub file: FileFormat,
    /// `KEY` / `VALUE` のヘッダー行を出力する
    pub print_headers: bool,
}

impl Default for XlsConfig {
    fn default() -> Self {
        Self {
            file: FileFormat::new(
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                "xls",
                ".xls",
            ),
            print_headers: false,
        }
    }
}

impl ExtensionSettings {
    /// `kind` の表示オプション
    #[must_use]
    pub const fn options_for(&self, kind: DocumentKind) -> FormatOptions {
        match kind {
            DocumentKind::Config => self.config,
            DocumentKind::User => self.user,
            DocumentKind::L10n => self.l10n,
        }
    }

    /// 設定を検証し、問題のある項目をすべて返す
    ///
    /// # Errors
    /// - 必須項目が空
    /// - 拡張子が `.` で始まらない
    /// - ロケールがディレクトリ名として不正
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.filename_prefix.trim().is_empty() {
            errors.push(ValidationError::new(
                "filenamePrefix",
                "The prefix cannot be empty. Example: \"COYO\"",
            ));
        }

        for (field, format) in [("json", &self.json), ("xls.file", &self.xls.file)] {
            validate_file_format(field, format, &mut errors);
        }

        if let Some(locale) = &self.locale
            && (locale.is_empty() || locale.contains(['/', '\\']) || locale == "..")
        {
            errors.push(ValidationError::new(
                "locale",
                format!("Invalid locale '{locale}'. Use a directory name such as \"de\""),
            ));
        }

        if self.extractor_script.is_empty() {
            errors.push(ValidationError::new(
                "extractorScript",
                "The script path cannot be empty. Example: \"content_scripts/dataretriever.js\"",
            ));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// ファイル形式を検証する
fn validate_file_format(field: &str, format: &FileFormat, errors: &mut Vec<ValidationError>) {
    if format.mimetype.is_empty() {
        errors.push(ValidationError::new(
            format!("{field}.mimetype"),
            "The MIME type cannot be empty",
        ));
    }
    if format.suffix.len() < 2 || !format.suffix.starts_with('.') {
        errors.push(ValidationError::new(
            format!("{field}.suffix"),
            format!("Invalid suffix '{}'. It must start with a dot, e.g. \".json\"", format.suffix),
        ));
    }
}

impl Default for ExtensionSettings {
    fn default() -> Self {
        Self {
            config: FormatOptions { show_count: true, sort_keys: false },
            user: FormatOptions { show_count: true, sort_keys: false },
            l10n: FormatOptions { show_count: true, sort_keys: true },
            json: FileFormat::default(),
            xls: XlsConfig::default(),
            filename_prefix: "COYO".to_string(),
            locale: None,
            locales_dir: PathBuf::from("_locales"),
            extractor_script: "content_scripts/dataretriever.js".to_string(),
        }
    }
}
