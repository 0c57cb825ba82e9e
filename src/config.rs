//! `.coyo-inspector.json` から読み込む拡張機能の設定

/// 設定ファイルの読み込みと検証
mod manager;
/// 設定の型とバリデーション
mod types;

pub use manager::{
    CONFIG_FILE_NAME,
    ConfigManager,
};
pub use types::{
    ConfigError,
    ExtensionSettings,
    FileFormat,
    ValidationError,
    XlsConfig,
};
