//! WebExtension の `messages.json` 形式による UI 文字列のローカライズ

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::config::ConfigError;

/// 組み込みの英語文字列
const ENGLISH: &[(&str, &str)] = &[
    ("showConfig", "Show config"),
    ("showUser", "Show user"),
    ("showL10n", "Show localization"),
    ("popupContent", "Choose which data of this COYO page to show."),
    ("errorContent", "Could not read any data from this page. Is this a COYO website?"),
    ("errorNotLoggedIn", "No user is currently logged in."),
    ("errorPending", "The data has not been retrieved yet. Please try again in a moment."),
    ("headerDataConfig", "Configuration"),
    ("headerDataUser", "User"),
    ("headerDataUserName", "User: $1"),
    ("headerDataL10n", "Localization"),
    ("headerDataPending", "Not available yet"),
    ("numberKeys", "Number of keys:"),
    ("numberElements", "Number of elements:"),
    ("downloadAs", "Download as $1"),
    ("keyAvailableLanguageKeys", "Available languages"),
    ("keyTranslationTable", "Translation table"),
];

/// `messages.json` の 1 項目
#[derive(Debug, Deserialize)]
struct MessageEntry {
    /// `$1`..`$9` のプレースホルダーを含む本文
    message: String,
}

/// キー → 文字列 の対応表
#[derive(Debug, Clone)]
pub struct MessageCatalog {
    /// キーごとの本文
    messages: HashMap<String, String>,
}

impl Default for MessageCatalog {
    fn default() -> Self {
        Self::english()
    }
}

impl MessageCatalog {
    /// 組み込みの英語カタログ
    #[must_use]
    pub fn english() -> Self {
        let messages = ENGLISH.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        Self { messages }
    }

    /// `messages.json` の内容を解析する
    ///
    /// # Errors
    /// `{"message": ...}` のマップになっていない
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let entries: HashMap<String, MessageEntry> = serde_json::from_str(text)?;
        Ok(Self { messages: entries.into_iter().map(|(k, v)| (k, v.message)).collect() })
    }

    /// 英語カタログに `<locales_dir>/<locale>/messages.json` を重ねる
    ///
    /// ファイルがなければ英語のまま。
    ///
    /// # Errors
    /// - ファイルはあるが読み込めない
    /// - `messages.json` として不正
    pub fn load(locales_dir: &Path, locale: &str) -> Result<Self, ConfigError> {
        let path = locales_dir.join(locale).join("messages.json");
        let mut catalog = Self::english();

        if !path.exists() {
            tracing::debug!("Locale file not found: {:?}", path);
            return Ok(catalog);
        }

        tracing::debug!("Loading messages from: {:?}", path);
        let content = std::fs::read_to_string(&path)?;
        catalog.messages.extend(Self::from_json(&content)?.messages);
        Ok(catalog)
    }

    /// `key` の本文。未知のキーならキー自身。
    #[must_use]
    pub fn get(&self, key: &str) -> String {
        self.get_with(key, &[])
    }

    /// `$n` を `substitutions[n - 1]` で置き換えた `key` の本文
    ///
    /// 置き換える値がないプレースホルダーは空になる。
    #[must_use]
    pub fn get_with(&self, key: &str, substitutions: &[&str]) -> String {
        let Some(message) = self.messages.get(key) else {
            tracing::warn!(key, "Missing message");
            return key.to_string();
        };

        let mut out = String::with_capacity(message.len());
        let mut chars = message.chars().peekable();
        while let Some(c) = chars.next() {
            let index = match (c, chars.peek().and_then(|d| d.to_digit(10))) {
                ('$', Some(digit)) if digit > 0 => digit,
                _ => {
                    out.push(c);
                    continue;
                }
            };
            chars.next();
            let slot = usize::try_from(index - 1).unwrap_or(usize::MAX);
            out.push_str(substitutions.get(slot).copied().unwrap_or_default());
        }
        out
    }
}
