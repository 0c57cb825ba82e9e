//! ページチャネルと拡張機能チャネルのメッセージ型
//!
//! どちらのチャネルも形の緩い JSON を運ぶ。まず生のエンベロープとしてデコードし、
//! それを閉じた列挙型に変換する。未知の `type` は [`MalformedMessage`] になる。

use serde::{
    Deserialize,
    Serialize,
};
use serde_json::Value;
use thiserror::Error;

use crate::document::{
    Document,
    DocumentKind,
    ErrorKind,
    ErrorStatus,
};

/// 取得した設定文書のメッセージ種別
pub const CONFIG_DATA: &str = "configdata";
/// 取得したユーザー文書のメッセージ種別
pub const USER_DATA: &str = "userdata";
/// 取得したローカライズ文書のメッセージ種別
pub const L10N_DATA: &str = "l10ndata";
/// 「未認証」通知のメッセージ種別
pub const USER_ERROR: &str = "usererror";
/// 抽出エラーのメッセージ種別
pub const ERROR: &str = "error";

/// デコードできなかったメッセージ（受信側はログに出して破棄する）
#[derive(Error, Debug)]
pub enum MalformedMessage {
    #[error("Unknown message type: {0}")]
    UnknownType(String),

    #[error("Message '{message_type}' carries no data")]
    MissingData { message_type: &'static str },

    #[error("Message '{message_type}' carries invalid JSON: {source}")]
    InvalidJson {
        message_type: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Request is not an object with a string 'type'")]
    MissingType,
}

/// ページチャネルの生メッセージ `{type, data, description}`
///
/// `data` は構造化された値ではなく JSON テキスト。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEnvelope {
    #[serde(rename = "type")]
    pub message_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// デコード済みのページチャネルメッセージ
#[derive(Debug, Clone, PartialEq)]
pub enum PageMessage {
    ConfigReceived(Document),
    UserReceived(Document),
    L10nReceived(Document),
    UserAuthAbsent { description: String },
    ExtractionError { kind: ErrorKind, description: String },
}

/// `*data` メッセージの JSON テキストを解析する
fn parse_data(
    message_type: &'static str,
    data: Option<String>,
) -> Result<Document, MalformedMessage> {
    let text = data.ok_or(MalformedMessage::MissingData { message_type })?;
    serde_json::from_str(&text).map_err(|source| MalformedMessage::InvalidJson { message_type, source })
}

impl TryFrom<PageEnvelope> for PageMessage {
    type Error = MalformedMessage;

    fn try_from(envelope: PageEnvelope) -> Result<Self, Self::Error> {
        let PageEnvelope { message_type, data, description } = envelope;
        match message_type.as_str() {
            CONFIG_DATA => Ok(Self::ConfigReceived(parse_data(CONFIG_DATA, data)?)),
            USER_DATA => Ok(Self::UserReceived(parse_data(USER_DATA, data)?)),
            L10N_DATA => Ok(Self::L10nReceived(parse_data(L10N_DATA, data)?)),
            USER_ERROR => Ok(Self::UserAuthAbsent { description: description.unwrap_or_default() }),
            ERROR => {
                // 種別が判別できないエラーはサービス欠落として扱う
                let kind = data
                    .as_deref()
                    .and_then(ErrorKind::from_wire)
                    .unwrap_or(ErrorKind::ServiceMissing);
                Ok(Self::ExtractionError { kind, description: description.unwrap_or_default() })
            }
            _ => Err(MalformedMessage::UnknownType(message_type)),
        }
    }
}

impl From<PageMessage> for PageEnvelope {
    fn from(message: PageMessage) -> Self {
        let (message_type, data, description) = match message {
            PageMessage::ConfigReceived(doc) => (CONFIG_DATA, Some(doc.to_string()), None),
            PageMessage::UserReceived(doc) => (USER_DATA, Some(doc.to_string()), None),
            PageMessage::L10nReceived(doc) => (L10N_DATA, Some(doc.to_string()), None),
            PageMessage::UserAuthAbsent { description } => {
                (USER_ERROR, Some(String::new()), Some(description))
            }
            PageMessage::ExtractionError { kind, description } => {
                (ERROR, Some(kind.as_str().to_string()), Some(description))
            }
        };
        Self { message_type: message_type.to_string(), data, description }
    }
}

/// ポップアップ → リレー の問い合わせ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ExtensionRequest {
    ShowConfig,
    ShowUser,
    ShowL10n,
}

impl ExtensionRequest {
    /// 指定した文書の問い合わせ
    #[must_use]
    pub const fn for_kind(kind: DocumentKind) -> Self {
        match kind {
            DocumentKind::Config => Self::ShowConfig,
            DocumentKind::User => Self::ShowUser,
            DocumentKind::L10n => Self::ShowL10n,
        }
    }

    /// 問い合わせ対象の文書
    #[must_use]
    pub const fn kind(self) -> DocumentKind {
        match self {
            Self::ShowConfig => DocumentKind::Config,
            Self::ShowUser => DocumentKind::User,
            Self::ShowL10n => DocumentKind::L10n,
        }
    }
}

impl TryFrom<&Value> for ExtensionRequest {
    type Error = MalformedMessage;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        let message_type =
            value.get("type").and_then(Value::as_str).ok_or(MalformedMessage::MissingType)?;
        match message_type {
            "showconfig" => Ok(Self::ShowConfig),
            "showuser" => Ok(Self::ShowUser),
            "showl10n" => Ok(Self::ShowL10n),
            other => Err(MalformedMessage::UnknownType(other.to_string())),
        }
    }
}

/// リレー → ポップアップ の応答（エラーの通知にも使う）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ExtensionResponse {
    ConfigData { data: Document },
    UserData { data: Document },
    L10nData { data: Document },
    LoggedOut,
    /// 文書をまだ取得していない
    Pending { document: DocumentKind },
    Error(ErrorStatus),
}

impl ExtensionResponse {
    /// 指定した種別の文書を包む
    #[must_use]
    pub const fn data(kind: DocumentKind, data: Document) -> Self {
        match kind {
            DocumentKind::Config => Self::ConfigData { data },
            DocumentKind::User => Self::UserData { data },
            DocumentKind::L10n => Self::L10nData { data },
        }
    }

    /// エラー応答なら `true`
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}
