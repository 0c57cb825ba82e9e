//! ホストページから取得する文書と、それを保持するリレーのスナップショット

use std::fmt;

use serde::{
    Deserialize,
    Serialize,
};
use serde_json::Value;

/// スキーマを持たず、そのまま受け渡す文書
pub type Document = Value;

/// ローカライズ文書のトップレベルキー（言語コード一覧）
pub const AVAILABLE_LANGUAGE_KEYS: &str = "availableLanguageKeys";

/// ローカライズ文書のトップレベルキー（翻訳テーブル）
pub const TRANSLATION_TABLE: &str = "translationTable";

/// ページ抽出で取得できる 3 種類の文書
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Config,
    User,
    L10n,
}

impl DocumentKind {
    /// 表示順の全種別
    pub const ALL: [Self; 3] = [Self::Config, Self::User, Self::L10n];

    /// メッセージ上の名前（コマンドラインでも使う）
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::User => "user",
            Self::L10n => "l10n",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ページ抽出が報告するエラーの分類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// COYO ではないページで実行された
    HostMismatch,
    /// ホストのサービスが登録されていない
    ServiceMissing,
}

impl ErrorKind {
    /// `error` ページメッセージの `data` に載せる名前
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HostMismatch => "hostmismatch",
            Self::ServiceMissing => "servicemissing",
        }
    }

    /// 名前を解析する（未知の名前は `None`）
    #[must_use]
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "hostmismatch" => Some(Self::HostMismatch),
            "servicemissing" => Some(Self::ServiceMissing),
            _ => None,
        }
    }
}

/// リレーが持つ唯一のエラー状態
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorStatus {
    pub occurred: bool,
    pub kind: Option<ErrorKind>,
    pub description: String,
}

impl ErrorStatus {
    /// 有効なエラー
    #[must_use]
    pub fn raised(kind: ErrorKind, description: impl Into<String>) -> Self {
        Self { occurred: true, kind: Some(kind), description: description.into() }
    }

    /// 解除済みの状態
    #[must_use]
    pub fn cleared() -> Self {
        Self::default()
    }
}

/// 全文書の最新状態
///
/// 各フィールドは独立に上書きされる（後勝ち）。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub config: Option<Document>,
    pub user: Option<Document>,
    pub l10n: Option<Document>,
    /// ホストが未ログインを通知したら立つ
    pub user_auth_absent: bool,
    pub error: ErrorStatus,
}

impl Snapshot {
    /// `kind` の保存済み文書
    #[must_use]
    pub const fn get(&self, kind: DocumentKind) -> Option<&Document> {
        match kind {
            DocumentKind::Config => self.config.as_ref(),
            DocumentKind::User => self.user.as_ref(),
            DocumentKind::L10n => self.l10n.as_ref(),
        }
    }

    /// `kind` の文書を置き換える
    pub fn store(&mut self, kind: DocumentKind, document: Document) {
        let slot = match kind {
            DocumentKind::Config => &mut self.config,
            DocumentKind::User => &mut self.user,
            DocumentKind::L10n => &mut self.l10n,
        };
        *slot = Some(document);
    }

    /// 文書が 1 つも届いていない間 `true`
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.config.is_none() && self.user.is_none() && self.l10n.is_none()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case::config(DocumentKind::Config, "config")]
    #[case::user(DocumentKind::User, "user")]
    #[case::l10n(DocumentKind::L10n, "l10n")]
    #[googletest::test]
    fn document_kind_wire_name(#[case] kind: DocumentKind, #[case] expected: &str) {
        assert_that!(kind.as_str(), eq(expected));
        assert_that!(serde_json::to_value(kind).unwrap(), eq(&json!(expected)));
    }

    #[rstest]
    #[googletest::test]
    fn error_kind_from_wire_rejects_unknown() {
        expect_that!(ErrorKind::from_wire("hostmismatch"), some(eq(ErrorKind::HostMismatch)));
        expect_that!(ErrorKind::from_wire("servicemissing"), some(eq(ErrorKind::ServiceMissing)));
        expect_that!(ErrorKind::from_wire("error"), none());
    }

    #[rstest]
    #[googletest::test]
    fn snapshot_store_overwrites_single_slot() {
        let mut snapshot = Snapshot::default();
        assert_that!(snapshot.is_empty(), eq(true));

        snapshot.store(DocumentKind::L10n, json!({"a": 1}));
        snapshot.store(DocumentKind::L10n, json!({"a": 2}));

        expect_that!(snapshot.get(DocumentKind::L10n), some(eq(&json!({"a": 2}))));
        expect_that!(snapshot.get(DocumentKind::Config), none());
        expect_that!(snapshot.is_empty(), eq(false));
    }

    #[rstest]
    #[googletest::test]
    fn error_status_serializes_camel_case() {
        let status = ErrorStatus::raised(ErrorKind::ServiceMissing, "gone");

        assert_that!(
            serde_json::to_value(&status).unwrap(),
            eq(&json!({"occurred": true, "kind": "servicemissing", "description": "gone"}))
        );
    }
}
