//! ホストアプリケーションがページ内に持つサービス群のインターフェース

use futures::future::BoxFuture;
use serde_json::Value;
use thiserror::Error;

use crate::document::Document;

/// ホスト実装のエラー
#[derive(Error, Debug)]
pub enum HostError {
    #[error("Failed to read host snapshot: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse host snapshot: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("User lookup failed: {0}")]
    UserLookup(String),
}

/// ホストの認証サービス
pub trait AuthService: Send + Sync {
    /// ログイン済みか
    fn is_authenticated(&self) -> bool;

    /// 現在のユーザーを取得する。他の取得とは独立して完了する。
    fn user(&self) -> BoxFuture<'static, Result<Document, HostError>>;
}

/// ホストの翻訳サービス
pub trait TranslateService: Send + Sync {
    /// 利用できる言語キー
    fn available_language_keys(&self) -> Value;

    /// 現在の言語の翻訳テーブル
    fn translation_table(&self) -> Value;
}

/// ページ内から見たホストアプリケーション
///
/// サービスが登録されていなければ各取得は `None` を返す。
pub trait HostFramework: Send + Sync {
    /// ページのグローバル設定にあるバックエンド URL。COYO 以外のページでは `None`。
    fn backend_url(&self) -> Option<String>;

    /// フレームワークの DI コンテナに到達できるか
    fn has_injector(&self) -> bool;

    /// 設定サービス
    fn config(&self) -> Option<Document>;

    /// 認証サービス
    fn auth(&self) -> Option<Box<dyn AuthService>>;

    /// 翻訳サービス
    fn translate(&self) -> Option<Box<dyn TranslateService>>;
}
