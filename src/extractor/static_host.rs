//! JSON スナップショットファイルからサービスを読み込むホスト
//!
//! スナップショットの形式:
//!
//! ```json
//! {
//!   "backendUrl": "https://coyo.example",
//!   "config": { ... },
//!   "auth": { "authenticated": true, "user": { ... }, "delayMs": 0 },
//!   "translate": { "availableLanguageKeys": ["de"], "translationTable": { ... } }
//! }
//! ```
//!
//! 欠けているサービスは抽出時に未定義として報告される。

use std::path::Path;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde::{
    Deserialize,
    Serialize,
};
use serde_json::Value;

use super::host::{
    AuthService,
    HostError,
    HostFramework,
    TranslateService,
};
use crate::document::Document;

/// ホストページの状態
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HostSnapshot {
    /// バックエンド URL
    pub backend_url: Option<String>,
    /// フレームワークの DI コンテナがあるか
    pub angular: bool,
    /// 設定文書
    pub config: Option<Document>,
    /// 認証サービス
    pub auth: Option<AuthSnapshot>,
    /// 翻訳サービス
    pub translate: Option<TranslateSnapshot>,
}

impl Default for HostSnapshot {
    fn default() -> Self {
        Self { backend_url: None, angular: true, config: None, auth: None, translate: None }
    }
}

/// 認証サービスの状態
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthSnapshot {
    /// ログイン済みか
    pub authenticated: bool,
    /// `None` ならユーザー取得が失敗する
    pub user: Option<Document>,
    /// ユーザー取得にかかる時間（ミリ秒）
    pub delay_ms: u64,
}

/// 翻訳サービスの状態
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TranslateSnapshot {
    /// 利用できる言語キー
    pub available_language_keys: Value,
    /// 翻訳テーブル
    pub translation_table: Value,
}

/// [`HostSnapshot`] による [`HostFramework`]
#[derive(Debug, Clone)]
pub struct StaticHost {
    /// ページの状態
    snapshot: HostSnapshot,
}

impl StaticHost {
    /// スナップショットからホストを作成
    #[must_use]
    pub const fn new(snapshot: HostSnapshot) -> Self {
        Self { snapshot }
    }

    /// スナップショットファイルを読み込む
    ///
    /// # Errors
    /// - ファイルを読み込めない
    /// - スナップショットとして不正
    pub fn load(path: &Path) -> Result<Self, HostError> {
        tracing::debug!("Loading host snapshot from: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Ok(Self::new(serde_json::from_str(&content)?))
    }
}

impl AuthService for AuthSnapshot {
    fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    fn user(&self) -> BoxFuture<'static, Result<Document, HostError>> {
        let user = self.user.clone();
        let delay = Duration::from_millis(self.delay_ms);
        async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            user.ok_or_else(|| HostError::UserLookup("the host returned no user".to_string()))
        }
        .boxed()
    }
}

impl TranslateService for TranslateSnapshot {
    fn available_language_keys(&self) -> Value {
        self.available_language_keys.clone()
    }

    fn translation_table(&self) -> Value {
        self.translation_table.clone()
    }
}

impl HostFramework for StaticHost {
    fn backend_url(&self) -> Option<String> {
        self.snapshot.backend_url.clone()
    }

    fn has_injector(&self) -> bool {
        self.snapshot.angular
    }

    fn config(&self) -> Option<Document> {
        self.snapshot.config.clone()
    }

    fn auth(&self) -> Option<Box<dyn AuthService>> {
        self.snapshot.auth.clone().map(|auth| Box::new(auth) as Box<dyn AuthService>)
    }

    fn translate(&self) -> Option<Box<dyn TranslateService>> {
        self.snapshot
            .translate
            .clone()
            .map(|translate| Box::new(translate) as Box<dyn TranslateService>)
    }
}
