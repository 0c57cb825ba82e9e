//! ページ抽出: ホストページから 3 種類の文書を読み出す
//!
//! スクリプト注入 1 回につき 1 回実行する。結果はすべてページメッセージとして
//! 送り、ページ ↔ リレー の境界を越えてエラーを投げることはない。

/// ホストフレームワークのインターフェース
mod host;
/// JSON スナップショットによるホスト
mod static_host;

use std::sync::{
    Arc,
    Mutex,
    PoisonError,
};

use futures::future::BoxFuture;
pub use host::{
    AuthService,
    HostError,
    HostFramework,
    TranslateService,
};
use serde_json::Map;
pub use static_host::{
    AuthSnapshot,
    HostSnapshot,
    StaticHost,
    TranslateSnapshot,
};
use tokio::task::JoinHandle;

use crate::document::{
    AVAILABLE_LANGUAGE_KEYS,
    Document,
    ErrorKind,
    TRANSLATION_TABLE,
};
use crate::message::{
    PageEnvelope,
    PageMessage,
};
use crate::relay::{
    ContextId,
    Page,
    PageChannel,
    RelayError,
};

/// COYO ではないページで報告する
pub const NOT_A_COYO_PAGE: &str = "This extension only works on COYO websites.";
/// フレームワークの DI が見つからない場合に報告する
pub const FRAMEWORK_MISSING: &str = "Angular is not defined.";
/// 設定サービスがない場合に報告する
pub const CONFIG_MISSING: &str = "The COYO config is not defined.";
/// 認証サービスがない場合に報告する
pub const AUTH_MISSING: &str = "The auth service is not defined.";
/// 翻訳サービスがない場合に報告する
pub const TRANSLATE_MISSING: &str = "The translation service is not defined.";
/// 未ログイン通知の説明
pub const NOT_AUTHENTICATED: &str = "No user is currently authenticated.";

/// リレーにメッセージを送る。リレーが既にいなくてもページ側のエラーにはしない。
fn post(channel: &PageChannel, message: PageMessage) {
    if channel.send(PageEnvelope::from(message)).is_err() {
        tracing::debug!("Relay is gone, dropping page message");
    }
}

/// 抽出エラーを送る
fn post_error(channel: &PageChannel, kind: ErrorKind, description: &str) {
    tracing::error!("{description}");
    post(channel, PageMessage::ExtractionError { kind, description: description.to_string() });
}

/// 翻訳サービスからローカライズ文書を組み立てる
fn l10n_document(translate: &dyn TranslateService) -> Document {
    let mut document = Map::new();
    document.insert(AVAILABLE_LANGUAGE_KEYS.to_string(), translate.available_language_keys());
    document.insert(TRANSLATION_TABLE.to_string(), translate.translation_table());
    Document::Object(document)
}

/// ユーザー取得の完了を待って結果を送る
async fn lookup_user(user: BoxFuture<'static, Result<Document, HostError>>, channel: PageChannel) {
    match user.await {
        Ok(user) => post(&channel, PageMessage::UserReceived(user)),
        // 何も送らない（ユーザーは保留のまま）
        Err(e) => tracing::warn!("{e}"),
    }
}

/// `host` から設定・ユーザー・ローカライズを取得して `channel` に送る
///
/// 設定とローカライズ（およびエラー）は戻る前に送り終える。ユーザー取得は
/// 独立したタスクとして起動し、そのハンドルを返す。他の文書はユーザー取得の
/// 完了を待たない。tokio ランタイム内で呼び出すこと。
pub fn extract(host: &dyn HostFramework, channel: &PageChannel) -> Option<JoinHandle<()>> {
    if host.backend_url().is_none() {
        post_error(channel, ErrorKind::HostMismatch, NOT_A_COYO_PAGE);
        return None;
    }
    if !host.has_injector() {
        post_error(channel, ErrorKind::HostMismatch, FRAMEWORK_MISSING);
        return None;
    }

    match host.config() {
        Some(config) => post(channel, PageMessage::ConfigReceived(config)),
        None => post_error(channel, ErrorKind::ServiceMissing, CONFIG_MISSING),
    }

    let user_lookup = match host.auth() {
        Some(auth) if auth.is_authenticated() => {
            Some(tokio::spawn(lookup_user(auth.user(), channel.clone())))
        }
        Some(_) => {
            post(channel, PageMessage::UserAuthAbsent { description: NOT_AUTHENTICATED.to_string() });
            None
        }
        None => {
            post_error(channel, ErrorKind::ServiceMissing, AUTH_MISSING);
            None
        }
    };

    match host.translate() {
        Some(translate) => post(channel, PageMessage::L10nReceived(l10n_document(&*translate))),
        None => post_error(channel, ErrorKind::ServiceMissing, TRANSLATE_MISSING),
    }

    user_lookup
}

/// ホストページを表示しているブラウザのタブ
///
/// 抽出スクリプトを注入すると [`extract`] を実行する。
pub struct HostPage {
    /// タブの識別子
    context: ContextId,
    /// ページのサービス群
    host: Arc<dyn HostFramework>,
    /// 抽出スクリプトのパス
    extractor_script: String,
    /// 実行中のユーザー取得
    user_lookup: Mutex<Option<JoinHandle<()>>>,
}

impl HostPage {
    /// 新しいタブを作成
    #[must_use]
    pub fn new(
        context: ContextId,
        host: Arc<dyn HostFramework>,
        extractor_script: impl Into<String>,
    ) -> Self {
        Self {
            context,
            host,
            extractor_script: extractor_script.into(),
            user_lookup: Mutex::new(None),
        }
    }

    /// 注入した抽出スクリプトのユーザー取得が終わるまで待つ
    ///
    /// 設定とローカライズは注入の時点で送信済み。ユーザー取得がなければ即座に戻る。
    pub async fn user_lookup_finished(&self) {
        let task = self.user_lookup.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(task) = task
            && let Err(e) = task.await
        {
            tracing::error!("User lookup task failed: {e}");
        }
    }
}

impl std::fmt::Debug for HostPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostPage")
            .field("context", &self.context)
            .field("host", &"<HostFramework>")
            .field("extractor_script", &self.extractor_script)
            .finish_non_exhaustive()
    }
}

impl Page for HostPage {
    fn context_id(&self) -> ContextId {
        self.context.clone()
    }

    fn inject_script(&self, path: &str, channel: PageChannel) -> Result<(), RelayError> {
        if path != self.extractor_script {
            return Err(RelayError::Injection {
                path: path.to_string(),
                reason: "script is not part of the extension".to_string(),
            });
        }

        let user_lookup = extract(&*self.host, &channel);
        *self.user_lookup.lock().unwrap_or_else(PoisonError::into_inner) = user_lookup;
        Ok(())
    }
}
