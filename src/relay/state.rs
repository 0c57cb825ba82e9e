//! リレーの状態遷移

use crate::document::{
    Document,
    DocumentKind,
    ErrorStatus,
    Snapshot,
};
use crate::message::{
    ExtensionRequest,
    ExtensionResponse,
    PageEnvelope,
    PageMessage,
};

/// 文書の受信状態（エラーは別に管理する）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    /// まだ何も受信していない
    Idle,
    /// 文書を 1 つ以上受信した
    Populated,
}

/// 1 ページ分の最新スナップショットを保持し、ポップアップの問い合わせに応答する
#[derive(Debug, Default)]
pub struct Relay {
    /// 最新の文書とエラー状態
    snapshot: Snapshot,
}

impl Relay {
    /// 空のリレーを作成
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// 現在のスナップショット
    #[must_use]
    pub const fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// 文書の受信状態
    #[must_use]
    pub const fn state(&self) -> RelayState {
        if self.snapshot.is_empty() { RelayState::Idle } else { RelayState::Populated }
    }

    /// 最新のエラー状態が有効な間 `true`
    #[must_use]
    pub const fn errored(&self) -> bool {
        self.snapshot.error.occurred
    }

    /// 生のページメッセージをデコードして反映する
    ///
    /// 不正なメッセージはログに出して破棄する。
    pub fn handle_envelope(&mut self, envelope: PageEnvelope) -> Option<ExtensionResponse> {
        match PageMessage::try_from(envelope) {
            Ok(message) => self.handle_page_message(message),
            Err(e) => {
                tracing::warn!("Ignoring page message: {e}");
                None
            }
        }
    }

    /// ページメッセージをスナップショットに反映する
    ///
    /// ポップアップに通知すべきメッセージなら、その通知を返す。
    pub fn handle_page_message(&mut self, message: PageMessage) -> Option<ExtensionResponse> {
        match message {
            PageMessage::ConfigReceived(document) => {
                tracing::debug!("Received config data");
                self.receive(DocumentKind::Config, document);
                None
            }
            PageMessage::UserReceived(document) => {
                tracing::debug!("Received user data");
                self.snapshot.user_auth_absent = false;
                self.receive(DocumentKind::User, document);
                None
            }
            PageMessage::L10nReceived(document) => {
                tracing::debug!("Received l10n data");
                self.receive(DocumentKind::L10n, document);
                None
            }
            PageMessage::UserAuthAbsent { description } => {
                tracing::info!(%description, "Received a user error");
                self.snapshot.user_auth_absent = true;
                None
            }
            PageMessage::ExtractionError { kind, description } => {
                tracing::warn!(?kind, %description, "Received an error");
                self.snapshot.error = ErrorStatus::raised(kind, description);
                Some(ExtensionResponse::Error(self.snapshot.error.clone()))
            }
        }
    }

    /// 文書を保存し、エラーを解除する
    fn receive(&mut self, kind: DocumentKind, document: Document) {
        self.snapshot.store(kind, document);
        self.snapshot.error = ErrorStatus::cleared();
    }

    /// ポップアップの問い合わせに応答する
    ///
    /// 有効なエラーはどの文書よりも優先する。ユーザー文書がない場合、ホストが
    /// 未ログインを通知していれば `loggedout`、そうでなければ `pending`。
    #[must_use]
    pub fn answer(&self, request: ExtensionRequest) -> ExtensionResponse {
        tracing::debug!(?request, "Received request");
        if self.errored() {
            return ExtensionResponse::Error(self.snapshot.error.clone());
        }

        let kind = request.kind();
        match self.snapshot.get(kind) {
            Some(document) => ExtensionResponse::data(kind, document.clone()),
            None if kind == DocumentKind::User && self.snapshot.user_auth_absent => {
                ExtensionResponse::LoggedOut
            }
            None => ExtensionResponse::Pending { document: kind },
        }
    }
}
