//! リレーを独立したタスクとして起動し、ページチャネルと拡張機能チャネルに接続する

use std::sync::Arc;

use tokio::sync::{
    mpsc,
    oneshot,
};

use super::registry::{
    ContextId,
    RelayRegistry,
};
use super::state::Relay;
use super::RelayError;
use crate::message::{
    ExtensionRequest,
    ExtensionResponse,
    PageEnvelope,
};

/// ページ内チャネルの送信側（注入したスクリプトに渡す）
pub type PageChannel = mpsc::UnboundedSender<PageEnvelope>;

/// リレー → ポップアップ の通知チャネルの送信側
pub type NotificationChannel = mpsc::UnboundedSender<ExtensionResponse>;

/// 拡張機能チャネル経由でリレーに届く指示
#[derive(Debug)]
enum Command {
    /// 問い合わせと応答の送り先
    Query(ExtensionRequest, oneshot::Sender<ExtensionResponse>),
    /// 以降の通知を受け取るポップアップ
    Subscribe(NotificationChannel),
}

/// リレーを接続できるページ
pub trait Page: Send + Sync {
    /// ページコンテキストの識別子
    fn context_id(&self) -> ContextId;

    /// `path` のスクリプトをページ自身のコンテキストに読み込む
    ///
    /// スクリプトは `channel` で結果を返す。
    fn inject_script(&self, path: &str, channel: PageChannel) -> Result<(), RelayError>;
}

/// 起動中のリレーの拡張機能チャネル端点
#[derive(Debug, Clone)]
pub struct RelayHandle {
    /// 接続先のページコンテキスト
    context: ContextId,
    /// リレータスクの指示キュー
    commands: mpsc::UnboundedSender<Command>,
}

impl RelayHandle {
    /// 接続先のページコンテキスト
    #[must_use]
    pub const fn context(&self) -> &ContextId {
        &self.context
    }

    /// `request` を送信し、応答を待つ
    ///
    /// # Errors
    /// リレータスクが停止している
    pub async fn request(
        &self,
        request: ExtensionRequest,
    ) -> Result<ExtensionResponse, RelayError> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Query(request, reply))?;
        response.await.map_err(|_| RelayError::Disconnected(self.context.clone()))
    }

    /// 以降の通知の送り先を `channel` に切り替える
    ///
    /// # Errors
    /// リレータスクが停止している
    pub fn subscribe(&self, channel: NotificationChannel) -> Result<(), RelayError> {
        self.send(Command::Subscribe(channel))
    }

    /// 指示をキューに積む
    fn send(&self, command: Command) -> Result<(), RelayError> {
        self.commands.send(command).map_err(|_| RelayError::Disconnected(self.context.clone()))
    }

    /// リレーが既に存在しない端点
    #[cfg(test)]
    pub(crate) fn disconnected(context: ContextId) -> Self {
        let (commands, _) = mpsc::unbounded_channel();
        Self { context, commands }
    }
}

/// `page` にリレーを接続する。既に接続済みなら起動中のリレーを返す。
///
/// 初回はリレータスクを起動し、`script` をページに 1 回だけ注入する。2 回目以降は
/// 何も注入せず、`notifications` が指定されていれば通知の送り先だけを差し替える。
/// tokio ランタイム内で呼び出すこと。
///
/// # Errors
/// スクリプトの注入に失敗した（ページは未接続のまま）
pub fn attach(
    page: &Arc<dyn Page>,
    registry: &RelayRegistry,
    script: &str,
    notifications: Option<NotificationChannel>,
) -> Result<RelayHandle, RelayError> {
    let context = page.context_id();
    let (handle, attached) = registry.get_or_attach(&context, || {
        let (page_tx, page_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        page.inject_script(script, page_tx)?;
        tracing::debug!(context = %context, script, "Injected page script");

        tokio::spawn(run(context.clone(), page_rx, command_rx, notifications.clone()));
        Ok(RelayHandle { context: context.clone(), commands: command_tx })
    })?;

    if !attached {
        tracing::debug!(context = %context, "Relay already attached");
        if let Some(channel) = notifications {
            handle.subscribe(channel)?;
        }
    }
    Ok(handle)
}

/// リレーのループ。各メッセージは次のメッセージの前に処理を終える。
///
/// 問い合わせより先に未処理のページメッセージを取り込むため、問い合わせは
/// ページが既に送信したものをすべて反映する。
async fn run(
    context: ContextId,
    mut page: mpsc::UnboundedReceiver<PageEnvelope>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    mut notifications: Option<NotificationChannel>,
) -> Relay {
    let mut relay = Relay::new();

    loop {
        tokio::select! {
            biased;

            Some(envelope) = page.recv() => {
                let Some(notification) = relay.handle_envelope(envelope) else {
                    continue;
                };
                if let Some(channel) = &notifications
                    && channel.send(notification).is_err()
                {
                    tracing::debug!(context = %context, "Popup is gone, dropping notification");
                }
            }
            command = commands.recv() => {
                match command {
                    Some(Command::Query(request, reply)) => {
                        if reply.send(relay.answer(request)).is_err() {
                            tracing::debug!(context = %context, ?request, "Requester is gone");
                        }
                    }
                    Some(Command::Subscribe(channel)) => {
                        tracing::debug!(context = %context, "Popup subscribed");
                        notifications = Some(channel);
                    }
                    None => break,
                }
            }
        }
    }

    tracing::debug!(context = %context, "Relay stopped");
    relay
}
