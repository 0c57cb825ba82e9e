//! ページ抽出スクリプトとポップアップを仲介するコンテンツスクリプト側のリレー
//!
//! リレーはページごとに最新のスナップショットを保持し、ポップアップの問い合わせに
//! 応答する。状態遷移は [`Relay`]、タスクとしての起動は [`attach`] を参照。

/// ページごとの「実行済み」判定を置き換えるコンテキスト登録簿
mod registry;
/// リレータスクと拡張機能チャネルの端点
mod runtime;
/// スナップショットの状態遷移
mod state;

pub use registry::{
    ContextId,
    RelayRegistry,
};
pub use runtime::{
    NotificationChannel,
    Page,
    PageChannel,
    RelayHandle,
    attach,
};
pub use state::{
    Relay,
    RelayState,
};
use thiserror::Error;

/// ポップアップ ↔ リレー間のエラー
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Failed to inject '{path}': {reason}")]
    Injection { path: String, reason: String },

    #[error("No relay is running for context '{0}'")]
    Disconnected(ContextId),
}
