//! coyo-inspector
//!
//! COYO ページの設定・ユーザー・ローカライズデータを表示するブラウザ拡張機能の実装

pub mod app;
pub mod config;
pub mod document;
pub mod extractor;
pub mod format;
pub mod i18n;
pub mod message;
pub mod popup;
pub mod relay;

pub use popup::PopupController;
pub use relay::RelayRegistry;
