//! ポップアップ: リレーを注入し、問い合わせを送り、応答を描画する

/// パネルとボタン
mod view;

use std::sync::Arc;

use html_escape::encode_text;
use tokio::sync::mpsc;
pub use view::{
    Button,
    Panel,
    PanelId,
    PopupView,
};

use crate::config::ExtensionSettings;
use crate::document::{
    Document,
    DocumentKind,
};
use crate::format::render_document;
use crate::i18n::MessageCatalog;
use crate::message::{
    ExtensionRequest,
    ExtensionResponse,
};
use crate::relay::{
    self,
    NotificationChannel,
    Page,
    RelayHandle,
    RelayRegistry,
};

/// ブラウザウィンドウ 1 つ分のポップアップ
#[derive(Debug)]
pub struct PopupController {
    /// 表示・エクスポート設定
    settings: ExtensionSettings,
    /// UI 文字列
    messages: MessageCatalog,
    /// 現在の表示状態
    view: PopupView,
    /// アクティブタブのリレー（注入に成功した後に設定）
    relay: Option<RelayHandle>,
    /// リレーに渡す通知の送信側
    notifier: NotificationChannel,
    /// リレーから届いた通知
    notifications: mpsc::UnboundedReceiver<ExtensionResponse>,
}

impl PopupController {
    /// ローカライズ済みのボタンとパネルでポップアップを作成
    #[must_use]
    pub fn new(settings: ExtensionSettings, messages: MessageCatalog) -> Self {
        let (notifier, notifications) = mpsc::unbounded_channel();
        let buttons = [
            (DocumentKind::Config, "showConfig"),
            (DocumentKind::User, "showUser"),
            (DocumentKind::L10n, "showL10n"),
        ]
        .into_iter()
        .map(|(kind, key)| Button { kind, label: messages.get(key) })
        .collect();
        let mut view = PopupView { buttons, ..PopupView::default() };
        view.popup_content.html = format!("<p>{}</p>", encode_text(&messages.get("popupContent")));
        view.error_content.html = format!("<p>{}</p>", encode_text(&messages.get("errorContent")));

        Self { settings, messages, view, relay: None, notifier, notifications }
    }

    /// 現在の表示状態
    #[must_use]
    pub const fn view(&self) -> &PopupView {
        &self.view
    }

    /// リレーが注入済みでボタンが有効か
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.relay.is_some()
    }

    /// アクティブタブにリレーを注入する
    ///
    /// タブに既にリレーがあれば再利用し、通知の宛先をこのポップアップに移す。
    /// 失敗した場合はエラーパネルを表示し、ボタンは無効のまま。
    pub fn open(&mut self, page: &Arc<dyn Page>, registry: &RelayRegistry) -> bool {
        match relay::attach(
            page,
            registry,
            &self.settings.extractor_script,
            Some(self.notifier.clone()),
        ) {
            Ok(handle) => {
                self.relay = Some(handle);
                true
            }
            Err(e) => {
                self.on_error(&format!("Failed to execute content script: {e}"));
                false
            }
        }
    }

    /// リレーに `kind` を問い合わせ、応答を描画する
    ///
    /// 応答より前に届いた通知を先に描画するため、古い通知が新しい応答を
    /// 上書きすることはない。往復に失敗した場合はログに残すだけ。
    pub async fn request(&mut self, kind: DocumentKind) -> &PopupView {
        let Some(relay) = &self.relay else {
            tracing::warn!(%kind, "Popup is not connected to a page");
            return &self.view;
        };

        match relay.request(ExtensionRequest::for_kind(kind)).await {
            Ok(response) => {
                self.drain_notifications();
                self.render(response);
            }
            Err(e) => tracing::error!("An error occurred: {e}"),
        }
        &self.view
    }

    /// 前回の呼び出し以降にリレーが送った通知をすべて描画し、その件数を返す
    pub fn drain_notifications(&mut self) -> usize {
        let mut count = 0;
        while let Ok(notification) = self.notifications.try_recv() {
            self.render(notification);
            count += 1;
        }
        count
    }

    /// リレーの応答 1 件を表示に反映する
    pub fn render(&mut self, response: ExtensionResponse) {
        match response {
            ExtensionResponse::ConfigData { data } => self.show_document(DocumentKind::Config, &data),
            ExtensionResponse::UserData { data } => self.show_document(DocumentKind::User, &data),
            ExtensionResponse::L10nData { data } => self.show_document(DocumentKind::L10n, &data),
            ExtensionResponse::LoggedOut => {
                let title = self.messages.get("headerDataUser");
                let content = format!("<p>{}</p>", encode_text(&self.messages.get("errorNotLoggedIn")));
                self.fill_and_show_content(&title, content);
                self.view.downloads.clear();
            }
            ExtensionResponse::Pending { document } => {
                tracing::debug!(%document, "Document not retrieved yet");
                let title = self.messages.get("headerDataPending");
                let content = format!("<p>{}</p>", encode_text(&self.messages.get("errorPending")));
                self.fill_and_show_content(&title, content);
                self.view.downloads.clear();
            }
            ExtensionResponse::Error(status) => self.on_error(&status.description),
        }
    }

    /// 文書をデータパネルに描画する
    fn show_document(&mut self, kind: DocumentKind, data: &Document) {
        let display_name = data.get("displayName").and_then(|name| name.as_str()).unwrap_or_default();
        let title = match kind {
            DocumentKind::Config => self.messages.get_with("headerDataConfig", &[display_name]),
            DocumentKind::User => self.messages.get_with("headerDataUserName", &[display_name]),
            DocumentKind::L10n => self.messages.get("headerDataL10n"),
        };

        let rendered =
            render_document(data, self.settings.options_for(kind), &self.messages, &self.settings);
        self.fill_and_show_content(&title, rendered.html);
        self.view.downloads = rendered.downloads;
    }

    /// データパネルを埋め、それだけを表示する
    fn fill_and_show_content(&mut self, title: &str, content: String) {
        self.view.data_content.html = format!("<h2>{}</h2>{content}", encode_text(title));

        self.view.hide(PanelId::ErrorContent);
        self.view.hide(PanelId::PopupContent);
        self.view.show(PanelId::DataContent);
    }

    /// 内容をすべて隠し、`description` 付きのエラーパネルを表示する
    fn on_error(&mut self, description: &str) {
        tracing::error!("{description}");
        self.view.error_content.html = format!(
            "<p>{}</p><p>{}</p>",
            encode_text(&self.messages.get("errorContent")),
            encode_text(description)
        );
        self.view.downloads.clear();

        self.view.hide(PanelId::DataContent);
        self.view.hide(PanelId::PopupContent);
        self.view.show(PanelId::ErrorContent);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use googletest::matchers::is_empty as empty;
    use rstest::*;
    use serde_json::json;

    use super::*;
    use crate::document::{
        ErrorKind,
        ErrorStatus,
    };
    use crate::extractor::{
        HostPage,
        StaticHost,
    };
    use crate::relay::ContextId;

    #[fixture]
    fn popup() -> PopupController {
        PopupController::new(ExtensionSettings::default(), MessageCatalog::english())
    }

    #[rstest]
    #[googletest::test]
    fn new_popup_is_localized_and_idle(popup: PopupController) {
        let view = popup.view();

        expect_that!(popup.is_connected(), eq(false));
        expect_that!(view.visible_panel(), some(eq(PanelId::PopupContent)));
        let labels: Vec<String> = view.buttons.iter().map(|b| b.label.clone()).collect();
        expect_that!(labels, eq(&vec!["Show config", "Show user", "Show localization"]));
    }

    #[rstest]
    #[googletest::test]
    fn user_document_header_uses_display_name(mut popup: PopupController) {
        popup.render(ExtensionResponse::UserData { data: json!({"displayName": "Ann Example"}) });

        let view = popup.view();
        expect_that!(view.visible_panel(), some(eq(PanelId::DataContent)));
        expect_that!(view.data_content.html, starts_with("<h2>User: Ann Example</h2><h3>displayName</h3>"));
    }

    #[rstest]
    #[googletest::test]
    fn l10n_document_produces_downloads(mut popup: PopupController) {
        popup.render(ExtensionResponse::L10nData {
            data: json!({
                "availableLanguageKeys": ["en"],
                "translationTable": {"B": "b", "A": "a"}
            }),
        });

        let view = popup.view();
        expect_that!(view.data_content.html, starts_with("<h2>Localization</h2>"));
        expect_that!(view.downloads, len(eq(2)));
        // l10n のキーは既定で辞書順
        expect_that!(view.data_content.html, contains_substring("\"A\": \"a\",\n    \"B\": \"b\""));
    }

    #[rstest]
    #[googletest::test]
    fn logged_out_shows_notice(mut popup: PopupController) {
        popup.render(ExtensionResponse::LoggedOut);

        let view = popup.view();
        expect_that!(view.visible_panel(), some(eq(PanelId::DataContent)));
        expect_that!(
            view.data_content.html,
            eq("<h2>User</h2><p>No user is currently logged in.</p>")
        );
    }

    #[rstest]
    #[googletest::test]
    fn pending_shows_notice(mut popup: PopupController) {
        popup.render(ExtensionResponse::Pending { document: DocumentKind::Config });

        expect_that!(popup.view().data_content.html, starts_with("<h2>Not available yet</h2>"));
    }

    #[rstest]
    #[googletest::test]
    fn error_hides_content_and_shows_description(mut popup: PopupController) {
        popup.render(ExtensionResponse::L10nData { data: json!({"translationTable": {"A": "a"}}) });
        popup.render(ExtensionResponse::Error(ErrorStatus::raised(
            ErrorKind::HostMismatch,
            "This extension only works on COYO websites.",
        )));

        let view = popup.view();
        expect_that!(view.visible_panel(), some(eq(PanelId::ErrorContent)));
        expect_that!(
            view.error_content.html,
            contains_substring("<p>This extension only works on COYO websites.</p>")
        );
        expect_that!(view.downloads, empty());
    }

    /// 応答より前に届いたエラー通知が応答を隠さない
    #[googletest::test]
    #[tokio::test]
    async fn queued_error_does_not_cover_later_answer() {
        let page: Arc<dyn Page> = Arc::new(HostPage::new(
            ContextId::new("tab-1"),
            Arc::new(StaticHost::new(
                serde_json::from_value(json!({
                    "backendUrl": "https://coyo.example",
                    "auth": {"authenticated": false},
                    "translate": {"availableLanguageKeys": ["en"], "translationTable": {"A": "a"}}
                }))
                .unwrap(),
            )),
            ExtensionSettings::default().extractor_script,
        ));
        let registry = RelayRegistry::new();
        let mut popup =
            PopupController::new(ExtensionSettings::default(), MessageCatalog::english());
        assert_that!(popup.open(&page, &registry), eq(true));

        let view = popup.request(DocumentKind::L10n).await;

        expect_that!(view.visible_panel(), some(eq(PanelId::DataContent)));
        expect_that!(view.data_content.html, starts_with("<h2>Localization</h2>"));
        expect_that!(view.error_content.html, contains_substring("The COYO config is not defined."));
        expect_that!(view.downloads, len(eq(2)));
        expect_that!(popup.drain_notifications(), eq(0));
    }

    #[googletest::test]
    #[tokio::test]
    async fn request_without_relay_changes_nothing() {
        let mut popup =
            PopupController::new(ExtensionSettings::default(), MessageCatalog::english());
        let before = popup.view().clone();

        let after = popup.request(DocumentKind::Config).await.clone();

        assert_that!(after, eq(&before));
    }
}
