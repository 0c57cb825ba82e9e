//! ポップアップの DOM 状態（内容パネル、ボタン、ダウンロード）

use html_escape::encode_text;

use crate::document::DocumentKind;
use crate::format::Download;

/// 内容パネルの要素 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelId {
    /// データを表示する前の案内
    PopupContent,
    /// 描画した文書
    DataContent,
    /// エラー表示
    ErrorContent,
}

impl PanelId {
    /// DOM 上の要素 ID
    #[must_use]
    pub const fn element_id(self) -> &'static str {
        match self {
            Self::PopupContent => "popup-content",
            Self::DataContent => "data-content",
            Self::ErrorContent => "error-content",
        }
    }
}

/// 内容パネル
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Panel {
    pub html: String,
    pub hidden: bool,
}

/// 問い合わせボタン
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub kind: DocumentKind,
    pub label: String,
}

impl Button {
    /// 要素 ID（送信する問い合わせの type と同じ）
    #[must_use]
    pub const fn element_id(&self) -> &'static str {
        match self.kind {
            DocumentKind::Config => "showconfig",
            DocumentKind::User => "showuser",
            DocumentKind::L10n => "showl10n",
        }
    }
}

/// ポップアップが表示するもの一式
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupView {
    pub buttons: Vec<Button>,
    pub popup_content: Panel,
    pub data_content: Panel,
    pub error_content: Panel,
    /// `data_content` からリンクされたファイル
    pub downloads: Vec<Download>,
}

impl Default for PopupView {
    fn default() -> Self {
        Self {
            buttons: Vec::new(),
            popup_content: Panel::default(),
            data_content: Panel { html: String::new(), hidden: true },
            error_content: Panel { html: String::new(), hidden: true },
            downloads: Vec::new(),
        }
    }
}

impl PopupView {
    /// パネルを取得
    #[must_use]
    pub const fn panel(&self, id: PanelId) -> &Panel {
        match id {
            PanelId::PopupContent => &self.popup_content,
            PanelId::DataContent => &self.data_content,
            PanelId::ErrorContent => &self.error_content,
        }
    }

    /// パネルを可変で取得
    fn panel_mut(&mut self, id: PanelId) -> &mut Panel {
        match id {
            PanelId::PopupContent => &mut self.popup_content,
            PanelId::DataContent => &mut self.data_content,
            PanelId::ErrorContent => &mut self.error_content,
        }
    }

    pub fn show(&mut self, id: PanelId) {
        self.panel_mut(id).hidden = false;
    }

    pub fn hide(&mut self, id: PanelId) {
        self.panel_mut(id).hidden = true;
    }

    /// 表示中のパネル（ちょうど 1 つの場合のみ）
    #[must_use]
    pub fn visible_panel(&self) -> Option<PanelId> {
        let mut visible = [PanelId::PopupContent, PanelId::DataContent, PanelId::ErrorContent]
            .into_iter()
            .filter(|id| !self.panel(*id).hidden);
        match (visible.next(), visible.next()) {
            (Some(id), None) => Some(id),
            _ => None,
        }
    }

    /// 単体の HTML ページとして書き出す
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut html = String::from(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
             <style>.hidden { display: none; }</style>\n</head>\n<body>\n",
        );
        for button in &self.buttons {
            html.push_str(&format!(
                "<button id=\"{}\">{}</button>\n",
                button.element_id(),
                encode_text(&button.label)
            ));
        }
        for id in [PanelId::PopupContent, PanelId::DataContent, PanelId::ErrorContent] {
            let panel = self.panel(id);
            let class = if panel.hidden { " class=\"hidden\"" } else { "" };
            html.push_str(&format!(
                "<div id=\"{}\"{class}>{}</div>\n",
                id.element_id(),
                panel.html
            ));
        }
        html.push_str("</body>\n</html>\n");
        html
    }
}
