//! 1 回の検査: 設定を読み込み、ホストページでポップアップを開き、表示内容を書き出す

use std::path::{
    Path,
    PathBuf,
};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::config::{
    ConfigError,
    ConfigManager,
};
use crate::document::DocumentKind;
use crate::extractor::{
    HostError,
    HostPage,
    StaticHost,
};
use crate::popup::PopupController;
use crate::relay::{
    ContextId,
    Page,
    RelayRegistry,
};

/// 検査を中断するエラー
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Host(#[from] HostError),

    #[error("Failed to write {path:?}: {source}")]
    Write { path: PathBuf, source: std::io::Error },
}

/// 検査の入力
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// ホストページのスナップショット
    pub host: PathBuf,
    /// `.coyo-inspector.json` を含むディレクトリ
    pub config_dir: Option<PathBuf>,
    /// 出力先ディレクトリ
    pub out_dir: PathBuf,
    /// 問い合わせる文書（この順に）
    pub show: Vec<DocumentKind>,
    /// タブの識別子
    pub tab_id: String,
    /// ユーザー文書を問い合わせる前にユーザー取得を待つ上限
    pub user_timeout: Duration,
}

/// 検査で書き出したファイル
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// 文書ごとのポップアップページ（接続できなかった場合は `popup.html`）
    pub pages: Vec<PathBuf>,
    /// エクスポートしたダウンロード
    pub downloads: Vec<PathBuf>,
}

/// ホストのスナップショットに対してポップアップを動かし、結果を `out_dir` に書き出す
///
/// 設定とローカライズは注入時に揃っている。ユーザー文書だけは問い合わせの前に
/// ユーザー取得を最大 `user_timeout` 待ち、間に合わなければ未取得として表示する。
///
/// # Errors
/// - 設定ファイルまたはロケールファイルが不正
/// - スナップショットを読み込めない
/// - 出力ファイルを書き込めない
pub async fn run(options: &RunOptions) -> Result<RunReport, AppError> {
    let config = ConfigManager::load(options.config_dir.as_deref())?;
    let messages = config.load_messages()?;
    let settings = config.settings().clone();

    let host = StaticHost::load(&options.host)?;
    let page = Arc::new(HostPage::new(
        ContextId::new(options.tab_id.as_str()),
        Arc::new(host),
        settings.extractor_script.as_str(),
    ));
    let tab: Arc<dyn Page> = Arc::clone(&page) as Arc<dyn Page>;
    let registry = RelayRegistry::new();

    write(&options.out_dir, None).await?;
    let mut report = RunReport::default();
    let mut popup = PopupController::new(settings, messages);

    if !popup.open(&tab, &registry) {
        let path = options.out_dir.join("popup.html");
        write(&path, Some(&popup.view().to_html())).await?;
        report.pages.push(path);
        return Ok(report);
    }

    for kind in &options.show {
        if *kind == DocumentKind::User
            && tokio::time::timeout(options.user_timeout, page.user_lookup_finished())
                .await
                .is_err()
        {
            tracing::warn!(timeout = ?options.user_timeout, "User lookup is still running");
        }
        popup.request(*kind).await;

        let view = popup.view();
        let path = options.out_dir.join(format!("{kind}.html"));
        write(&path, Some(&view.to_html())).await?;
        tracing::info!(document = %kind, "Wrote {:?}", path);
        report.pages.push(path);

        for download in &view.downloads {
            let path = options.out_dir.join(&download.filename);
            write(&path, Some(&download.contents)).await?;
            tracing::info!(mimetype = %download.mimetype, "Wrote {:?}", path);
            if !report.downloads.contains(&path) {
                report.downloads.push(path);
            }
        }
    }

    Ok(report)
}

/// `contents` を `path` に書き込む。`None` ならディレクトリ `path` を作成する。
async fn write(path: &Path, contents: Option<&str>) -> Result<(), AppError> {
    let result = match contents {
        Some(contents) => tokio::fs::write(path, contents).await,
        None => tokio::fs::create_dir_all(path).await,
    };
    result.map_err(|source| AppError::Write { path: path.to_path_buf(), source })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::fs;

    use googletest::prelude::*;
    use googletest::matchers::is_empty as empty;
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    fn options(temp_dir: &TempDir, host: &serde_json::Value, show: Vec<DocumentKind>) -> RunOptions {
        let host_path = temp_dir.path().join("host.json");
        fs::write(&host_path, host.to_string()).unwrap();
        RunOptions {
            host: host_path,
            config_dir: None,
            out_dir: temp_dir.path().join("out"),
            show,
            tab_id: "tab-1".to_string(),
            user_timeout: Duration::from_secs(5),
        }
    }

    #[googletest::test]
    #[tokio::test]
    async fn writes_one_page_per_requested_document() {
        let temp_dir = TempDir::new().unwrap();
        let host = json!({
            "backendUrl": "https://coyo.example",
            "config": {"backendUrl": "https://coyo.example"},
            "auth": {"authenticated": false},
            "translate": {"availableLanguageKeys": ["en"], "translationTable": {"A": "a"}}
        });
        let options = options(&temp_dir, &host, vec![DocumentKind::Config, DocumentKind::L10n]);

        let report = run(&options).await.unwrap();

        expect_that!(report.pages, len(eq(2)));
        expect_that!(report.downloads, len(eq(2)));
        let l10n = fs::read_to_string(options.out_dir.join("l10n.html")).unwrap();
        expect_that!(l10n, contains_substring("<h2>Localization</h2>"));
        assert!(options.out_dir.join("COYO Translation table.xls").exists());
    }

    #[googletest::test]
    #[tokio::test]
    async fn foreign_page_shows_error() {
        let temp_dir = TempDir::new().unwrap();
        let host = json!({"angular": false});
        let options = options(&temp_dir, &host, vec![DocumentKind::User]);

        let report = run(&options).await.unwrap();

        let user = fs::read_to_string(&report.pages[0]).unwrap();
        expect_that!(user, contains_substring("This extension only works on COYO websites."));
        expect_that!(report.downloads, empty());
    }

    /// 設定がないページでも、その後に届いたローカライズが表示される
    #[googletest::test]
    #[tokio::test]
    async fn earlier_error_does_not_hide_later_document() {
        let temp_dir = TempDir::new().unwrap();
        let host = json!({
            "backendUrl": "https://coyo.example",
            "auth": {"authenticated": false},
            "translate": {"availableLanguageKeys": ["en"], "translationTable": {"A": "a"}}
        });
        let options = options(&temp_dir, &host, vec![DocumentKind::L10n]);

        let report = run(&options).await.unwrap();

        let l10n = fs::read_to_string(&report.pages[0]).unwrap();
        expect_that!(l10n, contains_substring("<div id=\"data-content\"><h2>Localization</h2>"));
        expect_that!(
            l10n,
            contains_substring("<div id=\"error-content\" class=\"hidden\">")
        );
        expect_that!(report.downloads, len(eq(2)));
    }

    /// 遅いユーザー取得は設定の表示を待たせない
    #[googletest::test]
    #[tokio::test]
    async fn slow_user_lookup_does_not_delay_config() {
        let temp_dir = TempDir::new().unwrap();
        let host = json!({
            "backendUrl": "https://coyo.example",
            "config": {"displayName": "Example"},
            "auth": {"authenticated": true, "user": {"displayName": "Ann"}, "delayMs": 60000}
        });
        let options = options(&temp_dir, &host, vec![DocumentKind::Config]);

        let report = tokio::time::timeout(Duration::from_secs(2), run(&options)).await;

        let report = report.unwrap().unwrap();
        let config = fs::read_to_string(&report.pages[0]).unwrap();
        expect_that!(config, contains_substring("<div id=\"data-content\"><h2>Configuration</h2>"));
    }

    /// ユーザー取得が待ち時間内に終わらなければ未取得として表示する
    #[googletest::test]
    #[tokio::test]
    async fn user_lookup_past_timeout_shows_pending() {
        let temp_dir = TempDir::new().unwrap();
        let host = json!({
            "backendUrl": "https://coyo.example",
            "config": {},
            "auth": {"authenticated": true, "user": {"displayName": "Ann"}, "delayMs": 60000}
        });
        let options = RunOptions {
            user_timeout: Duration::from_millis(50),
            ..options(&temp_dir, &host, vec![DocumentKind::User])
        };

        let report = run(&options).await.unwrap();

        let user = fs::read_to_string(&report.pages[0]).unwrap();
        expect_that!(user, contains_substring("<h2>Not available yet</h2>"));
    }

    #[googletest::test]
    #[tokio::test]
    async fn missing_snapshot_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let options = RunOptions {
            host: temp_dir.path().join("missing.json"),
            config_dir: None,
            out_dir: temp_dir.path().join("out"),
            show: vec![DocumentKind::Config],
            tab_id: "tab-1".to_string(),
            user_timeout: Duration::from_secs(5),
        };

        let result = run(&options).await;

        assert!(matches!(result, Err(AppError::Host(HostError::Io(_)))));
    }
}
