//! `.coyo-inspector.json` の読み込みと検証

use std::io::ErrorKind;
use std::path::{
    Path,
    PathBuf,
};

use super::{
    ConfigError,
    ExtensionSettings,
};
use crate::i18n::MessageCatalog;

/// 設定ファイル名
pub const CONFIG_FILE_NAME: &str = ".coyo-inspector.json";

/// 検証済みの設定と、設定ファイルを探したディレクトリ
#[derive(Debug, Clone, Default)]
pub struct ConfigManager {
    /// 検証済みの設定
    settings: ExtensionSettings,
    /// 設定ファイルを探したディレクトリ
    config_dir: Option<PathBuf>,
}

impl ConfigManager {
    /// `config_dir` の設定ファイルを読み込んで検証する
    ///
    /// ディレクトリの指定がない場合やファイルがない場合は既定値を使う。
    /// ファイルにない項目も既定値になる。
    ///
    /// # Errors
    /// - ファイル読み込みエラー（ファイルがない場合を除く）
    /// - JSON パースエラー
    /// - バリデーションエラー
    pub fn load(config_dir: Option<&Path>) -> Result<Self, ConfigError> {
        let settings = match config_dir {
            Some(dir) => read_settings(&dir.join(CONFIG_FILE_NAME))?.unwrap_or_default(),
            None => ExtensionSettings::default(),
        };
        settings.validate().map_err(ConfigError::ValidationErrors)?;
        tracing::debug!(?config_dir, ?settings, "Settings loaded");

        Ok(Self { settings, config_dir: config_dir.map(Path::to_path_buf) })
    }

    /// 検証済みの設定
    #[must_use]
    pub const fn settings(&self) -> &ExtensionSettings {
        &self.settings
    }

    /// 設定ファイルを探したディレクトリ
    #[must_use]
    pub fn config_dir(&self) -> Option<&Path> {
        self.config_dir.as_deref()
    }

    /// ロケールファイルのディレクトリ。相対パスは設定ファイルのディレクトリを基準にする。
    #[must_use]
    pub fn locales_dir(&self) -> PathBuf {
        match &self.config_dir {
            Some(dir) if self.settings.locales_dir.is_relative() => {
                dir.join(&self.settings.locales_dir)
            }
            _ => self.settings.locales_dir.clone(),
        }
    }

    /// 設定されたロケールのメッセージカタログを読み込む。ロケール未設定なら英語。
    ///
    /// # Errors
    /// - ロケールファイルの読み込みエラー
    /// - JSON パースエラー
    pub fn load_messages(&self) -> Result<MessageCatalog, ConfigError> {
        match &self.settings.locale {
            Some(locale) => MessageCatalog::load(&self.locales_dir(), locale),
            None => Ok(MessageCatalog::english()),
        }
    }
}

/// 設定ファイルを読む。ファイルがなければ `None`。
fn read_settings(path: &Path) -> Result<Option<ExtensionSettings>, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(?path, "Configuration file not found");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };
    Ok(Some(serde_json::from_str(&content)?))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::fs;

    use googletest::prelude::*;
    use rstest::*;
    use tempfile::TempDir;

    use super::*;

    #[fixture]
    fn config_dir() -> TempDir {
        TempDir::new().unwrap()
    }

    fn write_config(dir: &TempDir, content: &str) {
        fs::write(dir.path().join(CONFIG_FILE_NAME), content).unwrap();
    }

    /// ディレクトリ未指定なら既定値
    #[rstest]
    #[googletest::test]
    fn defaults_without_config_dir() {
        let manager = ConfigManager::load(None).unwrap();

        expect_that!(manager.settings().filename_prefix, eq("COYO"));
        expect_that!(manager.config_dir(), none());
        expect_that!(manager.locales_dir(), eq(&PathBuf::from("_locales")));
    }

    /// ファイルがなければ既定値
    #[rstest]
    #[googletest::test]
    fn defaults_when_file_is_missing(config_dir: TempDir) {
        let manager = ConfigManager::load(Some(config_dir.path())).unwrap();

        expect_that!(manager.settings().filename_prefix, eq("COYO"));
        expect_that!(manager.config_dir(), some(eq(config_dir.path())));
    }

    /// ファイルの項目だけが既定値を上書きする
    #[rstest]
    #[googletest::test]
    fn file_overrides_only_given_fields(config_dir: TempDir) {
        write_config(&config_dir, r#"{"filenamePrefix": "Intranet", "xls": {"printHeaders": true}}"#);

        let manager = ConfigManager::load(Some(config_dir.path())).unwrap();

        let settings = manager.settings();
        expect_that!(settings.filename_prefix, eq("Intranet"));
        expect_that!(settings.xls.print_headers, eq(true));
        expect_that!(settings.xls.file.suffix, eq(".xls"));
        expect_that!(settings.l10n.sort_keys, eq(true));
    }

    #[rstest]
    #[googletest::test]
    fn invalid_json_is_a_parse_error(config_dir: TempDir) {
        write_config(&config_dir, "invalid json");

        let result = ConfigManager::load(Some(config_dir.path()));

        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    /// 検証に失敗した項目のパスを報告する
    #[rstest]
    #[googletest::test]
    fn invalid_settings_report_field_paths(config_dir: TempDir) {
        write_config(&config_dir, r#"{"json": {"suffix": "json"}, "filenamePrefix": " "}"#);

        let Err(ConfigError::ValidationErrors(errors)) =
            ConfigManager::load(Some(config_dir.path()))
        else {
            panic!("expected validation errors");
        };

        let paths: Vec<&str> = errors.iter().map(|e| e.field_path.as_str()).collect();
        expect_that!(paths, unordered_elements_are![eq(&"filenamePrefix"), eq(&"json.suffix")]);
    }

    #[rstest]
    #[case::relative("_locales", true)]
    #[case::absolute("/usr/share/coyo/_locales", false)]
    #[googletest::test]
    fn locales_dir_resolution(config_dir: TempDir, #[case] locales_dir: &str, #[case] joined: bool) {
        write_config(&config_dir, &format!(r#"{{"localesDir": "{locales_dir}"}}"#));

        let manager = ConfigManager::load(Some(config_dir.path())).unwrap();

        let expected =
            if joined { config_dir.path().join(locales_dir) } else { PathBuf::from(locales_dir) };
        expect_that!(manager.locales_dir(), eq(&expected));
    }

    /// ロケールファイルは設定ファイルのディレクトリから探す
    #[rstest]
    #[googletest::test]
    fn messages_come_from_configured_locale(config_dir: TempDir) {
        let locale_dir = config_dir.path().join("_locales").join("de");
        fs::create_dir_all(&locale_dir).unwrap();
        fs::write(
            locale_dir.join("messages.json"),
            r#"{"showConfig": {"message": "Konfiguration anzeigen"}}"#,
        )
        .unwrap();
        write_config(&config_dir, r#"{"locale": "de"}"#);

        let manager = ConfigManager::load(Some(config_dir.path())).unwrap();
        let catalog = manager.load_messages().unwrap();

        expect_that!(catalog.get("showConfig"), eq("Konfiguration anzeigen"));
    }

    #[rstest]
    #[googletest::test]
    fn messages_default_to_english() {
        let catalog = ConfigManager::load(None).unwrap().load_messages().unwrap();

        expect_that!(catalog.get("showConfig"), eq("Show config"));
    }
}
