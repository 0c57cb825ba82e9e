//! コマンドラインのエントリーポイント: COYO ホストページのスナップショットを検査する

use std::path::{
    Path,
    PathBuf,
};
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use coyo_inspector::app::{
    self,
    RunOptions,
};
use coyo_inspector::document::DocumentKind;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{
    EnvFilter,
    fmt,
};

/// COYO ページの設定・ユーザー・ローカライズを表示する
#[derive(Parser, Debug)]
#[command(name = "coyo-inspector")]
#[command(version)]
struct Cli {
    /// ホストページのスナップショット（JSON）
    #[arg(long)]
    host: PathBuf,

    /// 表示する文書（複数指定可、省略時はすべて）
    #[arg(long, value_parser = parse_kind)]
    show: Vec<DocumentKind>,

    /// ポップアップページとダウンロードの出力先
    #[arg(long, default_value = "coyo-output")]
    out: PathBuf,

    /// `.coyo-inspector.json` を含むディレクトリ
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// ログをこのファイルにも書き出す
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// 検査するタブの識別子
    #[arg(long, default_value = "1")]
    tab_id: String,

    /// ユーザー文書を問い合わせる前にユーザー取得を待つ時間（ミリ秒）
    #[arg(long, default_value_t = 5000)]
    user_timeout_ms: u64,
}

/// 文書の種類を名前から解析する
fn parse_kind(name: &str) -> Result<DocumentKind, String> {
    DocumentKind::ALL
        .into_iter()
        .find(|kind| kind.as_str() == name)
        .ok_or_else(|| format!("expected one of config, user, l10n, got {name:?}"))
}

/// コンソール出力と、指定があればファイル出力のサブスクライバーを登録する
///
/// 返したガードを破棄するとファイルへの書き込みをフラッシュする。
fn init_tracing(log_file: Option<&Path>) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console = fmt::layer().with_writer(std::io::stderr);

    let Some(path) = log_file else {
        tracing_subscriber::registry().with(env_filter).with(console).init();
        return None;
    };

    let directory = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path.file_name().map_or_else(|| "coyo-inspector.log".into(), PathBuf::from);
    let (non_blocking, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(directory, file_name));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();
    Some(guard)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_file.as_deref());

    let show = if cli.show.is_empty() { DocumentKind::ALL.to_vec() } else { cli.show };
    let options = RunOptions {
        host: cli.host,
        config_dir: cli.config_dir,
        out_dir: cli.out,
        show,
        tab_id: cli.tab_id,
        user_timeout: Duration::from_millis(cli.user_timeout_ms),
    };

    match app::run(&options).await {
        Ok(report) => {
            tracing::info!(
                pages = report.pages.len(),
                downloads = report.downloads.len(),
                "Inspection finished"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
