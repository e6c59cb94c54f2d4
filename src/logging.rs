//! ログ初期化
//!
//! The engine itself only emits `tracing` events; hosts that do not install
//! their own subscriber can call [`init_logging`].

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

const LOG_FILE_NAME: &str = "perf-telemetry.log";

/// ログ設定
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    /// ログレベル (trace, debug, info, warn, error)。`RUST_LOG` が優先
    pub level: String,
    /// コンソール出力有効
    pub console_enabled: bool,
    /// ファイル出力（None で無効）
    pub file: Option<LogFileConfig>,
}

/// ファイル出力設定
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogFileConfig {
    /// ログディレクトリ
    pub dir: PathBuf,
    /// ファイルローテーション設定
    #[serde(default)]
    pub rotation: LogRotation,
    /// JSON 形式で出力
    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogRotation {
    /// 日次ローテーション
    #[default]
    Daily,
    /// 時間毎ローテーション
    Hourly,
    /// ローテーションなし
    Never,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console_enabled: true,
            file: None,
        }
    }
}

impl LogConfig {
    /// ログレベルを設定
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// コンソール出力制御
    pub fn with_console(mut self, enabled: bool) -> Self {
        self.console_enabled = enabled;
        self
    }

    /// ファイル出力を有効化
    pub fn with_file<P: Into<PathBuf>>(mut self, dir: P, rotation: LogRotation) -> Self {
        self.file = Some(LogFileConfig {
            dir: dir.into(),
            rotation,
            json: false,
        });
        self
    }
}

/// ログディレクトリを確保
fn ensure_log_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// ログシステムを初期化
///
/// ファイル出力時は返された `WorkerGuard` を保持している間だけ書き込まれる。
/// 既にグローバル subscriber が設定済みの場合はエラーを返す。
pub fn init_logging(config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let filter = env_filter(&config.level);

    let Some(file) = &config.file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| anyhow!(e))?;
        return Ok(None);
    };

    ensure_log_dir(&file.dir)?;
    let appender = match file.rotation {
        LogRotation::Daily => rolling::daily(&file.dir, LOG_FILE_NAME),
        LogRotation::Hourly => rolling::hourly(&file.dir, LOG_FILE_NAME),
        LogRotation::Never => rolling::never(&file.dir, LOG_FILE_NAME),
    };
    let (writer, guard) = non_blocking(appender);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true);

    let installed = match (config.console_enabled, file.json) {
        (true, false) => builder.with_writer(std::io::stderr.and(writer)).try_init(),
        (false, false) => builder.with_ansi(false).with_writer(writer).try_init(),
        (true, true) => builder.json().with_writer(std::io::stderr.and(writer)).try_init(),
        (false, true) => builder.json().with_writer(writer).try_init(),
    };
    installed.map_err(|e| anyhow!(e))?;

    tracing::info!(dir = %file.dir.display(), level = %config.level, "ログシステム初期化完了");
    Ok(Some(guard))
}
