//! 設定ファイルを扱う。

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Error, Result};
use log::{debug, error, LevelFilter};
use serde::{Deserialize, Serialize};
use serde_json::{from_slice, to_vec};

use crate::smalllog;


/// 設定ファイルやメタデータを置くディレクトリの名前
pub const BOOTSTRAP_DIR: &str = ".backup";
/// 設定ファイルの名前
pub const CONFIG_FILE: &str = "config.json";
/// メタデータファイルの名前
pub const METADATA_FILE: &str = "metadata.json";

/// 既定の設定ディレクトリ(`~/.backup`)のパスを返す。
pub fn bootstrap_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| Error::msg("can't find home directory"))?;
    Ok(home.join(BOOTSTRAP_DIR))
}

/// 設定ディレクトリが存在しなければ作成する。
pub fn ensure_bootstrap_dir<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    if path.is_dir() {
        return Ok(());
    }

    debug!("creating bootstrap directory {:?}", path);
    create_private_dir(path).with_context(|| format!("creating directory {:?}", path))?;
    Ok(())
}

#[cfg(unix)]
fn create_private_dir(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;

    fs::DirBuilder::new().mode(0o750).create(path)
}

#[cfg(not(unix))]
fn create_private_dir(path: &Path) -> std::io::Result<()> {
    fs::create_dir(path)
}

/// 指定パスから設定ファイルを読み込む
pub fn load<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    let buf = fs::read(path).with_context(|| format!("reading config file {:?}", path))?;

    from_slice(&buf).with_context(|| format!("parsing config file {:?}", path))
}

/// 指定パスから設定ファイルを読み込む。
///
/// 存在しない場合、既定値の設定ファイルを書き出してから読み込む。
pub fn load_or_init<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();

    if !path.exists() {
        debug!("writing default config file {:?}", path);
        let buf = to_vec(&Config::default())?;
        fs::write(path, &buf).with_context(|| format!("writing config file {:?}", path))?;
    }

    load(path)
}

/// 設定ファイルの内容
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    bucket: String,
    #[serde(default)]
    paths: BTreeMap<String, PathConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    store: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Log::is_unset")]
    log: Log,
}

impl Config {
    /// アップロード先のバケット名を取得する。
    pub fn bucket(&self) -> Option<&str> {
        if self.bucket.is_empty() {
            None
        } else {
            Some(&self.bucket)
        }
    }

    /// バックアップ対象のパスと、それぞれのフィルタ設定の一覧を取得する。
    ///
    /// パスの辞書順に並ぶ。
    pub fn paths(&self) -> &BTreeMap<String, PathConfig> {
        &self.paths
    }

    /// バックアップ対象を追加する。
    pub fn add_path<S: Into<String>>(&mut self, path: S, filter: PathConfig) {
        self.paths.insert(path.into(), filter);
    }

    /// オブジェクトストアのルートディレクトリを取得する。
    pub fn store(&self) -> Option<&Path> {
        self.store.as_deref()
    }

    /// ログ表示のレベルを設定する。
    pub fn set_log_level(&mut self, level: LogLevel) {
        self.log.level = Some(level);
    }

    /// 文字列で指定されたログ表示のレベルを設定する。
    pub fn set_log_level_str(&mut self, level_str: &str) -> Result<()> {
        self.set_log_level(level_str.parse()?);
        Ok(())
    }

    /// ログ設定をロガーに適用する。
    pub fn apply_log(&self) {
        self.log.apply();
    }
}

/// 1つのバックアップ対象に対するフィルタ設定
///
/// パターンは文字列のまま保持する。
/// コンパイルは [`RuleSet::compile`](../core/filter/struct.RuleSet.html#method.compile) で行う。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathConfig {
    /// 包含するファイル名のパターン
    #[serde(default)]
    pub include_files: Vec<String>,
    /// 除外するファイル名のパターン
    #[serde(default)]
    pub exclude_files: Vec<String>,
    /// 包含するフォルダ名のパターン
    #[serde(default)]
    pub include_folders: Vec<String>,
    /// 除外するフォルダ名のパターン
    #[serde(default)]
    pub exclude_folders: Vec<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
struct Log {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    level: Option<LogLevel>,
}

impl Log {
    fn apply(&self) {
        match self.output.as_deref().unwrap_or("stderr") {
            "stderr" => smalllog::use_stderr(),
            name => {
                if let Err(e) = smalllog::use_file(name) {
                    error!("can't open log file {}: {}", name, e);
                }
            }
        }

        if let Some(level) = self.level {
            smalllog::set_level(level.into());
        }
    }

    fn is_unset(&self) -> bool {
        self.output.is_none() && self.level.is_none()
    }
}

/// ログ表示のレベル
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// 無効
    Off,
    /// エラーのみ
    Error,
    /// 警告を表示
    Warn,
    /// 詳細動作を表示
    Info,
    /// デバッグ用
    Debug,
    /// より詳細なデバッグ用
    Trace,
}

impl Default for LogLevel {
    fn default() -> LogLevel {
        LogLevel::Warn
    }
}

impl FromStr for LogLevel {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "off" => Ok(LogLevel::Off),
            "error" => Ok(LogLevel::Error),
            "warn" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(Error::msg(format!("Invalid log level: {}", s))),
        }
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> LevelFilter {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}
