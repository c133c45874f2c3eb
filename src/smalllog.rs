//! 簡易ロガー
//!
//! 進捗表示は標準出力に直接書き、このロガーは診断用のログだけを扱う。

use std::env::var;
use std::fs::File;
use std::io::{self, stderr, Stderr, Write};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use lazy_static::{initialize, lazy_static};
use log::{set_logger, set_max_level, warn, LevelFilter, Log, Metadata, Record, SetLoggerError};

use crate::config::LogLevel;

/// ログレベルを指定する環境変数
pub const LOG_ENV: &str = "IBAK_LOG";

lazy_static! {
    static ref STATE: Mutex<LoggerState> = {
        Mutex::new(LoggerState {
            out: Out::Stderr(stderr()),
            level: LogLevel::default().into(),
            show_detail_level: LevelFilter::Debug,
        })
    };
}

static LOGGER: Logger = Logger;

/// ロガーを初期化する。
///
/// 環境変数`IBAK_LOG`が設定されている場合、その指定レベルに設定する。
pub fn init() -> Result<(), SetLoggerError> {
    initialize(&STATE);
    set_logger(&LOGGER)?;
    set_max_level(LevelFilter::Trace);

    if let Ok(level) = var(LOG_ENV) {
        match level.parse::<LogLevel>() {
            Ok(level) => set_level(level.into()),
            Err(_) => warn!("unknown log level {}={}", LOG_ENV, level),
        }
    }

    Ok(())
}

/// ログ出力先を標準エラー出力にする。
pub fn use_stderr() {
    state().out = Out::Stderr(stderr());
}

/// ログ出力先をファイルにする。
///
/// # Failures
/// ファイルのオープンに失敗した場合、エラーを返す。
pub fn use_file<P: AsRef<Path>>(path: P) -> Result<(), io::Error> {
    let f = File::create(&path)?;
    state().out = Out::File(f);
    Ok(())
}

/// ログ出力のレベルを設定する。
///
/// デフォルト値は`LevelFilter::Warn`。
pub fn set_level(level: LevelFilter) {
    state().level = level;
}

// ログ出力中にパニックしても、以降のログは出し続ける。
fn state() -> MutexGuard<'static, LoggerState> {
    STATE.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct Logger;

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= state().level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let mut state = state();
        let show_detail = record.level() >= state.show_detail_level;
        let module = record.module_path().unwrap_or("<unknown module>");

        // ログの書き込み失敗は報告先がないので無視する。
        let _ = if show_detail {
            writeln!(
                state.out.writer(),
                "[ {:5} ] {}:{} : {}",
                record.level(),
                module,
                record
                    .line()
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "??".to_owned()),
                record.args()
            )
        } else {
            writeln!(
                state.out.writer(),
                "[ {:5} ] {} : {}",
                record.level(),
                module,
                record.args()
            )
        };
    }

    fn flush(&self) {
        let _ = state().out.writer().flush();
    }
}

struct LoggerState {
    out: Out,
    level: LevelFilter,
    // このレベル以下の詳細なログには行番号を付ける。
    show_detail_level: LevelFilter,
}

enum Out {
    Stderr(Stderr),
    File(File),
}

impl Out {
    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Out::Stderr(ref mut w) => w,
            Out::File(ref mut w) => w,
        }
    }
}
