//! 1回のバックアップ実行の状態と、その流れを扱う。
//!
//! 走査([`scan`](../scan/index.html))、変更判定とアップロード([`backup`](../backup/index.html))、
//! 不要なオブジェクトの削除([`prune`](../prune/index.html))は全て[`Runner`](struct.Runner.html)のメソッドとして実装される。

use std::fmt;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use log::info;

use crate::core::filter;
use crate::core::metadata::{self, MetadataStore};
use crate::core::scan::ProcessedSet;
use crate::core::store::{self, ObjectStore, RemoteKey};
use crate::core::target::Target;


/// 実行モード
pub enum Mode<'a> {
    /// 何をアップロードするかを表示するだけで、ストアにもメタデータにも触れない。
    Plan,
    /// 実際にアップロード・削除し、メタデータを更新する。
    Run(Remote<'a>),
}

impl<'a> fmt::Debug for Mode<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Mode::Plan => write!(f, "Plan"),
            Mode::Run(remote) => write!(f, "Run({}@{})", remote.host, remote.bucket),
        }
    }
}

/// アップロード先のストアとバケット、キーに使うホスト名の組
pub struct Remote<'a> {
    store: &'a dyn ObjectStore,
    bucket: String,
    host: String,
}

impl<'a> Remote<'a> {
    /// `Remote`を生成する。
    pub fn new<B: Into<String>, H: Into<String>>(
        store: &'a dyn ObjectStore,
        bucket: B,
        host: H,
    ) -> Remote<'a> {
        Remote {
            store,
            bucket: bucket.into(),
            host: host.into(),
        }
    }

    /// ローカルのパスに対応するキーを返す。
    pub fn key(&self, local_path: &str) -> RemoteKey {
        RemoteKey::new(&self.host, local_path)
    }

    pub(crate) fn put(&self, local_path: &str, body: &mut dyn Read) -> store::Result<()> {
        self.store.put(&self.bucket, &self.key(local_path), body)
    }

    pub(crate) fn delete(&self, local_path: &str) -> store::Result<()> {
        self.store.delete(&self.bucket, &self.key(local_path))
    }
}

/// 1回の実行の結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub(crate) total_bytes: u64,
    pub(crate) planned: Vec<String>,
    pub(crate) uploaded: Vec<String>,
    pub(crate) unchanged: Vec<String>,
    pub(crate) pruned: Vec<String>,
}

impl Report {
    /// アップロードした(またはする予定の)ファイルの合計サイズ
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// `Plan`モードでアップロードが必要と判定されたファイル
    pub fn planned(&self) -> &[String] {
        &self.planned
    }

    /// `Run`モードでアップロードしたファイル
    pub fn uploaded(&self) -> &[String] {
        &self.uploaded
    }

    /// 前回から変更がなくスキップしたファイル
    pub fn unchanged(&self) -> &[String] {
        &self.unchanged
    }

    /// 削除した(またはする予定の)キー
    pub fn pruned(&self) -> &[String] {
        &self.pruned
    }
}

/// バックアップ1回分の実行コンテキスト
///
/// 処理済みパスの集合とメタデータを保持し、全ての操作を逐次実行する。
#[derive(Debug)]
pub struct Runner<'a> {
    pub(crate) mode: Mode<'a>,
    pub(crate) metadata: MetadataStore,
    pub(crate) metadata_key: String,
    pub(crate) processed: ProcessedSet,
    pub(crate) report: Report,
}

impl<'a> Runner<'a> {
    /// `Runner`を生成する。
    pub fn new(mode: Mode<'a>, metadata: MetadataStore) -> Result<Runner<'a>> {
        let metadata_path = canonicalize(metadata.path())?;
        let metadata_key = path_key(&metadata_path)?.to_owned();

        Ok(Runner {
            mode,
            metadata,
            metadata_key,
            processed: ProcessedSet::default(),
            report: Report::default(),
        })
    }

    /// 全てのバックアップ対象を順に処理し、必要なら最後に不要なオブジェクトを削除する。
    ///
    /// アップロードした(またはする予定の)合計バイト数を返す。
    pub fn execute(&mut self, targets: &[Target], prune: bool) -> Result<u64> {
        info!("start {:?} with {} targets", self.mode, targets.len());

        for target in targets {
            let root = canonicalize(target.root())?;
            info!("visiting {:?}", root);
            let total = self.visit(&root, true, target.rules())?;
            self.report.total_bytes += total;
        }

        if prune {
            self.prune()?;
        }

        Ok(self.report.total_bytes)
    }

    /// ここまでの実行結果
    pub fn report(&self) -> &Report {
        &self.report
    }

    /// メタデータ
    pub fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }

    /// 処理済みのパス
    pub fn processed(&self) -> &ProcessedSet {
        &self.processed
    }

    /// `Run`モードかどうか
    pub fn is_live(&self) -> bool {
        match self.mode {
            Mode::Plan => false,
            Mode::Run(_) => true,
        }
    }
}

fn canonicalize(path: &Path) -> Result<PathBuf> {
    fs::canonicalize(path).map_err(|e| Error::access(path, e))
}

/// パスをメタデータやキーに使う文字列に変換する。
pub(crate) fn path_key(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| Error::NameIsInvalidUnicode(path.to_owned()))
}

/// エラーの分類
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorKind {
    /// 保存されたデータが壊れている。
    Corruption,
    /// ファイルシステムにアクセスできない。
    Filesystem,
    /// パターンが不正
    Filter,
    /// オブジェクトストアへのアップロード・削除の失敗
    Transport,
    /// 同じパスを2回処理しようとした。
    Consistency,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            ErrorKind::Corruption => "corruption",
            ErrorKind::Filesystem => "filesystem",
            ErrorKind::Filter => "filter",
            ErrorKind::Transport => "transport",
            ErrorKind::Consistency => "consistency",
        };
        write!(f, "{}", s)
    }
}

#[allow(missing_docs)]
pub type Result<T> = std::result::Result<T, Error>;

/// バックアップの実行で発生しうるエラー
///
/// いずれも致命的で、発生した時点で実行全体を中断する。
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// ファイルやディレクトリにアクセスできない
    #[error("failed access {path:?}: {source}")]
    Access {
        /// 対象のパス
        path: PathBuf,
        /// 原因
        source: io::Error,
    },

    /// 名前が空文字列である要素を発見した
    #[error("found empty name entry at {0:?}")]
    NameIsEmpty(PathBuf),

    /// パスがUnicodeで表現できない
    #[error("found non-unicode path {0:?}")]
    NameIsInvalidUnicode(PathBuf),

    /// メタデータの読み書きに失敗した
    #[error("metadata error: {0}")]
    Metadata(#[from] metadata::Error),

    /// パターンのコンパイルに失敗した
    #[error("filter error: {0}")]
    Filter(#[from] filter::Error),

    /// オブジェクトストアの操作に失敗した
    #[error("transport error: {0}")]
    Transport(#[from] store::Error),

    /// 同じパスを2回処理しようとした
    #[error("already processed: {0}")]
    AlreadyProcessed(String),
}

impl Error {
    pub(crate) fn access(path: &Path, source: io::Error) -> Error {
        Error::Access {
            path: path.to_owned(),
            source,
        }
    }

    /// エラーの分類を返す。
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Access { .. } | Error::NameIsEmpty(_) | Error::NameIsInvalidUnicode(_) => {
                ErrorKind::Filesystem
            }
            Error::Metadata(metadata::Error::Parse { .. }) => ErrorKind::Corruption,
            Error::Metadata(metadata::Error::IO { .. }) => ErrorKind::Filesystem,
            Error::Filter(_) => ErrorKind::Filter,
            Error::Transport(_) => ErrorKind::Transport,
            Error::AlreadyProcessed(_) => ErrorKind::Consistency,
        }
    }
}
