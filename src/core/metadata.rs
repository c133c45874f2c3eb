//! バックアップ済みファイルの更新日時を記録するメタデータ
//!
//! 変更のたびにファイル全体を書き直す。
//! 途中で中断しても、それまでにアップロードしたファイルは次回再アップロードされない。

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::{debug, trace};
use serde_json::{from_slice, to_writer};
use tempfile::NamedTempFile;

use crate::core::timestamp::Timestamp;

#[cfg(test)]
mod test;

/// ローカルのパスからバックアップ時点の更新日時への対応表
#[derive(Debug)]
pub struct MetadataStore {
    path: PathBuf,
    entries: BTreeMap<String, Timestamp>,
}

impl MetadataStore {
    /// メタデータファイルを読み込む。
    ///
    /// ファイルが存在しない場合、空の対応表を書き出してから読み込む。
    /// このため、呼び出し後は必ずファイルが存在する。
    ///
    /// # Failures
    ///
    /// ファイルの内容が不正な場合、[`Error::Parse`](enum.Error.html#variant.Parse)を返す。
    pub fn load<P: AsRef<Path>>(path: P) -> Result<MetadataStore> {
        let path = path.as_ref().to_owned();

        if !path.exists() {
            debug!("creating empty metadata file {:?}", path);
            MetadataStore {
                path: path.clone(),
                entries: BTreeMap::new(),
            }
            .persist()?;
        }

        let buf = fs::read(&path).map_err(|e| Error::io(&path, e))?;
        let entries = from_slice(&buf).map_err(|e| Error::Parse {
            path: path.clone(),
            source: e,
        })?;

        Ok(MetadataStore { path, entries })
    }

    /// メタデータファイルのパスを返す。
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 記録されている更新日時を取得する。
    pub fn get(&self, key: &str) -> Option<Timestamp> {
        self.entries.get(key).copied()
    }

    /// 更新日時を記録し、直ちにファイルへ書き出す。
    pub fn set(&mut self, key: &str, timestamp: Timestamp) -> Result<()> {
        trace!("metadata set {} = {}", key, timestamp);
        self.entries.insert(key.to_owned(), timestamp);
        self.persist()
    }

    /// 記録を削除し、直ちにファイルへ書き出す。
    ///
    /// 記録が存在しなかった場合は何もせず`false`を返す。
    pub fn remove(&mut self, key: &str) -> Result<bool> {
        if self.entries.remove(key).is_none() {
            return Ok(false);
        }
        trace!("metadata removed {}", key);
        self.persist()?;
        Ok(true)
    }

    /// 記録されているキーを辞書順に返す。
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    /// 記録の件数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 記録が空かどうか
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // 同じディレクトリの一時ファイルに書いてから置き換える。
    fn persist(&self) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let mut temp = NamedTempFile::new_in(dir).map_err(|e| Error::io(&self.path, e))?;
        to_writer(&mut temp, &self.entries).map_err(|e| Error::io(&self.path, e.into()))?;
        temp.flush().map_err(|e| Error::io(&self.path, e))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| Error::io(&self.path, e))?;
        temp.persist(&self.path)
            .map_err(|e| Error::io(&self.path, e.error))?;

        Ok(())
    }
}

#[allow(missing_docs)]
pub type Result<T> = std::result::Result<T, Error>;

/// メタデータの読み書きで発生しうるエラー
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// 入出力エラー
    #[error("failed access metadata file {path:?}: {source}")]
    IO {
        /// メタデータファイルのパス
        path: PathBuf,
        /// 原因
        source: io::Error,
    },

    /// メタデータファイルの内容が不正
    #[error("corrupted metadata file {path:?}: {source}")]
    Parse {
        /// メタデータファイルのパス
        path: PathBuf,
        /// 原因
        source: serde_json::Error,
    },
}

impl Error {
    fn io(path: &Path, source: io::Error) -> Error {
        Error::IO {
            path: path.to_owned(),
            source,
        }
    }
}
