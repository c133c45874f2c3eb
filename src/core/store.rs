//! バックアップ先となるオブジェクトストアの操作

use std::fmt;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use log::debug;
use tempfile::NamedTempFile;


/// オブジェクトストアのキー
///
/// バックアップ元のホスト名とローカルのパスを連結したもの。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RemoteKey(String);

impl RemoteKey {
    /// ホスト名とローカルのパスからキーを生成する。
    pub fn new(host: &str, local_path: &str) -> RemoteKey {
        RemoteKey(format!("{}{}", host, local_path))
    }

    /// 文字列表現への参照を返す。
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemoteKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// オブジェクトの保存と削除ができるストア
///
/// 呼び出しは同期的に完了し、失敗はそのまま呼び出し元に返す。
pub trait ObjectStore {
    /// `body`の内容を最後まで読み、`bucket`の`key`に保存する。
    fn put(&self, bucket: &str, key: &RemoteKey, body: &mut dyn Read) -> Result<()>;

    /// `bucket`の`key`を削除する。存在しないキーの削除は成功とする。
    fn delete(&self, bucket: &str, key: &RemoteKey) -> Result<()>;
}

/// ローカルのディレクトリをオブジェクトストアとして扱う。
///
/// バケットはルート直下のディレクトリ、キーは`/`区切りの相対パスとして保存される。
#[derive(Debug)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// 既存のディレクトリを開くか、存在しない場合生成する。
    pub fn open_or_create<P: AsRef<Path>>(root: P) -> Result<DirStore> {
        let root = root.as_ref().to_owned();
        if !root.exists() {
            debug!("creating object store directory {:?}", root);
            fs::create_dir_all(&root).map_err(|e| Error::io(&root, e))?;
        }
        Ok(DirStore { root })
    }

    /// ストアのルートディレクトリ
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// オブジェクトの保存先のパスを返す。
    pub fn object_path(&self, bucket: &str, key: &RemoteKey) -> Result<PathBuf> {
        let mut res = self.root.join(checked_segment(bucket, bucket)?);

        let mut pushed = false;
        for part in key.as_str().split('/').filter(|p| !p.is_empty()) {
            res.push(checked_segment(part, key.as_str())?);
            pushed = true;
        }
        if !pushed {
            return Err(Error::InvalidKey(key.as_str().to_owned()));
        }

        Ok(res)
    }
}

fn checked_segment<'a>(segment: &'a str, whole: &str) -> Result<&'a str> {
    if segment.is_empty() || segment == "." || segment == ".." || segment.contains('\\') {
        return Err(Error::InvalidKey(whole.to_owned()));
    }
    Ok(segment)
}

impl ObjectStore for DirStore {
    fn put(&self, bucket: &str, key: &RemoteKey, body: &mut dyn Read) -> Result<()> {
        let out_path = self.object_path(bucket, key)?;

        // object_pathは少なくとも1つの要素を積むので、親は必ず存在する。
        let out_dir = out_path.parent().unwrap_or_else(|| self.root.as_path());
        fs::create_dir_all(out_dir).map_err(|e| Error::io(out_dir, e))?;

        let mut temp = NamedTempFile::new_in(out_dir).map_err(|e| Error::io(out_dir, e))?;
        io::copy(body, &mut temp).map_err(|e| Error::io(&out_path, e))?;
        temp.persist(&out_path)
            .map_err(|e| Error::io(&out_path, e.error))?;

        Ok(())
    }

    fn delete(&self, bucket: &str, key: &RemoteKey) -> Result<()> {
        let path = self.object_path(bucket, key)?;

        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("object {:?} is already absent", path);
                Ok(())
            }
            Err(e) => Err(Error::io(&path, e)),
        }
    }
}

#[allow(missing_docs)]
pub type Result<T> = std::result::Result<T, Error>;

/// オブジェクトストアの操作で発生しうるエラー
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// 入出力エラーが発生した
    #[error("object store IO error at {path:?}: {source}")]
    IO {
        /// 対象のパス
        path: PathBuf,
        /// 原因
        source: io::Error,
    },

    /// キーまたはバケット名がストアで扱えない
    #[error("invalid object key: {0:?}")]
    InvalidKey(String),
}

impl Error {
    fn io(path: &Path, source: io::Error) -> Error {
        Error::IO {
            path: path.to_owned(),
            source,
        }
    }
}
