//! ファイルやディレクトリの走査を行う。

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::core::filter::{RuleSet, Verdict};
use crate::core::run::{path_key, Error, Result, Runner};
use crate::util::size::format_bytes;

/// 1回の実行で処理したパスの集合
///
/// ディレクトリとファイルの両方を、シンボリックリンクを解決した実体のパスで保持する。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessedSet {
    paths: BTreeSet<String>,
}

impl ProcessedSet {
    /// パスを処理済みとして記録する。
    ///
    /// # Failures
    ///
    /// 既に記録済みの場合、[`Error::AlreadyProcessed`](../run/enum.Error.html#variant.AlreadyProcessed)を返す。
    /// 設定された対象が重なっているか、走査が循環していることを示す。
    pub fn mark(&mut self, key: &str) -> Result<()> {
        if !self.paths.insert(key.to_owned()) {
            return Err(Error::AlreadyProcessed(key.to_owned()));
        }
        Ok(())
    }

    /// 処理済みかどうか
    pub fn contains(&self, key: &str) -> bool {
        self.paths.contains(key)
    }

    /// 記録されたパスの件数
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// 記録が空かどうか
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl<'a> Runner<'a> {
    /// `path`以下を走査し、アップロードした(またはする予定の)バイト数を返す。
    ///
    /// `forced`の場合、`path`自身がディレクトリであればフォルダのフィルタを適用しない。
    /// ファイルのフィルタは常に適用される。
    pub(crate) fn visit(&mut self, path: &Path, forced: bool, rules: &RuleSet) -> Result<u64> {
        let meta = fs::metadata(path).map_err(|e| Error::access(path, e))?;

        if meta.is_dir() {
            self.visit_dir(path, forced, rules)
        } else if meta.is_file() {
            self.visit_file(path, &meta, rules)
        } else {
            warn!("{:?} is not dir nor file, skipped", path);
            Ok(0)
        }
    }

    fn visit_dir(&mut self, path: &Path, forced: bool, rules: &RuleSet) -> Result<u64> {
        if !forced {
            let verdict = rules.folders().check(entry_name(path)?);
            if verdict != Verdict::Accepted {
                debug!("folder {:?} {}", path, verdict);
                return Ok(0);
            }
        }

        let dir = self.claim(path)?;
        let key = path_key(&dir)?;

        let mut children = fs::read_dir(&dir)
            .and_then(|rd| rd.map(|e| e.map(|e| e.path())).collect::<io::Result<Vec<PathBuf>>>())
            .map_err(|e| Error::access(&dir, e))?;
        children.sort();

        let mut total = 0u64;
        for ch in &children {
            total += self.visit(ch, false, rules)?;
        }

        if total > 0 {
            println!("{} size: {}", key, format_bytes(total));
        }

        Ok(total)
    }

    fn visit_file(&mut self, path: &Path, meta: &fs::Metadata, rules: &RuleSet) -> Result<u64> {
        let verdict = rules.files().check(entry_name(path)?);
        if verdict != Verdict::Accepted {
            debug!("file {:?} {}", path, verdict);
            return Ok(0);
        }

        let real = self.claim(path)?;
        let key = path_key(&real)?;
        let file = File::open(&real).map_err(|e| Error::access(&real, e))?;

        self.process_file(key, file, meta)
    }

    // 実体のパスで処理済みとして記録し、そのパスを返す。
    // シンボリックリンクによる循環や、別の対象への合流はここで検出される。
    fn claim(&mut self, path: &Path) -> Result<PathBuf> {
        let real = fs::canonicalize(path).map_err(|e| Error::access(path, e))?;
        if real != path {
            debug!("{:?} resolves to {:?}", path, real);
        }
        self.processed.mark(path_key(&real)?)?;
        Ok(real)
    }
}

fn entry_name(path: &Path) -> Result<&str> {
    let name = path
        .file_name()
        .ok_or_else(|| Error::NameIsEmpty(path.to_owned()))?;

    name.to_str()
        .ok_or_else(|| Error::NameIsInvalidUnicode(path.to_owned()))
}
