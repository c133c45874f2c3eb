//! バックアップ対象の一覧を組み立てる。

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use regex::escape;

use crate::config::Config;
use crate::core::filter::{self, NameFilter, RuleSet};

/// 起点となるパスと、その下に適用するフィルタの組
#[derive(Debug, Clone)]
pub struct Target {
    root: PathBuf,
    rules: RuleSet,
}

impl Target {
    /// `Target`を生成する。
    pub fn new<P: Into<PathBuf>>(root: P, rules: RuleSet) -> Target {
        Target {
            root: root.into(),
            rules,
        }
    }

    /// メタデータファイル自身をバックアップするための対象を生成する。
    ///
    /// ファイル名と、それを置くディレクトリの名前だけに一致するフィルタを持つ。
    pub fn metadata_file(metadata_path: &Path) -> filter::Result<Target> {
        let file_name = name_pattern(metadata_path.file_name());
        let dir_name = name_pattern(metadata_path.parent().and_then(Path::file_name));

        let files = NameFilter::compile(&[file_name], &[])?;
        let folders = NameFilter::compile(&[dir_name], &[])?;

        Ok(Target::new(metadata_path, RuleSet::new(files, folders)))
    }

    /// 起点のパス
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 適用するフィルタ
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }
}

fn name_pattern(name: Option<&OsStr>) -> String {
    escape(&name.map(|n| n.to_string_lossy()).unwrap_or_default())
}

/// 設定されたバックアップ対象を、パスの辞書順に全てコンパイルする。
///
/// 最後にメタデータファイル自身が対象として追加される。
/// 走査を始める前に全てのパターンがコンパイルされるので、不正なパターンはここで検出される。
pub fn compile_targets(config: &Config, metadata_path: &Path) -> filter::Result<Vec<Target>> {
    let mut targets = Vec::with_capacity(config.paths().len() + 1);

    for (path, path_config) in config.paths() {
        targets.push(Target::new(path, RuleSet::compile(path_config)?));
    }
    targets.push(Target::metadata_file(metadata_path)?);

    Ok(targets)
}
