//! ローカルに存在しなくなったファイルのオブジェクトを削除する。

use crate::core::metadata::MetadataStore;
use crate::core::run::{Mode, Result, Runner};
use crate::core::scan::ProcessedSet;

/// メタデータに記録されているが今回処理されなかったキーを、辞書順に返す。
pub fn stale_keys(metadata: &MetadataStore, processed: &ProcessedSet) -> Vec<String> {
    metadata
        .keys()
        .filter(|k| !processed.contains(k))
        .map(|k| k.to_owned())
        .collect()
}

impl<'a> Runner<'a> {
    /// 全ての走査が終わった後、不要になったオブジェクトとメタデータの記録を削除する。
    ///
    /// 削除に失敗した時点で中断する。
    pub(crate) fn prune(&mut self) -> Result<()> {
        for key in stale_keys(&self.metadata, &self.processed) {
            match &self.mode {
                Mode::Plan => {
                    println!("Should prune {} ...", key);
                }
                Mode::Run(remote) => {
                    println!("Pruning {} ...", key);
                    remote.delete(&key)?;
                    self.metadata.remove(&key)?;
                }
            }
            self.report.pruned.push(key);
        }

        Ok(())
    }
}
