//! 変更されたファイルの判定とアップロード

use std::fs::{File, Metadata};
use std::path::Path;

use log::trace;

use crate::core::run::{Error, Mode, Result, Runner};
use crate::core::timestamp::Timestamp;
use crate::util::size::format_bytes;

/// 記録された更新日時と現在の更新日時から、アップロードが必要かどうかを判定する。
///
/// 日時が完全に一致する場合のみ不要とする。
pub fn needs_backup(stored: Option<Timestamp>, current: Timestamp) -> bool {
    stored != Some(current)
}

impl<'a> Runner<'a> {
    // 受け入れられたファイル1つを処理し、アップロードした(またはする予定の)バイト数を返す。
    pub(crate) fn process_file(&mut self, key: &str, mut file: File, meta: &Metadata) -> Result<u64> {
        let size = meta.len();
        let modified = Timestamp::modified(meta).map_err(|e| Error::access(Path::new(key), e))?;

        if !needs_backup(self.metadata.get(key), modified) {
            trace!("{} is unchanged since {}", key, modified);
            self.report.unchanged.push(key.to_owned());
            return Ok(0);
        }

        match &self.mode {
            Mode::Plan => {
                println!("Should backup {} with {} ...", key, format_bytes(size));
                self.report.planned.push(key.to_owned());
            }
            Mode::Run(remote) => {
                println!("Backing up {} with {} ...", key, format_bytes(size));
                remote.put(key, &mut file)?;

                // メタデータファイル自身の日時は記録しない。
                if key != self.metadata_key {
                    self.metadata.set(key, modified)?;
                }
                self.report.uploaded.push(key.to_owned());
            }
        }

        Ok(size)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn test_needs_backup() {
        let t = Timestamp::from(UNIX_EPOCH + Duration::new(1_700_000_000, 10));
        let t_later = Timestamp::from(UNIX_EPOCH + Duration::new(1_700_000_000, 11));

        assert!(needs_backup(None, t));
        assert!(!needs_backup(Some(t), t));
        assert!(needs_backup(Some(t), t_later));
        assert!(needs_backup(Some(t_later), t));
    }
}
