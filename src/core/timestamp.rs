//! ファイルの更新日時

use std::fmt;
use std::fs::Metadata;
use std::io;
use std::time::SystemTime;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// ファイルの更新日時
///
/// メタデータファイルにはRFC 3339形式で保存される。
/// 比較はナノ秒単位で厳密に行う。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// ファイルのメタデータから更新日時を取得する。
    pub fn modified(meta: &Metadata) -> io::Result<Timestamp> {
        Ok(Timestamp::from(meta.modified()?))
    }
}

impl From<SystemTime> for Timestamp {
    fn from(t: SystemTime) -> Timestamp {
        Timestamp(DateTime::from(t))
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(t: DateTime<Utc>) -> Timestamp {
        Timestamp(t)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }
}
