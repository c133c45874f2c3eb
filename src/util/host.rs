//! バックアップ元を識別するホスト名の取得

use std::io;

use gethostname::gethostname;

/// 実行中のマシンのホスト名を返す。
///
/// # Failures
/// ホスト名がUnicodeで表現できない場合、エラーを返す。
pub fn hostname() -> io::Result<String> {
    gethostname().into_string().map_err(|name| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("non-unicode host name {:?}", name),
        )
    })
}
