//! 他のクレートやOSとの接続用などのユーティリティ集。

pub mod host;
pub mod size;

use std::error::Error;

/// エラーとその原因の連鎖を標準エラー出力に表示する。
pub fn dump_error(e: &(dyn Error + 'static)) {
    eprintln!("Error: {}", e);
    dump_sources(e.source());
}

fn dump_sources(e: Option<&(dyn Error + 'static)>) {
    if let Some(e) = e {
        eprintln!("    # {}", e);
        dump_sources(e.source());
    }
}
