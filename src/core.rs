//! バックアップシステムのコア部分
//!
//! 設定されたパスを走査し、フィルタと更新日時の記録に基づいてアップロードするファイルを決める。

pub mod backup;
pub mod filter;
pub mod metadata;
pub mod prune;
pub mod run;
pub mod scan;
pub mod store;
pub mod target;
pub mod timestamp;
