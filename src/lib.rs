#![warn(missing_docs)]

//! ibak ライブラリ部分
//!
//! 外部から使用する場合は [`core`](core/index.html) を参照すること。

pub mod config;
pub mod core;
pub mod smalllog;
pub mod util;
