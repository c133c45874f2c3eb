//! バイト数の表示

const UNITS: [&str; 7] = ["B", "kB", "MB", "GB", "TB", "PB", "EB"];
const BASE: f64 = 1000.0;

/// バイト数をSI接頭辞付きの単位で表した文字列を返す。
///
/// 10単位未満は小数点以下1桁、それ以上は整数に丸める。
pub fn format_bytes(bytes: u64) -> String {
    if bytes < 10 {
        return format!("{} B", bytes);
    }

    let mut exp = 0;
    let mut n = bytes;
    while n >= 1000 && exp < UNITS.len() - 1 {
        n /= 1000;
        exp += 1;
    }

    let value = (bytes as f64 / BASE.powi(exp as i32) * 10.0 + 0.5).floor() / 10.0;

    if value < 10.0 {
        format!("{:.1} {}", value, UNITS[exp])
    } else {
        format!("{:.0} {}", value, UNITS[exp])
    }
}
