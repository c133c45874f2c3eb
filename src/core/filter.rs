//! ファイル名・フォルダ名の包含/除外パターンを扱う。
//!
//! パターンは正規表現として解釈され、名前全体にマッチした場合のみ一致とみなす。

use std::fmt;

use regex::Regex;

use crate::config::PathConfig;


// `(?s)` で `.` が改行にもマッチし、`(?m)` でパターン内の `^` `$` が行単位になる。
// 名前全体へのアンカーは `\A` と `\z` で行う。
const PATTERN_FORMAT_PREFIX: &str = r"(?sm)\A(?:";
const PATTERN_FORMAT_SUFFIX: &str = r")\z";

/// 名前全体にマッチするようにコンパイルされたパターン
#[derive(Debug, Clone)]
pub struct Matcher {
    source: String,
    regex: Regex,
}

impl Matcher {
    /// パターン文字列をコンパイルする。
    ///
    /// # Failures
    ///
    /// パターンが正規表現として不正な場合、[`Error::InvalidPattern`](enum.Error.html#variant.InvalidPattern)を返す。
    pub fn compile(pattern: &str) -> Result<Matcher> {
        // 括弧の対応が取れていないパターンが、アンカー用のグループを閉じてしまうのを防ぐ。
        Regex::new(pattern).map_err(|e| Error::invalid(pattern, e))?;

        let anchored = format!("{}{}{}", PATTERN_FORMAT_PREFIX, pattern, PATTERN_FORMAT_SUFFIX);
        let regex = Regex::new(&anchored).map_err(|e| Error::invalid(pattern, e))?;

        Ok(Matcher {
            source: pattern.to_owned(),
            regex,
        })
    }

    /// コンパイル前のパターン文字列を返す。
    pub fn source(&self) -> &str {
        &self.source
    }

    /// 名前全体がパターンにマッチするか検査する。
    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}

/// 包含リストと除外リストの組
#[derive(Debug, Clone, Default)]
pub struct NameFilter {
    include: Vec<Matcher>,
    exclude: Vec<Matcher>,
}

impl NameFilter {
    /// パターン文字列のリストからフィルタを生成する。
    pub fn compile<S: AsRef<str>>(include: &[S], exclude: &[S]) -> Result<NameFilter> {
        Ok(NameFilter {
            include: compile_all(include)?,
            exclude: compile_all(exclude)?,
        })
    }

    /// 名前を判定する。
    ///
    /// 包含リストが空でなければ、いずれかにマッチしない名前は拒否される。
    /// 除外リストのいずれかにマッチした名前は、包含判定の結果に関わらず拒否される。
    pub fn check(&self, name: &str) -> Verdict {
        if !self.include.is_empty() && !any_match(&self.include, name) {
            return Verdict::NotIncluded;
        }
        if any_match(&self.exclude, name) {
            return Verdict::Excluded;
        }
        Verdict::Accepted
    }

    /// 名前が受け入れられるかどうかを返す。
    pub fn accepts(&self, name: &str) -> bool {
        self.check(name) == Verdict::Accepted
    }
}

fn compile_all<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Matcher>> {
    patterns.iter().map(|p| Matcher::compile(p.as_ref())).collect()
}

fn any_match(matchers: &[Matcher], name: &str) -> bool {
    matchers.iter().any(|m| m.is_match(name))
}

/// 1つのバックアップ対象に適用されるコンパイル済みのフィルタ
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    files: NameFilter,
    folders: NameFilter,
}

impl RuleSet {
    /// 設定ファイルのパターン文字列から生成する。
    pub fn compile(config: &PathConfig) -> Result<RuleSet> {
        Ok(RuleSet {
            files: NameFilter::compile(&config.include_files, &config.exclude_files)?,
            folders: NameFilter::compile(&config.include_folders, &config.exclude_folders)?,
        })
    }

    /// 既にコンパイルされたフィルタから生成する。
    pub fn new(files: NameFilter, folders: NameFilter) -> RuleSet {
        RuleSet { files, folders }
    }

    /// ファイル名に対するフィルタ
    pub fn files(&self) -> &NameFilter {
        &self.files
    }

    /// フォルダ名に対するフィルタ
    pub fn folders(&self) -> &NameFilter {
        &self.folders
    }
}

/// 名前の判定結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Verdict {
    /// 処理対象とする。
    Accepted,
    /// 包含リストのどれにもマッチしなかった。
    NotIncluded,
    /// 除外リストのいずれかにマッチした。
    Excluded,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Verdict::Accepted => write!(f, "accepted"),
            Verdict::NotIncluded => write!(f, "not included"),
            Verdict::Excluded => write!(f, "excluded"),
        }
    }
}

#[allow(missing_docs)]
pub type Result<T> = std::result::Result<T, Error>;

/// パターンのコンパイルで発生しうるエラー
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// パターンが正規表現として不正である。
    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        /// 不正なパターン
        pattern: String,
        /// 正規表現のコンパイルエラー
        source: regex::Error,
    },
}

impl Error {
    fn invalid(pattern: &str, source: regex::Error) -> Error {
        Error::InvalidPattern {
            pattern: pattern.to_owned(),
            source,
        }
    }
}
