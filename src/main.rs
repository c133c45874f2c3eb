use std::ffi::OsString;
use std::path::PathBuf;
use std::process::exit;

use anyhow::{Context, Error, Result};
use clap::{crate_description, crate_name, crate_version, App, Arg, ArgMatches};
use log::{debug, info};

use ibak::config::{self, CONFIG_FILE, METADATA_FILE};
use ibak::core::metadata::MetadataStore;
use ibak::core::run::{self, ErrorKind, Mode, Remote, Runner};
use ibak::core::store::DirStore;
use ibak::core::target::compile_targets;
use ibak::smalllog;
use ibak::util::dump_error;
use ibak::util::host::hostname;
use ibak::util::size::format_bytes;

fn main() {
    if let Err(e) = smalllog::init() {
        eprintln!("can't initialize logger: {}", e);
    }

    if let Err(e) = w_main() {
        dump_error(e.as_ref());
        if let Some(kind) = error_kind(&e) {
            eprintln!("    ({} error)", kind);
        }
        if cfg!(debug_assertions) {
            eprintln!("{:#?}", e);
        }
        exit(1);
    }
}

fn w_main() -> Result<()> {
    let matches = app().get_matches_from(normalize_args(std::env::args_os()));

    let bootstrap_dir = match matches.value_of_os("dir") {
        Some(dir) => PathBuf::from(dir),
        None => config::bootstrap_dir()?,
    };
    config::ensure_bootstrap_dir(&bootstrap_dir)?;

    let mut config = config::load_or_init(bootstrap_dir.join(CONFIG_FILE))?;
    if let Some(level) = matches.value_of("log_level") {
        config.set_log_level_str(level)?;
    }
    config.apply_log();

    let (live, prune) = flags(&matches);
    debug!("bootstrap directory {:?}, live={}, prune={}", bootstrap_dir, live, prune);

    let metadata_path = bootstrap_dir.join(METADATA_FILE);
    let targets = compile_targets(&config, &metadata_path)
        .map_err(run::Error::from)
        .context("compiling filters")?;
    let metadata = MetadataStore::load(&metadata_path).map_err(run::Error::from)?;

    let store;
    let mode = if live {
        let bucket = config
            .bucket()
            .ok_or_else(|| Error::msg("no config value: bucket"))?;
        let store_root = config
            .store()
            .ok_or_else(|| Error::msg("no config value: store"))?;
        let host = hostname().context("resolving host name")?;

        store = DirStore::open_or_create(store_root).map_err(run::Error::from)?;
        info!("uploading to {:?} bucket {} as {}", store.root(), bucket, host);
        Mode::Run(Remote::new(&store, bucket, host))
    } else {
        Mode::Plan
    };

    let mut runner = Runner::new(mode, metadata)?;
    let total = runner.execute(&targets, prune)?;

    println!("Total size: {}", format_bytes(total));

    Ok(())
}

// 原因の連鎖のうち、最も外側の分類できるエラーで分類する。
fn error_kind(e: &Error) -> Option<ErrorKind> {
    e.chain().find_map(|cause| {
        if let Some(e) = cause.downcast_ref::<run::Error>() {
            Some(e.kind())
        } else if cause.is::<serde_json::Error>() {
            Some(ErrorKind::Corruption)
        } else if cause.is::<std::io::Error>() {
            Some(ErrorKind::Filesystem)
        } else {
            None
        }
    })
}

fn app() -> App<'static, 'static> {
    App::new(crate_name!())
        .version(crate_version!())
        .about(crate_description!())
        .arg(
            Arg::with_name("run")
                .long("run")
                .help("Upload changed files. Without this only shows what would be uploaded"),
        )
        .arg(
            Arg::with_name("prune")
                .long("prune")
                .help("Delete uploaded objects whose local file is gone or filtered out"),
        )
        .arg(
            Arg::with_name("dir")
                .long("dir")
                .takes_value(true)
                .value_name("DIR")
                .help("Directory holding config.json and metadata.json [default: ~/.backup]"),
        )
        .arg(
            Arg::with_name("log_level")
                .long("log-level")
                .takes_value(true)
                .possible_values(&["off", "error", "warn", "info", "debug", "trace"])
                .help("Log level"),
        )
}

// `-run` `-prune` の単一ハイフン表記も受け付ける。
fn normalize_args<I: IntoIterator<Item = OsString>>(args: I) -> Vec<OsString> {
    args.into_iter()
        .map(|a| {
            if a == "-run" {
                OsString::from("--run")
            } else if a == "-prune" {
                OsString::from("--prune")
            } else {
                a
            }
        })
        .collect()
}

fn flags(matches: &ArgMatches) -> (bool, bool) {
    (matches.is_present("run"), matches.is_present("prune"))
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(args: &[&str]) -> (bool, bool) {
        let args = args.iter().map(OsString::from);
        let matches = app().get_matches_from(normalize_args(args));
        flags(&matches)
    }

    #[test]
    fn test_broken_config_is_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{"paths": {"#).unwrap();

        let err = config::load_or_init(&path).unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::Corruption));

        let err = config::load(dir.path().join("missing.json")).unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::Filesystem));
    }

    #[test]
    fn test_run_error_keeps_its_kind() {
        let err = Error::from(run::Error::AlreadyProcessed("/a".to_owned())).context("running");
        assert_eq!(error_kind(&err), Some(ErrorKind::Consistency));

        assert_eq!(error_kind(&Error::msg("no config value: bucket")), None);
    }

    #[test]
    fn test_plan_by_default() {
        assert_eq!(parse(&["ibak"]), (false, false));
    }

    #[test]
    fn test_single_dash_flags() {
        assert_eq!(parse(&["ibak", "-run"]), (true, false));
        assert_eq!(parse(&["ibak", "-prune"]), (false, true));
        assert_eq!(parse(&["ibak", "-prune", "-run"]), (true, true));
    }

    #[test]
    fn test_double_dash_flags() {
        assert_eq!(parse(&["ibak", "--run", "--prune"]), (true, true));
    }
}
