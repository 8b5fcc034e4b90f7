//! Collaborator seams for font scanning and cache persistence, and the
//! directory walk that drives them.
//!
//! Reading font binaries and persisting scan results live outside this
//! library; callers plug both in through the traits here. The walk owns
//! what is config semantics: scan-kind substitution, the accept/reject
//! filters and directory deduplication.

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use fontpat::{FontSet, Object, Pattern, Value};
use fontrules::{Config, MatchKind};

use crate::error::Error;

/// What one directory scan produced.
#[derive(Clone, Debug, Default)]
pub struct ScanOutcome {
    pub fonts: FontSet,
    pub subdirs: Vec<PathBuf>,
}

impl ScanOutcome {
    pub fn new(fonts: FontSet, subdirs: Vec<PathBuf>) -> ScanOutcome {
        ScanOutcome { fonts, subdirs }
    }
}

/// Extracts patterns from the font files in one directory.
///
/// Implementations populate at least `file`, `family`, `style`, `charset`,
/// `lang`, `weight`, `width`, `slant`, `spacing`, `outline`, `scalable`,
/// `color`, `variable` and `fonthashint` where the format supplies them.
pub trait FontScanner {
    fn scan_dir(&self, dir: &Path, config: &Config) -> Result<ScanOutcome, Error>;
}

/// Persists scan results per directory.
///
/// Both operations are best-effort: a read miss means "scan again" and a
/// failed write is dropped silently. Implementations serialise their own
/// concurrent writers.
pub trait CacheStore {
    fn read(&self, dir: &Path, config: &Config) -> Option<ScanOutcome>;
    fn write(&self, dir: &Path, config: &Config, outcome: &ScanOutcome);
}

/// A cache that never hits; every scan runs fresh.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCache;

impl CacheStore for NoCache {
    fn read(&self, _: &Path, _: &Config) -> Option<ScanOutcome> {
        None
    }

    fn write(&self, _: &Path, _: &Config, _: &ScanOutcome) {}
}

/// Scan every configured font directory, and the subdirectories each scan
/// reports, depth-first in declaration order.
///
/// Directories are deduplicated through their real (symlink-resolved)
/// paths, so loops in the directory graph terminate. Unreadable
/// directories are logged and skipped.
pub fn scan_font_dirs(
    config: &Config,
    scanner: &dyn FontScanner,
    cache: &dyn CacheStore,
) -> FontSet {
    let mut seen = HashSet::new();
    let mut fonts = FontSet::new();
    // a stack, so reverse to visit in declaration order
    let mut pending: Vec<PathBuf> = config
        .font_dirs
        .iter()
        .rev()
        .map(|dir| config.env.apply_sysroot(&dir.path))
        .collect();
    while let Some(dir) = pending.pop() {
        let real = std::fs::canonicalize(&dir).unwrap_or_else(|_| dir.clone());
        if !seen.insert(real) {
            continue;
        }
        let outcome = match cache.read(&dir, config) {
            Some(cached) => {
                log::debug!("cache hit for '{}'", dir.display());
                cached
            }
            None => match scan_one(&dir, config, scanner) {
                Ok(outcome) => {
                    cache.write(&dir, config, &outcome);
                    outcome
                }
                Err(err) => {
                    log::warn!("skipping '{}': {err}", dir.display());
                    continue;
                }
            },
        };
        for sub in outcome.subdirs.iter().rev() {
            pending.push(sub.clone());
        }
        fonts.fonts.extend(outcome.fonts.fonts);
    }
    fonts
}

/// One directory through the scanner, scan-kind rules and the filters.
fn scan_one(
    dir: &Path,
    config: &Config,
    scanner: &dyn FontScanner,
) -> Result<ScanOutcome, Error> {
    let scanned = scanner.scan_dir(dir, config)?;
    let mut fonts = FontSet::new();
    for mut font in scanned.fonts.fonts {
        config.substitute(&mut font, None, MatchKind::Scan);
        let file = file_of(&font).unwrap_or_else(|| dir.to_path_buf());
        if config.accept_font(&file, &font) {
            fonts.push(font);
        } else {
            log::debug!("'{}' rejected by selectfont", file.display());
        }
    }
    Ok(ScanOutcome::new(fonts, scanned.subdirs))
}

fn file_of(font: &Pattern) -> Option<PathBuf> {
    font.get(Object::FILE, 0)
        .and_then(Value::as_str)
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{cell::RefCell, collections::BTreeMap, fs};

    use conf_reader::parse_config_str;
    use pretty_assertions::assert_eq;

    fn font(family: &str, file: &Path) -> Pattern {
        let mut p = Pattern::new();
        p.add(Object::FAMILY, family.into());
        p.add(Object::FILE, file.to_string_lossy().as_ref().into());
        p
    }

    #[derive(Default)]
    struct MapScanner {
        dirs: BTreeMap<PathBuf, ScanOutcome>,
        calls: RefCell<Vec<PathBuf>>,
    }

    impl MapScanner {
        fn insert(&mut self, dir: &Path, outcome: ScanOutcome) {
            self.dirs.insert(dir.to_path_buf(), outcome);
        }
    }

    impl FontScanner for MapScanner {
        fn scan_dir(&self, dir: &Path, _: &Config) -> Result<ScanOutcome, Error> {
            self.calls.borrow_mut().push(dir.to_path_buf());
            Ok(self.dirs.get(dir).cloned().unwrap_or_default())
        }
    }

    #[derive(Default)]
    struct MapCache {
        dirs: RefCell<BTreeMap<PathBuf, ScanOutcome>>,
        writes: RefCell<usize>,
    }

    impl CacheStore for MapCache {
        fn read(&self, dir: &Path, _: &Config) -> Option<ScanOutcome> {
            self.dirs.borrow().get(dir).cloned()
        }

        fn write(&self, dir: &Path, _: &Config, outcome: &ScanOutcome) {
            *self.writes.borrow_mut() += 1;
            self.dirs
                .borrow_mut()
                .insert(dir.to_path_buf(), outcome.clone());
        }
    }

    fn config_with_dirs(dirs: &[&Path]) -> Config {
        let xml = dirs
            .iter()
            .map(|d| format!("<dir>{}</dir>", d.display()))
            .collect::<String>();
        let mut config = Config::default();
        parse_config_str(&mut config, &format!("<fontconfig>{xml}</fontconfig>"), "dirs.conf")
            .unwrap();
        config
    }

    fn families(set: &FontSet) -> Vec<&str> {
        set.iter()
            .filter_map(|font| font.get(Object::FAMILY, 0))
            .filter_map(Value::as_str)
            .collect()
    }

    #[test]
    fn walks_subdirectories_in_order() {
        let root = tempfile::tempdir().unwrap();
        let top = root.path().join("fonts");
        let sub = top.join("extra");
        fs::create_dir_all(&sub).unwrap();

        let mut scanner = MapScanner::default();
        let mut top_fonts = FontSet::new();
        top_fonts.push(font("Top", &top.join("top.otf")));
        scanner.insert(&top, ScanOutcome::new(top_fonts, vec![sub.clone()]));
        let mut sub_fonts = FontSet::new();
        sub_fonts.push(font("Sub", &sub.join("sub.otf")));
        scanner.insert(&sub, ScanOutcome::new(sub_fonts, vec![]));

        let config = config_with_dirs(&[&top]);
        let fonts = scan_font_dirs(&config, &scanner, &NoCache);
        assert_eq!(families(&fonts), vec!["Top", "Sub"]);
        assert_eq!(*scanner.calls.borrow(), vec![top, sub]);
    }

    #[test]
    fn directory_loops_terminate() {
        let root = tempfile::tempdir().unwrap();
        let top = root.path().join("fonts");
        fs::create_dir_all(&top).unwrap();

        let mut scanner = MapScanner::default();
        // reports itself as its own subdirectory
        scanner.insert(&top, ScanOutcome::new(FontSet::new(), vec![top.clone()]));
        let config = config_with_dirs(&[&top]);
        let fonts = scan_font_dirs(&config, &scanner, &NoCache);
        assert!(fonts.is_empty());
        assert_eq!(scanner.calls.borrow().len(), 1);
    }

    #[test]
    fn cache_hit_skips_the_scanner() {
        let _ = env_logger::builder().is_test(true).try_init();
        let root = tempfile::tempdir().unwrap();
        let top = root.path().join("fonts");
        fs::create_dir_all(&top).unwrap();

        let mut scanner = MapScanner::default();
        let mut fonts = FontSet::new();
        fonts.push(font("Cached", &top.join("a.otf")));
        scanner.insert(&top, ScanOutcome::new(fonts, vec![]));

        let cache = MapCache::default();
        let config = config_with_dirs(&[&top]);

        let first = scan_font_dirs(&config, &scanner, &cache);
        assert_eq!(families(&first), vec!["Cached"]);
        assert_eq!(*cache.writes.borrow(), 1);

        let second = scan_font_dirs(&config, &scanner, &cache);
        assert_eq!(families(&second), vec!["Cached"]);
        // the second walk was served entirely from the cache
        assert_eq!(scanner.calls.borrow().len(), 1);
        assert_eq!(*cache.writes.borrow(), 1);
    }

    #[test]
    fn scan_rules_and_filters_apply() {
        let root = tempfile::tempdir().unwrap();
        let top = root.path().join("fonts");
        fs::create_dir_all(&top).unwrap();

        let mut scanner = MapScanner::default();
        let mut fonts = FontSet::new();
        fonts.push(font("Keep Me", &top.join("keep.otf")));
        fonts.push(font("Old Bitmap", &top.join("old.pcf")));
        scanner.insert(&top, ScanOutcome::new(fonts, vec![]));

        let mut config = Config::default();
        parse_config_str(
            &mut config,
            &format!(
                r#"<fontconfig>
  <dir>{}</dir>
  <selectfont><rejectfont><glob>*.pcf</glob></rejectfont></selectfont>
  <match target="scan">
    <test name="family"><string>Keep Me</string></test>
    <edit name="foundry"><string>tested</string></edit>
  </match>
</fontconfig>"#,
                top.display()
            ),
            "scan.conf",
        )
        .unwrap();

        let fonts = scan_font_dirs(&config, &scanner, &NoCache);
        assert_eq!(families(&fonts), vec!["Keep Me"]);
        assert_eq!(
            fonts.fonts[0].get(Object::FOUNDRY, 0),
            Some(&"tested".into())
        );
    }

    #[test]
    fn unreadable_directories_are_skipped() {
        struct FailScanner;
        impl FontScanner for FailScanner {
            fn scan_dir(&self, dir: &Path, _: &Config) -> Result<ScanOutcome, Error> {
                Err(Error::FileIo {
                    path: dir.to_path_buf(),
                    source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
                })
            }
        }
        let _ = env_logger::builder().is_test(true).try_init();
        let config = config_with_dirs(&[Path::new("/no/such/dir")]);
        let fonts = scan_font_dirs(&config, &FailScanner, &NoCache);
        assert!(fonts.is_empty());
    }
}
