//! Config state: rule sets, directory lists, font filters and the
//! environment captured when the config was built.

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use indexmap::IndexMap;
use smol_str::SmolStr;

use fontpat::{langset, Object, Pattern};

use crate::{
    error::Error,
    expr::{compare_value, BinaryOp},
    rules::{MatchKind, RuleSet},
};

/// A font directory plus its optional cache salt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FontDir {
    pub path: PathBuf,
    pub salt: Option<SmolStr>,
}

/// A directory served from somewhere else on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemapDir {
    pub path: PathBuf,
    pub as_path: PathBuf,
    pub salt: Option<SmolStr>,
}

/// Environment read once at config construction.
#[derive(Clone, Debug, Default)]
pub struct EnvValues {
    pub home: Option<PathBuf>,
    pub sysroot: Option<PathBuf>,
    pub xdg_cache_home: Option<PathBuf>,
    pub xdg_config_home: Option<PathBuf>,
    pub xdg_data_home: Option<PathBuf>,
    pub config_file: Option<PathBuf>,
    pub config_paths: Vec<PathBuf>,
    pub default_langs: Vec<SmolStr>,
    pub prgname: Option<SmolStr>,
}

impl EnvValues {
    /// Capture the process environment.
    pub fn capture() -> EnvValues {
        let home = std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .map(PathBuf::from);
        let xdg = |var: &str, fallback: &str| -> Option<PathBuf> {
            std::env::var_os(var)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .or_else(|| home.as_ref().map(|h| h.join(fallback)))
        };
        EnvValues {
            xdg_cache_home: xdg("XDG_CACHE_HOME", ".cache"),
            xdg_config_home: xdg("XDG_CONFIG_HOME", ".config"),
            xdg_data_home: xdg("XDG_DATA_HOME", ".local/share"),
            sysroot: std::env::var_os("FONTCONFIG_SYSROOT")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            config_file: std::env::var_os("FONTCONFIG_FILE")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            config_paths: std::env::var("FONTCONFIG_PATH")
                .ok()
                .map(|raw| raw.split(':').map(PathBuf::from).collect())
                .unwrap_or_default(),
            default_langs: default_langs_from_env(),
            prgname: prgname_from_process(),
            home,
        }
    }

    /// Expand a leading `~` against the captured home.
    pub fn expand_home(&self, path: &Path) -> Option<PathBuf> {
        match path.strip_prefix("~") {
            Ok(rest) => self.home.as_ref().map(|home| home.join(rest)),
            Err(_) => Some(path.to_path_buf()),
        }
    }

    /// Prepend the sysroot, if one is set.
    pub fn apply_sysroot(&self, path: &Path) -> PathBuf {
        match &self.sysroot {
            Some(root) if path.is_absolute() => {
                let mut out = root.clone();
                out.push(path.strip_prefix("/").unwrap_or(path));
                out
            }
            _ => path.to_path_buf(),
        }
    }
}

/// First non-empty of `FC_LANG`, `LC_ALL`, `LC_CTYPE`, `LANG`, split on
/// `:` and normalised; `en` if nothing usable.
fn default_langs_from_env() -> Vec<SmolStr> {
    let raw = ["FC_LANG", "LC_ALL", "LC_CTYPE", "LANG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|v| !v.is_empty());
    let mut langs: Vec<SmolStr> = raw
        .as_deref()
        .unwrap_or("")
        .split(':')
        .filter_map(langset::normalize)
        .collect();
    langs.dedup();
    if langs.is_empty() {
        langs.push(SmolStr::new("en"));
    }
    langs
}

fn prgname_from_process() -> Option<SmolStr> {
    std::env::current_exe()
        .ok()
        .as_deref()
        .and_then(Path::file_stem)
        .and_then(|stem| stem.to_str())
        .map(SmolStr::new)
}

/// Everything the substitution and match layers need to know.
#[derive(Debug, Default)]
pub struct Config {
    pub rule_sets: Vec<RuleSet>,
    pub config_dirs: Vec<PathBuf>,
    pub font_dirs: Vec<FontDir>,
    pub cache_dirs: Vec<PathBuf>,
    pub remap_dirs: Vec<RemapDir>,
    pub accept_globs: Vec<String>,
    pub reject_globs: Vec<String>,
    pub accept_patterns: Vec<Pattern>,
    pub reject_patterns: Vec<Pattern>,
    /// Seconds between directory rescans, if configured.
    pub rescan_interval: Option<u32>,
    /// Largest test count seen in any directive, for scratch sizing.
    pub max_objects: usize,
    pub env: EnvValues,
    custom_objects: IndexMap<SmolStr, Object>,
    seen_files: HashSet<PathBuf>,
}

impl Config {
    /// An empty config capturing the current environment.
    pub fn new() -> Config {
        Config {
            env: EnvValues::capture(),
            ..Config::default()
        }
    }

    pub fn add_rule_set(&mut self, rule_set: RuleSet) {
        self.max_objects = self.max_objects.max(rule_set.max_tests());
        self.rule_sets.push(rule_set);
    }

    /// Resolve an object name, builtins first, then this config's customs.
    pub fn lookup_object(&self, name: &str) -> Option<Object> {
        Object::builtin_from_name(name).or_else(|| self.custom_objects.get(name).copied())
    }

    /// Register (or find) a custom object.
    pub fn register_custom(&mut self, name: &str) -> Result<Object, Error> {
        if let Some(object) = self.lookup_object(name) {
            return Ok(object);
        }
        let next = self.custom_objects.len();
        if Object::FIRST_CUSTOM.raw() as usize + next > u16::MAX as usize {
            return Err(Error::CustomObjectOverflow);
        }
        let object = Object::custom(next);
        self.custom_objects.insert(SmolStr::new(name), object);
        Ok(object)
    }

    /// Name for any object this config knows about.
    pub fn object_name(&self, object: Object) -> Option<&str> {
        if let Some(name) = object.name() {
            return Some(name);
        }
        self.custom_objects
            .iter()
            .find(|(_, o)| **o == object)
            .map(|(name, _)| name.as_str())
    }

    /// Record a config file as parsed; false if it was seen before.
    pub fn mark_parsed(&mut self, real_path: PathBuf) -> bool {
        self.seen_files.insert(real_path)
    }

    /// Apply this config's rule sets to a pattern. See [`crate::subst`].
    pub fn substitute(
        &self,
        pattern: &mut Pattern,
        companion: Option<&Pattern>,
        kind: MatchKind,
    ) {
        crate::subst::substitute(self, pattern, companion, kind);
    }

    /// Should a scanned font with this file name and pattern be kept?
    pub fn accept_font(&self, file: &Path, font: &Pattern) -> bool {
        let name = file.to_string_lossy();
        if self.reject_globs.iter().any(|g| glob_match(g, &name)) {
            return false;
        }
        if self
            .reject_patterns
            .iter()
            .any(|filter| pattern_matches(filter, font))
        {
            return false;
        }
        let accepted_by_glob = self.accept_globs.iter().any(|g| glob_match(g, &name));
        let accepted_by_pattern = self
            .accept_patterns
            .iter()
            .any(|filter| pattern_matches(filter, font));
        if self.accept_globs.is_empty() && self.accept_patterns.is_empty() {
            return true;
        }
        accepted_by_glob || accepted_by_pattern
    }
}

/// Shell-style glob over a path: `*` and `?` wildcards.
pub fn glob_match(glob: &str, name: &str) -> bool {
    fn matches(glob: &[u8], name: &[u8]) -> bool {
        match (glob.first(), name.first()) {
            (None, None) => true,
            (Some(b'*'), _) => {
                matches(&glob[1..], name)
                    || (!name.is_empty() && matches(glob, &name[1..]))
            }
            (Some(b'?'), Some(_)) => matches(&glob[1..], &name[1..]),
            (Some(g), Some(n)) if g == n => matches(&glob[1..], &name[1..]),
            _ => false,
        }
    }
    matches(glob.as_bytes(), name.as_bytes())
}

/// Every value in `filter` must match some value of the same object in
/// `font`.
fn pattern_matches(filter: &Pattern, font: &Pattern) -> bool {
    filter.objects().all(|object| {
        filter.values(object).iter().all(|want| {
            font.values(object)
                .iter()
                .any(|have| compare_value(BinaryOp::Listing, &have.value, &want.value, false))
        })
    })
}
