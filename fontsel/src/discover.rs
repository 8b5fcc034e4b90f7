//! Locating the main configuration file from the environment.

use std::path::PathBuf;

use fontrules::config::EnvValues;

const CONFIG_FILE_NAME: &str = "fonts.conf";
const SYSTEM_CONFIG_DIR: &str = "/etc/fonts";

/// Candidate directories searched for `fonts.conf`, most specific first:
/// `FONTCONFIG_PATH` entries, the XDG config home, then the system dir.
fn search_dirs(env: &EnvValues) -> Vec<PathBuf> {
    let mut dirs = env.config_paths.clone();
    if let Some(xdg) = &env.xdg_config_home {
        dirs.push(xdg.join("fontsel"));
    }
    dirs.push(PathBuf::from(SYSTEM_CONFIG_DIR));
    dirs
}

/// The config file this environment selects, if any exists on disk.
///
/// `FONTCONFIG_FILE` short-circuits the search; it may be `~`-prefixed.
pub fn find_config_file(env: &EnvValues) -> Option<PathBuf> {
    if let Some(file) = &env.config_file {
        let file = env.expand_home(file)?;
        let file = env.apply_sysroot(&file);
        return file.exists().then_some(file);
    }
    for dir in search_dirs(env) {
        let candidate = env.apply_sysroot(&dir.join(CONFIG_FILE_NAME));
        if candidate.exists() {
            return Some(candidate);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn fontconfig_file_overrides_search() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("custom.conf");
        fs::write(&file, "<fontconfig/>").unwrap();
        let env = EnvValues {
            config_file: Some(file.clone()),
            ..EnvValues::default()
        };
        assert_eq!(find_config_file(&env), Some(file));
    }

    #[test]
    fn missing_override_finds_nothing() {
        let env = EnvValues {
            config_file: Some(PathBuf::from("/no/such/file.conf")),
            ..EnvValues::default()
        };
        assert_eq!(find_config_file(&env), None);
    }

    #[test]
    fn fontconfig_path_searched_in_order() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        fs::write(second.path().join(CONFIG_FILE_NAME), "<fontconfig/>").unwrap();
        let env = EnvValues {
            config_paths: vec![first.path().to_path_buf(), second.path().to_path_buf()],
            ..EnvValues::default()
        };
        assert_eq!(
            find_config_file(&env),
            Some(second.path().join(CONFIG_FILE_NAME))
        );

        fs::write(first.path().join(CONFIG_FILE_NAME), "<fontconfig/>").unwrap();
        assert_eq!(
            find_config_file(&env),
            Some(first.path().join(CONFIG_FILE_NAME))
        );
    }

    #[test]
    fn sysroot_applies_to_candidates() {
        let root = tempfile::tempdir().unwrap();
        let inner = root.path().join("etc/fonts");
        fs::create_dir_all(&inner).unwrap();
        fs::write(inner.join(CONFIG_FILE_NAME), "<fontconfig/>").unwrap();
        let env = EnvValues {
            sysroot: Some(root.path().to_path_buf()),
            ..EnvValues::default()
        };
        assert_eq!(
            find_config_file(&env),
            Some(inner.join(CONFIG_FILE_NAME))
        );
    }
}
