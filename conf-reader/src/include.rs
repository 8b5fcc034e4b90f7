//! Loading config files and directories, with cycle suppression.

use std::{fs, path::Path};

use fontrules::Config;

use crate::{error::ConfError, parse::Parser};

/// Load a config file or directory into `config`.
///
/// Missing paths are an error unless `ignore_missing`. Files already
/// loaded (compared by canonical path, so symlink cycles collapse) are
/// silently skipped.
pub(crate) fn load(config: &mut Config, path: &Path, ignore_missing: bool) -> Result<(), ConfError> {
    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(_) => {
            if ignore_missing {
                log::debug!("ignoring missing include '{}'", path.display());
                return Ok(());
            }
            return Err(ConfError::IncludeMissing(path.to_path_buf()));
        }
    };
    if meta.is_dir() {
        load_dir(config, path)
    } else {
        load_file(config, path)
    }
}

pub(crate) fn load_file(config: &mut Config, path: &Path) -> Result<(), ConfError> {
    let real = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    if !config.mark_parsed(real) {
        log::debug!("skipping already loaded '{}'", path.display());
        return Ok(());
    }
    let xml = fs::read_to_string(path).map_err(|source| ConfError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "?".to_string());
    let base_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    Parser::new(config, &name, path.display().to_string(), base_dir).run(&xml)
}

/// Load every `[0-9]*.conf` file in the directory, in name order.
fn load_dir(config: &mut Config, dir: &Path) -> Result<(), ConfError> {
    config.config_dirs.push(dir.to_path_buf());
    let entries = fs::read_dir(dir).map_err(|source| ConfError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ConfError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.ends_with(".conf") && name.starts_with(|c: char| c.is_ascii_digit()) {
            files.push(entry.path());
        }
    }
    files.sort();
    for file in files {
        load_file(config, &file)?;
    }
    Ok(())
}
