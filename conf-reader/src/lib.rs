//! Parsing fontsel XML configuration.
//!
//! A config file is a `<fontconfig>` document mixing directory
//! declarations, `<include>` composition, font selection filters and
//! `<match>`/`<alias>` rewrite rules. Parsing appends to an existing
//! [`Config`]; rule sets land in file order, includes depth-first.

mod error;
mod include;
mod parse;

use std::path::Path;

pub use error::ConfError;
use fontrules::Config;

/// Parse one config file (or directory of `NN*.conf` files) into `config`.
pub fn parse_config_file(config: &mut Config, path: &Path) -> Result<(), ConfError> {
    include::load(config, path, false)
}

/// Parse config XML from memory; `name` labels the resulting rule set.
pub fn parse_config_str(config: &mut Config, xml: &str, name: &str) -> Result<(), ConfError> {
    parse::Parser::new(config, name, name.to_string(), Default::default()).run(xml)
}

/// Build a fresh config (capturing the environment) from one file.
pub fn parse_config(path: &Path) -> Result<Config, ConfError> {
    let mut config = Config::new();
    parse_config_file(&mut config, path)?;
    Ok(config)
}
