//! A font configuration and matching library.
//!
//! Given a query pattern and a set of font patterns, this crate rewrites
//! both through user-configured substitution rules, picks the closest
//! candidate (or sorts the whole set) and composes the pattern a
//! rasterizer consumes. Font files and on-disk caches are reached through
//! the collaborator traits in [`scan`].
//!
//! The usual flow:
//!
//! ```no_run
//! use fontsel::{FontSet, MatchKind};
//!
//! let config = fontsel::init()?;
//! let fonts = FontSet::new(); // from scan_font_dirs with your scanner
//!
//! let mut query = fontsel::parse_name("DejaVu Sans-12:bold")?;
//! config.substitute(&mut query, None, MatchKind::Pattern);
//! let best = fontsel::match_font(&config, &query, &fonts);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod default;
mod discover;
mod error;
mod scan;

use std::collections::HashSet;

pub use default::default_config;
pub use discover::find_config_file;
pub use error::Error;
pub use scan::{scan_font_dirs, CacheStore, FontScanner, NoCache, ScanOutcome};

pub use conf_reader::{parse_config, parse_config_file, parse_config_str, ConfError};
pub use fontmatch::{match_best, prepare_render, score, sort, Priority, Score};
pub use fontpat::{
    name::{parse_name, unparse_name},
    Binding, BoundValue, CharSet, FontSet, LangSet, Matrix, Object, Pattern, Range, Tri, Value,
};
pub use fontrules::{config::EnvValues, Config, MatchKind};

use fontrules::expr::{compare_value, BinaryOp};

/// Build a config from the configuration file the environment selects.
///
/// `FONTCONFIG_FILE` short-circuits the search, then `FONTCONFIG_PATH`
/// entries, the XDG config home and the system directory are tried in
/// order.
pub fn load_config() -> Result<Config, Error> {
    let env = EnvValues::capture();
    match discover::find_config_file(&env) {
        Some(file) => Ok(conf_reader::parse_config(&file)?),
        None => Err(Error::NoConfigFile),
    }
}

/// Like [`load_config`], but a missing configuration file degrades to an
/// empty config rather than an error.
pub fn init() -> Result<Config, Error> {
    match load_config() {
        Ok(config) => Ok(config),
        Err(Error::NoConfigFile) => {
            log::warn!("no configuration file found, continuing with an empty config");
            Ok(Config::new())
        }
        Err(err) => Err(err),
    }
}

/// The best candidate for `query`, composed into a render pattern.
///
/// The query is expected to have been through [`Config::substitute`] with
/// [`MatchKind::Pattern`] already. `None` is a valid outcome, not an
/// error: nothing in `fonts` was comparable with the query.
pub fn match_font(config: &Config, query: &Pattern, fonts: &FontSet) -> Option<Pattern> {
    let (best, score) = match_best(query, fonts.iter())?;
    log::debug!(
        "matched '{}' for '{}' ({score:?})",
        unparse_name(best),
        unparse_name(query)
    );
    Some(prepare_render(config, query, best))
}

/// Fonts matching `filter`, restricted to `objects` and deduplicated.
///
/// A font matches when every filter value finds an equal (listing-equal,
/// so case-folded for strings) value on the font. Duplicates are detected
/// by hashing the restricted patterns.
pub fn list(fonts: &FontSet, filter: &Pattern, objects: &[Object]) -> FontSet {
    let mut seen = HashSet::new();
    let mut out = FontSet::new();
    for font in fonts.iter() {
        if !list_matches(filter, font) {
            continue;
        }
        let trimmed = font.filter(objects);
        if seen.insert(trimmed.hash(None)) {
            out.push(trimmed);
        }
    }
    out
}

fn list_matches(filter: &Pattern, font: &Pattern) -> bool {
    filter.objects().all(|object| {
        filter.values(object).iter().all(|want| {
            font.values(object)
                .iter()
                .any(|have| compare_value(BinaryOp::Listing, &have.value, &want.value, false))
        })
    })
}
