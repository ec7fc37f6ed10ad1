use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        Ok(Self { figment })
    }

    /// Single-file config, still overridable through `APP_*` variables.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::NotFound(path.display().to_string()));
        }
        let figment = Figment::new().merge(Toml::file(path)).merge(Env::prefixed("APP_").split("__"));
        Ok(Self { figment })
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::InvalidConfig(format!("Failed to get '{}': {}", key, e)))
    }

    /// Preparation settings under `[prep]`; defaults when the table is absent.
    pub fn prep_settings(&self) -> Result<PrepSettings> {
        let settings = if self.figment.find_value("prep").is_ok() {
            self.get::<PrepSettings>("prep")?
        } else {
            PrepSettings::default()
        };
        settings.validate()?;
        Ok(settings)
    }
}

/// A heading level the splitter cuts on, e.g. `##` labelled `二级标题`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderLevel {
    pub marker: String,
    pub label: String,
}

/// Maps a directory name appearing in a recipe path to a category label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub token: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepSettings {
    pub data_dir: String,
    pub extensions: Vec<String>,
    pub headers: Vec<HeaderLevel>,
    pub categories: Vec<CategoryRule>,
    pub default_category: String,
}

impl Default for PrepSettings {
    fn default() -> Self {
        let header = |marker: &str, label: &str| HeaderLevel { marker: marker.to_string(), label: label.to_string() };
        let rule = |token: &str, label: &str| CategoryRule { token: token.to_string(), label: label.to_string() };
        Self {
            data_dir: "data".to_string(),
            extensions: vec!["md".to_string()],
            headers: vec![header("#", "主标题"), header("##", "二级标题"), header("###", "三级标题")],
            categories: vec![
                rule("meat_dish", "荤菜"),
                rule("vegetable_dish", "素菜"),
                rule("soup", "汤品"),
                rule("dessert", "甜品"),
                rule("breakfast", "早餐"),
                rule("staple", "主食"),
                rule("aquatic", "水产"),
                rule("condiment", "调料"),
                rule("drink", "饮品"),
                rule("semi-finished", "半成品"),
            ],
            default_category: "其他".to_string(),
        }
    }
}

impl PrepSettings {
    pub fn validate(&self) -> Result<()> {
        if self.headers.is_empty() {
            return Err(Error::InvalidConfig("prep.headers must not be empty".into()));
        }
        let mut seen = HashSet::new();
        for h in &self.headers {
            if h.marker.is_empty() || !h.marker.chars().all(|c| c == '#') {
                return Err(Error::InvalidConfig(format!("header marker '{}' must be one or more '#'", h.marker)));
            }
            if !seen.insert(h.marker.as_str()) {
                return Err(Error::InvalidConfig(format!("duplicate header marker '{}'", h.marker)));
            }
        }
        if self.extensions.is_empty() {
            return Err(Error::InvalidConfig("prep.extensions must not be empty".into()));
        }
        if self.default_category.is_empty() {
            return Err(Error::InvalidConfig("prep.default_category must not be empty".into()));
        }
        Ok(())
    }

    /// `data_dir` expanded and anchored at `base` when relative.
    pub fn data_dir(&self, base: &Path) -> PathBuf { resolve_with_base(base, &self.data_dir) }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let s = PrepSettings::default();
        s.validate().unwrap();
        assert_eq!(s.headers.len(), 3);
        assert_eq!(s.headers[2].marker, "###");
        assert_eq!(s.default_category, "其他");
    }

    #[test]
    fn rejects_bad_markers() {
        let mut s = PrepSettings::default();
        s.headers.push(HeaderLevel { marker: "-".into(), label: "x".into() });
        assert!(matches!(s.validate(), Err(Error::InvalidConfig(_))));

        let mut s = PrepSettings::default();
        s.headers.push(HeaderLevel { marker: "#".into(), label: "dup".into() });
        assert!(matches!(s.validate(), Err(Error::InvalidConfig(_))));

        let mut s = PrepSettings::default();
        s.headers.clear();
        assert!(s.validate().is_err());
    }

    #[test]
    fn reads_prep_table_and_env_overrides() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "recipes.toml",
                r##"
                [prep]
                data_dir = "corpus"
                extensions = ["md", "markdown"]

                [[prep.headers]]
                marker = "#"
                label = "title"
                "##,
            )?;
            jail.set_env("APP_PREP__DEFAULT_CATEGORY", "misc");

            let config = Config::from_file(Path::new("recipes.toml")).map_err(|e| e.to_string())?;
            let s = config.prep_settings().map_err(|e| e.to_string())?;
            assert_eq!(s.data_dir, "corpus");
            assert_eq!(s.extensions, vec!["md", "markdown"]);
            assert_eq!(s.headers, vec![HeaderLevel { marker: "#".into(), label: "title".into() }]);
            assert_eq!(s.default_category, "misc");
            // untouched tables keep their defaults
            assert_eq!(s.categories, PrepSettings::default().categories);
            Ok(())
        });
    }

    #[test]
    fn missing_prep_table_yields_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("empty.toml", "[other]\nkey = 1\n")?;
            let config = Config::from_file(Path::new("empty.toml")).map_err(|e| e.to_string())?;
            let s = config.prep_settings().map_err(|e| e.to_string())?;
            assert_eq!(s, PrepSettings::default());
            Ok(())
        });
    }

    #[test]
    fn resolves_relative_data_dir() {
        let s = PrepSettings { data_dir: "recipes".into(), ..PrepSettings::default() };
        assert_eq!(s.data_dir(Path::new("/srv")), PathBuf::from("/srv/recipes"));
        let s = PrepSettings { data_dir: "/abs/recipes".into(), ..PrepSettings::default() };
        assert_eq!(s.data_dir(Path::new("/srv")), PathBuf::from("/abs/recipes"));
    }
}
