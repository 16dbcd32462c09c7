//! Internationalization (i18n) module for drivebot.
//!
//! Reply texts live in TOML resources. The `pt` and `en` locales are
//! compiled into the binary; a directory of `{locale}.toml` files can
//! override individual keys.
//!
//! # Usage
//!
//! ```
//! use drivebot::i18n::I18n;
//!
//! let i18n = I18n::builtin("en").unwrap();
//! let text = i18n.t_with("folder.set", &[("folder", "Fotos/2024")]);
//! assert_eq!(text, "📂 Folder set: Fotos/2024");
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use thiserror::Error;

/// Default locale.
pub const DEFAULT_LOCALE: &str = "pt";

/// Locales compiled into the binary.
const BUILTIN_LOCALES: &[(&str, &str)] = &[
    ("pt", include_str!("../../locales/pt.toml")),
    ("en", include_str!("../../locales/en.toml")),
];

/// I18n-related errors.
#[derive(Error, Debug)]
pub enum I18nError {
    /// Failed to read locale file.
    #[error("Failed to read locale file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML.
    #[error("Failed to parse locale file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Locale not found.
    #[error("Locale not found: {0}")]
    LocaleNotFound(String),
}

/// Result type for i18n operations.
pub type Result<T> = std::result::Result<T, I18nError>;

/// Translated message catalogue for one locale.
#[derive(Debug, Clone)]
pub struct I18n {
    /// Current locale (e.g., "pt", "en").
    locale: String,
    /// Flattened message map (key -> value).
    messages: HashMap<String, String>,
}

impl I18n {
    /// Load one of the compiled-in locales.
    pub fn builtin(locale: &str) -> Result<Self> {
        let (_, content) = BUILTIN_LOCALES
            .iter()
            .find(|(name, _)| *name == locale)
            .ok_or_else(|| I18nError::LocaleNotFound(locale.to_string()))?;
        Self::from_str(locale, content)
    }

    /// Load `{locale}.toml` from a directory.
    pub fn load<P: AsRef<Path>>(locale: &str, locales_dir: P) -> Result<Self> {
        let path = locales_dir.as_ref().join(format!("{locale}.toml"));

        if !path.exists() {
            return Err(I18nError::LocaleNotFound(locale.to_string()));
        }

        let content = fs::read_to_string(&path)?;
        Self::from_str(locale, &content)
    }

    /// Load a locale, layering a directory override on top of the built-in texts.
    ///
    /// A locale that only exists in the directory is accepted too.
    pub fn resolve<P: AsRef<Path>>(locale: &str, locales_dir: Option<P>) -> Result<Self> {
        let builtin = Self::builtin(locale);
        let Some(dir) = locales_dir else {
            return builtin;
        };

        let overrides = Self::load(locale, dir)?;
        match builtin {
            Ok(mut base) => {
                base.merge(&overrides);
                Ok(base)
            }
            Err(_) => Ok(overrides),
        }
    }

    /// Create an I18n instance from a TOML string.
    pub fn from_str(locale: &str, content: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(content)?;

        let mut messages = HashMap::new();
        flatten_toml("", &toml::Value::Table(table), &mut messages);

        Ok(Self {
            locale: locale.to_string(),
            messages,
        })
    }

    /// Create an empty I18n instance.
    ///
    /// All translations will return the key itself.
    pub fn empty(locale: &str) -> Self {
        Self {
            locale: locale.to_string(),
            messages: HashMap::new(),
        }
    }

    /// Get the current locale.
    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Get the number of loaded messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if no messages are loaded.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Translate a key to the current locale.
    ///
    /// If the key is not found, returns the key itself.
    pub fn t<'a>(&'a self, key: &'a str) -> &'a str {
        self.messages.get(key).map(|s| s.as_str()).unwrap_or(key)
    }

    /// Translate a key with parameter substitution.
    ///
    /// Parameters in the translation are marked as `{{name}}` and replaced
    /// with the provided values.
    pub fn t_with(&self, key: &str, params: &[(&str, &str)]) -> String {
        let mut result = self.t(key).to_string();

        for (name, value) in params {
            let placeholder = format!("{{{{{name}}}}}");
            result = result.replace(&placeholder, value);
        }

        result
    }

    /// Check if a translation key exists.
    pub fn has_key(&self, key: &str) -> bool {
        self.messages.contains_key(key)
    }

    /// Merge another I18n instance into this one.
    ///
    /// Messages from the other instance override existing ones.
    pub fn merge(&mut self, other: &I18n) {
        for (key, value) in &other.messages {
            self.messages.insert(key.clone(), value.clone());
        }
    }
}

impl Default for I18n {
    fn default() -> Self {
        Self::builtin(DEFAULT_LOCALE).unwrap_or_else(|_| Self::empty(DEFAULT_LOCALE))
    }
}

/// Flatten a TOML value into a HashMap with dot-separated keys.
fn flatten_toml(prefix: &str, value: &toml::Value, map: &mut HashMap<String, String>) {
    match value {
        toml::Value::Table(table) => {
            for (key, val) in table {
                let new_prefix = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_toml(&new_prefix, val, map);
            }
        }
        toml::Value::String(s) => {
            map.insert(prefix.to_string(), s.clone());
        }
        toml::Value::Integer(i) => {
            map.insert(prefix.to_string(), i.to_string());
        }
        toml::Value::Float(f) => {
            map.insert(prefix.to_string(), f.to_string());
        }
        toml::Value::Boolean(b) => {
            map.insert(prefix.to_string(), b.to_string());
        }
        toml::Value::Array(_) => {
            // Arrays are not supported for translations
        }
        toml::Value::Datetime(dt) => {
            map.insert(prefix.to_string(), dt.to_string());
        }
    }
}
