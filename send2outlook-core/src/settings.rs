//! Persisted user settings: the default recipient and cc lists.
//!
//! Settings are stored as a small JSON object with camelCase keys:
//!
//! ```text
//! {
//!   "defaultRecipient": "alice@example.com; bob@example.com",
//!   "defaultCc": ""
//! }
//! ```
//!
//! Both fields hold semicolon-delimited address lists. Addresses are not
//! validated.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Separator between addresses in a settings field.
pub const ADDRESS_SEPARATOR: char = ';';

/// User settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Default "to" recipients, semicolon-delimited.
    pub default_recipient: String,
    /// Default "cc" recipients, semicolon-delimited.
    pub default_cc: String,
}

impl Settings {
    /// Addresses from `default_recipient`.
    pub fn recipients(&self) -> Vec<String> {
        split_addresses(&self.default_recipient)
    }

    /// Addresses from `default_cc`.
    pub fn cc_recipients(&self) -> Vec<String> {
        split_addresses(&self.default_cc)
    }

    /// Read a single field.
    pub fn get(&self, field: SettingField) -> &str {
        match field {
            SettingField::DefaultRecipient => &self.default_recipient,
            SettingField::DefaultCc => &self.default_cc,
        }
    }

    /// Replace a single field.
    pub fn set(&mut self, field: SettingField, value: &str) {
        let slot = match field {
            SettingField::DefaultRecipient => &mut self.default_recipient,
            SettingField::DefaultCc => &mut self.default_cc,
        };
        *slot = value.to_string();
    }
}

/// Split a semicolon-delimited address list, trimming entries and dropping empty ones.
pub fn split_addresses(list: &str) -> Vec<String> {
    list.split(ADDRESS_SEPARATOR)
        .map(|addr| addr.trim().to_string())
        .filter(|addr| !addr.is_empty())
        .collect()
}

/// An editable field in the settings panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SettingField {
    DefaultRecipient,
    DefaultCc,
}

impl SettingField {
    /// All fields in panel order.
    pub fn all() -> &'static [SettingField] {
        &[SettingField::DefaultRecipient, SettingField::DefaultCc]
    }

    /// Key used on the command line.
    pub fn key(&self) -> &'static str {
        match self {
            SettingField::DefaultRecipient => "recipient",
            SettingField::DefaultCc => "cc",
        }
    }

    /// Key of the field in the stored JSON object.
    pub fn json_key(&self) -> &'static str {
        match self {
            SettingField::DefaultRecipient => "defaultRecipient",
            SettingField::DefaultCc => "defaultCc",
        }
    }

    /// Display name in the settings panel.
    pub fn name(&self) -> &'static str {
        match self {
            SettingField::DefaultRecipient => "Default recipient",
            SettingField::DefaultCc => "Default cc",
        }
    }

    /// Description shown under the name.
    pub fn description(&self) -> &'static str {
        match self {
            SettingField::DefaultRecipient => "Default recipient used when sending with Outlook",
            SettingField::DefaultCc => {
                "Default carbon-copy recipients used when sending with Outlook"
            }
        }
    }

    /// Placeholder for an empty input.
    pub fn placeholder(&self) -> &'static str {
        match self {
            SettingField::DefaultRecipient => "Set default recipient",
            SettingField::DefaultCc => "Set default cc",
        }
    }
}

impl std::fmt::Display for SettingField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl std::str::FromStr for SettingField {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "recipient" | "to" | "default-recipient" | "defaultrecipient" => {
                Ok(SettingField::DefaultRecipient)
            }
            "cc" | "default-cc" | "defaultcc" => Ok(SettingField::DefaultCc),
            _ => Err(format!("unknown setting: {} (valid: recipient, cc)", s)),
        }
    }
}

/// Key-value persistence provided by the host for plugin data.
pub trait PluginData {
    /// Load the stored value, `None` if nothing was saved yet.
    fn load_data(&self) -> Result<Option<Value>>;
    /// Replace the stored value.
    fn save_data(&self, data: &Value) -> Result<()>;
}

/// Plugin data kept in a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonDataFile {
    path: PathBuf,
}

impl JsonDataFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PluginData for JsonDataFile {
    fn load_data(&self) -> Result<Option<Value>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::Settings(format!(
                    "reading {}: {e}",
                    self.path.display()
                )));
            }
        };
        if text.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&text)?))
    }

    fn save_data(&self, data: &Value) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::Settings(format!("creating settings directory {parent:?}: {e}"))
            })?;
        }
        let mut content = serde_json::to_string_pretty(data)?;
        content.push('\n');
        fs::write(&self.path, content)
            .map_err(|e| Error::Settings(format!("writing {}: {e}", self.path.display())))
    }
}

/// Loads and saves [`Settings`] through a [`PluginData`] backend.
#[derive(Debug, Clone)]
pub struct SettingsStore<D> {
    data: D,
}

impl<D: PluginData> SettingsStore<D> {
    pub fn new(data: D) -> Self {
        Self { data }
    }

    pub fn backend(&self) -> &D {
        &self.data
    }

    /// Load settings, falling back to defaults for anything missing or unreadable.
    pub fn load(&self) -> Settings {
        match self.data.load_data() {
            Ok(Some(value)) => merge_defaults(value),
            Ok(None) => {
                debug!("no stored settings, using defaults");
                Settings::default()
            }
            Err(e) => {
                warn!("failed to load settings, using defaults: {e}");
                Settings::default()
            }
        }
    }

    /// Persist settings, overwriting whatever was stored.
    pub fn save(&self, settings: &Settings) -> Result<()> {
        let value = serde_json::to_value(settings)?;
        self.data.save_data(&value)
    }

    /// Change one field and save straight away.
    pub fn update(&self, settings: &mut Settings, field: SettingField, value: &str) -> Result<()> {
        settings.set(field, value);
        debug!("setting {field} updated");
        self.save(settings)
    }
}

/// Overlay stored fields on top of the defaults.
fn merge_defaults(value: Value) -> Settings {
    let mut settings = Settings::default();
    let Value::Object(map) = value else {
        warn!("stored settings are not an object, using defaults");
        return settings;
    };
    for field in SettingField::all() {
        let key = field.json_key();
        match map.get(key) {
            Some(Value::String(s)) => settings.set(*field, s),
            Some(Value::Null) | None => {}
            Some(other) => warn!("ignoring non-string value for {key}: {other}"),
        }
    }
    settings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use tempfile::TempDir;

    #[derive(Default)]
    struct MemoryData {
        value: RefCell<Option<Value>>,
        saves: RefCell<usize>,
    }

    impl PluginData for MemoryData {
        fn load_data(&self) -> Result<Option<Value>> {
            Ok(self.value.borrow().clone())
        }

        fn save_data(&self, data: &Value) -> Result<()> {
            *self.value.borrow_mut() = Some(data.clone());
            *self.saves.borrow_mut() += 1;
            Ok(())
        }
    }

    struct BrokenData;

    impl PluginData for BrokenData {
        fn load_data(&self) -> Result<Option<Value>> {
            Err(Error::Settings("disk on fire".into()))
        }

        fn save_data(&self, _data: &Value) -> Result<()> {
            Err(Error::Settings("disk on fire".into()))
        }
    }

    #[test]
    fn test_split_empty() {
        assert!(split_addresses("").is_empty());
    }

    #[test]
    fn test_split_simple() {
        assert_eq!(split_addresses("a;b;c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_split_trims() {
        assert_eq!(split_addresses(" a ; b "), vec!["a", "b"]);
    }

    #[test]
    fn test_split_skips_blank_entries() {
        assert_eq!(split_addresses("a@x.com;; ;b@x.com;"), vec!["a@x.com", "b@x.com"]);
    }

    #[test]
    fn test_load_defaults_when_empty() {
        let store = SettingsStore::new(MemoryData::default());
        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn test_load_defaults_on_error() {
        let store = SettingsStore::new(BrokenData);
        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn test_load_merges_partial_data() {
        let data = MemoryData::default();
        *data.value.borrow_mut() = Some(serde_json::json!({
            "defaultCc": "c@x.com",
            "somethingElse": 3
        }));
        let settings = SettingsStore::new(data).load();
        assert_eq!(settings.default_recipient, "");
        assert_eq!(settings.default_cc, "c@x.com");
    }

    #[test]
    fn test_load_ignores_wrong_types() {
        let data = MemoryData::default();
        *data.value.borrow_mut() = Some(serde_json::json!({
            "defaultRecipient": 42,
            "defaultCc": "c@x.com"
        }));
        let settings = SettingsStore::new(data).load();
        assert_eq!(settings.default_recipient, "");
        assert_eq!(settings.default_cc, "c@x.com");
    }

    #[test]
    fn test_save_load_roundtrip() {
        let store = SettingsStore::new(MemoryData::default());
        let settings = Settings {
            default_recipient: "a@x.com;b@x.com".to_string(),
            default_cc: " c@x.com ".to_string(),
        };
        store.save(&settings).unwrap();
        let loaded = store.load();
        store.save(&loaded).unwrap();
        assert_eq!(store.load(), settings);
    }

    #[test]
    fn test_save_writes_camel_case() {
        let store = SettingsStore::new(MemoryData::default());
        store
            .save(&Settings {
                default_recipient: "a@x.com".to_string(),
                default_cc: String::new(),
            })
            .unwrap();
        let stored = store.backend().value.borrow().clone().unwrap();
        assert_eq!(stored["defaultRecipient"], "a@x.com");
        assert_eq!(stored["defaultCc"], "");
    }

    #[test]
    fn test_update_saves_each_edit() {
        let store = SettingsStore::new(MemoryData::default());
        let mut settings = store.load();
        store
            .update(&mut settings, SettingField::DefaultRecipient, "a@x.com")
            .unwrap();
        store
            .update(&mut settings, SettingField::DefaultCc, "c@x.com")
            .unwrap();
        assert_eq!(*store.backend().saves.borrow(), 2);
        assert_eq!(store.load(), settings);
    }

    #[test]
    fn test_update_propagates_save_error() {
        let store = SettingsStore::new(BrokenData);
        let mut settings = Settings::default();
        assert!(
            store
                .update(&mut settings, SettingField::DefaultCc, "c@x.com")
                .is_err()
        );
        assert_eq!(settings.default_cc, "c@x.com");
    }

    #[test]
    fn test_json_data_file_roundtrip() {
        let temp = TempDir::new().unwrap();
        let file = JsonDataFile::new(temp.path().join("plugin").join("data.json"));
        assert!(file.load_data().unwrap().is_none());

        let store = SettingsStore::new(file);
        let settings = Settings {
            default_recipient: "a@x.com".to_string(),
            default_cc: "c@x.com".to_string(),
        };
        store.save(&settings).unwrap();
        assert!(store.backend().path().exists());
        assert_eq!(store.load(), settings);
    }

    #[test]
    fn test_json_data_file_malformed_falls_back() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("data.json");
        fs::write(&path, "{not json").unwrap();
        let store = SettingsStore::new(JsonDataFile::new(&path));
        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn test_setting_field_parse() {
        assert_eq!("recipient".parse::<SettingField>(), Ok(SettingField::DefaultRecipient));
        assert_eq!("TO".parse::<SettingField>(), Ok(SettingField::DefaultRecipient));
        assert_eq!("cc".parse::<SettingField>(), Ok(SettingField::DefaultCc));
        assert!("bcc".parse::<SettingField>().is_err());
    }

    #[test]
    fn test_recipient_accessors() {
        let settings = Settings {
            default_recipient: "a@x.com; b@x.com".to_string(),
            default_cc: String::new(),
        };
        assert_eq!(settings.recipients(), vec!["a@x.com", "b@x.com"]);
        assert!(settings.cc_recipients().is_empty());
    }

    #[test]
    fn test_json_keys_match_stored_object() {
        let settings = Settings {
            default_recipient: "a@x.com".to_string(),
            default_cc: "c@x.com".to_string(),
        };
        let value = serde_json::to_value(&settings).unwrap();
        let map = value.as_object().unwrap();
        assert_eq!(map.len(), SettingField::all().len());
        for field in SettingField::all() {
            assert_eq!(
                map.get(field.json_key()).and_then(Value::as_str),
                Some(settings.get(*field)),
                "{field} is stored under a different key"
            );
        }
    }
}
