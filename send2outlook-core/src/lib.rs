//! send2outlook-core: Core library for send2outlook.
//!
//! Takes the note that is open in the host, renders its markdown to HTML and
//! asks Microsoft Outlook to open a pre-filled compose window. This crate
//! provides:
//! - Settings storage (default recipient and cc lists)
//! - Markdown rendering
//! - AppleScript generation and dispatch to the mail client
//! - The composer tying the active note to the mail client
//! - Command and menu registration for the host
//! - Configuration and path management

pub mod bridge;
pub mod composer;
pub mod config;
pub mod error;
pub mod paths;
pub mod render;
pub mod script;
pub mod settings;
pub mod surface;
pub mod workspace;

pub use bridge::{
    DispatchHandle, DispatchOutcome, MailBridge, Notifier, PreparedDispatch, ScriptRunner,
    ShellRunner,
};
pub use composer::{EmailComposer, NoteDraft};
pub use config::{AppConfig, MailClientConfig, MarkdownConfig};
pub use error::{Error, Result};
pub use paths::AppPaths;
pub use render::{CommonMarkRenderer, MarkdownRenderer, html_to_text};
pub use script::ComposedMessage;
pub use settings::{JsonDataFile, PluginData, SettingField, Settings, SettingsStore};
pub use surface::{Action, CommandSurface, Registry};
pub use workspace::{ActiveFile, FileWorkspace, Workspace};
