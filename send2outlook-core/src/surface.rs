//! Commands, menu entries and the settings tab offered to the host.

use serde::Serialize;

use crate::settings::SettingField;

/// Id of the send command.
pub const SEND_COMMAND_ID: &str = "send-to-outlook";

/// What a menu item or command does when triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    /// Open the active note as a new Outlook message.
    SendActiveNote,
}

/// Entry in the file context menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub title: String,
    pub icon: String,
    pub action: Action,
}

/// Named command in the host's command palette.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandSpec {
    pub id: String,
    pub name: String,
    pub action: Action,
}

/// A settings panel made of free-text fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettingTab {
    pub fields: Vec<SettingField>,
}

/// Registration points the host exposes.
pub trait CommandSurface {
    fn add_menu_item(&mut self, item: MenuItem);
    fn add_command(&mut self, command: CommandSpec);
    fn add_setting_tab(&mut self, tab: SettingTab);
}

/// Register the menu item, the command and the settings tab.
pub fn register(surface: &mut dyn CommandSurface) {
    surface.add_menu_item(MenuItem {
        title: "Send to Outlook".to_string(),
        icon: "clipboard-copy".to_string(),
        action: Action::SendActiveNote,
    });
    surface.add_command(CommandSpec {
        id: SEND_COMMAND_ID.to_string(),
        name: "Send To Outlook".to_string(),
        action: Action::SendActiveNote,
    });
    surface.add_setting_tab(SettingTab {
        fields: SettingField::all().to_vec(),
    });
}

/// Records registrations so a host can list and resolve them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Registry {
    pub menu_items: Vec<MenuItem>,
    pub commands: Vec<CommandSpec>,
    pub setting_tabs: Vec<SettingTab>,
}

impl Registry {
    /// A registry with everything from [`register`] in it.
    pub fn with_defaults() -> Self {
        let mut registry = Self::default();
        register(&mut registry);
        registry
    }

    /// Look up a command by id.
    pub fn resolve(&self, id: &str) -> Option<Action> {
        self.commands
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.action)
    }

    /// Action of the first menu item, the one a context-menu click triggers.
    pub fn menu_action(&self) -> Option<Action> {
        self.menu_items.first().map(|m| m.action)
    }
}

impl CommandSurface for Registry {
    fn add_menu_item(&mut self, item: MenuItem) {
        self.menu_items.push(item);
    }

    fn add_command(&mut self, command: CommandSpec) {
        self.commands.push(command);
    }

    fn add_setting_tab(&mut self, tab: SettingTab) {
        self.setting_tabs.push(tab);
    }
}
