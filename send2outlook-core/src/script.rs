//! AppleScript generation for the Outlook compose window.
//!
//! The generated script creates an outgoing message, attaches the default
//! recipients, then opens and activates it:
//!
//! ```text
//! tell application "Microsoft Outlook"
//! 	set emailSubject to "Notes"
//! 	set emailContent to "<p>Hello <em>world</em></p>\n"
//! 	set newEmail to make new outgoing message with properties {subject:emailSubject, content:emailContent}
//! 	make new recipient at newEmail with properties {email address:{address:"a@x.com"}}
//! 	make new cc recipient at newEmail with properties {email address:{address:"c@x.com"}}
//! 	open newEmail
//! 	activate
//! end tell
//! ```
//!
//! Subject and body are escaped for a double-quoted literal. Addresses are
//! inserted as typed in the settings, only trimmed.

use serde::Serialize;

use crate::settings::Settings;

/// A message ready to be turned into a script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComposedMessage {
    pub subject: String,
    pub html_body: String,
    pub recipients: Vec<String>,
    pub cc_recipients: Vec<String>,
}

impl ComposedMessage {
    /// Build a message addressed to the default recipients in `settings`.
    pub fn new(subject: &str, html_body: &str, settings: &Settings) -> Self {
        Self {
            subject: subject.to_string(),
            html_body: html_body.to_string(),
            recipients: settings.recipients(),
            cc_recipients: settings.cc_recipients(),
        }
    }

    /// Render the AppleScript that opens this message in `application`.
    pub fn to_script(&self, application: &str) -> String {
        let mut script = String::new();
        script.push_str(&format!("tell application \"{application}\"\n"));
        script.push_str(&format!(
            "\tset emailSubject to \"{}\"\n",
            escape_literal(&self.subject)
        ));
        script.push_str(&format!(
            "\tset emailContent to \"{}\"\n",
            escape_literal(&self.html_body)
        ));
        script.push_str(
            "\tset newEmail to make new outgoing message with properties {subject:emailSubject, content:emailContent}\n",
        );
        for addr in &self.recipients {
            script.push_str(&recipient_clause("recipient", addr));
        }
        for addr in &self.cc_recipients {
            script.push_str(&recipient_clause("cc recipient", addr));
        }
        script.push_str("\topen newEmail\n");
        script.push_str("\tactivate\n");
        script.push_str("end tell");
        script
    }
}

fn recipient_clause(kind: &str, addr: &str) -> String {
    format!("\tmake new {kind} at newEmail with properties {{email address:{{address:\"{addr}\"}}}}\n")
}

/// Escape text for a double-quoted script literal on a single line.
pub fn escape_literal(text: &str) -> String {
    text.replace('"', "\\\"").replace('\n', "\\n")
}

/// Shell command running `script` through `runner -e`.
///
/// The script is wrapped in single quotes; embedded single quotes are closed,
/// escaped and reopened so the shell passes the script through verbatim.
pub fn shell_command_line(runner: &str, script: &str) -> String {
    format!("{runner} -e '{}'", script.replace('\'', "'\\''"))
}
