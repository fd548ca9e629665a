//! Turns the active note into an Outlook draft.

use log::debug;
use serde::Serialize;

use crate::bridge::{DispatchHandle, MailBridge};
use crate::error::Result;
use crate::render::MarkdownRenderer;
use crate::settings::Settings;
use crate::workspace::Workspace;

/// Title and rendered body of the active note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteDraft {
    pub title: String,
    pub html_body: String,
}

/// Reads the active note, renders it and hands it to the mail bridge.
pub struct EmailComposer<'a> {
    renderer: &'a dyn MarkdownRenderer,
    bridge: &'a MailBridge,
}

impl<'a> EmailComposer<'a> {
    pub fn new(renderer: &'a dyn MarkdownRenderer, bridge: &'a MailBridge) -> Self {
        Self { renderer, bridge }
    }

    /// Render the active note. `Ok(None)` when no markdown note is open.
    pub fn draft(&self, workspace: &dyn Workspace) -> Result<Option<NoteDraft>> {
        let Some(file) = workspace.active_file() else {
            debug!("no active file, nothing to send");
            return Ok(None);
        };
        let Some(text) = workspace.active_markdown_text()? else {
            debug!("{} is not open in a markdown view", file.path.display());
            return Ok(None);
        };

        let html_body = self.renderer.render(&text)?;
        Ok(Some(NoteDraft {
            title: file.basename,
            html_body,
        }))
    }

    /// Open the active note as a new message. The dispatch is not awaited.
    ///
    /// Must run inside a tokio runtime, otherwise nothing is dispatched and
    /// [`Error::Dispatch`](crate::error::Error::Dispatch) is returned.
    pub fn compose_and_send(
        &self,
        workspace: &dyn Workspace,
        settings: &Settings,
    ) -> Result<Option<DispatchHandle>> {
        let Some(draft) = self.draft(workspace)? else {
            return Ok(None);
        };
        let handle = self
            .bridge
            .dispatch(&draft.title, &draft.html_body, settings)?;
        Ok(Some(handle))
    }
}
