//! Editor-side completion hand-off
//!
//! One instance per open document. Completion callbacks (reader thread)
//! deposit results into a locked mailbox; the UI loop drains it once per
//! frame and makes every popup decision with the lock already released.

use std::sync::{Arc, Mutex};

use crate::types::{CompletionItem, Position};

#[derive(Debug, Default)]
struct Inbox {
    pending: Vec<CompletionItem>,
    dirty: bool,
}

/// Shared staging slot between one document's completion callbacks and
/// its UI loop.
///
/// The `dirty` flag is the only signal that fresh results exist; it is
/// cleared in the same lock acquisition that removes them, so a deposit
/// racing a drain is either caught by that drain or by the next one;
/// it is never lost.
#[derive(Debug, Default)]
pub struct CompletionMailbox {
    inbox: Mutex<Inbox>,
}

impl CompletionMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Producer side: overwrite the staged results and mark them fresh.
    /// Called from the reader thread inside a completion callback.
    pub fn deposit(&self, items: Vec<CompletionItem>) {
        let mut inbox = self.inbox.lock().unwrap_or_else(|e| e.into_inner());
        inbox.pending = items;
        inbox.dirty = true;
    }

    /// Consumer side: take the staged results if any arrived since the
    /// last take.
    pub fn take(&self) -> Option<Vec<CompletionItem>> {
        let mut inbox = self.inbox.lock().unwrap_or_else(|e| e.into_inner());
        if !inbox.dirty {
            return None;
        }
        inbox.dirty = false;
        Some(std::mem::take(&mut inbox.pending))
    }
}

/// Per-document autocomplete state owned by the UI loop.
///
/// Only [`mailbox`](Self::mailbox) handles cross the thread boundary;
/// every other field belongs to the UI thread alone.
#[derive(Debug)]
pub struct AutocompleteState {
    mailbox: Arc<CompletionMailbox>,
    /// Committed items the popup renders from
    pub items: Vec<CompletionItem>,
    pub visible: bool,
    pub selected: usize,
    /// Cursor position the active request was issued at
    pub trigger: Position,
    /// Set when the editor decides a request should go out this frame
    pub requested: bool,
}

impl Default for AutocompleteState {
    fn default() -> Self {
        Self::new()
    }
}

impl AutocompleteState {
    pub fn new() -> Self {
        Self {
            mailbox: Arc::new(CompletionMailbox::new()),
            items: Vec::new(),
            visible: false,
            selected: 0,
            trigger: Position::default(),
            requested: false,
        }
    }

    /// Handle for a completion callback to deposit into
    pub fn mailbox(&self) -> Arc<CompletionMailbox> {
        self.mailbox.clone()
    }

    /// Drain the mailbox; call once per UI iteration.
    ///
    /// Returns true when fresh results were committed. An empty fresh set
    /// hides the popup; a non-empty one shows it with the selection reset.
    pub fn poll(&mut self) -> bool {
        let Some(items) = self.mailbox.take() else {
            return false;
        };
        self.items = items;
        if self.items.is_empty() {
            self.visible = false;
        } else {
            self.visible = true;
            self.selected = 0;
        }
        true
    }

    /// Move the selection down, wrapping at the end
    pub fn select_next(&mut self) {
        if !self.items.is_empty() {
            self.selected = (self.selected + 1) % self.items.len();
        }
    }

    /// Move the selection up, wrapping at the start
    pub fn select_prev(&mut self) {
        if !self.items.is_empty() {
            self.selected = self.selected.checked_sub(1).unwrap_or(self.items.len() - 1);
        }
    }

    pub fn selected_item(&self) -> Option<&CompletionItem> {
        self.items.get(self.selected)
    }

    /// Hide the popup without touching staged results
    pub fn dismiss(&mut self) {
        self.visible = false;
    }
}
