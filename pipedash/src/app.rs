//! Application state for the TUI.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use pipedash_core::{Controller, Dispatch, Tab, ViewModel};
use ratatui::widgets::TableState;

/// Lines moved by PageUp/PageDown
const PAGE: usize = 10;

/// Main application state.
pub struct App {
    /// Owner of the view model; every change goes through it
    controller: Controller,
    /// Backend address shown in the header
    pub server_label: String,
    /// Set when the user asked to exit
    pub should_quit: bool,
    /// Scroll offset for the chat transcript
    pub chat_scroll: usize,
    /// Keep the transcript pinned to its newest line
    pub chat_follow: bool,
    /// Report table selection state
    pub report_state: TableState,
    /// Scroll offset for the chat data view
    pub data_scroll: usize,
}

impl App {
    pub fn new(controller: Controller, server_label: String) -> Self {
        Self {
            controller,
            server_label,
            should_quit: false,
            chat_scroll: 0,
            chat_follow: true,
            report_state: TableState::default(),
            data_scroll: 0,
        }
    }

    /// Kick off the initial load.
    pub fn start(&mut self) {
        self.controller.load_all();
    }

    /// Apply pending updates from background requests.
    pub fn tick(&mut self) {
        let applied = self.controller.pump();
        if applied > 0 {
            let rows = self.model().report().len();
            if rows == 0 {
                self.report_state.select(None);
            } else if self.report_state.selected().map_or(true, |i| i >= rows) {
                self.report_state.select(Some(0));
            }
        }
    }

    pub fn model(&self) -> &ViewModel {
        self.controller.model()
    }

    #[cfg(test)]
    pub fn controller_mut(&mut self) -> &mut Controller {
        &mut self.controller
    }

    /// Handle a key press.
    pub fn handle_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        if ctrl && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        // An open notice must be acknowledged before anything else
        if self.model().notice().is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.controller.dismiss_notice();
            }
            return;
        }

        if ctrl {
            match key.code {
                KeyCode::Char('p') => {
                    let dispatch = self.controller.run_pipeline();
                    log_dispatch("run pipeline", dispatch);
                }
                KeyCode::Char('l') => {
                    let dispatch = self.controller.clear_context();
                    if dispatch == Dispatch::Started {
                        self.chat_follow = true;
                    }
                    log_dispatch("clear context", dispatch);
                }
                KeyCode::Char('r') => {
                    let dispatch = self.controller.refresh();
                    log_dispatch("refresh", dispatch);
                }
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Tab => self.controller.next_tab(),
            KeyCode::BackTab => self.controller.previous_tab(),
            KeyCode::Up => self.scroll_up(1),
            KeyCode::Down => self.scroll_down(1),
            KeyCode::PageUp => self.scroll_up(PAGE),
            KeyCode::PageDown => self.scroll_down(PAGE),
            _ => match self.model().active_tab() {
                Tab::Chat => self.handle_chat_key(key),
                Tab::Pipeline | Tab::ChatData => self.handle_view_key(key),
            },
        }
    }

    /// Chat tab: keys edit the message input.
    fn handle_chat_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                let dispatch = self.controller.send_message();
                if dispatch == Dispatch::Started {
                    self.chat_follow = true;
                }
                log_dispatch("send message", dispatch);
            }
            KeyCode::Backspace => self.controller.input_pop(),
            KeyCode::Esc => self.controller.set_input(String::new()),
            KeyCode::Char(c) => self.controller.input_push(c),
            _ => {}
        }
    }

    /// Pipeline and Chat Data tabs: single-key navigation.
    fn handle_view_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char(c @ '1'..='3') => {
                let index = c as usize - '1' as usize;
                if let Some(tab) = Tab::from_index(index) {
                    self.controller.select_tab(tab);
                }
            }
            _ => {}
        }
    }

    fn scroll_up(&mut self, amount: usize) {
        match self.model().active_tab() {
            Tab::Chat => {
                self.chat_follow = false;
                self.chat_scroll = self.chat_scroll.saturating_sub(amount);
            }
            Tab::Pipeline => {
                let selected = self.report_state.selected().unwrap_or(0);
                if !self.model().report().is_empty() {
                    self.report_state.select(Some(selected.saturating_sub(amount)));
                }
            }
            Tab::ChatData => {
                self.data_scroll = self.data_scroll.saturating_sub(amount);
            }
        }
    }

    fn scroll_down(&mut self, amount: usize) {
        match self.model().active_tab() {
            // Clamped at render time, where the line count is known
            Tab::Chat => self.chat_scroll = self.chat_scroll.saturating_add(amount),
            Tab::Pipeline => {
                let rows = self.model().report().len();
                if rows > 0 {
                    let selected = self.report_state.selected().unwrap_or(0);
                    self.report_state
                        .select(Some(selected.saturating_add(amount).min(rows - 1)));
                }
            }
            Tab::ChatData => self.data_scroll = self.data_scroll.saturating_add(amount),
        }
    }
}

fn log_dispatch(action: &str, dispatch: Dispatch) {
    if let Dispatch::Ignored(reason) = dispatch {
        tracing::debug!(action, ?reason, "Action ignored");
    }
}
