use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

use crate::app::{App, InputMode};
use crate::session::Side;

impl App {
    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }

        match self.input_mode {
            InputMode::Help => self.handle_help_key(key),
            InputMode::Normal => self.handle_normal_key(key),
        }
    }

    fn handle_help_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q') => {
                self.input_mode = InputMode::Normal;
                self.help_scroll_position = 0;
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.help_scroll_position = self.help_scroll_position.saturating_add(1);
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.help_scroll_position = self.help_scroll_position.saturating_sub(1);
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('q') => self.handle_key_q(),
            KeyCode::Char('?') => {
                self.input_mode = InputMode::Help;
                Ok(())
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.session.panel_mut(self.active_panel).move_up();
                Ok(())
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.session.panel_mut(self.active_panel).move_down();
                Ok(())
            }
            KeyCode::Enter => {
                self.open_selected();
                Ok(())
            }
            KeyCode::Backspace => {
                self.go_parent();
                Ok(())
            }
            KeyCode::Tab => {
                self.switch_panel();
                Ok(())
            }
            KeyCode::Char(' ') => {
                self.toggle_selection();
                Ok(())
            }
            KeyCode::Char('c') => {
                self.start_copy();
                Ok(())
            }
            KeyCode::Char('x') | KeyCode::Esc => {
                self.cancel_copy();
                Ok(())
            }
            KeyCode::Char('l') => {
                self.check_devices(true);
                Ok(())
            }
            KeyCode::Char('d') => {
                self.check_devices(false);
                Ok(())
            }
            KeyCode::Char('r') => self.handle_key_r(),
            KeyCode::Char('e') => self.handle_key_e(),
            _ => Ok(()),
        }
    }

    pub fn handle_key_q(&mut self) -> Result<()> {
        self.cancel_copy();
        self.should_quit = true;
        Ok(())
    }

    /// Refresh both panels; the device side only once a device is usable.
    pub fn handle_key_r(&mut self) -> Result<()> {
        self.reload_side(Side::Local);
        if self.session.ensure_device_ready().is_ok() {
            self.reload_side(Side::Remote);
        }
        Ok(())
    }

    pub fn handle_key_e(&mut self) -> Result<()> {
        if !self.config_path.exists() {
            if let Some(parent) = self.config_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&self.config_path, "")?;
        }

        if let Err(e) = open::that(&self.config_path) {
            tracing::error!("Failed to open editor: {}", e);
            self.status.error(format!("Failed to open editor: {}", e));
            return Ok(());
        }
        self.status
            .info("Config opened, restart adbfm to apply changes");
        Ok(())
    }
}
