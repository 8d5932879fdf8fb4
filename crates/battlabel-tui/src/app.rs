use crossterm::event::{KeyCode, KeyEvent};
use battlabel_core::{OperatorInputs, SessionState, UiCommand};

use crate::log_layer::LogBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Station,
    Logs,
}

/// Operator-editable fields on the station tab, in focus order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Lot,
    Product,
    MinVoltage,
    MaxVoltage,
    Port,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    None,
    Quit,
    Command(UiCommand),
}

pub struct App {
    pub tab: Tab,
    pub state: SessionState,
    pub inputs: OperatorInputs,
    pub focus: Field,
    pub product_types: Vec<String>,
    pub product_index: Option<usize>,
    pub port_index: usize,
    pub show_overrides: bool,
    pub should_quit: bool,
    pub logs: LogBuffer,
    pub log_scroll: usize,
    pub log_auto_scroll: bool,
}

impl App {
    pub fn new(logs: LogBuffer, product_types: Vec<String>) -> Self {
        Self {
            tab: Tab::Station,
            state: SessionState::default(),
            inputs: OperatorInputs::default(),
            focus: Field::Lot,
            product_types,
            product_index: None,
            port_index: 0,
            show_overrides: false,
            should_quit: false,
            logs,
            log_scroll: 0,
            log_auto_scroll: true,
        }
    }

    pub fn update_state(&mut self, new_state: SessionState) {
        self.state = new_state;
        if !self.state.ports.is_empty() && self.port_index >= self.state.ports.len() {
            self.port_index = self.state.ports.len() - 1;
        }
    }

    pub fn selected_port(&self) -> Option<&str> {
        self.state.ports.get(self.port_index).map(String::as_str)
    }

    pub fn selected_product(&self) -> Option<&str> {
        self.product_index
            .and_then(|i| self.product_types.get(i))
            .map(String::as_str)
    }

    /// Fields currently reachable with Tab, in display order.
    pub fn visible_fields(&self) -> Vec<Field> {
        let mut fields = vec![Field::Lot];
        if !self.product_types.is_empty() {
            fields.push(Field::Product);
        }
        if self.show_overrides {
            fields.push(Field::MinVoltage);
            fields.push(Field::MaxVoltage);
        }
        fields.push(Field::Port);
        fields
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> AppAction {
        match key.code {
            KeyCode::Esc => {
                self.should_quit = true;
                return AppAction::Quit;
            }
            KeyCode::F(1) => {
                self.tab = Tab::Station;
                return AppAction::None;
            }
            KeyCode::F(2) => {
                self.tab = Tab::Logs;
                return AppAction::None;
            }
            KeyCode::F(5) => return AppAction::Command(UiCommand::RefreshPorts),
            _ => {}
        }

        match self.tab {
            Tab::Station => self.handle_station_key(key),
            Tab::Logs => self.handle_logs_key(key),
        }
    }

    fn set_inputs(&self) -> AppAction {
        AppAction::Command(UiCommand::SetInputs(self.inputs.clone()))
    }

    fn cycle_focus(&mut self, forward: bool) {
        let fields = self.visible_fields();
        let pos = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        let next = if forward {
            (pos + 1) % fields.len()
        } else {
            (pos + fields.len() - 1) % fields.len()
        };
        self.focus = fields[next];
    }

    fn toggle_overrides(&mut self) {
        self.show_overrides = !self.show_overrides;
        if !self.show_overrides && matches!(self.focus, Field::MinVoltage | Field::MaxVoltage) {
            self.focus = Field::Lot;
        }
    }

    fn focused_text(&mut self) -> Option<&mut String> {
        match self.focus {
            Field::Lot => Some(&mut self.inputs.lot_number),
            Field::MinVoltage => Some(&mut self.inputs.min_override),
            Field::MaxVoltage => Some(&mut self.inputs.max_override),
            Field::Product | Field::Port => None,
        }
    }

    fn step_product(&mut self, forward: bool) -> AppAction {
        let count = self.product_types.len();
        if count == 0 {
            return AppAction::None;
        }
        self.product_index = Some(match (self.product_index, forward) {
            (None, true) => 0,
            (None, false) => count - 1,
            (Some(i), true) => (i + 1) % count,
            (Some(i), false) => (i + count - 1) % count,
        });
        self.inputs.product_type = self.selected_product().map(str::to_string);
        self.set_inputs()
    }

    fn step_port(&mut self, forward: bool) {
        let count = self.state.ports.len();
        if count == 0 {
            return;
        }
        self.port_index = if forward {
            (self.port_index + 1) % count
        } else {
            (self.port_index + count - 1) % count
        };
    }

    fn toggle_connection(&self) -> AppAction {
        if self.state.connection.is_connected() {
            return AppAction::Command(UiCommand::Disconnect);
        }
        match self.selected_port() {
            Some(port) => AppAction::Command(UiCommand::Connect {
                port: port.to_string(),
            }),
            None => AppAction::None,
        }
    }

    fn handle_station_key(&mut self, key: KeyEvent) -> AppAction {
        match key.code {
            KeyCode::F(4) => {
                self.toggle_overrides();
                AppAction::None
            }
            KeyCode::F(3) => self.toggle_connection(),
            KeyCode::Tab | KeyCode::Down => {
                self.cycle_focus(true);
                AppAction::None
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.cycle_focus(false);
                AppAction::None
            }
            KeyCode::Left | KeyCode::Right => {
                let forward = key.code == KeyCode::Right;
                match self.focus {
                    Field::Product => self.step_product(forward),
                    Field::Port => {
                        self.step_port(forward);
                        AppAction::None
                    }
                    _ => AppAction::None,
                }
            }
            KeyCode::Enter if self.focus == Field::Port => self.toggle_connection(),
            KeyCode::Char(c) => {
                let Some(text) = self.focused_text() else {
                    return AppAction::None;
                };
                text.push(c);
                self.set_inputs()
            }
            KeyCode::Backspace => {
                let removed = self.focused_text().and_then(|text| text.pop());
                if removed.is_some() {
                    self.set_inputs()
                } else {
                    AppAction::None
                }
            }
            KeyCode::Delete if self.focus == Field::Product && self.product_index.is_some() => {
                self.product_index = None;
                self.inputs.product_type = None;
                self.set_inputs()
            }
            _ => AppAction::None,
        }
    }

    fn handle_logs_key(&mut self, key: KeyEvent) -> AppAction {
        match key.code {
            KeyCode::Up => {
                self.log_scroll = self.log_scroll.saturating_add(1);
                self.log_auto_scroll = false;
            }
            KeyCode::Down => {
                self.log_scroll = self.log_scroll.saturating_sub(1);
            }
            KeyCode::End | KeyCode::Char('G') => {
                self.log_scroll = 0;
                self.log_auto_scroll = true;
            }
            _ => {}
        }
        AppAction::None
    }
}
