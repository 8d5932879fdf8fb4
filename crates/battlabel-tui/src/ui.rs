use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph, Tabs};
use ratatui::Frame;

use battlabel_core::tui_types::NoticeLevel;
use battlabel_core::ConnectionState;

use crate::app::{App, Field, Tab};

const CUE: Style = Style::new().fg(Color::White).bg(Color::Red);

pub fn draw(frame: &mut Frame, app: &App) {
    let [tabs_area, main_area, help_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    draw_tabs(frame, app, tabs_area);

    match app.tab {
        Tab::Station => draw_station(frame, app, main_area),
        Tab::Logs => draw_logs(frame, app, main_area),
    }

    let help = match app.tab {
        Tab::Station => "Tab=next field  ←/→=choose  Enter/F3=connect  F4=voltage range  F5=rescan  Esc=quit",
        Tab::Logs => "↑/↓=scroll  End=follow  F1=station  Esc=quit",
    };
    frame.render_widget(
        Paragraph::new(help).style(Style::default().fg(Color::DarkGray)),
        help_area,
    );
}

fn draw_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let selected = match app.tab {
        Tab::Station => 0,
        Tab::Logs => 1,
    };
    let tabs = Tabs::new(vec!["F1:Station", "F2:Logs"])
        .block(Block::default().borders(Borders::ALL).title("battlabel"))
        .select(selected)
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    frame.render_widget(tabs, area);
}

fn field_line<'a>(app: &App, field: Field, label: &'a str, value: String, cued: bool) -> Line<'a> {
    let focused = app.focus == field;
    let marker = if focused { "> " } else { "  " };
    let value_style = if cued {
        CUE
    } else if focused {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    Line::from(vec![
        Span::raw(marker),
        Span::raw(format!("{:<14}", label)),
        Span::styled(format!("[{}]", value), value_style),
    ])
}

fn draw_station(frame: &mut Frame, app: &App, area: Rect) {
    let [inputs_area, fixture_area, notice_area, label_area] = Layout::vertical([
        Constraint::Length(app.visible_fields().len() as u16 + 2),
        Constraint::Length(5),
        Constraint::Length(3),
        Constraint::Fill(1),
    ])
    .areas(area);

    draw_inputs(frame, app, inputs_area);
    draw_fixture(frame, app, fixture_area);
    draw_notice(frame, app, notice_area);
    draw_last_label(frame, app, label_area);
}

fn draw_inputs(frame: &mut Frame, app: &App, area: Rect) {
    let cues = app.state.cues;
    let mut lines = vec![field_line(
        app,
        Field::Lot,
        "Lot number",
        app.inputs.lot_number.clone(),
        cues.lot_missing,
    )];
    if !app.product_types.is_empty() {
        lines.push(field_line(
            app,
            Field::Product,
            "Product",
            app.selected_product().unwrap_or("select").to_string(),
            cues.product_missing,
        ));
    }
    if app.show_overrides {
        lines.push(field_line(
            app,
            Field::MinVoltage,
            "Min voltage",
            app.inputs.min_override.clone(),
            false,
        ));
        lines.push(field_line(
            app,
            Field::MaxVoltage,
            "Max voltage",
            app.inputs.max_override.clone(),
            false,
        ));
    }

    let (status, status_style) = match app.state.connection {
        ConnectionState::Connected { ref port } => {
            (format!("connected to {}", port), Style::default().fg(Color::Green))
        }
        ConnectionState::Disconnected => ("disconnected".to_string(), Style::default().fg(Color::DarkGray)),
    };
    let mut port_line = field_line(
        app,
        Field::Port,
        "Port",
        app.selected_port().unwrap_or("none").to_string(),
        false,
    );
    port_line.spans.push(Span::raw("  "));
    port_line.spans.push(Span::styled(status, status_style));
    lines.push(port_line);

    let para = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Operator"));
    frame.render_widget(para, area);
}

fn draw_fixture(frame: &mut Frame, app: &App, area: Rect) {
    let (identifier, voltage) = match app.state.reading {
        Some(ref record) => (record.identifier.clone(), format!("{} mV", record.voltage)),
        None => ("-".to_string(), "-".to_string()),
    };
    let voltage_style = if app.state.cues.voltage_rejected {
        CUE
    } else {
        Style::default()
    };
    let lines = vec![
        Line::from(vec![Span::raw("MAC address:  "), Span::raw(identifier)]),
        Line::from(vec![
            Span::raw("Battery:      "),
            Span::styled(voltage, voltage_style),
        ]),
        Line::from(format!(
            "Accepted: {}  Rejected: {}  Printed: {}",
            app.state.accepted, app.state.rejected, app.state.printed
        )),
    ];
    let para = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Fixture"));
    frame.render_widget(para, area);
}

fn draw_notice(frame: &mut Frame, app: &App, area: Rect) {
    let line = match app.state.notice {
        Some(ref notice) => {
            let style = match notice.level {
                NoticeLevel::Info => Style::default().fg(Color::Green),
                NoticeLevel::Error => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            };
            Line::styled(notice.message.as_str(), style)
        }
        None => Line::raw(""),
    };
    let para = Paragraph::new(line).block(Block::default().borders(Borders::ALL).title("Status"));
    frame.render_widget(para, area);
}

fn draw_last_label(frame: &mut Frame, app: &App, area: Rect) {
    let lines: Vec<Line> = match app.state.last_label {
        Some(ref label) => label
            .text
            .lines()
            .map(|l| Line::raw(l.to_string()))
            .chain(std::iter::once(Line::styled(
                format!("QR: {}", label.qr_data.replace('\n', " | ")),
                Style::default().fg(Color::Cyan),
            )))
            .collect(),
        None => vec![Line::raw("No label printed yet")],
    };
    let para = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Last label"));
    frame.render_widget(para, area);
}

fn draw_logs(frame: &mut Frame, app: &App, area: Rect) {
    let lines: Vec<String> = match app.logs.lock() {
        Ok(logs) => logs.iter().cloned().collect(),
        Err(_) => Vec::new(),
    };
    let total = lines.len();

    let visible_height = area.height.saturating_sub(2) as usize;
    let scroll = app.log_scroll.min(total.saturating_sub(visible_height));
    let end = total.saturating_sub(scroll);
    let start = end.saturating_sub(visible_height);

    let items: Vec<ListItem> = lines[start..end]
        .iter()
        .map(|s| {
            let style = if s.contains(" ERROR ") {
                Style::default().fg(Color::Red)
            } else if s.contains(" WARN ") {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            ListItem::new(s.as_str()).style(style)
        })
        .collect();

    let title = if app.log_auto_scroll {
        "Logs (following)"
    } else {
        "Logs (scrolled)"
    };
    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(list, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::App;
    use battlabel_core::tui_types::{Cues, Notice};
    use battlabel_core::{LabelPayload, ParsedRecord, SessionState};
    use ratatui::backend::TestBackend;
    use ratatui::buffer::Buffer;
    use ratatui::Terminal;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    fn buffer_text(buf: &Buffer) -> String {
        let area = buf.area();
        let mut text = String::new();
        for y in area.y..area.y + area.height {
            for x in area.x..area.x + area.width {
                text.push_str(buf.cell((x, y)).map(|c| c.symbol()).unwrap_or(" "));
            }
            text.push('\n');
        }
        text
    }

    fn make_app() -> App {
        App::new(Arc::new(Mutex::new(VecDeque::new())), Vec::new())
    }

    fn render(app: &App) -> Terminal<TestBackend> {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| draw(frame, app)).unwrap();
        terminal
    }

    fn find(buf: &Buffer, needle: &str) -> Option<(u16, u16)> {
        let area = buf.area();
        let width = needle.chars().count() as u16;
        for y in area.y..area.y + area.height {
            for x in area.x..(area.x + area.width).saturating_sub(width) {
                let cells: String = (x..x + width)
                    .map(|cx| buf.cell((cx, y)).map(|c| c.symbol()).unwrap_or(" "))
                    .collect();
                if cells == needle {
                    return Some((x, y));
                }
            }
        }
        None
    }

    #[test]
    fn test_station_renders_reading() {
        let mut app = make_app();
        app.update_state(SessionState {
            reading: Some(ParsedRecord {
                identifier: "AA:BB:CC:DD:EE:FF".into(),
                voltage: "3500".into(),
            }),
            ..Default::default()
        });
        let terminal = render(&app);
        let text = buffer_text(terminal.backend().buffer());
        assert!(text.contains("AA:BB:CC:DD:EE:FF"), "missing identifier:\n{}", text);
        assert!(text.contains("3500 mV"), "missing voltage:\n{}", text);
        assert!(text.contains("No label printed yet"));
    }

    #[test]
    fn test_missing_lot_cue_is_red() {
        let mut app = make_app();
        app.update_state(SessionState {
            cues: Cues {
                lot_missing: true,
                ..Default::default()
            },
            notice: Some(Notice {
                level: NoticeLevel::Error,
                message: "Please specify a lot number!".into(),
            }),
            ..Default::default()
        });
        let terminal = render(&app);
        let buf = terminal.backend().buffer();
        let text = buffer_text(buf);
        assert!(text.contains("Please specify a lot number!"), "{}", text);

        let (x, y) = find(buf, "[]").expect("lot field not rendered");
        assert_eq!(buf.cell((x, y)).unwrap().bg, Color::Red);
    }

    #[test]
    fn test_rejected_voltage_cue_is_red() {
        let mut app = make_app();
        app.update_state(SessionState {
            reading: Some(ParsedRecord {
                identifier: "AA:BB:CC:DD:EE:FF".into(),
                voltage: "2900".into(),
            }),
            cues: Cues {
                voltage_rejected: true,
                ..Default::default()
            },
            ..Default::default()
        });
        let terminal = render(&app);
        let buf = terminal.backend().buffer();
        let (x, y) = find(buf, "2900 mV").expect("voltage not rendered");
        assert_eq!(buf.cell((x, y)).unwrap().bg, Color::Red);
    }

    #[test]
    fn test_override_fields_hidden_until_toggled() {
        let mut app = make_app();
        let text = buffer_text(render(&app).backend().buffer());
        assert!(!text.contains("Min voltage"));

        app.show_overrides = true;
        let text = buffer_text(render(&app).backend().buffer());
        assert!(text.contains("Min voltage"));
        assert!(text.contains("Max voltage"));
    }

    #[test]
    fn test_last_label_rendered() {
        let mut app = make_app();
        app.update_state(SessionState {
            last_label: Some(LabelPayload {
                identifier: "FFEEDDCCBBAA".into(),
                voltage: 3500,
                product: None,
                lot_number: "42".into(),
                date: "03/07/26".into(),
                text: "S/N: FFEEDDCCBBAA\nCustomer/Lot: 42\nDate: 03/07/26".into(),
                qr_data: "FFEEDDCCBBAA+42".into(),
            }),
            accepted: 1,
            ..Default::default()
        });
        let text = buffer_text(render(&app).backend().buffer());
        assert!(text.contains("S/N: FFEEDDCCBBAA"), "{}", text);
        assert!(text.contains("QR: FFEEDDCCBBAA+42"), "{}", text);
        assert!(text.contains("Accepted: 1"), "{}", text);
    }

    #[test]
    fn test_logs_tab_renders_log_lines() {
        let logs = Arc::new(Mutex::new(VecDeque::new()));
        {
            let mut buf = logs.lock().unwrap();
            for i in 0..10 {
                buf.push_back(format!("12:00:0{} INFO  log message {}", i, i));
            }
        }
        let mut app = App::new(Arc::clone(&logs), Vec::new());
        app.tab = Tab::Logs;

        let text = buffer_text(render(&app).backend().buffer());
        assert!(text.contains("log message 9"), "{}", text);
    }
}
