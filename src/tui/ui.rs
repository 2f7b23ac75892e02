//! UI rendering for the debugger.

use super::app::DebuggerApp;
use crate::Register;
use ratatui::{
    prelude::*,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, List, ListItem, Paragraph},
};

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &DebuggerApp) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(frame.area());

    // Left side: microcode, registers, status
    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(10), Constraint::Length(9), Constraint::Length(3)])
        .split(chunks[0]);

    draw_microcode(frame, left_chunks[0], app);
    draw_registers(frame, left_chunks[1], app);
    draw_status(frame, left_chunks[2], app);

    // Right side: IJVM listing, memory, console, help
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(8),
            Constraint::Length(10),
            Constraint::Length(5),
            Constraint::Length(4),
        ])
        .split(chunks[1]);

    draw_listing(frame, right_chunks[0], app);
    draw_memory(frame, right_chunks[1], app);
    draw_console(frame, right_chunks[2], app);
    draw_help(frame, right_chunks[3]);
}

fn draw_microcode(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let rows = (area.height as usize).saturating_sub(2);
    let items: Vec<ListItem> = app
        .micro_window(rows)
        .into_iter()
        .map(|(addr, text, is_current)| {
            let prefix = if is_current { "▶ " } else { "  " };
            let has_bp = app.has_micro_breakpoint(addr);
            let bp = if has_bp { "●" } else { " " };

            let style = if is_current {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if has_bp {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };

            ListItem::new(format!("{bp} {prefix}{addr:#05X}: {text}")).style(style)
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(" Microcode ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    frame.render_widget(list, area);
}

fn draw_registers(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let regs = app.sim.registers();
    let cursor = app.sim.cursor();

    let cell = |reg: Register| {
        vec![
            Span::raw(format!("{:>4}: ", reg.name())),
            Span::styled(format!("{:08X}", regs.get(reg)), Style::default().fg(Color::White)),
            Span::raw(format!(" {:<12}", regs.get(reg))),
        ]
    };

    let mut content: Vec<Line> = Register::ALL
        .chunks(2)
        .map(|pair| Line::from(pair.iter().flat_map(|&reg| cell(reg)).collect::<Vec<_>>()))
        .collect();

    let flag = |set: bool| if set { Style::default().fg(Color::Green) } else { Style::default().fg(Color::DarkGray) };
    content.push(Line::from(vec![
        Span::raw(" MPC: "),
        Span::styled(format!("{:#05X}", cursor.mpc), Style::default().fg(Color::Yellow)),
        Span::raw("   "),
        Span::styled("N", flag(cursor.n)),
        Span::raw(" "),
        Span::styled("Z", flag(cursor.z)),
        Span::raw("   Ticks: "),
        Span::styled(cursor.total_ticks.to_string(), Style::default().fg(Color::Cyan)),
    ]));

    let paragraph = Paragraph::new(content).block(
        Block::default()
            .title(" Registers ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)),
    );

    frame.render_widget(paragraph, area);
}

fn draw_listing(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let rows = (area.height as usize).saturating_sub(2);
    let current = app.current_macro_line();
    let skip = current.unwrap_or(0).saturating_sub(rows / 2);

    let items: Vec<ListItem> = app
        .listing
        .iter()
        .enumerate()
        .skip(skip)
        .take(rows)
        .map(|(i, line)| {
            let is_current = Some(i) == current;
            let has_bp = app.has_macro_breakpoint(line.address);
            let style = if is_current {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if has_bp {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };
            let marker = if has_bp { "●" } else { " " };
            ListItem::new(format!("{marker} {line}")).style(style)
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(" IJVM ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue)),
    );

    frame.render_widget(list, area);
}

fn draw_memory(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let rows = (area.height as usize).saturating_sub(2);
    let regs = app.sim.registers();

    let items: Vec<ListItem> = app
        .sim
        .memory()
        .dump(app.mem_scroll, rows)
        .into_iter()
        .map(|(addr, value)| {
            let text = format!("{addr:#010X}: {value:08X} {value}");
            let style = if addr as i32 == regs.sp {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if addr as i32 == regs.mar {
                Style::default().fg(Color::Cyan)
            } else if value != 0 {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            ListItem::new(text).style(style)
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(" Memory ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)),
    );

    frame.render_widget(list, area);
}

fn draw_console(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let text = String::from_utf8_lossy(app.sim.output()).into_owned();
    let console = Paragraph::new(text).block(Block::default().title(" Console ").borders(Borders::ALL));
    frame.render_widget(console, area);
}

fn draw_status(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let status = Paragraph::new(app.status.clone())
        .style(Style::default().fg(Color::White))
        .block(Block::default().title(" Status ").borders(Borders::ALL));

    frame.render_widget(status, area);
}

fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(vec![
        Line::from("t: Tick  s: Step  r: Run  p: Pause  x: Reset"),
        Line::from("b/m: Break at MPC/PC  ↑↓ PgUp PgDn: Memory  q: Quit"),
    ])
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default().title(" Help ").borders(Borders::ALL));

    frame.render_widget(help, area);
}
