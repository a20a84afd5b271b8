use super::app::App;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};

const POPUP_WIDTH: u16 = 30;
const POPUP_MAX_HEIGHT: u16 = 7;

pub fn draw(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(f.area());

    // Only the tail of the log that fits inside the borders.
    let inner_height = chunks[0].height.saturating_sub(2) as usize;
    let skip_count = app.messages.len().saturating_sub(inner_height);
    let messages: Vec<ListItem> = app
        .messages
        .iter()
        .skip(skip_count)
        .map(|line| ListItem::new(line.clone()))
        .collect();

    let output = List::new(messages)
        .block(Block::default().borders(Borders::ALL).title(" Output "))
        .style(Style::default().fg(Color::White));
    f.render_widget(output, chunks[0]);

    let input_rect = chunks[1];
    f.render_widget(&app.textarea, input_rect);

    let tables = match app.db.registry().len() {
        Ok(n) => n.to_string(),
        Err(_) => "?".to_string(),
    };
    let status = Paragraph::new(Line::from(format!(
        " {} table(s) | Enter run | Tab complete | Esc quit",
        tables
    )))
    .style(Style::default().fg(Color::DarkGray));
    f.render_widget(status, chunks[2]);

    if app.popup_open && !app.suggestions.is_empty() {
        draw_suggestions(f, app, input_rect);
    }
}

fn draw_suggestions(f: &mut Frame, app: &App, input_rect: Rect) {
    let (row, col) = app.textarea.cursor();
    let screen = f.area();

    let width = POPUP_WIDTH.min(screen.width);
    let height = POPUP_MAX_HEIGHT
        .min(app.suggestions.len() as u16 + 2)
        .min(screen.height);

    // Above the input box, which sits at the bottom of the screen.
    let x = (input_rect.x + col as u16 + 1).min(screen.width - width);
    let y = (input_rect.y + row as u16).saturating_sub(height);
    let area = Rect::new(x, y, width, height);

    f.render_widget(Clear, area);

    let items: Vec<ListItem> = app
        .suggestions
        .iter()
        .map(|s| ListItem::new(s.as_str()))
        .collect();

    let mut state = ListState::default();
    state.select(Some(app.suggestion_index));

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Suggestions"))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");

    f.render_stateful_widget(list, area, &mut state);
}
