use super::autocomplete::Autocompleter;
use super::ui;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::{Backend, CrosstermBackend},
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use std::sync::Arc;
use std::{error::Error, io};
use tabstore::{Command, Database};
use tui_textarea::{Input, Key, TextArea};

pub struct App<'a> {
    pub textarea: TextArea<'a>,
    pub messages: Vec<Line<'static>>,
    pub db: Arc<Database>,
    pub exit: bool,

    // Autocomplete State
    pub autocompleter: Autocompleter,
    pub suggestions: Vec<String>,
    pub suggestion_index: usize,
    pub popup_open: bool,
}

impl<'a> App<'a> {
    pub fn new(db: Arc<Database>) -> Self {
        let mut messages = vec![
            Line::from(vec![Span::styled(
                "tabstore",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )]),
            Line::from("Type a command and press Enter (or Ctrl+E). EXIT or Esc quits."),
        ];
        match db.list_tables() {
            Ok(tables) if !tables.is_empty() => {
                messages.push(Line::from(format!("Tables: {}", tables.join(", "))));
            }
            Ok(_) => {}
            Err(e) => messages.push(Line::from(format!("Error: {}", e))),
        }
        messages.push(separator());

        Self {
            textarea: Self::new_textarea(),
            messages,
            db,
            exit: false,
            autocompleter: Autocompleter::new(),
            suggestions: Vec::new(),
            suggestion_index: 0,
            popup_open: false,
        }
    }

    fn new_textarea() -> TextArea<'static> {
        let mut textarea = TextArea::default();
        textarea.set_placeholder_text("Enter command ('Tab' for autocomplete, 'Esc' to quit)");
        textarea.set_block(
            ratatui::widgets::Block::default()
                .borders(ratatui::widgets::Borders::ALL)
                .title(" Command "),
        );
        textarea
    }

    fn reset_textarea(&mut self) {
        self.textarea = Self::new_textarea();
    }

    pub async fn run(&mut self) -> Result<(), Box<dyn Error>> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let res = self.run_loop(&mut terminal).await;

        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        res?;
        Ok(())
    }

    async fn run_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        while !self.exit {
            terminal.draw(|f| ui::draw(f, self))?;

            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }

            if self.popup_open {
                match key.code {
                    KeyCode::Down => {
                        if !self.suggestions.is_empty() {
                            self.suggestion_index =
                                (self.suggestion_index + 1) % self.suggestions.len();
                        }
                        continue;
                    }
                    KeyCode::Up => {
                        if !self.suggestions.is_empty() {
                            self.suggestion_index = (self.suggestion_index
                                + self.suggestions.len()
                                - 1)
                                % self.suggestions.len();
                        }
                        continue;
                    }
                    KeyCode::Tab => {
                        self.accept_suggestion();
                        continue;
                    }
                    KeyCode::Esc => {
                        self.popup_open = false;
                        continue;
                    }
                    // Enter falls through and runs the line as typed.
                    _ => self.popup_open = false,
                }
            }

            match key.code {
                KeyCode::Esc => self.exit = true,
                KeyCode::Enter => self.execute_input().await,
                KeyCode::Char('e') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    self.execute_input().await;
                }
                KeyCode::Tab => {
                    self.update_suggestions().await;
                    if !self.suggestions.is_empty() {
                        self.popup_open = true;
                        self.suggestion_index = 0;
                    }
                }
                _ => {
                    self.textarea.input(key);
                    if let KeyCode::Char(c) = key.code
                        && (c.is_alphanumeric() || c == '_')
                    {
                        self.update_suggestions().await;
                        self.popup_open = !self.suggestions.is_empty();
                    }
                }
            }
        }
        Ok(())
    }

    async fn update_suggestions(&mut self) {
        let word = self.current_word();
        if word.is_empty() {
            self.suggestions.clear();
            self.popup_open = false;
            return;
        }

        self.suggestions = self.autocompleter.get_suggestions(&word, &self.db).await;
        self.suggestion_index = 0;
    }

    fn accept_suggestion(&mut self) {
        let Some(suggestion) = self.suggestions.get(self.suggestion_index).cloned() else {
            return;
        };

        for _ in 0..self.current_word().chars().count() {
            self.textarea.input(Input {
                key: Key::Backspace,
                ctrl: false,
                alt: false,
                shift: false,
            });
        }
        self.textarea.insert_str(&suggestion);
        self.popup_open = false;
    }

    /// Identifier characters immediately left of the cursor.
    fn current_word(&self) -> String {
        let (row, col) = self.textarea.cursor();
        let Some(line) = self.textarea.lines().get(row) else {
            return String::new();
        };

        let prefix: Vec<char> = line.chars().take(col).collect();
        let start = prefix
            .iter()
            .rposition(|&c| !c.is_alphanumeric() && c != '_')
            .map_or(0, |sep| sep + 1);
        prefix[start..].iter().collect()
    }

    async fn execute_input(&mut self) {
        let input = self.textarea.lines().join(" ");
        if input.trim().is_empty() {
            return;
        }

        self.messages.push(Line::from(vec![
            Span::styled("> ", Style::default().fg(Color::Yellow)),
            Span::raw(input.clone()),
        ]));
        self.reset_textarea();

        let command = match Command::parse(&input) {
            Ok(Some(command)) => command,
            Ok(None) => return,
            Err(e) => {
                self.push_error(e.to_string());
                return;
            }
        };
        if let Command::Exit = command {
            self.exit = true;
            return;
        }

        match self.db.execute_command(&command).await {
            Ok(result) if result.columns().is_empty() => {
                let status = result.status().unwrap_or("OK").to_string();
                self.messages.push(Line::from(Span::styled(
                    status,
                    Style::default().fg(Color::Green),
                )));
            }
            Ok(result) => {
                let mut lines = result.render_table().into_iter();
                if let Some(header) = lines.next() {
                    self.messages.push(Line::from(Span::styled(
                        header,
                        Style::default().add_modifier(Modifier::BOLD),
                    )));
                }
                self.messages.extend(lines.map(Line::from));
            }
            Err(e) => self.push_error(e.to_string()),
        }
        self.messages.push(separator());
    }

    fn push_error(&mut self, message: String) {
        self.messages.push(Line::from(Span::styled(
            format!("Error: {}", message),
            Style::default().fg(Color::Red),
        )));
        self.messages.push(separator());
    }
}

fn separator() -> Line<'static> {
    Line::from(Span::styled(
        "-".repeat(50),
        Style::default().fg(Color::DarkGray),
    ))
}
