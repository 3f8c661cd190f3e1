//! TUI module - Terminal dashboard with ratatui

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    symbols,
    widgets::{Axis, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table},
};
use std::io::{stdout, Stdout};
use tracing::error;

use crate::logbook::{Logbook, SetInput};
use crate::view::{self, HISTORY_COLUMNS, HistoryTable, Max5Series, Panel};

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Form fields in focus order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Workout,
    Exercise,
    Reps,
    Weight,
    Form,
    Rir,
    Comments,
}

impl Field {
    const ALL: [Field; 7] = [
        Field::Workout,
        Field::Exercise,
        Field::Reps,
        Field::Weight,
        Field::Form,
        Field::Rir,
        Field::Comments,
    ];

    fn label(&self) -> &'static str {
        match self {
            Field::Workout => "Workout",
            Field::Exercise => "Exercise",
            Field::Reps => "Reps",
            Field::Weight => "Weight",
            Field::Form => "Form",
            Field::Rir => "RIR",
            Field::Comments => "Comments",
        }
    }

    fn position(&self) -> usize {
        Field::ALL.iter().position(|f| f == self).unwrap_or(0)
    }

    fn next(&self) -> Field {
        Field::ALL[(self.position() + 1) % Field::ALL.len()]
    }

    fn prev(&self) -> Field {
        Field::ALL[(self.position() + Field::ALL.len() - 1) % Field::ALL.len()]
    }

    fn accepts(&self, c: char) -> bool {
        match self {
            Field::Workout | Field::Exercise => false,
            Field::Reps | Field::Form | Field::Rir => c.is_ascii_digit(),
            Field::Weight => c.is_ascii_digit() || c == '.',
            Field::Comments => !c.is_control(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Status {
    pub message: String,
    pub ok: bool,
}

/// App state for TUI
pub struct App {
    logbook: Logbook,
    workout: Option<usize>,
    exercise: Option<usize>,
    reps: String,
    weight: String,
    form: String,
    rir: String,
    comments: String,
    focus: Field,
    status: Option<Status>,
    /// `status` shows a history load error
    load_failed: bool,
    history: Panel,
    chart: Panel,
    should_quit: bool,
}

impl App {
    pub fn new(logbook: Logbook) -> Self {
        let empty = Panel::NoData { message: "Select a workout and an exercise.".to_string() };
        Self {
            logbook,
            workout: None,
            exercise: None,
            reps: String::new(),
            weight: String::new(),
            form: String::new(),
            rir: String::new(),
            comments: String::new(),
            focus: Field::Workout,
            status: None,
            load_failed: false,
            history: empty.clone(),
            chart: empty,
            should_quit: false,
        }
    }

    /// Run the TUI application
    pub fn run(&mut self) -> Result<()> {
        let mut terminal = init_terminal()?;

        let result = self.event_loop(&mut terminal);

        restore_terminal()?;
        result
    }

    fn event_loop(&mut self, terminal: &mut Tui) -> Result<()> {
        while !self.should_quit {
            terminal.draw(|frame| self.render(frame))?;
            self.handle_events()?;
        }
        Ok(())
    }

    pub fn focus(&self) -> Field {
        self.focus
    }

    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    pub fn history(&self) -> &Panel {
        &self.history
    }

    pub fn chart(&self) -> &Panel {
        &self.chart
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn selected_workout(&self) -> Option<&str> {
        let workouts = self.logbook.catalog().workouts();
        self.workout.and_then(|i| workouts.get(i)).map(|w| w.name.as_str())
    }

    pub fn selected_exercise(&self) -> Option<&str> {
        let exercises = self.logbook.catalog().exercises(self.selected_workout()?);
        self.exercise.and_then(|i| exercises.get(i)).map(String::as_str)
    }

    fn input(&self) -> SetInput {
        let text = |s: &str| Some(s.to_string());
        SetInput {
            workout: self.selected_workout().map(str::to_string),
            exercise: self.selected_exercise().map(str::to_string),
            reps: text(&self.reps),
            weight: text(&self.weight),
            form: text(&self.form),
            rir: text(&self.rir),
            comments: text(&self.comments),
        }
    }

    fn text_mut(&mut self, field: Field) -> Option<&mut String> {
        match field {
            Field::Reps => Some(&mut self.reps),
            Field::Weight => Some(&mut self.weight),
            Field::Form => Some(&mut self.form),
            Field::Rir => Some(&mut self.rir),
            Field::Comments => Some(&mut self.comments),
            Field::Workout | Field::Exercise => None,
        }
    }

    fn field_value(&self, field: Field) -> String {
        match field {
            Field::Workout => self.selected_workout().unwrap_or("<select>").to_string(),
            Field::Exercise => self.selected_exercise().unwrap_or("<select>").to_string(),
            Field::Reps => self.reps.clone(),
            Field::Weight => self.weight.clone(),
            Field::Form => self.form.clone(),
            Field::Rir => self.rir.clone(),
            Field::Comments => self.comments.clone(),
        }
    }

    /// Step a selector forwards or backwards through its options
    fn cycle(&mut self, forward: bool) {
        let len = match self.focus {
            Field::Workout => self.logbook.catalog().workouts().len(),
            Field::Exercise => match self.selected_workout() {
                Some(w) => self.logbook.catalog().exercises(w).len(),
                None => 0,
            },
            _ => return,
        };
        if len == 0 {
            return;
        }
        let slot = match self.focus {
            Field::Workout => &mut self.workout,
            _ => &mut self.exercise,
        };
        *slot = Some(match (*slot, forward) {
            (None, true) => 0,
            (None, false) => len - 1,
            (Some(i), true) => (i + 1) % len,
            (Some(i), false) => (i + len - 1) % len,
        });

        if self.focus == Field::Workout {
            self.exercise = None;
        }
        self.refresh();
    }

    /// Reload history and chart for the selected exercise
    fn refresh(&mut self) {
        let Some(exercise) = self.selected_exercise().map(str::to_string) else {
            self.history = Panel::NoData { message: "Select an exercise.".to_string() };
            self.chart = self.history.clone();
            return;
        };
        let panels = self.logbook.history(&exercise).and_then(|history| {
            let series = self.logbook.series(&exercise)?;
            Ok((view::history_panel(&exercise, &history), view::chart_panel(&exercise, &series)))
        });
        match panels {
            Ok((history, chart)) => {
                self.history = history;
                self.chart = chart;
                if self.load_failed {
                    self.status = None;
                    self.load_failed = false;
                }
            }
            Err(e) => {
                error!("Failed to load history for {}: {:#}", exercise, e);
                self.status = Some(Status { message: format!("An error occurred: {}", e), ok: false });
                self.load_failed = true;
            }
        }
    }

    fn save(&mut self) {
        let input = self.input();
        let saved = self.logbook.save(&input);
        self.refresh();
        self.status = Some(match saved {
            Ok(_) => Status { message: "Data saved successfully.".to_string(), ok: true },
            Err(e) => Status { message: e.to_string(), ok: false },
        });
        self.load_failed = false;
    }

    fn handle_events(&mut self) -> Result<()> {
        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                self.handle_key(key);
            }
        }
        Ok(())
    }

    /// Apply one key press
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') if ctrl => self.should_quit = true,
            KeyCode::Char('s') if ctrl => self.save(),
            KeyCode::Enter => self.save(),
            KeyCode::Tab | KeyCode::Down => self.focus = self.focus.next(),
            KeyCode::BackTab | KeyCode::Up => self.focus = self.focus.prev(),
            KeyCode::Right => self.cycle(true),
            KeyCode::Left => self.cycle(false),
            KeyCode::Backspace => {
                if let Some(text) = self.text_mut(self.focus) {
                    text.pop();
                }
            }
            KeyCode::Char(' ') if matches!(self.focus, Field::Workout | Field::Exercise) => self.cycle(true),
            KeyCode::Char(c) if self.focus.accepts(c) => {
                if let Some(text) = self.text_mut(self.focus) {
                    text.push(c);
                }
            }
            _ => {}
        }
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(12),
                Constraint::Length(3),
                Constraint::Length(3),
            ])
            .split(area);

        // Header
        let header = Paragraph::new("liftlog - Workout Log")
            .style(Style::default().fg(Color::Cyan).bold())
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(header, rows[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(40), Constraint::Min(40)])
            .split(rows[1]);

        self.render_form(frame, body[0]);

        let panels = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(9), Constraint::Min(8)])
            .split(body[1]);
        render_history(frame, panels[0], &self.history);
        render_chart(frame, panels[1], &self.chart);

        // Status
        let (text, color) = match &self.status {
            Some(s) if s.ok => (s.message.as_str(), Color::Green),
            Some(s) => (s.message.as_str(), Color::Red),
            None => ("", Color::Reset),
        };
        let status = Paragraph::new(text)
            .style(Style::default().fg(color))
            .block(Block::default().borders(Borders::ALL).title("Status"));
        frame.render_widget(status, rows[2]);

        // Footer
        let footer = Paragraph::new("Esc: quit | Tab/↑↓: field | ←→: choose | Enter: save")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(footer, rows[3]);
    }

    fn render_form(&self, frame: &mut Frame, area: Rect) {
        let lines: Vec<Line> = Field::ALL
            .iter()
            .map(|field| {
                let focused = *field == self.focus;
                let marker = if focused { "> " } else { "  " };
                let value_style = if focused {
                    Style::default().fg(Color::Yellow).bold()
                } else {
                    Style::default()
                };
                Line::from(vec![
                    Span::raw(marker),
                    Span::styled(format!("{:<10}", field.label()), Style::default().bold()),
                    Span::styled(self.field_value(*field), value_style),
                ])
            })
            .collect();

        let form = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Log a set"));
        frame.render_widget(form, area);
    }
}

fn render_history(frame: &mut Frame, area: Rect, panel: &Panel) {
    let block = Block::default().borders(Borders::ALL).title("Exercise History");
    match panel {
        Panel::Table(table) => frame.render_widget(history_table(table).block(block), area),
        other => frame.render_widget(no_data(other).block(block), area),
    }
}

fn history_table(table: &HistoryTable) -> Table<'static> {
    let rows: Vec<Row> = table
        .rows
        .iter()
        .map(|row| {
            let style = if row.highlighted {
                Style::default().bg(Color::Green).fg(Color::Black)
            } else {
                Style::default()
            };
            Row::new(row.cells().into_iter().map(Cell::from).collect::<Vec<_>>()).style(style)
        })
        .collect();

    Table::new(
        rows,
        [
            Constraint::Length(19),
            Constraint::Min(10),
            Constraint::Length(5),
            Constraint::Length(7),
            Constraint::Length(4),
            Constraint::Length(5),
            Constraint::Length(8),
        ],
    )
    .header(Row::new(HISTORY_COLUMNS.to_vec()).style(Style::default().bold()))
}

fn render_chart(frame: &mut Frame, area: Rect, panel: &Panel) {
    match panel {
        Panel::Chart(series) => render_series(frame, area, series),
        other => {
            let block = Block::default().borders(Borders::ALL).title("5Max Over Time");
            frame.render_widget(no_data(other).block(block), area);
        }
    }
}

fn render_series(frame: &mut Frame, area: Rect, series: &Max5Series) {
    let data: Vec<(f64, f64)> = series
        .points
        .iter()
        .map(|(t, v)| (t.and_utc().timestamp() as f64, *v))
        .collect();

    let (mut x_lo, mut x_hi) = match (data.first(), data.last()) {
        (Some(first), Some(last)) => (first.0, last.0),
        _ => (0.0, 1.0),
    };
    if x_hi - x_lo < 1.0 {
        x_lo -= 43_200.0;
        x_hi += 43_200.0;
    }
    let (y_lo, y_hi) = series.value_bounds().unwrap_or((0.0, 1.0));
    let pad = ((y_hi - y_lo) * 0.1).max(1.0);

    let first_label = series.points.first().map(|p| p.0.format("%Y-%m-%d").to_string()).unwrap_or_default();
    let last_label = series.points.last().map(|p| p.0.format("%Y-%m-%d").to_string()).unwrap_or_default();

    let dataset = Dataset::default()
        .name("Max5")
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Cyan))
        .data(&data);

    let chart = Chart::new(vec![dataset])
        .block(Block::default().borders(Borders::ALL).title(series.title.clone()))
        .x_axis(
            Axis::default()
                .title("Time")
                .bounds([x_lo, x_hi])
                .labels(vec![first_label, last_label]),
        )
        .y_axis(
            Axis::default()
                .title("Max5")
                .bounds([y_lo - pad, y_hi + pad])
                .labels(vec![format!("{:.1}", y_lo - pad), format!("{:.1}", y_hi + pad)]),
        );
    frame.render_widget(chart, area);
}

fn no_data(panel: &Panel) -> Paragraph<'static> {
    let message = match panel {
        Panel::NoData { message } => message.clone(),
        _ => String::new(),
    };
    Paragraph::new(message).style(Style::default().fg(Color::DarkGray))
}

fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    Ok(terminal)
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}
