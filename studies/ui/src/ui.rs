use ratatui::{
    buffer::Buffer,
    layout::{ Alignment, Constraint, Direction, Layout, Rect },
    style::{ palette::tailwind, Color, Modifier, Style },
    symbols,
    text::{ Line, Span, Text },
    widgets::{
        canvas::{ Canvas, Circle, Line as Edge },
        Axis,
        Bar,
        BarChart,
        BarGroup,
        Block,
        Borders,
        Cell,
        Chart,
        Dataset,
        Gauge,
        GraphType,
        Padding,
        Paragraph,
        Row,
        Table,
        Tabs,
        Widget,
        Wrap,
    },
    DefaultTerminal,
};
use std::{ sync::{ mpsc::Sender, MutexGuard, PoisonError }, time::Duration };
use crossterm::event::{ self, Event, KeyCode, KeyEventKind };
use color_eyre::Result;
use ratatui::prelude::Stylize;

use crate::state::{ Command, NodeKind, StateMutex, StatePlayground, StepStatus };

const CUSTOM_LABEL_COLOR: Color = tailwind::SLATE.c200;
const INPUT_COLOR: Color = Color::Rgb(0x42, 0x85, 0xf4);
const HIDDEN_COLOR: Color = Color::Rgb(0xa1, 0x42, 0xf4);
const OUTPUT_COLOR: Color = Color::Rgb(0x34, 0xa8, 0x53);

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    #[default]
    Workflow,
    Metrics,
    Architecture,
    Network,
    Comparison,
    Code,
    Data,
}

impl Tab {
    pub const ALL: [Tab; 7] = [
        Tab::Workflow,
        Tab::Metrics,
        Tab::Architecture,
        Tab::Network,
        Tab::Comparison,
        Tab::Code,
        Tab::Data,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Workflow => "Workflow",
            Tab::Metrics => "Metrics",
            Tab::Architecture => "Architecture",
            Tab::Network => "Network",
            Tab::Comparison => "Comparison",
            Tab::Code => "Code",
            Tab::Data => "Data",
        }
    }

    fn index(&self) -> usize {
        Tab::ALL.iter()
            .position(|t| t == self)
            .unwrap_or(0)
    }

    fn shifted(&self, delta: isize) -> Tab {
        let len = Tab::ALL.len() as isize;
        Tab::ALL[((self.index() as isize) + delta).rem_euclid(len) as usize]
    }
}

#[derive(Debug)]
pub struct App {
    pub state: AppState,
    pub playground: StateMutex,
    pub commands: Sender<Command>,
    pub tab: Tab,
    pub selected: usize,
    pub scroll_position: usize,
    pub frame: u64,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    #[default]
    Running,
    Quitting,
}

impl App {
    pub fn new(playground: StateMutex, commands: Sender<Command>) -> App {
        App {
            state: AppState::default(),
            playground,
            commands,
            tab: Tab::default(),
            selected: 0,
            scroll_position: 0,
            frame: 0,
        }
    }

    pub fn run(mut self, mut terminal: DefaultTerminal) -> Result<()> {
        while self.state != AppState::Quitting {
            terminal.draw(|frame| frame.render_widget(&self, frame.area()))?;
            self.handle_events()?;
            self.frame = self.frame.wrapping_add(1);
        }
        Ok(())
    }

    fn handle_events(&mut self) -> Result<()> {
        let timeout = Duration::from_secs_f32(1.0 / 20.0);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    self.handle_key(key.code);
                }
            }
        }
        Ok(())
    }

    pub fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.quit(),
            KeyCode::Char('s') | KeyCode::Enter => self.send(Command::Start),
            KeyCode::Char('r') => self.send(Command::Reset),
            KeyCode::Char('m') => self.send(Command::Save),
            KeyCode::Char('d') => self.send(Command::Deploy),
            KeyCode::Char('f') => self.send(Command::CycleFramework),
            KeyCode::Tab => self.switch_tab(1),
            KeyCode::BackTab => self.switch_tab(-1),
            KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Down => {
                let last = self.lock().params.len().saturating_sub(1);
                self.selected = (self.selected + 1).min(last);
            }
            KeyCode::Left => self.send(Command::Adjust { field: self.selected, delta: -1 }),
            KeyCode::Right => self.send(Command::Adjust { field: self.selected, delta: 1 }),
            KeyCode::PageDown => {
                self.scroll_position += 10;
            }
            KeyCode::PageUp => {
                self.scroll_position = self.scroll_position.saturating_sub(10);
            }
            _ => {}
        }
    }

    fn switch_tab(&mut self, delta: isize) {
        self.tab = self.tab.shifted(delta);
        self.scroll_position = 0;
    }

    fn send(&mut self, command: Command) {
        if self.commands.send(command).is_err() {
            tracing::warn!(?command, "session is gone, leaving the dashboard");
            self.state = AppState::Quitting;
        }
    }

    fn quit(&mut self) {
        let _ = self.commands.send(Command::Quit);
        self.state = AppState::Quitting;
    }

    fn lock(&self) -> MutexGuard<'_, StatePlayground> {
        self.playground.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let state = self.lock();

        let body = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([Constraint::Max(1), Constraint::Length(3), Constraint::Fill(2), Constraint::Max(1)])
            .split(area);

        let container = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(42), Constraint::Fill(1)])
            .split(body[2]);

        let sidebar = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Fill(1), Constraint::Length(3)])
            .split(container[0]);

        render_header(&state, body[0], buf);
        self.render_tabs(body[1], buf);
        self.render_params(&state, sidebar[0], buf);
        render_progress(&state, sidebar[1], buf);

        let content = container[1];
        match self.tab {
            Tab::Workflow => render_workflow(&state, content, buf),
            Tab::Metrics => render_metrics(&state, content, buf),
            Tab::Architecture => render_architecture(&state, content, buf),
            Tab::Network => self.render_network(&state, content, buf),
            Tab::Comparison => render_comparison(&state, content, buf),
            Tab::Code => self.render_code(&state, content, buf),
            Tab::Data => render_dataset(&state, content, buf),
        }

        render_footer(&state, body[3], buf);
    }
}

fn render_header(state: &StatePlayground, area: Rect, buf: &mut Buffer) {
    let mut spans = vec![
        Span::from("ML Playground  ").bold(),
        Span::from(state.headline.clone())
    ];
    if let Some(badge) = &state.badge {
        let color = match badge.as_str() {
            "Failed" => Color::Red,
            "Success" => Color::Green,
            _ => Color::Cyan,
        };
        spans.push(Span::from(format!("  [{badge}]")).fg(color).bold());
    }
    Paragraph::new(Line::from(spans))
        .alignment(Alignment::Left)
        .fg(CUSTOM_LABEL_COLOR)
        .render(area, buf);
}

fn render_footer(state: &StatePlayground, area: Rect, buf: &mut Buffer) {
    let text = match &state.notice {
        Some(notice) => notice.clone(),
        None =>
            "s start  r reset  m save  d deploy  f framework  ↑↓ select  ←→ adjust  tab switch  q quit".to_string(),
    };
    Paragraph::new(text).alignment(Alignment::Center).fg(CUSTOM_LABEL_COLOR).render(area, buf);
}

fn render_progress(state: &StatePlayground, area: Rect, buf: &mut Buffer) {
    let progress = &state.progress;
    Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Epochs"))
        .gauge_style(Style::default().fg(Color::Cyan))
        .ratio(ratio(progress.percent))
        .label(format!("{}/{}", progress.current_epoch, progress.max_epoch))
        .render(area, buf);
}

/// Gauge ratio for a percentage, kept inside `[0, 1]`.
fn ratio(percent: f64) -> f64 {
    if percent.is_finite() { (percent / 100.0).clamp(0.0, 1.0) } else { 0.0 }
}

impl App {
    fn render_tabs(&self, area: Rect, buf: &mut Buffer) {
        Tabs::new(Tab::ALL.iter().map(|t| t.title()))
            .block(Block::default().borders(Borders::ALL))
            .select(self.tab.index())
            .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .divider(symbols::line::VERTICAL)
            .render(area, buf);
    }

    fn render_params(&self, state: &StatePlayground, area: Rect, buf: &mut Buffer) {
        let rows = state.params
            .iter()
            .enumerate()
            .map(|(idx, param)| {
                let row = Row::new(vec![Cell::from(param.label.clone()), Cell::from(param.value.clone())]);
                if idx == self.selected {
                    row.style(Style::default().fg(Color::Black).bg(Color::Cyan))
                } else {
                    row
                }
            });

        Table::new(rows, [Constraint::Length(20), Constraint::Fill(1)])
            .block(title_block("Parameters"))
            .render(area, buf);
    }

    fn render_network(&self, state: &StatePlayground, area: Rect, buf: &mut Buffer) {
        let network = &state.network;
        let (min_x, max_x) = network.nodes
            .iter()
            .fold((-1.0f64, 1.0f64), |(lo, hi), n| (lo.min(n.x), hi.max(n.x)));
        let edge_color = if network.opacity < 0.15 { Color::DarkGray } else { Color::Gray };
        let radius = if network.pulsing && (self.frame / 5) % 2 == 0 { 0.45 } else { 0.3 };

        Canvas::default()
            .block(title_block(&format!("Network {}", network.structure)))
            .marker(symbols::Marker::Braille)
            .x_bounds([min_x - 2.0, max_x + 2.0])
            .y_bounds([-5.0, 5.0])
            .paint(|ctx| {
                for ((x1, y1), (x2, y2)) in &network.edges {
                    ctx.draw(&Edge::new(*x1, *y1, *x2, *y2, edge_color));
                }
                ctx.layer();
                for node in &network.nodes {
                    let color = match node.kind {
                        NodeKind::Input => INPUT_COLOR,
                        NodeKind::Hidden => HIDDEN_COLOR,
                        NodeKind::Output => OUTPUT_COLOR,
                    };
                    ctx.draw(&Circle { x: node.x, y: node.y, radius, color });
                }
            })
            .render(area, buf);
    }

    fn render_code(&self, state: &StatePlayground, area: Rect, buf: &mut Buffer) {
        let Some(code) = &state.code else {
            Paragraph::new(
                "No Model Code Available\n\nTrain a model first to see the generated code for implementing it in different frameworks."
            )
                .block(title_block("Code"))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .render(area, buf);
            return;
        };

        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Fill(1), Constraint::Length((code.summary.len() as u16) + 2)])
            .split(area);

        let mut title = format!("{} · {}", code.framework, code.file_name);
        if let Some(badge) = &code.badge {
            title.push_str(&format!(" · {badge}"));
        }
        let text: Text = code.lines
            .iter()
            .map(|line| Line::from(line.as_str()))
            .collect::<Vec<_>>()
            .into();
        let scroll = self.scroll_position.min(code.lines.len().saturating_sub(1)) as u16;
        Paragraph::new(text)
            .block(title_block(&title))
            .scroll((scroll, 0))
            .render(sections[0], buf);

        Paragraph::new(code.summary.join("\n"))
            .block(Block::default().borders(Borders::ALL).title("Model Architecture"))
            .render(sections[1], buf);
    }
}

fn render_workflow(state: &StatePlayground, area: Rect, buf: &mut Buffer) {
    let mut lines = Vec::new();
    for (idx, step) in state.steps.iter().enumerate() {
        let (marker, color) = match step.status {
            StepStatus::Completed => ("✔", Color::Green),
            StepStatus::Current => ("●", Color::Cyan),
            StepStatus::Error => ("✖", Color::Red),
            StepStatus::Pending => ("○", Color::DarkGray),
        };
        lines.push(
            Line::from(vec![
                Span::from(format!("{marker} {}. {}", idx + 1, step.name)).fg(color).bold()
            ])
        );
        lines.push(Line::from(format!("    {}", step.description)));
        if let Some(detail) = &step.detail {
            lines.push(Line::from(format!("    {detail}")).fg(color));
        }
        lines.push(Line::default());
    }
    Paragraph::new(lines).block(title_block("ML Workflow")).render(area, buf);
}

fn render_metrics(state: &StatePlayground, area: Rect, buf: &mut Buffer) {
    if state.metrics.is_empty() {
        Paragraph::new("Start training to see model performance metrics.")
            .block(title_block("Metrics"))
            .alignment(Alignment::Center)
            .render(area, buf);
        return;
    }

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(12), Constraint::Length(4), Constraint::Fill(1)])
        .split(area);

    let bars: Vec<Bar> = state.metrics
        .iter()
        .map(|(label, value)| {
            Bar::default()
                .value(*value)
                .label(Line::from(label.clone()))
                .text_value(format!("{value}%"))
        })
        .collect();
    BarChart::default()
        .block(title_block("Performance"))
        .bar_width(11)
        .bar_gap(2)
        .max(100)
        .bar_style(Style::default().fg(Color::Magenta))
        .data(BarGroup::default().bars(&bars))
        .render(sections[0], buf);

    let mut summary = vec![];
    if let Some(loss) = state.loss {
        summary.push(format!("Loss: {loss:.4}"));
    }
    if let Some(quality) = &state.quality {
        summary.push(format!("Model quality: {quality}"));
    }
    if let Some(insight) = &state.insight {
        summary.push(insight.clone());
    }
    Paragraph::new(summary.join("\n"))
        .wrap(Wrap { trim: true })
        .fg(CUSTOM_LABEL_COLOR)
        .render(sections[1], buf);

    let history = &state.history;
    let max_x = history.accuracy
        .last()
        .map_or(1.0, |(x, _)| x.max(1.0));
    let datasets = vec![
        Dataset::default()
            .name("accuracy")
            .marker(symbols::Marker::Braille)
            .style(Style::default().fg(Color::Green))
            .graph_type(GraphType::Line)
            .data(&history.accuracy),
        Dataset::default()
            .name("loss")
            .marker(symbols::Marker::Braille)
            .style(Style::default().fg(Color::Yellow))
            .graph_type(GraphType::Line)
            .data(&history.loss)
    ];
    Chart::new(datasets)
        .block(title_block("Training History"))
        .x_axis(
            Axis::default()
                .title("Epochs")
                .bounds([0.0, max_x])
                .labels(["0".to_string(), format!("{max_x}")])
                .style(Style::default().fg(Color::Gray))
        )
        .y_axis(
            Axis::default()
                .title("Value")
                .bounds([0.0, 1.0])
                .labels(["0", "0.5", "1"])
                .style(Style::default().fg(Color::Gray))
        )
        .render(sections[2], buf);
}

fn render_architecture(state: &StatePlayground, area: Rect, buf: &mut Buffer) {
    let header = Row::new(vec!["Layer", "Neurons", "Activation"]).bold();
    let rows = state.architecture.iter().map(|layer| Row::new(layer.to_vec()));
    Table::new(rows, [Constraint::Percentage(40), Constraint::Percentage(25), Constraint::Fill(1)])
        .header(header)
        .block(title_block(&format!("Architecture · {} trainable parameters", state.total_params)))
        .render(area, buf);
}

fn render_comparison(state: &StatePlayground, area: Rect, buf: &mut Buffer) {
    let comparison = &state.comparison;
    if comparison.rows.is_empty() {
        Paragraph::new("Train and save models to compare them.")
            .block(title_block("Model Comparison"))
            .alignment(Alignment::Center)
            .render(area, buf);
        return;
    }

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Fill(1), Constraint::Length(10), Constraint::Fill(1)])
        .split(area);

    let header = Row::new(comparison.header.clone()).bold();
    let rows = comparison.rows
        .iter()
        .zip(comparison.improved.iter().chain(std::iter::repeat(&false)))
        .map(|(row, improved)| {
            let row = Row::new(row.clone());
            if *improved { row.fg(Color::Green) } else { row }
        });
    let widths = vec![Constraint::Fill(1); comparison.header.len().max(1)];
    Table::new(rows, widths)
        .header(header)
        .block(title_block("Model Comparison"))
        .render(sections[0], buf);

    let bars: Vec<Bar> = comparison.accuracy
        .iter()
        .map(|(name, value)| {
            Bar::default().value(*value).label(Line::from(name.clone())).text_value(format!("{value}%"))
        })
        .collect();
    BarChart::default()
        .block(Block::default().borders(Borders::ALL).title("Accuracy"))
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .max(100)
        .bar_style(Style::default().fg(Color::Blue))
        .data(BarGroup::default().bars(&bars))
        .render(sections[1], buf);

    let header = Row::new(vec!["Model", "LR", "Epochs", "Batch", "Dropout", "Layers"]).bold();
    let rows = comparison.parameters.iter().map(|row| Row::new(row.clone()));
    Table::new(rows, vec![Constraint::Fill(1); 6])
        .header(header)
        .block(Block::default().borders(Borders::ALL).title("Parameters"))
        .render(sections[2], buf);
}

fn render_dataset(state: &StatePlayground, area: Rect, buf: &mut Buffer) {
    let dataset = &state.dataset;
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length((dataset.facts.len() as u16) + 5), Constraint::Fill(1)])
        .split(area);

    let mut lines = vec![Line::from(dataset.description.clone()).italic(), Line::default()];
    lines.extend(
        dataset.facts
            .iter()
            .map(|(key, value)| Line::from(vec![Span::from(format!("{key}: ")).bold(), Span::from(value.clone())]))
    );
    Paragraph::new(lines)
        .block(title_block(&dataset.name))
        .wrap(Wrap { trim: true })
        .render(sections[0], buf);

    let mut samples = dataset.samples.iter();
    let Some(header) = samples.next() else {
        return;
    };
    let widths = vec![Constraint::Fill(1); header.len().max(1)];
    Table::new(
        samples.map(|row| Row::new(row.clone())),
        widths
    )
        .header(Row::new(header.clone()).bold())
        .block(Block::default().borders(Borders::ALL).title("Sample Data"))
        .render(sections[1], buf);
}

fn title_block(title: &str) -> Block<'_> {
    Block::new()
        .borders(Borders::ALL)
        .padding(Padding::horizontal(1))
        .title(Line::from(title).alignment(Alignment::Center))
        .fg(CUSTOM_LABEL_COLOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{ mpsc, Arc, Mutex };

    fn app() -> (App, mpsc::Receiver<Command>) {
        let (tx, rx) = mpsc::channel();
        let mut state = StatePlayground::default();
        state.params = (0..3)
            .map(|i| crate::state::ParamRow { label: format!("p{i}"), value: i.to_string() })
            .collect();
        (App::new(Arc::new(Mutex::new(state)), tx), rx)
    }

    #[test]
    fn test_keys_map_to_commands() {
        let (mut app, rx) = app();
        app.handle_key(KeyCode::Char('s'));
        app.handle_key(KeyCode::Down);
        app.handle_key(KeyCode::Right);
        app.handle_key(KeyCode::Char('m'));
        app.handle_key(KeyCode::Char('q'));

        let commands: Vec<_> = rx.try_iter().collect();
        assert_eq!(commands, vec![
            Command::Start,
            Command::Adjust { field: 1, delta: 1 },
            Command::Save,
            Command::Quit,
        ]);
        assert_eq!(app.state, AppState::Quitting);
    }

    #[test]
    fn test_selection_stays_on_params() {
        let (mut app, _rx) = app();
        for _ in 0..10 {
            app.handle_key(KeyCode::Down);
        }
        assert_eq!(app.selected, 2);
        app.handle_key(KeyCode::Up);
        assert_eq!(app.selected, 1);
    }

    #[test]
    fn test_tabs_wrap() {
        let (mut app, _rx) = app();
        app.handle_key(KeyCode::BackTab);
        assert_eq!(app.tab, Tab::Data);
        app.handle_key(KeyCode::Tab);
        assert_eq!(app.tab, Tab::Workflow);
    }

    #[test]
    fn test_gauge_ratio_is_clamped() {
        assert_eq!(ratio(150.0), 1.0);
        assert_eq!(ratio(-3.0), 0.0);
        assert_eq!(ratio(f64::NAN), 0.0);
        assert_eq!(ratio(40.0), 0.4);
    }

    #[test]
    fn test_renders_every_tab() {
        let (mut app, _rx) = app();
        let area = Rect::new(0, 0, 120, 40);
        for tab in Tab::ALL {
            app.tab = tab;
            let mut buf = Buffer::empty(area);
            (&app).render(area, &mut buf);
        }
    }

    #[test]
    fn test_closed_channel_quits() {
        let (mut app, rx) = app();
        drop(rx);
        app.handle_key(KeyCode::Char('r'));
        assert_eq!(app.state, AppState::Quitting);
    }
}
