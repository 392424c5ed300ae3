use ratatui::{
    crossterm::{
        self,
        event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
    prelude::*,
    widgets::*,
};
use std::{
    io::{self, Stdout},
    time::{Duration, Instant},
};

use anyhow::Result;
use treasure_hunt_core::{
    Position,
    agent::{Agent, PlanningAgent},
    environment::{ActionResult, Environment},
    world::WorldMap,
};

struct App {
    /// The island the agent is playing on.
    environment: Environment,
    agent: PlanningAgent,
    /// Ticks left before the run is abandoned.
    steps_left: usize,
    /// Last non-trivial outcome, shown in the status bar.
    outcome: Option<ActionResult>,
    paused: bool,
    should_quit: bool,
}

impl App {
    fn new(environment: Environment, max_steps: usize) -> Self {
        let agent = PlanningAgent::new(environment.config());
        App {
            environment,
            agent,
            steps_left: max_steps,
            outcome: None,
            paused: false,
            should_quit: false,
        }
    }

    fn game_over(&self) -> bool {
        let ended = matches!(
            self.outcome,
            Some(ActionResult::Win | ActionResult::Lost(_))
        );
        ended || self.steps_left == 0
    }

    /// Handles one step of the simulation.
    fn tick(&mut self) {
        if self.paused || self.game_over() {
            return;
        }
        self.steps_left -= 1;
        match self.environment.step(&mut self.agent) {
            Some(ActionResult::Success) => {}
            Some(result) => self.outcome = Some(result),
            None => self.outcome = Some(ActionResult::Failure("Agent is idle.".to_string())),
        }
    }
}

/// Runs the planning agent on `environment`, drawing both the island and the
/// agent's model of it until the game ends and the user quits.
pub fn run(environment: Environment, max_steps: usize) -> Result<Option<ActionResult>> {
    let mut terminal = setup_terminal()?;
    let mut app = App::new(environment, max_steps);
    let result = run_app(&mut terminal, &mut app);
    restore_terminal(&mut terminal)?;
    result?;
    Ok(app.outcome)
}

/// Configures the terminal for TUI interaction.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(Into::into)
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    let tick_rate = Duration::from_millis(150);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if crossterm::event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
                    KeyCode::Char(' ') => app.paused = !app.paused,
                    _ => {}
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.tick();
            last_tick = Instant::now();
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

fn ui(frame: &mut Frame, app: &App) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(70),
            Constraint::Percentage(20),
            Constraint::Percentage(10),
        ])
        .split(frame.area());
    let maps = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(main_layout[0]);

    render_island(frame, maps[0], &app.environment);
    render_world(frame, maps[1], app.agent.world());
    render_status(frame, main_layout[1], app);

    let help = match &app.outcome {
        Some(ActionResult::Win) => "Gold brought home! Press 'q' to quit.".to_string(),
        Some(ActionResult::Lost(reason)) => format!("Lost: {reason} Press 'q' to quit."),
        _ if app.steps_left == 0 => "Out of steps. Press 'q' to quit.".to_string(),
        _ if app.paused => "Paused. 'space' resumes, 'q' or 'Esc' quits.".to_string(),
        _ => "'space' pauses, 'q' or 'Esc' quits.".to_string(),
    };
    let help_text = Paragraph::new(help)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(help_text, main_layout[2]);
}

fn tile_span(c: char) -> Span<'static> {
    let style = match c {
        '~' => Style::default().fg(Color::Blue),
        'T' => Style::default().fg(Color::Green),
        '*' => Style::default().fg(Color::DarkGray),
        '-' => Style::default().fg(Color::Magenta),
        '.' | '?' => Style::default().fg(Color::Black),
        '$' => Style::default().fg(Color::Yellow).bold(),
        'a' | 'k' | 'o' => Style::default().fg(Color::Cyan),
        'O' => Style::default().fg(Color::Gray),
        '^' | '>' | 'v' | '<' => Style::default().fg(Color::Red).bold(),
        _ => Style::default(),
    };
    Span::styled(c.to_string(), style)
}

fn map_lines(text: &str) -> Vec<Line<'static>> {
    text.lines()
        .map(|row| Line::from(row.chars().map(tile_span).collect::<Vec<_>>()))
        .collect()
}

/// Renders the full island with the agent drawn on it.
fn render_island(frame: &mut Frame, area: Rect, environment: &Environment) {
    let island = Paragraph::new(map_lines(&environment.render()))
        .block(Block::default().title("Island").borders(Borders::ALL))
        .alignment(Alignment::Center);
    frame.render_widget(island, area);
}

/// Renders what the agent has seen so far, centred on its position when the
/// map outgrows the panel.
fn render_world(frame: &mut Frame, area: Rect, world: &WorldMap) {
    let (min, max) = world.bounds();
    let player = world.player_tile().position();
    let inner_width = area.width.saturating_sub(2) as i32;
    let inner_height = area.height.saturating_sub(2) as i32;

    let x_end = (max.x - inner_width + 1).max(min.x);
    let y_end = (max.y - inner_height + 1).max(min.y);
    let x_start = (player.x - inner_width / 2).clamp(min.x, x_end);
    let y_start = (player.y - inner_height / 2).clamp(min.y, y_end);

    let mut lines: Vec<Line> = Vec::with_capacity(inner_height.max(0) as usize);
    for y in y_start..=max.y.min(y_start + inner_height - 1) {
        let spans: Vec<Span> = (x_start..=max.x.min(x_start + inner_width - 1))
            .map(|x| tile_span(world.char_at(Position::new(x, y))))
            .collect();
        lines.push(Line::from(spans));
    }

    let title = format!("Known map ({} tiles)", world.len());
    let map_paragraph = Paragraph::new(lines)
        .block(Block::default().title(title).borders(Borders::ALL))
        .alignment(Alignment::Center);
    frame.render_widget(map_paragraph, area);
}

/// Inventory, position and the behaviour being pursued.
fn render_status(frame: &mut Frame, area: Rect, app: &App) {
    let world = app.agent.world();
    let player = world.player();
    let position = world.player_tile().position();

    let mut inventory = vec![Span::raw(format!(
        "Pos: ({}, {}) Steps: {} Inventory: ",
        position.x,
        position.y,
        app.environment.steps()
    ))];
    for (tool, count) in player.inventory() {
        inventory.push(tile_span(tool.to_char()));
        inventory.push(Span::raw(format!("x{count} ")));
    }
    if player.sailing {
        inventory.push(Span::styled("sailing", Style::default().fg(Color::Blue)));
    }

    let plan = match app.agent.plan() {
        Some(plan) => format!(
            "Behaviour: {:?} Target: ({}, {}) Actions left: {}",
            plan.behaviour,
            plan.target.x,
            plan.target.y,
            plan.task.len()
        ),
        None => "Behaviour: none".to_string(),
    };

    let items = vec![
        ListItem::from(Line::from(inventory)),
        ListItem::from(Line::from(plan)),
        ListItem::from(Line::from(format!(
            "Zones merged: {} Known tiles: {}",
            world.zone_merges(),
            world.len()
        ))),
    ];
    let status = List::new(items).block(Block::default().borders(Borders::ALL).title("Agent"));
    frame.render_widget(status, area);
}
