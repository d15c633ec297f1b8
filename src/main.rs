pub mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use pileup::{
    app_dirs::AppDirs,
    audio::{Clock, SimulatedAudio, SystemClock},
    config::{Config, ConfigStore, FileConfigStore},
    generator::RandomStationGenerator,
    history::ContactDb,
    mode::Mode,
    runtime::{CrosstermEventSource, FixedTicker, Runner, Ticker, TrainerEvent, TrainerEventSource},
    session::{CommandOutcome, SessionController, SessionOptions},
    PileupError,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::PathBuf,
    sync::Mutex,
    time::Duration,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const TICK_RATE_MS: u64 = 50;

/// morse code contact trainer: work single callers, contests and pileups from the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal Morse code contact trainer. Call CQ, copy callsigns from single callers or pileups, and log contacts in contest, POTA, SST and CWT style exchanges."
)]
pub struct Cli {
    /// operating mode
    #[clap(short = 'm', long, value_enum)]
    mode: Option<Mode>,

    /// your callsign
    #[clap(short = 'c', long)]
    callsign: Option<String>,

    /// fewest stations calling at once in pileup modes
    #[clap(long)]
    min_stations: Option<usize>,

    /// most stations calling at once in pileup modes
    #[clap(long)]
    max_stations: Option<usize>,

    /// send exchanges with cut numbers (T for 0, N for 9, ...)
    #[clap(long)]
    cut_numbers: bool,

    /// seed the random number generator for a reproducible session
    #[clap(long)]
    seed: Option<u64>,

    /// print the effective configuration as JSON and exit
    #[clap(long)]
    print_config: bool,

    /// write the contact history as CSV to PATH and exit
    #[clap(long, value_name = "PATH")]
    export_log: Option<PathBuf>,
}

impl Cli {
    /// Overlay command line flags on the stored config.
    fn apply(&self, cfg: &mut Config) {
        if let Some(mode) = self.mode {
            cfg.mode = mode;
        }
        if let Some(callsign) = &self.callsign {
            cfg.callsign = callsign.clone();
        }
        if let Some(min) = self.min_stations {
            cfg.min_stations = min;
        }
        if let Some(max) = self.max_stations {
            cfg.max_stations = max;
        }
        if self.cut_numbers {
            cfg.enable_cut_numbers = true;
        }
        cfg.validate();
    }
}

/// Input box with keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Response,
    Info,
    Info2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Operating,
    Summary,
}

pub type Session<C> = SessionController<SimulatedAudio<C>, RandomStationGenerator>;

pub struct App<C: Clock = SystemClock> {
    pub session: Session<C>,
    pub config: Config,
    pub state: AppState,
    pub response: String,
    pub info: String,
    pub info2: String,
    pub focus: Field,
    pub status: String,
    pub history: Option<ContactDb>,
    pub store: Option<Box<dyn ConfigStore>>,
}

impl<C: Clock> App<C> {
    pub fn new(config: Config, clock: C, seed: Option<u64>) -> pileup::Result<Self> {
        let mut options = SessionOptions::from_config(&config);
        options.seed = seed;
        let generator = RandomStationGenerator::new(&config)?;

        Ok(Self {
            session: SessionController::new(options, SimulatedAudio::new(clock), generator),
            config,
            state: AppState::Operating,
            response: String::new(),
            info: String::new(),
            info2: String::new(),
            focus: Field::Response,
            status: "Space or F1 to call CQ".to_string(),
            history: None,
            store: None,
        })
    }

    pub fn with_history(mut self, db: ContactDb) -> Self {
        self.history = Some(db);
        self
    }

    /// Persist config changes made from the TUI.
    pub fn with_store(mut self, store: Box<dyn ConfigStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Fields the current mode uses, in tab order.
    pub fn fields(&self) -> Vec<Field> {
        let cfg = self.session.mode().config();
        let mut fields = vec![Field::Response];
        if cfg.requires_info_field {
            fields.push(Field::Info);
        }
        if cfg.requires_info_field2 {
            fields.push(Field::Info2);
        }
        fields
    }

    /// Returns `false` when the user asked to quit.
    pub fn on_key(&mut self, key: KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return false,
            KeyCode::Char('c') if ctrl => return false,
            KeyCode::F(3) => {
                self.state = match self.state {
                    AppState::Operating => AppState::Summary,
                    AppState::Summary => AppState::Operating,
                };
            }
            _ if self.state == AppState::Summary => {}
            KeyCode::F(1) => {
                let outcome = self.session.call_cq();
                self.handle(outcome);
            }
            KeyCode::F(2) => self.change_mode(self.session.mode().next()),
            KeyCode::F(4) => {
                let outcome = self.session.stop();
                self.handle(outcome);
            }
            KeyCode::F(5) => {
                let outcome = self.session.reset();
                self.handle(outcome);
            }
            KeyCode::Enter => match self.focus {
                Field::Response => self.send(),
                Field::Info | Field::Info2 => self.confirm(),
            },
            KeyCode::Tab => {
                let fields = self.fields();
                let idx = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
                self.focus = fields[(idx + 1) % fields.len()];
            }
            KeyCode::Backspace => {
                self.focused_mut().pop();
            }
            KeyCode::Char(' ') if self.focus == Field::Response && self.response.is_empty() => {
                let outcome = if self.session.is_running() {
                    self.session.stop()
                } else {
                    self.session.call_cq()
                };
                self.handle(outcome);
            }
            KeyCode::Char(c) => {
                self.focused_mut().push(c.to_ascii_uppercase());
            }
            _ => {}
        }
        true
    }

    pub fn change_mode(&mut self, mode: Mode) {
        let outcome = self.session.change_mode(mode);
        self.config.mode = mode;
        if let Some(store) = &self.store {
            if let Err(err) = store.save(&self.config) {
                warn!(%err, "failed to save config");
            }
        }
        self.handle(outcome);
    }

    fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            Field::Response => &mut self.response,
            Field::Info => &mut self.info,
            Field::Info2 => &mut self.info2,
        }
    }

    fn send(&mut self) {
        let text = self.response.clone();
        let outcome = self.session.submit(&text);
        self.handle(outcome);
    }

    fn confirm(&mut self) {
        let (info, info2) = (self.info.clone(), self.info2.clone());
        let outcome = self.session.confirm_exchange(&info, &info2);
        self.handle(outcome);
    }

    fn clear_fields(&mut self) {
        self.response.clear();
        self.info.clear();
        self.info2.clear();
        self.focus = Field::Response;
    }

    fn handle(&mut self, outcome: CommandOutcome) {
        self.status = match outcome {
            CommandOutcome::Ignored(reason) => reason.to_string(),
            CommandOutcome::CalledCq { responding } => format!("CQ: {responding} calling"),
            CommandOutcome::Repeated { .. } | CommandOutcome::SlowedDown { .. } => {
                self.response.clear();
                "Listen again".to_string()
            }
            CommandOutcome::Unsure { .. } => "RR".to_string(),
            CommandOutcome::AwaitingConfirmation { .. } => {
                self.response.clear();
                if self.fields().contains(&Field::Info) {
                    self.focus = Field::Info;
                }
                "Copy the exchange, Enter to send TU".to_string()
            }
            CommandOutcome::Logged(contact) => {
                if let Some(db) = &self.history {
                    if let Err(err) = db.record(&contact) {
                        warn!(%err, "failed to store contact");
                    }
                }
                self.clear_fields();
                format!(
                    "Logged {} after {} attempt(s)",
                    contact.callsign, contact.attempts
                )
            }
            CommandOutcome::PartialMatch { responding } => {
                format!("{responding} partial match(es)")
            }
            CommandOutcome::NoMatch { .. } => "No match".to_string(),
            CommandOutcome::Stopped => {
                self.clear_fields();
                "Stopped".to_string()
            }
            CommandOutcome::Reset => {
                self.clear_fields();
                "Reset".to_string()
            }
            CommandOutcome::ModeChanged(mode) => {
                self.clear_fields();
                format!("{} mode", mode.config().name)
            }
        };
    }
}

fn init_logging() -> pileup::Result<PathBuf> {
    let path = AppDirs::log_path().ok_or(PileupError::NoStateDir("pileup.log"))?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| PileupError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("PILEUP_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(path)
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let store = FileConfigStore::new();
    let mut config = store.load();
    cli.apply(&mut config);

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    if let Some(path) = &cli.export_log {
        let written = ContactDb::open_default()?.export_csv_to_path(path)?;
        println!("exported {written} contacts to {}", path.display());
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    // the TUI owns the terminal, so logging goes to a file or nowhere
    if let Ok(path) = init_logging() {
        info!(path = %path.display(), mode = %config.mode, "starting");
    }

    let mut app = App::new(config, SystemClock::new(), cli.seed)?
        .with_store(Box::new(store));
    match ContactDb::open_default() {
        Ok(db) => app = app.with_history(db),
        Err(err) => warn!(%err, "contact history disabled"),
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );
    let result = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Some(store) = &app.store {
        if let Err(err) = store.save(&app.config) {
            warn!(%err, "failed to save config");
        }
    }
    let summary = app.session.summary();
    info!(contacts = summary.contacts, "session finished");
    result
}

fn start_tui<B, C, E, T>(
    terminal: &mut Terminal<B>,
    app: &mut App<C>,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>>
where
    B: Backend,
    C: Clock,
    E: TrainerEventSource,
    T: Ticker,
{
    terminal.draw(|f| ui(app, f))?;

    loop {
        match runner.step() {
            TrainerEvent::Tick | TrainerEvent::Resize => {}
            TrainerEvent::Key(key) => {
                if !app.on_key(key) {
                    break;
                }
            }
        }
        terminal.draw(|f| ui(app, f))?;
    }

    Ok(())
}

fn ui<C: Clock>(app: &mut App<C>, f: &mut Frame) {
    let screen = ui::screen::current_screen::<C>(&app.state);
    screen.render(app, f);
}
