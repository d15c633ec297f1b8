//! The contact state machine.
//!
//! [`SessionController`] owns everything one training session needs: the
//! trainee's station, the calling stations, the mistake tracker and the
//! audio timeline. UI commands come in as method calls and every command
//! returns a [`CommandOutcome`]; nothing in here fails.

use crate::adaptive::MistakeTracker;
use crate::audio::{AudioEngine, Sender};
use crate::compare::{check_field, FieldCheck};
use crate::config::Config;
use crate::exchange::{CutNumbers, ExchangeRenderer};
use crate::generator::{your_station, StationGenerator};
use crate::matcher::{CallsignMatcher, EditDistanceMatcher, MatchKind};
use crate::mode::{Mode, ModeConfig, NoMatchResponse, Roster};
use crate::pool::{StationId, StationPool};
use crate::station::Station;
use crate::timing::Scheduler;
use crate::util::{mean, std_dev};
use chrono::{DateTime, Local};
use itertools::Itertools;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info};

/// Farnsworth WPM removed per QRS request.
pub const QRS_STEP: u32 = 6;
/// Chance that one more station joins after a contact is logged.
pub const JOIN_PROBABILITY: f64 = 0.4;

const REPEAT_REQUESTS: [&str; 3] = ["?", "AGN", "AGN?"];
const UNSURE_REPLY_GAP: f64 = 0.25;
const EXCHANGE_GAP: f64 = 0.5;
const NEXT_STATION_GAP: f64 = 1.0;

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub mode: Mode,
    pub you: Station,
    pub min_stations: usize,
    pub max_stations: usize,
    pub cut_numbers: Option<CutNumbers>,
    /// Fixed RNG seed for reproducible sessions.
    pub seed: Option<u64>,
}

impl SessionOptions {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            mode: cfg.mode,
            you: your_station(cfg),
            min_stations: cfg.min_stations,
            max_stations: cfg.max_stations,
            cut_numbers: cfg.cut_numbers(),
            seed: None,
        }
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// No station is calling; a CQ starts the session.
    #[default]
    Idle,
    AwaitingSubmission,
    /// A callsign was confirmed in a mode with a TU step; `station` is the
    /// one being worked and only resolves while in this phase.
    AwaitingExchangeConfirmation { station: StationId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum IgnoreReason {
    #[strum(serialize = "audio is still playing")]
    AudioLocked,
    #[strum(serialize = "no station is calling")]
    NoActiveStation,
    #[strum(serialize = "a station is already calling")]
    StationAlreadyActive,
    #[strum(serialize = "nothing to send")]
    EmptySubmission,
    #[strum(serialize = "no exchange to confirm")]
    NotReadyForConfirmation,
}

/// What a command did.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Ignored(IgnoreReason),
    CalledCq { responding: usize },
    Repeated { responding: usize },
    SlowedDown { responding: usize },
    /// Perfect match sent with a trailing `?`; the station answered `RR`.
    Unsure { callsign: String },
    /// Exchange sent, waiting for the copied fields.
    AwaitingConfirmation { callsign: String },
    Logged(LoggedContact),
    PartialMatch { responding: usize },
    NoMatch { responding: usize },
    Stopped,
    Reset,
    ModeChanged(Mode),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoggedContact {
    pub number: u32,
    pub mode: Mode,
    pub callsign: String,
    /// `wpm`, or `wpm / farnsworth` when the station was slowed down.
    pub speed: String,
    pub attempts: u32,
    /// Seconds from the start of the contact to the log entry.
    pub elapsed: f64,
    pub annotation: String,
    #[serde(skip)]
    pub checks: Vec<FieldCheck>,
    pub timestamp: DateTime<Local>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SessionSummary {
    pub contacts: usize,
    pub mean_attempts: Option<f64>,
    pub mean_elapsed: Option<f64>,
    /// Spread of the per-contact times, in seconds.
    pub elapsed_std_dev: Option<f64>,
}

pub struct SessionController<A, G, M = EditDistanceMatcher>
where
    A: AudioEngine,
    G: StationGenerator,
    M: CallsignMatcher,
{
    mode: Mode,
    you: Station,
    pool: StationPool,
    pileup_bounds: (usize, usize),
    tracker: MistakeTracker,
    scheduler: Scheduler<A>,
    renderer: ExchangeRenderer,
    generator: G,
    matcher: M,
    rng: StdRng,
    phase: SessionPhase,
    attempts: u32,
    contact_start: Option<f64>,
    total_contacts: u32,
    last_responding: Vec<StationId>,
    log: Vec<LoggedContact>,
}

impl<A: AudioEngine, G: StationGenerator> SessionController<A, G, EditDistanceMatcher> {
    pub fn new(options: SessionOptions, audio: A, generator: G) -> Self {
        Self::with_matcher(options, audio, generator, EditDistanceMatcher::default())
    }
}

impl<A, G, M> SessionController<A, G, M>
where
    A: AudioEngine,
    G: StationGenerator,
    M: CallsignMatcher,
{
    pub fn with_matcher(options: SessionOptions, audio: A, generator: G, matcher: M) -> Self {
        let min = options.min_stations.max(1);
        let pileup_bounds = (min, options.max_stations.max(min));
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let (lo, hi) = bounds_for(options.mode, pileup_bounds);

        Self {
            mode: options.mode,
            you: options.you,
            pool: StationPool::new(lo, hi),
            pileup_bounds,
            tracker: MistakeTracker::new(),
            scheduler: Scheduler::new(audio),
            renderer: ExchangeRenderer::new(options.cut_numbers),
            generator,
            matcher,
            rng,
            phase: SessionPhase::Idle,
            attempts: 0,
            contact_start: None,
            total_contacts: 0,
            last_responding: Vec::new(),
            log: Vec::new(),
        }
    }

    fn config(&self) -> &'static ModeConfig {
        self.mode.config()
    }

    fn ignore(&self, reason: IgnoreReason) -> CommandOutcome {
        debug!(%reason, "command ignored");
        CommandOutcome::Ignored(reason)
    }

    /// Start calling, or draw more callers into a running pileup.
    pub fn call_cq(&mut self) -> CommandOutcome {
        if self.is_locked() {
            return self.ignore(IgnoreReason::AudioLocked);
        }
        let cfg = self.config();
        if cfg.roster == Roster::Single && !self.pool.is_empty() {
            return self.ignore(IgnoreReason::StationAlreadyActive);
        }

        let now = self.scheduler.now();
        let cq = self.renderer.cq(cfg, &self.you);
        let end = self.transmit_you(&cq, now);

        let responding = match cfg.roster {
            Roster::Single => {
                self.next_single_station(end);
                self.pool.len()
            }
            Roster::Pileup => {
                if self.pool.is_empty() {
                    self.pool
                        .ensure_minimum(&mut self.generator, &self.tracker, &mut self.rng);
                } else {
                    self.pool
                        .maybe_add_one(1.0, &mut self.generator, &self.tracker, &mut self.rng);
                }
                if self.contact_start.is_none() {
                    self.contact_start = Some(now);
                }
                if self.phase == SessionPhase::Idle {
                    self.phase = SessionPhase::AwaitingSubmission;
                }
                self.respond_all(end)
            }
        };

        info!(mode = %self.mode, responding, "called CQ");
        CommandOutcome::CalledCq { responding }
    }

    /// Handle one line typed into the response field.
    pub fn submit(&mut self, text: &str) -> CommandOutcome {
        if self.is_locked() {
            return self.ignore(IgnoreReason::AudioLocked);
        }
        let text = text.trim().to_uppercase();
        if text.is_empty() {
            return if self.pool.is_empty() {
                self.call_cq()
            } else {
                self.ignore(IgnoreReason::EmptySubmission)
            };
        }
        if self.pool.is_empty() {
            return self.ignore(IgnoreReason::NoActiveStation);
        }

        let now = self.scheduler.now();
        let sent = self.transmit_you(&text, now);
        debug!(%text, "sent");

        if REPEAT_REQUESTS.contains(&text.as_str()) {
            let targets = self.relevant_stations();
            self.respond(&targets, sent);
            self.attempts += 1;
            let responding = targets.len();
            self.last_responding = targets;
            return CommandOutcome::Repeated { responding };
        }

        if text == "QRS" {
            let targets = self.relevant_stations();
            for &id in &targets {
                if let Some(stn) = self.pool.get_mut(id) {
                    stn.slow_down(QRS_STEP);
                    debug!(callsign = %stn.callsign, speed = %stn.speed_label(), "QRS");
                }
            }
            self.respond(&targets, sent);
            self.attempts += 1;
            let responding = targets.len();
            self.last_responding = targets;
            return CommandOutcome::SlowedDown { responding };
        }

        let unsure = text.ends_with('?');
        let copied = text.trim_end_matches('?').trim();
        let results: Vec<(StationId, MatchKind)> = self
            .pool
            .iter()
            .map(|(id, stn)| (id, self.matcher.classify(&stn.callsign, copied)))
            .collect();

        if let Some(&(id, _)) = results.iter().find(|(_, kind)| *kind == MatchKind::Perfect) {
            self.attempts += 1;
            if unsure {
                self.transmit_station(id, "RR", sent + UNSURE_REPLY_GAP);
                let callsign = self.station_callsign(id);
                return CommandOutcome::Unsure { callsign };
            }
            return self.work_station(id, sent);
        }

        self.attempts += 1;
        let partial: Vec<StationId> = results
            .iter()
            .filter(|(_, kind)| *kind == MatchKind::Partial)
            .map(|(id, _)| *id)
            .collect();
        if !partial.is_empty() {
            for &id in &partial {
                self.record_miss(id, copied);
            }
            self.respond(&partial, sent);
            let responding = partial.len();
            self.last_responding = partial;
            return CommandOutcome::PartialMatch { responding };
        }

        let no_match = self.config().no_match;
        let responders = match no_match {
            NoMatchResponse::Resend | NoMatchResponse::AllRespond => self.pool.ids(),
            NoMatchResponse::Silent => Vec::new(),
        };
        if no_match == NoMatchResponse::Resend {
            for &id in &responders {
                self.record_miss(id, copied);
            }
        }
        self.respond(&responders, sent);
        let responding = responders.len();
        if !responders.is_empty() {
            self.last_responding = responders;
        }
        CommandOutcome::NoMatch { responding }
    }

    /// Check the copied exchange fields, send the signoff and log the contact.
    pub fn confirm_exchange(&mut self, field1: &str, field2: &str) -> CommandOutcome {
        if self.is_locked() {
            return self.ignore(IgnoreReason::AudioLocked);
        }
        let SessionPhase::AwaitingExchangeConfirmation { station: id } = self.phase else {
            return self.ignore(IgnoreReason::NotReadyForConfirmation);
        };
        let Some(them) = self.pool.get(id).cloned() else {
            self.phase = SessionPhase::AwaitingSubmission;
            return self.ignore(IgnoreReason::NoActiveStation);
        };
        let cfg = self.config();

        let mut checks = Vec::new();
        if let Some(key) = cfg.extra_info_field_key {
            checks.push(check_field(key, field1, &them));
        }
        if let (true, Some(key)) = (cfg.requires_info_field2, cfg.extra_info_field_key2) {
            checks.push(check_field(key, field2, &them));
        }

        let arbitrary = if cfg.signoff_echoes_info {
            field1.trim().to_uppercase()
        } else {
            String::new()
        };
        let (yours, theirs) = self.renderer.signoff(cfg, &self.you, &them, &arbitrary);
        let now = self.scheduler.now();
        let mut end = self.transmit_you(&yours, now + EXCHANGE_GAP);
        if let Some(theirs) = theirs {
            end = self.transmit_station(id, &theirs, end + EXCHANGE_GAP);
        }

        let contact = self.log_contact(&them, checks);
        self.pool.remove(id);
        self.after_contact(end);
        CommandOutcome::Logged(contact)
    }

    /// Silence everything and clear the calling stations. The log survives.
    pub fn stop(&mut self) -> CommandOutcome {
        self.clear_run_state();
        info!("session stopped");
        CommandOutcome::Stopped
    }

    /// [`stop`](Self::stop), and forget the logged contacts and mistakes too.
    pub fn reset(&mut self) -> CommandOutcome {
        self.clear_run_state();
        self.log.clear();
        self.total_contacts = 0;
        self.tracker.reset();
        info!("session reset");
        CommandOutcome::Reset
    }

    pub fn change_mode(&mut self, mode: Mode) -> CommandOutcome {
        self.reset();
        self.mode = mode;
        let (lo, hi) = bounds_for(mode, self.pileup_bounds);
        self.pool.set_bounds(lo, hi);
        info!(%mode, "mode changed");
        CommandOutcome::ModeChanged(mode)
    }

    fn clear_run_state(&mut self) {
        self.scheduler.cancel_all();
        self.pool.clear();
        self.phase = SessionPhase::Idle;
        self.attempts = 0;
        self.contact_start = None;
        self.last_responding.clear();
    }

    fn work_station(&mut self, id: StationId, sent: f64) -> CommandOutcome {
        let Some(them) = self.pool.get(id).cloned() else {
            return self.ignore(IgnoreReason::NoActiveStation);
        };
        let cfg = self.config();

        let (yours, theirs) = self.renderer.exchange(cfg, &self.you, &them);
        let your_end = self.transmit_you(&yours, sent);
        let their_end = self.transmit_station(id, &theirs, your_end + EXCHANGE_GAP);

        if cfg.show_tu_step {
            self.phase = SessionPhase::AwaitingExchangeConfirmation { station: id };
            self.last_responding = vec![id];
            info!(callsign = %them.callsign, "exchange sent, awaiting confirmation");
            return CommandOutcome::AwaitingConfirmation {
                callsign: them.callsign,
            };
        }

        let (your_signoff, their_signoff) = self.renderer.signoff(cfg, &self.you, &them, "");
        let mut end = self.transmit_you(&your_signoff, their_end + EXCHANGE_GAP);
        if let Some(theirs) = their_signoff {
            end = self.transmit_station(id, &theirs, end + EXCHANGE_GAP);
        }

        let contact = self.log_contact(&them, Vec::new());
        self.pool.remove(id);
        self.after_contact(end);
        CommandOutcome::Logged(contact)
    }

    fn log_contact(&mut self, them: &Station, checks: Vec<FieldCheck>) -> LoggedContact {
        self.total_contacts += 1;
        let now = self.scheduler.now();
        let contact = LoggedContact {
            number: self.total_contacts,
            mode: self.mode,
            callsign: them.callsign.clone(),
            speed: them.speed_label(),
            attempts: self.attempts,
            elapsed: (now - self.contact_start.unwrap_or(now)).max(0.0),
            annotation: checks.iter().join(" / "),
            checks,
            timestamp: Local::now(),
        };
        info!(
            number = contact.number,
            callsign = %contact.callsign,
            attempts = contact.attempts,
            "contact logged"
        );
        self.log.push(contact.clone());
        self.attempts = 0;
        contact
    }

    /// Refill the roster once the worked station is gone.
    fn after_contact(&mut self, end: f64) {
        self.phase = SessionPhase::AwaitingSubmission;
        match self.config().roster {
            Roster::Single => self.next_single_station(end),
            Roster::Pileup => {
                if self.pool.len() < self.pool.bounds().0 {
                    self.pool
                        .ensure_minimum(&mut self.generator, &self.tracker, &mut self.rng);
                } else {
                    self.pool.maybe_add_one(
                        JOIN_PROBABILITY,
                        &mut self.generator,
                        &self.tracker,
                        &mut self.rng,
                    );
                }
                self.respond_all(end);
                self.contact_start = Some(self.scheduler.now());
            }
        }
    }

    fn next_single_station(&mut self, after: f64) {
        let station = self.generator.next_station(&self.tracker, &mut self.rng);
        let callsign = station.callsign.clone();
        self.attempts = 0;
        let Some(id) = self.pool.push(station) else {
            return;
        };

        let start = after + self.rng.gen::<f64>() + NEXT_STATION_GAP;
        let end = self.transmit_station(id, &callsign, start);
        self.contact_start = Some(end);
        self.last_responding = vec![id];
        self.phase = SessionPhase::AwaitingSubmission;
    }

    /// Stations a repeat or QRS request is aimed at.
    fn relevant_stations(&self) -> Vec<StationId> {
        let live: Vec<StationId> = self
            .last_responding
            .iter()
            .copied()
            .filter(|id| self.pool.contains(*id))
            .collect();
        if live.is_empty() {
            self.pool.ids()
        } else {
            live
        }
    }

    fn respond_all(&mut self, after: f64) -> usize {
        let ids = self.pool.ids();
        self.respond(&ids, after);
        let n = ids.len();
        self.last_responding = ids;
        n
    }

    /// Each station sends its callsign after its own delay.
    fn respond(&mut self, ids: &[StationId], after: f64) -> f64 {
        let single = self.config().roster == Roster::Single;
        let mut end = after;
        for &id in ids {
            let Some(wait) = self.pool.get(id).map(|s| s.wait) else {
                continue;
            };
            let delay = if single {
                self.rng.gen_range(0.25..1.25)
            } else {
                wait
            };
            let callsign = self.station_callsign(id);
            end = end.max(self.transmit_station(id, &callsign, after + delay));
        }
        end
    }

    fn record_miss(&mut self, id: StationId, copied: &str) {
        if let Some(stn) = self.pool.get(id) {
            self.tracker.record_mistake(&stn.callsign, copied);
        }
    }

    fn station_callsign(&self, id: StationId) -> String {
        self.pool
            .get(id)
            .map(|s| s.callsign.clone())
            .unwrap_or_default()
    }

    fn transmit_you(&mut self, text: &str, at: f64) -> f64 {
        let voice = self.you.voice();
        self.scheduler.play(Sender::You, &voice, text, at)
    }

    fn transmit_station(&mut self, id: StationId, text: &str, at: f64) -> f64 {
        let Some(stn) = self.pool.get(id) else {
            return at;
        };
        let (callsign, voice) = (stn.callsign.clone(), stn.voice());
        self.scheduler.play(Sender::Station(callsign), &voice, text, at)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn you(&self) -> &Station {
        &self.you
    }

    /// Calling stations, in call order.
    pub fn stations(&self) -> impl Iterator<Item = &Station> {
        self.pool.stations()
    }

    pub fn pool(&self) -> &StationPool {
        &self.pool
    }

    pub fn is_running(&self) -> bool {
        !self.pool.is_empty()
    }

    pub fn ready_for_exchange_confirmation(&self) -> bool {
        matches!(self.phase, SessionPhase::AwaitingExchangeConfirmation { .. })
    }

    /// The station being worked while an exchange awaits confirmation.
    pub fn active_station(&self) -> Option<&Station> {
        match self.phase {
            SessionPhase::AwaitingExchangeConfirmation { station } => self.pool.get(station),
            _ => None,
        }
    }

    pub fn last_responding(&self) -> impl Iterator<Item = &Station> {
        self.last_responding.iter().filter_map(|id| self.pool.get(*id))
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn total_contacts(&self) -> u32 {
        self.total_contacts
    }

    pub fn log(&self) -> &[LoggedContact] {
        &self.log
    }

    pub fn tracker(&self) -> &MistakeTracker {
        &self.tracker
    }

    pub fn scheduler(&self) -> &Scheduler<A> {
        &self.scheduler
    }

    pub fn is_locked(&self) -> bool {
        self.scheduler.is_locked()
    }

    /// Time at which the current audio finishes.
    pub fn busy_until(&self) -> f64 {
        self.scheduler.lock_time()
    }

    pub fn summary(&self) -> SessionSummary {
        let attempts: Vec<f64> = self.log.iter().map(|c| f64::from(c.attempts)).collect();
        let elapsed: Vec<f64> = self.log.iter().map(|c| c.elapsed).collect();
        SessionSummary {
            contacts: self.log.len(),
            mean_attempts: mean(&attempts),
            mean_elapsed: mean(&elapsed),
            elapsed_std_dev: std_dev(&elapsed),
        }
    }
}

fn bounds_for(mode: Mode, pileup: (usize, usize)) -> (usize, usize) {
    match mode.config().roster {
        Roster::Single => (1, 1),
        Roster::Pileup => pileup,
    }
}
