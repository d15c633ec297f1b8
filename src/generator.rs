//! Simulated station generation.

use crate::adaptive::MistakeTracker;
use crate::config::{CallsignFormat, Config, ContestCallsignRules};
use crate::station::Station;
use crate::{PileupError, Result};
use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use std::collections::VecDeque;
use tracing::debug;

static DATA_DIR: Dir = include_dir!("src/data");

const US_PREFIX_FIRST: [char; 3] = ['K', 'N', 'W'];
const SLASH_SUFFIXES: [&str; 3] = ["P", "M", "QRP"];
const MAX_CWOPS_NUMBER: u32 = 3500;
const MAX_SERIAL_NUMBER: u32 = 999;

/// Source of new calling stations.
///
/// Implementations draw callsign characters through the tracker so that
/// characters the trainee keeps missing turn up more often.
pub trait StationGenerator {
    fn next_station<R: Rng + ?Sized>(&mut self, tracker: &MistakeTracker, rng: &mut R) -> Station;
}

#[derive(Deserialize, Debug)]
struct DataTable {
    #[allow(dead_code)]
    name: String,
    entries: Vec<String>,
}

fn load_table(file_name: &str) -> Result<Vec<String>> {
    let missing = || PileupError::MissingData(file_name.to_string());
    let contents = DATA_DIR
        .get_file(file_name)
        .and_then(|f| f.contents_utf8())
        .ok_or_else(missing)?;
    let table: DataTable = serde_json::from_str(contents)?;
    if table.entries.is_empty() {
        return Err(missing());
    }
    Ok(table.entries)
}

/// The trainee's own station, from config.
pub fn your_station(config: &Config) -> Station {
    let mut you = Station::new(&config.callsign, config.speed);
    you.tone = config.sidetone;
    you.volume = config.volume;
    you.name = config.name.trim().to_uppercase();
    you.state = config.state.trim().to_uppercase();
    you
}

/// Draws stations within the configured speed, tone, volume and wait bounds.
#[derive(Debug, Clone)]
pub struct RandomStationGenerator {
    config: Config,
    names: Vec<String>,
    states: Vec<String>,
}

impl RandomStationGenerator {
    pub fn new(config: &Config) -> Result<Self> {
        let mut config = config.clone();
        config.validate();
        Ok(Self {
            config,
            names: load_table("names.json")?,
            states: load_table("states.json")?,
        })
    }

    fn us_callsign<R: Rng + ?Sized>(&self, tracker: &MistakeTracker, rng: &mut R) -> String {
        let format = self
            .config
            .formats
            .choose(rng)
            .copied()
            .unwrap_or(CallsignFormat::OneByTwo);
        let (prefix_len, suffix_len) = format.shape();
        let letters: Vec<char> = ('A'..='Z').collect();
        let digits: Vec<char> = ('0'..='9').collect();

        let mut call = String::new();
        call.push(tracker.sample_weighted(&US_PREFIX_FIRST, rng).unwrap_or('K'));
        for _ in 1..prefix_len {
            call.push(tracker.sample_weighted(&letters, rng).unwrap_or('A'));
        }
        call.push(tracker.sample_weighted(&digits, rng).unwrap_or('1'));
        for _ in 0..suffix_len {
            call.push(tracker.sample_weighted(&letters, rng).unwrap_or('A'));
        }
        call
    }

    fn contest_callsign<R: Rng + ?Sized>(&self, tracker: &MistakeTracker, rng: &mut R) -> String {
        let rules = &self.config.contest;
        let letters: Vec<char> = rules.allowed_letters.chars().collect();
        let digits: Vec<char> = rules.allowed_digits.chars().collect();

        let mut call = if rules.require_prefix {
            pick_prefix(rules, rng)
        } else {
            String::new()
        };
        if call.is_empty() {
            call.push(tracker.sample_weighted(&letters, rng).unwrap_or('K'));
        }
        call.push(tracker.sample_weighted(&digits, rng).unwrap_or('1'));

        let target = rng.gen_range(rules.min_length..=rules.max_length);
        let suffix_len = target.saturating_sub(call.len()).max(1);
        for _ in 0..suffix_len {
            call.push(tracker.sample_weighted(&letters, rng).unwrap_or('A'));
        }

        if rng.gen_range(0..100) < u32::from(rules.slash_percent) {
            if let Some(suffix) = SLASH_SUFFIXES.choose(rng) {
                call.push('/');
                call.push_str(suffix);
            }
        }
        call
    }
}

fn pick_prefix<R: Rng + ?Sized>(rules: &ContestCallsignRules, rng: &mut R) -> String {
    rules
        .prefixes
        .choose_weighted(rng, |p| p.weight)
        .map(|p| p.prefix.to_ascii_uppercase())
        .unwrap_or_default()
}

fn between<R: Rng + ?Sized>(lo: f64, hi: f64, rng: &mut R) -> f64 {
    if hi > lo {
        rng.gen_range(lo..=hi)
    } else {
        lo
    }
}

impl StationGenerator for RandomStationGenerator {
    fn next_station<R: Rng + ?Sized>(&mut self, tracker: &MistakeTracker, rng: &mut R) -> Station {
        let cfg = &self.config;
        let callsign = if cfg.us_only {
            self.us_callsign(tracker, rng)
        } else {
            self.contest_callsign(tracker, rng)
        };

        let mut stn = Station::new(callsign, rng.gen_range(cfg.min_speed..=cfg.max_speed));
        stn.tone = rng.gen_range(cfg.min_tone..=cfg.max_tone);
        stn.volume = between(f64::from(cfg.min_volume), f64::from(cfg.max_volume), rng) as f32;
        stn.wait = between(cfg.min_wait, cfg.max_wait, rng);
        if cfg.enable_farnsworth {
            stn.enable_farnsworth = true;
            stn.farnsworth_speed = cfg.farnsworth_speed.min(stn.wpm);
        }
        stn.name = self.names.choose(rng).cloned().unwrap_or_default();
        stn.state = self.states.choose(rng).cloned().unwrap_or_default();
        stn.cwops_number = Some(rng.gen_range(1..=MAX_CWOPS_NUMBER));
        stn.serial_number = Some(rng.gen_range(1..=MAX_SERIAL_NUMBER));

        debug!(callsign = %stn.callsign, wpm = stn.wpm, "generated station");
        stn
    }
}

/// Hands out a fixed list of stations in order, then numbered fillers.
///
/// Used for deterministic sessions in tests and headless runs.
#[derive(Debug, Clone, Default)]
pub struct ScriptedGenerator {
    queue: VecDeque<Station>,
    issued: usize,
}

impl ScriptedGenerator {
    pub fn new(stations: impl IntoIterator<Item = Station>) -> Self {
        Self {
            queue: stations.into_iter().collect(),
            issued: 0,
        }
    }

    pub fn push(&mut self, station: Station) {
        self.queue.push_back(station);
    }

    /// Number of stations handed out so far.
    pub fn issued(&self) -> usize {
        self.issued
    }
}

impl StationGenerator for ScriptedGenerator {
    fn next_station<R: Rng + ?Sized>(&mut self, _tracker: &MistakeTracker, _rng: &mut R) -> Station {
        self.issued += 1;
        self.queue
            .pop_front()
            .unwrap_or_else(|| Station::new(format!("K{}FILL", self.issued % 10), 20))
    }
}
