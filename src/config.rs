use crate::exchange::CutNumbers;
use crate::mode::Mode;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// US callsign shape: prefix letters x suffix letters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallsignFormat {
    #[serde(rename = "1x1")]
    OneByOne,
    #[serde(rename = "1x2")]
    OneByTwo,
    #[serde(rename = "1x3")]
    OneByThree,
    #[serde(rename = "2x1")]
    TwoByOne,
    #[serde(rename = "2x2")]
    TwoByTwo,
    #[serde(rename = "2x3")]
    TwoByThree,
}

impl CallsignFormat {
    pub const ALL: [CallsignFormat; 6] = [
        CallsignFormat::OneByOne,
        CallsignFormat::OneByTwo,
        CallsignFormat::OneByThree,
        CallsignFormat::TwoByOne,
        CallsignFormat::TwoByTwo,
        CallsignFormat::TwoByThree,
    ];

    /// `(prefix letters, suffix letters)`
    pub fn shape(&self) -> (usize, usize) {
        match self {
            CallsignFormat::OneByOne => (1, 1),
            CallsignFormat::OneByTwo => (1, 2),
            CallsignFormat::OneByThree => (1, 3),
            CallsignFormat::TwoByOne => (2, 1),
            CallsignFormat::TwoByTwo => (2, 2),
            CallsignFormat::TwoByThree => (2, 3),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedPrefix {
    pub prefix: String,
    pub weight: u32,
}

impl WeightedPrefix {
    fn new(prefix: &str, weight: u32) -> Self {
        Self {
            prefix: prefix.to_string(),
            weight,
        }
    }
}

/// Rules for non-US (contest style) callsigns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContestCallsignRules {
    pub allowed_letters: String,
    pub allowed_digits: String,
    pub min_length: usize,
    pub max_length: usize,
    pub require_prefix: bool,
    pub prefixes: Vec<WeightedPrefix>,
    /// Percent of callsigns that get a `/P`-style suffix.
    pub slash_percent: u8,
}

impl Default for ContestCallsignRules {
    fn default() -> Self {
        Self {
            allowed_letters: ('A'..='Z').collect(),
            allowed_digits: ('0'..='9').collect(),
            min_length: 4,
            max_length: 6,
            require_prefix: true,
            prefixes: vec![
                WeightedPrefix::new("K", 10),
                WeightedPrefix::new("W", 10),
                WeightedPrefix::new("N", 6),
                WeightedPrefix::new("VE", 3),
                WeightedPrefix::new("DL", 4),
                WeightedPrefix::new("G", 3),
                WeightedPrefix::new("F", 2),
                WeightedPrefix::new("I", 2),
                WeightedPrefix::new("EA", 2),
                WeightedPrefix::new("OH", 1),
                WeightedPrefix::new("JA", 3),
                WeightedPrefix::new("UA", 2),
            ],
            slash_percent: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub mode: Mode,

    pub callsign: String,
    pub name: String,
    pub state: String,
    pub speed: u32,
    pub sidetone: u32,
    pub volume: f32,

    pub min_stations: usize,
    pub max_stations: usize,
    pub min_speed: u32,
    pub max_speed: u32,
    pub min_tone: u32,
    pub max_tone: u32,
    pub min_volume: f32,
    pub max_volume: f32,
    /// Seconds a responding station waits before calling.
    pub min_wait: f64,
    pub max_wait: f64,

    pub enable_farnsworth: bool,
    pub farnsworth_speed: u32,

    pub us_only: bool,
    pub formats: Vec<CallsignFormat>,
    pub contest: ContestCallsignRules,

    pub enable_cut_numbers: bool,
    pub cut_numbers: CutNumbers,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: Mode::Single,
            callsign: "W1AW".to_string(),
            name: "HIRAM".to_string(),
            state: "CT".to_string(),
            speed: 25,
            sidetone: 600,
            volume: 0.8,
            min_stations: 1,
            max_stations: 3,
            min_speed: 20,
            max_speed: 30,
            min_tone: 500,
            max_tone: 800,
            min_volume: 0.5,
            max_volume: 1.0,
            min_wait: 0.0,
            max_wait: 1.0,
            enable_farnsworth: false,
            farnsworth_speed: 15,
            us_only: true,
            formats: CallsignFormat::ALL.to_vec(),
            contest: ContestCallsignRules::default(),
            enable_cut_numbers: false,
            cut_numbers: CutNumbers::standard(),
        }
    }
}

impl Config {
    /// Clamp inconsistent settings into a usable range.
    pub fn validate(&mut self) {
        fn order<T: PartialOrd>(lo: &mut T, hi: &mut T) {
            if *lo > *hi {
                std::mem::swap(lo, hi);
            }
        }

        self.callsign = self.callsign.trim().to_ascii_uppercase();
        if self.callsign.is_empty() {
            self.callsign = Config::default().callsign;
        }
        self.speed = self.speed.max(1);

        order(&mut self.min_stations, &mut self.max_stations);
        self.min_stations = self.min_stations.max(1);
        self.max_stations = self.max_stations.max(self.min_stations);

        self.min_speed = self.min_speed.max(1);
        order(&mut self.min_speed, &mut self.max_speed);
        order(&mut self.min_tone, &mut self.max_tone);
        order(&mut self.min_volume, &mut self.max_volume);
        self.min_wait = self.min_wait.max(0.0);
        order(&mut self.min_wait, &mut self.max_wait);

        self.farnsworth_speed = self.farnsworth_speed.clamp(1, self.max_speed);

        if self.formats.is_empty() {
            self.formats = CallsignFormat::ALL.to_vec();
        }

        let rules = &mut self.contest;
        rules.allowed_letters = rules
            .allowed_letters
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .map(|c| c.to_ascii_uppercase())
            .collect();
        if rules.allowed_letters.is_empty() {
            rules.allowed_letters = ContestCallsignRules::default().allowed_letters;
        }
        rules.allowed_digits.retain(|c| c.is_ascii_digit());
        if rules.allowed_digits.is_empty() {
            rules.allowed_digits = ContestCallsignRules::default().allowed_digits;
        }
        rules.min_length = rules.min_length.max(3);
        order(&mut rules.min_length, &mut rules.max_length);
        rules.prefixes.retain(|p| p.weight > 0 && !p.prefix.is_empty());
        rules.slash_percent = rules.slash_percent.min(100);
    }

    pub fn cut_numbers(&self) -> Option<CutNumbers> {
        self.enable_cut_numbers.then(|| self.cut_numbers.clone())
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> crate::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "pileup") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("pileup_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(_) => return Config::default(),
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(mut cfg) => {
                cfg.validate();
                cfg
            }
            Err(err) => {
                warn!(path = %self.path.display(), %err, "ignoring unreadable config");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> crate::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}
