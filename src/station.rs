use serde::{Deserialize, Serialize};

/// Lowest Farnsworth effective speed a QRS request can reach.
pub const MIN_FARNSWORTH_WPM: u32 = 5;

/// Keying parameters the audio engine needs to send text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Voice {
    pub wpm: u32,
    /// Effective (spacing) speed when Farnsworth timing is on.
    pub farnsworth_wpm: Option<u32>,
    pub tone_hz: u32,
    pub volume: f32,
}

impl Voice {
    pub fn new(wpm: u32, tone_hz: u32, volume: f32) -> Self {
        Self {
            wpm,
            farnsworth_wpm: None,
            tone_hz,
            volume,
        }
    }
}

/// Station attributes that an exchange field can be checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum StationField {
    Name,
    State,
    CwopsNumber,
    SerialNumber,
}

impl StationField {
    pub fn is_numeric(&self) -> bool {
        matches!(self, StationField::CwopsNumber | StationField::SerialNumber)
    }
}

/// A simulated station (or the trainee's own station).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub callsign: String,
    pub wpm: u32,
    pub enable_farnsworth: bool,
    pub farnsworth_speed: u32,
    pub tone: u32,
    pub volume: f32,
    /// Seconds the station waits before answering.
    pub wait: f64,
    pub name: String,
    pub state: String,
    pub cwops_number: Option<u32>,
    pub serial_number: Option<u32>,
}

impl Station {
    pub fn new(callsign: impl AsRef<str>, wpm: u32) -> Self {
        Self {
            callsign: callsign.as_ref().trim().to_ascii_uppercase(),
            wpm,
            enable_farnsworth: false,
            farnsworth_speed: wpm,
            tone: 600,
            volume: 0.8,
            wait: 0.0,
            name: String::new(),
            state: String::new(),
            cwops_number: None,
            serial_number: None,
        }
    }

    pub fn voice(&self) -> Voice {
        Voice {
            wpm: self.wpm,
            farnsworth_wpm: self
                .enable_farnsworth
                .then_some(self.farnsworth_speed.min(self.wpm)),
            tone_hz: self.tone,
            volume: self.volume,
        }
    }

    /// Apply one QRS step: turn Farnsworth on at `wpm - step`, or lower it
    /// further by `step`, never below [`MIN_FARNSWORTH_WPM`].
    pub fn slow_down(&mut self, step: u32) {
        let from = if self.enable_farnsworth {
            self.farnsworth_speed
        } else {
            self.enable_farnsworth = true;
            self.wpm
        };
        self.farnsworth_speed = from.saturating_sub(step).max(MIN_FARNSWORTH_WPM);
    }

    /// `"25"` or `"25 / 14"` when Farnsworth is on.
    pub fn speed_label(&self) -> String {
        if self.enable_farnsworth {
            format!("{} / {}", self.wpm, self.farnsworth_speed)
        } else {
            self.wpm.to_string()
        }
    }

    /// Text value of an exchange field; empty when the station lacks it.
    pub fn field(&self, field: StationField) -> String {
        match field {
            StationField::Name => self.name.clone(),
            StationField::State => self.state.clone(),
            StationField::CwopsNumber => self.cwops_number.map(|n| n.to_string()).unwrap_or_default(),
            StationField::SerialNumber => self.serial_number.map(|n| n.to_string()).unwrap_or_default(),
        }
    }
}
