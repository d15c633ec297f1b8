use crate::morse;
use crate::station::Voice;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Source of the audio timeline's "now", in seconds.
pub trait Clock {
    fn now(&self) -> f64;
}

/// Wall clock measured from construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Hand-driven clock for tests and headless runs. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, t: f64) {
        self.now.set(t);
    }

    pub fn advance(&self, dt: f64) {
        self.now.set(self.now.get() + dt);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.now.get()
    }
}

/// Who keyed a transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sender {
    You,
    Station(String),
}

/// A scheduled piece of keyed text.
#[derive(Debug, Clone, PartialEq)]
pub struct Transmission {
    pub sender: Sender,
    pub text: String,
    pub voice: Voice,
    pub start: f64,
    pub end: f64,
}

impl Transmission {
    /// The part of `text` keyed by time `t`.
    pub fn heard_at(&self, t: f64) -> String {
        if t >= self.end {
            return self.text.clone();
        }
        let elapsed = t - self.start;
        let mut heard = String::new();
        for (sym, done) in morse::keying_offsets(&self.text, &self.voice) {
            if done > elapsed {
                break;
            }
            match sym {
                morse::Symbol::Char { text, .. } => heard.push_str(&text),
                morse::Symbol::WordSpace => heard.push(' '),
            }
        }
        heard
    }
}

/// Keys text onto the audio channel.
pub trait AudioEngine {
    fn current_time(&self) -> f64;

    /// Schedule `text` to start no earlier than `start`; returns when it ends.
    fn play_sentence(&mut self, sender: Sender, voice: &Voice, text: &str, start: f64) -> f64;

    /// Drop everything scheduled.
    fn stop_all(&mut self);
}

/// Audio engine that computes Morse timing without producing sound and keeps
/// the scheduled transmissions around for display.
#[derive(Debug)]
pub struct SimulatedAudio<C: Clock> {
    clock: C,
    transmissions: Vec<Transmission>,
    history_limit: usize,
}

impl<C: Clock> SimulatedAudio<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            transmissions: Vec::new(),
            history_limit: 64,
        }
    }

    pub fn transmissions(&self) -> &[Transmission] {
        &self.transmissions
    }

    /// Transmissions that have started by now, oldest first.
    pub fn started(&self) -> impl Iterator<Item = &Transmission> {
        let now = self.clock.now();
        self.transmissions.iter().filter(move |t| t.start <= now)
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

impl<C: Clock> AudioEngine for SimulatedAudio<C> {
    fn current_time(&self) -> f64 {
        self.clock.now()
    }

    fn play_sentence(&mut self, sender: Sender, voice: &Voice, text: &str, start: f64) -> f64 {
        let start = start.max(self.clock.now());
        let end = start + morse::sentence_duration(text, voice);

        self.transmissions.push(Transmission {
            sender,
            text: text.trim().to_string(),
            voice: *voice,
            start,
            end,
        });
        if self.transmissions.len() > self.history_limit {
            let excess = self.transmissions.len() - self.history_limit;
            self.transmissions.drain(..excess);
        }
        end
    }

    fn stop_all(&mut self) {
        let now = self.clock.now();
        // keep what was already heard, drop anything still pending
        self.transmissions.retain(|t| t.end <= now);
    }
}
