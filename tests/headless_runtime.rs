use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use pileup::audio::{Clock, ManualClock, SimulatedAudio};
use pileup::generator::ScriptedGenerator;
use pileup::mode::Mode;
use pileup::runtime::{FixedTicker, Runner, TestEventSource, TrainerEvent};
use pileup::session::{SessionController, SessionOptions};
use pileup::station::Station;

// Headless run: keystrokes come through Runner/TestEventSource, every tick
// moves the audio clock forward, and the session ends with a logged contact.
#[test]
fn headless_contest_contact_completes() {
    let clock = ManualClock::new();
    let options = SessionOptions {
        mode: Mode::Contest,
        you: Station::new("W1AW", 25),
        min_stations: 1,
        max_stations: 1,
        cut_numbers: None,
        seed: Some(3),
    };
    let generator = ScriptedGenerator::new([Station::new("K1ABC", 30), Station::new("N2XY", 30)]);
    let mut session =
        SessionController::new(options, SimulatedAudio::new(clock.clone()), generator);

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(1)),
    );

    let keys = std::iter::once(KeyCode::F(1))
        .chain("k1abc".chars().map(KeyCode::Char))
        .chain([KeyCode::Enter]);
    for code in keys {
        tx.send(TrainerEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)))
            .unwrap();
    }

    let mut line = String::new();
    for _ in 0..200u32 {
        match runner.step() {
            TrainerEvent::Tick | TrainerEvent::Resize => {}
            TrainerEvent::Key(key) => {
                // typing is instant; let the audio drain before each command
                clock.set(session.busy_until().max(clock.now()) + 0.01);
                match key.code {
                    KeyCode::F(1) => {
                        session.call_cq();
                    }
                    KeyCode::Char(c) => line.push(c),
                    KeyCode::Enter => {
                        session.submit(&line);
                        line.clear();
                    }
                    _ => {}
                }
            }
        }
        if session.total_contacts() > 0 {
            break;
        }
    }

    assert_eq!(session.total_contacts(), 1);
    assert_eq!(session.log()[0].callsign, "K1ABC");
    assert_eq!(session.log()[0].mode, Mode::Contest);
    assert_eq!(
        session.stations().map(|s| s.callsign.as_str()).collect::<Vec<_>>(),
        ["N2XY"]
    );
}
