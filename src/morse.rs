//! Morse keying durations (PARIS timing with optional Farnsworth spacing).

use crate::station::Voice;

/// Dot/dash pattern for a character, `None` for anything that cannot be sent.
pub fn pattern(c: char) -> Option<&'static str> {
    let p = match c.to_ascii_uppercase() {
        'A' => ".-",
        'B' => "-...",
        'C' => "-.-.",
        'D' => "-..",
        'E' => ".",
        'F' => "..-.",
        'G' => "--.",
        'H' => "....",
        'I' => "..",
        'J' => ".---",
        'K' => "-.-",
        'L' => ".-..",
        'M' => "--",
        'N' => "-.",
        'O' => "---",
        'P' => ".--.",
        'Q' => "--.-",
        'R' => ".-.",
        'S' => "...",
        'T' => "-",
        'U' => "..-",
        'V' => "...-",
        'W' => ".--",
        'X' => "-..-",
        'Y' => "-.--",
        'Z' => "--..",
        '0' => "-----",
        '1' => ".----",
        '2' => "..---",
        '3' => "...--",
        '4' => "....-",
        '5' => ".....",
        '6' => "-....",
        '7' => "--...",
        '8' => "---..",
        '9' => "----.",
        '/' => "-..-.",
        '?' => "..--..",
        '.' => ".-.-.-",
        ',' => "--..--",
        '=' => "-...-",
        '+' => ".-.-.",
        _ => return None,
    };
    Some(p)
}

/// Length of a dot/dash pattern in dit units, including intra-character gaps.
fn pattern_units(p: &str) -> u32 {
    let marks: u32 = p.chars().map(|m| if m == '-' { 3 } else { 1 }).sum();
    marks + p.len().saturating_sub(1) as u32
}

/// One keyed symbol: a character, a prosign like `<BK>`, or a word space.
#[derive(Debug, Clone, PartialEq)]
pub enum Symbol {
    Char { text: String, units: u32 },
    WordSpace,
}

/// Split text into keyable symbols. Prosigns written as `<AR>` are sent as a
/// single run-together character; unknown characters are dropped.
pub fn symbols(text: &str) -> Vec<Symbol> {
    let mut out = Vec::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_whitespace() {
            if !out.is_empty() && out.last() != Some(&Symbol::WordSpace) {
                out.push(Symbol::WordSpace);
            }
            continue;
        }

        if c == '<' {
            let mut inner = String::new();
            for n in chars.by_ref() {
                if n == '>' {
                    break;
                }
                inner.push(n);
            }
            let parts: Vec<&str> = inner.chars().filter_map(pattern).collect();
            if !parts.is_empty() {
                // run together: parts joined with a 1-unit element gap
                let units = parts.iter().map(|p| pattern_units(p)).sum::<u32>()
                    + parts.len() as u32
                    - 1;
                out.push(Symbol::Char {
                    text: format!("<{}>", inner.to_ascii_uppercase()),
                    units,
                });
            }
            continue;
        }

        if let Some(p) = pattern(c) {
            out.push(Symbol::Char {
                text: c.to_ascii_uppercase().to_string(),
                units: pattern_units(p),
            });
        }
    }

    if out.last() == Some(&Symbol::WordSpace) {
        out.pop();
    }
    out
}

/// Seconds per dit at `wpm` (PARIS standard).
pub fn dit_seconds(wpm: u32) -> f64 {
    1.2 / f64::from(wpm.max(1))
}

/// Inter-character and inter-word gaps in seconds.
fn gaps(voice: &Voice) -> (f64, f64) {
    let dit = dit_seconds(voice.wpm);
    match voice.farnsworth_wpm {
        Some(s) if s < voice.wpm => {
            let c = f64::from(voice.wpm);
            let s = f64::from(s.max(1));
            // ARRL Farnsworth: total added delay spread over 19 gap units
            let ta = (60.0 * c - 37.2 * s) / (s * c);
            (3.0 * ta / 19.0, 7.0 * ta / 19.0)
        }
        _ => (3.0 * dit, 7.0 * dit),
    }
}

/// Offsets (seconds from the start) at which each symbol finishes keying.
pub fn keying_offsets(text: &str, voice: &Voice) -> Vec<(Symbol, f64)> {
    let dit = dit_seconds(voice.wpm);
    let (char_gap, word_gap) = gaps(voice);

    let mut t = 0.0;
    let mut prev_was_char = false;
    let mut out = Vec::new();

    for sym in symbols(text) {
        match &sym {
            Symbol::Char { units, .. } => {
                if prev_was_char {
                    t += char_gap;
                }
                t += f64::from(*units) * dit;
                prev_was_char = true;
            }
            Symbol::WordSpace => {
                t += word_gap;
                prev_was_char = false;
            }
        }
        out.push((sym, t));
    }
    out
}

/// Total keying time for `text`.
pub fn sentence_duration(text: &str, voice: &Voice) -> f64 {
    keying_offsets(text, voice)
        .last()
        .map(|(_, t)| *t)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice(wpm: u32) -> Voice {
        Voice::new(wpm, 600, 1.0)
    }

    #[test]
    fn test_pattern_lookup() {
        assert_eq!(pattern('a'), Some(".-"));
        assert_eq!(pattern('0'), Some("-----"));
        assert_eq!(pattern('#'), None);
    }

    #[test]
    fn test_pattern_units() {
        // E = 1, T = 3, A = 1 + 1 + 3
        assert_eq!(pattern_units("."), 1);
        assert_eq!(pattern_units("-"), 3);
        assert_eq!(pattern_units(".-"), 5);
    }

    #[test]
    fn test_paris_is_fifty_units() {
        // PARIS plus the trailing word space is 50 dits; without it 43
        let v = voice(20);
        let d = sentence_duration("PARIS", &v);
        assert!((d - 43.0 * dit_seconds(20)).abs() < 1e-9);
    }

    #[test]
    fn test_symbols_collapse_whitespace() {
        let syms = symbols("  CQ   DE ");
        let spaces = syms.iter().filter(|s| **s == Symbol::WordSpace).count();
        assert_eq!(spaces, 1);
        assert_eq!(syms.len(), 5);
    }

    #[test]
    fn test_prosign_is_single_symbol() {
        let syms = symbols("<BK>");
        assert_eq!(syms.len(), 1);
        match &syms[0] {
            Symbol::Char { text, units } => {
                assert_eq!(text, "<BK>");
                // B (9) + gap (1) + K (9)
                assert_eq!(*units, 19);
            }
            other => panic!("unexpected symbol {other:?}"),
        }
    }

    #[test]
    fn test_farnsworth_is_slower() {
        let plain = voice(20);
        let mut spaced = voice(20);
        spaced.farnsworth_wpm = Some(10);

        let text = "CQ TEST K1ABC";
        assert!(sentence_duration(text, &spaced) > sentence_duration(text, &plain));
    }

    #[test]
    fn test_empty_text_has_no_duration() {
        assert_eq!(sentence_duration("", &voice(25)), 0.0);
        assert_eq!(sentence_duration("   ", &voice(25)), 0.0);
        assert_eq!(sentence_duration("###", &voice(25)), 0.0);
    }

    #[test]
    fn test_offsets_are_monotonic() {
        let offsets = keying_offsets("5NN TU", &voice(30));
        let mut last = 0.0;
        for (_, t) in offsets {
            assert!(t >= last);
            last = t;
        }
    }
}
