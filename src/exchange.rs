use crate::mode::{MessageContext, ModeConfig, Template};
use crate::station::Station;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Traditional cut-number letters, by digit.
pub const STANDARD_CUTS: [(char, char); 8] = [
    ('0', 'T'),
    ('1', 'A'),
    ('2', 'U'),
    ('3', 'V'),
    ('5', 'E'),
    ('7', 'G'),
    ('8', 'D'),
    ('9', 'N'),
];

/// Digit to letter substitutions applied to exchange text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutNumbers {
    map: BTreeMap<char, char>,
}

impl CutNumbers {
    /// All the standard cuts.
    pub fn standard() -> Self {
        Self::from_pairs(STANDARD_CUTS)
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (char, char)>) -> Self {
        Self {
            map: pairs
                .into_iter()
                .filter(|(d, _)| d.is_ascii_digit())
                .map(|(d, l)| (d, l.to_ascii_uppercase()))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn apply(&self, text: &str) -> String {
        text.chars()
            .map(|c| self.map.get(&c).copied().unwrap_or(c))
            .collect()
    }
}

/// The four rendered message stages of an exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedExchange {
    pub your_exchange: String,
    pub their_exchange: String,
    pub your_signoff: String,
    /// `None` when the mode has no closing message from the contact.
    pub their_signoff: Option<String>,
}

/// Builds literal message text from a mode's templates.
#[derive(Debug, Clone, Default)]
pub struct ExchangeRenderer {
    cut_numbers: Option<CutNumbers>,
}

impl ExchangeRenderer {
    pub fn new(cut_numbers: Option<CutNumbers>) -> Self {
        Self {
            cut_numbers: cut_numbers.filter(|c| !c.is_empty()),
        }
    }

    pub fn cq(&self, mode: &ModeConfig, you: &Station) -> String {
        (mode.cq_message)(you)
    }

    /// `(your exchange, their exchange)`, cut numbers applied.
    pub fn exchange(&self, mode: &ModeConfig, you: &Station, them: &Station) -> (String, String) {
        let ctx = MessageContext {
            you,
            them,
            arbitrary: "",
        };
        (
            self.cut(render(mode.your_exchange, &ctx)),
            self.cut(render(mode.their_exchange, &ctx)),
        )
    }

    /// `(your signoff, their signoff)`; signoffs carry callsigns and are
    /// never cut.
    pub fn signoff(
        &self,
        mode: &ModeConfig,
        you: &Station,
        them: &Station,
        arbitrary: &str,
    ) -> (String, Option<String>) {
        let ctx = MessageContext { you, them, arbitrary };
        let theirs = mode.their_signoff.map(|t| {
            t(&MessageContext {
                arbitrary: "",
                ..ctx
            })
        });
        (render(mode.your_signoff, &ctx), theirs)
    }

    pub fn render_all(
        &self,
        mode: &ModeConfig,
        you: &Station,
        them: &Station,
        arbitrary: &str,
    ) -> RenderedExchange {
        let (your_exchange, their_exchange) = self.exchange(mode, you, them);
        let (your_signoff, their_signoff) = self.signoff(mode, you, them, arbitrary);
        RenderedExchange {
            your_exchange,
            their_exchange,
            your_signoff,
            their_signoff,
        }
    }

    fn cut(&self, text: String) -> String {
        match &self.cut_numbers {
            Some(cuts) => cuts.apply(&text),
            None => text,
        }
    }
}

fn render(template: Option<Template>, ctx: &MessageContext) -> String {
    template.map(|t| t(ctx)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::Mode;

    fn stations() -> (Station, Station) {
        let mut you = Station::new("W1AW", 25);
        you.name = "HIRAM".into();
        let mut them = Station::new("K5ZD", 28);
        them.name = "RANDY".into();
        them.state = "MA".into();
        them.cwops_number = Some(1905);
        (you, them)
    }

    #[test]
    fn test_cut_numbers_apply() {
        let cuts = CutNumbers::from_pairs([('0', 'T'), ('9', 'N')]);
        assert_eq!(cuts.apply("5NN 1905"), "5NN 1NT5");
        assert_eq!(CutNumbers::standard().apply("599 001"), "ENN TTA");
    }

    #[test]
    fn test_cut_numbers_ignore_non_digit_keys() {
        let cuts = CutNumbers::from_pairs([('X', 'T')]);
        assert!(cuts.is_empty());
    }

    #[test]
    fn test_exchange_applies_cuts() {
        let (you, them) = stations();
        let renderer = ExchangeRenderer::new(Some(CutNumbers::from_pairs([('0', 'T'), ('9', 'N')])));

        let (_, theirs) = renderer.exchange(Mode::Cwt.config(), &you, &them);
        assert_eq!(theirs, "RANDY 1NT5 TU");
    }

    #[test]
    fn test_exchange_without_cuts() {
        let (you, them) = stations();
        let renderer = ExchangeRenderer::default();

        let (yours, theirs) = renderer.exchange(Mode::Cwt.config(), &you, &them);
        assert_eq!(yours, "HIRAM CWA");
        assert_eq!(theirs, "RANDY 1905 TU");
    }

    #[test]
    fn test_signoff_is_never_cut() {
        let (mut you, them) = stations();
        you.callsign = "W1AW0".into();
        let renderer = ExchangeRenderer::new(Some(CutNumbers::standard()));

        let (yours, theirs) = renderer.signoff(Mode::Cwt.config(), &you, &them, "");
        assert_eq!(yours, "TU W1AW0");
        assert_eq!(theirs, None);
    }

    #[test]
    fn test_signoff_uses_arbitrary_text() {
        let (you, them) = stations();
        let renderer = ExchangeRenderer::default();

        let (yours, theirs) = renderer.signoff(Mode::Pota.config(), &you, &them, "MA");
        assert_eq!(yours, "<BK> TU MA 73 EE");
        assert_eq!(theirs.as_deref(), Some("EE"));
    }

    #[test]
    fn test_absent_templates_render_empty() {
        let (you, them) = stations();
        let rendered = ExchangeRenderer::default().render_all(Mode::Contest.config(), &you, &them, "");
        assert_eq!(rendered.your_exchange, "5NN");
        assert_eq!(rendered.your_signoff, "");
        assert_eq!(rendered.their_signoff, None);
    }
}
