//! Declarative table of operating modes.
//!
//! Every behavioral difference between modes lives in a [`ModeConfig`]
//! value: message templates are plain function pointers and the engine
//! reads the flags, so the session controller never branches on the mode
//! identifier itself.

use crate::station::{Station, StationField};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inputs available to a message template.
#[derive(Debug, Clone, Copy)]
pub struct MessageContext<'a> {
    pub you: &'a Station,
    pub them: &'a Station,
    /// Free text supplied at render time, e.g. the name the trainee just copied.
    pub arbitrary: &'a str,
}

pub type CqTemplate = fn(&Station) -> String;
pub type Template = fn(&MessageContext) -> String;

/// How many stations a mode keeps on the air at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Roster {
    /// One station at a time, replaced as soon as it is worked.
    Single,
    /// A pileup kept within the configured min/max bounds.
    Pileup,
}

/// What the stations do when a submission matches nobody.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoMatchResponse {
    /// The active station sends its callsign again.
    Resend,
    /// Every active station calls again.
    AllRespond,
    /// Nobody answers.
    Silent,
}

/// Message templates and rules for one mode.
#[derive(Clone, Copy)]
pub struct ModeConfig {
    pub name: &'static str,
    pub cq_message: CqTemplate,
    pub your_exchange: Option<Template>,
    pub their_exchange: Option<Template>,
    pub your_signoff: Option<Template>,
    pub their_signoff: Option<Template>,
    pub requires_info_field: bool,
    pub requires_info_field2: bool,
    /// A confirmation (TU) step sits between the exchange and the log entry.
    pub show_tu_step: bool,
    pub extra_info_field_key: Option<StationField>,
    pub extra_info_field_key2: Option<StationField>,
    /// The trainee's signoff repeats what was typed in the first info field.
    pub signoff_echoes_info: bool,
    pub roster: Roster,
    pub no_match: NoMatchResponse,
}

impl fmt::Debug for ModeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModeConfig")
            .field("name", &self.name)
            .field("show_tu_step", &self.show_tu_step)
            .field("extra_info_field_key", &self.extra_info_field_key)
            .field("extra_info_field_key2", &self.extra_info_field_key2)
            .field("roster", &self.roster)
            .field("no_match", &self.no_match)
            .finish_non_exhaustive()
    }
}

/// Presentation hints for a mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeUi {
    pub info_placeholder: Option<&'static str>,
    pub info2_placeholder: Option<&'static str>,
    pub extra_column_header: Option<&'static str>,
    pub results_header: &'static str,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Mode {
    #[default]
    Single,
    Contest,
    Pota,
    Sst,
    Cwt,
}

impl Mode {
    pub const ALL: [Mode; 5] = [Mode::Single, Mode::Contest, Mode::Pota, Mode::Sst, Mode::Cwt];

    pub fn config(&self) -> &'static ModeConfig {
        match self {
            Mode::Single => &SINGLE,
            Mode::Contest => &CONTEST,
            Mode::Pota => &POTA,
            Mode::Sst => &SST,
            Mode::Cwt => &CWT,
        }
    }

    pub fn ui(&self) -> &'static ModeUi {
        match self {
            Mode::Single => &SINGLE_UI,
            Mode::Contest => &CONTEST_UI,
            Mode::Pota => &POTA_UI,
            Mode::Sst => &SST_UI,
            Mode::Cwt => &CWT_UI,
        }
    }

    pub fn next(&self) -> Mode {
        let idx = Mode::ALL.iter().position(|m| m == self).unwrap_or(0);
        Mode::ALL[(idx + 1) % Mode::ALL.len()]
    }
}

static SINGLE: ModeConfig = ModeConfig {
    name: "Single",
    cq_message: |you| format!("CQ DE {} K", you.callsign),
    your_exchange: Some(|_| "5NN".to_string()),
    their_exchange: Some(|_| "R 5NN TU".to_string()),
    your_signoff: Some(|_| "TU EE".to_string()),
    their_signoff: Some(|_| "EE".to_string()),
    requires_info_field: false,
    requires_info_field2: false,
    show_tu_step: false,
    extra_info_field_key: None,
    extra_info_field_key2: None,
    signoff_echoes_info: false,
    roster: Roster::Single,
    no_match: NoMatchResponse::Resend,
};

static CONTEST: ModeConfig = ModeConfig {
    name: "Contest",
    cq_message: |_| "W".to_string(),
    your_exchange: Some(|_| "5NN".to_string()),
    their_exchange: Some(|_| "EE".to_string()),
    your_signoff: None,
    their_signoff: None,
    requires_info_field: false,
    requires_info_field2: false,
    show_tu_step: false,
    extra_info_field_key: None,
    extra_info_field_key2: None,
    signoff_echoes_info: false,
    roster: Roster::Pileup,
    no_match: NoMatchResponse::AllRespond,
};

static POTA: ModeConfig = ModeConfig {
    name: "POTA",
    cq_message: |you| format!("CQ POTA DE {}", you.callsign),
    your_exchange: Some(|_| "UR 5NN <BK>".to_string()),
    their_exchange: Some(|ctx| format!("<BK> UR 5NN {0} {0} <BK>", ctx.them.state)),
    your_signoff: Some(|ctx| format!("<BK> TU {} 73 EE", ctx.arbitrary)),
    their_signoff: Some(|_| "EE".to_string()),
    requires_info_field: true,
    requires_info_field2: false,
    show_tu_step: true,
    extra_info_field_key: Some(StationField::State),
    extra_info_field_key2: None,
    signoff_echoes_info: true,
    roster: Roster::Pileup,
    no_match: NoMatchResponse::Silent,
};

static SST: ModeConfig = ModeConfig {
    name: "SST",
    cq_message: |you| format!("CQ SST {}", you.callsign),
    your_exchange: Some(|ctx| format!("{} {}", ctx.you.name, ctx.you.state)),
    their_exchange: Some(|ctx| format!("TU {} {} {}", ctx.you.name, ctx.them.name, ctx.them.state)),
    your_signoff: Some(|ctx| format!("GL {} TU {} SST", ctx.arbitrary, ctx.you.callsign)),
    their_signoff: None,
    requires_info_field: true,
    requires_info_field2: true,
    show_tu_step: true,
    extra_info_field_key: Some(StationField::Name),
    extra_info_field_key2: Some(StationField::State),
    signoff_echoes_info: true,
    roster: Roster::Pileup,
    no_match: NoMatchResponse::Silent,
};

static CWT: ModeConfig = ModeConfig {
    name: "CWT",
    cq_message: |you| format!("CQ CWT {}", you.callsign),
    your_exchange: Some(|ctx| format!("{} CWA", ctx.you.name)),
    their_exchange: Some(|ctx| {
        format!("{} {} TU", ctx.them.name, ctx.them.field(StationField::CwopsNumber))
    }),
    your_signoff: Some(|ctx| format!("TU {}", ctx.you.callsign)),
    their_signoff: None,
    requires_info_field: true,
    requires_info_field2: true,
    show_tu_step: true,
    extra_info_field_key: Some(StationField::Name),
    extra_info_field_key2: Some(StationField::CwopsNumber),
    signoff_echoes_info: false,
    roster: Roster::Pileup,
    no_match: NoMatchResponse::Silent,
};

static SINGLE_UI: ModeUi = ModeUi {
    info_placeholder: None,
    info2_placeholder: None,
    extra_column_header: None,
    results_header: "Single Mode Results",
};

static CONTEST_UI: ModeUi = ModeUi {
    info_placeholder: None,
    info2_placeholder: None,
    extra_column_header: None,
    results_header: "Contest Mode Results",
};

static POTA_UI: ModeUi = ModeUi {
    info_placeholder: Some("State"),
    info2_placeholder: None,
    extra_column_header: Some("State"),
    results_header: "POTA Mode Results",
};

static SST_UI: ModeUi = ModeUi {
    info_placeholder: Some("Name"),
    info2_placeholder: Some("State"),
    extra_column_header: Some("Additional Info"),
    results_header: "SST Mode Results",
};

static CWT_UI: ModeUi = ModeUi {
    info_placeholder: Some("Name"),
    info2_placeholder: Some("CW Ops No."),
    extra_column_header: Some("Additional Info"),
    results_header: "CWT Mode Results",
};

#[cfg(test)]
mod tests {
    use super::*;

    fn stations() -> (Station, Station) {
        let mut you = Station::new("W1AW", 25);
        you.name = "HIRAM".into();
        you.state = "CT".into();
        let mut them = Station::new("K5ZD", 28);
        them.name = "RANDY".into();
        them.state = "MA".into();
        them.cwops_number = Some(1);
        (you, them)
    }

    #[test]
    fn test_tu_step_modes_only_reference_extra_fields() {
        for mode in Mode::ALL {
            let cfg = mode.config();
            if !cfg.show_tu_step {
                assert!(cfg.extra_info_field_key.is_none(), "{mode} must not check info fields");
                assert!(cfg.extra_info_field_key2.is_none(), "{mode} must not check info fields");
                assert!(!cfg.requires_info_field);
            }
        }
    }

    #[test]
    fn test_second_field_key_implies_second_field() {
        for mode in Mode::ALL {
            let cfg = mode.config();
            assert_eq!(cfg.extra_info_field_key2.is_some(), cfg.requires_info_field2);
            assert_eq!(cfg.requires_info_field2, mode.ui().info2_placeholder.is_some());
        }
    }

    #[test]
    fn test_cq_messages() {
        let (you, _) = stations();
        assert_eq!((Mode::Single.config().cq_message)(&you), "CQ DE W1AW K");
        assert_eq!((Mode::Pota.config().cq_message)(&you), "CQ POTA DE W1AW");
        assert_eq!((Mode::Sst.config().cq_message)(&you), "CQ SST W1AW");
        assert_eq!((Mode::Cwt.config().cq_message)(&you), "CQ CWT W1AW");
    }

    #[test]
    fn test_exchange_templates() {
        let (you, them) = stations();
        let ctx = MessageContext {
            you: &you,
            them: &them,
            arbitrary: "RANDY",
        };

        let sst = Mode::Sst.config();
        assert_eq!((sst.your_exchange.unwrap())(&ctx), "HIRAM CT");
        assert_eq!((sst.their_exchange.unwrap())(&ctx), "TU HIRAM RANDY MA");
        assert_eq!((sst.your_signoff.unwrap())(&ctx), "GL RANDY TU W1AW SST");
        assert!(sst.their_signoff.is_none());

        let cwt = Mode::Cwt.config();
        assert_eq!((cwt.their_exchange.unwrap())(&ctx), "RANDY 1 TU");

        let pota = Mode::Pota.config();
        assert_eq!((pota.their_exchange.unwrap())(&ctx), "<BK> UR 5NN MA MA <BK>");
    }

    #[test]
    fn test_mode_display_and_cycle() {
        assert_eq!(Mode::Pota.to_string(), "pota");
        assert_eq!(Mode::Cwt.next(), Mode::Single);
        assert_eq!(Mode::Single.next(), Mode::Contest);
        assert_eq!(Mode::default(), Mode::Single);
    }

    #[test]
    fn test_rosters() {
        assert_eq!(Mode::Single.config().roster, Roster::Single);
        for mode in [Mode::Contest, Mode::Pota, Mode::Sst, Mode::Cwt] {
            assert_eq!(mode.config().roster, Roster::Pileup);
        }
    }
}
