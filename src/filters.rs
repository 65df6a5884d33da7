use std::collections::BTreeSet;

use crate::features::ModelReadyRecord;
use crate::normalize::{ScoreState, Zone};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocationFilter {
    #[default]
    All,
    Home,
    Away,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrengthFilter {
    #[default]
    All,
    PowerPlay,
    EvenStrength,
    ShortHanded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NetFilter {
    #[default]
    All,
    Standard,
    EmptyNet,
    ExtraAttacker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoreStateFilter {
    #[default]
    All,
    Only(ScoreState),
}

/// Faceoff selection for the summary screens. `None` sets mean "everything".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FaceoffFilter {
    pub opponents: BTreeSet<String>,
    pub seasons: Option<BTreeSet<u32>>,
    pub periods: Option<BTreeSet<u8>>,
    pub zones: Option<BTreeSet<Zone>>,
    pub location: LocationFilter,
    pub strength: StrengthFilter,
    pub net: NetFilter,
    pub score_state: ScoreStateFilter,
}

impl FaceoffFilter {
    pub fn matches(&self, record: &ModelReadyRecord) -> bool {
        let f = &record.faceoff;
        if !self.opponents.is_empty() && !self.opponents.contains(&f.opponent) {
            return false;
        }
        if self.seasons.as_ref().is_some_and(|s| !s.contains(&f.season)) {
            return false;
        }
        if self.periods.as_ref().is_some_and(|s| !s.contains(&f.period)) {
            return false;
        }
        if self.zones.as_ref().is_some_and(|s| !s.contains(&f.zone)) {
            return false;
        }
        let location_ok = match self.location {
            LocationFilter::All => true,
            LocationFilter::Home => f.home,
            LocationFilter::Away => !f.home,
        };
        let strength_ok = match self.strength {
            StrengthFilter::All => true,
            StrengthFilter::PowerPlay => f.power_play,
            StrengthFilter::ShortHanded => f.short_handed,
            StrengthFilter::EvenStrength => !f.power_play && !f.short_handed,
        };
        let net_ok = match self.net {
            NetFilter::All => true,
            NetFilter::EmptyNet => f.empty_net,
            NetFilter::ExtraAttacker => f.extra_attacker,
            NetFilter::Standard => !f.empty_net && !f.extra_attacker,
        };
        let score_ok = match self.score_state {
            ScoreStateFilter::All => true,
            ScoreStateFilter::Only(state) => f.score_state == state,
        };
        location_ok && strength_ok && net_ok && score_ok
    }

    pub fn apply<'a>(&self, records: &'a [ModelReadyRecord]) -> Vec<&'a ModelReadyRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }

    pub fn is_unfiltered(&self) -> bool {
        *self == Self::default()
    }
}
