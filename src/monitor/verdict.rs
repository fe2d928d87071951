//! Verdict engine: daylight gate + sample + freshness -> health and lamps
//!
//! | favorable | reporting | staleness | health           | lamps         |
//! |-----------|-----------|-----------|------------------|---------------|
//! | false     | any       | n/a       | AwaitingDaylight | amber         |
//! | true      | true      | Timely    | Up               | green         |
//! | true      | true      | Delayed   | Up               | green + amber |
//! | true      | false     | any       | Down             | red           |

use super::types::{HealthState, Staleness, StatusSample, Verdict};
use crate::indicator::IndicatorCommand;

impl Verdict {
    /// Verdict for a cycle outside the collection window
    pub fn awaiting_daylight() -> Self {
        Self {
            daylight_favorable: false,
            staleness: None,
            health: HealthState::AwaitingDaylight,
        }
    }

    /// Lamp pattern for this verdict
    pub fn indicator_command(&self) -> IndicatorCommand {
        match (self.health, self.staleness) {
            (HealthState::AwaitingDaylight, _) => IndicatorCommand::AmberOnly,
            (HealthState::Down, _) => IndicatorCommand::RedOnly,
            (HealthState::Up, Some(Staleness::Delayed)) => IndicatorCommand::GreenAmber,
            (HealthState::Up, _) => IndicatorCommand::GreenOnly,
        }
    }

    /// Reporting but overdue
    pub fn is_up_but_stale(&self) -> bool {
        self.health == HealthState::Up && self.staleness == Some(Staleness::Delayed)
    }
}

/// Combine the gate result, the sample and its freshness.
///
/// When daylight is not favorable the sample and staleness are ignored.
pub fn decide(daylight_favorable: bool, sample: &StatusSample, staleness: Staleness) -> Verdict {
    if !daylight_favorable {
        return Verdict::awaiting_daylight();
    }
    let health = if sample.is_reporting {
        HealthState::Up
    } else {
        HealthState::Down
    };
    Verdict {
        daylight_favorable: true,
        staleness: Some(staleness),
        health,
    }
}
