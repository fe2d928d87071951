//! Indicator lamp outputs
//!
//! The monitor drives a handful of binary outputs. Every cycle clears all of
//! them before lighting the new set, so a lamp from a previous cycle can never
//! linger.

use crate::config::{IndicatorBackend, IndicatorConfig};
use crate::error::{Result, SolstatError};
use crate::logging::get_logger;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

pub mod sysfs;

pub use sysfs::SysfsIndicators;

/// Named binary outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Indicator {
    /// Store connectivity confirmed this cycle
    Blue,
    /// Array healthy
    Green,
    /// Array not reporting
    Red,
    /// Awaiting daylight, or reports are delayed
    Amber,
}

impl Indicator {
    pub const ALL: [Indicator; 4] = [
        Indicator::Blue,
        Indicator::Green,
        Indicator::Red,
        Indicator::Amber,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Indicator::Blue => "blue",
            Indicator::Green => "green",
            Indicator::Red => "red",
            Indicator::Amber => "amber",
        }
    }
}

/// Mutually exclusive lamp patterns for the health indicators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IndicatorCommand {
    AmberOnly,
    GreenOnly,
    GreenAmber,
    RedOnly,
}

impl IndicatorCommand {
    /// Health lamps lit by this command
    pub fn lit(&self) -> &'static [Indicator] {
        match self {
            IndicatorCommand::AmberOnly => &[Indicator::Amber],
            IndicatorCommand::GreenOnly => &[Indicator::Green],
            IndicatorCommand::GreenAmber => &[Indicator::Green, Indicator::Amber],
            IndicatorCommand::RedOnly => &[Indicator::Red],
        }
    }
}

/// Output driver for the lamps
pub trait IndicatorOutput: Send {
    fn set(&mut self, indicator: Indicator, on: bool) -> Result<()>;

    /// Drive every output low, attempting all even if one fails
    fn all_off(&mut self) -> Result<()> {
        let mut first_err = None;
        for indicator in Indicator::ALL {
            if let Err(e) = self.set(indicator, false) {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Reset all lamps, then light `command` plus blue when `connectivity` holds
pub fn apply_command(
    output: &mut dyn IndicatorOutput,
    command: IndicatorCommand,
    connectivity: bool,
) -> Result<()> {
    output.all_off()?;
    for indicator in command.lit() {
        output.set(*indicator, true)?;
    }
    if connectivity {
        output.set(Indicator::Blue, true)?;
    }
    Ok(())
}

#[derive(Default)]
struct LampState {
    lit: BTreeSet<Indicator>,
    history: Vec<(Indicator, bool)>,
}

/// Hardware-free outputs that keep state in memory and log every change.
///
/// Clones share state, so a caller can keep a handle to a driver it has
/// boxed and handed to the monitor.
#[derive(Clone)]
pub struct LogIndicators {
    state: Arc<Mutex<LampState>>,
    logger: crate::logging::StructuredLogger,
}

impl Default for LogIndicators {
    fn default() -> Self {
        Self::new()
    }
}

impl LogIndicators {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(LampState::default())),
            logger: get_logger("indicator"),
        }
    }

    /// Currently lit outputs, in declaration order
    pub fn lit(&self) -> Vec<Indicator> {
        self.state
            .lock()
            .map(|s| s.lit.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn is_lit(&self, indicator: Indicator) -> bool {
        self.state
            .lock()
            .map(|s| s.lit.contains(&indicator))
            .unwrap_or(false)
    }

    /// Every write ever made, in order
    pub fn history(&self) -> Vec<(Indicator, bool)> {
        self.state
            .lock()
            .map(|s| s.history.clone())
            .unwrap_or_default()
    }
}

impl IndicatorOutput for LogIndicators {
    fn set(&mut self, indicator: Indicator, on: bool) -> Result<()> {
        let changed = {
            let mut state = self
                .state
                .lock()
                .map_err(|_| SolstatError::indicator("Indicator state lock poisoned"))?;
            state.history.push((indicator, on));
            if on {
                state.lit.insert(indicator)
            } else {
                state.lit.remove(&indicator)
            }
        };
        if changed {
            self.logger.info(&format!(
                "{} LED {}",
                indicator.as_str(),
                if on { "on" } else { "off" }
            ));
        }
        Ok(())
    }
}

/// Build the configured output driver
pub fn open_indicators(config: &IndicatorConfig) -> Result<Box<dyn IndicatorOutput>> {
    match config.backend {
        IndicatorBackend::Sysfs => Ok(Box::new(SysfsIndicators::open(
            &config.gpio_root,
            &config.pins,
        )?)),
        IndicatorBackend::Log => Ok(Box::new(LogIndicators::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_resets_before_lighting() {
        let mut out = LogIndicators::new();
        apply_command(&mut out, IndicatorCommand::GreenAmber, true).unwrap();
        assert_eq!(
            out.lit(),
            vec![Indicator::Blue, Indicator::Green, Indicator::Amber]
        );

        apply_command(&mut out, IndicatorCommand::GreenOnly, false).unwrap();
        assert_eq!(out.lit(), vec![Indicator::Green]);

        // First pass wrote four clears and three lamps; the second starts clean
        assert_eq!(out.history().len(), 7 + 4 + 1);
        let clears = out.history()[7..11].to_vec();
        assert!(clears.iter().all(|(_, on)| !on));
    }

    #[test]
    fn clones_share_state() {
        let observer = LogIndicators::new();
        let mut boxed: Box<dyn IndicatorOutput> = Box::new(observer.clone());
        apply_command(boxed.as_mut(), IndicatorCommand::RedOnly, false).unwrap();
        assert_eq!(observer.lit(), vec![Indicator::Red]);
        boxed.all_off().unwrap();
        assert!(observer.lit().is_empty());
    }

    #[test]
    fn commands_light_expected_lamps() {
        assert_eq!(IndicatorCommand::AmberOnly.lit(), &[Indicator::Amber]);
        assert_eq!(IndicatorCommand::RedOnly.lit(), &[Indicator::Red]);
        assert_eq!(
            IndicatorCommand::GreenAmber.lit(),
            &[Indicator::Green, Indicator::Amber]
        );
    }
}
