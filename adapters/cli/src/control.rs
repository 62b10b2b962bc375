//! Scripted player controls applied at fixed points of simulated time.

use std::time::Duration;

use horde_core::Event;
use horde_system_bootstrap::Encounter;

/// Operator action that can be scripted from the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Action {
    Pause,
    Skip,
    KillAll,
}

impl Action {
    fn apply(self, encounter: &mut Encounter, out_events: &mut Vec<Event>) {
        match self {
            Action::Pause => encounter.toggle_pause(out_events),
            Action::Skip => encounter.skip_wave(out_events),
            Action::KillAll => encounter.kill_all_enemies(out_events),
        }
    }
}

/// Action paired with the simulated time it fires at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ScheduledControl {
    at: Duration,
    action: Action,
}

/// Parses `<seconds>:<action>`, e.g. `12.5:skip`.
pub(crate) fn parse_control(value: &str) -> Result<ScheduledControl, String> {
    let (at, action) = value
        .split_once(':')
        .ok_or_else(|| format!("expected <seconds>:<action>, got `{value}`"))?;
    let seconds: f32 = at
        .trim()
        .parse()
        .map_err(|_| format!("invalid time `{at}`"))?;
    let at = Duration::try_from_secs_f32(seconds)
        .map_err(|_| format!("time `{at}` must be a non-negative number of seconds"))?;
    let action = match action.trim() {
        "pause" => Action::Pause,
        "skip" => Action::Skip,
        "kill-all" => Action::KillAll,
        other => {
            return Err(format!(
                "unknown action `{other}` (expected pause, skip or kill-all)"
            ))
        }
    };
    Ok(ScheduledControl { at, action })
}

/// Controls ordered by firing time, consumed as the clock passes them.
#[derive(Debug)]
pub(crate) struct ControlScript {
    controls: Vec<ScheduledControl>,
    next: usize,
}

impl ControlScript {
    pub(crate) fn new(mut controls: Vec<ScheduledControl>) -> Self {
        controls.sort_by_key(|control| control.at);
        Self { controls, next: 0 }
    }

    /// Applies every control due at or before `elapsed`, in firing order.
    pub(crate) fn run_due(
        &mut self,
        elapsed: Duration,
        encounter: &mut Encounter,
        out_events: &mut Vec<Event>,
    ) {
        while let Some(control) = self.controls.get(self.next) {
            if control.at > elapsed {
                break;
            }
            tracing::info!(at = ?control.at, action = ?control.action, "applying scripted control");
            control.action.apply(encounter, out_events);
            self.next += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use horde_core::EncounterConfig;

    use super::*;

    #[test]
    fn parses_time_and_action() {
        assert_eq!(
            parse_control("12.5:skip"),
            Ok(ScheduledControl {
                at: Duration::from_millis(12_500),
                action: Action::Skip,
            })
        );
        assert_eq!(
            parse_control(" 0 : kill-all ").map(|control| control.action),
            Ok(Action::KillAll)
        );
    }

    #[test]
    fn rejects_malformed_controls() {
        assert!(parse_control("skip").is_err());
        assert!(parse_control("-1:pause").is_err());
        assert!(parse_control("3:dance").is_err());
    }

    #[test]
    fn due_controls_fire_once_in_time_order() {
        let mut encounter = Encounter::new(&EncounterConfig::default());
        let mut events = Vec::new();
        encounter.start(&mut events);

        let mut script = ControlScript::new(vec![
            parse_control("2:pause").expect("valid"),
            parse_control("1:skip").expect("valid"),
        ]);

        script.run_due(Duration::from_millis(1_500), &mut encounter, &mut events);
        assert_eq!(encounter.scheduler().current_wave(), 2);
        assert!(!encounter.scheduler().is_paused());

        script.run_due(Duration::from_secs(2), &mut encounter, &mut events);
        script.run_due(Duration::from_secs(3), &mut encounter, &mut events);
        assert!(encounter.scheduler().is_paused());
        assert_eq!(encounter.scheduler().current_wave(), 2);
    }
}
