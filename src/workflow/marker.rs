use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EarlyOutcome {
    AllTestsPass,
    MaxCyclesReached,
}

/// Parsed control signal for one step's output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StepSignal {
    Continue,
    HardStop(String),
    EarlyExit(EarlyOutcome),
}

/// Which markers the current step is allowed to act on. Non-gate steps
/// ignore a leading FAIL, non-exit steps ignore ALL_TESTS_PASS.
#[derive(Debug, Clone, Copy, Default)]
pub struct StepMarkerPolicy {
    pub verification_gate: bool,
    pub early_exit: bool,
}

/// The single place marker text becomes a transition.
///
/// A step that emits neither a FAIL prefix nor an exit marker continues.
/// That default is intentional: verification output with no marker at all
/// reads as a pass, which is a known gap in the step contract but one
/// existing workflows depend on. Do not tighten it here.
pub fn parse_step_signal(output: &str, policy: StepMarkerPolicy) -> StepSignal {
    let trimmed = output.trim_start();
    if policy.verification_gate {
        if let Some(rest) = trimmed.strip_prefix("FAIL:") {
            return StepSignal::HardStop(rest.trim().to_string());
        }
    }
    if policy.early_exit {
        if output.contains("ALL_TESTS_PASS") {
            return StepSignal::EarlyExit(EarlyOutcome::AllTestsPass);
        }
        if output.contains("MAX_CYCLES_REACHED") {
            return StepSignal::EarlyExit(EarlyOutcome::MaxCyclesReached);
        }
    }
    StepSignal::Continue
}

#[cfg(test)]
mod tests {
    use super::*;

    const GATE: StepMarkerPolicy = StepMarkerPolicy {
        verification_gate: true,
        early_exit: false,
    };
    const EXIT: StepMarkerPolicy = StepMarkerPolicy {
        verification_gate: false,
        early_exit: true,
    };

    #[test]
    fn leading_fail_at_gate_is_a_hard_stop() {
        let signal = parse_step_signal("FAIL: test only contains trivial assertions", GATE);
        assert_eq!(
            signal,
            StepSignal::HardStop("test only contains trivial assertions".to_string())
        );
    }

    #[test]
    fn fail_is_ignored_off_the_gate() {
        let signal = parse_step_signal("FAIL: whatever", StepMarkerPolicy::default());
        assert_eq!(signal, StepSignal::Continue);
    }

    #[test]
    fn fail_must_be_leading() {
        let signal = parse_step_signal("the suite did not FAIL: all good", GATE);
        assert_eq!(signal, StepSignal::Continue);
    }

    #[test]
    fn pass_and_marker_absence_both_continue() {
        assert_eq!(parse_step_signal("PASS: looks solid", GATE), StepSignal::Continue);
        assert_eq!(
            parse_step_signal("wrote three new assertions", GATE),
            StepSignal::Continue
        );
    }

    #[test]
    fn exit_markers_resolve_at_eligible_steps() {
        assert_eq!(
            parse_step_signal("summary\nALL_TESTS_PASS\n", EXIT),
            StepSignal::EarlyExit(EarlyOutcome::AllTestsPass)
        );
        assert_eq!(
            parse_step_signal("gave up: MAX_CYCLES_REACHED", EXIT),
            StepSignal::EarlyExit(EarlyOutcome::MaxCyclesReached)
        );
        assert_eq!(
            parse_step_signal("ALL_TESTS_PASS", StepMarkerPolicy::default()),
            StepSignal::Continue
        );
    }
}
