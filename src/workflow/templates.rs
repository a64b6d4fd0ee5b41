//! Embedded step instructions for the agentic workflows. Each template is
//! rendered with `issue`, `repo`, prior step outputs keyed by label, and
//! for the e2e workflow `max_cycles`.

pub const BUG_STEPS: [&str; 11] = [
    "step1", "step2", "step3", "step4", "step5", "step5_5", "step6", "step7", "step8", "step9",
    "step10",
];

/// Test-quality gate. A leading FAIL: verdict here halts the run.
pub const BUG_VERIFICATION_GATE: &str = "step8";

pub const E2E_STEPS: [&str; 9] = [
    "step1", "step2", "step3", "step4", "step5", "step6", "step7", "step8", "step9",
];

/// Re-test steps where ALL_TESTS_PASS / MAX_CYCLES_REACHED end the run.
pub const E2E_EXIT_STEPS: [&str; 3] = ["step2", "step5", "step8"];

/// User-facing name for a step label: "step4" reads as "Step 4".
pub fn step_display(label: &str) -> String {
    format!("Step {}", label.trim_start_matches("step"))
}

pub fn bug_step_template(label: &str) -> Option<&'static str> {
    let template = match label {
        "step1" => {
            "Read issue #{{issue}} in {{repo}}. Restate the reported bug in your own \
             words, including the expected and actual behavior."
        }
        "step2" => {
            "Using this understanding of issue #{{issue}}:\n{{step1}}\n\
             Locate the source files and code paths most likely responsible. List them."
        }
        "step3" => {
            "Write a minimal script or command that reproduces issue #{{issue}} based on:\n\
             {{step2}}"
        }
        "step4" => "Run the reproduction from the previous step and capture its output:\n{{step3}}",
        "step5" => {
            "Write a unit test for issue #{{issue}} that fails on the current code and \
             will pass once the bug is fixed. Reproduction evidence:\n{{step4}}"
        }
        "step5_5" => {
            "Review the unit test you just wrote:\n{{step5}}\n\
             Strengthen any assertion that merely checks the code runs."
        }
        "step6" => "Implement the smallest fix that makes the new test pass for issue #{{issue}}.",
        "step7" => {
            "Run the new test and the surrounding test suite. Report the results verbatim."
        }
        "step8" => {
            "Verify the quality of the fix for issue #{{issue}} using the test run:\n{{step7}}\n\
             Respond with a leading PASS: or FAIL: verdict. FAIL if the test is trivial, \
             tautological, or does not exercise the reported bug."
        }
        "step9" => "Remove any leftover reproduction scripts or debug output from the fix.",
        "step10" => {
            "Summarize the investigation of issue #{{issue}}. End with one line per file \
             you created, formatted as FILES_CREATED: <path>."
        }
        _ => return None,
    };
    Some(template)
}

pub fn e2e_step_template(label: &str) -> Option<&'static str> {
    let template = match label {
        "step1" => {
            "Run the end-to-end test suite for {{repo}} (issue #{{issue}}). Commit any \
             fixes you make along the way."
        }
        "step2" => {
            "Report the suite status from:\n{{step1}}\n\
             If every end-to-end test passed, respond with the single line ALL_TESTS_PASS."
        }
        "step3" => "Diagnose the first failing end-to-end test. Name the root cause.",
        "step4" => "Implement a fix for the diagnosed failure:\n{{step3}}",
        "step5" => {
            "Re-run the end-to-end suite. Respond ALL_TESTS_PASS if green. If you have \
             now attempted {{max_cycles}} or more fix cycles without a green run, respond \
             MAX_CYCLES_REACHED instead."
        }
        "step6" => "Diagnose the next remaining end-to-end failure. Name the root cause.",
        "step7" => "Implement a fix for the diagnosed failure:\n{{step6}}",
        "step8" => {
            "Re-run the end-to-end suite. Respond ALL_TESTS_PASS if green, or \
             MAX_CYCLES_REACHED after {{max_cycles}} unsuccessful fix cycles."
        }
        "step9" => {
            "Summarize the end-to-end fixes for issue #{{issue}}. End with one line per \
             file you created, formatted as FILES_CREATED: <path>."
        }
        _ => return None,
    };
    Some(template)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::template::render_template;
    use std::collections::BTreeMap;

    #[test]
    fn every_bug_step_has_a_template() {
        for label in BUG_STEPS {
            assert!(bug_step_template(label).is_some(), "missing {label}");
        }
        assert!(bug_step_template("step11").is_none());
    }

    #[test]
    fn every_e2e_step_has_a_template() {
        for label in E2E_STEPS {
            assert!(e2e_step_template(label).is_some(), "missing {label}");
        }
    }

    #[test]
    fn bug_templates_render_with_accumulated_context() {
        let mut context: BTreeMap<String, String> = BTreeMap::new();
        context.insert("issue".to_string(), "7".to_string());
        context.insert("repo".to_string(), "acme/app".to_string());
        for label in BUG_STEPS {
            let rendered =
                render_template(bug_step_template(label).unwrap(), &context).unwrap();
            assert!(!rendered.contains("{{"), "{label} left a placeholder");
            context.insert(label.to_string(), format!("output of {label}"));
        }
    }

    #[test]
    fn e2e_templates_render_with_accumulated_context() {
        let mut context: BTreeMap<String, String> = BTreeMap::new();
        context.insert("issue".to_string(), "7".to_string());
        context.insert("repo".to_string(), "acme/app".to_string());
        context.insert("max_cycles".to_string(), "3".to_string());
        for label in E2E_STEPS {
            let rendered =
                render_template(e2e_step_template(label).unwrap(), &context).unwrap();
            assert!(!rendered.contains("{{"), "{label} left a placeholder");
            context.insert(label.to_string(), format!("output of {label}"));
        }
    }
}
