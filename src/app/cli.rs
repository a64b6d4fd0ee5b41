#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliVerb {
    Generate,
    Test,
    Fix,
    Bug,
    E2eFix,
    Unknown,
}

pub fn parse_cli_verb(input: &str) -> CliVerb {
    match input {
        "generate" => CliVerb::Generate,
        "test" => CliVerb::Test,
        "fix" => CliVerb::Fix,
        "bug" => CliVerb::Bug,
        "e2e-fix" => CliVerb::E2eFix,
        _ => CliVerb::Unknown,
    }
}

pub fn cli_help_lines() -> Vec<String> {
    vec![
        "Commands:".to_string(),
        "  generate <prompt-file>               Generate source code from a prompt".to_string(),
        "    [--example <file>] [--language <lang>] [--output <file>]".to_string(),
        "  test <prompt-file>                   Generate a unit test suite".to_string(),
        "    [--code <file>] [--example <file>] [--language <lang>] [--output <file>]".to_string(),
        "  fix <prompt-file> <code-file> <test-file>...".to_string(),
        "    [--error <file>] [--language <lang>]  Repair code against failing tests".to_string(),
        "  bug <issue> <owner/repo>             Run the agentic bug investigation".to_string(),
        "    [--budget <usd>] [--max-retries <n>]".to_string(),
        "  e2e-fix <issue> <owner/repo>         Run the agentic end-to-end fix loop".to_string(),
        "    [--budget <usd>] [--max-cycles <n>] [--resume]".to_string(),
    ]
}

pub fn help_text() -> String {
    cli_help_lines().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_verbs_parse() {
        assert_eq!(parse_cli_verb("generate"), CliVerb::Generate);
        assert_eq!(parse_cli_verb("test"), CliVerb::Test);
        assert_eq!(parse_cli_verb("fix"), CliVerb::Fix);
        assert_eq!(parse_cli_verb("bug"), CliVerb::Bug);
        assert_eq!(parse_cli_verb("e2e-fix"), CliVerb::E2eFix);
    }

    #[test]
    fn anything_else_is_unknown() {
        assert_eq!(parse_cli_verb("deploy"), CliVerb::Unknown);
        assert_eq!(parse_cli_verb(""), CliVerb::Unknown);
    }

    #[test]
    fn help_mentions_every_verb() {
        let help = help_text();
        for verb in ["generate", "test", "fix", "bug", "e2e-fix"] {
            assert!(help.contains(verb), "help missing {verb}");
        }
    }
}
