//! Command-line parser.
//!
//! Evaluates a free-form human line against a command catalog: the line is
//! tokenized with shell-like quoting, a state machine walks the tokens
//! against the schema, and the result is either a typed [`Invocation`] or a
//! precise [`ParseError`].
//!
//! # Pipeline
//!
//! ```text
//! string -> tokens -> parse(tokens, command) -> Invocation
//! ```
//!
//! The usual entry point is [`evaluate`], which resolves the root command
//! from the first token and parses the rest:
//!
//! ```
//! use approach_core::catalog::Command;
//! use approach_core::parser::{evaluate, ParseError};
//!
//! let commands = vec![
//!     Command::with_arguments("ping", "Ping the host.", vec![], vec![], vec![], false).unwrap(),
//! ];
//!
//! let invocation = evaluate("ping", &commands).unwrap();
//! assert_eq!(invocation.commands, vec!["ping"]);
//!
//! let err = evaluate("pong", &commands).unwrap_err();
//! assert!(matches!(err, ParseError::NoSuchCommand(name) if name == "pong"));
//! ```

mod context;
mod error;
mod state;
mod tokenizer;

pub use error::ParseError;
pub use tokenizer::tokenize;

use crate::catalog::{Command, CommandContext, HELP_NAME};
use crate::invocation::Invocation;
use crate::value::ArgumentValue;

use context::ParseContext;
use state::{ParserEvent, ParserState, transition};

/// Evaluates one command line against a list of root commands.
///
/// The first token selects the root command; the remaining tokens are
/// parsed against it.
///
/// # Errors
///
/// Returns [`ParseError::NoSuchCommand`] when the first token names no root
/// command, [`ParseError::FailedToTokenizeCommandLine`] when the line cannot
/// be split, or any diagnostic the token parse produces.
pub fn evaluate(command_line: &str, commands: &[Command]) -> Result<Invocation, ParseError> {
    let mut tokens = tokenize(command_line)?.into_iter();
    let Some(first) = tokens.next() else {
        return Err(ParseError::NoSuchCommand(String::new()));
    };
    let Some(root) = commands.iter().find(|c| c.name == first) else {
        return Err(ParseError::NoSuchCommand(first));
    };
    Parser::new(commands, root).parse(tokens)
}

/// Drives one command tree over a token stream.
///
/// Holds the full root-command list alongside the tree being parsed so help
/// requests can resolve targets at the root level as well as among
/// siblings.
pub struct Parser<'a> {
    commands: &'a [Command],
    root: &'a Command,
}

impl<'a> Parser<'a> {
    /// Creates a parser for `root`, which should be one of `commands`.
    #[must_use]
    pub const fn new(commands: &'a [Command], root: &'a Command) -> Self {
        Self { commands, root }
    }

    /// Parses the tokens following the root command's own name.
    ///
    /// The parser terminates on every input: each token produces exactly one
    /// event, and every event either advances the machine or ends it in a
    /// failure state.
    ///
    /// # Errors
    ///
    /// Returns the first diagnostic the state machine fails with, or
    /// [`ParseError::UsageRequested`] when the line asked for help.
    pub fn parse(
        &self,
        tokens: impl IntoIterator<Item = String>,
    ) -> Result<Invocation, ParseError> {
        let mut context = ParseContext::new(self.root);
        let mut machine = ParserState::Command;

        for token in tokens {
            let event = self.classify(&machine, token, &context);
            machine = transition(&machine, event, &mut context, self.root);
            if machine.is_terminal() {
                break;
            }
        }
        if !machine.is_terminal() {
            machine = transition(&machine, ParserEvent::NoMoreArguments, &mut context, self.root);
        }

        match machine {
            ParserState::Failure(err) => Err(err),
            ParserState::Success => self.finish(context),
            _ => Err(ParseError::UnexpectedError),
        }
    }

    /// Classifies one token against the current command, producing the event
    /// the state machine consumes.
    fn classify(
        &self,
        machine: &ParserState<'a>,
        token: String,
        context: &ParseContext<'a>,
    ) -> ParserEvent<'a> {
        // An option name forces the next token to be its value.
        if let ParserState::ParsedOption(option) = machine {
            if token.starts_with('-') {
                return ParserEvent::ErrorWasThrown(ParseError::MissingOptionValue(
                    option.name.clone(),
                ));
            }
            return ParserEvent::ScannedOptionValue(*option, token);
        }

        let current = context.current_command();

        if token.starts_with('-') {
            if token == "-h" || token == "--help" {
                return ParserEvent::ScannedHelpFlag(current);
            }
            if let Some(flag) = current.flag_matching(&token) {
                if flag.name == HELP_NAME {
                    return ParserEvent::ScannedHelpFlag(current);
                }
                return ParserEvent::ScannedFlag(flag);
            }
            if let Some(option) = current.option_matching(&token) {
                return ParserEvent::ScannedOption(option);
            }
            return ParserEvent::ScannedInvalidFlagOrOption(token);
        }

        if let Some(subcommand) = current.subcommand(&token) {
            return ParserEvent::ScannedSubcommand(subcommand);
        }
        if matches!(current.context, CommandContext::Subcommands { .. }) {
            return ParserEvent::ErrorWasThrown(ParseError::NoSuchSubcommand(token));
        }
        if let Some(input) = context.next_input() {
            return ParserEvent::ScannedInput(input, token);
        }
        ParserEvent::ScannedUnexpectedArgument(token)
    }

    /// Completes a successful parse, re-raising help requests.
    ///
    /// A parse that descended into a `help` subcommand (or somehow recorded
    /// the help flag) succeeds mechanically but is a usage request in
    /// intent. The target is the last non-help command in the chain; when
    /// the help subcommand's optional `subcommand` input was supplied, the
    /// named command is looked up at the root level first and then among the
    /// siblings, falling back to the containing command when the name
    /// matches neither.
    fn finish(&self, context: ParseContext<'a>) -> Result<Invocation, ParseError> {
        let help_used = context.chain().iter().any(|c| c.name == HELP_NAME)
            || context.argument(HELP_NAME).is_some();
        if !help_used {
            return context.finish();
        }

        let containing = context
            .chain()
            .iter()
            .rev()
            .find(|c| c.name != HELP_NAME)
            .copied()
            .unwrap_or(self.root);

        let target = match context.argument("subcommand") {
            Some(ArgumentValue::String(name)) => self
                .commands
                .iter()
                .find(|c| &c.name == name)
                .or_else(|| containing.subcommand(name))
                .unwrap_or(containing),
            _ => containing,
        };

        Err(ParseError::UsageRequested {
            root: Box::new(self.root.clone()),
            target: Some(Box::new(target.clone())),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use crate::catalog::{Flag, Input, Opt};
    use crate::value::ArgumentDataType;

    use super::*;

    fn process() -> Command {
        Command::with_arguments(
            "process",
            "Process a text file.",
            vec![Flag::new("verbose", 'v', "Print progress while processing.")],
            vec![
                Opt::new(
                    "passes",
                    'p',
                    ArgumentDataType::Int,
                    "Number of processing passes.",
                )
                .with_validation_regex(r"^\d+$"),
            ],
            vec![Input::new(
                "textFile",
                ArgumentDataType::File,
                "The file to process.",
            )],
            false,
        )
        .unwrap()
    }

    fn ping() -> Command {
        Command::with_arguments("ping", "Check that the host responds.", vec![], vec![], vec![], false)
            .unwrap()
    }

    fn concat() -> Command {
        Command::with_arguments(
            "concat",
            "Concatenate two values.",
            vec![],
            vec![],
            vec![
                Input::new("first", ArgumentDataType::String, "First value."),
                Input::new("second", ArgumentDataType::String, "Second value."),
            ],
            true,
        )
        .unwrap()
    }

    fn tag() -> Command {
        Command::with_arguments(
            "tag",
            "Tag the session.",
            vec![],
            vec![
                Opt::new("label", 'l', ArgumentDataType::String, "A label.").multiple(),
            ],
            vec![],
            false,
        )
        .unwrap()
    }

    fn config() -> Command {
        Command::with_arguments(
            "config",
            "Adjust configuration.",
            vec![],
            vec![Opt::new(
                "enabled",
                'e',
                ArgumentDataType::Bool,
                "Enable or disable.",
            )],
            vec![
                Input::new("level", ArgumentDataType::Int, "Verbosity level.")
                    .optional()
                    .with_validation_regex(r"^\d+$"),
            ],
            false,
        )
        .unwrap()
    }

    fn commands() -> Vec<Command> {
        vec![
            Command::with_subcommands(
                "stuff",
                "Do stuff to files.",
                vec![process(), ping(), concat(), tag(), config()],
            )
            .unwrap(),
        ]
    }

    fn write_banana(dir: &tempfile::TempDir) -> String {
        let path = dir.path().join("banana.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"ripe").unwrap();
        path.to_str().unwrap().to_string()
    }

    #[test]
    fn full_line_produces_typed_invocation() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_banana(&dir);
        let commands = commands();

        let line = format!("stuff process -v --passes 8 {path}");
        let invocation = evaluate(&line, &commands).unwrap();

        assert_eq!(invocation.commands, vec!["stuff", "process"]);
        assert_eq!(
            invocation.argument("verbose"),
            Some(&ArgumentValue::Bool(true))
        );
        assert_eq!(invocation.argument("passes"), Some(&ArgumentValue::Int(8)));
        assert_eq!(
            invocation.argument("textFile"),
            Some(&ArgumentValue::File {
                name: "banana.txt".to_string(),
                data: b"ripe".to_vec(),
            })
        );
    }

    #[test]
    fn option_value_failing_regex_is_a_format_error() {
        let commands = commands();
        let err = evaluate("stuff process --passes xyz /tmp/banana.txt", &commands).unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidOptionValueFormat {
                option: "passes".to_string(),
                value: "xyz".to_string(),
            }
        );
    }

    #[test]
    fn help_flag_requests_usage_for_current_command() {
        let commands = commands();
        let err = evaluate("stuff process -h", &commands).unwrap_err();
        let ParseError::UsageRequested { root, target } = err else {
            panic!("expected usage request, got {err:?}");
        };
        assert_eq!(root.name, "stuff");
        assert_eq!(target.unwrap().name, "process");
    }

    #[test]
    fn help_flag_on_menu_command_targets_it() {
        let commands = commands();
        let err = evaluate("stuff --help", &commands).unwrap_err();
        let ParseError::UsageRequested { root, target } = err else {
            panic!("expected usage request, got {err:?}");
        };
        assert_eq!(root.name, "stuff");
        assert_eq!(target.unwrap().name, "stuff");
    }

    #[test]
    fn unknown_root_command() {
        let err = evaluate("unknown", &commands()).unwrap_err();
        assert_eq!(err, ParseError::NoSuchCommand("unknown".to_string()));
    }

    #[test]
    fn empty_line_is_no_command() {
        let err = evaluate("   ", &commands()).unwrap_err();
        assert_eq!(err, ParseError::NoSuchCommand(String::new()));
    }

    #[test]
    fn option_at_end_of_line_misses_its_value() {
        let err = evaluate("stuff process --passes", &commands()).unwrap_err();
        assert_eq!(err, ParseError::MissingOptionValue("passes".to_string()));
    }

    #[test]
    fn dash_token_in_option_value_slot_misses_the_value() {
        let err = evaluate("stuff process --passes -v", &commands()).unwrap_err();
        assert_eq!(err, ParseError::MissingOptionValue("passes".to_string()));
    }

    #[test]
    fn required_input_must_be_bound() {
        let err = evaluate("stuff process -v", &commands()).unwrap_err();
        assert_eq!(err, ParseError::MissingInputArgument("textFile".to_string()));
    }

    #[test]
    fn optional_input_may_be_omitted() {
        let invocation = evaluate("stuff config", &commands()).unwrap();
        assert_eq!(invocation.commands, vec!["stuff", "config"]);
        assert_eq!(invocation.argument("level"), None);
    }

    #[test]
    fn input_value_failing_regex_is_a_format_error() {
        let err = evaluate("stuff config abc", &commands()).unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidInputValueFormat {
                input: "level".to_string(),
                value: "abc".to_string(),
            }
        );
    }

    #[test]
    fn unknown_dash_token_is_invalid_flag_or_option() {
        let err = evaluate("stuff process --bogus", &commands()).unwrap_err();
        assert_eq!(err, ParseError::InvalidFlagOrOption("--bogus".to_string()));
    }

    #[test]
    fn unknown_subcommand_under_menu() {
        let err = evaluate("stuff bogus", &commands()).unwrap_err();
        assert_eq!(err, ParseError::NoSuchSubcommand("bogus".to_string()));
    }

    #[test]
    fn trailing_token_with_nothing_to_bind_is_unexpected() {
        let err = evaluate("stuff ping extra", &commands()).unwrap_err();
        assert_eq!(err, ParseError::UnexpectedArgument("extra".to_string()));
    }

    #[test]
    fn repeated_flag_is_rejected() {
        let err = evaluate("stuff process -v --verbose", &commands()).unwrap_err();
        assert_eq!(err, ParseError::InvalidFlagOrOption("--verbose".to_string()));
    }

    #[test]
    fn repeated_single_occurrence_option_is_rejected() {
        let err = evaluate("stuff config -e true --enabled false", &commands()).unwrap_err();
        assert_eq!(err, ParseError::InvalidFlagOrOption("--enabled".to_string()));
    }

    #[test]
    fn value_passing_regex_but_failing_conversion_preserves_text() {
        let err = evaluate(
            "stuff process --passes 99999999999999999999 /tmp/banana.txt",
            &commands(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ParseError::ArgumentValueNotConvertibleToType {
                argument: "passes".to_string(),
                value: "99999999999999999999".to_string(),
                data_type: ArgumentDataType::Int,
            }
        );
    }

    #[test]
    fn bool_option_rejects_non_literals() {
        let err = evaluate("stuff config --enabled yes", &commands()).unwrap_err();
        assert_eq!(
            err,
            ParseError::ArgumentValueNotConvertibleToType {
                argument: "enabled".to_string(),
                value: "yes".to_string(),
                data_type: ArgumentDataType::Bool,
            }
        );
    }

    #[test]
    fn last_remaining_input_is_retained_and_rebinds() {
        // The final input is never consumed, so trailing positional tokens
        // keep binding to it, the last occurrence winning.
        let invocation = evaluate("stuff concat a b c", &commands()).unwrap();
        assert_eq!(
            invocation.argument("first"),
            Some(&ArgumentValue::String("a".to_string()))
        );
        assert_eq!(
            invocation.argument("second"),
            Some(&ArgumentValue::String("c".to_string()))
        );
    }

    #[test]
    fn multiple_allowed_option_keeps_last_occurrence() {
        let invocation = evaluate("stuff tag --label a -l b", &commands()).unwrap();
        assert_eq!(
            invocation.argument("label"),
            Some(&ArgumentValue::String("b".to_string()))
        );
    }

    #[test]
    fn help_subcommand_targets_containing_command() {
        let err = evaluate("stuff help", &commands()).unwrap_err();
        let ParseError::UsageRequested { root, target } = err else {
            panic!("expected usage request, got {err:?}");
        };
        assert_eq!(root.name, "stuff");
        assert_eq!(target.unwrap().name, "stuff");
    }

    #[test]
    fn help_subcommand_resolves_named_sibling() {
        let err = evaluate("stuff help process", &commands()).unwrap_err();
        let ParseError::UsageRequested { target, .. } = err else {
            panic!("expected usage request");
        };
        assert_eq!(target.unwrap().name, "process");
    }

    #[test]
    fn help_subcommand_resolves_root_level_names() {
        let err = evaluate("stuff help stuff", &commands()).unwrap_err();
        let ParseError::UsageRequested { target, .. } = err else {
            panic!("expected usage request");
        };
        assert_eq!(target.unwrap().name, "stuff");
    }

    #[test]
    fn help_subcommand_with_unknown_name_falls_back_to_containing() {
        let err = evaluate("stuff help nonexistent", &commands()).unwrap_err();
        let ParseError::UsageRequested { target, .. } = err else {
            panic!("expected usage request");
        };
        assert_eq!(target.unwrap().name, "stuff");
    }

    #[test]
    fn parser_terminates_on_arbitrary_input() {
        let commands = commands();
        let lines = [
            "",
            "   ",
            "stuff",
            "stuff process",
            "stuff process -v -v -v",
            "stuff -",
            "stuff --",
            "stuff process --passes --passes",
            "stuff \"unterminated",
            "stuff process \u{1F34C}",
            "stuff concat \"a b\" \"c d\" e",
            "stuff help help",
            "-h",
            "stuff process -v --passes 1 /definitely/not/a/file",
        ];
        for line in lines {
            // Every line must produce a result, never a panic.
            let _ = evaluate(line, &commands);
        }
    }
}
