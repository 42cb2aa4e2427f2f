//! Parser state machine.
//!
//! The parser drives a direct `(state, event) -> state` transition function
//! over the scanned tokens. Each successful transition commits its effect to
//! the [`ParseContext`] before the next token is classified; a failed commit
//! moves the machine to `Failure` with the commit's diagnostic.

use crate::catalog::{Command, Flag, Input, Opt};

use super::context::ParseContext;
use super::error::ParseError;

/// The states of the token parser. `Success` and `Failure` are terminal.
#[derive(Debug)]
pub(super) enum ParserState<'a> {
    /// At a command, nothing scanned since entering it.
    Command,
    /// Descended into a subcommand.
    ParsedSubcommand(&'a Command),
    /// Recorded a flag.
    ParsedFlag(&'a Flag),
    /// Scanned an option name; its value must follow.
    ParsedOption(&'a Opt),
    /// Recorded an option's value.
    ParsedOptionValue(&'a Opt),
    /// Recorded a positional input.
    ParsedInput(&'a Input),
    /// All tokens consumed cleanly.
    Success,
    /// The parse failed with a diagnostic.
    Failure(ParseError),
}

impl ParserState<'_> {
    pub(super) fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failure(_))
    }
}

/// Events produced by classifying one token (or the end of the line)
/// against the current command.
#[derive(Debug)]
pub(super) enum ParserEvent<'a> {
    ScannedSubcommand(&'a Command),
    ScannedFlag(&'a Flag),
    ScannedOption(&'a Opt),
    ScannedOptionValue(&'a Opt, String),
    ScannedInput(&'a Input, String),
    ScannedInvalidFlagOrOption(String),
    ScannedHelpFlag(&'a Command),
    ScannedUnexpectedArgument(String),
    ErrorWasThrown(ParseError),
    NoMoreArguments,
}

/// Applies one event: commits its effect to the context and returns the
/// next state. `root` is the root command of the parse, used to build
/// usage-request diagnostics.
pub(super) fn transition<'a>(
    state: &ParserState<'a>,
    event: ParserEvent<'a>,
    context: &mut ParseContext<'a>,
    root: &'a Command,
) -> ParserState<'a> {
    if state.is_terminal() {
        return ParserState::Failure(ParseError::UnexpectedError);
    }

    match event {
        ParserEvent::ScannedSubcommand(subcommand) => {
            context.descend(subcommand);
            ParserState::ParsedSubcommand(subcommand)
        },
        ParserEvent::ScannedFlag(flag) => match context.commit_flag(flag) {
            Ok(()) => ParserState::ParsedFlag(flag),
            Err(err) => ParserState::Failure(err),
        },
        ParserEvent::ScannedOption(option) => ParserState::ParsedOption(option),
        ParserEvent::ScannedOptionValue(option, raw) => {
            match context.commit_option_value(option, &raw) {
                Ok(()) => ParserState::ParsedOptionValue(option),
                Err(err) => ParserState::Failure(err),
            }
        },
        ParserEvent::ScannedInput(input, raw) => match context.commit_input(input, &raw) {
            Ok(()) => ParserState::ParsedInput(input),
            Err(err) => ParserState::Failure(err),
        },
        ParserEvent::ScannedInvalidFlagOrOption(token) => {
            ParserState::Failure(ParseError::InvalidFlagOrOption(token))
        },
        ParserEvent::ScannedHelpFlag(target) => {
            ParserState::Failure(ParseError::UsageRequested {
                root: Box::new(root.clone()),
                target: Some(Box::new(target.clone())),
            })
        },
        ParserEvent::ScannedUnexpectedArgument(token) => {
            ParserState::Failure(ParseError::UnexpectedArgument(token))
        },
        ParserEvent::ErrorWasThrown(err) => ParserState::Failure(err),
        ParserEvent::NoMoreArguments => match state {
            ParserState::ParsedOption(option) => {
                ParserState::Failure(ParseError::MissingOptionValue(option.name.clone()))
            },
            _ => ParserState::Success,
        },
    }
}
