//! Parser diagnostics.

use thiserror::Error;

use crate::catalog::Command;
use crate::value::ArgumentDataType;

/// Errors produced while evaluating a command line against a catalog.
///
/// Parser errors are never fatal to a session: they are rendered to the user
/// who types another line. [`ParseError::UsageRequested`] is an error in form
/// but a successful outcome in intent — it carries the commands needed to
/// render a usage block.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The parser reached a state it has no transition for.
    #[error("unexpected parser error")]
    UnexpectedError,

    /// A `-`/`--` token matched neither a flag nor an option.
    #[error("invalid flag or option: {0}")]
    InvalidFlagOrOption(String),

    /// A positional token arrived with nothing left to bind it to.
    #[error("unexpected argument: {0}")]
    UnexpectedArgument(String),

    /// An option was not followed by a value.
    #[error("missing value for option --{0}")]
    MissingOptionValue(String),

    /// A required input was never bound.
    #[error("missing input argument <{0}>")]
    MissingInputArgument(String),

    /// An option value failed its validation regex.
    #[error("invalid format {value:?} for option --{option}")]
    InvalidOptionValueFormat {
        /// The option whose validation failed.
        option: String,
        /// The raw value as typed.
        value: String,
    },

    /// An input value failed its validation regex.
    #[error("invalid format {value:?} for input <{input}>")]
    InvalidInputValueFormat {
        /// The input whose validation failed.
        input: String,
        /// The raw value as typed.
        value: String,
    },

    /// The user asked for help; render a usage block for `target`.
    #[error("usage requested for {}", target.as_deref().map_or(root.name.as_str(), |t| t.name.as_str()))]
    UsageRequested {
        /// The root command of the parse.
        root: Box<Command>,
        /// The command help was requested for; the root when absent.
        target: Option<Box<Command>>,
    },

    /// The first token named no known root command.
    #[error("no such command: {0}")]
    NoSuchCommand(String),

    /// A token under a menu command named no known subcommand.
    #[error("no such subcommand: {0}")]
    NoSuchSubcommand(String),

    /// A raw value could not be converted to its argument's data type.
    #[error("value {value:?} for argument {argument:?} is not convertible to type {data_type}")]
    ArgumentValueNotConvertibleToType {
        /// The argument the value was bound to.
        argument: String,
        /// The raw value as typed.
        value: String,
        /// The type the conversion targeted.
        data_type: ArgumentDataType,
    },

    /// The line could not be split into tokens.
    #[error("failed to tokenize command line: {0}")]
    FailedToTokenizeCommandLine(String),
}
