//! Command catalog schema.
//!
//! The catalog is the self-describing document a service advertises to
//! clients: a recursive tree of commands, where each command either opens an
//! inner menu of subcommands or accepts flags, options, and positional
//! inputs. The command-line parser evaluates typed lines against this schema
//! and the transport carries it as a versioned document.
//!
//! # Help Synthesis
//!
//! Every command constructed through [`Command::with_subcommands`] or
//! [`Command::with_arguments`] auto-contains a `help` entry: a `help`
//! subcommand for menu commands, a `-h`/`--help` flag for argument commands.
//! The synthesized entries are part of the encoded document, so they survive
//! encode/decode round-trips unchanged.
//!
//! # Wire Format
//!
//! The document encodes as JSON with camelCase field names. A command's
//! context distinguishes itself structurally: a `subcommands` field marks a
//! menu, the `flags`/`options`/`inputs`/`isLastInputVariadic` fields mark an
//! argument list.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value::ArgumentDataType;

/// Version of the commands specification document.
pub const COMMANDS_SPECIFICATION_VERSION: u32 = 1;

/// Name of the synthesized help flag and help subcommand.
pub const HELP_NAME: &str = "help";

/// Short form of the synthesized help flag.
pub const HELP_SHORT: char = 'h';

/// Errors surfaced by catalog construction and the document codec.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    /// The decoded document advertises an unsupported version.
    #[error(
        "incorrect command specification version {found} \
         (expected {COMMANDS_SPECIFICATION_VERSION})"
    )]
    IncorrectCommandSpecificationVersion {
        /// The version found in the document.
        found: u32,
    },

    /// Two siblings in a command's immediate namespace share a name.
    #[error("duplicate name {name:?} within command {command:?}")]
    DuplicateName {
        /// Command whose namespace contains the duplicate.
        command: String,
        /// The duplicated name.
        name: String,
    },

    /// Two flags or two options of one command share a short form.
    #[error("duplicate short -{short} within command {command:?}")]
    DuplicateShort {
        /// Command whose namespace contains the duplicate.
        command: String,
        /// The duplicated short.
        short: char,
    },

    /// The document failed to serialize.
    #[error("failed to encode commands specification: {0}")]
    Encode(#[source] serde_json::Error),

    /// The document failed to deserialize.
    #[error("failed to decode commands specification: {0}")]
    Decode(#[source] serde_json::Error),
}

/// A named boolean switch. Presence means `true`, absence means `false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flag {
    /// Long name, matched as `--name`.
    pub name: String,
    /// Optional single-character short form, matched as `-s`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<char>,
    /// Human-readable description for usage output.
    pub description: String,
}

impl Flag {
    /// Creates a flag with a short form.
    pub fn new(
        name: impl Into<String>,
        short: char,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            short: Some(short),
            description: description.into(),
        }
    }

    /// Creates a flag without a short form.
    pub fn long_only(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            short: None,
            description: description.into(),
        }
    }
}

/// A named argument carrying one value of a fixed type per occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opt {
    /// Long name, matched as `--name`.
    pub name: String,
    /// Optional single-character short form, matched as `-s`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<char>,
    /// Type of the value the option carries.
    pub data_type: ArgumentDataType,
    /// Whether the option may occur more than once on a line.
    pub is_multiple_allowed: bool,
    /// Optional regex the raw value must match before conversion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_regex: Option<String>,
    /// Human-readable description for usage output.
    pub description: String,
}

impl Opt {
    /// Creates an option with a short form.
    pub fn new(
        name: impl Into<String>,
        short: char,
        data_type: ArgumentDataType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            short: Some(short),
            data_type,
            is_multiple_allowed: false,
            validation_regex: None,
            description: description.into(),
        }
    }

    /// Creates an option without a short form.
    pub fn long_only(
        name: impl Into<String>,
        data_type: ArgumentDataType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            short: None,
            data_type,
            is_multiple_allowed: false,
            validation_regex: None,
            description: description.into(),
        }
    }

    /// Allows the option to occur more than once.
    #[must_use]
    pub fn multiple(mut self) -> Self {
        self.is_multiple_allowed = true;
        self
    }

    /// Requires raw values to match `pattern` before conversion.
    #[must_use]
    pub fn with_validation_regex(mut self, pattern: impl Into<String>) -> Self {
        self.validation_regex = Some(pattern.into());
        self
    }
}

/// A positional argument, bound left-to-right in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Input {
    /// Name the bound value is recorded under.
    pub name: String,
    /// Type of the value the input carries.
    pub data_type: ArgumentDataType,
    /// Whether the input may be omitted.
    pub is_optional: bool,
    /// Optional regex the raw value must match before conversion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_regex: Option<String>,
    /// Human-readable description for usage output.
    pub description: String,
}

impl Input {
    /// Creates a required input.
    pub fn new(
        name: impl Into<String>,
        data_type: ArgumentDataType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            data_type,
            is_optional: false,
            validation_regex: None,
            description: description.into(),
        }
    }

    /// Marks the input as optional.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.is_optional = true;
        self
    }

    /// Requires raw values to match `pattern` before conversion.
    #[must_use]
    pub fn with_validation_regex(mut self, pattern: impl Into<String>) -> Self {
        self.validation_regex = Some(pattern.into());
        self
    }
}

/// What a command opens into: an inner menu or an argument list.
///
/// The variant distinguishes itself on the wire by field presence, not by an
/// explicit tag: `subcommands` marks a menu, the argument fields mark an
/// argument list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandContext {
    /// The command opens an inner menu of subcommands.
    #[serde(rename_all = "camelCase")]
    Subcommands {
        /// The subcommand menu, order preserved.
        subcommands: Vec<Command>,
    },
    /// The command accepts flags, options, and positional inputs.
    #[serde(rename_all = "camelCase")]
    Arguments {
        /// Boolean switches.
        flags: Vec<Flag>,
        /// Named value arguments.
        options: Vec<Opt>,
        /// Positional arguments, binding order significant.
        inputs: Vec<Input>,
        /// Whether the last input may absorb trailing positional tokens.
        is_last_input_variadic: bool,
    },
}

/// One node in the command tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    /// Command name, unique among its siblings.
    pub name: String,
    /// Human-readable description for usage output.
    pub description: String,
    /// Menu or argument context, flattened into the command object.
    #[serde(flatten)]
    pub context: CommandContext,
}

impl Command {
    /// Creates a menu command, synthesizing a `help` subcommand.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateName`] when two subcommands share a
    /// name.
    pub fn with_subcommands(
        name: impl Into<String>,
        description: impl Into<String>,
        mut subcommands: Vec<Command>,
    ) -> Result<Self, CatalogError> {
        let name = name.into();

        if !subcommands.iter().any(|c| c.name == HELP_NAME) {
            subcommands.push(Self::help_subcommand()?);
        }

        let mut seen = std::collections::HashSet::new();
        for sub in &subcommands {
            if !seen.insert(sub.name.as_str()) {
                return Err(CatalogError::DuplicateName {
                    command: name,
                    name: sub.name.clone(),
                });
            }
        }

        Ok(Self {
            name,
            description: description.into(),
            context: CommandContext::Subcommands { subcommands },
        })
    }

    /// Creates an argument command, synthesizing a `-h`/`--help` flag.
    ///
    /// The help flag keeps its `h` short form unless another flag already
    /// claims it, in which case only the long form is synthesized. The `-h`
    /// token is recognized by the parser regardless.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateName`] when two arguments share a
    /// name, or [`CatalogError::DuplicateShort`] when two flags or two
    /// options share a short form.
    pub fn with_arguments(
        name: impl Into<String>,
        description: impl Into<String>,
        mut flags: Vec<Flag>,
        options: Vec<Opt>,
        inputs: Vec<Input>,
        is_last_input_variadic: bool,
    ) -> Result<Self, CatalogError> {
        let name = name.into();

        if !flags.iter().any(|f| f.name == HELP_NAME) {
            let short_taken = flags.iter().any(|f| f.short == Some(HELP_SHORT));
            let help = if short_taken {
                Flag::long_only(HELP_NAME, "Show help for this command.")
            } else {
                Flag::new(HELP_NAME, HELP_SHORT, "Show help for this command.")
            };
            flags.push(help);
        }

        let mut names = std::collections::HashSet::new();
        let all_names = flags
            .iter()
            .map(|f| f.name.as_str())
            .chain(options.iter().map(|o| o.name.as_str()))
            .chain(inputs.iter().map(|i| i.name.as_str()));
        for argument_name in all_names {
            if !names.insert(argument_name) {
                return Err(CatalogError::DuplicateName {
                    command: name,
                    name: argument_name.to_string(),
                });
            }
        }

        let mut flag_shorts = std::collections::HashSet::new();
        for flag in &flags {
            if let Some(short) = flag.short {
                if !flag_shorts.insert(short) {
                    return Err(CatalogError::DuplicateShort {
                        command: name,
                        short,
                    });
                }
            }
        }
        let mut option_shorts = std::collections::HashSet::new();
        for option in &options {
            if let Some(short) = option.short {
                if !option_shorts.insert(short) {
                    return Err(CatalogError::DuplicateShort {
                        command: name,
                        short,
                    });
                }
            }
        }

        Ok(Self {
            name,
            description: description.into(),
            context: CommandContext::Arguments {
                flags,
                options,
                inputs,
                is_last_input_variadic,
            },
        })
    }

    /// The synthesized `help` subcommand: takes an optional subcommand name.
    fn help_subcommand() -> Result<Self, CatalogError> {
        Self::with_arguments(
            HELP_NAME,
            "Show help for this command or one of its subcommands.",
            Vec::new(),
            Vec::new(),
            vec![
                Input::new(
                    "subcommand",
                    ArgumentDataType::String,
                    "Subcommand to show help for.",
                )
                .optional(),
            ],
            false,
        )
    }

    /// Subcommand menu, empty for argument commands.
    #[must_use]
    pub fn subcommands(&self) -> &[Command] {
        match &self.context {
            CommandContext::Subcommands { subcommands } => subcommands,
            CommandContext::Arguments { .. } => &[],
        }
    }

    /// Flags of an argument command, empty for menu commands.
    #[must_use]
    pub fn flags(&self) -> &[Flag] {
        match &self.context {
            CommandContext::Arguments { flags, .. } => flags,
            CommandContext::Subcommands { .. } => &[],
        }
    }

    /// Options of an argument command, empty for menu commands.
    #[must_use]
    pub fn options(&self) -> &[Opt] {
        match &self.context {
            CommandContext::Arguments { options, .. } => options,
            CommandContext::Subcommands { .. } => &[],
        }
    }

    /// Ordered inputs of an argument command, empty for menu commands.
    #[must_use]
    pub fn inputs(&self) -> &[Input] {
        match &self.context {
            CommandContext::Arguments { inputs, .. } => inputs,
            CommandContext::Subcommands { .. } => &[],
        }
    }

    /// Whether the last input of an argument command is variadic.
    #[must_use]
    pub fn is_last_input_variadic(&self) -> bool {
        match &self.context {
            CommandContext::Arguments {
                is_last_input_variadic,
                ..
            } => *is_last_input_variadic,
            CommandContext::Subcommands { .. } => false,
        }
    }

    /// Finds an immediate subcommand by name.
    #[must_use]
    pub fn subcommand(&self, name: &str) -> Option<&Command> {
        self.subcommands().iter().find(|c| c.name == name)
    }

    /// Resolves a `-s` / `--name` token against this command's flags.
    #[must_use]
    pub fn flag_matching(&self, token: &str) -> Option<&Flag> {
        if let Some(long) = token.strip_prefix("--") {
            self.flags().iter().find(|f| f.name == long)
        } else if let Some(short) = single_short(token) {
            self.flags().iter().find(|f| f.short == Some(short))
        } else {
            None
        }
    }

    /// Resolves a `-s` / `--name` token against this command's options.
    #[must_use]
    pub fn option_matching(&self, token: &str) -> Option<&Opt> {
        if let Some(long) = token.strip_prefix("--") {
            self.options().iter().find(|o| o.name == long)
        } else if let Some(short) = single_short(token) {
            self.options().iter().find(|o| o.short == Some(short))
        } else {
            None
        }
    }
}

/// Extracts the short character from a `-s` token, rejecting longer runs.
fn single_short(token: &str) -> Option<char> {
    let rest = token.strip_prefix('-')?;
    let mut chars = rest.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

/// The complete, versioned command catalog a service advertises.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandsSpecification {
    version: u32,
    /// The root command menu.
    pub commands: Vec<Command>,
}

impl CommandsSpecification {
    /// Wraps a command tree at the current specification version.
    #[must_use]
    pub fn new(commands: Vec<Command>) -> Self {
        Self {
            version: COMMANDS_SPECIFICATION_VERSION,
            commands,
        }
    }

    /// The document version.
    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Finds a root-level command by name.
    #[must_use]
    pub fn command(&self, name: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.name == name)
    }

    /// Encodes the catalog for transport.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Encode`] on serialization failure.
    pub fn encode(&self) -> Result<Vec<u8>, CatalogError> {
        serde_json::to_vec(self).map_err(CatalogError::Encode)
    }

    /// Decodes a catalog received over the wire, validating its version.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Decode`] on malformed input and
    /// [`CatalogError::IncorrectCommandSpecificationVersion`] when the
    /// document version does not match
    /// [`COMMANDS_SPECIFICATION_VERSION`].
    pub fn decode(bytes: &[u8]) -> Result<Self, CatalogError> {
        let spec: Self = serde_json::from_slice(bytes).map_err(CatalogError::Decode)?;
        if spec.version != COMMANDS_SPECIFICATION_VERSION {
            return Err(CatalogError::IncorrectCommandSpecificationVersion {
                found: spec.version,
            });
        }
        Ok(spec)
    }
}
