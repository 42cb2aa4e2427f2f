//! Mutable state accumulated over one parse.

use std::collections::{BTreeMap, VecDeque};

use regex::Regex;

use crate::catalog::{Command, Flag, Input, Opt};
use crate::invocation::Invocation;
use crate::value::ArgumentValue;

use super::error::ParseError;

/// Per-parse working state: the command chain resolved so far, the values
/// committed so far, and the flags/options/inputs still available at the
/// current command. Created per parse, discarded on completion.
pub(super) struct ParseContext<'a> {
    chain: Vec<&'a Command>,
    remaining_flags: Vec<&'a Flag>,
    remaining_options: Vec<&'a Opt>,
    remaining_inputs: VecDeque<&'a Input>,
    arguments: BTreeMap<String, ArgumentValue>,
}

impl<'a> ParseContext<'a> {
    pub(super) fn new(root: &'a Command) -> Self {
        let mut context = Self {
            chain: Vec::new(),
            remaining_flags: Vec::new(),
            remaining_options: Vec::new(),
            remaining_inputs: VecDeque::new(),
            arguments: BTreeMap::new(),
        };
        context.enter(root);
        context
    }

    /// The deepest command descended into so far.
    pub(super) fn current_command(&self) -> &'a Command {
        self.chain.last().copied().expect("chain starts non-empty")
    }

    /// The resolved chain, root first.
    pub(super) fn chain(&self) -> &[&'a Command] {
        &self.chain
    }

    pub(super) fn has_remaining_inputs(&self) -> bool {
        !self.remaining_inputs.is_empty()
    }

    /// The next input a positional token would bind to.
    pub(super) fn next_input(&self) -> Option<&'a Input> {
        self.remaining_inputs.front().copied()
    }

    pub(super) fn argument(&self, name: &str) -> Option<&ArgumentValue> {
        self.arguments.get(name)
    }

    /// Descends into a subcommand: the chain grows and the available
    /// argument sets are replaced by the subcommand's.
    pub(super) fn descend(&mut self, subcommand: &'a Command) {
        self.enter(subcommand);
    }

    fn enter(&mut self, command: &'a Command) {
        self.chain.push(command);
        self.remaining_flags = command.flags().iter().collect();
        self.remaining_options = command.options().iter().collect();
        self.remaining_inputs = command.inputs().iter().collect();
    }

    /// Records a flag occurrence. A flag already consumed on this line is an
    /// error.
    pub(super) fn commit_flag(&mut self, flag: &'a Flag) -> Result<(), ParseError> {
        let Some(index) = self.remaining_flags.iter().position(|f| f.name == flag.name) else {
            return Err(ParseError::InvalidFlagOrOption(format!("--{}", flag.name)));
        };
        self.remaining_flags.remove(index);
        self.arguments
            .insert(flag.name.clone(), ArgumentValue::Bool(true));
        Ok(())
    }

    /// Validates, converts, and records an option value. The option leaves
    /// the available set unless it allows multiple occurrences.
    pub(super) fn commit_option_value(
        &mut self,
        option: &'a Opt,
        raw: &str,
    ) -> Result<(), ParseError> {
        let index = self
            .remaining_options
            .iter()
            .position(|o| o.name == option.name);
        if index.is_none() && !option.is_multiple_allowed {
            return Err(ParseError::InvalidFlagOrOption(format!("--{}", option.name)));
        }

        if let Some(pattern) = &option.validation_regex {
            if !matches_pattern(pattern, raw) {
                return Err(ParseError::InvalidOptionValueFormat {
                    option: option.name.clone(),
                    value: raw.to_string(),
                });
            }
        }

        let value = ArgumentValue::from_text(option.data_type, raw).map_err(|e| {
            ParseError::ArgumentValueNotConvertibleToType {
                argument: option.name.clone(),
                value: e.value,
                data_type: e.data_type,
            }
        })?;

        if !option.is_multiple_allowed {
            if let Some(index) = index {
                self.remaining_options.remove(index);
            }
        }
        self.arguments.insert(option.name.clone(), value);
        Ok(())
    }

    /// Validates, converts, and records an input value. The head of the
    /// remaining inputs is consumed unless it is the only one left, which is
    /// retained so trailing positional tokens can still bind to it.
    pub(super) fn commit_input(&mut self, input: &'a Input, raw: &str) -> Result<(), ParseError> {
        if let Some(pattern) = &input.validation_regex {
            if !matches_pattern(pattern, raw) {
                return Err(ParseError::InvalidInputValueFormat {
                    input: input.name.clone(),
                    value: raw.to_string(),
                });
            }
        }

        let value = ArgumentValue::from_text(input.data_type, raw).map_err(|e| {
            ParseError::ArgumentValueNotConvertibleToType {
                argument: input.name.clone(),
                value: e.value,
                data_type: e.data_type,
            }
        })?;

        if self.remaining_inputs.len() > 1 {
            self.remaining_inputs.pop_front();
        }
        self.arguments.insert(input.name.clone(), value);
        Ok(())
    }

    /// Completes the parse: every required input must have been bound.
    pub(super) fn finish(self) -> Result<Invocation, ParseError> {
        for input in &self.remaining_inputs {
            if !input.is_optional && !self.arguments.contains_key(&input.name) {
                return Err(ParseError::MissingInputArgument(input.name.clone()));
            }
        }
        let commands = self.chain.iter().map(|c| c.name.clone()).collect();
        Ok(Invocation::new(commands, self.arguments))
    }
}

/// A value matches only if the pattern compiles and matches; an invalid
/// pattern rejects every value.
fn matches_pattern(pattern: &str, raw: &str) -> bool {
    Regex::new(pattern).is_ok_and(|re| re.is_match(raw))
}
