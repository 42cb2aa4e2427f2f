//! Demo catalog and handler for the bundled service binary.
//!
//! A small command set exercising every response type: console text,
//! screenshots, and file deliveries. Real host applications register their
//! own catalog and handler; this one doubles as the fixture for the
//! integration tests.

use approach_core::catalog::{
    CatalogError, Command, CommandsSpecification, Flag, Input, Opt,
};
use approach_core::invocation::Invocation;
use approach_core::value::{ArgumentDataType, ArgumentValue};
use approach_core::wire::FilePayload;

use crate::handler::{CommandHandler, HandlerError, ResponseSink};

/// A 1x1 transparent PNG, enough for a client to save and open.
const SAMPLE_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x62, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// Builds the demo command catalog.
///
/// # Errors
///
/// Returns [`CatalogError`] if the tree violates a uniqueness invariant;
/// with this fixed layout that indicates a programming error.
pub fn demo_specification() -> Result<CommandsSpecification, CatalogError> {
    let process = Command::with_arguments(
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
    )?;

    let stuff = Command::with_subcommands("stuff", "Do stuff to files.", vec![process])?;

    let echo = Command::with_arguments(
        "echo",
        "Echo text back over console output.",
        Vec::new(),
        Vec::new(),
        vec![Input::new(
            "text",
            ArgumentDataType::String,
            "Text to echo.",
        )],
        true,
    )?;

    let screenshot = Command::with_arguments(
        "screenshot",
        "Capture the current screen.",
        Vec::new(),
        Vec::new(),
        Vec::new(),
        false,
    )?;

    let sendfile = Command::with_arguments(
        "sendfile",
        "Send a generated file to the client.",
        Vec::new(),
        Vec::new(),
        vec![Input::new(
            "name",
            ArgumentDataType::String,
            "Basename for the generated file.",
        )],
        false,
    )?;

    Ok(CommandsSpecification::new(vec![
        stuff, echo, screenshot, sendfile,
    ]))
}

/// Handler implementing the demo commands.
#[derive(Debug, Default)]
pub struct DemoHandler;

impl DemoHandler {
    fn process(&self, invocation: &Invocation, sink: &ResponseSink) -> Result<(), HandlerError> {
        let verbose = matches!(
            invocation.argument("verbose"),
            Some(ArgumentValue::Bool(true))
        );
        let passes = match invocation.argument("passes") {
            Some(ArgumentValue::Int(n)) => *n,
            _ => 1,
        };
        let Some(ArgumentValue::File { name, data }) = invocation.argument("textFile") else {
            return Err(HandlerError::Failed("textFile argument missing".to_string()));
        };

        if verbose {
            for pass in 1..=passes {
                sink.console_output(format!("pass {pass}/{passes} over {name}"))?;
            }
        }
        sink.console_output(format!(
            "processed {name} ({} bytes) in {passes} pass(es)",
            data.len()
        ))
    }

    fn echo(&self, invocation: &Invocation, sink: &ResponseSink) -> Result<(), HandlerError> {
        match invocation.argument("text") {
            Some(ArgumentValue::String(text)) => sink.console_output(text.clone()),
            _ => sink.console_output(""),
        }
    }

    fn screenshot(&self, sink: &ResponseSink) -> Result<(), HandlerError> {
        sink.screenshot(SAMPLE_PNG.to_vec())
    }

    fn sendfile(&self, invocation: &Invocation, sink: &ResponseSink) -> Result<(), HandlerError> {
        let Some(ArgumentValue::String(name)) = invocation.argument("name") else {
            return Err(HandlerError::Failed("name argument missing".to_string()));
        };
        sink.file(&FilePayload {
            filename: format!("{name}.txt"),
            filedata: format!("generated for {name}\n").into_bytes(),
        })
    }
}

impl CommandHandler for DemoHandler {
    fn execute(&self, invocation: &Invocation, sink: &ResponseSink) -> Result<(), HandlerError> {
        let chain: Vec<&str> = invocation.commands.iter().map(String::as_str).collect();
        match chain.as_slice() {
            ["stuff", "process"] => self.process(invocation, sink),
            ["echo"] => self.echo(invocation, sink),
            ["screenshot"] => self.screenshot(sink),
            ["sendfile"] => self.sendfile(invocation, sink),
            other => Err(HandlerError::Failed(format!(
                "no handler for command {:?}",
                other.join(" ")
            ))),
        }
    }
}
