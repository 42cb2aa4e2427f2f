//! Usage block rendering.
//!
//! Renders the human-readable usage text shown when a parse ends in a usage
//! request: an overview line, a USAGE synopsis, and two-column SUBCOMMANDS /
//! FLAGS / OPTIONS / INPUTS sections. Descriptions start at a fixed column
//! and wrap within it; a left column that overruns the threshold pushes its
//! description to the next line.

use crate::catalog::{Command, CommandContext, HELP_NAME};

/// Column where descriptions start in two-column sections.
const DESCRIPTION_COLUMN: usize = 26;

/// Total width descriptions wrap at.
const WRAP_WIDTH: usize = 80;

/// Renders the usage block for `target` within the tree rooted at `root`.
///
/// When `target` is `None` (or not part of the tree) the block describes the
/// root command itself.
#[must_use]
pub fn render_usage(root: &Command, target: Option<&Command>) -> String {
    let target = target.unwrap_or(root);
    let path = command_path(root, target).unwrap_or_else(|| vec![target]);

    let mut out = String::new();

    if !target.description.is_empty() {
        out.push_str("OVERVIEW: ");
        out.push_str(&target.description);
        out.push_str("\n\n");
    }

    out.push_str("USAGE: ");
    out.push_str(&synopsis(&path, target));
    out.push('\n');

    match &target.context {
        CommandContext::Subcommands { subcommands } => {
            if !subcommands.is_empty() {
                out.push_str("\nSUBCOMMANDS:\n");
                for subcommand in subcommands {
                    two_column(&subcommand.name, &subcommand.description, &mut out);
                }
            }
        },
        CommandContext::Arguments {
            flags,
            options,
            inputs,
            is_last_input_variadic,
        } => {
            if !flags.is_empty() {
                out.push_str("\nFLAGS:\n");
                for flag in flags {
                    let left = match flag.short {
                        Some(short) => format!("-{short}, --{}", flag.name),
                        None => format!("--{}", flag.name),
                    };
                    two_column(&left, &flag.description, &mut out);
                }
            }
            if !options.is_empty() {
                out.push_str("\nOPTIONS:\n");
                for option in options {
                    let left = match option.short {
                        Some(short) => format!("-{short}, --{0} <{0}>", option.name),
                        None => format!("--{0} <{0}>", option.name),
                    };
                    two_column(&left, &option.description, &mut out);
                }
            }
            if !inputs.is_empty() {
                out.push_str("\nINPUTS:\n");
                for (index, input) in inputs.iter().enumerate() {
                    let variadic =
                        *is_last_input_variadic && index + 1 == inputs.len();
                    let mut left = if input.is_optional {
                        format!("[<{}>]", input.name)
                    } else {
                        format!("<{}>", input.name)
                    };
                    if variadic {
                        left.push_str(" ...");
                    }
                    two_column(&left, &input.description, &mut out);
                }
            }
        },
    }

    out
}

/// The one-line synopsis after `USAGE:`.
fn synopsis(path: &[&Command], target: &Command) -> String {
    let mut line = path
        .iter()
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    match &target.context {
        CommandContext::Subcommands { .. } => {
            line.push_str(" <subcommand>");
        },
        CommandContext::Arguments {
            flags,
            options,
            inputs,
            is_last_input_variadic,
        } => {
            for flag in flags.iter().filter(|f| f.name != HELP_NAME) {
                line.push_str(&format!(" [--{}]", flag.name));
            }
            for option in options {
                line.push_str(&format!(" [--{0} <{0}>]", option.name));
            }
            for (index, input) in inputs.iter().enumerate() {
                if input.is_optional {
                    line.push_str(&format!(" [<{}>]", input.name));
                } else {
                    line.push_str(&format!(" <{}>", input.name));
                }
                if *is_last_input_variadic && index + 1 == inputs.len() {
                    line.push_str(" ...");
                }
            }
        },
    }

    line
}

/// Finds the name path from `root` down to `target`, if target is in the
/// tree.
fn command_path<'a>(root: &'a Command, target: &'a Command) -> Option<Vec<&'a Command>> {
    fn walk<'a>(
        command: &'a Command,
        target: &'a Command,
        path: &mut Vec<&'a Command>,
    ) -> bool {
        path.push(command);
        if std::ptr::eq(command, target) || command == target {
            return true;
        }
        for subcommand in command.subcommands() {
            if walk(subcommand, target, path) {
                return true;
            }
        }
        path.pop();
        false
    }

    let mut path = Vec::new();
    walk(root, target, &mut path).then_some(path)
}

/// Appends one two-column entry, wrapping the description to the right
/// column.
fn two_column(left: &str, description: &str, out: &mut String) {
    out.push_str("  ");
    out.push_str(left);
    if description.is_empty() {
        out.push('\n');
        return;
    }

    let used = 2 + left.chars().count();
    if used + 1 > DESCRIPTION_COLUMN {
        out.push('\n');
        out.push_str(&" ".repeat(DESCRIPTION_COLUMN));
    } else {
        out.push_str(&" ".repeat(DESCRIPTION_COLUMN - used));
    }

    let mut column = DESCRIPTION_COLUMN;
    let mut first = true;
    for word in description.split_whitespace() {
        let width = word.chars().count();
        if !first && column + 1 + width > WRAP_WIDTH {
            out.push('\n');
            out.push_str(&" ".repeat(DESCRIPTION_COLUMN));
            column = DESCRIPTION_COLUMN;
            first = true;
        }
        if !first {
            out.push(' ');
            column += 1;
        }
        out.push_str(word);
        column += width;
        first = false;
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use crate::catalog::{Flag, Input, Opt};
    use crate::value::ArgumentDataType;

    use super::*;

    fn process() -> Command {
        Command::with_arguments(
            "process",
            "Process a text file.",
            vec![Flag::new("verbose", 'v', "Print progress while processing.")],
            vec![Opt::new(
                "passes",
                'p',
                ArgumentDataType::Int,
                "Number of processing passes.",
            )],
            vec![Input::new(
                "textFile",
                ArgumentDataType::File,
                "The file to process.",
            )],
            false,
        )
        .unwrap()
    }

    fn stuff() -> Command {
        Command::with_subcommands("stuff", "Do stuff to files.", vec![process()]).unwrap()
    }

    #[test]
    fn argument_command_block_has_all_sections() {
        let root = stuff();
        let target = root.subcommand("process").unwrap();
        let block = render_usage(&root, Some(target));

        assert!(block.starts_with("OVERVIEW: Process a text file.\n"));
        assert!(block.contains(
            "USAGE: stuff process [--verbose] [--passes <passes>] <textFile>\n"
        ));
        assert!(block.contains("FLAGS:\n"));
        assert!(block.contains("  -v, --verbose"));
        assert!(block.contains("  -h, --help"));
        assert!(block.contains("OPTIONS:\n"));
        assert!(block.contains("  -p, --passes <passes>"));
        assert!(block.contains("INPUTS:\n"));
        assert!(block.contains("  <textFile>"));
    }

    #[test]
    fn menu_command_block_lists_subcommands() {
        let root = stuff();
        let block = render_usage(&root, None);

        assert!(block.contains("USAGE: stuff <subcommand>\n"));
        assert!(block.contains("SUBCOMMANDS:\n"));
        assert!(block.contains("  process"));
        assert!(block.contains("  help"));
    }

    #[test]
    fn descriptions_start_at_the_threshold_column() {
        let root = stuff();
        let target = root.subcommand("process").unwrap();
        let block = render_usage(&root, Some(target));

        let line = block
            .lines()
            .find(|l| l.contains("--verbose"))
            .expect("verbose line");
        let description_at = line.find("Print").expect("description present");
        assert_eq!(description_at, DESCRIPTION_COLUMN);
    }

    #[test]
    fn wide_left_column_pushes_description_to_next_line() {
        let command = Command::with_arguments(
            "cmd",
            "",
            vec![],
            vec![Opt::new(
                "a-very-long-option-name",
                'a',
                ArgumentDataType::String,
                "The description.",
            )],
            vec![],
            false,
        )
        .unwrap();
        let block = render_usage(&command, None);

        let lines: Vec<&str> = block.lines().collect();
        let index = lines
            .iter()
            .position(|l| l.contains("a-very-long-option-name"))
            .unwrap();
        assert!(!lines[index].contains("The description."));
        assert_eq!(
            lines[index + 1],
            format!("{}The description.", " ".repeat(DESCRIPTION_COLUMN))
        );
    }

    #[test]
    fn long_descriptions_wrap_into_the_right_column() {
        let long = "word ".repeat(30);
        let command = Command::with_arguments(
            "cmd",
            "",
            vec![Flag::new("flag", 'f', long.trim())],
            vec![],
            vec![],
            false,
        )
        .unwrap();
        let block = render_usage(&command, None);

        let wrapped: Vec<&str> = block
            .lines()
            .filter(|l| l.trim_start().starts_with("word"))
            .collect();
        assert!(wrapped.len() > 1, "expected wrapped description lines");
        for line in wrapped {
            assert!(line.chars().count() <= WRAP_WIDTH);
            assert!(line.starts_with(&" ".repeat(DESCRIPTION_COLUMN)));
        }
    }

    #[test]
    fn optional_and_variadic_inputs_are_marked() {
        let command = Command::with_arguments(
            "cmd",
            "",
            vec![],
            vec![],
            vec![
                Input::new("first", ArgumentDataType::String, "First."),
                Input::new("rest", ArgumentDataType::String, "The rest.").optional(),
            ],
            true,
        )
        .unwrap();
        let block = render_usage(&command, None);

        assert!(block.contains("USAGE: cmd <first> [<rest>] ...\n"));
        assert!(block.contains("  [<rest>] ..."));
    }
}
