use std::fmt::Write as _;

use crate::driver::{Convergence, Outcome, StallReason};
use crate::error::Error;

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Print markdown to stderr, bolding headings.
fn print_markdown(md: &str) {
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
}

/// Render an error as valid markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    print_markdown(&render_error(e));
}

/// Print the stall report for a run that left placeholders. Prints nothing
/// for a converged run.
pub fn print_stall(convergence: &Convergence) {
    if let Some(md) = render_stall(convergence) {
        print_markdown(&md);
    }
}

fn render_duplicate_destination(name: &str) -> String {
    format!("\
# Error: Duplicate Destination

`{name}` is defined more than once, so references to it have no single page.

## Fix

Keep one `definition` block named `{name}`.
")
}

/// Render an error as a structured markdown diagnostic.
///
/// Each variant produces a block with what happened and, where there is one,
/// how to fix it.
pub fn render_error(e: &Error) -> String {
    match e {
        Error::ConfigNotFound { path } => format!("\
# Error: Config Not Found

`{}` does not exist.

## Fix

Check the `--config` path, or drop it to use `.pageref.toml` in the working directory.
", path.display()),
        Error::DocumentNotFound { path } => format!("\
# Error: Document Not Found

`{}` does not exist.
", path.display()),
        Error::DuplicateDestination { name } => render_duplicate_destination(name),
        Error::InvalidConfig { reason } => format!("\
# Error: Invalid Config

{reason}
"),
        Error::UnknownDialect { name } => render_unknown_dialect(name),
        Error::Io(e) => format!("\
# Error: I/O

{e}
"),
        Error::Json(e) => format!("\
# Error: JSON Serialization

{e}
"),
        Error::TomlDe(e) => format!("\
# Error: Invalid TOML

{e}
"),
    }
}

/// Markdown report naming the references left with placeholders.
pub fn render_stall(convergence: &Convergence) -> Option<String> {
    let Outcome::Stalled { reason, unresolved } = &convergence.outcome else {
        return None;
    };
    let passes = convergence.passes();
    let why = match reason {
        StallReason::NoProgress => format!("the unresolved count stopped shrinking after {passes} passes"),
        StallReason::PassLimit => format!("the pass limit of {passes} was reached"),
    };

    let mut out = format!("\
# Warning: Unresolved Page References

{} references could not be page-annotated: {why}.

## Unplaced destinations

", unresolved.len());
    for name in unresolved {
        let _ = writeln!(out, "- `{name}`");
    }
    out.push_str("\
\n## Fix

Make sure each destination is laid out in this document, or raise
`convergence.max_passes` in `.pageref.toml`.
");
    Some(out)
}

fn render_unknown_dialect(name: &str) -> String {
    format!(
        "\
# Error: Unknown Dialect

No output dialect named `{name}`.

## Supported dialects

- `latex`: LaTeX with hyperref
- `pdf`: inline PDF link markup
"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stall_report_lists_names() {
        let convergence = Convergence {
            outcome: Outcome::Stalled {
                reason: StallReason::NoProgress,
                unresolved: vec!["Xxx".to_string(), "Yyy".to_string()],
            },
            output: String::new(),
            unresolved_per_pass: vec![2, 2],
        };
        let md = render_stall(&convergence).unwrap();
        assert!(md.contains("2 references could not be page-annotated"));
        assert!(md.contains("after 2 passes"));
        assert!(md.contains("- `Xxx`\n- `Yyy`\n"));
    }

    #[test]
    fn converged_run_has_no_report() {
        let convergence = Convergence {
            outcome: Outcome::Converged,
            output: String::new(),
            unresolved_per_pass: vec![1, 0],
        };
        assert!(render_stall(&convergence).is_none());
    }

    #[test]
    fn duplicate_destination_names_the_entity() {
        let md = render_error(&Error::DuplicateDestination { name: "Bbb".to_string() });
        assert!(md.starts_with("# Error: Duplicate Destination"));
        assert!(md.contains("`Bbb`"));
    }
}
