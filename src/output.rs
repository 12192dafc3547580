//! Shared output formatting for kanban CLI commands.

use serde::Serialize;

use crate::error::{exit_codes, Error, Result};
use crate::issue::Item;

pub const SCHEMA_VERSION: &str = "kanban.v1";

#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

#[derive(Debug, Clone)]
pub struct HumanOutput {
    header: String,
    summary: Vec<(String, String)>,
    details: Vec<String>,
    warnings: Vec<String>,
    next_steps: Vec<String>,
}

impl HumanOutput {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            summary: Vec::new(),
            details: Vec::new(),
            warnings: Vec::new(),
            next_steps: Vec::new(),
        }
    }

    pub fn push_summary(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.summary.push((key.into(), value.into()));
    }

    pub fn push_detail(&mut self, value: impl Into<String>) {
        self.details.push(value.into());
    }

    pub fn push_warning(&mut self, value: impl Into<String>) {
        self.warnings.push(value.into());
    }

    pub fn push_next_step(&mut self, value: impl Into<String>) {
        self.next_steps.push(value.into());
    }
}

pub fn emit_success<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    human: Option<&HumanOutput>,
) -> Result<()> {
    if options.json {
        let warnings = human.map(|h| h.warnings.clone()).unwrap_or_default();
        let next_steps = human.map(|h| h.next_steps.clone()).unwrap_or_default();

        #[derive(Serialize)]
        struct Envelope<'a, T: Serialize> {
            schema_version: &'static str,
            command: &'a str,
            status: &'static str,
            data: &'a T,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            warnings: Vec<String>,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            next_steps: Vec<String>,
        }

        let payload = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "success",
            data,
            warnings,
            next_steps,
        };

        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    if options.quiet {
        return Ok(());
    }

    if let Some(human) = human {
        println!("{}", format_human(human));
    }

    Ok(())
}

pub fn emit_error(command: &str, err: &Error, json: bool) -> Result<()> {
    let next_steps = error_next_steps(err);
    let hint = next_steps.first().map(|step| step.as_str());
    if json {
        #[derive(Serialize)]
        struct ErrorBody<'a> {
            message: &'a str,
            code: i32,
            kind: &'static str,
            #[serde(skip_serializing_if = "Option::is_none")]
            details: Option<serde_json::Value>,
        }

        #[derive(Serialize)]
        struct Envelope<'a> {
            schema_version: &'static str,
            command: &'a str,
            status: &'static str,
            error: ErrorBody<'a>,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            next_steps: Vec<String>,
        }

        let payload = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "error",
            error: ErrorBody {
                message: &err.to_string(),
                code: err.exit_code(),
                kind: error_kind(err),
                details: err.details(),
            },
            next_steps,
        };

        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    eprintln!("error: {err}");
    if let Some(hint) = hint {
        eprintln!("hint: {hint}");
    }
    Ok(())
}

pub fn format_human(output: &HumanOutput) -> String {
    let mut lines = Vec::new();
    lines.push(output.header.clone());

    push_summary(&mut lines, &output.summary);
    push_section(&mut lines, "Details", &output.details);
    push_section(&mut lines, "Warnings", &output.warnings);
    push_section(&mut lines, "Next steps", &output.next_steps);

    lines.join("\n")
}

/// One-line rendering of an item for lists and history.
pub fn item_line(item: &Item) -> String {
    let id = item
        .id()
        .map(|id| format!("#{id}"))
        .unwrap_or_else(|| "#-".to_string());
    let mut line = format!(
        "{id} [{}] {} ({})",
        item.status().label(),
        item.name(),
        item.kind().to_string().to_lowercase()
    );
    if let Some(epic_id) = item.epic_id() {
        line.push_str(&format!(" in epic #{epic_id}"));
    }
    line
}

pub fn infer_command_name_from_args() -> String {
    command_name_from(std::env::args().skip(1))
}

fn command_name_from(mut args: impl Iterator<Item = String>) -> String {
    let mut subcommand = None;

    let command = loop {
        match args.next() {
            // Global flags that take a value would otherwise be read as the command.
            Some(arg) if matches!(arg.as_str(), "--file" | "--config") => {
                args.next();
            }
            Some(arg) if arg.starts_with('-') => continue,
            Some(arg) => break arg,
            None => return "kanban".to_string(),
        }
    };

    if matches!(command.as_str(), "task" | "epic" | "subtask") {
        for arg in args.by_ref() {
            if arg.starts_with('-') {
                continue;
            }
            subcommand = Some(arg);
            break;
        }
    }

    if let Some(sub) = subcommand {
        format!("{command} {sub}")
    } else {
        command
    }
}

fn error_kind(err: &Error) -> &'static str {
    match err.exit_code() {
        exit_codes::USER_ERROR => "user_error",
        exit_codes::CONSISTENCY_VIOLATION => "consistency_violation",
        _ => "operation_failed",
    }
}

fn error_next_steps(err: &Error) -> Vec<String> {
    match err {
        Error::NotFound { kind, .. } => {
            vec![format!("kanban {} list", kind.to_string().to_lowercase())]
        }
        Error::InvalidConfig(_) => vec!["fix kanban.toml then retry".to_string()],
        Error::CorruptRecord { line, .. } => {
            vec![format!("repair line {line} of the data file then retry")]
        }
        Error::LockFailed(_) => {
            vec!["retry once the other kanban process finishes".to_string()]
        }
        _ => Vec::new(),
    }
}

fn push_summary(lines: &mut Vec<String>, summary: &[(String, String)]) {
    if summary.is_empty() {
        return;
    }

    lines.push(String::new());
    lines.push("Summary:".to_string());
    for (key, value) in summary {
        if value.is_empty() {
            lines.push(format!("- {key}"));
        } else {
            lines.push(format!("- {key}: {value}"));
        }
    }
}

fn push_section(lines: &mut Vec<String>, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }

    lines.push(String::new());
    lines.push(format!("{title}:"));
    for item in items {
        lines.push(format!("- {item}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::{ItemId, ItemKind, Status, Subtask};

    fn args(values: &[&str]) -> impl Iterator<Item = String> {
        values
            .iter()
            .map(|value| value.to_string())
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn human_output_sections_are_ordered() {
        let mut human = HumanOutput::new("kanban task new: created #1");
        human.push_summary("name", "Write docs");
        human.push_summary("flagged", "");
        human.push_detail("first detail");
        human.push_next_step("kanban task show 1");

        let text = format_human(&human);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "kanban task new: created #1",
                "",
                "Summary:",
                "- name: Write docs",
                "- flagged",
                "",
                "Details:",
                "- first detail",
                "",
                "Next steps:",
                "- kanban task show 1",
            ]
        );
    }

    #[test]
    fn command_name_includes_item_subcommand() {
        assert_eq!(command_name_from(args(&["--json", "task", "new", "x"])), "task new");
        assert_eq!(
            command_name_from(args(&["--file", "board.csv", "epic", "list"])),
            "epic list"
        );
        assert_eq!(command_name_from(args(&["view", "1", "2"])), "view");
        assert_eq!(command_name_from(args(&["--quiet"])), "kanban");
    }

    #[test]
    fn error_kinds_follow_exit_codes() {
        assert_eq!(
            error_kind(&Error::not_found(ItemKind::Task, ItemId::new(1))),
            "user_error"
        );
        assert_eq!(
            error_kind(&Error::ConsistencyViolation("x".to_string())),
            "consistency_violation"
        );
        assert_eq!(
            error_kind(&Error::CorruptRecord {
                line: 2,
                reason: "x".to_string()
            }),
            "operation_failed"
        );
    }

    #[test]
    fn not_found_suggests_listing_that_kind() {
        let steps = error_next_steps(&Error::not_found(ItemKind::Epic, ItemId::new(4)));
        assert_eq!(steps, vec!["kanban epic list".to_string()]);
    }

    #[test]
    fn item_line_mentions_owner_for_subtasks() {
        let subtask = Subtask::new(ItemId::new(2), "Tag build", "", Status::InProgress)
            .with_id(ItemId::new(5));
        assert_eq!(
            item_line(&Item::from(subtask)),
            "#5 [In Progress] Tag build (subtask) in epic #2"
        );
    }
}
