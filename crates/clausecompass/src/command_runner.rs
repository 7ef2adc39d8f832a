use anyhow::{bail, Result};
use compass_cli::{CliCommandFileErrorMode, CommandFileEntry, CommandFileReport};

use crate::commands::CommandAction;

/// Runs scripted REPL lines through `handle_line`, printing a per-line error log and a summary.
pub(crate) fn execute_scripted_lines<F>(
    source: &str,
    entries: &[CommandFileEntry],
    mode: CliCommandFileErrorMode,
    mut handle_line: F,
) -> Result<CommandFileReport>
where
    F: FnMut(&str) -> Result<CommandAction>,
{
    let mut report = CommandFileReport {
        total: entries.len(),
        ..CommandFileReport::default()
    };

    for entry in entries {
        report.executed += 1;

        match handle_line(&entry.command) {
            Ok(CommandAction::Continue) => {
                report.succeeded += 1;
            }
            Ok(CommandAction::Exit) => {
                report.succeeded += 1;
                report.halted_early = true;
                println!(
                    "command file notice: source={source} line={} command={} action=exit",
                    entry.line_number, entry.command
                );
                break;
            }
            Err(error) => {
                report.failed += 1;
                println!(
                    "command file error: source={source} line={} command={} error={error:#}",
                    entry.line_number, entry.command
                );
                if mode == CliCommandFileErrorMode::FailFast {
                    report.halted_early = true;
                    break;
                }
            }
        }
    }

    println!(
        "command file summary: source={source} mode={} total={} executed={} succeeded={} failed={} halted_early={}",
        mode.as_str(),
        report.total,
        report.executed,
        report.succeeded,
        report.failed,
        report.halted_early
    );

    if mode == CliCommandFileErrorMode::FailFast && report.failed > 0 {
        bail!(
            "command file execution failed: source={source} failed={} mode={}",
            report.failed,
            mode.as_str()
        );
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use compass_cli::{parse_command_lines, CliCommandFileErrorMode};

    use super::execute_scripted_lines;
    use crate::commands::CommandAction;

    #[test]
    fn functional_continue_on_error_runs_every_line() {
        let entries = parse_command_lines("status\nboom\nshow_docs\n");
        let mut seen = Vec::new();
        let report = execute_scripted_lines(
            "test",
            &entries,
            CliCommandFileErrorMode::ContinueOnError,
            |line| {
                seen.push(line.to_string());
                if line == "boom" {
                    Err(anyhow!("forced failure"))
                } else {
                    Ok(CommandAction::Continue)
                }
            },
        )
        .expect("continue-on-error should not fail");

        assert_eq!(seen, vec!["status", "boom", "show_docs"]);
        assert_eq!(report.total, 3);
        assert_eq!(report.executed, 3);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);
        assert!(!report.halted_early);
    }

    #[test]
    fn regression_fail_fast_stops_at_first_failure() {
        let entries = parse_command_lines("boom\nstatus\n");
        let mut calls = 0;
        let error = execute_scripted_lines(
            "test",
            &entries,
            CliCommandFileErrorMode::FailFast,
            |_| {
                calls += 1;
                Err(anyhow!("forced failure"))
            },
        )
        .expect_err("fail-fast should fail");

        assert_eq!(calls, 1);
        assert!(error.to_string().contains("failed=1 mode=fail-fast"));
    }

    #[test]
    fn functional_exit_halts_early_successfully() {
        let entries = parse_command_lines("exit\nstatus\n");
        let report = execute_scripted_lines(
            "test",
            &entries,
            CliCommandFileErrorMode::FailFast,
            |line| {
                if line == "exit" {
                    Ok(CommandAction::Exit)
                } else {
                    Ok(CommandAction::Continue)
                }
            },
        )
        .expect("exit is not a failure");

        assert_eq!(report.executed, 1);
        assert_eq!(report.succeeded, 1);
        assert!(report.halted_early);
    }
}
