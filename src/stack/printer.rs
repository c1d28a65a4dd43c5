use super::StackReport;
use colored::Colorize;
use std::fmt::Write;

/// Renders the report as a titled list per non-empty category
pub fn render_stack(report: &StackReport, label: &str) -> String {
    let sections: [(&str, &[String]); 8] = [
        ("Languages", &report.languages),
        ("Runtime", &report.runtimes),
        ("Frontend", &report.frontend),
        ("Backend", &report.backend),
        ("Databases / ORM", &report.databases),
        ("Tooling", &report.tooling),
        ("Infrastructure / Deploy", &report.infra),
        ("Package Managers", &report.package_managers),
    ];

    let mut out = String::new();
    let _ = writeln!(out, "\n{} {}", "Stack summary for".bold(), label.bold().cyan());

    if report.is_empty() {
        let _ = writeln!(out, "\nNo stack signals detected.");
    }
    for (title, items) in sections {
        if items.is_empty() {
            continue;
        }
        let _ = writeln!(out, "\n{}:", title.green().bold());
        for item in items {
            let _ = writeln!(out, "- {}", item);
        }
    }
    out
}

/// Prints the report to stdout
pub fn print_stack(report: &StackReport, label: &str) {
    println!("{}", render_stack(report, label));
}
