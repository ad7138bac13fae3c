use colored::*;
use jiff::{Timestamp, Zoned};

use crate::{
    models::{backup::BackupInfo, settings::Settings, task::Task},
    services::tasks::{due_has_time, format_due_date, is_overdue},
};

/// Get the terminal width, defaulting to 80 if unavailable
fn get_terminal_width() -> usize {
    term_size::dimensions().map(|(w, _)| w).unwrap_or(80)
}

/// Get the appropriate status glyph for a task
pub fn get_status_glyph(task: &Task, is_overdue: bool) -> ColoredString {
    if task.completed {
        "✓".dimmed()
    } else if is_overdue {
        "●".red()
    } else {
        "○".normal()
    }
}

/// Label shown on the right of a task line: due date for open tasks,
/// completion date for done ones
pub fn get_task_label(task: &Task, now: &Zoned, settings: &Settings) -> Option<String> {
    if task.completed {
        return task
            .completed_at
            .map(|done| format!("done {}", format_completion_date(done, now)));
    }

    task.due.map(|due| {
        let has_time = due_has_time(due, now.time_zone());
        format_due_date(due, has_time, now, settings.time_format)
    })
}

/// Render a single task line with short id, glyph, title, and right-aligned due label
pub fn render_task_line(task: &Task, now: &Zoned, settings: &Settings) {
    let terminal_width = get_terminal_width();

    let overdue = is_overdue(task, now.timestamp());
    let glyph = get_status_glyph(task, overdue);
    let id_str = task.short_id();

    let left_section = format!("  {}  {}  {}", id_str, glyph, task.title);
    let left_visible_len = format!("  {}  {}  {}", id_str, " ", task.title)
        .chars()
        .count();

    let styled_left = if task.completed {
        left_section.dimmed()
    } else {
        left_section.bold()
    };

    match get_task_label(task, now, settings) {
        Some(label) => {
            let right_visible_len = label.chars().count();
            let styled_right = if overdue {
                label.red()
            } else {
                label.dimmed()
            };

            let total_content = left_visible_len + right_visible_len;
            if total_content + 4 < terminal_width {
                let padding = terminal_width - total_content - 2;
                println!("{}{}{}", styled_left, " ".repeat(padding), styled_right);
            } else {
                // Not enough space for right alignment, just print normally
                println!("{}  {}", styled_left, styled_right);
            }
        }
        None => println!("{}", styled_left),
    }

    if !task.notes.is_empty() {
        println!("              {}", task.notes.dimmed());
    }
}

/// Format a completion date for display (e.g., "oct 15", "today", "yesterday")
fn format_completion_date(timestamp: Timestamp, now: &Zoned) -> String {
    let date = timestamp.to_zoned(now.time_zone().clone()).date();
    let today = now.date();

    if date == today {
        "today".to_string()
    } else if today.yesterday().is_ok_and(|yesterday| yesterday == date) {
        "yesterday".to_string()
    } else {
        date.strftime("%b %-d").to_string().to_lowercase()
    }
}

/// Render a view header with title and count
pub fn render_view_header(title: &str, count: usize) {
    let task_word = if count == 1 { "task" } else { "tasks" };
    println!("\n  {} ({} {})\n", title.cyan().bold(), count, task_word);
}

/// Render a section header (e.g., "Completed")
pub fn render_section_header(title: &str) {
    println!("\n  ─── {} ───\n", title.bold());
}

pub fn render_backup_info(info: &BackupInfo) {
    render_view_header("Data", info.total_tasks);
    println!("  {:<14}{}", "active", info.active_tasks);
    println!("  {:<14}{}", "completed", info.completed_tasks);
    println!("  {:<14}{}", "links", info.custom_links);
    let theme = if info.has_custom_theme {
        format!("{} {}", info.theme, "(custom colors)".dimmed())
    } else {
        info.theme.clone()
    };
    println!("  {:<14}{}", "theme", theme);
    println!(
        "  {:<14}{}",
        "as of",
        info.last_modified.strftime("%Y-%m-%d %H:%M:%S UTC")
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> Zoned {
        "2026-10-19T10:30:00+00:00[UTC]".parse().unwrap()
    }

    #[test]
    fn test_label_for_open_task_with_due() {
        let task = Task {
            title: String::from("dentist"),
            due: Some("2026-10-20T15:00:00Z".parse().unwrap()),
            ..Task::default()
        };

        let label = get_task_label(&task, &now(), &Settings::default());

        assert_eq!(label.as_deref(), Some("tmrw 3:00 pm"));
    }

    #[test]
    fn test_label_for_date_only_due_has_no_time() {
        let task = Task {
            title: String::from("bins"),
            due: Some("2026-10-22T00:00:00Z".parse().unwrap()),
            ..Task::default()
        };

        let label = get_task_label(&task, &now(), &Settings::default());

        assert_eq!(label.as_deref(), Some("thu"));
    }

    #[test]
    fn test_label_for_completed_task() {
        let task = Task {
            title: String::from("done"),
            completed: true,
            completed_at: Some("2026-10-18T09:00:00Z".parse().unwrap()),
            due: Some("2026-10-01T00:00:00Z".parse().unwrap()),
            ..Task::default()
        };

        let label = get_task_label(&task, &now(), &Settings::default());

        assert_eq!(label.as_deref(), Some("done yesterday"));
    }

    #[test]
    fn test_label_absent_without_due() {
        let task = Task {
            title: String::from("someday"),
            ..Task::default()
        };

        assert!(get_task_label(&task, &now(), &Settings::default()).is_none());
    }
}
