//! Colored terminal output for the `stats` command.

use std::io::{self, Write};

use owo_colors::OwoColorize;

use crate::stats::{InterviewRecord, QueueSample, RecordKind, Statistics};

const RULE_WIDTH: usize = 70;

/// Truncate a string to a maximum number of characters, adding an ellipsis.
#[must_use]
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        "...".to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{kept}...")
    }
}

/// Format one history row.
#[must_use]
pub fn format_record(record: &InterviewRecord) -> String {
    let ts = record.timestamp.format("%Y-%m-%d %H:%M:%S").to_string();
    let name = format!("{:20}", truncate(&record.username, 20));
    let what = match record.kind {
        RecordKind::Started => {
            let queue = record
                .queue_length
                .map_or_else(|| "?".to_string(), |q| q.to_string());
            format!("Started (queue: {queue})").cyan().to_string()
        }
        RecordKind::Passed => "✅ PASSED".green().bold().to_string(),
        RecordKind::Failed => "❌ FAILED".red().bold().to_string(),
        RecordKind::Missed => "⏰ MISSED".yellow().bold().to_string(),
    };
    format!("[{}] {name} → {what}", ts.dimmed())
}

/// Format the aggregate statistics block.
#[must_use]
pub fn format_statistics(stats: &Statistics) -> Vec<String> {
    let mut lines = vec![
        format!("📊 Total Interviews:     {}", stats.total_interviews.bold()),
        format!(
            "✅ Passed:               {} ({}%)",
            stats.passed.green(),
            stats.pass_rate
        ),
        format!("❌ Failed:               {}", stats.failed.red()),
        format!("⏰ Missed:               {}", stats.missed.yellow()),
        format!("📈 Average Queue Length: {}", stats.avg_queue_length),
    ];
    if !stats.busiest_hours.is_empty() {
        lines.push(String::new());
        lines.push("🕐 Busiest Hours (most interviews):".to_string());
        for hour in &stats.busiest_hours {
            lines.push(format!("   {:02}:00 - {} interviews", hour.hour, hour.count));
        }
    }
    lines
}

fn rule(c: char) -> String {
    std::iter::repeat(c).take(RULE_WIDTH).collect()
}

/// Print the statistics report with recent interviews.
pub fn print_report(days: u32, channel: Option<&str>, stats: &Statistics, recent: &[InterviewRecord]) {
    let title = match channel {
        Some(channel) => format!("Interview Statistics (Last {days} days, {channel})"),
        None => format!("Interview Statistics (Last {days} days)"),
    };
    println!("{}", rule('='));
    println!("{}", title.bold());
    println!("{}", rule('='));
    println!();
    for line in format_statistics(stats) {
        println!("{line}");
    }
    println!();
    println!("{}", rule('-'));
    println!("Recent Interviews:");
    println!("{}", rule('-'));
    print_records(recent);
    println!();
    println!("{}", rule('='));
    let _ = io::stdout().flush();
}

/// Print history rows, newest first.
pub fn print_records(records: &[InterviewRecord]) {
    if records.is_empty() {
        println!("{}", "No recent interviews found".dimmed());
    }
    for record in records {
        println!("{}", format_record(record));
    }
    let _ = io::stdout().flush();
}

/// Print one user's history.
pub fn print_user_history(username: &str, records: &[InterviewRecord]) {
    println!("{} {}", "History for".bold(), username.cyan().bold());
    println!("{}", rule('-'));
    print_records(records);
}

/// Print queue length samples as a simple bar chart.
pub fn print_trends(hours: u32, samples: &[QueueSample]) {
    println!("{}", format!("Queue trends (last {hours} hours)").bold());
    println!("{}", rule('-'));
    if samples.is_empty() {
        println!("{}", "No queue snapshots found".dimmed());
    }
    for sample in samples {
        let bar: String = std::iter::repeat('█')
            .take(usize::try_from(sample.queue_length.min(60)).unwrap_or(60))
            .collect();
        println!(
            "[{}] {:>4} {}",
            sample.timestamp.format("%Y-%m-%d %H:%M").dimmed(),
            sample.queue_length,
            bar.blue()
        );
    }
    let _ = io::stdout().flush();
}

/// Print the purge result.
pub fn print_purged(days: u32, deleted: u64) {
    println!(
        "{} {deleted} records older than {days} days",
        "[PURGED]".yellow().bold()
    );
    let _ = io::stdout().flush();
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::HourCount;
    use chrono::NaiveDate;

    fn record(kind: RecordKind, queue_length: Option<u32>) -> InterviewRecord {
        InterviewRecord {
            username: "alice".to_string(),
            timestamp: NaiveDate::from_ymd_opt(2024, 5, 6)
                .unwrap()
                .and_hms_micro_opt(7, 8, 9, 123_456)
                .unwrap(),
            kind,
            queue_length,
            channel: Some("#red".to_string()),
            outcome_message: None,
        }
    }

    #[test]
    fn test_truncate_short_string() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello", 5), "hello");
    }

    #[test]
    fn test_truncate_long_string() {
        assert_eq!(truncate("hello world", 8), "hello...");
        assert_eq!(truncate("hello", 2), "...");
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate("ééééé", 4), "é...");
    }

    #[test]
    fn test_format_started_record() {
        let line = format_record(&record(RecordKind::Started, Some(12)));
        assert!(line.contains("2024-05-06 07:08:09"));
        assert!(line.contains("alice"));
        assert!(line.contains("Started (queue: 12)"));
    }

    #[test]
    fn test_format_started_record_unknown_queue() {
        let line = format_record(&record(RecordKind::Started, None));
        assert!(line.contains("queue: ?"));
    }

    #[test]
    fn test_format_outcome_record() {
        assert!(format_record(&record(RecordKind::Missed, None)).contains("MISSED"));
        assert!(format_record(&record(RecordKind::Passed, None)).contains("PASSED"));
    }

    #[test]
    fn test_format_statistics_busiest_hours() {
        let stats = Statistics {
            total_interviews: 3,
            passed: 1,
            failed: 1,
            missed: 0,
            avg_queue_length: 12.5,
            busiest_hours: vec![HourCount { hour: 9, count: 2 }],
            pass_rate: 50.0,
        };
        let lines = format_statistics(&stats);
        assert!(lines.iter().any(|l| l.contains("Average Queue Length: 12.5")));
        assert!(lines.iter().any(|l| l.contains("(50%)")));
        assert!(lines.iter().any(|l| l == "   09:00 - 2 interviews"));
    }
}
