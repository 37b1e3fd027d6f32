//! Plain-text rendering of dashboard views

use std::fmt::Write;

use crate::services::{PopulationOverview, UserOverview};
use crate::types::{
    FeedbackRecord, FeedbackSummary, FeedbackType, PlanUpdate, UserSearchTotal, UserSummary,
};

/// Widest bar in the leaderboard chart
const BAR_WIDTH: u64 = 40;

/// Format number with thousand separators (e.g., 1234567 -> "1,234,567")
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let len = s.len();
    let mut result = String::with_capacity(len + len / 3);

    // Digits are ASCII, so byte indexing is safe
    for (i, ch) in s.bytes().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            result.push(',');
        }
        result.push(ch as char);
    }

    result
}

pub fn users(users: &[UserSummary]) -> String {
    if users.is_empty() {
        return "No users found.\n".to_string();
    }
    let width = users.iter().map(|u| u.id.chars().count()).max().unwrap_or(0);
    let mut out = String::new();
    for user in users {
        let _ = writeln!(out, "{:<width$}  {}", user.id, user.display_name, width = width);
    }
    out
}

pub fn user(view: &UserOverview) -> String {
    let mut out = String::new();
    let name = view.display_name.as_deref().unwrap_or(&view.user_id);
    let _ = writeln!(out, "Worksheets for {}", name);

    if view.worksheets.is_empty() {
        let _ = writeln!(out, "  No worksheets found.");
    }
    for ws in &view.worksheets {
        let rows = ws
            .num_rows
            .map(format_number)
            .unwrap_or_else(|| "N/A".to_string());
        let _ = writeln!(out, "  Worksheet: {} (rows: {})", ws.name, rows);
        for (prompt, value) in &ws.custom_research_prompts {
            let value = value
                .as_str()
                .map(String::from)
                .unwrap_or_else(|| value.to_string());
            let _ = writeln!(out, "    {}: {}", prompt, value);
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Plan: {}", view.plan.plan);
    let _ = writeln!(out, "Trial Ends in: {} days", view.plan.days_left);
    let _ = writeln!(out);

    let stats = &view.stats;
    for (label, value) in [
        ("Total Searches", stats.total_searches),
        ("Person Profiles Enriched", stats.person_profiles_enriched),
        ("Company Profiles Enriched", stats.company_profiles_enriched),
        ("Custom Research Prompts", stats.custom_research_prompts),
        ("LinkedIn Profile Enriched", stats.linkedin_profiles_enriched),
    ] {
        let _ = writeln!(out, "{:<26} {:>10}", label, format_number(value));
    }
    out
}

pub fn population(view: &PopulationOverview) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Total Users: {}", format_number(view.overall.total_users));
    let _ = writeln!(
        out,
        "Total Worksheets: {}",
        format_number(view.overall.total_worksheets)
    );
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Usage ({} included users)",
        format_number(view.usage.total_users)
    );

    let usage = &view.usage;
    for (label, value) in [
        ("Total Searches", usage.total_searches),
        ("Person Profiles", usage.total_profile_enrichments),
        ("Company Profiles", usage.total_company_profiles),
        ("Custom Prompts", usage.total_custom_research_prompts),
        ("LinkedIn Searches", usage.total_linkedin_profiles),
    ] {
        let _ = writeln!(out, "  {:<18} {:>10}", label, format_number(value));
    }
    out
}

/// Horizontal bar chart of total searches, smallest first
pub fn leaderboard(rows: &[UserSearchTotal]) -> String {
    if rows.is_empty() {
        return "No search usage recorded.\n".to_string();
    }
    let max = rows.iter().map(|r| r.total_searches).max().unwrap_or(0).max(1);
    let name_width = rows
        .iter()
        .map(|r| r.display_name.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for row in rows {
        let bar = (row.total_searches.saturating_mul(BAR_WIDTH) / max) as usize;
        let _ = writeln!(
            out,
            "{:<name_width$}  {:<bar_width$}  {}",
            row.display_name,
            "█".repeat(bar),
            format_number(row.total_searches),
            name_width = name_width,
            bar_width = BAR_WIDTH as usize,
        );
    }
    out
}

pub fn feedback(records: &[FeedbackRecord], summary: &FeedbackSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Feedback: {} total, {} thumbs up, {} thumbs down",
        summary.total, summary.thumbs_up, summary.thumbs_down
    );
    for record in records {
        let marker = match record.feedback_type {
            FeedbackType::ThumbsUp => "+",
            FeedbackType::ThumbsDown => "-",
        };
        let _ = writeln!(out);
        let _ = writeln!(out, "[{}] {}", marker, record.id);
        for turn in &record.dialog {
            let _ = writeln!(out, "    {}", turn.text);
        }
    }
    out
}

pub fn plan_update(update: &PlanUpdate) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Plan updated to {} for user ID: {}.",
        update.current_plan, update.user_id
    );
    if update.trial_activated_date.is_some() {
        let _ = writeln!(out, "Trial activation date updated.");
    }
    if update.last_plan_upgrade_date.is_some() {
        let _ = writeln!(out, "Last plan upgrade date updated.");
    }
    out
}
