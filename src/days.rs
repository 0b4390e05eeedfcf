use crate::columns::{DayColumns, DayFields};
use crate::fields;
use crate::formats::DayEntry;

pub const DEFAULT_DAY_TYPE: &str = "Input Number";

pub const RECOMMENDATION_LIMIT: usize = 950;
pub const TRUNCATION_SUFFIX: &str = "... [content truncated]";

pub fn assemble_days(columns: &DayColumns) -> Vec<DayEntry> {
    let mut days = Vec::new();
    for (&day_number, group) in &columns.days {
        let day_type =
            fields::text(group.day_type.as_deref()).unwrap_or_else(|| DEFAULT_DAY_TYPE.to_owned());

        for (sub_index, entry) in &group.entries {
            match assemble_entry(day_number, &day_type, entry) {
                Some(day) => days.push(day),
                None => tracing::trace!(
                    day = day_number,
                    sub = %sub_index,
                    "dropping day entry without subtitle or recommendation"
                ),
            }
        }
    }
    days
}

fn assemble_entry(day_number: u32, day_type: &str, entry: &DayFields) -> Option<DayEntry> {
    let subtitle = fields::text(entry.subtitle.as_deref());
    let recommendation = fields::text(entry.recommendation.as_deref());
    if subtitle.is_none() && recommendation.is_none() {
        return None;
    }

    Some(DayEntry {
        day_type: day_type.to_owned(),
        day_number,
        subtitle: format_subtitle(day_number, subtitle.as_deref()),
        recommendation: recommendation.as_deref().map(truncate_recommendation),
        google_maps_link: fields::text(entry.google_maps_link.as_deref()),
        show_distance_from_last_stop: fields::boolean(entry.show_distance_from_last_stop.as_deref()),
    })
}

pub fn format_subtitle(day_number: u32, subtitle: Option<&str>) -> String {
    match subtitle.map(str::trim).filter(|s| !s.is_empty()) {
        Some(subtitle) => format!("[Day {day_number}] {subtitle}"),
        None => format!("[Day {day_number}]"),
    }
}

/// Caps text at [`RECOMMENDATION_LIMIT`] characters, preferring to cut after a
/// late sentence end, then before a late space.
pub fn truncate_recommendation(text: &str) -> String {
    let text = text.trim();
    if text.chars().count() <= RECOMMENDATION_LIMIT {
        return text.to_owned();
    }

    let hard_cut: String = text.chars().take(RECOMMENDATION_LIMIT).collect();
    let chars: Vec<char> = hard_cut.trim_end().chars().collect();

    let last_period = chars.iter().rposition(|&c| c == '.');
    let last_space = chars.iter().rposition(|&c| c == ' ');
    // Thresholds are 80% and 90% of the limit, compared strictly.
    let end = match (last_period, last_space) {
        (Some(period), _) if period * 10 > RECOMMENDATION_LIMIT * 8 => period + 1,
        (_, Some(space)) if space * 10 > RECOMMENDATION_LIMIT * 9 => space,
        _ => chars.len(),
    };

    let mut truncated: String = chars[..end].iter().collect();
    truncated.push_str(TRUNCATION_SUFFIX);
    truncated
}
