use std::io::{self, Write};

use crate::columns::ColumnLayout;
use crate::days::assemble_days;
use crate::fields;
use crate::importer::required_fields;
use crate::table::{Row, Table};
use crate::tags::split_tag_names;

const RECOMMENDATION_PREVIEW_CHARS: usize = 100;
const DAY_COLUMN_HINTS: usize = 5;

pub fn write_preview(table: &Table, max_rows: usize, out: &mut dyn Write) -> io::Result<()> {
    let layout = ColumnLayout::from_headers(table.headers.iter().map(String::as_str));

    writeln!(out, "Found {} records in CSV", table.len())?;

    for row in table.rows.iter().take(max_rows) {
        match row {
            Ok(row) => write_row(row, &layout, out)?,
            Err(malformed) => {
                writeln!(out)?;
                writeln!(
                    out,
                    "Row {}: malformed record: {}",
                    malformed.number, malformed.message
                )?;
            }
        }
    }

    if !layout.unrecognized().is_empty() {
        writeln!(out)?;
        writeln!(out, "Ignored day-like columns:")?;
        for column in layout.unrecognized() {
            writeln!(out, "  {} ({})", column.name, column.reason)?;
        }
    }

    Ok(())
}

fn write_row(row: &Row, layout: &ColumnLayout, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "Row {}: {:?}",
        row.number,
        row.get("title").unwrap_or_default().trim()
    )?;
    writeln!(out, "  Country: {}", or_none(row.get("country")))?;
    writeln!(out, "  City: {}", or_none(row.get("city")))?;
    writeln!(out, "  Publish status: {}", or_none(row.get("publishStatus")))?;
    let tags: Vec<&str> = row.get("tags").map(|raw| split_tag_names(raw).collect()).unwrap_or_default();
    if !tags.is_empty() {
        writeln!(out, "  Tags: {}", tags.join(", "))?;
    }
    if let Err(err) = required_fields(row) {
        writeln!(out, "  Would fail: {err}")?;
    }

    let days = assemble_days(&layout.group(row));
    writeln!(out, "  Day entries: {}", days.len())?;

    if days.is_empty() {
        writeln!(out, "    No day entries found; check day column naming")?;
        let hints: Vec<&str> = layout.day_column_names().take(DAY_COLUMN_HINTS).collect();
        if !hints.is_empty() {
            writeln!(out, "    Day columns present: {}", hints.join(", "))?;
        }
        return Ok(());
    }

    for day in &days {
        writeln!(
            out,
            "    Day {} ({}): {:?}",
            day.day_number, day.day_type, day.subtitle
        )?;
        if let Some(recommendation) = &day.recommendation {
            writeln!(out, "      Recommendation: {}", abbreviate(recommendation))?;
        }
        if let Some(link) = &day.google_maps_link {
            writeln!(out, "      Maps link: {link}")?;
        }
    }
    Ok(())
}

fn or_none(raw: Option<&str>) -> String {
    fields::text(raw).unwrap_or_else(|| "None".to_owned())
}

fn abbreviate(text: &str) -> String {
    if text.chars().count() <= RECOMMENDATION_PREVIEW_CHARS {
        return text.to_owned();
    }
    let mut short: String = text.chars().take(RECOMMENDATION_PREVIEW_CHARS).collect();
    short.push_str("...");
    short
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::parse_table;

    fn render(csv: &str, max_rows: usize) -> String {
        let table = parse_table(csv.as_bytes()).expect("parse fixture");
        let mut out = Vec::new();
        write_preview(&table, max_rows, &mut out).expect("write preview");
        String::from_utf8(out).expect("utf-8 preview")
    }

    #[test]
    fn shows_assembled_days() {
        let long = "word ".repeat(40);
        let csv = format!(
            "title,country,subtitle_1a,recommendation_1a,googleMapsLink_1aa\nAlps,Switzerland,Zermatt,{long},https://maps/z\n"
        );
        let text = render(&csv, 5);

        assert!(text.contains("Found 1 records in CSV"));
        assert!(text.contains("Row 1: \"Alps\""));
        assert!(text.contains("City: None"));
        assert!(text.contains("Day 1 (Input Number): \"[Day 1] Zermatt\""));
        assert!(text.contains("Maps link: https://maps/z"));
        let recommendation = text
            .lines()
            .find(|line| line.contains("Recommendation:"))
            .expect("recommendation line");
        assert!(recommendation.ends_with("..."));
    }

    #[test]
    fn hints_when_no_days_and_respects_row_limit() {
        let csv = "title,country,subtitle_1a,hotel_1a\nA,X,,\nB,Y,,\n";
        let text = render(csv, 1);

        assert!(text.contains("Row 1: \"A\""));
        assert!(!text.contains("Row 2"));
        assert!(text.contains("No day entries found"));
        assert!(text.contains("Day columns present: subtitle_1a"));
        assert!(text.contains("hotel_1a (unknown day field \"hotel\")"));
    }

    #[test]
    fn flags_rows_that_would_fail() {
        let text = render("title,country\nNowhere,\n", 5);
        assert!(text.contains("Would fail: Missing required fields"));
    }
}
