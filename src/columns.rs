use std::collections::BTreeMap;

use crate::table::Row;

pub const DEFAULT_SUB_INDEX: &str = "a";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayField {
    Subtitle,
    Picture,
    Recommendation,
    GoogleMapsLink,
    ShowDistanceFromLastStop,
    DayType,
    DayNumber,
}

impl DayField {
    const ALL: [DayField; 7] = [
        DayField::Subtitle,
        DayField::Picture,
        DayField::Recommendation,
        DayField::GoogleMapsLink,
        DayField::ShowDistanceFromLastStop,
        DayField::DayType,
        DayField::DayNumber,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Subtitle => "subtitle",
            Self::Picture => "picture",
            Self::Recommendation => "recommendation",
            Self::GoogleMapsLink => "googleMapsLink",
            Self::ShowDistanceFromLastStop => "showDistanceFromLastStop",
            Self::DayType => "dayType",
            Self::DayNumber => "dayNumber",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(prefix))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayColumn {
    pub field: DayField,
    pub day_number: u32,
    pub sub_index: String,
    pub has_sub_index: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnKind {
    Day(DayColumn),
    Unrecognized(String),
    Plain,
}

pub fn classify_column(name: &str) -> ColumnKind {
    let Some((prefix, suffix)) = name.rsplit_once('_') else {
        return ColumnKind::Plain;
    };
    if prefix.is_empty() || !suffix.starts_with(|c: char| c.is_ascii_digit()) {
        return ColumnKind::Plain;
    }

    let Some(field) = DayField::from_prefix(prefix) else {
        return ColumnKind::Unrecognized(format!("unknown day field {prefix:?}"));
    };

    let digits_end = suffix
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(suffix.len());
    let (digits, letters) = suffix.split_at(digits_end);

    let day_number = match digits.parse::<u32>() {
        Ok(n) if n > 0 => n,
        _ => return ColumnKind::Unrecognized(format!("invalid day number {digits:?}")),
    };
    if !letters.chars().all(|c| c.is_ascii_lowercase()) {
        return ColumnKind::Unrecognized(format!("invalid sub-index {letters:?}"));
    }

    let has_sub_index = !letters.is_empty();
    let sub_index = if !has_sub_index {
        DEFAULT_SUB_INDEX.to_owned()
    } else if field == DayField::GoogleMapsLink && letters.len() == 2 {
        // Legacy exports suffix maps links twice: `1aa`, `1ba`, `1ca`.
        letters[..1].to_owned()
    } else {
        letters.to_owned()
    };

    ColumnKind::Day(DayColumn {
        field,
        day_number,
        sub_index,
        has_sub_index,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnrecognizedColumn {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct ColumnLayout {
    day_columns: Vec<(String, DayColumn)>,
    unrecognized: Vec<UnrecognizedColumn>,
}

impl ColumnLayout {
    pub fn from_headers<'a>(headers: impl IntoIterator<Item = &'a str>) -> Self {
        let mut layout = Self::default();
        for name in headers {
            match classify_column(name) {
                ColumnKind::Day(column) => layout.day_columns.push((name.to_owned(), column)),
                ColumnKind::Unrecognized(reason) => layout.unrecognized.push(UnrecognizedColumn {
                    name: name.to_owned(),
                    reason,
                }),
                ColumnKind::Plain => {}
            }
        }
        layout
    }

    pub fn for_row(row: &Row) -> Self {
        Self::from_headers(row.columns().map(|(name, _)| name))
    }

    pub fn unrecognized(&self) -> &[UnrecognizedColumn] {
        &self.unrecognized
    }

    pub fn day_column_names(&self) -> impl Iterator<Item = &str> {
        self.day_columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn log_unrecognized(&self) {
        for column in &self.unrecognized {
            tracing::warn!(
                column = %column.name,
                reason = %column.reason,
                "ignoring column that looks day-indexed but does not match <field>_<day><sub>"
            );
        }
    }

    pub fn group(&self, row: &Row) -> DayColumns {
        let mut grouped = DayColumns::default();
        for (name, column) in &self.day_columns {
            let Some(value) = row.get(name) else {
                continue;
            };
            let day = grouped.days.entry(column.day_number).or_default();
            if column.field == DayField::DayType && !column.has_sub_index {
                day.day_type = Some(value.to_owned());
                continue;
            }
            day.entries
                .entry(column.sub_index.clone())
                .or_default()
                .set(column.field, value);
        }
        grouped
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayFields {
    pub subtitle: Option<String>,
    pub picture: Option<String>,
    pub recommendation: Option<String>,
    pub google_maps_link: Option<String>,
    pub show_distance_from_last_stop: Option<String>,
    pub day_type: Option<String>,
    pub day_number: Option<String>,
}

impl DayFields {
    fn set(&mut self, field: DayField, value: &str) {
        let slot = match field {
            DayField::Subtitle => &mut self.subtitle,
            DayField::Picture => &mut self.picture,
            DayField::Recommendation => &mut self.recommendation,
            DayField::GoogleMapsLink => &mut self.google_maps_link,
            DayField::ShowDistanceFromLastStop => &mut self.show_distance_from_last_stop,
            DayField::DayType => &mut self.day_type,
            DayField::DayNumber => &mut self.day_number,
        };
        *slot = Some(value.to_owned());
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayGroup {
    pub day_type: Option<String>,
    pub entries: BTreeMap<String, DayFields>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayColumns {
    pub days: BTreeMap<u32, DayGroup>,
}
