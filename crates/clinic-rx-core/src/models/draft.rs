//! Prescription draft: the in-progress, unpersisted prescription of one
//! editing session.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use super::prescription::LineItem;

/// Most date entries the editing form offers. Expansion itself is unbounded.
pub const MAX_DATE_SELECTIONS: usize = 6;

/// One candidate prescription date.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateSelection {
    pub enabled: bool,
    pub date: NaiveDate,
}

impl DateSelection {
    pub fn enabled(date: NaiveDate) -> Self {
        Self {
            enabled: true,
            date,
        }
    }
}

/// A prescription being assembled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrescriptionDraft {
    /// Selected patient (empty when none selected yet)
    pub patient_id: String,
    /// Line items in print order
    pub line_items: Vec<LineItem>,
    /// Free-text observations
    pub observations: String,
    /// Candidate dates
    pub dates: Vec<DateSelection>,
}

impl PrescriptionDraft {
    /// New draft with a single enabled `today` entry.
    pub fn new(patient_id: impl Into<String>, today: NaiveDate) -> Self {
        Self {
            patient_id: patient_id.into(),
            line_items: Vec::new(),
            observations: String::new(),
            dates: vec![DateSelection::enabled(today)],
        }
    }

    pub fn add_line_item(&mut self, item: LineItem) {
        self.line_items.push(item);
    }

    pub fn remove_line_item(&mut self, index: usize) -> Option<LineItem> {
        (index < self.line_items.len()).then(|| self.line_items.remove(index))
    }

    pub fn set_observations(&mut self, observations: impl Into<String>) {
        self.observations = observations.into();
    }

    /// Dates of the enabled entries, in entry order.
    pub fn enabled_dates(&self) -> Vec<NaiveDate> {
        self.dates
            .iter()
            .filter(|d| d.enabled)
            .map(|d| d.date)
            .collect()
    }

    /// Replace the dates with `months` monthly entries starting at `start`.
    pub fn quick_select(&mut self, start: NaiveDate, months: u32) {
        self.dates = quick_select_dates(start, months);
    }

    /// Append an entry one month after the last entry (or after `start` when
    /// there are no entries). Returns false once the form limit is reached.
    pub fn add_date(&mut self, start: NaiveDate) -> bool {
        if self.dates.len() >= MAX_DATE_SELECTIONS {
            return false;
        }
        match next_date(&self.dates, start) {
            Some(date) => {
                self.dates.push(DateSelection::enabled(date));
                true
            }
            None => false,
        }
    }

    pub fn toggle_date(&mut self, index: usize) -> bool {
        match self.dates.get_mut(index) {
            Some(selection) => {
                selection.enabled = !selection.enabled;
                true
            }
            None => false,
        }
    }

    pub fn set_date(&mut self, index: usize, date: NaiveDate) -> bool {
        match self.dates.get_mut(index) {
            Some(selection) => {
                selection.date = date;
                true
            }
            None => false,
        }
    }

    /// Remove an entry. The last remaining entry is kept.
    pub fn remove_date(&mut self, index: usize) -> bool {
        if self.dates.len() <= 1 || index >= self.dates.len() {
            return false;
        }
        self.dates.remove(index);
        true
    }

    /// Clear items, observations and dates after a successful expansion.
    /// The patient selection is kept.
    pub fn reset(&mut self, today: NaiveDate) {
        self.line_items.clear();
        self.observations.clear();
        self.dates = vec![DateSelection::enabled(today)];
    }
}

/// `months` enabled entries at `start` + 0, 1, ... months.
///
/// Month arithmetic keeps the day of month and clamps to the last valid day
/// (2024-01-31 + 1 month = 2024-02-29). Each entry is computed from `start`,
/// not from the previous entry.
pub fn quick_select_dates(start: NaiveDate, months: u32) -> Vec<DateSelection> {
    (0..months)
        .map_while(|i| start.checked_add_months(Months::new(i)))
        .map(DateSelection::enabled)
        .collect()
}

/// One month after the last entry of `dates`, or after `start` if empty.
///
/// Entry order decides, not chronology: an earlier row edited to a later
/// date does not move the base.
pub fn next_date(dates: &[DateSelection], start: NaiveDate) -> Option<NaiveDate> {
    let base = dates.last().map(|d| d.date).unwrap_or(start);
    base.checked_add_months(Months::new(1))
}
