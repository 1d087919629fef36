//! SphereSync weekly letter rotation
//!
//! Every ISO week maps to a fixed entry: two surname initials to call and one
//! to text. Call pairs match a common surname initial with a rare one so the
//! weekly call load stays even. Over 52 weeks each letter comes up four times
//! for calls and twice for texts.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Calendar week in the ISO-8601 week-numbering year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SphereWeek {
    pub year: i32,
    pub week: u32,
}

impl SphereWeek {
    /// ISO week containing `date`
    pub fn of(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        Self {
            year: iso.year(),
            week: iso.week(),
        }
    }

    /// Validate an explicit (year, week) pair
    pub fn new(year: i32, week: u32) -> Result<Self, String> {
        let last_week = NaiveDate::from_ymd_opt(year, 12, 28)
            .map(|d| d.iso_week().week())
            .ok_or_else(|| format!("Year {} is out of range", year))?;
        if week == 0 || week > last_week {
            return Err(format!("Week must be between 1 and {} for {}", last_week, year));
        }
        Ok(Self { year, week })
    }

    /// Monday of this week
    pub fn start_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_isoywd_opt(self.year, self.week, chrono::Weekday::Mon)
    }

    /// Sunday of this week
    pub fn end_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_isoywd_opt(self.year, self.week, chrono::Weekday::Sun)
    }

    pub fn letters(&self) -> WeekLetters {
        letters_for_week(self.week)
    }
}

/// The letters worked in one week
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeekLetters {
    pub call: [char; 2],
    pub text: char,
}

impl WeekLetters {
    const fn new(a: char, b: char, text: char) -> Self {
        Self { call: [a, b], text }
    }

    pub fn is_call_letter(&self, letter: char) -> bool {
        self.call.contains(&letter)
    }

    pub fn is_text_letter(&self, letter: char) -> bool {
        self.text == letter
    }
}

/// Entry `n - 1` is week `n`
pub const ROTATION: [WeekLetters; 52] = [
    WeekLetters::new('S', 'X', 'A'),
    WeekLetters::new('M', 'Q', 'B'),
    WeekLetters::new('B', 'U', 'C'),
    WeekLetters::new('C', 'I', 'D'),
    WeekLetters::new('H', 'Z', 'E'),
    WeekLetters::new('W', 'Y', 'F'),
    WeekLetters::new('R', 'O', 'G'),
    WeekLetters::new('P', 'V', 'H'),
    WeekLetters::new('G', 'E', 'I'),
    WeekLetters::new('L', 'N', 'J'),
    WeekLetters::new('D', 'J', 'K'),
    WeekLetters::new('T', 'F', 'L'),
    WeekLetters::new('K', 'A', 'M'),
    WeekLetters::new('S', 'X', 'N'),
    WeekLetters::new('M', 'Q', 'O'),
    WeekLetters::new('B', 'U', 'P'),
    WeekLetters::new('C', 'I', 'Q'),
    WeekLetters::new('H', 'Z', 'R'),
    WeekLetters::new('W', 'Y', 'S'),
    WeekLetters::new('R', 'O', 'T'),
    WeekLetters::new('P', 'V', 'U'),
    WeekLetters::new('G', 'E', 'V'),
    WeekLetters::new('L', 'N', 'W'),
    WeekLetters::new('D', 'J', 'X'),
    WeekLetters::new('T', 'F', 'Y'),
    WeekLetters::new('K', 'A', 'Z'),
    WeekLetters::new('S', 'X', 'A'),
    WeekLetters::new('M', 'Q', 'B'),
    WeekLetters::new('B', 'U', 'C'),
    WeekLetters::new('C', 'I', 'D'),
    WeekLetters::new('H', 'Z', 'E'),
    WeekLetters::new('W', 'Y', 'F'),
    WeekLetters::new('R', 'O', 'G'),
    WeekLetters::new('P', 'V', 'H'),
    WeekLetters::new('G', 'E', 'I'),
    WeekLetters::new('L', 'N', 'J'),
    WeekLetters::new('D', 'J', 'K'),
    WeekLetters::new('T', 'F', 'L'),
    WeekLetters::new('K', 'A', 'M'),
    WeekLetters::new('S', 'X', 'N'),
    WeekLetters::new('M', 'Q', 'O'),
    WeekLetters::new('B', 'U', 'P'),
    WeekLetters::new('C', 'I', 'Q'),
    WeekLetters::new('H', 'Z', 'R'),
    WeekLetters::new('W', 'Y', 'S'),
    WeekLetters::new('R', 'O', 'T'),
    WeekLetters::new('P', 'V', 'U'),
    WeekLetters::new('G', 'E', 'V'),
    WeekLetters::new('L', 'N', 'W'),
    WeekLetters::new('D', 'J', 'X'),
    WeekLetters::new('T', 'F', 'Y'),
    WeekLetters::new('K', 'A', 'Z'),
];

/// Letters for ISO week `week` (1-based). Week 53 wraps to week 1.
/// Week 0 is treated as week 1.
pub fn letters_for_week(week: u32) -> WeekLetters {
    let idx = (week.max(1) - 1) as usize % ROTATION.len();
    ROTATION[idx]
}

/// Bucket a contact by surname initial, falling back to the first name
pub fn bucket_letter(first_name: &str, last_name: &str) -> Option<char> {
    first_letter(last_name).or_else(|| first_letter(first_name))
}

fn first_letter(name: &str) -> Option<char> {
    name.trim()
        .chars()
        .find(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase())
}
