//! Localized date strings and fixed-width text fitting.

use chrono::{Datelike, NaiveDate};

const MONTHS: [&str; 12] = [
    "Janeiro",
    "Fevereiro",
    "Março",
    "Abril",
    "Maio",
    "Junho",
    "Julho",
    "Agosto",
    "Setembro",
    "Outubro",
    "Novembro",
    "Dezembro",
];

/// Average Helvetica glyph width as a fraction of the font size.
const GLYPH_WIDTH: f32 = 0.5;

/// `"<City>, <day> de <Month> de <year>"`, day without padding.
pub fn long_form_date(city: &str, date: NaiveDate) -> String {
    format!(
        "{}, {} de {} de {}",
        city,
        date.day(),
        MONTHS[date.month0() as usize],
        date.year()
    )
}

/// `DD/MM/YYYY`.
pub fn short_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Approximate rendered width in points.
pub fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * GLYPH_WIDTH
}

/// How many characters fit in `width` points at `size`.
pub fn chars_for_width(width: f32, size: f32) -> usize {
    ((width / (size * GLYPH_WIDTH)).floor() as usize).max(1)
}

/// Truncate `text` to `max_chars`, ending in an ellipsis when cut.
pub fn fit_line(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut fitted: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    fitted.push('…');
    fitted
}

/// Word-wrap `text` into lines of at most `max_chars` characters.
///
/// Explicit newlines start a new line. Words longer than a line are split.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        let mut current_len = 0;

        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();

            while word.len() > max_chars {
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let rest = word.split_off(max_chars);
                lines.push(word.into_iter().collect());
                word = rest;
            }

            if current_len > 0 && current_len + 1 + word.len() > max_chars {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current_len += word.len();
            current.extend(word);
        }

        if current_len > 0 {
            lines.push(current);
        }
    }

    lines
}
