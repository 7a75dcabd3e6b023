use std::fmt;

use crate::params::{Parameter, COLUMN_COUNT, PARAMETER_COUNT};

/// Render a reading as the shortest text that parses back to the same value.
///
/// Exponents carry a sign and at least two digits (`1.2e-09`, `9.9e+37`),
/// matching the logs written by earlier acquisition scripts. Plain notation
/// is used for magnitudes from `1e-4` up to `1e16`.
pub fn format_reading(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    let text = format!("{:?}", value);
    match text.find('e') {
        Some(pos) => {
            let (mantissa, exponent) = (&text[..pos], &text[pos + 1..]);
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => text,
    }
}

/// One value column of a row.
///
/// Only the active parameter carries a reading, every other column holds the
/// literal `0`. A reading of exactly zero renders as `0.0` and stays
/// distinguishable from a placeholder.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Cell {
    Reading(f64),
    Placeholder,
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Reading(x) => f.write_str(&format_reading(*x)),
            Cell::Placeholder => f.write_str("0"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    timestamp: String,
    cells: [Cell; PARAMETER_COUNT],
}

impl Row {
    pub fn build<T: Into<String>>(timestamp: T, active: Parameter, value: f64) -> Self {
        let mut cells = [Cell::Placeholder; PARAMETER_COUNT];
        cells[active.index()] = Cell::Reading(value);
        Self {
            timestamp: timestamp.into(),
            cells,
        }
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn to_record(&self) -> Vec<String> {
        let mut ret = Vec::with_capacity(COLUMN_COUNT);
        ret.push(self.timestamp.clone());
        ret.extend(self.cells.iter().map(|x| x.to_string()));
        ret
    }
}
