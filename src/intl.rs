use std::sync::OnceLock;

use fancy_regex::Regex;

use super::*;

/// Spanish month names, January first.
pub(crate) const MONTHS_ES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

/// A calendar date in the proleptic Gregorian calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CivilDate {
    pub year: i64,
    /// 1..=12
    pub month: u32,
    /// 1..=31
    pub day: u32,
}

impl CivilDate {
    /// Date of the UTC day containing the given unix timestamp.
    pub fn from_unix_ms(ms: i64) -> Self {
        let days = ms.div_euclid(86_400_000);
        Self::from_days(days)
    }

    // Howard Hinnant's civil_from_days.
    fn from_days(days: i64) -> Self {
        let z = days + 719_468;
        let era = z.div_euclid(146_097);
        let doe = z - era * 146_097;
        let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146_096) / 365;
        let y = yoe + era * 400;
        let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
        let mp = (5 * doy + 2) / 153;
        let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
        let month = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
        let year = if month <= 2 { y + 1 } else { y };
        Self { year, month, day }
    }

    /// Unix timestamp in milliseconds for midnight UTC of this date.
    pub fn to_unix_ms(&self) -> i64 {
        self.to_days() * 86_400_000
    }

    // Inverse of `from_days` (days_from_civil).
    fn to_days(&self) -> i64 {
        let y = if self.month <= 2 { self.year - 1 } else { self.year };
        let era = y.div_euclid(400);
        let yoe = y - era * 400;
        let m = self.month as i64;
        let doy = (153 * (if m > 2 { m - 3 } else { m + 9 }) + 2) / 5 + self.day as i64 - 1;
        let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
        era * 146_097 + doe - 719_468
    }

    /// ISO calendar form, `YYYY-MM-DD`.
    pub fn iso_date(&self) -> String {
        format!("{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// "Agosto 2026" style label for the date's month.
pub fn month_year_label(date: CivilDate) -> String {
    let name = MONTHS_ES
        .get(date.month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("");
    format!("{} {}", name, date.year)
}

/// `dd/mm/yyyy` rendering of an ISO `YYYY-MM-DD` string. Returns the input
/// unchanged when it is not in ISO form.
pub fn format_date(iso: &str) -> String {
    let mut parts = iso.splitn(3, '-');
    let (Some(year), Some(month), Some(day)) = (parts.next(), parts.next(), parts.next()) else {
        return iso.to_string();
    };
    if year.len() != 4
        || month.len() != 2
        || day.len() != 2
        || !year.chars().all(|c| c.is_ascii_digit())
        || !month.chars().all(|c| c.is_ascii_digit())
        || !day.chars().all(|c| c.is_ascii_digit())
    {
        return iso.to_string();
    }
    format!("{day}/{month}/{year}")
}

/// Mexican-peso style currency rendering: `$1,234.50`, minus before the sign.
pub fn format_currency(amount: f64) -> String {
    if amount.is_nan() {
        return "$NaN".to_string();
    }
    let negative = amount < 0.0;
    let rounded = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = rounded.split_once('.').unwrap_or((rounded.as_str(), "00"));
    let grouped = group_thousands(int_part);
    if negative {
        format!("-${grouped}.{frac_part}")
    } else {
        format!("${grouped}.{frac_part}")
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    let len = digits.len();
    for (idx, c) in digits.chars().enumerate() {
        if idx > 0 && (len - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Two-decimal fixed rendering, `toFixed(2)` style.
pub fn format_two_decimals(amount: f64) -> String {
    if amount.is_nan() {
        return "NaN".to_string();
    }
    format!("{amount:.2}")
}

/// Strip every character that is not a digit or a decimal point.
pub fn sanitize_currency(raw: &str) -> Result<String> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    if PATTERN.get().is_none() {
        let compiled =
            Regex::new(r"[^0-9.]").map_err(|err| Error::Pattern(err.to_string()))?;
        let _ = PATTERN.set(compiled);
    }
    let pattern = PATTERN
        .get()
        .ok_or_else(|| Error::Pattern("currency pattern unavailable".into()))?;
    Ok(pattern.replace_all(raw, "").into_owned())
}

/// Numeric prefix parse with `parseFloat` semantics: leading whitespace is
/// skipped, the longest valid float prefix is taken, and `NaN` comes back
/// when no digits are found.
pub fn parse_float_prefix(text: &str) -> f64 {
    let trimmed = text.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0usize;
    let mut seen_digit = false;
    let mut seen_dot = false;
    let mut seen_exp = false;

    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    while end < bytes.len() {
        let b = bytes[end];
        if b.is_ascii_digit() {
            seen_digit = true;
            end += 1;
        } else if b == b'.' && !seen_dot && !seen_exp {
            seen_dot = true;
            end += 1;
        } else if (b == b'e' || b == b'E') && seen_digit && !seen_exp {
            let mut probe = end + 1;
            if probe < bytes.len() && (bytes[probe] == b'+' || bytes[probe] == b'-') {
                probe += 1;
            }
            if probe < bytes.len() && bytes[probe].is_ascii_digit() {
                seen_exp = true;
                end = probe + 1;
                while end < bytes.len() && bytes[end].is_ascii_digit() {
                    end += 1;
                }
            } else {
                break;
            }
        } else {
            break;
        }
    }

    if !seen_digit {
        return f64::NAN;
    }
    trimmed[..end].parse().unwrap_or(f64::NAN)
}
