//! Amounts in minor units (cents).

use crate::table::RawCell;

/// Round a spreadsheet number to cents, half to even.
pub fn cents_from_f64(n: f64) -> Option<i64> {
    if !n.is_finite() {
        return None;
    }
    let cents = (n * 100.0).round_ties_even();
    if cents.abs() >= i64::MAX as f64 {
        return None;
    }
    Some(cents as i64)
}

pub fn cents_to_f64(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// Parse a money string like `1234.5`, `-12.30`, `$1,234.56` or `(45.00)`.
pub fn parse_money_string(s: &str) -> Result<i64, String> {
    let s = s.trim();
    let (negative, s) = if s.starts_with('(') && s.ends_with(')') && s.len() >= 2 {
        (true, &s[1..s.len() - 1])
    } else if let Some(rest) = s.strip_prefix('-') {
        (true, rest)
    } else {
        (false, s)
    };
    let cleaned: String = s
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    if cleaned.is_empty() {
        return Err("empty amount".into());
    }
    if cleaned.starts_with(['-', '+']) {
        return Err(format!("misplaced sign: {}", s));
    }

    let (dollars, cents) = if let Some(dot) = cleaned.find('.') {
        let whole = &cleaned[..dot];
        let d: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|e| format!("bad dollars: {}", e))?
        };
        let frac = &cleaned[dot + 1..];
        if !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("bad cents: {}", frac));
        }
        let c: i64 = match frac.len() {
            0 => 0,
            1 => {
                frac.parse::<i64>()
                    .map_err(|e| format!("bad cents: {}", e))?
                    * 10
            }
            2 => frac.parse().map_err(|e| format!("bad cents: {}", e))?,
            _ => return Err(format!("too many decimal places: {}", s)),
        };
        (d, c)
    } else {
        (cleaned.parse().map_err(|e| format!("bad amount: {}", e))?, 0)
    };
    let minor = dollars
        .checked_mul(100)
        .and_then(|d| d.checked_add(cents))
        .ok_or_else(|| format!("amount out of range: {}", s))?;
    Ok(if negative { -minor } else { minor })
}

/// Numeric cells round to cents; text cells go through [`parse_money_string`].
pub fn cents_from_cell(cell: &RawCell) -> Result<i64, String> {
    match cell {
        RawCell::Number(n) => cents_from_f64(*n).ok_or_else(|| format!("not a finite number: {n}")),
        RawCell::Text(s) => parse_money_string(s),
        RawCell::Empty => Err("blank cell".into()),
        RawCell::Bool(_) => Err("boolean cell".into()),
    }
}

/// `1234567` → `"12,345.67"`.
pub fn format_cents(cents: i64) -> String {
    let negative = cents < 0;
    let abs = cents.unsigned_abs();
    let whole = (abs / 100).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}{}.{:02}", if negative { "-" } else { "" }, grouped, abs % 100)
}
