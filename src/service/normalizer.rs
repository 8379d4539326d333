use crate::error::NormalizeError;
use crate::models::{Invoice, RawInvoiceRow};
use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::America::Santiago;

const DATE_FORMAT: &str = "%d/%m/%Y";
const DATETIME_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Normalize scraped rows into store records. One bad row fails the batch.
pub fn normalize_rows(rows: &[RawInvoiceRow]) -> Result<Vec<Invoice>, NormalizeError> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| normalize_row(i, row))
        .collect()
}

pub fn normalize_row(row_idx: usize, raw: &RawInvoiceRow) -> Result<Invoice, NormalizeError> {
    let amount = |field: &'static str, value: &Option<String>| parse_amount(row_idx, field, value.as_deref());

    Ok(Invoice {
        supplier_id: clean_text(&raw.supplier_id).to_uppercase(),
        supplier_name: clean_text(&raw.supplier_name),
        number: raw.number.trim().to_string(),
        date: parse_date(row_idx, &raw.date)?,
        date_accepted: parse_accepted(row_idx, raw.date_accepted.as_deref())?,
        payment_type: payment_label(raw.payment_type.as_deref()).to_string(),
        exent_total: amount("exent_total", &raw.exent_total)?,
        net_total: amount("net_total", &raw.net_total)?,
        iva: amount("iva", &raw.iva)?,
        other_tax: amount("other_tax", &raw.other_tax)?,
        total: amount("total", &raw.total)?,
        rut_holding: raw.rut_holding.trim().to_string(),
        status: clean_text(&raw.status),
        doc_type: clean_text(&raw.doc_type),
    })
}

/// Strip thousands dots and lower-case.
pub fn clean_text(value: &str) -> String {
    value.trim().replace('.', "").to_lowercase()
}

pub fn payment_label(code: Option<&str>) -> &'static str {
    match code.map(clean_text).as_deref() {
        Some("p") => "contado",
        _ => "",
    }
}

/// `"1.234"` → 1234, blank → 0.
pub fn parse_amount(row: usize, field: &'static str, value: Option<&str>) -> Result<i64, NormalizeError> {
    let digits = value.unwrap_or_default().trim().replace('.', "");
    if digits.is_empty() {
        return Ok(0);
    }
    digits.parse::<i64>().map_err(|_| NormalizeError::InvalidAmount {
        row,
        field,
        value: value.unwrap_or_default().to_string(),
    })
}

fn parse_date(row: usize, value: &str) -> Result<DateTime<Utc>, NormalizeError> {
    let invalid = || NormalizeError::InvalidDate {
        row,
        field: "date",
        value: value.to_string(),
    };
    let date = NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| invalid())?;
    let midnight = date.and_hms_opt(0, 0, 0).ok_or_else(invalid)?;
    santiago_to_utc(midnight).ok_or_else(invalid)
}

fn parse_accepted(row: usize, value: Option<&str>) -> Result<Option<DateTime<Utc>>, NormalizeError> {
    let Some(text) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    let invalid = || NormalizeError::InvalidDate {
        row,
        field: "date_accepted",
        value: text.to_string(),
    };
    let naive = NaiveDateTime::parse_from_str(text, DATETIME_FORMAT).map_err(|_| invalid())?;
    santiago_to_utc(naive).map(Some).ok_or_else(invalid)
}

/// Localize a Santiago civil time. Ambiguous times take the earlier offset.
///
/// Times skipped by the spring-forward gap (midnight on the switch day) do not fail the row as a
/// strict localization would: they move one hour later, so issue dates on that day still load.
pub fn santiago_to_utc(naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    match Santiago.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => {
            tracing::debug!("{} falls in a DST gap, shifting one hour", naive);
            Santiago
                .from_local_datetime(&(naive + Duration::hours(1)))
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
        }
    }
}
