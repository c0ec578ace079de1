//! Band snapshot normalizer: external feed rows to canonical snapshots.
//!
//! Two feed layouts are recognised: the pricing-service layout
//! (`price_at_pvr_*`) and the stored daily-band layout (`price_at_m100` ...).
//! The layout and price field are resolved once per feed from the first row;
//! every later row must carry the same fields.
//!
//! Any [`FeedRow`] implementation can be normalized. JSON objects are handled
//! here; CSV records are adapted by the loader.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::{BandLevel, BandSnapshot, Bands};

/// Price fields in resolution priority order.
pub const PRICE_FIELDS: [&str; 5] = ["price_ci", "price_usd", "btc_price", "price", "close"];

#[derive(Debug, Error, PartialEq)]
pub enum NormalizeError {
    #[error("row {row}: missing required field `{field}`")]
    MissingField { row: usize, field: String },

    #[error("row {row}: field `{field}` is not numeric: {value:?}")]
    NotNumeric {
        row: usize,
        field: String,
        value: String,
    },

    #[error("row {row}: price field `{field}` is empty")]
    NullPrice { row: usize, field: String },

    #[error("row {row}: price field `{field}` is not finite: {value}")]
    NonFinitePrice { row: usize, field: String, value: f64 },

    #[error("row {row}: no `date` or `timestamp` field")]
    MissingDate { row: usize },

    #[error("row {row}: invalid date {value:?}")]
    InvalidDate { row: usize, value: String },

    #[error("no price field found, expected one of price_ci, price_usd, btc_price, price, close")]
    NoPriceField,

    #[error("unrecognised band layout: expected `price_at_pvr_mean` or `price_at_mean`")]
    UnknownLayout,

    #[error("duplicate date {0}")]
    DuplicateDate(NaiveDate),

    #[error("row {row} is not an object")]
    NotAnObject { row: usize },

    #[error("payload must be an array of rows or an object with a `data` array")]
    InvalidPayload,
}

/// One field value as the feed presents it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawField<'a> {
    Missing,
    Null,
    Number(f64),
    Text(&'a str),
    /// Booleans, arrays, nested objects.
    Unsupported,
}

/// A single row of an external feed, addressable by field name.
pub trait FeedRow {
    fn field(&self, name: &str) -> RawField<'_>;

    fn has(&self, name: &str) -> bool {
        !matches!(self.field(name), RawField::Missing)
    }
}

impl<T: FeedRow + ?Sized> FeedRow for &T {
    fn field(&self, name: &str) -> RawField<'_> {
        (**self).field(name)
    }
}

impl FeedRow for Map<String, Value> {
    fn field(&self, name: &str) -> RawField<'_> {
        match self.get(name) {
            None => RawField::Missing,
            Some(Value::Null) => RawField::Null,
            Some(Value::Number(n)) => n.as_f64().map_or(RawField::Unsupported, RawField::Number),
            Some(Value::String(s)) => RawField::Text(s),
            Some(_) => RawField::Unsupported,
        }
    }
}

/// Which naming convention a feed uses for its ten thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedSchema {
    PricingService,
    DailyBands,
}

impl FeedSchema {
    pub fn detect(row: &impl FeedRow) -> Option<Self> {
        if row.has("price_at_pvr_mean") {
            Some(Self::PricingService)
        } else if row.has("price_at_mean") {
            Some(Self::DailyBands)
        } else {
            None
        }
    }

    pub fn band_field(self, level: BandLevel) -> &'static str {
        match self {
            Self::PricingService => match level {
                BandLevel::Minus100 => "price_at_pvr_minus_1sigma",
                BandLevel::Minus075 => "price_at_pvr_minus_three_quarters_sigma",
                BandLevel::Minus050 => "price_at_pvr_minus_half_sigma",
                BandLevel::Minus025 => "price_at_pvr_minus_quarter_sigma",
                BandLevel::Mean => "price_at_pvr_mean",
                BandLevel::Plus050 => "price_at_pvr_plus_half_sigma",
                BandLevel::Plus100 => "price_at_pvr_plus_1sigma",
                BandLevel::Plus150 => "price_at_pvr_plus_1half_sigma",
                BandLevel::Plus200 => "price_at_pvr_plus_2sigma",
                BandLevel::Plus250 => "price_at_pvr_plus_2half_sigma",
            },
            Self::DailyBands => match level {
                BandLevel::Minus100 => "price_at_m100",
                BandLevel::Minus075 => "price_at_m075",
                BandLevel::Minus050 => "price_at_m050",
                BandLevel::Minus025 => "price_at_m025",
                BandLevel::Mean => "price_at_mean",
                BandLevel::Plus050 => "price_at_p050",
                BandLevel::Plus100 => "price_at_p100",
                BandLevel::Plus150 => "price_at_p150",
                BandLevel::Plus200 => "price_at_p200",
                BandLevel::Plus250 => "price_at_p250",
            },
        }
    }
}

/// Field contract for one feed, resolved from its first row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedLayout {
    pub schema: FeedSchema,
    pub price_field: &'static str,
}

impl FeedLayout {
    pub fn detect(row: &impl FeedRow) -> Result<Self, NormalizeError> {
        let schema = FeedSchema::detect(row).ok_or(NormalizeError::UnknownLayout)?;
        let price_field = PRICE_FIELDS
            .iter()
            .copied()
            .find(|f| row.has(f))
            .ok_or(NormalizeError::NoPriceField)?;
        Ok(Self {
            schema,
            price_field,
        })
    }

    /// Normalize one row. `row_index` is used in error messages only.
    pub fn normalize(
        &self,
        row: &impl FeedRow,
        row_index: usize,
    ) -> Result<BandSnapshot, NormalizeError> {
        let date = parse_date(row, row_index)?;
        let price = match read_number(row, self.price_field, row_index)? {
            Some(p) if p.is_finite() => p,
            Some(p) => {
                return Err(NormalizeError::NonFinitePrice {
                    row: row_index,
                    field: self.price_field.to_string(),
                    value: p,
                })
            }
            None => {
                return Err(NormalizeError::NullPrice {
                    row: row_index,
                    field: self.price_field.to_string(),
                })
            }
        };

        let mut bands = Bands::undefined();
        for level in BandLevel::ALL {
            let field = self.schema.band_field(level);
            let value = read_number(row, field, row_index)?
                .filter(|v| v.is_finite())
                .unwrap_or(f64::NAN);
            bands.set(level, value);
        }

        Ok(BandSnapshot::new(date, price, bands))
    }
}

/// Read a required numeric field. `Ok(None)` for an explicit null or blank.
fn read_number(
    row: &impl FeedRow,
    field: &str,
    row_index: usize,
) -> Result<Option<f64>, NormalizeError> {
    let not_numeric = |value: &str| NormalizeError::NotNumeric {
        row: row_index,
        field: field.to_string(),
        value: value.to_string(),
    };
    match row.field(field) {
        RawField::Missing => Err(NormalizeError::MissingField {
            row: row_index,
            field: field.to_string(),
        }),
        RawField::Null => Ok(None),
        RawField::Number(v) => Ok(Some(v)),
        RawField::Text(s) => {
            let t = s.trim();
            if is_blank(t) {
                Ok(None)
            } else {
                t.parse::<f64>().map(Some).map_err(|_| not_numeric(s))
            }
        }
        RawField::Unsupported => Err(not_numeric("<non-scalar>")),
    }
}

fn is_blank(s: &str) -> bool {
    s.is_empty() || s.eq_ignore_ascii_case("nan") || s.eq_ignore_ascii_case("null")
}

fn parse_date(row: &impl FeedRow, row_index: usize) -> Result<NaiveDate, NormalizeError> {
    let invalid = |value: String| NormalizeError::InvalidDate {
        row: row_index,
        value,
    };
    match row.field("date") {
        RawField::Text(s) => {
            let head = s.trim().get(..10).unwrap_or(s.trim());
            return NaiveDate::parse_from_str(head, "%Y-%m-%d").map_err(|_| invalid(s.to_string()));
        }
        RawField::Missing => {}
        RawField::Null | RawField::Number(_) | RawField::Unsupported => {
            return Err(invalid(format!("{:?}", row.field("date"))));
        }
    }
    let millis = match row.field("timestamp") {
        RawField::Number(v) if v.is_finite() => v as i64,
        RawField::Text(s) => s.trim().parse::<i64>().map_err(|_| invalid(s.to_string()))?,
        RawField::Missing => return Err(NormalizeError::MissingDate { row: row_index }),
        other => return Err(invalid(format!("{other:?}"))),
    };
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|dt| dt.date_naive())
        .ok_or_else(|| invalid(millis.to_string()))
}

/// Normalize a whole feed into a date-ordered snapshot sequence.
///
/// An empty feed yields an empty sequence.
pub fn normalize_rows<R: FeedRow>(rows: &[R]) -> Result<Vec<BandSnapshot>, NormalizeError> {
    let Some(first) = rows.first() else {
        return Ok(Vec::new());
    };
    let layout = FeedLayout::detect(first)?;
    tracing::debug!(
        schema = ?layout.schema,
        price_field = layout.price_field,
        rows = rows.len(),
        "feed layout resolved"
    );

    let snapshots = rows
        .iter()
        .enumerate()
        .map(|(i, row)| layout.normalize(row, i))
        .collect::<Result<Vec<_>, _>>()?;
    sort_and_check(snapshots)
}

/// Sort by date and reject duplicated dates.
pub fn sort_and_check(
    mut snapshots: Vec<BandSnapshot>,
) -> Result<Vec<BandSnapshot>, NormalizeError> {
    snapshots.sort_by_key(|s| s.date);
    if let Some(w) = snapshots.windows(2).find(|w| w[0].date == w[1].date) {
        return Err(NormalizeError::DuplicateDate(w[0].date));
    }
    let unordered = snapshots.iter().filter(|s| !s.bands.is_ordered()).count();
    if unordered > 0 {
        tracing::warn!(days = unordered, "band thresholds not monotone in sigma order");
    }
    Ok(snapshots)
}

/// Normalize a JSON payload: either a bare array of rows or `{"data": [...]}`.
pub fn normalize_payload(payload: &Value) -> Result<Vec<BandSnapshot>, NormalizeError> {
    let items = match payload {
        Value::Array(items) => items,
        Value::Object(obj) => match obj.get("data") {
            Some(Value::Array(items)) => items,
            _ => return Err(NormalizeError::InvalidPayload),
        },
        _ => return Err(NormalizeError::InvalidPayload),
    };
    let rows = items
        .iter()
        .enumerate()
        .map(|(i, v)| v.as_object().ok_or(NormalizeError::NotAnObject { row: i }))
        .collect::<Result<Vec<_>, _>>()?;
    normalize_rows(&rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn daily_row(date: &str, price: f64) -> Value {
        json!({
            "date": date,
            "btc_price": price,
            "price_at_m100": 90.0,
            "price_at_m075": 92.5,
            "price_at_m050": 95.0,
            "price_at_m025": 97.5,
            "price_at_mean": 100.0,
            "price_at_p050": 105.0,
            "price_at_p100": 110.0,
            "price_at_p150": 115.0,
            "price_at_p200": 120.0,
            "price_at_p250": 125.0,
        })
    }

    #[test]
    fn daily_layout_sorted_by_date() {
        let payload = json!([daily_row("2024-01-02", 101.0), daily_row("2024-01-01", 99.0)]);
        let snaps = normalize_payload(&payload).unwrap();
        assert_eq!(snaps.len(), 2);
        assert_eq!(snaps[0].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(snaps[0].price, 99.0);
        assert_eq!(snaps[1].bands.p250, 125.0);
        assert!(snaps[0].pause.is_none());
    }

    #[test]
    fn pricing_service_layout_with_data_envelope() {
        let payload = json!({"data": [{
            "date": "2024-05-01T00:00:00Z",
            "btc_price": "60000.5",
            "price_at_pvr_mean": 50000.0,
            "price_at_pvr_minus_1sigma": 30000.0,
            "price_at_pvr_minus_three_quarters_sigma": 35000.0,
            "price_at_pvr_minus_half_sigma": 40000.0,
            "price_at_pvr_minus_quarter_sigma": 45000.0,
            "price_at_pvr_plus_half_sigma": 60000.0,
            "price_at_pvr_plus_1sigma": 70000.0,
            "price_at_pvr_plus_1half_sigma": 80000.0,
            "price_at_pvr_plus_2sigma": 90000.0,
            "price_at_pvr_plus_2half_sigma": null,
        }]});
        let snaps = normalize_payload(&payload).unwrap();
        assert_eq!(snaps[0].date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(snaps[0].price, 60000.5);
        assert_eq!(snaps[0].bands.m075, 35000.0);
        assert!(snaps[0].bands.p250.is_nan());
    }

    #[test]
    fn price_field_priority() {
        let mut row = daily_row("2024-01-01", 1.0);
        row["close"] = json!(3.0);
        row["price_usd"] = json!(2.0);
        let obj = row.as_object().unwrap();
        assert_eq!(FeedLayout::detect(obj).unwrap().price_field, "price_usd");
    }

    #[test]
    fn timestamp_millis_fallback() {
        let mut row = daily_row("x", 1.0);
        row.as_object_mut().unwrap().remove("date");
        row["timestamp"] = json!(1_704_067_200_000_i64);
        let snaps = normalize_payload(&json!([row])).unwrap();
        assert_eq!(snaps[0].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn missing_threshold_fails_fast() {
        let mut row = daily_row("2024-01-01", 1.0);
        row.as_object_mut().unwrap().remove("price_at_p150");
        let err = normalize_payload(&json!([row])).unwrap_err();
        assert_eq!(
            err,
            NormalizeError::MissingField {
                row: 0,
                field: "price_at_p150".into()
            }
        );
    }

    #[test]
    fn non_finite_price_is_rejected() {
        for text in ["inf", "-Infinity", "1e400"] {
            let mut row = daily_row("2024-01-01", 1.0);
            row["btc_price"] = json!(text);
            assert!(
                matches!(
                    normalize_payload(&json!([row])),
                    Err(NormalizeError::NonFinitePrice { row: 0, .. })
                ),
                "price {text:?} should be rejected"
            );
        }
    }

    #[test]
    fn non_finite_threshold_is_undefined() {
        let mut row = daily_row("2024-01-01", 1.0);
        row["price_at_p200"] = json!("inf");
        let snaps = normalize_payload(&json!([row])).unwrap();
        assert!(snaps[0].bands.p200.is_nan());
        assert_eq!(snaps[0].bands.get(BandLevel::Plus200), None);
    }

    #[test]
    fn non_numeric_text_is_rejected() {
        let mut row = daily_row("2024-01-01", 1.0);
        row["price_at_mean"] = json!("abc");
        assert!(matches!(
            normalize_payload(&json!([row])),
            Err(NormalizeError::NotNumeric { .. })
        ));
    }

    #[test]
    fn blank_threshold_is_undefined_but_blank_price_is_an_error() {
        let mut row = daily_row("2024-01-01", 1.0);
        row["price_at_m025"] = json!("NaN");
        let snaps = normalize_payload(&json!([row.clone()])).unwrap();
        assert!(snaps[0].bands.m025.is_nan());

        row["btc_price"] = Value::Null;
        assert!(matches!(
            normalize_payload(&json!([row])),
            Err(NormalizeError::NullPrice { .. })
        ));
    }

    #[test]
    fn duplicate_dates_rejected() {
        let payload = json!([daily_row("2024-01-01", 1.0), daily_row("2024-01-01", 2.0)]);
        assert!(matches!(
            normalize_payload(&payload),
            Err(NormalizeError::DuplicateDate(_))
        ));
    }

    #[test]
    fn unknown_layout_and_bad_payload() {
        let payload = json!([{"date": "2024-01-01", "close": 1.0}]);
        assert_eq!(normalize_payload(&payload), Err(NormalizeError::UnknownLayout));
        assert_eq!(normalize_payload(&json!(42)), Err(NormalizeError::InvalidPayload));
        assert_eq!(normalize_payload(&json!([])), Ok(Vec::new()));
    }
}
