// src/services/loader.rs
use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Datelike, NaiveDate};
use csv::Reader;
use log::{info, warn};

use crate::error::PipelineError;
use crate::models::{month_end, next_month_end, MonthlySeries, RawOrderRecord};

/// Public sample of the sales order data.
pub const SALES_DATA_URL: &str = "https://raw.githubusercontent.com/dwoo-work/time-series-demand-forecasting/main/src/sales_data_sample_utf8.csv";

/// The single product line whose demand is aggregated and forecast.
pub const TARGET_PRODUCT_LINE: &str = "Motorcycles";

/// Date formats seen in the order data, datetime variants first. Time of day,
/// when present, is discarded.
const DATE_FORMATS: &[&str] = &["%m/%d/%Y %H:%M", "%m/%d/%Y", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d"];

/// Fetch the raw order records via the CSV endpoint.
pub async fn fetch_sales_records(url: &str) -> Result<Vec<RawOrderRecord>, PipelineError> {
    info!("Fetching sales CSV from URL: {}", url);

    let csv_text = reqwest::get(url)
        .await
        .map_err(|e| PipelineError::DataSource(format!("sales CSV unreachable: {}", e)))?
        .text()
        .await
        .map_err(|e| PipelineError::DataSource(format!("failed to read sales CSV body: {}", e)))?;

    parse_sales_csv(csv_text.as_bytes())
}

/// Parse order records out of CSV text. A missing required column or an
/// otherwise malformed row is a `DataSource` error, as is an empty file.
pub fn parse_sales_csv<R: std::io::Read>(reader: R) -> Result<Vec<RawOrderRecord>, PipelineError> {
    let mut rdr = Reader::from_reader(reader);

    let mut records = Vec::new();
    for row in rdr.deserialize() {
        let record: RawOrderRecord =
            row.map_err(|e| PipelineError::DataSource(format!("malformed sales CSV: {}", e)))?;
        records.push(record);
    }

    if records.is_empty() {
        return Err(PipelineError::DataSource(
            "sales CSV contained no data rows".into(),
        ));
    }

    info!("Parsed {} raw order rows", records.len());
    Ok(records)
}

fn parse_order_date(raw: &str) -> Result<NaiveDate, PipelineError> {
    let trimmed = raw.trim();
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Ok(date);
        }
    }
    Err(PipelineError::DataFormat(format!(
        "unparseable order date: {:?}",
        raw
    )))
}

struct CalendarGroup {
    /// First order date seen for this (iso week, month, year) key, in input order.
    date: NaiveDate,
    /// Summed target-product quantity; rows for other product lines contribute 0.
    total: f64,
}

/// Aggregate raw order records into the canonical monthly demand series.
///
/// Steps: drop exact-duplicate rows, parse dates at date-only precision,
/// group by (ISO week, month, year), sum the target product line's quantity
/// per group, then bucket the groups onto a gapless month-end calendar with 0
/// for months that have no orders at all.
///
/// Policy: any unparseable date fails the whole load rather than silently
/// dropping the row, so two loads of the same source can never disagree.
pub fn load_monthly_series(records: &[RawOrderRecord]) -> Result<MonthlySeries, PipelineError> {
    if records.is_empty() {
        return Err(PipelineError::DataSource(
            "no order records to aggregate".into(),
        ));
    }

    // Deduplicate, preserving first-seen order.
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(records.len());
    for record in records {
        if seen.insert(record) {
            unique.push(record);
        }
    }
    let dropped = records.len() - unique.len();
    if dropped > 0 {
        warn!("Dropped {} exact-duplicate order rows", dropped);
    }

    // Group every record by its calendar key; only the target product line's
    // quantity is summed, but all records shape the date range.
    let mut groups: HashMap<(u32, u32, i32), CalendarGroup> = HashMap::new();
    for record in &unique {
        let date = parse_order_date(&record.order_date)?;
        let key = (date.iso_week().week(), date.month(), date.year());
        let group = groups
            .entry(key)
            .or_insert(CalendarGroup { date, total: 0.0 });
        if record.product_line == TARGET_PRODUCT_LINE {
            group.total += f64::from(record.quantity_ordered);
        }
    }

    let mut groups: Vec<CalendarGroup> = groups.into_values().collect();
    groups.sort_by_key(|g| g.date);

    // Resample onto month-end boundaries, summing groups that fall in the
    // same calendar month.
    let mut buckets: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for group in &groups {
        let key = month_end(group.date.year(), group.date.month());
        *buckets.entry(key).or_insert(0.0) += group.total;
    }

    let first = *buckets.keys().next().expect("at least one group");
    let last = *buckets.keys().next_back().expect("at least one group");

    let mut dates = Vec::new();
    let mut values = Vec::new();
    let mut cursor = first;
    loop {
        dates.push(cursor);
        values.push(buckets.get(&cursor).copied().unwrap_or(0.0));
        if cursor == last {
            break;
        }
        cursor = next_month_end(cursor);
    }

    info!(
        "Aggregated {} order rows into {} monthly observations ({} .. {})",
        unique.len(),
        dates.len(),
        first,
        last
    );
    MonthlySeries::new(dates, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn record(date: &str, line: &str, qty: u32) -> RawOrderRecord {
        RawOrderRecord {
            order_date: date.to_string(),
            product_line: line.to_string(),
            quantity_ordered: qty,
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn parses_csv_with_extra_columns() {
        let csv = "ORDERNUMBER,ORDERDATE,PRODUCTLINE,QUANTITYORDERED\n\
                   10107,2/24/2003 0:00,Motorcycles,30\n\
                   10121,5/7/2003 0:00,Classic Cars,34\n";
        let records = parse_sales_csv(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].product_line, "Motorcycles");
        assert_eq!(records[0].quantity_ordered, 30);
    }

    #[test]
    fn rejects_csv_missing_required_column() {
        let csv = "ORDERDATE,QUANTITYORDERED\n2/24/2003 0:00,30\n";
        let err = parse_sales_csv(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, PipelineError::DataSource(_)));
    }

    #[test]
    fn rejects_empty_csv() {
        let csv = "ORDERDATE,PRODUCTLINE,QUANTITYORDERED\n";
        let err = parse_sales_csv(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, PipelineError::DataSource(_)));
    }

    #[test]
    fn unparseable_date_fails_the_whole_load() {
        let records = vec![
            record("2/24/2003 0:00", "Motorcycles", 30),
            record("not-a-date", "Motorcycles", 10),
        ];
        let err = load_monthly_series(&records).unwrap_err();
        assert!(matches!(err, PipelineError::DataFormat(_)));
    }

    #[test]
    fn exact_duplicates_are_counted_once() {
        let records = vec![
            record("2/24/2003 0:00", "Motorcycles", 30),
            record("2/24/2003 0:00", "Motorcycles", 30),
        ];
        let series = load_monthly_series(&records).unwrap();
        assert_eq!(series.len(), 1);
        assert_relative_eq!(series.values()[0], 30.0);
    }

    #[test]
    fn near_duplicates_are_both_counted() {
        // Same date and product, different quantity: two distinct order lines.
        let records = vec![
            record("2/24/2003 0:00", "Motorcycles", 30),
            record("2/24/2003 0:00", "Motorcycles", 31),
        ];
        let series = load_monthly_series(&records).unwrap();
        assert_relative_eq!(series.values()[0], 61.0);
    }

    #[test]
    fn months_without_orders_are_zero_filled() {
        let records = vec![
            record("1/10/2003 0:00", "Motorcycles", 5),
            record("4/20/2003 0:00", "Motorcycles", 7),
        ];
        let series = load_monthly_series(&records).unwrap();
        assert_eq!(
            series.dates(),
            &[d(2003, 1, 31), d(2003, 2, 28), d(2003, 3, 31), d(2003, 4, 30)]
        );
        assert_eq!(series.values(), &[5.0, 0.0, 0.0, 7.0]);
    }

    #[test]
    fn non_target_product_lines_contribute_zero_but_extend_the_range() {
        let records = vec![
            record("1/10/2003 0:00", "Motorcycles", 5),
            record("3/15/2003 0:00", "Classic Cars", 40),
        ];
        let series = load_monthly_series(&records).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.values(), &[5.0, 0.0, 0.0]);
    }

    #[test]
    fn orders_in_the_same_month_are_summed() {
        // Two different ISO weeks of the same month collapse into one bucket.
        let records = vec![
            record("1/3/2003 0:00", "Motorcycles", 5),
            record("1/20/2003 0:00", "Motorcycles", 11),
        ];
        let series = load_monthly_series(&records).unwrap();
        assert_eq!(series.len(), 1);
        assert_relative_eq!(series.values()[0], 16.0);
    }

    #[test]
    fn loading_is_idempotent() {
        let records = vec![
            record("1/10/2003 0:00", "Motorcycles", 5),
            record("2/14/2003 0:00", "Classic Cars", 9),
            record("6/30/2003 0:00", "Motorcycles", 12),
        ];
        let first = load_monthly_series(&records).unwrap();
        let second = load_monthly_series(&records).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn no_gaps_between_consecutive_entries() {
        let records = vec![
            record("1/10/2003 0:00", "Motorcycles", 5),
            record("11/28/2004 0:00", "Motorcycles", 3),
        ];
        let series = load_monthly_series(&records).unwrap();
        for pair in series.dates().windows(2) {
            assert_eq!(pair[1], next_month_end(pair[0]));
        }
        assert_eq!(series.len(), 23);
    }

    #[test]
    fn tolerates_iso_date_format() {
        let records = vec![record("2003-02-24", "Motorcycles", 30)];
        let series = load_monthly_series(&records).unwrap();
        assert_eq!(series.dates()[0], d(2003, 2, 28));
    }
}
