use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use tracing::info;

use crate::error::LoadError;
use crate::models::SalesRecord;

pub const REQUIRED_COLUMNS: [&str; 8] = [
    "Date",
    "Time",
    "Branch",
    "Customer type",
    "Gender",
    "Product line",
    "Total",
    "COGS",
];

const DATE_FORMATS: [&str; 11] = [
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%m-%d-%Y",
    "%Y.%m.%d",
    "%Y%m%d",
    "%d-%b-%Y",
    "%d %B %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%b %d, %Y",
];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%m/%d/%Y %H:%M"];
const TIME_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone)]
pub struct Dataset {
    pub records: Vec<SalesRecord>,
    pub min_date: NaiveDate,
    pub max_date: NaiveDate,
    /// ISO year of `max_date`; every week selector resolves against it.
    pub reference_year: i32,
    pub last_week_number: u32,
}

impl Dataset {
    pub fn from_records(records: Vec<SalesRecord>) -> Result<Self, LoadError> {
        let min_date = records
            .iter()
            .map(|record| record.date)
            .min()
            .ok_or(LoadError::EmptyDataset)?;
        let max_date = records
            .iter()
            .map(|record| record.date)
            .max()
            .ok_or(LoadError::EmptyDataset)?;
        let iso = max_date.iso_week();

        Ok(Self {
            records,
            min_date,
            max_date,
            reference_year: iso.year(),
            last_week_number: iso.week(),
        })
    }
}

pub fn load(path: &Path) -> Result<Dataset, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let dataset = load_from_reader(file)?;

    info!(
        path = %path.display(),
        rows = dataset.records.len(),
        min_date = %dataset.min_date,
        max_date = %dataset.max_date,
        reference_year = dataset.reference_year,
        last_week = dataset.last_week_number,
        "sales dataset loaded"
    );

    Ok(dataset)
}

pub fn load_from_reader<R: Read>(source: R) -> Result<Dataset, LoadError> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        #[serde(rename = "Date")]
        date: String,
        #[serde(rename = "Time")]
        time: String,
        #[serde(rename = "Branch")]
        branch: String,
        #[serde(rename = "Customer type")]
        customer_type: String,
        #[serde(rename = "Gender")]
        gender: String,
        #[serde(rename = "Product line")]
        product_line: String,
        #[serde(rename = "Total")]
        total: f64,
        #[serde(rename = "COGS")]
        cogs: f64,
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|source| LoadError::Csv { line: 1, source })?
        .clone();
    if let Some(missing) = REQUIRED_COLUMNS
        .iter()
        .find(|column| !headers.iter().any(|header| header == **column))
    {
        return Err(LoadError::MissingColumn(*missing));
    }

    let mut records = Vec::new();
    let mut raw = csv::StringRecord::new();
    loop {
        let line = reader.position().line();
        let more = reader
            .read_record(&mut raw)
            .map_err(|source| LoadError::Csv { line, source })?;
        if !more {
            break;
        }

        // Quoted fields may span lines, so take the line where the record starts.
        let line = raw.position().map_or(line, |position| position.line());
        let row: CsvRow = raw
            .deserialize(Some(&headers))
            .map_err(|source| LoadError::Csv { line, source })?;

        let date = parse_date(&row.date).ok_or_else(|| LoadError::InvalidDate {
            line,
            value: row.date.clone(),
        })?;
        let time = parse_time(&row.time).ok_or_else(|| LoadError::InvalidTime {
            line,
            value: row.time.clone(),
        })?;

        records.push(SalesRecord {
            date,
            time,
            branch: row.branch,
            customer_type: row.customer_type,
            gender: row.gender,
            product_line: row.product_line,
            total: row.total,
            cogs: row.cogs,
        });
    }

    Dataset::from_records(records)
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .or_else(|| {
            DATETIME_FORMATS.iter().find_map(|format| {
                NaiveDateTime::parse_from_str(value, format)
                    .ok()
                    .map(|stamp| stamp.date())
            })
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|stamp| stamp.date_naive())
        })
}

pub fn parse_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, TIME_FORMAT).ok()
}
