//! Delimited-file loaders for price and benchmark tables
//!
//! Tables are held column-wise. Tickers are interned to `u32` ids and price
//! columns are narrowed to `f32` whenever every value survives the round trip,
//! which roughly halves the footprint of a large universe.

use crate::error::{BacktestError, Result};
use crate::types::{PriceObservation, Ticker};
use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord};
use hashbrown::HashMap;
use std::io::Read;
use std::path::Path;

/// Numeric column stored at the narrowest lossless width
#[derive(Debug, Clone, PartialEq)]
pub enum PriceColumn {
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl PriceColumn {
    /// Store as `f32` if no value changes when narrowed
    pub fn narrow(values: Vec<f64>) -> Self {
        let lossless = values.iter().all(|v| (*v as f32) as f64 == *v);
        if lossless {
            PriceColumn::F32(values.into_iter().map(|v| v as f32).collect())
        } else {
            PriceColumn::F64(values)
        }
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        match self {
            PriceColumn::F32(values) => values.get(index).map(|v| *v as f64),
            PriceColumn::F64(values) => values.get(index).copied(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            PriceColumn::F32(values) => values.len(),
            PriceColumn::F64(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes used by the stored values
    pub fn byte_size(&self) -> usize {
        match self {
            PriceColumn::F32(values) => values.len() * std::mem::size_of::<f32>(),
            PriceColumn::F64(values) => values.len() * std::mem::size_of::<f64>(),
        }
    }

    pub fn width_name(&self) -> &'static str {
        match self {
            PriceColumn::F32(_) => "float32",
            PriceColumn::F64(_) => "float64",
        }
    }
}

/// Raw daily prices for the whole universe
#[derive(Debug, Clone)]
pub struct PriceTable {
    symbols: Vec<Ticker>,
    ticker_ids: Vec<u32>,
    dates: Vec<NaiveDate>,
    prices: PriceColumn,
    /// Rows skipped because the price cell was empty
    skipped_rows: usize,
}

impl PriceTable {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn ticker_count(&self) -> usize {
        self.symbols.len()
    }

    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    pub fn prices(&self) -> &PriceColumn {
        &self.prices
    }

    /// Rows in file order
    pub fn observations(&self) -> impl Iterator<Item = PriceObservation> + '_ {
        self.ticker_ids
            .iter()
            .zip(self.dates.iter())
            .enumerate()
            .filter_map(move |(i, (id, date))| {
                let price = self.prices.get(i)?;
                let ticker = self.symbols.get(*id as usize)?;
                Some(PriceObservation::new(ticker.clone(), *date, price))
            })
    }

    /// Estimated bytes as stored vs. as plain strings and `f64`s
    pub fn memory_usage(&self) -> (usize, usize) {
        let wide_tickers: usize = self
            .ticker_ids
            .iter()
            .filter_map(|id| self.symbols.get(*id as usize))
            .map(|s| s.len() + std::mem::size_of::<String>())
            .sum();
        let narrow_tickers = self.ticker_ids.len() * std::mem::size_of::<u32>()
            + self
                .symbols
                .iter()
                .map(|s| s.len() + std::mem::size_of::<String>())
                .sum::<usize>();
        let dates = self.dates.len() * std::mem::size_of::<NaiveDate>();

        let before = wide_tickers + dates + self.prices.len() * std::mem::size_of::<f64>();
        let after = narrow_tickers + dates + self.prices.byte_size();
        (before, after)
    }
}

/// Raw daily benchmark closes
#[derive(Debug, Clone)]
pub struct BenchmarkTable {
    dates: Vec<NaiveDate>,
    adj_close: PriceColumn,
}

impl BenchmarkTable {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// (date, adjusted close) in file order
    pub fn closes(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates
            .iter()
            .enumerate()
            .filter_map(move |(i, date)| self.adj_close.get(i).map(|p| (*date, p)))
    }
}

/// CSV column naming
#[derive(Debug, Clone)]
struct CsvFormat {
    ticker_column: String,
    date_column: String,
    price_column: String,
    benchmark_price_column: String,
    delimiter: u8,
}

impl Default for CsvFormat {
    fn default() -> Self {
        Self {
            ticker_column: "ticker".to_string(),
            date_column: "date".to_string(),
            price_column: "price".to_string(),
            benchmark_price_column: "adj_close".to_string(),
            delimiter: b',',
        }
    }
}

/// Loads price and benchmark CSV files into compact tables
#[derive(Debug, Clone, Default)]
pub struct CsvTableLoader {
    format: CsvFormat,
}

impl CsvTableLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the universe price file
    pub fn load_prices(&self, path: &Path) -> Result<PriceTable> {
        ensure_exists(path)?;
        let table = self.read_prices(std::fs::File::open(path)?)?;

        let (before, after) = table.memory_usage();
        log::info!(
            "Loaded {} price rows for {} tickers from {} ({} prices)",
            table.len(),
            table.ticker_count(),
            path.display(),
            table.prices.width_name()
        );
        log::info!(
            "Memory usage reduced from {:.2} MB to {:.2} MB",
            before as f64 / 1_048_576.0,
            after as f64 / 1_048_576.0
        );
        Ok(table)
    }

    /// Load the benchmark index file
    pub fn load_benchmark(&self, path: &Path) -> Result<BenchmarkTable> {
        ensure_exists(path)?;
        let table = self.read_benchmark(std::fs::File::open(path)?)?;
        log::info!(
            "Loaded {} benchmark rows from {}",
            table.len(),
            path.display()
        );
        Ok(table)
    }

    pub fn read_prices<R: Read>(&self, reader: R) -> Result<PriceTable> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(self.format.delimiter)
            .flexible(true)
            .from_reader(reader);
        let headers = rdr.headers()?.clone();

        let ticker_idx = find_column(&headers, &self.format.ticker_column)?;
        let date_idx = find_column(&headers, &self.format.date_column)?;
        let price_idx = find_column(&headers, &self.format.price_column)?;

        let mut symbol_to_id: HashMap<String, u32> = HashMap::new();
        let mut symbols = Vec::new();
        let mut ticker_ids = Vec::new();
        let mut dates = Vec::new();
        let mut prices = Vec::new();
        let mut skipped_rows = 0;

        for result in rdr.records() {
            let record = result?;
            let line = record_line(&record);

            let Some(price) = parse_price(&record, price_idx, line)? else {
                skipped_rows += 1;
                continue;
            };
            let date = parse_date_field(&record, date_idx, line)?;
            let symbol = field(&record, ticker_idx, "ticker", line)?;

            let id = match symbol_to_id.get(symbol) {
                Some(id) => *id,
                None => {
                    let id = symbols.len() as u32;
                    symbols.push(symbol.to_string());
                    symbol_to_id.insert(symbol.to_string(), id);
                    id
                }
            };

            ticker_ids.push(id);
            dates.push(date);
            prices.push(price);
        }

        if skipped_rows > 0 {
            log::warn!("Skipped {} price rows with no price", skipped_rows);
        }

        Ok(PriceTable {
            symbols,
            ticker_ids,
            dates,
            prices: PriceColumn::narrow(prices),
            skipped_rows,
        })
    }

    pub fn read_benchmark<R: Read>(&self, reader: R) -> Result<BenchmarkTable> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(self.format.delimiter)
            .flexible(true)
            .from_reader(reader);
        let headers = rdr.headers()?.clone();

        let date_idx = find_column(&headers, &self.format.date_column)?;
        let close_idx = find_column(&headers, &self.format.benchmark_price_column)?;

        let mut dates = Vec::new();
        let mut closes = Vec::new();

        for result in rdr.records() {
            let record = result?;
            let line = record_line(&record);

            let Some(close) = parse_price(&record, close_idx, line)? else {
                continue;
            };
            dates.push(parse_date_field(&record, date_idx, line)?);
            closes.push(close);
        }

        Ok(BenchmarkTable {
            dates,
            adj_close: PriceColumn::narrow(closes),
        })
    }
}

/// Fail early when an input file is absent
pub fn ensure_exists(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(BacktestError::MissingInput(path.to_path_buf()))
    }
}

/// Parse `YYYY-MM-DD`, ignoring any time-of-day suffix
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

fn find_column(headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
        .ok_or_else(|| BacktestError::MissingColumn(name.to_string()))
}

fn record_line(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

fn field<'a>(record: &'a StringRecord, idx: usize, name: &str, line: u64) -> Result<&'a str> {
    record.get(idx).ok_or_else(|| BacktestError::ParseError {
        line,
        message: format!("missing {}", name),
    })
}

fn parse_date_field(record: &StringRecord, idx: usize, line: u64) -> Result<NaiveDate> {
    let raw = field(record, idx, "date", line)?;
    parse_date(raw).ok_or_else(|| BacktestError::ParseError {
        line,
        message: format!("invalid date '{}'", raw),
    })
}

/// Cell values read as a missing price
const MISSING_TOKENS: &[&str] = &["na", "n/a", "nan", "-nan", "+nan", "null", "none", "#n/a"];

/// Missing tokens and non-finite values are missing prices, anything else must be a number
fn parse_price(record: &StringRecord, idx: usize, line: u64) -> Result<Option<f64>> {
    let raw = record.get(idx).map(str::trim).unwrap_or("");
    if raw.is_empty() || MISSING_TOKENS.iter().any(|t| raw.eq_ignore_ascii_case(t)) {
        return Ok(None);
    }
    let value = raw.parse::<f64>().map_err(|_| BacktestError::ParseError {
        line,
        message: format!("invalid price '{}'", raw),
    })?;
    Ok(value.is_finite().then_some(value))
}
