//! Flat CSV exports for dashboards
//!
//! Three tables are produced: the long forecast/volatility table, the
//! allocation weights, and the merged one-row-per-date dashboard table.
//! Per-indicator columns are prefixed with the indicator name.

use crate::error::Result;
use crate::pipeline::{AllocationOutput, ForecastTable, PipelineOutput};
use polars::prelude::*;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

pub const FORECAST_FILE: &str = "macro_forecast_volatility.csv";
pub const WEIGHTS_FILE: &str = "index_simulation.csv";
pub const DASHBOARD_FILE: &str = "dashboard_data.csv";

pub const DATE_COLUMN: &str = "date";
pub const REGIME_COLUMN: &str = "regime";
pub const WEIGHT_COLUMNS: [&str; 4] = ["Equities", "Bonds", "Commodities", "Cash"];

/// Dashboard columns of one indicator: point, lower, upper, volatility
pub fn indicator_columns(indicator: &str) -> [String; 4] {
    [
        indicator.to_string(),
        format!("{}_lower", indicator),
        format!("{}_upper", indicator),
        format!("{}_volatility", indicator),
    ]
}

/// Every dashboard column, in export order
pub fn dashboard_columns<'a, I>(indicators: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut columns = vec![DATE_COLUMN.to_string()];
    columns.extend(indicators.into_iter().flat_map(indicator_columns));
    columns.push(REGIME_COLUMN.to_string());
    columns.extend(WEIGHT_COLUMNS.iter().map(|c| c.to_string()));
    columns
}

/// Long format: one row per indicator and date
pub fn forecast_frame(table: &ForecastTable) -> Result<DataFrame> {
    let rows: Vec<_> = table.rows().collect();

    let df = DataFrame::new(vec![
        Series::new(
            "date",
            rows.iter().map(|r| r.date.to_string()).collect::<Vec<String>>(),
        ),
        Series::new(
            "indicator",
            rows.iter().map(|r| r.indicator.clone()).collect::<Vec<String>>(),
        ),
        Series::new("forecast", rows.iter().map(|r| r.point).collect::<Vec<f64>>()),
        Series::new(
            "forecast_lower",
            rows.iter().map(|r| r.lower).collect::<Vec<f64>>(),
        ),
        Series::new(
            "forecast_upper",
            rows.iter().map(|r| r.upper).collect::<Vec<f64>>(),
        ),
        Series::new(
            "actual",
            rows.iter().map(|r| r.actual).collect::<Vec<Option<f64>>>(),
        ),
        Series::new(
            "rolling_volatility",
            rows.iter()
                .map(|r| r.rolling_volatility)
                .collect::<Vec<Option<f64>>>(),
        ),
        Series::new(
            "is_future",
            rows.iter().map(|r| r.is_future).collect::<Vec<bool>>(),
        ),
    ])?;

    Ok(df)
}

fn weight_series(allocation: &AllocationOutput) -> Vec<Series> {
    WEIGHT_COLUMNS
        .iter()
        .enumerate()
        .map(|(i, name)| {
            Series::new(
                *name,
                allocation
                    .weights()
                    .map(|w| w.weights.as_array()[i])
                    .collect::<Vec<f64>>(),
            )
        })
        .collect()
}

/// One row per allocated date with its regime and weights
pub fn weights_frame(allocation: &AllocationOutput) -> Result<DataFrame> {
    let mut columns = vec![
        Series::new(
            DATE_COLUMN,
            allocation
                .weights()
                .map(|w| w.date.to_string())
                .collect::<Vec<String>>(),
        ),
        Series::new(
            REGIME_COLUMN,
            allocation
                .weights()
                .map(|w| w.regime.clone())
                .collect::<Vec<String>>(),
        ),
    ];
    columns.extend(weight_series(allocation));

    Ok(DataFrame::new(columns)?)
}

/// Merged table: forecasts, bounds and volatility per indicator, then weights
pub fn dashboard_frame(allocation: &AllocationOutput) -> Result<DataFrame> {
    let rows = &allocation.rows;
    let mut columns = vec![Series::new(
        DATE_COLUMN,
        rows.iter().map(|r| r.date.to_string()).collect::<Vec<String>>(),
    )];

    for (i, indicator) in allocation.indicators.iter().enumerate() {
        let [point, lower, upper, volatility] = indicator_columns(indicator);
        columns.push(Series::new(
            &point,
            rows.iter().map(|r| r.values[i].point).collect::<Vec<f64>>(),
        ));
        columns.push(Series::new(
            &lower,
            rows.iter().map(|r| r.values[i].lower).collect::<Vec<f64>>(),
        ));
        columns.push(Series::new(
            &upper,
            rows.iter().map(|r| r.values[i].upper).collect::<Vec<f64>>(),
        ));
        columns.push(Series::new(
            &volatility,
            rows.iter()
                .map(|r| r.values[i].volatility)
                .collect::<Vec<Option<f64>>>(),
        ));
    }

    columns.push(Series::new(
        REGIME_COLUMN,
        rows.iter()
            .map(|r| r.allocation.regime.clone())
            .collect::<Vec<String>>(),
    ));
    columns.extend(weight_series(allocation));

    Ok(DataFrame::new(columns)?)
}

/// Write a frame as CSV with a header row. Undefined values are empty cells.
pub fn write_csv<W: Write>(df: &mut DataFrame, writer: W) -> Result<()> {
    CsvWriter::new(writer).finish(df)?;
    Ok(())
}

/// Render a frame to CSV text
pub fn to_csv_string(df: &mut DataFrame) -> Result<String> {
    let mut buffer = Vec::new();
    write_csv(df, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Paths of the files written by [`export_all`]
#[derive(Debug, Clone, PartialEq)]
pub struct ExportPaths {
    pub forecasts: PathBuf,
    pub weights: PathBuf,
    pub dashboard: PathBuf,
}

fn write_file(df: &mut DataFrame, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    write_csv(df, file)?;
    info!(path = %path.display(), rows = df.height(), "wrote export");
    Ok(())
}

/// Write all three exports into `dir`, creating it if needed
pub fn export_all<P: AsRef<Path>>(output: &PipelineOutput, dir: P) -> Result<ExportPaths> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let paths = ExportPaths {
        forecasts: dir.join(FORECAST_FILE),
        weights: dir.join(WEIGHTS_FILE),
        dashboard: dir.join(DASHBOARD_FILE),
    };

    write_file(&mut forecast_frame(&output.forecasts)?, &paths.forecasts)?;
    write_file(&mut weights_frame(&output.allocation)?, &paths.weights)?;
    write_file(&mut dashboard_frame(&output.allocation)?, &paths.dashboard)?;

    Ok(paths)
}
