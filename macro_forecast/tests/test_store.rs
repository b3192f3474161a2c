use chrono::NaiveDate;
use macro_forecast::store::{CsvIndicatorStore, CsvStoreConfig};
use macro_forecast::{ForecastError, IndicatorSpec, IndicatorStore, PipelineConfig};
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_csv(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", contents).unwrap();
    file
}

fn store_for(file: &NamedTempFile) -> CsvIndicatorStore {
    let config = PipelineConfig::default();
    CsvIndicatorStore::new(
        CsvStoreConfig {
            path: file.path().to_path_buf(),
        },
        &config.indicators,
    )
}

#[test]
fn test_reads_rows_by_series_id() {
    let file = write_csv(
        "date,value,series_id\n\
         2023-01-01,3.1,CPIAUCSL\n\
         2023-02-01,.,CPIAUCSL\n\
         2023-03-01,3.4,CPIAUCSL\n\
         2023-01-01,2.2,GDP\n\
         2023-01-01,4.0,HOUST\n",
    );

    let observations = store_for(&file).fetch_observations().unwrap();
    let summary: Vec<(&str, NaiveDate, f64)> = observations
        .iter()
        .map(|o| (o.indicator.as_str(), o.date, o.value))
        .collect();

    assert_eq!(
        summary,
        vec![
            ("CPI", NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(), 3.1),
            ("CPI", NaiveDate::from_ymd_opt(2023, 3, 1).unwrap(), 3.4),
            ("GDP", NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(), 2.2),
        ]
    );
}

#[test]
fn test_accepts_indicator_name_column() {
    let file = write_csv(
        "date,value,indicator_name\n\
         2023-01-01 00:00:00,5.1,Unemployment\n\
         2023-02-01 00:00:00,,Unemployment\n",
    );

    let observations = store_for(&file).fetch_observations().unwrap();
    assert_eq!(observations.len(), 1);
    assert_eq!(observations[0].indicator, "Unemployment");
    assert_eq!(observations[0].value, 5.1);
}

#[test]
fn test_missing_file_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let store = CsvIndicatorStore::new(
        CsvStoreConfig {
            path: dir.path().join("missing.csv"),
        },
        &[IndicatorSpec::new("CPI", "CPIAUCSL")],
    );

    let err = store.fetch_observations().unwrap_err();
    assert!(matches!(err, ForecastError::SourceUnavailable(_)));
    assert!(err.to_string().contains("missing.csv"));
}

#[test]
fn test_malformed_value_is_unavailable() {
    let file = write_csv("date,value,series_id\n2023-01-01,abc,CPIAUCSL\n");

    let err = store_for(&file).fetch_observations().unwrap_err();
    match err {
        ForecastError::SourceUnavailable(reason) => assert!(reason.contains("abc")),
        other => panic!("expected SourceUnavailable, got {other:?}"),
    }
}
