use chrono::{Months, NaiveDate};
use macro_forecast::allocation::UNEMPLOYMENT;
use macro_forecast::export::{
    self, dashboard_frame, forecast_frame, to_csv_string, weights_frame, DASHBOARD_FILE,
    FORECAST_FILE, WEIGHTS_FILE,
};
use macro_forecast::store::{InMemoryStore, SyntheticStore};
use macro_forecast::{Observation, Pipeline, PipelineConfig, PipelineOutput};
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::tempdir;

fn monthly(name: &str, values: &[f64]) -> Vec<Observation> {
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let date = start.checked_add_months(Months::new(i as u32)).unwrap();
            Observation::new(name, date, *v)
        })
        .collect()
}

fn small_run() -> PipelineOutput {
    let mut observations = monthly("CPI", &[2.0, 2.5, 3.0, 8.0, 9.0, 9.5]);
    observations.extend(monthly("GDP", &[1.0; 6]));
    observations.extend(monthly(UNEMPLOYMENT, &[5.0; 6]));

    let config = PipelineConfig {
        horizon: 1,
        volatility_window: 3,
        ..PipelineConfig::default()
    };
    Pipeline::new(config)
        .unwrap()
        .run(&InMemoryStore::new(observations))
        .unwrap()
}

fn header(csv: &str) -> &str {
    csv.lines().next().unwrap()
}

#[test]
fn test_forecast_csv_layout() {
    let output = small_run();
    let csv = to_csv_string(&mut forecast_frame(&output.forecasts).unwrap()).unwrap();

    assert_eq!(
        header(&csv),
        "date,indicator,forecast,forecast_lower,forecast_upper,actual,rolling_volatility,is_future"
    );
    // three indicators, six observed and one future date each
    assert_eq!(csv.lines().count(), 1 + 3 * 7);

    let first = csv.lines().nth(1).unwrap();
    assert!(first.starts_with("2023-01-01,CPI,"));
    // no volatility before the window fills
    assert!(first.ends_with(",,false"), "{first}");

    let future = csv.lines().nth(7).unwrap();
    assert!(future.starts_with("2023-07-01,CPI,"));
    // neither an actual value nor a volatility on future dates
    assert!(future.ends_with(",,,true"), "{future}");
}

#[test]
fn test_weights_and_dashboard_layout() {
    let output = small_run();

    let weights = to_csv_string(&mut weights_frame(&output.allocation).unwrap()).unwrap();
    assert_eq!(header(&weights), "date,regime,Equities,Bonds,Commodities,Cash");
    assert_eq!(weights.lines().count(), 1 + 7);
    assert!(weights
        .lines()
        .any(|line| line.starts_with("2023-06-01,stagflation,")));

    let dashboard = to_csv_string(&mut dashboard_frame(&output.allocation).unwrap()).unwrap();
    assert_eq!(
        header(&dashboard),
        "date,CPI,CPI_lower,CPI_upper,CPI_volatility,\
         GDP,GDP_lower,GDP_upper,GDP_volatility,\
         Unemployment,Unemployment_lower,Unemployment_upper,Unemployment_volatility,\
         regime,Equities,Bonds,Commodities,Cash"
    );
    assert_eq!(dashboard.lines().count(), 1 + 7);
}

#[test]
fn test_export_is_byte_identical_across_runs() {
    let start = NaiveDate::from_ymd_opt(2016, 1, 1).unwrap();
    let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();

    let first_dir = tempdir().unwrap();
    let second_dir = tempdir().unwrap();

    let first = pipeline
        .run(&SyntheticStore::macro_basket(start, 48, 11))
        .unwrap();
    let second = pipeline
        .run(&SyntheticStore::macro_basket(start, 48, 11))
        .unwrap();

    let a = export::export_all(&first, first_dir.path()).unwrap();
    let b = export::export_all(&second, second_dir.path()).unwrap();

    assert_eq!(a.forecasts, first_dir.path().join(FORECAST_FILE));
    assert_eq!(a.weights, first_dir.path().join(WEIGHTS_FILE));
    assert_eq!(a.dashboard, first_dir.path().join(DASHBOARD_FILE));

    for (left, right) in [
        (&a.forecasts, &b.forecasts),
        (&a.weights, &b.weights),
        (&a.dashboard, &b.dashboard),
    ] {
        let left = fs::read(left).unwrap();
        let right = fs::read(right).unwrap();
        assert!(!left.is_empty());
        assert_eq!(left, right);
    }
}

#[test]
fn test_export_creates_missing_directory() {
    let dir = tempdir().unwrap();
    let nested = dir.path().join("reports").join("latest");

    let paths = export::export_all(&small_run(), &nested).unwrap();
    assert!(paths.forecasts.exists());
    assert!(paths.weights.exists());
    assert!(paths.dashboard.exists());
}
