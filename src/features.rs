use polars::prelude::*;
use thiserror::Error;

use crate::logging::log_event;

/// Trailing window lengths for the smoothed price columns.
pub const MA_SHORT_WINDOW: usize = 50;
pub const MA_LONG_WINDOW: usize = 200;

#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("enrichment requires column `{0}`")]
    MissingColumn(String),
    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),
}

pub type FeatureResult<T> = Result<T, FeatureError>;

fn to_opt_f64_vec(series: &Series) -> PolarsResult<Vec<Option<f64>>> {
    let float_series = if series.dtype() != &DataType::Float64 {
        series.cast(&DataType::Float64)?
    } else {
        series.clone()
    };

    let chunked = float_series.f64().expect("series casted to f64");
    Ok(chunked.into_iter().collect())
}

fn column_values(frame: &DataFrame, column: &str) -> FeatureResult<Vec<Option<f64>>> {
    let series = frame
        .column(column)
        .map_err(|_| FeatureError::MissingColumn(column.to_string()))?;
    to_opt_f64_vec(series).map_err(FeatureError::Polars)
}

/// Append a trailing moving average column. Rows with fewer than `window`
/// observations of history are null, as is any row whose window contains a
/// null cell; the window never sees future rows.
pub fn with_moving_average(
    frame: &DataFrame,
    column: &str,
    window: usize,
    output_column: &str,
) -> FeatureResult<DataFrame> {
    assert!(window > 0, "window size must be positive");
    let values = column_values(frame, column)?;

    let mut averages: Vec<Option<f64>> = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    let mut nulls_in_window = 0usize;

    for (idx, value) in values.iter().enumerate() {
        match value {
            Some(value) => sum += value,
            None => nulls_in_window += 1,
        }
        if idx >= window {
            match values[idx - window] {
                Some(expired) => sum -= expired,
                None => nulls_in_window -= 1,
            }
        }
        if idx + 1 >= window && nulls_in_window == 0 {
            averages.push(Some(sum / window as f64));
        } else {
            averages.push(None);
        }
    }

    let mut enriched = frame.clone();
    enriched.with_column(Series::new(output_column, averages))?;

    log_event(
        file!(),
        "FeatureEnricher",
        "with_moving_average",
        "features.moving_average",
        line!(),
        &format!("Computed {window}-day moving average for {column} -> {output_column}"),
        None,
        None,
    );

    Ok(enriched)
}

/// Append a lag-1 shift of `column`: row i holds the value at row i-1, null
/// at the first row.
pub fn with_lag(frame: &DataFrame, column: &str, output_column: &str) -> FeatureResult<DataFrame> {
    let values = column_values(frame, column)?;

    let mut lagged: Vec<Option<f64>> = Vec::with_capacity(values.len());
    if !values.is_empty() {
        lagged.push(None);
        lagged.extend(values.iter().copied().take(values.len() - 1));
    }

    let mut enriched = frame.clone();
    enriched.with_column(Series::new(output_column, lagged))?;

    log_event(
        file!(),
        "FeatureEnricher",
        "with_lag",
        "features.lag",
        line!(),
        &format!("Computed lag-1 shift for {column} -> {output_column}"),
        None,
        None,
    );

    Ok(enriched)
}

/// Append the rowwise difference `minuend - subtrahend`. A null on either
/// side makes the row null.
pub fn with_difference(
    frame: &DataFrame,
    minuend_column: &str,
    subtrahend_column: &str,
    output_column: &str,
) -> FeatureResult<DataFrame> {
    let minuends = column_values(frame, minuend_column)?;
    let subtrahends = column_values(frame, subtrahend_column)?;

    let differences: Vec<Option<f64>> = minuends
        .iter()
        .zip(subtrahends.iter())
        .map(|(minuend, subtrahend)| match (minuend, subtrahend) {
            (Some(a), Some(b)) => Some(a - b),
            _ => None,
        })
        .collect();

    let mut enriched = frame.clone();
    enriched.with_column(Series::new(output_column, differences))?;

    log_event(
        file!(),
        "FeatureEnricher",
        "with_difference",
        "features.difference",
        line!(),
        &format!(
            "Computed {minuend_column} - {subtrahend_column} -> {output_column}"
        ),
        None,
        None,
    );

    Ok(enriched)
}

/// Append the lag-1 fractional change of `column`: `(x[i] - x[i-1]) / x[i-1]`,
/// null at the first row. A zero prior value makes the division undefined;
/// that single row becomes NaN and the run continues.
pub fn with_pct_change(
    frame: &DataFrame,
    column: &str,
    output_column: &str,
) -> FeatureResult<DataFrame> {
    let values = column_values(frame, column)?;

    let mut changes: Vec<Option<f64>> = Vec::with_capacity(values.len());
    if !values.is_empty() {
        changes.push(None);
    }
    for (idx, window) in values.windows(2).enumerate() {
        let change = match (window[0], window[1]) {
            (Some(prev), Some(current)) => {
                if prev == 0.0 {
                    log_event(
                        file!(),
                        "FeatureEnricher",
                        "with_pct_change",
                        "features.pct_change",
                        line!(),
                        &format!(
                            "Zero prior value for {column} at row {}; emitting NaN in {output_column}",
                            idx + 1
                        ),
                        None,
                        None,
                    );
                    Some(f64::NAN)
                } else {
                    Some((current - prev) / prev)
                }
            }
            _ => None,
        };
        changes.push(change);
    }

    let mut enriched = frame.clone();
    enriched.with_column(Series::new(output_column, changes))?;

    log_event(
        file!(),
        "FeatureEnricher",
        "with_pct_change",
        "features.pct_change",
        line!(),
        &format!("Computed lag-1 fractional change for {column} -> {output_column}"),
        None,
        None,
    );

    Ok(enriched)
}

/// Append the full set of derived columns a charting table carries, in the
/// fixed output order. Existing columns with the same names are overwritten,
/// so enriching an already-enriched table recomputes rather than compounds.
pub fn enrich(frame: &DataFrame) -> FeatureResult<DataFrame> {
    let frame = with_moving_average(frame, "Close", MA_SHORT_WINDOW, "MA50")?;
    let frame = with_moving_average(&frame, "Close", MA_LONG_WINDOW, "MA200")?;
    let frame = with_lag(&frame, "Close", "Previous_Close")?;
    let frame = with_difference(&frame, "Close", "Previous_Close", "Price_Change")?;
    let frame = with_pct_change(&frame, "Close", "Price_Change_Pct")?;
    let frame = with_lag(&frame, "Volume", "Previous_Volume")?;
    let frame = with_difference(&frame, "Volume", "Previous_Volume", "Volume_Change")?;
    with_pct_change(&frame, "Volume", "Volume_Change_Pct")
}
