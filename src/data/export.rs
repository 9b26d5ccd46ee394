use std::io::Write;
use std::path::Path;

use crate::state::app_state::ChartView;

/// File name for an export of `dataset`, stamped with the local time.
pub fn timestamped_file_name(dataset: &str, extension: &str) -> String {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    format!("{dataset}_{stamp}.{extension}")
}

/// Write the chart view as CSV: x, y, smoothed and (when fitted) trend.
pub fn write_csv<W: Write>(view: &ChartView, writer: W) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["x", "y", "smoothed", "trend"])?;

    let trend = view.trend.as_ref().map(|t| t.fitted_y.as_slice());
    for (i, (x, y)) in view.series.points().enumerate() {
        let smoothed = view.smoothed.get(i).map(|v| v.to_string()).unwrap_or_default();
        let fitted = trend
            .and_then(|t| t.get(i))
            .map(|v| v.to_string())
            .unwrap_or_default();
        wtr.write_record([x.to_string(), y.to_string(), smoothed, fitted])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn export_csv(view: &ChartView, path: &Path) -> Result<(), csv::Error> {
    let file = std::fs::File::create(path)?;
    write_csv(view, file)?;
    tracing::info!("Exported {} rows to {:?}", view.series.len(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::fit::LinearFit;
    use crate::processing::generator::{DatasetKind, Series};
    use crate::processing::statistics::DescriptiveStats;
    use crate::state::app_state::PlotKind;

    fn view(trend: bool) -> ChartView {
        let series = Series::from_columns(vec![0.0, 1.0], vec![1.0, 3.0]).unwrap();
        ChartView {
            dataset: DatasetKind::Linear,
            plot_kind: PlotKind::Line,
            smoothed: vec![2.0, 2.0],
            stats: DescriptiveStats::compute(&[2.0, 2.0]).ok(),
            trend: trend.then(|| LinearFit {
                slope: 0.0,
                intercept: 2.0,
                fitted_y: vec![2.0, 2.0],
            }),
            histogram: None,
            series,
            error: None,
        }
    }

    #[test]
    fn writes_header_and_rows() {
        let mut out = Vec::new();
        write_csv(&view(true), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "x,y,smoothed,trend\n0,1,2,2\n1,3,2,2\n");
    }

    #[test]
    fn trend_column_is_blank_without_fit() {
        let mut out = Vec::new();
        write_csv(&view(false), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.lines().nth(1).unwrap().ends_with("2,"));
    }

    #[test]
    fn file_name_carries_dataset_and_extension() {
        let name = timestamped_file_name("sine", "csv");
        assert!(name.starts_with("sine_"));
        assert!(name.ends_with(".csv"));
    }
}
