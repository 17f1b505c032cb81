// External crates
use anyhow::{Context, Result};
use plotters::prelude::*;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

// Internal modules
use crate::constants::{ACCURACY_PLOT_FILE_NAME, HISTORY_FILE_NAME, LOSS_PLOT_FILE_NAME};
use crate::spam::step_6_train_model::TrainingHistory;

/// Write the per-epoch history as `history.csv` in `dir`
///
/// Columns: epoch,loss,accuracy,val_loss,val_accuracy
pub fn write_history_csv(history: &TrainingHistory, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(HISTORY_FILE_NAME);
    let mut file = fs::File::create(&path).context("Failed to create history file")?;

    writeln!(file, "epoch,loss,accuracy,val_loss,val_accuracy")?;
    for epoch in 0..history.epochs() {
        writeln!(
            file,
            "{},{:.6},{:.6},{:.6},{:.6}",
            epoch + 1,
            history.loss[epoch],
            history.accuracy[epoch],
            history.val_loss[epoch],
            history.val_accuracy[epoch],
        )?;
    }
    Ok(path)
}

/// Render loss and accuracy curves as SVG files in `dir`
///
/// # Returns
///
/// Returns the paths of (loss plot, accuracy plot)
pub fn plot_history(history: &TrainingHistory, dir: &Path) -> Result<(PathBuf, PathBuf)> {
    fs::create_dir_all(dir)?;

    let loss_path = dir.join(LOSS_PLOT_FILE_NAME);
    plot_curves(
        &loss_path,
        "Loss per epoch",
        &[("loss", &history.loss), ("val_loss", &history.val_loss)],
    )?;

    let accuracy_path = dir.join(ACCURACY_PLOT_FILE_NAME);
    plot_curves(
        &accuracy_path,
        "Accuracy per epoch",
        &[("acc", &history.accuracy), ("val_acc", &history.val_accuracy)],
    )?;

    Ok((loss_path, accuracy_path))
}

/// Vertical range covering every finite value, padded so flat curves are visible
fn value_range(series: &[(&str, &Vec<f64>)]) -> (f64, f64) {
    let finite = series.iter().flat_map(|(_, values)| values.iter()).copied().filter(|v| v.is_finite());
    let (min, max) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !min.is_finite() {
        return (0.0, 1.0);
    }
    let pad = ((max - min) * 0.05).max(0.01);
    (min - pad, max + pad)
}

fn plot_curves(path: &Path, title: &str, series: &[(&str, &Vec<f64>)]) -> Result<()> {
    let epochs = series.iter().map(|(_, values)| values.len()).max().unwrap_or(0).max(1);
    let (y_min, y_max) = value_range(series);

    let root = SVGBackend::new(path, (800, 480)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(12)
        .x_label_area_size(36)
        .y_label_area_size(56)
        .build_cartesian_2d(1f64..(epochs as f64).max(2.0), y_min..y_max)?;

    chart.configure_mesh().x_desc("epoch").draw()?;

    let colors = [BLUE, RED];
    for (i, (label, values)) in series.iter().enumerate() {
        let color = colors[i % colors.len()];
        chart
            .draw_series(LineSeries::new(
                values
                    .iter()
                    .enumerate()
                    .filter(|(_, v)| v.is_finite())
                    .map(|(epoch, v)| ((epoch + 1) as f64, *v)),
                &color,
            ))?
            .label(*label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present().context("Failed to write plot")?;
    Ok(())
}
