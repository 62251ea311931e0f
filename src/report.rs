//! Text rendering of 2-D value maps.

use std::fmt::Write as _;
use std::io::Write;

use ndarray::Array2;

use crate::error::Result;

/// Consumer of labelled 2-D maps.
pub trait Reporter {
    fn report(&mut self, label: &str, map: &Array2<f64>) -> Result<()>;
}

const SHADES: &[u8] = b" .:-=+*#%@";

/// Writes each map as a shaded character heatmap with the cell values.
pub struct TextHeatmap<W: Write> {
    out: W,
    precision: usize,
}

impl<W: Write> TextHeatmap<W> {
    pub fn new(out: W) -> Self {
        TextHeatmap { out, precision: 3 }
    }

    pub fn precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Reporter for TextHeatmap<W> {
    fn report(&mut self, label: &str, map: &Array2<f64>) -> Result<()> {
        self.out
            .write_all(render_heatmap(label, map, self.precision).as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}

/// Renders `map` under `label`. Each cell is prefixed by a shade character
/// scaled between the map's minimum and maximum.
pub fn render_heatmap(label: &str, map: &Array2<f64>, precision: usize) -> String {
    let min = map.fold(f64::INFINITY, |m, &v| m.min(v));
    let max = map.fold(f64::NEG_INFINITY, |m, &v| m.max(v));
    let range = max - min;
    let width = precision + 4;

    let mut text = String::new();
    let _ = writeln!(text, "{}", label);
    let _ = writeln!(text, "{}", "-".repeat(label.len()));
    for row in map.rows() {
        let cells: Vec<String> = row
            .iter()
            .map(|&v| {
                let level = if range > 0.0 {
                    (((v - min) / range) * (SHADES.len() - 1) as f64).round() as usize
                } else {
                    0
                };
                let shade = SHADES[level.min(SHADES.len() - 1)] as char;
                format!("{}{:>width$.prec$}", shade, v, width = width, prec = precision)
            })
            .collect();
        let _ = writeln!(text, "{}", cells.join(" "));
    }
    text.push('\n');
    text
}
