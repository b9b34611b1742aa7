use crate::plot::{Color, Figure, HLine, Series, Style};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const FIRST_COLOR: u32 = 0xFF0000;
const SECOND_COLOR: u32 = 0xFFFF00;

/// Pair of horizontal threshold levels drawn over the confidence plot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub first: f64,
    pub second: f64,
}

impl Thresholds {
    /// Parse both levels from user-entered text.
    pub fn parse(first: &str, second: &str) -> Result<Self> {
        let first = parse_level(first).context("first threshold")?;
        let second = parse_level(second).context("second threshold")?;
        Ok(Self { first, second })
    }

    /// Dashed red line for the first level, dotted yellow for the second.
    pub fn lines(&self) -> [HLine; 2] {
        [
            HLine {
                name: "Threshold 1".into(),
                y: self.first,
                style: Style {
                    width: 2.0,
                    dash: Some([8.0, 4.0]),
                    color: Color(FIRST_COLOR),
                },
            },
            HLine {
                name: "Threshold 2".into(),
                y: self.second,
                style: Style {
                    width: 2.0,
                    dash: Some([2.0, 3.0]),
                    color: Color(SECOND_COLOR),
                },
            },
        ]
    }

    /// Replace any reference lines already on `fig` with these thresholds.
    pub fn apply(&self, fig: &mut Figure) {
        fig.series
            .retain(|series| !matches!(series, Series::HLine(_)));
        for line in self.lines() {
            fig.add_series(Series::HLine(line));
        }
    }
}

fn parse_level(text: &str) -> Result<f64> {
    let trimmed = text.trim();
    let value: f64 = trimmed
        .parse()
        .with_context(|| format!("'{}' is not a number", trimmed))?;
    if !value.is_finite() {
        anyhow::bail!("threshold must be finite, got {}", trimmed);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::figure_from_points;

    #[test]
    fn parses_trimmed_numbers() {
        let t = Thresholds::parse(" 80 ", "92.5").unwrap();
        assert_eq!(t, Thresholds { first: 80.0, second: 92.5 });
        assert!(Thresholds::parse("abc", "1").is_err());
        assert!(Thresholds::parse("1", "inf").is_err());
    }

    #[test]
    fn apply_replaces_previous_lines() {
        let mut fig = figure_from_points(None, "confidence", vec![[0.0, 50.0], [1.0, 60.0]], 0x00FFFF);
        Thresholds { first: 70.0, second: 90.0 }.apply(&mut fig);
        Thresholds { first: 75.0, second: 95.0 }.apply(&mut fig);
        let levels: Vec<f64> = fig
            .series
            .iter()
            .filter_map(|s| match s {
                Series::HLine(line) => Some(line.y),
                Series::Line(_) => None,
            })
            .collect();
        assert_eq!(levels, vec![75.0, 95.0]);
        assert_eq!(fig.series.len(), 3);
    }
}
