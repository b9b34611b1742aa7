use serde::{Deserialize, Serialize};

/// Trace colours cycled over stacked channels: green, purple, red, blue, orange.
pub const CHANNEL_PALETTE: [u32; 5] = [0x1C9F47, 0x642EA9, 0xE22E1D, 0x1D6FE2, 0xF49446];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Axis {
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Style {
    pub width: f32,
    pub dash: Option<[f32; 2]>,
    pub color: Color,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub fn rgb(&self) -> (u8, u8, u8) {
        (
            ((self.0 >> 16) & 0xFF) as u8,
            ((self.0 >> 8) & 0xFF) as u8,
            (self.0 & 0xFF) as u8,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub style: Style,
}

/// Horizontal reference line across the whole x range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HLine {
    pub name: String,
    pub y: f64,
    pub style: Style,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Series {
    Line(LineSeries),
    HLine(HLine),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Figure {
    pub title: Option<String>,
    pub x: Axis,
    pub y: Axis,
    pub series: Vec<Series>,
}

impl Figure {
    pub fn new(title: impl Into<Option<String>>) -> Self {
        Self {
            title: title.into(),
            x: Axis { label: None },
            y: Axis { label: None },
            series: Vec::new(),
        }
    }

    pub fn add_series(&mut self, series: Series) {
        self.series.push(series);
    }

    /// `(x_min, x_max, y_min, y_max)` over all line points, or `None` when the
    /// figure has no points.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let mut points = self.series.iter().flat_map(|series| match series {
            Series::Line(line) => line.points.as_slice(),
            Series::HLine(_) => &[][..],
        });
        let first = points.next()?;
        let init = (first[0], first[0], first[1], first[1]);
        Some(points.fold(init, |(x0, x1, y0, y1), p| {
            (x0.min(p[0]), x1.max(p[0]), y0.min(p[1]), y1.max(p[1]))
        }))
    }
}

/// Renders a stack of figures, first figure on top.
pub trait PlotBackend {
    fn draw(&mut self, figures: &[Figure]) -> anyhow::Result<()>;
}

pub fn decimate_points(points: &[[f64; 2]], max_points: usize) -> Vec<[f64; 2]> {
    if points.len() <= max_points {
        return points.to_vec();
    }
    let bucket_size = points.len() as f64 / max_points as f64;
    let mut result = Vec::with_capacity(max_points);
    for i in 0..max_points {
        let start = (i as f64 * bucket_size).floor() as usize;
        if start >= points.len() {
            break;
        }
        let sample = points[start];
        result.push(sample);
    }
    result
}

/// Time/value points for one channel window, x in seconds from the start of
/// the recording.
pub fn window_points(samples: &[f64], offset: usize, fs: f64, max_points: usize) -> Vec<[f64; 2]> {
    let dt = 1.0 / fs.max(1.0);
    let points: Vec<[f64; 2]> = samples
        .iter()
        .enumerate()
        .map(|(i, value)| [(offset + i) as f64 * dt, *value])
        .collect();
    decimate_points(&points, max_points)
}

pub fn figure_from_window(
    name: &str,
    samples: &[f64],
    offset: usize,
    fs: f64,
    max_points: usize,
    color: u32,
) -> Figure {
    let points = window_points(samples, offset, fs, max_points);
    figure_from_points(None, name, points, color)
}

pub fn figure_from_points(
    title: Option<String>,
    name: &str,
    points: Vec<[f64; 2]>,
    color: u32,
) -> Figure {
    let mut fig = Figure::new(title);
    fig.add_series(Series::Line(LineSeries {
        name: name.into(),
        points,
        style: Style {
            width: 1.0,
            dash: None,
            color: Color(color),
        },
    }));
    fig
}

/// Cubic spline through `knots` (x strictly increasing) with not-a-knot end
/// conditions, sampled at `samples` evenly spaced x positions between the
/// first and last knot. Three knots give the parabola through them.
///
/// Fewer than three knots are returned unchanged.
pub fn smooth_points(knots: &[[f64; 2]], samples: usize) -> Vec<[f64; 2]> {
    let n = knots.len();
    if n < 3 || samples < 2 {
        return knots.to_vec();
    }
    let h: Vec<f64> = knots.windows(2).map(|w| w[1][0] - w[0][0]).collect();
    if h.iter().any(|step| *step <= 0.0) {
        return knots.to_vec();
    }
    let Some(m) = second_derivatives(knots, &h) else {
        return knots.to_vec();
    };

    let x0 = knots[0][0];
    let x_end = knots[n - 1][0];
    let dx = (x_end - x0) / (samples - 1) as f64;
    let mut segment = 0;
    let mut out = Vec::with_capacity(samples);
    for k in 0..samples {
        let x = if k == samples - 1 { x_end } else { x0 + k as f64 * dx };
        while segment < n - 2 && x > knots[segment + 1][0] {
            segment += 1;
        }
        let (xl, yl) = (knots[segment][0], knots[segment][1]);
        let (xr, yr) = (knots[segment + 1][0], knots[segment + 1][1]);
        let hs = h[segment];
        let (ml, mr) = (m[segment], m[segment + 1]);
        let y = ml * (xr - x).powi(3) / (6.0 * hs)
            + mr * (x - xl).powi(3) / (6.0 * hs)
            + (yl / hs - ml * hs / 6.0) * (xr - x)
            + (yr / hs - mr * hs / 6.0) * (x - xl);
        out.push([x, y]);
    }
    out
}

/// Second derivative at every knot. Interior rows are the usual continuity
/// equations; the end rows force a continuous third derivative across the
/// second and second-to-last knots.
fn second_derivatives(knots: &[[f64; 2]], h: &[f64]) -> Option<Vec<f64>> {
    let n = knots.len();
    let mut a = vec![vec![0.0; n]; n];
    let mut b = vec![0.0; n];
    for i in 1..n - 1 {
        a[i][i - 1] = h[i - 1];
        a[i][i] = 2.0 * (h[i - 1] + h[i]);
        a[i][i + 1] = h[i];
        b[i] = 6.0
            * ((knots[i + 1][1] - knots[i][1]) / h[i] - (knots[i][1] - knots[i - 1][1]) / h[i - 1]);
    }
    if n == 3 {
        // Both end conditions collapse to one; use a constant second derivative.
        a[0][0] = 1.0;
        a[0][1] = -1.0;
        a[2][1] = -1.0;
        a[2][2] = 1.0;
    } else {
        a[0][0] = h[1];
        a[0][1] = -(h[0] + h[1]);
        a[0][2] = h[0];
        a[n - 1][n - 3] = h[n - 2];
        a[n - 1][n - 2] = -(h[n - 3] + h[n - 2]);
        a[n - 1][n - 1] = h[n - 3];
    }
    solve_linear(a, b)
}

/// Gaussian elimination with partial pivoting; `None` for a singular system.
fn solve_linear(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|&r, &s| a[r][col].abs().total_cmp(&a[s][col].abs()))?;
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);
        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }
    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Some(x)
}
