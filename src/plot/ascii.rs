//! ASCII plotting for terminal output.
//!
//! Fixed-size character grids, optimized for quick visual sanity checks and
//! deterministic output (golden tests).
//!
//! Plots:
//! - folded light curve: observations `o` against phase, with a binned mean
//!   profile drawn as `-`; magnitudes grow downwards (brighter is up)
//! - periodogram: power against frequency as a `-` line, best peak `*`

use crate::spectral::Periodogram;

/// Render a phase-folded light curve.
pub fn render_folded_plot(phase: &[f64], magnitude: &[f64], width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let points: Vec<(f64, f64)> = phase
        .iter()
        .zip(magnitude)
        .filter(|(p, m)| p.is_finite() && m.is_finite())
        .map(|(&p, &m)| (p, m))
        .collect();

    let (m_min, m_max) = value_range(points.iter().map(|p| p.1)).unwrap_or((0.0, 1.0));
    let (m_min, m_max) = pad_range(m_min, m_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];
    let profile = binned_profile(&points, width);
    draw_curve(&mut grid, &profile, 0.0, 1.0, |m| map_y_inverted(m, m_min, m_max, height));

    for &(p, m) in &points {
        let x = map_x(p, 0.0, 1.0, width);
        let y = map_y_inverted(m, m_min, m_max, height);
        grid[y][x] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!("Plot: phase=[0, 1) | magnitude=[{m_min:.3}, {m_max:.3}] (inverted)\n"));
    push_grid(&mut out, grid);
    out
}

/// Render a periodogram with its best peak highlighted.
pub fn render_periodogram(periodogram: &Periodogram, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let curve: Vec<(f64, f64)> = periodogram
        .frequency
        .iter()
        .zip(&periodogram.power)
        .filter(|(f, p)| f.is_finite() && p.is_finite())
        .map(|(&f, &p)| (f, p))
        .collect();
    let (f_min, f_max) = value_range(curve.iter().map(|c| c.0)).unwrap_or((0.0, 1.0));
    let (p_min, p_max) = value_range(curve.iter().map(|c| c.1)).unwrap_or((0.0, 1.0));
    let (p_min, p_max) = pad_range(p_min, p_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];
    // Keep the strongest bin per column so narrow peaks survive downsampling.
    let mut columns: Vec<Option<f64>> = vec![None; width];
    for &(f, p) in &curve {
        let x = map_x(f, f_min, f_max, width);
        columns[x] = Some(columns[x].map_or(p, |q| q.max(p)));
    }
    let profile: Vec<(f64, f64)> = columns
        .iter()
        .enumerate()
        .filter_map(|(x, p)| p.map(|p| (x as f64 / (width as f64 - 1.0), p)))
        .collect();
    draw_curve(&mut grid, &profile, 0.0, 1.0, |p| map_y(p, p_min, p_max, height));

    if let Some(best) = periodogram.best_index() {
        let x = map_x(periodogram.frequency[best], f_min, f_max, width);
        let y = map_y(periodogram.power[best], p_min, p_max, height);
        grid[y][x] = '*';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: frequency=[{f_min:.4}, {f_max:.4}] | power=[{p_min:.3}, {p_max:.3}]\n"
    ));
    push_grid(&mut out, grid);
    out
}

fn push_grid(out: &mut String, grid: Vec<Vec<char>>) {
    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }
}

/// Mean magnitude per phase column, as `(phase, magnitude)` points.
fn binned_profile(points: &[(f64, f64)], width: usize) -> Vec<(f64, f64)> {
    let mut sums = vec![(0.0, 0usize); width];
    for &(p, m) in points {
        let x = map_x(p, 0.0, 1.0, width);
        sums[x].0 += m;
        sums[x].1 += 1;
    }
    sums.iter()
        .enumerate()
        .filter(|(_, (_, n))| *n > 0)
        .map(|(x, (s, n))| (x as f64 / (width as f64 - 1.0), s / *n as f64))
        .collect()
}

fn value_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if lo.is_finite() && hi.is_finite() && hi > lo {
        Some((lo, hi))
    } else if lo.is_finite() && hi.is_finite() {
        Some((lo - 0.5, hi + 0.5))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Magnitude axis: smallest (brightest) value on row 0.
fn map_y_inverted(m: f64, m_min: f64, m_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((m - m_min) / (m_max - m_min)).clamp(0.0, 1.0);
    (u * (height as f64 - 1.0)).round() as usize
}

fn draw_curve(
    grid: &mut [Vec<char>],
    curve: &[(f64, f64)],
    x_min: f64,
    x_max: f64,
    row: impl Fn(f64) -> usize,
) {
    if curve.len() < 2 {
        return;
    }
    let width = grid[0].len();

    let mut prev = None;
    for &(x, y) in curve {
        let col = map_x(x, x_min, x_max, width);
        let r = row(y);
        if let Some((c0, r0)) = prev {
            draw_line(grid, c0, r0, col, r, '-');
        } else {
            grid[r][col] = '-';
        }
        prev = Some((col, r));
    }
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
