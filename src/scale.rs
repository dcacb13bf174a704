//! Quantized color scale and the linear scale used by the legend axis.

use crate::types::EducationRecord;

/// Nine-step sequential blue palette, lightest first.
pub const BLUES: [&str; 9] = [
    "#f7fbff", "#deebf7", "#c6dbef", "#9ecae1", "#6baed6", "#4292c6", "#2171b5", "#08519c",
    "#08306b",
];

/// `[min, max]` of `bachelorsOrHigher` over all records, or `None` when empty.
pub fn attainment_extent(records: &[EducationRecord]) -> Option<(f64, f64)> {
    records.iter().map(|r| r.bachelors_or_higher).fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Maps a continuous domain onto equal-width buckets, one per palette entry.
#[derive(Debug, Clone)]
pub struct QuantizeScale {
    domain: (f64, f64),
    thresholds: Vec<f64>,
    palette: &'static [&'static str],
}

impl QuantizeScale {
    pub fn new(domain: (f64, f64), palette: &'static [&'static str]) -> Self {
        let (x0, x1) = domain;
        // Evaluated in this exact form; threshold values must come out
        // bit-identical to the record values they are compared against.
        let n = palette.len().saturating_sub(1) as f64;
        let thresholds = (0..palette.len().saturating_sub(1))
            .map(|i| {
                let i = i as f64;
                ((i + 1.0) * x1 - (i - n) * x0) / (n + 1.0)
            })
            .collect();
        Self {
            domain,
            thresholds,
            palette,
        }
    }

    pub fn from_records(records: &[EducationRecord]) -> Option<Self> {
        attainment_extent(records).map(|domain| Self::new(domain, &BLUES))
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn palette(&self) -> &'static [&'static str] {
        self.palette
    }

    /// Bucket index for `value`. A value sitting on a threshold belongs to
    /// the upper bucket; out-of-domain values clamp to the end buckets.
    pub fn bucket(&self, value: f64) -> usize {
        let (x0, x1) = self.domain;
        if !value.is_finite() || x0 >= x1 {
            return 0;
        }
        self.thresholds.partition_point(|&t| t <= value)
    }

    pub fn color(&self, value: f64) -> &'static str {
        self.palette[self.bucket(value)]
    }

    /// `[lo, hi)` covered by `color`; the end buckets are bounded by the domain.
    pub fn invert_extent(&self, color: &str) -> Option<(f64, f64)> {
        let i = self.palette.iter().position(|&c| c == color)?;
        let (x0, x1) = self.domain;
        let lo = if i == 0 { x0 } else { self.thresholds[i - 1] };
        let hi = self.thresholds.get(i).copied().unwrap_or(x1);
        Some((lo, hi))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    pub fn apply(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if d0 == d1 {
            return (r0 + r1) / 2.0;
        }
        r0 + (value - d0) / (d1 - d0) * (r1 - r0)
    }

    pub fn ticks(&self, count: usize) -> Vec<f64> {
        ticks(self.domain.0, self.domain.1, count)
    }
}

/// Evenly spaced "nice" values (steps of 1, 2 or 5 times a power of ten)
/// inside `[start, stop]`, aiming for roughly `count` of them.
pub fn ticks(start: f64, stop: f64, count: usize) -> Vec<f64> {
    if count == 0 || !start.is_finite() || !stop.is_finite() {
        return Vec::new();
    }
    if start == stop {
        return vec![start];
    }
    let reverse = stop < start;
    let (lo, hi) = if reverse { (stop, start) } else { (start, stop) };
    let Some((i1, i2, inc)) = tick_spec(lo, hi, count as f64) else {
        return Vec::new();
    };
    if i2 < i1 {
        return Vec::new();
    }
    let mut out: Vec<f64> = (i1..=i2)
        .map(|i| {
            let i = i as f64;
            if inc < 0.0 { i / -inc } else { i * inc }
        })
        .collect();
    if reverse {
        out.reverse();
    }
    out
}

fn tick_spec(start: f64, stop: f64, count: f64) -> Option<(i64, i64, f64)> {
    let e10 = 50f64.sqrt();
    let e5 = 10f64.sqrt();
    let e2 = 2f64.sqrt();

    let step = (stop - start) / count.max(0.0);
    let power = step.log10().floor();
    if !power.is_finite() {
        return None;
    }
    let error = step / 10f64.powf(power);
    let factor = if error >= e10 {
        10.0
    } else if error >= e5 {
        5.0
    } else if error >= e2 {
        2.0
    } else {
        1.0
    };

    let (mut i1, mut i2, inc);
    if power < 0.0 {
        let scale = 10f64.powf(-power) / factor;
        i1 = (start * scale).round() as i64;
        i2 = (stop * scale).round() as i64;
        if (i1 as f64) / scale < start {
            i1 += 1;
        }
        if (i2 as f64) / scale > stop {
            i2 -= 1;
        }
        inc = -scale;
    } else {
        let step = 10f64.powf(power) * factor;
        i1 = (start / step).round() as i64;
        i2 = (stop / step).round() as i64;
        if (i1 as f64) * step < start {
            i1 += 1;
        }
        if (i2 as f64) * step > stop {
            i2 -= 1;
        }
        inc = step;
    }
    if i2 < i1 && (0.5..2.0).contains(&count) {
        return tick_spec(start, stop, count * 2.0);
    }
    Some((i1, i2, inc))
}
