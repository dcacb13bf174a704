use crate::config::LegendConfig;
use crate::scale::{LinearScale, QuantizeScale};

/// Half-pixel shift that keeps one pixel axis lines crisp.
pub const AXIS_OFFSET: f64 = 0.5;
pub const TICK_PADDING: f64 = 3.0;

#[derive(Debug, Clone, PartialEq)]
pub struct LegendTick {
    pub offset: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Swatch {
    pub x: f64,
    pub width: f64,
    pub height: f64,
    pub fill: &'static str,
    pub extent: (f64, f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Legend {
    pub x: f64,
    pub y: f64,
    pub range: (f64, f64),
    pub tick_size: f64,
    pub ticks: Vec<LegendTick>,
    pub swatches: Vec<Swatch>,
}

impl Legend {
    /// Domain line of a bottom axis: outer ticks at both ends joined along
    /// the top.
    pub fn domain_path(&self) -> String {
        let (r0, r1) = self.range;
        format!(
            "M{},{}V{}H{}V{}",
            r0 + AXIS_OFFSET,
            self.tick_size,
            AXIS_OFFSET,
            r1 + AXIS_OFFSET,
            self.tick_size
        )
    }
}

/// Percent label rounded half up, as in `21%`.
pub fn tick_label(value: f64) -> String {
    let rounded = (value + 0.5).floor();
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{}%", rounded)
}

/// The axis follows a linear scale over the color domain, so tick positions
/// do not line up with bucket edges. Swatches tile the same pixel range, one
/// per palette color.
pub fn build_legend(color: &QuantizeScale, settings: &LegendConfig) -> Legend {
    let axis = LinearScale::new(color.domain(), (0.0, settings.width));

    let ticks = axis
        .ticks(settings.tick_count)
        .into_iter()
        .map(|value| LegendTick {
            offset: axis.apply(value),
            label: tick_label(value),
        })
        .collect();

    let palette = color.palette();
    let swatch_width = settings.width / palette.len() as f64;
    let (d0, d1) = color.domain();
    let swatches = palette
        .iter()
        .enumerate()
        .map(|(i, &fill)| Swatch {
            x: swatch_width * i as f64,
            width: swatch_width,
            height: settings.swatch_height,
            fill,
            extent: color.invert_extent(fill).unwrap_or((d0, d1)),
        })
        .collect();

    Legend {
        x: settings.x,
        y: settings.y,
        range: axis.range(),
        tick_size: settings.tick_size,
        ticks,
        swatches,
    }
}
