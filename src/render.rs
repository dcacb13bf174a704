use crate::config::AppConfig;
use crate::legend::{AXIS_OFFSET, TICK_PADDING};
use crate::processing::{Choropleth, CountyShape};
use crate::tooltip;
use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const SVG_FILE: &str = "map.svg";
pub const PAGE_FILE: &str = "index.html";

/// Number formatting that matches JavaScript's `Number#toString`, so
/// `21.4` stays `21.4` and whole numbers carry no `.0`.
pub fn js_number(v: f64) -> String {
    if !v.is_finite() {
        return "0".to_string();
    }
    let v = if v == 0.0 { 0.0 } else { v };
    let mut buf = ryu_js::Buffer::new();
    buf.format_finite(v).to_string()
}

/// Path coordinates keep three fractional digits, rounded half up, with
/// trailing zeros trimmed.
pub fn fmt_path(v: f64) -> String {
    if !v.is_finite() || v.abs() < 0.0005 {
        return "0".to_string();
    }
    let r = (v * 1000.0 + 0.5).floor() / 1000.0;
    let mut s = format!("{r:.3}");
    while s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.pop();
    }
    if s == "-0" { "0".to_string() } else { s }
}

pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn county_path(svg: &mut String, shape: &CountyShape) {
    svg.push_str(r#"<path class="county""#);
    if let Some(fips) = &shape.fips {
        let _ = write!(svg, r#" data-fips="{}""#, escape_xml(&fips.to_string()));
    }
    let _ = write!(
        svg,
        r#" data-education="{}" fill="{}""#,
        js_number(shape.education),
        shape.fill
    );
    if let Some(text) = &shape.tooltip {
        let _ = write!(svg, r#" data-tooltip="{}""#, escape_xml(text));
    }
    if !shape.path.is_empty() {
        let _ = write!(svg, r#" d="{}""#, shape.path);
    }
    svg.push_str("/>\n");
}

pub fn render_svg(map: &Choropleth) -> String {
    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}">"#,
        map.width, map.height
    );

    svg.push_str("<g>\n");
    for shape in &map.shapes {
        county_path(&mut svg, shape);
    }
    svg.push_str("</g>\n");

    let legend = &map.legend;
    let _ = writeln!(
        svg,
        r#"<g id="legend" transform="translate({},{})" fill="none" font-size="10" font-family="sans-serif" text-anchor="middle">"#,
        js_number(legend.x),
        js_number(legend.y)
    );
    let _ = writeln!(
        svg,
        r#"<path class="domain" stroke="currentColor" d="{}"/>"#,
        legend.domain_path()
    );
    for tick in &legend.ticks {
        let _ = writeln!(
            svg,
            r#"<g class="tick" opacity="1" transform="translate({},0)"><line stroke="currentColor" y2="{}"/><text fill="currentColor" y="{}" dy="0.71em">{}</text></g>"#,
            js_number(tick.offset + AXIS_OFFSET),
            js_number(legend.tick_size),
            js_number(legend.tick_size + TICK_PADDING),
            escape_xml(&tick.label)
        );
    }
    for swatch in &legend.swatches {
        let _ = writeln!(
            svg,
            r#"<rect x="{}" width="{}" height="{}" fill="{}" data-min="{}" data-max="{}"/>"#,
            js_number(swatch.x),
            js_number(swatch.width),
            js_number(swatch.height),
            swatch.fill,
            js_number(swatch.extent.0),
            js_number(swatch.extent.1)
        );
    }
    svg.push_str("</g>\n</svg>\n");
    svg
}

/// One enter and one leave handler per county; the script only reads the
/// attributes the generator wrote.
fn hover_script() -> String {
    format!(
        r##"const tooltip = document.getElementById("tooltip");
document.querySelectorAll("#choropleth-map path.county").forEach((county) => {{
  county.addEventListener("mouseover", (event) => {{
    const text = county.getAttribute("data-tooltip");
    if (!text) return;
    tooltip.style.opacity = {opacity};
    tooltip.textContent = text;
    tooltip.setAttribute("data-education", county.getAttribute("data-education"));
    tooltip.style.left = `${{event.pageX + {dx}}}px`;
    tooltip.style.top = `${{event.pageY + {dy}}}px`;
  }});
  county.addEventListener("mouseout", () => {{
    tooltip.style.opacity = 0;
  }});
}});"##,
        opacity = js_number(tooltip::VISIBLE_OPACITY),
        dx = js_number(tooltip::OFFSET_X),
        dy = js_number(tooltip::OFFSET_Y),
    )
}

pub fn render_page(map: &Choropleth, config: &AppConfig) -> String {
    let title = escape_xml(&config.map.title);
    let description = escape_xml(&config.map.description);
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<title>{title}</title>
</head>
<body>
<div class="App">
<h1 id="title">{title}</h1>
<p id="description">{description}</p>
<div id="choropleth-map">
{svg}</div>
<div id="tooltip" style="position: absolute; opacity: 0"></div>
</div>
<script>
{script}
</script>
</body>
</html>
"#,
        svg = render_svg(map),
        script = hover_script(),
    )
}

/// Replaces any previous output so re-rendering never stacks maps.
pub fn write_output(config: &AppConfig, map: &Choropleth) -> Result<Vec<PathBuf>> {
    let dir = &config.output.dir;
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {:?}", dir))?;

    let files = [
        (SVG_FILE, render_svg(map)),
        (PAGE_FILE, render_page(map, config)),
    ];

    let mut written = Vec::with_capacity(files.len());
    for (name, contents) in files {
        let path = dir.join(name);
        remove_previous(&path)?;
        fs::write(&path, contents)
            .with_context(|| format!("Failed to write {:?}", path))?;
        info!(path = ?path, "wrote output");
        written.push(path);
    }
    Ok(written)
}

fn remove_previous(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path)
            .with_context(|| format!("Failed to remove previous output {:?}", path))?;
    }
    Ok(())
}
