//! SVG and PNG output for render nodes.

use std::path::Path;

use anyhow::{Context, Result};
use resvg::usvg;
use tileloop::{RenderNode, Vector2};
use tracing::debug;

const OUTLINE: &str = "#37474f";
const PIPE: &str = "#263238";
const PIPE_MATCHED: &str = "#2e7d32";
const STRAP: &str = "#5d4037";

/// Layout options, in pixels.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    /// Pixels per unit edge.
    pub scale: f64,
    pub padding: f64,
    /// Draw edge connectors as pipes.
    pub connectors: bool,
    /// Overlay the midpoint strapwork of islamic rules.
    pub islamic: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { scale: 60.0, padding: 20.0, connectors: true, islamic: false }
    }
}

fn bounds(nodes: &[RenderNode]) -> (Vector2, Vector2) {
    let mut iter = nodes.iter().flat_map(|n| n.vertices.iter().copied());
    let Some(first) = iter.next() else {
        return (Vector2::new(0.0, 0.0), Vector2::new(1.0, 1.0));
    };
    iter.fold((first, first), |(lo, hi), v| {
        (Vector2::new(lo.x.min(v.x), lo.y.min(v.y)), Vector2::new(hi.x.max(v.x), hi.y.max(v.y)))
    })
}

/// Pixel size of the rendered drawing.
pub fn canvas_size(nodes: &[RenderNode], opts: &RenderOptions) -> (f64, f64) {
    let (lo, hi) = bounds(nodes);
    (
        (hi.x - lo.x) * opts.scale + opts.padding * 2.0,
        (hi.y - lo.y) * opts.scale + opts.padding * 2.0,
    )
}

/// `#rrggbb` for a hue in degrees.
fn hsl_to_hex(hue: f64, saturation: f64, lightness: f64) -> String {
    let h = hue.rem_euclid(360.0) / 60.0;
    let c = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = lightness - c / 2.0;
    let byte = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    format!("#{:02x}{:02x}{:02x}", byte(r), byte(g), byte(b))
}

fn path_data(vertices: &[Vector2]) -> String {
    let mut d = String::new();
    for (i, v) in vertices.iter().enumerate() {
        if i == 0 {
            d.push_str(&format!("M{:.4},{:.4}", v.x, v.y));
        } else {
            d.push_str(&format!(" L{:.4},{:.4}", v.x, v.y));
        }
    }
    d.push_str(" Z");
    d
}

/// Standalone SVG document for a set of tiles.
pub fn nodes_to_svg(nodes: &[RenderNode], opts: &RenderOptions) -> String {
    let (lo, _) = bounds(nodes);
    let (width, height) = canvas_size(nodes, opts);
    let tx = opts.padding - lo.x * opts.scale;
    let ty = opts.padding - lo.y * opts.scale;

    let mut svg = String::new();
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w:.0}" height="{h:.0}" viewBox="0 0 {w:.0} {h:.0}">
<rect width="100%" height="100%" fill="white"/>
<g transform="translate({tx:.3}, {ty:.3}) scale({s})">
"#,
        w = width.ceil(),
        h = height.ceil(),
        s = opts.scale,
    ));

    svg.push_str(&format!(r#"<g stroke="{OUTLINE}" stroke-width="0.02" stroke-linejoin="round">"#));
    svg.push('\n');
    for node in nodes {
        if node.vertices.len() < 3 {
            continue;
        }
        svg.push_str(&format!(
            "<path id=\"{}\" d=\"{}\" fill=\"{}\"/>\n",
            node.id,
            path_data(&node.vertices),
            hsl_to_hex(node.hue, 0.55, 0.78)
        ));
    }
    svg.push_str("</g>\n");

    if opts.islamic {
        svg.push_str(&format!(r#"<g stroke="{STRAP}" stroke-width="0.05" fill="none">"#));
        svg.push('\n');
        for node in nodes {
            let midpoints: Vec<Vector2> = node.edges.iter().map(|e| e.position).collect();
            if midpoints.len() >= 3 {
                svg.push_str(&format!("<path d=\"{}\"/>\n", path_data(&midpoints)));
            }
        }
        svg.push_str("</g>\n");
    }

    if opts.connectors {
        svg.push_str(r#"<g stroke-linecap="round" fill="none">"#);
        svg.push('\n');
        for node in nodes {
            let live: Vec<_> = node.edges.iter().filter(|e| e.weight > 0).collect();
            for edge in &live {
                let color = if edge.matched { PIPE_MATCHED } else { PIPE };
                let width = if edge.weight >= 2 { 0.16 } else { 0.08 };
                svg.push_str(&format!(
                    "<line x1=\"{:.4}\" y1=\"{:.4}\" x2=\"{:.4}\" y2=\"{:.4}\" stroke=\"{color}\" stroke-width=\"{width}\"/>\n",
                    node.centroid.x, node.centroid.y, edge.position.x, edge.position.y
                ));
            }
            // Dead end
            if live.len() == 1 {
                svg.push_str(&format!(
                    "<circle cx=\"{:.4}\" cy=\"{:.4}\" r=\"0.12\" fill=\"{PIPE}\"/>\n",
                    node.centroid.x, node.centroid.y
                ));
            }
        }
        svg.push_str("</g>\n");
    }

    svg.push_str("</g>\n</svg>\n");
    svg
}

/// Rasterize an SVG document and save it as PNG.
pub fn write_png(svg: &str, path: &Path) -> Result<()> {
    let tree = usvg::Tree::from_str(svg, &usvg::Options::default())
        .context("failed to parse rendered SVG")?;
    let size = tree.size().to_int_size();
    let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height())
        .context("rendered image has zero size")?;
    pixmap.fill(tiny_skia::Color::WHITE);
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

    let image = image::RgbaImage::from_raw(size.width(), size.height(), pixmap.take())
        .context("pixel buffer does not match image size")?;
    image.save(path).with_context(|| format!("failed to write {}", path.display()))?;
    debug!(path = %path.display(), width = size.width(), height = size.height(), "png written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tileloop::{Config, TilingGenerator};

    #[test]
    fn primary_hues() {
        assert_eq!(hsl_to_hex(0.0, 1.0, 0.5), "#ff0000");
        assert_eq!(hsl_to_hex(120.0, 1.0, 0.5), "#00ff00");
        assert_eq!(hsl_to_hex(240.0, 1.0, 0.5), "#0000ff");
        assert_eq!(hsl_to_hex(360.0, 0.0, 1.0), "#ffffff");
    }

    #[test]
    fn svg_has_one_path_per_tile() {
        let tiling = TilingGenerator::new(Config::with_steps(1))
            .generate("4-4-0,4/r90/m(v2)")
            .expect("square rule");
        let nodes = tiling.render_nodes(&Config::default().color);
        let svg = nodes_to_svg(&nodes, &RenderOptions::default());
        assert!(svg.starts_with("<svg"));
        assert_eq!(svg.matches("<path").count(), nodes.len());
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn islamic_overlay_adds_strapwork() {
        let tiling = TilingGenerator::new(Config::with_steps(1))
            .generate("6/r60/r(h1)")
            .expect("hexagonal rule");
        let nodes = tiling.render_nodes(&Config::default().color);
        let plain = RenderOptions { connectors: false, ..Default::default() };
        let islamic = RenderOptions { islamic: true, ..plain };
        let extra = nodes_to_svg(&nodes, &islamic).matches("<path").count()
            - nodes_to_svg(&nodes, &plain).matches("<path").count();
        assert_eq!(extra, nodes.len());
    }

    #[test]
    fn empty_input_still_renders() {
        let svg = nodes_to_svg(&[], &RenderOptions { connectors: false, ..Default::default() });
        assert!(svg.contains("viewBox"));
        assert!(!svg.contains("<path"));
    }
}
