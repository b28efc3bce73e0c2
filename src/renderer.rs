//! Attack tree drawing.
//!
//! The renderer turns a laid-out [`AttackGraph`] into an SVG document:
//! dashed blue edges, filled nodes and the formatted label of each threat.
//! SVG keeps the drawing sharp at any zoom level.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::config::Config;
use crate::errors::{AttackTreeError, AttackTreeResult};
use crate::graph::AttackGraph;
use crate::layout::Layout;

const CANVAS_WIDTH: f64 = 1600.0;
const CANVAS_HEIGHT: f64 = 1200.0;
/// Share of the data range left empty around the drawing
const MARGIN: f64 = 0.08;
const NODE_RADIUS: f64 = 63.0;
const NODE_COLOR: &str = "#1f78b4";
const EDGE_COLOR: &str = "blue";
const EDGE_WIDTH: f64 = 6.0;
const EDGE_OPACITY: f64 = 0.5;

/// Draws an attack graph and saves the drawing.
pub trait Renderer {
    /// Produce the full document for `graph` at the positions of `layout`.
    fn render(&self, graph: &AttackGraph, layout: &Layout) -> AttackTreeResult<String>;

    /// Write a rendered document to `path`.
    fn save(&self, document: &str, path: &Path) -> AttackTreeResult<()> {
        let file = File::create(path).map_err(|e| AttackTreeError::io(e, path.to_path_buf()))?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(document.as_bytes())
            .map_err(|e| AttackTreeError::io(e, path.to_path_buf()))?;
        writer
            .flush()
            .map_err(|e| AttackTreeError::io(e, path.to_path_buf()))?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SvgRenderer {
    width: f64,
    height: f64,
    font_family: String,
    font_size: u32,
}

impl SvgRenderer {
    pub fn new(font_family: impl Into<String>, font_size: u32) -> Self {
        Self {
            width: CANVAS_WIDTH,
            height: CANVAS_HEIGHT,
            font_family: font_family.into(),
            font_size,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.font_family.clone(), config.font_size)
    }

    /// Map a layout coordinate to canvas pixels (y grows downwards).
    fn to_canvas(&self, point: [f64; 2], bounds: &Bounds) -> (f64, f64) {
        let x = (point[0] - bounds.min_x) / bounds.span_x() * self.width;
        let y = (bounds.max_y - point[1]) / bounds.span_y() * self.height;
        (x, y)
    }
}

impl Renderer for SvgRenderer {
    fn render(&self, graph: &AttackGraph, layout: &Layout) -> AttackTreeResult<String> {
        if layout.len() != graph.node_count() {
            return Err(AttackTreeError::Render(format!(
                "layout has {} positions for {} nodes",
                layout.len(),
                graph.node_count()
            )));
        }

        let bounds = Bounds::around(layout.positions());
        let mut points = Vec::with_capacity(graph.node_count());
        for idx in graph.graph.node_indices() {
            let position = layout
                .position(idx)
                .ok_or_else(|| AttackTreeError::Render(format!("node {} has no position", idx.index())))?;
            points.push(self.to_canvas(position, &bounds));
        }

        let title = graph
            .graph
            .node_indices()
            .next()
            .map(|idx| escape_xml(&graph.graph[idx].label))
            .unwrap_or_default();

        let mut edges = String::new();
        for edge in graph.graph.edge_indices() {
            if let Some((a, b)) = graph.graph.edge_endpoints(edge) {
                let (x1, y1) = points[a.index()];
                let (x2, y2) = points[b.index()];
                edges.push_str(&format!(
                    r#"    <line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="{}" stroke-width="{}" stroke-opacity="{}" stroke-dasharray="22.2,9.6"/>
"#,
                    x1, y1, x2, y2, EDGE_COLOR, EDGE_WIDTH, EDGE_OPACITY
                ));
            }
        }

        let mut nodes = String::new();
        let mut labels = String::new();
        for idx in graph.graph.node_indices() {
            let (x, y) = points[idx.index()];
            let vertex = &graph.graph[idx];
            nodes.push_str(&format!(
                r#"    <circle id="threat-{}" cx="{:.2}" cy="{:.2}" r="{}" fill="{}"/>
"#,
                vertex.id, x, y, NODE_RADIUS, NODE_COLOR
            ));
            labels.push_str(&format!(
                r#"    <text x="{:.2}" y="{:.2}" text-anchor="middle" dominant-baseline="central">{}</text>
"#,
                x,
                y,
                escape_xml(&vertex.label)
            ));
        }

        Ok(format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>
<svg xmlns="http://www.w3.org/2000/svg" version="1.1" width="{w}pt" height="{h}pt" viewBox="0 0 {w} {h}">
  <title>{title}</title>
  <g id="edges">
{edges}  </g>
  <g id="nodes">
{nodes}  </g>
  <g id="labels" font-family="{font_family}" font-size="{font_size}">
{labels}  </g>
</svg>
"#,
            w = self.width,
            h = self.height,
            title = title,
            edges = edges,
            nodes = nodes,
            font_family = escape_xml(&self.font_family),
            font_size = self.font_size,
            labels = labels,
        ))
    }
}

/// Data-space rectangle shown on the canvas, margins included.
struct Bounds {
    min_x: f64,
    max_x: f64,
    min_y: f64,
    max_y: f64,
}

impl Bounds {
    fn around(points: &[[f64; 2]]) -> Self {
        let (mut min_x, mut max_x, mut min_y, mut max_y) =
            (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY);
        for p in points {
            min_x = min_x.min(p[0]);
            max_x = max_x.max(p[0]);
            min_y = min_y.min(p[1]);
            max_y = max_y.max(p[1]);
        }
        if points.is_empty() {
            (min_x, max_x, min_y, max_y) = (-1.0, 1.0, -1.0, 1.0);
        }

        // A single node (or a flat row) still needs a visible range
        let pad_x = ((max_x - min_x) * MARGIN).max(MARGIN);
        let pad_y = ((max_y - min_y) * MARGIN).max(MARGIN);
        Self {
            min_x: min_x - pad_x,
            max_x: max_x + pad_x,
            min_y: min_y - pad_y,
            max_y: max_y + pad_y,
        }
    }

    fn span_x(&self) -> f64 {
        self.max_x - self.min_x
    }

    fn span_y(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Escape text for use inside SVG elements and attributes.
pub fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeRole;
    use crate::layout::spring_layout;

    fn sample_graph() -> AttackGraph {
        let mut graph = AttackGraph::new();
        graph
            .add_threat(1, "Business threats: £4800(39%)".to_string(), NodeRole::Root)
            .unwrap();
        graph
            .add_threat(6, "PC's unavailability: £3000(50%)".to_string(), NodeRole::Branch)
            .unwrap();
        graph
            .add_threat(2, "Spoofed <identities> & co: £1800(27%)".to_string(), NodeRole::Branch)
            .unwrap();
        graph.add_edge(1, 6).unwrap();
        graph.add_edge(1, 2).unwrap();
        graph
    }

    #[test]
    fn test_render_contains_every_node_and_edge() {
        let graph = sample_graph();
        let layout = spring_layout(&graph, 7);
        let svg = SvgRenderer::new("sans-serif", 6).render(&graph, &layout).unwrap();

        assert!(svg.starts_with("<?xml"));
        assert_eq!(svg.matches("<circle").count(), 3);
        assert_eq!(svg.matches("<line").count(), 2);
        assert_eq!(svg.matches("<text").count(), 3);
        assert!(svg.contains(r#"id="threat-6""#));
        assert!(svg.contains(r#"font-family="sans-serif" font-size="6""#));
        assert!(svg.contains("stroke-dasharray"));
    }

    #[test]
    fn test_labels_are_escaped() {
        let graph = sample_graph();
        let layout = spring_layout(&graph, 7);
        let svg = SvgRenderer::new("sans-serif", 6).render(&graph, &layout).unwrap();

        assert!(svg.contains("PC&apos;s unavailability: £3000(50%)"));
        assert!(svg.contains("Spoofed &lt;identities&gt; &amp; co"));
        assert!(!svg.contains("<identities>"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let graph = sample_graph();
        let renderer = SvgRenderer::new("sans-serif", 6);
        let a = renderer.render(&graph, &spring_layout(&graph, 7)).unwrap();
        let b = renderer.render(&graph, &spring_layout(&graph, 7)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_layout_mismatch() {
        let graph = sample_graph();
        let layout = spring_layout(&AttackGraph::new(), 7);
        let result = SvgRenderer::new("sans-serif", 6).render(&graph, &layout);
        assert!(matches!(result, Err(AttackTreeError::Render(_))));
    }

    #[test]
    fn test_save_to_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("tree.svg");
        let err = SvgRenderer::new("sans-serif", 6).save("<svg/>", &path).unwrap_err();
        assert!(matches!(err, AttackTreeError::Io { path: Some(_), .. }));
    }

    #[test]
    fn test_save_writes_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tree.svg");
        SvgRenderer::new("sans-serif", 6).save("<svg/>", &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<svg/>");
    }
}
