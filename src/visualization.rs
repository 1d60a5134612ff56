//! Visualization utilities for evolved routes.
//!
//! Generates SVG drawings of a route on a 2-D map of the locations and line
//! charts of a run's history (best/mean fitness, genotypic diversity).

use std::fs::File;
use std::io::Write;
use std::path::Path;
#[cfg(not(feature = "resvg"))]
use std::process::Command;

#[cfg(feature = "resvg")]
use resvg::tiny_skia::{Pixmap, Transform};
#[cfg(feature = "resvg")]
use resvg::usvg::{self, TreeParsing};
#[cfg(feature = "resvg")]
use resvg::{render, FitTo};

use crate::error::{Error, Result};
use crate::instance::{LocationSet, RouteProblem};
use crate::solution::GenerationRecord;

/// Map positions of the Hallownest areas
const HALLOWNEST_LAYOUT: [(&str, f64, f64); 10] = [
    ("D", 0.0, 0.0),
    ("FC", 1.0, 2.0),
    ("G", 3.0, 3.0),
    ("QS", 4.0, 1.0),
    ("QG", 6.0, 2.0),
    ("CS", 7.0, 4.0),
    ("KS", 9.0, 0.0),
    ("RG", 5.0, 6.0),
    ("DV", 2.0, 7.0),
    ("SN", 8.0, 5.0),
];

/// Coordinates for every location: the Hallownest map when every label is
/// known, otherwise evenly spaced on a circle with home first.
pub fn layout(locations: &LocationSet) -> Vec<(f64, f64)> {
    let known: Option<Vec<(f64, f64)>> = locations
        .labels()
        .iter()
        .map(|label| {
            HALLOWNEST_LAYOUT
                .iter()
                .find(|(name, _, _)| name == label)
                .map(|&(_, x, y)| (x, y))
        })
        .collect();

    known.unwrap_or_else(|| {
        let n = locations.len();
        let home = locations.home();
        (0..n)
            .map(|i| {
                let slot = (i + n - home) % n;
                let angle = 2.0 * std::f64::consts::PI * slot as f64 / n as f64;
                (angle.cos(), angle.sin())
            })
            .collect()
    })
}

/// SVG visualization generator
pub struct Visualizer {
    /// Canvas width
    pub width: f64,
    /// Canvas height
    pub height: f64,
    /// Margin
    pub margin: f64,
    /// Node radius
    pub node_radius: f64,
}

impl Default for Visualizer {
    fn default() -> Self {
        Visualizer {
            width: 800.0,
            height: 800.0,
            margin: 50.0,
            node_radius: 10.0,
        }
    }
}

impl Visualizer {
    pub fn new() -> Self {
        Self::default()
    }

    fn header(width: f64, height: f64, style: &str) -> String {
        format!(
            r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">
<style>
{style}
    .label {{ font-family: Arial; font-size: 12px; fill: #2c3e50; }}
    .title {{ font-family: Arial; font-size: 14px; fill: #2c3e50; font-weight: bold; }}
</style>
<rect width="100%" height="100%" fill="#ecf0f1"/>
"##,
            w = width,
            h = height,
            style = style
        )
    }

    /// Draw `route` on the location map
    pub fn generate_route_svg(&self, problem: &RouteProblem, route: &[usize]) -> String {
        let locations = problem.locations();
        let points = layout(locations);
        let evaluation = problem.evaluate(route);

        let (min_x, max_x, min_y, max_y) = bounds(&points);
        let scale_x = (self.width - 2.0 * self.margin) / (max_x - min_x).max(1e-9);
        let scale_y = (self.height - 2.0 * self.margin) / (max_y - min_y).max(1e-9);
        let scale = scale_x.min(scale_y);
        let transform = |(x, y): (f64, f64)| -> (f64, f64) {
            (
                self.margin + (x - min_x) * scale,
                self.height - self.margin - (y - min_y) * scale,
            )
        };

        let mut svg = Self::header(
            self.width,
            self.height,
            r##"    .node { fill: #3498db; stroke: #2c3e50; stroke-width: 2; }
    .home { fill: #e74c3c; stroke: #c0392b; stroke-width: 2; }
    .special { fill: #9b59b6; stroke: #8e44ad; stroke-width: 2; }
    .gain { stroke: #27ae60; stroke-width: 2; fill: none; }
    .loss { stroke: #c0392b; stroke-width: 2; fill: none; stroke-dasharray: 6,4; }"##,
        );

        svg.push_str(
            r##"<defs>
<marker id="arrow" markerWidth="10" markerHeight="10" refX="9" refY="3" orient="auto" markerUnits="strokeWidth">
<path d="M0,0 L0,6 L9,3 z" fill="#34495e"/>
</marker>
</defs>
"##,
        );

        svg.push_str(&format!(
            r##"<text x="{}" y="25" class="title">{} | Fitness: {} | Shortcut: {} | Valid: {}</text>
"##,
            self.margin,
            problem.name,
            evaluation.score,
            evaluation.took_shortcut,
            problem.is_valid(route)
        ));

        for pair in route.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            if from >= points.len() || to >= points.len() {
                continue;
            }
            let (x1, y1) = transform(points[from]);
            let (x2, y2) = transform(points[to]);
            let class = if problem.matrix.get(from, to) < 0 { "loss" } else { "gain" };
            svg.push_str(&format!(
                r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" class="{}" marker-end="url(#arrow)"/>
"#,
                x1, y1, x2, y2, class
            ));
        }

        for (i, &point) in points.iter().enumerate() {
            let (x, y) = transform(point);
            let class = if i == locations.home() {
                "home"
            } else if problem.rules.special == Some(i) {
                "special"
            } else {
                "node"
            };

            svg.push_str(&format!(
                r##"<circle cx="{:.2}" cy="{:.2}" r="{}" class="{}"/>
<text x="{:.2}" y="{:.2}" class="label" text-anchor="middle">{}</text>
"##,
                x,
                y,
                self.node_radius,
                class,
                x,
                y - self.node_radius - 4.0,
                locations.label(i)
            ));
        }

        svg.push_str("</svg>");
        svg
    }

    /// Best and mean fitness per generation
    pub fn generate_fitness_history_svg(&self, history: &[GenerationRecord]) -> String {
        let best: Vec<f64> = history.iter().map(|r| r.best_fitness as f64).collect();
        let mean: Vec<f64> = history.iter().map(|r| r.mean_fitness).collect();
        self.line_chart(
            "Fitness per Generation",
            &[("best", "#27ae60", best), ("mean", "#3498db", mean)],
        )
    }

    /// Genotypic diversity per generation
    pub fn generate_diversity_svg(&self, history: &[GenerationRecord]) -> String {
        let diversity: Vec<f64> = history.iter().map(|r| r.genotypic_diversity).collect();
        self.line_chart("Genotypic Diversity per Generation", &[("diversity", "#8e44ad", diversity)])
    }

    fn line_chart(&self, title: &str, series: &[(&str, &str, Vec<f64>)]) -> String {
        let width = self.width;
        let height = 400.0;
        let margin = self.margin;

        let mut svg = Self::header(
            width,
            height,
            r##"    .axis { stroke: #2c3e50; stroke-width: 1; }"##,
        );
        svg.push_str(&format!(
            r#"<text x="{}" y="25" class="title">{}</text>
"#,
            margin, title
        ));

        let plot_width = width - 2.0 * margin;
        let plot_height = height - 2.0 * margin;
        svg.push_str(&format!(
            r##"<line x1="{m}" y1="{b}" x2="{r}" y2="{b}" class="axis"/>
<line x1="{m}" y1="{m}" x2="{m}" y2="{b}" class="axis"/>
"##,
            m = margin,
            b = height - margin,
            r = width - margin
        ));

        let values = series.iter().flat_map(|(_, _, v)| v.iter().copied());
        let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
        if !lo.is_finite() {
            svg.push_str("</svg>");
            return svg;
        }
        let span = (hi - lo).max(1e-9);
        let points = series.iter().map(|(_, _, v)| v.len()).max().unwrap_or(0);
        let x_scale = plot_width / (points.saturating_sub(1)).max(1) as f64;

        svg.push_str(&format!(
            r#"<text x="{:.2}" y="{:.2}" class="label" text-anchor="end">{:.1}</text>
<text x="{:.2}" y="{:.2}" class="label" text-anchor="end">{:.1}</text>
"#,
            margin - 5.0,
            margin + 4.0,
            hi,
            margin - 5.0,
            height - margin + 4.0,
            lo
        ));

        for (k, (name, color, data)) in series.iter().enumerate() {
            let path: Vec<String> = data
                .iter()
                .enumerate()
                .map(|(i, &v)| {
                    let x = margin + i as f64 * x_scale;
                    let y = height - margin - (v - lo) / span * plot_height;
                    format!("{}{:.2} {:.2}", if i == 0 { "M " } else { " L " }, x, y)
                })
                .collect();

            svg.push_str(&format!(
                r##"<path d="{}" stroke="{}" stroke-width="2" fill="none"/>
<rect x="{:.2}" y="{:.2}" width="12" height="12" fill="{}"/>
<text x="{:.2}" y="{:.2}" class="label">{}</text>
"##,
                path.concat(),
                color,
                width - margin - 110.0,
                margin + 20.0 * k as f64,
                color,
                width - margin - 92.0,
                margin + 20.0 * k as f64 + 11.0,
                name
            ));
        }

        svg.push_str("</svg>");
        svg
    }

    /// Save SVG to file
    pub fn save_svg<P: AsRef<Path>>(&self, svg: &str, path: P) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(svg.as_bytes())?;
        Ok(())
    }

    /// Save SVG as PNG with resvg when the feature is enabled,
    /// otherwise through `rsvg-convert` if it is installed.
    pub fn save_png<P: AsRef<Path>>(&self, svg: &str, path: P) -> Result<()> {
        #[cfg(feature = "resvg")]
        {
            self.render_png(svg, path.as_ref())
        }
        #[cfg(not(feature = "resvg"))]
        {
            self.convert_png(svg, path.as_ref())
        }
    }

    #[cfg(feature = "resvg")]
    fn render_png(&self, svg: &str, path: &Path) -> Result<()> {
        let opt = usvg::Options::default();
        let tree = usvg::Tree::from_str(svg, &opt).map_err(|e| io_error(format!("usvg parse error: {}", e)))?;
        let (w, h) = svg_size(svg).unwrap_or((self.width as u32, self.height as u32));
        let mut pixmap = Pixmap::new(w.max(1), h.max(1)).ok_or_else(|| io_error("failed to create pixmap".to_string()))?;
        render(&tree, FitTo::Original, Transform::default(), pixmap.as_mut())
            .ok_or_else(|| io_error("resvg render failed".to_string()))?;
        pixmap
            .save_png(path)
            .map_err(|e| io_error(format!("save_png failed: {}", e)))?;
        Ok(())
    }

    #[cfg(not(feature = "resvg"))]
    fn convert_png(&self, svg: &str, path: &Path) -> Result<()> {
        let tmp_svg = path.with_extension("svg.tmp");
        std::fs::write(&tmp_svg, svg)?;

        let status = Command::new("rsvg-convert")
            .arg("-o")
            .arg(path)
            .arg(&tmp_svg)
            .status();
        let _ = std::fs::remove_file(&tmp_svg);

        match status {
            Ok(status) if status.success() => Ok(()),
            _ => Err(io_error(
                "no SVG->PNG converter succeeded (build with --features resvg or install rsvg-convert)".to_string(),
            )),
        }
    }
}

fn io_error(message: String) -> Error {
    Error::Io(std::io::Error::new(std::io::ErrorKind::Other, message))
}

/// Width and height attributes of the root element
#[cfg_attr(not(feature = "resvg"), allow(dead_code))]
fn svg_size(svg: &str) -> Option<(u32, u32)> {
    let attr = |name: &str| -> Option<u32> {
        let (_, rest) = svg.split_once(&format!(" {}=\"", name))?;
        let (value, _) = rest.split_once('"')?;
        value.parse::<f64>().ok().map(|v| v as u32)
    };
    Some((attr("width")?, attr("height")?))
}

/// Get coordinate bounds
fn bounds(points: &[(f64, f64)]) -> (f64, f64, f64, f64) {
    points.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY),
        |(min_x, max_x, min_y, max_y), &(x, y)| (min_x.min(x), max_x.max(x), min_y.min(y), max_y.max(y)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::{CostMatrix, MatrixGenerator};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn create_test_problem() -> RouteProblem {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let matrix = MatrixGenerator::default()
            .generate(&LocationSet::hallownest(), &mut rng)
            .unwrap();
        RouteProblem::hallownest(matrix).unwrap()
    }

    fn record(generation: usize, best: i64, mean: f64) -> GenerationRecord {
        GenerationRecord {
            generation,
            best_route: vec![0, 1, 2, 0],
            best_fitness: best,
            mean_fitness: mean,
            genotypic_diversity: 5.0 - generation as f64,
            phenotypic_diversity: 1.0,
        }
    }

    #[test]
    fn test_hallownest_layout() {
        let set = LocationSet::hallownest();
        let points = layout(&set);
        assert_eq!(points[set.index_of("D").unwrap()], (0.0, 0.0));
        assert_eq!(points[set.index_of("KS").unwrap()], (9.0, 0.0));
    }

    #[test]
    fn test_circular_layout_fallback() {
        let set = LocationSet::new(vec!["A", "H", "B", "C"], "H").unwrap();
        let points = layout(&set);
        assert_eq!(points.len(), 4);
        // home sits at angle zero
        assert!((points[1].0 - 1.0).abs() < 1e-12 && points[1].1.abs() < 1e-12);
    }

    #[test]
    fn test_route_svg() {
        let problem = create_test_problem();
        let route = problem
            .route_from_labels(&["D", "G", "FC", "CS", "QG", "KS", "DV", "SN", "QS", "RG", "D"])
            .unwrap();
        let svg = Visualizer::new().generate_route_svg(&problem, &route);
        assert!(svg.starts_with("<?xml"));
        assert!(svg.ends_with("</svg>"));
        assert_eq!(svg.matches("<line").count(), 10);
        assert!(svg.contains(">RG</text>"));
        assert!(svg.contains("class=\"special\""));
    }

    #[test]
    fn test_custom_route_svg() {
        let set = LocationSet::new(vec!["H", "A", "B"], "H").unwrap();
        let matrix = CostMatrix::new(set, vec![vec![0, -1, 2], vec![3, 0, 4], vec![5, 6, 0]]).unwrap();
        let problem = RouteProblem::unconstrained("tiny", matrix).unwrap();
        let svg = Visualizer::new().generate_route_svg(&problem, &[0, 1, 2, 0]);
        assert!(svg.contains("class=\"loss\""));
        assert!(svg.contains("tiny"));
    }

    #[test]
    fn test_history_charts() {
        let history: Vec<GenerationRecord> = (0..5).map(|g| record(g, 100 + g as i64 * 10, 50.0)).collect();
        let viz = Visualizer::new();

        let fitness = viz.generate_fitness_history_svg(&history);
        assert_eq!(fitness.matches("<path d=\"M ").count(), 2);
        assert!(fitness.contains("Fitness per Generation"));

        let diversity = viz.generate_diversity_svg(&history);
        assert_eq!(diversity.matches("<path d=\"M ").count(), 1);

        let empty = viz.generate_fitness_history_svg(&[]);
        assert!(empty.ends_with("</svg>"));
    }

    #[test]
    fn test_svg_size_and_save() {
        let viz = Visualizer::new();
        let svg = viz.generate_diversity_svg(&[record(0, 1, 1.0)]);
        assert_eq!(svg_size(&svg), Some((800, 400)));

        let path = std::env::temp_dir().join(format!("geo-route-ga-{}-chart.svg", std::process::id()));
        viz.save_svg(&svg, &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(written, svg);
    }
}
