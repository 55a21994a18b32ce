//! Report charts rendered as self-contained SVG
//!
//! The size chart is an `<img>` carrying a base64 `image/svg+xml` data URI;
//! the risk matrix and the hazard pie are inline `<svg>` markup.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use neo_core::NormalizedAsteroid;

pub const HAZARD_COLOR: &str = "#DC143C";
pub const SAFE_COLOR: &str = "#1BA098";
const TEXT_COLOR: &str = "#1A1A1A";
const GRID_COLOR: &str = "#D0D4D8";
const PLOT_BACKGROUND: &str = "#F8F9FA";
const FONT: &str = "Arial, sans-serif";

/// Renders the three report visuals from normalized asteroids.
///
/// Each method returns an HTML fragment that can be spliced into the
/// narrative document as-is.
pub trait ChartRenderer: Send + Sync {
    /// Stacked size-distribution bars, hazardous vs non-hazardous
    fn size_chart(&self, asteroids: &[NormalizedAsteroid]) -> String;

    /// Miss distance vs velocity scatter; marker size follows diameter
    fn risk_matrix(&self, asteroids: &[NormalizedAsteroid]) -> String;

    /// Hazardous vs non-hazardous donut
    fn hazard_pie(&self, asteroids: &[NormalizedAsteroid]) -> String;
}

/// Fixed size bins, km, lower bound inclusive
const SIZE_BINS: [(f64, f64, &str); 6] = [
    (0.0, 0.05, "Tiny (0-0.05 km)"),
    (0.05, 0.1, "Small (0.05-0.1 km)"),
    (0.1, 0.3, "Medium (0.1-0.3 km)"),
    (0.3, 0.5, "Large (0.3-0.5 km)"),
    (0.5, 1.0, "Very Large (0.5-1.0 km)"),
    (1.0, f64::INFINITY, "Enormous (>1.0 km)"),
];

/// Asteroid counts in one size bin
#[derive(Debug, Clone, PartialEq)]
pub struct SizeBin {
    pub label: &'static str,
    pub min_km: f64,
    pub max_km: f64,
    pub hazardous: usize,
    pub safe: usize,
}

impl SizeBin {
    pub fn total(&self) -> usize {
        self.hazardous + self.safe
    }
}

/// Bin asteroids by maximum km diameter. Empty bins are omitted.
pub fn size_distribution(asteroids: &[NormalizedAsteroid]) -> Vec<SizeBin> {
    SIZE_BINS
        .iter()
        .map(|&(min_km, max_km, label)| {
            let in_bin = asteroids.iter().filter(|a| {
                let d = a.estimated_diameter_km_max;
                min_km <= d && d < max_km
            });
            let (hazardous, safe) = in_bin.fold((0, 0), |(h, s), a| {
                if a.is_potentially_hazardous_asteroid {
                    (h + 1, s)
                } else {
                    (h, s + 1)
                }
            });
            SizeBin {
                label,
                min_km,
                max_km,
                hazardous,
                safe,
            }
        })
        .filter(|bin| bin.total() > 0)
        .collect()
}

/// Escape text for use in SVG/HTML content and attribute values
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Built-in renderer producing dependency-free SVG
#[derive(Debug, Clone, Copy, Default)]
pub struct SvgChartRenderer;

impl SvgChartRenderer {
    /// Raw SVG document for the size chart (before data-URI wrapping)
    pub fn size_chart_svg(&self, asteroids: &[NormalizedAsteroid]) -> String {
        const WIDTH: f64 = 800.0;
        const LABEL_WIDTH: f64 = 210.0;
        const BAR_AREA: f64 = 500.0;
        const ROW: f64 = 48.0;
        const TOP: f64 = 70.0;

        let bins = size_distribution(asteroids);
        let height = TOP + ROW * bins.len().max(1) as f64 + 50.0;
        let max_total = bins.iter().map(SizeBin::total).max().unwrap_or(0).max(1) as f64;
        let scale = BAR_AREA / max_total;

        let mut svg = String::new();
        svg.push_str(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{height}" viewBox="0 0 {WIDTH} {height}" font-family="{FONT}">"#
        ));
        svg.push_str(&format!(
            r#"<rect width="{WIDTH}" height="{height}" fill="white"/>"#
        ));
        svg.push_str(&format!(
            r#"<text x="{}" y="30" text-anchor="middle" font-size="18" font-weight="bold" fill="{TEXT_COLOR}">Asteroid Size Distribution by Category</text>"#,
            WIDTH / 2.0
        ));
        svg.push_str(&legend(WIDTH - 260.0, 48.0));

        if bins.is_empty() {
            svg.push_str(&format!(
                r#"<text x="{}" y="{}" text-anchor="middle" font-size="14" fill="{TEXT_COLOR}">No asteroids to chart</text>"#,
                WIDTH / 2.0,
                TOP + ROW / 2.0
            ));
        }

        for (i, bin) in bins.iter().enumerate() {
            let y = TOP + ROW * i as f64;
            let safe_w = bin.safe as f64 * scale;
            let hazard_w = bin.hazardous as f64 * scale;
            svg.push_str(&format!(
                r#"<text x="{}" y="{}" text-anchor="end" font-size="12" fill="{TEXT_COLOR}">{}</text>"#,
                LABEL_WIDTH - 10.0,
                y + ROW / 2.0 + 4.0,
                escape_xml(bin.label)
            ));
            svg.push_str(&format!(
                r#"<rect x="{LABEL_WIDTH}" y="{}" width="{safe_w:.1}" height="{}" fill="{SAFE_COLOR}"/>"#,
                y + 8.0,
                ROW - 16.0
            ));
            svg.push_str(&format!(
                r#"<rect x="{:.1}" y="{}" width="{hazard_w:.1}" height="{}" fill="{HAZARD_COLOR}"/>"#,
                LABEL_WIDTH + safe_w,
                y + 8.0,
                ROW - 16.0
            ));
            svg.push_str(&format!(
                r#"<text x="{:.1}" y="{}" font-size="12" font-weight="bold" fill="{TEXT_COLOR}">{}</text>"#,
                LABEL_WIDTH + safe_w + hazard_w + 6.0,
                y + ROW / 2.0 + 4.0,
                bin.total()
            ));
        }

        let axis_y = TOP + ROW * bins.len().max(1) as f64 + 30.0;
        svg.push_str(&format!(
            r#"<text x="{}" y="{axis_y}" text-anchor="middle" font-size="13" fill="{TEXT_COLOR}">Number of Asteroids</text>"#,
            LABEL_WIDTH + BAR_AREA / 2.0
        ));
        svg.push_str("</svg>");
        svg
    }
}

impl ChartRenderer for SvgChartRenderer {
    fn size_chart(&self, asteroids: &[NormalizedAsteroid]) -> String {
        let encoded = BASE64.encode(self.size_chart_svg(asteroids));
        format!(
            r#"<img src="data:image/svg+xml;base64,{encoded}" alt="Asteroid size distribution" style="max-width: 100%; height: auto;"/>"#
        )
    }

    fn risk_matrix(&self, asteroids: &[NormalizedAsteroid]) -> String {
        const WIDTH: f64 = 800.0;
        const HEIGHT: f64 = 520.0;
        const LEFT: f64 = 80.0;
        const RIGHT: f64 = 40.0;
        const TOP: f64 = 60.0;
        const BOTTOM: f64 = 70.0;
        const TICKS: usize = 5;

        let points: Vec<RiskPoint> = asteroids
            .iter()
            .filter_map(RiskPoint::from_asteroid)
            .collect();
        let max_x = points.iter().map(|p| p.distance_au).fold(0.0, f64::max);
        let max_y = points.iter().map(|p| p.velocity_km_s).fold(0.0, f64::max);
        let span_x = if max_x > 0.0 { max_x * 1.1 } else { 1.0 };
        let span_y = if max_y > 0.0 { max_y * 1.1 } else { 1.0 };
        let plot_w = WIDTH - LEFT - RIGHT;
        let plot_h = HEIGHT - TOP - BOTTOM;
        let to_x = |v: f64| LEFT + v / span_x * plot_w;
        let to_y = |v: f64| TOP + plot_h - v / span_y * plot_h;

        let mut svg = String::new();
        svg.push_str(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" class="risk-matrix" width="100%" viewBox="0 0 {WIDTH} {HEIGHT}" font-family="{FONT}" role="img" aria-label="Asteroid Risk Assessment Matrix">"#
        ));
        svg.push_str(&format!(
            r#"<rect width="{WIDTH}" height="{HEIGHT}" fill="white"/><rect x="{LEFT}" y="{TOP}" width="{plot_w}" height="{plot_h}" fill="{PLOT_BACKGROUND}"/>"#
        ));
        svg.push_str(&format!(
            r#"<text x="{}" y="32" text-anchor="middle" font-size="18" font-weight="bold" fill="{TEXT_COLOR}">Asteroid Risk Assessment Matrix</text>"#,
            WIDTH / 2.0
        ));

        for i in 0..=TICKS {
            let frac = i as f64 / TICKS as f64;
            let x = LEFT + frac * plot_w;
            let y = TOP + plot_h - frac * plot_h;
            svg.push_str(&format!(
                r#"<line x1="{x:.1}" y1="{TOP}" x2="{x:.1}" y2="{}" stroke="{GRID_COLOR}" stroke-width="1"/>"#,
                TOP + plot_h
            ));
            svg.push_str(&format!(
                r#"<line x1="{LEFT}" y1="{y:.1}" x2="{}" y2="{y:.1}" stroke="{GRID_COLOR}" stroke-width="1"/>"#,
                LEFT + plot_w
            ));
            svg.push_str(&format!(
                r#"<text x="{x:.1}" y="{}" text-anchor="middle" font-size="11" fill="{TEXT_COLOR}">{:.3}</text>"#,
                TOP + plot_h + 18.0,
                frac * span_x
            ));
            svg.push_str(&format!(
                r#"<text x="{}" y="{:.1}" text-anchor="end" font-size="11" fill="{TEXT_COLOR}">{:.1}</text>"#,
                LEFT - 8.0,
                y + 4.0,
                frac * span_y
            ));
        }

        svg.push_str(&format!(
            r#"<text x="{}" y="{}" text-anchor="middle" font-size="13" fill="{TEXT_COLOR}">Miss Distance (AU)</text>"#,
            LEFT + plot_w / 2.0,
            HEIGHT - 20.0
        ));
        svg.push_str(&format!(
            r#"<text x="20" y="{0}" text-anchor="middle" font-size="13" fill="{TEXT_COLOR}" transform="rotate(-90 20 {0})">Relative Velocity (km/s)</text>"#,
            TOP + plot_h / 2.0
        ));

        // Largest first so small markers stay on top.
        let mut ordered: Vec<&RiskPoint> = points.iter().collect();
        ordered.sort_by(|a, b| b.diameter_km.total_cmp(&a.diameter_km));
        for point in ordered {
            let color = if point.hazardous { HAZARD_COLOR } else { SAFE_COLOR };
            let radius = (point.diameter_km * 50.0).clamp(3.0, 40.0);
            svg.push_str(&format!(
                r#"<circle cx="{:.1}" cy="{:.1}" r="{radius:.1}" fill="{color}" fill-opacity="0.7" stroke="white" stroke-width="2"><title>{}</title></circle>"#,
                to_x(point.distance_au),
                to_y(point.velocity_km_s),
                escape_xml(&point.tooltip())
            ));
        }

        svg.push_str(&legend(WIDTH - RIGHT - 240.0, TOP + 12.0));
        svg.push_str("</svg>");
        svg
    }

    fn hazard_pie(&self, asteroids: &[NormalizedAsteroid]) -> String {
        const WIDTH: f64 = 520.0;
        const HEIGHT: f64 = 380.0;
        const CX: f64 = 170.0;
        const CY: f64 = 200.0;
        const OUTER: f64 = 120.0;
        // 40% hole
        const INNER: f64 = OUTER * 0.4;

        let hazardous = asteroids
            .iter()
            .filter(|a| a.is_potentially_hazardous_asteroid)
            .count();
        let safe = asteroids.len() - hazardous;
        let total = asteroids.len();

        let ring = (OUTER + INNER) / 2.0;
        let ring_width = OUTER - INNER;
        let circumference = 2.0 * std::f64::consts::PI * ring;

        let mut svg = String::new();
        svg.push_str(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" class="hazard-pie" width="100%" viewBox="0 0 {WIDTH} {HEIGHT}" font-family="{FONT}" role="img" aria-label="Hazard Classification Distribution">"#
        ));
        svg.push_str(&format!(
            r#"<rect width="{WIDTH}" height="{HEIGHT}" fill="white"/><text x="{}" y="32" text-anchor="middle" font-size="18" font-weight="bold" fill="{TEXT_COLOR}">Hazard Classification Distribution</text>"#,
            WIDTH / 2.0
        ));

        let slices = [
            ("Potentially Hazardous", hazardous, HAZARD_COLOR),
            ("Non-Hazardous", safe, SAFE_COLOR),
        ];
        let mut offset = 0.0;
        for (i, (label, count, color)) in slices.iter().enumerate() {
            let share = if total == 0 {
                0.0
            } else {
                *count as f64 / total as f64
            };
            if share > 0.0 {
                svg.push_str(&format!(
                    r#"<circle cx="{CX}" cy="{CY}" r="{ring}" fill="none" stroke="{color}" stroke-width="{ring_width}" stroke-dasharray="{:.3} {circumference:.3}" stroke-dashoffset="{:.3}" transform="rotate(-90 {CX} {CY})"><title>{label}: {count}</title></circle>"#,
                    share * circumference,
                    -offset * circumference
                ));
            }
            offset += share;

            let legend_y = 150.0 + 40.0 * i as f64;
            svg.push_str(&format!(
                r#"<rect x="330" y="{}" width="16" height="16" fill="{color}"/><text x="354" y="{legend_y}" font-size="14" fill="{TEXT_COLOR}">{label}: {count} ({:.1}%)</text>"#,
                legend_y - 13.0,
                share * 100.0
            ));
        }

        if total == 0 {
            svg.push_str(&format!(
                r#"<circle cx="{CX}" cy="{CY}" r="{ring}" fill="none" stroke="{GRID_COLOR}" stroke-width="{ring_width}"/>"#
            ));
        }
        svg.push_str(&format!(
            r#"<text x="{CX}" y="{}" text-anchor="middle" font-size="22" font-weight="bold" fill="{TEXT_COLOR}">{total}</text>"#,
            CY + 8.0
        ));
        svg.push_str("</svg>");
        svg
    }
}

/// One scatter marker; asteroids with non-finite coordinates are not plotted.
struct RiskPoint {
    name: String,
    distance_au: f64,
    velocity_km_s: f64,
    diameter_km: f64,
    hazardous: bool,
}

impl RiskPoint {
    fn from_asteroid(asteroid: &NormalizedAsteroid) -> Option<Self> {
        let point = Self {
            name: asteroid.name.clone().unwrap_or_else(|| "Unknown".to_string()),
            distance_au: asteroid.miss_distance_au.unwrap_or(0.0),
            velocity_km_s: asteroid.relative_velocity_km_s.unwrap_or(0.0),
            diameter_km: asteroid.estimated_diameter_km_max,
            hazardous: asteroid.is_potentially_hazardous_asteroid,
        };
        let finite = point.distance_au.is_finite()
            && point.velocity_km_s.is_finite()
            && point.diameter_km.is_finite();
        if finite {
            Some(point)
        } else {
            tracing::warn!(asteroid_id = %asteroid.id, "non-finite risk coordinates, not plotted");
            None
        }
    }

    fn tooltip(&self) -> String {
        format!(
            "{}\nDiameter: {:.3} km\nDistance: {:.4} AU\nVelocity: {:.2} km/s",
            self.name, self.diameter_km, self.distance_au, self.velocity_km_s
        )
    }
}

fn legend(x: f64, y: f64) -> String {
    format!(
        r#"<g font-size="12" fill="{TEXT_COLOR}"><rect x="{x}" y="{y}" width="12" height="12" fill="{SAFE_COLOR}"/><text x="{}" y="{}">Non-Hazardous</text><rect x="{}" y="{y}" width="12" height="12" fill="{HAZARD_COLOR}"/><text x="{}" y="{}">Potentially Hazardous</text></g>"#,
        x + 18.0,
        y + 11.0,
        x + 110.0,
        x + 128.0,
        y + 11.0
    )
}
