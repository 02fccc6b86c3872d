// SVG chart rendering for the dashboard figures

use std::f64::consts::PI;

use crate::binding::Figure;
use crate::model::{PieSlice, ScatterPoint};

/// Qualitative palette, assigned to labels in first-appearance order.
pub const PALETTE: [&str; 10] = [
    "#636efa", "#EF553B", "#00cc96", "#ab63fa", "#FFA15A", "#19d3f3", "#FF6692", "#B6E880",
    "#FF97FF", "#FECB52",
];

const WIDTH: f64 = 680.0;
const HEIGHT: f64 = 360.0;
const MARGIN: f64 = 50.0;

pub fn escape(text: &str) -> String {
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

pub fn color_for(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

pub fn figure_svg(figure: &Figure) -> String {
    match figure {
        Figure::Pie { title, slices } => pie_svg(title, slices),
        Figure::Scatter {
            title,
            x_label,
            y_label,
            points,
            ..
        } => scatter_svg(title, x_label, y_label, points),
    }
}

fn empty_note() -> String {
    format!(
        r##"<text x="{}" y="{}" text-anchor="middle" font-size="13" fill="#9ca3af">No data</text>"##,
        WIDTH / 2.0,
        HEIGHT / 2.0
    )
}

fn frame(title: &str, body: &str) -> String {
    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}" style="background:white; border-radius:8px">
  <text x="{}" y="24" text-anchor="middle" font-size="16" font-weight="600" fill="#374151">{}</text>
  {}
</svg>"##,
        WIDTH,
        HEIGHT,
        WIDTH,
        HEIGHT,
        WIDTH / 2.0,
        escape(title),
        body
    )
}

/// Pie with one wedge per non-zero slice and a legend with counts and shares.
pub fn pie_svg(title: &str, slices: &[PieSlice]) -> String {
    let total: u64 = slices.iter().map(|s| s.value).sum();
    if total == 0 {
        return frame(title, &empty_note());
    }

    let cx = MARGIN + 140.0;
    let cy = HEIGHT / 2.0 + 10.0;
    let r = 130.0;

    let mut wedges = String::new();
    let mut legend = String::new();
    let mut angle = -PI / 2.0;
    for (i, slice) in slices.iter().enumerate() {
        let color = color_for(i);
        let share = slice.value as f64 / total as f64;
        let ly = MARGIN + 10.0 + i as f64 * 22.0;
        legend.push_str(&format!(
            r##"<rect x="{:.1}" y="{:.1}" width="12" height="12" fill="{}"/><text x="{:.1}" y="{:.1}" font-size="12" fill="#374151">{} ({}, {:.1}%)</text>"##,
            WIDTH - 230.0,
            ly,
            color,
            WIDTH - 212.0,
            ly + 10.0,
            escape(&slice.label),
            slice.value,
            share * 100.0
        ));
        if slice.value == 0 {
            continue;
        }
        if slice.value == total {
            wedges.push_str(&format!(
                r##"<circle cx="{:.1}" cy="{:.1}" r="{:.1}" fill="{}" stroke="white" stroke-width="1"/>"##,
                cx, cy, r, color
            ));
            continue;
        }
        let sweep = share * 2.0 * PI;
        let (x0, y0) = (cx + r * angle.cos(), cy + r * angle.sin());
        let end = angle + sweep;
        let (x1, y1) = (cx + r * end.cos(), cy + r * end.sin());
        let large_arc = if sweep > PI { 1 } else { 0 };
        wedges.push_str(&format!(
            r##"<path d="M {:.2} {:.2} L {:.2} {:.2} A {:.2} {:.2} 0 {} 1 {:.2} {:.2} Z" fill="{}" stroke="white" stroke-width="1"/>"##,
            cx, cy, x0, y0, r, r, large_arc, x1, y1, color
        ));
        angle = end;
    }

    frame(title, &format!("{}\n  {}", wedges, legend))
}

/// Payload mass against outcome, one color per booster category.
pub fn scatter_svg(title: &str, x_label: &str, y_label: &str, points: &[ScatterPoint]) -> String {
    let legend_width = 150.0;
    let plot_w = WIDTH - 2.0 * MARGIN - legend_width;
    let plot_h = HEIGHT - 2.0 * MARGIN;
    let x0 = MARGIN;
    let y_bottom = HEIGHT - MARGIN;

    let axes = format!(
        r##"<line x1="{x0}" y1="{yb}" x2="{x1}" y2="{yb}" stroke="#e5e7eb" stroke-width="2"/>
  <line x1="{x0}" y1="{yt}" x2="{x0}" y2="{yb}" stroke="#e5e7eb" stroke-width="2"/>
  <text x="{xm}" y="{xl}" text-anchor="middle" font-size="12" fill="#6b7280">{xlabel}</text>
  <text x="15" y="{ym}" text-anchor="middle" font-size="12" fill="#6b7280" transform="rotate(-90, 15, {ym})">{ylabel}</text>"##,
        x0 = x0,
        x1 = x0 + plot_w,
        yt = MARGIN,
        yb = y_bottom,
        xm = x0 + plot_w / 2.0,
        xl = HEIGHT - 10.0,
        ym = HEIGHT / 2.0,
        xlabel = escape(x_label),
        ylabel = escape(y_label),
    );

    if points.is_empty() {
        return frame(title, &format!("{}\n  {}", axes, empty_note()));
    }

    let (mut min_x, mut max_x) = points.iter().fold((f64::MAX, f64::MIN), |(lo, hi), p| {
        (lo.min(p.payload_mass_kg), hi.max(p.payload_mass_kg))
    });
    if (max_x - min_x).abs() < f64::EPSILON {
        min_x -= 500.0;
        max_x += 500.0;
    }
    let pad = (max_x - min_x) * 0.05;
    let (min_x, max_x) = (min_x - pad, max_x + pad);
    let sx = |v: f64| x0 + (v - min_x) / (max_x - min_x) * plot_w;
    // outcome 0 sits a quarter up, outcome 1 three quarters up
    let sy = |outcome: u8| y_bottom - (0.25 + 0.5 * outcome as f64) * plot_h;

    let mut categories: Vec<&str> = Vec::new();
    let mut dots = String::new();
    for p in points {
        let idx = match categories.iter().position(|c| *c == p.booster_category) {
            Some(i) => i,
            None => {
                categories.push(&p.booster_category);
                categories.len() - 1
            }
        };
        dots.push_str(&format!(
            r##"<circle cx="{:.1}" cy="{:.1}" r="5" fill="{}" opacity="0.8"><title>{} kg, class {}, {}</title></circle>"##,
            sx(p.payload_mass_kg),
            sy(p.outcome),
            color_for(idx),
            p.payload_mass_kg,
            p.outcome,
            escape(&p.booster_category)
        ));
    }

    let mut ticks = String::new();
    for outcome in [0u8, 1u8] {
        ticks.push_str(&format!(
            r##"<text x="{:.1}" y="{:.1}" text-anchor="end" font-size="11" fill="#6b7280">{}</text>"##,
            x0 - 6.0,
            sy(outcome) + 4.0,
            outcome
        ));
    }
    for i in 0..=4 {
        let v = min_x + (max_x - min_x) * i as f64 / 4.0;
        ticks.push_str(&format!(
            r##"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="11" fill="#6b7280">{:.0}</text>"##,
            sx(v),
            y_bottom + 16.0,
            v
        ));
    }

    let mut legend = String::new();
    for (i, cat) in categories.iter().enumerate() {
        let ly = MARGIN + i as f64 * 20.0;
        legend.push_str(&format!(
            r##"<circle cx="{:.1}" cy="{:.1}" r="5" fill="{}"/><text x="{:.1}" y="{:.1}" font-size="12" fill="#374151">{}</text>"##,
            WIDTH - legend_width + 10.0,
            ly,
            color_for(i),
            WIDTH - legend_width + 20.0,
            ly + 4.0,
            escape(cat)
        ));
    }

    frame(title, &format!("{}\n  {}\n  {}\n  {}", axes, ticks, dots, legend))
}
