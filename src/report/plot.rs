use crate::aggregate::Series;
use crate::report::style::{Fill, LegendRow, Shape, Style, LEGEND_HEADER};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontStyle;
use std::error::Error;

const MARKER_SIZE: i32 = 6;
const FONT: &str = "sans-serif";

/// Everything needed to draw one chart.
pub struct Chart<'a> {
    pub series: Vec<(&'a Series, Style)>,
    pub legend: Vec<LegendRow>,
    pub max_threads: u32,
    pub global_max: f64,
}

impl Chart<'_> {
    /// Pixel size of the image; the legend table takes a quarter of the width.
    pub fn size(&self) -> (u32, u32) {
        if self.legend.is_empty() {
            (1000, 600)
        } else {
            (1400, 600)
        }
    }

    fn y_max(&self) -> f64 {
        if self.global_max > 0.0 {
            self.global_max * 1.1
        } else {
            1.0
        }
    }
}

fn shape_style(style: &Style) -> ShapeStyle {
    let (r, g, b) = style.color;
    let color = RGBColor(r, g, b);
    match style.fill {
        Fill::Filled => color.filled(),
        Fill::Hollow => color.stroke_width(2),
    }
}

/// Five-pointed star outline around the origin, in pixels.
fn star_points(radius: i32) -> Vec<(i32, i32)> {
    (0..10)
        .map(|i| {
            let r = if i % 2 == 0 { radius as f64 } else { radius as f64 * 0.45 };
            let angle = std::f64::consts::PI * (i as f64) / 5.0 - std::f64::consts::FRAC_PI_2;
            ((r * angle.cos()).round() as i32, (r * angle.sin()).round() as i32)
        })
        .collect()
}

/// Star outline moved to `centre`; `closed` repeats the first vertex for stroking.
fn star_at(centre: (i32, i32), radius: i32, closed: bool) -> Vec<(i32, i32)> {
    let mut points: Vec<(i32, i32)> = star_points(radius)
        .into_iter()
        .map(|(dx, dy)| (centre.0 + dx, centre.1 + dy))
        .collect();
    if closed {
        points.push(points[0]);
    }
    points
}

/// Draws `chart` onto `root` and flushes the backend.
pub fn draw<DB>(root: DrawingArea<DB, Shift>, chart: &Chart<'_>) -> Result<(), Box<dyn Error>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    let (plot_area, table_area) = if chart.legend.is_empty() {
        (root.clone(), None)
    } else {
        let (width, _) = root.dim_in_pixel();
        let (left, right) = root.split_horizontally((width * 3 / 4) as i32);
        (left, Some(right))
    };

    let mut ctx = ChartBuilder::on(&plot_area)
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(0u32..chart.max_threads + 1, 0f64..chart.y_max())?;

    ctx.configure_mesh()
        .x_desc("Number of threads")
        .y_desc("Runtime (s)")
        .axis_desc_style((FONT, 16))
        .label_style((FONT, 13))
        .draw()?;

    for (series, style) in &chart.series {
        let s = shape_style(style);
        let line_color = s.color;
        let points = series.points();

        let label = series.key().to_string();
        ctx.draw_series(LineSeries::new(
            points.iter().map(|p| (p.threads, p.med)),
            line_color.stroke_width(1),
        ))?;

        // Bars are centred on the median and reach up to the max.
        ctx.draw_series(points.iter().map(|p| {
            let half = p.max - p.med;
            ErrorBar::new_vertical(p.threads, p.med - half, p.med, p.max, line_color.stroke_width(1), 8)
        }))?;

        let coords = points.iter().map(|p| (p.threads, p.med));
        let r = MARKER_SIZE;
        match (style.shape, style.fill) {
            (Shape::Circle, _) => {
                ctx.draw_series(coords.map(|c| EmptyElement::at(c) + Circle::new((0, 0), r, s)))?
                    .label(label)
                    .legend(move |(x, y)| Circle::new((x + 10, y), r, s));
            }
            (Shape::Square, _) => {
                ctx.draw_series(coords.map(|c| EmptyElement::at(c) + Rectangle::new([(-r, -r), (r, r)], s)))?
                    .label(label)
                    .legend(move |(x, y)| Rectangle::new([(x + 10 - r, y - r), (x + 10 + r, y + r)], s));
            }
            (Shape::Triangle, _) => {
                ctx.draw_series(coords.map(|c| EmptyElement::at(c) + TriangleMarker::new((0, 0), r + 1, s)))?
                    .label(label)
                    .legend(move |(x, y)| TriangleMarker::new((x + 10, y), r + 1, s));
            }
            (Shape::Star, Fill::Filled) => {
                ctx.draw_series(coords.map(|c| EmptyElement::at(c) + Polygon::new(star_points(r + 2), s)))?
                    .label(label)
                    .legend(move |(x, y)| Polygon::new(star_at((x + 10, y), r + 2, false), s));
            }
            (Shape::Star, Fill::Hollow) => {
                ctx.draw_series(
                    coords.map(|c| EmptyElement::at(c) + PathElement::new(star_at((0, 0), r + 2, true), s)),
                )?
                .label(label)
                .legend(move |(x, y)| PathElement::new(star_at((x + 10, y), r + 2, true), s));
            }
        }
    }

    ctx.configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font((FONT, 13))
        .draw()?;

    if let Some(area) = table_area {
        draw_legend_table(&area, &chart.legend)?;
    }

    root.present()?;
    Ok(())
}

fn draw_legend_table<DB>(area: &DrawingArea<DB, Shift>, rows: &[LegendRow]) -> Result<(), Box<dyn Error>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (width, height) = area.dim_in_pixel();
    let column_width = width as i32 / LEGEND_HEADER.len() as i32;
    let row_height = 40;
    let top = (height as i32 - row_height * (rows.len() as i32 + 1)) / 2;

    let header_font = (FONT, 15).into_font().style(FontStyle::Bold).color(&BLACK);
    for (column, text) in LEGEND_HEADER.iter().enumerate() {
        area.draw(&Text::new(text.to_string(), (column as i32 * column_width + 4, top), header_font.clone()))?;
    }

    for (index, row) in rows.iter().enumerate() {
        let y = top + row_height * (index as i32 + 1);
        let (r, g, b) = row.style.color;
        for (column, text) in row.cells.iter().enumerate() {
            let color = if column == 0 { RGBColor(r, g, b) } else { BLACK };
            let font = (FONT, 15).into_font().color(&color);
            area.draw(&Text::new(text.clone(), (column as i32 * column_width + 4, y), font))?;
        }
    }

    Ok(())
}
