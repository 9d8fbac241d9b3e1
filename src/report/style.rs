use crate::classifier::{Order, SeriesKey, Tiling};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Circle,
    Square,
    Triangle,
    Star,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    Hollow,
    Filled,
}

/// How a series is drawn. The same key always gets the same style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    pub color: (u8, u8, u8),
    pub shape: Shape,
    pub fill: Fill,
}

impl Style {
    const fn new(color: u32, shape: Shape, fill: Fill) -> Self {
        Style {
            color: ((color >> 16) as u8, (color >> 8) as u8, color as u8),
            shape,
            fill,
        }
    }

    /// Character standing for the marker in text tables.
    pub fn glyph(&self) -> char {
        match (self.shape, self.fill) {
            (Shape::Circle, Fill::Filled) => '●',
            (Shape::Circle, Fill::Hollow) => '○',
            (Shape::Square, Fill::Filled) => '■',
            (Shape::Square, Fill::Hollow) => '□',
            (Shape::Triangle, Fill::Filled) => '▲',
            (Shape::Triangle, Fill::Hollow) => '△',
            (Shape::Star, Fill::Filled) => '★',
            (Shape::Star, Fill::Hollow) => '☆',
        }
    }
}

/// Returns the style of `key`, or `None` for keys that have no marker assigned.
///
/// Block sizes come in pairs sharing a colour and shape; the `i` and `ij` variants of a
/// size use opposite fills.
pub fn style_for(key: &SeriesKey) -> Option<Style> {
    use Fill::*;
    use Shape::*;

    let style = match key {
        SeriesKey::Baseline => Style::new(0x000000, Star, Filled),
        SeriesKey::Block { size, tiling } => {
            let (color, shape, i_fill) = match size {
                4 => (0x880000, Circle, Hollow),
                8 => (0xFF0000, Circle, Filled),
                16 => (0x000088, Square, Hollow),
                32 => (0x0000FF, Square, Filled),
                64 => (0x008800, Triangle, Hollow),
                128 => (0x00FF00, Triangle, Filled),
                _ => return None,
            };
            let fill = match (tiling, i_fill) {
                (Tiling::I, fill) => fill,
                (Tiling::Ij, Hollow) => Filled,
                (Tiling::Ij, Filled) => Hollow,
            };
            Style::new(color, shape, fill)
        }
        SeriesKey::Layout(layout) => match (layout.a, layout.b, layout.c) {
            (Order::Right, Order::Right, Order::Right) => Style::new(0x000000, Circle, Hollow),
            (Order::Right, Order::Right, Order::Left) => Style::new(0x555555, Circle, Filled),
            (Order::Right, Order::Left, Order::Right) => Style::new(0x000088, Square, Hollow),
            (Order::Right, Order::Left, Order::Left) => Style::new(0x0000FF, Square, Filled),
            (Order::Left, Order::Right, Order::Right) => Style::new(0x008800, Triangle, Hollow),
            (Order::Left, Order::Right, Order::Left) => Style::new(0x00FF00, Triangle, Filled),
            (Order::Left, Order::Left, Order::Right) => Style::new(0x880000, Star, Hollow),
            (Order::Left, Order::Left, Order::Left) => Style::new(0xFF0000, Star, Filled),
        },
    };
    Some(style)
}

pub const LEGEND_HEADER: [&str; 4] = ["Marker", "Layout of A", "Layout of B", "Layout of C"];

/// One legend table row: the marker and what it stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegendRow {
    pub style: Style,
    pub cells: [String; 4],
}

/// Legend rows for the layout series among `keys`, in the order given.
pub fn layout_legend<'a, I>(keys: I) -> Vec<LegendRow>
where
    I: IntoIterator<Item = &'a SeriesKey>,
{
    keys.into_iter()
        .filter_map(|key| match key {
            SeriesKey::Layout(layout) => {
                let style = style_for(key)?;
                Some(LegendRow {
                    style,
                    cells: [
                        style.glyph().to_string(),
                        layout.a.to_string(),
                        layout.b.to_string(),
                        layout.c.to_string(),
                    ],
                })
            }
            _ => None,
        })
        .collect()
}
