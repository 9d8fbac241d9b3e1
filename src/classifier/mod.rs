//! Maps benchmark names to the series they belong to.
//!
//! Two benchmark families are supported. The cache-blocking benchmark names its
//! variants `Cache Blocked i<size>`, `Cache Blocked ij<size>` and `No Cache Blocking`.
//! The layout benchmark names them after the storage order of the three matrices,
//! e.g. `Ar_Bl_Cr` for a row-major A, column-major B and row-major C.

use crate::parser::OutputParser;
use std::fmt;
use std::str::FromStr;

const BASELINE_NAME: &str = "No Cache Blocking";
const BLOCKED_TAG: &str = "Cache Blocked";
const BLOCK_PREFIX: &str = "Block size ";

/// Which loops of the product are tiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tiling {
    /// Only the `i` loop, written `Block size <n>`.
    I,
    /// Both `i` and `j` loops, written `Block size <n>x<n>`.
    Ij,
}

/// Storage order of one matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Order {
    /// Row-major (`LayoutRight`).
    Right,
    /// Column-major (`LayoutLeft`).
    Left,
}

impl Order {
    fn from_tag(tag: u8) -> Option<Order> {
        match tag {
            b'r' => Some(Order::Right),
            b'l' => Some(Order::Left),
            _ => None,
        }
    }

    fn tag(self) -> char {
        match self {
            Order::Right => 'r',
            Order::Left => 'l',
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Order::Right => f.write_str("Right"),
            Order::Left => f.write_str("Left"),
        }
    }
}

/// Storage orders of the operands of `C = alpha * A * B + beta * C`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Layout {
    pub a: Order,
    pub b: Order,
    pub c: Order,
}

impl Layout {
    /// All eight combinations, row-major first.
    pub fn all() -> impl Iterator<Item = Layout> {
        let orders = [Order::Right, Order::Left];
        orders.into_iter().flat_map(move |a| {
            orders
                .into_iter()
                .flat_map(move |b| orders.into_iter().map(move |c| Layout { a, b, c }))
        })
    }

    /// Decodes a token such as `Ar_Bl_Cr`.
    pub fn from_token(token: &str) -> Option<Layout> {
        match token.as_bytes() {
            [b'A', a, b'_', b'B', b, b'_', b'C', c] => Some(Layout {
                a: Order::from_tag(*a)?,
                b: Order::from_tag(*b)?,
                c: Order::from_tag(*c)?,
            }),
            _ => None,
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A{}_B{}_C{}", self.a.tag(), self.b.tag(), self.c.tag())
    }
}

/// Canonical identity of a benchmark variant across thread counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SeriesKey {
    /// The untiled reference product.
    Baseline,
    Block { size: u32, tiling: Tiling },
    Layout(Layout),
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeriesKey::Baseline => f.write_str(BASELINE_NAME),
            SeriesKey::Block { size, tiling: Tiling::I } => write!(f, "{}{}", BLOCK_PREFIX, size),
            SeriesKey::Block { size, tiling: Tiling::Ij } => {
                write!(f, "{}{}x{}", BLOCK_PREFIX, size, size)
            }
            SeriesKey::Layout(layout) => fmt::Display::fmt(layout, f),
        }
    }
}

/// Error returned when text is not the canonical form of a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidKey(pub String);

impl fmt::Display for InvalidKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a series name", self.0)
    }
}

impl std::error::Error for InvalidKey {}

impl FromStr for SeriesKey {
    type Err = InvalidKey;

    /// Parses the text written by `Display`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == BASELINE_NAME {
            return Ok(SeriesKey::Baseline);
        }
        if let Some(layout) = Layout::from_token(s) {
            return Ok(SeriesKey::Layout(layout));
        }
        let invalid = || InvalidKey(s.to_string());
        let size_text = s.strip_prefix(BLOCK_PREFIX).ok_or_else(invalid)?;
        match size_text.split_once('x') {
            None => Ok(SeriesKey::Block { size: parse_size(size_text).ok_or_else(invalid)?, tiling: Tiling::I }),
            Some((rows, cols)) if rows == cols => Ok(SeriesKey::Block {
                size: parse_size(rows).ok_or_else(invalid)?,
                tiling: Tiling::Ij,
            }),
            Some(_) => Err(invalid()),
        }
    }
}

fn parse_size(digits: &str) -> Option<u32> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().filter(|&size| size > 0)
}

/// A name that matched none of the rules of a convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unrecognized(pub String);

/// Naming scheme of the benchmark being swept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingConvention {
    CacheBlocking,
    Layout,
}

impl NamingConvention {
    /// Maps a raw benchmark name to its series, or reports it as unrecognized.
    pub fn classify(&self, name: &str) -> Result<SeriesKey, Unrecognized> {
        let key = match self {
            NamingConvention::CacheBlocking => classify_cache_blocking(name),
            NamingConvention::Layout => Layout::from_token(name).map(SeriesKey::Layout),
        };
        key.ok_or_else(|| Unrecognized(name.to_string()))
    }

    /// Whether `key` is one this convention can produce.
    pub fn accepts(&self, key: &SeriesKey) -> bool {
        match self {
            NamingConvention::CacheBlocking => matches!(key, SeriesKey::Baseline | SeriesKey::Block { .. }),
            NamingConvention::Layout => matches!(key, SeriesKey::Layout(_)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            NamingConvention::CacheBlocking => "cache-blocking",
            NamingConvention::Layout => "layout",
        }
    }

    /// Parser matching the output of benchmarks using this convention.
    pub fn parser(&self) -> OutputParser {
        match self {
            NamingConvention::CacheBlocking => OutputParser::new(),
            NamingConvention::Layout => OutputParser::with_prefixes(["Ar_", "Al_"]),
        }
    }
}

fn classify_cache_blocking(name: &str) -> Option<SeriesKey> {
    if name.contains(BASELINE_NAME) {
        return Some(SeriesKey::Baseline);
    }

    let (_, rest) = name.split_once(BLOCKED_TAG)?;
    let rest = rest.trim_start();
    let (tiling, rest) = match rest.strip_prefix("ij") {
        Some(rest) => (Tiling::Ij, rest),
        None => (Tiling::I, rest.strip_prefix('i')?),
    };
    let size = parse_size(rest.trim_start_matches(|c: char| c == ',' || c.is_whitespace()))?;

    Some(SeriesKey::Block { size, tiling })
}
