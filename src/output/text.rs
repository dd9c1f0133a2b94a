//! Plain-text report renderer.
//!
//! Produces one `String` per line:
//!
//! ```text
//! 12 samples, 240ms elapsed
//! app.Main                    total 240ms  own 20ms     app.Main(src/main.rs:10)
//! +- db.Query                 total 160ms  own 140ms    app.db.Query(src/db.rs:42)
//! |  \- io.Socket             total >20ms  own >20ms    app.io.Socket(src/io.rs:7)
//! \- json.Encode              total 60ms   own 60ms     lib.json.Encode
//! ```
//!
//! Connectors are ASCII so the `>` low-confidence marker stays unambiguous.
//! Padding is measured on the plain text; color codes are added afterwards.

use crate::aggregator::{GroupTotals, HotSpot};
use crate::tree::{CallTree, Node};
use crate::utils::config::{DurationFormat, ProfilerConfig, DEFAULT_COLUMN_WIDTH};
use colored::{ColoredString, Colorize};
use std::time::Duration;

/// Marks durations backed by a single sample
pub const LOW_CONFIDENCE_MARKER: char = '>';

/// Presentation settings for the text report
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub format: DurationFormat,
    pub color: bool,

    /// Width the tree and duration columns are padded to
    pub column_width: usize,

    /// Append `symbol(file:line)` after the padded columns
    pub show_location: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            format: DurationFormat::Millis,
            color: false,
            column_width: DEFAULT_COLUMN_WIDTH,
            show_location: true,
        }
    }
}

impl RenderOptions {
    pub fn from_config(config: &ProfilerConfig) -> Self {
        Self {
            format: config.format,
            color: config.color,
            column_width: config.column_width,
            show_location: true,
        }
    }

    pub fn with_format(mut self, format: DurationFormat) -> Self {
        self.format = format;
        self
    }
}

/// One printable piece of a line
struct Segment {
    text: String,
    style: Style,
}

#[derive(Clone, Copy)]
enum Style {
    Plain,
    Connector,
    Name,
    Total,
    Own,
    Location,
}

impl Segment {
    fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    fn width(&self) -> usize {
        self.text.chars().count()
    }

    fn paint(&self, color: bool) -> String {
        if !color {
            return self.text.clone();
        }
        let painted: ColoredString = match self.style {
            Style::Plain => return self.text.clone(),
            Style::Connector => self.text.as_str().bright_black(),
            Style::Name => self.text.as_str().bold(),
            Style::Total => self.text.as_str().yellow(),
            Style::Own => self.text.as_str().green(),
            Style::Location => self.text.as_str().cyan(),
        };
        painted.to_string()
    }
}

/// Join segments, padding the first `padded` of them to `width` visible chars
fn assemble(segments: &[Segment], padded: usize, width: usize, color: bool) -> String {
    let mut line = String::new();
    let mut visible = 0;
    for (i, segment) in segments.iter().enumerate() {
        if i == padded {
            if visible < width {
                line.push_str(&" ".repeat(width - visible));
            }
            line.push_str("  ");
        }
        line.push_str(&segment.paint(color));
        visible += segment.width();
    }
    line.trim_end().to_string()
}

/// Format a duration for the report, with the marker when `low_confidence`
pub fn format_duration(
    tree: &CallTree,
    time: Duration,
    format: DurationFormat,
    low_confidence: bool,
) -> String {
    let value = match format {
        DurationFormat::Millis => format!("{}ms", time.as_millis()),
        DurationFormat::Percent => format!("{:.1}%", tree.percent_of(time)),
    };
    if low_confidence {
        format!("{}{}", LOW_CONFIDENCE_MARKER, value)
    } else {
        value
    }
}

/// Render the tree rows only
///
/// An empty forest renders no rows.
pub fn render_tree(tree: &CallTree, options: &RenderOptions) -> Vec<String> {
    let mut lines = Vec::new();
    for root in tree.roots() {
        render_node(tree, root, "", None, options, &mut lines);
    }
    lines
}

/// `last` is `None` for roots, otherwise whether this is the last sibling
fn render_node(
    tree: &CallTree,
    node: &Node,
    indent: &str,
    last: Option<bool>,
    options: &RenderOptions,
    lines: &mut Vec<String>,
) {
    let low_confidence = node.occurrences() <= 1;
    let connector = match last {
        None => "",
        Some(false) => "+- ",
        Some(true) => "\\- ",
    };

    let mut segments = vec![
        Segment::new(format!("{}{}", indent, connector), Style::Connector),
        Segment::new(node.frame().short_name(), Style::Name),
        Segment::new("  total ", Style::Plain),
        Segment::new(
            format_duration(tree, node.total_time(), options.format, low_confidence),
            Style::Total,
        ),
    ];
    if !node.is_leaf() || !node.own_time().is_zero() {
        segments.push(Segment::new("  own ", Style::Plain));
        segments.push(Segment::new(
            format_duration(tree, node.own_time(), options.format, low_confidence),
            Style::Own,
        ));
    }
    let padded = segments.len();
    if options.show_location {
        segments.push(Segment::new(node.frame().location(), Style::Location));
    }
    lines.push(assemble(&segments, padded, options.column_width, options.color));

    let child_indent = match last {
        None => indent.to_string(),
        Some(false) => format!("{}|  ", indent),
        Some(true) => format!("{}   ", indent),
    };
    let count = node.children().len();
    for (i, child) in node.children().iter().enumerate() {
        render_node(tree, child, &child_indent, Some(i + 1 == count), options, lines);
    }
}

/// Render the full report: header, tree, group totals and hot spots
///
/// Groups that received no time are left out; the section is omitted when
/// none did. The hot spot section is omitted when `hot_spots` is empty.
pub fn render_report(
    tree: &CallTree,
    groups: Option<&GroupTotals>,
    hot_spots: &[HotSpot],
    options: &RenderOptions,
) -> Vec<String> {
    let mut lines = vec![format!(
        "{} samples, {}ms elapsed",
        tree.sample_count(),
        tree.total_time().as_millis()
    )];
    lines.extend(render_tree(tree, options));

    if let Some(groups) = groups {
        let nonzero: Vec<(&str, Duration)> = groups.nonzero().collect();
        if !nonzero.is_empty() {
            lines.push(String::new());
            lines.push("Groups:".to_string());
            let label_width = nonzero.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
            for (label, total) in nonzero {
                let segments = [
                    Segment::new(format!("  {}", label), Style::Name),
                    Segment::new(format_duration(tree, total, options.format, false), Style::Total),
                ];
                lines.push(assemble(&segments, 1, label_width + 2, options.color));
            }
        }
    }

    if !hot_spots.is_empty() {
        lines.push(String::new());
        lines.push("Hot spots:".to_string());
        for spot in hot_spots {
            lines.push(format!(
                "  {:>5.1}%  {:>8}  {}",
                spot.percentage,
                format!("{}ms", spot.own_time.as_millis()),
                spot.symbol
            ));
        }
    }

    lines
}
