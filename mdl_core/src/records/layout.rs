//! Per-floor layout blocks (`LAYBEAM`, `LAYCOL`).
//!
//! ```text
//!   FLOOR BEAM LAYOUT #1, Total Beam = 2
//!     1   2  3  0 1 0 0 0
//!     2   3  3  0 1 0 0 0
//! ```
//!
//! Items are numbered by position within their floor.

use tracing::warn;

use crate::entities::{Beam, Column, Layout, LayoutItem, Layouts};
use crate::errors::ModelResult;
use crate::ids::{ElsetRef, NodeRef};

use super::{headers, split_leading, with_tail, ParseContext, Record};

/// A layout item with a floor sub-header.
pub trait LayoutRecord: Record + LayoutItem {
    /// Sub-header title, e.g. `FLOOR BEAM LAYOUT`
    const TITLE: &'static str;
    /// Count label, e.g. `Total Beam`
    const COUNT_LABEL: &'static str;
}

impl LayoutRecord for Beam {
    const TITLE: &'static str = "FLOOR BEAM LAYOUT";
    const COUNT_LABEL: &'static str = "Total Beam";
}

impl LayoutRecord for Column {
    const TITLE: &'static str = "COLUMN LAYOUT";
    const COUNT_LABEL: &'static str = "Total Column";
}

impl Record for Beam {
    const BLOCK: &'static str = headers::BEAM_LAYOUTS;
    const LINES_PER_ITEM: usize = 1;

    fn parse_record(lines: &[&str], ctx: &mut ParseContext) -> ModelResult<Self> {
        let (tokens, misc) = split_leading(lines[0], 5);
        let start = NodeRef(ctx.field(&tokens, 0, "start")?);
        let end = NodeRef(ctx.field(&tokens, 1, "end")?);
        let elset = ElsetRef(ctx.field(&tokens, 2, "elset")?);
        let group = ctx.field(&tokens, 3, "group")?;
        let beam_type = ctx.field(&tokens, 4, "beam_type")?;
        Ok(Beam {
            index: ctx.next_index(),
            start,
            end,
            elset,
            group,
            beam_type,
            misc: misc.to_string(),
        })
    }

    fn format_record(&self) -> Vec<String> {
        let head = format!(
            "{:>5} {:>3} {:>2} {:>2} {}",
            self.start, self.end, self.elset, self.group, self.beam_type
        );
        vec![with_tail(head, " ", &self.misc)]
    }
}

impl Record for Column {
    const BLOCK: &'static str = headers::COLUMN_LAYOUTS;
    const LINES_PER_ITEM: usize = 1;

    fn parse_record(lines: &[&str], ctx: &mut ParseContext) -> ModelResult<Self> {
        let (tokens, misc) = split_leading(lines[0], 4);
        let location = NodeRef(ctx.field(&tokens, 0, "location")?);
        let elset = ElsetRef(ctx.field(&tokens, 1, "elset")?);
        let group = ctx.field(&tokens, 2, "group")?;
        let alpha = ctx.field(&tokens, 3, "alpha")?;
        Ok(Column {
            index: ctx.next_index(),
            location,
            elset,
            group,
            alpha,
            misc: misc.to_string(),
        })
    }

    fn format_record(&self) -> Vec<String> {
        let head = format!("{:>6}  {:<2} {:>2} {}", self.location, self.elset, self.group, self.alpha);
        vec![with_tail(head, " ", &self.misc)]
    }
}

/// Parse a layout block body into floors.
pub fn parse_layouts<T: LayoutRecord>(body: &[String]) -> ModelResult<Layouts<T>> {
    let mut ctx = ParseContext::new(T::BLOCK);
    let mut layouts = Layouts::new();
    let mut current: Option<(Layout<T>, usize)> = None;

    for (line_no, raw) in body.iter().enumerate() {
        ctx.set_line(line_no + 1);
        let stripped = raw.trim();
        if stripped.is_empty() {
            continue;
        }

        if stripped.starts_with(T::TITLE) {
            if let Some((layout, declared)) = current.take() {
                finish_layout(&mut layouts, layout, declared)?;
            }
            let (floor, declared) = parse_floor_header::<T>(stripped, &ctx)?;
            ctx.reset_counter();
            current = Some((Layout::new(floor), declared));
        } else if stripped.starts_with(|c: char| c.is_ascii_digit()) {
            let (layout, _) = current
                .as_mut()
                .ok_or_else(|| ctx.error(format!("item before any '{}' header", T::TITLE)))?;
            let item = T::parse_record(&[raw.as_str()], &mut ctx)?;
            layout.items.add(item)?;
        } else {
            warn!(block = T::BLOCK, line = line_no + 1, text = stripped, "skipping unrecognized layout line");
        }
    }

    if let Some((layout, declared)) = current.take() {
        finish_layout(&mut layouts, layout, declared)?;
    }
    Ok(layouts)
}

fn finish_layout<T: LayoutRecord>(layouts: &mut Layouts<T>, layout: Layout<T>, declared: usize) -> ModelResult<()> {
    if layout.len() != declared {
        warn!(
            block = T::BLOCK,
            floor = layout.floor,
            declared,
            found = layout.len(),
            "layout header count differs from item count"
        );
    }
    layouts.add(layout)
}

/// `FLOOR BEAM LAYOUT #3, Total Beam = 12` -> (3, 12)
fn parse_floor_header<T: LayoutRecord>(header: &str, ctx: &ParseContext) -> ModelResult<(u32, usize)> {
    let bad = || ctx.error(format!("malformed layout header '{header}'"));
    let (floor_part, count_part) = header.split_once(',').ok_or_else(bad)?;
    let floor = floor_part
        .split_once('#')
        .and_then(|(_, n)| n.trim().parse().ok())
        .ok_or_else(bad)?;
    let count = count_part
        .split_once('=')
        .and_then(|(_, n)| n.trim().parse().ok())
        .ok_or_else(bad)?;
    Ok((floor, count))
}

/// Format floors in insertion order; the item count is recomputed.
pub fn format_layouts<T: LayoutRecord>(layouts: &Layouts<T>) -> Vec<String> {
    let mut lines = Vec::new();
    for layout in layouts {
        lines.push(format!(
            "  {} #{}, {} = {}",
            T::TITLE,
            layout.floor,
            T::COUNT_LABEL,
            layout.len()
        ));
        lines.extend(layout.items.iter().flat_map(Record::format_record));
    }
    lines
}
