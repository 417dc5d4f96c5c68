//! # Record Codec
//!
//! Text boundary between `.MDL` block bodies and typed entities. Each entity
//! kind implements [`Record`]: a fixed number of lines per item, a parser and
//! a formatter. `parse_record(format_record(e)) == e` holds for every modeled
//! field, and the opaque `misc` tails are carried byte-for-byte.
//!
//! ## Number formatting
//!
//! - [`norm_float`]: integral values print without a fraction (`250`, not
//!   `250.0`); everything else prints in shortest round-trip form.
//! - [`norm_float_sci`]: like `norm_float`, but very small or very large
//!   coefficients print as `1E-005`.
//!
//! ## Parse state
//!
//! Some kinds (beams, columns, regions, beam loads) are not numbered in the
//! file; their index is the running position in the block or floor. That
//! counter lives in [`ParseContext`], created fresh for every block.

mod design;
mod elset;
mod layout;
mod load;
mod material;
mod node;
mod section;
mod slab;

use std::str::FromStr;

use crate::errors::{ModelError, ModelResult};
use crate::store::{EntityStore, Indexed};

pub use layout::{format_layouts, parse_layouts, LayoutRecord};

/// Block header names.
pub mod headers {
    pub const NODES: &str = "NODEXY";
    pub const MATERIALS: &str = "MATERIAL";
    pub const SECTIONS: &str = "SECTION";
    pub const DESIGNS: &str = "DESIGN";
    pub const ELSETS: &str = "ELSET";
    pub const SLABS: &str = "FLOORSLAB";
    pub const REGIONS: &str = "REGION";
    pub const BEAM_LAYOUTS: &str = "LAYBEAM";
    pub const COLUMN_LAYOUTS: &str = "LAYCOL";
    pub const LOAD_TABLES: &str = "FLOADTAB";
    pub const BEAM_LOADS: &str = "BLOAD";
}

/// Text codec of one entity kind.
pub trait Record: Sized {
    /// Block header the records live under
    const BLOCK: &'static str;
    const LINES_PER_ITEM: usize;

    fn parse_record(lines: &[&str], ctx: &mut ParseContext) -> ModelResult<Self>;
    fn format_record(&self) -> Vec<String>;
}

/// Per-block parse state: where we are, and the running item counter.
#[derive(Debug, Clone)]
pub struct ParseContext {
    block: &'static str,
    line: usize,
    counter: u32,
}

impl ParseContext {
    pub fn new(block: &'static str) -> Self {
        ParseContext {
            block,
            line: 0,
            counter: 0,
        }
    }

    pub fn block(&self) -> &'static str {
        self.block
    }

    /// 1-based line number inside the block body
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn set_line(&mut self, line: usize) {
        self.line = line;
    }

    /// Next implicit item index (1, 2, ...).
    pub fn next_index(&mut self) -> u32 {
        self.counter += 1;
        self.counter
    }

    /// Restart implicit numbering, e.g. at a new floor header.
    pub fn reset_counter(&mut self) {
        self.counter = 0;
    }

    pub fn error(&self, reason: impl Into<String>) -> ModelError {
        ModelError::invalid_record(self.block, self.line, reason)
    }

    /// Parse token `i` of `tokens` as `T`.
    pub fn field<T: FromStr>(&self, tokens: &[&str], i: usize, name: &str) -> ModelResult<T> {
        let raw = tokens
            .get(i)
            .ok_or_else(|| self.error(format!("missing field '{name}' (column {})", i + 1)))?;
        raw.parse::<T>()
            .map_err(|_| self.error(format!("field '{name}' has invalid value '{raw}'")))
    }

    /// Integer flag column read as a boolean.
    pub fn flag(&self, tokens: &[&str], i: usize, name: &str) -> ModelResult<bool> {
        Ok(self.field::<i64>(tokens, i, name)? != 0)
    }

    pub fn text(&self, tokens: &[&str], i: usize, name: &str) -> ModelResult<String> {
        tokens
            .get(i)
            .map(|s| s.to_string())
            .ok_or_else(|| self.error(format!("missing field '{name}' (column {})", i + 1)))
    }
}

/// Split off the first `n` whitespace-separated tokens and return them with
/// the untouched remainder of the line (leading whitespace removed).
pub fn split_leading(line: &str, n: usize) -> (Vec<&str>, &str) {
    let mut tokens = Vec::with_capacity(n);
    let mut rest = line;
    for _ in 0..n {
        let trimmed = rest.trim_start();
        if trimmed.is_empty() {
            rest = trimmed;
            break;
        }
        let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
        tokens.push(&trimmed[..end]);
        rest = &trimmed[end..];
    }
    (tokens, rest.trim_start())
}

/// Integral values without a fraction, everything else in shortest
/// round-trip form.
pub fn norm_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// [`norm_float`], with `1E-005` style exponents outside `[1e-3, 1e4)`.
pub fn norm_float_sci(value: f64) -> String {
    if !value.is_finite() || value.fract() == 0.0 {
        return norm_float(value);
    }
    if value.abs() < 1e-3 || value.abs() >= 1e4 {
        let s = format!("{value:E}");
        if let Some((mantissa, exp)) = s.split_once('E') {
            if let Ok(exp) = exp.parse::<i32>() {
                let sign = if exp < 0 { '-' } else { '+' };
                return format!("{mantissa}E{sign}{:03}", exp.abs());
            }
        }
        return s;
    }
    format!("{value}")
}

/// Fixed-decimal form when it is exact, shortest round-trip form otherwise.
pub fn fixed_or_exact(value: f64, decimals: usize) -> String {
    let fixed = format!("{value:.decimals$}");
    match fixed.parse::<f64>() {
        Ok(parsed) if parsed == value => fixed,
        _ => format!("{value}"),
    }
}

/// Right-align `text` in `width` columns, always leaving a separating space.
pub fn column(text: &str, width: usize) -> String {
    if text.len() >= width {
        format!(" {text}")
    } else {
        format!("{text:>width$}")
    }
}

/// Append an unparsed tail after `sep`. The tail is written as-is; the
/// separator is left out when there is no tail.
pub fn with_tail(mut head: String, sep: &str, tail: &str) -> String {
    if !tail.is_empty() {
        head.push_str(sep);
        head.push_str(tail);
    }
    head
}

/// Parse every item of a block body.
pub fn parse_block<T: Record + Indexed>(body: &[String]) -> ModelResult<EntityStore<T>> {
    let mut ctx = ParseContext::new(T::BLOCK);
    let mut store = EntityStore::new();
    let lines: Vec<&str> = body.iter().map(String::as_str).filter(|l| !l.trim().is_empty()).collect();

    if lines.len() % T::LINES_PER_ITEM != 0 {
        ctx.set_line(lines.len());
        return Err(ctx.error(format!(
            "{} lines is not a multiple of {} lines per record",
            lines.len(),
            T::LINES_PER_ITEM
        )));
    }

    for (chunk_no, chunk) in lines.chunks(T::LINES_PER_ITEM).enumerate() {
        ctx.set_line(chunk_no * T::LINES_PER_ITEM + 1);
        let item = T::parse_record(chunk, &mut ctx)?;
        store.add(item)?;
    }
    Ok(store)
}

/// Format a store in insertion order.
pub fn format_block<T: Record>(store: &EntityStore<T>) -> Vec<String> {
    store.iter().flat_map(Record::format_record).collect()
}
