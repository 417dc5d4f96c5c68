use crate::entities::Node;
use crate::errors::ModelResult;

use super::{headers, norm_float, ParseContext, Record};

impl Record for Node {
    const BLOCK: &'static str = headers::NODES;
    const LINES_PER_ITEM: usize = 1;

    fn parse_record(lines: &[&str], ctx: &mut ParseContext) -> ModelResult<Self> {
        let tokens: Vec<&str> = lines[0].split_whitespace().collect();
        Ok(Node {
            index: ctx.field(&tokens, 0, "index")?,
            x: ctx.field(&tokens, 1, "x")?,
            y: ctx.field(&tokens, 2, "y")?,
            z: ctx.field(&tokens, 3, "z")?,
        })
    }

    fn format_record(&self) -> Vec<String> {
        vec![format!(
            "   {}  {} {}  {}",
            self.index,
            norm_float(self.x),
            norm_float(self.y),
            norm_float(self.z)
        )]
    }
}
