use crate::entities::{BeamLoad, FrameLoadTable, LoadDirection};
use crate::errors::ModelResult;
use crate::ids::LoadTableRef;

use super::{headers, norm_float, split_leading, with_tail, ParseContext, Record};

impl Record for FrameLoadTable {
    const BLOCK: &'static str = headers::LOAD_TABLES;
    const LINES_PER_ITEM: usize = 1;

    fn parse_record(lines: &[&str], ctx: &mut ParseContext) -> ModelResult<Self> {
        let (tokens, note) = split_leading(lines[0], 3);
        let code: u32 = ctx.field(&tokens, 1, "load_type")?;
        let direction =
            LoadDirection::from_code(code).ok_or_else(|| ctx.error(format!("unknown load direction {code}")))?;

        let raw_values = tokens
            .get(2)
            .copied()
            .ok_or_else(|| ctx.error("missing field 'values'"))?;
        let values: Vec<&str> = raw_values.split(',').collect();
        if values.len() != 5 {
            return Err(ctx.error(format!("expected q,s1,s2,m1,m2 but found {} values", values.len())));
        }

        Ok(FrameLoadTable {
            index: ctx.field(&tokens, 0, "index")?,
            direction,
            q: ctx.field(&values, 0, "q")?,
            s1: ctx.field(&values, 1, "s1")?,
            s2: ctx.field(&values, 2, "s2")?,
            misc: [
                ctx.field::<f64>(&values, 3, "m1")? as i64,
                ctx.field::<f64>(&values, 4, "m2")? as i64,
            ],
            note: note.to_string(),
        })
    }

    fn format_record(&self) -> Vec<String> {
        let line = format!(
            "{:>5} {:>3}  {},{},{},{},{}",
            self.index,
            self.direction.code(),
            norm_float(self.q),
            norm_float(self.s1),
            norm_float(self.s2),
            self.misc[0],
            self.misc[1],
        );
        vec![with_tail(line, "  ", &self.note)]
    }
}

impl Record for BeamLoad {
    const BLOCK: &'static str = headers::BEAM_LOADS;
    const LINES_PER_ITEM: usize = 1;

    fn parse_record(lines: &[&str], ctx: &mut ParseContext) -> ModelResult<Self> {
        let tokens: Vec<&str> = lines[0].split_whitespace().collect();
        let load_case = ctx.field(&tokens, 0, "load_case")?;
        let floor = ctx.field(&tokens, 1, "floor")?;
        let beam_id = ctx.field(&tokens, 2, "beam_id")?;
        let table = LoadTableRef(ctx.field(&tokens, 3, "load_table")?);
        Ok(BeamLoad {
            index: ctx.next_index(),
            load_case,
            floor,
            beam_id,
            table,
        })
    }

    fn format_record(&self) -> Vec<String> {
        vec![format!(
            "   {}   {} {:>3} {:>3}",
            self.load_case, self.floor, self.beam_id, self.table
        )]
    }
}
