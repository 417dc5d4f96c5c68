use crate::entities::{Region, Slab};
use crate::errors::ModelResult;
use crate::ids::{ElsetRef, NodeRef, SlabRef};

use super::{headers, norm_float, split_leading, with_tail, ParseContext, Record};

impl Record for Slab {
    const BLOCK: &'static str = headers::SLABS;
    const LINES_PER_ITEM: usize = 1;

    fn parse_record(lines: &[&str], ctx: &mut ParseContext) -> ModelResult<Self> {
        let tokens: Vec<&str> = lines[0].split_whitespace().collect();
        Ok(Slab {
            index: ctx.field(&tokens, 0, "index")?,
            name: ctx.text(&tokens, 1, "name")?,
            slab_type: ctx.field(&tokens, 2, "slab_type")?,
            elset: ElsetRef(ctx.field(&tokens, 3, "elset")?),
            thick: ctx.field(&tokens, 4, "thick")?,
            q_dl: ctx.field(&tokens, 5, "qDL")?,
            q_ll: ctx.field(&tokens, 6, "qLL")?,
            weight: ctx.field(&tokens, 7, "weight")?,
            cost: ctx.field(&tokens, 8, "cost")?,
        })
    }

    fn format_record(&self) -> Vec<String> {
        vec![format!(
            "{:>4}  {:<10} {} {:>2} {} {} {} {} {}",
            self.index,
            self.name,
            self.slab_type,
            self.elset,
            norm_float(self.thick),
            norm_float(self.q_dl),
            norm_float(self.q_ll),
            norm_float(self.weight),
            norm_float(self.cost)
        )]
    }
}

/// Leading columns of a region line; the rest is `misc`.
const REGION_COLUMNS: usize = 10;

impl Record for Region {
    const BLOCK: &'static str = headers::REGIONS;
    const LINES_PER_ITEM: usize = 1;

    fn parse_record(lines: &[&str], ctx: &mut ParseContext) -> ModelResult<Self> {
        let (tokens, misc) = split_leading(lines[0], REGION_COLUMNS);
        // edge columns are written as "12," so the separator is dropped
        let edge = |i: usize, name: &str| -> ModelResult<NodeRef> {
            let raw = tokens
                .get(i)
                .ok_or_else(|| ctx.error(format!("missing field '{name}'")))?
                .trim_end_matches(',');
            ctx.field::<u32>(&[raw], 0, name).map(NodeRef)
        };

        let edges = [edge(4, "e1")?, edge(5, "e2")?, edge(6, "e3")?, edge(7, "e4")?];
        let region = Region {
            index: 0,
            floor: ctx.field(&tokens, 0, "floor")?,
            slab: SlabRef(ctx.field(&tokens, 1, "slab")?),
            option: ctx.field(&tokens, 2, "option")?,
            q_dl_add: ctx.field(&tokens, 3, "qDL_add")?,
            edges,
            offset: ctx.field(&tokens, 8, "offset")?,
            q_ll_add: ctx.field(&tokens, 9, "qLL_add")?,
            misc: misc.to_string(),
        };
        Ok(Region {
            index: ctx.next_index(),
            ..region
        })
    }

    fn format_record(&self) -> Vec<String> {
        let [e1, e2, e3, e4] = self.edges;
        let line = format!(
            "   {}  {} {} {}  {:>2}, {:>2}, {:>2}, {:>2} {} {}",
            self.floor,
            self.slab,
            self.option,
            norm_float(self.q_dl_add),
            e1,
            e2,
            e3,
            e4,
            self.offset,
            norm_float(self.q_ll_add),
        );
        vec![with_tail(line, "  ", &self.misc)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::parse_block;
    use crate::store::EntityStore;

    #[test]
    fn test_slab_roundtrip() {
        let line = "   1  S12        1  3 12 0.1 0.25 0 0";
        let slab = Slab::parse_record(&[line], &mut ParseContext::new("FLOORSLAB")).unwrap();
        assert_eq!(slab.elset, ElsetRef(3));
        assert_eq!(slab.q_ll, 0.25);
        assert_eq!(slab.format_record()[0], line);
    }

    #[test]
    fn test_region_numbering_and_misc() {
        let body = vec![
            "   1  2 0 0   5,  6,  9,  8 0 0  1 1 0 0 0".to_string(),
            "   1  2 0 0.05   6,  7, 10,  9 0 0.1".to_string(),
        ];
        let regions: EntityStore<Region> = parse_block(&body).unwrap();
        assert_eq!(regions.index_list(), vec![1, 2]);

        let first = regions.get(1).unwrap();
        assert_eq!(first.edges, [NodeRef(5), NodeRef(6), NodeRef(9), NodeRef(8)]);
        assert_eq!(first.misc, "1 1 0 0 0");
        assert_eq!(first.format_record()[0], body[0]);

        let second = regions.get(2).unwrap();
        assert_eq!(second.misc, "");
        assert_eq!(second.q_ll_add, 0.1);
        assert_eq!(second.format_record()[0], body[1]);
    }

    #[test]
    fn test_region_misc_with_trailing_space() {
        let line = "   1  2 0 0   5,  6,  9,  8 0 0  x ";
        let region = Region::parse_record(&[line], &mut ParseContext::new("REGION")).unwrap();
        assert_eq!(region.misc, "x ");
        assert_eq!(region.format_record()[0], line);
        let written = region.format_record();
        let again = Region::parse_record(&[written[0].as_str()], &mut ParseContext::new("REGION")).unwrap();
        assert_eq!(again, region);
    }
}
