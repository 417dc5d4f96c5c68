use crate::entities::Elset;
use crate::errors::ModelResult;
use crate::ids::{DesignRef, MaterialRef, SectionRef};

use super::{headers, ParseContext, Record};

impl Record for Elset {
    const BLOCK: &'static str = headers::ELSETS;
    const LINES_PER_ITEM: usize = 1;

    fn parse_record(lines: &[&str], ctx: &mut ParseContext) -> ModelResult<Self> {
        let tokens: Vec<&str> = lines[0].split_whitespace().collect();
        Ok(Elset {
            index: ctx.field(&tokens, 0, "index")?,
            material: MaterialRef(ctx.field(&tokens, 1, "material")?),
            section: SectionRef(ctx.field(&tokens, 2, "section")?),
            design: DesignRef(ctx.field(&tokens, 3, "design")?),
            texture: ctx.field(&tokens, 4, "texture")?,
        })
    }

    fn format_record(&self) -> Vec<String> {
        vec![format!(
            "  {:>2}  {:>2}  {:>2} {:>2}  {}",
            self.index, self.material, self.section, self.design, self.texture
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elset_line() {
        let elset = Elset::parse_record(&["   4   1   4  4  12"], &mut ParseContext::new("ELSET")).unwrap();
        assert_eq!(elset.material, MaterialRef(1));
        assert_eq!(elset.design, DesignRef(4));
        assert_eq!(elset.texture, 12);
        assert_eq!(elset.format_record(), vec!["   4   1   4  4  12".to_string()]);
    }
}
