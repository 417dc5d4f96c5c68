use tracing::warn;

use crate::config::GeometryConfig;
use crate::entities::{Section, SectionMisc, SectionShape};
use crate::errors::ModelResult;

use super::{column, fixed_or_exact, headers, norm_float, ParseContext, Record};

impl Record for Section {
    const BLOCK: &'static str = headers::SECTIONS;
    const LINES_PER_ITEM: usize = 2;

    fn parse_record(lines: &[&str], ctx: &mut ParseContext) -> ModelResult<Self> {
        let head: Vec<&str> = lines[0].split_whitespace().collect();
        let dims: Vec<&str> = lines[1].split_whitespace().collect();

        let index: u32 = ctx.field(&head, 0, "index")?;
        let type_name = ctx.text(&head, 2, "type")?.to_uppercase();

        let shape = match type_name.as_str() {
            "THICKNESS" => SectionShape::Thickness {
                thickness: ctx.field(&dims, 0, "thickness")?,
            },
            "RECT" => {
                let width: f64 = ctx.field(&dims, 0, "b")?;
                let flange: f64 = ctx.field(&dims, 2, "bf")?;
                if (width - flange).abs() > GeometryConfig::DEFAULT_TOLERANCE {
                    warn!(section = index, b = width, bf = flange, "RECT section width mismatch, keeping b");
                }
                SectionShape::Rect {
                    width,
                    height: ctx.field(&dims, 1, "ht")?,
                    slab_thick: ctx.field(&dims, 3, "tf")?,
                }
            }
            "TEE" => SectionShape::Tee {
                width: ctx.field(&dims, 0, "b")?,
                height: ctx.field(&dims, 1, "ht")?,
                thick_web: ctx.field(&dims, 2, "tw")?,
                thick_flange: ctx.field(&dims, 3, "tf")?,
            },
            "CIRCLE" => SectionShape::Circle {
                diameter: ctx.field(&dims, 0, "d")?,
            },
            "USER" => SectionShape::User {
                steel_section: ctx.text(&dims, 0, "steel_section")?,
                strong_axis: ctx.flag(&dims, 1, "strong_axis")?,
            },
            other => return Err(ctx.error(format!("unsupported section type '{other}'"))),
        };

        Ok(Section {
            index,
            type_index: ctx.field(&head, 1, "type_index")?,
            misc: SectionMisc {
                flags: [
                    ctx.field(&head, 3, "misc")?,
                    ctx.field(&head, 4, "misc")?,
                    ctx.field(&head, 5, "misc")?,
                    ctx.field(&head, 6, "misc")?,
                ],
                values: [ctx.field(&head, 7, "misc")?, ctx.field(&head, 8, "misc")?],
            },
            name: ctx.text(&head, 9, "name")?,
            shape,
        })
    }

    fn format_record(&self) -> Vec<String> {
        let [f0, f1, f2, f3] = self.misc.flags;
        let [v0, v1] = self.misc.values;
        let head = format!(
            "{:>4}{:>4} {:<12} {} {} {} {}{}{} {}",
            self.index,
            self.type_index,
            self.type_name(),
            f0,
            f1,
            f2,
            f3,
            column(&fixed_or_exact(v0, 2), 8),
            column(&fixed_or_exact(v1, 2), 8),
            self.name
        );

        let dims = match &self.shape {
            SectionShape::Thickness { thickness } => norm_float(*thickness),
            SectionShape::Rect {
                width,
                height,
                slab_thick,
            } => format!(
                "{} {} {} {}",
                norm_float(*width),
                norm_float(*height),
                norm_float(*width),
                norm_float(*slab_thick)
            ),
            SectionShape::Tee {
                width,
                height,
                thick_web,
                thick_flange,
            } => format!(
                "{} {} {} {}",
                norm_float(*width),
                norm_float(*height),
                norm_float(*thick_web),
                norm_float(*thick_flange)
            ),
            SectionShape::Circle { diameter } => norm_float(*diameter),
            SectionShape::User {
                steel_section,
                strong_axis,
            } => format!("{} {}", steel_section, u8::from(*strong_axis)),
        };

        vec![head, format!("      {dims}")]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(lines: [&str; 2]) -> Section {
        let section = Section::parse_record(&lines, &mut ParseContext::new("SECTION")).unwrap();
        let written = section.format_record();
        let refs: Vec<&str> = written.iter().map(String::as_str).collect();
        let back = Section::parse_record(&refs, &mut ParseContext::new("SECTION")).unwrap();
        assert_eq!(back, section);
        section
    }

    #[test]
    fn test_rect_writes_width_twice() {
        let section = roundtrip(["   3   2 RECT         0 0 0 0    0.00    0.00 G30X60", "      30 60 30 12"]);
        assert_eq!(
            section.shape,
            SectionShape::Rect {
                width: 30.0,
                height: 60.0,
                slab_thick: 12.0
            }
        );
        assert_eq!(section.format_record()[1], "      30 60 30 12");
        assert_eq!(section.format_record()[0], "   3   2 RECT         0 0 0 0    0.00    0.00 G30X60");
    }

    #[test]
    fn test_user_section_writes_steel_shape() {
        let section = roundtrip(["   7   5 USER         1 0 0 0    0.00    0.00 WF300", "     WF300X150X6.5X9 1"]);
        match &section.shape {
            SectionShape::User {
                steel_section,
                strong_axis,
            } => {
                assert_eq!(steel_section, "WF300X150X6.5X9");
                assert!(*strong_axis);
            }
            other => panic!("unexpected shape {other:?}"),
        }
    }

    #[test]
    fn test_thickness_tee_circle() {
        roundtrip(["   1   1 THICKNESS    0 0 0 0    0.00    0.00 S12", "      12"]);
        roundtrip(["   2   3 TEE          0 0 0 0    1.25    0.00 T40", "      40 80 20 12.5"]);
        let circle = roundtrip(["   4   4 CIRCLE       0 0 0 0    0.00    0.00 C50", "      50"]);
        assert_eq!(circle.misc.values, [0.0, 0.0]);
    }
}
