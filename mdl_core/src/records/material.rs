use crate::entities::{IsotropicMaterial, Material, MaterialKind, SpringMaterial};
use crate::errors::ModelResult;

use super::{column, fixed_or_exact, headers, norm_float, norm_float_sci, ParseContext, Record};

impl Record for Material {
    const BLOCK: &'static str = headers::MATERIALS;
    const LINES_PER_ITEM: usize = 2;

    fn parse_record(lines: &[&str], ctx: &mut ParseContext) -> ModelResult<Self> {
        let l0: Vec<&str> = lines[0].split_whitespace().collect();
        let l1: Vec<&str> = lines[1].split_whitespace().collect();

        let type_name = ctx.text(&l0, 2, "type")?.to_uppercase();
        let kind = match type_name.as_str() {
            "ISOTROPIC" => MaterialKind::Isotropic(IsotropicMaterial {
                fc1: ctx.field(&l0, 8, "fc1")?,
                time_dependent: ctx.flag(&l0, 9, "time_dependent")?,
                alpha: ctx.field(&l0, 10, "alpha")?,
                beta: ctx.field(&l0, 11, "beta")?,
                thermal_coefficient: ctx.field(&l1, 1, "thermal_coefficient")?,
                unit_weight: ctx.field(&l1, 2, "unit_weight")?,
                elastic_modulus: ctx.field(&l1, 3, "elastic_modulus")?,
                shear_modulus: ctx.field(&l1, 4, "shear_modulus")?,
                poisson_ratio: ctx.field(&l1, 5, "poisson_ratio")?,
            }),
            "SPRING" => MaterialKind::Spring(SpringMaterial {
                stiffness: ctx.field(&l1, 3, "stiffness")?,
                min: ctx.field(&l1, 4, "min")?,
                max: ctx.field(&l1, 5, "max")?,
            }),
            other => return Err(ctx.error(format!("unsupported material type '{other}'"))),
        };

        Ok(Material {
            index: ctx.field(&l0, 0, "index")?,
            type_index: ctx.field(&l0, 1, "type_index")?,
            name: ctx.text(&l0, 3, "name")?,
            misc1: [
                ctx.field(&l0, 4, "misc1")?,
                ctx.field(&l0, 5, "misc1")?,
                ctx.field(&l0, 6, "misc1")?,
                ctx.field(&l0, 7, "misc1")?,
            ],
            misc2: ctx.field(&l1, 0, "misc2")?,
            kind,
        })
    }

    fn format_record(&self) -> Vec<String> {
        let [m0, m1, m2, m3] = self.misc1;
        let head = format!(
            "{:>4}  {} {} {} {} {} {} {}",
            self.index,
            self.type_index,
            self.type_name(),
            self.name,
            m0,
            m1,
            m2,
            m3
        );

        match &self.kind {
            MaterialKind::Isotropic(iso) => vec![
                format!(
                    "{}  {} {}  {}  {}",
                    head,
                    column(&fixed_or_exact(iso.fc1, 2), 7),
                    u8::from(iso.time_dependent),
                    fixed_or_exact(iso.alpha, 3),
                    fixed_or_exact(iso.beta, 3)
                ),
                format!(
                    "{:>7} {} {} {} {} {}",
                    self.misc2,
                    norm_float_sci(iso.thermal_coefficient),
                    norm_float(iso.unit_weight),
                    norm_float(iso.elastic_modulus),
                    norm_float(iso.shear_modulus),
                    norm_float(iso.poisson_ratio)
                ),
            ],
            MaterialKind::Spring(spring) => vec![
                format!("{}  {} 0  0.000  0.000", head, column("0.00", 7)),
                format!(
                    "{:>7} 0 0 {} {} {}",
                    self.misc2,
                    norm_float(spring.stiffness),
                    norm_float(spring.min),
                    norm_float(spring.max)
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(lines: &[String]) -> Material {
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        Material::parse_record(&refs, &mut ParseContext::new("MATERIAL")).unwrap()
    }

    #[test]
    fn test_isotropic_from_file_text() {
        let lines = vec![
            "   1  1 ISOTROPIC fc25 0 0 0 0   254.84 0  0.000  0.000".to_string(),
            "      0 1E-005 0.0024 239761.6 99900.7 0.2".to_string(),
        ];
        let m = parse(&lines);
        assert_eq!(m.name, "fc25");
        assert_eq!(m.fc1(), Some(254.84));
        match &m.kind {
            MaterialKind::Isotropic(iso) => {
                assert_eq!(iso.thermal_coefficient, 1e-5);
                assert_eq!(iso.poisson_ratio, 0.2);
            }
            MaterialKind::Spring(_) => panic!("expected isotropic"),
        }

        let written = m.format_record();
        assert_eq!(written[0], "   1  1 ISOTROPIC fc25 0 0 0 0   254.84 0  0.000  0.000");
        assert_eq!(written[1], "      0 1E-005 0.0024 239761.6 99900.7 0.2");
        assert_eq!(parse(&written), m);
    }

    #[test]
    fn test_spring_keeps_misc_flags() {
        let lines = vec![
            "   2  3 SPRING spr-500 1 2 3 4     0.00 0  0.000  0.000".to_string(),
            "      7 0 0 500 0 0".to_string(),
        ];
        let m = parse(&lines);
        assert_eq!(m.misc1, [1, 2, 3, 4]);
        assert_eq!(m.misc2, 7);
        assert_eq!(parse(&m.format_record()), m);
    }

    #[test]
    fn test_unknown_type_is_invalid_record() {
        let refs = ["   1  2 ORTHO x 0 0 0 0 0 0 0 0", "0 0 0 0 0 0"];
        let err = Material::parse_record(&refs, &mut ParseContext::new("MATERIAL")).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_RECORD");
    }
}
