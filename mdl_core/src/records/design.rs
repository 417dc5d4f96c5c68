//! Design records: a header line, a factor line, and a `CONCRETE =` or
//! `STEEL =` line whose layout depends on the variant.

use crate::entities::{ConcreteShape, Design, DesignFactors, DesignKind, ReinforcedConcrete, SteelFrame};
use crate::errors::ModelResult;

use super::{headers, norm_float, ParseContext, Record};

impl Record for Design {
    const BLOCK: &'static str = headers::DESIGNS;
    const LINES_PER_ITEM: usize = 3;

    fn parse_record(lines: &[&str], ctx: &mut ParseContext) -> ModelResult<Self> {
        let l0: Vec<&str> = lines[0].split_whitespace().collect();
        let l1: Vec<&str> = lines[1].split_whitespace().collect();
        let l2: Vec<&str> = lines[2].split_whitespace().collect();

        let type_name = ctx.text(&l0, 2, "type")?.to_uppercase();

        let mut factors = [0.0; DesignFactors::COUNT];
        for (i, slot) in factors.iter_mut().enumerate() {
            *slot = ctx.field(&l1, i, "factor")?;
        }

        let kind = if type_name == "STEEL_FRAME" {
            DesignKind::SteelFrame(parse_steel(&l2, ctx)?)
        } else {
            let mut dims = [0.0; 4];
            for (i, slot) in dims.iter_mut().enumerate() {
                *slot = ctx.field(&l2, 2 + i, "dimension")?;
            }
            let shape = ConcreteShape::from_dimensions(&type_name, dims)
                .ok_or_else(|| ctx.error(format!("unsupported design type '{type_name}'")))?;
            DesignKind::Concrete {
                shape,
                cv: ctx.field(&l2, 6, "cv")?,
                reinforcement: parse_reinforcement(&l2, ctx)?,
            }
        };

        Ok(Design {
            index: ctx.field(&l0, 0, "index")?,
            type_index: ctx.field(&l0, 1, "type_index")?,
            name: ctx.text(&l0, 3, "name")?,
            function_index: ctx.field(&l0, 4, "function_index")?,
            structure_type: ctx.field(&l0, 5, "structure_type")?,
            design_code: ctx.field(&l0, 6, "design_code")?,
            compute_k: ctx.flag(&l0, 7, "compute_k")?,
            show_detail: ctx.flag(&l0, 8, "show_detail")?,
            show_diagram: ctx.flag(&l0, 9, "show_diagram")?,
            use_global_load_factor: ctx.flag(&l0, 10, "use_global_load_factor")?,
            factors: DesignFactors::from_array(factors),
            kind,
        })
    }

    fn format_record(&self) -> Vec<String> {
        let head = format!(
            "{:>4}{:>4} {:<12} {} {} {} {} {} {} {} {}",
            self.index,
            self.type_index,
            self.type_name(),
            self.name,
            self.function_index,
            self.structure_type,
            self.design_code,
            u8::from(self.compute_k),
            u8::from(self.show_detail),
            u8::from(self.show_diagram),
            u8::from(self.use_global_load_factor)
        );

        let f = self.factors.to_array().map(norm_float);
        let factors = format!(
            "      {}   {}   {}",
            f[..8].join(" "),
            f[8..13].join(" "),
            f[13..].join(" ")
        );

        let body = match &self.kind {
            DesignKind::Concrete {
                shape,
                cv,
                reinforcement,
            } => format_concrete(shape, *cv, reinforcement),
            DesignKind::SteelFrame(steel) => format_steel(steel),
        };

        vec![head, factors, body]
    }
}

fn parse_reinforcement(l2: &[&str], ctx: &ParseContext) -> ModelResult<ReinforcedConcrete> {
    Ok(ReinforcedConcrete {
        ec: ctx.field(l2, 7, "ec")?,
        fc1: ctx.field(l2, 8, "fc1")?,
        fci: ctx.field(l2, 9, "fci")?,
        fcr: ctx.field(l2, 10, "fcr")?,
        fy: ctx.field(l2, 11, "fy")?,
        db: ctx.field(l2, 12, "db")?,
        delta: ctx.field(l2, 13, "delta")?,
        rebar_faces: ctx.field(l2, 14, "rebar_faces")?,
        fys: ctx.field(l2, 15, "fys")?,
        dbs: ctx.field(l2, 16, "dbs")?,
        nside: ctx.field(l2, 17, "nside")?,
        sidebar_space: ctx.field(l2, 18, "sidebar_space")?,
        stirrup_type: ctx.field(l2, 19, "stirrup_type")?,
        fyv: ctx.field(l2, 20, "fyv")?,
        dbv: ctx.field(l2, 21, "dbv")?,
        stirrup_space_max: ctx.field(l2, 22, "stirrup_space_max")?,
        hollow: ctx.flag(l2, 23, "hollow")?,
        tcc: ctx.field(l2, 24, "tcc")?,
        tcf: ctx.field(l2, 25, "tcf")?,
    })
}

fn parse_steel(l2: &[&str], ctx: &ParseContext) -> ModelResult<SteelFrame> {
    Ok(SteelFrame {
        section_option: ctx.field(l2, 2, "section_option")?,
        composite_option: ctx.field(l2, 3, "composite_option")?,
        connection_design: ctx.flag(l2, 4, "connection_design")?,
        section: ctx.text(l2, 5, "section")?,
        wf2: ctx.text(l2, 6, "wf2")?,
        strong_axis: ctx.flag(l2, 7, "strong_axis")?,
        h1_ho: ctx.field(l2, 8, "h1_ho")?,
        space: ctx.field(l2, 9, "space")?,
        es: ctx.field(l2, 10, "Es")?,
        fu: ctx.field(l2, 11, "Fu")?,
        fy: ctx.field(l2, 12, "Fy")?,
        ag: ctx.field(l2, 13, "Ag")?,
        r_min: ctx.field(l2, 14, "Rmin")?,
        wx: ctx.field(l2, 15, "Wx")?,
        wy: ctx.field(l2, 16, "Wy")?,
        an_ag: ctx.field(l2, 17, "An_Ag")?,
        material_name: ctx.text(l2, 18, "material_name")?,
        left_haunch_length: ctx.field(l2, 19, "left_haunch_length")?,
        left_haunch_height: ctx.field(l2, 20, "left_haunch_height")?,
        right_haunch_length: ctx.field(l2, 21, "right_haunch_length")?,
        right_haunch_height: ctx.field(l2, 22, "right_haunch_height")?,
        tu: ctx.field(l2, 23, "Tu")?,
        ty: ctx.field(l2, 24, "Ty")?,
        tension_only: ctx.flag(l2, 25, "tension_only")?,
        ry: ctx.field(l2, 26, "Ry")?,
        rt: ctx.field(l2, 27, "Rt")?,
    })
}

fn format_concrete(shape: &ConcreteShape, cv: f64, rc: &ReinforcedConcrete) -> String {
    let dims = shape.dimensions().map(norm_float).join(" ");
    format!(
        "      CONCRETE = {} {}  {} {} {} {}  {} {} {} {}  {} {} {} {}  {} {} {} {}  {} {} {}",
        dims,
        norm_float(cv),
        norm_float(rc.ec),
        norm_float(rc.fc1),
        norm_float(rc.fci),
        norm_float(rc.fcr),
        norm_float(rc.fy),
        norm_float(rc.db),
        norm_float(rc.delta),
        rc.rebar_faces,
        norm_float(rc.fys),
        norm_float(rc.dbs),
        norm_float(rc.nside),
        norm_float(rc.sidebar_space),
        rc.stirrup_type,
        norm_float(rc.fyv),
        norm_float(rc.dbv),
        norm_float(rc.stirrup_space_max),
        u8::from(rc.hollow),
        norm_float(rc.tcc),
        norm_float(rc.tcf)
    )
}

fn format_steel(s: &SteelFrame) -> String {
    format!(
        "      STEEL = {} {} {} {} {} {} {} {}  {} {} {}  {} {} {} {} {}  {} {} {} {} {}  {} {} {}  {} {}",
        s.section_option,
        s.composite_option,
        u8::from(s.connection_design),
        s.section,
        s.wf2,
        u8::from(s.strong_axis),
        s.h1_ho,
        s.space,
        norm_float(s.es),
        norm_float(s.fu),
        norm_float(s.fy),
        norm_float(s.ag),
        norm_float(s.r_min),
        norm_float(s.wx),
        norm_float(s.wy),
        norm_float(s.an_ag),
        s.material_name,
        norm_float(s.left_haunch_length),
        norm_float(s.left_haunch_height),
        norm_float(s.right_haunch_length),
        norm_float(s.right_haunch_height),
        norm_float(s.tu),
        norm_float(s.ty),
        u8::from(s.tension_only),
        norm_float(s.ry),
        norm_float(s.rt)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const GIRDER: [&str; 3] = [
        "   2   2 CONCRETE_GIRDER G30X60 2 1 14 1 0 0 1",
        "      0.9 0.9 0.65 0.7 0.75 0.75 0.65 0.75   1 1 1 1 1   1 1 1 1 1",
        "      CONCRETE = 30 60 30 12 4  235000 250 250 30  4000 16 0.5 4  2400 13 2 200  1 4000 10 150  0 0 0",
    ];

    fn roundtrip(lines: &[&str]) -> Design {
        let design = Design::parse_record(lines, &mut ParseContext::new("DESIGN")).unwrap();
        let written = design.format_record();
        let refs: Vec<&str> = written.iter().map(String::as_str).collect();
        let back = Design::parse_record(&refs, &mut ParseContext::new("DESIGN")).unwrap();
        assert_eq!(back, design);
        design
    }

    #[test]
    fn test_concrete_girder() {
        let design = roundtrip(&GIRDER);
        assert_eq!(design.name, "G30X60");
        assert_eq!(design.design_code, 14);
        assert!(design.use_global_load_factor);
        assert_eq!(design.factors.phi_flex_compression, 0.65);
        match &design.kind {
            DesignKind::Concrete {
                shape,
                cv,
                reinforcement,
            } => {
                assert_eq!(*shape, ConcreteShape::Girder { bw: 30.0, ht: 60.0, bf: 30.0, tf: 12.0 });
                assert_eq!(*cv, 4.0);
                assert_eq!(reinforcement.fy, 4000.0);
                assert_eq!(reinforcement.rebar_faces, 2);
                assert_eq!(reinforcement.stirrup_type, 1);
            }
            DesignKind::SteelFrame(_) => panic!("expected concrete"),
        }
        // formatter reproduces the source text
        let written = design.format_record();
        assert_eq!(written[1], GIRDER[1]);
        assert_eq!(written[2], GIRDER[2]);
    }

    #[test]
    fn test_tee_column_and_slab() {
        let tcol = [
            "   5   5 CONCRETE_TCOL   K40T 3 1 14 1 0 0 1",
            GIRDER[1],
            "      CONCRETE = 40 80 25 15 4  235000 250 250 30  4000 19 0.5 4  2400 13 2 200  1 4000 10 150  0 0 0",
        ];
        let design = roundtrip(&tcol);
        assert_eq!(design.type_name(), "CONCRETE_TCOL");

        let slab = [
            "   1   1 CONCRETE_SLAB S12 5 1 14 1 0 0 1",
            GIRDER[1],
            "      CONCRETE = 12 0 0 0 2  235000 250 250 30  4000 10 0.5 2  2400 10 0 0  1 2400 10 200  0 0 0",
        ];
        let design = roundtrip(&slab);
        assert!(matches!(design.kind, DesignKind::Concrete { shape: ConcreteShape::Slab { tp }, .. } if tp == 12.0));
    }

    #[test]
    fn test_steel_frame() {
        let steel = [
            "   9   7 STEEL_FRAME  WF300 2 3 3 1 0 0 1",
            GIRDER[1],
            "      STEEL = 1 0 0 WF300X150 NONE 1 0 0  2000000 4100 2500  46.78 3.29 481 67.7 0.85  BJ41 0 0 0 0  0 0 0  1.5 1.2",
        ];
        let design = roundtrip(&steel);
        match &design.kind {
            DesignKind::SteelFrame(s) => {
                assert_eq!(s.section, "WF300X150");
                assert!(s.strong_axis);
                assert_eq!(s.material_name, "BJ41");
                assert_eq!(s.rt, 1.2);
            }
            DesignKind::Concrete { .. } => panic!("expected steel"),
        }
        assert_eq!(design.format_record()[2], steel[2]);
    }

    #[test]
    fn test_unknown_design_type() {
        let lines = ["   1   1 TIMBER_BEAM X 2 1 14 1 0 0 1", GIRDER[1], GIRDER[2]];
        let err = Design::parse_record(&lines, &mut ParseContext::new("DESIGN")).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_RECORD");
    }
}
