//! RAW writer.
//!
//! Output is comma separated with every string quoted, one section after
//! another in file order. Unsupported sections are written empty so the
//! result reads back through [`super::parse_raw`].

use std::io::Write;

use super::{
    Area, Branch, Bus, Case, FixedShunt, Generator, Load, Owner, Owners, SwitchedShunt,
    Transformer, TransformerHeader, Winding, Zone,
};

fn quote_name(input: &str) -> String {
    format!("'{}'", input.replace('\'', "''"))
}

fn owners(owners: &Owners) -> String {
    owners
        .iter()
        .map(|o| format!("{}, {}", o.owner, o.fraction))
        .collect::<Vec<_>>()
        .join(", ")
}

fn bus_line(b: &Bus) -> String {
    format!(
        "{}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}",
        b.i,
        quote_name(&b.name),
        b.basekv,
        b.ide.code(),
        b.area,
        b.zone,
        b.owner,
        b.vm,
        b.va,
        b.nvhi,
        b.nvlo,
        b.evhi,
        b.evlo
    )
}

fn load_line(l: &Load) -> String {
    format!(
        "{}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}",
        l.i,
        quote_name(&l.id),
        l.status,
        l.area,
        l.zone,
        l.pl,
        l.ql,
        l.ip,
        l.iq,
        l.yp,
        l.yq,
        l.owner,
        l.scale,
        l.intrpt
    )
}

fn fixed_shunt_line(s: &FixedShunt) -> String {
    format!(
        "{}, {}, {}, {}, {}",
        s.i,
        quote_name(&s.id),
        s.status,
        s.gl,
        s.bl
    )
}

fn generator_line(g: &Generator) -> String {
    format!(
        "{}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}",
        g.i,
        quote_name(&g.id),
        g.pg,
        g.qg,
        g.qt,
        g.qb,
        g.vs,
        g.ireg,
        g.mbase,
        g.zr,
        g.zx,
        g.rt,
        g.xt,
        g.gtap,
        g.stat,
        g.rmpct,
        g.pt,
        g.pb,
        owners(&g.owners),
        g.wmod,
        g.wpf
    )
}

fn branch_line(b: &Branch) -> String {
    format!(
        "{}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}",
        b.i,
        b.j,
        quote_name(&b.ckt),
        b.r,
        b.x,
        b.b,
        b.ratea,
        b.rateb,
        b.ratec,
        b.gi,
        b.bi,
        b.gj,
        b.bj,
        b.st,
        b.met,
        b.len,
        owners(&b.owners)
    )
}

fn transformer_header_line(h: &TransformerHeader) -> String {
    format!(
        "{}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}",
        h.i,
        h.j,
        h.k,
        quote_name(&h.ckt),
        h.cw,
        h.cz,
        h.cm,
        h.mag1,
        h.mag2,
        h.nmetr,
        quote_name(&h.name),
        h.stat,
        owners(&h.owners),
        quote_name(&h.vecgrp)
    )
}

fn winding_line(w: &Winding) -> String {
    format!(
        "{}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}",
        w.windv,
        w.nomv,
        w.ang,
        w.rata,
        w.ratb,
        w.ratc,
        w.cod,
        w.cont,
        w.rma,
        w.rmi,
        w.vma,
        w.vmi,
        w.ntp,
        w.tab,
        w.cr,
        w.cx,
        w.cnxa
    )
}

fn transformer_lines(t: &Transformer) -> Vec<String> {
    let mut lines = vec![transformer_header_line(t.header())];
    match t {
        Transformer::TwoWinding(t) => {
            let z = &t.impedance;
            lines.push(format!("{}, {}, {}", z.r12, z.x12, z.sbase12));
            lines.push(winding_line(&t.winding_1));
            lines.push(format!("{}, {}", t.winding_2.windv, t.winding_2.nomv));
        }
        Transformer::ThreeWinding(t) => {
            let z = &t.impedance;
            lines.push(format!(
                "{}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}",
                z.r12, z.x12, z.sbase12, z.r23, z.x23, z.sbase23, z.r31, z.x31, z.sbase31,
                z.vmstar, z.anstar
            ));
            lines.extend(t.windings.iter().map(winding_line));
        }
    }
    lines
}

fn area_line(a: &Area) -> String {
    format!(
        "{}, {}, {}, {}, {}",
        a.i,
        a.isw,
        a.pdes,
        a.ptol,
        quote_name(&a.arnam)
    )
}

fn zone_line(z: &Zone) -> String {
    format!("{}, {}", z.i, quote_name(&z.zoname))
}

fn owner_line(o: &Owner) -> String {
    format!("{}, {}", o.i, quote_name(&o.owname))
}

fn switched_shunt_line(s: &SwitchedShunt) -> String {
    let mut line = format!(
        "{}, {}, {}, {}, {}, {}, {}, {}, {}, {}",
        s.i,
        s.modsw,
        s.adjm,
        s.stat,
        s.vswhi,
        s.vswlo,
        s.swrem,
        s.rmpct,
        quote_name(&s.rmidnt),
        s.binit
    );
    for block in &s.blocks {
        line.push_str(&format!(", {}, {}", block.n, block.b));
    }
    line
}

/// Section names in file order, used for the terminator comments.
const SECTIONS: [&str; 19] = [
    "BUS",
    "LOAD",
    "FIXED SHUNT",
    "GENERATOR",
    "BRANCH",
    "TRANSFORMER",
    "AREA",
    "TWO-TERMINAL DC",
    "VSC DC LINE",
    "IMPEDANCE CORRECTION",
    "MULTI-TERMINAL DC",
    "MULTI-SECTION LINE",
    "ZONE",
    "INTER-AREA TRANSFER",
    "OWNER",
    "FACTS DEVICE",
    "SWITCHED SHUNT",
    "GNE DEVICE",
    "INDUCTION MACHINE",
];

fn terminator(section: usize) -> String {
    match SECTIONS.get(section + 1) {
        Some(next) => format!(
            "0 / END OF {} DATA, BEGIN {next} DATA",
            SECTIONS[section]
        ),
        None => format!("0 / END OF {} DATA", SECTIONS[section]),
    }
}

impl Case {
    /// Render the case as RAW text.
    pub fn to_raw(&self) -> String {
        let mut sections: Vec<Vec<String>> = vec![Vec::new(); SECTIONS.len()];
        sections[0] = self.buses.iter().map(bus_line).collect();
        sections[1] = self.loads.iter().map(load_line).collect();
        sections[2] = self.fixed_shunts.iter().map(fixed_shunt_line).collect();
        sections[3] = self.generators.iter().map(generator_line).collect();
        sections[4] = self.branches.iter().map(branch_line).collect();
        sections[5] = self.transformers.iter().flat_map(transformer_lines).collect();
        sections[6] = self.areas.iter().map(area_line).collect();
        sections[12] = self.zones.iter().map(zone_line).collect();
        sections[14] = self.owners.iter().map(owner_line).collect();
        sections[16] = self.switched_shunts.iter().map(switched_shunt_line).collect();

        let mut out = format!(
            "{}, {}, {}, {}, {}, {}     / PSS(R)E-{} RAW created by psse2grg\n",
            self.ic, self.sbase, self.rev, self.xfrrat, self.nxfrat, self.basfrq, self.rev
        );
        out.push_str(&self.record1);
        out.push('\n');
        out.push_str(&self.record2);
        out.push('\n');

        for (idx, lines) in sections.iter().enumerate() {
            for line in lines {
                out.push_str(line);
                out.push('\n');
            }
            out.push_str(&terminator(idx));
            out.push('\n');
        }
        out.push_str("Q\n");
        out
    }

    pub fn write_raw(&self, writer: &mut impl Write) -> std::io::Result<()> {
        writer.write_all(self.to_raw().as_bytes())?;
        writer.flush()
    }
}
