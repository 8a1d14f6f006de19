//! RAW section parser.
//!
//! The file is read as a fixed sequence of sections, each closed by a `0`
//! record. A `Q` record ends the data; every section after it is empty.

use psse2grg_core::{GrgError, GrgResult};
use tracing::{debug, info};

use super::tokenizer::{tokenize, Fields, Line};
use super::{
    default_owners, Area, Branch, Bus, BusType, Case, FixedShunt, Generator, Load, Owner,
    OwnerShare, Owners, ShortWinding, ShuntBlock, SwitchedShunt, ThreeWindingImpedance,
    ThreeWindingTransformer, Transformer, TransformerHeader, TwoWindingImpedance,
    TwoWindingTransformer, Winding, Zone, PSSE_REVISION,
};

/// Most `Ni, Bi` blocks a switched shunt record holds.
const MAX_SHUNT_BLOCKS: usize = 8;

enum Next {
    Record(Line, usize),
    SectionEnd,
    Quit,
}

struct Cursor<'a> {
    lines: Vec<&'a str>,
    pos: usize,
    quit: bool,
}

impl<'a> Cursor<'a> {
    fn new(lines: Vec<&'a str>, start: usize) -> Self {
        Self {
            lines,
            pos: start,
            quit: false,
        }
    }

    /// Next meaningful line. Blank lines are skipped and terminators are
    /// consumed here.
    fn next(&mut self) -> Next {
        while !self.quit && self.pos < self.lines.len() {
            let number = self.pos + 1;
            let line = tokenize(self.lines[self.pos]);
            if line.is_blank() {
                self.pos += 1;
                continue;
            }
            if line.is_quit() {
                self.pos += 1;
                self.quit = true;
                return Next::Quit;
            }
            self.pos += 1;
            if line.is_section_end() {
                return Next::SectionEnd;
            }
            return Next::Record(line, number);
        }
        self.quit = true;
        Next::Quit
    }

    /// Line that must continue a multi-line record. Terminators are not
    /// recognized here since a continuation may start with a literal `0`.
    fn continuation(&mut self, what: &str, start: usize) -> GrgResult<(Line, usize)> {
        match self.lines.get(self.pos) {
            Some(text) if !self.quit => {
                self.pos += 1;
                Ok((tokenize(text), self.pos))
            }
            _ => Err(GrgError::parse_at(
                start,
                format!("{what} stanza starting here is truncated"),
            )),
        }
    }

    fn section<T, F>(&mut self, name: &str, mut parse: F) -> GrgResult<Vec<T>>
    where
        F: FnMut(&Fields<'_>, usize) -> GrgResult<T>,
    {
        let mut records = Vec::new();
        while let Next::Record(line, number) = self.next() {
            let index = records.len();
            records.push(parse(&Fields::new(&line, number), index)?);
        }
        debug!(section = name, count = records.len(), "parsed section");
        Ok(records)
    }

    fn unsupported(&mut self, section: &'static str) -> GrgResult<()> {
        match self.next() {
            Next::Record(_, line) => Err(GrgError::UnsupportedSection { section, line }),
            Next::SectionEnd | Next::Quit => Ok(()),
        }
    }

    fn remaining(&self) -> impl Iterator<Item = (usize, &&'a str)> + '_ {
        self.lines
            .iter()
            .enumerate()
            .skip(self.pos)
            .filter(|(_, l)| !l.trim().is_empty())
    }
}

fn owners_at(f: &Fields<'_>, start: usize) -> GrgResult<Owners> {
    let mut owners = default_owners();
    for (slot, share) in owners.iter_mut().enumerate() {
        let idx = start + 2 * slot;
        *share = OwnerShare {
            owner: f.int(idx, share.owner)?,
            fraction: f.float(idx + 1, share.fraction)?,
        };
    }
    Ok(owners)
}

fn parse_bus(f: &Fields<'_>) -> GrgResult<Bus> {
    let ide = BusType::try_from(f.int(3, 1)?)
        .map_err(|e| GrgError::parse_at(f.line_number(), e))?;
    Ok(Bus {
        i: f.required_int(0, "bus number")?,
        name: f.string(1, ""),
        basekv: f.float(2, 0.0)?,
        ide,
        area: f.int(4, 1)?,
        zone: f.int(5, 1)?,
        owner: f.int(6, 1)?,
        vm: f.float(7, 1.0)?,
        va: f.float(8, 0.0)?,
        nvhi: f.float(9, 1.1)?,
        nvlo: f.float(10, 0.9)?,
        evhi: f.float(11, 1.1)?,
        evlo: f.float(12, 0.9)?,
    })
}

fn parse_load(f: &Fields<'_>, index: usize) -> GrgResult<Load> {
    Ok(Load {
        index,
        i: f.required_int(0, "load bus")?,
        id: f.string(1, "1"),
        status: f.int(2, 1)?,
        area: f.int(3, 1)?,
        zone: f.int(4, 1)?,
        pl: f.float(5, 0.0)?,
        ql: f.float(6, 0.0)?,
        ip: f.float(7, 0.0)?,
        iq: f.float(8, 0.0)?,
        yp: f.float(9, 0.0)?,
        yq: f.float(10, 0.0)?,
        owner: f.int(11, 1)?,
        scale: f.int(12, 1)?,
        intrpt: f.int(13, 0)?,
    })
}

fn parse_fixed_shunt(f: &Fields<'_>, index: usize) -> GrgResult<FixedShunt> {
    Ok(FixedShunt {
        index,
        i: f.required_int(0, "shunt bus")?,
        id: f.string(1, "1"),
        status: f.int(2, 1)?,
        gl: f.float(3, 0.0)?,
        bl: f.float(4, 0.0)?,
    })
}

fn parse_generator(f: &Fields<'_>, index: usize, sbase: f64) -> GrgResult<Generator> {
    Ok(Generator {
        index,
        i: f.required_int(0, "generator bus")?,
        id: f.string(1, "1"),
        pg: f.float(2, 0.0)?,
        qg: f.float(3, 0.0)?,
        qt: f.float(4, 9999.0)?,
        qb: f.float(5, -9999.0)?,
        vs: f.float(6, 1.0)?,
        ireg: f.int(7, 0)?,
        mbase: f.float(8, sbase)?,
        zr: f.float(9, 0.0)?,
        zx: f.float(10, 1.0)?,
        rt: f.float(11, 0.0)?,
        xt: f.float(12, 0.0)?,
        gtap: f.float(13, 1.0)?,
        stat: f.int(14, 1)?,
        rmpct: f.float(15, 100.0)?,
        pt: f.float(16, 9999.0)?,
        pb: f.float(17, -9999.0)?,
        owners: owners_at(f, 18)?,
        wmod: f.int(26, 0)?,
        wpf: f.float(27, 1.0)?,
    })
}

fn parse_branch(f: &Fields<'_>, index: usize) -> GrgResult<Branch> {
    Ok(Branch {
        index,
        i: f.required_int(0, "from bus")?,
        j: f.required_int(1, "to bus")?,
        ckt: f.string(2, "1"),
        r: f.float(3, 0.0)?,
        x: f.float(4, 0.0)?,
        b: f.float(5, 0.0)?,
        ratea: f.float(6, 0.0)?,
        rateb: f.float(7, 0.0)?,
        ratec: f.float(8, 0.0)?,
        gi: f.float(9, 0.0)?,
        bi: f.float(10, 0.0)?,
        gj: f.float(11, 0.0)?,
        bj: f.float(12, 0.0)?,
        st: f.int(13, 1)?,
        met: f.int(14, 1)?,
        len: f.float(15, 0.0)?,
        owners: owners_at(f, 16)?,
    })
}

fn parse_transformer_header(f: &Fields<'_>) -> GrgResult<TransformerHeader> {
    Ok(TransformerHeader {
        i: f.required_int(0, "winding 1 bus")?,
        j: f.required_int(1, "winding 2 bus")?,
        k: f.int(2, 0)?,
        ckt: f.string(3, "1"),
        cw: f.int(4, 1)?,
        cz: f.int(5, 1)?,
        cm: f.int(6, 1)?,
        mag1: f.float(7, 0.0)?,
        mag2: f.float(8, 0.0)?,
        nmetr: f.int(9, 2)?,
        name: f.string(10, ""),
        stat: f.int(11, 1)?,
        owners: owners_at(f, 12)?,
        vecgrp: f.string(20, ""),
    })
}

fn parse_winding(f: &Fields<'_>) -> GrgResult<Winding> {
    Ok(Winding {
        windv: f.float(0, 1.0)?,
        nomv: f.float(1, 0.0)?,
        ang: f.float(2, 0.0)?,
        rata: f.float(3, 0.0)?,
        ratb: f.float(4, 0.0)?,
        ratc: f.float(5, 0.0)?,
        cod: f.int(6, 0)?,
        cont: f.int(7, 0)?,
        rma: f.float(8, 1.1)?,
        rmi: f.float(9, 0.9)?,
        vma: f.float(10, 1.1)?,
        vmi: f.float(11, 0.9)?,
        ntp: f.int(12, 33)?,
        tab: f.int(13, 0)?,
        cr: f.float(14, 0.0)?,
        cx: f.float(15, 0.0)?,
        cnxa: f.float(16, 0.0)?,
    })
}

fn parse_transformer(
    cursor: &mut Cursor<'_>,
    first: Line,
    number: usize,
    index: usize,
    sbase: f64,
) -> GrgResult<Transformer> {
    let header = parse_transformer_header(&Fields::new(&first, number))?;

    let (line, n) = cursor.continuation("transformer", number)?;
    let z = Fields::new(&line, n);

    if header.k == 0 {
        let impedance = TwoWindingImpedance {
            r12: z.float(0, 0.0)?,
            x12: z.float(1, 0.0)?,
            sbase12: z.float(2, sbase)?,
        };
        let (line, n) = cursor.continuation("transformer", number)?;
        let winding_1 = parse_winding(&Fields::new(&line, n))?;
        let (line, n) = cursor.continuation("transformer", number)?;
        let w2 = Fields::new(&line, n);
        let winding_2 = ShortWinding {
            windv: w2.float(0, 1.0)?,
            nomv: w2.float(1, 0.0)?,
        };
        Ok(Transformer::TwoWinding(TwoWindingTransformer {
            index,
            header,
            impedance,
            winding_1,
            winding_2,
        }))
    } else {
        let impedance = ThreeWindingImpedance {
            r12: z.float(0, 0.0)?,
            x12: z.float(1, 0.0)?,
            sbase12: z.float(2, sbase)?,
            r23: z.float(3, 0.0)?,
            x23: z.float(4, 0.0)?,
            sbase23: z.float(5, sbase)?,
            r31: z.float(6, 0.0)?,
            x31: z.float(7, 0.0)?,
            sbase31: z.float(8, sbase)?,
            vmstar: z.float(9, 1.0)?,
            anstar: z.float(10, 0.0)?,
        };
        let mut windings = Vec::with_capacity(3);
        for _ in 0..3 {
            let (line, n) = cursor.continuation("transformer", number)?;
            windings.push(parse_winding(&Fields::new(&line, n))?);
        }
        let windings: [Winding; 3] = windings
            .try_into()
            .map_err(|_| GrgError::parse_at(number, "three winding transformer needs 3 windings"))?;
        Ok(Transformer::ThreeWinding(ThreeWindingTransformer {
            index,
            header,
            impedance,
            windings,
        }))
    }
}

fn parse_area(f: &Fields<'_>) -> GrgResult<Area> {
    Ok(Area {
        i: f.required_int(0, "area number")?,
        isw: f.int(1, 0)?,
        pdes: f.float(2, 0.0)?,
        ptol: f.float(3, 10.0)?,
        arnam: f.string(4, ""),
    })
}

fn parse_switched_shunt(f: &Fields<'_>, index: usize) -> GrgResult<SwitchedShunt> {
    let mut blocks = Vec::new();
    for block in 0..MAX_SHUNT_BLOCKS {
        let idx = 10 + 2 * block;
        if !f.has(idx) {
            break;
        }
        blocks.push(ShuntBlock {
            n: f.int(idx, 0)?,
            b: f.float(idx + 1, 0.0)?,
        });
    }

    Ok(SwitchedShunt {
        index,
        i: f.required_int(0, "switched shunt bus")?,
        modsw: f.int(1, 1)?,
        adjm: f.int(2, 0)?,
        stat: f.int(3, 1)?,
        vswhi: f.float(4, 1.0)?,
        vswlo: f.float(5, 1.0)?,
        swrem: f.int(6, 0)?,
        rmpct: f.float(7, 100.0)?,
        rmidnt: f.string(8, ""),
        binit: f.float(9, 0.0)?,
        blocks,
    })
}

fn parse_header(line: &str) -> GrgResult<(i64, f64, i64, i64, i64, f64)> {
    let tokens = tokenize(line);
    let f = Fields::new(&tokens, 1);
    let malformed = |e: GrgError| GrgError::MalformedHeader(e.to_string());

    let ic = f.required_int(0, "IC").map_err(malformed)?;
    if ic != 0 {
        return Err(GrgError::MalformedHeader(format!(
            "IC={ic} marks change data, only base cases (IC=0) are supported"
        )));
    }
    if !f.has(1) {
        return Err(GrgError::MalformedHeader("missing SBASE".to_string()));
    }
    let sbase = f.float(1, 0.0).map_err(malformed)?;
    let rev = f.int(2, PSSE_REVISION).map_err(malformed)?;
    let xfrrat = f.int(3, 0).map_err(malformed)?;
    let nxfrat = f.int(4, 0).map_err(malformed)?;
    let basfrq = f.float(5, 60.0).map_err(malformed)?;
    Ok((ic, sbase, rev, xfrrat, nxfrat, basfrq))
}

/// Parse the text of a RAW file.
pub fn parse_raw(text: &str) -> GrgResult<Case> {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() < 3 {
        return Err(GrgError::MalformedHeader(format!(
            "expected a case record and two heading lines, found {} line(s)",
            lines.len()
        )));
    }

    let (ic, sbase, rev, xfrrat, nxfrat, basfrq) = parse_header(lines[0])?;
    if rev != PSSE_REVISION {
        debug!(rev, "case revision differs from {PSSE_REVISION}, reading as v{PSSE_REVISION}");
    }

    let mut case = Case::new(sbase);
    case.ic = ic;
    case.rev = rev;
    case.xfrrat = xfrrat;
    case.nxfrat = nxfrat;
    case.basfrq = basfrq;
    case.record1 = lines[1].trim_end().to_string();
    case.record2 = lines[2].trim_end().to_string();

    let mut cursor = Cursor::new(lines, 3);

    case.buses = cursor.section("bus", |f, _| parse_bus(f))?;
    case.loads = cursor.section("load", parse_load)?;
    case.fixed_shunts = cursor.section("fixed shunt", parse_fixed_shunt)?;
    case.generators = cursor.section("generator", |f, idx| parse_generator(f, idx, sbase))?;
    case.branches = cursor.section("branch", parse_branch)?;

    while let Next::Record(line, number) = cursor.next() {
        let index = case.transformers.len();
        let transformer = parse_transformer(&mut cursor, line, number, index, sbase)?;
        case.transformers.push(transformer);
    }
    debug!(section = "transformer", count = case.transformers.len(), "parsed section");

    case.areas = cursor.section("area", |f, _| parse_area(f))?;
    cursor.unsupported("two-terminal dc")?;
    cursor.unsupported("vsc dc")?;
    cursor.unsupported("transformer impedance correction")?;
    cursor.unsupported("multi-terminal dc")?;
    cursor.unsupported("multi-section line")?;
    case.zones = cursor.section("zone", |f, _| {
        Ok(Zone {
            i: f.required_int(0, "zone number")?,
            zoname: f.string(1, ""),
        })
    })?;
    cursor.unsupported("inter-area transfer")?;
    case.owners = cursor.section("owner", |f, _| {
        Ok(Owner {
            i: f.required_int(0, "owner number")?,
            owname: f.string(1, ""),
        })
    })?;
    cursor.unsupported("facts")?;
    case.switched_shunts = cursor.section("switched shunt", parse_switched_shunt)?;
    cursor.unsupported("gne")?;
    cursor.unsupported("induction machine")?;

    for (idx, line) in cursor.remaining() {
        debug!(line = idx + 1, "unparsed trailing line: {line}");
    }

    info!(
        buses = case.buses.len(),
        loads = case.loads.len(),
        generators = case.generators.len(),
        branches = case.branches.len(),
        transformers = case.transformers.len(),
        "parsed RAW case"
    );

    Ok(case)
}
