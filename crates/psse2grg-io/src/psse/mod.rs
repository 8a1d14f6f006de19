//! PSS/E v33 RAW records.
//!
//! One struct per supported record type, fields named after the RAW columns.
//! `index` fields hold the 0-based parse order of the record inside its
//! section and double as the record identity on a round trip.

pub mod parser;
pub mod tokenizer;
pub mod writer;

use psse2grg_core::{GrgError, GrgResult};
use serde::{Deserialize, Serialize};

pub use parser::parse_raw;

/// PSS/E revision this crate reads and writes.
pub const PSSE_REVISION: i64 = 33;

/// Bus type code (`IDE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum BusType {
    Pq = 1,
    Pv = 2,
    Reference = 3,
    Isolated = 4,
}

impl BusType {
    pub fn code(self) -> i64 {
        self as i64
    }
}

impl From<BusType> for i64 {
    fn from(value: BusType) -> Self {
        value.code()
    }
}

impl TryFrom<i64> for BusType {
    type Error = GrgError;

    fn try_from(code: i64) -> GrgResult<Self> {
        match code {
            1 => Ok(BusType::Pq),
            2 => Ok(BusType::Pv),
            3 => Ok(BusType::Reference),
            4 => Ok(BusType::Isolated),
            other => Err(GrgError::Parse(format!("unknown bus type {other}"))),
        }
    }
}

/// One `Oi, Fi` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OwnerShare {
    pub owner: i64,
    pub fraction: f64,
}

/// The four owner slots of a record, with the RAW defaults.
pub type Owners = [OwnerShare; 4];

pub fn default_owners() -> Owners {
    [
        OwnerShare { owner: 1, fraction: 1.0 },
        OwnerShare { owner: 0, fraction: 1.0 },
        OwnerShare { owner: 0, fraction: 1.0 },
        OwnerShare { owner: 0, fraction: 1.0 },
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bus {
    pub i: i64,
    pub name: String,
    pub basekv: f64,
    pub ide: BusType,
    pub area: i64,
    pub zone: i64,
    pub owner: i64,
    pub vm: f64,
    pub va: f64,
    pub nvhi: f64,
    pub nvlo: f64,
    pub evhi: f64,
    pub evlo: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Load {
    pub index: usize,
    pub i: i64,
    pub id: String,
    pub status: i64,
    pub area: i64,
    pub zone: i64,
    pub pl: f64,
    pub ql: f64,
    pub ip: f64,
    pub iq: f64,
    pub yp: f64,
    pub yq: f64,
    pub owner: i64,
    pub scale: i64,
    pub intrpt: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedShunt {
    pub index: usize,
    pub i: i64,
    pub id: String,
    pub status: i64,
    pub gl: f64,
    pub bl: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generator {
    pub index: usize,
    pub i: i64,
    pub id: String,
    pub pg: f64,
    pub qg: f64,
    pub qt: f64,
    pub qb: f64,
    pub vs: f64,
    pub ireg: i64,
    pub mbase: f64,
    pub zr: f64,
    pub zx: f64,
    pub rt: f64,
    pub xt: f64,
    pub gtap: f64,
    pub stat: i64,
    pub rmpct: f64,
    pub pt: f64,
    pub pb: f64,
    pub owners: Owners,
    pub wmod: i64,
    pub wpf: f64,
}

impl Generator {
    /// A machine with no active power range or output only supplies
    /// reactive power.
    pub fn is_synchronous_condenser(&self) -> bool {
        self.pb == 0.0 && self.pt == 0.0 && self.pg == 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub index: usize,
    pub i: i64,
    pub j: i64,
    pub ckt: String,
    pub r: f64,
    pub x: f64,
    pub b: f64,
    pub ratea: f64,
    pub rateb: f64,
    pub ratec: f64,
    pub gi: f64,
    pub bi: f64,
    pub gj: f64,
    pub bj: f64,
    pub st: i64,
    pub met: i64,
    pub len: f64,
    pub owners: Owners,
}

/// First line of a transformer stanza.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformerHeader {
    pub i: i64,
    pub j: i64,
    pub k: i64,
    pub ckt: String,
    pub cw: i64,
    pub cz: i64,
    pub cm: i64,
    pub mag1: f64,
    pub mag2: f64,
    pub nmetr: i64,
    pub name: String,
    pub stat: i64,
    pub owners: Owners,
    pub vecgrp: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TwoWindingImpedance {
    pub r12: f64,
    pub x12: f64,
    pub sbase12: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThreeWindingImpedance {
    pub r12: f64,
    pub x12: f64,
    pub sbase12: f64,
    pub r23: f64,
    pub x23: f64,
    pub sbase23: f64,
    pub r31: f64,
    pub x31: f64,
    pub sbase31: f64,
    pub vmstar: f64,
    pub anstar: f64,
}

/// Full winding line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Winding {
    pub windv: f64,
    pub nomv: f64,
    pub ang: f64,
    pub rata: f64,
    pub ratb: f64,
    pub ratc: f64,
    pub cod: i64,
    pub cont: i64,
    pub rma: f64,
    pub rmi: f64,
    pub vma: f64,
    pub vmi: f64,
    pub ntp: i64,
    pub tab: i64,
    pub cr: f64,
    pub cx: f64,
    pub cnxa: f64,
}

/// Second winding line of a two winding transformer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShortWinding {
    pub windv: f64,
    pub nomv: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwoWindingTransformer {
    pub index: usize,
    pub header: TransformerHeader,
    pub impedance: TwoWindingImpedance,
    pub winding_1: Winding,
    pub winding_2: ShortWinding,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreeWindingTransformer {
    pub index: usize,
    pub header: TransformerHeader,
    pub impedance: ThreeWindingImpedance,
    pub windings: [Winding; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Transformer {
    TwoWinding(TwoWindingTransformer),
    ThreeWinding(ThreeWindingTransformer),
}

impl Transformer {
    pub fn index(&self) -> usize {
        match self {
            Transformer::TwoWinding(t) => t.index,
            Transformer::ThreeWinding(t) => t.index,
        }
    }

    pub fn header(&self) -> &TransformerHeader {
        match self {
            Transformer::TwoWinding(t) => &t.header,
            Transformer::ThreeWinding(t) => &t.header,
        }
    }

    /// Winding buses in winding order.
    pub fn buses(&self) -> Vec<i64> {
        let h = self.header();
        match self {
            Transformer::TwoWinding(_) => vec![h.i, h.j],
            Transformer::ThreeWinding(_) => vec![h.i, h.j, h.k],
        }
    }

    pub fn is_three_winding(&self) -> bool {
        matches!(self, Transformer::ThreeWinding(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub i: i64,
    pub isw: i64,
    pub pdes: f64,
    pub ptol: f64,
    pub arnam: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub i: i64,
    pub zoname: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Owner {
    pub i: i64,
    pub owname: String,
}

/// `Ni, Bi` block of a switched shunt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShuntBlock {
    pub n: i64,
    pub b: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchedShunt {
    pub index: usize,
    pub i: i64,
    pub modsw: i64,
    pub adjm: i64,
    pub stat: i64,
    pub vswhi: f64,
    pub vswlo: f64,
    pub swrem: i64,
    pub rmpct: f64,
    pub rmidnt: String,
    pub binit: f64,
    pub blocks: Vec<ShuntBlock>,
}

impl SwitchedShunt {
    /// Every susceptance (MVAr at unity voltage) the blocks can switch in,
    /// starting from all blocks off.
    pub fn susceptance_steps(&self) -> Vec<f64> {
        let mut steps = vec![0.0];
        let mut total = 0.0;
        for block in &self.blocks {
            for _ in 0..block.n.max(0) {
                total += block.b;
                steps.push(total);
            }
        }
        steps
    }
}

/// A complete RAW case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub ic: i64,
    pub sbase: f64,
    pub rev: i64,
    pub xfrrat: i64,
    pub nxfrat: i64,
    pub basfrq: f64,
    pub record1: String,
    pub record2: String,
    pub buses: Vec<Bus>,
    pub loads: Vec<Load>,
    pub fixed_shunts: Vec<FixedShunt>,
    pub generators: Vec<Generator>,
    pub branches: Vec<Branch>,
    pub transformers: Vec<Transformer>,
    pub areas: Vec<Area>,
    pub zones: Vec<Zone>,
    pub owners: Vec<Owner>,
    pub switched_shunts: Vec<SwitchedShunt>,
}

impl Case {
    /// An empty case on the given system base.
    pub fn new(sbase: f64) -> Self {
        Self {
            ic: 0,
            sbase,
            rev: PSSE_REVISION,
            xfrrat: 0,
            nxfrat: 0,
            basfrq: 60.0,
            record1: String::new(),
            record2: String::new(),
            buses: Vec::new(),
            loads: Vec::new(),
            fixed_shunts: Vec::new(),
            generators: Vec::new(),
            branches: Vec::new(),
            transformers: Vec::new(),
            areas: Vec::new(),
            zones: Vec::new(),
            owners: Vec::new(),
            switched_shunts: Vec::new(),
        }
    }

    pub fn bus(&self, number: i64) -> Option<&Bus> {
        self.buses.iter().find(|b| b.i == number)
    }

    pub fn two_winding_count(&self) -> usize {
        self.transformers.iter().filter(|t| !t.is_three_winding()).count()
    }

    /// Check that every record refers to a bus of the bus table.
    pub fn check_bus_references(&self) -> GrgResult<()> {
        let known: std::collections::HashSet<i64> = self.buses.iter().map(|b| b.i).collect();
        let check = |bus: i64, component: String| {
            if known.contains(&bus) {
                Ok(())
            } else {
                Err(GrgError::UnknownBus { bus, component })
            }
        };

        for load in &self.loads {
            check(load.i, format!("load {}", load.index))?;
        }
        for shunt in &self.fixed_shunts {
            check(shunt.i, format!("fixed shunt {}", shunt.index))?;
        }
        for shunt in &self.switched_shunts {
            check(shunt.i, format!("switched shunt {}", shunt.index))?;
        }
        for gen in &self.generators {
            check(gen.i, format!("generator {}", gen.index))?;
        }
        for branch in &self.branches {
            check(branch.i, format!("branch {}", branch.index))?;
            check(branch.j, format!("branch {}", branch.index))?;
        }
        for transformer in &self.transformers {
            for bus in transformer.buses() {
                check(bus, format!("transformer {}", transformer.index()))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bus_type_codes() {
        assert_eq!(BusType::try_from(3).unwrap(), BusType::Reference);
        assert!(BusType::try_from(7).is_err());
        assert_eq!(serde_json::to_value(BusType::Isolated).unwrap(), 4);
    }

    #[test]
    fn test_switched_shunt_steps() {
        let shunt = SwitchedShunt {
            index: 0,
            i: 1,
            modsw: 1,
            adjm: 0,
            stat: 1,
            vswhi: 1.0,
            vswlo: 1.0,
            swrem: 0,
            rmpct: 100.0,
            rmidnt: String::new(),
            binit: 20.0,
            blocks: vec![ShuntBlock { n: 2, b: 10.0 }, ShuntBlock { n: 1, b: -5.0 }],
        };
        assert_eq!(shunt.susceptance_steps(), vec![0.0, 10.0, 20.0, 15.0]);
    }

    #[test]
    fn test_unknown_bus_reference() {
        let mut case = Case::new(100.0);
        case.buses.push(Bus {
            i: 1,
            name: "A".into(),
            basekv: 138.0,
            ide: BusType::Reference,
            area: 1,
            zone: 1,
            owner: 1,
            vm: 1.0,
            va: 0.0,
            nvhi: 1.1,
            nvlo: 0.9,
            evhi: 1.1,
            evlo: 0.9,
        });
        case.loads.push(Load {
            index: 0,
            i: 2,
            id: "1".into(),
            status: 1,
            area: 1,
            zone: 1,
            pl: 1.0,
            ql: 0.0,
            ip: 0.0,
            iq: 0.0,
            yp: 0.0,
            yq: 0.0,
            owner: 1,
            scale: 1,
            intrpt: 0,
        });
        assert!(matches!(
            case.check_bus_references(),
            Err(GrgError::UnknownBus { bus: 2, .. })
        ));
    }
}
