//! GRG bus-breaker document back to a RAW case.
//!
//! Voltage points joined by closed switches collapse onto one RAW bus. When
//! several GRG buses land on the same number they are merged: names are
//! joined, the bus type follows Isolated > Reference > active generation >
//! PQ, and area, zone, owner and base kV keep the first value seen.

use std::collections::{BTreeMap, HashSet};
use std::fmt::Display;

use psse2grg_core::config::DEFAULT_BASE_MVA;
use psse2grg_core::grg::{
    components_by_type, thermal_rates, voltage_level_by_voltage_point, Bus as GrgBus,
    ComponentsByType, Document, Group, GroupKind, Mapping, MachineParameters, VoltageLevel,
};
use psse2grg_core::ids::{
    resolve_indices, resolve_machine_indices, resolve_membership, resolve_owners, GroupRef,
    Membership, OwnerMembership, MAX_OWNERS,
};
use psse2grg_core::units::{round_to, PerUnit, Radians, SystemBase};
use psse2grg_core::{
    switch_assignment, Category, Diagnostics, GrgError, GrgResult, Translation,
    TranslationOptions, VoltagePointIndex,
};
use tracing::{debug, info};

use crate::forward::DESCRIPTION_PREAMBLE;
use crate::psse::{
    default_owners, Area, Branch, Bus, BusType, Case, FixedShunt, Generator, Load, Owner,
    Owners, ShortWinding, Transformer, TransformerHeader, TwoWindingImpedance,
    TwoWindingTransformer, Winding, Zone, PSSE_REVISION,
};

/// Maximum length of a RAW heading line.
const HEADING_WIDTH: usize = 60;

struct Context<'a> {
    base: SystemBase,
    precision: u32,
    points: VoltagePointIndex,
    starting: &'a Mapping,
    areas: Membership,
    zones: Membership,
    owners: OwnerMembership,
}

impl Context<'_> {
    fn mw(&self, pu: f64) -> f64 {
        round_to(self.base.to_megawatts(PerUnit(pu)).value(), self.precision)
    }

    fn degrees(&self, radians: f64) -> f64 {
        round_to(Radians(radians).to_degrees().value(), self.precision)
    }

    fn bus_of(&self, link: &str) -> GrgResult<i64> {
        self.points.bus_number(link)
    }

    fn status(&self, links: &[&str]) -> i64 {
        i64::from(links.iter().all(|l| self.points.is_active(l)))
    }

    fn first_owner(&self, id: &str) -> Option<i64> {
        self.owners.members.get(id).and_then(|o| o.first().copied())
    }

    /// Owner slots of a component: its owner groups in group order, paired
    /// with the carried fractions, padded with the RAW defaults.
    fn owner_slots(&self, id: &str, fractions: Option<&Vec<f64>>) -> Owners {
        let mut slots = default_owners();
        if let Some(owners) = self.owners.members.get(id) {
            for (k, owner) in owners.iter().take(MAX_OWNERS).enumerate() {
                slots[k].owner = *owner;
                slots[k].fraction = fractions.and_then(|f| f.get(k)).copied().unwrap_or(1.0);
            }
        }
        slots
    }
}

fn index_of(indices: &BTreeMap<String, i64>, id: &str) -> GrgResult<usize> {
    indices
        .get(id)
        .and_then(|i| usize::try_from(*i).ok())
        .ok_or_else(|| GrgError::InvalidDocument(format!("component {id} has no usable index")))
}

fn group_refs(groups: &BTreeMap<String, Group>, kind: GroupKind) -> Vec<GroupRef<'_>> {
    groups
        .iter()
        .filter(|(_, g)| g.kind == kind)
        .map(|(id, g)| GroupRef {
            id: id.as_str(),
            source_id: g.source_id.as_deref(),
            component_ids: &g.component_ids,
        })
        .collect()
}

/// Keep the first value, warn about every later one that differs.
fn first_wins<T>(
    what: &str,
    bus: i64,
    values: impl IntoIterator<Item = T>,
    diagnostics: &mut Diagnostics,
) -> Option<T>
where
    T: PartialEq + Copy + Display,
{
    let mut kept: Option<T> = None;
    for value in values {
        match kept {
            None => kept = Some(value),
            Some(k) if k != value => diagnostics.add_warning_with_entity(
                Category::InconsistentMerge,
                format!("merged buses disagree on {what}, keeping {k} over {value}"),
                bus.to_string(),
            ),
            Some(_) => {}
        }
    }
    kept
}

/// RAW heading lines from a network description.
fn heading_records(description: Option<&str>) -> (String, String) {
    let Some(text) = description else {
        return (String::new(), String::new());
    };
    if let Some(rest) = text.strip_prefix(DESCRIPTION_PREAMBLE) {
        let mut lines = rest.strip_prefix('\n').unwrap_or(rest).split('\n');
        let record1 = lines.next().unwrap_or_default().to_string();
        let record2 = lines.next().unwrap_or_default().to_string();
        return (record1, record2);
    }
    let split = text
        .char_indices()
        .nth(HEADING_WIDTH)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let (record1, record2) = text.split_at(split);
    let record2: String = record2.chars().take(HEADING_WIDTH).collect();
    (record1.to_string(), record2)
}

fn rebuild_buses(
    ctx: &Context<'_>,
    cbt: &ComponentsByType<'_>,
    levels: &std::collections::HashMap<&str, &VoltageLevel>,
    diagnostics: &mut Diagnostics,
) -> GrgResult<Vec<Bus>> {
    let mut by_number: BTreeMap<i64, Vec<&GrgBus>> = BTreeMap::new();
    for bus in cbt.buses.iter().copied() {
        by_number.entry(ctx.bus_of(&bus.link)?).or_default().push(bus);
    }

    let mut active_generation = HashSet::new();
    let machine_links = cbt
        .generators
        .iter()
        .map(|g| g.link.as_str())
        .chain(cbt.synchronous_condensers.iter().map(|c| c.link.as_str()));
    for link in machine_links {
        if ctx.points.is_active(link) {
            active_generation.insert(ctx.bus_of(link)?);
        }
    }

    let mut buses = Vec::with_capacity(by_number.len());
    for (number, members) in by_number {
        let names: Vec<&str> = members
            .iter()
            .map(|b| b.psse_name.as_deref().unwrap_or(&b.id))
            .collect();
        if members.len() > 1 {
            diagnostics.add_warning_with_entity(
                Category::BusMerge,
                format!("merging {} buses into 1: {}", members.len(), names.join(", ")),
                number.to_string(),
            );
        }

        // a stored type 4 bus with nothing attached has no breaker left to open
        let isolated = members.iter().any(|b| {
            ctx.points.is_isolated(&b.link)
                || (b.psse_bus_type == Some(4) && ctx.points.is_detached(&b.link))
        });
        let derived = if isolated {
            BusType::Isolated
        } else if members.iter().any(|b| b.reference == Some(true)) {
            BusType::Reference
        } else if active_generation.contains(&number) {
            BusType::Pv
        } else {
            BusType::Pq
        };
        let mut ide = derived;
        for bus in &members {
            if let Some(code) = bus.psse_bus_type {
                let explicit = BusType::try_from(code)?;
                if explicit != ide {
                    diagnostics.add_warning_with_entity(
                        Category::BusTypeOverride,
                        format!(
                            "bus type {} of {} replaces the derived type {}",
                            explicit.code(),
                            bus.id,
                            ide.code()
                        ),
                        number.to_string(),
                    );
                    ide = explicit;
                }
            }
        }

        let area = first_wins(
            "area",
            number,
            members.iter().filter_map(|b| ctx.areas.members.get(&b.id).copied()),
            diagnostics,
        );
        let zone = first_wins(
            "zone",
            number,
            members.iter().filter_map(|b| ctx.zones.members.get(&b.id).copied()),
            diagnostics,
        );
        for bus in &members {
            if ctx.owners.members.get(&bus.id).is_some_and(|o| o.len() > 1) {
                diagnostics.add_warning_with_entity(
                    Category::MultipleMembership,
                    "bus has several owners, using the first one",
                    bus.id.clone(),
                );
            }
        }
        let owner = first_wins(
            "owner",
            number,
            members.iter().filter_map(|b| ctx.first_owner(&b.id)),
            diagnostics,
        );
        let basekv = first_wins(
            "base kV",
            number,
            members
                .iter()
                .filter_map(|b| levels.get(b.link.as_str()).map(|vl| vl.voltage.nominal_value)),
            diagnostics,
        );

        let nvhi = members
            .iter()
            .map(|b| b.voltage.magnitude.max())
            .fold(f64::INFINITY, f64::min);
        let nvlo = members
            .iter()
            .map(|b| b.voltage.magnitude.min())
            .fold(f64::NEG_INFINITY, f64::max);

        let voltages: Vec<_> = members
            .iter()
            .filter_map(|b| ctx.starting.get(&format!("{}/voltage", b.id)))
            .filter_map(|a| a.as_voltage())
            .collect();
        let (vm, va) = if voltages.is_empty() {
            (1.0, 0.0)
        } else {
            let n = voltages.len() as f64;
            (
                voltages.iter().map(|v| v.magnitude).sum::<f64>() / n,
                voltages.iter().map(|v| v.angle).sum::<f64>() / n,
            )
        };

        buses.push(Bus {
            i: number,
            name: names.join(" & "),
            basekv: basekv.unwrap_or(1.0),
            ide,
            area: area.unwrap_or(1),
            zone: zone.unwrap_or(1),
            owner: owner.unwrap_or(1),
            vm,
            va: ctx.degrees(va),
            nvhi,
            nvlo,
            evhi: members.iter().find_map(|b| b.evhi).unwrap_or(nvhi),
            evlo: members.iter().find_map(|b| b.evlo).unwrap_or(nvlo),
        });
    }

    Ok(buses)
}

fn rebuild_loads(
    ctx: &Context<'_>,
    cbt: &ComponentsByType<'_>,
    diagnostics: &mut Diagnostics,
) -> GrgResult<Vec<Load>> {
    let indices = resolve_indices(
        "load",
        cbt.loads.iter().map(|l| (l.id.as_str(), l.source_id.as_deref())),
    )?;

    let mut loads = Vec::with_capacity(cbt.loads.len());
    for load in &cbt.loads {
        if ctx.owners.members.get(&load.id).is_some_and(|o| o.len() > 1) {
            diagnostics.add_warning_with_entity(
                Category::MultipleMembership,
                "load has several owners, using the first one",
                load.id.clone(),
            );
        }
        loads.push(Load {
            index: index_of(&indices, &load.id)?,
            i: ctx.bus_of(&load.link)?,
            id: load.psse_id.clone().unwrap_or_default(),
            status: ctx.status(&[load.link.as_str()]),
            area: ctx.areas.members.get(&load.id).copied().unwrap_or(1),
            zone: ctx.zones.members.get(&load.id).copied().unwrap_or(1),
            pl: ctx.mw(load.demand.active),
            ql: ctx.mw(load.demand.reactive),
            ip: ctx.mw(load.ip.unwrap_or(0.0)),
            iq: ctx.mw(load.iq.unwrap_or(0.0)),
            yp: ctx.mw(load.yp.unwrap_or(0.0)),
            yq: ctx.mw(load.yq.unwrap_or(0.0)),
            owner: ctx.first_owner(&load.id).unwrap_or(1),
            scale: load.scale.unwrap_or(1),
            intrpt: load.intrpt.unwrap_or(0),
        });
    }
    loads.sort_by_key(|l| l.index);
    Ok(loads)
}

fn rebuild_fixed_shunts(
    ctx: &Context<'_>,
    cbt: &ComponentsByType<'_>,
    diagnostics: &mut Diagnostics,
) -> GrgResult<Vec<FixedShunt>> {
    let mut fixed = Vec::with_capacity(cbt.shunts.len());
    for shunt in &cbt.shunts {
        match (shunt.shunt.conductance.fixed(), shunt.shunt.susceptance.fixed()) {
            (Some(g), Some(b)) => fixed.push((*shunt, g, b)),
            _ => diagnostics.add_warning_with_entity(
                Category::VariableShunt,
                "skipping shunt with variable admittance values",
                shunt.id.clone(),
            ),
        }
    }

    // switched shunts are untagged, so only the fixed ones take part
    let indices = resolve_indices(
        "shunt",
        fixed.iter().map(|(s, _, _)| (s.id.as_str(), s.source_id.as_deref())),
    )?;

    let mut shunts = Vec::with_capacity(fixed.len());
    for (shunt, g, b) in fixed {
        shunts.push(FixedShunt {
            index: index_of(&indices, &shunt.id)?,
            i: ctx.bus_of(&shunt.link)?,
            id: shunt.psse_id.clone().unwrap_or_default(),
            status: ctx.status(&[shunt.link.as_str()]),
            gl: ctx.mw(g),
            bl: ctx.mw(b),
        });
    }
    shunts.sort_by_key(|s| s.index);
    Ok(shunts)
}

struct MachineView<'a> {
    id: &'a str,
    psse_id: Option<&'a str>,
    link: &'a str,
    mbase: Option<f64>,
    active: Option<(f64, f64)>,
    reactive: (f64, f64),
    parameters: &'a MachineParameters,
}

fn rebuild_generators(ctx: &Context<'_>, cbt: &ComponentsByType<'_>) -> GrgResult<Vec<Generator>> {
    let generators: Vec<_> = cbt
        .generators
        .iter()
        .map(|g| (g.id.as_str(), g.source_id.as_deref()))
        .collect();
    let condensers: Vec<_> = cbt
        .synchronous_condensers
        .iter()
        .map(|c| (c.id.as_str(), c.source_id.as_deref()))
        .collect();
    let indices = resolve_machine_indices(&generators, &condensers)?;

    let views = cbt
        .generators
        .iter()
        .map(|g| MachineView {
            id: &g.id,
            psse_id: g.psse_id.as_deref(),
            link: &g.link,
            mbase: g.mbase,
            active: Some((g.output.active.min(), g.output.active.max())),
            reactive: (g.output.reactive.min(), g.output.reactive.max()),
            parameters: &g.parameters,
        })
        .chain(cbt.synchronous_condensers.iter().map(|c| MachineView {
            id: &c.id,
            psse_id: c.psse_id.as_deref(),
            link: &c.link,
            mbase: c.mbase,
            active: None,
            reactive: (c.output.reactive.min(), c.output.reactive.max()),
            parameters: &c.parameters,
        }));

    let mut machines = Vec::with_capacity(indices.len());
    for m in views {
        let output = ctx
            .starting
            .get(&format!("{}/output", m.id))
            .and_then(|a| a.as_power())
            .unwrap_or_default();
        let p = m.parameters;
        let (pb, pt) = m.active.unwrap_or((0.0, 0.0));
        let pg = if m.active.is_some() {
            output.active.unwrap_or(0.0)
        } else {
            0.0
        };

        machines.push(Generator {
            index: index_of(&indices, m.id)?,
            i: ctx.bus_of(m.link)?,
            id: m.psse_id.unwrap_or_default().to_string(),
            pg: ctx.mw(pg),
            qg: ctx.mw(output.reactive.unwrap_or(0.0)),
            qt: ctx.mw(m.reactive.1),
            qb: ctx.mw(m.reactive.0),
            vs: p.vs.unwrap_or(1.0),
            ireg: p.ireg.unwrap_or(0),
            mbase: m.mbase.unwrap_or(ctx.base.mva()),
            zr: p.zr.unwrap_or(0.0),
            zx: p.zx.unwrap_or(1.0),
            rt: p.rt.unwrap_or(0.0),
            xt: p.xt.unwrap_or(0.0),
            gtap: p.gtap.unwrap_or(1.0),
            stat: ctx.status(&[m.link]),
            rmpct: p.rmpct.unwrap_or(100.0),
            pt: ctx.mw(pt),
            pb: ctx.mw(pb),
            owners: ctx.owner_slots(m.id, p.owner_fractions.as_ref()),
            wmod: p.wmod.unwrap_or(0),
            wpf: p.wpf.unwrap_or(1.0),
        });
    }
    machines.sort_by_key(|g| g.index);
    Ok(machines)
}

fn rebuild_branches(ctx: &Context<'_>, cbt: &ComponentsByType<'_>) -> GrgResult<Vec<Branch>> {
    let indices = resolve_indices(
        "ac_line",
        cbt.ac_lines.iter().map(|l| (l.id.as_str(), l.source_id.as_deref())),
    )?;

    let mut branches = Vec::with_capacity(cbt.ac_lines.len());
    for line in &cbt.ac_lines {
        let (rate_a, rate_b, rate_c) = thermal_rates(&line.thermal_limits_1);
        let b = line.psse_line_charge.unwrap_or(0.0);
        let (gi, bi) = line
            .shunt_1
            .map(|s| (s.conductance, s.susceptance - b / 2.0))
            .unwrap_or((0.0, 0.0));
        let (gj, bj) = line
            .shunt_2
            .map(|s| (s.conductance, s.susceptance - b / 2.0))
            .unwrap_or((0.0, 0.0));

        branches.push(Branch {
            index: index_of(&indices, &line.id)?,
            i: ctx.bus_of(&line.link_1)?,
            j: ctx.bus_of(&line.link_2)?,
            ckt: line.circuit_id.clone().unwrap_or_default(),
            r: line.impedance.resistance,
            x: line.impedance.reactance,
            b,
            ratea: ctx.mw(rate_a),
            rateb: ctx.mw(rate_b),
            ratec: ctx.mw(rate_c),
            gi,
            bi,
            gj,
            bj,
            st: ctx.status(&[line.link_1.as_str(), line.link_2.as_str()]),
            met: line.met.unwrap_or(1),
            len: line.len.unwrap_or(0.0),
            owners: ctx.owner_slots(&line.id, line.owner_fractions.as_ref()),
        });
    }
    branches.sort_by_key(|b| b.index);
    Ok(branches)
}

fn rebuild_transformers(
    ctx: &Context<'_>,
    cbt: &ComponentsByType<'_>,
    buses: &[Bus],
    diagnostics: &mut Diagnostics,
) -> GrgResult<Vec<Transformer>> {
    let indices = resolve_indices(
        "two_winding_transformer",
        cbt.two_winding_transformers
            .iter()
            .map(|t| (t.id.as_str(), t.source_id.as_deref())),
    )?;
    let basekv = |number: i64| {
        buses
            .iter()
            .find(|b| b.i == number)
            .map(|b| b.basekv)
            .unwrap_or(1.0)
    };

    let mut transformers = Vec::with_capacity(cbt.two_winding_transformers.len());
    for xfmr in &cbt.two_winding_transformers {
        let key = format!("{}/tap_changer/position", xfmr.id);
        let Some(position) = ctx.starting.get(&key).and_then(|a| a.as_number()) else {
            diagnostics.add_warning_with_entity(
                Category::MissingTapPosition,
                "skipping transformer without a tap position setting",
                xfmr.id.clone(),
            );
            continue;
        };
        let tap = &xfmr.tap_changer;
        let step = tap.step_at(position.round() as i64).ok_or_else(|| {
            GrgError::TapSetting(format!(
                "tap position {position} of {} selects no tap changer step",
                xfmr.id
            ))
        })?;

        let i = ctx.bus_of(&xfmr.link_1)?;
        let j = ctx.bus_of(&xfmr.link_2)?;
        let p = &xfmr.parameters;
        let ratio = tap.transform.tap_ratio;
        let (rata, ratb, ratc) = thermal_rates(&xfmr.thermal_limits_1);

        let header = TransformerHeader {
            i,
            j,
            k: 0,
            ckt: xfmr.circuit_id.clone().unwrap_or_default(),
            cw: p.cw.unwrap_or(1),
            cz: p.cz.unwrap_or(1),
            cm: p.cm.unwrap_or(1),
            mag1: step.shunt.conductance,
            mag2: step.shunt.susceptance,
            nmetr: p.nmetr.unwrap_or(2),
            name: xfmr.psse_name.clone().unwrap_or_default(),
            stat: ctx.status(&[xfmr.link_1.as_str(), xfmr.link_2.as_str()]),
            owners: ctx.owner_slots(&xfmr.id, p.owner_fractions.as_ref()),
            vecgrp: p.vecgrp.clone().unwrap_or_default(),
        };

        transformers.push(Transformer::TwoWinding(TwoWindingTransformer {
            index: index_of(&indices, &xfmr.id)?,
            header,
            impedance: TwoWindingImpedance {
                r12: step.impedance.resistance,
                x12: step.impedance.reactance,
                sbase12: ctx.base.mva(),
            },
            winding_1: Winding {
                windv: step.transform.tap_ratio,
                nomv: p.nomv_1.unwrap_or_else(|| basekv(i)),
                ang: ctx.degrees(step.transform.angle_shift),
                rata: ctx.mw(rata),
                ratb: ctx.mw(ratb),
                ratc: ctx.mw(ratc),
                cod: p.cod.unwrap_or(0),
                cont: p.cont.unwrap_or(0),
                rma: ratio.max(),
                rmi: ratio.min(),
                vma: p.vma.unwrap_or(ratio.max()),
                vmi: p.vmi.unwrap_or(ratio.min()),
                ntp: tap.ntp.unwrap_or(33),
                tab: p.tab.unwrap_or(0),
                cr: p.cr.unwrap_or(0.0),
                cx: p.cx.unwrap_or(0.0),
                cnxa: p.cnxa.unwrap_or(0.0),
            },
            winding_2: ShortWinding {
                windv: 1.0,
                nomv: p.nomv_2.unwrap_or_else(|| basekv(j)),
            },
        }));
    }
    transformers.sort_by_key(|t| t.index());
    Ok(transformers)
}

/// Rebuild a RAW case from a per-unit bus-breaker document.
pub fn build_case(doc: &Document, options: &TranslationOptions) -> GrgResult<Translation<Case>> {
    let network = &doc.network;
    if !network.per_unit {
        return Err(GrgError::InvalidDocument(
            "network data is not given in per unit".to_string(),
        ));
    }

    let starting = doc.mapping(&options.starting_point_mapping)?;
    let assignment = switch_assignment(doc.mapping(&options.switch_assignment_mapping)?);

    let cbt = components_by_type(doc);
    if let Some(t) = cbt.three_winding_transformers.first() {
        return Err(GrgError::Unsupported(format!(
            "three winding transformer {} cannot be written back to RAW",
            t.id
        )));
    }

    let mut diagnostics = Diagnostics::new();
    let area_refs = group_refs(&doc.groups, GroupKind::Area);
    let zone_refs = group_refs(&doc.groups, GroupKind::Zone);
    let owner_refs = group_refs(&doc.groups, GroupKind::Owner);

    let base = SystemBase::new(network.sbase.unwrap_or(DEFAULT_BASE_MVA));
    let ctx = Context {
        base,
        precision: options.float_precision,
        points: VoltagePointIndex::build(doc, &assignment)?,
        starting,
        areas: resolve_membership("area", &area_refs, &mut diagnostics)?,
        zones: resolve_membership("zone", &zone_refs, &mut diagnostics)?,
        owners: resolve_owners(&owner_refs, &mut diagnostics)?,
    };
    debug!(
        merged = ctx.points.merged_buses().len(),
        switches = assignment.len(),
        "collapsed voltage points"
    );

    let levels = voltage_level_by_voltage_point(doc);
    let buses = rebuild_buses(&ctx, &cbt, &levels, &mut diagnostics)?;
    let loads = rebuild_loads(&ctx, &cbt, &mut diagnostics)?;
    let fixed_shunts = rebuild_fixed_shunts(&ctx, &cbt, &mut diagnostics)?;
    let generators = rebuild_generators(&ctx, &cbt)?;
    let branches = rebuild_branches(&ctx, &cbt)?;
    let transformers = rebuild_transformers(&ctx, &cbt, &buses, &mut diagnostics)?;

    let mut areas: Vec<Area> = area_refs
        .iter()
        .filter_map(|r| {
            let group = doc.groups.get(r.id)?;
            Some(Area {
                i: *ctx.areas.numbers.get(r.id)?,
                isw: group.isw.unwrap_or(0),
                pdes: group.pdes.unwrap_or(0.0),
                ptol: group.ptol.unwrap_or(10.0),
                arnam: group.name.clone(),
            })
        })
        .collect();
    areas.sort_by_key(|a| a.i);

    let mut zones: Vec<Zone> = zone_refs
        .iter()
        .filter_map(|r| {
            Some(Zone {
                i: *ctx.zones.numbers.get(r.id)?,
                zoname: doc.groups.get(r.id)?.name.clone(),
            })
        })
        .collect();
    zones.sort_by_key(|z| z.i);

    let mut owners: Vec<Owner> = owner_refs
        .iter()
        .filter_map(|r| {
            Some(Owner {
                i: *ctx.owners.numbers.get(r.id)?,
                owname: doc.groups.get(r.id)?.name.clone(),
            })
        })
        .collect();
    owners.sort_by_key(|o| o.i);

    let (record1, record2) = heading_records(network.description.as_deref());

    let case = Case {
        ic: network.ic.unwrap_or(0),
        sbase: network.sbase.unwrap_or(base.mva()),
        rev: network.rev.unwrap_or(PSSE_REVISION),
        xfrrat: network.xfrrat.unwrap_or(0),
        nxfrat: network.nxfrat.unwrap_or(0),
        basfrq: network.basfrq.unwrap_or(60.0),
        record1,
        record2,
        buses,
        loads,
        fixed_shunts,
        generators,
        branches,
        transformers,
        areas,
        zones,
        owners,
        switched_shunts: Vec::new(),
    };

    info!(
        buses = case.buses.len(),
        branches = case.branches.len(),
        transformers = case.transformers.len(),
        generators = case.generators.len(),
        warnings = diagnostics.warning_count(),
        "rebuilt RAW case from {}",
        network.id
    );

    Ok(Translation::new(case, diagnostics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forward::to_grg;
    use crate::psse::parse_raw;
    use psse2grg_core::grg::{Assignment, Component, Switch, SwitchStatus};

    const PAIR: &str = concat!(
        "0, 100.0, 33, 0, 0, 60.0\n",
        "PAIR OF BUSES\n",
        "TEST\n",
        "1, 'WEST', 138.0, 3, 1, 1, 1, 1.02, 0.0\n",
        "2, 'EAST', 138.0, 1, 1, 1, 1, 0.99, -2.5\n",
        "0\n",
        "2, '1', 1, 1, 1, 40.0, 12.5\n",
        "0\n",
        "2, 'S', 1, 0.0, 8.0\n",
        "0\n",
        "1, '1', 40.5, 3.0, 30.0, -30.0, 1.02, 0, 100.0, 0, 1, 0, 0, 1, 1, 100, 80.0, 0.0\n",
        "0\n",
        "1, 2, '1', 0.01, 0.1, 0.02, 100.0, 0.0, 0.0\n",
        "0\n",
        "0\n",
        "1, 0, 0.0, 10.0, 'AREA'\n",
        "0\n0\n0\n0\n0\n0\n",
        "1, 'ZONE'\n",
        "0\n0\n",
        "1, 'OWNER'\n",
        "0\n0\n",
        "2, 1, 0, 1, 1.05, 0.95, 0, 100.0, '', 5.0, 1, 5.0\n",
        "0\n",
        "Q\n"
    );

    fn forward(text: &str) -> Document {
        let case = parse_raw(text).unwrap();
        to_grg(&case, "pair", &TranslationOptions::default())
            .unwrap()
            .value
    }

    /// Join the first two buses with a closed coupler.
    fn couple(doc: &mut Document) {
        let (west, east) = {
            let cbt = components_by_type(doc);
            (cbt.buses[0].link.clone(), cbt.buses[1].link.clone())
        };
        let coupler = Switch {
            id: "coupler".to_string(),
            subtype: Some("breaker".to_string()),
            link_1: west,
            link_2: east,
            status: psse2grg_core::grg::SetVariable::binary(),
        };
        if let Some(Component::Substation(s)) = doc.network.components.get_mut("substation_1") {
            if let Some(Component::VoltageLevel(vl)) =
                s.substation_components.get_mut("voltage_level_1")
            {
                vl.voltage_level_components
                    .insert("coupler".to_string(), Component::Switch(coupler));
            }
        }
    }

    /// PAIR with a transformer next to the line.
    fn pair_with_transformer() -> String {
        PAIR.replace(
            "0.0, 0.0\n0\n0\n",
            concat!(
                "0.0, 0.0\n0\n",
                "1, 2, 0, 'T', 1, 1, 1, 0.0, 0.0, 2, 'TX', 1\n",
                "0.0, 0.05, 100.0\n",
                "1.0, 138.0\n",
                "1.0, 138.0\n",
                "0\n"
            ),
        )
    }

    /// PAIR with `count` fixed shunts on bus 2, numbered from 1.
    fn pair_with_shunts(count: usize, keep_switched: bool) -> String {
        let shunts: String = (1..=count)
            .map(|k| format!("2, '{k}', 1, 0.0, {k}.0\n"))
            .collect();
        let text = PAIR.replace("2, 'S', 1, 0.0, 8.0\n", &shunts);
        if keep_switched {
            text
        } else {
            text.replace("2, 1, 0, 1, 1.05, 0.95, 0, 100.0, '', 5.0, 1, 5.0\n", "")
        }
    }

    #[test]
    fn test_round_trip_fields() {
        let original = parse_raw(PAIR).unwrap();
        let out = build_case(&forward(PAIR), &TranslationOptions::default()).unwrap();
        let case = out.value;

        assert_eq!(case.buses, original.buses);
        assert_eq!(case.loads, original.loads);
        assert_eq!(case.fixed_shunts, original.fixed_shunts);
        assert_eq!(case.generators, original.generators);
        assert_eq!(case.branches, original.branches);
        assert_eq!(case.areas, original.areas);
        assert_eq!(case.record1, "PAIR OF BUSES");
        assert_eq!(case.record2, "TEST");
        assert!(case.switched_shunts.is_empty());

        let skipped: Vec<_> = out
            .diagnostics
            .issues_by_category(Category::VariableShunt)
            .collect();
        assert_eq!(skipped.len(), 1);
    }

    #[test]
    fn test_missing_mapping() {
        let options = TranslationOptions {
            starting_point_mapping: "nope".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            build_case(&forward(PAIR), &options),
            Err(GrgError::MissingMapping(name)) if name == "nope"
        ));
    }

    #[test]
    fn test_not_per_unit() {
        let mut doc = forward(PAIR);
        doc.network.per_unit = false;
        assert!(matches!(
            build_case(&doc, &TranslationOptions::default()),
            Err(GrgError::InvalidDocument(_))
        ));
    }

    #[test]
    fn test_open_breaker_clears_status() {
        let mut doc = forward(PAIR);
        let load_link = components_by_type(&doc).loads[0].link.clone();
        let breaker = components_by_type(&doc)
            .switches
            .iter()
            .find(|s| s.link_2 == load_link)
            .map(|s| s.id.clone())
            .unwrap();
        doc.mappings
            .get_mut("breakers_assignment")
            .unwrap()
            .insert(format!("{breaker}/status"), Assignment::Status(SwitchStatus::Off));

        let case = build_case(&doc, &TranslationOptions::default()).unwrap().value;
        assert_eq!(case.loads[0].status, 0);
        assert_eq!(case.loads[0].i, 2);
    }

    #[test]
    fn test_coupled_buses_merge() {
        let mut doc = forward(PAIR);
        couple(&mut doc);

        let out = build_case(&doc, &TranslationOptions::default()).unwrap();
        assert_eq!(out.value.buses.len(), 1);
        assert_eq!(out.value.buses[0].name, "WEST & EAST");
        assert_eq!(out.value.buses[0].i, 1);
        assert_eq!(out.value.loads[0].i, 1);
        assert_eq!(out.value.branches[0].i, out.value.branches[0].j);
        assert_eq!(out.diagnostics.issues_by_category(Category::BusMerge).count(), 1);
        assert!(out.diagnostics.issues_by_category(Category::BusTypeOverride).count() >= 1);
    }

    #[test]
    fn test_missing_groups_use_defaults() {
        let mut doc = forward(PAIR);
        doc.groups.clear();
        doc.market.operational_costs.clear();
        doc.operation_constraints.clear();

        let case = build_case(&doc, &TranslationOptions::default()).unwrap().value;
        assert_eq!(case.buses.len(), 2);
        assert_eq!(case.branches.len(), 1);
        assert_eq!(case.generators.len(), 1);
        assert!(case.areas.is_empty());
        assert_eq!(case.buses[1].area, 1);
    }

    #[test]
    fn test_heading_records() {
        assert_eq!(
            heading_records(Some(&format!("{DESCRIPTION_PREAMBLE}\nA\nB"))),
            ("A".to_string(), "B".to_string())
        );
        let long = "x".repeat(70);
        let (a, b) = heading_records(Some(&long));
        assert_eq!(a.len(), 60);
        assert_eq!(b.len(), 10);
        assert_eq!(heading_records(None), (String::new(), String::new()));
    }

    #[test]
    fn test_ten_fixed_shunts_keep_order() {
        let text = pair_with_shunts(10, false);
        let original = parse_raw(&text).unwrap();
        let doc = forward(&text);
        let ids: Vec<&str> = components_by_type(&doc)
            .shunts
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert!(ids.contains(&"shunt_10"));

        let case = build_case(&doc, &TranslationOptions::default()).unwrap().value;
        assert_eq!(case.fixed_shunts, original.fixed_shunts);
        assert_eq!(case.fixed_shunts[9].id, "10");
        assert_eq!(case.fixed_shunts[9].bl, 10.0);
    }

    #[test]
    fn test_switched_shunt_stays_out_of_fixed_numbering() {
        let text = pair_with_shunts(9, true);
        let original = parse_raw(&text).unwrap();
        let out = build_case(&forward(&text), &TranslationOptions::default()).unwrap();

        assert_eq!(out.value.fixed_shunts, original.fixed_shunts);
        assert_eq!(out.diagnostics.issues_by_category(Category::VariableShunt).count(), 1);
    }

    #[test]
    fn test_three_winding_is_unsupported() {
        let text = PAIR
            .replace(
                "2, 'EAST', 138.0, 1, 1, 1, 1, 0.99, -2.5\n",
                "2, 'EAST', 138.0, 1, 1, 1, 1, 0.99, -2.5\n3, 'STAR', 13.8, 1, 1, 1, 1\n",
            )
            .replace(
                "0.0, 0.0\n0\n0\n",
                concat!(
                    "0.0, 0.0\n0\n",
                    "1, 2, 3, 'T', 1, 1, 1, 0, 0, 2, 'T3', 1\n",
                    "0.0, 0.1, 100.0, 0.0, 0.2, 100.0, 0.0, 0.3, 100.0, 1.0, 0.0\n",
                    "1.0, 138.0\n",
                    "1.0, 138.0\n",
                    "1.0, 13.8\n",
                    "0\n"
                ),
            );
        let doc = forward(&text);
        assert_eq!(components_by_type(&doc).three_winding_transformers.len(), 1);
        assert!(matches!(
            build_case(&doc, &TranslationOptions::default()),
            Err(GrgError::Unsupported(_))
        ));
    }

    #[test]
    fn test_tap_position_without_step() {
        let mut doc = forward(&pair_with_transformer());
        let key = format!(
            "{}/tap_changer/position",
            components_by_type(&doc).two_winding_transformers[0].id
        );
        doc.mappings
            .get_mut("starting_points")
            .unwrap()
            .insert(key, Assignment::Number(5.0));

        assert!(matches!(
            build_case(&doc, &TranslationOptions::default()),
            Err(GrgError::TapSetting(_))
        ));
    }

    #[test]
    fn test_missing_tap_position_skips_transformer() {
        let text = pair_with_transformer();
        let complete = build_case(&forward(&text), &TranslationOptions::default()).unwrap();
        assert_eq!(complete.value.transformers.len(), 1);

        let mut doc = forward(&text);
        let key = format!(
            "{}/tap_changer/position",
            components_by_type(&doc).two_winding_transformers[0].id
        );
        doc.mappings.get_mut("starting_points").unwrap().remove(&key);

        let out = build_case(&doc, &TranslationOptions::default()).unwrap();
        assert!(out.value.transformers.is_empty());
        assert_eq!(
            out.diagnostics
                .issues_by_category(Category::MissingTapPosition)
                .count(),
            1
        );
    }

    #[test]
    fn test_merged_buses_disagree_first_wins() {
        let text = PAIR
            .replace(
                "2, 'EAST', 138.0, 1, 1, 1, 1, 0.99, -2.5\n",
                "2, 'EAST', 69.0, 1, 2, 1, 1, 0.99, -2.5\n",
            )
            .replace(
                "1, 0, 0.0, 10.0, 'AREA'\n",
                "1, 0, 0.0, 10.0, 'AREA'\n2, 0, 0.0, 10.0, 'OTHER'\n",
            );
        let mut doc = forward(&text);
        couple(&mut doc);

        let out = build_case(&doc, &TranslationOptions::default()).unwrap();
        let bus = &out.value.buses[0];
        assert_eq!(bus.area, 1);
        assert_eq!(bus.basekv, 138.0);

        let messages: Vec<&str> = out
            .diagnostics
            .issues_by_category(Category::InconsistentMerge)
            .map(|i| i.message.as_str())
            .collect();
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().any(|m| m.contains("area, keeping 1 over 2")));
        assert!(messages.iter().any(|m| m.contains("base kV, keeping 138 over 69")));
    }

    #[test]
    fn test_detached_isolated_bus_keeps_type() {
        let text = PAIR.replace(
            "2, 'EAST', 138.0, 1, 1, 1, 1, 0.99, -2.5\n",
            "2, 'EAST', 138.0, 1, 1, 1, 1, 0.99, -2.5\n3, 'SPARE', 138.0, 4, 1, 1, 1\n",
        );
        let out = build_case(&forward(&text), &TranslationOptions::default()).unwrap();

        assert_eq!(out.value.buses[2].ide, BusType::Isolated);
        let overrides = out
            .diagnostics
            .issues_by_category(Category::BusTypeOverride)
            .filter(|i| i.entity.as_deref() == Some("3"))
            .count();
        assert_eq!(overrides, 0);
    }

    #[test]
    fn test_load_with_several_owners_warns() {
        let mut doc = forward(PAIR);
        let load_id = components_by_type(&doc).loads[0].id.clone();
        let mut other = doc.groups["owner_1"].clone();
        other.source_id = Some("2".to_string());
        other.component_ids = vec![load_id.clone()];
        doc.groups.insert("owner_2".to_string(), other);

        let out = build_case(&doc, &TranslationOptions::default()).unwrap();
        assert_eq!(out.value.loads[0].owner, 1);
        let warnings: Vec<_> = out
            .diagnostics
            .issues_by_category(Category::MultipleMembership)
            .filter(|i| i.entity.as_deref() == Some(load_id.as_str()))
            .collect();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("load has several owners"));
    }
}
