//! RAW case to GRG bus-breaker document.
//!
//! Each bus becomes its own voltage level; voltage levels joined by
//! transformers share a substation. Every component attached to a bus is
//! moved behind a breaker whose assigned state combines the component and
//! bus in-service flags.

use std::collections::{BTreeMap, HashMap};

use psse2grg_core::config::{DEFAULT_ANGLE_DIFFERENCE, GRG_UNITS, GRG_VERSION};
use psse2grg_core::grg::{
    thermal_limits, AcLine, Admittance, AdmittanceRange, Assignment, Bus as GrgBus, Component,
    CondenserOutput, CostModel, Document, FixedAdmittance, Generator as GrgGenerator,
    GeneratorOutput, Group, GroupKind, Impedance, ImpedanceRange, Load as GrgLoad,
    MachineParameters, Mapping, Market, Network, NominalVoltage, PowerAssignment, PowerValue,
    Range, SetVariable, Shunt, ShuntAdmittance, Substation, SwitchStatus, SynchronousCondenser,
    TapChanger, TapStep, ThreeWindingTransformer as GrgThreeWinding, Transform, TransformRange,
    TransformerParameters, TwoWindingTransformer as GrgTwoWinding, VoltageLevel, VoltageValue,
    VoltageVariables, Winding as GrgWinding, BUS_BREAKER,
};
use psse2grg_core::ids::{IdKind, MachineLabels, Sequence};
use psse2grg_core::units::{Degrees, Megawatts, SystemBase};
use psse2grg_core::{
    combine_status, validate_document, Category, Diagnostics, GrgError, GrgResult,
    SubstationPartition, SwitchAllocator, Translation, TranslationOptions,
};
use tracing::{debug, error, info};

use crate::psse::{
    BusType, Case, Generator, Owners, ThreeWindingTransformer, Transformer,
    TwoWindingTransformer,
};

/// First line of every generated network description. The two RAW heading
/// lines follow it.
pub const DESCRIPTION_PREAMBLE: &str =
    "Translated from PSS/E v33 data by psse2grg. Source file description:";

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

fn status_flag(flag: i64) -> SwitchStatus {
    SwitchStatus::from_flag(flag)
}

struct Builder<'a> {
    case: &'a Case,
    base: SystemBase,
    options: &'a TranslationOptions,
    diagnostics: Diagnostics,

    bus_ids: HashMap<i64, String>,
    bus_points: HashMap<i64, String>,
    bus_status: HashMap<i64, SwitchStatus>,
    level_of: HashMap<i64, usize>,
    levels: Vec<VoltageLevel>,

    area_ids: HashMap<i64, String>,
    zone_ids: HashMap<i64, String>,
    owner_ids: HashMap<i64, String>,
    owner_position: HashMap<i64, usize>,
    groups: BTreeMap<String, Group>,

    switches: SwitchAllocator,
    starting_points: Mapping,
    breakers: Mapping,
    network_components: BTreeMap<String, Component>,
}

impl<'a> Builder<'a> {
    fn new(case: &'a Case, options: &'a TranslationOptions) -> Self {
        let three_winding = case.transformers.len() - case.two_winding_count();
        let capacity = SwitchAllocator::capacity_for(
            case.buses.len(),
            case.loads.len(),
            case.fixed_shunts.len() + case.switched_shunts.len(),
            case.generators.len(),
            case.branches.len(),
            case.transformers.len(),
            three_winding,
        );

        Self {
            case,
            base: SystemBase::new(case.sbase),
            options,
            diagnostics: Diagnostics::new(),
            bus_ids: HashMap::new(),
            bus_points: HashMap::new(),
            bus_status: HashMap::new(),
            level_of: HashMap::new(),
            levels: Vec::new(),
            area_ids: HashMap::new(),
            zone_ids: HashMap::new(),
            owner_ids: HashMap::new(),
            owner_position: HashMap::new(),
            groups: BTreeMap::new(),
            switches: SwitchAllocator::with_capacity(capacity),
            starting_points: Mapping::new(),
            breakers: Mapping::new(),
            network_components: BTreeMap::new(),
        }
    }

    fn pu(&self, mw: f64) -> f64 {
        self.base.to_per_unit(Megawatts(mw)).value()
    }

    fn subtype(&self, name: &str) -> Option<String> {
        if self.options.omit_subtypes {
            None
        } else {
            Some(name.to_string())
        }
    }

    fn join_group(&mut self, group_id: Option<&String>, member: &str) {
        if let Some(group) = group_id.and_then(|id| self.groups.get_mut(id)) {
            group.component_ids.push(member.to_string());
        }
    }

    fn build_groups(&mut self) {
        let case = self.case;
        let mut areas = Sequence::new(IdKind::Area, case.areas.len());
        for area in &case.areas {
            let id = areas.next_id();
            let mut group = Group::new(GroupKind::Area, area.arnam.clone(), area.i);
            group.isw = Some(area.isw);
            group.pdes = Some(area.pdes);
            group.ptol = Some(area.ptol);
            self.area_ids.insert(area.i, id.clone());
            self.groups.insert(id, group);
        }

        let mut zones = Sequence::new(IdKind::Zone, case.zones.len());
        for zone in &case.zones {
            let id = zones.next_id();
            self.zone_ids.insert(zone.i, id.clone());
            self.groups
                .insert(id, Group::new(GroupKind::Zone, zone.zoname.clone(), zone.i));
        }

        let mut owners = Sequence::new(IdKind::Owner, case.owners.len());
        for (position, owner) in case.owners.iter().enumerate() {
            let id = owners.next_id();
            self.owner_ids.insert(owner.i, id.clone());
            self.owner_position.insert(owner.i, position);
            self.groups
                .insert(id, Group::new(GroupKind::Owner, owner.owname.clone(), owner.i));
        }
    }

    /// Add a component to the owner groups of its owner slots. Returns the
    /// fractions of the owners that were added, in owner table order.
    fn add_owners(&mut self, owners: &Owners, component_id: &str) -> Option<Vec<f64>> {
        let mut added: Vec<(usize, f64)> = Vec::new();
        for share in owners {
            if share.fraction == 0.0 {
                continue;
            }
            if let Some(position) = self.owner_position.get(&share.owner).copied() {
                let group = self.owner_ids.get(&share.owner).cloned();
                self.join_group(group.as_ref(), component_id);
                added.push((position, share.fraction));
            }
        }
        if added.is_empty() {
            return None;
        }
        added.sort_by_key(|(position, _)| *position);
        Some(added.into_iter().map(|(_, f)| f).collect())
    }

    fn build_buses(&mut self) {
        let case = self.case;
        let total = case.buses.len();
        let bus_seq = Sequence::new(IdKind::Bus, total);
        let point_seq = Sequence::new(IdKind::BusVoltage, total);
        let level_seq = Sequence::new(IdKind::VoltageLevel, total);

        if self.options.omit_subtypes {
            for bus in &case.buses {
                self.diagnostics.add_warning_with_entity(
                    Category::Subtype,
                    "buses carry no subtype to omit",
                    bus.i.to_string(),
                );
            }
        }

        for (idx, bus) in case.buses.iter().enumerate() {
            let id = bus_seq.id_for(idx + 1);
            let point = point_seq.id_for(idx + 1);

            let component = GrgBus {
                id: id.clone(),
                source_id: Some(bus.i.to_string()),
                psse_name: Some(bus.name.clone()),
                link: point.clone(),
                voltage: VoltageVariables {
                    magnitude: Range::new(bus.nvlo, bus.nvhi),
                    angle: Range::unbounded(),
                },
                reference: (bus.ide == BusType::Reference).then_some(true),
                psse_bus_type: Some(bus.ide.code()),
                evhi: Some(bus.evhi),
                evlo: Some(bus.evlo),
            };

            let mut level = VoltageLevel {
                id: level_seq.id_for(idx + 1),
                voltage: NominalVoltage {
                    lower_limit: bus.nvlo,
                    upper_limit: bus.nvhi,
                    nominal_value: bus.basekv,
                },
                voltage_points: vec![point.clone()],
                voltage_level_components: BTreeMap::new(),
            };
            level
                .voltage_level_components
                .insert(id.clone(), Component::Bus(component));

            self.starting_points.insert(
                format!("{id}/voltage"),
                Assignment::Voltage(VoltageValue {
                    magnitude: bus.vm,
                    angle: Degrees(bus.va).to_radians().value(),
                }),
            );

            for (kind, number, table) in [
                ("area", bus.area, &self.area_ids),
                ("zone", bus.zone, &self.zone_ids),
                ("owner", bus.owner, &self.owner_ids),
            ] {
                match table.get(&number).cloned() {
                    Some(group) => {
                        if let Some(g) = self.groups.get_mut(&group) {
                            g.component_ids.push(id.clone());
                        }
                    }
                    None => self.diagnostics.add_warning_with_entity(
                        Category::Reference,
                        format!("{kind} {number} of bus {} is not in the {kind} table", bus.i),
                        id.clone(),
                    ),
                }
            }

            self.bus_status.insert(
                bus.i,
                if bus.ide == BusType::Isolated {
                    SwitchStatus::Off
                } else {
                    SwitchStatus::On
                },
            );
            self.bus_ids.insert(bus.i, id);
            self.bus_points.insert(bus.i, point);
            self.level_of.insert(bus.i, idx);
            self.levels.push(level);
        }
    }

    /// Put a breaker between `bus` and a new point in the bus's voltage
    /// level. Returns the new point for the component to link to.
    fn breaker(&mut self, bus: i64, status: SwitchStatus) -> GrgResult<String> {
        let unknown = || GrgError::UnknownBus {
            bus,
            component: "switch".to_string(),
        };
        let mut link = self.bus_points.get(&bus).cloned().ok_or_else(unknown)?;
        let level = *self.level_of.get(&bus).ok_or_else(unknown)?;
        let bus_status = self.bus_status.get(&bus).copied().unwrap_or(SwitchStatus::On);

        let (switch, point) = self.switches.insert(&mut link);
        self.breakers.insert(
            format!("{}/status", switch.id),
            Assignment::Status(combine_status([status, bus_status])),
        );

        let level = &mut self.levels[level];
        level.voltage_points.push(point.clone());
        level
            .voltage_level_components
            .insert(switch.id.clone(), Component::Switch(switch));
        Ok(point)
    }

    fn place(&mut self, bus: i64, component: Component) -> GrgResult<()> {
        let level = *self.level_of.get(&bus).ok_or_else(|| GrgError::UnknownBus {
            bus,
            component: component.id().to_string(),
        })?;
        self.levels[level]
            .voltage_level_components
            .insert(component.id().to_string(), component);
        Ok(())
    }

    fn build_loads(&mut self) -> GrgResult<()> {
        let case = self.case;
        let seq = Sequence::new(IdKind::Load, case.loads.len());
        for load in &case.loads {
            let id = seq.id_for(load.index + 1);
            let link = self.breaker(load.i, status_flag(load.status))?;
            let demand = PowerValue {
                active: self.pu(load.pl),
                reactive: self.pu(load.ql),
            };

            let component = GrgLoad {
                id: id.clone(),
                source_id: Some(load.index.to_string()),
                psse_id: Some(load.id.clone()),
                link,
                subtype: self.subtype("withdrawal"),
                demand,
                ip: Some(self.pu(load.ip)),
                iq: Some(self.pu(load.iq)),
                yp: Some(self.pu(load.yp)),
                yq: Some(self.pu(load.yq)),
                scale: Some(load.scale),
                intrpt: Some(load.intrpt),
            };
            self.place(load.i, Component::Load(component))?;

            self.starting_points.insert(
                format!("{id}/demand"),
                Assignment::Power(PowerAssignment {
                    active: Some(demand.active),
                    reactive: Some(demand.reactive),
                }),
            );

            // areas and zones missing from the tables are inherited from the bus
            let area = self.area_ids.get(&load.area).cloned();
            let zone = self.zone_ids.get(&load.zone).cloned();
            let owner = self.owner_ids.get(&load.owner).cloned();
            self.join_group(area.as_ref(), &id);
            self.join_group(zone.as_ref(), &id);
            self.join_group(owner.as_ref(), &id);
        }
        Ok(())
    }

    fn build_shunts(&mut self) -> GrgResult<()> {
        let case = self.case;
        let mut seq = Sequence::new(
            IdKind::Shunt,
            case.fixed_shunts.len() + case.switched_shunts.len(),
        );

        for shunt in &case.fixed_shunts {
            let id = seq.next_id();
            let link = self.breaker(shunt.i, status_flag(shunt.status))?;
            let subtype = if shunt.bl >= 0.0 { "inductor" } else { "capacitor" };
            let component = Shunt {
                id,
                source_id: Some(shunt.index.to_string()),
                psse_id: Some(shunt.id.clone()),
                link,
                subtype: self.subtype(subtype),
                shunt: ShuntAdmittance {
                    conductance: Admittance::Fixed(self.pu(shunt.gl)),
                    susceptance: Admittance::Fixed(self.pu(shunt.bl)),
                },
            };
            self.place(shunt.i, Component::Shunt(component))?;
        }

        for shunt in &case.switched_shunts {
            let id = seq.next_id();
            let link = self.breaker(shunt.i, status_flag(shunt.stat))?;

            let mut steps: Vec<f64> = shunt
                .susceptance_steps()
                .into_iter()
                .map(|b| self.pu(b))
                .collect();
            steps.sort_by(f64::total_cmp);
            steps.dedup();

            let component = Shunt {
                id: id.clone(),
                source_id: None,
                psse_id: None,
                link,
                subtype: None,
                shunt: ShuntAdmittance {
                    conductance: Admittance::Fixed(0.0),
                    susceptance: Admittance::Set(SetVariable { var: steps }),
                },
            };
            self.place(shunt.i, Component::Shunt(component))?;

            self.starting_points.insert(
                format!("{id}/shunt/susceptance"),
                Assignment::Number(self.pu(shunt.binit)),
            );
        }
        Ok(())
    }

    fn machine_parameters(&self, gen: &Generator, owner_fractions: Option<Vec<f64>>) -> MachineParameters {
        MachineParameters {
            vs: Some(gen.vs),
            ireg: Some(gen.ireg),
            zr: Some(gen.zr),
            zx: Some(gen.zx),
            rt: Some(gen.rt),
            xt: Some(gen.xt),
            gtap: Some(gen.gtap),
            rmpct: Some(gen.rmpct),
            wmod: Some(gen.wmod),
            wpf: Some(gen.wpf),
            owner_fractions,
        }
    }

    fn build_generators(&mut self) -> GrgResult<Market> {
        let case = self.case;
        let mut labels = MachineLabels::new(case.generators.len());
        let mut market = Market::default();

        for gen in &case.generators {
            let condenser = gen.is_synchronous_condenser();
            let (id, _) = labels.assign(condenser);
            let link = self.breaker(gen.i, status_flag(gen.stat))?;
            let owner_fractions = self.add_owners(&gen.owners, &id);
            let parameters = self.machine_parameters(gen, owner_fractions);
            let reactive = Range::new(self.pu(gen.qb), self.pu(gen.qt));

            let (component, output) = if condenser {
                let component = Component::SynchronousCondenser(SynchronousCondenser {
                    id: id.clone(),
                    source_id: Some(gen.index.to_string()),
                    psse_id: Some(gen.id.clone()),
                    link,
                    mbase: Some(gen.mbase),
                    output: CondenserOutput { reactive },
                    parameters,
                });
                let output = PowerAssignment {
                    active: None,
                    reactive: Some(self.pu(gen.qg)),
                };
                (component, output)
            } else {
                let component = Component::Generator(GrgGenerator {
                    id: id.clone(),
                    source_id: Some(gen.index.to_string()),
                    psse_id: Some(gen.id.clone()),
                    link,
                    subtype: None,
                    mbase: Some(gen.mbase),
                    output: GeneratorOutput {
                        active: Range::new(self.pu(gen.pb), self.pu(gen.pt)),
                        reactive,
                    },
                    parameters,
                });
                market.operational_costs.insert(
                    id.clone(),
                    CostModel {
                        kind: "polynomial".to_string(),
                        input: format!("{id}/output/active"),
                        coefficients: vec![0.0, self.base.mva(), 0.0],
                    },
                );
                let output = PowerAssignment {
                    active: Some(self.pu(gen.pg)),
                    reactive: Some(self.pu(gen.qg)),
                };
                (component, output)
            };

            self.place(gen.i, component)?;
            self.starting_points
                .insert(format!("{id}/output"), Assignment::Power(output));
        }

        Ok(market)
    }

    fn build_branches(&mut self) -> GrgResult<BTreeMap<String, Range>> {
        let case = self.case;
        let seq = Sequence::new(IdKind::Line, case.branches.len());
        let mut constraints = BTreeMap::new();

        for branch in &case.branches {
            let id = seq.id_for(branch.index + 1);
            let status = status_flag(branch.st);
            let link_1 = self.breaker(branch.i, status)?;
            let link_2 = self.breaker(branch.j, status)?;
            let limits = thermal_limits(
                self.pu(branch.ratea),
                self.pu(branch.rateb),
                self.pu(branch.ratec),
            );
            let owner_fractions = self.add_owners(&branch.owners, &id);

            let line = AcLine {
                id: id.clone(),
                source_id: Some(branch.index.to_string()),
                subtype: self.subtype("overhead"),
                link_1,
                link_2,
                thermal_limits_1: limits.clone(),
                thermal_limits_2: limits,
                impedance: Impedance {
                    resistance: branch.r,
                    reactance: branch.x,
                },
                circuit_id: Some(branch.ckt.clone()),
                psse_line_charge: Some(branch.b),
                shunt_1: Some(FixedAdmittance {
                    conductance: branch.gi,
                    susceptance: branch.bi + branch.b / 2.0,
                }),
                shunt_2: Some(FixedAdmittance {
                    conductance: branch.gj,
                    susceptance: branch.bj + branch.b / 2.0,
                }),
                met: Some(branch.met),
                len: Some(branch.len),
                owner_fractions,
            };

            constraints.insert(
                format!("{id}/angle_difference"),
                Range::new(-DEFAULT_ANGLE_DIFFERENCE, DEFAULT_ANGLE_DIFFERENCE),
            );
            self.network_components.insert(id, Component::AcLine(line));
        }

        Ok(constraints)
    }

    fn two_winding(&mut self, id: &str, t: &TwoWindingTransformer) -> GrgResult<Component> {
        if !close(t.impedance.sbase12, self.base.mva()) {
            return Err(GrgError::Unsupported(format!(
                "transformer {} has SBASE1-2 {} different from the system base {}",
                t.index,
                t.impedance.sbase12,
                self.base.mva()
            )));
        }
        if !close(t.winding_2.windv, 1.0) {
            return Err(GrgError::Unsupported(format!(
                "transformer {} has WINDV2 {}, only 1.0 is supported",
                t.index, t.winding_2.windv
            )));
        }

        let h = &t.header;
        let w1 = &t.winding_1;
        let status = status_flag(h.stat);
        let link_1 = self.breaker(h.i, status)?;
        let link_2 = self.breaker(h.j, status)?;
        let limits = thermal_limits(self.pu(w1.rata), self.pu(w1.ratb), self.pu(w1.ratc));
        let angle = Degrees(w1.ang).to_radians().value();
        let impedance = Impedance {
            resistance: t.impedance.r12,
            reactance: t.impedance.x12,
        };
        let shunt = FixedAdmittance {
            conductance: h.mag1,
            susceptance: h.mag2,
        };
        let owner_fractions = self.add_owners(&h.owners, id);

        let tap_changer = TapChanger {
            position: Range::fixed(0.0),
            impedance: ImpedanceRange {
                resistance: Range::fixed(impedance.resistance),
                reactance: Range::fixed(impedance.reactance),
            },
            shunt: AdmittanceRange {
                conductance: Range::fixed(shunt.conductance),
                susceptance: Range::fixed(shunt.susceptance),
            },
            transform: TransformRange {
                tap_ratio: Range::new(w1.rmi, w1.rma),
                angle_shift: Range::fixed(angle),
            },
            steps: vec![TapStep {
                position: 0,
                impedance,
                shunt,
                transform: Transform {
                    tap_ratio: w1.windv,
                    angle_shift: angle,
                },
            }],
            ntp: Some(w1.ntp),
        };

        self.starting_points.insert(
            format!("{id}/tap_changer/position"),
            Assignment::Number(0.0),
        );

        Ok(Component::TwoWindingTransformer(GrgTwoWinding {
            id: id.to_string(),
            source_id: Some(t.index.to_string()),
            subtype: self.subtype("PI_model"),
            link_1,
            link_2,
            thermal_limits_1: limits.clone(),
            thermal_limits_2: limits,
            circuit_id: Some(h.ckt.clone()),
            psse_name: Some(h.name.clone()),
            tap_changer,
            parameters: TransformerParameters {
                cw: Some(h.cw),
                cz: Some(h.cz),
                cm: Some(h.cm),
                nmetr: Some(h.nmetr),
                vecgrp: Some(h.vecgrp.clone()),
                cod: Some(w1.cod),
                cont: Some(w1.cont),
                vma: Some(w1.vma),
                vmi: Some(w1.vmi),
                tab: Some(w1.tab),
                cr: Some(w1.cr),
                cx: Some(w1.cx),
                cnxa: Some(w1.cnxa),
                nomv_1: Some(w1.nomv),
                nomv_2: Some(t.winding_2.nomv),
                owner_fractions,
            },
        }))
    }

    fn three_winding(&mut self, id: &str, t: &ThreeWindingTransformer) -> GrgResult<Component> {
        let z = &t.impedance;
        for sbase in [z.sbase12, z.sbase23, z.sbase31] {
            if !close(sbase, self.base.mva()) {
                return Err(GrgError::Unsupported(format!(
                    "transformer {} has a winding base {sbase} different from the system base {}",
                    t.index,
                    self.base.mva()
                )));
            }
        }

        let h = &t.header;
        let status = status_flag(h.stat);
        let link_1 = self.breaker(h.i, status)?;
        let link_2 = self.breaker(h.j, status)?;
        let link_3 = self.breaker(h.k, status)?;
        let [l1, l2, l3] = t
            .windings
            .map(|w| thermal_limits(self.pu(w.rata), self.pu(w.ratb), self.pu(w.ratc)));
        let owner_fractions = self.add_owners(&h.owners, id);

        self.starting_points.insert(
            format!("{id}/star_point"),
            Assignment::Voltage(VoltageValue {
                magnitude: z.vmstar,
                angle: Degrees(z.anstar).to_radians().value(),
            }),
        );

        Ok(Component::ThreeWindingTransformer(GrgThreeWinding {
            id: id.to_string(),
            source_id: Some(t.index.to_string()),
            subtype: self.subtype("PI_model"),
            link_1,
            link_2,
            link_3,
            thermal_limits_1: l1,
            thermal_limits_2: l2,
            thermal_limits_3: l3,
            circuit_id: Some(h.ckt.clone()),
            psse_name: Some(h.name.clone()),
            impedance_12: Impedance { resistance: z.r12, reactance: z.x12 },
            impedance_23: Impedance { resistance: z.r23, reactance: z.x23 },
            impedance_31: Impedance { resistance: z.r31, reactance: z.x31 },
            windings: t
                .windings
                .iter()
                .map(|w| GrgWinding {
                    tap_ratio: w.windv,
                    angle_shift: Degrees(w.ang).to_radians().value(),
                    nominal_voltage: w.nomv,
                })
                .collect(),
            parameters: TransformerParameters {
                cw: Some(h.cw),
                cz: Some(h.cz),
                cm: Some(h.cm),
                nmetr: Some(h.nmetr),
                vecgrp: Some(h.vecgrp.clone()),
                owner_fractions,
                ..Default::default()
            },
        }))
    }

    /// Build transformers and gather voltage levels into substations.
    fn build_substations(&mut self) -> GrgResult<()> {
        let case = self.case;
        let bus_numbers: Vec<i64> = case.buses.iter().map(|b| b.i).collect();
        let windings: Vec<Vec<i64>> = case.transformers.iter().map(|t| t.buses()).collect();
        let partition = SubstationPartition::build(&bus_numbers, &windings)?;
        debug!(substations = partition.len(), "clustered buses");

        let mut contents: Vec<BTreeMap<String, Component>> = vec![BTreeMap::new(); partition.len()];

        let seq = Sequence::new(IdKind::Transformer, case.transformers.len());
        for transformer in &case.transformers {
            let id = seq.id_for(transformer.index() + 1);
            let class = partition.common_substation(&transformer.buses())?;
            let component = match transformer {
                Transformer::TwoWinding(t) => self.two_winding(&id, t)?,
                Transformer::ThreeWinding(t) => self.three_winding(&id, t)?,
            };
            contents[class].insert(id, component);
        }

        let levels = std::mem::take(&mut self.levels);
        for (bus, level) in case.buses.iter().zip(levels) {
            let class = partition.substation_of(bus.i).ok_or_else(|| {
                GrgError::TopologyInvariant(format!("bus {} is in no substation", bus.i))
            })?;
            contents[class].insert(level.id.clone(), Component::VoltageLevel(level));
        }

        let seq = Sequence::new(IdKind::Substation, case.buses.len());
        for (class, substation_components) in contents.into_iter().enumerate() {
            let id = seq.id_for(class + 1);
            self.network_components.insert(
                id.clone(),
                Component::Substation(Substation {
                    id,
                    substation_components,
                }),
            );
        }
        Ok(())
    }
}

/// Translate a RAW case into a GRG document named `network_id`.
pub fn to_grg(
    case: &Case,
    network_id: &str,
    options: &TranslationOptions,
) -> GrgResult<Translation<Document>> {
    case.check_bus_references()?;

    let mut builder = Builder::new(case, options);
    builder.build_groups();
    builder.build_buses();
    builder.build_loads()?;
    builder.build_shunts()?;
    let market = builder.build_generators()?;
    let operation_constraints = builder.build_branches()?;
    builder.build_substations()?;

    let mut mappings = BTreeMap::new();
    mappings.insert(
        options.starting_point_mapping.clone(),
        std::mem::take(&mut builder.starting_points),
    );
    mappings.insert(
        options.switch_assignment_mapping.clone(),
        std::mem::take(&mut builder.breakers),
    );

    let doc = Document {
        grg_version: GRG_VERSION.to_string(),
        units: GRG_UNITS.to_string(),
        network: Network {
            kind: "network".to_string(),
            id: network_id.to_string(),
            subtype: BUS_BREAKER.to_string(),
            per_unit: true,
            description: Some(format!(
                "{DESCRIPTION_PREAMBLE}\n{}\n{}",
                case.record1, case.record2
            )),
            sbase: Some(case.sbase),
            ic: Some(case.ic),
            rev: Some(case.rev),
            xfrrat: Some(case.xfrrat),
            nxfrat: Some(case.nxfrat),
            basfrq: Some(case.basfrq),
            components: std::mem::take(&mut builder.network_components),
        },
        groups: std::mem::take(&mut builder.groups),
        mappings,
        market,
        operation_constraints,
    };

    info!(
        switches = builder.switches.inserted(),
        warnings = builder.diagnostics.warning_count(),
        "built GRG network {network_id}"
    );

    if !options.skip_validation {
        let report = validate_document(&doc);
        if report.has_errors() {
            let json = doc.to_json_pretty().unwrap_or_default();
            error!(document = %json, "generated document failed validation");
            let first: Vec<String> = report.errors().take(5).map(|e| e.to_string()).collect();
            return Err(GrgError::InvalidDocument(format!(
                "{}: {}",
                report.summary(),
                first.join("; ")
            )));
        }
    }

    Ok(Translation::new(doc, builder.diagnostics))
}
