//! Breaker synthesis.
//!
//! RAW records carry an in-service flag; GRG models the same thing as a
//! breaker between the component and its bus. Each link of a component is
//! moved onto a fresh `switch_voltage_<n>` point and a breaker joins that
//! point back to the original one.

use crate::grg::{SetVariable, Switch, SwitchStatus};
use crate::ids::{IdKind, Sequence};

/// Hands out breaker and switch voltage point ids from one counter.
///
/// The width is fixed up front from the worst-case count so every switch id
/// in a document has the same number of digits.
#[derive(Debug, Clone)]
pub struct SwitchAllocator {
    switches: Sequence,
    points: Sequence,
    inserted: usize,
}

impl SwitchAllocator {
    pub fn with_capacity(total: usize) -> Self {
        Self {
            switches: Sequence::new(IdKind::Switch, total),
            points: Sequence::new(IdKind::SwitchVoltage, total),
            inserted: 0,
        }
    }

    /// Worst-case slot count for a RAW case: one per single-link record and
    /// per branch or transformer end.
    pub fn capacity_for(
        buses: usize,
        loads: usize,
        shunts: usize,
        machines: usize,
        branches: usize,
        transformers: usize,
        three_winding: usize,
    ) -> usize {
        buses + loads + shunts + machines + 2 * branches + 2 * transformers + three_winding
    }

    /// Move `link` onto a new switch voltage point and return the breaker
    /// connecting it to the old one.
    ///
    /// Returns the switch and the new point, which the caller must declare in
    /// the owning voltage level.
    pub fn insert(&mut self, link: &mut String) -> (Switch, String) {
        let switch_id = self.switches.next_id();
        let point = self.points.next_id();
        let original = std::mem::replace(link, point.clone());
        self.inserted += 1;

        let switch = Switch {
            id: switch_id,
            subtype: Some("breaker".to_string()),
            link_1: original,
            link_2: point.clone(),
            status: SetVariable::binary(),
        };
        (switch, point)
    }

    pub fn inserted(&self) -> usize {
        self.inserted
    }
}

/// A breaker is closed only when every participating status is on.
pub fn combine_status<I>(statuses: I) -> SwitchStatus
where
    I: IntoIterator<Item = SwitchStatus>,
{
    if statuses.into_iter().any(|s| s == SwitchStatus::Off) {
        SwitchStatus::Off
    } else {
        SwitchStatus::On
    }
}
