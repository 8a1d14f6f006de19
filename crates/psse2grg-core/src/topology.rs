//! Substation clustering.
//!
//! RAW files have no notion of substations. Buses joined by a chain of two or
//! three winding transformers are grouped into one substation; every bus
//! still gets its own voltage level inside it.

use std::collections::{BTreeMap, HashMap};

use crate::error::{GrgError, GrgResult};

/// Array backed union-find with path compression.
#[derive(Debug, Clone)]
pub struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    pub fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    pub fn find(&mut self, i: usize) -> usize {
        let mut root = i;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut node = i;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    pub fn union(&mut self, a: usize, b: usize) {
        let pa = self.find(a);
        let pb = self.find(b);
        if pa != pb {
            self.parent[pa] = pb;
        }
    }
}

/// Partition of the bus set into substations.
///
/// Classes are numbered from `0` in ascending order of their smallest bus
/// number, so the result does not depend on record order.
#[derive(Debug, Clone)]
pub struct SubstationPartition {
    classes: Vec<Vec<i64>>,
    class_of: HashMap<i64, usize>,
}

impl SubstationPartition {
    /// Cluster `buses` over the winding buses of each transformer.
    pub fn build<T>(buses: &[i64], transformers: &[T]) -> GrgResult<Self>
    where
        T: AsRef<[i64]>,
    {
        let position: HashMap<i64, usize> =
            buses.iter().enumerate().map(|(idx, bus)| (*bus, idx)).collect();
        let mut sets = UnionFind::new(buses.len());

        for (idx, windings) in transformers.iter().enumerate() {
            let windings = windings.as_ref();
            let mut first = None;
            for bus in windings {
                let pos = *position.get(bus).ok_or_else(|| GrgError::UnknownBus {
                    bus: *bus,
                    component: format!("transformer {idx}"),
                })?;
                match first {
                    None => first = Some(pos),
                    Some(root) => sets.union(root, pos),
                }
            }
        }

        let mut grouped: HashMap<usize, Vec<i64>> = HashMap::new();
        for (idx, bus) in buses.iter().enumerate() {
            grouped.entry(sets.find(idx)).or_default().push(*bus);
        }

        let mut ordered: BTreeMap<i64, Vec<i64>> = BTreeMap::new();
        for (_, mut members) in grouped {
            members.sort_unstable();
            if let Some(min) = members.first().copied() {
                ordered.insert(min, members);
            }
        }

        let classes: Vec<Vec<i64>> = ordered.into_values().collect();
        let class_of = classes
            .iter()
            .enumerate()
            .flat_map(|(class, members)| members.iter().map(move |bus| (*bus, class)))
            .collect();

        Ok(Self { classes, class_of })
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Buses of each class, sorted, in class order.
    pub fn classes(&self) -> &[Vec<i64>] {
        &self.classes
    }

    pub fn substation_of(&self, bus: i64) -> Option<usize> {
        self.class_of.get(&bus).copied()
    }

    /// The single class holding every given bus.
    ///
    /// Transformer buses always share a class after [`Self::build`], so a
    /// failure here means the clustering itself is broken.
    pub fn common_substation(&self, buses: &[i64]) -> GrgResult<usize> {
        let mut common = None;
        for bus in buses {
            let class = self.substation_of(*bus).ok_or_else(|| {
                GrgError::TopologyInvariant(format!("bus {bus} is in no substation"))
            })?;
            match common {
                None => common = Some(class),
                Some(c) if c != class => {
                    return Err(GrgError::TopologyInvariant(format!(
                        "buses {buses:?} span substations {c} and {class}"
                    )));
                }
                Some(_) => {}
            }
        }
        common.ok_or_else(|| GrgError::TopologyInvariant("no buses given".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_find() {
        let mut uf = UnionFind::new(5);
        uf.union(0, 1);
        uf.union(3, 4);
        uf.union(1, 4);
        assert_eq!(uf.find(0), uf.find(3));
        assert_ne!(uf.find(0), uf.find(2));
        assert_eq!(uf.len(), 5);
    }

    #[test]
    fn test_partition_without_transformers() {
        let partition = SubstationPartition::build::<[i64; 2]>(&[3, 1, 2], &[]).unwrap();
        assert_eq!(partition.classes(), &[vec![1], vec![2], vec![3]]);
    }

    #[test]
    fn test_partition_is_strict_and_ordered_by_min_bus() {
        let buses = [10, 20, 30, 40, 50];
        let transformers = vec![vec![50, 20], vec![30, 40, 10]];
        let partition = SubstationPartition::build(&buses, &transformers).unwrap();

        assert_eq!(partition.classes(), &[vec![10, 30, 40], vec![20, 50]]);

        let mut seen: Vec<i64> = partition.classes().iter().flatten().copied().collect();
        seen.sort_unstable();
        assert_eq!(seen, buses.to_vec());

        for t in &transformers {
            assert!(partition.common_substation(t).is_ok());
        }
    }

    #[test]
    fn test_chained_transformers_merge() {
        let buses = [1, 2, 3, 4];
        let transformers = vec![[1, 2], [2, 3]];
        let partition = SubstationPartition::build(&buses, &transformers).unwrap();
        assert_eq!(partition.len(), 2);
        assert_eq!(partition.substation_of(3), Some(0));
        assert_eq!(partition.substation_of(4), Some(1));
    }

    #[test]
    fn test_common_substation_detects_split() {
        let partition = SubstationPartition::build::<[i64; 2]>(&[1, 2], &[]).unwrap();
        let err = partition.common_substation(&[1, 2]).unwrap_err();
        assert!(matches!(err, GrgError::TopologyInvariant(_)));
    }

    #[test]
    fn test_unknown_transformer_bus() {
        let err = SubstationPartition::build(&[1, 2], &[[1, 9]]).unwrap_err();
        assert!(matches!(err, GrgError::UnknownBus { bus: 9, .. }));
    }
}
