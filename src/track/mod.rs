//! Time-stamped entity positions and playback over them.

pub mod interpolate;
mod load;

pub use interpolate::{InterpolateError, Interpolator, Position};
pub use load::{load, load_path, LoadError};

use crate::aabb::AABB;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::Range;
use ultraviolet::Vec3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(u32);

impl EntityId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Every distinct entity name seen in a log. Ids are dense and follow name order.
#[derive(Debug, Default)]
pub struct Registry {
    names: Vec<String>,
    ids: BTreeMap<String, EntityId>,
}

impl Registry {
    fn from_names<'a>(names: impl Iterator<Item = &'a str>) -> Self {
        let names: Vec<String> = names
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(String::from)
            .collect();
        let ids = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), EntityId(i as u32)))
            .collect();
        Self { names, ids }
    }

    pub fn id(&self, name: &str) -> Option<EntityId> {
        self.ids.get(name).copied()
    }

    pub fn name(&self, id: EntityId) -> Option<&str> {
        self.names.get(id.index()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, name)| (EntityId(i as u32), name.as_str()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub entity: EntityId,
    pub time: f64,
    pub position: Vec3,
}

/// All samples of a log in ascending time order, interleaved across entities.
#[derive(Debug)]
pub struct TrackLog {
    registry: Registry,
    samples: Vec<Sample>,
}

impl TrackLog {
    /// Builds a log from `(name, time, position)` rows in any order.
    ///
    /// Rows are stably sorted by time, so samples of one entity sharing a
    /// timestamp keep their input order.
    pub fn from_rows<S: AsRef<str>>(rows: Vec<(S, f64, Vec3)>) -> Self {
        let registry = Registry::from_names(rows.iter().map(|(name, _, _)| name.as_ref()));

        if rows.windows(2).any(|pair| pair[0].1 > pair[1].1) {
            log::warn!("Samples are not in time order, sorting {} rows", rows.len());
        }

        let mut samples: Vec<Sample> = rows
            .iter()
            .map(|(name, time, position)| Sample {
                // Every name was registered above
                entity: registry.ids[name.as_ref()],
                time: *time,
                position: *position,
            })
            .collect();
        samples.sort_by(|a, b| a.time.total_cmp(&b.time));

        Self { registry, samples }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Times of the first and last sample.
    pub fn time_span(&self) -> Option<Range<f64>> {
        Some(self.samples.first()?.time..self.samples.last()?.time)
    }

    pub fn bounds(&self) -> Option<AABB> {
        AABB::from_points(self.samples.iter().map(|s| s.position))
    }
}
