//! Playback of a [`TrackLog`] at arbitrary, advancing times.
//!
//! Each entity keeps a cursor into the global sample sequence so that a
//! playback clock moving forward frame by frame only ever scans the samples
//! it has not yet passed. Querying an earlier time than before for the same
//! entity is refused until that entity is reset.

use super::{EntityId, Sample, TrackLog};
use thiserror::Error;
use ultraviolet::Vec3;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InterpolateError {
    #[error("unknown entity {0:?}")]
    UnknownEntity(String),

    #[error("time went backward for {entity:?}: queried {requested} after {previous}, reset first")]
    TimeWentBackward {
        entity: String,
        previous: f64,
        requested: f64,
    },

    #[error("query time {time} for {entity:?} is not a finite number")]
    NonFiniteTime { entity: String, time: f64 },

    #[error("zero-width interval for {entity:?} at time {time}")]
    DegenerateInterval { entity: String, time: f64 },
}

/// Where an entity is at some time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Position {
    /// The entity has no samples at all from the cursor on.
    NoData,
    /// Only samples at or before the query time exist; frozen at the latest one.
    Held(Vec3),
    /// Only samples after the query time exist; held at the earliest one.
    Extrapolated(Vec3),
    /// Blend of the samples bracketing the query time.
    Interpolated(Vec3),
}

impl Position {
    pub fn point(self) -> Option<Vec3> {
        match self {
            Position::NoData => None,
            Position::Held(p) | Position::Extrapolated(p) | Position::Interpolated(p) => Some(p),
        }
    }
}

/// Outcome of one forward scan: indices into the sample sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Scan {
    /// Latest sample of the entity at or before the query time.
    pub before: Option<usize>,
    /// First sample of the entity after the query time.
    pub after: Option<usize>,
    /// Where the next scan for this entity may start. Never less than the start.
    pub resume: usize,
}

/// Scans `samples` forward from `start` for the samples of `entity` bracketing `time`.
///
/// Stops at the first sample after `time`. Starting at 0 is a full scan.
pub fn scan(samples: &[Sample], entity: EntityId, start: usize, time: f64) -> Scan {
    let mut before = None;
    let mut after = None;
    let mut index = start;

    while let Some(sample) = samples.get(index) {
        if sample.entity == entity {
            if sample.time <= time {
                before = Some(index);
            } else {
                after = Some(index);
                break;
            }
        }
        index += 1;
    }

    Scan {
        before,
        after,
        resume: before.unwrap_or_else(|| index.min(samples.len())),
    }
}

/// Linear motion between two samples of one entity.
struct Bracket<'a> {
    before: &'a Sample,
    after: &'a Sample,
}

impl Bracket<'_> {
    /// `None` when the interval has no positive width.
    fn position(&self, time: f64) -> Option<Vec3> {
        let width = self.after.time - self.before.time;
        if !(width > 0.) {
            return None;
        }
        let f = ((time - self.before.time) / width) as f32;
        Some(self.before.position + (self.after.position - self.before.position) * f)
    }
}

#[derive(Clone, Copy, Default)]
struct Cursor {
    index: usize,
    last_time: Option<f64>,
}

pub struct Interpolator<'a> {
    log: &'a TrackLog,
    cursors: Vec<Cursor>,
}

impl<'a> Interpolator<'a> {
    pub fn new(log: &'a TrackLog) -> Self {
        Self {
            log,
            cursors: vec![Cursor::default(); log.registry().len()],
        }
    }

    pub fn query(&mut self, entity: &str, time: f64) -> Result<Position, InterpolateError> {
        let id = self.resolve(entity)?;
        self.query_id(id, time)
    }

    /// Position of `entity` at `time`, advancing its cursor.
    ///
    /// `time` must not be less than the previous query time of this entity
    /// since the last reset.
    pub fn query_id(&mut self, entity: EntityId, time: f64) -> Result<Position, InterpolateError> {
        let cursor = *self
            .cursors
            .get(entity.index())
            .ok_or_else(|| InterpolateError::UnknownEntity(entity.to_string()))?;

        // NaN would slip past the rewind check below and stick as last_time
        if !time.is_finite() {
            return Err(InterpolateError::NonFiniteTime {
                entity: self.name(entity),
                time,
            });
        }
        if let Some(previous) = cursor.last_time {
            if time < previous {
                return Err(InterpolateError::TimeWentBackward {
                    entity: self.name(entity),
                    previous,
                    requested: time,
                });
            }
        }

        let log = self.log;
        let samples = log.samples();
        let found = scan(samples, entity, cursor.index, time);
        let position = match (found.before, found.after) {
            (None, None) => Position::NoData,
            (Some(before), None) => Position::Held(samples[before].position),
            (None, Some(after)) => Position::Extrapolated(samples[after].position),
            (Some(before), Some(after)) => {
                let bracket = Bracket {
                    before: &samples[before],
                    after: &samples[after],
                };
                match bracket.position(time) {
                    Some(p) => Position::Interpolated(p),
                    None => {
                        return Err(InterpolateError::DegenerateInterval {
                            entity: self.name(entity),
                            time,
                        })
                    }
                }
            }
        };

        self.cursors[entity.index()] = Cursor {
            index: found.resume,
            last_time: Some(time),
        };
        Ok(position)
    }

    /// Every entity with a known position at `time`, in id order.
    ///
    /// Either every cursor advances or, on error, none does.
    pub fn positions_at(&mut self, time: f64) -> Result<Vec<(EntityId, Vec3)>, InterpolateError> {
        let log = self.log;
        let saved = self.cursors.clone();
        let mut positions = Vec::with_capacity(self.cursors.len());
        for (id, _) in log.registry().iter() {
            match self.query_id(id, time) {
                Ok(position) => positions.extend(position.point().map(|p| (id, p))),
                Err(e) => {
                    self.cursors = saved;
                    return Err(e);
                }
            }
        }
        Ok(positions)
    }

    /// Forgets the progress of one entity so it can be queried at any time again.
    pub fn reset(&mut self, entity: &str) -> Result<(), InterpolateError> {
        let id = self.resolve(entity)?;
        self.reset_id(id)
    }

    pub fn reset_id(&mut self, entity: EntityId) -> Result<(), InterpolateError> {
        let cursor = self
            .cursors
            .get_mut(entity.index())
            .ok_or_else(|| InterpolateError::UnknownEntity(entity.to_string()))?;
        *cursor = Cursor::default();
        Ok(())
    }

    pub fn reset_all(&mut self) {
        for cursor in self.cursors.iter_mut() {
            *cursor = Cursor::default();
        }
    }

    fn resolve(&self, entity: &str) -> Result<EntityId, InterpolateError> {
        self.log
            .registry()
            .id(entity)
            .ok_or_else(|| InterpolateError::UnknownEntity(entity.to_owned()))
    }

    fn name(&self, entity: EntityId) -> String {
        self.log
            .registry()
            .name(entity)
            .map_or_else(|| entity.to_string(), String::from)
    }
}
