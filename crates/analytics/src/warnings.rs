//! Run-scoped collection of data-integrity warnings.
//!
//! A `Warnings` value is created by whoever starts a unit of work, passed
//! down by `&mut`, and handed back with the results. Nothing here outlives
//! the run that created it.

use data_loader::{ActorId, ContentRef, DataIntegrityError, DirectorId};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use tracing::warn;

/// The unit of work a warning was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "unit", content = "id", rename_all = "snake_case")]
pub enum WorkUnit {
    Actor(ActorId),
    Director(DirectorId),
    Content(ContentRef),
    Collaboration,
}

impl fmt::Display for WorkUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkUnit::Actor(id) => write!(f, "actor {}", id),
            WorkUnit::Director(id) => write!(f, "director {}", id),
            WorkUnit::Content(content) => write!(f, "{}", content),
            WorkUnit::Collaboration => f.write_str("collaboration analysis"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub unit: WorkUnit,
    pub error: DataIntegrityError,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.unit, self.error)
    }
}

/// Accumulates warnings for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Warnings {
    items: Vec<Warning>,
}

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning and log it
    pub fn push(&mut self, unit: WorkUnit, error: DataIntegrityError) {
        warn!(%unit, "{}", error);
        self.items.push(Warning { unit, error });
    }

    /// Take over other accumulators' warnings without logging them again.
    ///
    /// A bad record reached from several units of work (a movie shared by
    /// many actors) is kept once, under the first unit that reported it.
    pub fn absorb_distinct(&mut self, others: impl IntoIterator<Item = Warnings>) {
        let mut seen: HashSet<DataIntegrityError> =
            self.items.iter().map(|w| w.error.clone()).collect();
        for warning in others.into_iter().flat_map(|w| w.items) {
            if seen.insert(warning.error.clone()) {
                self.items.push(warning);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Warning> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Warning] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<Warning> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::MovieId;

    fn out_of_range(movie: u32) -> DataIntegrityError {
        DataIntegrityError::RatingOutOfRange {
            content: ContentRef::Movie(MovieId(movie)),
            value: 7,
        }
    }

    #[test]
    fn test_push_and_absorb() {
        let mut run = Warnings::new();
        let mut unit = Warnings::new();

        unit.push(WorkUnit::Actor(ActorId(3)), out_of_range(1));
        run.absorb_distinct([unit]);

        assert_eq!(run.len(), 1);
        assert_eq!(
            run.as_slice()[0].to_string(),
            "[actor 3] rating 7 on movie 1 is outside 1..=5"
        );
    }

    #[test]
    fn test_absorb_keeps_first_report_of_each_error() {
        let mut run = Warnings::new();
        run.push(WorkUnit::Collaboration, out_of_range(2));

        let units: Vec<Warnings> = [3, 5]
            .into_iter()
            .map(|actor| {
                let mut unit = Warnings::new();
                unit.push(WorkUnit::Actor(ActorId(actor)), out_of_range(1));
                unit.push(WorkUnit::Actor(ActorId(actor)), out_of_range(2));
                unit
            })
            .collect();
        run.absorb_distinct(units);

        let units: Vec<WorkUnit> = run.iter().map(|w| w.unit).collect();
        assert_eq!(
            units,
            vec![WorkUnit::Collaboration, WorkUnit::Actor(ActorId(3))]
        );
        assert_eq!(run.as_slice()[1].error, out_of_range(1));
    }
}
