use crate::adaptive::MistakeTracker;
use crate::generator::StationGenerator;
use crate::station::Station;
use rand::Rng;
use tracing::debug;

/// Stable handle to a station in a [`StationPool`].
///
/// Ids are never reused, so a handle kept across a removal simply stops
/// resolving instead of pointing at a different station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StationId(u64);

/// The stations currently calling, in call order.
#[derive(Debug, Clone)]
pub struct StationPool {
    entries: Vec<(StationId, Station)>,
    next_id: u64,
    min: usize,
    max: usize,
}

impl StationPool {
    pub fn new(min: usize, max: usize) -> Self {
        let mut pool = Self {
            entries: Vec::new(),
            next_id: 0,
            min: 0,
            max: 0,
        };
        pool.set_bounds(min, max);
        pool
    }

    /// `max` is raised to at least `max(min, 1)`.
    pub fn set_bounds(&mut self, min: usize, max: usize) {
        self.min = min;
        self.max = max.max(min).max(1);
    }

    pub fn bounds(&self) -> (usize, usize) {
        (self.min, self.max)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.max
    }

    /// Append a station unless the pool is full.
    pub fn push(&mut self, station: Station) -> Option<StationId> {
        if self.is_full() {
            return None;
        }
        let id = StationId(self.next_id);
        self.next_id += 1;
        debug!(callsign = %station.callsign, active = self.entries.len() + 1, "station joined");
        self.entries.push((id, station));
        Some(id)
    }

    /// Draw stations until the pool holds `min`. Returns the new ids.
    pub fn ensure_minimum<G, R>(
        &mut self,
        generator: &mut G,
        tracker: &MistakeTracker,
        rng: &mut R,
    ) -> Vec<StationId>
    where
        G: StationGenerator,
        R: Rng + ?Sized,
    {
        let mut added = Vec::new();
        while self.entries.len() < self.min {
            match self.push(generator.next_station(tracker, rng)) {
                Some(id) => added.push(id),
                None => break,
            }
        }
        added
    }

    /// With probability `p`, draw one more station if there is room.
    pub fn maybe_add_one<G, R>(
        &mut self,
        p: f64,
        generator: &mut G,
        tracker: &MistakeTracker,
        rng: &mut R,
    ) -> Option<StationId>
    where
        G: StationGenerator,
        R: Rng + ?Sized,
    {
        if self.is_full() || !rng.gen_bool(p.clamp(0.0, 1.0)) {
            return None;
        }
        self.push(generator.next_station(tracker, rng))
    }

    pub fn remove(&mut self, id: StationId) -> Option<Station> {
        let idx = self.entries.iter().position(|(i, _)| *i == id)?;
        let (_, station) = self.entries.remove(idx);
        debug!(callsign = %station.callsign, active = self.entries.len(), "station left");
        Some(station)
    }

    pub fn get(&self, id: StationId) -> Option<&Station> {
        self.entries.iter().find(|(i, _)| *i == id).map(|(_, s)| s)
    }

    pub fn get_mut(&mut self, id: StationId) -> Option<&mut Station> {
        self.entries.iter_mut().find(|(i, _)| *i == id).map(|(_, s)| s)
    }

    pub fn contains(&self, id: StationId) -> bool {
        self.get(id).is_some()
    }

    pub fn ids(&self) -> Vec<StationId> {
        self.entries.iter().map(|(id, _)| *id).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StationId, &Station)> {
        self.entries.iter().map(|(id, s)| (*id, s))
    }

    pub fn stations(&self) -> impl Iterator<Item = &Station> {
        self.entries.iter().map(|(_, s)| s)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
