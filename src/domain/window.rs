// Windowed series store - fixed-capacity FIFO of samples per entity
use std::collections::{HashMap, VecDeque};

pub const DEFAULT_MAX_LEN: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub timestamp: String,
    pub speed: f64,
}

/// Samples for one entity, each carrying its own timestamp, oldest first.
#[derive(Debug, Clone)]
pub struct SeriesBuffer {
    max_len: usize,
    samples: VecDeque<Sample>,
}

impl SeriesBuffer {
    pub fn new(max_len: usize) -> Self {
        Self {
            max_len,
            samples: VecDeque::new(),
        }
    }

    pub fn push(&mut self, timestamp: String, speed: f64) {
        self.samples.push_back(Sample { timestamp, speed });
        while self.samples.len() > self.max_len {
            self.samples.pop_front();
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.samples.len()
    }
}

#[derive(Debug)]
pub struct WindowedSeriesStore {
    max_len: usize,
    buffers: HashMap<String, SeriesBuffer>,
}

impl WindowedSeriesStore {
    pub fn new(max_len: usize) -> Self {
        Self {
            max_len,
            buffers: HashMap::new(),
        }
    }

    /// Append a sample for an admitted entity, evicting the oldest on overflow.
    pub fn append(&mut self, entity_id: &str, timestamp: String, speed: f64) {
        let max_len = self.max_len;
        match self.buffers.get_mut(entity_id) {
            Some(buffer) => buffer.push(timestamp, speed),
            None => {
                let mut buffer = SeriesBuffer::new(max_len);
                buffer.push(timestamp, speed);
                self.buffers.insert(entity_id.to_string(), buffer);
            }
        }
    }

    pub fn buffer(&self, entity_id: &str) -> Option<&SeriesBuffer> {
        self.buffers.get(entity_id)
    }
}

impl Default for WindowedSeriesStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LEN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn speeds(store: &WindowedSeriesStore, entity_id: &str) -> Vec<f64> {
        store
            .buffer(entity_id)
            .map(|b| b.iter().map(|s| s.speed).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_append_keeps_arrival_order() {
        let mut store = WindowedSeriesStore::default();
        store.append("d1", "t1".to_string(), 1.0);
        store.append("d1", "t2".to_string(), 2.0);

        let buffer = store.buffer("d1").unwrap();
        let timestamps: Vec<&str> = buffer.iter().map(|s| s.timestamp.as_str()).collect();
        assert_eq!(timestamps, vec!["t1", "t2"]);
        assert_eq!(speeds(&store, "d1"), vec![1.0, 2.0]);
    }

    #[test]
    fn test_window_evicts_oldest_first() {
        let mut store = WindowedSeriesStore::new(3);
        for i in 0..7 {
            store.append("d1", format!("t{}", i), i as f64);
        }

        assert_eq!(store.buffer("d1").unwrap().len(), 3);
        assert_eq!(speeds(&store, "d1"), vec![4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_length_grows_until_capacity() {
        let mut store = WindowedSeriesStore::new(4);
        for i in 0..4 {
            store.append("d1", format!("t{}", i), i as f64);
            assert_eq!(store.buffer("d1").unwrap().len(), i + 1);
        }
    }

    #[test]
    fn test_entities_have_independent_timelines() {
        let mut store = WindowedSeriesStore::new(2);
        store.append("d1", "t1".to_string(), 1.0);
        store.append("d2", "t2".to_string(), 2.0);
        store.append("d1", "t3".to_string(), 3.0);
        store.append("d1", "t4".to_string(), 4.0);

        assert_eq!(speeds(&store, "d1"), vec![3.0, 4.0]);
        assert_eq!(speeds(&store, "d2"), vec![2.0]);
        assert!(store.buffer("d3").is_none());
    }

    #[test]
    fn test_huge_window_allocates_lazily() {
        let mut store = WindowedSeriesStore::new(usize::MAX);
        store.append("d1", "t1".to_string(), 1.0);
        store.append("d1", "t2".to_string(), 2.0);

        assert_eq!(speeds(&store, "d1"), vec![1.0, 2.0]);
    }
}
