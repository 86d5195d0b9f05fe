// Series materializer - projects tracked entities and windows into chart series
use crate::domain::chart::palette_color;
use crate::domain::registry::EntityRegistry;
use crate::domain::telemetry::{Series, SeriesPoint};
use crate::domain::window::WindowedSeriesStore;

/// Build the render-ready series list, ordered by admission.
pub fn materialize(registry: &EntityRegistry, store: &WindowedSeriesStore) -> Vec<Series> {
    registry
        .entities()
        .iter()
        .map(|entity| {
            let data = store
                .buffer(&entity.entity_id)
                .map(|buffer| {
                    buffer
                        .iter()
                        .map(|s| SeriesPoint::new(s.timestamp.clone(), s.speed))
                        .collect()
                })
                .unwrap_or_default();

            Series::new(entity.entity_id.clone(), palette_color(entity.color_slot), data)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chart::PALETTE;

    #[test]
    fn test_series_follow_admission_order() {
        let mut registry = EntityRegistry::default();
        let mut store = WindowedSeriesStore::default();

        let arrivals = [
            ("b", "t1", 1.0),
            ("a", "t2", 2.0),
            ("b", "t3", 3.0),
            ("c", "t4", 4.0),
            ("a", "t5", 5.0),
        ];
        for (id, t, v) in arrivals {
            registry.admit_or_lookup(id);
            store.append(id, t.to_string(), v);
        }

        let series = materialize(&registry, &store);
        let labels: Vec<&str> = series.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["b", "a", "c"]);
        assert_eq!(series[0].data, vec![
            SeriesPoint::new("t1".to_string(), 1.0),
            SeriesPoint::new("t3".to_string(), 3.0),
        ]);
    }

    #[test]
    fn test_colors_assigned_by_ordinal() {
        let mut registry = EntityRegistry::default();
        let mut store = WindowedSeriesStore::default();
        for id in ["x", "y"] {
            registry.admit_or_lookup(id);
            store.append(id, "t".to_string(), 0.0);
        }

        let series = materialize(&registry, &store);
        assert_eq!(series[0].border_color, PALETTE[0]);
        assert_eq!(series[1].border_color, PALETTE[1]);
    }

    #[test]
    fn test_empty_registry_materializes_nothing() {
        let series = materialize(&EntityRegistry::default(), &WindowedSeriesStore::default());
        assert!(series.is_empty());
    }
}
