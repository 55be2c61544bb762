//! MarkerReconciler and RenderedState unit tests

#[cfg(test)]
mod tests {
    use restomap::entity::{EntityBatch, EntityKind, SpatialEntity};
    use restomap::geo::{self, LatLng};
    use restomap::protocol::PointResponse;
    use restomap::reconcile::{
        clear_kind, reconcile, replace_user_marker, DrawInstruction, RenderedState,
        USER_MARKER_ID,
    };

    fn make_cluster(id: &str, lat: f64, lng: f64) -> SpatialEntity {
        SpatialEntity::Cluster {
            id: id.into(),
            location: LatLng::new(lat, lng),
            count: 5,
            cell_id: (0, 0),
        }
    }

    fn make_event(id: &str, lat: f64, lng: f64) -> SpatialEntity {
        SpatialEntity::Event {
            id: id.into(),
            location: LatLng::new(lat, lng),
            schedule: "daily".into(),
            is_active: true,
        }
    }

    fn batch(kind: EntityKind, entities: Vec<SpatialEntity>) -> EntityBatch {
        EntityBatch { kind, entities }
    }

    fn draw_count(instructions: &[DrawInstruction]) -> usize {
        instructions
            .iter()
            .filter(|i| matches!(i, DrawInstruction::Draw { .. }))
            .count()
    }

    fn remove_count(instructions: &[DrawInstruction]) -> usize {
        instructions
            .iter()
            .filter(|i| matches!(i, DrawInstruction::Remove { .. }))
            .count()
    }

    // -----------------------------------------------------------------------
    // Ephemeral kinds
    // -----------------------------------------------------------------------

    #[test]
    fn ephemeral_diff_adds_and_removes_by_id() {
        let mut state = RenderedState::new();
        let first = batch(
            EntityKind::Cluster,
            vec![make_cluster("a", 52.5, 13.3), make_cluster("b", 52.6, 13.4)],
        );
        let instructions = reconcile(EntityKind::Cluster, &first, &mut state);
        assert_eq!(draw_count(&instructions), 2);
        assert_eq!(remove_count(&instructions), 0);

        let second = batch(
            EntityKind::Cluster,
            vec![make_cluster("b", 52.6, 13.4), make_cluster("c", 52.7, 13.5)],
        );
        let instructions = reconcile(EntityKind::Cluster, &second, &mut state);
        assert_eq!(draw_count(&instructions), 1);
        assert_eq!(remove_count(&instructions), 1);
        assert!(state.contains(EntityKind::Cluster, "b"));
        assert!(state.contains(EntityKind::Cluster, "c"));
        assert!(!state.contains(EntityKind::Cluster, "a"));
    }

    #[test]
    fn identical_batch_twice_is_a_no_op() {
        let mut state = RenderedState::new();
        let incoming = batch(
            EntityKind::Cluster,
            vec![make_cluster("a", 52.5, 13.3), make_cluster("b", 52.6, 13.4)],
        );
        let first = reconcile(EntityKind::Cluster, &incoming, &mut state);
        assert_eq!(first.len(), 2);
        let second = reconcile(EntityKind::Cluster, &incoming, &mut state);
        assert!(second.is_empty());
    }

    #[test]
    fn empty_batch_clears_all_markers_of_that_kind() {
        let mut state = RenderedState::new();
        let incoming = batch(
            EntityKind::Cluster,
            vec![make_cluster("a", 52.5, 13.3), make_cluster("b", 52.6, 13.4)],
        );
        reconcile(EntityKind::Cluster, &incoming, &mut state);

        let empty = EntityBatch::new(EntityKind::Cluster);
        let instructions = reconcile(EntityKind::Cluster, &empty, &mut state);
        assert_eq!(remove_count(&instructions), 2);
        assert_eq!(state.marker_count(EntityKind::Cluster), 0);
    }

    #[test]
    fn clear_kind_is_wholesale() {
        let mut state = RenderedState::new();
        let incoming = batch(
            EntityKind::Cluster,
            vec![make_cluster("a", 52.5, 13.3), make_cluster("b", 52.6, 13.4)],
        );
        reconcile(EntityKind::Cluster, &incoming, &mut state);

        let instructions = clear_kind(EntityKind::Cluster, &mut state);
        assert_eq!(instructions.len(), 2);
        assert!(instructions
            .iter()
            .all(|i| matches!(i, DrawInstruction::Remove { .. })));
        assert_eq!(state.marker_count(EntityKind::Cluster), 0);
    }

    // -----------------------------------------------------------------------
    // Persistent kind (events)
    // -----------------------------------------------------------------------

    #[test]
    fn events_are_never_removed_by_reconciliation() {
        let mut state = RenderedState::new();
        let both = batch(
            EntityKind::Event,
            vec![make_event("e1", 52.50, 13.40), make_event("e2", 52.52, 13.41)],
        );
        let instructions = reconcile(EntityKind::Event, &both, &mut state);
        assert_eq!(draw_count(&instructions), 2);

        // A later pass with only e1 leaves e2's marker drawn.
        let only_first = batch(EntityKind::Event, vec![make_event("e1", 52.50, 13.40)]);
        let instructions = reconcile(EntityKind::Event, &only_first, &mut state);
        assert!(instructions.is_empty());
        assert!(state.contains(EntityKind::Event, "e2"));

        // Even an empty batch removes nothing.
        let empty = EntityBatch::new(EntityKind::Event);
        let instructions = reconcile(EntityKind::Event, &empty, &mut state);
        assert!(instructions.is_empty());
        assert_eq!(state.marker_count(EntityKind::Event), 2);
    }

    #[test]
    fn new_events_are_appended() {
        let mut state = RenderedState::new();
        let first = batch(EntityKind::Event, vec![make_event("e1", 52.50, 13.40)]);
        reconcile(EntityKind::Event, &first, &mut state);

        let mixed = batch(
            EntityKind::Event,
            vec![make_event("e1", 52.50, 13.40), make_event("e3", 52.49, 13.38)],
        );
        let instructions = reconcile(EntityKind::Event, &mixed, &mut state);
        assert_eq!(draw_count(&instructions), 1);
        assert_eq!(state.marker_count(EntityKind::Event), 2);
    }

    // -----------------------------------------------------------------------
    // Malformed entities
    // -----------------------------------------------------------------------

    #[test]
    fn malformed_coordinates_skip_the_entity_only() {
        let mut restaurants = Vec::new();
        for i in 0..10 {
            let coords = if i == 3 {
                r#"["13.0","NaN"]"#.to_string()
            } else {
                format!(r#"[{}, {}]"#, 13.30 + i as f64 * 0.01, 52.50)
            };
            restaurants.push(format!(
                r#"{{"id":"r{i}","location":{{"coordinates":{coords}}},"is_available":true,"onboarded":true}}"#
            ));
        }
        let body = format!(r#"{{"restaurants":[{}]}}"#, restaurants.join(","));
        let resp: PointResponse = serde_json::from_str(&body).unwrap();
        let incoming = resp.into_batch();
        assert_eq!(incoming.len(), 9);

        let mut state = RenderedState::new();
        let instructions = reconcile(EntityKind::Restaurant, &incoming, &mut state);
        assert_eq!(draw_count(&instructions), 9);
        assert!(!state.contains(EntityKind::Restaurant, "r3"));
    }

    // -----------------------------------------------------------------------
    // Distance guard
    // -----------------------------------------------------------------------

    #[test]
    fn distance_guard_drops_entities_beyond_radius() {
        let center = LatLng::new(52.516, 13.322);
        // ~0.055 degrees of latitude is ~6.1 km.
        let far = make_cluster("far", 52.516 + 0.0549, 13.322);
        let near = make_cluster("near", 52.52, 13.33);
        assert!(geo::haversine_km(center, far.location()) > 6.0);

        let kept = geo::retain_within(vec![near, far], center, 5.0, |e| e.location());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id(), "near");
    }

    // -----------------------------------------------------------------------
    // User marker
    // -----------------------------------------------------------------------

    #[test]
    fn user_marker_is_always_a_full_replace() {
        let mut state = RenderedState::new();

        let here = LatLng::new(52.51, 13.32);
        let instructions = replace_user_marker(&mut state, Some(here));
        assert_eq!(instructions.len(), 1);
        assert!(matches!(
            &instructions[0],
            DrawInstruction::Draw { id, .. } if id == USER_MARKER_ID
        ));

        let there = LatLng::new(52.53, 13.35);
        let instructions = replace_user_marker(&mut state, Some(there));
        assert_eq!(instructions.len(), 2);
        assert!(matches!(&instructions[0], DrawInstruction::Remove { .. }));
        assert!(matches!(&instructions[1], DrawInstruction::Draw { .. }));
        assert_eq!(state.user_marker(), Some(there));

        let instructions = replace_user_marker(&mut state, None);
        assert_eq!(instructions.len(), 1);
        assert_eq!(state.user_marker(), None);
    }
}
