//! End-to-end scenarios for production readiness.

use spatial_psh::{BuildError, PerfectSpatialHash, Point};

// ============================================================================
// S1: tiny 2-D sanity
// ============================================================================

#[test]
fn s1_tiny_2d_sanity() {
    let points: Vec<(Point<2, u32>, u32)> = vec![
        (Point::new([0, 0]), 100),
        (Point::new([1, 0]), 101),
        (Point::new([0, 1]), 102),
        (Point::new([1, 1]), 103),
        (Point::new([2, 3]), 104),
    ];

    let map: PerfectSpatialHash<2, u32, u32, u32> =
        PerfectSpatialHash::with_seed(points.clone(), 8, 1).expect("construction should succeed");

    for (p, v) in &points {
        assert_eq!(map.get(p), Some(v), "missing defined point {:?}", p.coords);
    }
    for x in 0..8u32 {
        for y in 0..8u32 {
            let p = Point::new([x, y]);
            if !points.iter().any(|(dp, _)| *dp == p) {
                assert_eq!(map.get(&p), None, "false hit at {:?}", p.coords);
            }
        }
    }
}

// ============================================================================
// S2: small 3-D voxel set
// ============================================================================

#[test]
fn s2_3d_voxel_small() {
    let mut points: Vec<(Point<3, u32>, u32)> = Vec::new();
    let mut value = 0u32;
    for x in 0..16u32 {
        for y in 0..16u32 {
            for z in 0..16u32 {
                if (x * 17 + y * 31 + z * 13) % 10 == 0 {
                    points.push((Point::new([x, y, z]), value));
                    value += 1;
                }
            }
        }
    }

    let map: PerfectSpatialHash<3, u32, u32, u32> =
        PerfectSpatialHash::with_seed(points.clone(), 16, 2).expect("construction should succeed");

    for (p, v) in &points {
        assert_eq!(map.get(p), Some(v));
    }

    let defined: std::collections::HashSet<[u32; 3]> =
        points.iter().map(|(p, _)| p.coords).collect();
    for x in 0..16u32 {
        for y in 0..16u32 {
            for z in 0..16u32 {
                let p = Point::new([x, y, z]);
                if !defined.contains(&p.coords) {
                    assert_eq!(map.get(&p), None, "false hit at {:?}", p.coords);
                }
            }
        }
    }
}

// ============================================================================
// S3: Game-of-Life one-step, exercising add() then rebuild()
// ============================================================================

#[test]
fn s3_game_of_life_one_step() {
    // A small glider-ish pattern of "alive" cells.
    let alive: Vec<Point<2, u32>> = vec![
        Point::new([1, 0]),
        Point::new([2, 1]),
        Point::new([0, 2]),
        Point::new([1, 2]),
        Point::new([2, 2]),
    ];
    let points: Vec<(Point<2, u32>, u32)> = alive.iter().map(|p| (*p, 1u32)).collect();

    let mut map: PerfectSpatialHash<2, u32, u32, u32> =
        PerfectSpatialHash::with_seed(points, 16, 3).expect("construction should succeed");

    // Re-stamping an already-alive cell is an in-place `add`.
    assert!(map.add(&alive[0], 2));
    assert_eq!(map.get(&alive[0]), Some(&2));

    // A cell born next step that wasn't previously defined must fail `add`
    // and require a `rebuild`.
    let newborn = Point::new([3, 3]);
    assert!(!map.add(&newborn, 1));
    assert_eq!(map.get(&newborn), None);

    map.rebuild(vec![(newborn, 1)]).expect("rebuild should succeed");
    assert_eq!(map.get(&newborn), Some(&1));
    assert_eq!(map.get(&alive[0]), Some(&2));
}

// ============================================================================
// S4: collision stress, 128x128 domain at ~50% density
// ============================================================================

#[test]
fn s4_collision_stress_dense_grid() {
    let mut points: Vec<(Point<2, u16>, u32)> = Vec::new();
    let mut value = 0u32;
    for x in 0..128u16 {
        for y in 0..128u16 {
            // deterministic pseudo-random ~50% density without external RNG
            if (x as u32 * 2654435761u32).wrapping_add(y as u32 * 40503) & 1 == 0 {
                points.push((Point::new([x, y]), value));
                value += 1;
            }
        }
    }

    let map: PerfectSpatialHash<2, u32, u16, u32> =
        PerfectSpatialHash::with_seed(points.clone(), 128, 4).expect("construction should succeed");

    for (p, v) in &points {
        assert_eq!(map.get(p), Some(v));
    }
    assert_eq!(map.len(), points.len());
}

// ============================================================================
// S5: parameter-width pressure, graceful failure handling
// ============================================================================

#[test]
fn s5_narrow_hash_int_width_may_fail_gracefully() {
    // `u8` positional-hash tags give the fixer very little room; a large,
    // dense key set should either construct correctly or fail with a
    // reported `BuildError`, never silently return wrong answers.
    let mut points: Vec<(Point<2, u32>, u32)> = Vec::new();
    for x in 0..40u32 {
        for y in 0..40u32 {
            points.push((Point::new([x, y]), x * 40 + y));
        }
    }

    let result: Result<PerfectSpatialHash<2, u32, u32, u8>, BuildError> =
        PerfectSpatialHash::with_seed(points.clone(), 40, 5);

    match result {
        Ok(map) => {
            for (p, v) in &points {
                assert_eq!(map.get(p), Some(v));
            }
        }
        Err(e) => {
            // Must be a recognized failure kind, not a panic or silent
            // corruption.
            assert!(matches!(
                e,
                BuildError::RetriesExhausted { .. }
                    | BuildError::FixerExhausted { .. }
                    | BuildError::JigglerExhausted { .. }
                    | BuildError::BadRatioRetriesExhausted { .. }
            ));
        }
    }
}

// ============================================================================
// S6: exhaustive non-membership with holes over the full 32^3 domain
// ============================================================================

#[test]
fn s6_exhaustive_non_membership_with_holes() {
    let mut points: Vec<(Point<3, u8>, u16)> = Vec::new();
    let mut value = 0u16;
    for x in 0..32u8 {
        for y in 0..32u8 {
            for z in 0..32u8 {
                // Punch holes: every 5th plane along x is left entirely undefined.
                if x % 5 != 0 && (x as u32 + y as u32 + z as u32) % 7 == 0 {
                    points.push((Point::new([x, y, z]), value));
                    value = value.wrapping_add(1);
                }
            }
        }
    }

    let map: PerfectSpatialHash<3, u16, u8, u32> =
        PerfectSpatialHash::with_seed(points.clone(), 32, 6).expect("construction should succeed");

    let defined: std::collections::HashSet<[u8; 3]> =
        points.iter().map(|(p, _)| p.coords).collect();

    for (p, v) in &points {
        assert_eq!(map.get(p), Some(v));
    }

    for x in 0..32u8 {
        for y in 0..32u8 {
            for z in 0..32u8 {
                let p = Point::new([x, y, z]);
                if !defined.contains(&p.coords) {
                    assert_eq!(map.get(&p), None, "false hit at {:?}", p.coords);
                }
            }
        }
    }
}
