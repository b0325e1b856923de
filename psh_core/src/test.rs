use crate::entry::position_hash;
use crate::map::PerfectSpatialHash;
use crate::point::{index_to_point, point_to_index, Point};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn point_index_round_trips() {
    let width = 7u64;
    let cap = width * width * width;
    for raw in 0..cap {
        let p: Point<3, u32> = index_to_point(raw, width, cap);
        let back = point_to_index(&p, width, cap);
        assert_eq!(raw, back);
    }
}

#[test]
fn point_add_and_scale_wrap() {
    let a: Point<2, u8> = Point::new([250, 10]);
    let b: Point<2, u8> = Point::new([10, 250]);
    let sum = a.add(&b);
    assert_eq!(sum.coords, [4, 4]); // 250+10=260 -> wraps to 4 (mod 256)

    let scaled = a.scale(3);
    assert_eq!(scaled.coords[1], 30);
}

#[test]
fn position_hash_changes_with_k() {
    let p: Point<2, u32> = Point::new([3, 5]);
    let h1: u32 = position_hash(&p, 12345, 1u32);
    let h2: u32 = position_hash(&p, 12345, 2u32);
    assert_ne!(h1, h2, "distinct k should (almost always) retag a point");
}

#[test]
fn tiny_2d_map_round_trips_every_key() {
    init_logger();
    let points: Vec<(Point<2, u32>, u32)> = vec![
        (Point::new([0, 0]), 10),
        (Point::new([1, 0]), 20),
        (Point::new([0, 1]), 30),
        (Point::new([3, 3]), 40),
        (Point::new([2, 1]), 50),
    ];
    let map: PerfectSpatialHash<2, u32, u32, u32> =
        PerfectSpatialHash::with_seed(points.clone(), 8, 42).expect("construction should succeed");

    for (p, v) in &points {
        assert_eq!(map.get(p), Some(v));
    }
    assert_eq!(map.get(&Point::new([7, 7])), None);
    assert_eq!(map.len(), 5);
}

#[test]
fn add_only_updates_existing_keys() {
    init_logger();
    let points: Vec<(Point<2, u32>, u32)> = vec![
        (Point::new([0, 0]), 1),
        (Point::new([1, 1]), 2),
        (Point::new([2, 2]), 3),
    ];
    let mut map: PerfectSpatialHash<2, u32, u32, u32> =
        PerfectSpatialHash::with_seed(points, 8, 7).expect("construction should succeed");

    assert!(map.add(&Point::new([1, 1]), 200));
    assert_eq!(map.get(&Point::new([1, 1])), Some(&200));

    assert!(!map.add(&Point::new([5, 5]), 999));
    assert_eq!(map.get(&Point::new([5, 5])), None);
}

#[test]
fn rebuild_seats_a_brand_new_key() {
    init_logger();
    let points: Vec<(Point<2, u32>, u32)> = vec![
        (Point::new([0, 0]), 1),
        (Point::new([1, 1]), 2),
    ];
    let mut map: PerfectSpatialHash<2, u32, u32, u32> =
        PerfectSpatialHash::with_seed(points, 8, 99).expect("construction should succeed");

    assert!(!map.add(&Point::new([4, 4]), 42));
    map.rebuild(vec![(Point::new([4, 4]), 42)])
        .expect("rebuild should succeed");
    assert_eq!(map.get(&Point::new([4, 4])), Some(&42));
    assert_eq!(map.len(), 3);
}
