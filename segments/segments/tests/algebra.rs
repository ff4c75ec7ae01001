use segments::{Segment, SegmentList};

fn sl(v: &[(i64, i64)]) -> SegmentList {
    SegmentList::new(v.iter().map(|&x| x.into()).collect())
}

#[test]
fn coalesce_is_idempotent() {
    let lists = [
        sl(&[]),
        sl(&[(0, 1)]),
        sl(&[(5, 9), (1, 3), (3, 4), (8, 12), (20, 20)]),
        sl(&[(-10, -5), (-5, 0), (100, 200), (150, 160)]),
    ];
    for l in lists.iter() {
        let once = l.coalesced();
        let twice = once.coalesced();
        assert_eq!(once, twice);
        assert!(once.is_coalesced());
    }
}

#[test]
fn include_exclude_composition() {
    let includes = [sl(&[(0, 50)]), sl(&[(40, 80), (90, 100)])];
    let excludes = [sl(&[(10, 20)]), sl(&[(95, 200)])];

    let inc = includes
        .iter()
        .fold(SegmentList::empty(), |acc, l| &acc | l);
    let exc = excludes
        .iter()
        .fold(SegmentList::empty(), |acc, l| &acc | l);
    let result = &inc - &exc;

    assert_eq!(result, sl(&[(0, 10), (20, 80), (90, 95)]));
    assert!(result.is_coalesced());
}

#[test]
fn set_operations_agree_with_pointwise_membership() {
    let a = sl(&[(0, 7), (9, 15), (20, 21), (30, 44)]);
    let b = sl(&[(3, 10), (14, 25), (40, 41), (43, 50)]);
    let union = &a | &b;
    let inter = &a & &b;
    let diff = &a - &b;
    for t in -2..55 {
        let in_a = a.contains_time(t);
        let in_b = b.contains_time(t);
        assert_eq!(union.contains_time(t), in_a || in_b, "union at {t}");
        assert_eq!(inter.contains_time(t), in_a && in_b, "intersection at {t}");
        assert_eq!(diff.contains_time(t), in_a && !in_b, "difference at {t}");
    }
    for l in [&union, &inter, &diff] {
        assert!(l.is_coalesced());
    }
}

#[test]
fn clip_to_window() {
    let a = sl(&[(-100, 5), (10, 20), (95, 300)]);
    let clipped = a.clip(Segment::new(0, 100));
    assert_eq!(clipped, sl(&[(0, 5), (10, 20), (95, 100)]));
}

#[test]
fn collect_coalesces() {
    let l: SegmentList = vec![Segment::new(3, 4), Segment::new(1, 3)]
        .into_iter()
        .collect();
    assert_eq!(l, sl(&[(1, 4)]));
}
