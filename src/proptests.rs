use geo::{LineString, MultiPolygon, Polygon, Rect};
use ndarray::Array1;
use proptest::prelude::*;

use crate::{
    apply_range_map, apply_value_map, hash_region, hash_region_list, rasterize_mask, MaskBuilder,
    RangeMap, ValueMap,
};

/// 外包框两个方向都有非零范围的三角形
fn triangle() -> impl Strategy<Value = Polygon<f64>> {
    (
        -1000f64..1000.,
        -1000f64..1000.,
        0.5f64..100.,
        0.5f64..100.,
        0f64..1.,
    )
        .prop_map(|(x, y, dx, dy, t)| {
            Polygon::new(
                LineString::from(vec![(x, y), (x + dx, y + t * dy), (x + t * dx, y + dy)]),
                vec![],
            )
        })
}

fn breakpoints() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.01f64..10., 0..8).prop_map(|gaps| {
        gaps.iter()
            .scan(-20.0, |acc, gap| {
                *acc += gap;
                Some(*acc)
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn mask_is_binary_with_requested_shape(
        parts in prop::collection::vec(triangle(), 1..4),
        height in 1usize..40,
        width in 1usize..40,
    ) {
        let mask = rasterize_mask(&MultiPolygon::new(parts), &[height, width])?;
        prop_assert_eq!(mask.dim(), (height, width));
        prop_assert!(mask.iter().all(|&v| v <= 1));
    }

    #[test]
    fn all_touched_is_a_superset(poly in triangle(), side in 1usize..30) {
        let centres = MaskBuilder::new().height(side).width(side).build()?;
        let touched = MaskBuilder::new().height(side).width(side).all_touched(true).build()?;
        let a = centres.rasterize(&poly)?;
        let b = touched.rasterize(&poly)?;
        prop_assert!(a.iter().zip(b.iter()).all(|(&x, &y)| x <= y));
    }

    #[test]
    fn envelope_fills_whole_grid(
        x in -100f64..100., y in -100f64..100., w in 0.1f64..50., h in 0.1f64..50.,
        height in 1usize..30, width in 1usize..30,
    ) {
        let rect = Rect::new((x, y), (x + w, y + h));
        let mask = rasterize_mask(&rect, &[height, width])?;
        prop_assert!(mask.iter().all(|&v| v == 1));
    }

    #[test]
    fn range_map_matches_linear_scan(
        bounds in breakpoints(),
        values in prop::collection::vec(-40f64..70., 0..50),
    ) {
        let map = RangeMap::new(bounds.clone())?;
        let classes = apply_range_map(&Array1::from(values.clone()), &map);
        for (value, class) in values.iter().zip(classes.iter()) {
            let expected = bounds.iter().filter(|&&b| b <= *value).count();
            prop_assert_eq!(*class, expected);
            prop_assert!(*class < map.classes());
        }
    }

    #[test]
    fn value_map_output_uses_targets_or_fill(
        pairs in prop::collection::hash_map(-5i64..20, -5i64..20, 0..8),
        cells in prop::collection::vec(-5i64..20, 0..40),
    ) {
        let map = ValueMap::explicit(pairs);
        let resolved = map.resolve()?;
        let out = apply_value_map(&Array1::from(cells.clone()), &map)?;
        for (cell, value) in cells.iter().zip(out.iter()) {
            prop_assert_eq!(*value, resolved.lookup(*cell));
        }
    }

    #[test]
    fn list_hash_depends_on_order(a in triangle(), b in triangle()) {
        let (ha, hb) = (hash_region(&a)?, hash_region(&b)?);
        prop_assume!(ha != hb);
        prop_assert_ne!(
            hash_region_list(&[a.clone(), b.clone()])?,
            hash_region_list(&[b, a])?
        );
    }
}
