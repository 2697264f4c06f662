use geo::{polygon, Geometry, GeometryCollection, MultiPolygon, Polygon, Rect};
use ndarray::{array, Array2, Axis as ArrayAxis};
use pretty_assertions::assert_eq;

use crate::*;

fn square(x0: f64, y0: f64, side: f64) -> Polygon<f64> {
    Rect::new((x0, y0), (x0 + side, y0 + side)).to_polygon()
}

/// 在y轴方向镜像
fn mirror(poly: &Polygon<f64>) -> Polygon<f64> {
    Polygon::new(
        poly.exterior().coords().map(|c| (c.x, -c.y)).collect(),
        vec![],
    )
}

#[test]
fn mask_shape_matches_requested_shape() -> anyhow::Result<()> {
    let poly = polygon![(x: 3.1, y: 40.2), (x: 3.9, y: 40.3), (x: 3.4, y: 41.0)];
    for shape in [[1usize, 1], [5, 9], [9, 5], [64, 64]] {
        let mask = rasterize_mask(&poly, &shape)?;
        assert_eq!(mask.dim(), (shape[0], shape[1]));
        assert!(mask.iter().all(|&v| v == 0 || v == 1));
    }
    let mask = rasterize_mask(&poly, &[6, 7, 3])?;
    assert_eq!(mask.dim(), (6, 7));
    Ok(())
}

#[test]
fn mask_rows_start_at_the_north() -> anyhow::Result<()> {
    // 北半部分是一个矩形，南半部分是空的
    let parts = MultiPolygon::new(vec![square(0., 2., 2.), square(0., 0., 0.5)]);
    let mask = rasterize_mask(&parts, &[4, 4])?;
    assert_eq!(
        mask,
        array![
            [1, 1, 1, 1],
            [1, 1, 1, 1],
            [0, 0, 0, 0],
            [1, 0, 0, 0]
        ]
    );
    Ok(())
}

#[test]
fn vertical_mirror_flips_mask() -> anyhow::Result<()> {
    let poly = polygon![(x: 0., y: 0.), (x: 4., y: 0.), (x: 0., y: 4.)];
    let mask = rasterize_mask(&poly, &[4, 4])?;
    let mirrored = rasterize_mask(&mirror(&poly), &[4, 4])?;

    let mut flipped = mask.clone();
    flipped.invert_axis(ArrayAxis(0));
    assert_eq!(mirrored, flipped);
    assert_ne!(mirrored, mask);
    Ok(())
}

#[test]
fn parts_share_one_bounding_box() -> anyhow::Result<()> {
    let parts = MultiPolygon::new(vec![square(0., 0., 1.), square(3., 3., 1.)]);
    let mask = rasterize_mask(&parts, &[4, 4])?;
    assert_eq!(
        mask,
        array![
            [0, 0, 0, 1],
            [0, 0, 0, 0],
            [0, 0, 0, 0],
            [1, 0, 0, 0]
        ]
    );
    Ok(())
}

#[test]
fn overlapping_parts_saturate() -> anyhow::Result<()> {
    let parts = MultiPolygon::new(vec![square(0., 0., 4.), square(1., 1., 2.)]);
    let mask = rasterize_mask(&parts, &[4, 4])?;
    assert_eq!(mask, Array2::<u8>::ones((4, 4)));
    Ok(())
}

#[test]
fn holes_are_ignored() -> anyhow::Result<()> {
    let donut = Polygon::new(
        square(0., 0., 4.).exterior().clone(),
        vec![square(1., 1., 2.).exterior().clone()],
    );
    assert_eq!(rasterize_mask(&donut, &[4, 4])?, Array2::<u8>::ones((4, 4)));
    Ok(())
}

#[test]
fn anisotropic_grid_stretches_geometry() -> anyhow::Result<()> {
    let poly = square(10., 10., 1.);
    let mask = rasterize_mask(&poly, &[2, 6])?;
    assert_eq!(mask, Array2::<u8>::ones((2, 6)));
    Ok(())
}

#[test]
fn all_touched_adds_boundary_pixels() -> anyhow::Result<()> {
    // 只覆盖像素的一小部分，像素中心都不在内部
    let parts = MultiPolygon::new(vec![
        polygon![(x: 0., y: 0.), (x: 10., y: 0.), (x: 10., y: 10.), (x: 0., y: 10.)],
        polygon![(x: 1., y: 1.), (x: 2., y: 1.), (x: 2., y: 2.), (x: 1., y: 2.)],
    ]);
    let centres = MaskBuilder::new().height(10).width(10).build()?;
    let touched = MaskBuilder::new()
        .height(10)
        .width(10)
        .all_touched(true)
        .build()?;
    let a = centres.rasterize(&parts)?;
    let b = touched.rasterize(&parts)?;
    assert_eq!(a, Array2::<u8>::ones((10, 10)));
    assert_eq!(b, a);

    let sliver = polygon![(x: 0., y: 0.), (x: 4., y: 0.), (x: 4., y: 0.2), (x: 0., y: 4.)];
    let a = centres.rasterize(&sliver)?;
    let b = touched.rasterize(&sliver)?;
    assert!(b.sum() > a.sum());
    assert!(a.iter().zip(b.iter()).all(|(&x, &y)| x <= y));
    Ok(())
}

#[test]
fn geometry_enum_and_collections() -> anyhow::Result<()> {
    let poly = square(0., 0., 2.);
    let direct = rasterize_mask(&poly, &[3, 3])?;
    let wrapped: Geometry<f64> = poly.clone().into();
    assert_eq!(rasterize_mask(&wrapped, &[3, 3])?, direct);

    let collection = Geometry::GeometryCollection(GeometryCollection(vec![
        poly.into(),
        square(0.5, 0.5, 1.).into(),
    ]));
    assert_eq!(rasterize_mask(&collection, &[3, 3])?, direct);
    Ok(())
}

#[test]
fn empty_multipolygon_is_rejected() {
    let empty = MultiPolygon::<f64>::new(vec![]);
    assert_eq!(rasterize_mask(&empty, &[4, 4]), Err(TileError::EmptyGeometry));
}

#[test]
fn ordered_value_map_fixture() -> anyhow::Result<()> {
    // [1, 3] -> [0, 1, 3] -> {0: 0, 1: 1, 2: 3}，填充值为0
    let remapped = apply_value_map(&array![0i64, 1, 2, 3], &ValueMap::ordered([1, 3]))?;
    assert_eq!(remapped, array![0, 1, 3, 0]);
    Ok(())
}

#[test]
fn explicit_value_map_fixture() -> anyhow::Result<()> {
    let remapped = apply_value_map(&array![[0u16, 1], [2, 1]], &ValueMap::explicit([(1, 5)]))?;
    assert_eq!(remapped, array![[0, 5], [0, 5]]);
    Ok(())
}

#[test]
fn value_map_does_not_touch_input() -> anyhow::Result<()> {
    let labels = array![3i32, 2, 1];
    let _ = apply_value_map(&labels, &ValueMap::explicit([(3, 1), (1, 3)]))?;
    assert_eq!(labels, array![3, 2, 1]);
    Ok(())
}

#[test]
fn range_map_fixture() -> anyhow::Result<()> {
    let classes = apply_range_map(&array![1., 5., 9., 20.], &RangeMap::new(vec![5., 10., 12.])?);
    assert_eq!(classes, array![0, 1, 1, 3]);
    Ok(())
}

#[test]
fn non_increasing_range_map_is_rejected() {
    assert!(matches!(
        RangeMap::new(vec![5., 3., 10.]),
        Err(TileError::InvalidRangeMap(_))
    ));
}

#[test]
fn region_hash_is_13_hex_chars() -> anyhow::Result<()> {
    let h = hash_region(&square(-3.7, 40.4, 0.01))?;
    assert_eq!(h.len(), 13);
    assert!(h.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
    Ok(())
}

#[test]
fn region_hash_respects_rounding_resolution() -> anyhow::Result<()> {
    let base = hash_region(&square(1.0, 2.0, 1.0))?;
    let below = hash_region(&square(1.000001, 2.000003, 1.0))?;
    let above = hash_region(&square(1.00001, 2.0, 1.0))?;
    assert_eq!(base, below);
    assert_ne!(base, above);
    Ok(())
}

#[test]
fn region_hash_only_sees_the_envelope() -> anyhow::Result<()> {
    let triangle = polygon![(x: 0., y: 0.), (x: 2., y: 0.), (x: 1., y: 3.)];
    let diamond = polygon![(x: 1., y: 0.), (x: 2., y: 1.5), (x: 1., y: 3.), (x: 0., y: 1.5)];
    assert_eq!(hash_region(&triangle)?, hash_region(&diamond)?);
    Ok(())
}

#[test]
fn region_list_hash_is_order_sensitive() -> anyhow::Result<()> {
    let a = square(0., 0., 1.);
    let b = square(5., 5., 1.);
    assert_ne!(hash_region(&a)?, hash_region(&b)?);
    let ab = hash_region_list(&[a.clone(), b.clone()])?;
    let ba = hash_region_list(&[b.clone(), a.clone()])?;
    assert_ne!(ab, ba);

    let joined = format!("{} {}", hash_region(&a)?, hash_region(&b)?);
    assert_eq!(ab, digest_text(&joined));
    Ok(())
}

#[test]
fn repeated_calls_are_identical() -> anyhow::Result<()> {
    let poly = polygon![(x: 0.3, y: 0.1), (x: 5.2, y: 1.7), (x: 2.2, y: 6.9)];
    assert_eq!(rasterize_mask(&poly, &[17, 23])?, rasterize_mask(&poly, &[17, 23])?);
    assert_eq!(hash_region(&poly)?, hash_region(&poly)?);
    assert_eq!(
        hash_region_list(&[poly.clone(), poly.clone()])?,
        hash_region_list(&[poly.clone(), poly])?
    );

    // 填充值为第一个键3，不是0
    let labels = array![[0i32, 3, 5], [7, 5, 3]];
    let value_map = ValueMap::explicit([(3, 1), (5, 0)]);
    let first = apply_value_map(&labels, &value_map)?;
    assert_eq!(first, array![[3, 1, 0], [3, 0, 1]]);
    assert_eq!(apply_value_map(&labels, &value_map)?, first);

    let heights = array![[-1.5, 5.], [9.99, 12.]];
    let range_map = RangeMap::new(vec![5., 10., 12.])?;
    let classes = apply_range_map(&heights, &range_map);
    assert_eq!(classes, array![[0, 1], [1, 3]]);
    assert_eq!(apply_range_map(&heights, &range_map), classes);
    Ok(())
}

#[test]
fn mask_then_remap_pipeline() -> anyhow::Result<()> {
    let mask = rasterize_mask(&square(0., 0., 2.), &[2, 2])?;
    let labels = apply_value_map(&mask, &ValueMap::explicit([(1, 7)]))?;
    assert_eq!(labels, array![[7, 7], [7, 7]]);
    Ok(())
}
