use approx::assert_relative_eq;

use ricegrid::{
    rectify, CropError, GridConfig, GridLayout, Point2, PreviewGeometry, RectifyPlan,
};
use ricegrid_image::{Image, PixelFormat};

#[test]
fn size_is_invariant_under_uniform_scale() -> Result<(), CropError> {
    let orig = [3000, 2000].into();
    let base = [
        Point2::new(12.0, 30.0),
        Point2::new(410.0, 61.0),
        Point2::new(3.5, 288.0),
    ];
    let preview = PreviewGeometry::new(600.0, 400.0);
    let reference = RectifyPlan::new(orig, &base, preview)?;

    for k in [0.25, 0.5, 2.0, 3.0] {
        let points = base.map(|p| p * k);
        let scaled_preview = PreviewGeometry::new(preview.width * k, preview.height * k);
        let plan = RectifyPlan::new(orig, &points, scaled_preview)?;

        assert_eq!(plan.size(), reference.size());
        assert_relative_eq!(plan.dist_x(), reference.dist_x(), epsilon = 1e-6);
        assert_relative_eq!(plan.dist_y(), reference.dist_y(), epsilon = 1e-6);
    }
    Ok(())
}

#[test]
fn size_matches_distances() -> Result<(), CropError> {
    let points = [
        Point2::new(10.0, 10.0),
        Point2::new(50.0, 40.0),
        Point2::new(-20.0, 50.0),
    ];
    // sx = 2.5, sy = 2
    let plan = RectifyPlan::new([250, 200].into(), &points, PreviewGeometry::new(100.0, 100.0))?;

    let p1 = points[0].scale(2.5, 2.0);
    let p2 = points[1].scale(2.5, 2.0);
    let p3 = points[2].scale(2.5, 2.0);
    let dist_x = (p2 - p1).norm();
    let unit_y = ((p2 - p1) / dist_x).perp();
    let dist_y = (p3 - p1).dot(&unit_y).abs();

    assert_eq!(plan.scale(), (2.5, 2.0));
    assert_eq!(
        (plan.size().width, plan.size().height),
        (dist_x.round() as usize, dist_y.round() as usize)
    );
    Ok(())
}

#[test]
fn rectified_buffer_is_reproducible() -> Result<(), CropError> {
    let data = (0..64 * 48)
        .flat_map(|i| {
            let (x, y) = ((i % 64) as f32, (i / 64) as f32);
            [x * 900.0, y * 1200.0, (x * y) % 65535.0]
        })
        .collect::<Vec<_>>();
    let image = Image::<f32, 3>::new([64, 48].into(), data)?;
    let points = [
        Point2::new(3.0, 5.0),
        Point2::new(60.0, 9.0),
        Point2::new(1.0, 44.0),
    ];
    let preview = PreviewGeometry::new(64.0, 48.0);

    let (a, _) = rectify(&image, PixelFormat::U16, &points, preview)?;
    let (b, _) = rectify(&image, PixelFormat::U16, &points, preview)?;

    assert_eq!(a, b);
    Ok(())
}

#[test]
fn grid_on_rectified_plan() -> Result<(), CropError> {
    let points = [
        Point2::new(0.0, 0.0),
        Point2::new(50.0, 0.0),
        Point2::new(0.0, 50.0),
    ];
    let plan = RectifyPlan::new([100, 100].into(), &points, PreviewGeometry::new(50.0, 50.0))?;

    let config = GridConfig {
        rows: 2,
        cols: 2,
        groups: 1,
        margin: 0.0,
        row_gap: 0.0,
        col_gap: 0.0,
        group_gap: 0.0,
        patch_size: 50,
        ..Default::default()
    };
    let layout = GridLayout::compute(&config, plan.size(), plan.scale())?;

    let cells = layout.cells().collect::<Vec<_>>();
    assert_eq!(cells.len(), 4);
    assert!(cells.iter().all(|c| (c.width, c.height) == (50, 50)));
    assert_eq!(
        cells.iter().map(|c| c.cluster_number).collect::<Vec<_>>(),
        vec![1, 2, 3, 4]
    );
    Ok(())
}
