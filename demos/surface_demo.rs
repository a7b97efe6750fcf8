//! Demonstration of region surface generation

use globe_region_mesh::*;

fn region_set() -> Vec<Polygon2D> {
    vec![
        // Rectangular region with a lake
        Polygon2D::from_lat_lon(&[(47.0, 5.0), (47.0, 15.0), (55.0, 15.0), (55.0, 5.0)]).with_hole(
            vec![
                GeoPoint::new(50.0, 9.0),
                GeoPoint::new(50.0, 10.0),
                GeoPoint::new(51.0, 10.0),
                GeoPoint::new(51.0, 9.0),
            ],
        ),
        // Concave region straddling the equator
        Polygon2D::from_lat_lon(&[
            (-6.0, 20.0),
            (-6.0, 32.0),
            (6.0, 32.0),
            (6.0, 28.0),
            (-2.0, 28.0),
            (-2.0, 24.0),
            (6.0, 24.0),
            (6.0, 20.0),
        ]),
        // Degenerate outline, skipped by the batch
        Polygon2D::from_lat_lon(&[(0.0, 0.0), (0.0, 0.0), (1.0, 1.0)]),
        // High-latitude region
        Polygon2D::from_lat_lon(&[(60.0, -50.0), (60.0, -20.0), (80.0, -20.0), (80.0, -50.0)]),
    ]
}

fn main() -> Result<()> {
    let regions = region_set();

    for preset in [TriangulationPreset::Preview, TriangulationPreset::Production] {
        let config = SurfaceConfigBuilder::new()
            .preset(preset)
            .altitude(20.0)?
            .border_depth(20.0)?
            .build()?;
        let generator = RegionSurfaceGenerator::new(config)?;

        println!("=== {} preset ===", preset.name());
        let batch = generator.generate_batch(&regions);

        for (index, surface) in &batch.surfaces {
            let tri = surface.outcome.polygon();
            println!(
                "region {}: {} fill triangles, {} steiner points, {} attempts, residual {:.4}{}",
                index,
                surface.fill.triangle_count(),
                tri.steiner_count,
                surface.outcome.attempts(),
                tri.residual(),
                if surface.is_converged() { "" } else { " (best effort)" }
            );
            for (i, wall) in surface.borders.iter().enumerate() {
                println!(
                    "  wall {} ({}): {} triangles",
                    i,
                    if i == 0 { "outer" } else { "hole" },
                    wall.triangle_count()
                );
            }
        }
        for failure in &batch.failures {
            println!("region {} failed at {}: {}", failure.index, failure.stage, failure.error);
        }
    }

    // Local UVs with a rotated, scaled texture
    let config = SurfaceConfigBuilder::new()
        .preset(TriangulationPreset::Preview)
        .uv_mode(UvMode::Local)
        .texture_scale(0.5)?
        .texture_rotation(std::f64::consts::FRAC_PI_4)
        .build()?;
    let generator = RegionSurfaceGenerator::new(config)?;
    let surface = generator.generate(&regions[0])?;

    let mem = surface.fill.flat_positions().len() * 4
        + surface.fill.flat_normals().len() * 4
        + surface.fill.flat_uvs().len() * 4
        + surface.fill.index_bytes().len();
    println!("\nLocal UV surface: {} vertices, {:.2} KB", surface.fill.vertex_count(), mem as f32 / 1024.0);

    #[cfg(feature = "parallel")]
    {
        let pool = ScratchPool::default();
        let batch = generator.par_generate_batch(&regions, &pool);
        println!(
            "Parallel batch: {} generated, {} failed, {} pooled buffer sets",
            batch.success_count(),
            batch.failure_count(),
            pool.available()
        );
    }

    #[cfg(feature = "spatial-index")]
    {
        let batch = generator.generate_batch(&regions);
        let locator = RegionLocator::new(&batch.surfaces);
        let query = to_sphere(52.0, 12.0, 0.0).as_vec3();
        println!("Region under (52N, 12E): {:?}", locator.find_nearest(query));

        let mut states = RegionStates::new(regions.len());
        if let Some(region) = locator.find_nearest(query) {
            states.select_only(region);
        }
        let mut frames = 0;
        while states.animate(1.0 / 60.0, 5.0, 20.0) {
            frames += 1;
        }
        println!("Selection animation settled after {} frames", frames);
    }

    Ok(())
}
