//! Demonstration of the border cache: build once, reload, re-extrude

use globe_region_mesh::*;

fn main() -> Result<()> {
    let regions = vec![
        Polygon2D::from_lat_lon(&[(10.0, 10.0), (10.0, 20.0), (18.0, 20.0), (18.0, 10.0)]).with_hole(
            vec![
                GeoPoint::new(13.0, 13.0),
                GeoPoint::new(13.0, 15.0),
                GeoPoint::new(15.0, 15.0),
                GeoPoint::new(15.0, 13.0),
            ],
        ),
        Polygon2D::from_lat_lon(&[(-40.0, 140.0), (-40.0, 150.0), (-30.0, 145.0)]),
    ];

    let config = SurfaceConfigBuilder::new()
        .preset(TriangulationPreset::Preview)
        .build()?;
    let generator = RegionSurfaceGenerator::new(config)?;
    let batch = generator.generate_batch(&regions);

    let cache = BorderCache::from_surfaces(&batch.surfaces);
    let bytes = cache.encode();
    println!(
        "Encoded {} regions, {} borders into {} bytes",
        cache.regions.len(),
        cache.border_count(),
        bytes.len()
    );

    let loaded = BorderCache::decode(&bytes)?;
    let ratio = generator.config().extrude_ratio();
    for region in &loaded.regions {
        let walls = region.extrude(ratio)?;
        let triangles: usize = walls.iter().map(MeshBuffers::triangle_count).sum();
        println!(
            "region {}: {} walls, {} triangles",
            region.region_index,
            walls.len(),
            triangles
        );
    }

    let mut corrupted = bytes.clone();
    corrupted[0] ^= 0xFF;
    match BorderCache::decode(&corrupted) {
        Ok(_) => println!("corrupted cache unexpectedly decoded"),
        Err(err) => println!("corrupted cache rejected: {}", err),
    }

    Ok(())
}
