use atlas_packer_core::prelude::*;

#[test]
fn test_pack_stats_basic() {
    let cfg = PackerConfig::builder()
        .with_max_dimensions(256, 256)
        .padding(0)
        .build();

    // 4 rects of 64x64 fill exactly one row
    let inputs: Vec<(String, u32, u32)> = (0..4).map(|i| (format!("tex_{}", i), 64, 64)).collect();

    let atlas = pack_layout(inputs, cfg).expect("packing should succeed");
    let stats = atlas.stats();

    assert_eq!(stats.num_pages, 1);
    assert_eq!(stats.num_rects, 4);
    assert_eq!(stats.used_area, 4 * 64 * 64);
    assert_eq!(stats.total_page_area, 256 * 64);
    assert_eq!((stats.max_page_width, stats.max_page_height), (256, 64));
    assert!((stats.occupancy - 1.0).abs() < 1e-9, "Occupancy: {}", stats.occupancy);
    assert_eq!(stats.wasted_area(), 0);
}

#[test]
fn test_pack_stats_use_source_sizes() {
    let cfg = PackerConfig::builder()
        .with_max_dimensions(64, 64)
        .padding(0)
        .build();

    // Cells are 20x20 but only a 10x10 source sits in each.
    let items: Vec<LayoutItem<String>> = (0..3)
        .map(|i| LayoutItem {
            source_size: Some((10, 10)),
            ..LayoutItem::new(format!("trimmed_{}", i), 20, 20)
        })
        .collect();

    let atlas = pack_layout_items(items, cfg, None).expect("pack");
    let stats = atlas.stats();
    assert_eq!(stats.total_page_area, 60 * 20);
    assert_eq!(stats.used_area, 3 * 100);
    assert!((stats.occupancy - 0.25).abs() < 1e-9);
    assert!((stats.waste_percentage() - 75.0).abs() < 1e-9);
    assert_eq!(atlas.pages[0].placements[0].source_size, (10, 10));
}

#[test]
fn test_pack_stats_multiple_pages() {
    let cfg = PackerConfig::builder()
        .with_max_dimensions(32, 32)
        .padding(0)
        .build();

    // 4 per page: 4 + 4 + 1
    let inputs: Vec<(String, u32, u32)> = (0..9).map(|i| (format!("s{}", i), 16, 16)).collect();

    let atlas = pack_layout(inputs, cfg).expect("pack");
    let stats = atlas.stats();
    assert_eq!(stats.num_pages, 3);
    assert_eq!(stats.num_rects, 9);
    assert_eq!(stats.max_page_width, 32);
    assert_eq!(stats.max_page_height, 32);
    assert!((stats.avg_page_width - (32.0 + 32.0 + 16.0) / 3.0).abs() < 1e-9);
    assert_eq!(stats.total_page_area, 32 * 32 * 2 + 16 * 16);
}

#[test]
fn test_pack_stats_empty() {
    let atlas = pack_layout(Vec::<(String, u32, u32)>::new(), PackerConfig::default())
        .expect("pack");
    let stats = atlas.stats();

    assert_eq!(stats.num_pages, 0);
    assert_eq!(stats.num_rects, 0);
    assert_eq!(stats.occupancy, 0.0);
    assert_eq!(stats.waste_percentage(), 0.0);
}

#[test]
fn test_pack_stats_summary() {
    let cfg = PackerConfig::builder()
        .with_max_dimensions(128, 128)
        .build();
    let atlas = pack_layout(vec![("a", 32, 32), ("b", 32, 32)], cfg).expect("pack");

    let summary = atlas.stats().summary();
    assert!(summary.contains("Pages: 1"));
    assert!(summary.contains("Rects: 2"));
    assert!(summary.contains("Occupancy:"));
}
