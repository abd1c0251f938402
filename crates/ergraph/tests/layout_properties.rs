//! Property tests for port and row geometry

use ergraph::core::{DiagramConfig, RowMargins, MAX_NODE_WIDTH, MIN_NODE_WIDTH};
use ergraph::layout::LayoutEngine;
use proptest::prelude::*;

fn engine(header: u32, row: u32, m1: u32, m2: u32, m3: u32) -> LayoutEngine {
    let config = DiagramConfig::new(header, row, 220).with_margins(RowMargins {
        name_left: m1,
        gap: m2,
        type_right: m3,
    });
    LayoutEngine::new(&config)
}

proptest! {
    #[test]
    fn row_regions_tile_the_row(width in MIN_NODE_WIDTH..=MAX_NODE_WIDTH, m1 in 0u32..12, m2 in 0u32..12, m3 in 0u32..12) {
        let split = engine(40, 24, m1, m2, m3).row_split(width);
        let expected = (width - m3) as f64;
        prop_assert!((split.type_end() - expected).abs() < 1e-9);
        prop_assert!((split.name_x + split.name_width + m2 as f64 - split.type_x).abs() < 1e-9);
    }

    #[test]
    fn name_region_is_three_fifths(width in MIN_NODE_WIDTH..=MAX_NODE_WIDTH) {
        let split = LayoutEngine::default().row_split(width);
        prop_assert!((split.name_width - (width as f64 * 3.0 / 5.0 - 6.0)).abs() < 1e-9);
    }

    #[test]
    fn port_offsets_strictly_increase(header in 0u32..200, row in 1u32..100, index in 0usize..500) {
        let layout = engine(header, row, 6, 6, 6);
        let here = layout.port_offset(index);
        let next = layout.port_offset(index + 1);
        prop_assert_eq!(here.x, 0);
        prop_assert_eq!(here.y, header + index as u32 * row);
        prop_assert!(next.y > here.y);
    }

    #[test]
    fn node_height_counts_rows(header in 0u32..200, row in 1u32..100, ports in 0usize..200) {
        let layout = engine(header, row, 6, 6, 6);
        prop_assert_eq!(layout.node_height(ports), header + ports as u32 * row);
        prop_assert_eq!(layout.node_height(0), layout.collapsed_height());
    }
}
