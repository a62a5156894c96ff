use crate::layout_engine::{
    GridConstraints, GridLayoutEngine, GridSettings, TextDirection, layout,
};
use crate::sys::geometry::{Point, Rect, Size};

fn engine(tile_width: f64, spacing: f64) -> GridLayoutEngine {
    let mut engine = GridLayoutEngine::new(GridSettings {
        spacing,
        ..GridSettings::default()
    });
    engine.measure([Size::new(tile_width, 50.0)]);
    engine
}

fn container(width: f64, height: f64) -> Rect { Rect::new(Point::new(0.0, 0.0), Size::new(width, height)) }

mod compute_layout {
    use super::*;

    #[test]
    fn fills_greedily() {
        let e = engine(100.0, 10.0);
        assert_eq!(e.compute_layout(430.0), (4, 430.0));
        assert_eq!(e.compute_layout(429.0), (3, 320.0));
        assert_eq!(e.compute_layout(539.0), (4, 430.0));
        assert_eq!(e.compute_layout(540.0), (5, 540.0));
    }

    #[test]
    fn no_room_for_a_tile() {
        let e = engine(100.0, 10.0);
        assert_eq!(e.compute_layout(99.0), (0, 0.0));
        assert_eq!(e.compute_layout(0.0), (0, 0.0));
        assert_eq!(e.compute_layout(100.0), (1, 100.0));
    }

    #[test]
    fn honours_column_limit() {
        let mut e = engine(100.0, 10.0);
        e.set_column_limit(Some(2));
        assert_eq!(e.compute_layout(10_000.0), (2, 210.0));
        e.set_column_limit(Some(0));
        assert_eq!(e.compute_layout(10_000.0), (0, 0.0));
    }

    #[test]
    fn columns_are_maximal_and_fit() {
        for tile_width in [1.0, 7.0, 33.0, 100.0, 250.0] {
            let e = engine(tile_width, 10.0);
            for width in (0..2000).step_by(37) {
                let width = width as f64;
                let (c, used) = e.compute_layout(width);
                let c_f = c as f64;
                let bound = c_f * tile_width + (c_f - 1.0).max(0.0) * 10.0;
                assert!(bound <= width, "{c} columns of {tile_width} overflow {width}");
                assert_eq!(used, if c == 0 { 0.0 } else { bound });
                let one_more = (c_f + 1.0) * tile_width + c_f * 10.0;
                assert!(one_more > width, "{width} would fit {} columns", c + 1);
            }
        }
    }
}

mod measuring {
    use super::*;

    #[test]
    fn tile_box_is_max_of_each_dimension_rounded_up() {
        let mut e = GridLayoutEngine::new(GridSettings::default());
        let size = e.measure([Size::new(80.2, 30.0), Size::new(40.0, 60.5), Size::new(10.0, 10.0)]);
        assert_eq!(size, Size::new(81.0, 61.0));
    }

    #[test]
    fn empty_grid_keeps_unit_tile() {
        let mut e = GridLayoutEngine::new(GridSettings::default());
        assert_eq!(e.measure(Vec::<Size>::new()),Size::new(1.0, 1.0));
    }

    #[test]
    fn preferred_width_ignores_container() {
        let mut e = engine(100.0, 10.0);
        let req = e.preferred_width(5);
        assert_eq!(req.min, 100.0);
        assert_eq!(req.natural, 540.0);

        e.set_column_limit(Some(3));
        assert_eq!(e.preferred_width(5).natural, 320.0);
        assert_eq!(e.preferred_width(2).natural, 210.0);
        assert_eq!(e.preferred_width(0).natural, 0.0);
    }

    #[test]
    fn preferred_height_uses_width_constrained_columns() {
        let e = engine(100.0, 10.0);
        // 320 wide fits 3 columns, 7 tiles need 3 rows of 50 plus two gaps.
        assert_eq!(e.preferred_height(7, 320.0).natural, 170.0);
        assert_eq!(e.preferred_height(7, 50.0).natural, 0.0);
    }

    #[test]
    fn preferred_height_respects_row_limit() {
        let mut e = GridLayoutEngine::new(GridSettings {
            spacing: 10.0,
            row_limit: Some(2),
            column_limit: None,
        });
        e.measure([Size::new(100.0, 50.0)]);
        assert_eq!(e.preferred_height(9, 320.0).natural, 110.0);
        assert_eq!(e.rows_for(9, 3), 2);
        assert_eq!(e.rows_for(9, 0), 0);
    }
}

mod allocation {
    use super::*;

    #[test]
    fn places_tiles_row_major_and_centered() {
        let mut e = engine(100.0, 10.0);
        let geometry = e.allocate(5, container(400.0, 300.0), 20.0, TextDirection::Ltr);

        assert_eq!(geometry.columns, 3);
        assert_eq!(geometry.used_width, 320.0);
        assert_eq!(geometry.left_padding, 40.0);
        let origins: Vec<_> = geometry.tiles.iter().map(|t| t.frame.origin).collect();
        assert_eq!(
            origins,
            vec![
                Point::new(40.0, 20.0),
                Point::new(150.0, 20.0),
                Point::new(260.0, 20.0),
                Point::new(40.0, 80.0),
                Point::new(150.0, 80.0),
            ]
        );
        assert!(geometry.tiles.iter().all(|t| t.painted));
        assert_eq!((e.columns(), e.rows()), (3, 2));
    }

    #[test]
    fn full_last_row_is_not_counted_twice() {
        let mut e = engine(100.0, 10.0);
        e.allocate(6, container(400.0, 300.0), 0.0, TextDirection::Ltr);
        assert_eq!((e.columns(), e.rows()), (3, 2));
    }

    #[test]
    fn rtl_mirrors_horizontally() {
        let mut e = engine(100.0, 10.0);
        let ltr = e.allocate(4, container(400.0, 300.0), 0.0, TextDirection::Ltr);
        let rtl = e.allocate(4, container(400.0, 300.0), 0.0, TextDirection::Rtl);
        for (l, r) in ltr.tiles.iter().zip(&rtl.tiles) {
            assert_eq!(r.frame.min_x(), 400.0 - l.frame.max_x());
            assert_eq!(r.frame.min_y(), l.frame.min_y());
        }
        assert_eq!(rtl.tiles[0].frame.min_x(), 260.0);
    }

    #[test]
    fn rtl_mirrors_inside_offset_container() {
        let mut e = engine(100.0, 10.0);
        let boxed = Rect::new(Point::new(50.0, 0.0), Size::new(100.0, 100.0));
        let rtl = e.allocate(1, boxed, 0.0, TextDirection::Rtl);
        assert_eq!(rtl.tiles[0].frame.min_x(), 50.0);
    }

    #[test]
    fn rows_past_limit_are_skipped_but_kept() {
        let mut e = GridLayoutEngine::new(GridSettings {
            spacing: 10.0,
            row_limit: Some(1),
            column_limit: None,
        });
        e.measure([Size::new(100.0, 50.0)]);
        let geometry = e.allocate(5, container(320.0, 300.0), 0.0, TextDirection::Ltr);

        assert_eq!(geometry.tiles.len(), 5);
        let painted: Vec<_> = geometry.tiles.iter().map(|t| t.painted).collect();
        assert_eq!(painted, vec![true, true, true, false, false]);
        assert_eq!(geometry.tiles[3].frame.origin, Point::new(0.0, 60.0));
        // Navigation still sees both rows.
        assert_eq!((e.columns(), e.rows()), (3, 2));
        assert_eq!(geometry.painted_count(), 3);
    }

    #[test]
    fn zero_columns_paints_nothing() {
        let mut e = engine(100.0, 10.0);
        let geometry = e.allocate(3, container(50.0, 300.0), 0.0, TextDirection::Ltr);
        assert_eq!(geometry.columns, 0);
        assert_eq!(geometry.rows, 0);
        assert_eq!(geometry.tiles.len(), 3);
        assert_eq!(geometry.painted_count(), 0);
        assert_eq!((e.columns(), e.rows()), (0, 0));
    }

    #[test]
    fn hit_testing_skips_unpainted_tiles() {
        let geometry = layout(&[Size::new(100.0, 50.0); 4], &GridConstraints {
            settings: GridSettings {
                spacing: 10.0,
                row_limit: Some(1),
                column_limit: Some(2),
            },
            container: container(210.0, 200.0),
            header_height: 0.0,
            direction: TextDirection::Ltr,
        });
        assert_eq!(geometry.tile_at(Point::new(150.0, 25.0)), Some(1));
        assert_eq!(geometry.tile_at(Point::new(105.0, 25.0)), None);
        assert_eq!(geometry.tile_at(Point::new(50.0, 80.0)), None);
    }
}
