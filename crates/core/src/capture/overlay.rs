use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Box outline color on the preview.
pub const BOX_COLOR: [u8; 3] = [0, 200, 255];
pub const BOX_THICKNESS: i32 = 2;

/// Draws an outline around each region, clipped to the frame.
pub fn draw_regions(frame: &mut Frame, regions: &[Region]) {
    let w = frame.width() as i32;
    let h = frame.height() as i32;
    if w == 0 || h == 0 {
        return;
    }
    let data = frame.data_mut();

    let mut paint = |x: i32, y: i32| {
        if x < 0 || y < 0 || x >= w || y >= h {
            return;
        }
        let i = (y as usize * w as usize + x as usize) * 3;
        data[i..i + 3].copy_from_slice(&BOX_COLOR);
    };

    for r in regions.iter().filter(|r| r.area() > 0) {
        let x2 = r.x + r.width - 1;
        let y2 = r.y + r.height - 1;
        for t in 0..BOX_THICKNESS {
            for x in r.x..=x2 {
                paint(x, r.y + t);
                paint(x, y2 - t);
            }
            for y in r.y..=y2 {
                paint(r.x + t, y);
                paint(x2 - t, y);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(frame: &Frame, x: u32, y: u32) -> [u8; 3] {
        let i = ((y * frame.width() + x) * 3) as usize;
        [frame.data()[i], frame.data()[i + 1], frame.data()[i + 2]]
    }

    fn region(x: i32, y: i32, width: i32, height: i32) -> Region {
        Region {
            x,
            y,
            width,
            height,
            score: 0.9,
        }
    }

    #[test]
    fn test_outline_drawn_interior_untouched() {
        let mut frame = Frame::new(vec![0u8; 20 * 20 * 3], 20, 20, 0);
        draw_regions(&mut frame, &[region(5, 5, 10, 10)]);

        assert_eq!(pixel(&frame, 5, 5), BOX_COLOR);
        assert_eq!(pixel(&frame, 14, 14), BOX_COLOR);
        assert_eq!(pixel(&frame, 6, 10), BOX_COLOR);
        assert_eq!(pixel(&frame, 10, 10), [0, 0, 0]);
        assert_eq!(pixel(&frame, 0, 0), [0, 0, 0]);
    }

    #[test]
    fn test_region_past_edge_is_clipped() {
        let mut frame = Frame::new(vec![0u8; 10 * 10 * 3], 10, 10, 0);
        draw_regions(&mut frame, &[region(7, 7, 10, 10)]);
        assert_eq!(pixel(&frame, 7, 9), BOX_COLOR);
    }

    #[test]
    fn test_empty_regions_leave_frame_unchanged() {
        let mut frame = Frame::new(vec![9u8; 4 * 4 * 3], 4, 4, 0);
        draw_regions(&mut frame, &[region(1, 1, 0, 2)]);
        draw_regions(&mut frame, &[]);
        assert!(frame.data().iter().all(|&b| b == 9));
    }
}
