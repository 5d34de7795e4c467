//! Geometry handed to the overlay renderer, and a debug view of the search.

use ndarray::Array3;

use crate::tracker::{
    BinaryMask, LaneAnnotation, LaneEstimate, LaneFit, SearchDebug, SearchTrace, SearchWindow,
};

const MASK_RGB: [u8; 3] = [255, 255, 255];
const REGION_RGB: [u8; 3] = [0, 255, 0];
const PIXEL_RGB: [u8; 3] = [255, 0, 0];

/// Closed lane polygon in top-down pixel space, as `[x, y]` vertices.
///
/// The left boundary runs top to bottom, then the right boundary bottom to
/// top, so the polygon can be filled directly and warped back into the
/// camera view by the perspective collaborator.
pub fn lane_polygon(left: &LaneFit, right: &LaneFit, height: usize) -> Vec<[f64; 2]> {
    let mut points = Vec::with_capacity(height * 2);
    for (y, x) in left.sample_rows(height).into_iter().enumerate() {
        points.push([x, y as f64]);
    }
    for (y, x) in right.sample_rows(height).into_iter().enumerate().rev() {
        points.push([x, y as f64]);
    }
    points
}

/// Draws the tracked lane back onto the camera frame.
///
/// Implementations own the inverse perspective warp, polygon filling and
/// text rendering.
pub trait LaneRenderer {
    /// Error type for rendering failures.
    type Error;

    /// Draw `polygon` (top-down pixel space) and `annotation` onto `frame`.
    fn render(
        &mut self,
        frame: &mut [u8],
        width: u32,
        height: u32,
        polygon: &[[f64; 2]],
        annotation: &LaneAnnotation,
    ) -> Result<(), Self::Error>;
}

/// Lane polygon from an estimate's smoothed fits, `None` unless both are known.
pub fn estimate_polygon(estimate: &LaneEstimate, height: usize) -> Option<Vec<[f64; 2]>> {
    let left = estimate.left.smoothed_fit?;
    let right = estimate.right.smoothed_fit?;
    Some(lane_polygon(&left, &right, height))
}

/// Render the mask with the searched regions and collected pixels on top.
///
/// Returns an RGB image shaped `(height, width, 3)`: mask pixels white,
/// window outlines or band edges green, pixels used for the fit red.
pub fn debug_image(mask: &BinaryMask, debug: &SearchDebug) -> Array3<u8> {
    let (width, height) = (mask.width(), mask.height());
    let mut image = Array3::<u8>::zeros((height, width, 3));

    for (x, y) in mask.on_pixels() {
        paint(&mut image, x as isize, y as isize, MASK_RGB);
    }

    match &debug.trace {
        SearchTrace::Windows(windows) => {
            for window in windows {
                outline(&mut image, window);
            }
        }
        SearchTrace::Band { fit, margin } => {
            for y in 0..height {
                let center = fit.eval(y as f64);
                for edge in [center - margin, center + margin] {
                    if edge.is_finite() {
                        paint(&mut image, edge.round() as isize, y as isize, REGION_RGB);
                    }
                }
            }
        }
    }

    for (x, y) in debug.pixels.iter() {
        paint(&mut image, x as isize, y as isize, PIXEL_RGB);
    }
    image
}

fn outline(image: &mut Array3<u8>, window: &SearchWindow) {
    if window.y_high <= window.y_low || window.x_high <= window.x_low {
        return;
    }
    let (top, bottom) = (window.y_low as isize, window.y_high as isize - 1);
    let (left, right) = (window.x_low, window.x_high - 1);
    for x in left..=right {
        paint(image, x, top, REGION_RGB);
        paint(image, x, bottom, REGION_RGB);
    }
    for y in top..=bottom {
        paint(image, left, y, REGION_RGB);
        paint(image, right, y, REGION_RGB);
    }
}

#[inline]
fn paint(image: &mut Array3<u8>, x: isize, y: isize, rgb: [u8; 3]) {
    let (height, width, _) = image.dim();
    if x < 0 || y < 0 || x as usize >= width || y as usize >= height {
        return;
    }
    for (c, v) in rgb.into_iter().enumerate() {
        image[[y as usize, x as usize, c]] = v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::PixelSet;

    #[test]
    fn test_lane_polygon_order() {
        let left = LaneFit::new(0.0, 0.0, 10.0);
        let right = LaneFit::new(0.0, 0.0, 90.0);
        let poly = lane_polygon(&left, &right, 4);

        assert_eq!(poly.len(), 8);
        assert_eq!(poly[0], [10.0, 0.0]);
        assert_eq!(poly[3], [10.0, 3.0]);
        assert_eq!(poly[4], [90.0, 3.0]);
        assert_eq!(poly[7], [90.0, 0.0]);
    }

    #[test]
    fn test_debug_image_windows() {
        let mut mask = BinaryMask::new(20, 10);
        mask.set(5, 5, true);
        mask.set(15, 5, true);
        let mut pixels = PixelSet::new();
        pixels.push(5, 5);
        let debug = SearchDebug {
            trace: SearchTrace::Windows(vec![SearchWindow {
                x_low: -2,
                x_high: 10,
                y_low: 0,
                y_high: 10,
                hits: 1,
            }]),
            pixels,
        };

        let image = debug_image(&mask, &debug);
        assert_eq!(image.dim(), (10, 20, 3));
        // collected pixel red, untouched mask pixel white
        assert_eq!(image[[5, 5, 0]], 255);
        assert_eq!(image[[5, 5, 1]], 0);
        assert_eq!(image[[5, 15, 1]], 255);
        // right edge of the window at x = 9
        assert_eq!(image[[3, 9, 1]], 255);
        assert_eq!(image[[3, 9, 0]], 0);
        // interior untouched
        assert_eq!(image[[3, 4, 1]], 0);
    }

    #[test]
    fn test_debug_image_band() {
        let mask = BinaryMask::new(30, 5);
        let debug = SearchDebug {
            trace: SearchTrace::Band {
                fit: LaneFit::new(0.0, 0.0, 15.0),
                margin: 10.0,
            },
            pixels: PixelSet::new(),
        };
        let image = debug_image(&mask, &debug);
        for y in 0..5 {
            assert_eq!(image[[y, 5, 1]], 255);
            assert_eq!(image[[y, 25, 1]], 255);
        }
    }
}
