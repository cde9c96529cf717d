//! Local export: burn box outlines into the decoded image.
//!
//! Labels are not rasterized here; the export carries the geometry and
//! colors only.

use image::{Rgba, RgbaImage};

use crate::canvas;
use crate::model::{AnnotationBox, Rect};
use crate::remote::DecodedImage;

const OUTLINE_THICKNESS: f32 = 3.0;

pub fn render_annotated(image: &DecodedImage, boxes: &[AnnotationBox]) -> Option<RgbaImage> {
    let mut img = RgbaImage::from_raw(image.width, image.height, image.pixels.clone())?;

    for b in boxes {
        let c = canvas::box_color(b.fault_type, &b.provenance);
        draw_box_outline(&mut img, &b.rect, OUTLINE_THICKNESS, [c.r(), c.g(), c.b(), 0xff]);
    }

    Some(img)
}

fn draw_box_outline(img: &mut RgbaImage, rect: &Rect, thickness: f32, color: [u8; 4]) {
    let (x0, y0) = (rect.x, rect.y);
    let (x1, y1) = (rect.right(), rect.bottom());
    draw_line_on_image(img, x0, y0, x1, y0, thickness, color);
    draw_line_on_image(img, x1, y0, x1, y1, thickness, color);
    draw_line_on_image(img, x1, y1, x0, y1, thickness, color);
    draw_line_on_image(img, x0, y1, x0, y0, thickness, color);
}

fn draw_line_on_image(
    img: &mut RgbaImage,
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
    thickness: f32,
    color: [u8; 4],
) {
    let dx = x1 - x0;
    let dy = y1 - y0;
    let len = (dx * dx + dy * dy).sqrt();
    let steps = (len * 2.0) as i32;
    let half_t = (thickness / 2.0).max(0.5) as i32;
    let (w, h) = (img.width() as i32, img.height() as i32);

    for i in 0..=steps {
        let t = i as f32 / steps.max(1) as f32;
        let cx = (x0 + dx * t) as i32;
        let cy = (y0 + dy * t) as i32;
        for oy in -half_t..=half_t {
            for ox in -half_t..=half_t {
                let px = cx + ox;
                let py = cy + oy;
                if px >= 0 && px < w && py >= 0 && py < h {
                    img.put_pixel(px as u32, py as u32, Rgba(color));
                }
            }
        }
    }
}
