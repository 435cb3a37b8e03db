//! External contour extraction.
//!
//! Only the outer boundary of each connected hot region is reported. Holes,
//! and anything nested inside them, belong to the enclosing region: its area
//! counts them and filling the contour covers them.

use std::collections::{HashMap, HashSet};

use image::{imageops, GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType};
use imageproc::point::Point;
use imageproc::rect::Rect;
use imageproc::region_labelling::{connected_components, Connectivity};

use crate::error::{Error, Result};
use crate::segmentation::{COLD, HOT};

/// One row of a filled region, `x_start..=x_end` on row `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Row.
    pub y: u32,
    /// First column, inclusive.
    pub x_start: u32,
    /// Last column, inclusive.
    pub x_end: u32,
}

/// The traced outer boundary of one connected hot region.
///
/// Coordinates are in the space of the mask the contour was extracted from.
#[derive(Debug, Clone)]
pub struct Contour {
    points: Vec<Point<i32>>,
    bounds: Rect,
    area: u64,
    spans: Vec<Span>,
}

impl Contour {
    /// An axis-aligned rectangular contour at `(x, y)` of size `width` x `height`.
    #[cfg(test)]
    #[allow(clippy::cast_possible_wrap)]
    pub(crate) fn rectangle(x: u32, y: u32, width: u32, height: u32) -> Self {
        let (x2, y2) = (x + width - 1, y + height - 1);
        let points = vec![
            Point::new(x as i32, y as i32),
            Point::new(x as i32, y2 as i32),
            Point::new(x2 as i32, y2 as i32),
            Point::new(x2 as i32, y as i32),
        ];
        let spans = (y..=y2)
            .map(|row| Span {
                y: row,
                x_start: x,
                x_end: x2,
            })
            .collect();
        Self {
            points,
            bounds: Rect::at(x as i32, y as i32).of_size(width, height),
            area: u64::from(width) * u64::from(height),
            spans,
        }
    }

    /// Boundary points in tracing order.
    #[must_use]
    pub fn points(&self) -> &[Point<i32>] {
        &self.points
    }

    /// Smallest axis-aligned rectangle enclosing the contour.
    #[must_use]
    pub fn bounding_rect(&self) -> Rect {
        self.bounds
    }

    /// Number of pixels enclosed by the contour, boundary included.
    #[must_use]
    pub fn area(&self) -> u64 {
        self.area
    }

    /// Bounding box `width / height`, or 0 for a zero-height box.
    #[must_use]
    pub fn aspect_ratio(&self) -> f64 {
        let h = self.bounds.height();
        if h == 0 {
            0.0
        } else {
            f64::from(self.bounds.width()) / f64::from(h)
        }
    }

    /// Row spans covering the filled interior.
    #[must_use]
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// A `width` x `height` mask with the contour's interior filled.
    ///
    /// Parts of the contour outside the canvas are dropped.
    #[must_use]
    pub fn region_mask(&self, width: u32, height: u32) -> GrayImage {
        let mut mask = GrayImage::new(width, height);
        for span in &self.spans {
            if span.y >= height || span.x_start >= width {
                continue;
            }
            for x in span.x_start..=span.x_end.min(width - 1) {
                mask.put_pixel(x, span.y, Luma([HOT]));
            }
        }
        mask
    }
}

#[derive(Debug)]
struct Region {
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
    area: u64,
    spans: Vec<Span>,
}

impl Region {
    fn new(span: Span) -> Self {
        Self {
            min_x: span.x_start,
            min_y: span.y,
            max_x: span.x_end,
            max_y: span.y,
            area: u64::from(span.x_end - span.x_start + 1),
            spans: vec![span],
        }
    }

    fn push(&mut self, span: Span) {
        self.min_x = self.min_x.min(span.x_start);
        self.max_x = self.max_x.max(span.x_end);
        self.min_y = self.min_y.min(span.y);
        self.max_y = self.max_y.max(span.y);
        self.area += u64::from(span.x_end - span.x_start + 1);
        self.spans.push(span);
    }

    fn into_contour(self, points: Vec<Point<i32>>) -> Result<Contour> {
        let left = i32::try_from(self.min_x)
            .map_err(|_| Error::Processing(format!("column {} out of range", self.min_x)))?;
        let top = i32::try_from(self.min_y)
            .map_err(|_| Error::Processing(format!("row {} out of range", self.min_y)))?;
        let bounds = Rect::at(left, top)
            .of_size(self.max_x - self.min_x + 1, self.max_y - self.min_y + 1);
        Ok(Contour {
            points,
            bounds,
            area: self.area,
            spans: self.spans,
        })
    }
}

/// Mark every pixel that is hot or enclosed by hot pixels.
///
/// Cold pixels 4-connected to the image border are outside; everything else
/// is inside. Pairs with 8-connected labelling of the hot regions.
fn fill_enclosed(mask: &GrayImage) -> GrayImage {
    let (w, h) = mask.dimensions();
    let inverted = GrayImage::from_fn(w, h, |x, y| {
        if mask.get_pixel(x, y)[0] == COLD {
            Luma([HOT])
        } else {
            Luma([COLD])
        }
    });
    let background = connected_components(&inverted, Connectivity::Four, Luma([COLD]));

    let mut outside = HashSet::new();
    for x in 0..w {
        outside.insert(background.get_pixel(x, 0)[0]);
        outside.insert(background.get_pixel(x, h - 1)[0]);
    }
    for y in 0..h {
        outside.insert(background.get_pixel(0, y)[0]);
        outside.insert(background.get_pixel(w - 1, y)[0]);
    }
    outside.remove(&0);

    GrayImage::from_fn(w, h, |x, y| {
        if outside.contains(&background.get_pixel(x, y)[0]) {
            Luma([COLD])
        } else {
            Luma([HOT])
        }
    })
}

/// Copy of `mask` framed by one cold pixel on every side.
///
/// The tracer only opens an outer border on a hot pixel whose left
/// neighbour is cold, so regions touching column 0 need the frame.
fn pad(mask: &GrayImage) -> GrayImage {
    let (w, h) = mask.dimensions();
    let mut padded = GrayImage::new(w + 2, h + 2);
    imageops::replace(&mut padded, mask, 1, 1);
    padded
}

/// Extract the external contours of `mask`, largest area first.
///
/// Before sorting, contours are listed in reverse tracing order, so among
/// equal areas the region found lowest in the mask comes first. An empty
/// mask yields no contours.
///
/// # Errors
///
/// Returns [`Error::Processing`] if a traced boundary starts outside the mask
/// or on a background pixel.
pub fn extract_contours(mask: &GrayImage) -> Result<Vec<Contour>> {
    let (w, h) = mask.dimensions();
    if w == 0 || h == 0 {
        return Ok(Vec::new());
    }

    let filled = fill_enclosed(mask);
    let labels = connected_components(&filled, Connectivity::Eight, Luma([COLD]));

    let mut regions: HashMap<u32, Region> = HashMap::new();
    for y in 0..h {
        let mut x = 0;
        while x < w {
            let label = labels.get_pixel(x, y)[0];
            if label == 0 {
                x += 1;
                continue;
            }
            let start = x;
            while x + 1 < w && labels.get_pixel(x + 1, y)[0] == label {
                x += 1;
            }
            let span = Span {
                y,
                x_start: start,
                x_end: x,
            };
            regions
                .entry(label)
                .and_modify(|r| r.push(span))
                .or_insert_with(|| Region::new(span));
            x += 1;
        }
    }

    let mut contours = Vec::with_capacity(regions.len());
    for traced in find_contours::<i32>(&pad(&filled)) {
        if !matches!(traced.border_type, BorderType::Outer) || traced.parent.is_some() {
            continue;
        }
        let points: Vec<Point<i32>> = traced
            .points
            .into_iter()
            .map(|p| Point::new(p.x - 1, p.y - 1))
            .collect();
        let Some(start) = points.first().copied() else {
            continue;
        };
        let label = match (u32::try_from(start.x), u32::try_from(start.y)) {
            (Ok(x), Ok(y)) if x < w && y < h => labels.get_pixel(x, y)[0],
            _ => {
                return Err(Error::Processing(format!(
                    "contour starts outside the mask at ({}, {})",
                    start.x, start.y
                )))
            }
        };
        if label == 0 {
            return Err(Error::Processing(format!(
                "contour at ({}, {}) does not start on a labelled region",
                start.x, start.y
            )));
        }
        // A region already claimed by an earlier boundary is not reported twice.
        if let Some(region) = regions.remove(&label) {
            contours.push(region.into_contour(points)?);
        }
    }

    contours.reverse();
    contours.sort_by(|a, b| b.area.cmp(&a.area));
    Ok(contours)
}
