use geo::{Coord, Rect};
use serde::Serialize;

use crate::Error;

/// Destination rectangle in drawing units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Canvas {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Canvas {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> crate::Result<Self> {
        let canvas = Self {
            x,
            y,
            width,
            height,
        };
        canvas.check()?;
        Ok(canvas)
    }

    fn check(&self) -> crate::Result<()> {
        let (width, height) = (self.width, self.height);
        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            return Err(Error::InvalidCanvas { width, height });
        }
        Ok(())
    }

    pub fn center(&self) -> Coord<f64> {
        geo::coord! {
            x: self.x + self.width / 2.0,
            y: self.y + self.height / 2.0,
        }
    }

    pub fn as_rect(&self) -> Rect<f64> {
        Rect::new(
            geo::coord! { x: self.x, y: self.y },
            geo::coord! { x: self.x + self.width, y: self.y + self.height },
        )
    }
}

/// Uniform factor that makes the projected area cover the canvas.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct ScaleFactor(f64);

impl ScaleFactor {
    /// `max(canvas.width / width, canvas.height / height)` of the projected
    /// rectangle. Fails on a zero-sized side instead of dividing by zero.
    pub fn fit(projected: Rect<f64>, canvas: &Canvas) -> crate::Result<Self> {
        canvas.check()?;
        let (width, height) = (projected.width(), projected.height());
        if !(width > 0.0 && height > 0.0) {
            return Err(Error::DegenerateArea { width, height });
        }

        let s = f64::max(canvas.width / width, canvas.height / height);
        trace!(width, height, s, "fitted scale");
        Ok(Self(s))
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rect(w: f64, h: f64) -> Rect<f64> {
        Rect::new((100.0, -50.0), (100.0 + w, -50.0 + h))
    }

    #[test]
    fn wider_constraint_wins() {
        let canvas = Canvas::new(0.0, 0.0, 400.0, 300.0).unwrap();
        // 400 / 100 = 4, 300 / 200 = 1.5
        assert_eq!(ScaleFactor::fit(rect(100.0, 200.0), &canvas).unwrap().get(), 4.0);
    }

    #[test]
    fn zero_width_is_degenerate() {
        let canvas = Canvas::new(0.0, 0.0, 400.0, 300.0).unwrap();
        assert!(matches!(
            ScaleFactor::fit(rect(0.0, 10.0), &canvas),
            Err(Error::DegenerateArea { width, .. }) if width == 0.0
        ));
        assert!(matches!(
            ScaleFactor::fit(rect(10.0, 0.0), &canvas),
            Err(Error::DegenerateArea { .. })
        ));
    }

    #[test]
    fn canvas_must_be_positive() {
        assert!(matches!(
            Canvas::new(0.0, 0.0, 0.0, 10.0),
            Err(Error::InvalidCanvas { .. })
        ));
        assert!(matches!(
            Canvas::new(0.0, 0.0, 10.0, -1.0),
            Err(Error::InvalidCanvas { .. })
        ));
    }

    #[test]
    fn fit_rejects_hand_built_canvas() {
        let flat = Canvas {
            x: 0.0,
            y: 0.0,
            width: 400.0,
            height: 0.0,
        };
        assert!(matches!(
            ScaleFactor::fit(rect(100.0, 100.0), &flat),
            Err(Error::InvalidCanvas { height, .. }) if height == 0.0
        ));
    }

    #[test]
    fn center_includes_offset() {
        let canvas = Canvas::new(50.0, 50.0, 100.0, 200.0).unwrap();
        assert_eq!(canvas.center(), geo::coord! { x: 100.0, y: 150.0 });
    }

    proptest! {
        #[test]
        fn growing_the_area_never_grows_the_scale(
            w in 1.0f64..1e6,
            h in 1.0f64..1e6,
            dw in 0.0f64..1e6,
            dh in 0.0f64..1e6,
            cw in 1.0f64..1e4,
            ch in 1.0f64..1e4,
        ) {
            let canvas = Canvas::new(0.0, 0.0, cw, ch).unwrap();
            let before = ScaleFactor::fit(rect(w, h), &canvas).unwrap();
            let wider = ScaleFactor::fit(rect(w + dw, h), &canvas).unwrap();
            let taller = ScaleFactor::fit(rect(w, h + dh), &canvas).unwrap();
            prop_assert!(wider <= before);
            prop_assert!(taller <= before);
        }
    }
}
