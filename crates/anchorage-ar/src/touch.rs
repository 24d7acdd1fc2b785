use anchorage_3d::camera::NormalizedPoint;
use thiserror::Error;

/// Error converting a touch into a click location.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TouchError {
    /// The view has a non-positive or non-finite size.
    #[error("invalid view size {width}x{height}")]
    InvalidView {
        /// View width in pixels.
        width: f64,
        /// View height in pixels.
        height: f64,
    },

    /// The touch coordinates are not finite.
    #[error("invalid touch coordinates ({x}, {y})")]
    InvalidCoordinate {
        /// Horizontal pixel coordinate.
        x: f64,
        /// Vertical pixel coordinate.
        y: f64,
    },
}

/// The phase of a pointer gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchAction {
    /// The pointer went down.
    Down,
    /// The pointer moved while down.
    Move,
    /// The pointer was released.
    Up,
    /// The gesture was aborted.
    Cancel,
}

/// A raw pointer event in view pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchEvent {
    /// The gesture phase.
    pub action: TouchAction,
    /// Horizontal pixel coordinate.
    pub x: f64,
    /// Vertical pixel coordinate.
    pub y: f64,
}

/// Convert a touch at pixel `(x, y)` of a `width` x `height` view into the click location
/// `(x / width, y / height)`, clamped to `[0, 1]`.
///
/// Example:
///
/// ```
/// use anchorage_ar::touch::normalize_touch;
///
/// let click = normalize_touch(640.0, 360.0, 1280.0, 720.0).unwrap();
/// assert_eq!((click.u, click.v), (0.5, 0.5));
/// ```
pub fn normalize_touch(
    x: f64,
    y: f64,
    width: f64,
    height: f64,
) -> Result<NormalizedPoint, TouchError> {
    if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
        return Err(TouchError::InvalidView { width, height });
    }
    if !(x.is_finite() && y.is_finite()) {
        return Err(TouchError::InvalidCoordinate { x, y });
    }
    Ok(NormalizedPoint::new(x / width, y / height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corners_and_centre() -> Result<(), TouchError> {
        let (w, h) = (1920.0, 1080.0);
        assert_eq!(normalize_touch(0.0, 0.0, w, h)?, NormalizedPoint { u: 0.0, v: 0.0 });
        assert_eq!(normalize_touch(w, h, w, h)?, NormalizedPoint { u: 1.0, v: 1.0 });
        assert_eq!(
            normalize_touch(w / 2.0, h / 2.0, w, h)?,
            NormalizedPoint { u: 0.5, v: 0.5 }
        );
        Ok(())
    }

    #[test]
    fn test_out_of_view_is_clamped() -> Result<(), TouchError> {
        let click = normalize_touch(-12.0, 2000.0, 100.0, 100.0)?;
        assert_eq!(click, NormalizedPoint { u: 0.0, v: 1.0 });
        Ok(())
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(
            normalize_touch(1.0, 1.0, 0.0, 10.0),
            Err(TouchError::InvalidView {
                width: 0.0,
                height: 10.0
            })
        );
        assert!(normalize_touch(1.0, 1.0, 10.0, f64::INFINITY).is_err());
        assert!(matches!(
            normalize_touch(f64::NAN, 1.0, 10.0, 10.0),
            Err(TouchError::InvalidCoordinate { .. })
        ));
    }
}
