//! Composition of declarative 3D transform lists into a single matrix.
//!
//! A transform prop is a list of single-operation objects, e.g.
//! `[{"translateX": 10}, {"rotate": "45deg"}]`. The list is folded into one
//! `Matrix4<f64>` with the first entry outermost. Whether the composed matrix
//! is a plain 2D translation decides which native primitive the bridge uses
//! to apply it.

use cgmath::{Matrix4, Rad, SquareMatrix, Vector3};
use serde_json::Value;

use crate::error::TransformError;
use crate::geometry::Dimensions;

pub type Matrix = Matrix4<f64>;

fn operand(op: &str, value: &Value) -> Result<f64, TransformError> {
    value.as_f64().ok_or_else(|| TransformError::BadOperand {
        op: op.to_string(),
    })
}

/// Angles are either raw radians or a string with a `deg`/`rad` suffix.
fn angle(op: &str, value: &Value) -> Result<f64, TransformError> {
    if let Some(radians) = value.as_f64() {
        return Ok(radians);
    }
    let text = value.as_str().ok_or_else(|| TransformError::BadOperand {
        op: op.to_string(),
    })?;
    let bad = || TransformError::BadAngle(text.to_string());
    if let Some(degrees) = text.strip_suffix("deg") {
        let degrees: f64 = degrees.trim().parse().map_err(|_| bad())?;
        Ok(degrees.to_radians())
    } else if let Some(radians) = text.strip_suffix("rad") {
        radians.trim().parse().map_err(|_| bad())
    } else {
        Err(bad())
    }
}

fn single_matrix(op: &str, value: &Value) -> Result<Matrix, TransformError> {
    let m = match op {
        "translateX" => Matrix4::from_translation(Vector3::new(operand(op, value)?, 0.0, 0.0)),
        "translateY" => Matrix4::from_translation(Vector3::new(0.0, operand(op, value)?, 0.0)),
        "translateZ" => Matrix4::from_translation(Vector3::new(0.0, 0.0, operand(op, value)?)),
        "scale" => Matrix4::from_scale(operand(op, value)?),
        "scaleX" => Matrix4::from_nonuniform_scale(operand(op, value)?, 1.0, 1.0),
        "scaleY" => Matrix4::from_nonuniform_scale(1.0, operand(op, value)?, 1.0),
        "rotate" | "rotateZ" => Matrix4::from_angle_z(Rad(angle(op, value)?)),
        "rotateX" => Matrix4::from_angle_x(Rad(angle(op, value)?)),
        "rotateY" => Matrix4::from_angle_y(Rad(angle(op, value)?)),
        "skewX" => {
            let mut m = Matrix4::identity();
            m.y.x = angle(op, value)?.tan();
            m
        }
        "skewY" => {
            let mut m = Matrix4::identity();
            m.x.y = angle(op, value)?.tan();
            m
        }
        "perspective" => {
            let depth = operand(op, value)?;
            if depth == 0.0 {
                return Err(TransformError::BadOperand { op: op.to_string() });
            }
            let mut m = Matrix4::identity();
            m.z.w = -1.0 / depth;
            m
        }
        "matrix" => {
            let entries = value.as_array().ok_or(TransformError::BadMatrix)?;
            if entries.len() != 16 {
                return Err(TransformError::BadMatrix);
            }
            let mut flat = [0.0f64; 16];
            for (slot, entry) in flat.iter_mut().zip(entries) {
                *slot = entry.as_f64().ok_or(TransformError::BadMatrix)?;
            }
            // Wire matrices are column-major with translation at 12..14.
            Matrix4::new(
                flat[0], flat[1], flat[2], flat[3], flat[4], flat[5], flat[6], flat[7], flat[8],
                flat[9], flat[10], flat[11], flat[12], flat[13], flat[14], flat[15],
            )
        }
        _ => return Err(TransformError::UnknownOp(op.to_string())),
    };
    Ok(m)
}

/// Folds a transform list into one matrix, first entry outermost.
pub fn process_transform(list: &[Value]) -> Result<Matrix, TransformError> {
    let mut acc = Matrix4::identity();
    for entry in list {
        let object = entry.as_object().ok_or(TransformError::MalformedEntry)?;
        if object.len() != 1 {
            return Err(TransformError::MalformedEntry);
        }
        let (op, value) = object.iter().next().ok_or(TransformError::MalformedEntry)?;
        acc = acc * single_matrix(op, value)?;
    }
    Ok(acc)
}

/// Re-centers the matrix so rotation and scale pivot around the box center
/// rather than its top-left corner. Unset box components contribute no pivot.
pub fn center_pivot(m: Matrix, dims: Dimensions) -> Matrix {
    let dx = if dims.width.is_nan() {
        0.0
    } else {
        dims.width / 2.0
    };
    let dy = if dims.height.is_nan() {
        0.0
    } else {
        dims.height / 2.0
    };
    Matrix4::from_translation(Vector3::new(dx, dy, 0.0))
        * m
        * Matrix4::from_translation(Vector3::new(-dx, -dy, 0.0))
}

/// True when the matrix moves points without rotating, scaling, or
/// projecting them: zeroing the translation leaves the identity.
pub fn is_translation_only(m: &Matrix) -> bool {
    let mut rest = *m;
    rest.w.x = 0.0;
    rest.w.y = 0.0;
    rest.w.z = 0.0;
    approx_identity(&rest)
}

pub fn translation_of(m: &Matrix) -> (f64, f64) {
    (m.w.x, m.w.y)
}

fn approx_identity(m: &Matrix) -> bool {
    let identity: Matrix = Matrix4::identity();
    let a: &[[f64; 4]; 4] = m.as_ref();
    let b: &[[f64; 4]; 4] = identity.as_ref();
    a.iter()
        .flatten()
        .zip(b.iter().flatten())
        .all(|(x, y)| (x - y).abs() < 1e-9)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector4;
    use serde_json::json;

    fn apply(m: &Matrix, x: f64, y: f64) -> (f64, f64) {
        let v = m * Vector4::new(x, y, 0.0, 1.0);
        (v.x / v.w, v.y / v.w)
    }

    #[test]
    fn test_translation_only_detection() {
        let m = process_transform(&[json!({"translateX": 10.0}), json!({"translateY": -4.0})])
            .unwrap();
        assert!(is_translation_only(&m));
        assert_eq!(translation_of(&m), (10.0, -4.0));

        let m = process_transform(&[json!({"rotate": "45deg"})]).unwrap();
        assert!(!is_translation_only(&m));
    }

    #[test]
    fn test_empty_list_is_identity() {
        let m = process_transform(&[]).unwrap();
        assert!(is_translation_only(&m));
        assert_eq!(translation_of(&m), (0.0, 0.0));
    }

    #[test]
    fn test_first_entry_is_outermost() {
        let m =
            process_transform(&[json!({"translateX": 10.0}), json!({"scale": 2.0})]).unwrap();
        assert_eq!(apply(&m, 1.0, 0.0), (12.0, 0.0));
    }

    #[test]
    fn test_center_pivot_rotation() {
        let m = process_transform(&[json!({"rotate": "90deg"})]).unwrap();
        let m = center_pivot(m, Dimensions::new(0.0, 0.0, 100.0, 50.0));
        // The corner swings around the box center (50, 25).
        let (x, y) = apply(&m, 0.0, 0.0);
        assert!((x - 75.0).abs() < 1e-9, "x = {x}");
        assert!((y - (-25.0)).abs() < 1e-9, "y = {y}");
    }

    #[test]
    fn test_pivot_does_not_disturb_translation() {
        let m = process_transform(&[json!({"translateX": 10.0})]).unwrap();
        let pivoted = center_pivot(m, Dimensions::new(0.0, 0.0, 200.0, 80.0));
        assert!(is_translation_only(&pivoted));
        assert_eq!(translation_of(&pivoted), (10.0, 0.0));
    }

    #[test]
    fn test_angle_forms() {
        let deg = process_transform(&[json!({"rotate": "180deg"})]).unwrap();
        let rad = process_transform(&[json!({"rotate": std::f64::consts::PI})]).unwrap();
        let a: &[[f64; 4]; 4] = deg.as_ref();
        let b: &[[f64; 4]; 4] = rad.as_ref();
        for (x, y) in a.iter().flatten().zip(b.iter().flatten()) {
            assert!((x - y).abs() < 1e-9);
        }
        assert!(matches!(
            process_transform(&[json!({"rotate": "45grad"})]),
            Err(TransformError::BadAngle(_))
        ));
    }

    #[test]
    fn test_matrix_entry_roundtrip() {
        let raw = json!({"matrix": [1, 0, 0, 0, 0, 1, 0, 0, 0, 0, 1, 0, 7, 8, 0, 1]});
        let m = process_transform(&[raw]).unwrap();
        assert!(is_translation_only(&m));
        assert_eq!(translation_of(&m), (7.0, 8.0));
    }

    #[test]
    fn test_malformed_entries() {
        assert_eq!(
            process_transform(&[json!("translateX")]),
            Err(TransformError::MalformedEntry)
        );
        assert_eq!(
            process_transform(&[json!({"translateX": 1, "translateY": 2})]),
            Err(TransformError::MalformedEntry)
        );
        assert_eq!(
            process_transform(&[json!({"spin": 1})]),
            Err(TransformError::UnknownOp("spin".into()))
        );
        assert!(matches!(
            process_transform(&[json!({"scale": "big"})]),
            Err(TransformError::BadOperand { .. })
        ));
    }
}
