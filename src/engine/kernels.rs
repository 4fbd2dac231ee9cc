// src/engine/kernels.rs

use crate::core::tensor::{Shape, Tensor};

use super::error::EngineError;
use super::operations::OpKind;

/// Checks that two shapes are identical
fn ensure_same_shape(context: &str, expected: &Shape, actual: &Shape) -> Result<(), EngineError> {
    if expected != actual {
        Err(EngineError::ShapeMismatch {
            context: context.to_string(),
            expected: expected.clone(),
            actual: actual.clone(),
        })
    } else {
        Ok(())
    }
}

/// Tensor fields are public, so the data can disagree with the shape.
fn ensure_consistent(context: &str, t: &Tensor) -> Result<(), EngineError> {
    if t.shape.checked_num_elements() == Some(t.data.len()) {
        Ok(())
    } else {
        Err(EngineError::InvalidTensor {
            context: context.to_string(),
            len: t.data.len(),
            shape: t.shape.clone(),
        })
    }
}

/// Applies `op` element by element, writing into `out`. No broadcasting:
/// both operands and the result must share one shape.
fn elementwise_binary_op(
    op: OpKind,
    a: &Tensor,
    b: &Tensor,
    out: &mut Tensor,
) -> Result<(), EngineError> {
    ensure_same_shape(op.name(), &a.shape, &b.shape)?;
    ensure_same_shape(op.name(), &a.shape, &out.shape)?;
    for t in [a, b, &*out] {
        ensure_consistent(op.name(), t)?;
    }
    for ((o, x), y) in out.data.iter_mut().zip(a.data.iter()).zip(b.data.iter()) {
        *o = op.apply(*x, *y);
    }
    Ok(())
}

/// Element-wise add: out = a + b
pub fn add(a: &Tensor, b: &Tensor, out: &mut Tensor) -> Result<(), EngineError> {
    elementwise_binary_op(OpKind::Add, a, b, out)
}

/// Element-wise subtract: out = a - b
pub fn sub(a: &Tensor, b: &Tensor, out: &mut Tensor) -> Result<(), EngineError> {
    elementwise_binary_op(OpKind::Subtract, a, b, out)
}

/// Element-wise multiply: out = a * b
pub fn multiply(a: &Tensor, b: &Tensor, out: &mut Tensor) -> Result<(), EngineError> {
    elementwise_binary_op(OpKind::Multiply, a, b, out)
}

/// Runs the registered operator `op_name` over `operands`, storing into `result`.
pub fn dispatch(op_name: &str, operands: &[&Tensor], result: &mut Tensor) -> Result<(), EngineError> {
    let op = OpKind::from_name(op_name)
        .ok_or_else(|| EngineError::UnknownOperator(op_name.to_string()))?;
    dispatch_op(op, operands, result)
}

pub fn dispatch_op(op: OpKind, operands: &[&Tensor], result: &mut Tensor) -> Result<(), EngineError> {
    if operands.len() != op.arity() {
        return Err(EngineError::Arity {
            op: op.name().to_string(),
            expected: op.arity(),
            actual: operands.len(),
        });
    }
    let (a, b) = (operands[0], operands[1]);
    match op {
        OpKind::Add => add(a, b, result),
        OpKind::Subtract => sub(a, b, result),
        OpKind::Multiply => multiply(a, b, result),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(dims: &[usize], data: &[f32]) -> Tensor {
        Tensor::new(Shape::new(dims.to_vec()), data.to_vec()).unwrap()
    }

    #[test]
    fn elementwise_results() {
        let a = t(&[2, 2], &[1.0, 2.0, 3.0, 4.0]);
        let b = t(&[2, 2], &[0.5, -1.0, 2.0, 10.0]);
        let mut out = Tensor::zeros(Shape::new(vec![2, 2]));

        let cases: [(&str, fn(f32, f32) -> f32); 3] = [
            ("add", |x, y| x + y),
            ("sub", |x, y| x - y),
            ("mul", |x, y| x * y),
        ];
        for (name, f) in cases {
            dispatch(name, &[&a, &b], &mut out).unwrap();
            for i in 0..a.len() {
                assert_eq!(out.data[i], f(a.data[i], b.data[i]), "{} at {}", name, i);
            }
        }
    }

    #[test]
    fn long_aliases_dispatch() {
        let a = t(&[3], &[5.0, 6.0, 7.0]);
        let b = t(&[3], &[1.0, 2.0, 3.0]);
        let mut out = Tensor::zeros(Shape::new(vec![3]));

        dispatch("subtract", &[&a, &b], &mut out).unwrap();
        assert_eq!(out.data, vec![4.0, 4.0, 4.0]);
        dispatch("multiply", &[&a, &b], &mut out).unwrap();
        assert_eq!(out.data, vec![5.0, 12.0, 21.0]);
    }

    #[test]
    fn unknown_operator() {
        let a = t(&[1], &[1.0]);
        let mut out = Tensor::zeros(Shape::new(vec![1]));
        let err = dispatch("div", &[&a, &a], &mut out).unwrap_err();
        assert_eq!(err, EngineError::UnknownOperator("div".into()));
    }

    #[test]
    fn shape_mismatch_between_operands() {
        let a = t(&[4], &[1.0; 4]);
        let b = t(&[2, 2], &[1.0; 4]);
        let mut out = Tensor::zeros(Shape::new(vec![4]));
        assert!(matches!(
            dispatch("add", &[&a, &b], &mut out),
            Err(EngineError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn shape_mismatch_with_result() {
        let a = t(&[2], &[1.0, 2.0]);
        let mut out = Tensor::zeros(Shape::scalar());
        assert!(matches!(
            dispatch("mul", &[&a, &a], &mut out),
            Err(EngineError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn wrong_operand_count() {
        let a = t(&[1], &[1.0]);
        let mut out = Tensor::zeros(Shape::new(vec![1]));
        assert!(matches!(
            dispatch("add", &[&a], &mut out),
            Err(EngineError::Arity {
                expected: 2,
                actual: 1,
                ..
            })
        ));
    }

    #[test]
    fn data_length_must_match_shape() {
        let a = t(&[2, 2], &[1.0, 2.0, 3.0, 4.0]);
        let mut short = a.clone();
        short.data.truncate(3);
        let mut out = Tensor::zeros(Shape::new(vec![2, 2]));

        let err = add(&a, &short, &mut out).unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidTensor {
                context: "add".into(),
                len: 3,
                shape: Shape::new(vec![2, 2]),
            }
        );
        assert_eq!(out.data, vec![0.0; 4]);

        let mut long_out = Tensor::zeros(Shape::new(vec![2, 2]));
        long_out.data.push(0.0);
        assert!(matches!(
            multiply(&a, &a, &mut long_out),
            Err(EngineError::InvalidTensor { len: 5, .. })
        ));
    }
}
