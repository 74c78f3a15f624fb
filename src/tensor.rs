//! Conversion between `ndarray` arrays and `tensorflow.TensorProto`.

use half::f16;
use ndarray::{ArrayD, ArrayViewD, IxDyn};

use crate::error::{Error, Result};
use crate::grpc::{tensor_shape_proto, DataType, TensorProto, TensorShapeProto};

/// Encodes a float array as a `DT_FLOAT` tensor with packed `tensor_content`.
pub fn make_tensor_proto(array: &ArrayViewD<'_, f32>) -> TensorProto {
    let mut content = Vec::with_capacity(array.len() * 4);
    // `iter` walks in logical (row-major) order whatever the memory layout.
    for value in array.iter() {
        content.extend_from_slice(&value.to_le_bytes());
    }

    TensorProto {
        dtype: DataType::DtFloat as i32,
        tensor_shape: Some(shape_proto(array.shape())),
        tensor_content: content,
        ..Default::default()
    }
}

pub fn shape_proto(shape: &[usize]) -> TensorShapeProto {
    TensorShapeProto {
        dim: shape
            .iter()
            .map(|&size| tensor_shape_proto::Dim {
                size: size as i64,
                name: String::new(),
            })
            .collect(),
        unknown_rank: false,
    }
}

/// Returns the static shape carried by a tensor proto.
pub fn tensor_shape(proto: &TensorProto) -> Result<Vec<usize>> {
    let shape = match &proto.tensor_shape {
        Some(shape) => shape,
        None => return Ok(Vec::new()),
    };
    if shape.unknown_rank {
        return Err(Error::MalformedOutputs("tensor has unknown rank".into()));
    }
    shape
        .dim
        .iter()
        .map(|d| {
            usize::try_from(d.size)
                .map_err(|_| Error::MalformedOutputs(format!("invalid dimension size {}", d.size)))
        })
        .collect()
}

/// Decodes a numeric tensor proto into an `f32` array.
///
/// Values are read from `tensor_content` when present, otherwise from the typed
/// repeated field matching the dtype. As in TensorFlow, a typed field holding
/// fewer values than the shape needs is padded with its last value.
pub fn make_ndarray(proto: &TensorProto) -> Result<ArrayD<f32>> {
    let shape = tensor_shape(proto)?;
    let expected: usize = shape.iter().product();
    let dtype = DataType::from_i32(proto.dtype)
        .ok_or_else(|| Error::UnsupportedDtype(format!("unknown enum value {}", proto.dtype)))?;

    let values = if !proto.tensor_content.is_empty() {
        decode_content(dtype, &proto.tensor_content)?
    } else {
        let typed: Vec<f32> = match dtype {
            DataType::DtFloat => proto.float_val.clone(),
            DataType::DtDouble => proto.double_val.iter().map(|&v| v as f32).collect(),
            DataType::DtHalf => proto
                .half_val
                .iter()
                .map(|&bits| f16::from_bits(bits as u16).to_f32())
                .collect(),
            DataType::DtInt32 | DataType::DtInt16 | DataType::DtInt8 | DataType::DtUint8 => {
                proto.int_val.iter().map(|&v| v as f32).collect()
            }
            DataType::DtInt64 => proto.int64_val.iter().map(|&v| v as f32).collect(),
            other => return Err(Error::UnsupportedDtype(other.as_str_name().to_string())),
        };
        fill_to(typed, expected)
    };

    if values.len() != expected {
        return Err(Error::ShapeMismatch {
            expected: shape,
            actual: vec![values.len()],
        });
    }
    Ok(ArrayD::from_shape_vec(IxDyn(&shape), values)?)
}

fn decode_content(dtype: DataType, bytes: &[u8]) -> Result<Vec<f32>> {
    fn chunks<const N: usize>(bytes: &[u8]) -> Result<impl Iterator<Item = [u8; N]> + '_> {
        if bytes.len() % N != 0 {
            return Err(Error::MalformedOutputs(format!(
                "tensor_content length {} is not a multiple of {}",
                bytes.len(),
                N
            )));
        }
        Ok(bytes.chunks_exact(N).map(|c| {
            let mut buf = [0u8; N];
            buf.copy_from_slice(c);
            buf
        }))
    }

    let values = match dtype {
        DataType::DtFloat => chunks::<4>(bytes)?.map(f32::from_le_bytes).collect(),
        DataType::DtDouble => chunks::<8>(bytes)?
            .map(|b| f64::from_le_bytes(b) as f32)
            .collect(),
        DataType::DtHalf => chunks::<2>(bytes)?
            .map(|b| f16::from_le_bytes(b).to_f32())
            .collect(),
        DataType::DtInt32 => chunks::<4>(bytes)?
            .map(|b| i32::from_le_bytes(b) as f32)
            .collect(),
        DataType::DtInt64 => chunks::<8>(bytes)?
            .map(|b| i64::from_le_bytes(b) as f32)
            .collect(),
        DataType::DtUint8 => bytes.iter().map(|&b| b as f32).collect(),
        other => return Err(Error::UnsupportedDtype(other.as_str_name().to_string())),
    };
    Ok(values)
}

fn fill_to(mut values: Vec<f32>, len: usize) -> Vec<f32> {
    if let Some(&last) = values.last() {
        if values.len() < len {
            values.resize(len, last);
        }
    } else {
        values.resize(len, 0.0);
    }
    values
}
