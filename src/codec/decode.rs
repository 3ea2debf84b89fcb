// Leaf decoder: the inverse of the leaf encoder

use byteorder::{BigEndian, LittleEndian, NativeEndian, ReadBytesExt};

use crate::codec::date::unpack_date;
use crate::codec::encode::unsupported_width;
use crate::config::FloatByteOrder;
use crate::internal::error::Result;
use crate::tree::{FieldType, LeafLayout, LeafValue};

/// Decodes a leaf region. `chunk` must hold exactly `layout.byte_size` bytes.
///
/// Strings are read as Latin-1 with trailing NUL padding removed.
pub fn decode_leaf(
    key: &str,
    chunk: &[u8],
    layout: &LeafLayout,
    float_order: FloatByteOrder,
) -> Result<LeafValue> {
    let mut reader = chunk;

    let value = match layout.field_type {
        FieldType::String => {
            let end = chunk.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
            LeafValue::String(chunk[..end].iter().map(|b| char::from(*b)).collect())
        }
        FieldType::Int => LeafValue::Int(match chunk.len() {
            1 => i64::from(reader.read_i8()?),
            2 => i64::from(reader.read_i16::<BigEndian>()?),
            4 => i64::from(reader.read_i32::<BigEndian>()?),
            8 => reader.read_i64::<BigEndian>()?,
            _ => return Err(unsupported_width(key, layout)),
        }),
        FieldType::UInt => LeafValue::UInt(match chunk.len() {
            1 => u64::from(reader.read_u8()?),
            2 => u64::from(reader.read_u16::<BigEndian>()?),
            4 => u64::from(reader.read_u32::<BigEndian>()?),
            8 => reader.read_u64::<BigEndian>()?,
            _ => return Err(unsupported_width(key, layout)),
        }),
        FieldType::Float => {
            if chunk.len() != 4 {
                return Err(unsupported_width(key, layout));
            }
            let v = match float_order {
                FloatByteOrder::Native => reader.read_f32::<NativeEndian>()?,
                FloatByteOrder::Big => reader.read_f32::<BigEndian>()?,
                FloatByteOrder::Little => reader.read_f32::<LittleEndian>()?,
            };
            LeafValue::Float(f64::from(v))
        }
        FieldType::Double => {
            if chunk.len() != 8 {
                return Err(unsupported_width(key, layout));
            }
            LeafValue::Float(match float_order {
                FloatByteOrder::Native => reader.read_f64::<NativeEndian>()?,
                FloatByteOrder::Big => reader.read_f64::<BigEndian>()?,
                FloatByteOrder::Little => reader.read_f64::<LittleEndian>()?,
            })
        }
        FieldType::Date => {
            if chunk.len() != 4 {
                return Err(unsupported_width(key, layout));
            }
            LeafValue::Date(unpack_date(reader.read_u32::<BigEndian>()?))
        }
    };

    Ok(value)
}
