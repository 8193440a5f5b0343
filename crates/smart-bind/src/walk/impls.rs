//! `Bind` implementations for standard types.

use std::{
    collections::{BTreeMap, HashMap},
    hash::BuildHasher,
};

use chrono::{DateTime, FixedOffset, Local, Utc};

use super::{Outcome, Step, Walker};
use crate::{Bind, error::BindError, field::Field, metadata::Shape, source::FilePart};

/// Value bound from a single request param with type coercion.
pub(crate) trait Scalar: Sized {
    /// Type name used in coercion errors.
    const NAME: &'static str;

    fn extract(field: &Field<'_>) -> Option<Self>;
}

macro_rules! impl_scalar {
    ($($(#[$attr:meta])* $ty:ty => $shape:ident($name:literal), |$field:ident| $extract:expr;)+) => {
        $(
        impl Scalar for $ty {
            const NAME: &'static str = $name;

            $(#[$attr])*
            fn extract($field: &Field<'_>) -> Option<Self> {
                $extract
            }
        }

        impl Bind for $ty {
            fn shape() -> Shape {
                Shape::$shape
            }

            fn bind(&mut self, walker: &Walker<'_>, step: &Step) -> Result<Outcome, BindError> {
                walker.bind_scalar(step, self)
            }
        }
        )+
    };
}

impl_scalar! {
    bool => Bool("bool"), |field| field.bool();
    String => String("string"), |field| field.str().map(str::to_owned);
    i8 => Int("int"), |field| field.int()?.try_into().ok();
    i16 => Int("int"), |field| field.int()?.try_into().ok();
    i32 => Int("int"), |field| field.int()?.try_into().ok();
    i64 => Int("int"), |field| field.int();
    isize => Int("int"), |field| field.int()?.try_into().ok();
    u8 => Uint("uint"), |field| field.uint()?.try_into().ok();
    u16 => Uint("uint"), |field| field.uint()?.try_into().ok();
    u32 => Uint("uint"), |field| field.uint()?.try_into().ok();
    u64 => Uint("uint"), |field| field.uint();
    usize => Uint("uint"), |field| field.uint()?.try_into().ok();
    #[allow(clippy::cast_possible_truncation)]
    f32 => Float("float"), |field| field.float().map(|value| value as f32);
    f64 => Float("float"), |field| field.float();
}

impl<T: Bind> Bind for Vec<T> {
    fn shape() -> Shape {
        Shape::Slice(T::shape)
    }

    fn bind(&mut self, walker: &Walker<'_>, step: &Step) -> Result<Outcome, BindError> {
        walker.bind_slice(step, self)
    }
}

impl<V: Bind, S: BuildHasher + Default + 'static> Bind for HashMap<String, V, S> {
    fn shape() -> Shape {
        Shape::Map(V::shape)
    }

    fn bind(&mut self, walker: &Walker<'_>, step: &Step) -> Result<Outcome, BindError> {
        Ok(match walker.bind_map::<V>(step)? {
            Some(entries) => {
                *self = entries.into_iter().collect();
                Outcome::Bound
            }
            None => Outcome::Absent,
        })
    }
}

impl<V: Bind> Bind for BTreeMap<String, V> {
    fn shape() -> Shape {
        Shape::Map(V::shape)
    }

    fn bind(&mut self, walker: &Walker<'_>, step: &Step) -> Result<Outcome, BindError> {
        Ok(match walker.bind_map::<V>(step)? {
            Some(entries) => {
                *self = entries.into_iter().collect();
                Outcome::Bound
            }
            None => Outcome::Absent,
        })
    }
}

/// Binds a default pointee and attaches it only if something was bound to it, so that absent params
/// leave `None` intact. The pointee is validated even if the param is absent; e.g., `required` fields
/// of an absent optional struct fail.
impl<T: Bind> Bind for Option<T> {
    fn shape() -> Shape {
        Shape::Optional(T::shape)
    }

    fn bind(&mut self, walker: &Walker<'_>, step: &Step) -> Result<Outcome, BindError> {
        walker.bind_optional(step, self)
    }
}

impl<T: Bind> Bind for Box<T> {
    fn shape() -> Shape {
        T::shape()
    }

    fn bind(&mut self, walker: &Walker<'_>, step: &Step) -> Result<Outcome, BindError> {
        T::bind(self, walker, step)
    }
}

macro_rules! impl_time {
    ($($tz:ty => |$timestamp:ident| $convert:expr,)+) => {
        $(
        impl Bind for DateTime<$tz> {
            fn shape() -> Shape {
                Shape::Time
            }

            fn bind(&mut self, walker: &Walker<'_>, step: &Step) -> Result<Outcome, BindError> {
                let Some($timestamp) = walker.bind_time(step)? else {
                    return Ok(Outcome::Absent);
                };
                *self = $convert;
                Ok(Outcome::Bound)
            }
        }
        )+
    };
}

impl_time! {
    FixedOffset => |timestamp| timestamp,
    Utc => |timestamp| timestamp.with_timezone(&Utc),
    Local => |timestamp| timestamp.with_timezone(&Local),
}

impl Bind for FilePart {
    fn shape() -> Shape {
        Shape::File
    }

    fn bind(&mut self, walker: &Walker<'_>, step: &Step) -> Result<Outcome, BindError> {
        let Some(file) = walker.bind_file(step)? else {
            return Ok(Outcome::Absent);
        };
        *self = file;
        Ok(Outcome::Bound)
    }
}

impl Bind for serde_json::Value {
    fn shape() -> Shape {
        Shape::Any
    }

    fn bind(&mut self, walker: &Walker<'_>, step: &Step) -> Result<Outcome, BindError> {
        let Some(value) = walker.bind_any(step) else {
            return Ok(Outcome::Absent);
        };
        *self = value;
        Ok(Outcome::Bound)
    }
}
