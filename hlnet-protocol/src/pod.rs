//! Fixed-layout value records: ordered lists of named fields.
//!
//! Records are written field by field in declaration order with no padding
//! and no length prefix. Most are all-f32, so their wire size is
//! `4 * fields`; [`Color32`] packs four bytes.

use crate::codec::{Reader, Writer};
use crate::error::CodecError;

/// A fixed-width record.
pub trait PodRecord: Sized {
    /// Field names in wire order.
    const FIELD_NAMES: &'static [&'static str];
    /// Encoded size in bytes. The default assumes f32 fields.
    const WIRE_SIZE: usize = Self::FIELD_NAMES.len() * 4;

    fn write_fields(&self, writer: &mut Writer);
    fn read_fields(reader: &mut Reader) -> Result<Self, CodecError>;
}

macro_rules! pod_record {
    ($(#[$meta:meta])* $name:ident { $($field:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Default)]
        pub struct $name {
            $(pub $field: f32,)+
        }

        impl $name {
            #[allow(clippy::too_many_arguments)]
            pub const fn new($($field: f32),+) -> Self {
                Self { $($field),+ }
            }
        }

        impl PodRecord for $name {
            const FIELD_NAMES: &'static [&'static str] = &[$(stringify!($field)),+];

            fn write_fields(&self, writer: &mut Writer) {
                $(writer.write_f32(self.$field);)+
            }

            fn read_fields(reader: &mut Reader) -> Result<Self, CodecError> {
                Ok(Self {
                    $($field: reader.read_f32()?,)+
                })
            }
        }
    };
}

pod_record!(Vector2 { x, y });
pod_record!(Vector3 { x, y, z });
pod_record!(Vector4 { x, y, z, w });
pod_record!(
    /// Rotation stored as x, y, z, w.
    Quaternion { x, y, z, w }
);
pod_record!(Color { r, g, b, a });
pod_record!(
    /// Axis-aligned rectangle given by origin and extent.
    Rect { x, y, width, height }
);
pod_record!(
    /// Plane as a normal and a signed distance from the origin.
    Plane { normal_x, normal_y, normal_z, distance }
);
pod_record!(
    /// Ray as a direction followed by an origin.
    Ray { direction_x, direction_y, direction_z, origin_x, origin_y, origin_z }
);
pod_record!(
    /// Row-major 4x4 matrix.
    Matrix4x4 {
        m00, m01, m02, m03,
        m10, m11, m12, m13,
        m20, m21, m22, m23,
        m30, m31, m32, m33,
    }
);

/// 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color32 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color32 {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl PodRecord for Color32 {
    const FIELD_NAMES: &'static [&'static str] = &["r", "g", "b", "a"];
    const WIRE_SIZE: usize = 4;

    fn write_fields(&self, writer: &mut Writer) {
        writer.write_u8(self.r);
        writer.write_u8(self.g);
        writer.write_u8(self.b);
        writer.write_u8(self.a);
    }

    fn read_fields(reader: &mut Reader) -> Result<Self, CodecError> {
        Ok(Self {
            r: reader.read_u8()?,
            g: reader.read_u8()?,
            b: reader.read_u8()?,
            a: reader.read_u8()?,
        })
    }
}

impl Quaternion {
    pub const IDENTITY: Quaternion = Quaternion::new(0.0, 0.0, 0.0, 1.0);
}

impl Plane {
    pub fn normal(&self) -> Vector3 {
        Vector3::new(self.normal_x, self.normal_y, self.normal_z)
    }
}

impl Ray {
    pub fn from_parts(origin: Vector3, direction: Vector3) -> Self {
        Self::new(direction.x, direction.y, direction.z, origin.x, origin.y, origin.z)
    }

    pub fn direction(&self) -> Vector3 {
        Vector3::new(self.direction_x, self.direction_y, self.direction_z)
    }

    pub fn origin(&self) -> Vector3 {
        Vector3::new(self.origin_x, self.origin_y, self.origin_z)
    }
}

impl Matrix4x4 {
    #[rustfmt::skip]
    pub const IDENTITY: Matrix4x4 = Matrix4x4::new(
        1.0, 0.0, 0.0, 0.0,
        0.0, 1.0, 0.0, 0.0,
        0.0, 0.0, 1.0, 0.0,
        0.0, 0.0, 0.0, 1.0,
    );
}
