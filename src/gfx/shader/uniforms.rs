//! Named per-draw uniforms
//!
//! A [`UniformLayout`] places each named field the way WGSL lays out a
//! uniform struct, so the bytes of [`UniformValues`] can be copied straight
//! into a uniform buffer.

use cgmath::Matrix4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformType {
    /// Stored as a `u32`; WGSL does not allow `bool` in uniform buffers
    Bool,
    Int,
    Float,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
}

impl UniformType {
    pub fn align(self) -> usize {
        match self {
            UniformType::Bool | UniformType::Int | UniformType::Float => 4,
            UniformType::Vec2 => 8,
            UniformType::Vec3 | UniformType::Vec4 | UniformType::Mat4 => 16,
        }
    }

    pub fn size(self) -> usize {
        match self {
            UniformType::Bool | UniformType::Int | UniformType::Float => 4,
            UniformType::Vec2 => 8,
            UniformType::Vec3 => 12,
            UniformType::Vec4 => 16,
            UniformType::Mat4 => 64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat4([[f32; 4]; 4]),
}

impl UniformValue {
    pub fn ty(&self) -> UniformType {
        match self {
            UniformValue::Bool(_) => UniformType::Bool,
            UniformValue::Int(_) => UniformType::Int,
            UniformValue::Float(_) => UniformType::Float,
            UniformValue::Vec2(_) => UniformType::Vec2,
            UniformValue::Vec3(_) => UniformType::Vec3,
            UniformValue::Vec4(_) => UniformType::Vec4,
            UniformValue::Mat4(_) => UniformType::Mat4,
        }
    }

    fn write_to(&self, out: &mut [u8]) {
        match self {
            UniformValue::Bool(v) => out.copy_from_slice(&u32::from(*v).to_ne_bytes()),
            UniformValue::Int(v) => out.copy_from_slice(&v.to_ne_bytes()),
            UniformValue::Float(v) => out.copy_from_slice(&v.to_ne_bytes()),
            UniformValue::Vec2(v) => out.copy_from_slice(bytemuck::bytes_of(v)),
            UniformValue::Vec3(v) => out.copy_from_slice(bytemuck::bytes_of(v)),
            UniformValue::Vec4(v) => out.copy_from_slice(bytemuck::bytes_of(v)),
            UniformValue::Mat4(v) => out.copy_from_slice(bytemuck::bytes_of(v)),
        }
    }
}

impl From<Matrix4<f32>> for UniformValue {
    fn from(m: Matrix4<f32>) -> Self {
        UniformValue::Mat4(m.into())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UniformField {
    pub name: String,
    pub ty: UniformType,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct UniformLayout {
    fields: Vec<UniformField>,
    size: usize,
}

impl UniformLayout {
    /// Lays out `fields` in declaration order
    pub fn new(fields: &[(&str, UniformType)]) -> Self {
        let mut offset: usize = 0;
        let mut placed = Vec::with_capacity(fields.len());
        for (name, ty) in fields {
            offset = offset.next_multiple_of(ty.align());
            placed.push(UniformField {
                name: name.to_string(),
                ty: *ty,
                offset,
            });
            offset += ty.size();
        }

        Self {
            fields: placed,
            size: offset.next_multiple_of(16),
        }
    }

    /// Struct size rounded up to 16 bytes
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn field(&self, name: &str) -> Option<&UniformField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn offset_of(&self, name: &str) -> Option<usize> {
        self.field(name).map(|f| f.offset)
    }

    pub fn fields(&self) -> &[UniformField] {
        &self.fields
    }
}

/// Why a named write did not land
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformMismatch {
    Unknown,
    WrongType {
        expected: UniformType,
        found: UniformType,
    },
}

/// Current values of a program's uniforms
#[derive(Debug, Clone, PartialEq)]
pub struct UniformValues {
    layout: UniformLayout,
    data: Vec<u8>,
}

impl UniformValues {
    pub fn new(layout: UniformLayout) -> Self {
        Self {
            data: vec![0; layout.size()],
            layout,
        }
    }

    pub fn layout(&self) -> &UniformLayout {
        &self.layout
    }

    pub fn set(&mut self, name: &str, value: UniformValue) -> Result<(), UniformMismatch> {
        let field = self.layout.field(name).ok_or(UniformMismatch::Unknown)?;
        if field.ty != value.ty() {
            return Err(UniformMismatch::WrongType {
                expected: field.ty,
                found: value.ty(),
            });
        }

        let range = field.offset..field.offset + field.ty.size();
        value.write_to(&mut self.data[range]);
        Ok(())
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_follows_wgsl_alignment() {
        let layout = UniformLayout::new(&[
            ("model", UniformType::Mat4),
            ("uv_scale", UniformType::Vec2),
            ("shininess", UniformType::Float),
            ("color", UniformType::Vec3),
            ("has_normal_map", UniformType::Bool),
        ]);

        assert_eq!(layout.offset_of("model"), Some(0));
        assert_eq!(layout.offset_of("uv_scale"), Some(64));
        assert_eq!(layout.offset_of("shininess"), Some(72));
        // vec3 aligns to 16 and leaves room for a trailing scalar
        assert_eq!(layout.offset_of("color"), Some(80));
        assert_eq!(layout.offset_of("has_normal_map"), Some(92));
        assert_eq!(layout.size(), 96);
    }

    #[test]
    fn test_struct_size_rounds_to_sixteen() {
        let layout = UniformLayout::new(&[
            ("exposure", UniformType::Float),
            ("gamma", UniformType::Float),
            ("tone_map", UniformType::Bool),
        ]);
        assert_eq!(layout.size(), 16);
    }

    #[test]
    fn test_set_writes_bytes_at_field_offset() {
        let mut values = UniformValues::new(UniformLayout::new(&[
            ("a", UniformType::Float),
            ("flag", UniformType::Bool),
        ]));
        values.set("flag", UniformValue::Bool(true)).unwrap();
        values.set("a", UniformValue::Float(2.0)).unwrap();

        assert_eq!(&values.bytes()[0..4], &2.0f32.to_ne_bytes());
        assert_eq!(&values.bytes()[4..8], &1u32.to_ne_bytes());
    }

    #[test]
    fn test_mismatches_leave_values_untouched() {
        let mut values = UniformValues::new(UniformLayout::new(&[("a", UniformType::Float)]));
        let before = values.bytes().to_vec();

        assert_eq!(
            values.set("missing", UniformValue::Float(1.0)),
            Err(UniformMismatch::Unknown)
        );
        assert_eq!(
            values.set("a", UniformValue::Int(1)),
            Err(UniformMismatch::WrongType {
                expected: UniformType::Float,
                found: UniformType::Int
            })
        );
        assert_eq!(values.bytes(), before.as_slice());
    }
}
