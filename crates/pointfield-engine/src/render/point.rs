use bytemuck::{Pod, Zeroable};

/// One simulated point as stored in the point buffer (32 bytes):
///
///  offset  0  position  [f32; 2]  loc 0  (clip space)
///  offset  8  velocity  [f32; 2]  loc 1  (clip units per second)
///  offset 16  color     [f32; 4]  loc 2
///
/// The same buffer is bound as compute storage and as a vertex buffer, so the
/// layout must match `Point` in `points.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Point {
    pub position: [f32; 2],
    pub velocity: [f32; 2],
    pub color: [f32; 4],
}

impl Point {
    pub const STRIDE: u64 = std::mem::size_of::<Point>() as u64;

    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x2, // position
        1 => Float32x2, // velocity
        2 => Float32x4  // color
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: Self::STRIDE,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Deterministic starting layout: a golden-angle spiral with tangential
/// velocity, so repopulating after a reallocation always looks the same.
pub fn spiral(count: usize) -> Vec<Point> {
    const GOLDEN_ANGLE: f32 = 2.399_963;

    let n = count.max(1) as f32;
    (0..count)
        .map(|i| {
            let t = i as f32 / n;
            let radius = 0.9 * t.sqrt();
            let angle = i as f32 * GOLDEN_ANGLE;
            let (sin, cos) = angle.sin_cos();

            Point {
                position: [radius * cos, radius * sin],
                velocity: [-0.2 * sin, 0.2 * cos],
                color: [0.3 + 0.7 * t, 0.6, 1.0 - 0.7 * t, 1.0],
            }
        })
        .collect()
}

/// Uniform block consumed by `update_points`.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct SimParams {
    pub count: u32,
    pub dt: f32,
    pub time: f32,
    pub _pad: u32, // 16-byte alignment
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_matches_shader_layout() {
        assert_eq!(Point::STRIDE, 32);
        assert_eq!(std::mem::size_of::<SimParams>(), 16);
    }

    #[test]
    fn spiral_is_deterministic_and_in_view() {
        let a = spiral(500);
        assert_eq!(a, spiral(500));
        assert_eq!(a.len(), 500);
        for p in &a {
            assert!(p.position[0].abs() <= 1.0 && p.position[1].abs() <= 1.0);
        }
    }

    #[test]
    fn empty_spiral() {
        assert!(spiral(0).is_empty());
    }
}
