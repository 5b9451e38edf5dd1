use cgmath::Matrix4;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

pub fn convert_matrix4_to_array(matrix4: Matrix4<f32>) -> [[f32; 4]; 4] {
    let mut result = [[0.0; 4]; 4];

    for i in 0..4 {
        for j in 0..4 {
            result[i][j] = matrix4[i][j];
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::SquareMatrix;

    #[test]
    fn test_identity_converts_column_major() {
        let array = convert_matrix4_to_array(Matrix4::identity());
        assert_eq!(array[0], [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(array[3], [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_translation_lands_in_last_column() {
        let m = Matrix4::from_translation(cgmath::Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(convert_matrix4_to_array(m)[3], [1.0, 2.0, 3.0, 1.0]);
    }
}
