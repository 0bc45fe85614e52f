//! Wavefront OBJ export

use std::io::{self, Write};

use crate::mesh::Mesh;

/// Write `mesh` as OBJ text. Degenerate quads are written as triangles.
pub fn write_obj(writer: &mut impl Write, mesh: &Mesh) -> io::Result<()> {
    writeln!(writer, "# {} vertices, {} polygons", mesh.vertex_count(), mesh.polygon_count())?;
    for v in &mesh.vertices {
        writeln!(writer, "v {} {} {}", v.x, v.y, v.z)?;
    }
    for uv in &mesh.uvs {
        writeln!(writer, "vt {} {}", uv.x, uv.y)?;
    }

    let with_uvs = !mesh.uvs.is_empty() && mesh.uv_loops.len() == mesh.polygons.len();
    for (i, polygon) in mesh.polygons.iter().enumerate() {
        let corners = if polygon[3] == polygon[2] { 3 } else { 4 };
        write!(writer, "f")?;
        for corner in 0..corners {
            // OBJ indices are 1-based
            if with_uvs {
                write!(writer, " {}/{}", polygon[corner] + 1, mesh.uv_loops[i][corner] + 1)?;
            } else {
                write!(writer, " {}", polygon[corner] + 1)?;
            }
        }
        writeln!(writer)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Vec2, Vec3};

    #[test]
    fn test_write_triangle_and_quad() {
        let mut mesh = Mesh::new();
        mesh.vertices = vec![Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y];
        mesh.uvs = vec![Vec2::ZERO, Vec2::X, Vec2::ONE, Vec2::Y];
        mesh.add_triangle(0, 1, 2);
        mesh.polygons.push([0, 1, 2, 3]);
        mesh.uv_loops.push([0, 1, 2, 3]);

        let mut out = Vec::new();
        write_obj(&mut out, &mesh).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(text.lines().filter(|l| l.starts_with("v ")).count(), 4);
        assert_eq!(text.lines().filter(|l| l.starts_with("vt ")).count(), 4);
        assert!(text.contains("f 1/1 2/2 3/3\n"));
        assert!(text.contains("f 1/1 2/2 3/3 4/4\n"));
    }

    #[test]
    fn test_write_without_uvs() {
        let mut mesh = Mesh::new();
        mesh.vertices = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        mesh.polygons.push([0, 1, 2, 2]);

        let mut out = Vec::new();
        write_obj(&mut out, &mesh).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("f 1 2 3\n"));
    }
}
