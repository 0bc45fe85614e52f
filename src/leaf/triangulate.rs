//! Ear clipping triangulation of a simple polygon

use crate::core::types::{Vec2, Vec3};
use crate::leaf::contour::{cross2d, signed_area};
use crate::mesh::Mesh;

fn point_in_triangle(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    let d1 = cross2d(p, a, b);
    let d2 = cross2d(p, b, c);
    let d3 = cross2d(p, c, a);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

fn is_ear(polygon: &[Vec2], prev: usize, curr: usize, next: usize) -> bool {
    let (a, b, c) = (polygon[prev], polygon[curr], polygon[next]);
    if cross2d(a, b, c) <= 0.0 {
        return false;
    }
    polygon
        .iter()
        .enumerate()
        .all(|(i, &p)| i == prev || i == curr || i == next || !point_in_triangle(p, a, b, c))
}

/// Triangulate `contour` into a flat mesh at z = 0.
///
/// Triangles are counter-clockwise degenerate quads referencing the contour
/// points by index. When no ear can be found (self-intersecting or degenerate
/// outlines) the remaining polygon is fanned around an extra centroid vertex.
pub fn triangulate(contour: &[Vec2]) -> Mesh {
    let mut mesh = Mesh::new();
    mesh.vertices = contour.iter().map(|p| p.extend(0.0)).collect();
    if contour.len() < 3 {
        return mesh;
    }

    let mut indices: Vec<u32> = (0..contour.len() as u32).collect();
    if signed_area(contour) < 0.0 {
        indices.reverse();
    }
    let mut polygon: Vec<Vec2> = indices.iter().map(|&i| contour[i as usize]).collect();

    let mut start = 0;
    while polygon.len() > 2 {
        let n = polygon.len();
        // Resume the search near the last ear, clipping tends to cluster
        let ear = (0..n)
            .map(|k| (start + k) % n)
            .find(|&i| is_ear(&polygon, (i + n - 1) % n, i, (i + 1) % n));

        match ear {
            Some(i) => {
                let (prev, next) = ((i + n - 1) % n, (i + 1) % n);
                mesh.add_triangle(indices[prev], indices[i], indices[next]);
                polygon.remove(i);
                indices.remove(i);
                start = i.saturating_sub(1);
            }
            None => {
                let centroid = polygon.iter().copied().sum::<Vec2>() / n as f32;
                let center = mesh.vertices.len() as u32;
                mesh.vertices.push(Vec3::new(centroid.x, centroid.y, 0.0));
                for i in 0..n {
                    mesh.add_triangle(indices[i], indices[(i + 1) % n], center);
                }
                break;
            }
        }
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convex_polygon() {
        let contour: Vec<Vec2> = (0..6)
            .map(|i| {
                let a = i as f32 / 6.0 * std::f32::consts::TAU;
                Vec2::new(a.cos(), a.sin())
            })
            .collect();
        let mesh = triangulate(&contour);
        assert_eq!(mesh.polygon_count(), 4);
        assert_eq!(mesh.vertex_count(), 6);
        for p in &mesh.polygons {
            assert_eq!(p[2], p[3]);
        }
    }

    #[test]
    fn test_concave_polygon_is_covered() {
        // Arrow shape with one reflex vertex
        let contour = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 1.0),
            Vec2::new(0.0, 2.0),
            Vec2::new(0.5, 1.0),
        ];
        let mesh = triangulate(&contour);
        assert_eq!(mesh.polygon_count(), 2);
        let area: f32 = mesh
            .polygons
            .iter()
            .map(|p| {
                let v = |i: u32| mesh.vertices[i as usize].truncate();
                cross2d(v(p[0]), v(p[1]), v(p[2])) * 0.5
            })
            .sum();
        assert!((area - signed_area(&contour)).abs() < 1e-5);
    }

    #[test]
    fn test_clockwise_input_is_reoriented() {
        let contour = vec![Vec2::new(0.0, 0.0), Vec2::new(0.0, 1.0), Vec2::new(1.0, 1.0), Vec2::new(1.0, 0.0)];
        let mesh = triangulate(&contour);
        for p in &mesh.polygons {
            let v = |i: u32| mesh.vertices[i as usize].truncate();
            assert!(cross2d(v(p[0]), v(p[1]), v(p[2])) > 0.0);
        }
    }

    #[test]
    fn test_degenerate_polygon_falls_back_to_fan() {
        // All points on a line: no ear is ever convex
        let contour = vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(2.0, 0.0), Vec2::new(3.0, 0.0)];
        let mesh = triangulate(&contour);
        assert_eq!(mesh.vertex_count(), 5);
        assert_eq!(mesh.polygon_count(), 4);
        assert!(mesh.polygons.iter().flatten().all(|&i| i < 5));
    }
}
