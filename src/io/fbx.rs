//! FBX format support (binary, version 7.4 and later).
//!
//! Reads every `Geometry` object of class `Mesh` from the node tree and merges
//! them into one [`Mesh`]. Polygons are fan-triangulated. The first
//! `LayerElementUV` of each geometry is kept when every geometry has one; the
//! mesh is then built non-indexed with one UV per corner, as for OBJ.
//!
//! Model transforms are not applied and ASCII FBX is rejected.
//!
//! Note: Saving to FBX is not supported.

use std::io::Cursor;

use fbxcel::low::v7400::AttributeValue;
use fbxcel::tree::any::AnyTree;
use fbxcel::tree::v7400::NodeHandle;
use nalgebra::{Point2, Point3};

use super::Format;
use crate::error::{Error, Result};
use crate::mesh::Mesh;

/// Raw arrays of one `Geometry` node.
#[derive(Debug, Clone, Default)]
struct Geometry {
    name: Option<String>,
    /// Control points as flat `x, y, z` triples.
    vertices: Vec<f64>,
    /// Control point per polygon vertex; a negative value `i` ends a polygon
    /// and stands for `!i`.
    polygon_vertex_index: Vec<i32>,
    uv: Option<UvLayer>,
}

/// What a UV layer's entries are attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UvMapping {
    ByPolygonVertex,
    ByControlPoint,
}

#[derive(Debug, Clone)]
struct UvLayer {
    mapping: UvMapping,
    /// Flat `u, v` pairs.
    uv: Vec<f64>,
    /// Indirection into `uv` for `IndexToDirect` layers.
    uv_index: Option<Vec<i32>>,
}

impl Geometry {
    fn control_points(&self) -> Result<Vec<Point3<f64>>> {
        if self.vertices.len() % 3 != 0 {
            return Err(parse_error(format!(
                "Vertices holds {} values, not a multiple of three",
                self.vertices.len()
            )));
        }
        Ok(self
            .vertices
            .chunks_exact(3)
            .map(|p| Point3::new(p[0], p[1], p[2]))
            .collect())
    }
}

impl UvLayer {
    /// UV of polygon vertex `corner`, which sits on control point `point`.
    fn lookup(&self, corner: usize, point: usize) -> Result<Point2<f64>> {
        let direct = match self.mapping {
            UvMapping::ByPolygonVertex => corner,
            UvMapping::ByControlPoint => point,
        };
        let index = match &self.uv_index {
            Some(uv_index) => uv_index
                .get(direct)
                .and_then(|&i| usize::try_from(i).ok()),
            None => Some(direct),
        };

        index
            .and_then(|i| Some(Point2::new(*self.uv.get(2 * i)?, *self.uv.get(2 * i + 1)?)))
            .ok_or_else(|| parse_error(format!("UV of polygon vertex {} is out of range", corner)))
    }
}

/// Parse binary FBX bytes.
pub fn parse(bytes: &[u8]) -> Result<Mesh> {
    let tree = match AnyTree::from_seekable_reader(Cursor::new(bytes)) {
        Ok(AnyTree::V7400(_, tree, _)) => tree,
        Ok(_) => return Err(parse_error("unsupported FBX version")),
        Err(e) => return Err(parse_error(e.to_string())),
    };

    let mut geometries = Vec::new();
    for objects in tree.root().children_by_name("Objects") {
        for node in objects.children_by_name("Geometry") {
            if string_attribute(&node, 2) == Some("Mesh") {
                geometries.push(read_geometry(&node)?);
            }
        }
    }
    log::debug!("FBX: {} mesh geometries", geometries.len());

    build_mesh(&geometries)
}

fn parse_error<M: Into<String>>(message: M) -> Error {
    Error::parse(Format::Fbx, message)
}

fn string_attribute<'a>(node: &'a NodeHandle<'_>, index: usize) -> Option<&'a str> {
    match node.attributes().get(index) {
        Some(AttributeValue::String(s)) => Some(s.as_str()),
        _ => None,
    }
}

fn child_string(node: &NodeHandle<'_>, name: &str) -> Option<String> {
    let child = node.first_child_by_name(name)?;
    string_attribute(&child, 0).map(str::to_string)
}

fn child_f64s(node: &NodeHandle<'_>, name: &str) -> Option<Vec<f64>> {
    let child = node.first_child_by_name(name)?;
    match child.attributes().first()? {
        AttributeValue::ArrF64(values) => Some(values.clone()),
        AttributeValue::ArrF32(values) => Some(values.iter().map(|&v| v as f64).collect()),
        _ => None,
    }
}

fn child_i32s(node: &NodeHandle<'_>, name: &str) -> Option<Vec<i32>> {
    let child = node.first_child_by_name(name)?;
    match child.attributes().first()? {
        AttributeValue::ArrI32(values) => Some(values.clone()),
        _ => None,
    }
}

fn read_geometry(node: &NodeHandle<'_>) -> Result<Geometry> {
    // Object names are stored as "name\x00\x01class".
    let name = string_attribute(node, 1)
        .and_then(|full| full.split("\u{0}\u{1}").next())
        .filter(|name| !name.is_empty())
        .map(str::to_string);

    let vertices =
        child_f64s(node, "Vertices").ok_or_else(|| parse_error("geometry has no Vertices"))?;
    let polygon_vertex_index = child_i32s(node, "PolygonVertexIndex")
        .ok_or_else(|| parse_error("geometry has no PolygonVertexIndex"))?;
    let uv = node
        .children_by_name("LayerElementUV")
        .next()
        .and_then(|layer| read_uv_layer(&layer));

    Ok(Geometry {
        name,
        vertices,
        polygon_vertex_index,
        uv,
    })
}

fn read_uv_layer(layer: &NodeHandle<'_>) -> Option<UvLayer> {
    let mapping = match child_string(layer, "MappingInformationType")?.as_str() {
        "ByPolygonVertex" => UvMapping::ByPolygonVertex,
        "ByVertice" | "ByVertex" | "ByControlPoint" => UvMapping::ByControlPoint,
        other => {
            log::debug!("ignoring UV layer mapped {}", other);
            return None;
        }
    };
    let uv = child_f64s(layer, "UV")?;
    let uv_index = match child_string(layer, "ReferenceInformationType").as_deref() {
        Some("IndexToDirect") | Some("Index") => Some(child_i32s(layer, "UVIndex")?),
        _ => None,
    };

    Some(UvLayer {
        mapping,
        uv,
        uv_index,
    })
}

/// Split a `PolygonVertexIndex` array into polygons of polygon-vertex numbers.
///
/// A trailing polygon without an end marker is kept.
fn polygons(polygon_vertex_index: &[i32]) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    let mut current = Vec::new();
    for (corner, &raw) in polygon_vertex_index.iter().enumerate() {
        current.push(corner);
        if raw < 0 {
            out.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn control_point(raw: i32) -> usize {
    if raw < 0 {
        (!raw) as usize
    } else {
        raw as usize
    }
}

fn build_mesh(geometries: &[Geometry]) -> Result<Mesh> {
    let textured = !geometries.is_empty() && geometries.iter().all(|g| g.uv.is_some());

    let mut positions: Vec<Point3<f64>> = Vec::new();
    let mut uvs: Vec<Point2<f64>> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();
    let mut skipped = 0;

    for geometry in geometries {
        let points = geometry.control_points()?;
        let offset = positions.len();
        if !textured {
            positions.extend(points.iter().copied());
        }

        for polygon in polygons(&geometry.polygon_vertex_index) {
            if polygon.len() < 3 {
                skipped += 1;
                continue;
            }
            for i in 1..polygon.len() - 1 {
                for corner in [polygon[0], polygon[i], polygon[i + 1]] {
                    let point = control_point(geometry.polygon_vertex_index[corner]);
                    let position = *points.get(point).ok_or_else(|| {
                        parse_error(format!(
                            "polygon vertex {} uses control point {} of {}",
                            corner,
                            point,
                            points.len()
                        ))
                    })?;

                    match &geometry.uv {
                        Some(layer) if textured => {
                            positions.push(position);
                            uvs.push(layer.lookup(corner, point)?);
                        }
                        _ => indices.push(
                            u32::try_from(offset + point)
                                .map_err(|_| parse_error("too many vertices"))?,
                        ),
                    }
                }
            }
        }
    }

    if skipped > 0 {
        log::debug!("FBX: skipped {} polygons with fewer than three vertices", skipped);
    }

    let mesh = if textured {
        Mesh::new(positions).with_uvs(uvs)?
    } else {
        Mesh::indexed(positions, indices)?
    };

    Ok(match geometries.iter().find_map(|g| g.name.clone()) {
        Some(name) => mesh.with_name(name),
        None => mesh,
    })
}
