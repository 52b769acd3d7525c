//! Wavefront OBJ support.
//!
//! Reading handles `v`, `vt`, `f`, and `o` statements; everything else
//! (normals, groups, materials, smoothing) is skipped. Polygons are
//! fan-triangulated. When every face corner names a texture coordinate the
//! mesh is built non-indexed with one UV per corner, since OBJ lets a position
//! carry different UVs in different faces.
//!
//! Writing emits positions, UVs when present, and 1-based triangle faces.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use nalgebra::{Point2, Point3};

use super::Format;
use crate::error::{Error, Result};
use crate::mesh::Mesh;

/// One face corner: position index and optional texture coordinate index.
#[derive(Debug, Clone, Copy)]
struct Corner {
    v: usize,
    vt: Option<usize>,
}

/// Parse OBJ text.
pub fn parse(bytes: &[u8]) -> Result<Mesh> {
    let text = String::from_utf8_lossy(bytes);

    let mut positions: Vec<Point3<f64>> = Vec::new();
    let mut texcoords: Vec<Point2<f64>> = Vec::new();
    let mut corners: Vec<Corner> = Vec::new();
    let mut name: Option<String> = None;

    for (line_no, raw) in text.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or_default().trim();
        let mut parts = line.split_whitespace();
        let line_no = line_no + 1;

        match parts.next() {
            Some("v") => {
                let [x, y, z] = parse_floats::<3>(&mut parts, line_no)?;
                positions.push(Point3::new(x, y, z));
            }
            Some("vt") => {
                let [u, v] = parse_floats::<2>(&mut parts, line_no)?;
                texcoords.push(Point2::new(u, v));
            }
            Some("f") => {
                let face = parts
                    .map(|c| parse_corner(c, positions.len(), texcoords.len(), line_no))
                    .collect::<Result<Vec<_>>>()?;
                if face.len() < 3 {
                    return Err(syntax(line_no, "face needs at least three corners"));
                }
                for i in 1..face.len() - 1 {
                    corners.extend([face[0], face[i], face[i + 1]]);
                }
            }
            Some("o") if name.is_none() => {
                let rest: Vec<&str> = parts.collect();
                if !rest.is_empty() {
                    name = Some(rest.join(" "));
                }
            }
            _ => {}
        }
    }

    let textured = corners.iter().filter(|c| c.vt.is_some()).count();
    let mesh = if textured > 0 && textured == corners.len() {
        let flat_positions = corners.iter().map(|c| positions[c.v]).collect();
        let flat_uvs = corners
            .iter()
            .filter_map(|c| c.vt.map(|t| texcoords[t]))
            .collect();
        Mesh::new(flat_positions).with_uvs(flat_uvs)?
    } else {
        if textured > 0 {
            log::warn!(
                "only {} of {} face corners have texture coordinates; ignoring UVs",
                textured,
                corners.len()
            );
        }
        let indices = corners.iter().map(|c| c.v as u32).collect();
        Mesh::indexed(positions, indices)?
    };

    Ok(match name {
        Some(name) => mesh.with_name(name),
        None => mesh,
    })
}

fn syntax(line: usize, message: &str) -> Error {
    Error::parse(Format::Obj, format!("line {line}: {message}"))
}

fn parse_floats<'a, const N: usize>(
    parts: &mut impl Iterator<Item = &'a str>,
    line: usize,
) -> Result<[f64; N]> {
    let mut out = [0.0; N];
    for slot in &mut out {
        let token = parts
            .next()
            .ok_or_else(|| syntax(line, &format!("expected {N} numbers")))?;
        *slot = token
            .parse()
            .map_err(|_| syntax(line, &format!("invalid number '{token}'")))?;
    }
    Ok(out)
}

/// Resolve a 1-based or negative (relative) OBJ index.
fn resolve(token: &str, count: usize, line: usize) -> Result<usize> {
    let raw: i64 = token
        .parse()
        .map_err(|_| syntax(line, &format!("invalid index '{token}'")))?;
    let index = match raw {
        0 => None,
        n if n > 0 => Some(n as usize - 1),
        n => count.checked_sub(n.unsigned_abs() as usize),
    };
    index
        .filter(|&i| i < count)
        .ok_or_else(|| syntax(line, &format!("index {raw} out of range")))
}

fn parse_corner(token: &str, positions: usize, texcoords: usize, line: usize) -> Result<Corner> {
    let mut fields = token.split('/');
    let v = resolve(fields.next().unwrap_or_default(), positions, line)?;
    let vt = match fields.next() {
        Some(t) if !t.is_empty() => Some(resolve(t, texcoords, line)?),
        _ => None,
    };
    Ok(Corner { v, vt })
}

/// Write a mesh as OBJ text.
pub fn write_obj<W: Write>(mesh: &Mesh, writer: &mut W) -> Result<()> {
    writeln!(writer, "# Generated by uvlab")?;
    writeln!(
        writer,
        "# {} vertices, {} triangles",
        mesh.num_vertices(),
        mesh.num_triangles()
    )?;
    writeln!(writer, "o {}", mesh.name().unwrap_or("mesh"))?;

    for p in mesh.positions() {
        writeln!(writer, "v {} {} {}", p.x, p.y, p.z)?;
    }

    let uvs = mesh.uvs();
    if let Some(uvs) = uvs {
        for uv in uvs {
            writeln!(writer, "vt {} {}", uv.x, uv.y)?;
        }
    }

    for tri in mesh.triangles() {
        let [a, b, c] = tri.map(|v| v + 1);
        if uvs.is_some() {
            writeln!(writer, "f {a}/{a} {b}/{b} {c}/{c}")?;
        } else {
            writeln!(writer, "f {a} {b} {c}")?;
        }
    }

    Ok(())
}

/// Serialize a mesh to an OBJ string.
pub fn to_obj_string(mesh: &Mesh) -> String {
    let mut buffer = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = write_obj(mesh, &mut buffer);
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Save a mesh to an OBJ file.
///
/// # Example
///
/// ```no_run
/// use uvlab::io::obj;
/// use uvlab::mesh::Mesh;
///
/// let mesh = Mesh::default();
/// obj::save(&mesh, "output.obj").unwrap();
/// ```
pub fn save<P: AsRef<Path>>(mesh: &Mesh, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| Error::SaveError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let mut writer = BufWriter::new(file);

    write_obj(mesh, &mut writer)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = "\
# a unit quad
o Plane
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
f 1 2 3 4
";

    const TEXTURED: &str = "\
v 0 0 0
v 1 0 0
v 0 1 0
vt 0.0 0.0
vt 1.0 0.0
vt 0.0 1.0
vn 0 0 1
f 1/1/1 2/2/1 3/3/1
";

    #[test]
    fn test_parse_polygon_fan() {
        let mesh = parse(QUAD.as_bytes()).unwrap();
        assert_eq!(mesh.name(), Some("Plane"));
        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.indices().unwrap(), &[0, 1, 2, 0, 2, 3]);
        assert!(!mesh.has_uvs());
    }

    #[test]
    fn test_parse_texcoords_builds_corner_mesh() {
        let mesh = parse(TEXTURED.as_bytes()).unwrap();
        assert!(!mesh.is_indexed());
        assert_eq!(mesh.num_triangles(), 1);
        assert_eq!(mesh.uvs().unwrap()[1], Point2::new(1.0, 0.0));
    }

    #[test]
    fn test_parse_negative_and_normal_only_indices() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3//1 -2//1 -1//1\n";
        let mesh = parse(text.as_bytes()).unwrap();
        assert_eq!(mesh.indices().unwrap(), &[0, 1, 2]);
        assert!(!mesh.has_uvs());
    }

    #[test]
    fn test_parse_errors_report_line() {
        let err = parse(b"v 0 0 0\nv 1 0\n").unwrap_err();
        assert!(err.to_string().contains("line 2"), "{err}");

        let err = parse(b"v 0 0 0\nf 1 2 3\n").unwrap_err();
        assert!(err.to_string().contains("out of range"), "{err}");

        assert!(parse(b"v 0 0 0\nf 1 0 1\n").is_err());
    }

    #[test]
    fn test_write_without_uvs() {
        let mesh = parse(QUAD.as_bytes()).unwrap();
        let text = to_obj_string(&mesh);

        assert!(text.contains("o Plane\n"));
        assert!(text.contains("v 1 1 0\n"));
        assert!(text.contains("f 1 3 4\n"));
        assert!(!text.contains("vt "));
    }

    #[test]
    fn test_write_with_uvs() {
        let mesh = parse(TEXTURED.as_bytes()).unwrap();
        let text = to_obj_string(&mesh);

        assert!(text.contains("o mesh\n"));
        assert!(text.contains("vt 1 0\n"));
        assert!(text.contains("f 1/1 2/2 3/3\n"));

        let reparsed = parse(text.as_bytes()).unwrap();
        assert_eq!(reparsed.uvs(), mesh.uvs());
    }

    #[test]
    fn test_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.obj");
        let mesh = parse(QUAD.as_bytes()).unwrap();

        save(&mesh, &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, to_obj_string(&mesh));
    }
}
