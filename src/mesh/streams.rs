//! Conversion between the half-edge form and flat, stride-described buffers.
//!
//! Input goes through [`IndexedFaceList`]: every channel has its own value
//! buffer, stride and per-corner index list. Output is a read-only
//! projection: per-attribute vertex streams, per-material triangle lists,
//! a polygon list, or deduplicated per-channel ("indirect") streams.

use super::triangulate::triangulate_loop;
use super::{MeshEffect, VertexAttribute};
use crate::errors::MeshError;
use crate::float_types::{Real, tolerance};
use crate::sort::{binary_search_le, radix_sort};
use hashbrown::HashMap;
use nalgebra::{Point3, Vector2, Vector3};

/// One input channel: values `data[index * stride ..]` for each corner index.
#[derive(Debug, Clone, Copy)]
pub struct VertexStream<'a> {
    pub data: &'a [Real],
    /// Distance in scalars between consecutive values.
    pub stride: usize,
    /// One index per face corner, in face order.
    pub indices: &'a [usize],
}

impl<'a> VertexStream<'a> {
    pub const fn new(data: &'a [Real], stride: usize, indices: &'a [usize]) -> Self {
        VertexStream {
            data,
            stride,
            indices,
        }
    }

    fn fetch<const N: usize>(&self, corner: usize, stream: &'static str) -> Result<[Real; N], MeshError> {
        let index = *self.indices.get(corner).ok_or(MeshError::IndexOutOfRange {
            stream,
            index: corner,
            len: self.indices.len(),
        })?;
        let out_of_range = MeshError::IndexOutOfRange {
            stream,
            index,
            len: self.data.len() / self.stride.max(1),
        };
        if self.stride < N {
            return Err(out_of_range);
        }
        let start = index.checked_mul(self.stride).ok_or(out_of_range.clone())?;
        let end = start.checked_add(N).ok_or(out_of_range.clone())?;
        let values = self.data.get(start..end).ok_or(out_of_range)?;
        let mut out = [0.0; N];
        out.copy_from_slice(values);
        Ok(out)
    }
}

/// Polygon soup with separately indexed channels.
#[derive(Debug, Clone, Copy)]
pub struct IndexedFaceList<'a> {
    /// Corner count of each face.
    pub face_index_count: &'a [usize],
    pub face_material: &'a [u32],
    pub positions: VertexStream<'a>,
    pub normals: Option<VertexStream<'a>>,
    pub uv0: Option<VertexStream<'a>>,
    pub uv1: Option<VertexStream<'a>>,
}

/// Caller-owned output buffer for one channel.
#[derive(Debug)]
pub struct StreamMut<'a> {
    pub data: &'a mut [Real],
    pub stride: usize,
}

impl<'a> StreamMut<'a> {
    pub fn new(data: &'a mut [Real], stride: usize) -> Self {
        StreamMut { data, stride }
    }

    fn write<const N: usize, I>(&mut self, stream: &'static str, values: I, count: usize) -> Result<(), MeshError>
    where
        I: Iterator<Item = [Real; N]>,
    {
        if count == 0 {
            return Ok(());
        }
        let needed = (count - 1) * self.stride + N;
        if self.stride < N || self.data.len() < needed {
            return Err(MeshError::BufferTooSmall {
                stream,
                needed,
                len: self.data.len(),
            });
        }
        for (i, value) in values.enumerate() {
            let start = i * self.stride;
            self.data[start..start + N].copy_from_slice(&value);
        }
        Ok(())
    }
}

/// Triangle indices (into the attribute table) of one material.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialGroup {
    pub material: u32,
    pub indices: Vec<u32>,
}

/// Triangles grouped by material, ascending material id.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MaterialGeometry {
    pub groups: Vec<MaterialGroup>,
}

impl MaterialGeometry {
    pub fn total_face_count(&self) -> usize {
        self.total_index_count() / 3
    }

    pub fn total_index_count(&self) -> usize {
        self.groups.iter().map(|g| g.indices.len()).sum()
    }

    /// 16-bit copy of one group's indices.
    pub fn indices_u16(&self, group: usize) -> Result<Vec<u16>, MeshError> {
        let g = self.groups.get(group).ok_or(MeshError::IndexOutOfRange {
            stream: "material group",
            index: group,
            len: self.groups.len(),
        })?;
        g.indices
            .iter()
            .map(|&i| {
                u16::try_from(i).map_err(|_| MeshError::IndexOutOfRange {
                    stream: "u16 index",
                    index: i as usize,
                    len: u16::MAX as usize + 1,
                })
            })
            .collect()
    }
}

/// Polygon list: per-face corner counts, materials, and point/attribute
/// indices concatenated in face order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FaceList {
    pub face_index_count: Vec<usize>,
    pub face_material: Vec<u32>,
    pub point_indices: Vec<usize>,
    pub attribute_indices: Vec<usize>,
    face_offsets: Vec<usize>,
}

impl FaceList {
    pub fn face_count(&self) -> usize {
        self.face_index_count.len()
    }

    /// Face owning the corner at position `corner` of the index lists.
    pub fn face_of_corner(&self, corner: usize) -> Option<usize> {
        if corner >= self.point_indices.len() {
            return None;
        }
        binary_search_le(&self.face_offsets, &corner, |o| *o)
    }
}

/// Per-channel deduplicated values plus, for every attribute, the index of
/// its value in each channel.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IndirectStreams {
    pub positions: Vec<Point3<Real>>,
    pub position_index: Vec<usize>,
    pub normals: Vec<Vector3<Real>>,
    pub normal_index: Vec<usize>,
    pub uv0: Vec<Vector2<Real>>,
    pub uv0_index: Vec<usize>,
    pub uv1: Vec<Vector2<Real>>,
    pub uv1_index: Vec<usize>,
}

#[allow(clippy::unnecessary_cast)]
fn key<const N: usize>(values: [Real; N]) -> [u64; N] {
    values.map(|v| (v as f64).to_bits())
}

fn dedup<T: Copy, const N: usize>(
    values: impl Iterator<Item = T>,
    to_array: impl Fn(&T) -> [Real; N],
) -> (Vec<T>, Vec<usize>) {
    let mut unique = Vec::new();
    let mut index = Vec::new();
    let mut seen: HashMap<[u64; N], usize> = HashMap::new();
    for value in values {
        let slot = *seen.entry(key(to_array(&value))).or_insert_with(|| {
            unique.push(value);
            unique.len() - 1
        });
        index.push(slot);
    }
    (unique, index)
}

impl MeshEffect {
    /// Build a mesh from separately indexed channels, welding positions with
    /// the global tolerance. Missing normal or UV channels read as zero.
    ///
    /// ## Errors
    /// [`MeshError::DegenerateFace`] for a face with fewer than 3 corners,
    /// [`MeshError::IndexOutOfRange`] for an index outside its buffer.
    pub fn from_indexed(list: &IndexedFaceList<'_>) -> Result<Self, MeshError> {
        if list.face_material.len() < list.face_index_count.len() {
            return Err(MeshError::IndexOutOfRange {
                stream: "face material",
                index: list.face_index_count.len() - 1,
                len: list.face_material.len(),
            });
        }

        let mut mesh = MeshEffect::new();
        mesh.begin_polygon();
        let mut corner = 0;
        let mut polygon = Vec::new();
        for (face, (&count, &material)) in list
            .face_index_count
            .iter()
            .zip(list.face_material)
            .enumerate()
        {
            if count < 3 {
                return Err(MeshError::DegenerateFace { face, count });
            }
            polygon.clear();
            for c in corner..corner + count {
                let [x, y, z] = list.positions.fetch::<3>(c, "position")?;
                let mut attribute = VertexAttribute::at(Point3::new(x, y, z)).with_material(material);
                if let Some(normals) = &list.normals {
                    attribute.normal = Vector3::from(normals.fetch::<3>(c, "normal")?);
                }
                if let Some(uv0) = &list.uv0 {
                    attribute.uv0 = Vector2::from(uv0.fetch::<2>(c, "uv0")?);
                }
                if let Some(uv1) = &list.uv1 {
                    attribute.uv1 = Vector2::from(uv1.fetch::<2>(c, "uv1")?);
                }
                polygon.push(attribute);
            }
            mesh.add_polygon(&polygon)?;
            corner += count;
        }
        mesh.end_polygon(tolerance())?;
        Ok(mesh)
    }

    /// Write one value per attribute into caller-owned channel buffers.
    /// Returns the number of values written per channel.
    pub fn write_vertex_streams(
        &self,
        mut positions: StreamMut<'_>,
        normals: Option<StreamMut<'_>>,
        uv0: Option<StreamMut<'_>>,
        uv1: Option<StreamMut<'_>>,
    ) -> Result<usize, MeshError> {
        let count = self.attributes.len();
        let attrs = &self.attributes;
        positions.write(
            "position",
            attrs.iter().map(|a| [a.position.x, a.position.y, a.position.z]),
            count,
        )?;
        if let Some(mut normals) = normals {
            normals.write("normal", attrs.iter().map(|a| [a.normal.x, a.normal.y, a.normal.z]), count)?;
        }
        if let Some(mut uv0) = uv0 {
            uv0.write("uv0", attrs.iter().map(|a| [a.uv0.x, a.uv0.y]), count)?;
        }
        if let Some(mut uv1) = uv1 {
            uv1.write("uv1", attrs.iter().map(|a| [a.uv1.x, a.uv1.y]), count)?;
        }
        Ok(count)
    }

    /// Triangle lists per material, indexing the attribute table.
    pub fn material_geometry(&self) -> Result<MaterialGeometry, MeshError> {
        let mut faces: Vec<(u32, usize)> = self
            .face_ids()
            .into_iter()
            .enumerate()
            .map(|(order, face)| Ok((self.face_material(face)?, order)))
            .collect::<Result<_, MeshError>>()?;
        radix_sort(&mut faces, 4, |f| f.0)?;

        let ids = self.face_ids();
        let mut geometry = MaterialGeometry::default();
        for (material, order) in faces {
            let face = ids[order];
            let corners = self.face_attribute_indices(face);
            let points = self.face_points(face);
            if geometry.groups.last().is_none_or(|g| g.material != material) {
                geometry.groups.push(MaterialGroup {
                    material,
                    indices: Vec::new(),
                });
            }
            if let Some(group) = geometry.groups.last_mut() {
                for [a, b, c] in triangulate_loop(&points) {
                    group
                        .indices
                        .extend([corners[a] as u32, corners[b] as u32, corners[c] as u32]);
                }
            }
        }
        Ok(geometry)
    }

    /// Polygon list of all closed faces.
    pub fn face_list(&self) -> Result<FaceList, MeshError> {
        let mut list = FaceList::default();
        for face in self.face_ids() {
            list.face_offsets.push(list.point_indices.len());
            let points = self.face_point_indices(face);
            list.face_index_count.push(points.len());
            list.face_material.push(self.face_material(face)?);
            list.point_indices.extend(points);
            list.attribute_indices
                .extend(self.face_attribute_indices(face));
        }
        Ok(list)
    }

    /// Deduplicate each channel of the attribute table separately.
    pub fn indirect_streams(&self) -> IndirectStreams {
        let attrs = &self.attributes;
        let (positions, position_index) =
            dedup(attrs.iter().map(|a| a.position), |p| [p.x, p.y, p.z]);
        let (normals, normal_index) = dedup(attrs.iter().map(|a| a.normal), |n| [n.x, n.y, n.z]);
        let (uv0, uv0_index) = dedup(attrs.iter().map(|a| a.uv0), |uv| [uv.x, uv.y]);
        let (uv1, uv1_index) = dedup(attrs.iter().map(|a| a.uv1), |uv| [uv.x, uv.y]);
        IndirectStreams {
            positions,
            position_index,
            normals,
            normal_index,
            uv0,
            uv0_index,
            uv1,
            uv1_index,
        }
    }
}
