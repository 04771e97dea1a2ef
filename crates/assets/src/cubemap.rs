use std::path::{Path, PathBuf};

use image::RgbaImage;

use crate::AssetError;

/// Face file stems in GPU cube layer order (+X, -X, +Y, -Y, +Z, -Z).
pub const FACE_NAMES: [&str; 6] = ["px", "nx", "py", "ny", "pz", "nz"];

/// Six square RGBA8 faces of equal size, stored layer-major.
#[derive(Debug, Clone)]
pub struct Cubemap {
    size: u32,
    data: Vec<u8>,
}

impl Cubemap {
    /// Load `px.<ext>`, `nx.<ext>`, ... `nz.<ext>` from `dir`.
    pub fn load(dir: impl AsRef<Path>, ext: &str) -> Result<Self, AssetError> {
        let dir = dir.as_ref();
        let mut faces = Vec::with_capacity(FACE_NAMES.len());
        for name in FACE_NAMES {
            let path = dir.join(format!("{name}.{ext}"));
            let face = load_face(&path)?;
            faces.push((path, face));
        }
        let cubemap = Self::from_faces(faces)?;
        tracing::info!(dir = %dir.display(), size = cubemap.size, "environment cubemap loaded");
        Ok(cubemap)
    }

    /// Assemble a cubemap from decoded faces in [`FACE_NAMES`] order.
    ///
    /// The path of each face is only used for error reporting.
    pub fn from_faces(faces: Vec<(PathBuf, RgbaImage)>) -> Result<Self, AssetError> {
        let mut size = None;
        let mut data = Vec::new();
        for (path, face) in faces {
            let (width, height) = face.dimensions();
            if width != height {
                return Err(AssetError::NonSquareFace {
                    path,
                    width,
                    height,
                });
            }
            let expected = *size.get_or_insert(width);
            if width != expected {
                return Err(AssetError::FaceSizeMismatch {
                    path,
                    expected,
                    found: width,
                });
            }
            data.extend_from_slice(face.as_raw());
        }
        Ok(Self {
            size: size.unwrap_or(0),
            data,
        })
    }

    /// Edge length of each face in pixels.
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn bytes_per_row(&self) -> u32 {
        self.size * 4
    }

    /// All six faces, tightly packed in layer order.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn face(&self, index: usize) -> Option<&[u8]> {
        let len = (self.size as usize).pow(2) * 4;
        self.data.get(index * len..(index + 1) * len)
    }
}

fn load_face(path: &Path) -> Result<RgbaImage, AssetError> {
    let bytes = std::fs::read(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let image = image::load_from_memory(&bytes).map_err(|source| AssetError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(image.into_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn write_faces(dir: &Path, size: u32) {
        for (i, name) in FACE_NAMES.iter().enumerate() {
            let img = RgbaImage::from_pixel(size, size, Rgba([i as u8 * 40, 0, 0, 255]));
            img.save(dir.join(format!("{name}.png"))).unwrap();
        }
    }

    #[test]
    fn loads_six_faces_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        write_faces(tmp.path(), 4);

        let cubemap = Cubemap::load(tmp.path(), "png").unwrap();
        assert_eq!(cubemap.size(), 4);
        assert_eq!(cubemap.bytes_per_row(), 16);
        assert_eq!(cubemap.data().len(), 6 * 4 * 4 * 4);
        for i in 0..6 {
            assert_eq!(cubemap.face(i).unwrap()[0], i as u8 * 40);
        }
        assert!(cubemap.face(6).is_none());
    }

    #[test]
    fn missing_face_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        write_faces(tmp.path(), 2);
        std::fs::remove_file(tmp.path().join("ny.png")).unwrap();

        match Cubemap::load(tmp.path(), "png") {
            Err(AssetError::Io { path, .. }) => assert!(path.ends_with("ny.png")),
            other => panic!("expected io error, got {other:?}"),
        }
    }

    #[test]
    fn corrupt_face_is_image_error() {
        let tmp = tempfile::tempdir().unwrap();
        write_faces(tmp.path(), 2);
        std::fs::write(tmp.path().join("pz.png"), b"not an image").unwrap();

        assert!(matches!(
            Cubemap::load(tmp.path(), "png"),
            Err(AssetError::Image { .. })
        ));
    }

    #[test]
    fn rejects_non_square_face() {
        let faces = vec![(PathBuf::from("px.png"), RgbaImage::new(4, 2))];
        assert!(matches!(
            Cubemap::from_faces(faces),
            Err(AssetError::NonSquareFace {
                width: 4,
                height: 2,
                ..
            })
        ));
    }

    #[test]
    fn rejects_mismatched_face_sizes() {
        let faces = vec![
            (PathBuf::from("px.png"), RgbaImage::new(4, 4)),
            (PathBuf::from("nx.png"), RgbaImage::new(8, 8)),
        ];
        assert!(matches!(
            Cubemap::from_faces(faces),
            Err(AssetError::FaceSizeMismatch {
                expected: 4,
                found: 8,
                ..
            })
        ));
    }
}
