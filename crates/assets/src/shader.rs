use std::path::Path;

use crate::AssetError;

/// Read a WGSL source file used to override the built-in ray-march template.
pub fn load_shader_source(path: impl AsRef<Path>) -> Result<String, AssetError> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if source.trim().is_empty() {
        return Err(AssetError::EmptyShader(path.to_path_buf()));
    }
    tracing::info!(path = %path.display(), bytes = source.len(), "shader source loaded");
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_source() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "@fragment fn fs_main() {{}}").unwrap();
        let source = load_shader_source(tmp.path()).unwrap();
        assert!(source.contains("fs_main"));
    }

    #[test]
    fn empty_file_is_rejected() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        assert!(matches!(
            load_shader_source(tmp.path()),
            Err(AssetError::EmptyShader(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_shader_source(tmp.path().join("nope.wgsl")),
            Err(AssetError::Io { .. })
        ));
    }
}
