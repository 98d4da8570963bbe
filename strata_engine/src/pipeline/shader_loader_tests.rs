use super::*;
use crate::error::Error;

fn spirv_words(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}

#[test]
fn test_validate_spirv() {
    assert!(validate_spirv("ok", &spirv_words(&[SPIRV_MAGIC, 0x0001_0000])).is_ok());
    assert!(matches!(validate_spirv("short", &[3, 2]), Err(Error::ShaderLoadFailed(_))));
    assert!(matches!(validate_spirv("odd", &[3, 2, 35, 7, 0]), Err(Error::ShaderLoadFailed(_))));
    assert!(matches!(validate_spirv("magic", &spirv_words(&[0xdead_beef])), Err(Error::ShaderLoadFailed(_))));
}

#[test]
fn test_file_loader_reads_and_rejects() {
    let dir = std::env::temp_dir().join(format!("strata_shader_loader_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("mesh.vert.spv"), spirv_words(&[SPIRV_MAGIC, 0])).unwrap();
    std::fs::write(dir.join("text.frag.spv"), b"void main() {}\n").unwrap();

    let loader = FileShaderLoader::new(&dir);
    assert_eq!(loader.load("mesh.vert.spv").unwrap().len(), 8);
    assert!(matches!(loader.load("text.frag.spv"), Err(Error::ShaderLoadFailed(_))));
    let missing = loader.load("missing.spv").unwrap_err();
    assert!(missing.to_string().contains("missing.spv"));

    std::fs::remove_dir_all(&dir).unwrap();
}
