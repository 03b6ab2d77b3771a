/// Model File Classification
///
/// A file counts as a model asset purely by its extension.

/// Recognized model-asset extensions, lowercase with the leading dot.
pub const MODEL_EXTENSIONS: &[&str] = &[".safetensors", ".ckpt", ".pt", ".pth", ".bin"];

/// Returns true if `name` ends with a recognized model extension (case-insensitive).
pub fn is_model_filename(name: &str) -> bool {
    let lowered = name.to_lowercase();
    MODEL_EXTENSIONS.iter().any(|ext| lowered.ends_with(ext))
}
