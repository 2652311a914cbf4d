/// Why an uploaded filename was rejected.
#[derive(Debug, PartialEq, Eq)]
pub enum FilenameError {
    /// Filename is empty or whitespace-only.
    Empty,
    /// Filename contains path separators (`/` or `\`).
    ContainsPathSeparator,
    /// Filename contains null bytes or other control characters.
    ControlCharacter,
    /// Filename has no extension.
    MissingExtension,
    /// Extension is not one of [`IMAGE_EXTENSIONS`].
    UnsupportedExtension(String),
}

impl FilenameError {
    /// Returns a human-readable error message.
    pub fn message(&self) -> String {
        match self {
            Self::Empty => "The uploaded file must have a filename.".into(),
            Self::ContainsPathSeparator => {
                "Invalid filename: path separators are not allowed.".into()
            }
            Self::ControlCharacter => "Invalid filename: control characters are not allowed.".into(),
            Self::MissingExtension => "The uploaded file must have an extension.".into(),
            Self::UnsupportedExtension(ext) => format!(
                "Unsupported image type '{ext}'. Allowed: {}.",
                IMAGE_EXTENSIONS.join(", ")
            ),
        }
    }
}

/// Image extensions accepted for media slots.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Validate an uploaded image filename and return its lowercased extension.
pub fn image_extension(filename: &str) -> Result<String, FilenameError> {
    let trimmed = filename.trim();

    if trimmed.is_empty() {
        return Err(FilenameError::Empty);
    }

    // Reject control characters, including NUL and CRLF.
    if trimmed.chars().any(|c| c.is_control()) {
        return Err(FilenameError::ControlCharacter);
    }

    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(FilenameError::ContainsPathSeparator);
    }

    let ext = match trimmed.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => ext.to_ascii_lowercase(),
        _ => return Err(FilenameError::MissingExtension),
    };

    if !IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        return Err(FilenameError::UnsupportedExtension(ext));
    }

    Ok(ext)
}

/// Checks if a path string contains path traversal patterns.
pub fn contains_path_traversal(path: &str) -> bool {
    path == ".."
        || path.starts_with("../")
        || path.contains("/../")
        || path.ends_with("/..")
}

/// Validates a blob key requested through the media endpoint.
pub fn validate_media_path(path: &str) -> Result<&str, &'static str> {
    let trimmed = path.trim();

    if trimmed.is_empty() {
        return Err("Path cannot be empty");
    }

    if trimmed.len() > 512 {
        return Err("Path exceeds maximum length of 512 characters");
    }

    if trimmed.contains('\\') || trimmed.contains('\0') {
        return Err("Path contains invalid characters");
    }

    if trimmed.starts_with('/') || trimmed.contains("//") {
        return Err("Path must be relative without empty segments");
    }

    if contains_path_traversal(trimmed) {
        return Err("Path must not contain '..' traversal");
    }

    if trimmed.split('/').any(|segment| segment.starts_with('.')) {
        return Err("Path segments must not start with '.'");
    }

    Ok(trimmed)
}
