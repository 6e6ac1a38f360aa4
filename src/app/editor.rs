use std::{
    fmt,
    io::{self, Write},
    process::{Command, ExitStatus},
};

use tempfile::NamedTempFile;

#[derive(Debug)]
pub enum EditorError {
    TempFile(io::Error),
    Launch { editor: String, source: io::Error },
    Exit(ExitStatus),
    ReadBack(io::Error),
}

impl fmt::Display for EditorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditorError::TempFile(err) => write!(f, "failed to create temp file: {err}"),
            EditorError::Launch { editor, source } => {
                write!(f, "failed to launch editor {editor}: {source}")
            }
            EditorError::Exit(status) => write!(f, "editor exited with {status}"),
            EditorError::ReadBack(err) => write!(f, "failed to read edited file: {err}"),
        }
    }
}

impl std::error::Error for EditorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EditorError::TempFile(err) | EditorError::ReadBack(err) => Some(err),
            EditorError::Launch { source, .. } => Some(source),
            EditorError::Exit(_) => None,
        }
    }
}

/// Writes `content` to a fresh temp file, runs `editor` on it through the
/// shell and returns the saved text. The file is removed on every path.
///
/// Blocks until the editor exits; the caller owns the terminal handoff.
pub fn edit(editor: &str, content: &str) -> Result<String, EditorError> {
    let mut file = tempfile::Builder::new()
        .prefix("dui-")
        .suffix(".json")
        .tempfile()
        .map_err(EditorError::TempFile)?;
    file.write_all(content.as_bytes())
        .and_then(|()| file.flush())
        .map_err(EditorError::TempFile)?;

    run_editor(editor, &file)?;

    std::fs::read_to_string(file.path()).map_err(EditorError::ReadBack)
}

fn run_editor(editor: &str, file: &NamedTempFile) -> Result<(), EditorError> {
    let command = format!("{editor} \"{}\"", file.path().display());
    tracing::debug!(%command, "launching editor");
    let status = Command::new("sh")
        .arg("-c")
        .arg(&command)
        .status()
        .map_err(|source| EditorError::Launch {
            editor: editor.to_string(),
            source,
        })?;
    if !status.success() {
        return Err(EditorError::Exit(status));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Editor command that records the path it was given in `marker`.
    fn recording_editor(marker: &std::path::Path, then: &str) -> String {
        format!("f() {{ echo \"$1\" > '{}'; {then}; }}; f", marker.display())
    }

    fn recorded_path(marker: &std::path::Path) -> std::path::PathBuf {
        std::fs::read_to_string(marker).unwrap().trim().into()
    }

    #[test]
    fn returns_the_saved_text_and_removes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("seen");
        let editor = recording_editor(&marker, "printf '{\"pk\": \"b\"}' > \"$1\"");

        let edited = edit(&editor, "{\"pk\": \"a\"}").unwrap();

        assert_eq!(edited, "{\"pk\": \"b\"}");
        let path = recorded_path(&marker);
        assert!(path.to_string_lossy().ends_with(".json"));
        assert!(!path.exists());
    }

    #[test]
    fn unchanged_text_comes_back_verbatim() {
        let edited = edit("true", "{\n  \"pk\": \"\"\n}").unwrap();
        assert_eq!(edited, "{\n  \"pk\": \"\"\n}");
    }

    #[test]
    fn failing_editor_is_an_error_and_still_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("seen");
        let editor = recording_editor(&marker, "return 3");

        let err = edit(&editor, "{}").unwrap_err();

        assert!(matches!(err, EditorError::Exit(_)));
        assert!(!recorded_path(&marker).exists());
    }
}
