use serde::Serialize;

/// One generated artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputFile {
    /// Path relative to the target's output directory.
    pub path: String,
    pub content: String,
}

/// Files produced by one code target in a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OutputFileManifest {
    pub target_name: String,
    pub files: Vec<OutputFile>,
}

impl OutputFileManifest {
    pub fn new(target_name: impl Into<String>) -> Self {
        Self {
            target_name: target_name.into(),
            files: Vec::new(),
        }
    }

    pub fn add_file(&mut self, file: OutputFile) {
        self.files.push(file);
    }

    pub fn file(&self, path: &str) -> Option<&OutputFile> {
        self.files.iter().find(|file| file.path == path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn bytes(&self) -> u64 {
        self.files
            .iter()
            .map(|file| file.content.len() as u64)
            .sum()
    }
}
