use std::{collections::HashMap, fs, io, rc::Rc};

use crate::SourceLocation;

/// Resolves a file name, as written in an include directive or given as the
/// entry point, to its contents.
pub trait SourceLoader {
    fn load(&self, name: &str) -> io::Result<String>;
}

/// Reads files from disk. Names are resolved relative to the working directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileLoader;

impl SourceLoader for FileLoader {
    fn load(&self, name: &str) -> io::Result<String> {
        fs::read_to_string(name)
    }
}

/// Serves sources from memory, mostly for tests and embedding.
#[derive(Debug, Default, Clone)]
pub struct MemoryLoader {
    files: HashMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        MemoryLoader::default()
    }

    pub fn with_file(mut self, name: &str, contents: &str) -> Self {
        self.insert(name, contents);
        self
    }

    pub fn insert(&mut self, name: &str, contents: &str) {
        self.files.insert(name.to_string(), contents.to_string());
    }
}

impl SourceLoader for MemoryLoader {
    fn load(&self, name: &str) -> io::Result<String> {
        self.files.get(name).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no source named {}", name))
        })
    }
}

/// Read cursor over one open file. Line and column are 0-based internally.
#[derive(Debug, Clone)]
pub struct SourceFile {
    name: Rc<String>,
    lines: Vec<Vec<char>>,
    line: usize,
    column: usize,
}

impl SourceFile {
    pub fn new(name: &str, contents: &str) -> Self {
        SourceFile {
            name: Rc::new(name.to_string()),
            lines: contents.lines().map(|line| line.chars().collect()).collect(),
            line: 0,
            column: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn at_eof(&self) -> bool {
        self.line >= self.lines.len()
    }

    pub fn at_end_of_line(&self) -> bool {
        self.lines
            .get(self.line)
            .map_or(true, |line| self.column >= line.len())
    }

    /// Characters from the cursor to the end of the current line.
    pub fn rest_of_line(&self) -> String {
        self.lines
            .get(self.line)
            .map(|line| line[self.column.min(line.len())..].iter().collect())
            .unwrap_or_default()
    }

    pub fn advance(&mut self, n: usize) {
        self.column += n;
    }

    pub fn next_line(&mut self) {
        self.line += 1;
        self.column = 0;
    }

    pub fn location(&self) -> SourceLocation {
        self.location_at(0)
    }

    /// Location `offset` characters to the right of the cursor.
    pub fn location_at(&self, offset: usize) -> SourceLocation {
        SourceLocation::new(
            Rc::clone(&self.name),
            (self.line + 1) as u32,
            (self.column + offset + 1) as u32,
        )
    }
}
