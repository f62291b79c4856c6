//! Deterministic C source text construction.

use crate::error::{DenoxError, DenoxResult};

const INDENT_UNIT: &str = "  ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncludeKind {
    Local,
    System,
}

#[derive(Debug, Default)]
pub struct SourceWriter {
    body: String,
    indent_level: usize,
    local_includes: Vec<String>,
    system_includes: Vec<String>,
    header_guard: Option<String>,
}

impl SourceWriter {
    pub fn new() -> SourceWriter {
        SourceWriter::default()
    }

    pub fn set_header_guard(&mut self, macro_name: impl Into<String>) {
        self.header_guard = Some(macro_name.into());
    }

    pub fn add_include(&mut self, kind: IncludeKind, path: impl Into<String>) {
        let path = path.into();
        let list = match kind {
            IncludeKind::Local => &mut self.local_includes,
            IncludeKind::System => &mut self.system_includes,
        };
        if !list.contains(&path) {
            list.push(path);
        }
    }

    /// Splits `text` on newlines and prefixes each resulting line with the
    /// current indent.
    pub fn append(&mut self, text: &str) {
        for line in text.split('\n') {
            if line.is_empty() {
                self.body.push('\n');
            } else {
                self.body.push_str(&INDENT_UNIT.repeat(self.indent_level));
                self.body.push_str(line);
                self.body.push('\n');
            }
        }
    }

    pub fn push_indentation(&mut self, n: usize) {
        self.indent_level += n;
    }

    pub fn pop_indentation(&mut self, n: usize) -> DenoxResult<()> {
        self.indent_level = self
            .indent_level
            .checked_sub(n)
            .ok_or(DenoxError::IndentationUnderflow)?;
        Ok(())
    }

    fn render_includes(&self) -> String {
        let mut out = String::new();
        for path in &self.local_includes {
            out.push_str(&format!("#include \"{path}\"\n"));
        }
        for path in &self.system_includes {
            out.push_str(&format!("#include <{path}>\n"));
        }
        out
    }

    pub fn finish(self) -> String {
        let includes = self.render_includes();
        match self.header_guard {
            Some(guard) => {
                format!("#ifndef {guard}\n#define {guard}\n\n{includes}\n{body}\n#endif\n", body = self.body)
            }
            None => format!("{includes}\n{}", self.body),
        }
    }
}
